use serde::{Deserialize, Serialize};
use shared::{DiseaseInfoDto, Severity};
use std::collections::{BTreeMap, HashSet};

use crate::error::ConfigurationError;

pub const PHOTOGRAPHY_TIPS: [&str; 4] = [
    "Use a clear, well lit cassava leaf image",
    "Ensure the leaf fills most of the frame",
    "Avoid blurry or dark photos",
    "Make sure the leaf is clearly visible",
];

pub const DISCLAIMER: &str = "This is an AI-based diagnostic tool for educational purposes. \
For serious plant health issues, please consult agricultural experts or extension services.";

/// Ordered label identifiers. Index `i` names the `i`-th entry of every
/// probability vector produced by the active inference adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    pub fn new(labels: Vec<String>) -> Result<Self, ConfigurationError> {
        if labels.is_empty() {
            return Err(ConfigurationError::EmptyLabelSet);
        }
        let mut seen = HashSet::new();
        for label in &labels {
            if !seen.insert(label.as_str()) {
                return Err(ConfigurationError::DuplicateLabel(label.clone()));
            }
        }
        Ok(Self { labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.labels.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseInfo {
    pub name: String,
    pub icon: String,
    pub severity: Severity,
    pub description: String,
    #[serde(default)]
    pub symptoms: String,
    pub treatment: String,
}

impl DiseaseInfo {
    pub fn to_dto(&self) -> DiseaseInfoDto {
        DiseaseInfoDto {
            name: self.name.clone(),
            icon: self.icon.clone(),
            severity: self.severity,
            description: self.description.clone(),
            symptoms: self.symptoms.clone(),
            treatment: self.treatment.clone(),
        }
    }
}

/// Static guidance keyed by label. Built once at startup and checked against
/// the label set so that lookups for known labels cannot fail later.
#[derive(Debug, Clone)]
pub struct DiseaseTable {
    entries: BTreeMap<String, DiseaseInfo>,
}

impl DiseaseTable {
    pub fn new(entries: BTreeMap<String, DiseaseInfo>) -> Self {
        Self { entries }
    }

    pub fn for_labels(
        entries: BTreeMap<String, DiseaseInfo>,
        labels: &LabelSet,
    ) -> Result<Self, ConfigurationError> {
        let table = Self::new(entries);
        table.ensure_covers(labels)?;
        Ok(table)
    }

    pub fn ensure_covers(&self, labels: &LabelSet) -> Result<(), ConfigurationError> {
        match labels.iter().find(|label| !self.entries.contains_key(*label)) {
            Some(missing) => Err(ConfigurationError::MissingDiseaseInfo(missing.to_string())),
            None => Ok(()),
        }
    }

    pub fn lookup(&self, label: &str) -> Result<&DiseaseInfo, ConfigurationError> {
        self.entries
            .get(label)
            .ok_or_else(|| ConfigurationError::MissingDiseaseInfo(label.to_string()))
    }
}

fn info(
    name: &str,
    icon: &str,
    severity: Severity,
    description: &str,
    symptoms: &str,
    treatment: &str,
) -> DiseaseInfo {
    DiseaseInfo {
        name: name.to_string(),
        icon: icon.to_string(),
        severity,
        description: description.to_string(),
        symptoms: symptoms.to_string(),
        treatment: treatment.to_string(),
    }
}

pub fn default_labels() -> Vec<String> {
    ["CBB", "CBSD", "CGM", "CMD", "Healthy"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn default_diseases() -> BTreeMap<String, DiseaseInfo> {
    let mut table = BTreeMap::new();
    table.insert(
        "CBB".to_string(),
        info(
            "Cassava Bacterial Blight (CBB)",
            "🦠",
            Severity::High,
            "Bacterial infection causing angular leaf spots and wilting",
            "Angular, water-soaked spots on leaves; wilting; black streaks on stems; gum exudation",
            "Remove infected plants, use copper-based treatments",
        ),
    );
    table.insert(
        "CBSD".to_string(),
        info(
            "Cassava Brown Streak Disease (CBSD)",
            "🧬",
            Severity::High,
            "Viral disease causing brown streaks and root rot",
            "Yellow patches along leaf veins; brown streaks in stems; brown rot in storage roots",
            "Use resistant varieties, control whitefly vectors",
        ),
    );
    table.insert(
        "CGM".to_string(),
        info(
            "Cassava Green Mottle (CGM)",
            "🍃",
            Severity::Medium,
            "Viral disease characterized by green and yellow mottling patterns on leaves",
            "Green and yellow mottled patterns on leaves; reduced leaf size; stunted growth",
            "Use virus-free planting material, control aphid vectors, remove infected plants",
        ),
    );
    table.insert(
        "CMD".to_string(),
        info(
            "Cassava Mosaic Disease (CMD)",
            "🧫",
            Severity::Medium,
            "Viral infection creating mosaic patterns on leaves",
            "Yellow and green mosaic patterns on leaves; leaf distortion; stunted growth",
            "Plant resistant varieties, remove infected plants",
        ),
    );
    table.insert(
        "Healthy".to_string(),
        info(
            "Healthy Cassava Leaf",
            "✅",
            Severity::None,
            "Healthy leaf with no disease symptoms",
            "Green, uniform leaves; normal growth pattern; no discoloration or spots",
            "Continue monitoring and good practices",
        ),
    );
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_default_labels() {
        let labels = LabelSet::new(default_labels()).unwrap();
        let table = DiseaseTable::for_labels(default_diseases(), &labels).unwrap();
        assert_eq!(table.lookup("Healthy").unwrap().severity, Severity::None);
        assert_eq!(table.lookup("CBB").unwrap().severity, Severity::High);
    }

    #[test]
    fn missing_entry_is_a_configuration_error() {
        let labels = LabelSet::new(vec!["CBB".into(), "Rust".into()]).unwrap();
        let err = DiseaseTable::for_labels(default_diseases(), &labels).unwrap_err();
        assert_eq!(err, ConfigurationError::MissingDiseaseInfo("Rust".into()));
    }

    #[test]
    fn label_set_rejects_empty_and_duplicates() {
        assert_eq!(
            LabelSet::new(vec![]).unwrap_err(),
            ConfigurationError::EmptyLabelSet
        );
        assert_eq!(
            LabelSet::new(vec!["CMD".into(), "CMD".into()]).unwrap_err(),
            ConfigurationError::DuplicateLabel("CMD".into())
        );
    }
}

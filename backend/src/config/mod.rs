use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use crate::disease::{self, DiseaseInfo, DiseaseTable, LabelSet};
use crate::error::ConfigurationError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ConfigurationError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub version: f32,
    pub server: ServerConfig,
    pub admission: AdmissionConfig,
    pub gate: GateConfig,
    pub history: HistoryConfig,
    pub inference: InferenceConfig,
    pub labels: Vec<String>,
    pub diseases: BTreeMap<String, DiseaseInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Vegetation hue band in degrees, inclusive on both ends.
    pub hue_min_deg: f32,
    pub hue_max_deg: f32,
    /// Saturation and value floors on a 0..=255 scale.
    pub min_saturation: u8,
    pub min_value: u8,
    pub min_green_fraction: f32,
    pub anomaly: AnomalyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    pub enabled: bool,
    /// Smallest skin region, as a share of the frame, that may count as a face.
    pub min_region_fraction: f32,
    /// Accepted height/width range of the region's bounding box.
    pub min_aspect: f32,
    pub max_aspect: f32,
    /// Accepted share of the bounding box covered by the region.
    pub min_fill: f32,
    pub max_fill: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub threshold_percent: f64,
    pub strict: bool,
    pub tolerance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub display_limit: usize,
    pub thumbnail_max_side: u32,
    pub jpeg_quality: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Quantized,
    FullPrecision,
    Random,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Preference order; the first strategy that initialises is used.
    pub strategies: Vec<StrategyKind>,
    pub quantized_model_path: PathBuf,
    pub full_model_path: PathBuf,
    pub seed: Option<u64>,
    pub apply_softmax: bool,
    pub input_size: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1.0,
            server: ServerConfig::default(),
            admission: AdmissionConfig::default(),
            gate: GateConfig::default(),
            history: HistoryConfig::default(),
            inference: InferenceConfig::default(),
            labels: disease::default_labels(),
            diseases: disease::default_diseases(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7860,
        }
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            hue_min_deg: 70.0,
            hue_max_deg: 170.0,
            min_saturation: 40,
            min_value: 40,
            min_green_fraction: 0.1,
            anomaly: AnomalyConfig::default(),
        }
    }
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_region_fraction: 0.03,
            min_aspect: 0.9,
            max_aspect: 2.0,
            min_fill: 0.6,
            max_fill: 0.9,
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            threshold_percent: 60.0,
            strict: true,
            tolerance: 1e-6,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            display_limit: 10,
            thumbnail_max_side: 400,
            jpeg_quality: 85,
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            strategies: vec![
                StrategyKind::Quantized,
                StrategyKind::FullPrecision,
                StrategyKind::Random,
            ],
            quantized_model_path: PathBuf::from("model/model_quantized.pt"),
            full_model_path: PathBuf::from("model/best_model.pt"),
            seed: None,
            apply_softmax: true,
            input_size: 224,
        }
    }
}

fn invalid(field: &'static str, message: impl Into<String>) -> ConfigurationError {
    ConfigurationError::InvalidSetting {
        field,
        message: message.into(),
    }
}

impl AppConfig {
    /// Reads the YAML file named by `APP_CONFIG`, or `config/app.yaml` next to
    /// the workspace root. Falls back to built-in defaults when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        let path = match env::var("APP_CONFIG") {
            Ok(path) => PathBuf::from(path),
            Err(_) => Self::default_path(),
        };

        let mut config = if path.exists() {
            log::info!("Loading configuration from {}", path.display());
            Self::from_file(&path)?
        } else {
            log::warn!(
                "No configuration file at {}, using built-in defaults",
                path.display()
            );
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn default_path() -> PathBuf {
        match env::var("CARGO_MANIFEST_DIR") {
            Ok(manifest_dir) => PathBuf::from(format!("{}/../config/app.yaml", manifest_dir)),
            Err(_) => PathBuf::from("config/app.yaml"),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&config_str)
    }

    pub fn from_yaml_str(config_str: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(config_str)?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = env::var("BIND_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => log::warn!("Ignoring unparsable PORT value: {}", port),
            }
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Checks every setting and builds the label set and its guidance table.
    pub fn validate(&self) -> Result<(LabelSet, DiseaseTable), ConfigurationError> {
        let admission = &self.admission;
        if !(0.0..=360.0).contains(&admission.hue_min_deg)
            || !(0.0..=360.0).contains(&admission.hue_max_deg)
            || admission.hue_min_deg > admission.hue_max_deg
        {
            return Err(invalid(
                "admission.hue_min_deg/hue_max_deg",
                format!(
                    "expected 0 <= min <= max <= 360, got {}..{}",
                    admission.hue_min_deg, admission.hue_max_deg
                ),
            ));
        }
        if !(0.0..=1.0).contains(&admission.min_green_fraction) {
            return Err(invalid(
                "admission.min_green_fraction",
                "must lie within [0, 1]",
            ));
        }
        let anomaly = &admission.anomaly;
        if !(0.0..=1.0).contains(&anomaly.min_region_fraction) {
            return Err(invalid(
                "admission.anomaly.min_region_fraction",
                "must lie within [0, 1]",
            ));
        }
        if !(anomaly.min_aspect > 0.0 && anomaly.min_aspect <= anomaly.max_aspect) {
            return Err(invalid(
                "admission.anomaly.min_aspect/max_aspect",
                "expected 0 < min <= max",
            ));
        }
        if !(0.0..=1.0).contains(&anomaly.min_fill)
            || !(0.0..=1.0).contains(&anomaly.max_fill)
            || anomaly.min_fill > anomaly.max_fill
        {
            return Err(invalid(
                "admission.anomaly.min_fill/max_fill",
                "expected 0 <= min <= max <= 1",
            ));
        }
        if !(0.0..=100.0).contains(&self.gate.threshold_percent) {
            return Err(invalid("gate.threshold_percent", "must lie within [0, 100]"));
        }
        if self.gate.tolerance.is_nan() || self.gate.tolerance <= 0.0 {
            return Err(invalid("gate.tolerance", "must be positive"));
        }
        if self.history.display_limit == 0 {
            return Err(invalid("history.display_limit", "must be at least 1"));
        }
        if self.history.thumbnail_max_side == 0 {
            return Err(invalid("history.thumbnail_max_side", "must be at least 1"));
        }
        if !(1..=100).contains(&self.history.jpeg_quality) {
            return Err(invalid("history.jpeg_quality", "must lie within [1, 100]"));
        }
        if self.inference.strategies.is_empty() {
            return Err(invalid("inference.strategies", "at least one strategy is required"));
        }
        if self.inference.input_size == 0 {
            return Err(invalid("inference.input_size", "must be at least 1"));
        }

        let labels = LabelSet::new(self.labels.clone())?;
        let table = DiseaseTable::for_labels(self.diseases.clone(), &labels)?;
        Ok((labels, table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = AppConfig::default();
        let (labels, _) = config.validate().unwrap();
        assert_eq!(labels.len(), 5);
        assert_eq!(config.gate.threshold_percent, 60.0);
        assert_eq!(config.admission.min_green_fraction, 0.1);
        assert_eq!(config.history.display_limit, 10);
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let config = AppConfig::from_yaml_str(include_str!("../../../config/app.yaml")).unwrap();
        let (labels, table) = config.validate().unwrap();
        assert_eq!(labels.to_vec(), disease::default_labels());
        assert_eq!(
            table.lookup("CGM").unwrap(),
            &disease::default_diseases()["CGM"]
        );
        assert_eq!(config.bind_address(), "0.0.0.0:7860");
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = AppConfig::from_yaml_str(
            "gate:\n  threshold_percent: 75.0\ninference:\n  strategies: [random]\n  seed: 42\n",
        )
        .unwrap();
        assert_eq!(config.gate.threshold_percent, 75.0);
        assert!(config.gate.strict);
        assert_eq!(config.inference.strategies, vec![StrategyKind::Random]);
        assert_eq!(config.inference.seed, Some(42));
        assert_eq!(config.history.thumbnail_max_side, 400);
    }

    #[test]
    fn label_without_disease_info_fails_validation() {
        let config =
            AppConfig::from_yaml_str("labels: [CBB, CBSD, Unknown]\n").unwrap();
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigurationError::MissingDiseaseInfo("Unknown".into())
        );
    }

    #[test]
    fn out_of_range_threshold_fails_validation() {
        let mut config = AppConfig::default();
        config.gate.threshold_percent = 120.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidSetting {
                field: "gate.threshold_percent",
                ..
            })
        ));
    }

    #[test]
    fn inverted_face_fill_range_fails_validation() {
        let mut config = AppConfig::default();
        config.admission.anomaly.min_fill = 0.95;
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidSetting {
                field: "admission.anomaly.min_fill/max_fill",
                ..
            })
        ));
    }

    #[test]
    fn disease_table_parses_from_yaml() {
        let yaml = r#"
labels: [Leaf]
diseases:
  Leaf:
    name: Leaf
    icon: "L"
    severity: Medium
    description: d
    treatment: t
"#;
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        let (labels, table) = config.validate().unwrap();
        assert_eq!(labels.get(0), Some("Leaf"));
        assert_eq!(table.lookup("Leaf").unwrap().severity, shared::Severity::Medium);
        assert_eq!(table.lookup("Leaf").unwrap().symptoms, "");
    }
}

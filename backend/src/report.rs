//! Markdown reports handed back to clients next to the structured payloads.

use std::fmt::Write;

use crate::disease::{DiseaseTable, LabelSet, DISCLAIMER, PHOTOGRAPHY_TIPS};
use crate::error::ConfigurationError;
use crate::history::HistoryEntry;
use crate::pipeline::{BatchReport, PipelineOutcome, Prediction};

pub fn photography_tips() -> String {
    let mut out = String::from("### 💡 Tips\n");
    for tip in PHOTOGRAPHY_TIPS {
        let _ = writeln!(out, "- {}", tip);
    }
    out
}

fn display_name<'a>(diseases: &'a DiseaseTable, label: &'a str) -> &'a str {
    diseases
        .lookup(label)
        .map(|info| info.name.as_str())
        .unwrap_or(label)
}

fn score_breakdown(
    prediction: &Prediction,
    labels: &LabelSet,
    diseases: &DiseaseTable,
) -> String {
    let mut scores: Vec<(&str, f64)> = labels.iter().zip(prediction.scores.iter().copied()).collect();
    scores.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut out = String::from("### 📊 Prediction Confidence\n");
    for (label, score) in scores {
        let _ = writeln!(
            out,
            "- **{}**: {:.1}%",
            display_name(diseases, label),
            score * 100.0
        );
    }
    out
}

pub fn render_outcome(
    outcome: &PipelineOutcome,
    labels: &LabelSet,
    diseases: &DiseaseTable,
) -> Result<String, ConfigurationError> {
    let mut out = String::new();
    match outcome {
        PipelineOutcome::Accepted { prediction } => {
            let info = diseases.lookup(&prediction.label)?;
            let _ = writeln!(out, "## {} Diagnosis: {}\n", info.icon, info.name);
            let _ = writeln!(out, "**Confidence:** {:.1}%  ", prediction.confidence);
            let _ = writeln!(out, "**Severity:** {}\n", info.severity);
            let _ = writeln!(out, "### 📋 Description\n{}\n", info.description);
            if !info.symptoms.is_empty() {
                let _ = writeln!(out, "### 🔍 Symptoms\n{}\n", info.symptoms);
            }
            let _ = writeln!(out, "### 💊 Treatment\n{}\n", info.treatment);
            out.push_str(&score_breakdown(prediction, labels, diseases));
            let _ = write!(out, "\n> {}\n", DISCLAIMER);
        }
        PipelineOutcome::LowConfidence { prediction } => {
            let _ = writeln!(out, "## ⚠️ Low Confidence\n");
            let _ = writeln!(
                out,
                "Prediction confidence: {:.1}%. Please try with a clearer image.\n",
                prediction.confidence
            );
            let _ = writeln!(
                out,
                "Best guess: {}\n",
                display_name(diseases, &prediction.label)
            );
            out.push_str(&score_breakdown(prediction, labels, diseases));
            out.push('\n');
            out.push_str(&photography_tips());
        }
        PipelineOutcome::Rejected { reason, .. } => {
            let _ = writeln!(out, "## ⚠️ Invalid Image\n");
            let _ = writeln!(out, "Image rejected: {}.\n", reason);
            out.push_str(&photography_tips());
        }
        PipelineOutcome::Error { message } => {
            let _ = writeln!(out, "## ❌ Processing Error\n");
            let _ = writeln!(out, "An error occurred: {}", message);
        }
    }
    Ok(out)
}

pub fn render_batch(
    report: &BatchReport,
    labels: &LabelSet,
    diseases: &DiseaseTable,
) -> Result<String, ConfigurationError> {
    if report.no_images_supplied() {
        return Ok("## No Images\n\nPlease upload images to analyze\n".to_string());
    }

    let total = report.len();
    let mut sections = Vec::with_capacity(total);
    for (i, outcome) in report.outcomes.iter().enumerate() {
        let body = render_outcome(outcome, labels, diseases)?;
        if total > 1 {
            sections.push(format!("### 📸 Image {} of {}\n\n{}", i + 1, total, body));
        } else {
            sections.push(body);
        }
    }
    Ok(sections.join("\n---\n\n"))
}

pub fn render_history(entries: &[HistoryEntry], diseases: &DiseaseTable) -> String {
    if entries.is_empty() {
        return "## No History\n\nNo previous analyses found\n".to_string();
    }

    let mut out = String::from("## 📂 Analysis History\n\n");
    for entry in entries {
        let _ = writeln!(
            out,
            "- **{}**: {:.1}% confidence ({})",
            display_name(diseases, &entry.label),
            entry.confidence,
            entry.timestamp_display()
        );
    }
    out
}

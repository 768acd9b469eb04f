//! FAQ export snapshots
//!
//! An export is a point-in-time JSON document of FAQ records, suitable for
//! handing to a site or help-center importer.

use crate::output::OutputResult;
use crate::storage::FaqRecord;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One FAQ as it appears in an export
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedFaq {
    pub question: String,
    pub answer: String,
    pub source: String,
    pub published: bool,
    pub confidence: f64,
    pub created_at: String,
}

/// A snapshot of FAQ records
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaqExport {
    pub export_date: String,
    #[serde(rename = "totalFAQs")]
    pub total_faqs: usize,
    pub faqs: Vec<ExportedFaq>,
}

/// Builds an export snapshot, keeping the order of `records`
pub fn build_export(records: &[FaqRecord]) -> FaqExport {
    let faqs = records
        .iter()
        .map(|faq| ExportedFaq {
            question: faq.question.clone(),
            answer: faq.answer.clone(),
            source: faq.source_url.clone(),
            published: faq.published,
            confidence: faq.confidence,
            created_at: faq.created_at.clone(),
        })
        .collect::<Vec<_>>();

    FaqExport {
        export_date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        total_faqs: faqs.len(),
        faqs,
    }
}

/// File name used for an export written at the current time
pub fn export_file_name() -> String {
    format!("faqs-export-{}.json", Utc::now().timestamp_millis())
}

/// Writes an export as pretty-printed JSON into `dir`
///
/// # Arguments
///
/// * `export` - The snapshot to write
/// * `dir` - Directory that receives `faqs-export-<unix-ms>.json`
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the written file
/// * `Err(OutputError)` - Failed to serialize or write
pub fn write_export(export: &FaqExport, dir: &Path) -> OutputResult<PathBuf> {
    let path = dir.join(export_file_name());
    let json = serde_json::to_string_pretty(export)?;

    let mut file = File::create(&path)?;
    file.write_all(json.as_bytes())?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, published: bool) -> FaqRecord {
        FaqRecord {
            id,
            job_id: 1,
            page_id: 1,
            source_url: "https://a.test/help".to_string(),
            source_section: Some("Help".to_string()),
            question: format!("Question {}?", id),
            answer: "An answer.".to_string(),
            confidence: 0.8,
            published,
            edited: false,
            created_at: "2024-05-01T10:00:00.000000Z".to_string(),
            updated_at: "2024-05-01T10:00:00.000000Z".to_string(),
        }
    }

    #[test]
    fn test_export_envelope() {
        let export = build_export(&[record(2, true), record(1, false)]);
        assert_eq!(export.total_faqs, 2);
        assert_eq!(export.faqs[0].question, "Question 2?");

        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["totalFAQs"], 2);
        assert!(json["exportDate"].is_string());
        assert_eq!(json["faqs"][0]["source"], "https://a.test/help");
        assert_eq!(json["faqs"][0]["published"], true);
        assert_eq!(json["faqs"][1]["createdAt"], "2024-05-01T10:00:00.000000Z");
        assert!(json["faqs"][0].get("sourceSection").is_none());
    }

    #[test]
    fn test_empty_export() {
        let export = build_export(&[]);
        assert_eq!(export.total_faqs, 0);
        assert!(export.faqs.is_empty());
    }

    #[test]
    fn test_write_export() {
        let dir = tempfile::tempdir().unwrap();
        let export = build_export(&[record(1, true)]);

        let path = write_export(&export, dir.path()).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("faqs-export-"));
        assert!(name.ends_with(".json"));

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["totalFAQs"], 1);
    }
}

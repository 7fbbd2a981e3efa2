//! Serializing buffer contents for download

use super::types::{iso_timestamp, LogRecord};
use super::CaptureError;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Text,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Text => "txt",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Text => "text/plain",
            ExportFormat::Csv => "text/csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "txt" | "text" => Ok(ExportFormat::Text),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(CaptureError::UnknownFormat(other.to_string())),
        }
    }
}

/// Content ready to hand to an [`ExportSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub content: String,
    pub filename: String,
    pub mime_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Nothing to export
    Empty,
    Ready(ExportArtifact),
}

/// Build an artifact from records in insertion order
pub fn build_artifact(
    records: &[LogRecord],
    format: ExportFormat,
    prefix: &str,
    now: DateTime<Utc>,
) -> Result<ExportArtifact, CaptureError> {
    let content = match format {
        ExportFormat::Json => {
            let entries: Vec<_> = records.iter().map(LogRecord::to_json).collect();
            serde_json::to_string_pretty(&entries)?
        }
        ExportFormat::Text => records
            .iter()
            .map(LogRecord::format_display)
            .collect::<Vec<_>>()
            .join("\n"),
        ExportFormat::Csv => {
            let mut lines = vec!["Timestamp,Type,Data".to_string()];
            for record in records {
                lines.push(format!(
                    "{},{},{}",
                    csv_field(&record.iso_timestamp()),
                    csv_field(record.category.as_str()),
                    csv_field(&serde_json::to_string(&record.payload_json())?),
                ));
            }
            lines.join("\n")
        }
    };

    Ok(ExportArtifact {
        content,
        filename: export_filename(prefix, format, now),
        mime_type: format.mime_type(),
    })
}

/// `<prefix>_<ISO timestamp with ':' replaced by '-'>.<ext>`
pub fn export_filename(prefix: &str, format: ExportFormat, now: DateTime<Utc>) -> String {
    format!(
        "{}_{}.{}",
        prefix,
        iso_timestamp(&now).replace(':', "-"),
        format.extension()
    )
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Destination for export artifacts
pub trait ExportSink {
    /// Deliver the artifact; returns where it ended up
    fn deliver(&self, artifact: &ExportArtifact) -> Result<PathBuf, CaptureError>;
}

/// Writes artifacts as files into one directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ExportSink for DirectorySink {
    fn deliver(&self, artifact: &ExportArtifact) -> Result<PathBuf, CaptureError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(&artifact.filename);
        fs::write(&path, &artifact.content)?;
        tracing::info!(path = %path.display(), mime = artifact.mime_type, "export written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::types::Category;
    use crate::viewer::Value;
    use chrono::TimeZone;

    fn records() -> Vec<LogRecord> {
        vec![
            LogRecord::new(1, Category::new("sent"), None, vec![Value::from("say \"hi\"")]),
            LogRecord::new(2, Category::new("received"), None, vec![Value::from(2i64)]),
        ]
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 10, 20, 30).unwrap()
    }

    #[test]
    fn test_filename_replaces_colons() {
        assert_eq!(
            export_filename("inspector_logs", ExportFormat::Csv, fixed_time()),
            "inspector_logs_2024-03-05T10-20-30.000Z.csv"
        );
    }

    #[test]
    fn test_json_export_is_array_of_entries() {
        let artifact = build_artifact(&records(), ExportFormat::Json, "p", fixed_time()).unwrap();
        assert_eq!(artifact.mime_type, "application/json");
        let parsed: serde_json::Value = serde_json::from_str(&artifact.content).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
        assert_eq!(parsed[0]["type"], "sent");
        assert_eq!(parsed[1]["data"], serde_json::json!([2]));
    }

    #[test]
    fn test_csv_escapes_quotes() {
        let artifact = build_artifact(&records(), ExportFormat::Csv, "p", fixed_time()).unwrap();
        let lines: Vec<_> = artifact.content.lines().collect();
        assert_eq!(lines[0], "Timestamp,Type,Data");
        assert!(lines[1].ends_with(r#","sent","[""say \""hi\""""]""#), "{}", lines[1]);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_text_export_one_line_per_record() {
        let artifact = build_artifact(&records(), ExportFormat::Text, "p", fixed_time()).unwrap();
        assert_eq!(artifact.mime_type, "text/plain");
        let lines: Vec<_> = artifact.content.lines().collect();
        assert!(lines[1].contains("[RECEIVED] [2]"));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("TXT".parse::<ExportFormat>().unwrap(), ExportFormat::Text);
        assert!(matches!("xml".parse::<ExportFormat>(), Err(CaptureError::UnknownFormat(_))));
    }

    #[test]
    fn test_directory_sink_writes_file() {
        let dir = std::env::temp_dir().join(format!("inspector_export_{}", std::process::id()));
        let sink = DirectorySink::new(&dir);
        let artifact = build_artifact(&records(), ExportFormat::Text, "t", fixed_time()).unwrap();

        let path = sink.deliver(&artifact).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), artifact.content);
        let _ = fs::remove_dir_all(&dir);
    }
}

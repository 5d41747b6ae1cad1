use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Result;
use tracing::info;

use crate::config::ExportConfig;
use crate::error::StudioError;
use crate::model::WhiskeyRecord;

pub mod csv_exporter;
pub mod json_exporter;

pub use json_exporter::{CatalogDocument, DocumentMetadata};

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(StudioError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Writes finished record collections to disk in the configured formats
pub struct ExportManager {
    output_directory: PathBuf,
}

impl ExportManager {
    pub async fn new(config: &ExportConfig) -> Result<Self> {
        tokio::fs::create_dir_all(&config.output_directory).await?;
        Ok(Self {
            output_directory: config.output_directory.clone(),
        })
    }

    /// Export records to an explicit path, dispatching on format
    pub async fn export_to_path(
        &self,
        records: &[WhiskeyRecord],
        path: &Path,
        format: ExportFormat,
        source_file: Option<&str>,
        includes_taste_profile: bool,
    ) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        match format {
            ExportFormat::Json => {
                json_exporter::export_json(records, path, source_file, includes_taste_profile)
                    .await?;
            }
            ExportFormat::Csv => {
                csv_exporter::export_csv(records, path).await?;
            }
        }

        info!(
            path = %path.display(),
            count = records.len(),
            format = %format,
            "export complete"
        );
        Ok(())
    }

    /// Export records into the output directory under a timestamped name
    pub async fn export(
        &self,
        records: &[WhiskeyRecord],
        stem: &str,
        format: ExportFormat,
        source_file: Option<&str>,
        includes_taste_profile: bool,
    ) -> Result<PathBuf> {
        let path = self.output_directory.join(generate_filename(stem, format));
        self.export_to_path(records, &path, format, source_file, includes_taste_profile)
            .await?;
        Ok(path)
    }
}

/// Timestamped filename, e.g. `whiskey_catalog_20260830_141503.json`
fn generate_filename(stem: &str, format: ExportFormat) -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    format!("{stem}_{timestamp}.{}", format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!(" CSV ".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_generate_filename() {
        let name = generate_filename("whiskey_catalog", ExportFormat::Json);
        assert!(name.starts_with("whiskey_catalog_"));
        assert!(name.ends_with(".json"));
    }

    #[tokio::test]
    async fn test_export_creates_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExportConfig {
            output_directory: dir.path().join("nested").join("output"),
            default_format: "json".to_string(),
        };

        let manager = ExportManager::new(&config).await.unwrap();
        let path = manager
            .export(&[], "empty_catalog", ExportFormat::Json, None, true)
            .await
            .unwrap();
        assert!(path.exists());
    }
}

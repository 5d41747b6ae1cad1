use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::model::{WhiskeyRecord, TASTE_AXES};

/// Top-level shape of the exported JSON document
#[derive(Debug, Serialize)]
pub struct CatalogDocument<'a> {
    pub whiskies: &'a [WhiskeyRecord],
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Serialize)]
pub struct DocumentMetadata {
    /// ISO-8601 generation timestamp
    pub generated_at: String,
    pub total_count: usize,
    /// Whether the source data actually carried taste profiles. Records
    /// always hold a profile object; this flag tells consumers whether it
    /// is real or the all-3s default.
    pub includes_taste_profile: bool,
    pub taste_profile_attributes: [&'static str; 6],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    pub conversion_tool: String,
}

impl DocumentMetadata {
    fn new(total_count: usize, source_file: Option<&str>, includes_taste_profile: bool) -> Self {
        Self {
            generated_at: chrono::Local::now().to_rfc3339(),
            total_count,
            includes_taste_profile,
            taste_profile_attributes: TASTE_AXES,
            source_file: source_file.map(str::to_string),
            conversion_tool: format!("whiskey-studio v{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Write the catalog document as pretty-printed JSON
pub async fn export_json(
    records: &[WhiskeyRecord],
    path: &Path,
    source_file: Option<&str>,
    includes_taste_profile: bool,
) -> Result<()> {
    let document = CatalogDocument {
        whiskies: records,
        metadata: DocumentMetadata::new(records.len(), source_file, includes_taste_profile),
    };

    let content = serde_json::to_string_pretty(&document)?;
    tokio::fs::write(path, content).await?;
    Ok(())
}

use std::path::Path;

use anyhow::Result;

use crate::model::WhiskeyRecord;

/// Fixed column order for the flat CSV export. The six taste axes are
/// flattened into `taste_*` columns.
const HEADERS: [&str; 14] = [
    "id",
    "name",
    "price",
    "amount",
    "category",
    "region",
    "subcategory",
    "tastingNote_ja",
    "taste_fruity",
    "taste_spicy",
    "taste_body",
    "taste_smoky",
    "taste_sweetness",
    "taste_complexity",
];

/// Write records as UTF-8 CSV with a fixed header row
pub async fn export_csv(records: &[WhiskeyRecord], path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());

    writer.write_record(HEADERS)?;

    for record in records {
        let mut row = vec![
            record.id.clone(),
            record.name.clone(),
            record.price.clone(),
            record.amount.clone(),
            record.category.clone(),
            record.region.clone(),
            record.subcategory.clone(),
            record.tasting_note_ja.clone(),
        ];
        row.extend(record.taste_profile.values().map(|v| v.to_string()));
        writer.write_record(&row)?;
    }

    let data = writer.into_inner()?;
    tokio::fs::write(path, data).await?;
    Ok(())
}

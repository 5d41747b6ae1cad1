use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::model::{clamp_score, TasteProfile, WhiskeyRecord, PRICE_UNSET};

/// One source row, keyed by column header
pub type Row = serde_json::Map<String, Value>;

/// Canonical record fields a source column can map onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    Id,
    Name,
    Price,
    Amount,
    Category,
    Region,
    Subcategory,
    TastingNote,
    TasteProfile,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 9] = [
        Self::Id,
        Self::Name,
        Self::Price,
        Self::Amount,
        Self::Category,
        Self::Region,
        Self::Subcategory,
        Self::TastingNote,
        Self::TasteProfile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Price => "price",
            Self::Amount => "amount",
            Self::Category => "category",
            Self::Region => "region",
            Self::Subcategory => "subcategory",
            Self::TastingNote => "tastingNote_ja",
            Self::TasteProfile => "taste_profile",
        }
    }

    /// Keywords that identify a source column for this field. Matching is
    /// case-insensitive substring containment, tried in listed order.
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Id => &["id", "ID", "番号", "No", "no"],
            Self::Name => &[
                "name", "Name", "ウィスキー名", "whiskey", "whisky", "商品名", "製品名",
            ],
            Self::Price => &["price", "Price", "価格", "値段", "単価"],
            Self::Amount => &["amount", "Amount", "容量価格", "容量", "volume"],
            Self::Category => &["category", "Category", "カテゴリ", "分類", "type"],
            Self::Region => &["region", "Region", "地域", "産地", "country", "国"],
            Self::Subcategory => &["subcategory", "SubCategory", "サブカテゴリ", "詳細分類"],
            Self::TastingNote => &["tasting", "note", "テイスティング", "ノート", "味", "香り"],
            Self::TasteProfile => &["taste_profile", "profile", "プロファイル", "味覚", "テイスト"],
        }
    }
}

/// Mapping from canonical fields to source column headers
#[derive(Debug, Clone, Default)]
pub struct ColumnMapping {
    columns: HashMap<CanonicalField, String>,
}

impl ColumnMapping {
    /// Detect the mapping from a header row by keyword matching. For each
    /// field the first column whose header contains any keyword wins; a
    /// column may serve multiple fields.
    pub fn auto_detect(headers: &[String]) -> Self {
        let mut columns = HashMap::new();

        for field in CanonicalField::ALL {
            'outer: for header in headers {
                let lowered = header.to_lowercase();
                for keyword in field.keywords() {
                    if lowered.contains(&keyword.to_lowercase()) {
                        debug!(field = field.as_str(), column = %header, "column mapped");
                        columns.insert(field, header.clone());
                        break 'outer;
                    }
                }
            }
        }

        Self { columns }
    }

    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        self.columns.get(&field).map(String::as_str)
    }

    /// Pin a field to an explicit column, overriding detection
    pub fn set(&mut self, field: CanonicalField, column: impl Into<String>) {
        self.columns.insert(field, column.into());
    }

    pub fn is_mapped(&self, field: CanonicalField) -> bool {
        self.columns.contains_key(&field)
    }
}

/// Convert one source row into a canonical record. Missing, null, and empty
/// cells leave the field at its default. Returns `None` when the row has no
/// usable name.
pub fn normalize_row(row: &Row, mapping: &ColumnMapping, entry_id: usize) -> Option<WhiskeyRecord> {
    let mut record = WhiskeyRecord::with_defaults(entry_id);

    for field in CanonicalField::ALL {
        let Some(column) = mapping.get(field) else {
            continue;
        };
        let Some(cell) = row.get(column) else {
            continue;
        };
        if cell_is_empty(cell) {
            continue;
        }

        match field {
            CanonicalField::Id => record.id = stringify(cell),
            CanonicalField::Name => record.name = stringify(cell).trim().to_string(),
            CanonicalField::Price => record.price = format_price(cell),
            CanonicalField::Amount => record.amount = format_price(cell),
            CanonicalField::Category => record.category = stringify(cell),
            CanonicalField::Region => record.region = stringify(cell),
            CanonicalField::Subcategory => record.subcategory = stringify(cell),
            CanonicalField::TastingNote => record.tasting_note_ja = stringify(cell),
            CanonicalField::TasteProfile => record.taste_profile = parse_taste_profile(cell),
        }
    }

    if record.name.is_empty() {
        return None;
    }

    Some(record)
}

fn cell_is_empty(cell: &Value) -> bool {
    match cell {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn stringify(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render a price cell as a yen string.
///
/// Numbers are truncated to an integer and grouped with thousands
/// separators. Strings get their first digit run extracted and grouped; a
/// string with no digits keeps its raw text behind the yen sign.
pub fn format_price(cell: &Value) -> String {
    match cell {
        Value::Number(n) => {
            let amount = n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64));
            match amount {
                Some(v) => yen(v),
                None => PRICE_UNSET.to_string(),
            }
        }
        Value::String(s) => {
            let first_run = digit_run().find(s);
            match first_run.and_then(|m| m.as_str().parse::<i64>().ok()) {
                Some(v) => yen(v),
                None => format!("¥{s}"),
            }
        }
        other => format!("¥{}", stringify(other)),
    }
}

fn digit_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Literal pattern, cannot fail to compile
    RE.get_or_init(|| Regex::new(r"\d+").unwrap())
}

fn yen(amount: i64) -> String {
    format!("¥{}", group_thousands(amount))
}

fn group_thousands(amount: i64) -> String {
    let digits = amount.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Parse a taste-profile cell. Only a comma-separated list of exactly six
/// integers counts; everything else becomes the all-3s default.
pub fn parse_taste_profile(cell: &Value) -> TasteProfile {
    let Value::String(s) = cell else {
        return TasteProfile::default();
    };

    let parts: Vec<i64> = s
        .split(',')
        .map(|p| p.trim().parse::<i64>())
        .collect::<Result<_, _>>()
        .unwrap_or_default();

    if parts.len() != 6 {
        return TasteProfile::default();
    }

    let mut values = [3i64; 6];
    for (slot, part) in values.iter_mut().zip(parts) {
        *slot = i64::from(clamp_score(part));
    }
    TasteProfile::from_values(values)
}

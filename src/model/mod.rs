use serde::{Deserialize, Serialize};

/// Sentinel used when a price or volume-price is not set
pub const PRICE_UNSET: &str = "¥未設定";

/// Fixed top-level category for every record
pub const DEFAULT_CATEGORY: &str = "Whiskey";

/// Default region when nothing better is known
pub const DEFAULT_REGION: &str = "Unknown";

/// Default subcategory for spreadsheet-converted rows
pub const DEFAULT_SUBCATEGORY: &str = "Single Malt Whisky";

/// The six sensory axes, in canonical order. Comma-separated profile cells
/// are interpreted in exactly this order.
pub const TASTE_AXES: [&str; 6] = ["fruity", "spicy", "body", "smoky", "sweetness", "complexity"];

/// Six-axis taste profile on a 1-5 integer scale.
///
/// Invariant: all six keys are always present and every value is in [1, 5].
/// No partial profile ever leaves the pipeline; anything unscorable becomes
/// the all-3s default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TasteProfile {
    pub fruity: u8,
    pub spicy: u8,
    pub body: u8,
    pub smoky: u8,
    pub sweetness: u8,
    pub complexity: u8,
}

impl Default for TasteProfile {
    fn default() -> Self {
        Self {
            fruity: 3,
            spicy: 3,
            body: 3,
            smoky: 3,
            sweetness: 3,
            complexity: 3,
        }
    }
}

impl TasteProfile {
    /// Build a profile from six values in canonical axis order, clamping
    /// each into [1, 5].
    pub fn from_values(values: [i64; 6]) -> Self {
        Self {
            fruity: clamp_score(values[0]),
            spicy: clamp_score(values[1]),
            body: clamp_score(values[2]),
            smoky: clamp_score(values[3]),
            sweetness: clamp_score(values[4]),
            complexity: clamp_score(values[5]),
        }
    }

    /// Values in canonical axis order
    pub fn values(&self) -> [u8; 6] {
        [
            self.fruity,
            self.spicy,
            self.body,
            self.smoky,
            self.sweetness,
            self.complexity,
        ]
    }

    /// Short summary line for progress output, e.g. `F:4 S:1 B:3`
    pub fn summary(&self) -> String {
        format!("F:{} S:{} B:{}", self.fruity, self.smoky, self.body)
    }
}

/// Clamp a raw score into the 1-5 scale
pub fn clamp_score(value: i64) -> u8 {
    value.clamp(1, 5) as u8
}

/// Structured classification returned by the LLM for one whiskey.
///
/// `confidence` is optional in the model response; the other five fields are
/// required for a response to count as parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub classification: String,
    pub region: String,
    pub sub_category: String,
    pub tasting_notes_english: String,
    pub tasting_notes_japanese: String,
    #[serde(default)]
    pub confidence: String,
}

impl Classification {
    /// Canned low-confidence substitute used whenever analysis fails.
    ///
    /// This is a first-class, always-valid result; downstream code never
    /// special-cases it.
    pub fn fallback(name: &str) -> Self {
        Self {
            classification: "Other Whiskey".to_string(),
            region: DEFAULT_REGION.to_string(),
            sub_category: "Unknown".to_string(),
            tasting_notes_english: format!(
                "Analysis failed for {name}. Manual verification required."
            ),
            tasting_notes_japanese: format!("{name}の分析に失敗しました。手動での確認が必要です。"),
            confidence: "Low".to_string(),
        }
    }
}

/// Tagged result of an LLM call. Both arms carry a structurally valid value,
/// so callers never branch on presence; only logging and statistics consult
/// the tag.
#[derive(Debug, Clone)]
pub enum LlmOutcome<T> {
    /// The response yielded a qualifying JSON object
    Parsed(T),
    /// Analysis failed somewhere; `value` is the canned substitute
    Fallback { value: T, reason: String },
}

impl<T> LlmOutcome<T> {
    pub fn value(&self) -> &T {
        match self {
            Self::Parsed(v) => v,
            Self::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Parsed(v) => v,
            Self::Fallback { value, .. } => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// One fully analyzed item from the enrichment pipeline: classifier output,
/// taste profile, and the untouched original name.
#[derive(Debug, Clone, Serialize)]
pub struct WhiskeyAnalysis {
    pub original_name: String,
    #[serde(flatten)]
    pub classification: Classification,
    pub taste_profile: TasteProfile,
}

impl WhiskeyAnalysis {
    /// Project the analysis onto the canonical record shape. `entry_id` is
    /// the 1-based position within the batch.
    pub fn into_record(self, entry_id: usize) -> WhiskeyRecord {
        WhiskeyRecord {
            id: entry_id.to_string(),
            name: self.original_name,
            price: PRICE_UNSET.to_string(),
            amount: PRICE_UNSET.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            region: self.classification.region,
            subcategory: self.classification.classification,
            tasting_note_ja: self.classification.tasting_notes_japanese,
            taste_profile: self.taste_profile,
        }
    }
}

/// Canonical whiskey record. Every enrichment and normalization path
/// converges onto this schema; records are immutable once appended to a
/// batch result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhiskeyRecord {
    pub id: String,
    pub name: String,
    pub price: String,
    pub amount: String,
    pub category: String,
    pub region: String,
    pub subcategory: String,
    #[serde(rename = "tastingNote_ja")]
    pub tasting_note_ja: String,
    pub taste_profile: TasteProfile,
}

impl WhiskeyRecord {
    /// Record pre-filled with every field at its default, ready for the
    /// column mapper to overwrite from cells.
    pub fn with_defaults(entry_id: usize) -> Self {
        Self {
            id: entry_id.to_string(),
            name: String::new(),
            price: PRICE_UNSET.to_string(),
            amount: PRICE_UNSET.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            region: DEFAULT_REGION.to_string(),
            subcategory: DEFAULT_SUBCATEGORY.to_string(),
            tasting_note_ja: String::new(),
            taste_profile: TasteProfile::default(),
        }
    }
}

/// Cumulative counters for one batch run. Mutated only by the enrichment
/// pipeline; `processed == successful + skipped` holds at all times.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    pub processed: usize,
    pub successful: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
    pub taste_profiles_generated: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_is_all_threes() {
        let profile = TasteProfile::default();
        assert_eq!(profile.values(), [3, 3, 3, 3, 3, 3]);
    }

    #[test]
    fn test_from_values_clamps() {
        let profile = TasteProfile::from_values([0, 7, 1, 5, -2, 3]);
        assert_eq!(profile.values(), [1, 5, 1, 5, 1, 3]);
    }

    #[test]
    fn test_profile_serializes_all_six_keys() {
        let json = serde_json::to_value(TasteProfile::default()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 6);
        for axis in TASTE_AXES {
            assert_eq!(obj.get(axis).and_then(|v| v.as_i64()), Some(3));
        }
    }

    #[test]
    fn test_fallback_classification() {
        let fallback = Classification::fallback("山崎 12年");
        assert_eq!(fallback.classification, "Other Whiskey");
        assert_eq!(fallback.region, "Unknown");
        assert_eq!(fallback.sub_category, "Unknown");
        assert_eq!(fallback.confidence, "Low");
        assert!(fallback.tasting_notes_japanese.contains("山崎 12年"));
    }

    #[test]
    fn test_analysis_into_record() {
        let analysis = WhiskeyAnalysis {
            original_name: "Macallan 12".to_string(),
            classification: Classification {
                classification: "Scotch Whisky".to_string(),
                region: "Speyside".to_string(),
                sub_category: "Single Malt".to_string(),
                tasting_notes_english: "Sherry and oak".to_string(),
                tasting_notes_japanese: "シェリーとオーク".to_string(),
                confidence: "High".to_string(),
            },
            taste_profile: TasteProfile::default(),
        };

        let record = analysis.into_record(3);
        assert_eq!(record.id, "3");
        assert_eq!(record.name, "Macallan 12");
        assert_eq!(record.price, PRICE_UNSET);
        assert_eq!(record.category, "Whiskey");
        assert_eq!(record.subcategory, "Scotch Whisky");
        assert_eq!(record.region, "Speyside");
        assert_eq!(record.tasting_note_ja, "シェリーとオーク");
    }

    #[test]
    fn test_record_serde_field_names() {
        let record = WhiskeyRecord::with_defaults(1);
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("tastingNote_ja").is_some());
        assert_eq!(json.get("amount").and_then(|v| v.as_str()), Some(PRICE_UNSET));
    }
}

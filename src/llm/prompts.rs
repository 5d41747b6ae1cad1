//! Prompt templates for the two completion calls.
//!
//! The wording is part of the contract: the classification prompt pins the
//! closed category set and the taste prompt embeds the scoring rubric
//! verbatim, so both are kept as fixed templates rather than built
//! dynamically.

/// Search context is truncated to this many characters before being
/// embedded in the classification prompt.
pub const CONTEXT_LIMIT_CHARS: usize = 1500;

/// Build the classification prompt for one whiskey
pub fn classification_prompt(name: &str, search_context: &str) -> String {
    let context: String = search_context.chars().take(CONTEXT_LIMIT_CHARS).collect();

    format!(
        r#"以下のウィスキーを分析し、JSON形式で情報を提供してください：

ウィスキー名: {name}
検索情報: {context}

以下のJSON形式で回答してください：
{{
    "classification": "ウィスキーの分類",
    "region": "生産地域",
    "sub_category": "詳細カテゴリ",
    "tasting_notes_english": "英語テイスティングノート (100-300文字)",
    "tasting_notes_japanese": "日本語テイスティングノート (100-300文字)",
    "confidence": "High/Medium/Low"
}}

classificationは以下から選択：
- Scotch Whisky (スコッチウィスキー)
- Irish Whiskey (アイリッシュウィスキー)
- Japanese Whisky (ジャパニーズウィスキー)
- American Whiskey (アメリカンウィスキー)
- Other Whiskey (その他ウィスキー)

JSONのみで回答してください。"#
    )
}

/// Build the six-axis taste scoring prompt for one whiskey
pub fn taste_prompt(name: &str, tasting_note: &str) -> String {
    format!(
        r#"以下のウィスキーのテイスティングノートを分析し、味覚プロファイルを6項目で採点してください。

ウィスキー名: {name}
テイスティングノート: {tasting_note}

以下の6項目を1-5のスケールで採点し、JSON形式で回答してください：
- fruity (フルーティー): 果物の風味の強さ
- spicy (スパイシー): スパイスやペッパーの強さ
- body (ボディ): 重厚感・ボディの強さ
- smoky (スモーキー): ピート・煙の強さ
- sweetness (甘さ): 甘味の強さ
- complexity (複雑さ): 味の複雑性・層の豊富さ

採点基準:
1: 非常に弱い/ほとんどない
2: 弱い/少ない
3: 中程度/バランス
4: 強い/明確
5: 非常に強い/支配的

JSONフォーマット:
{{
    "taste_profile": {{
        "fruity": 数値,
        "spicy": 数値,
        "body": 数値,
        "smoky": 数値,
        "sweetness": 数値,
        "complexity": 数値
    }}
}}

必ずJSONのみで回答してください。"#
    )
}

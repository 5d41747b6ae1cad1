use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::llm::classifier::Classifier;
use crate::llm::scorer::TasteScorer;
use crate::llm::{ChatApi, ChatClient};
use crate::model::{RunStats, WhiskeyAnalysis};
use crate::search::{SnippetSearch, WebSearchClient};

/// Normalize an incoming item name: trim and collapse internal whitespace
/// runs to single spaces. Unconditional first step for every identifier.
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One input item for a batch run
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub name: String,
    /// Pre-existing tasting note from the source table, preferred over the
    /// classifier's note when scoring
    pub tasting_note: Option<String>,
}

impl BatchItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tasting_note: None,
        }
    }
}

/// Progress notification emitted once per item, after the item settles
#[derive(Debug)]
pub struct BatchProgress<'a> {
    pub index: usize,
    pub total: usize,
    pub name: &'a str,
    /// `None` when the item was skipped
    pub outcome: Option<&'a WhiskeyAnalysis>,
}

impl BatchProgress<'_> {
    /// One-line status for the shell, e.g. `Macallan 12: Scotch Whisky (F:4 S:1 B:3)`
    pub fn summary(&self) -> String {
        match self.outcome {
            Some(analysis) => format!(
                "{}: {} ({})",
                self.name,
                analysis.classification.classification,
                analysis.taste_profile.summary()
            ),
            None => format!("{}: 処理失敗", self.name),
        }
    }
}

/// Result of one batch run: the record collection and the final statistics
#[derive(Debug)]
pub struct BatchReport {
    pub records: Vec<WhiskeyAnalysis>,
    pub stats: RunStats,
}

/// Sequences search, classification, and taste scoring for each item and
/// owns the run statistics.
///
/// Items are processed strictly one at a time; a failure in one item never
/// aborts the batch.
pub struct EnrichmentPipeline {
    search: Arc<dyn SnippetSearch>,
    classifier: Classifier,
    scorer: TasteScorer,
    delay: Duration,
    stats: RunStats,
}

impl EnrichmentPipeline {
    pub fn new(search: Arc<dyn SnippetSearch>, chat: Arc<dyn ChatApi>, delay: Duration) -> Self {
        Self {
            search,
            classifier: Classifier::new(chat.clone()),
            scorer: TasteScorer::new(chat),
            delay,
            stats: RunStats::default(),
        }
    }

    /// Build a pipeline with real network clients from the configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let search: Arc<dyn SnippetSearch> = Arc::new(WebSearchClient::new(&config.search)?);
        let chat: Arc<dyn ChatApi> = Arc::new(ChatClient::new(&config.llm)?);
        Ok(Self::new(
            search,
            chat,
            Duration::from_millis(config.pipeline.inter_call_delay_ms),
        ))
    }

    /// Analyze one item. Returns `None` when the item is skipped, either
    /// because the normalized name is empty (no error recorded) or because
    /// an unexpected error escaped the inner steps (recorded in stats).
    pub async fn process(
        &mut self,
        raw_name: &str,
        existing_note: Option<&str>,
    ) -> Option<WhiskeyAnalysis> {
        self.stats.processed += 1;

        let clean_name = normalize_name(raw_name);
        if clean_name.is_empty() {
            self.stats.skipped += 1;
            return None;
        }

        info!(name = %clean_name, "processing item");

        match self.process_inner(&clean_name, raw_name, existing_note).await {
            Ok(analysis) => {
                self.stats.successful += 1;
                Some(analysis)
            }
            Err(e) => {
                warn!(name = %clean_name, error = %e, "item processing failed");
                self.stats.skipped += 1;
                self.stats.errors.push(format!("{raw_name}の処理エラー: {e}"));
                None
            }
        }
    }

    async fn process_inner(
        &mut self,
        clean_name: &str,
        raw_name: &str,
        existing_note: Option<&str>,
    ) -> Result<WhiskeyAnalysis> {
        let search_info = self.search.lookup(clean_name).await?;
        self.pause().await;

        let classified = self.classifier.classify(clean_name, &search_info).await;
        self.pause().await;

        // Prefer a caller-supplied tasting note; otherwise score the
        // classifier's Japanese note.
        let tasting_text = existing_note
            .map(str::trim)
            .filter(|note| !note.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| classified.value().tasting_notes_japanese.clone());

        let scored = self.scorer.score(clean_name, &tasting_text).await;
        if !scored.is_fallback() {
            self.stats.taste_profiles_generated += 1;
        }
        self.pause().await;

        Ok(WhiskeyAnalysis {
            original_name: raw_name.to_string(),
            classification: classified.into_value(),
            taste_profile: scored.into_value(),
        })
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    /// Drive a whole batch sequentially, emitting one progress event per
    /// item. Per-item failures are absorbed; the batch always runs to the
    /// end of the list.
    pub async fn run_batch<F>(&mut self, items: &[BatchItem], mut progress: F) -> BatchReport
    where
        F: FnMut(BatchProgress<'_>),
    {
        info!(total = items.len(), "starting batch run");
        let mut records = Vec::new();

        for (index, item) in items.iter().enumerate() {
            let outcome = self.process(&item.name, item.tasting_note.as_deref()).await;

            progress(BatchProgress {
                index,
                total: items.len(),
                name: &item.name,
                outcome: outcome.as_ref(),
            });

            if let Some(analysis) = outcome {
                records.push(analysis);
            }
        }

        let stats = self.stats.clone();
        info!(
            successful = stats.successful,
            skipped = stats.skipped,
            profiles = stats.taste_profiles_generated,
            "batch run finished"
        );

        BatchReport { records, stats }
    }

    /// Snapshot of the cumulative run statistics
    pub fn stats(&self) -> RunStats {
        self.stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatOptions;
    use crate::model::TasteProfile;
    use async_trait::async_trait;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  マッカラン   12年  "), "マッカラン 12年");
        assert_eq!(normalize_name("Lagavulin\t16\nYear"), "Lagavulin 16 Year");
        assert_eq!(normalize_name("   "), "");
    }

    /// Chat mock that answers the taste prompt with a fixed profile and the
    /// classification prompt with a fixed classification.
    struct ScriptedChat;

    #[async_trait]
    impl crate::llm::ChatApi for ScriptedChat {
        async fn complete(&self, prompt: &str, _options: &ChatOptions) -> Result<String> {
            if prompt.contains("味覚プロファイル") {
                Ok(r#"{"taste_profile": {"fruity": 4, "spicy": 2, "body": 3, "smoky": 1, "sweetness": 4, "complexity": 4}}"#.to_string())
            } else {
                Ok(r#"{
                    "classification": "Scotch Whisky",
                    "region": "Speyside",
                    "sub_category": "Single Malt",
                    "tasting_notes_english": "Sherry, dried fruit, oak.",
                    "tasting_notes_japanese": "シェリー、ドライフルーツ、オーク。",
                    "confidence": "High"
                }"#
                .to_string())
            }
        }
    }

    /// Chat mock whose transport always fails
    struct FailingChat;

    #[async_trait]
    impl crate::llm::ChatApi for FailingChat {
        async fn complete(&self, _prompt: &str, _options: &ChatOptions) -> Result<String> {
            Err(anyhow::anyhow!("connection refused"))
        }
    }

    struct StubSearch;

    #[async_trait]
    impl SnippetSearch for StubSearch {
        async fn lookup(&self, name: &str) -> Result<String> {
            Ok(format!("{name}: a well reviewed single malt"))
        }
    }

    /// Search mock that errors for one specific name
    struct FlakySearch {
        poison: &'static str,
    }

    #[async_trait]
    impl SnippetSearch for FlakySearch {
        async fn lookup(&self, name: &str) -> Result<String> {
            if name == self.poison {
                Err(anyhow::anyhow!("socket closed unexpectedly"))
            } else {
                Ok(format!("{name}: tasting information"))
            }
        }
    }

    fn test_pipeline(
        search: Arc<dyn SnippetSearch>,
        chat: Arc<dyn crate::llm::ChatApi>,
    ) -> EnrichmentPipeline {
        EnrichmentPipeline::new(search, chat, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_successful_item() {
        let mut pipeline = test_pipeline(Arc::new(StubSearch), Arc::new(ScriptedChat));

        let analysis = pipeline.process(" マッカラン 12年 ", None).await.unwrap();
        assert_eq!(analysis.original_name, " マッカラン 12年 ");
        assert_eq!(analysis.classification.classification, "Scotch Whisky");
        assert_eq!(analysis.taste_profile.fruity, 4);

        let stats = pipeline.stats();
        assert_eq!(stats.processed, 1);
        assert_eq!(stats.successful, 1);
        assert_eq!(stats.skipped, 0);
        assert_eq!(stats.taste_profiles_generated, 1);
        assert!(stats.errors.is_empty());
    }

    #[tokio::test]
    async fn test_empty_name_skipped_without_error() {
        let mut pipeline = test_pipeline(Arc::new(StubSearch), Arc::new(ScriptedChat));

        assert!(pipeline.process("   ", None).await.is_none());

        let stats = pipeline.stats();
        assert_eq!(stats.processed, 1);
        assert_eq!(stats.successful, 0);
        assert_eq!(stats.skipped, 1);
        assert!(stats.errors.is_empty());
        assert_eq!(stats.processed, stats.successful + stats.skipped);
    }

    #[tokio::test]
    async fn test_chat_failure_yields_fallback_record() {
        let mut pipeline = test_pipeline(Arc::new(StubSearch), Arc::new(FailingChat));

        // Both completion calls fail, but the item still succeeds with the
        // canned classification and the default profile.
        let analysis = pipeline.process("Unknown Dram", None).await.unwrap();
        assert_eq!(analysis.classification.classification, "Other Whiskey");
        assert_eq!(analysis.classification.confidence, "Low");
        assert_eq!(analysis.taste_profile, TasteProfile::default());

        let stats = pipeline.stats();
        assert_eq!(stats.successful, 1);
        assert_eq!(stats.taste_profiles_generated, 0);
    }

    #[tokio::test]
    async fn test_existing_note_preferred_for_scoring() {
        struct NoteCapturingChat;

        #[async_trait]
        impl crate::llm::ChatApi for NoteCapturingChat {
            async fn complete(&self, prompt: &str, _options: &ChatOptions) -> Result<String> {
                if prompt.contains("味覚プロファイル") {
                    assert!(prompt.contains("蔵出しの甘いシェリー香"));
                    Ok(r#"{"taste_profile": {"fruity": 5, "spicy": 1, "body": 3, "smoky": 1, "sweetness": 5, "complexity": 3}}"#.to_string())
                } else {
                    Ok(r#"{
                        "classification": "Japanese Whisky",
                        "region": "日本",
                        "sub_category": "Single Malt",
                        "tasting_notes_english": "n",
                        "tasting_notes_japanese": "classifier note"
                    }"#
                    .to_string())
                }
            }
        }

        let mut pipeline = test_pipeline(Arc::new(StubSearch), Arc::new(NoteCapturingChat));
        let analysis = pipeline
            .process("山崎 12年", Some("蔵出しの甘いシェリー香"))
            .await
            .unwrap();
        assert_eq!(analysis.taste_profile.sweetness, 5);
    }

    #[tokio::test]
    async fn test_batch_continues_past_search_failure() {
        let search = Arc::new(FlakySearch { poison: "item two" });
        let mut pipeline = test_pipeline(search, Arc::new(ScriptedChat));

        let items = vec![
            BatchItem::new("item one"),
            BatchItem::new("item two"),
            BatchItem::new("item three"),
        ];

        let mut events = 0;
        let report = pipeline.run_batch(&items, |_| events += 1).await;

        assert_eq!(events, 3);
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.stats.processed, 3);
        assert_eq!(report.stats.successful, 2);
        assert_eq!(report.stats.skipped, 1);
        assert_eq!(report.stats.errors.len(), 1);
        assert!(report.stats.errors[0].contains("item two"));
        // Item three was still processed after the failure
        assert_eq!(report.records[1].original_name, "item three");
    }

    #[tokio::test]
    async fn test_progress_summary_lines() {
        let mut pipeline = test_pipeline(Arc::new(StubSearch), Arc::new(ScriptedChat));
        let items = vec![BatchItem::new("Macallan 12")];

        let mut lines = Vec::new();
        pipeline
            .run_batch(&items, |progress| lines.push(progress.summary()))
            .await;

        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("Scotch Whisky"));
        assert!(lines[0].contains("F:4 S:1 B:3"));
    }
}

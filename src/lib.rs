//! # Whiskey Studio
//!
//! Catalog enrichment and normalization for whiskey menu data.
//!
//! Two independent front halves feed one canonical back half:
//!
//! - **Enrichment**: for each whiskey name, gather web-search snippets,
//!   classify via an LLM, then score a six-axis taste profile. Per-item
//!   failures collapse into well-formed fallback values; a batch always
//!   runs to completion.
//! - **Normalization**: map raw tabular rows onto the canonical record
//!   schema by auto-detected or declared column mappings.
//!
//! Both paths converge on [`model::WhiskeyRecord`] and export through
//! [`export::ExportManager`].

pub mod config;
pub mod error;
pub mod export;
pub mod llm;
pub mod logging;
pub mod mapping;
pub mod model;
pub mod pipeline;
pub mod search;

pub use config::AppConfig;
pub use error::{StudioError, StudioResult};
pub use model::{RunStats, TasteProfile, WhiskeyRecord};
pub use pipeline::EnrichmentPipeline;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

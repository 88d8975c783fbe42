//! Shared types, error model, and configuration for CourseCraft.
//!
//! This crate is the foundation depended on by all other CourseCraft crates.
//! It provides:
//! - [`CourseCraftError`]: the unified error type
//! - Domain types ([`Query`], [`GeneratedContent`], [`SearchResult`], [`RenderedDocument`])
//! - The per-user [`Session`] context handed in and out of every workflow
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod session;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BrandingConfig, DefaultsConfig, OpenAiConfig, RelevanceConfig, SearchConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from, validate_api_key,
    validate_search_keys,
};
pub use error::{CourseCraftError, Result};
pub use session::Session;
pub use types::{ContentKind, DocumentFormat, GeneratedContent, Query, RenderedDocument, SearchResult};

//! Shared types, error model, and configuration for ContentAgent.
//!
//! This crate is the foundation depended on by all other ContentAgent crates.
//! It provides:
//! - [`ContentAgentError`], the unified error type, and [`StageError`] for
//!   failures tagged with the pipeline stage they happened in
//! - Domain types ([`PromptSpec`], [`ShapeDescription`], [`Envelope`], [`Stage`])
//! - Configuration ([`AppConfig`], config loading, credential resolution)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, GeminiSettings, config_dir, config_file_path, init_config,
    load_config, load_config_from, resolve_api_key,
};
pub use error::{ContentAgentError, DecodeDiagnostics, Result, StageError};
pub use types::{
    ArtifactRecord, Envelope, FieldSpec, PayloadKind, PromptInput, PromptSpec, ShapeDescription,
    Stage, Status,
};

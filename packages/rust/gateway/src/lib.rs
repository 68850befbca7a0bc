//! Text-generation gateway.
//!
//! The rest of the workspace only sees the [`Gateway`] trait: one prompt in,
//! one block of free text out. [`GeminiClient`] is the production backend;
//! tests substitute scripted implementations.

mod gemini;

use std::future::Future;

use contentagent_shared::Result;

pub use gemini::{GeminiClient, GeminiConfig};

/// Anything that turns a prompt into free-form response text.
///
/// Implementations must fail with `GatewayFailure` on transport errors,
/// non-success responses, or when the backend produces no text at all.
pub trait Gateway: Send + Sync {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

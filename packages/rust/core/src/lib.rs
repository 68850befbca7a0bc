//! Task orchestration for ContentAgent.
//!
//! This crate ties the prompt builders, the generation gateway, the recovery
//! pipeline and the artifact store into the four operator-facing tasks
//! (analyze, plan, create, optimize).

pub mod agent;
pub mod pipeline;
pub mod prompts;

#[cfg(test)]
mod testing;

pub use agent::{ANALYSIS_FILE, ContentAgent, PLAN_FILE, calendar_entries};
pub use pipeline::{ProgressReporter, SilentProgress, TaskOutput, TaskPipeline};

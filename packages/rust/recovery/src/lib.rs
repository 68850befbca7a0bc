//! Response-to-structured-data recovery.
//!
//! Turns free-form model output into schema-conforming JSON in four steps:
//!
//! 1. [`normalize`] isolates the payload span from fences and prose
//! 2. [`recover`] decodes it, falling back to a fixed chain of [`RepairPass`]es
//! 3. [`validate`] checks the required top-level fields of the task's shape
//! 4. [`LengthPolicy`] optionally fills and clamps content-length metadata
//!
//! Every step is a pure function over text or values; none of them touch I/O.

mod length;
mod normalize;
mod parser;
mod repair;
mod validate;

pub use length::{LengthPolicy, MAX_LENGTH, MIN_LENGTH, clamp_length, default_length_for};
pub use normalize::normalize;
pub use parser::{Recovered, RepairReport, recover};
pub use repair::RepairPass;
pub use validate::validate;

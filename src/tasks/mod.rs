//! Background Tasks Module
//!
//! Contains background tasks started explicitly by process bootstrap code.
//!
//! # Tasks
//! - Warm-up: exercises the cache once so first use is not cold

mod warmup;

pub use warmup::{is_warmed_up, warm_up, WarmUp};

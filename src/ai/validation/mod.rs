//! Model Output Validation
//!
//! Best-effort recovery of structured data from free-form model replies.

mod json_repair;

pub use json_repair::{Recovery, recover_json};

//! Submission status reporting.

pub mod reducer;

pub use reducer::{RemarkContent, StatusReducer, STATUS_CONNECTING, STATUS_STILL_WAITING};

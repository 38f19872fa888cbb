//! Service layer: awaiting responses and queue housekeeping.

pub mod awaiter;

pub use awaiter::{await_response, cleanup_task, DEFAULT_RESPONSE_TTL};

//! Remote analysis service client.

pub mod http_submitter;

pub use http_submitter::{DEFAULT_TIMEOUT, HttpFrameSubmitter};

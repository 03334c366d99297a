//! Shared request context and error plumbing for Sigma crates

mod context;
mod error;

pub use context::{REQUEST_ID_HEADER, RequestContext};
pub use error::HttpError;

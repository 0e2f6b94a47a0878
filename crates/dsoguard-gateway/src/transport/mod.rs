//! Transport layer (HTTP/JSON).
//!
//! Handlers decode the request body once, then pass typed requests to the
//! engine. Errors are rendered as `{"error":{"code","message"}}`.

pub mod http;

pub use http::ApiError;

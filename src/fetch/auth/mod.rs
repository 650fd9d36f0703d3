//! [`HttpClient`](super::HttpClient) wrappers that attach credentials to every request.

mod api_key;

pub use api_key::ApiKey;

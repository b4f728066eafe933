pub mod http;
pub mod size;

// Re-export main utilities
pub use http::{http_status_is_ok, HttpClient, HttpError, ResponseData, DEFAULT_USER_AGENT};
pub use size::format_size;

//! Shared building blocks for GlanceThing crates.
//!
//! - **ErrorLocation**: file/line/column capture used by every error enum
//! - **RedactedSecret**: connection secrets that never leak into logs
//! - **HttpStatusCode**: status codes carried by HTTP-facing errors

pub mod error;
pub mod http_status;
pub mod redacted_secret;

#[cfg(test)]
mod tests;

pub use error::error_location::ErrorLocation;
pub use error::secret_error::SecretError;
pub use http_status::HttpStatusCode;
pub use redacted_secret::RedactedSecret;

//! HTTP status codes carried by errors from HTTP-backed sources.

use std::fmt::{Display, Formatter, Result as FormatResult};

/// Status code stored as a number instead of being parsed back out of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpStatusCode(pub u16);

impl HttpStatusCode {
    /// 401/403: the credential is missing, expired or lacks a scope.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.0, 401 | 403)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.0)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.0)
    }

    /// Rate limiting and gateway failures clear up on the next poll.
    pub fn is_transient(&self) -> bool {
        matches!(self.0, 429 | 502 | 503 | 504)
    }
}

impl From<u16> for HttpStatusCode {
    fn from(code: u16) -> Self {
        HttpStatusCode(code)
    }
}

impl Display for HttpStatusCode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "{}", self.0)
    }
}

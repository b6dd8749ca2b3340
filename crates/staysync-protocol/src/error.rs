//! Error body returned by every endpoint.

use serde::{Deserialize, Serialize};

/// Machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Unknown or internal error.
    InternalError,
    /// Malformed path or query.
    InvalidRequest,
    /// No credentials were supplied.
    Unauthenticated,
    /// The caller may not manage this property.
    Forbidden,
    /// Requested resource not found.
    NotFound,
}

/// JSON error body: `{"error": "...", "code": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: ErrorCode,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, error: impl Into<String>) -> Self {
        Self {
            code,
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body() {
        let body = ErrorResponse::new(ErrorCode::NotFound, "Property not found");
        insta::assert_json_snapshot!(body, @r#"
        {
          "error": "Property not found",
          "code": "not_found"
        }
        "#);

        let parsed: ErrorResponse =
            serde_json::from_str(r#"{"error":"nope","code":"forbidden"}"#).unwrap();
        assert_eq!(parsed.code, ErrorCode::Forbidden);
    }
}

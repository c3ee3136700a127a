//! Gateway errors and the observability sink.
//!
//! Every gateway call returns `Result<T, GatewayError>`. Failures never cross
//! a synchronizer boundary as errors; they are turned into an
//! [`OpResult`](crate::sync::OpResult) and, when unexpected, reported through
//! [`report_error`].

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport-level failure (connection refused, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway rejected the bearer token (HTTP 401).
    #[error("Unauthorized{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Unauthorized {
        /// Message from the error payload, if any.
        message: Option<String>,
    },

    /// Resource not found (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success status.
    #[error("API error {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Api {
        /// HTTP status code.
        status: u16,
        /// Human-readable message from the structured error payload.
        message: Option<String>,
    },

    /// Response body did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The request could not be built (bad id, bad header value).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    /// Whether this is the expected "no such resource" case.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether this is an authorization failure.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// The gateway's own message, if the error carried a structured payload.
    #[must_use]
    pub fn gateway_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } | Self::Unauthorized { message } => message.as_deref(),
            _ => None,
        }
    }

    /// Message to show the user: the gateway's message when present,
    /// otherwise `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        self.gateway_message().unwrap_or(fallback).to_string()
    }

    /// Build the error for a non-success status and its raw body.
    pub(crate) fn from_status(status: StatusCode, path: &str, body: &str) -> Self {
        let message = ErrorPayload::message_from(body);
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized { message },
            StatusCode::NOT_FOUND => Self::NotFound(message.unwrap_or_else(|| path.to_string())),
            _ => Self::Api {
                status: status.as_u16(),
                message,
            },
        }
    }
}

/// Structured error payload returned by the gateway.
///
/// The backend uses `error` for application errors and `message` for
/// framework-generated ones.
#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: Option<String>,
    message: Option<String>,
}

impl ErrorPayload {
    fn message_from(body: &str) -> Option<String> {
        let payload: Self = serde_json::from_str(body).ok()?;
        payload
            .error
            .or(payload.message)
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
    }
}

/// Report an unexpected failure to the observability sink.
///
/// Not-found and authorization failures are expected outcomes and are only
/// logged at debug level.
pub fn report_error(error: &GatewayError, operation: &str) {
    if error.is_not_found() || error.is_unauthorized() {
        tracing::debug!(error = %error, operation, "Gateway returned an expected failure");
        return;
    }

    let event_id = sentry::capture_error(error);
    tracing::error!(
        error = %error,
        operation,
        sentry_event_id = %event_id,
        "Gateway operation failed"
    );
}

/// Set the Sentry user context after a session is established.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context on session teardown.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a user action.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "add item", &[("product_id", "9")]);
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GatewayError::NotFound("/cart".to_string());
        assert_eq!(err.to_string(), "Not found: /cart");

        let err = GatewayError::Api {
            status: 409,
            message: Some("Insufficient stock".to_string()),
        };
        assert_eq!(err.to_string(), "API error 409: Insufficient stock");

        let err = GatewayError::Unauthorized { message: None };
        assert_eq!(err.to_string(), "Unauthorized");
    }

    #[test]
    fn test_from_status_prefers_error_field() {
        let err = GatewayError::from_status(
            StatusCode::BAD_REQUEST,
            "/cart/items",
            r#"{"error":"Only 2 items available","message":"Bad Request"}"#,
        );
        assert_eq!(err.gateway_message(), Some("Only 2 items available"));
    }

    #[test]
    fn test_from_status_falls_back_to_message_field() {
        let err = GatewayError::from_status(
            StatusCode::INTERNAL_SERVER_ERROR,
            "/orders",
            r#"{"message":"Order service unavailable"}"#,
        );
        assert!(matches!(err, GatewayError::Api { status: 500, .. }));
        assert_eq!(err.user_message("fallback"), "Order service unavailable");
    }

    #[test]
    fn test_unstructured_body_uses_fallback() {
        let err = GatewayError::from_status(StatusCode::BAD_GATEWAY, "/cart", "<html>oops</html>");
        assert_eq!(err.gateway_message(), None);
        assert_eq!(
            err.user_message("Failed to add item to cart"),
            "Failed to add item to cart"
        );
    }

    #[test]
    fn test_blank_message_is_ignored() {
        let err = GatewayError::from_status(StatusCode::CONFLICT, "/cart", r#"{"error":"  "}"#);
        assert_eq!(err.gateway_message(), None);
    }

    #[test]
    fn test_status_classification() {
        let not_found = GatewayError::from_status(StatusCode::NOT_FOUND, "/cart", "");
        assert!(not_found.is_not_found());
        assert_eq!(not_found.to_string(), "Not found: /cart");

        let unauthorized =
            GatewayError::from_status(StatusCode::UNAUTHORIZED, "/cart", r#"{"error":"Token expired"}"#);
        assert!(unauthorized.is_unauthorized());
        assert_eq!(unauthorized.user_message("x"), "Token expired");
    }

    #[test]
    fn test_transport_errors_never_leak_details_to_users() {
        let err = GatewayError::InvalidRequest("bad header".to_string());
        assert_eq!(err.user_message("Failed to clear cart"), "Failed to clear cart");
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::ErrorBody;

/// Terminal rejection produced by the security pipeline or the bridge.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No usable credential was presented
    #[error("Authentication required: send the x-app-token header or Authorization: Bearer <token>")]
    AuthenticationRequired,
    /// A credential was presented but is not registered
    #[error("Invalid token: send a valid x-app-token header or Authorization: Bearer <token>")]
    InvalidCredential,
    /// Credential recognized but its profile may not perform this request
    #[error("Your profile lacks permission for this resource")]
    Forbidden,
    /// The decision stage ran without a resolved principal
    #[error("Internal authorization error: {0}")]
    InternalContractViolation(String),
    /// Bridge token, timestamp or signature did not verify
    #[error("Request signature could not be verified")]
    SignatureVerificationFailed,
    /// Bridge command carried an unknown or expired account-link token
    #[error("Voice assistant account is not linked")]
    AccountNotLinked,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::AuthenticationRequired => "authentication_required",
            AuthError::InvalidCredential => "invalid_credential",
            AuthError::Forbidden => "forbidden",
            AuthError::InternalContractViolation(_) => "internal_error",
            AuthError::SignatureVerificationFailed => "signature_verification_failed",
            AuthError::AccountNotLinked => "account_not_linked",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::AuthenticationRequired
            | AuthError::InvalidCredential
            | AuthError::SignatureVerificationFailed
            | AuthError::AccountNotLinked => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::InternalContractViolation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Contract violations are pipeline bugs; the detail stays in the logs.
        let message = match &self {
            AuthError::InternalContractViolation(detail) => {
                tracing::error!(detail = %detail, "Security pipeline contract violation");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = Json(ErrorBody::new(status, self.error_code(), message));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(error: AuthError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn authentication_required_returns_401_with_header_hint() {
        let (status, body) = body_of(AuthError::AuthenticationRequired).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["statusCode"], 401);
        assert_eq!(body["error"], "authentication_required");
        assert!(body["message"].as_str().unwrap().contains("x-app-token"));
    }

    #[tokio::test]
    async fn forbidden_returns_403() {
        let (status, body) = body_of(AuthError::Forbidden).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "forbidden");
    }

    #[tokio::test]
    async fn contract_violation_hides_detail() {
        let (status, body) =
            body_of(AuthError::InternalContractViolation("no principal".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body["message"].as_str().unwrap().contains("principal"));
    }

    #[tokio::test]
    async fn signature_failure_is_generic() {
        let (status, body) = body_of(AuthError::SignatureVerificationFailed).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Request signature could not be verified");
    }
}

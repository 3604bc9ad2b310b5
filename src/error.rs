//! Application error types and HTTP response mapping.
//!
//! Every failure is rendered in the same shape as a successful payload would
//! travel: a JSON object with a single `err` field carrying the kind and a
//! message.
//!
//! Error mappings:
//! - `MissingIdentifier`, `InvalidRequest` → 400
//! - `RemoteFetch` → 502
//! - `StoreWrite`, `StoreRead`, `StoreDelete`, `Deserialization` → 500

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Store write failed: {0}")]
    StoreWrite(String),

    #[error("Store read failed: {0}")]
    StoreRead(String),

    #[error("Store delete failed: {0}")]
    StoreDelete(String),

    #[error("Remote fetch failed: {0}")]
    RemoteFetch(String),

    #[error("Missing identifier: {0}")]
    MissingIdentifier(String),

    #[error("Corrupt meta for post {id}: {source}")]
    Deserialization {
        id: i64,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::StoreWrite(_) => "store_write",
            AppError::StoreRead(_) => "store_read",
            AppError::StoreDelete(_) => "store_delete",
            AppError::RemoteFetch(_) => "remote_fetch",
            AppError::MissingIdentifier(_) => "missing_identifier",
            AppError::Deserialization { .. } => "deserialization",
            AppError::InvalidRequest(_) => "invalid_request",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingIdentifier(_) | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::RemoteFetch(_) => StatusCode::BAD_GATEWAY,
            AppError::StoreWrite(_)
            | AppError::StoreRead(_)
            | AppError::StoreDelete(_)
            | AppError::Deserialization { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::RemoteFetch(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "{}", self);
        } else {
            tracing::warn!(kind = self.kind(), "{}", self);
        }

        let body = Json(json!({
            "err": {
                "kind": self.kind(),
                "message": self.to_string(),
            },
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_bad_request() {
        assert_eq!(
            AppError::MissingIdentifier("id".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidRequest("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn remote_errors_map_to_bad_gateway() {
        let err = AppError::RemoteFetch("rate limited".into());
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.kind(), "remote_fetch");
    }

    #[tokio::test]
    async fn response_body_carries_err_field() {
        let response = AppError::StoreWrite("disk full".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["err"]["kind"], "store_write");
        assert_eq!(body["err"]["message"], "Store write failed: disk full");
    }
}

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::warn;

#[derive(Debug, ThisError)]
pub enum RegistryError {
    #[error("Token required")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("field `{0}` cannot be updated")]
    UnknownField(String),

    #[error("invalid value for `{field}`: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Database(#[from] SqlxError),

    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    UrlParse(#[from] url::ParseError),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{message}")]
    Provider { status: u16, message: String },
}

impl RegistryError {
    pub fn status(&self) -> StatusCode {
        match self {
            RegistryError::MissingToken
            | RegistryError::InvalidToken
            | RegistryError::TokenError(_)
            | RegistryError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            RegistryError::Forbidden => StatusCode::FORBIDDEN,
            RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
            // Everything else, including unhandled store/provider failures,
            // is reported as 400 with the raw message.
            RegistryError::UnknownField(_)
            | RegistryError::InvalidField { .. }
            | RegistryError::BadRequest(_)
            | RegistryError::Database(_)
            | RegistryError::Http(_)
            | RegistryError::UrlParse(_)
            | RegistryError::Json(_)
            | RegistryError::Provider { .. } => StatusCode::BAD_REQUEST,
        }
    }

    fn is_unhandled(&self) -> bool {
        matches!(
            self,
            RegistryError::Database(_)
                | RegistryError::Http(_)
                | RegistryError::UrlParse(_)
                | RegistryError::Json(_)
                | RegistryError::Provider { .. }
        )
    }
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if self.is_unhandled() {
            warn!(status = status.as_u16(), error = %self, "request failed");
        }

        let body = match self {
            RegistryError::TokenError(detail) => ApiErrorBody {
                error: "Token error".to_string(),
                detail: Some(detail),
            },
            other => ApiErrorBody {
                error: other.to_string(),
                detail: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

/// JSON error body returned by every failing route.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

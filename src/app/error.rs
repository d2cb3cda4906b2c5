use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Every layer (storage, procedures, server, remote client) reports through this type
#[derive(Debug, Error)]
pub enum TodoError {
    #[error("{0}")]
    Validation(String),
    #[error("Todo with id {0} not found")]
    NotFound(i64),
    #[error("sqlite: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{code}: {message}")]
    Remote { code: String, message: String },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl TodoError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    // Machine readable code sent over the wire
    pub fn code(&self) -> &str {
        match self {
            Self::Validation(_) => "BAD_REQUEST",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Remote { code, .. } => code.as_str(),
            _ => "INTERNAL_SERVER_ERROR",
        }
    }
}

// Body of a failed procedure call
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl From<ErrorBody> for TodoError {
    fn from(body: ErrorBody) -> Self {
        Self::Remote {
            code: body.error.code,
            message: body.error.message,
        }
    }
}

impl ResponseError for TodoError {
    fn status_code(&self) -> StatusCode {
        match self.code() {
            "BAD_REQUEST" => StatusCode::BAD_REQUEST,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            Self::Remote { message, .. } => message.clone(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_id() {
        let err = TodoError::NotFound(99999);
        assert_eq!(err.to_string(), "Todo with id 99999 not found");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn remote_error_keeps_its_code() {
        let err = TodoError::from(ErrorBody {
            error: ErrorDetail {
                code: "BAD_REQUEST".to_string(),
                message: "Title is required".to_string(),
            },
        });
        assert_eq!(err.code(), "BAD_REQUEST");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}

//! Response envelope returned for every command outcome
//!
//! Author: hephaex@gmail.com

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome status. These five codes are the complete taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Created,
    BadRequest,
    Unauthorized,
    InternalServerError,
}

impl Status {
    pub fn code(&self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::Created => 201,
            Status::BadRequest => 400,
            Status::Unauthorized => 401,
            Status::InternalServerError => 500,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Created => "Created",
            Status::BadRequest => "Bad Request",
            Status::Unauthorized => "Unauthorized",
            Status::InternalServerError => "Internal Server Error",
        }
    }
}

/// Uniform success/failure wrapper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub status: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    /// Successful outcome carrying `data`
    pub fn success(status: Status, message: impl Into<String>, data: impl Serialize) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self {
                status: status.code(),
                message: message.into(),
                data: Some(data),
                error: None,
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize response data");
                Self::failure(Status::InternalServerError, "An unexpected error occurred")
            }
        }
    }

    pub fn ok(message: impl Into<String>, data: impl Serialize) -> Self {
        Self::success(Status::Ok, message, data)
    }

    pub fn created(message: impl Into<String>, data: impl Serialize) -> Self {
        Self::success(Status::Created, message, data)
    }

    /// Failed outcome; `error` carries the status reason phrase
    pub fn failure(status: Status, message: impl Into<String>) -> Self {
        Self {
            status: status.code(),
            message: message.into(),
            data: None,
            error: Some(status.reason().to_string()),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::failure(Status::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::failure(Status::Unauthorized, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::failure(Status::InternalServerError, message)
    }
}

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

// ABOUTME: axum IntoResponse implementation for AppError
// ABOUTME: Serializes errors into the JSON error envelope and logs server-side failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{AppError, ErrorCode, ErrorResponse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use tracing::{error, warn};

/// Convert an [`ErrorCode`] into an HTTP status code
#[must_use]
pub fn status_code(code: ErrorCode) -> StatusCode {
    StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_code(self.code);

        if self.is_server_error() {
            error!(
                code = %self.code,
                request_id = ?self.request_id,
                "Request failed: {}",
                self.message
            );
        } else {
            warn!(code = %self.code, status = status.as_u16(), "{}", self.message);
        }

        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

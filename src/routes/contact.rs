// ABOUTME: Route handler for the public contact form
// ABOUTME: Validates the sender and stores the message for the admin inbox
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::constants::limits::{MAX_CONTACT_MESSAGE_LENGTH, MAX_TITLE_LENGTH};
use crate::errors::{AppError, AppResult};
use crate::models::ContactMessage;
use crate::resources::ServerResources;
use crate::routes::extract::AppJson;
use crate::services::accounts::validate_email;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Contact form body
#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    /// Sender name
    pub name: String,
    /// Sender email
    pub email: String,
    /// Optional subject
    #[serde(default)]
    pub subject: Option<String>,
    /// Message body
    pub message: String,
}

impl ContactRequest {
    /// Trim and check every field, producing the message to store
    ///
    /// # Errors
    ///
    /// Returns 400 for a blank name or message, an invalid email, or text
    /// over the length limits
    pub fn into_message(self) -> AppResult<ContactMessage> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::invalid_input("Name is required"));
        }
        if name.chars().count() > MAX_TITLE_LENGTH {
            return Err(AppError::invalid_input(format!(
                "Name must be at most {MAX_TITLE_LENGTH} characters"
            )));
        }

        let email = validate_email(&self.email)?;

        let message = self.message.trim();
        if message.is_empty() {
            return Err(AppError::invalid_input("Message is required"));
        }
        if message.chars().count() > MAX_CONTACT_MESSAGE_LENGTH {
            return Err(AppError::invalid_input(format!(
                "Message must be at most {MAX_CONTACT_MESSAGE_LENGTH} characters"
            )));
        }

        let subject = self
            .subject
            .map(|s| s.trim().chars().take(MAX_TITLE_LENGTH).collect::<String>())
            .filter(|s| !s.is_empty());

        Ok(ContactMessage::new(
            name.to_owned(),
            email,
            subject,
            message.to_owned(),
        ))
    }
}

/// Contact routes implementation
pub struct ContactRoutes;

impl ContactRoutes {
    /// Create the contact route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/contact", post(Self::handle_submit))
            .with_state(resources)
    }

    async fn handle_submit(
        State(resources): State<Arc<ServerResources>>,
        AppJson(request): AppJson<ContactRequest>,
    ) -> Result<Response, AppError> {
        let message = request.into_message()?;
        resources.database.create_contact_message(&message).await?;
        info!(message_id = %message.id, "Contact message received");
        Ok((
            StatusCode::CREATED,
            Json(json!({ "id": message.id, "received": true })),
        )
            .into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, email: &str, message: &str) -> ContactRequest {
        ContactRequest {
            name: name.to_owned(),
            email: email.to_owned(),
            subject: Some("  ".to_owned()),
            message: message.to_owned(),
        }
    }

    #[test]
    fn test_valid_message_is_trimmed() {
        let message = request(" Ada ", "Ada@Example.com", " Hello ")
            .into_message()
            .unwrap();
        assert_eq!(message.name, "Ada");
        assert_eq!(message.message, "Hello");
        assert_eq!(message.subject, None);
        assert!(!message.handled);
    }

    #[test]
    fn test_rejects_blank_and_oversized_fields() {
        assert!(request("", "a@b.co", "hi").into_message().is_err());
        assert!(request("Ada", "not-an-email", "hi").into_message().is_err());
        assert!(request("Ada", "a@b.co", "   ").into_message().is_err());
        let long = "x".repeat(MAX_CONTACT_MESSAGE_LENGTH + 1);
        assert!(request("Ada", "a@b.co", &long).into_message().is_err());
    }
}

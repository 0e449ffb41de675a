// ABOUTME: Contact form submission model
// ABOUTME: Messages land in the admin inbox until marked handled
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Contact form submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactMessage {
    /// Unique identifier
    pub id: Uuid,
    /// Sender name
    pub name: String,
    /// Sender email
    pub email: String,
    /// Optional subject
    pub subject: Option<String>,
    /// Message body
    pub message: String,
    /// Marked handled by an admin
    pub handled: bool,
    /// Submission time
    pub created_at: DateTime<Utc>,
}

impl ContactMessage {
    /// Create an unhandled message
    #[must_use]
    pub fn new(name: String, email: String, subject: Option<String>, message: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            subject,
            message,
            handled: false,
            created_at: Utc::now(),
        }
    }
}

//! Newsletter subscription and the admin login placeholder.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("An email address is required")]
    EmptyEmail,

    #[error("Comment text is required")]
    EmptyComment,
}

impl Serialize for FormError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Newsletter sign-ups collected this session. Nothing is sent anywhere.
#[derive(Debug, Default)]
pub struct NewsletterForm {
    subscribers: Vec<String>,
}

impl NewsletterForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `email`, returning the trimmed address.
    pub fn submit(&mut self, email: &str) -> Result<String, FormError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(FormError::EmptyEmail);
        }

        if self.subscribers.iter().any(|s| s.eq_ignore_ascii_case(email)) {
            tracing::debug!(email, "Already subscribed to newsletter");
        } else {
            tracing::info!(email, "Subscribing to newsletter");
            self.subscribers.push(email.to_string());
        }
        Ok(email.to_string())
    }

    pub fn subscribers(&self) -> &[String] {
        &self.subscribers
    }
}

/// Admin mode flag.
///
/// There is no credential check: logging in only flips the flag. This is a
/// placeholder and must not be treated as an authentication boundary.
#[derive(Debug, Default)]
pub struct AdminSession {
    is_admin: bool,
}

impl AdminSession {
    pub fn login(&mut self) {
        self.is_admin = true;
        tracing::info!("Admin logged in");
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }
}

/// Trim a comment and reject it if nothing is left.
pub fn normalize_comment(text: &str) -> Result<String, FormError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(FormError::EmptyComment);
    }
    Ok(text.to_string())
}

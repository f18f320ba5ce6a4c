//! Contact-form messages and update subscriptions from the public site.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skywings_shared::Masked;

use crate::account::normalize_email;
use crate::context::looks_like_email;
use crate::CoreError;

pub const MAX_MESSAGE_CHARS: usize = 5000;

#[derive(Debug, Clone, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: Option<Masked<String>>,
    #[serde(default)]
    pub email: Masked<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewContactMessage {
    pub name: String,
    pub phone: Option<String>,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactMessage {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub email: String,
    pub message: String,
    pub received_at: DateTime<Utc>,
}

impl ContactForm {
    pub fn validate(self) -> Result<NewContactMessage, CoreError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(CoreError::ValidationError("Name is required".to_string()));
        }
        let email = required_email(&self.email)?;
        let message = self.message.trim().to_string();
        if message.is_empty() {
            return Err(CoreError::ValidationError("Message is required".to_string()));
        }
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(CoreError::ValidationError(format!(
                "Message must be at most {} characters",
                MAX_MESSAGE_CHARS
            )));
        }

        Ok(NewContactMessage {
            name,
            phone: self.phone.and_then(|p| trimmed(p.0)),
            email,
            message,
        })
    }
}

/// Request for flight and booking updates.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeForm {
    #[serde(default, alias = "fullname")]
    pub full_name: String,
    #[serde(default)]
    pub email: Masked<String>,
    #[serde(default)]
    pub phone: Option<Masked<String>>,
    #[serde(default)]
    pub flight_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSubscriber {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub flight_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Subscriber {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub flight_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl SubscribeForm {
    pub fn validate(self) -> Result<NewSubscriber, CoreError> {
        let full_name = self.full_name.trim().to_string();
        if full_name.is_empty() {
            return Err(CoreError::ValidationError("Full name is required".to_string()));
        }
        Ok(NewSubscriber {
            full_name,
            email: required_email(&self.email)?,
            phone: self.phone.and_then(|p| trimmed(p.0)),
            flight_id: self.flight_id,
        })
    }
}

fn required_email(email: &Masked<String>) -> Result<String, CoreError> {
    let email = normalize_email(&email.0);
    if !looks_like_email(&email) {
        return Err(CoreError::ValidationError("A valid email is required".to_string()));
    }
    Ok(email)
}

fn trimmed(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(name: &str, email: &str, message: &str) -> ContactForm {
        ContactForm {
            name: name.to_string(),
            phone: Some(Masked(" ".to_string())),
            email: Masked(email.to_string()),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_contact_form_is_trimmed() {
        let message = contact(" Mina Cho ", " Mina@Example.com", " Lost bag on SW0042 ")
            .validate()
            .unwrap();
        assert_eq!(message.name, "Mina Cho");
        assert_eq!(message.email, "mina@example.com");
        assert_eq!(message.message, "Lost bag on SW0042");
        assert_eq!(message.phone, None);
    }

    #[test]
    fn test_contact_form_required_fields() {
        assert!(contact("", "mina@example.com", "Hi").validate().is_err());
        assert!(contact("Mina", "mina.example.com", "Hi").validate().is_err());
        assert!(contact("Mina", "mina@example.com", "   ").validate().is_err());
        let long = "x".repeat(MAX_MESSAGE_CHARS + 1);
        assert!(contact("Mina", "mina@example.com", &long).validate().is_err());
    }

    #[test]
    fn test_subscriber_needs_name_and_email() {
        let form = SubscribeForm {
            full_name: "Tomás Ruiz".to_string(),
            email: Masked("TOMAS@example.com ".to_string()),
            phone: Some(Masked("+1 416 555 0100".to_string())),
            flight_id: Some(7),
        };
        let subscriber = form.validate().unwrap();
        assert_eq!(subscriber.email, "tomas@example.com");
        assert_eq!(subscriber.phone.as_deref(), Some("+1 416 555 0100"));

        let nameless = SubscribeForm {
            full_name: " ".to_string(),
            email: Masked("tomas@example.com".to_string()),
            phone: None,
            flight_id: None,
        };
        assert!(nameless.validate().is_err());
    }
}

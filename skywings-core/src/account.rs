use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use skywings_shared::Masked;

use crate::context::looks_like_email;
use crate::CoreError;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            _ => self.email.clone(),
        }
    }
}

/// Registration form.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub email: Masked<String>,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Validated registration, ready to be stored.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub is_staff: bool,
}

impl Registration {
    pub fn into_new_user(self) -> Result<NewUser, CoreError> {
        let email = normalize_email(&self.email.0);
        if !looks_like_email(&email) {
            return Err(CoreError::ValidationError("A valid email is required".to_string()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CoreError::ValidationError(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if self.password != self.confirm_password {
            return Err(CoreError::ValidationError("Passwords do not match".to_string()));
        }

        Ok(NewUser {
            email,
            password_hash: hash_password(&self.password)?,
            first_name: trimmed(self.first_name),
            last_name: trimmed(self.last_name),
            phone: trimmed(self.phone),
            is_staff: false,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

impl ProfileUpdate {
    /// Blank fields clear the stored value.
    pub fn normalized(self) -> Self {
        Self {
            first_name: trimmed(self.first_name),
            last_name: trimmed(self.last_name),
            phone: trimmed(self.phone),
        }
    }
}

/// Saved companion profile of a customer account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Traveler {
    pub id: i64,
    pub user_id: i64,
    pub full_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub passport_number: Option<String>,
    pub nationality: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTraveler {
    pub full_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub passport_number: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
}

impl NewTraveler {
    pub fn normalized(self) -> Result<Self, CoreError> {
        let full_name = self.full_name.trim().to_string();
        if full_name.is_empty() {
            return Err(CoreError::ValidationError("Traveler name is required".to_string()));
        }
        Ok(Self {
            full_name,
            date_of_birth: self.date_of_birth,
            passport_number: trimmed(self.passport_number).map(|p| p.to_ascii_uppercase()),
            nationality: trimmed(self.nationality),
        })
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn hash_password(password: &str) -> Result<String, CoreError> {
    use argon2::password_hash::rand_core::OsRng;
    use argon2::password_hash::SaltString;
    use argon2::{Argon2, PasswordHasher};

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CoreError::InternalError(format!("Password hashing failed: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let parsed = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is unreadable");
            return false;
        }
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(password: &str, confirm: &str) -> Registration {
        Registration {
            email: Masked(" Lee.Park@Example.com ".to_string()),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
            first_name: Some("Lee".to_string()),
            last_name: Some(" ".to_string()),
            phone: None,
        }
    }

    #[test]
    fn test_registration_hashes_password() {
        let user = registration("hunter2hunter2", "hunter2hunter2").into_new_user().unwrap();
        assert_eq!(user.email, "lee.park@example.com");
        assert_eq!(user.last_name, None);
        assert!(!user.is_staff);
        assert_ne!(user.password_hash, "hunter2hunter2");
        assert!(verify_password("hunter2hunter2", &user.password_hash));
        assert!(!verify_password("wrong-password", &user.password_hash));
    }

    #[test]
    fn test_registration_rules() {
        assert!(registration("short", "short").into_new_user().is_err());
        assert!(registration("longenough1", "longenough2").into_new_user().is_err());
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_traveler_requires_name() {
        let traveler = NewTraveler {
            full_name: "   ".to_string(),
            date_of_birth: None,
            passport_number: None,
            nationality: None,
        };
        assert!(traveler.normalized().is_err());

        let traveler = NewTraveler {
            full_name: " Noor Ali ".to_string(),
            date_of_birth: None,
            passport_number: Some("ab123456".to_string()),
            nationality: Some("".to_string()),
        };
        let traveler = traveler.normalized().unwrap();
        assert_eq!(traveler.full_name, "Noor Ali");
        assert_eq!(traveler.passport_number.as_deref(), Some("AB123456"));
        assert_eq!(traveler.nationality, None);
    }
}

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wraps contact details (emails, phone numbers) so they never reach the logs
/// in clear text. Serialization passes the real value through, since API
/// responses still need it.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T: AsRef<str>> Masked<T> {
    /// Short hint that is safe to log: first character plus the email domain,
    /// or the last two digits of a phone number.
    pub fn hint(&self) -> String {
        let raw = self.0.as_ref().trim();
        if raw.is_empty() {
            return String::new();
        }
        if let Some((local, domain)) = raw.split_once('@') {
            let first = local.chars().next().unwrap_or('*');
            return format!("{}***@{}", first, domain);
        }
        let digits: Vec<char> = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() >= 4 {
            let tail: String = digits[digits.len() - 2..].iter().collect();
            return format!("***{}", tail);
        }
        "********".to_string()
    }
}

impl<T: AsRef<str>> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hint())
    }
}

impl<T: AsRef<str>> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hint())
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for Masked<T> {
    fn from(value: T) -> Self {
        Masked(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_hint_keeps_domain() {
        let email = Masked("amina.khan42@gmail.com".to_string());
        assert_eq!(format!("{}", email), "a***@gmail.com");
        assert_eq!(format!("{:?}", email), "a***@gmail.com");
    }

    #[test]
    fn test_phone_hint_keeps_last_digits() {
        let phone = Masked("647-555-1234");
        assert_eq!(phone.hint(), "***34");
    }

    #[test]
    fn test_serialize_passes_real_value() {
        let email = Masked("sara@example.com".to_string());
        let json = serde_json::to_string(&email).unwrap();
        assert_eq!(json, "\"sara@example.com\"");
    }
}

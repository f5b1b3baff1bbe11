//! Scraped message record and its content identity.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// A single pending message scraped from the portal.
///
/// Records live for one run only; what survives across runs is the
/// content identity and the title, stored in the seen-state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Message subject
    pub title: String,

    /// Composed body text (entry date, sender, read state)
    pub body: String,

    /// Raw entry date text as shown by the portal, may be empty
    pub date_text: String,

    /// When this record was scraped
    pub observed_at: DateTime<Utc>,
}

impl Record {
    /// Content identity of this record.
    pub fn identity(&self) -> String {
        identity(&self.title, &self.body)
    }
}

/// Derive the stable content identity for a title/body pair.
///
/// SHA-256 over both fields with a NUL separator, hex encoded. The
/// separator keeps pairs like ("ab", "c") and ("a", "bc") distinct.
/// The digest is a dedup key only, never a credential.
pub fn identity(title: &str, body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update([0u8]);
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(title: &str, body: &str) -> Record {
        Record {
            title: title.to_string(),
            body: body.to_string(),
            date_text: "15/03/2024".to_string(),
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn identity_is_deterministic() {
        let a = identity("Exam schedule", "Math exam moved to Friday");
        let b = identity("Exam schedule", "Math exam moved to Friday");
        assert_eq!(a, b);
    }

    #[test]
    fn identity_is_lowercase_hex_of_fixed_length() {
        let id = identity("Exam schedule", "Math exam moved to Friday");
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn identity_changes_with_any_field() {
        let base = identity("title", "body");
        assert_ne!(base, identity("title!", "body"));
        assert_ne!(base, identity("title", "body!"));
    }

    #[test]
    fn identity_is_whitespace_sensitive() {
        assert_ne!(identity("title", "body"), identity("title ", "body"));
        assert_ne!(identity("title", "body"), identity("title", " body"));
    }

    #[test]
    fn identity_separator_prevents_boundary_aliasing() {
        assert_ne!(identity("ab", "c"), identity("a", "bc"));
    }

    #[test]
    fn record_identity_ignores_date_and_timestamp() {
        let mut a = sample_record("Exam schedule", "Math exam moved to Friday");
        let b = sample_record("Exam schedule", "Math exam moved to Friday");
        a.date_text = "16/03/2024".to_string();
        assert_eq!(a.identity(), b.identity());
    }
}

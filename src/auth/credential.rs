use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Safety margin subtracted from `expiry_date` before a token is considered usable.
pub const EXPIRY_SKEW_MS: i64 = 300_000;

/// OAuth credential persisted between runs.
///
/// Values are never patched in place: a refresh or login produces a new
/// `Credential` that replaces the stored one wholesale.
///
/// # Example
/// ```
/// use qwen_auth::auth::Credential;
///
/// let credential = Credential::new("access", "refresh", 1_700_000_000_000);
/// assert!(credential.is_valid_at(1_700_000_000_000 - 600_000));
/// assert!(!credential.is_valid_at(1_700_000_000_000 - 60_000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    /// Epoch milliseconds after which `access_token` is invalid.
    pub expiry_date: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_url: Option<String>,
}

impl Credential {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expiry_date: i64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expiry_date,
            resource_url: None,
        }
    }

    pub fn with_resource_url(mut self, resource_url: impl Into<String>) -> Self {
        self.resource_url = Some(resource_url.into());
        self
    }

    /// Whether the access token can be used at `now_ms` with the skew buffer applied.
    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        now_ms < self.expiry_date.saturating_sub(EXPIRY_SKEW_MS)
    }

    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.trim().is_empty()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.expiry_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn validity_respects_skew_boundary() {
        let credential = Credential::new("a", "r", 1_000_000);
        assert!(credential.is_valid_at(1_000_000 - EXPIRY_SKEW_MS - 1));
        assert!(!credential.is_valid_at(1_000_000 - EXPIRY_SKEW_MS));
        assert!(!credential.is_valid_at(1_000_000));
    }

    #[test]
    fn empty_refresh_token_is_not_refreshable() {
        assert!(!Credential::new("a", "", 0).has_refresh_token());
        assert!(!Credential::new("a", "  ", 0).has_refresh_token());
        assert!(Credential::new("a", "r", 0).has_refresh_token());
    }

    #[test]
    fn serializes_wire_field_names() {
        let credential = Credential::new("acc", "ref", 42);
        let value = serde_json::to_value(&credential).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "access_token": "acc",
                "refresh_token": "ref",
                "expiry_date": 42
            })
        );
    }

    #[test]
    fn tolerates_unknown_fields() {
        let raw = r#"{
            "access_token": "acc",
            "refresh_token": "ref",
            "expiry_date": 42,
            "resource_url": "portal.qwen.ai",
            "token_type": "Bearer"
        }"#;
        let credential: Credential = serde_json::from_str(raw).unwrap();
        assert_eq!(
            credential,
            Credential::new("acc", "ref", 42).with_resource_url("portal.qwen.ai")
        );
    }

    #[test]
    fn expires_at_converts_millis() {
        let credential = Credential::new("a", "r", 1_700_000_000_123);
        assert_eq!(
            credential.expires_at().map(|t| t.timestamp_millis()),
            Some(1_700_000_000_123)
        );
    }
}

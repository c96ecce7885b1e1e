use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a comment-subsystem post. Assigned sequentially by the
/// comment store; worker records reference posts by id only and resolve
/// them through the store on every access.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PostId(pub u64);

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "post#{}", self.0)
    }
}

/// Account name. The chain addresses accounts by name, not key, so this
/// is the identity carried in every operation payload and vote record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountName(String);

impl AccountName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for AccountName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_name_ordering_is_lexicographic() {
        let a = AccountName::from("alice");
        let b = AccountName::from("bob");
        assert!(a < b);
    }

    #[test]
    fn test_display() {
        assert_eq!(PostId(7).to_string(), "post#7");
        assert_eq!(AccountName::from("alice").to_string(), "alice");
    }
}

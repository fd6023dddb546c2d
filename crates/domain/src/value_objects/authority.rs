//! Authority role: who may mutate shared documents directly.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Role of the running process with respect to shared documents.
///
/// Exactly one process is `Authoritative` (the game master's); every other
/// process is a `Delegate` and must route mutations through the message relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityRole {
    Authoritative,
    #[default]
    Delegate,
}

impl AuthorityRole {
    pub fn is_authoritative(&self) -> bool {
        matches!(self, AuthorityRole::Authoritative)
    }

    /// Fail with `PermissionDenied` unless this role is authoritative.
    pub fn require_authority(&self, action: &str) -> Result<(), DomainError> {
        if self.is_authoritative() {
            Ok(())
        } else {
            Err(DomainError::permission_denied(format!(
                "{} requires the authoritative role",
                action
            )))
        }
    }
}

impl std::str::FromStr for AuthorityRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "authoritative" | "gm" | "host" => Ok(AuthorityRole::Authoritative),
            "delegate" | "player" => Ok(AuthorityRole::Delegate),
            other => Err(DomainError::parse(format!("Unknown authority role: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delegates_are_refused() {
        assert!(AuthorityRole::Authoritative.require_authority("migrate").is_ok());
        let err = AuthorityRole::Delegate.require_authority("migrate").unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));
    }

    #[test]
    fn parses_role_names() {
        assert_eq!("GM".parse::<AuthorityRole>(), Ok(AuthorityRole::Authoritative));
        assert_eq!("player".parse::<AuthorityRole>(), Ok(AuthorityRole::Delegate));
        assert!("observer".parse::<AuthorityRole>().is_err());
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub fn to_uuid(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self).map_err(|e| {
                    DomainError::invalid_id(format!("{} '{}': {}", stringify!($name), s, e))
                })
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

// Host documents
define_id!(ActorId);
define_id!(ItemId);

// Host users (players and game masters)
define_id!(UserId);

// Compendium packs
define_id!(PackId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ids_from_strings() {
        let id = ActorId::new();
        let parsed: ActorId = id.to_string().parse().expect("valid id");
        assert_eq!(parsed, id);
    }

    #[test]
    fn rejects_malformed_ids() {
        let err = "not-a-uuid".parse::<ItemId>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(_)));
        assert!(err.to_string().contains("ItemId"));
    }
}

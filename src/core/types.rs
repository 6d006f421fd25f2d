//! Strongly-typed wrappers for names and subtypes
//!
//! Card names, player names and subtypes are all strings on the wire, but they
//! are never interchangeable inside the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                $name(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }
    };
}

string_newtype!(
    /// Card subtype (creature type, "Aura", land type, ...)
    Subtype
);

string_newtype!(
    /// Card name, also used for "name a card" choices
    CardName
);

string_newtype!(
    /// Player display name
    PlayerName
);

impl Subtype {
    pub fn aura() -> Self {
        Subtype::new("Aura")
    }

    pub fn equipment() -> Self {
        Subtype::new("Equipment")
    }
}

impl CardName {
    /// Names compare case-insensitively when a player names a card
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtype() {
        let subtype = Subtype::new("Goblin");
        assert_eq!(subtype.as_str(), "Goblin");
        assert_eq!(subtype.to_string(), "Goblin");
        assert_eq!(Subtype::aura(), Subtype::from("Aura"));
    }

    #[test]
    fn test_card_name_matching() {
        let name = CardName::new("Lightning Bolt");
        assert!(name.matches("lightning bolt"));
        assert!(!name.matches("Shock"));
    }

    #[test]
    fn test_player_name_serializes_as_string() {
        let name = PlayerName::new("Alice");
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"Alice\"");
    }
}

//! # Identifiers
//!
//! Every domain gets its own string newtype so a recipe id can never be
//! passed where a quality id is expected.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier.
            #[inline]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if the identifier is the empty string.
            #[inline]
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&$name> for $name {
            fn from(id: &$name) -> Self {
                id.clone()
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Unique identifier of a recipe.
    RecipeId
);
string_id!(
    /// Identifier of a material, tool or produced item.
    ItemId
);
string_id!(
    /// Identifier of a character skill.
    SkillId
);
string_id!(
    /// Identifier of a proficiency track.
    ProficiencyId
);
string_id!(
    /// Identifier of a tool quality (e.g. `CUT`, `HAMMER`).
    QualityId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(ItemId::from("wood"), 3u32);
        assert_eq!(map.get("wood"), Some(&3));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = RecipeId::new("bread");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"bread\"");
    }
}

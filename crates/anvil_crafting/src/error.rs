//! # Crafting Error Types
//!
//! Errors only come out of content and config loading. The crafting path
//! itself reports failures as data.

use thiserror::Error;

/// Errors that can occur while loading crafting content.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnvilError {
    /// A recipe definition violates an invariant.
    #[error("invalid recipe {recipe_id}: {reason}")]
    InvalidRecipe {
        /// The offending recipe (may be empty if the id itself is missing).
        recipe_id: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A proficiency definition violates an invariant.
    #[error("invalid proficiency {proficiency_id}: {reason}")]
    InvalidProficiency {
        /// The offending proficiency.
        proficiency_id: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Malformed JSON content.
    #[error("malformed json: {0}")]
    Json(String),

    /// Malformed TOML content.
    #[error("malformed toml: {0}")]
    Toml(String),
}

impl From<serde_json::Error> for AnvilError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<toml::de::Error> for AnvilError {
    fn from(err: toml::de::Error) -> Self {
        Self::Toml(err.to_string())
    }
}

/// Result type for content loading operations.
pub type AnvilResult<T> = Result<T, AnvilError>;

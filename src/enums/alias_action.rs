use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// One entry of a batched `_aliases` update.
///
/// The cluster applies every action in a batch or none of them, so callers
/// that need atomicity must submit related actions in a single call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasAction {
    Add { index: String, alias: String },
    Remove { index: String, alias: String },
}

impl AliasAction {
    pub fn add(index: impl Into<String>, alias: impl Into<String>) -> Self {
        AliasAction::Add {
            index: index.into(),
            alias: alias.into(),
        }
    }

    pub fn remove(index: impl Into<String>, alias: impl Into<String>) -> Self {
        AliasAction::Remove {
            index: index.into(),
            alias: alias.into(),
        }
    }

    /// Renders the action in the body shape expected by `POST _aliases`.
    pub fn to_request_json(&self) -> Value {
        match self {
            AliasAction::Add { index, alias } => json!({
                "add": { "index": index, "alias": alias }
            }),
            AliasAction::Remove { index, alias } => json!({
                "remove": { "index": index, "alias": alias }
            }),
        }
    }
}

impl fmt::Display for AliasAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AliasAction::Add { index, alias } => write!(f, "add {} -> {}", alias, index),
            AliasAction::Remove { index, alias } => write!(f, "remove {} -> {}", alias, index),
        }
    }
}

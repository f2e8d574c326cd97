use crate::common::*;

/// An alias and the concrete indices it currently resolves to.
///
/// Always read fresh from the cluster; migration steps change alias state, so
/// a binding is never carried from one step to the next.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
#[getset(get = "pub")]
pub struct AliasBinding {
    alias_name: String,
    /// Sorted, so "the first index" is deterministic.
    target_indices: BTreeSet<String>,
}

impl AliasBinding {
    /// Builds a binding from a `GET _alias/<name>` response body:
    ///
    /// ```json
    /// { "products_v1": { "aliases": { "products": {} } } }
    /// ```
    pub fn from_get_alias_response(alias_name: &str, body: &Value) -> Self {
        let target_indices: BTreeSet<String> = body
            .as_object()
            .map(|indices| {
                indices
                    .iter()
                    .filter(|(_, value)| {
                        value["aliases"]
                            .as_object()
                            .map_or(true, |aliases| aliases.contains_key(alias_name))
                    })
                    .map(|(index, _)| index.clone())
                    .collect()
            })
            .unwrap_or_default();

        AliasBinding::new(alias_name.to_string(), target_indices)
    }

    pub fn first_index(&self) -> Option<&str> {
        self.target_indices.iter().next().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.target_indices.is_empty()
    }
}

/// Answer of the gateway's alias lookup. Transport or cluster errors are the
/// third state and travel in the surrounding `Result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasLookup {
    Found(AliasBinding),
    NotFound,
}

impl AliasLookup {
    pub fn is_alias(&self) -> bool {
        matches!(self, AliasLookup::Found(_))
    }
}

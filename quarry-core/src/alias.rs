//! Argument position to symbolic name mapping.

use crate::ParameterMetadata;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Per-operation table of optional argument aliases, indexed by 0-based
/// position.
///
/// Built once from parameter metadata and never mutated. Duplicate aliases
/// are not rejected here.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParameterAliasTable {
    aliases: Vec<Option<String>>,
}

impl ParameterAliasTable {
    /// Take the `rename` designation of every position.
    pub fn from_parameters(parameters: &[ParameterMetadata]) -> Self {
        Self {
            aliases: parameters.iter().map(|p| p.rename.clone()).collect(),
        }
    }

    pub fn new(aliases: Vec<Option<String>>) -> Self {
        Self { aliases }
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Declared alias at `index`, if any.
    pub fn alias_at(&self, index: usize) -> Option<&str> {
        self.aliases.get(index).and_then(|a| a.as_deref())
    }

    /// Symbolic name of the argument at `index`: its alias, or the 1-based
    /// position as a string.
    ///
    /// Positions past the end of the table fall back to positional naming.
    pub fn name_at(&self, index: usize) -> Cow<'_, str> {
        match self.alias_at(index) {
            Some(alias) => Cow::Borrowed(alias),
            None => Cow::Owned(positional_name(index)),
        }
    }

    /// Aliases that also spell the positional name of another, unaliased
    /// argument, as `(position, alias)`. Both arguments bind under the same
    /// name and binding order decides which value it resolves to.
    pub fn shadowing_aliases(&self) -> Vec<(usize, &str)> {
        self.aliases
            .iter()
            .enumerate()
            .filter_map(|(i, alias)| alias.as_deref().map(|a| (i, a)))
            .filter(|&(i, alias)| self.collides(i, alias))
            .collect()
    }

    fn collides(&self, index: usize, alias: &str) -> bool {
        let Ok(n) = alias.parse::<usize>() else {
            return false;
        };
        n >= 1
            && n <= self.aliases.len()
            && n - 1 != index
            && positional_name(n - 1) == alias
            && self.alias_at(n - 1).is_none()
    }
}

/// 1-based positional name for a 0-based index.
pub fn positional_name(index: usize) -> String {
    (index + 1).to_string()
}

//! Declared changes and their per-backend statement variants

use crate::backend::Backend;
use serde::{Deserialize, Serialize};

/// Forward and backward statement text for one backend.
///
/// An empty `backward` marks the change as irreversible.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Statements {
    /// Statement that applies the change
    pub forward: String,

    /// Statement that reverses the change
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub backward: String,
}

impl Statements {
    /// Create a statement pair
    pub fn new(forward: impl Into<String>, backward: impl Into<String>) -> Self {
        Self {
            forward: forward.into(),
            backward: backward.into(),
        }
    }

    /// Whether a backward statement is present
    pub fn is_reversible(&self) -> bool {
        !self.backward.is_empty()
    }
}

/// One declared unit of migration, keyed by backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Change {
    /// Wide-column statements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cql: Option<Statements>,

    /// Relational statements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<Statements>,
}

impl Change {
    /// Build a change carrying only relational statements
    pub fn sql(statements: Statements) -> Self {
        Self {
            cql: None,
            sql: Some(statements),
        }
    }

    /// Build a change carrying only wide-column statements
    pub fn cql(statements: Statements) -> Self {
        Self {
            cql: Some(statements),
            sql: None,
        }
    }

    /// Statements for `backend`, if the change declares them
    pub fn statements(&self, backend: Backend) -> Option<&Statements> {
        match backend {
            Backend::Sql => self.sql.as_ref(),
            Backend::Cql => self.cql.as_ref(),
        }
    }

    /// Mutable access to every declared variant
    pub(crate) fn variants_mut(&mut self) -> impl Iterator<Item = &mut Statements> {
        self.cql.iter_mut().chain(self.sql.iter_mut())
    }
}

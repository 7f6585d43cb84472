//! Migration files: an id plus an ordered list of changes

use crate::change::Change;
use crate::error::{CoreError, CoreResult};
use crate::migration_id::MigrationId;
use serde::{Deserialize, Serialize};

/// One migration file as declared on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Migration {
    /// Must equal the file's base name
    pub id: MigrationId,

    /// Changes in application order
    #[serde(default)]
    pub changes: Vec<Change>,
}

impl Migration {
    /// Check that the declared id equals `file_stem`
    pub fn verify_id(&self, file_stem: &str) -> CoreResult<()> {
        if self.id != file_stem {
            return Err(CoreError::MigrationIdMismatch {
                name: file_stem.to_string(),
                id: self.id.to_string(),
            });
        }
        Ok(())
    }

    /// Rewrite every statement of every change with `f`
    pub(crate) fn map_statements<F>(&mut self, f: F) -> CoreResult<()>
    where
        F: Fn(&str) -> CoreResult<String>,
    {
        for change in &mut self.changes {
            for statements in change.variants_mut() {
                statements.forward = f(&statements.forward)?;
                statements.backward = f(&statements.backward)?;
            }
        }
        Ok(())
    }
}

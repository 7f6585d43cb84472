//! Migration source discovery and loading
//!
//! A migration source is a directory of YAML files. Files are read in file
//! name order and their changes, concatenated, form the declared sequence.

use crate::error::{CoreError, CoreResult};
use crate::migration::Migration;
use crate::step::Step;
use crate::vars::expand_variables;
use std::path::{Path, PathBuf};

/// Directory of migration files.
#[derive(Debug, Clone)]
pub struct MigrationSource {
    root: PathBuf,
    expand_env: bool,
}

impl MigrationSource {
    /// Create a source rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            expand_env: false,
        }
    }

    /// Enable `${NAME}` expansion of statements
    pub fn with_env_expansion(mut self, enabled: bool) -> Self {
        self.expand_env = enabled;
        self
    }

    /// Load every migration, expanding variables from the process environment
    /// when enabled.
    pub fn load(&self) -> CoreResult<Vec<Migration>> {
        self.load_with(|name| std::env::var(name).ok())
    }

    /// Load every migration, resolving variables through `lookup`.
    pub fn load_with<F>(&self, lookup: F) -> CoreResult<Vec<Migration>>
    where
        F: Fn(&str) -> Option<String>,
    {
        log::info!("{} {}", Step::Ledger, self.root.display());

        let mut migrations = Vec::new();
        for path in self.migration_files()? {
            let mut migration = load_migration(&path)?;
            if self.expand_env {
                migration.map_statements(|s| expand_variables(s, &lookup))?;
            }
            migrations.push(migration);
        }
        Ok(migrations)
    }

    /// YAML files directly under the root, sorted by file name
    fn migration_files(&self) -> CoreResult<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(CoreError::LedgerRootNotFound {
                path: self.root.display().to_string(),
            });
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.root).map_err(|e| CoreError::IoWithPath {
            path: self.root.display().to_string(),
            source: e,
        })? {
            let entry = entry.map_err(|e| CoreError::IoWithPath {
                path: self.root.display().to_string(),
                source: e,
            })?;
            let path = entry.path();
            if path.is_file() && is_yaml(&path) {
                files.push(path);
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

/// Decode one migration file and check its id against the file name.
pub fn load_migration(path: &Path) -> CoreResult<Migration> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CoreError::InvalidFileName {
            path: path.display().to_string(),
        })?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| CoreError::InvalidFileName {
            path: path.display().to_string(),
        })?;

    log::info!("{} {}", Step::Read, name);

    let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
        path: path.display().to_string(),
        source: e,
    })?;
    let migration: Migration =
        serde_yaml::from_str(&content).map_err(|e| CoreError::MigrationParseError {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;

    migration.verify_id(stem)?;
    log::debug!(
        "Loaded migration {} with {} change(s)",
        migration.id,
        migration.changes.len()
    );
    Ok(migration)
}

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;

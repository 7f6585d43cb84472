//! Resolve declared changes to the statements the active backend runs

use sl_core::{Backend, CoreError, CoreResult, Migration, MigrationId, Statements};

/// One declared change resolved for a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedChange<'a> {
    /// Migration the change belongs to
    pub migration: &'a MigrationId,
    /// 0-based position within the migration
    pub position: usize,
    /// Statements for the active backend
    pub statements: &'a Statements,
}

/// Flatten `migrations` into the declared sequence for `backend`.
///
/// Fails on the first change without a variant for `backend`, before any
/// statement has run.
pub fn plan(migrations: &[Migration], backend: Backend) -> CoreResult<Vec<PlannedChange<'_>>> {
    let mut planned = Vec::new();
    for migration in migrations {
        for (position, change) in migration.changes.iter().enumerate() {
            let statements =
                change
                    .statements(backend)
                    .ok_or_else(|| CoreError::UnsupportedBackend {
                        migration: migration.id.to_string(),
                        position,
                        backend: backend.to_string(),
                    })?;
            planned.push(PlannedChange {
                migration: &migration.id,
                position,
                statements,
            });
        }
    }
    Ok(planned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sl_core::Change;

    fn migration(id: &str, changes: Vec<Change>) -> Migration {
        Migration {
            id: MigrationId::new(id),
            changes,
        }
    }

    #[test]
    fn test_plan_preserves_declared_order() {
        let migrations = vec![
            migration(
                "0001_users",
                vec![
                    Change::sql(Statements::new("create table users (id int)", "drop table users")),
                    Change::sql(Statements::new("create index users_id on users (id)", "")),
                ],
            ),
            migration(
                "0002_orders",
                vec![Change::sql(Statements::new("create table orders (id int)", ""))],
            ),
        ];

        let planned = plan(&migrations, Backend::Sql).unwrap();
        let forwards: Vec<&str> = planned.iter().map(|p| p.statements.forward.as_str()).collect();
        assert_eq!(
            forwards,
            vec![
                "create table users (id int)",
                "create index users_id on users (id)",
                "create table orders (id int)",
            ]
        );
        assert_eq!(planned[2].migration.as_str(), "0002_orders");
        assert_eq!(planned[2].position, 0);
    }

    #[test]
    fn test_plan_selects_backend_variant() {
        let change = Change {
            cql: Some(Statements::new("CREATE TABLE t (k int PRIMARY KEY)", "DROP TABLE t")),
            sql: Some(Statements::new("create table t (k int)", "drop table t")),
        };
        let migrations = vec![migration("0001", vec![change])];

        let planned = plan(&migrations, Backend::Cql).unwrap();
        assert_eq!(planned[0].statements.forward, "CREATE TABLE t (k int PRIMARY KEY)");
    }

    #[test]
    fn test_missing_variant_fails_whole_plan() {
        let migrations = vec![migration(
            "0001",
            vec![
                Change::cql(Statements::new("CREATE TABLE a (k int PRIMARY KEY)", "")),
                Change::sql(Statements::new("create table b (k int)", "")),
            ],
        )];

        let err = plan(&migrations, Backend::Sql).unwrap_err();
        match err {
            CoreError::UnsupportedBackend {
                migration,
                position,
                backend,
            } => {
                assert_eq!(migration, "0001");
                assert_eq!(position, 0);
                assert_eq!(backend, "sql");
            }
            other => panic!("expected unsupported backend, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_plan() {
        assert!(plan(&[], Backend::Sql).unwrap().is_empty());
    }
}

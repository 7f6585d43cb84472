//! Ledger storage version gate

use crate::error::{DbError, DbResult};
use uuid::Uuid;

/// Version token written into every ledger this build manages
pub const SLEDGER_VERSION: Uuid = Uuid::from_u128(0xa45a9821_8e0d_4126_8d99_0543e7f1f8f7);

/// Outcome of checking a persisted version marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionCheck {
    /// No marker yet; the caller must write [`SLEDGER_VERSION`]
    Initialize,
    /// Marker matches
    Current,
}

/// Compare the persisted marker with [`SLEDGER_VERSION`].
///
/// The marker must equal the hyphenated lower-case token exactly. There is
/// no upgrade path between ledger storage versions, so any other value is an
/// error.
pub fn check_version(found: Option<&str>) -> DbResult<VersionCheck> {
    let expected = SLEDGER_VERSION.to_string();
    match found {
        None | Some("") => Ok(VersionCheck::Initialize),
        Some(found) if found == expected => Ok(VersionCheck::Current),
        Some(found) => Err(DbError::VersionMismatch {
            found: found.to_string(),
            expected,
        }),
    }
}

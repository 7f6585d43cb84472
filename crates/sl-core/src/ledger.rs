//! Persisted ledger entries

use crate::change::Statements;

/// One applied change as recorded in the target database.
///
/// Indices start at 0 and form a gapless sequence; entries are only ever
/// appended at the tail or removed from the tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// 0-based position in the declared sequence
    pub index: u64,

    /// Statement text that was executed
    pub forward: String,

    /// Statement text that reverses `forward`, possibly empty
    pub backward: String,
}

impl LedgerEntry {
    /// Record `statements` as applied at `index`
    pub fn new(index: u64, statements: &Statements) -> Self {
        Self {
            index,
            forward: statements.forward.clone(),
            backward: statements.backward.clone(),
        }
    }

    /// Byte-for-byte comparison of the forward text against a declared change
    pub fn matches(&self, declared: &Statements) -> bool {
        self.forward == declared.forward
    }

    /// Whether the entry can be rolled back
    pub fn is_reversible(&self) -> bool {
        !self.backward.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_compares_forward_only() {
        let entry = LedgerEntry::new(0, &Statements::new("CREATE TABLE a (x int)", "DROP TABLE a"));
        assert!(entry.matches(&Statements::new("CREATE TABLE a (x int)", "")));
        assert!(!entry.matches(&Statements::new("CREATE TABLE a (x  int)", "DROP TABLE a")));
    }

    #[test]
    fn test_irreversible_entry() {
        let entry = LedgerEntry::new(3, &Statements::new("DELETE FROM a", ""));
        assert_eq!(entry.index, 3);
        assert!(!entry.is_reversible());
    }
}

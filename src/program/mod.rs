//! Line index for the loaded program
//!
//! Records which line numbers appear as statement-leading labels, discovered
//! by one full forward scan of the token stream before execution. The index
//! answers presence only; jumps still locate their target by re-scanning the
//! source, so the index is purely the existence check that turns a bad jump
//! into a runtime error instead of a silent walk off the end of the program.

use std::collections::BTreeSet;

/// Presence set of statement-leading line numbers
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    lines: BTreeSet<i32>,
}

impl LineIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self {
            lines: BTreeSet::new(),
        }
    }

    /// Record a line number
    pub fn insert(&mut self, line_number: i32) {
        self.lines.insert(line_number);
    }

    /// True if the line number was seen during the scan
    pub fn contains(&self, line_number: i32) -> bool {
        self.lines.contains(&line_number)
    }

    /// True until the first scan has recorded anything
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Drop all recorded lines ahead of a rebuild
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Known line numbers in ascending order
    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.lines.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_contains() {
        let mut index = LineIndex::new();
        assert!(index.is_empty());
        index.insert(10);
        index.insert(30);
        assert!(index.contains(10));
        assert!(index.contains(30));
        assert!(!index.contains(20));
        assert!(!index.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut index = LineIndex::new();
        index.insert(10);
        index.clear();
        assert!(index.is_empty());
        assert!(!index.contains(10));
    }

    #[test]
    fn test_iter_is_ordered() {
        let mut index = LineIndex::new();
        index.insert(30);
        index.insert(10);
        index.insert(20);
        let lines: Vec<i32> = index.iter().collect();
        assert_eq!(lines, vec![10, 20, 30]);
    }
}

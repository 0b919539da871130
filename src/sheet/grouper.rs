//! Row grouping by key column.
//!
//! Partitions rows into named groups keyed by the first column. Rows keep
//! their source order within each group, and groups are iterated in order of
//! first appearance in the table. No merging, sorting or deduplication.

use std::collections::HashMap;

use super::loader::Row;

/// Rows sharing one key-column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// The shared key-column value.
    pub name: String,
    /// Member rows, in source order.
    pub rows: Vec<Row>,
}

impl Group {
    /// Whether every row carries the full four-column schema (word + explanation).
    pub fn has_full_schema(&self) -> bool {
        self.rows.iter().all(Row::has_gloss)
    }
}

/// Partition rows into groups by key, preserving first-appearance order.
pub fn group_rows(rows: Vec<Row>) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        match index.get(&row.key) {
            Some(&i) => groups[i].rows.push(row),
            None => {
                index.insert(row.key.clone(), groups.len());
                groups.push(Group { name: row.key.clone(), rows: vec![row] });
            }
        }
    }

    groups
}

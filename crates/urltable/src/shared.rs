//! Lock-free publication of rebuilt tables.
//!
//! A [`Table`] is never mutated after it is shared. Changing the route set
//! means building a new table and swapping it in; readers that already hold
//! a snapshot keep using the old one until they drop it.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::error::PatternError;
use crate::Table;

/// A [`Table`] slot that readers load from and a rebuilder swaps into.
#[derive(Debug)]
pub struct SharedTable {
    current: ArcSwap<Table>,
}

impl SharedTable {
    pub fn new(table: Table) -> Self {
        Self {
            current: ArcSwap::from_pointee(table),
        }
    }

    /// Snapshot of the currently published table.
    pub fn load(&self) -> Arc<Table> {
        self.current.load_full()
    }

    /// Publish a rebuilt table, returning the one it replaced.
    pub fn store(&self, table: Table) -> Arc<Table> {
        let previous = self.current.swap(Arc::new(table));
        tracing::info!(
            previous_size = previous.size(),
            size = self.current.load().size(),
            "pattern table swapped"
        );
        previous
    }

    /// Resolve a request against the currently published table.
    pub fn mapping(&self, request: &str) -> Result<Option<String>, PatternError> {
        self.current.load().mapping(request)
    }
}

impl Default for SharedTable {
    fn default() -> Self {
        Self::new(Table::new())
    }
}

impl From<Table> for SharedTable {
    fn from(table: Table) -> Self {
        Self::new(table)
    }
}

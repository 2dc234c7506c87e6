//! Sorted row storage for table column providers.

use crate::error::ErrorStatus;
use crate::oid::Oid;
use crate::pdu::PduType;
use crate::value::Value;

use super::{ProviderRequest, Reply};

/// Rows of a table keyed by their index arcs.
///
/// Column providers registered through an Entry receive the row index as
/// [`ProviderRequest::instance`]. `RowTable` keeps rows sorted so both exact
/// lookups (Get/Set) and "row after" lookups (GetNext) are binary searches.
///
/// ```rust
/// use async_snmp_agent::handler::RowTable;
///
/// let mut rows = RowTable::new();
/// rows.insert(&[2], "eth1");
/// rows.insert(&[1], "eth0");
///
/// assert_eq!(rows.get(&[1]), Some(&"eth0"));
/// assert_eq!(rows.next_after(None).map(|(i, _)| i.arcs()), Some(&[1u32][..]));
/// assert_eq!(rows.next_after(Some(&[1, 5][..])).map(|(_, v)| *v), Some("eth1"));
/// assert!(rows.next_after(Some(&[2][..])).is_none());
/// ```
#[derive(Debug, Clone)]
pub struct RowTable<V> {
    rows: Vec<(Oid, V)>,
}

impl<V> RowTable<V> {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Insert or replace the row at `index`.
    pub fn insert(&mut self, index: &[u32], value: V) {
        match self.search(index) {
            Ok(pos) => self.rows[pos].1 = value,
            Err(pos) => self.rows.insert(pos, (Oid::from_slice(index), value)),
        }
    }

    /// Remove the row at `index`.
    pub fn remove(&mut self, index: &[u32]) -> Option<V> {
        self.search(index).ok().map(|pos| self.rows.remove(pos).1)
    }

    /// Row at exactly `index`.
    pub fn get(&self, index: &[u32]) -> Option<&V> {
        self.search(index).ok().map(|pos| &self.rows[pos].1)
    }

    /// Mutable row at exactly `index`.
    pub fn get_mut(&mut self, index: &[u32]) -> Option<&mut V> {
        self.search(index).ok().map(|pos| &mut self.rows[pos].1)
    }

    /// First row sorting after `after`, or the first row when `after` is `None`.
    pub fn next_after(&self, after: Option<&[u32]>) -> Option<(&Oid, &V)> {
        let pos = match after {
            None => 0,
            Some(after) => self.rows.partition_point(|(k, _)| k.arcs() <= after),
        };
        self.rows.get(pos).map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&Oid, &V)> {
        self.rows.iter().map(|(k, v)| (k, v))
    }

    /// Answer a read-only column request from this table.
    ///
    /// `column` extracts the column's value from a row. Get returns the row
    /// named by the instance, GetNext/GetBulk the row after it. SetRequest is
    /// refused with `genErr`.
    pub fn reply<F>(&self, req: &ProviderRequest, column: F) -> Reply
    where
        F: FnOnce(&V) -> Value,
    {
        let row = match req.op {
            PduType::SetRequest => return Reply::Error(ErrorStatus::GenErr),
            _ if req.is_next() => self.next_after(req.instance()),
            _ => req
                .instance()
                .and_then(|index| self.search(index).ok())
                .map(|pos| (&self.rows[pos].0, &self.rows[pos].1)),
        };

        match row {
            Some((index, value)) => Reply::value(req.row_oid(index.arcs()), column(value)),
            None => Reply::NoValue,
        }
    }

    fn search(&self, index: &[u32]) -> std::result::Result<usize, usize> {
        self.rows.binary_search_by(|(k, _)| k.arcs().cmp(index))
    }
}

impl<V> Default for RowTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

//! Provider types for serving MIB objects.
//!
//! - [`Provider`] - Trait answering one variable binding at a time
//! - [`ProviderRequest`] - The binding being resolved and where it came from
//! - [`Reply`] - What a provider produced
//! - [`Registration`] - Where a provider sits in the MIB tree
//! - [`RowTable`] - Sorted row storage for table columns
//!
//! # Scalars
//!
//! ```rust
//! use async_snmp_agent::handler::{Registration, provider_fn, read_only_scalar};
//!
//! let sys_descr = Registration::scalar(
//!     "1.3.6.1.2.1.1.1",
//!     provider_fn(|req| read_only_scalar(req, "async-snmp-agent")),
//! )
//! .unwrap();
//! assert!(sys_descr.columns.is_none());
//! ```
//!
//! # Tables
//!
//! A table is registered at its Entry OID with the list of columns it
//! serves. Every column shares the same providers; they read the column from
//! [`ProviderRequest::node`] and the row from [`ProviderRequest::instance`].
//!
//! ```rust
//! use std::sync::Arc;
//! use async_snmp_agent::handler::{Registration, RowTable, provider_fn};
//! use async_snmp_agent::Value;
//!
//! let mut rows = RowTable::new();
//! rows.insert(&[1], ("lo", 65536));
//! rows.insert(&[2], ("eth0", 1500));
//! let rows = Arc::new(rows);
//!
//! let if_entry = Registration::table(
//!     "1.3.6.1.2.1.2.2.1",
//!     [2, 4],
//!     provider_fn(move |req| {
//!         let column = req.node.arcs().last().copied();
//!         rows.reply(req, |row| match column {
//!             Some(2) => Value::from(row.0),
//!             _ => Value::Integer(row.1),
//!         })
//!     }),
//! )
//! .unwrap();
//! assert_eq!(if_entry.columns.as_deref(), Some(&[2, 4][..]));
//! ```

mod context;
mod results;
mod row_table;
mod traits;

use std::sync::Arc;

pub use context::ProviderRequest;
pub use results::{Reply, read_only_scalar, writable_scalar};
pub use row_table::RowTable;
pub use traits::{BoxFuture, Provider, ProviderFn, provider_fn};

use crate::error::{Error, Result};
use crate::oid::Oid;

/// The provider chain attached to a MIB node.
pub type Handlers = Arc<[Arc<dyn Provider>]>;

/// A provider chain and the place it is registered.
#[derive(Clone)]
pub struct Registration {
    /// OID of the Scalar or Entry.
    pub oid: Oid,
    /// Providers tried in order; the first reply other than
    /// [`Reply::NoValue`] answers the binding.
    pub handlers: Vec<Arc<dyn Provider>>,
    /// Column arcs for an Entry; `None` for a Scalar.
    pub columns: Option<Vec<u32>>,
}

impl Registration {
    /// Register a provider chain.
    ///
    /// The OID is validated when the registration is added to the MIB.
    pub fn new(oid: Oid, handlers: Vec<Arc<dyn Provider>>, columns: Option<Vec<u32>>) -> Self {
        Self {
            oid,
            handlers,
            columns,
        }
    }

    /// A scalar at a dotted OID.
    pub fn scalar(oid: &str, provider: impl Provider) -> Result<Self> {
        Ok(Self::new(
            Oid::canonicalize(oid)?,
            vec![Arc::new(provider)],
            None,
        ))
    }

    /// A table Entry at a dotted OID with the given columns.
    pub fn table(
        oid: &str,
        columns: impl IntoIterator<Item = u32>,
        provider: impl Provider,
    ) -> Result<Self> {
        Ok(Self::new(
            Oid::canonicalize(oid)?,
            vec![Arc::new(provider)],
            Some(columns.into_iter().collect()),
        ))
    }

    /// Append a provider to the chain.
    pub fn with_handler(mut self, provider: impl Provider) -> Self {
        self.handlers.push(Arc::new(provider));
        self
    }

    /// The chain as stored in the MIB.
    pub(crate) fn handler_chain(&self) -> Result<Handlers> {
        if self.handlers.is_empty() {
            return Err(Error::Config(
                format!("registration at {} has no handler", self.oid).into(),
            ));
        }
        Ok(self.handlers.iter().cloned().collect())
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("oid", &self.oid)
            .field("handlers", &self.handlers.len())
            .field("columns", &self.columns)
            .finish()
    }
}

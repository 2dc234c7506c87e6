//! SNMP v1/v2c agent stack for tokio.
//!
//! The crate is layered bottom-up:
//!
//! - [`oid`] - object identifiers, canonical dotted form and BER arcs
//! - [`uint64`] - 64-bit counters as high/low 32-bit halves
//! - [`ber`] and [`value`] - the BER codec and the tagged SNMP value types
//! - [`varbind`], [`pdu`] and [`message`] - the v1/v2c wire structures
//! - [`mib`] - the registration tree that routes OIDs to providers
//! - [`handler`] - the provider interface and helpers
//! - [`agent`] - the UDP agent dispatching requests to providers
//! - [`client`] and [`notification`] - the manager side: requests, traps,
//!   informs and a notification receiver
//!
//! # Example
//!
//! ```rust,no_run
//! use async_snmp_agent::prelude::*;
//! use async_snmp_agent::handler::{Registration, provider_fn, read_only_scalar};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<()> {
//!     let agent = Agent::builder()
//!         .bind("127.0.0.1:1161")
//!         .community(b"public")
//!         .provider(Registration::scalar(
//!             "1.3.6.1.2.1.1.5",
//!             provider_fn(|req| read_only_scalar(req, "agent.example.com")),
//!         )?)
//!         .build()
//!         .await?;
//!     agent.run().await
//! }
//! ```

// Allow large error types - the Error enum carries OIDs inline for diagnostics.
#![allow(clippy::result_large_err)]

pub mod agent;
pub mod ber;
pub mod client;
pub mod error;
pub mod handler;
pub mod message;
pub mod mib;
pub mod notification;
pub mod oid;
pub mod pdu;
pub mod prelude;
pub mod transport;
pub mod uint64;
pub mod value;
pub mod varbind;
pub mod version;

pub(crate) mod util;

// Re-exports for convenience
pub use agent::{Agent, AgentBuilder};
pub use client::{Client, ClientBuilder, ClientConfig};
pub use error::{
    DecodeErrorKind, EncodeErrorKind, Error, ErrorStatus, OidErrorKind, RangeErrorKind, Result,
    ShadowingKind,
};
pub use handler::{Provider, ProviderRequest, Registration, Reply};
pub use message::{Inbound, Message, Outbound};
pub use mib::{Mib, NodeKind};
pub use notification::{Notification, NotificationReceiver};
pub use oid::Oid;
pub use pdu::{GenericTrap, Pdu, PduType, StdPdu, TrapV1Pdu};
pub use transport::AgentTransport;
pub use uint64::Uint64;
pub use value::{Data, TypeRegistry, Value, ValueKind};
pub use varbind::VarBind;
pub use version::Version;

//! Prelude module for convenient imports.
//!
//! ```rust,no_run
//! use async_snmp_agent::prelude::*;
//! ```
//!
//! This imports:
//! - The agent: [`Agent`], [`Registration`], [`Provider`], [`ProviderRequest`], [`Reply`]
//! - Core types: [`Oid`], [`Value`], [`VarBind`], [`Version`]
//! - Error handling: [`Error`], [`ErrorStatus`], [`Result`]
//! - The [`oid!`] macro for compile-time OID construction

pub use crate::agent::Agent;
pub use crate::error::{Error, ErrorStatus, Result};
pub use crate::handler::{Provider, ProviderRequest, Registration, Reply};
pub use crate::oid::Oid;
pub use crate::value::Value;
pub use crate::varbind::VarBind;
pub use crate::version::Version;

#[doc(no_inline)]
pub use crate::oid;

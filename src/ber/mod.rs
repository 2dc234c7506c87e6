//! BER (Basic Encoding Rules) codec for SNMP.
//!
//! Encoding goes through [`EncodeBuf`], which writes back to front so that
//! lengths never have to be precomputed. Decoding goes through [`Decoder`],
//! a cursor over a shared [`bytes::Bytes`] buffer.
//!
//! Typed value decoding (with per-type width limits) lives in
//! [`crate::value`]; this module only knows about raw TLVs.

mod decode;
mod encode;
mod length;
pub mod tag;

pub use decode::*;
pub use encode::*;
pub use length::*;
pub use tag::*;

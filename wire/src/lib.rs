//! Multi-protocol message framing and parsing.
//!
//! This crate owns the part of the stack that never looks inside a payload: it
//! turns `(meta, payload)` pairs into bytes on the wire and back, for five
//! distinct wire protocols, sharing one growable-buffer parse cursor
//! ([`buffer`]) and one length-prefix/varint toolkit across all of them.
//!
//! Protocols live one module each under [`proto`]; the common parser contract
//! (`Need-More-Bytes` / `Frame` / `Protocol-Error`) is [`frame::ParseOutcome`].

pub mod buffer;
pub mod frame;
pub mod proto;

pub use frame::{Frame, ParseOutcome, ProtocolError, ProtocolErrorKind};

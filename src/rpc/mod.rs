//! JSON-RPC protocol layer: envelope codec, line framing, and routing.

pub mod codec;
pub mod envelope;
pub mod router;

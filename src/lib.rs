#![forbid(unsafe_code)]

//! `gemini-bridge` — a JSON-RPC bridge exposing the Gemini CLI as a
//! request/response service over stdio.

pub mod config;
pub mod errors;
pub mod methods;
pub mod rpc;
pub mod tool;
pub mod transport;

pub use config::ConfigStore;
pub use errors::{AppError, Result};

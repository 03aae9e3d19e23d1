//! External tool invocation: path resolution, argument building, and
//! process execution.

pub mod args;
pub mod executor;
pub mod paths;

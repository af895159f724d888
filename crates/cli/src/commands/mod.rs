//! Command implementations.
//!
//! Each command writes its result to stdout and returns an error for
//! anything that should end the process with a failure exit code.

pub mod check;
pub mod get;
pub mod set;

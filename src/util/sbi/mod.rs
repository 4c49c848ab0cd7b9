//! SBI wrapper
//!
//! Firmware services used by the crate. Only the console is needed, for the
//! interrupt system's log output.

mod api;

pub use api::*;

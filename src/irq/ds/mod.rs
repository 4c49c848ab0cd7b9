//! Interrupt subsystem data structures
//!
//! Plain types shared by every component of the interrupt subsystem:
//! vector table words, interrupt numbering, configuration and errors.

pub mod types;
pub mod config;
pub mod error;

pub use types::{
    Handler, Vector, IrqNumber, CoreException,
    CORE_EXCEPTION_COUNT, MAX_EXTERNAL_INTERRUPTS,
};
pub use config::{InterruptConfig, RamRegion, IsrHooks};
pub use error::IrqError;

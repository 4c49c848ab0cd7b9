//! Run-time interrupt vector management for single-core microcontrollers
//!
//! See [`irq`] for the subsystem itself. The crate is `no_std`; the test
//! build links `std` for its console and test harness.

#![cfg_attr(not(test), no_std)]

pub mod console;
mod util;
pub mod irq;

pub use irq::{
    InterruptConfig, InterruptSystem, IrqError, IrqNumber, IsrHooks, RamRegion,
    SystemInstance, Vector,
};

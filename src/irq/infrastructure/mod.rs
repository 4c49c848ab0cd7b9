//! Interrupt system infrastructure module
//!
//! Provides the components behind the interrupt system API: the vector table
//! store, the interrupt controller, the dispatch trampoline and the
//! dependency-injected container that ties them to a hardware backend.

pub mod di;
pub mod guard;
mod vector;
mod controller;
mod trampoline;
#[cfg(test)]
mod fixture;
#[cfg(test)]
mod nesting_test;

use core::fmt;
use crate::println;

pub use vector::required_alignment;
pub use trampoline::isr_trampoline;

/// Stop the system after an unrecoverable invariant violation
///
/// Dispatching through a corrupted table is worse than halting, so nothing
/// here is reported back to the caller.
#[cold]
pub fn fatal(args: fmt::Arguments) -> ! {
    println!("Interrupt system halted: {}", args);
    panic!("interrupt system halted: {}", args);
}

/// Shared fallback for every slot without a handler of its own
///
/// # Safety
///
/// Only the core may call this, as a vector.
pub unsafe extern "C" fn default_handler() {
    fatal(format_args!("unhandled interrupt"));
}

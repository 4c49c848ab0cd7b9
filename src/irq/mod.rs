//! Run-time interrupt vector management
//!
//! Relocates the vector table into RAM, patches individual handlers, drives
//! per-interrupt enable/priority/pending state and, when instrumented, routes
//! every external interrupt through a trampoline that tracks nesting depth.
//!
//! Everything hangs off an [`InterruptSystem`], bound to a `'static`
//! [`SystemInstance`] (see [`interrupt_system!`](crate::interrupt_system)).

pub mod ds;
pub mod infrastructure;

pub use ds::{
    CoreException, Handler, InterruptConfig, IrqError, IrqNumber, IsrHooks,
    RamRegion, Vector, CORE_EXCEPTION_COUNT, MAX_EXTERNAL_INTERRUPTS,
};
pub use infrastructure::{default_handler, fatal, isr_trampoline, required_alignment};
pub use infrastructure::guard::InterruptGuard;
pub use infrastructure::di::SystemInstance;
pub use infrastructure::di::container::InterruptSystem;
pub use infrastructure::di::traits::HardwareControlInterface;
pub use infrastructure::di::simulated::SimulatedHardwareControl;
#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
pub use infrastructure::di::impls::ClicHardwareControl;

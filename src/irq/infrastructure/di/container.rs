//! Interrupt System Dependency Injection Container
//!
//! `InterruptSystem` owns the injected hardware backend, the configuration and
//! every piece of shared mutable state of the subsystem. The component
//! operations live next to it in `vector`, `controller` and `trampoline`;
//! this file holds the state and the one-shot initialization gate.

use core::ptr::NonNull;
use core::sync::atomic::{AtomicBool, Ordering};
use crate::println;
use crate::irq::ds::{CoreException, Handler, InterruptConfig, IrqError, IrqNumber, IsrHooks, Vector};
use super::super::guard::{InterruptGuard, IrqCell};
use super::traits::HardwareControlInterface;

/// The relocated vector table, written with volatile accesses because the
/// core reads it behind our back
#[derive(Copy, Clone)]
pub(crate) struct RamTable {
    base: NonNull<Vector>,
    len: usize,
}

// Safety: the table is only touched inside critical sections.
unsafe impl Send for RamTable {}

impl RamTable {
    pub(crate) fn new(table: &'static mut [Vector]) -> Self {
        Self {
            len: table.len(),
            base: NonNull::from(table).cast(),
        }
    }

    pub(crate) fn addr(&self) -> usize {
        self.base.as_ptr() as usize
    }

    pub(crate) fn read(&self, index: usize) -> Vector {
        assert!(index < self.len, "vector index {} out of table", index);
        unsafe { core::ptr::read_volatile(self.base.as_ptr().add(index)) }
    }

    pub(crate) fn write(&self, index: usize, vector: Vector) {
        assert!(index < self.len, "vector index {} out of table", index);
        unsafe { core::ptr::write_volatile(self.base.as_ptr().add(index), vector) }
    }
}

/// How external interrupts reach their handlers, fixed at construction
#[derive(Copy, Clone)]
pub(crate) enum Dispatch {
    /// Table slots hold the handlers themselves
    Direct,
    /// Table slots hold the trampoline; the handlers live in the shadow table
    Trampoline(IsrHooks),
}

/// Mutable state shared between thread mode and interrupt handlers
pub(crate) struct SystemState {
    /// Table installed by the last relocation
    pub(crate) ram_table: Option<RamTable>,
    /// Real handlers behind the trampoline, indexed by external interrupt.
    /// Placed right after the relocated table.
    pub(crate) shadow: Option<RamTable>,
    /// Trampoline invocations currently on the stack
    pub(crate) nesting: usize,
}

/// Interrupt system container
pub struct InterruptSystem<H: HardwareControlInterface> {
    pub(crate) hardware: H,
    pub(crate) config: InterruptConfig,
    pub(crate) trampoline: Handler,
    pub(crate) dispatch: Dispatch,
    initialized: AtomicBool,
    pub(crate) state: IrqCell<SystemState>,
}

impl<H: HardwareControlInterface> InterruptSystem<H> {
    /// Create an uninitialized system.
    ///
    /// `trampoline` is the dispatch wrapper bound to this instance, normally
    /// `isr_trampoline::<S>` for the `SystemInstance` that owns it.
    pub const fn new(hardware: H, config: InterruptConfig, trampoline: Handler) -> Self {
        let dispatch = match config.instrumentation() {
            Some(hooks) => Dispatch::Trampoline(hooks),
            None => Dispatch::Direct,
        };
        Self {
            hardware,
            config,
            trampoline,
            dispatch,
            initialized: AtomicBool::new(false),
            state: IrqCell::new(SystemState {
                ram_table: None,
                shadow: None,
                nesting: 0,
            }),
        }
    }

    /// Words reserved after the relocated table for the shadow table
    pub(crate) fn shadow_len(&self) -> usize {
        match self.dispatch {
            Dispatch::Trampoline(_) => self.config.irq_count(),
            Dispatch::Direct => 0,
        }
    }

    /// Get the injected hardware backend
    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    pub fn config(&self) -> &InterruptConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Initialize the interrupt system
    ///
    /// Relocates the vector table into the configured RAM region (installing
    /// the trampoline when instrumented) and gives every configurable core
    /// exception and every external interrupt the default priority. Only the
    /// first call does anything; later calls return `Ok` without touching the
    /// hardware.
    pub fn init(&self) -> Result<(), IrqError> {
        self.config.validate()?;

        let guard = InterruptGuard::new(&self.hardware);

        if self.initialized.compare_exchange(
            false, true, Ordering::SeqCst, Ordering::SeqCst
        ).is_err() {
            return Ok(());
        }

        self.state.with(&guard, |state| state.nesting = 0);

        if let Some(region) = self.config.relocation() {
            let len = self.config.table_len();
            let shadow_len = self.shadow_len();
            self.check_placement(region.base() as usize, len, shadow_len);
            // Safety: the region was just checked to hold the aligned table
            // and its shadow, and the configuration reserves it for them.
            let table = unsafe { core::slice::from_raw_parts_mut(region.base(), len + shadow_len) };
            unsafe { self.relocate(table)? };
        }

        let priority = self.config.default_priority();
        for exception in CoreException::CONFIGURABLE {
            self.set_priority(exception.irqn(), priority)?;
        }
        for irq in 0..self.config.irq_count() {
            self.set_priority(IrqNumber::new(irq as i16), priority)?;
        }

        drop(guard);

        println!(
            "Interrupt system initialized: {} external interrupts, default priority {}, relocated: {}, instrumented: {}",
            self.config.irq_count(),
            priority,
            self.config.relocation().is_some(),
            matches!(self.dispatch, Dispatch::Trampoline(_))
        );
        Ok(())
    }
}

//! ISR dispatch trampoline and nesting counter
//!
//! With instrumentation configured every external slot of the relocated table
//! points at `isr_trampoline`. It finds out which interrupt it is serving from
//! the active vector, runs the enter hook, counts itself into the nesting
//! depth, calls the real handler from the shadow table, counts itself out and
//! runs the exit hook.

use crate::irq::ds::{IrqError, IrqNumber};
use super::di::container::{Dispatch, InterruptSystem};
use super::di::traits::HardwareControlInterface;
use super::di::SystemInstance;
use super::guard::InterruptGuard;
use super::{default_handler, fatal};

/// Common entry for every instrumented external interrupt of `S`
///
/// # Safety
///
/// Only the core may call this, as a vector, while servicing an external
/// interrupt of `S`.
pub unsafe extern "C" fn isr_trampoline<S: SystemInstance>() {
    S::system().dispatch_active();
}

impl<H: HardwareControlInterface> InterruptSystem<H> {
    fn instrumented(&self) -> Result<(), IrqError> {
        match self.dispatch {
            Dispatch::Trampoline(_) => Ok(()),
            Dispatch::Direct => Err(IrqError::InvalidConfiguration),
        }
    }

    /// Number of trampoline invocations currently on the stack
    pub fn nesting_depth(&self) -> Result<usize, IrqError> {
        self.instrumented()?;
        let guard = InterruptGuard::new(&self.hardware);
        Ok(self.state.with(&guard, |state| state.nesting))
    }

    /// Count one interrupt entry, returning the new depth
    pub fn enter_isr(&self) -> Result<usize, IrqError> {
        self.instrumented()?;
        let guard = InterruptGuard::new(&self.hardware);
        Ok(self.state.with(&guard, |state| {
            state.nesting += 1;
            state.nesting
        }))
    }

    /// Count one interrupt exit, returning the new depth
    ///
    /// An exit without a matching entry halts the system.
    pub fn exit_isr(&self) -> Result<usize, IrqError> {
        self.instrumented()?;
        let guard = InterruptGuard::new(&self.hardware);
        Ok(self.state.with(&guard, |state| match state.nesting.checked_sub(1) {
            Some(depth) => {
                state.nesting = depth;
                depth
            }
            None => fatal(format_args!("interrupt exit without matching entry")),
        }))
    }

    fn dispatch_active(&self) {
        let Dispatch::Trampoline(hooks) = self.dispatch else {
            fatal(format_args!("dispatch trampoline reached without instrumentation"));
        };

        let vector = self.hardware.active_vector();
        let irqn = IrqNumber::from_vector_index(vector);
        let irq = match self.external(irqn) {
            Ok(irq) => irq,
            Err(_) => fatal(format_args!("dispatch trampoline entered for vector {}", vector)),
        };

        (hooks.enter)(irqn);

        // Entry and handler lookup form one critical section so a nested
        // patch cannot slip between them
        let handler = {
            let guard = InterruptGuard::new(&self.hardware);
            self.state.with(&guard, |state| {
                state.nesting += 1;
                state.shadow.map(|shadow| shadow.read(irq))
            })
        };

        let Some(handler) = handler else {
            fatal(format_args!("dispatch trampoline entered before relocation"));
        };
        unsafe {
            match handler.as_handler() {
                Some(handler) => handler(),
                None => default_handler(),
            }
        }

        {
            let guard = InterruptGuard::new(&self.hardware);
            self.state.with(&guard, |state| match state.nesting.checked_sub(1) {
                Some(depth) => state.nesting = depth,
                None => fatal(format_args!("interrupt exit without matching entry")),
            });
        }

        (hooks.exit)(irqn);
    }
}

//! Interrupt controller
//!
//! Per-interrupt control surface: enable, disable, priority, pending and
//! active state, handler patching, and the "would this interrupt run right
//! now" query.

use crate::irq::ds::{CoreException, Handler, IrqError, IrqNumber, Vector, CORE_EXCEPTION_COUNT};
use super::di::container::{Dispatch, InterruptSystem};
use super::di::traits::{HardwareControlInterface, PriorityCodec};
use super::guard::InterruptGuard;
use super::default_handler;

impl<H: HardwareControlInterface> InterruptSystem<H> {
    /// Index of external interrupt `irqn`, if it exists in this build
    pub(crate) fn external(&self, irqn: IrqNumber) -> Result<usize, IrqError> {
        match irqn.external_index() {
            Some(irq) if irq < self.config.irq_count() => Ok(irq),
            _ => Err(IrqError::InvalidParameter),
        }
    }

    /// Like `external`, but core exceptions map to `None` instead of failing
    fn external_or_core(&self, irqn: IrqNumber) -> Result<Option<usize>, IrqError> {
        if irqn.is_core() {
            Ok(None)
        } else {
            self.external(irqn).map(Some)
        }
    }

    fn codec(&self) -> PriorityCodec {
        PriorityCodec::new(&self.config)
    }

    pub fn enable(&self, irqn: IrqNumber) -> Result<(), IrqError> {
        let irq = self.external(irqn)?;
        let _guard = InterruptGuard::new(&self.hardware);
        self.hardware.enable_irq(irq);
        Ok(())
    }

    /// Disable `irqn` and wait until the controller has applied it, so the
    /// source cannot fire once this returns
    pub fn disable(&self, irqn: IrqNumber) -> Result<(), IrqError> {
        let irq = self.external(irqn)?;
        let _guard = InterruptGuard::new(&self.hardware);
        self.hardware.disable_irq(irq);
        self.hardware.barrier();
        Ok(())
    }

    pub fn is_enabled(&self, irqn: IrqNumber) -> Result<bool, IrqError> {
        let irq = self.external(irqn)?;
        Ok(self.hardware.is_irq_enabled(irq))
    }

    pub fn is_disabled(&self, irqn: IrqNumber) -> Result<bool, IrqError> {
        self.is_enabled(irqn).map(|enabled| !enabled)
    }

    /// Set the priority of an external interrupt or a configurable core
    /// exception. 0 is the most urgent level.
    pub fn set_priority(&self, irqn: IrqNumber, priority: u8) -> Result<(), IrqError> {
        if priority > self.config.lowest_priority() {
            return Err(IrqError::InvalidParameter);
        }
        let raw = self.codec().encode(priority);
        match self.external_or_core(irqn)? {
            Some(irq) => self.hardware.set_irq_priority(irq, raw),
            None => {
                let exception = Self::configurable_exception(irqn)?;
                self.hardware.set_exception_priority(exception.vector_index(), raw);
            }
        }
        Ok(())
    }

    pub fn priority(&self, irqn: IrqNumber) -> Result<u8, IrqError> {
        let raw = match self.external_or_core(irqn)? {
            Some(irq) => self.hardware.irq_priority(irq),
            None => {
                let exception = Self::configurable_exception(irqn)?;
                self.hardware.exception_priority(exception.vector_index())
            }
        };
        Ok(self.codec().decode(raw))
    }

    fn configurable_exception(irqn: IrqNumber) -> Result<CoreException, IrqError> {
        CoreException::from_irqn(irqn)
            .filter(|exception| exception.has_configurable_priority())
            .ok_or(IrqError::InvalidParameter)
    }

    /// Lowest priority this build can represent
    pub fn lowest_priority(&self) -> u8 {
        self.config.lowest_priority()
    }

    /// Block every interrupt whose priority is numerically at or above
    /// `priority`. 0 removes the floor.
    pub fn set_priority_floor(&self, priority: u8) -> Result<(), IrqError> {
        if priority > self.config.lowest_priority() {
            return Err(IrqError::InvalidParameter);
        }
        self.hardware.set_priority_floor(self.codec().encode(priority));
        self.hardware.barrier();
        Ok(())
    }

    pub fn priority_floor(&self) -> u8 {
        self.codec().decode(self.hardware.priority_floor())
    }

    /// Pending state of `irqn`; always `false` for core exceptions
    pub fn is_pending(&self, irqn: IrqNumber) -> Result<bool, IrqError> {
        Ok(match self.external_or_core(irqn)? {
            Some(irq) => self.hardware.is_irq_pending(irq),
            None => false,
        })
    }

    /// Mark `irqn` pending; no-op for core exceptions
    pub fn set_pending(&self, irqn: IrqNumber) -> Result<(), IrqError> {
        if let Some(irq) = self.external_or_core(irqn)? {
            self.hardware.set_irq_pending(irq);
        }
        Ok(())
    }

    /// Clear the pending state of `irqn`; no-op for core exceptions
    pub fn clear_pending(&self, irqn: IrqNumber) -> Result<(), IrqError> {
        if let Some(irq) = self.external_or_core(irqn)? {
            self.hardware.clear_irq_pending(irq);
        }
        Ok(())
    }

    /// Check if `irqn` is being serviced; always `false` for core exceptions
    pub fn is_active(&self, irqn: IrqNumber) -> Result<bool, IrqError> {
        Ok(match self.external_or_core(irqn)? {
            Some(irq) => self.hardware.is_irq_active(irq),
            None => false,
        })
    }

    /// Check whether raising `irqn` now would fail to run it promptly
    ///
    /// True if interrupts are globally masked, `irqn` is disabled, the
    /// preemption floor is at or above its urgency, or the exception being
    /// serviced is at least as urgent.
    pub fn is_blocked(&self, irqn: IrqNumber) -> Result<bool, IrqError> {
        let irq = self.external(irqn)?;
        let codec = self.codec();

        if !self.hardware.interrupts_enabled() || !self.hardware.is_irq_enabled(irq) {
            return Ok(true);
        }

        let priority = codec.decode(self.hardware.irq_priority(irq));
        let floor = codec.decode(self.hardware.priority_floor());
        if floor != 0 && floor <= priority {
            return Ok(true);
        }

        let active = self.hardware.active_vector();
        if active != 0 {
            return Ok(match self.running_priority(active) {
                Some(running) => running <= priority,
                // Fixed-priority exceptions outrank every configurable level
                None => true,
            });
        }
        Ok(false)
    }

    /// Priority of the exception in table slot `vector`, `None` when it
    /// runs at a fixed priority
    fn running_priority(&self, vector: usize) -> Option<u8> {
        let codec = self.codec();
        if vector >= CORE_EXCEPTION_COUNT {
            let irq = vector - CORE_EXCEPTION_COUNT;
            if irq < self.config.irq_count() {
                return Some(codec.decode(self.hardware.irq_priority(irq)));
            }
            return None;
        }
        CoreException::from_vector_index(vector)
            .filter(|exception| exception.has_configurable_priority())
            .map(|exception| codec.decode(self.hardware.exception_priority(exception.vector_index())))
    }

    /// Bind `handler` to external interrupt `irqn`
    ///
    /// Needs the relocated table to be active. With interrupts masked, the
    /// source is disabled while its slot changes and re-enabled afterwards if
    /// it was enabled when the mask was taken.
    pub fn set_handler(&self, irqn: IrqNumber, handler: Handler) -> Result<(), IrqError> {
        let irq = self.external(irqn)?;
        self.patch_handler(irq, Vector::from_handler(handler))
    }

    /// Put the shared default handler back in the slot of `irqn`
    pub fn remove_handler(&self, irqn: IrqNumber) -> Result<(), IrqError> {
        let irq = self.external(irqn)?;
        self.patch_handler(irq, Vector::from_handler(default_handler))
    }

    fn patch_handler(&self, irq: usize, vector: Vector) -> Result<(), IrqError> {
        if self.config.relocation().is_none() {
            return Err(IrqError::NotInitialized);
        }

        let guard = InterruptGuard::new(&self.hardware);
        self.state.with(&guard, |state| {
            let table = self.relocated_table(state.ram_table).ok_or(IrqError::NotInitialized)?;
            let (target, index) = match self.dispatch {
                Dispatch::Trampoline(_) => (state.shadow.ok_or(IrqError::NotInitialized)?, irq),
                Dispatch::Direct => (table, CORE_EXCEPTION_COUNT + irq),
            };

            let was_enabled = self.hardware.is_irq_enabled(irq);
            self.hardware.disable_irq(irq);
            target.write(index, vector);
            self.hardware.barrier();
            if was_enabled {
                self.hardware.enable_irq(irq);
            }
            Ok(())
        })
    }
}

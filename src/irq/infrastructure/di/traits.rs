//! Interrupt System Dependency Injection Traits
//!
//! The register surface the interrupt system drives. Backends implement this
//! trait and are injected into `InterruptSystem` at construction.
//!
//! Priorities cross this boundary as raw register bytes where 0 is the most
//! urgent level; only the high `priority_bits` bits are significant.

use crate::irq::ds::InterruptConfig;

/// Trait for hardware control implementations
pub trait HardwareControlInterface: Send + Sync {
    /// Address held by the vector-table base register
    fn vector_base(&self) -> usize;

    /// Point the vector-table base register at `base`
    fn set_vector_base(&self, base: usize);

    /// Complete outstanding memory accesses and flush the instruction
    /// pipeline so later fetches observe earlier writes
    fn barrier(&self);

    /// Check if interrupts are globally unmasked
    fn interrupts_enabled(&self) -> bool;

    /// Mask all interrupts, returning whether they were unmasked before
    fn disable_interrupts(&self) -> bool;

    /// Restore the global mask returned by `disable_interrupts`
    fn restore_interrupts(&self, was_enabled: bool);

    /// Set the enable bit of external interrupt `irq`
    fn enable_irq(&self, irq: usize);

    /// Clear the enable bit of external interrupt `irq`
    fn disable_irq(&self, irq: usize);

    fn is_irq_enabled(&self, irq: usize) -> bool;

    fn set_irq_pending(&self, irq: usize);

    fn clear_irq_pending(&self, irq: usize);

    fn is_irq_pending(&self, irq: usize) -> bool;

    /// Check if external interrupt `irq` is being serviced
    fn is_irq_active(&self, irq: usize) -> bool;

    /// Write the raw priority byte of external interrupt `irq`
    fn set_irq_priority(&self, irq: usize, raw: u8);

    fn irq_priority(&self, irq: usize) -> u8;

    /// Write the raw priority byte of the core exception in table slot `vector`
    fn set_exception_priority(&self, vector: usize, raw: u8);

    fn exception_priority(&self, vector: usize) -> u8;

    /// Raw preemption floor; 0 disables the floor
    fn priority_floor(&self) -> u8;

    fn set_priority_floor(&self, raw: u8);

    /// Vector table slot of the exception being serviced, 0 in thread mode
    fn active_vector(&self) -> usize;
}

/// Convert between logical priorities and raw register bytes
pub(crate) struct PriorityCodec {
    shift: u32,
}

impl PriorityCodec {
    pub(crate) fn new(config: &InterruptConfig) -> Self {
        Self {
            shift: 8u32.saturating_sub(config.priority_bits() as u32),
        }
    }

    pub(crate) fn encode(&self, priority: u8) -> u8 {
        ((priority as u32) << self.shift) as u8
    }

    pub(crate) fn decode(&self, raw: u8) -> u8 {
        ((raw as u32) >> self.shift) as u8
    }
}

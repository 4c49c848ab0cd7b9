//! Interrupt subsystem configuration
//!
//! Build-time choices: how many external interrupts exist, how many priority
//! bits the controller implements, whether the vector table moves to RAM and
//! whether the dispatch trampoline is installed. Configurations are built in
//! const context so they can live in a `static`.

use super::error::IrqError;
use super::types::{IrqNumber, Vector, CORE_EXCEPTION_COUNT, MAX_EXTERNAL_INTERRUPTS};

/// Memory reserved for the relocated vector table
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RamRegion {
    base: *mut Vector,
    size: usize,
}

// Safety: the region is only an address range; access goes through the
// interrupt system's critical sections.
unsafe impl Send for RamRegion {}
unsafe impl Sync for RamRegion {}

impl RamRegion {
    /// `size` is in bytes
    pub const fn new(base: *mut Vector, size: usize) -> Self {
        Self { base, size }
    }

    pub const fn base(&self) -> *mut Vector {
        self.base
    }

    pub const fn size(&self) -> usize {
        self.size
    }

    /// Check that `len` bytes starting at `start` lie inside the region
    pub fn contains(&self, start: usize, len: usize) -> bool {
        let base = self.base as usize;
        match (start.checked_add(len), base.checked_add(self.size)) {
            (Some(end), Some(region_end)) => start >= base && end <= region_end,
            _ => false,
        }
    }
}

fn no_hook(_irqn: IrqNumber) {}

/// Hooks run by the dispatch trampoline around every external interrupt
#[derive(Debug, Copy, Clone)]
pub struct IsrHooks {
    /// Called before the nesting counter is incremented
    pub enter: fn(IrqNumber),
    /// Called after the nesting counter is decremented
    pub exit: fn(IrqNumber),
}

impl IsrHooks {
    pub const NONE: Self = Self {
        enter: no_hook,
        exit: no_hook,
    };

    pub const fn new(enter: fn(IrqNumber), exit: fn(IrqNumber)) -> Self {
        Self { enter, exit }
    }
}

/// Interrupt subsystem configuration
#[derive(Debug, Copy, Clone)]
pub struct InterruptConfig {
    irq_count: usize,
    priority_bits: u8,
    default_priority: Option<u8>,
    relocation: Option<RamRegion>,
    instrumentation: Option<IsrHooks>,
}

impl InterruptConfig {
    /// Implemented priority bits when none are configured
    pub const DEFAULT_PRIORITY_BITS: u8 = 3;

    /// Configuration for `irq_count` external interrupts, no relocation, no
    /// instrumentation, and every interrupt defaulting to the lowest priority.
    pub const fn new(irq_count: usize) -> Self {
        Self {
            irq_count,
            priority_bits: Self::DEFAULT_PRIORITY_BITS,
            default_priority: None,
            relocation: None,
            instrumentation: None,
        }
    }

    pub const fn with_priority_bits(mut self, bits: u8) -> Self {
        self.priority_bits = bits;
        self
    }

    pub const fn with_default_priority(mut self, priority: u8) -> Self {
        self.default_priority = Some(priority);
        self
    }

    /// Relocate the vector table into `region` at init
    pub const fn with_relocation(mut self, region: RamRegion) -> Self {
        self.relocation = Some(region);
        self
    }

    /// Route every external interrupt through the dispatch trampoline
    pub const fn with_instrumentation(mut self, hooks: IsrHooks) -> Self {
        self.instrumentation = Some(hooks);
        self
    }

    pub const fn irq_count(&self) -> usize {
        self.irq_count
    }

    pub const fn priority_bits(&self) -> u8 {
        self.priority_bits
    }

    /// Numerically largest (least urgent) priority
    pub const fn lowest_priority(&self) -> u8 {
        if self.priority_bits >= 8 {
            u8::MAX
        } else {
            (1u8 << self.priority_bits) - 1
        }
    }

    pub const fn default_priority(&self) -> u8 {
        match self.default_priority {
            Some(priority) => priority,
            None => self.lowest_priority(),
        }
    }

    pub const fn relocation(&self) -> Option<RamRegion> {
        self.relocation
    }

    pub const fn instrumentation(&self) -> Option<IsrHooks> {
        self.instrumentation
    }

    /// Number of words in a vector table for this configuration
    pub const fn table_len(&self) -> usize {
        CORE_EXCEPTION_COUNT + self.irq_count
    }

    /// Reject configurations no build could honour
    pub fn validate(&self) -> Result<(), IrqError> {
        if self.irq_count > MAX_EXTERNAL_INTERRUPTS {
            return Err(IrqError::InvalidConfiguration);
        }
        if self.priority_bits == 0 || self.priority_bits > 8 {
            return Err(IrqError::InvalidConfiguration);
        }
        if self.default_priority() > self.lowest_priority() {
            return Err(IrqError::InvalidConfiguration);
        }
        // The trampoline can only be installed into a table we own
        if self.instrumentation.is_some() && self.relocation.is_none() {
            return Err(IrqError::InvalidConfiguration);
        }
        Ok(())
    }
}

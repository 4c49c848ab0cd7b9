//! Interrupt System Component Implementations
//!
//! Hardware backend for RISC-V cores with a CLIC-style interrupt controller.
//!
//! Register mapping:
//! - vector-table base: `mtvt` CSR
//! - global mask: `mstatus.MIE`
//! - per-interrupt pending/enable/priority: the `clicintip`, `clicintie` and
//!   `clicintctl` bytes at `base + 0x1000 + 4 * id`
//! - preemption floor: `mintthresh` CSR
//! - active vector: `mcause` exception code while `mintstatus.MIL` is non-zero
//!
//! CLIC ids 0..16 are the local (core) interrupts, so external interrupt `n`
//! is id `16 + n`, matching the vector table layout. CLIC levels grow with
//! urgency while the interrupt system's raw priorities shrink with it; this
//! backend inverts the byte on the way in and out.

use core::arch::asm;
use riscv::register::{mcause, mstatus};
use crate::irq::ds::CORE_EXCEPTION_COUNT;
use super::traits::HardwareControlInterface;

const CLICINT_OFFSET: usize = 0x1000;
const CLICINTIP: usize = 0;
const CLICINTIE: usize = 1;
const CLICINTCTL: usize = 3;
const MCAUSE_CODE_MASK: usize = 0xFFF;

/// RISC-V CLIC hardware control
#[derive(Copy, Clone)]
pub struct ClicHardwareControl {
    base: usize,
}

impl ClicHardwareControl {
    /// Create a backend for the CLIC mapped at `base`
    pub const fn new(base: usize) -> Self {
        Self { base }
    }

    fn reg(&self, id: usize, byte: usize) -> *mut u8 {
        (self.base + CLICINT_OFFSET + 4 * id + byte) as *mut u8
    }

    fn read(&self, id: usize, byte: usize) -> u8 {
        unsafe { core::ptr::read_volatile(self.reg(id, byte)) }
    }

    fn write(&self, id: usize, byte: usize, value: u8) {
        unsafe { core::ptr::write_volatile(self.reg(id, byte), value) }
    }

    fn external(irq: usize) -> usize {
        CORE_EXCEPTION_COUNT + irq
    }
}

impl HardwareControlInterface for ClicHardwareControl {
    fn vector_base(&self) -> usize {
        let value: usize;
        unsafe {
            asm!("csrr {0}, 0x307", out(reg) value, options(nomem, nostack));
        }
        value
    }

    fn set_vector_base(&self, base: usize) {
        unsafe {
            asm!("csrw 0x307, {0}", in(reg) base, options(nostack));
        }
    }

    fn barrier(&self) {
        unsafe {
            asm!("fence iorw, iorw", "fence.i", options(nostack));
        }
    }

    fn interrupts_enabled(&self) -> bool {
        mstatus::read().mie()
    }

    fn disable_interrupts(&self) -> bool {
        let was_enabled = mstatus::read().mie();
        unsafe {
            mstatus::clear_mie();
        }
        was_enabled
    }

    fn restore_interrupts(&self, was_enabled: bool) {
        if was_enabled {
            unsafe {
                mstatus::set_mie();
            }
        }
    }

    fn enable_irq(&self, irq: usize) {
        self.write(Self::external(irq), CLICINTIE, 1);
    }

    fn disable_irq(&self, irq: usize) {
        self.write(Self::external(irq), CLICINTIE, 0);
    }

    fn is_irq_enabled(&self, irq: usize) -> bool {
        self.read(Self::external(irq), CLICINTIE) & 1 != 0
    }

    fn set_irq_pending(&self, irq: usize) {
        self.write(Self::external(irq), CLICINTIP, 1);
    }

    fn clear_irq_pending(&self, irq: usize) {
        self.write(Self::external(irq), CLICINTIP, 0);
    }

    fn is_irq_pending(&self, irq: usize) -> bool {
        self.read(Self::external(irq), CLICINTIP) & 1 != 0
    }

    fn is_irq_active(&self, irq: usize) -> bool {
        self.active_vector() == Self::external(irq)
    }

    fn set_irq_priority(&self, irq: usize, raw: u8) {
        self.write(Self::external(irq), CLICINTCTL, !raw);
    }

    fn irq_priority(&self, irq: usize) -> u8 {
        !self.read(Self::external(irq), CLICINTCTL)
    }

    fn set_exception_priority(&self, vector: usize, raw: u8) {
        self.write(vector, CLICINTCTL, !raw);
    }

    fn exception_priority(&self, vector: usize) -> u8 {
        !self.read(vector, CLICINTCTL)
    }

    fn priority_floor(&self) -> u8 {
        let threshold: usize;
        unsafe {
            asm!("csrr {0}, 0x347", out(reg) threshold, options(nomem, nostack));
        }
        match threshold as u8 {
            0 => 0,
            level => !level,
        }
    }

    fn set_priority_floor(&self, raw: u8) {
        // Only levels above the threshold preempt: floor `raw` lets through
        // raw priorities strictly below it.
        let threshold = match raw {
            0 => 0,
            raw => !raw,
        } as usize;
        unsafe {
            asm!("csrw 0x347, {0}", in(reg) threshold, options(nostack));
        }
    }

    fn active_vector(&self) -> usize {
        let status: usize;
        unsafe {
            asm!("csrr {0}, 0xFB1", out(reg) status, options(nomem, nostack));
        }
        // mintstatus.MIL lives in the top byte
        if (status >> 24) & 0xFF == 0 {
            return 0;
        }
        mcause::read().bits() & MCAUSE_CODE_MASK
    }
}

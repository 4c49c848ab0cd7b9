//! Simulated interrupt controller
//!
//! An in-memory register file implementing `HardwareControlInterface`. It
//! counts register writes and barriers so callers can check exactly what an
//! operation did to the hardware, and it can fire interrupts through whatever
//! table the vector-base register points at.

use core::sync::atomic::{AtomicUsize, Ordering};
use spin::Mutex;
use crate::irq::ds::{Vector, CORE_EXCEPTION_COUNT, MAX_EXTERNAL_INTERRUPTS};
use super::traits::HardwareControlInterface;

const BIT_WORDS: usize = (MAX_EXTERNAL_INTERRUPTS + 31) / 32;

/// One bit per external interrupt, packed like the controller's register banks
#[derive(Copy, Clone)]
struct BitBank([u32; BIT_WORDS]);

impl BitBank {
    const fn new() -> Self {
        Self([0; BIT_WORDS])
    }

    fn set(&mut self, irq: usize) {
        self.0[irq / 32] |= 1 << (irq % 32);
    }

    fn clear(&mut self, irq: usize) {
        self.0[irq / 32] &= !(1 << (irq % 32));
    }

    fn get(&self, irq: usize) -> bool {
        self.0[irq / 32] & (1 << (irq % 32)) != 0
    }
}

struct RegisterFile {
    vector_base: usize,
    interrupts_enabled: bool,
    enable: BitBank,
    pending: BitBank,
    priority: [u8; MAX_EXTERNAL_INTERRUPTS],
    exception_priority: [u8; CORE_EXCEPTION_COUNT],
    priority_floor: u8,
    active_vector: usize,
}

/// Simulated hardware control
pub struct SimulatedHardwareControl {
    registers: Mutex<RegisterFile>,
    register_writes: AtomicUsize,
    barriers: AtomicUsize,
}

impl SimulatedHardwareControl {
    /// Reset state: interrupts unmasked, every source disabled, all
    /// priorities 0, vector base 0
    pub const fn new() -> Self {
        Self {
            registers: Mutex::new(RegisterFile {
                vector_base: 0,
                interrupts_enabled: true,
                enable: BitBank::new(),
                pending: BitBank::new(),
                priority: [0; MAX_EXTERNAL_INTERRUPTS],
                exception_priority: [0; CORE_EXCEPTION_COUNT],
                priority_floor: 0,
                active_vector: 0,
            }),
            register_writes: AtomicUsize::new(0),
            barriers: AtomicUsize::new(0),
        }
    }

    /// Load the vector-base register the way reset does, without counting it
    /// as a register write
    pub fn boot_from(&self, table: *const Vector) {
        self.registers.lock().vector_base = table as usize;
    }

    /// Writes to the vector base, enable, pending, priority and floor
    /// registers since construction. Global mask changes are not counted.
    pub fn register_writes(&self) -> usize {
        self.register_writes.load(Ordering::SeqCst)
    }

    pub fn barriers(&self) -> usize {
        self.barriers.load(Ordering::SeqCst)
    }

    /// Pretend the core is servicing table slot `vector` (0 for thread mode)
    pub fn set_active_vector(&self, vector: usize) {
        self.registers.lock().active_vector = vector;
    }

    /// Take external interrupt `irq`: mark it active, fetch its vector from
    /// the table at the vector-base register, call it, then return to the
    /// interrupted context. Enable bits and priorities are not consulted.
    ///
    /// # Safety
    ///
    /// The vector-base register must point at a table with a valid handler in
    /// the slot for `irq`.
    pub unsafe fn fire(&self, irq: usize) {
        let vector = CORE_EXCEPTION_COUNT + irq;
        let (base, interrupted) = {
            let mut regs = self.registers.lock();
            regs.pending.clear(irq);
            let interrupted = regs.active_vector;
            regs.active_vector = vector;
            (regs.vector_base as *const Vector, interrupted)
        };

        let entry = core::ptr::read_volatile(base.add(vector));
        if let Some(handler) = entry.as_handler() {
            handler();
        }

        self.registers.lock().active_vector = interrupted;
    }

    fn record_write(&self) {
        self.register_writes.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for SimulatedHardwareControl {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareControlInterface for SimulatedHardwareControl {
    fn vector_base(&self) -> usize {
        self.registers.lock().vector_base
    }

    fn set_vector_base(&self, base: usize) {
        self.registers.lock().vector_base = base;
        self.record_write();
    }

    fn barrier(&self) {
        self.barriers.fetch_add(1, Ordering::SeqCst);
    }

    fn interrupts_enabled(&self) -> bool {
        self.registers.lock().interrupts_enabled
    }

    fn disable_interrupts(&self) -> bool {
        let mut regs = self.registers.lock();
        let was_enabled = regs.interrupts_enabled;
        regs.interrupts_enabled = false;
        was_enabled
    }

    fn restore_interrupts(&self, was_enabled: bool) {
        if was_enabled {
            self.registers.lock().interrupts_enabled = true;
        }
    }

    fn enable_irq(&self, irq: usize) {
        self.registers.lock().enable.set(irq);
        self.record_write();
    }

    fn disable_irq(&self, irq: usize) {
        self.registers.lock().enable.clear(irq);
        self.record_write();
    }

    fn is_irq_enabled(&self, irq: usize) -> bool {
        self.registers.lock().enable.get(irq)
    }

    fn set_irq_pending(&self, irq: usize) {
        self.registers.lock().pending.set(irq);
        self.record_write();
    }

    fn clear_irq_pending(&self, irq: usize) {
        self.registers.lock().pending.clear(irq);
        self.record_write();
    }

    fn is_irq_pending(&self, irq: usize) -> bool {
        self.registers.lock().pending.get(irq)
    }

    fn is_irq_active(&self, irq: usize) -> bool {
        self.registers.lock().active_vector == CORE_EXCEPTION_COUNT + irq
    }

    fn set_irq_priority(&self, irq: usize, raw: u8) {
        self.registers.lock().priority[irq] = raw;
        self.record_write();
    }

    fn irq_priority(&self, irq: usize) -> u8 {
        self.registers.lock().priority[irq]
    }

    fn set_exception_priority(&self, vector: usize, raw: u8) {
        self.registers.lock().exception_priority[vector] = raw;
        self.record_write();
    }

    fn exception_priority(&self, vector: usize) -> u8 {
        self.registers.lock().exception_priority[vector]
    }

    fn priority_floor(&self) -> u8 {
        self.registers.lock().priority_floor
    }

    fn set_priority_floor(&self, raw: u8) {
        self.registers.lock().priority_floor = raw;
        self.record_write();
    }

    fn active_vector(&self) -> usize {
        self.registers.lock().active_vector
    }
}

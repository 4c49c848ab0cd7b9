//! Interrupt-masked critical sections
//!
//! On a single core with no OS beneath us, masking interrupts is the only lock.
//! `InterruptGuard` masks on construction and restores the previous mask when
//! dropped, so every exit path (including `?` and unwinding) releases it.

use core::cell::{RefCell, RefMut};
use super::di::traits::HardwareControlInterface;

/// RAII guard for an interrupt-masked critical section
pub struct InterruptGuard<'a, H: HardwareControlInterface + ?Sized> {
    hardware: &'a H,
    was_enabled: bool,
}

impl<'a, H: HardwareControlInterface + ?Sized> InterruptGuard<'a, H> {
    /// Mask interrupts until the guard is dropped
    pub fn new(hardware: &'a H) -> Self {
        let was_enabled = hardware.disable_interrupts();
        Self {
            hardware,
            was_enabled,
        }
    }

    /// Whether interrupts were unmasked when the guard was taken
    pub fn was_enabled(&self) -> bool {
        self.was_enabled
    }
}

impl<'a, H: HardwareControlInterface + ?Sized> Drop for InterruptGuard<'a, H> {
    fn drop(&mut self) {
        self.hardware.restore_interrupts(self.was_enabled);
    }
}

/// Shared state reachable only from inside a critical section
///
/// Borrowing requires a live `InterruptGuard`. A second borrow while the first
/// is still held panics instead of aliasing.
pub struct IrqCell<T> {
    value: RefCell<T>,
}

// Safety: access is serialised by masking interrupts on a single core.
unsafe impl<T: Send> Sync for IrqCell<T> {}

impl<T> IrqCell<T> {
    pub const fn new(value: T) -> Self {
        Self {
            value: RefCell::new(value),
        }
    }

    /// Run `f` with exclusive access to the protected value
    pub fn with<H, R, F>(&self, _guard: &InterruptGuard<'_, H>, f: F) -> R
    where
        H: HardwareControlInterface + ?Sized,
        F: FnOnce(&mut T) -> R,
    {
        let mut value: RefMut<'_, T> = self.value.borrow_mut();
        f(&mut value)
    }
}

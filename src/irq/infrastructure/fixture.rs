//! Test fixtures: leaked boot and RAM tables, and per-test system instances

use core::mem::size_of;
use std::sync::Mutex;
use crate::irq::ds::{InterruptConfig, RamRegion, Vector};
use super::di::container::InterruptSystem;
use super::di::simulated::SimulatedHardwareControl;
use super::di::traits::HardwareControlInterface;

pub(crate) const RAM_WORDS: usize = 128;

/// Initial stack pointer word of every boot table
pub(crate) const BOOT_STACK: usize = 0x2000_8000;

#[repr(C, align(1024))]
pub(crate) struct RamBuffer([Vector; RAM_WORDS]);

/// Leak a RAM buffer and return a region covering exactly that buffer
pub(crate) fn ram_region() -> RamRegion {
    let buffer: &'static mut RamBuffer = Box::leak(Box::new(RamBuffer([Vector::RESERVED; RAM_WORDS])));
    RamRegion::new(buffer.0.as_mut_ptr(), size_of::<RamBuffer>())
}

pub(crate) extern "C" fn boot_handler() {}

/// Leak a boot table of `len` entries whose handlers can all be called
pub(crate) fn boot_table(len: usize) -> &'static [Vector] {
    let mut table = vec![Vector::from_handler(boot_handler); len];
    table[0] = Vector::from_addr(BOOT_STACK);
    Box::leak(table.into_boxed_slice())
}

/// Leak a boot table with a distinct word in every slot. Not callable.
pub(crate) fn numbered_table(len: usize) -> &'static [Vector] {
    let table: Vec<Vector> = (0..len).map(|i| Vector::from_addr(0x0800_0000 + 4 * i)).collect();
    Box::leak(table.into_boxed_slice())
}

/// Copy of the `len` entries of the table at `base`
pub(crate) fn snapshot(base: *const Vector, len: usize) -> Vec<Vector> {
    unsafe { core::slice::from_raw_parts(base, len) }.to_vec()
}

/// Declare a `SystemInstance` backed by `SimulatedHardwareControl`, built on
/// first use so the configuration can reference leaked buffers
macro_rules! test_system {
    ($name:ident, $config:expr) => {
        struct $name;

        impl $crate::irq::SystemInstance for $name {
            type Hardware = $crate::irq::SimulatedHardwareControl;

            fn system() -> &'static $crate::irq::InterruptSystem<Self::Hardware> {
                static SYSTEM: std::sync::OnceLock<
                    $crate::irq::InterruptSystem<$crate::irq::SimulatedHardwareControl>,
                > = std::sync::OnceLock::new();
                SYSTEM.get_or_init(|| {
                    $crate::irq::InterruptSystem::new(
                        $crate::irq::SimulatedHardwareControl::new(),
                        $config,
                        $crate::irq::isr_trampoline::<$name>,
                    )
                })
            }
        }
    };
}

pub(crate) use test_system;

/// Callback run against the wrapped simulated controller
pub(crate) type HardwareHook = fn(&SimulatedHardwareControl);

/// Simulated controller that can run a callback right before the next
/// global mask is taken (an interrupt sneaking in ahead of the critical
/// section) and on every barrier
pub(crate) struct HookedHardware {
    pub(crate) inner: SimulatedHardwareControl,
    before_mask: Mutex<Option<HardwareHook>>,
    on_barrier: Mutex<Option<HardwareHook>>,
}

impl HookedHardware {
    pub(crate) fn new() -> Self {
        Self {
            inner: SimulatedHardwareControl::new(),
            before_mask: Mutex::new(None),
            on_barrier: Mutex::new(None),
        }
    }

    /// Run `hook` once, before the next `disable_interrupts`
    pub(crate) fn before_next_mask(&self, hook: HardwareHook) {
        *self.before_mask.lock().unwrap() = Some(hook);
    }

    /// Run `hook` on every barrier from now on
    pub(crate) fn on_barrier(&self, hook: HardwareHook) {
        *self.on_barrier.lock().unwrap() = Some(hook);
    }
}

/// Leak an `InterruptSystem` over a `HookedHardware`. The trampoline is a
/// no-op, so `config` must not be instrumented.
pub(crate) fn hooked_system(config: InterruptConfig) -> &'static InterruptSystem<HookedHardware> {
    Box::leak(Box::new(InterruptSystem::new(HookedHardware::new(), config, boot_handler)))
}

impl HardwareControlInterface for HookedHardware {
    fn vector_base(&self) -> usize {
        self.inner.vector_base()
    }

    fn set_vector_base(&self, base: usize) {
        self.inner.set_vector_base(base)
    }

    fn barrier(&self) {
        self.inner.barrier();
        let hook = *self.on_barrier.lock().unwrap();
        if let Some(hook) = hook {
            hook(&self.inner);
        }
    }

    fn interrupts_enabled(&self) -> bool {
        self.inner.interrupts_enabled()
    }

    fn disable_interrupts(&self) -> bool {
        let hook = self.before_mask.lock().unwrap().take();
        if let Some(hook) = hook {
            hook(&self.inner);
        }
        self.inner.disable_interrupts()
    }

    fn restore_interrupts(&self, was_enabled: bool) {
        self.inner.restore_interrupts(was_enabled)
    }

    fn enable_irq(&self, irq: usize) {
        self.inner.enable_irq(irq)
    }

    fn disable_irq(&self, irq: usize) {
        self.inner.disable_irq(irq)
    }

    fn is_irq_enabled(&self, irq: usize) -> bool {
        self.inner.is_irq_enabled(irq)
    }

    fn set_irq_pending(&self, irq: usize) {
        self.inner.set_irq_pending(irq)
    }

    fn clear_irq_pending(&self, irq: usize) {
        self.inner.clear_irq_pending(irq)
    }

    fn is_irq_pending(&self, irq: usize) -> bool {
        self.inner.is_irq_pending(irq)
    }

    fn is_irq_active(&self, irq: usize) -> bool {
        self.inner.is_irq_active(irq)
    }

    fn set_irq_priority(&self, irq: usize, raw: u8) {
        self.inner.set_irq_priority(irq, raw)
    }

    fn irq_priority(&self, irq: usize) -> u8 {
        self.inner.irq_priority(irq)
    }

    fn set_exception_priority(&self, vector: usize, raw: u8) {
        self.inner.set_exception_priority(vector, raw)
    }

    fn exception_priority(&self, vector: usize) -> u8 {
        self.inner.exception_priority(vector)
    }

    fn priority_floor(&self) -> u8 {
        self.inner.priority_floor()
    }

    fn set_priority_floor(&self, raw: u8) {
        self.inner.set_priority_floor(raw)
    }

    fn active_vector(&self) -> usize {
        self.inner.active_vector()
    }
}

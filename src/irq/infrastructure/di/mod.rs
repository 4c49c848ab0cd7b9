//! Interrupt System Dependency Injection Module
//!
//! The hardware backend is injected into an `InterruptSystem` container;
//! a `SystemInstance` binds one container to a `'static` location so the
//! dispatch trampoline, which receives no arguments, can find it.

pub mod traits;
pub mod container;
pub mod simulated;
#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
pub mod impls;

use self::container::InterruptSystem;
use self::traits::HardwareControlInterface;

/// A process-wide interrupt system
pub trait SystemInstance: 'static {
    type Hardware: HardwareControlInterface;

    fn system() -> &'static InterruptSystem<Self::Hardware>;
}

/// Declare a process-wide interrupt system
///
/// ```ignore
/// interrupt_system! {
///     pub Irqs: ClicHardwareControl = (
///         ClicHardwareControl::new(0x0280_0000),
///         InterruptConfig::new(74)
///             .with_relocation(RamRegion::new(0x2000_0000 as *mut Vector, 1024))
///             .with_instrumentation(IsrHooks::NONE)
///     );
/// }
///
/// Irqs::system().init()?;
/// ```
#[macro_export]
macro_rules! interrupt_system {
    ($(#[$meta:meta])* $vis:vis $name:ident: $hw:ty = ($hardware:expr, $config:expr $(,)?);) => {
        $(#[$meta])*
        $vis struct $name;

        impl $crate::irq::SystemInstance for $name {
            type Hardware = $hw;

            fn system() -> &'static $crate::irq::InterruptSystem<$hw> {
                static SYSTEM: $crate::irq::InterruptSystem<$hw> = $crate::irq::InterruptSystem::new(
                    $hardware,
                    $config,
                    $crate::irq::isr_trampoline::<$name>,
                );
                &SYSTEM
            }
        }
    };
}

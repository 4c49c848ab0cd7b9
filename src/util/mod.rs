//! Platform utilities
//!
//! Console backends. M-mode builds talk to a 16550 UART directly; S-mode
//! builds (`sbi-console`) go through the SBI firmware.

#[cfg(all(any(target_arch = "riscv32", target_arch = "riscv64"), feature = "sbi-console"))]
pub mod sbi;
#[cfg(any(test, all(any(target_arch = "riscv32", target_arch = "riscv64"), not(feature = "sbi-console"))))]
pub mod uart;

use core::fmt;

#[cfg(all(not(test), any(target_arch = "riscv32", target_arch = "riscv64"), not(feature = "sbi-console")))]
/// 初始化 M 模式控制台所用的 UART，之后的输出才会出现
pub use crate::util::uart::init as init_uart;

pub fn print(args: fmt::Arguments) {
    use core::fmt::Write;
    // Console output is best effort
    let _ = Stdout.write_fmt(args);
}

#[cfg(all(not(test), any(target_arch = "riscv32", target_arch = "riscv64"), feature = "sbi-console"))]
fn print_str(s: &str) {
    for c in s.chars() {
        crate::util::sbi::console_putchar(c);
    }
}

#[cfg(all(not(test), any(target_arch = "riscv32", target_arch = "riscv64"), not(feature = "sbi-console")))]
fn print_str(s: &str) {
    for c in s.chars() {
        crate::util::uart::console_putchar(c);
    }
}

#[cfg(test)]
fn print_str(s: &str) {
    std::print!("{}", s);
}

// No console on other targets
#[cfg(all(not(test), not(any(target_arch = "riscv32", target_arch = "riscv64"))))]
fn print_str(_s: &str) {}

struct Stdout;

impl core::fmt::Write for Stdout {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        print_str(s);
        Ok(())
    }
}

#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {
        $crate::console::print(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! println {
    () => {
        $crate::print!("\n")
    };
    ($($arg:tt)*) => {
        $crate::print!("{}\n", format_args!($($arg)*))
    };
}

//! M-mode console on a memory-mapped 16550 UART
//!
//! Machine-mode code has no firmware below it to call, so console output
//! goes straight to the UART. Nothing is written until `init` has run.

use spin::Mutex;
use uart_16550::MmioSerialPort;

/// The shared serial port, once configured
static SERIAL: Mutex<Option<MmioSerialPort>> = Mutex::new(None);

/// Bring up the 16550 at `base` and send console output to it
///
/// # Safety
///
/// `base` must be the MMIO base address of a 16550-compatible UART that
/// nothing else drives.
pub unsafe fn init(base: usize) {
    let mut port = MmioSerialPort::new(base);
    port.init();
    *SERIAL.lock() = Some(port);
}

/// 向串口写一个字符，未初始化时丢弃
pub fn console_putchar(c: char) {
    let mut buf = [0u8; 4];
    if let Some(port) = SERIAL.lock().as_mut() {
        for byte in c.encode_utf8(&mut buf).bytes() {
            port.send(byte);
        }
    }
}

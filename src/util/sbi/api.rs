//! SBI calls, built on `sbi-rt`

use sbi_rt::legacy;

/// Write one character to the firmware console
pub fn console_putchar(c: char) {
    let mut buf = [0u8; 4];
    for byte in c.encode_utf8(&mut buf).bytes() {
        legacy::console_putchar(byte as usize);
    }
}

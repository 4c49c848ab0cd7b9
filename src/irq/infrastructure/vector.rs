//! 向量表存储
//!
//! 管理内核实际分发中断所用的向量表：从启动表重定位到 RAM，
//! 以及查询某个中断当前绑定的处理函数。

use core::mem::size_of;
use crate::println;
use crate::irq::ds::{IrqError, IrqNumber, Vector, CORE_EXCEPTION_COUNT};
use super::di::container::{Dispatch, InterruptSystem, RamTable};
use super::di::traits::HardwareControlInterface;
use super::guard::InterruptGuard;
use super::fatal;

/// Base alignment the vector-base register demands for a table of `len`
/// words of `word_size` bytes: the table size rounded up to a power of two.
pub const fn required_alignment(len: usize, word_size: usize) -> usize {
    (len * word_size).next_power_of_two()
}

/// 读取 `base` 处向量表的第 `index` 项
///
/// # Safety
///
/// `base` must point at a readable table with more than `index` entries.
unsafe fn read_vector(base: *const Vector, index: usize) -> Vector {
    core::ptr::read_volatile(base.add(index))
}

impl<H: HardwareControlInterface> InterruptSystem<H> {
    /// 当前生效的向量表地址
    pub fn active_table(&self) -> *const Vector {
        self.hardware.vector_base() as *const Vector
    }

    /// Check if the active table is the one installed by `relocate`
    pub fn is_relocated(&self) -> bool {
        let guard = InterruptGuard::new(&self.hardware);
        self.state.with(&guard, |state| self.relocated_table(state.ram_table).is_some())
    }

    /// The RAM table, if it is the one the core is using
    pub(crate) fn relocated_table(&self, ram_table: Option<RamTable>) -> Option<RamTable> {
        ram_table.filter(|table| table.addr() == self.hardware.vector_base())
    }

    /// Halt unless `len` table words followed by `extra` shadow words at
    /// `base` sit inside the reserved region, with the table at the
    /// alignment the vector-base register needs
    pub(crate) fn check_placement(&self, base: usize, len: usize, extra: usize) {
        let Some(region) = self.config.relocation() else {
            fatal(format_args!("vector table relocation is not configured"));
        };
        let bytes = (len + extra) * size_of::<Vector>();
        if !region.contains(base, bytes) {
            fatal(format_args!(
                "vector table {:#x}..{:#x} outside reserved region {:#x}..{:#x}",
                base,
                base + bytes,
                region.base() as usize,
                region.base() as usize + region.size()
            ));
        }
        let alignment = required_alignment(len, size_of::<Vector>());
        if base % alignment != 0 {
            fatal(format_args!(
                "vector table at {:#x} not aligned to {:#x}",
                base, alignment
            ));
        }
    }

    /// 将 `table` 设为当前向量表
    ///
    /// 复制当前表的全部表项；若启用了插桩，外部中断槽位改写为跳板，
    /// 真实处理函数记入紧随其后的影子表；最后写向量基址寄存器。
    /// 整个过程在屏蔽中断下完成。返回之前的向量表，之后不再访问它。
    ///
    /// With instrumentation `table` must also hold `irq_count` shadow words
    /// after the `table_len` vector words. A table outside the reserved RAM
    /// region or misaligned for the vector-base register halts the system.
    ///
    /// # Safety
    ///
    /// The vector-base register must point at a valid table of at least
    /// `config().table_len()` entries.
    pub unsafe fn relocate(&self, table: &'static mut [Vector]) -> Result<*const Vector, IrqError> {
        self.config.validate()?;
        if self.config.relocation().is_none() {
            return Err(IrqError::InvalidConfiguration);
        }

        let len = self.config.table_len();
        let shadow_len = self.shadow_len();
        let base = table.as_ptr() as usize;
        if table.len() < len + shadow_len {
            fatal(format_args!(
                "vector table at {:#x} holds {} entries, {} needed",
                base,
                table.len(),
                len + shadow_len
            ));
        }
        self.check_placement(base, len, shadow_len);

        let (vectors, rest) = table.split_at_mut(len);
        let ram = RamTable::new(vectors);
        let shadow = match self.dispatch {
            Dispatch::Trampoline(_) => Some(RamTable::new(rest.split_at_mut(shadow_len).0)),
            Dispatch::Direct => None,
        };

        let guard = InterruptGuard::new(&self.hardware);

        let previous = self.active_table();
        if previous.is_null() {
            fatal(format_args!("no active vector table to relocate from"));
        }
        for index in 0..len {
            ram.write(index, read_vector(previous, index));
        }

        let trampoline = Vector::from_handler(self.trampoline);
        self.state.with(&guard, |state| {
            if let Some(shadow) = shadow {
                for irq in 0..self.config.irq_count() {
                    let slot = CORE_EXCEPTION_COUNT + irq;
                    let original = ram.read(slot);
                    // 已插桩的表再次搬移时沿用原影子表中的处理函数
                    let real = match state.shadow {
                        Some(old) if original == trampoline => old.read(irq),
                        _ => original,
                    };
                    shadow.write(irq, real);
                    ram.write(slot, trampoline);
                }
            }
            state.ram_table = Some(ram);
            state.shadow = shadow;
        });

        self.hardware.set_vector_base(ram.addr());
        self.hardware.barrier();
        drop(guard);

        println!(
            "向量表已重定位: {:#x} -> {:#x}, {} 项",
            previous as usize,
            ram.addr(),
            len
        );
        Ok(previous)
    }

    /// Handler currently bound to external interrupt `irqn`
    ///
    /// With instrumentation this is the real handler behind the trampoline.
    pub fn handler(&self, irqn: IrqNumber) -> Result<Vector, IrqError> {
        let irq = self.external(irqn)?;
        let guard = InterruptGuard::new(&self.hardware);
        self.state.with(&guard, |state| {
            let table = self.relocated_table(state.ram_table).ok_or(IrqError::NotInitialized)?;
            match self.dispatch {
                Dispatch::Trampoline(_) => state
                    .shadow
                    .map(|shadow| shadow.read(irq))
                    .ok_or(IrqError::NotInitialized),
                Dispatch::Direct => Ok(table.read(CORE_EXCEPTION_COUNT + irq)),
            }
        })
    }
}

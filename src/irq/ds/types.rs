//! Interrupt subsystem type definitions
//!
//! Vector table words, interrupt numbers and the fixed set of core exceptions.

use core::fmt;

/// Number of core exception vectors that precede the external interrupts
/// in every vector table.
pub const CORE_EXCEPTION_COUNT: usize = 16;

/// Upper bound on the number of external interrupt sources a table can carry.
pub const MAX_EXTERNAL_INTERRUPTS: usize = 240;

/// Interrupt and exception handlers are plain functions with the C ABI.
pub type Handler = unsafe extern "C" fn();

/// One word of a vector table: the address of a handler.
///
/// Slot 0 of a table holds the initial stack pointer instead of a handler,
/// so the zero word doubles as "no handler".
#[derive(Copy, Clone, PartialEq, Eq)]
#[repr(transparent)]
pub struct Vector(usize);

impl Vector {
    /// The zero word
    pub const RESERVED: Self = Self(0);

    /// Create a vector from a raw address
    pub const fn from_addr(addr: usize) -> Self {
        Self(addr)
    }

    /// Create a vector pointing at `handler`
    pub fn from_handler(handler: Handler) -> Self {
        Self(handler as usize)
    }

    /// Raw address held by this vector
    pub const fn addr(self) -> usize {
        self.0
    }

    /// Reinterpret the vector as a callable handler.
    ///
    /// # Safety
    ///
    /// A non-zero vector must hold the address of a function with the
    /// `Handler` signature.
    pub unsafe fn as_handler(self) -> Option<Handler> {
        if self.0 == 0 {
            None
        } else {
            Some(core::mem::transmute::<usize, Handler>(self.0))
        }
    }
}

impl fmt::Debug for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vector({:#x})", self.addr())
    }
}

/// Interrupt number
///
/// Non-negative values name external interrupt sources. Negative values name
/// core exceptions, counted back from the first external interrupt: `-1` is
/// SysTick, `-2` PendSV and so on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IrqNumber(i16);

impl IrqNumber {
    pub const fn new(number: i16) -> Self {
        Self(number)
    }

    pub const fn get(self) -> i16 {
        self.0
    }

    /// Check if this number names a core exception
    pub const fn is_core(self) -> bool {
        self.0 < 0
    }

    /// Index of an external interrupt, `None` for core exceptions
    pub const fn external_index(self) -> Option<usize> {
        if self.0 < 0 {
            None
        } else {
            Some(self.0 as usize)
        }
    }

    /// Slot of this interrupt in a vector table
    pub const fn vector_index(self) -> Option<usize> {
        let index = CORE_EXCEPTION_COUNT as i32 + self.0 as i32;
        if index < 0 {
            None
        } else {
            Some(index as usize)
        }
    }

    /// Interrupt number that owns vector table slot `index`
    pub const fn from_vector_index(index: usize) -> Self {
        Self(index as i16 - CORE_EXCEPTION_COUNT as i16)
    }
}

impl fmt::Display for IrqNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match CoreException::from_irqn(*self) {
            Some(exception) => write!(f, "{:?}", exception),
            None => write!(f, "IRQ{}", self.0),
        }
    }
}

/// Core exceptions, numbered by their vector table slot
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum CoreException {
    Reset = 1,
    Nmi = 2,
    HardFault = 3,
    MemManage = 4,
    BusFault = 5,
    UsageFault = 6,
    SvCall = 11,
    DebugMonitor = 12,
    PendSv = 14,
    SysTick = 15,
}

impl CoreException {
    /// Exceptions whose priority can be changed at run time
    pub const CONFIGURABLE: [CoreException; 7] = [
        CoreException::MemManage,
        CoreException::BusFault,
        CoreException::UsageFault,
        CoreException::SvCall,
        CoreException::DebugMonitor,
        CoreException::PendSv,
        CoreException::SysTick,
    ];

    pub const fn vector_index(self) -> usize {
        self as usize
    }

    pub const fn irqn(self) -> IrqNumber {
        IrqNumber::from_vector_index(self as usize)
    }

    /// Reset, NMI and HardFault run at fixed priorities above every
    /// configurable level.
    pub const fn has_configurable_priority(self) -> bool {
        !matches!(self, CoreException::Reset | CoreException::Nmi | CoreException::HardFault)
    }

    pub const fn from_vector_index(index: usize) -> Option<Self> {
        match index {
            1 => Some(CoreException::Reset),
            2 => Some(CoreException::Nmi),
            3 => Some(CoreException::HardFault),
            4 => Some(CoreException::MemManage),
            5 => Some(CoreException::BusFault),
            6 => Some(CoreException::UsageFault),
            11 => Some(CoreException::SvCall),
            12 => Some(CoreException::DebugMonitor),
            14 => Some(CoreException::PendSv),
            15 => Some(CoreException::SysTick),
            _ => None,
        }
    }

    pub const fn from_irqn(irqn: IrqNumber) -> Option<Self> {
        match irqn.vector_index() {
            Some(index) if index < CORE_EXCEPTION_COUNT => Self::from_vector_index(index),
            _ => None,
        }
    }
}

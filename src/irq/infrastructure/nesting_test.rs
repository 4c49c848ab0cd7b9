//! Dispatch trampoline and nesting counter tests

use core::mem::size_of;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use crate::println;
use crate::irq::ds::{
    InterruptConfig, IrqError, IrqNumber, IsrHooks, RamRegion, Vector, CORE_EXCEPTION_COUNT,
};
use super::di::SystemInstance;
use super::default_handler;
use super::fixture::{boot_handler, boot_table, ram_region, snapshot, test_system};

extern "C" fn patched_handler() {}

#[test]
fn test_nesting_counter() {
    println!("Testing nesting counter...");
    test_system!(
        Sys,
        InterruptConfig::new(8)
            .with_relocation(ram_region())
            .with_instrumentation(IsrHooks::NONE)
    );
    let sys = Sys::system();
    sys.hardware().boot_from(boot_table(sys.config().table_len()).as_ptr());

    // A stale count from before init is discarded
    assert_eq!(sys.enter_isr(), Ok(1));
    sys.init().unwrap();
    assert_eq!(sys.nesting_depth(), Ok(0));

    for depth in 1..=5 {
        assert_eq!(sys.enter_isr(), Ok(depth));
    }
    assert_eq!(sys.nesting_depth(), Ok(5));
    for depth in (0..5).rev() {
        assert_eq!(sys.exit_isr(), Ok(depth));
    }
    assert_eq!(sys.nesting_depth(), Ok(0));
    println!("Nesting counter test passed");
}

#[test]
#[should_panic(expected = "without matching entry")]
fn test_exit_without_entry() {
    test_system!(
        Sys,
        InterruptConfig::new(8)
            .with_relocation(ram_region())
            .with_instrumentation(IsrHooks::NONE)
    );
    let _ = Sys::system().exit_isr();
}

#[test]
fn test_nesting_not_configured() {
    test_system!(Sys, InterruptConfig::new(8).with_relocation(ram_region()));
    let sys = Sys::system();
    assert_eq!(sys.nesting_depth(), Err(IrqError::InvalidConfiguration));
    assert_eq!(sys.enter_isr(), Err(IrqError::InvalidConfiguration));
    assert_eq!(sys.exit_isr(), Err(IrqError::InvalidConfiguration));
}

#[test]
fn test_trampoline_installed() {
    println!("Testing trampoline installation...");
    test_system!(
        Sys,
        InterruptConfig::new(8)
            .with_relocation(ram_region())
            .with_instrumentation(IsrHooks::NONE)
    );
    let sys = Sys::system();
    let len = sys.config().table_len();
    let rom = boot_table(len);
    sys.hardware().boot_from(rom.as_ptr());
    sys.init().unwrap();

    let trampoline = Vector::from_handler(sys.trampoline);
    let table = snapshot(sys.active_table(), len);
    assert_eq!(table[..CORE_EXCEPTION_COUNT], rom[..CORE_EXCEPTION_COUNT]);
    for irq in 0..8 {
        assert_eq!(table[CORE_EXCEPTION_COUNT + irq], trampoline);
        assert_eq!(sys.handler(IrqNumber::new(irq as i16)), Ok(Vector::from_handler(boot_handler)));
    }

    // Patching goes to the shadow table, the slot keeps the trampoline
    sys.set_handler(IrqNumber::new(3), patched_handler).unwrap();
    assert_eq!(sys.handler(IrqNumber::new(3)), Ok(Vector::from_handler(patched_handler)));
    assert_eq!(snapshot(sys.active_table(), len)[CORE_EXCEPTION_COUNT + 3], trampoline);

    // Moving an instrumented table keeps the real handlers
    let region = sys.config().relocation().unwrap();
    let again = unsafe { core::slice::from_raw_parts_mut(region.base(), len + 8) };
    unsafe { sys.relocate(again) }.unwrap();
    assert_eq!(sys.handler(IrqNumber::new(3)), Ok(Vector::from_handler(patched_handler)));
    assert_eq!(sys.handler(IrqNumber::new(4)), Ok(Vector::from_handler(boot_handler)));
    println!("Trampoline installation test passed");
}

#[test]
fn test_dispatch_nested() {
    println!("Testing nested dispatch...");
    test_system!(
        Sys,
        InterruptConfig::new(8)
            .with_relocation(ram_region())
            .with_instrumentation(IsrHooks::new(on_enter, on_exit))
    );

    static EVENTS: Mutex<Vec<(&'static str, i16, usize)>> = Mutex::new(Vec::new());

    fn record(event: &'static str, irqn: IrqNumber) {
        let depth = Sys::system().nesting_depth().unwrap();
        EVENTS.lock().unwrap().push((event, irqn.get(), depth));
    }

    fn on_enter(irqn: IrqNumber) {
        record("enter", irqn);
    }

    fn on_exit(irqn: IrqNumber) {
        record("exit", irqn);
    }

    extern "C" fn outer() {
        record("outer", IrqNumber::new(5));
        unsafe { Sys::system().hardware().fire(6) };
    }

    extern "C" fn inner() {
        record("inner", IrqNumber::new(6));
    }

    let sys = Sys::system();
    sys.hardware().boot_from(boot_table(sys.config().table_len()).as_ptr());
    sys.init().unwrap();
    sys.set_handler(IrqNumber::new(5), outer).unwrap();
    sys.set_handler(IrqNumber::new(6), inner).unwrap();

    unsafe { sys.hardware().fire(5) };

    let events = EVENTS.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            ("enter", 5, 0),
            ("outer", 5, 1),
            ("enter", 6, 1),
            ("inner", 6, 2),
            ("exit", 6, 1),
            ("exit", 5, 0),
        ]
    );
    assert_eq!(sys.nesting_depth(), Ok(0));
    assert_eq!(sys.is_active(IrqNumber::new(5)), Ok(false));
    println!("Nested dispatch test passed");
}

#[test]
fn test_dispatch_depth() {
    test_system!(
        Sys,
        InterruptConfig::new(4)
            .with_relocation(ram_region())
            .with_instrumentation(IsrHooks::NONE)
    );

    static MAX_DEPTH: AtomicUsize = AtomicUsize::new(0);
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    extern "C" fn reentrant() {
        let sys = Sys::system();
        let depth = sys.nesting_depth().unwrap();
        CALLS.fetch_add(1, Ordering::SeqCst);
        MAX_DEPTH.fetch_max(depth, Ordering::SeqCst);
        if depth < 3 {
            unsafe { sys.hardware().fire(2) };
        }
    }

    let sys = Sys::system();
    sys.hardware().boot_from(boot_table(sys.config().table_len()).as_ptr());
    sys.init().unwrap();
    sys.set_handler(IrqNumber::new(2), reentrant).unwrap();

    unsafe { sys.hardware().fire(2) };
    assert_eq!(CALLS.load(Ordering::SeqCst), 3);
    assert_eq!(MAX_DEPTH.load(Ordering::SeqCst), 3);
    assert_eq!(sys.nesting_depth(), Ok(0));

    // Unpatched slots still reach the boot handler
    unsafe { sys.hardware().fire(1) };
    assert_eq!(sys.nesting_depth(), Ok(0));
}

#[test]
fn test_removed_handler_behind_trampoline() {
    test_system!(
        Sys,
        InterruptConfig::new(4)
            .with_relocation(ram_region())
            .with_instrumentation(IsrHooks::NONE)
    );
    let sys = Sys::system();
    let len = sys.config().table_len();
    sys.hardware().boot_from(boot_table(len).as_ptr());
    sys.init().unwrap();
    sys.remove_handler(IrqNumber::new(0)).unwrap();

    // Dispatch would reach the shared default handler, which halts
    assert_eq!(sys.handler(IrqNumber::new(0)), Ok(Vector::from_handler(default_handler)));
    assert_eq!(snapshot(sys.active_table(), len)[CORE_EXCEPTION_COUNT], Vector::from_handler(sys.trampoline));
    assert_eq!(sys.handler(IrqNumber::new(1)), Ok(Vector::from_handler(boot_handler)));
    assert_eq!(sys.nesting_depth(), Ok(0));
}

#[test]
fn test_shadow_follows_table() {
    test_system!(
        Sys,
        InterruptConfig::new(4)
            .with_relocation(ram_region())
            .with_instrumentation(IsrHooks::NONE)
    );
    let sys = Sys::system();
    let len = sys.config().table_len();
    sys.hardware().boot_from(boot_table(len).as_ptr());
    sys.init().unwrap();
    sys.set_handler(IrqNumber::new(2), patched_handler).unwrap();

    let region = sys.config().relocation().unwrap();
    let shadow = snapshot(unsafe { region.base().add(len) }, 4);
    assert_eq!(shadow[2], Vector::from_handler(patched_handler));
    assert_eq!(shadow[0], Vector::from_handler(boot_handler));
}

#[test]
fn test_plain_build_leaves_region_tail() {
    test_system!(Sys, InterruptConfig::new(4).with_relocation(ram_region()));
    let sys = Sys::system();
    let len = sys.config().table_len();
    sys.hardware().boot_from(boot_table(len).as_ptr());
    sys.init().unwrap();
    sys.set_handler(IrqNumber::new(2), patched_handler).unwrap();

    // Handlers live in the table itself, nothing is written past it
    let region = sys.config().relocation().unwrap();
    assert_eq!(snapshot(sys.active_table(), len)[CORE_EXCEPTION_COUNT + 2], Vector::from_handler(patched_handler));
    assert_eq!(snapshot(unsafe { region.base().add(len) }, 4), vec![Vector::RESERVED; 4]);
}

#[test]
#[should_panic(expected = "outside reserved region")]
fn test_region_without_room_for_shadow() {
    // Room for the 24 table words but not the 8 shadow words
    test_system!(
        Sys,
        InterruptConfig::new(8)
            .with_relocation(RamRegion::new(ram_region().base(), 24 * size_of::<Vector>()))
            .with_instrumentation(IsrHooks::NONE)
    );
    let sys = Sys::system();
    sys.hardware().boot_from(boot_table(sys.config().table_len()).as_ptr());
    let _ = sys.init();
}

//! # Linked Boundary Symbols
//!
//! Typed access to the boundary symbols the linker script defines, for code
//! running inside the kernel image. Only the symbols' addresses are
//! meaningful; their contents must never be read.

#![allow(unsafe_code, clippy::cast_possible_truncation)]

use crate::symbols::BoundarySymbols;
use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};

unsafe extern "C" {
    static __kernel_start: u8;
    static __kernel_end: u8;
    static __ro_physical_start: u8;
    static __ro_physical_end: u8;
    static __rw_physical_start: u8;
    static __rw_physical_end: u8;
    static __bss_start: u8;
    static __bss_end: u8;
    static __stack_start: u8;
    static __stack_end: u8;
}

macro_rules! symbol_address {
    ($sym:ident) => {
        // SAFETY: only the address of the linker symbol is taken.
        unsafe { core::ptr::addr_of!($sym) as usize as u32 }
    };
}

/// Boundary symbols as resolved by the linker for the running image.
#[must_use]
pub fn boundary_symbols() -> BoundarySymbols {
    BoundarySymbols {
        kernel_start: VirtualAddress::new(symbol_address!(__kernel_start)),
        kernel_end: VirtualAddress::new(symbol_address!(__kernel_end)),
        ro_physical_start: PhysicalAddress::new(symbol_address!(__ro_physical_start)),
        ro_physical_end: PhysicalAddress::new(symbol_address!(__ro_physical_end)),
        rw_physical_start: PhysicalAddress::new(symbol_address!(__rw_physical_start)),
        rw_physical_end: PhysicalAddress::new(symbol_address!(__rw_physical_end)),
        bss_start: VirtualAddress::new(symbol_address!(__bss_start)),
        bss_end: VirtualAddress::new(symbol_address!(__bss_end)),
        stack_start: VirtualAddress::new(symbol_address!(__stack_start)),
        stack_end: VirtualAddress::new(symbol_address!(__stack_end)),
    }
}

/// Clear the zero-init region.
///
/// # Safety
/// Must run exactly once, before anything reads a zero-initialized global,
/// with `[__bss_start, __bss_end)` mapped writable at the addresses the
/// kernel currently executes at.
pub unsafe fn zero_bss() {
    let symbols = boundary_symbols();
    let start = symbols.bss_start.as_u32() as usize as *mut u8;
    // SAFETY: the caller guarantees the region is mapped and unused.
    unsafe { core::ptr::write_bytes(start, 0, symbols.zero_init_len() as usize) };
}

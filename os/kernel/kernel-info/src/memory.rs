//! # Memory Layout
//!
//! The fixed constants of the kernel image layout. Both the linker script
//! generator and the kernel's own boot code read them from here.

use kernel_memory_addresses::{PageSize, Size4K, VirtualAddress, VirtualBaseOffset};

/// Distance between every kernel virtual address and its physical address.
///
/// The kernel occupies the top gigabyte of the 32-bit address space; the
/// physical frame at `pa` is visible at `VIRTUAL_BASE_OFFSET + pa`.
pub const VIRTUAL_BASE_OFFSET: u32 = 0xC000_0000;

/// Where the kernel image starts in *virtual* memory (VMA).
///
/// # Kernel Build
/// This information is passed to the linker via `--defsym`.
pub const KERNEL_LOAD_VIRT: u32 = 0xC010_0000;

/// [`VIRTUAL_BASE_OFFSET`] as a typed translation.
pub const KERNEL_VIRTUAL_BASE: VirtualBaseOffset = VirtualBaseOffset::new(VIRTUAL_BASE_OFFSET);

/// [`KERNEL_LOAD_VIRT`] as a typed address.
pub const KERNEL_LOAD_ADDRESS: VirtualAddress = VirtualAddress::new(KERNEL_LOAD_VIRT);

/// Where the bootloader places the first byte of the image (LMA).
pub const PHYS_LOAD: u32 = KERNEL_LOAD_VIRT - VIRTUAL_BASE_OFFSET; // 1 MiB

/// Base page granularity for segment boundaries.
pub const PAGE_SIZE: u32 = Size4K::SIZE;

/// Size of the boot stack carved out after the zero-initialized data.
pub const BOOT_STACK_SIZE: u32 = 4096;

/// Symbol the bootloader transfers control to.
pub const ENTRY_SYMBOL: &str = "_start";

/// Size of an ELF32 file header.
pub const ELF32_HEADER_SIZE: u32 = 52;

/// Size of a single ELF32 program header.
pub const ELF32_PROGRAM_HEADER_SIZE: u32 = 32;

/// Program headers assumed for the kernel image (text, rodata, data,
/// bss + stack).
///
/// `ld` picks the real count itself and may add more (`GNU_STACK`). The
/// linker script therefore advances by `SIZEOF_HEADERS` and only asserts
/// that `.text` still starts where this estimate puts it.
pub const PROGRAM_HEADER_COUNT: u32 = 4;

/// Bytes in front of `.text` the layout model sets aside for the image's own
/// headers.
pub const HEADER_RESERVATION: u32 =
    ELF32_HEADER_SIZE + ELF32_PROGRAM_HEADER_SIZE * PROGRAM_HEADER_COUNT;

const _: () = {
    assert!(VIRTUAL_BASE_OFFSET.is_multiple_of(PAGE_SIZE));
    assert!(KERNEL_LOAD_VIRT.is_multiple_of(PAGE_SIZE));
    assert!(KERNEL_LOAD_VIRT >= VIRTUAL_BASE_OFFSET);
    assert!(BOOT_STACK_SIZE == PAGE_SIZE);
    assert!(HEADER_RESERVATION < PAGE_SIZE);
};

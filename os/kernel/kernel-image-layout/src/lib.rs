//! # Kernel Image Layout
//!
//! Link-time memory layout of the 32-bit higher-half kernel.
//!
//! The kernel is linked to run at `KERNEL_LOAD_VIRT` (`0xC010_0000`) but is
//! loaded by the bootloader at `KERNEL_LOAD_VIRT - KERNEL_VIRTUAL_BASE`
//! (`0x0010_0000`). Every loadable segment therefore has two addresses, and
//! boot code relies on `physical = virtual - KERNEL_VIRTUAL_BASE` holding for
//! each of them.
//!
//! ## What you get
//! - A [`LayoutConfig`] carrying the two build-time constants.
//! - [`ImageLayout::compute`], which classifies [`InputSection`]s into the
//!   five [`SegmentKind`]s, places them on page boundaries, reserves the boot
//!   stack, derives the [`BoundarySymbols`] and resolves the entry point.
//! - [`ImageLayout::verify`], re-checking every placement invariant.
//! - [`ImageLayout::mappings`] and [`ImageLayout::reserved_frames`] for early
//!   paging and the physical frame allocator.
//! - A [`LinkerScript`] renderer expressing the same layout for GNU `ld`.
//!
//! ## Image Layout
//!
//! ```text
//!  virtual                     physical
//!  0xC010_0000 ┌───────────┐   0x0010_0000   __kernel_start
//!              │  headers  │
//!              ├───────────┤   page aligned  __ro_physical_start
//!              │  .text    │   R X
//!              ├───────────┤
//!              │  .rodata  │   R
//!              ├───────────┤                 __ro_physical_end, __rw_physical_start
//!              │  .data    │   R W
//!              ├───────────┤                 __bss_start
//!              │  .bss     │   R W (zeroed)  __bss_end (unaligned)
//!              ├───────────┤                 __stack_start
//!              │  .stack   │   R W, 4 KiB    __stack_end, __rw_physical_end
//!              └───────────┘                 __kernel_end
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

mod config;
mod error;
mod layout;
mod linker_script;
mod mapping;
mod section;
mod segment;
mod symbols;

#[cfg(all(target_arch = "x86", target_os = "none"))]
pub mod linked;

pub use config::LayoutConfig;
pub use error::LayoutError;
pub use layout::{ImageLayout, PlacedSection};
pub use linker_script::{
    LOAD_ADDRESS_SYMBOL, LinkerScript, ORPHAN_HANDLING_ARG, VIRTUAL_BASE_SYMBOL,
};
pub use mapping::{FrameReservation, KernelMapping};
pub use section::{
    InputSection, SECTION_RULES, SectionClass, SectionRule, SymbolDefinition, discard_statements,
    statements_for,
};
pub use segment::{Segment, SegmentFlags, SegmentKind};
pub use symbols::{BoundarySymbol, BoundarySymbols};

//! # Kernel Configuration and Boot Interface
//!
//! This crate is the single source of truth for the constants that tie the
//! kernel image, its linker script, and early boot code together.
//!
//! ## Architecture
//!
//! ### Boot Information ([`boot`])
//! The bootloader-to-kernel hand-off:
//! * **Kernel Entry Point**: function signature and calling convention
//! * **Boot Data Structure**: location of the init filesystem image
//!
//! ### Memory Layout ([`memory`])
//! The higher-half design of the 32-bit kernel:
//!
//! ```text
//! Virtual Address Space (32-bit):
//!
//! 0x0000_0000 ┌─────────────────────────────────┐
//!             │           User Space            │
//! VIRTUAL_    ├─────────────────────────────────┤ 0xC000_0000
//! BASE_OFFSET │   Low Memory (< 1 MiB) mirror   │
//! KERNEL_     ├─────────────────────────────────┤ 0xC010_0000
//! LOAD_VIRT   │  Headers │ Text │ RO │ RW │ BSS │
//!             │          Boot Stack (4 KiB)     │
//!             ├─────────────────────────────────┤ __kernel_end
//!             │        Kernel heap, ...         │
//! 0xFFFF_FFFF └─────────────────────────────────┘
//! ```
//!
//! Physically, the bootloader places the image at [`memory::PHYS_LOAD`]
//! (1 MiB), so every kernel address satisfies
//! `physical = virtual - VIRTUAL_BASE_OFFSET`.
//!
//! ## Usage Patterns
//!
//! ### Linker Integration
//! ```rust
//! use kernel_info::memory::{KERNEL_LOAD_VIRT, VIRTUAL_BASE_OFFSET};
//!
//! println!("cargo:rustc-link-arg=--defsym=KERNEL_VIRTUAL_BASE={VIRTUAL_BASE_OFFSET:#x}");
//! println!("cargo:rustc-link-arg=--defsym=KERNEL_LOAD_VIRT={KERNEL_LOAD_VIRT:#x}");
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod boot;
pub mod memory;

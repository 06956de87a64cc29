//! # Virtual and Physical Memory Address Types (32-bit)
//!
//! Strongly typed wrappers for raw addresses of a 32-bit higher-half kernel.
//!
//! ## Overview
//!
//! The types keep virtual and physical addresses apart at compile time while
//! remaining zero-cost wrappers around `u32` values:
//!
//! | Type | Meaning |
//! |------|---------|
//! | [`MemoryAddress`] | A raw 32-bit address, either physical or virtual. |
//! | [`VirtualAddress`] | An address as seen after paging is enabled. |
//! | [`PhysicalAddress`] | An address as seen by the bootloader and the MMU. |
//! | [`VirtualBaseOffset`] | The constant distance between the two for the kernel image. |
//!
//! ## Page Sizes
//!
//! The two non-PAE x86 page sizes are available as marker types implementing
//! [`PageSize`]:
//!
//! - [`Size4K`]: 4 KiB pages (base granularity)
//! - [`Size4M`]: 4 MiB large pages
//!
//! ## Typical Usage
//!
//! ```rust
//! # use kernel_memory_addresses::*;
//! let offset = VirtualBaseOffset::new(0xC000_0000);
//! let va = VirtualAddress::new(0xC010_0034);
//!
//! // Round up to the next page boundary, then translate.
//! let text = va.align_up::<Size4K>().unwrap();
//! assert_eq!(text.as_u32(), 0xC010_1000);
//! assert_eq!(offset.to_physical(text).unwrap().as_u32(), 0x0010_1000);
//! ```
//!
//! ## Design Notes
//!
//! - All types are `#[repr(transparent)]` and `Copy`.
//! - Arithmetic that can leave the 32-bit space is `checked_*` and returns
//!   `Option`; nothing wraps silently.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

mod memory_address;
mod page_size;
mod physical_address;
mod virtual_address;
mod virtual_base_offset;

pub use memory_address::MemoryAddress;
pub use page_size::{PageSize, Size4K, Size4M};
pub use physical_address::PhysicalAddress;
pub use virtual_address::VirtualAddress;
pub use virtual_base_offset::VirtualBaseOffset;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_and_down_4k() {
        let a = MemoryAddress::new(0x0012_3456);
        assert_eq!(a.align_down::<Size4K>().as_u32(), 0x0012_3000);
        assert_eq!(a.align_up::<Size4K>().unwrap().as_u32(), 0x0012_4000);
        assert_eq!(a.offset::<Size4K>(), 0x456);
    }

    #[test]
    fn aligned_address_stays_put() {
        let a = MemoryAddress::new(0xC010_0000);
        assert!(a.is_aligned::<Size4K>());
        assert_eq!(a.align_up::<Size4K>(), Some(a));
        assert!(!a.is_aligned::<Size4M>());
        assert_eq!(a.align_up::<Size4M>().unwrap().as_u32(), 0xC040_0000);
    }

    #[test]
    fn align_up_at_top_of_address_space_overflows() {
        let a = MemoryAddress::new(0xFFFF_F001);
        assert_eq!(a.align_up::<Size4K>(), None);
        assert_eq!(MemoryAddress::new(0xFFFF_F000).align_up::<Size4K>().unwrap().as_u32(), 0xFFFF_F000);
    }

    #[test]
    fn virtual_and_physical_translate_through_offset() {
        let offset = VirtualBaseOffset::new(0xC000_0000);
        let va = VirtualAddress::new(0xC010_1000);
        let pa = offset.to_physical(va).unwrap();
        assert_eq!(pa, PhysicalAddress::new(0x0010_1000));
        assert_eq!(offset.to_virtual(pa), Some(va));
    }

    #[test]
    fn translation_below_the_base_fails() {
        let offset = VirtualBaseOffset::new(0xC000_0000);
        assert_eq!(offset.to_physical(VirtualAddress::new(0x0010_0000)), None);
        assert_eq!(offset.to_virtual(PhysicalAddress::new(0x4000_0000)), None);
    }

    #[test]
    fn distance_between_addresses() {
        let a = VirtualAddress::new(0xC010_1000);
        let b = VirtualAddress::new(0xC010_100A);
        assert_eq!(b.checked_distance_from(a), Some(10));
        assert_eq!(a.checked_distance_from(b), None);
    }
}

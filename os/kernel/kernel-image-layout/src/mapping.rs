//! # Boot-Time Consumers of the Layout
//!
//! What early paging setup and the physical frame allocator derive from the
//! boundary symbols.

use crate::segment::SegmentFlags;
use kernel_memory_addresses::{PageSize, PhysicalAddress, Size4K, VirtualAddress};

/// A page-granular range the initial page directory maps for the kernel.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct KernelMapping {
    pub physical_start: PhysicalAddress,
    pub virtual_start: VirtualAddress,
    pub pages: u32,
    pub flags: SegmentFlags,
}

impl KernelMapping {
    pub(crate) const fn new(
        physical_start: PhysicalAddress,
        physical_end: PhysicalAddress,
        virtual_start: VirtualAddress,
        flags: SegmentFlags,
    ) -> Self {
        Self {
            physical_start,
            virtual_start,
            pages: (physical_end.as_u32() - physical_start.as_u32()) >> Size4K::SHIFT,
            flags,
        }
    }

    #[must_use]
    pub const fn size(&self) -> u32 {
        self.pages << Size4K::SHIFT
    }

    #[must_use]
    pub const fn physical_end(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.physical_start.as_u32() + self.size())
    }

    /// Iterate `(virtual, physical)` page pairs.
    pub fn page_pairs(&self) -> impl Iterator<Item = (VirtualAddress, PhysicalAddress)> {
        let (va, pa) = (self.virtual_start.as_u32(), self.physical_start.as_u32());
        (0..self.pages).map(move |i| {
            let off = i << Size4K::SHIFT;
            (VirtualAddress::new(va + off), PhysicalAddress::new(pa + off))
        })
    }
}

/// Physical frames occupied by the kernel image.
///
/// The frame allocator marks `start..end` as used; its own bookkeeping is
/// placed at [`first_free_frame`](Self::first_free_frame).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FrameReservation {
    pub start: PhysicalAddress,
    pub end: PhysicalAddress,
}

impl FrameReservation {
    pub(crate) const fn new(start: PhysicalAddress, end: PhysicalAddress) -> Self {
        Self {
            start: start.align_down::<Size4K>(),
            end,
        }
    }

    #[must_use]
    pub const fn first_frame(&self) -> u32 {
        self.start.frame_number::<Size4K>()
    }

    #[must_use]
    pub const fn frame_count(&self) -> u32 {
        (self.end.as_u32() - self.start.as_u32()) >> Size4K::SHIFT
    }

    /// First frame after the image.
    #[must_use]
    pub const fn first_free_frame(&self) -> PhysicalAddress {
        self.end
    }

    #[must_use]
    pub const fn contains(&self, pa: PhysicalAddress) -> bool {
        pa.as_u32() >= self.start.as_u32() && pa.as_u32() < self.end.as_u32()
    }
}

//! # Image Segments

use bitfield_struct::bitfield;
use core::fmt;
use kernel_memory_addresses::{PageSize, PhysicalAddress, Size4K, VirtualAddress};

/// The five regions of the kernel image, in placement order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum SegmentKind {
    /// Executable code.
    Text,
    /// Constants and string literals.
    ReadOnlyData,
    /// Initialized mutable globals.
    WritableData,
    /// Globals cleared to zero by boot code.
    ZeroInitData,
    /// The initial execution stack.
    BootStack,
}

impl SegmentKind {
    /// All segments in the order they are emitted.
    pub const ALL: [Self; 5] = [
        Self::Text,
        Self::ReadOnlyData,
        Self::WritableData,
        Self::ZeroInitData,
        Self::BootStack,
    ];

    /// Name of the output section holding this segment.
    #[must_use]
    pub const fn output_section(self) -> &'static str {
        match self {
            Self::Text => ".text",
            Self::ReadOnlyData => ".rodata",
            Self::WritableData => ".data",
            Self::ZeroInitData => ".bss",
            Self::BootStack => ".stack",
        }
    }

    /// Position in [`SegmentKind::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether the segment belongs to the read-write group.
    #[must_use]
    pub const fn is_mutable(self) -> bool {
        matches!(
            self,
            Self::WritableData | Self::ZeroInitData | Self::BootStack
        )
    }

    /// Intended access permissions once paging is on.
    #[must_use]
    pub const fn flags(self) -> SegmentFlags {
        let flags = SegmentFlags::new().with_read(true);
        match self {
            Self::Text => flags.with_execute(true).with_load(true),
            Self::ReadOnlyData => flags.with_load(true),
            Self::WritableData => flags.with_write(true).with_load(true),
            Self::ZeroInitData | Self::BootStack => flags.with_write(true),
        }
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.output_section())
    }
}

/// Permission and load flags of a segment.
///
/// Layout (LSB→MSB) follows ELF `p_flags`:
/// - bit 0: execute
/// - bit 1: write
/// - bit 2: read
/// - bit 3: load (segment occupies bytes in the image file)
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct SegmentFlags {
    pub execute: bool,
    pub write: bool,
    pub read: bool,
    pub load: bool,
    #[bits(28)]
    __: u32,
}

impl SegmentFlags {
    /// Page-table entry bits for a 32-bit non-PAE mapping: present (bit 0)
    /// and writable (bit 1). There is no execute-disable bit without PAE.
    #[must_use]
    pub const fn page_table_bits(self) -> u32 {
        let mut bits = 0;
        if self.read() {
            bits |= 1 << 0;
        }
        if self.write() {
            bits |= 1 << 1;
        }
        bits
    }
}

/// A placed region of the image.
///
/// `size` is the page-rounded span the segment occupies; `content_size` is the
/// exact number of bytes its input sections (or the stack) declare.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Segment {
    kind: SegmentKind,
    virtual_start: VirtualAddress,
    physical_start: PhysicalAddress,
    content_size: u32,
    size: u32,
}

impl Segment {
    pub(crate) const fn new(
        kind: SegmentKind,
        virtual_start: VirtualAddress,
        physical_start: PhysicalAddress,
        content_size: u32,
        size: u32,
    ) -> Self {
        Self {
            kind,
            virtual_start,
            physical_start,
            content_size,
            size,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> SegmentKind {
        self.kind
    }

    #[must_use]
    pub const fn virtual_start(&self) -> VirtualAddress {
        self.virtual_start
    }

    /// Where the bootloader places the first byte of this segment.
    #[must_use]
    pub const fn physical_start(&self) -> PhysicalAddress {
        self.physical_start
    }

    #[must_use]
    pub const fn content_size(&self) -> u32 {
        self.content_size
    }

    /// Page-rounded size of the segment.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// First address after the declared content.
    #[must_use]
    pub const fn content_end(&self) -> VirtualAddress {
        VirtualAddress::new(self.virtual_start.as_u32() + self.content_size)
    }

    /// First address after the page-rounded span; the next segment starts here.
    #[must_use]
    pub const fn virtual_end(&self) -> VirtualAddress {
        VirtualAddress::new(self.virtual_start.as_u32() + self.size)
    }

    #[must_use]
    pub const fn physical_end(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.physical_start.as_u32() + self.size)
    }

    #[must_use]
    pub const fn pages(&self) -> u32 {
        self.size >> Size4K::SHIFT
    }

    /// Whether `va` lies within the declared content.
    #[must_use]
    pub const fn contains(&self, va: VirtualAddress) -> bool {
        va.as_u32() >= self.virtual_start.as_u32() && va.as_u32() < self.content_end().as_u32()
    }

    #[must_use]
    pub const fn flags(&self) -> SegmentFlags {
        self.kind.flags()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immutable_segments_precede_mutable_ones() {
        let split = SegmentKind::ALL
            .iter()
            .position(|k| k.is_mutable())
            .unwrap();
        assert_eq!(split, 2);
        assert!(SegmentKind::ALL[split..].iter().all(|k| k.is_mutable()));
    }

    #[test]
    fn index_matches_placement_order() {
        for (i, kind) in SegmentKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn flags_per_segment() {
        let text = SegmentKind::Text.flags();
        assert!(text.read() && text.execute() && !text.write() && text.load());

        let rodata = SegmentKind::ReadOnlyData.flags();
        assert!(rodata.read() && !rodata.execute() && !rodata.write());

        let bss = SegmentKind::ZeroInitData.flags();
        assert!(bss.write() && !bss.load());

        assert_eq!(SegmentKind::BootStack.flags(), bss);
    }

    #[test]
    fn page_table_bits() {
        assert_eq!(SegmentKind::Text.flags().page_table_bits(), 0b01);
        assert_eq!(SegmentKind::WritableData.flags().page_table_bits(), 0b11);
    }

    #[test]
    fn segment_bounds() {
        let seg = Segment::new(
            SegmentKind::ZeroInitData,
            VirtualAddress::new(0xC010_3000),
            PhysicalAddress::new(0x0010_3000),
            1,
            0x1000,
        );
        assert_eq!(seg.content_end().as_u32(), 0xC010_3001);
        assert_eq!(seg.virtual_end().as_u32(), 0xC010_4000);
        assert_eq!(seg.physical_end().as_u32(), 0x0010_4000);
        assert_eq!(seg.pages(), 1);
        assert!(seg.contains(VirtualAddress::new(0xC010_3000)));
        assert!(!seg.contains(VirtualAddress::new(0xC010_3001)));
    }
}

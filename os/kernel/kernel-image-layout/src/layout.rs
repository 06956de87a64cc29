//! # Image Layout Computation

extern crate alloc;

use crate::config::LayoutConfig;
use crate::error::LayoutError;
use crate::mapping::{FrameReservation, KernelMapping};
use crate::section::{InputSection, SectionClass, SymbolDefinition, statements_for};
use crate::segment::{Segment, SegmentKind};
use crate::symbols::BoundarySymbols;
use alloc::string::ToString;
use alloc::vec::Vec;
use kernel_info::memory::BOOT_STACK_SIZE;
use kernel_memory_addresses::{PageSize, PhysicalAddress, Size4K, VirtualAddress};
use log::{debug, info, trace};

/// An input section after placement.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PlacedSection {
    /// Index into the input section list.
    pub index: usize,
    pub segment: SegmentKind,
    pub address: VirtualAddress,
    pub size: u32,
}

/// The frozen layout of one kernel image.
///
/// Produced once by [`ImageLayout::compute`] and read-only afterwards.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ImageLayout {
    config: LayoutConfig,
    segments: [Segment; 5],
    sections: Vec<PlacedSection>,
    discarded: Vec<usize>,
    symbols: BoundarySymbols,
    entry: VirtualAddress,
}

impl ImageLayout {
    /// Place `sections` according to `config` and resolve the entry point
    /// from `definitions`.
    ///
    /// Segments are laid out as Text, Read-Only Data, Writable Data,
    /// Zero-Initialized Data and Boot Stack. Each starts on a page boundary
    /// and spans its content rounded up to a page; discarded sections take no
    /// space at all.
    ///
    /// # Errors
    /// Returns a [`LayoutError`] if the configuration is invalid, a section is
    /// an orphan or badly aligned, an address leaves the 32-bit space, the
    /// entry symbol is missing or not in `.text`, or the finished layout fails
    /// [`verify`](Self::verify).
    pub fn compute(
        config: &LayoutConfig,
        sections: &[InputSection],
        definitions: &[SymbolDefinition],
    ) -> Result<Self, LayoutError> {
        config.validate()?;
        let offset = config.virtual_base();

        let classes = classify_all(sections)?;

        let mut placed = Vec::new();
        let mut discarded = Vec::new();
        for (index, class) in classes.iter().enumerate() {
            if *class == SectionClass::Discard {
                trace!(
                    "discarding {} ({} bytes)",
                    sections[index].name, sections[index].size
                );
                discarded.push(index);
            }
        }

        let mut cursor = config
            .load_address()
            .checked_add(config.header_reservation())
            .ok_or(LayoutError::AddressOverflow(SegmentKind::Text))?;

        let mut place_next = |kind: SegmentKind| -> Result<Segment, LayoutError> {
            let overflow = LayoutError::AddressOverflow(kind);
            let start = cursor.align_up::<Size4K>().ok_or(overflow.clone())?;

            let content_end = if kind == SegmentKind::BootStack {
                start.checked_add(BOOT_STACK_SIZE)
            } else {
                place_sections(kind, start, sections, &classes, &mut placed)
            }
            .ok_or(overflow.clone())?;

            let end = content_end.align_up::<Size4K>().ok_or(overflow.clone())?;
            let physical_start = offset.to_physical(start).ok_or(overflow)?;

            let segment = Segment::new(
                kind,
                start,
                physical_start,
                content_end.as_u32() - start.as_u32(),
                end.as_u32() - start.as_u32(),
            );
            debug!(
                "{kind:<8} {start}..{end} at {physical_start} ({} bytes, {} pages)",
                segment.content_size(),
                segment.pages()
            );
            cursor = end;
            Ok(segment)
        };

        let segments = [
            place_next(SegmentKind::Text)?,
            place_next(SegmentKind::ReadOnlyData)?,
            place_next(SegmentKind::WritableData)?,
            place_next(SegmentKind::ZeroInitData)?,
            place_next(SegmentKind::BootStack)?,
        ];

        let symbols = boundary_symbols(config, &segments)?;
        let entry = resolve_entry(config, sections, definitions, &placed, &segments)?;

        let layout = Self {
            config: *config,
            segments,
            sections: placed,
            discarded,
            symbols,
            entry,
        };
        layout.verify()?;

        info!(
            "kernel image {}..{} ({} bytes), entry {} at {entry}",
            symbols.kernel_start,
            symbols.kernel_end,
            layout.image_size(),
            config.entry_symbol()
        );
        Ok(layout)
    }

    /// Re-check every layout invariant.
    ///
    /// # Errors
    /// Returns the first violated invariant: segment order, page alignment,
    /// contiguity, virtual/physical translation, boundary symbol values,
    /// boot stack size, or entry placement.
    pub fn verify(&self) -> Result<(), LayoutError> {
        let offset = self.config.virtual_base();

        for (position, (segment, expected)) in
            self.segments.iter().zip(SegmentKind::ALL).enumerate()
        {
            if segment.kind() != expected {
                return Err(LayoutError::SegmentOrder {
                    position,
                    expected,
                    found: segment.kind(),
                });
            }

            let rounded = segment
                .content_end()
                .align_up::<Size4K>()
                .ok_or(LayoutError::AddressOverflow(segment.kind()))?;
            if !segment.virtual_start().is_aligned::<Size4K>()
                || segment.virtual_end() != rounded
            {
                return Err(LayoutError::MisalignedSegment(segment.kind()));
            }

            if offset.to_physical(segment.virtual_start()) != Some(segment.physical_start()) {
                return Err(LayoutError::SegmentTranslation(segment.kind()));
            }
        }

        for pair in self.segments.windows(2) {
            let (previous, next) = (&pair[0], &pair[1]);
            if next.virtual_start() != previous.virtual_end() {
                return Err(LayoutError::SegmentDiscontinuity {
                    previous: previous.kind(),
                    next: next.kind(),
                    end: previous.virtual_end(),
                    start: next.virtual_start(),
                });
            }
        }

        let text_start = self
            .config
            .load_address()
            .checked_add(self.config.header_reservation())
            .and_then(VirtualAddress::align_up::<Size4K>)
            .ok_or(LayoutError::AddressOverflow(SegmentKind::Text))?;
        if self.text().virtual_start() != text_start {
            return Err(LayoutError::MisalignedSegment(SegmentKind::Text));
        }

        let stack = self.segment(SegmentKind::BootStack);
        if stack.content_size() != BOOT_STACK_SIZE || stack.size() != BOOT_STACK_SIZE {
            return Err(LayoutError::BootStackSize(stack.size()));
        }

        let expected = boundary_symbols(&self.config, &self.segments)?;
        for ((symbol, actual), (_, wanted)) in self.symbols.iter().zip(expected.iter()) {
            if actual != wanted {
                return Err(LayoutError::BoundaryMismatch {
                    symbol,
                    expected: wanted,
                    actual,
                });
            }
            if symbol.is_page_aligned() && actual % Size4K::SIZE != 0 {
                return Err(LayoutError::MisalignedBoundary {
                    symbol,
                    address: actual,
                });
            }
        }

        if !self.text().contains(self.entry) {
            return Err(LayoutError::EntryOutsideText {
                symbol: self.config.entry_symbol().to_string(),
                segment: self.segment_containing(self.entry),
            });
        }

        Ok(())
    }

    #[must_use]
    pub const fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// All segments in placement order.
    #[must_use]
    pub const fn segments(&self) -> &[Segment; 5] {
        &self.segments
    }

    #[must_use]
    pub const fn segment(&self, kind: SegmentKind) -> &Segment {
        &self.segments[kind.index()]
    }

    #[must_use]
    pub const fn text(&self) -> &Segment {
        self.segment(SegmentKind::Text)
    }

    /// Segment whose content contains `va`, if any.
    #[must_use]
    pub fn segment_containing(&self, va: VirtualAddress) -> Option<SegmentKind> {
        self.segments
            .iter()
            .find(|s| s.contains(va))
            .map(Segment::kind)
    }

    /// Placed input sections in address order.
    #[must_use]
    pub fn sections(&self) -> &[PlacedSection] {
        &self.sections
    }

    /// Indices of input sections dropped from the image.
    #[must_use]
    pub fn discarded(&self) -> &[usize] {
        &self.discarded
    }

    #[must_use]
    pub const fn symbols(&self) -> &BoundarySymbols {
        &self.symbols
    }

    /// Virtual address of the entry symbol.
    #[must_use]
    pub const fn entry(&self) -> VirtualAddress {
        self.entry
    }

    /// Bytes from `__kernel_start` to `__kernel_end`.
    #[must_use]
    pub const fn image_size(&self) -> u32 {
        self.symbols.kernel_end.as_u32() - self.symbols.kernel_start.as_u32()
    }

    /// Initial page mappings: Text and Read-Only Data as read+execute,
    /// the mutable segments (boot stack included) as read+write.
    #[must_use]
    pub fn mappings(&self) -> [KernelMapping; 2] {
        let text = self.segment(SegmentKind::Text);
        let data = self.segment(SegmentKind::WritableData);
        [
            KernelMapping::new(
                self.symbols.ro_physical_start,
                self.symbols.ro_physical_end,
                text.virtual_start(),
                text.flags().with_load(false),
            ),
            KernelMapping::new(
                self.symbols.rw_physical_start,
                self.symbols.rw_physical_end,
                data.virtual_start(),
                data.flags().with_load(false),
            ),
        ]
    }

    /// Physical frames the frame allocator must treat as used: the whole
    /// image from its load address through the end of the boot stack.
    #[must_use]
    pub fn reserved_frames(&self) -> FrameReservation {
        let start = self
            .config
            .virtual_base()
            .to_physical(self.symbols.kernel_start)
            .unwrap_or(self.symbols.ro_physical_start);
        FrameReservation::new(start, self.symbols.rw_physical_end)
    }
}

fn classify_all(sections: &[InputSection]) -> Result<Vec<SectionClass>, LayoutError> {
    sections
        .iter()
        .map(|section| {
            let class = SectionClass::classify(&section.name)
                .ok_or_else(|| LayoutError::OrphanSection(section.name.clone()))?;
            if class != SectionClass::Discard && section.effective_align().is_none() {
                return Err(LayoutError::InvalidSectionAlignment {
                    name: section.name.clone(),
                    align: section.align,
                });
            }
            Ok(class)
        })
        .collect()
}

/// Place every section of `kind` starting at `start`; returns the end of the
/// content or `None` on overflow.
fn place_sections(
    kind: SegmentKind,
    start: VirtualAddress,
    sections: &[InputSection],
    classes: &[SectionClass],
    placed: &mut Vec<PlacedSection>,
) -> Option<VirtualAddress> {
    let mut cursor = start;
    for statement in 0..statements_for(kind).len() {
        let wanted = SectionClass::Keep {
            segment: kind,
            statement,
        };
        for (index, section) in sections.iter().enumerate() {
            if classes[index] != wanted {
                continue;
            }
            let address = align_to(cursor, section.effective_align()?)?;
            trace!("{} at {address} ({} bytes)", section.name, section.size);
            placed.push(PlacedSection {
                index,
                segment: kind,
                address,
                size: section.size,
            });
            cursor = address.checked_add(section.size)?;
        }
    }
    Some(cursor)
}

fn align_to(va: VirtualAddress, align: u32) -> Option<VirtualAddress> {
    let raw = va.as_u32().checked_add(align - 1)? & !(align - 1);
    Some(VirtualAddress::new(raw))
}

fn boundary_symbols(
    config: &LayoutConfig,
    segments: &[Segment; 5],
) -> Result<BoundarySymbols, LayoutError> {
    let offset = config.virtual_base();
    let physical = |va: VirtualAddress, kind: SegmentKind| -> Result<PhysicalAddress, LayoutError> {
        offset
            .to_physical(va)
            .ok_or(LayoutError::SegmentTranslation(kind))
    };

    let text = &segments[SegmentKind::Text.index()];
    let rodata = &segments[SegmentKind::ReadOnlyData.index()];
    let data = &segments[SegmentKind::WritableData.index()];
    let bss = &segments[SegmentKind::ZeroInitData.index()];
    let stack = &segments[SegmentKind::BootStack.index()];

    Ok(BoundarySymbols {
        kernel_start: config.load_address(),
        kernel_end: stack.virtual_end(),
        ro_physical_start: physical(text.virtual_start(), SegmentKind::Text)?,
        ro_physical_end: physical(rodata.virtual_end(), SegmentKind::ReadOnlyData)?,
        rw_physical_start: physical(data.virtual_start(), SegmentKind::WritableData)?,
        rw_physical_end: physical(stack.virtual_end(), SegmentKind::BootStack)?,
        bss_start: bss.virtual_start(),
        bss_end: bss.content_end(),
        stack_start: stack.virtual_start(),
        stack_end: stack.virtual_end(),
    })
}

fn resolve_entry(
    config: &LayoutConfig,
    sections: &[InputSection],
    definitions: &[SymbolDefinition],
    placed: &[PlacedSection],
    segments: &[Segment; 5],
) -> Result<VirtualAddress, LayoutError> {
    let name = config.entry_symbol();
    let definition = definitions
        .iter()
        .find(|d| d.name == name)
        .ok_or_else(|| LayoutError::MissingEntrySymbol(name.to_string()))?;

    let section = sections
        .get(definition.section)
        .ok_or_else(|| LayoutError::UnknownSection {
            symbol: name.to_string(),
            section: definition.section,
        })?;
    if definition.offset >= section.size {
        return Err(LayoutError::SymbolOutOfBounds {
            symbol: name.to_string(),
            offset: definition.offset,
        });
    }

    let Some(placement) = placed.iter().find(|p| p.index == definition.section) else {
        return Err(LayoutError::EntryOutsideText {
            symbol: name.to_string(),
            segment: None,
        });
    };
    if placement.segment != SegmentKind::Text {
        return Err(LayoutError::EntryOutsideText {
            symbol: name.to_string(),
            segment: Some(placement.segment),
        });
    }

    let entry = placement
        .address
        .checked_add(definition.offset)
        .ok_or(LayoutError::AddressOverflow(SegmentKind::Text))?;
    debug_assert!(segments[SegmentKind::Text.index()].contains(entry));
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::BoundarySymbol;

    fn config() -> LayoutConfig {
        LayoutConfig::kernel_default().with_header_reservation(0)
    }

    fn entry() -> [SymbolDefinition; 1] {
        [SymbolDefinition::new("_start", 0, 0)]
    }

    #[test]
    fn sections_keep_their_alignment() {
        let sections = [
            InputSection::new(".text", 3, 1),
            InputSection::new(".text.boot", 8, 16),
        ];
        let layout = ImageLayout::compute(&config(), &sections, &entry()).unwrap();
        let placed = layout.sections();
        assert_eq!(placed[0].address.as_u32(), 0xC010_0000);
        assert_eq!(placed[1].address.as_u32(), 0xC010_0010);
        assert_eq!(layout.text().content_size(), 0x18);
    }

    #[test]
    fn common_is_placed_before_bss_regardless_of_input_order() {
        let sections = [
            InputSection::new(".text", 4, 4),
            InputSection::new(".bss", 4, 4),
            InputSection::new("COMMON", 8, 4),
        ];
        let layout = ImageLayout::compute(&config(), &sections, &entry()).unwrap();
        let bss: Vec<_> = layout
            .sections()
            .iter()
            .filter(|p| p.segment == SegmentKind::ZeroInitData)
            .map(|p| p.index)
            .collect();
        assert_eq!(bss, [2, 1]);
        assert_eq!(layout.symbols().zero_init_len(), 12);
    }

    #[test]
    fn orphan_section_aborts() {
        let sections = [
            InputSection::new(".text", 4, 4),
            InputSection::new(".eh_frame", 4, 4),
        ];
        assert_eq!(
            ImageLayout::compute(&config(), &sections, &entry()),
            Err(LayoutError::OrphanSection(".eh_frame".into()))
        );
    }

    #[test]
    fn bad_alignment_aborts() {
        let sections = [InputSection::new(".text", 4, 3)];
        assert!(matches!(
            ImageLayout::compute(&config(), &sections, &entry()),
            Err(LayoutError::InvalidSectionAlignment { align: 3, .. })
        ));
    }

    #[test]
    fn missing_entry_aborts() {
        let sections = [InputSection::new(".text", 4, 4)];
        assert_eq!(
            ImageLayout::compute(&config(), &sections, &[]),
            Err(LayoutError::MissingEntrySymbol("_start".into()))
        );
    }

    #[test]
    fn entry_in_data_aborts() {
        let sections = [
            InputSection::new(".text", 4, 4),
            InputSection::new(".data", 4, 4),
        ];
        let defs = [SymbolDefinition::new("_start", 1, 0)];
        assert!(matches!(
            ImageLayout::compute(&config(), &sections, &defs),
            Err(LayoutError::EntryOutsideText {
                segment: Some(SegmentKind::WritableData),
                ..
            })
        ));
    }

    #[test]
    fn entry_in_discarded_section_aborts() {
        let sections = [
            InputSection::new(".text", 4, 4),
            InputSection::new(".comment", 4, 1),
        ];
        let defs = [SymbolDefinition::new("_start", 1, 0)];
        assert!(matches!(
            ImageLayout::compute(&config(), &sections, &defs),
            Err(LayoutError::EntryOutsideText { segment: None, .. })
        ));
    }

    #[test]
    fn entry_offset_past_section_aborts() {
        let sections = [InputSection::new(".text", 4, 4)];
        let defs = [SymbolDefinition::new("_start", 0, 4)];
        assert!(matches!(
            ImageLayout::compute(&config(), &sections, &defs),
            Err(LayoutError::SymbolOutOfBounds { offset: 4, .. })
        ));
    }

    #[test]
    fn layout_past_the_address_space_overflows() {
        let config = LayoutConfig::new(
            kernel_memory_addresses::VirtualBaseOffset::new(0xC000_0000),
            VirtualAddress::new(0xFFFF_E000),
        )
        .with_header_reservation(0);
        let sections = [InputSection::new(".text", 0x1000, 4)];
        assert!(matches!(
            ImageLayout::compute(&config, &sections, &entry()),
            Err(LayoutError::AddressOverflow(_))
        ));
    }

    #[test]
    fn verify_catches_a_tampered_symbol() {
        let sections = [InputSection::new(".text", 4, 4)];
        let mut layout = ImageLayout::compute(&config(), &sections, &entry()).unwrap();
        layout.symbols.bss_end = VirtualAddress::new(layout.symbols.bss_end.as_u32() + 1);
        assert!(matches!(
            layout.verify(),
            Err(LayoutError::BoundaryMismatch {
                symbol: BoundarySymbol::BssEnd,
                ..
            })
        ));
    }

    #[test]
    fn verify_catches_a_gap() {
        let sections = [InputSection::new(".text", 4, 4)];
        let mut layout = ImageLayout::compute(&config(), &sections, &entry()).unwrap();
        let data = layout.segments[SegmentKind::WritableData.index()];
        layout.segments[SegmentKind::WritableData.index()] = Segment::new(
            SegmentKind::WritableData,
            VirtualAddress::new(data.virtual_start().as_u32() + 0x1000),
            PhysicalAddress::new(data.physical_start().as_u32() + 0x1000),
            0,
            0,
        );
        assert!(matches!(
            layout.verify(),
            Err(LayoutError::SegmentDiscontinuity {
                previous: SegmentKind::ReadOnlyData,
                next: SegmentKind::WritableData,
                ..
            })
        ));
    }

    fn small_layout() -> ImageLayout {
        let sections = [
            InputSection::new(".text", 4, 4),
            InputSection::new(".data", 0x10, 4),
        ];
        ImageLayout::compute(&config(), &sections, &entry()).unwrap()
    }

    #[test]
    fn verify_catches_swapped_segments() {
        let mut layout = small_layout();
        layout.segments.swap(0, 1);
        assert!(matches!(
            layout.verify(),
            Err(LayoutError::SegmentOrder {
                position: 0,
                expected: SegmentKind::Text,
                found: SegmentKind::ReadOnlyData,
            })
        ));
    }

    #[test]
    fn verify_catches_an_unrounded_span() {
        let mut layout = small_layout();
        let data = layout.segments[SegmentKind::WritableData.index()];
        layout.segments[SegmentKind::WritableData.index()] = Segment::new(
            SegmentKind::WritableData,
            data.virtual_start(),
            data.physical_start(),
            data.content_size(),
            0x800,
        );
        assert_eq!(
            layout.verify(),
            Err(LayoutError::MisalignedSegment(SegmentKind::WritableData))
        );
    }

    #[test]
    fn verify_catches_text_not_following_the_headers() {
        let mut layout = small_layout();
        layout.config = layout.config.with_header_reservation(1);
        assert_eq!(
            layout.verify(),
            Err(LayoutError::MisalignedSegment(SegmentKind::Text))
        );
    }

    #[test]
    fn verify_catches_a_wrong_load_address() {
        let mut layout = small_layout();
        let data = layout.segments[SegmentKind::WritableData.index()];
        layout.segments[SegmentKind::WritableData.index()] = Segment::new(
            SegmentKind::WritableData,
            data.virtual_start(),
            PhysicalAddress::new(data.physical_start().as_u32() + 0x1000),
            data.content_size(),
            data.size(),
        );
        assert_eq!(
            layout.verify(),
            Err(LayoutError::SegmentTranslation(SegmentKind::WritableData))
        );
    }

    #[test]
    fn verify_catches_a_resized_stack() {
        let mut layout = small_layout();
        let stack = layout.segments[SegmentKind::BootStack.index()];
        layout.segments[SegmentKind::BootStack.index()] = Segment::new(
            SegmentKind::BootStack,
            stack.virtual_start(),
            stack.physical_start(),
            0x2000,
            0x2000,
        );
        assert_eq!(layout.verify(), Err(LayoutError::BootStackSize(0x2000)));
    }

    #[test]
    fn verify_catches_an_unaligned_kernel_start() {
        let mut layout = small_layout();
        let load = VirtualAddress::new(0xC00F_F800);
        layout.config = layout.config.with_load_address(load);
        layout.symbols.kernel_start = load;
        assert_eq!(
            layout.verify(),
            Err(LayoutError::MisalignedBoundary {
                symbol: BoundarySymbol::KernelStart,
                address: 0xC00F_F800,
            })
        );
    }

    #[test]
    fn verify_catches_an_entry_outside_text() {
        let mut layout = small_layout();
        layout.entry = layout.segment(SegmentKind::WritableData).virtual_start();
        assert!(matches!(
            layout.verify(),
            Err(LayoutError::EntryOutsideText {
                segment: Some(SegmentKind::WritableData),
                ..
            })
        ));
    }
}

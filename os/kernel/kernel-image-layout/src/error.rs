extern crate alloc;

use crate::segment::SegmentKind;
use crate::symbols::BoundarySymbol;
use alloc::string::String;
use kernel_memory_addresses::{VirtualAddress, VirtualBaseOffset};

/// Reasons a kernel image layout is rejected.
///
/// Every variant is fatal: the build must not produce an image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("virtual base offset {0} is not page aligned")]
    MisalignedVirtualBase(VirtualBaseOffset),
    #[error("kernel load address {0} is not page aligned")]
    MisalignedLoadAddress(VirtualAddress),
    #[error("kernel load address {load} lies below the virtual base {base}")]
    LoadBelowVirtualBase {
        load: VirtualAddress,
        base: VirtualBaseOffset,
    },
    #[error("section `{0}` does not match any output section")]
    OrphanSection(String),
    #[error("section `{name}` requests alignment {align}, expected a power of two up to one page")]
    InvalidSectionAlignment { name: String, align: u32 },
    #[error("address arithmetic overflowed while placing {0}")]
    AddressOverflow(SegmentKind),
    #[error("entry symbol `{0}` is not defined")]
    MissingEntrySymbol(String),
    #[error("entry symbol `{symbol}` does not point into .text (placed in {segment:?})")]
    EntryOutsideText {
        symbol: String,
        segment: Option<SegmentKind>,
    },
    #[error("symbol `{symbol}` refers to unknown input section #{section}")]
    UnknownSection { symbol: String, section: usize },
    #[error("symbol `{symbol}` at offset {offset:#x} lies outside its section")]
    SymbolOutOfBounds { symbol: String, offset: u32 },
    #[error("expected segment {expected} at position {position}, found {found}")]
    SegmentOrder {
        position: usize,
        expected: SegmentKind,
        found: SegmentKind,
    },
    #[error("segment {0} is not page aligned or not rounded to a page")]
    MisalignedSegment(SegmentKind),
    #[error("segment {next} starts at {start} but {previous} ends at {end}")]
    SegmentDiscontinuity {
        previous: SegmentKind,
        next: SegmentKind,
        end: VirtualAddress,
        start: VirtualAddress,
    },
    #[error("physical start of segment {0} is not its virtual start minus the virtual base")]
    SegmentTranslation(SegmentKind),
    #[error("boundary symbol {symbol} is {actual:#010x}, expected {expected:#010x}")]
    BoundaryMismatch {
        symbol: BoundarySymbol,
        expected: u32,
        actual: u32,
    },
    #[error("boundary symbol {symbol} at {address:#010x} is not page aligned")]
    MisalignedBoundary {
        symbol: BoundarySymbol,
        address: u32,
    },
    #[error("boot stack spans {0} bytes")]
    BootStackSize(u32),
}

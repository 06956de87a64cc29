//! # Boundary Symbols
//!
//! The named addresses exported to boot code and the frame allocator.

use core::fmt;
use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};

/// One exported boundary symbol.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum BoundarySymbol {
    KernelStart,
    KernelEnd,
    RoPhysicalStart,
    RoPhysicalEnd,
    RwPhysicalStart,
    RwPhysicalEnd,
    BssStart,
    BssEnd,
    StackStart,
    StackEnd,
}

impl BoundarySymbol {
    pub const ALL: [Self; 10] = [
        Self::KernelStart,
        Self::KernelEnd,
        Self::RoPhysicalStart,
        Self::RoPhysicalEnd,
        Self::RwPhysicalStart,
        Self::RwPhysicalEnd,
        Self::BssStart,
        Self::BssEnd,
        Self::StackStart,
        Self::StackEnd,
    ];

    /// Linker symbol name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::KernelStart => "__kernel_start",
            Self::KernelEnd => "__kernel_end",
            Self::RoPhysicalStart => "__ro_physical_start",
            Self::RoPhysicalEnd => "__ro_physical_end",
            Self::RwPhysicalStart => "__rw_physical_start",
            Self::RwPhysicalEnd => "__rw_physical_end",
            Self::BssStart => "__bss_start",
            Self::BssEnd => "__bss_end",
            Self::StackStart => "__stack_start",
            Self::StackEnd => "__stack_end",
        }
    }

    /// Whether the symbol's value is a physical rather than a virtual address.
    #[must_use]
    pub const fn is_physical(self) -> bool {
        matches!(
            self,
            Self::RoPhysicalStart | Self::RoPhysicalEnd | Self::RwPhysicalStart | Self::RwPhysicalEnd
        )
    }

    /// `__bss_end` marks the exact end of zero-init content; every other
    /// symbol sits on a page boundary.
    #[must_use]
    pub const fn is_page_aligned(self) -> bool {
        !matches!(self, Self::BssEnd)
    }
}

impl fmt::Display for BoundarySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Values of all boundary symbols of one image.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BoundarySymbols {
    /// First byte of the image, including its headers.
    pub kernel_start: VirtualAddress,
    /// End of the boot stack.
    pub kernel_end: VirtualAddress,
    pub ro_physical_start: PhysicalAddress,
    pub ro_physical_end: PhysicalAddress,
    pub rw_physical_start: PhysicalAddress,
    /// End of the mutable region, boot stack included.
    pub rw_physical_end: PhysicalAddress,
    pub bss_start: VirtualAddress,
    /// Exact end of zero-init content; not page aligned.
    pub bss_end: VirtualAddress,
    pub stack_start: VirtualAddress,
    pub stack_end: VirtualAddress,
}

impl BoundarySymbols {
    /// Raw value of `symbol`.
    #[must_use]
    pub const fn value(&self, symbol: BoundarySymbol) -> u32 {
        match symbol {
            BoundarySymbol::KernelStart => self.kernel_start.as_u32(),
            BoundarySymbol::KernelEnd => self.kernel_end.as_u32(),
            BoundarySymbol::RoPhysicalStart => self.ro_physical_start.as_u32(),
            BoundarySymbol::RoPhysicalEnd => self.ro_physical_end.as_u32(),
            BoundarySymbol::RwPhysicalStart => self.rw_physical_start.as_u32(),
            BoundarySymbol::RwPhysicalEnd => self.rw_physical_end.as_u32(),
            BoundarySymbol::BssStart => self.bss_start.as_u32(),
            BoundarySymbol::BssEnd => self.bss_end.as_u32(),
            BoundarySymbol::StackStart => self.stack_start.as_u32(),
            BoundarySymbol::StackEnd => self.stack_end.as_u32(),
        }
    }

    /// All symbols with their values, in [`BoundarySymbol::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (BoundarySymbol, u32)> + '_ {
        BoundarySymbol::ALL.into_iter().map(|s| (s, self.value(s)))
    }

    /// Number of bytes boot code clears to zero.
    #[must_use]
    pub const fn zero_init_len(&self) -> u32 {
        self.bss_end.as_u32() - self.bss_start.as_u32()
    }

    #[must_use]
    pub const fn stack_len(&self) -> u32 {
        self.stack_end.as_u32() - self.stack_start.as_u32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = BoundarySymbol::ALL.iter().map(|s| s.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), BoundarySymbol::ALL.len());
    }

    #[test]
    fn only_bss_end_is_unaligned() {
        let unaligned: Vec<_> = BoundarySymbol::ALL
            .into_iter()
            .filter(|s| !s.is_page_aligned())
            .collect();
        assert_eq!(unaligned, [BoundarySymbol::BssEnd]);
    }

    #[test]
    fn physical_symbols() {
        assert_eq!(
            BoundarySymbol::ALL.iter().filter(|s| s.is_physical()).count(),
            4
        );
        assert_eq!(BoundarySymbol::RwPhysicalEnd.to_string(), "__rw_physical_end");
    }
}

use crate::{PhysicalAddress, VirtualAddress};
use core::fmt;

/// Constant distance between the kernel's virtual addresses and the physical
/// addresses backing them.
///
/// For every byte of the kernel image, `physical = virtual - offset`.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VirtualBaseOffset(u32);

impl VirtualBaseOffset {
    #[inline]
    #[must_use]
    pub const fn new(offset: u32) -> Self {
        Self(offset)
    }

    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// The first virtual address covered by the offset.
    #[inline]
    #[must_use]
    pub const fn base(self) -> VirtualAddress {
        VirtualAddress::new(self.0)
    }

    /// `va - offset`, or `None` if `va` lies below the virtual base.
    #[inline]
    #[must_use]
    pub const fn to_physical(self, va: VirtualAddress) -> Option<PhysicalAddress> {
        match va.as_u32().checked_sub(self.0) {
            Some(pa) => Some(PhysicalAddress::new(pa)),
            None => None,
        }
    }

    /// `pa + offset`, or `None` if the result leaves the 32-bit space.
    #[inline]
    #[must_use]
    pub const fn to_virtual(self, pa: PhysicalAddress) -> Option<VirtualAddress> {
        match pa.as_u32().checked_add(self.0) {
            Some(va) => Some(VirtualAddress::new(va)),
            None => None,
        }
    }
}

impl fmt::Debug for VirtualBaseOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VirtualBaseOffset(0x{:08X})", self.0)
    }
}

impl fmt::Display for VirtualBaseOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

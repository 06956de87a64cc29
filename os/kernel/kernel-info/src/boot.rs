//! # Kernel Boot Information

use crate::memory::KERNEL_VIRTUAL_BASE;
use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};

/// Kernel entry function.
///
/// # ABI
/// The bootloader calls the [`ENTRY_SYMBOL`](crate::memory::ENTRY_SYMBOL) with
/// the C calling convention, passing a pointer to the [`BootStruct`] it filled.
/// Paging is still disabled at this point.
pub type KernelEntryFn = extern "C" fn(*const BootStruct) -> !;

/// Data handed from the bootloader to the kernel.
///
/// Keep this `#[repr(C, packed)]`; the bootloader writes it byte for byte.
#[repr(C, packed)]
#[derive(Clone, Copy, Default)]
pub struct BootStruct {
    /// Physical address of the init filesystem image.
    pub initfs_start: u32,

    /// Size of the init filesystem image in bytes.
    pub initfs_size: u32,
}

impl BootStruct {
    #[must_use]
    pub const fn initfs_physical_start(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.initfs_start)
    }

    /// The init filesystem as seen through the higher-half mapping, or `None`
    /// if it lies beyond the memory the higher half can address.
    #[must_use]
    pub const fn initfs_virtual_start(&self) -> Option<VirtualAddress> {
        KERNEL_VIRTUAL_BASE.to_virtual(self.initfs_physical_start())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_struct_is_two_packed_words() {
        assert_eq!(size_of::<BootStruct>(), 8);
        assert_eq!(align_of::<BootStruct>(), 1);
    }

    #[test]
    fn initfs_is_moved_into_the_higher_half() {
        let boot = BootStruct {
            initfs_start: 0x0020_0000,
            initfs_size: 0x1000,
        };
        assert_eq!(
            boot.initfs_virtual_start(),
            Some(VirtualAddress::new(0xC020_0000))
        );
    }

    #[test]
    fn initfs_above_the_higher_half_window_has_no_virtual_address() {
        let boot = BootStruct {
            initfs_start: 0x4000_0000,
            initfs_size: 0x1000,
        };
        assert_eq!(boot.initfs_virtual_start(), None);
    }
}

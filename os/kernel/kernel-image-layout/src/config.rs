//! # Layout Configuration

use crate::error::LayoutError;
use kernel_info::memory::{ENTRY_SYMBOL, HEADER_RESERVATION, KERNEL_LOAD_ADDRESS, KERNEL_VIRTUAL_BASE};
use kernel_memory_addresses::{PhysicalAddress, Size4K, VirtualAddress, VirtualBaseOffset};
use utils_accessors_derive::Accessors;

/// The inputs that fix the image's position in memory.
///
/// ```rust
/// # use kernel_image_layout::LayoutConfig;
/// # use kernel_memory_addresses::VirtualAddress;
/// let config = LayoutConfig::kernel_default().with_header_reservation(0);
/// assert_eq!(config.load_address(), VirtualAddress::new(0xC010_0000));
/// assert_eq!(config.physical_load_address().unwrap().as_u32(), 0x0010_0000);
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Accessors)]
pub struct LayoutConfig {
    /// Distance between virtual and physical addresses.
    virtual_base: VirtualBaseOffset,
    /// Virtual address of the first byte of the image.
    load_address: VirtualAddress,
    /// Bytes in front of `.text` reserved for the image's own headers.
    header_reservation: u32,
    /// Symbol the bootloader jumps to.
    entry_symbol: &'static str,
}

impl LayoutConfig {
    /// The configuration the kernel is built with.
    #[must_use]
    pub const fn kernel_default() -> Self {
        Self {
            virtual_base: KERNEL_VIRTUAL_BASE,
            load_address: KERNEL_LOAD_ADDRESS,
            header_reservation: HEADER_RESERVATION,
            entry_symbol: ENTRY_SYMBOL,
        }
    }

    /// The default configuration with a different base and load address.
    #[must_use]
    pub const fn new(virtual_base: VirtualBaseOffset, load_address: VirtualAddress) -> Self {
        Self::kernel_default()
            .with_virtual_base(virtual_base)
            .with_load_address(load_address)
    }

    /// Check the configuration constants on their own.
    ///
    /// # Errors
    /// Returns an error if the virtual base or the load address is not page
    /// aligned, or if the load address lies below the virtual base.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if !self.virtual_base.base().is_aligned::<Size4K>() {
            return Err(LayoutError::MisalignedVirtualBase(self.virtual_base));
        }
        if !self.load_address.is_aligned::<Size4K>() {
            return Err(LayoutError::MisalignedLoadAddress(self.load_address));
        }
        self.physical_load_address().map(|_| ())
    }

    /// Where the bootloader places the first byte of the image.
    ///
    /// # Errors
    /// Returns [`LayoutError::LoadBelowVirtualBase`] if the load address
    /// cannot be translated.
    pub fn physical_load_address(&self) -> Result<PhysicalAddress, LayoutError> {
        self.virtual_base
            .to_physical(self.load_address)
            .ok_or(LayoutError::LoadBelowVirtualBase {
                load: self.load_address,
                base: self.virtual_base,
            })
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::kernel_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_kernel_constants() {
        let config = LayoutConfig::default();
        assert_eq!(config.virtual_base().as_u32(), 0xC000_0000);
        assert_eq!(config.load_address().as_u32(), 0xC010_0000);
        assert_eq!(config.entry_symbol(), "_start");
        assert_eq!(config.header_reservation(), 52 + 4 * 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn misaligned_load_address_is_rejected() {
        let config = LayoutConfig::new(
            VirtualBaseOffset::new(0xC000_0000),
            VirtualAddress::new(0xC010_0800),
        );
        assert_eq!(
            config.validate(),
            Err(LayoutError::MisalignedLoadAddress(VirtualAddress::new(
                0xC010_0800
            )))
        );
    }

    #[test]
    fn misaligned_virtual_base_is_rejected() {
        let config = LayoutConfig::new(
            VirtualBaseOffset::new(0xC000_0010),
            VirtualAddress::new(0xC010_0000),
        );
        assert!(matches!(
            config.validate(),
            Err(LayoutError::MisalignedVirtualBase(_))
        ));
    }

    #[test]
    fn load_below_virtual_base_is_rejected() {
        let config = LayoutConfig::new(
            VirtualBaseOffset::new(0xC000_0000),
            VirtualAddress::new(0x0010_0000),
        );
        assert!(matches!(
            config.validate(),
            Err(LayoutError::LoadBelowVirtualBase { .. })
        ));
    }
}

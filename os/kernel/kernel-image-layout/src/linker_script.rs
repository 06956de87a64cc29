//! # Linker Script Rendering
//!
//! Produces the GNU `ld` script that realizes the layout. The script places
//! the output sections in [`SegmentKind::ALL`] order, links them at their
//! virtual addresses, loads them at `ADDR - KERNEL_VIRTUAL_BASE` via `AT()`,
//! and defines every [`BoundarySymbol`].
//!
//! The two configuration constants are referenced by name and supplied on the
//! linker command line, see [`LinkerScript::linker_args`]. Every condition
//! [`ImageLayout::compute`](crate::ImageLayout::compute) rejects is also an
//! `ASSERT` in the script, so a bad link fails instead of producing an image.

extern crate alloc;

use crate::config::LayoutConfig;
use crate::section::{discard_statements, statements_for};
use crate::segment::SegmentKind;
use crate::symbols::BoundarySymbol;
use alloc::format;
use alloc::string::{String, ToString};
use core::fmt;
use kernel_info::memory::{BOOT_STACK_SIZE, PAGE_SIZE};

/// Symbol holding the virtual base offset inside the script.
pub const VIRTUAL_BASE_SYMBOL: &str = "KERNEL_VIRTUAL_BASE";

/// Symbol holding the kernel load virtual address inside the script.
pub const LOAD_ADDRESS_SYMBOL: &str = "KERNEL_LOAD_VIRT";

/// Makes `ld` fail on input sections no rule in the script claims.
pub const ORPHAN_HANDLING_ARG: &str = "--orphan-handling=error";

const INDENT: &str = "    ";

/// Renderer for the kernel linker script.
///
/// ```rust
/// # use kernel_image_layout::{LayoutConfig, LinkerScript};
/// let config = LayoutConfig::kernel_default();
/// let script = LinkerScript::new(&config).render();
/// assert!(script.starts_with("/*"));
/// assert!(script.contains("ENTRY(_start)"));
/// assert!(script.contains(".text ALIGN(0x1000) : AT(ADDR(.text) - KERNEL_VIRTUAL_BASE)"));
/// ```
#[derive(Debug, Copy, Clone)]
pub struct LinkerScript<'a> {
    config: &'a LayoutConfig,
}

impl<'a> LinkerScript<'a> {
    #[must_use]
    pub const fn new(config: &'a LayoutConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Everything the link needs besides `-T <script>`.
    #[must_use]
    pub fn linker_args(&self) -> [String; 3] {
        let [base, load] = self.defsym_args();
        [base, load, ORPHAN_HANDLING_ARG.to_string()]
    }

    /// Linker arguments defining the constants the script refers to.
    #[must_use]
    pub fn defsym_args(&self) -> [String; 2] {
        [
            format!(
                "--defsym={VIRTUAL_BASE_SYMBOL}={:#x}",
                self.config.virtual_base().as_u32()
            ),
            format!(
                "--defsym={LOAD_ADDRESS_SYMBOL}={:#x}",
                self.config.load_address().as_u32()
            ),
        ]
    }

    fn write_segment(f: &mut fmt::Formatter<'_>, kind: SegmentKind) -> fmt::Result {
        let name = kind.output_section();
        let noload = if kind == SegmentKind::BootStack {
            " (NOLOAD)"
        } else {
            ""
        };
        writeln!(
            f,
            "{INDENT}{name} ALIGN({PAGE_SIZE:#x}){noload} : AT(ADDR({name}) - {VIRTUAL_BASE_SYMBOL})"
        )?;
        writeln!(f, "{INDENT}{{")?;

        match kind {
            SegmentKind::ZeroInitData => symbol(f, BoundarySymbol::BssStart, ".")?,
            SegmentKind::BootStack => symbol(f, BoundarySymbol::StackStart, ".")?,
            _ => {}
        }

        for patterns in statements_for(kind) {
            writeln!(f, "{INDENT}{INDENT}*({})", patterns.join(" "))?;
        }

        match kind {
            SegmentKind::ReadOnlyData => {
                writeln!(f, "{INDENT}{INDENT}. = ALIGN({PAGE_SIZE:#x});")?;
            }
            SegmentKind::ZeroInitData => symbol(f, BoundarySymbol::BssEnd, ".")?,
            SegmentKind::BootStack => {
                writeln!(f, "{INDENT}{INDENT}. += {BOOT_STACK_SIZE:#x};")?;
                symbol(f, BoundarySymbol::StackEnd, ".")?;
            }
            _ => {}
        }

        writeln!(f, "{INDENT}}}")?;
        writeln!(f)
    }

    fn write_assertions(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entry = self.config.entry_symbol();
        let text = SegmentKind::Text.output_section();
        let kernel_start = BoundarySymbol::KernelStart;
        let reservation = self.config.header_reservation();

        let assertions = [
            (
                format!("{VIRTUAL_BASE_SYMBOL} % {PAGE_SIZE:#x} == 0"),
                format!("{VIRTUAL_BASE_SYMBOL} is not page aligned"),
            ),
            (
                format!("{LOAD_ADDRESS_SYMBOL} >= {VIRTUAL_BASE_SYMBOL}"),
                format!("{LOAD_ADDRESS_SYMBOL} lies below {VIRTUAL_BASE_SYMBOL}"),
            ),
            (
                format!("{kernel_start} % {PAGE_SIZE:#x} == 0"),
                format!("{kernel_start} is not page aligned"),
            ),
            (
                format!("ADDR({text}) == ALIGN({kernel_start} + {reservation:#x}, {PAGE_SIZE:#x})"),
                format!("image headers exceed the {reservation:#x} bytes reserved for them"),
            ),
            (
                format!(
                    "{} - {} == {BOOT_STACK_SIZE:#x}",
                    BoundarySymbol::StackEnd,
                    BoundarySymbol::StackStart
                ),
                format!("boot stack is not {BOOT_STACK_SIZE:#x} bytes"),
            ),
            (
                format!("DEFINED({entry})"),
                format!("entry symbol {entry} is not defined"),
            ),
            (
                format!("{entry} >= ADDR({text}) && {entry} < ADDR({text}) + SIZEOF({text})"),
                format!("entry symbol {entry} is not in {text}"),
            ),
        ];

        for (condition, message) in assertions {
            writeln!(f, "ASSERT({condition}, \"{message}\")")?;
        }
        Ok(())
    }
}

fn symbol(f: &mut fmt::Formatter<'_>, symbol: BoundarySymbol, value: &str) -> fmt::Result {
    writeln!(f, "{INDENT}{INDENT}{symbol} = {value};")
}

impl fmt::Display for LinkerScript<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = SegmentKind::Text.output_section();
        let rodata = SegmentKind::ReadOnlyData.output_section();
        let data = SegmentKind::WritableData.output_section();
        let stack = SegmentKind::BootStack.output_section();

        let [base, load, orphans] = self.linker_args();
        writeln!(f, "/* Kernel image layout. Link with {base} {load} {orphans}. */")?;
        writeln!(f, "ENTRY({})", self.config.entry_symbol())?;
        writeln!(f)?;
        writeln!(f, "SECTIONS")?;
        writeln!(f, "{{")?;
        writeln!(f, "{INDENT}. = {LOAD_ADDRESS_SYMBOL};")?;
        writeln!(f, "{INDENT}{} = .;", BoundarySymbol::KernelStart)?;
        writeln!(f, "{INDENT}. += SIZEOF_HEADERS;")?;
        writeln!(f)?;

        for kind in SegmentKind::ALL {
            Self::write_segment(f, kind)?;
        }

        writeln!(f, "{INDENT}{} = .;", BoundarySymbol::KernelEnd)?;
        writeln!(f)?;
        writeln!(f, "{INDENT}{} = LOADADDR({text});", BoundarySymbol::RoPhysicalStart)?;
        writeln!(
            f,
            "{INDENT}{} = LOADADDR({rodata}) + SIZEOF({rodata});",
            BoundarySymbol::RoPhysicalEnd
        )?;
        writeln!(f, "{INDENT}{} = LOADADDR({data});", BoundarySymbol::RwPhysicalStart)?;
        writeln!(
            f,
            "{INDENT}{} = LOADADDR({stack}) + SIZEOF({stack});",
            BoundarySymbol::RwPhysicalEnd
        )?;
        writeln!(f)?;

        let discard: alloc::vec::Vec<String> = discard_statements()
            .iter()
            .map(|patterns| format!("*({})", patterns.join(" ")))
            .collect();
        writeln!(f, "{INDENT}/DISCARD/ : {{ {} }}", discard.join(" "))?;
        writeln!(f, "}}")?;
        writeln!(f)?;
        self.write_assertions(f)
    }
}

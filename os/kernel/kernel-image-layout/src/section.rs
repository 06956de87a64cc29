//! # Input Sections and Classification
//!
//! Sections found in the compiled object files are assigned to output
//! segments purely by name. The same table drives both the layout
//! computation and the rendered linker script, so the two cannot disagree.

extern crate alloc;

use crate::segment::SegmentKind;
use alloc::string::String;
use kernel_info::memory::PAGE_SIZE;

/// A section of the compiled object files.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InputSection {
    pub name: String,
    pub size: u32,
    /// Required alignment in bytes. `0` is treated as `1`, as in ELF.
    pub align: u32,
}

impl InputSection {
    #[must_use]
    pub fn new(name: impl Into<String>, size: u32, align: u32) -> Self {
        Self {
            name: name.into(),
            size,
            align,
        }
    }

    /// Effective alignment, or `None` if it is not a power of two or exceeds
    /// a page (segments only guarantee page alignment).
    #[must_use]
    pub const fn effective_align(&self) -> Option<u32> {
        let align = if self.align == 0 { 1 } else { self.align };
        if align.is_power_of_two() && align <= PAGE_SIZE {
            Some(align)
        } else {
            None
        }
    }
}

/// A symbol defined at `offset` bytes into the input section at `section`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SymbolDefinition {
    pub name: String,
    /// Index into the input section list.
    pub section: usize,
    pub offset: u32,
}

impl SymbolDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>, section: usize, offset: u32) -> Self {
        Self {
            name: name.into(),
            section,
            offset,
        }
    }
}

/// Where an input section ends up.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SectionClass {
    /// Placed into a segment by the `statement`-th input statement of that segment.
    Keep {
        segment: SegmentKind,
        statement: usize,
    },
    /// Dropped from the image.
    Discard,
}

impl SectionClass {
    /// Classify a section by name, or `None` for an orphan.
    #[must_use]
    pub fn classify(name: &str) -> Option<Self> {
        for rule in SECTION_RULES {
            for (statement, patterns) in rule.statements.iter().enumerate() {
                if patterns.iter().any(|p| pattern_matches(p, name)) {
                    return Some(match rule.target {
                        Some(segment) => Self::Keep { segment, statement },
                        None => Self::Discard,
                    });
                }
            }
        }
        None
    }

    #[must_use]
    pub const fn segment(self) -> Option<SegmentKind> {
        match self {
            Self::Keep { segment, .. } => Some(segment),
            Self::Discard => None,
        }
    }
}

/// Input statements collecting sections into one output segment.
///
/// Each statement is a list of name patterns; sections matching an earlier
/// statement are placed before those matching a later one, and within a
/// statement sections keep their input order.
#[derive(Debug)]
pub struct SectionRule {
    /// `None` for the discard rule.
    pub target: Option<SegmentKind>,
    pub statements: &'static [&'static [&'static str]],
}

/// Classification table, in priority order.
pub const SECTION_RULES: &[SectionRule] = &[
    SectionRule {
        target: Some(SegmentKind::Text),
        statements: &[&[".text", ".text.*"]],
    },
    SectionRule {
        target: Some(SegmentKind::ReadOnlyData),
        statements: &[&[".rodata", ".rodata.*"]],
    },
    SectionRule {
        target: Some(SegmentKind::WritableData),
        statements: &[&[".data", ".data.*"]],
    },
    SectionRule {
        target: Some(SegmentKind::ZeroInitData),
        statements: &[&["COMMON"], &[".bss", ".bss.*"]],
    },
    SectionRule {
        target: None,
        statements: &[&[".note", ".note.*"], &[".comment"]],
    },
];

/// Input statements for `segment`; the boot stack has none.
#[must_use]
pub fn statements_for(segment: SegmentKind) -> &'static [&'static [&'static str]] {
    SECTION_RULES
        .iter()
        .find(|r| r.target == Some(segment))
        .map_or(&[], |r| r.statements)
}

/// Input statements of the discard rule.
#[must_use]
pub fn discard_statements() -> &'static [&'static [&'static str]] {
    SECTION_RULES
        .iter()
        .find(|r| r.target.is_none())
        .map_or(&[], |r| r.statements)
}

/// `ld`-style match: a trailing `*` matches any suffix, otherwise exact.
fn pattern_matches(pattern: &str, name: &str) -> bool {
    pattern
        .strip_suffix('*')
        .map_or_else(|| name == pattern, |prefix| name.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keep(name: &str) -> SegmentKind {
        SectionClass::classify(name).and_then(SectionClass::segment).unwrap()
    }

    #[test]
    fn classifies_by_name_convention() {
        assert_eq!(keep(".text"), SegmentKind::Text);
        assert_eq!(keep(".text._start"), SegmentKind::Text);
        assert_eq!(keep(".rodata.str1.1"), SegmentKind::ReadOnlyData);
        assert_eq!(keep(".data"), SegmentKind::WritableData);
        assert_eq!(keep(".data.rel.ro"), SegmentKind::WritableData);
        assert_eq!(keep("COMMON"), SegmentKind::ZeroInitData);
        assert_eq!(keep(".bss.FRAME_ALLOCATOR"), SegmentKind::ZeroInitData);
    }

    #[test]
    fn common_precedes_bss() {
        assert_eq!(
            SectionClass::classify("COMMON"),
            Some(SectionClass::Keep {
                segment: SegmentKind::ZeroInitData,
                statement: 0
            })
        );
        assert_eq!(
            SectionClass::classify(".bss"),
            Some(SectionClass::Keep {
                segment: SegmentKind::ZeroInitData,
                statement: 1
            })
        );
    }

    #[test]
    fn build_metadata_is_discarded() {
        for name in [".note", ".note.gnu.build-id", ".comment"] {
            assert_eq!(SectionClass::classify(name), Some(SectionClass::Discard));
        }
    }

    #[test]
    fn prefix_without_dot_is_an_orphan() {
        assert_eq!(SectionClass::classify(".textual"), None);
        assert_eq!(SectionClass::classify(".comments"), None);
        assert_eq!(SectionClass::classify(".eh_frame"), None);
    }

    #[test]
    fn stack_has_no_input_statements() {
        assert!(statements_for(SegmentKind::BootStack).is_empty());
        assert_eq!(statements_for(SegmentKind::ZeroInitData).len(), 2);
        assert_eq!(discard_statements().len(), 2);
    }

    #[test]
    fn alignment_rules() {
        assert_eq!(InputSection::new(".text", 1, 0).effective_align(), Some(1));
        assert_eq!(InputSection::new(".text", 1, 16).effective_align(), Some(16));
        assert_eq!(InputSection::new(".text", 1, 12).effective_align(), None);
        assert_eq!(InputSection::new(".text", 1, 8192).effective_align(), None);
    }
}

//! Host tool for the kernel image layout.
//!
//! ```text
//! layout-gen script <out.ld>
//! layout-gen defsyms
//! layout-gen link-args
//! layout-gen plan <text> <rodata> <data> <bss>
//! ```

mod logger;

use kernel_image_layout::{
    ImageLayout, InputSection, LayoutConfig, LayoutError, LinkerScript, SymbolDefinition,
};
use log::{error, info};
use logger::StderrLogger;
use std::io::{self, Write};
use std::num::ParseIntError;
use std::process::ExitCode;
use std::{env, fs};

const USAGE: &str =
    "usage: layout-gen script <out.ld> | defsyms | link-args | plan <text> <rodata> <data> <bss>";

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{USAGE}")]
    Usage,
    #[error("invalid size `{value}`: {source}")]
    Size {
        value: String,
        source: ParseIntError,
    },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("layout rejected: {0}")]
    Layout(#[from] LayoutError),
}

fn main() -> ExitCode {
    // No logger means no diagnostics, but the tool still works.
    let _ = StderrLogger::from_env().init();

    let args: Vec<String> = env::args().skip(1).collect();
    match run(&args, &mut io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String], out: &mut impl Write) -> Result<(), CliError> {
    let config = LayoutConfig::kernel_default();
    let script = LinkerScript::new(&config);

    match args {
        [cmd, path] if cmd == "script" => {
            fs::write(path, script.render())?;
            info!("wrote linker script to {path}");
        }
        [cmd] if cmd == "defsyms" => {
            for arg in script.defsym_args() {
                writeln!(out, "{arg}")?;
            }
        }
        [cmd] if cmd == "link-args" => {
            for arg in script.linker_args() {
                writeln!(out, "{arg}")?;
            }
        }
        [cmd, text, rodata, data, bss] if cmd == "plan" => {
            let sizes = [
                parse_size(text)?,
                parse_size(rodata)?,
                parse_size(data)?,
                parse_size(bss)?,
            ];
            let (sections, definitions) = synthetic_image(sizes);
            let layout = ImageLayout::compute(&config, &sections, &definitions)?;
            print_plan(&layout, out)?;
        }
        _ => return Err(CliError::Usage),
    }
    Ok(())
}

/// Decimal or `0x`-prefixed hexadecimal.
fn parse_size(value: &str) -> Result<u32, CliError> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|source| CliError::Size {
        value: value.to_string(),
        source,
    })
}

/// One input section per segment, with the entry symbol at the start of
/// `.text`.
fn synthetic_image(sizes: [u32; 4]) -> (Vec<InputSection>, [SymbolDefinition; 1]) {
    let [text, rodata, data, bss] = sizes;
    let sections = vec![
        InputSection::new(".text", text, 16),
        InputSection::new(".rodata", rodata, 16),
        InputSection::new(".data", data, 16),
        InputSection::new(".bss", bss, 16),
    ];
    let entry = LayoutConfig::kernel_default().entry_symbol();
    (sections, [SymbolDefinition::new(entry, 0, 0)])
}

fn print_plan(layout: &ImageLayout, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "segment  virtual      physical     content  pages")?;
    for segment in layout.segments() {
        writeln!(
            out,
            "{:<8} {}  {}  {:#7x}  {}",
            segment.kind(),
            segment.virtual_start(),
            segment.physical_start(),
            segment.content_size(),
            segment.pages()
        )?;
    }

    writeln!(out)?;
    for (symbol, value) in layout.symbols().iter() {
        writeln!(out, "{:<20} {value:#010x}", symbol.name())?;
    }

    writeln!(out)?;
    writeln!(out, "entry {}", layout.entry())?;
    for mapping in layout.mappings() {
        writeln!(
            out,
            "map {} -> {} ({} pages, pte bits {:#x})",
            mapping.virtual_start,
            mapping.physical_start,
            mapping.pages,
            mapping.flags.page_table_bits()
        )?;
    }

    let frames = layout.reserved_frames();
    writeln!(
        out,
        "reserve frames {:#x}..{:#x} ({} frames)",
        frames.start.as_u32(),
        frames.end.as_u32(),
        frames.frame_count()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn sizes_accept_decimal_and_hex() {
        assert_eq!(parse_size("4096").unwrap(), 4096);
        assert_eq!(parse_size("0x1000").unwrap(), 4096);
        assert!(matches!(parse_size("0xzz"), Err(CliError::Size { .. })));
    }

    #[test]
    fn defsyms_are_printed_one_per_line() {
        let mut out = Vec::new();
        run(&args(&["defsyms"]), &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(
            out.lines().collect::<Vec<_>>(),
            [
                "--defsym=KERNEL_VIRTUAL_BASE=0xc0000000",
                "--defsym=KERNEL_LOAD_VIRT=0xc0100000"
            ]
        );
    }

    #[test]
    fn link_args_make_orphans_fatal() {
        let mut out = Vec::new();
        run(&args(&["link-args"]), &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.lines().count(), 3);
        assert_eq!(out.lines().last(), Some("--orphan-handling=error"));
    }

    #[test]
    fn plan_reports_boundary_symbols() {
        let mut out = Vec::new();
        run(&args(&["plan", "10", "0", "0x10", "1"]), &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("__ro_physical_start  0x00101000"));
        assert!(out.contains("entry 0xC0101000"));
    }

    #[test]
    fn empty_text_has_no_entry_point() {
        let mut out = Vec::new();
        let result = run(&args(&["plan", "0", "0", "0", "0"]), &mut out);
        assert!(matches!(
            result,
            Err(CliError::Layout(LayoutError::SymbolOutOfBounds { .. }))
        ));
    }

    #[test]
    fn unknown_commands_print_usage() {
        let mut out = Vec::new();
        assert!(matches!(
            run(&args(&["link"]), &mut out),
            Err(CliError::Usage)
        ));
    }

    #[test]
    fn script_is_written_to_disk() {
        let path = env::temp_dir().join(format!("layout-gen-{}.ld", std::process::id()));
        let path_arg = path.to_string_lossy().into_owned();
        run(&args(&["script", &path_arg]), &mut Vec::new()).unwrap();
        let script = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert!(script.contains("ENTRY(_start)"));
        assert!(script.contains("ASSERT(DEFINED(_start)"));
    }
}

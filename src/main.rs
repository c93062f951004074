// ── Safety policy ────────────────────────────────────────────────────────────
// Unsafe code is forbidden here except for the deliberate crash below, which
// carries its own `// SAFETY:` comment.
#![deny(unsafe_code)]

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use windump::{DumpKind, DumpOptions, WinDumpError};

/// Install the crash-dump handler, optionally crash on purpose to test it.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Where to write the minidump.
    #[arg(long, required_unless_present = "config", conflicts_with = "config")]
    dump: Option<PathBuf>,
    /// JSON options file (`{"dump_path": …, "kind": …, "ignored_codes": […]}`).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Dump kind, e.g. `normal` or `with-full-memory`.  Overrides the config.
    #[arg(long)]
    kind: Option<DumpKind>,
    /// Raise an access violation once the handler is installed.
    #[arg(long)]
    crash: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[windump] {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> windump::Result<()> {
    let options = options(args)?;

    let teardown = windump::default(&options)?;
    eprintln!(
        "[windump] backend {} ready, dumps go to {}",
        teardown.capability().name(),
        options.dump_path.display()
    );

    if args.crash {
        crash();
    }

    finish(teardown.invoke())
}

/// `--config` or `--dump`, then `--kind` on top.
fn options(args: &Args) -> windump::Result<DumpOptions> {
    let mut options = match (&args.config, &args.dump) {
        (Some(config), _) => DumpOptions::load(config)?,
        (None, Some(dump)) => DumpOptions::new(dump),
        (None, None) => {
            return Err(WinDumpError::InvalidOptions(
                "--dump or --config is required".to_owned(),
            ))
        }
    };
    if let Some(kind) = args.kind {
        options.kind = kind;
    }
    Ok(options)
}

fn finish(teardown: windump::Result<()>) -> windump::Result<()> {
    match teardown {
        Ok(()) => {
            eprintln!("[windump] handler removed");
            Ok(())
        }
        // Nothing was installed, so there is nothing to report as a failure.
        Err(WinDumpError::Unsupported { operation }) => {
            eprintln!("[windump] {operation} not available on this platform");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[cfg(windows)]
#[allow(unsafe_code)]
fn crash() -> ! {
    use windows::Win32::System::Diagnostics::Debug::RaiseException;

    // STATUS_ACCESS_VIOLATION; EXCEPTION_NONCONTINUABLE.
    const ACCESS_VIOLATION: u32 = 0xC000_0005;
    const NONCONTINUABLE: u32 = 0x1;

    // SAFETY: raising a non-continuable exception with no arguments is
    // always valid; the installed handler sees it, writes the dump and
    // passes it on, and the default handler then ends the process.
    unsafe { RaiseException(ACCESS_VIOLATION, NONCONTINUABLE, None) };
    std::process::abort()
}

#[cfg(not(windows))]
fn crash() -> ! {
    std::process::abort()
}

//! Minidump capture for unhandled Windows exceptions.
//!
//! On Windows, [`init`] registers a vectored exception handler that writes a
//! minidump (plus a short text log next to it) whenever a critical exception
//! reaches it.  On every other platform the same calls land in a no-op
//! stand-in: `init` succeeds and does nothing, and `deinit` fails with
//! [`WinDumpError::Unsupported`].
//!
//! ```no_run
//! let teardown = windump::default(&windump::DumpOptions::new("crash.dmp"))?;
//! // … run the program …
//! teardown.invoke()?;
//! # Ok::<(), windump::WinDumpError>(())
//! ```

// ── Safety policy ────────────────────────────────────────────────────────────
// Unsafe code is forbidden everywhere except `platform::win32` (Win32 FFI).
// Each unsafe block in that module MUST carry a `// SAFETY:` comment.
#![deny(unsafe_code)]

mod capability;
mod config;
mod error;
// Only the Windows backend consumes these outside of tests.
#[cfg_attr(not(windows), allow(dead_code))]
mod filter;
mod platform;
#[cfg_attr(not(windows), allow(dead_code))]
mod report;
mod selector;

pub use capability::DumpCapability;
pub use config::{DumpKind, DumpOptions};
pub use error::{Result, WinDumpError};
pub use platform::Platform;
pub use selector::{capability, select, Teardown};

/// Start capturing crash dumps with `options`.
pub fn init(options: &DumpOptions) -> Result<()> {
    capability().init(options)
}

/// Stop capturing.  Fails with [`WinDumpError::Unsupported`] where there is
/// nothing to stop.
pub fn deinit() -> Result<()> {
    capability().deinit()
}

/// [`init`] with `options`, returning the matching teardown.
///
/// The handle is the caller's to invoke; dropping it leaves the handler
/// installed.
pub fn default(options: &DumpOptions) -> Result<Teardown> {
    selector::install(capability(), options)
}

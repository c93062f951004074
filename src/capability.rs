// ── Capture capability ────────────────────────────────────────────────────────
//
// The one interface both backends implement.  The selector hands out a
// `&'static dyn DumpCapability`, so implementations live in statics and must
// be shareable across threads.

use crate::{config::DumpOptions, error::Result};

/// Crash-dump capture as seen by the rest of the program.
pub trait DumpCapability: Send + Sync {
    /// Short backend name for logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Whether this backend actually captures anything.
    fn is_supported(&self) -> bool;

    /// Start capturing with `options`.  Calling it again replaces the
    /// settings of the running capture.
    fn init(&self, options: &DumpOptions) -> Result<()>;

    /// Stop capturing and release what `init` acquired.
    ///
    /// Backends without a teardown return `WinDumpError::Unsupported`
    /// rather than pretending to succeed.
    fn deinit(&self) -> Result<()>;
}

// ── Central error type ────────────────────────────────────────────────────────
//
// All fallible operations in windump return `error::Result<T>`.  Errors from
// the native backend pass through untranslated; nothing here retries or
// swallows a failure.

use thiserror::Error;

/// Every error that windump can produce.
#[derive(Debug, Error)]
pub enum WinDumpError {
    /// A Win32 API call returned a failure code.
    #[error("{function} failed (error {code:#010x})")]
    Win32 {
        /// The name of the failing function, for display purposes.
        function: &'static str,
        /// The raw Win32 error code (`GetLastError()` value) or HRESULT.
        code: u32,
    },

    /// The native capture backend, or a library it needs, could not be
    /// obtained.  There is no fallback once the platform asks for it.
    #[error("failed to load {module}: {detail}")]
    Load {
        /// What was being loaded, e.g. `"dbghelp.dll"`.
        module: &'static str,
        /// The loader's own message.
        detail: String,
        /// The loader's HRESULT or Win32 error code, when there is one.
        code: Option<u32>,
    },

    /// The operation does not exist on the selected implementation.
    #[error("{operation} is not supported on this platform")]
    Unsupported {
        /// The operation that was called.
        operation: &'static str,
    },

    /// `DumpOptions` were rejected before anything was installed.
    #[error("invalid dump options: {0}")]
    InvalidOptions(String),

    /// A JSON options document could not be parsed.
    #[error("failed to parse dump options: {0}")]
    Config(#[from] serde_json::Error),

    /// A standard I/O error (reading an options file, …).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, WinDumpError>;

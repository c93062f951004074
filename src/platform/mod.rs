// ── Platform abstraction layer ────────────────────────────────────────────────
//
// Identifies the platform and hosts both capture backends.  No `unsafe` lives
// here; all Win32 FFI is confined to the `win32` sub-module, which only
// exists on Windows builds.

use std::fmt;

use crate::{capability::DumpCapability, error::Result};

pub(crate) mod unsupported;
#[cfg(windows)]
pub(crate) mod win32;

/// The process-wide platform identifier the selector keys on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Platform {
    /// The one platform with a native capture backend.
    Windows,
    /// Anything else, by its identifier (`"linux"`, `"macos"`, …).
    Other(String),
}

impl Platform {
    /// The platform this binary was built for.
    pub fn current() -> Self {
        Self::from_id(std::env::consts::OS)
    }

    /// Both Rust's `"windows"` and Node-style `"win32"` name Windows.
    pub fn from_id(id: &str) -> Self {
        if id.eq_ignore_ascii_case("windows") || id.eq_ignore_ascii_case("win32") {
            Self::Windows
        } else {
            Self::Other(id.to_owned())
        }
    }

    /// The identifier as selection sees it; Windows is always `"windows"`.
    pub fn id(&self) -> &str {
        match self {
            Self::Windows => "windows",
            Self::Other(id) => id,
        }
    }

    pub fn has_native_backend(&self) -> bool {
        matches!(self, Self::Windows)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

// ── Backend lookup ────────────────────────────────────────────────────────────

/// The native backend, if this build carries one.
#[cfg(windows)]
pub(crate) fn native() -> Result<&'static dyn DumpCapability> {
    Ok(&win32::NATIVE)
}

#[cfg(not(windows))]
pub(crate) fn native() -> Result<&'static dyn DumpCapability> {
    Err(crate::error::WinDumpError::Load {
        module: "native capture backend",
        detail: format!("not compiled for target_os {:?}", std::env::consts::OS),
        code: None,
    })
}

/// The backend `Platform::current()` selects; the native one exists on every
/// build where the current platform is Windows.
pub(crate) fn for_this_build() -> &'static dyn DumpCapability {
    #[cfg(windows)]
    let capability: &'static dyn DumpCapability = &win32::NATIVE;
    #[cfg(not(windows))]
    let capability = unsupported();
    capability
}

pub(crate) fn unsupported() -> &'static dyn DumpCapability {
    &unsupported::UNSUPPORTED
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_aliases_map_to_windows() {
        assert_eq!(Platform::from_id("windows"), Platform::Windows);
        assert_eq!(Platform::from_id("win32"), Platform::Windows);
        assert_eq!(Platform::from_id("WIN32"), Platform::Windows);
    }

    #[test]
    fn other_ids_are_kept_verbatim() {
        let p = Platform::from_id("freebsd");
        assert_eq!(p, Platform::Other("freebsd".to_owned()));
        assert_eq!(p.to_string(), "freebsd");
        assert!(!p.has_native_backend());
    }

    #[test]
    fn current_matches_build_target() {
        assert_eq!(Platform::current().has_native_backend(), cfg!(windows));
    }

    #[cfg(not(windows))]
    #[test]
    fn native_is_a_load_error_off_windows() {
        use crate::error::WinDumpError;

        let err = native().err().expect("no native backend here");
        assert!(matches!(err, WinDumpError::Load { code: None, .. }));
    }
}

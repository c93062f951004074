// ── Capability selection ──────────────────────────────────────────────────────
//
// Picks the capture backend once per process and hands out the teardown
// handle that `default` returns.  Selection is keyed on `Platform`; the
// choice for the running process is fixed at first use and never replaced.

use std::{fmt, sync::OnceLock};

use tracing::debug;

use crate::{
    capability::DumpCapability,
    config::DumpOptions,
    error::Result,
    platform::{self, Platform},
};

static SELECTED: OnceLock<&'static dyn DumpCapability> = OnceLock::new();

/// Choose the backend for `platform`.
///
/// Windows always means the native backend; if this build has none, the
/// resulting `Load` error is returned as is.  Every other platform gets the
/// no-op stand-in.
pub fn select(platform: &Platform) -> Result<&'static dyn DumpCapability> {
    let capability = if platform.has_native_backend() {
        platform::native()?
    } else {
        platform::unsupported()
    };
    debug!(platform = %platform, backend = capability.name(), "selected crash-dump backend");
    Ok(capability)
}

/// The backend for the running process.
pub fn capability() -> &'static dyn DumpCapability {
    *SELECTED.get_or_init(|| {
        let capability = platform::for_this_build();
        debug!(platform = %Platform::current(), backend = capability.name(), "selected crash-dump backend");
        capability
    })
}

/// `init` followed by a handle for the matching `deinit`.
pub(crate) fn install(
    capability: &'static dyn DumpCapability,
    options: &DumpOptions,
) -> Result<Teardown> {
    capability.init(options)?;
    Ok(Teardown { capability })
}

// ── Teardown ──────────────────────────────────────────────────────────────────

/// The `deinit` of the backend that was initialised.
///
/// Dropping it does nothing; call [`Teardown::invoke`] on every exit path.
#[must_use = "a Teardown must be invoked to remove the crash-dump handler"]
#[derive(Clone, Copy)]
pub struct Teardown {
    capability: &'static dyn DumpCapability,
}

impl Teardown {
    /// Same effect as calling `deinit` on the backend directly.
    pub fn invoke(&self) -> Result<()> {
        self.capability.deinit()
    }

    /// The backend this handle tears down.
    pub fn capability(&self) -> &'static dyn DumpCapability {
        self.capability
    }
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Teardown")
            .field("backend", &self.capability.name())
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! No-op stand-in for platforms without a native capture backend.

use tracing::warn;

use crate::{
    capability::DumpCapability,
    config::DumpOptions,
    error::{Result, WinDumpError},
};

pub(crate) static UNSUPPORTED: Unsupported = Unsupported;

/// `init` does nothing; `deinit` does not exist and says so.
#[derive(Debug, Default)]
pub(crate) struct Unsupported;

impl DumpCapability for Unsupported {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn is_supported(&self) -> bool {
        false
    }

    fn init(&self, _options: &DumpOptions) -> Result<()> {
        Ok(())
    }

    fn deinit(&self) -> Result<()> {
        // A caller reaching this holds a teardown it believes is real.
        warn!("deinit called on a platform without crash-dump capture");
        Err(WinDumpError::Unsupported { operation: "deinit" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_accepts_anything_and_touches_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let opts = DumpOptions::new(dir.path().join("never.dmp"));

        UNSUPPORTED.init(&opts).expect("no-op init");
        // Even options the native backend would reject.
        UNSUPPORTED.init(&DumpOptions::new("")).expect("no-op init");

        assert!(!opts.dump_path.exists());
        assert!(!opts.log_path().exists());
    }

    #[test]
    fn deinit_is_an_explicit_error() {
        let err = UNSUPPORTED.deinit().unwrap_err();
        assert!(matches!(err, WinDumpError::Unsupported { operation: "deinit" }));
    }

    #[test]
    fn reports_itself_unsupported() {
        assert!(!UNSUPPORTED.is_supported());
        assert_eq!(UNSUPPORTED.name(), "unsupported");
    }
}

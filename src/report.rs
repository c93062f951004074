// ── Crash log ─────────────────────────────────────────────────────────────────
//
// Plain-text log appended next to each dump.  Written from inside the
// exception handler, so it goes straight to a `Write` with no `tracing`
// subscriber in between.  Hex values are lowercase, unprefixed.

use std::{
    io::{self, Write},
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

/// The facts about one exception that make it into the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ExceptionSummary {
    /// Seconds since the Unix epoch.
    pub(crate) time: u64,
    pub(crate) code: u32,
    pub(crate) address: usize,
}

impl ExceptionSummary {
    pub(crate) fn now(code: u32, address: usize) -> Self {
        let time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self { time, code, address }
    }
}

/// How the dump attempt ended.
#[derive(Debug)]
pub(crate) enum DumpOutcome {
    Written,
    /// `MiniDumpWriteDump` returned FALSE; carries `GetLastError()`.
    WriteFailed(u32),
    CreateFailed(io::Error),
}

pub(crate) struct CrashLog<W: Write> {
    out: W,
}

impl<W: Write> CrashLog<W> {
    pub(crate) fn new(out: W) -> Self {
        Self { out }
    }

    pub(crate) fn exception(&mut self, summary: &ExceptionSummary) -> io::Result<()> {
        writeln!(self.out, "Exception time: {}", summary.time)?;
        writeln!(self.out, "Exception code: {:x}", summary.code)?;
        writeln!(self.out, "Exception address: {:x}", summary.address)
    }

    pub(crate) fn writing(&mut self, dump_path: &Path) -> io::Result<()> {
        writeln!(self.out, "writing dump {}", dump_path.display())
    }

    pub(crate) fn outcome(&mut self, outcome: &DumpOutcome) -> io::Result<()> {
        match outcome {
            DumpOutcome::Written => writeln!(self.out, "success")?,
            DumpOutcome::WriteFailed(code) => {
                writeln!(self.out, "failed to write dump: {code:x}")?
            }
            DumpOutcome::CreateFailed(e) => writeln!(self.out, "failed to create dmp file: {e}")?,
        }
        self.out.flush()
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> ExceptionSummary {
        ExceptionSummary {
            time: 1_700_000_000,
            code: 0xC000_0005,
            address: 0x7ff6_1234_abcd,
        }
    }

    fn text(log: CrashLog<Vec<u8>>) -> String {
        String::from_utf8(log.into_inner()).expect("utf-8")
    }

    #[test]
    fn successful_capture_log() {
        let mut log = CrashLog::new(Vec::new());
        log.exception(&summary()).unwrap();
        log.writing(Path::new("app.dmp")).unwrap();
        log.outcome(&DumpOutcome::Written).unwrap();

        assert_eq!(
            text(log),
            "Exception time: 1700000000\n\
             Exception code: c0000005\n\
             Exception address: 7ff61234abcd\n\
             writing dump app.dmp\n\
             success\n"
        );
    }

    #[test]
    fn write_failure_logs_hex_code() {
        let mut log = CrashLog::new(Vec::new());
        log.outcome(&DumpOutcome::WriteFailed(0x8007_0070)).unwrap();
        assert_eq!(text(log), "failed to write dump: 80070070\n");
    }

    #[test]
    fn create_failure_logs_io_error() {
        let mut log = CrashLog::new(Vec::new());
        let e = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        log.outcome(&DumpOutcome::CreateFailed(e)).unwrap();
        assert_eq!(text(log), "failed to create dmp file: access denied\n");
    }

    #[test]
    fn now_stamps_a_recent_time() {
        let s = ExceptionSummary::now(1, 2);
        assert!(s.time > 1_600_000_000);
        assert_eq!((s.code, s.address), (1, 2));
    }
}

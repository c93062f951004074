// ── Exception filter ──────────────────────────────────────────────────────────
//
// Decides whether an exception code is worth a minidump.  Runs inside the
// vectored handler, so it must not allocate or lock.

/// Codes below this are informational or warnings, never crashes.
const CRITICAL_THRESHOLD: u32 = 0x8000_0000;

/// Exceptions that show up in healthy processes and are almost never caused
/// by the host's own code.
pub(crate) const KNOWN_BENIGN_CODES: [u32; 11] = [
    0x8001_0012, // COM: call rejected / Windows-internal
    0x8001_0108,
    0x8001_010d,
    0x8001_010e,
    0x8000_4035,
    0x8004_0155,
    0x8004_01fd,
    0x8007_06b5,
    0x8007_06ba,
    0xe06d_7363, // C++ throw (may well be caught)
    0xe043_4352, // CLR exception
];

/// What the handler should do with one exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    NonCritical,
    Ignored,
    Capture,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ExceptionFilter {
    extra_ignored: Vec<u32>,
}

impl ExceptionFilter {
    pub(crate) fn new(extra_ignored: &[u32]) -> Self {
        Self {
            extra_ignored: extra_ignored.to_vec(),
        }
    }

    pub(crate) fn verdict(&self, code: u32) -> Verdict {
        if code < CRITICAL_THRESHOLD {
            Verdict::NonCritical
        } else if KNOWN_BENIGN_CODES.contains(&code) || self.extra_ignored.contains(&code) {
            Verdict::Ignored
        } else {
            Verdict::Capture
        }
    }

    pub(crate) fn should_capture(&self, code: u32) -> bool {
        self.verdict(code) == Verdict::Capture
    }
}

// ── Vectored exception handler ────────────────────────────────────────────────
//
// Runs on the faulting thread, possibly with a corrupted heap.  Rules:
//   • never block: the capture state is only `try_lock`ed,
//   • never swallow: always return EXCEPTION_CONTINUE_SEARCH,
//   • never log through `tracing`: the crash log file is the only output.

#![allow(unsafe_code)]

use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    sync::{Mutex, TryLockError},
};

use windows::Win32::System::Diagnostics::Debug::EXCEPTION_POINTERS;

use crate::{
    error::WinDumpError,
    report::{CrashLog, DumpOutcome, ExceptionSummary},
};

use super::{dbghelp::DbgHelp, CaptureSettings, CaptureState, STATE};

/// Let the next handler (or the default crash path) see the exception.
const EXCEPTION_CONTINUE_SEARCH: i32 = 0;

// SAFETY: registered through AddVectoredExceptionHandler by `install`.
// Windows passes EXCEPTION_POINTERS that stay valid for the duration of the
// call; nothing here keeps them beyond it.
pub(super) unsafe extern "system" fn vectored_handler(exception: *mut EXCEPTION_POINTERS) -> i32 {
    // SAFETY: same contract as this function.
    unsafe { handle(&STATE, exception) }
}

/// The handler body, against whichever capture state it is given.
///
/// # Safety
/// `exception` is null or points to EXCEPTION_POINTERS whose records are
/// valid for the duration of the call.
unsafe fn handle(state: &Mutex<Option<CaptureState>>, exception: *mut EXCEPTION_POINTERS) -> i32 {
    // SAFETY: both pointers are valid for this call per the contract above;
    // `as_ref` maps a null pointer to None.
    let Some(record) = (unsafe { exception.as_ref() })
        .and_then(|pointers| unsafe { pointers.ExceptionRecord.as_ref() })
    else {
        return EXCEPTION_CONTINUE_SEARCH;
    };

    // NTSTATUS is i32; codes are conventionally read as unsigned.
    let code = record.ExceptionCode.0 as u32;

    // Busy means a capture is already running (nested fault while writing,
    // or another thread crashing) or init/deinit holds the lock.  Skip
    // rather than deadlock.  A poisoned lock still holds valid settings.
    let guard = match state.try_lock() {
        Ok(guard) => guard,
        Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        Err(TryLockError::WouldBlock) => return EXCEPTION_CONTINUE_SEARCH,
    };
    let Some(state) = guard.as_ref() else {
        return EXCEPTION_CONTINUE_SEARCH;
    };

    if state.settings.filter.should_capture(code) {
        let summary = ExceptionSummary::now(code, record.ExceptionAddress as usize);
        capture(&state.settings, &state.dbghelp, &summary, exception);
    }

    EXCEPTION_CONTINUE_SEARCH
}

fn capture(
    settings: &CaptureSettings,
    dbghelp: &DbgHelp,
    summary: &ExceptionSummary,
    exception: *mut EXCEPTION_POINTERS,
) {
    // Without a log file the dump is still worth writing.
    let out: Box<dyn Write> = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.log_path)
    {
        Ok(file) => Box::new(file),
        Err(_) => Box::new(io::sink()),
    };
    let mut log = CrashLog::new(out);
    let _ = log.exception(summary);

    let outcome = match File::create(&settings.dump_path) {
        Ok(file) => {
            let _ = log.writing(&settings.dump_path);
            match dbghelp.write(&file, settings.kind, exception) {
                Ok(()) => DumpOutcome::Written,
                Err(WinDumpError::Win32 { code, .. }) => DumpOutcome::WriteFailed(code),
                Err(_) => DumpOutcome::WriteFailed(0),
            }
        }
        Err(e) => DumpOutcome::CreateFailed(e),
    };
    let _ = log.outcome(&outcome);
}

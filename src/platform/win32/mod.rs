// ── Win32 capture backend ─────────────────────────────────────────────────────
//
// This is the only module tree in the crate where `unsafe` code is permitted.
// Every `unsafe` block MUST carry a `// SAFETY:` comment that states:
//   • which invariant makes the operation sound, and
//   • what the caller is responsible for maintaining.
//
// Lifecycle: `init` loads dbghelp.dll and registers a vectored exception
// handler; `deinit` unregisters it and unloads the library.  Settings live in
// one process-wide `CaptureState` behind a mutex the handler only ever
// `try_lock`s.

#![allow(unsafe_code)]

use std::{
    ffi::c_void,
    path::PathBuf,
    ptr::NonNull,
    sync::{Mutex, MutexGuard, PoisonError},
};

use tracing::{debug, info};
use windows::Win32::{
    Foundation::GetLastError,
    System::Diagnostics::Debug::{AddVectoredExceptionHandler, RemoveVectoredExceptionHandler},
};

use crate::{
    capability::DumpCapability,
    config::{DumpKind, DumpOptions},
    error::{Result, WinDumpError},
    filter::ExceptionFilter,
};

mod dbghelp;
mod handler;

use dbghelp::DbgHelp;

pub(crate) static NATIVE: NativeCapture = NativeCapture;

static STATE: Mutex<Option<CaptureState>> = Mutex::new(None);

// ── State ─────────────────────────────────────────────────────────────────────

/// Where and how to write the next dump.
struct CaptureSettings {
    dump_path: PathBuf,
    log_path: PathBuf,
    kind: DumpKind,
    filter: ExceptionFilter,
}

impl CaptureSettings {
    fn from_options(options: &DumpOptions) -> Self {
        Self {
            dump_path: options.dump_path.clone(),
            log_path: options.log_path(),
            kind: options.kind,
            filter: ExceptionFilter::new(&options.ignored_codes),
        }
    }
}

/// Opaque cookie returned by `AddVectoredExceptionHandler`.
struct HandlerHandle(NonNull<c_void>);

// SAFETY: the cookie is only ever passed back to
// RemoveVectoredExceptionHandler, which accepts it from any thread.
unsafe impl Send for HandlerHandle {}

struct CaptureState {
    settings: CaptureSettings,
    handle: HandlerHandle,
    // Dropped after the handler is unregistered; see `remove`.
    dbghelp: DbgHelp,
}

fn lock_state() -> MutexGuard<'static, Option<CaptureState>> {
    // A panic while holding the lock leaves plain data behind; keep going.
    STATE.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Backend ───────────────────────────────────────────────────────────────────

/// Minidump capture through a vectored exception handler.
#[derive(Debug, Default)]
pub(crate) struct NativeCapture;

impl DumpCapability for NativeCapture {
    fn name(&self) -> &'static str {
        "win32-minidump"
    }

    fn is_supported(&self) -> bool {
        true
    }

    fn init(&self, options: &DumpOptions) -> Result<()> {
        options.validate()?;
        install(CaptureSettings::from_options(options))
    }

    fn deinit(&self) -> Result<()> {
        remove()
    }
}

fn install(settings: CaptureSettings) -> Result<()> {
    let mut state = lock_state();

    if let Some(current) = state.as_mut() {
        debug!(dump_path = %settings.dump_path.display(), "updating crash-dump settings");
        current.settings = settings;
        return Ok(());
    }

    let dbghelp = DbgHelp::load()?;

    // SAFETY: vectored_handler matches PVECTORED_EXCEPTION_HANDLER and is a
    // plain function, valid for the life of the process.  first = 0 appends
    // it after any handler that is already registered.
    let raw = unsafe { AddVectoredExceptionHandler(0, Some(handler::vectored_handler)) };
    let Some(handle) = NonNull::new(raw) else {
        return Err(last_error("AddVectoredExceptionHandler"));
    };

    info!(dump_path = %settings.dump_path.display(), kind = %settings.kind, "crash-dump handler installed");
    *state = Some(CaptureState {
        settings,
        handle: HandlerHandle(handle),
        dbghelp,
    });
    Ok(())
}

fn remove() -> Result<()> {
    let mut state = lock_state();

    let Some(current) = state.take() else {
        debug!("crash-dump handler not installed; nothing to remove");
        return Ok(());
    };

    // SAFETY: the cookie came from AddVectoredExceptionHandler and has not
    // been removed yet; `state.take()` guarantees it is removed only once.
    let removed = unsafe { RemoveVectoredExceptionHandler(current.handle.0.as_ptr()) };
    if removed == 0 {
        let err = last_error("RemoveVectoredExceptionHandler");
        // Keep dbghelp alive: the handler may still run.
        *state = Some(current);
        return Err(err);
    }

    info!("crash-dump handler removed");
    // `current` drops here, unloading dbghelp.dll after the handler is gone.
    Ok(())
}

// ── Error helpers ─────────────────────────────────────────────────────────────

/// Capture the current Win32 last-error code and wrap it in a `WinDumpError`.
///
/// Call immediately after a Win32 function that signals failure; `GetLastError`
/// reads thread-local state that can be overwritten by any subsequent API call.
fn last_error(function: &'static str) -> WinDumpError {
    // SAFETY: GetLastError reads thread-local state set by the last Win32 call.
    // It is always safe to call and never fails.
    let code = unsafe { GetLastError() };
    WinDumpError::Win32 {
        function,
        code: code.0,
    }
}

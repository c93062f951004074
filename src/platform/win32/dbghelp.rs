// ── dbghelp.dll binding ───────────────────────────────────────────────────────
//
// `MiniDumpWriteDump` is resolved at runtime rather than linked, so a missing
// or outdated dbghelp.dll surfaces as a `Load` error from `init` instead of a
// loader failure at process start.  The library stays loaded until `deinit`.

#![allow(unsafe_code)]

use std::{ffi::c_void, fs::File, os::windows::io::AsRawHandle, ptr};

use windows::{
    core::{s, w},
    Win32::{
        Foundation::{FreeLibrary, GetLastError, BOOL, HANDLE, HMODULE},
        System::{
            Diagnostics::Debug::{EXCEPTION_POINTERS, MINIDUMP_EXCEPTION_INFORMATION, MINIDUMP_TYPE},
            LibraryLoader::{GetProcAddress, LoadLibraryW},
            Threading::{GetCurrentProcess, GetCurrentProcessId, GetCurrentThreadId},
        },
    },
};

use crate::{
    config::DumpKind,
    error::{Result, WinDumpError},
};

use super::last_error;

const MODULE_NAME: &str = "dbghelp.dll";

/// Signature of `MiniDumpWriteDump`.  The user-stream and callback
/// parameters are always null here, so they are typed as opaque pointers.
type MiniDumpWriteDumpFn = unsafe extern "system" fn(
    process: HANDLE,
    process_id: u32,
    file: HANDLE,
    dump_type: MINIDUMP_TYPE,
    exception_param: *const MINIDUMP_EXCEPTION_INFORMATION,
    user_stream_param: *const c_void,
    callback_param: *const c_void,
) -> BOOL;

/// A loaded dbghelp.dll and its resolved `MiniDumpWriteDump`.
pub(crate) struct DbgHelp {
    module: HMODULE,
    write_dump: MiniDumpWriteDumpFn,
}

// SAFETY: an HMODULE is a process-wide base address, valid on any thread
// until FreeLibrary; the function pointer is plain code.
unsafe impl Send for DbgHelp {}

impl DbgHelp {
    pub(crate) fn load() -> Result<Self> {
        // SAFETY: w!() yields a valid null-terminated UTF-16 literal.
        let module = unsafe { LoadLibraryW(w!("dbghelp.dll")) }.map_err(loader_error)?;

        // SAFETY: module was just loaded; s!() is a null-terminated ANSI literal.
        let Some(export) = (unsafe { GetProcAddress(module, s!("MiniDumpWriteDump")) }) else {
            // Read before FreeLibrary overwrites it.
            // SAFETY: GetLastError has no preconditions.
            let code = unsafe { GetLastError() }.0;
            // SAFETY: module came from LoadLibraryW above and is not used again.
            let _ = unsafe { FreeLibrary(module) };
            return Err(WinDumpError::Load {
                module: MODULE_NAME,
                detail: "MiniDumpWriteDump is not exported (wrong version of dbghelp.dll)"
                    .to_owned(),
                code: Some(code),
            });
        };

        // SAFETY: the export named MiniDumpWriteDump has exactly the
        // documented signature that MiniDumpWriteDumpFn spells out.
        let write_dump = unsafe {
            std::mem::transmute::<unsafe extern "system" fn() -> isize, MiniDumpWriteDumpFn>(export)
        };

        Ok(Self { module, write_dump })
    }

    /// Write a minidump of the current process into `file`.
    ///
    /// `exception` is the pointer the vectored handler received, so the dump
    /// records the faulting thread's context.  Null writes a plain snapshot.
    pub(crate) fn write(
        &self,
        file: &File,
        kind: DumpKind,
        exception: *mut EXCEPTION_POINTERS,
    ) -> Result<()> {
        // SAFETY: GetCurrentThreadId has no preconditions.
        let thread_id = unsafe { GetCurrentThreadId() };
        let info = MINIDUMP_EXCEPTION_INFORMATION {
            ThreadId: thread_id,
            ExceptionPointers: exception,
            ClientPointers: BOOL(0),
        };
        let exception_param: *const MINIDUMP_EXCEPTION_INFORMATION = if exception.is_null() {
            ptr::null()
        } else {
            &info
        };

        // SAFETY: write_dump was resolved from a loaded dbghelp.dll that
        // outlives self.  The file handle is borrowed from an open `File`
        // kept alive for the call; `info` lives on this stack frame and the
        // exception pointers belong to the handler frame that called us.
        // Null user-stream and callback parameters are documented as valid.
        let ok = unsafe {
            (self.write_dump)(
                GetCurrentProcess(),
                GetCurrentProcessId(),
                HANDLE(file.as_raw_handle()),
                MINIDUMP_TYPE(kind.flags() as i32),
                exception_param,
                ptr::null(),
                ptr::null(),
            )
        };

        if ok.as_bool() {
            Ok(())
        } else {
            Err(last_error("MiniDumpWriteDump"))
        }
    }
}

/// Keep the loader's HRESULT next to its message.
fn loader_error(e: windows::core::Error) -> WinDumpError {
    WinDumpError::Load {
        module: MODULE_NAME,
        detail: e.message().to_string(),
        code: Some(e.code().0 as u32),
    }
}

impl Drop for DbgHelp {
    fn drop(&mut self) {
        // SAFETY: module came from LoadLibraryW and is freed exactly once,
        // here.  Failure only leaks a reference count.
        let _ = unsafe { FreeLibrary(self.module) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_dbghelp_exports_minidump_writer() {
        DbgHelp::load().expect("dbghelp.dll ships with every supported Windows");
    }

    #[test]
    fn loader_failure_keeps_its_hresult() {
        // HRESULT_FROM_WIN32(ERROR_MOD_NOT_FOUND)
        let hr = windows::core::HRESULT(0x8007_007e_u32 as i32);
        let err = loader_error(windows::core::Error::from(hr));
        match err {
            WinDumpError::Load { module, code, .. } => {
                assert_eq!(module, "dbghelp.dll");
                assert_eq!(code, Some(0x8007_007e));
            }
            other => panic!("expected a load error, got {other:?}"),
        }
    }

    #[test]
    fn writes_a_dump_without_exception_context() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("manual.dmp");
        let file = File::create(&path).expect("create");

        let dbghelp = DbgHelp::load().expect("load");
        dbghelp
            .write(&file, DumpKind::Normal, ptr::null_mut())
            .expect("MiniDumpWriteDump");
        drop(file);

        let bytes = std::fs::read(&path).expect("read");
        // Every minidump starts with the 'MDMP' signature.
        assert_eq!(&bytes[..4], b"MDMP");
    }
}

// ── Dump options ──────────────────────────────────────────────────────────────
//
// What `init` needs to know: where the dump goes, how much of the process it
// captures, and which exception codes never trigger one.  Options are built
// in code or read from a JSON document.
// No `unsafe`: pure safe Rust + serde_json.

use std::{
    ffi::OsString,
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WinDumpError};

// ── Dump kind ─────────────────────────────────────────────────────────────────

/// How much of the process a minidump captures.
///
/// Each variant maps onto one `MINIDUMP_TYPE` flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DumpKind {
    /// Stacks and module list only (`MiniDumpNormal`).
    #[default]
    Normal,
    /// Adds the data sections of loaded modules (`MiniDumpWithDataSegs`).
    WithDataSegs,
    /// The whole accessible address space (`MiniDumpWithFullMemory`).
    WithFullMemory,
    /// Adds the handle table (`MiniDumpWithHandleData`).
    WithHandleData,
    /// Adds per-thread timing and state (`MiniDumpWithThreadInfo`).
    WithThreadInfo,
}

impl DumpKind {
    /// The `MINIDUMP_TYPE` bits passed to `MiniDumpWriteDump`.
    pub fn flags(self) -> u32 {
        match self {
            Self::Normal => 0x0000_0000,
            Self::WithDataSegs => 0x0000_0001,
            Self::WithFullMemory => 0x0000_0002,
            Self::WithHandleData => 0x0000_0004,
            Self::WithThreadInfo => 0x0000_1000,
        }
    }

    /// The label used in JSON and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::WithDataSegs => "with_data_segs",
            Self::WithFullMemory => "with_full_memory",
            Self::WithHandleData => "with_handle_data",
            Self::WithThreadInfo => "with_thread_info",
        }
    }
}

impl fmt::Display for DumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DumpKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        // Accept the CLI spelling with dashes as well.
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "normal" => Ok(Self::Normal),
            "with_data_segs" => Ok(Self::WithDataSegs),
            "with_full_memory" => Ok(Self::WithFullMemory),
            "with_handle_data" => Ok(Self::WithHandleData),
            "with_thread_info" => Ok(Self::WithThreadInfo),
            other => Err(format!("unknown dump kind {other:?}")),
        }
    }
}

// ── Options ───────────────────────────────────────────────────────────────────

/// Everything the native capture needs from its caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpOptions {
    /// Where the minidump is written.  Overwritten on every capture.
    pub dump_path: PathBuf,
    #[serde(default)]
    pub kind: DumpKind,
    /// Exception codes to skip on top of the built-in benign list.
    #[serde(default)]
    pub ignored_codes: Vec<u32>,
}

impl DumpOptions {
    pub fn new(dump_path: impl Into<PathBuf>) -> Self {
        Self {
            dump_path: dump_path.into(),
            kind: DumpKind::default(),
            ignored_codes: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: DumpKind) -> Self {
        self.kind = kind;
        self
    }

    /// Never capture a dump for `code`.
    pub fn ignoring(mut self, code: u32) -> Self {
        if !self.ignored_codes.contains(&code) {
            self.ignored_codes.push(code);
        }
        self
    }

    /// The crash log sits next to the dump: `crash.dmp` → `crash.dmp.log`.
    pub fn log_path(&self) -> PathBuf {
        let mut s = OsString::from(self.dump_path.as_os_str());
        s.push(".log");
        PathBuf::from(s)
    }

    /// Reject options the native capture cannot act on.
    pub fn validate(&self) -> Result<()> {
        if self.dump_path.as_os_str().is_empty() {
            return Err(WinDumpError::InvalidOptions(
                "dump_path must not be empty".to_owned(),
            ));
        }
        if self.dump_path.file_name().is_none() {
            return Err(WinDumpError::InvalidOptions(format!(
                "dump_path {} does not name a file",
                self.dump_path.display()
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON options document.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Read a JSON options file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Self::from_json(&data)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_path_appends_suffix_to_full_name() {
        let opts = DumpOptions::new("crashes/app.dmp");
        assert_eq!(opts.log_path(), PathBuf::from("crashes/app.dmp.log"));
    }

    #[test]
    fn optional_fields_default_when_absent() {
        let opts = DumpOptions::from_json(r#"{"dump_path":"app.dmp"}"#).expect("parse");
        assert_eq!(opts.dump_path, PathBuf::from("app.dmp"));
        assert_eq!(opts.kind, DumpKind::Normal);
        assert!(opts.ignored_codes.is_empty());
    }

    #[test]
    fn kind_and_codes_parse_from_json() {
        let json = r#"{"dump_path":"a.dmp","kind":"with_full_memory","ignored_codes":[3221225477]}"#;
        let opts = DumpOptions::from_json(json).expect("parse");
        assert_eq!(opts.kind, DumpKind::WithFullMemory);
        assert_eq!(opts.ignored_codes, vec![0xC000_0005]);
    }

    #[test]
    fn missing_dump_path_is_a_config_error() {
        let err = DumpOptions::from_json(r#"{"kind":"normal"}"#).unwrap_err();
        assert!(matches!(err, WinDumpError::Config(_)));
    }

    #[test]
    fn empty_dump_path_is_rejected() {
        let err = DumpOptions::from_json(r#"{"dump_path":""}"#).unwrap_err();
        assert!(matches!(err, WinDumpError::InvalidOptions(_)));
    }

    #[test]
    fn ignoring_does_not_duplicate() {
        let opts = DumpOptions::new("a.dmp").ignoring(7).ignoring(7).ignoring(9);
        assert_eq!(opts.ignored_codes, vec![7, 9]);
    }

    #[test]
    fn kind_flags_match_minidump_type() {
        assert_eq!(DumpKind::Normal.flags(), 0);
        assert_eq!(DumpKind::WithDataSegs.flags(), 1);
        assert_eq!(DumpKind::WithFullMemory.flags(), 2);
        assert_eq!(DumpKind::WithHandleData.flags(), 4);
        assert_eq!(DumpKind::WithThreadInfo.flags(), 0x1000);
    }

    #[test]
    fn kind_parses_cli_spelling() {
        assert_eq!("with-full-memory".parse::<DumpKind>(), Ok(DumpKind::WithFullMemory));
        assert_eq!(" Normal ".parse::<DumpKind>(), Ok(DumpKind::Normal));
        assert!("everything".parse::<DumpKind>().is_err());
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("windump.json");
        fs::write(&path, r#"{"dump_path":"x.dmp","kind":"with_handle_data"}"#).expect("write");

        let opts = DumpOptions::load(&path).expect("load");
        assert_eq!(opts.kind, DumpKind::WithHandleData);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = DumpOptions::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, WinDumpError::Io(_)));
    }
}

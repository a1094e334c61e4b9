//! Legacy Word 97-2003 (.doc) → .docx conversion
//!
//! Conversion needs an external office process, so it sits behind the
//! [`DocumentConverter`] trait. The rest of the pipeline only ever sees the
//! path of the converted sibling file.
//!
//! Supported tools:
//! - LibreOffice: `soffice --headless --convert-to docx --outdir <dir> <file>`
//! - macOS: `textutil -convert docx <file> -output <file>.docx`

use crate::error::{LedgerError, LedgerResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

/// Extension of the legacy binary format
pub const LEGACY_EXTENSION: &str = "doc";

/// Extension of the packaged (OOXML) format
pub const MODERN_EXTENSION: &str = "docx";

/// OLE2 compound file signature every .doc starts with
const CFB_MAGIC_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Converts a legacy document into a sibling `.docx` file.
///
/// Implementations must leave `source` untouched and return the path of a
/// newly created file; the caller deletes it once it has been read.
pub trait DocumentConverter {
    fn convert(&self, source: &Path) -> LedgerResult<PathBuf>;
}

/// True if the path has the legacy `.doc` extension (case-insensitive)
pub fn is_legacy_document(path: &Path) -> bool {
    has_extension(path, LEGACY_EXTENSION)
}

pub(crate) fn has_extension(path: &Path, wanted: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(wanted))
        .unwrap_or(false)
}

/// Sibling path with the `.docx` extension
pub fn converted_path(source: &Path) -> PathBuf {
    source.with_extension(MODERN_EXTENSION)
}

/// External conversion tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfficeTool {
    /// LibreOffice in headless mode
    Soffice,
    /// macOS built-in text converter
    Textutil,
}

/// Converter backed by an external office program
#[derive(Debug, Clone)]
pub struct OfficeConverter {
    tool: OfficeTool,
    program: PathBuf,
}

impl OfficeConverter {
    /// LibreOffice converter; `program` is usually just `soffice`
    pub fn soffice<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            tool: OfficeTool::Soffice,
            program: program.into(),
        }
    }

    /// macOS textutil converter
    pub fn textutil() -> Self {
        Self {
            tool: OfficeTool::Textutil,
            program: PathBuf::from("/usr/bin/textutil"),
        }
    }

    /// Override the program path
    pub fn with_program<P: Into<PathBuf>>(mut self, program: P) -> Self {
        self.program = program.into();
        self
    }

    fn command(&self, source: &Path, target: &Path) -> Command {
        let mut command = Command::new(&self.program);
        match self.tool {
            OfficeTool::Soffice => {
                let outdir = target.parent().unwrap_or_else(|| Path::new("."));
                command
                    .arg("--headless")
                    .arg("--convert-to")
                    .arg(MODERN_EXTENSION)
                    .arg("--outdir")
                    .arg(outdir)
                    .arg(source);
            }
            OfficeTool::Textutil => {
                command
                    .arg("-convert")
                    .arg(MODERN_EXTENSION)
                    .arg(source)
                    .arg("-output")
                    .arg(target);
            }
        }
        command
    }
}

impl DocumentConverter for OfficeConverter {
    fn convert(&self, source: &Path) -> LedgerResult<PathBuf> {
        let fail = |reason: String| LedgerError::Conversion {
            path: source.to_path_buf(),
            reason,
        };

        verify_cfb_signature(source).map_err(fail)?;

        let target = converted_path(source);
        if target.exists() {
            return Err(fail(format!(
                "'{}' already exists and would be overwritten",
                target.display()
            )));
        }

        info!("Converting \"{}\" to docx format...", source.display());
        let mut command = self.command(source, &target);
        debug!("Running {:?}", command);

        // Whatever the program leaves behind is removed unless conversion succeeds
        let guard = ConvertedDocument::new(target.clone());
        let output = command
            .output()
            .map_err(|e| fail(format!("failed to run {}: {}", self.program.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(fail(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        match fs::metadata(&target) {
            Ok(metadata) if metadata.len() > 0 => Ok(guard.keep()),
            Ok(_) => Err(fail("converter produced an empty file".to_string())),
            Err(_) => Err(fail(format!(
                "converter did not produce '{}'",
                target.display()
            ))),
        }
    }
}

/// Converter for setups that only keep .docx contracts
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledConverter;

impl DocumentConverter for DisabledConverter {
    fn convert(&self, source: &Path) -> LedgerResult<PathBuf> {
        Err(LedgerError::Conversion {
            path: source.to_path_buf(),
            reason: "legacy .doc conversion is disabled in the configuration".to_string(),
        })
    }
}

/// Check the OLE2/CFB signature so a mislabeled file fails before spawning a process
fn verify_cfb_signature(path: &Path) -> Result<(), String> {
    let bytes = fs::read(path).map_err(|e| format!("failed to read file: {}", e))?;

    if bytes.len() < CFB_MAGIC_SIGNATURE.len() {
        return Err("file too small to be a valid .doc file".to_string());
    }

    if bytes[..CFB_MAGIC_SIGNATURE.len()] != CFB_MAGIC_SIGNATURE {
        return Err("not a Word 97-2003 document (missing OLE2 signature)".to_string());
    }

    Ok(())
}

/// A converted `.docx` that is deleted when dropped
#[derive(Debug)]
pub struct ConvertedDocument {
    path: PathBuf,
    kept: bool,
}

impl ConvertedDocument {
    pub fn new(path: PathBuf) -> Self {
        Self { path, kept: false }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the file without deleting it
    pub fn keep(mut self) -> PathBuf {
        self.kept = true;
        std::mem::take(&mut self.path)
    }
}

impl Drop for ConvertedDocument {
    fn drop(&mut self) {
        if self.kept {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed converted file \"{}\"", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove converted file \"{}\": {}",
                self.path.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_legacy_extension_is_case_insensitive() {
        assert!(is_legacy_document(Path::new("dp1（A）.doc")));
        assert!(is_legacy_document(Path::new("dp1（A）.DOC")));
        assert!(!is_legacy_document(Path::new("dp1（A）.docx")));
        assert!(!is_legacy_document(Path::new("dp1（A）")));
    }

    #[test]
    fn test_converted_path_is_sibling() {
        assert_eq!(
            converted_path(Path::new("/in/dp1（A）.doc")),
            PathBuf::from("/in/dp1（A）.docx")
        );
    }

    #[test]
    fn test_verify_cfb_signature() {
        let mut valid = NamedTempFile::new().unwrap();
        valid.write_all(&CFB_MAGIC_SIGNATURE).unwrap();
        valid.write_all(&[0u8; 64]).unwrap();
        assert!(verify_cfb_signature(valid.path()).is_ok());

        let mut invalid = NamedTempFile::new().unwrap();
        invalid.write_all(b"PK\x03\x04 not a doc").unwrap();
        assert!(verify_cfb_signature(invalid.path())
            .unwrap_err()
            .contains("OLE2"));

        let mut short = NamedTempFile::new().unwrap();
        short.write_all(&CFB_MAGIC_SIGNATURE[..3]).unwrap();
        assert!(verify_cfb_signature(short.path())
            .unwrap_err()
            .contains("too small"));
    }

    #[test]
    fn test_office_converter_rejects_non_doc_content() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("dp1（A）.doc");
        fs::write(&source, b"plain text").unwrap();

        let err = OfficeConverter::soffice("soffice").convert(&source).unwrap_err();
        assert!(matches!(err, LedgerError::Conversion { .. }));
        assert!(!converted_path(&source).exists());
    }

    #[test]
    fn test_office_converter_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let source = legacy_source(dir.path());
        fs::write(converted_path(&source), b"operator's file").unwrap();

        let err = OfficeConverter::soffice("soffice").convert(&source).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(fs::read(converted_path(&source)).unwrap(), b"operator's file");
    }

    #[test]
    fn test_missing_program_is_conversion_error() {
        let dir = TempDir::new().unwrap();
        let source = legacy_source(dir.path());

        let converter = OfficeConverter::soffice(dir.path().join("no-such-soffice"));
        let err = converter.convert(&source).unwrap_err();
        assert!(err.to_string().contains("failed to run"));
    }

    #[test]
    fn test_disabled_converter_always_fails() {
        let err = DisabledConverter.convert(Path::new("dp1（A）.doc")).unwrap_err();
        assert_eq!(err.kind(), "ConversionError");
    }

    /// Legacy source with a valid OLE2 header
    fn legacy_source(dir: &Path) -> PathBuf {
        let source = dir.join("dp1（A）.doc");
        let mut bytes = CFB_MAGIC_SIGNATURE.to_vec();
        bytes.extend_from_slice(&[0u8; 64]);
        fs::write(&source, bytes).unwrap();
        source
    }

    /// Stand-in for soffice: writes `<outdir>/<stem>.docx` with `body`, then exits with `code`
    #[cfg(unix)]
    fn fake_soffice(dir: &Path, body: &str, code: i32) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("fake-soffice");
        fs::write(
            &script,
            format!(
                "#!/bin/sh\n\
                 # --headless --convert-to docx --outdir <dir> <file>\n\
                 name=$(basename \"$6\" .doc)\n\
                 printf '{}' > \"$5/$name.docx\"\n\
                 exit {}\n",
                body, code
            ),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_conversion_removes_partial_output() {
        let dir = TempDir::new().unwrap();
        let source = legacy_source(dir.path());
        let converter = OfficeConverter::soffice(fake_soffice(dir.path(), "partial", 1));

        let err = converter.convert(&source).unwrap_err();
        assert!(matches!(err, LedgerError::Conversion { .. }));
        assert!(err.to_string().contains("exited with"));
        assert!(!converted_path(&source).exists());
        assert!(source.is_file());

        // A retry runs the converter again instead of tripping over a leftover file
        let err = converter.convert(&source).unwrap_err();
        assert!(err.to_string().contains("exited with"));
        assert!(!err.to_string().contains("already exists"));
    }

    #[cfg(unix)]
    #[test]
    fn test_empty_conversion_output_is_removed() {
        let dir = TempDir::new().unwrap();
        let source = legacy_source(dir.path());
        let converter = OfficeConverter::soffice(fake_soffice(dir.path(), "", 0));

        let err = converter.convert(&source).unwrap_err();
        assert!(err.to_string().contains("empty file"));
        assert!(!converted_path(&source).exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_conversion_keeps_output() {
        let dir = TempDir::new().unwrap();
        let source = legacy_source(dir.path());
        let converter = OfficeConverter::soffice(fake_soffice(dir.path(), "PK", 0));

        let converted = converter.convert(&source).unwrap();
        assert_eq!(converted, converted_path(&source));
        assert_eq!(fs::read(&converted).unwrap(), b"PK");
    }

    #[test]
    fn test_kept_document_survives_drop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.docx");
        fs::write(&path, b"zip").unwrap();

        let kept = ConvertedDocument::new(path.clone()).keep();
        assert_eq!(kept, path);
        assert!(path.exists());
    }

    #[test]
    fn test_converted_document_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.docx");
        fs::write(&path, b"zip").unwrap();
        {
            let converted = ConvertedDocument::new(path.clone());
            assert!(converted.path().exists());
        }
        assert!(!path.exists());
    }
}

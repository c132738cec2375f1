//! Audit log file: the engine's entries plus SHA-256 fingerprints of the
//! input and output files.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::info;

use creddedupe_engine::{AuditEntry, AuditReport};

use crate::error::IoError;

/// Hex SHA-256 of the whole file.
pub fn sha256_file(path: &Path) -> Result<String, IoError> {
    let read_err = |source| IoError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(read_err)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf).map_err(read_err)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Assemble the report for a finished run. Both files must exist.
pub fn build_audit_report(entries: Vec<AuditEntry>, input: &Path, output: &Path) -> Result<AuditReport, IoError> {
    Ok(AuditReport {
        entries,
        original_file: input.display().to_string(),
        original_hash_sha256: sha256_file(input)?,
        output_file: output.display().to_string(),
        output_hash_sha256: sha256_file(output)?,
    })
}

pub fn write_audit_report(path: &Path, report: &AuditReport) -> Result<(), IoError> {
    let json = report.to_json()?;
    fs::write(path, json).map_err(|source| IoError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), entries = report.entries.len(), "wrote audit log");
    Ok(())
}

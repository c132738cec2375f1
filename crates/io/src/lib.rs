// File I/O operations

pub mod audit_file;
pub mod csv;
pub mod error;
pub mod providers;

pub use crate::audit_file::{build_audit_report, sha256_file, write_audit_report};
pub use crate::csv::{import_records, read_csv, write_records, CsvTable};
pub use crate::error::IoError;
pub use crate::providers::builtin_registry;

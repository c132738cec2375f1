//! `creddedupe-engine`: credential deduplication engine.
//!
//! Pure engine crate: receives imported records, returns kept / removed /
//! merged sets and an audit trail. No CLI or file IO dependencies.

pub mod audit;
pub mod config;
pub mod dedupe;
pub mod detect;
pub mod engine;
pub mod error;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod reconcile;
pub mod review;

pub use audit::{AuditAction, AuditEntry, AuditLog, AuditReport};
pub use config::DedupeOptions;
pub use dedupe::{dedupe_records, DedupeResult};
pub use detect::{choose_provider, detect_format, Detection, ProviderChoice};
pub use engine::{run, Resolution, RunOutput};
pub use error::{EngineError, MergeError};
pub use merge::{FieldChoice, FieldDecisions, MergeDecision, MergeField, MergeOutcome};
pub use model::{assign_ids, Record, RecordId, RecordKind};
pub use provider::{HeaderSchema, ProviderAdapter, ProviderFormat, ProviderRegistry, Row};
pub use reconcile::{reconcile, DedupeSummary};

use creddedupe_engine::provider::{row_opt, row_value};
use creddedupe_engine::{HeaderSchema, ProviderAdapter, ProviderFormat, Record, Row};

use super::{extra_cell, opt_cell, sourced, unmapped};

const REQUIRED: &[&str] = &["url", "username", "password"];
const OPTIONAL: &[&str] = &[
    "httpRealm",
    "formActionOrigin",
    "guid",
    "timeCreated",
    "timeLastUsed",
    "timePasswordChanged",
];
const COLUMNS: &[&str] = &[
    "url",
    "username",
    "password",
    "httpRealm",
    "formActionOrigin",
    "guid",
    "timeCreated",
    "timeLastUsed",
    "timePasswordChanged",
];
const MAPPED: &[&str] = &["url", "username", "password", "guid", "timeCreated", "timePasswordChanged"];

/// Firefox `about:logins` export. Times are epoch milliseconds.
pub struct FirefoxAdapter;

fn millis(row: &Row, key: &str) -> Option<i64> {
    row_value(row, key).trim().parse().ok()
}

impl ProviderAdapter for FirefoxAdapter {
    fn format(&self) -> ProviderFormat {
        ProviderFormat::Firefox
    }

    fn header_schema(&self) -> HeaderSchema {
        HeaderSchema {
            required: REQUIRED,
            optional: OPTIONAL,
        }
    }

    fn export_columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    fn import_row(&self, row: &Row) -> Record {
        let mut record = Record {
            username: row_value(row, "username").to_string(),
            password: row_value(row, "password").to_string(),
            primary_site: row_opt(row, "url"),
            created_at: millis(row, "timeCreated"),
            updated_at: millis(row, "timePasswordChanged"),
            extra: unmapped(row, MAPPED),
            ..sourced(self.format())
        };
        record.provenance.source_id = row_opt(row, "guid");
        record
    }

    fn export_row(&self, record: &Record) -> Row {
        let last_used = extra_cell(record, "timeLastUsed");
        Row::from([
            ("url".into(), opt_cell(&record.primary_site)),
            ("username".into(), record.username.clone()),
            ("password".into(), record.password.clone()),
            ("httpRealm".into(), extra_cell(record, "httpRealm")),
            ("formActionOrigin".into(), extra_cell(record, "formActionOrigin")),
            ("guid".into(), opt_cell(&record.provenance.source_id)),
            ("timeCreated".into(), record.created_at.unwrap_or(0).to_string()),
            ("timeLastUsed".into(), if last_used.is_empty() { "0".into() } else { last_used }),
            ("timePasswordChanged".into(), record.updated_at.unwrap_or(0).to_string()),
        ])
    }
}

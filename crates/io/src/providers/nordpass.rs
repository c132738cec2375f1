use creddedupe_engine::provider::{row_opt, row_value};
use creddedupe_engine::{HeaderSchema, ProviderAdapter, ProviderFormat, Record, RecordKind, Row};

use super::{extra_cell, opt_cell, sourced, unmapped};

const REQUIRED: &[&str] = &["name", "url", "username", "password"];
const OPTIONAL: &[&str] = &[
    "note",
    "cardholdername",
    "cardnumber",
    "cvc",
    "expirydate",
    "zipcode",
    "folder",
    "full_name",
    "phone_number",
    "email",
    "address1",
    "address2",
    "city",
    "country",
    "state",
];
const COLUMNS: &[&str] = &[
    "name",
    "url",
    "username",
    "password",
    "note",
    "cardholdername",
    "cardnumber",
    "cvc",
    "expirydate",
    "zipcode",
    "folder",
    "full_name",
    "phone_number",
    "email",
    "address1",
    "address2",
    "city",
    "country",
    "state",
];
const MAPPED: &[&str] = &["name", "url", "username", "password", "note", "folder"];

const CARD_MARKERS: &[&str] = &["cardnumber", "cardholdername"];
const IDENTITY_MARKERS: &[&str] = &["full_name", "address1", "city"];

/// NordPass CSV template. Card and identity columns share the login row
/// layout; everything beyond the login fields lives in `extra` under the
/// column's own name.
pub struct NordpassAdapter;

fn has_any(row: &Row, keys: &[&str]) -> bool {
    keys.iter().any(|k| !row_value(row, k).trim().is_empty())
}

impl ProviderAdapter for NordpassAdapter {
    fn format(&self) -> ProviderFormat {
        ProviderFormat::Nordpass
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
        let kind = if has_any(row, CARD_MARKERS) {
            RecordKind::Card
        } else if has_any(row, IDENTITY_MARKERS) {
            RecordKind::Identity
        } else {
            RecordKind::Login
        };

        Record {
            kind,
            title: row_value(row, "name").to_string(),
            username: row_value(row, "username").to_string(),
            password: row_value(row, "password").to_string(),
            primary_site: row_opt(row, "url"),
            notes: row_value(row, "note").to_string(),
            folder: row_opt(row, "folder"),
            extra: unmapped(row, MAPPED),
            ..sourced(self.format())
        }
    }

    fn export_row(&self, record: &Record) -> Row {
        COLUMNS
            .iter()
            .map(|&col| {
                let value = match col {
                    "name" => record.title.clone(),
                    "url" => opt_cell(&record.primary_site),
                    "username" => record.username.clone(),
                    "password" => record.password.clone(),
                    "note" => record.notes.clone(),
                    "folder" => opt_cell(&record.folder),
                    other => extra_cell(record, other),
                };
                (col.to_string(), value)
            })
            .collect()
    }
}

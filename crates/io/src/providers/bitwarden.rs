use creddedupe_engine::provider::{row_opt, row_value};
use creddedupe_engine::{HeaderSchema, ProviderAdapter, ProviderFormat, Record, RecordKind, Row};

use super::{extra_cell, flag, flag_cell, opt_cell, otp_cell, sourced, split_otp, unmapped};

const REQUIRED: &[&str] = &["type", "name"];
const OPTIONAL: &[&str] = &[
    "folder",
    "favorite",
    "notes",
    "fields",
    "reprompt",
    "login_uri",
    "login_username",
    "login_password",
    "login_totp",
];
const COLUMNS: &[&str] = &[
    "folder",
    "favorite",
    "type",
    "name",
    "notes",
    "fields",
    "reprompt",
    "login_uri",
    "login_username",
    "login_password",
    "login_totp",
];

/// Columns carried through untouched in the extension map.
const PASSTHROUGH: &[&str] = &["fields", "reprompt"];

/// Bitwarden's unencrypted CSV export.
pub struct BitwardenAdapter;

fn kind_from_type(raw: &str) -> RecordKind {
    match RecordKind::from_label(raw) {
        RecordKind::Other => RecordKind::Login,
        kind => kind,
    }
}

impl ProviderAdapter for BitwardenAdapter {
    fn format(&self) -> ProviderFormat {
        ProviderFormat::Bitwarden
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
        let (otp_uri, otp_secret) = split_otp(row_value(row, "login_totp"));
        let mut extra = unmapped(row, COLUMNS);
        for key in PASSTHROUGH {
            if let Some(value) = row_opt(row, key) {
                extra.insert(key.to_string(), value);
            }
        }
        Record {
            kind: kind_from_type(row_value(row, "type")),
            title: row_value(row, "name").to_string(),
            username: row_value(row, "login_username").to_string(),
            password: row_value(row, "login_password").to_string(),
            primary_site: row_opt(row, "login_uri"),
            notes: row_value(row, "notes").to_string(),
            folder: row_opt(row, "folder"),
            favorite: flag(row, "favorite"),
            otp_uri,
            otp_secret,
            extra,
            ..sourced(self.format())
        }
    }

    fn export_row(&self, record: &Record) -> Row {
        let kind = match record.kind {
            RecordKind::Other => RecordKind::Login,
            kind => kind,
        };
        Row::from([
            ("folder".into(), opt_cell(&record.folder)),
            ("favorite".into(), flag_cell(record.favorite)),
            ("type".into(), kind.to_string()),
            ("name".into(), record.title.clone()),
            ("notes".into(), record.notes.clone()),
            ("fields".into(), extra_cell(record, "fields")),
            ("reprompt".into(), extra_cell(record, "reprompt")),
            ("login_uri".into(), opt_cell(&record.primary_site)),
            ("login_username".into(), record.username.clone()),
            ("login_password".into(), record.password.clone()),
            ("login_totp".into(), otp_cell(record)),
        ])
    }
}

use creddedupe_engine::provider::{row_opt, row_value};
use creddedupe_engine::{HeaderSchema, ProviderAdapter, ProviderFormat, Record, Row};

use super::{otp_cell, sourced, split_otp, title_or_site, unmapped};

const REQUIRED: &[&str] = &["Title", "URL", "Username", "Password"];
const OPTIONAL: &[&str] = &["Notes", "OTPAuth"];
const COLUMNS: &[&str] = &["Title", "URL", "Username", "Password", "Notes", "OTPAuth"];

/// Apple Passwords / iCloud Keychain export.
pub struct ApplePasswordsAdapter;

impl ProviderAdapter for ApplePasswordsAdapter {
    fn format(&self) -> ProviderFormat {
        ProviderFormat::ApplePasswords
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
        let (otp_uri, otp_secret) = split_otp(row_value(row, "OTPAuth"));
        Record {
            title: row_value(row, "Title").to_string(),
            username: row_value(row, "Username").to_string(),
            password: row_value(row, "Password").to_string(),
            primary_site: row_opt(row, "URL"),
            notes: row_value(row, "Notes").to_string(),
            otp_uri,
            otp_secret,
            extra: unmapped(row, COLUMNS),
            ..sourced(self.format())
        }
    }

    fn export_row(&self, record: &Record) -> Row {
        Row::from([
            ("Title".into(), title_or_site(record)),
            ("URL".into(), record.primary_site.clone().unwrap_or_default()),
            ("Username".into(), record.username.clone()),
            ("Password".into(), record.password.clone()),
            ("Notes".into(), record.notes.clone()),
            ("OTPAuth".into(), otp_cell(record)),
        ])
    }
}

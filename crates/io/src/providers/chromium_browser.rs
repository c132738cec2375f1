use creddedupe_engine::provider::{row_opt, row_value};
use creddedupe_engine::{HeaderSchema, ProviderAdapter, ProviderFormat, Record, Row};

use super::{opt_cell, sourced, title_or_site, unmapped};

const REQUIRED: &[&str] = &["name", "url", "username", "password"];
const OPTIONAL: &[&str] = &["note"];
const COLUMNS: &[&str] = &["name", "url", "username", "password", "note"];

/// Chrome, Edge, Brave and other Chromium-based browser exports.
pub struct ChromiumBrowserAdapter;

impl ProviderAdapter for ChromiumBrowserAdapter {
    fn format(&self) -> ProviderFormat {
        ProviderFormat::ChromiumBrowser
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
        Record {
            title: row_value(row, "name").to_string(),
            username: row_value(row, "username").to_string(),
            password: row_value(row, "password").to_string(),
            primary_site: row_opt(row, "url"),
            notes: row_value(row, "note").to_string(),
            extra: unmapped(row, COLUMNS),
            ..sourced(self.format())
        }
    }

    fn export_row(&self, record: &Record) -> Row {
        Row::from([
            ("name".into(), title_or_site(record)),
            ("url".into(), opt_cell(&record.primary_site)),
            ("username".into(), record.username.clone()),
            ("password".into(), record.password.clone()),
            ("note".into(), record.notes.clone()),
        ])
    }
}

use creddedupe_engine::model::EMAIL_KEY;
use creddedupe_engine::provider::{row_opt, row_value};
use creddedupe_engine::{HeaderSchema, ProviderAdapter, ProviderFormat, Record, RecordKind, Row};

use super::{extra_cell, opt_cell, set_email, sourced, unmapped};

const REQUIRED: &[&str] = &["Type", "Name", "Website URL", "Password"];
const OPTIONAL: &[&str] = &["Username", "Email", "Secondary Login", "Comment", "collections"];
const COLUMNS: &[&str] = &[
    "Type",
    "Name",
    "Website URL",
    "Username",
    "Email",
    "Secondary Login",
    "Password",
    "Comment",
    "collections",
];

pub const SECONDARY_LOGIN_KEY: &str = "dashlane_secondary_login";
pub const COLLECTIONS_KEY: &str = "dashlane_collections";
const TYPE_KEY: &str = "dashlane_type";

pub struct DashlaneAdapter;

impl ProviderAdapter for DashlaneAdapter {
    fn format(&self) -> ProviderFormat {
        ProviderFormat::Dashlane
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
        let raw_type = row_value(row, "Type");
        let kind = if raw_type.trim().to_ascii_lowercase().starts_with("login") {
            RecordKind::Login
        } else {
            RecordKind::Other
        };

        let mut record = Record {
            kind,
            title: row_value(row, "Name").to_string(),
            username: row_value(row, "Username").to_string(),
            password: row_value(row, "Password").to_string(),
            primary_site: row_opt(row, "Website URL"),
            notes: row_value(row, "Comment").to_string(),
            extra: unmapped(row, COLUMNS),
            ..sourced(self.format())
        };
        set_email(&mut record, row_value(row, "Email"));
        for (column, key) in [
            ("Type", TYPE_KEY),
            ("Secondary Login", SECONDARY_LOGIN_KEY),
            ("collections", COLLECTIONS_KEY),
        ] {
            if let Some(value) = row_opt(row, column) {
                record.extra.insert(key.to_string(), value);
            }
        }
        record
    }

    fn export_row(&self, record: &Record) -> Row {
        let kind = record
            .extra
            .get(TYPE_KEY)
            .cloned()
            .unwrap_or_else(|| String::from("Login"));
        Row::from([
            ("Type".into(), kind),
            ("Name".into(), record.title.clone()),
            ("Website URL".into(), opt_cell(&record.primary_site)),
            ("Username".into(), record.username.clone()),
            ("Email".into(), extra_cell(record, EMAIL_KEY)),
            ("Secondary Login".into(), extra_cell(record, SECONDARY_LOGIN_KEY)),
            ("Password".into(), record.password.clone()),
            ("Comment".into(), record.notes.clone()),
            ("collections".into(), extra_cell(record, COLLECTIONS_KEY)),
        ])
    }
}

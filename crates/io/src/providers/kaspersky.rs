use creddedupe_engine::provider::{row_opt, row_value};
use creddedupe_engine::{HeaderSchema, ProviderAdapter, ProviderFormat, Record, Row};

use super::{opt_cell, sourced, title_or_site, unmapped};

const COLUMNS: &[&str] = &["Account", "Login", "Password", "Url"];

pub struct KasperskyAdapter;

impl ProviderAdapter for KasperskyAdapter {
    fn format(&self) -> ProviderFormat {
        ProviderFormat::Kaspersky
    }

    fn header_schema(&self) -> HeaderSchema {
        HeaderSchema {
            required: COLUMNS,
            optional: &[],
        }
    }

    fn export_columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    fn import_row(&self, row: &Row) -> Record {
        Record {
            title: row_value(row, "Account").to_string(),
            username: row_value(row, "Login").to_string(),
            password: row_value(row, "Password").to_string(),
            primary_site: row_opt(row, "Url"),
            extra: unmapped(row, COLUMNS),
            ..sourced(self.format())
        }
    }

    fn export_row(&self, record: &Record) -> Row {
        Row::from([
            ("Account".into(), title_or_site(record)),
            ("Login".into(), record.username.clone()),
            ("Password".into(), record.password.clone()),
            ("Url".into(), opt_cell(&record.primary_site)),
        ])
    }
}

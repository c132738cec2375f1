use creddedupe_engine::provider::{row_opt, row_value};
use creddedupe_engine::{HeaderSchema, ProviderAdapter, ProviderFormat, Record, Row};

use super::{extra_cell, opt_cell, sourced, title_or_site, unmapped};

const REQUIRED: &[&str] = &["Name", "URL", "Login", "Password"];
const OPTIONAL: &[&str] = &["MatchUrl", "Note", "Folder", "RfFieldsV2", "Pwd"];
const COLUMNS: &[&str] = &["Name", "URL", "MatchUrl", "Login", "Password", "Note", "Folder", "RfFieldsV2"];
const MAPPED: &[&str] = &["Name", "URL", "MatchUrl", "Login", "Password", "Pwd", "Note", "Folder", "RfFieldsV2"];

const MATCH_URL_KEY: &str = "roboform_match_url";
const FIELDS_KEY: &str = "roboform_fields_v2";

/// RoboForm login export. Older exports carry the password in `Pwd`.
pub struct RoboformAdapter;

impl ProviderAdapter for RoboformAdapter {
    fn format(&self) -> ProviderFormat {
        ProviderFormat::Roboform
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
        let password = row_opt(row, "Password")
            .or_else(|| row_opt(row, "Pwd"))
            .unwrap_or_default();
        let mut extra = unmapped(row, MAPPED);
        if let Some(value) = row_opt(row, "MatchUrl") {
            extra.insert(MATCH_URL_KEY.into(), value);
        }
        if let Some(value) = row_opt(row, "RfFieldsV2") {
            extra.insert(FIELDS_KEY.into(), value);
        }

        Record {
            title: row_value(row, "Name").to_string(),
            username: row_value(row, "Login").to_string(),
            password,
            primary_site: row_opt(row, "URL"),
            notes: row_value(row, "Note").to_string(),
            folder: row_opt(row, "Folder"),
            extra,
            ..sourced(self.format())
        }
    }

    fn export_row(&self, record: &Record) -> Row {
        Row::from([
            ("Name".into(), title_or_site(record)),
            ("URL".into(), opt_cell(&record.primary_site)),
            ("MatchUrl".into(), extra_cell(record, MATCH_URL_KEY)),
            ("Login".into(), record.username.clone()),
            ("Password".into(), record.password.clone()),
            ("Note".into(), record.notes.clone()),
            ("Folder".into(), opt_cell(&record.folder)),
            ("RfFieldsV2".into(), extra_cell(record, FIELDS_KEY)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_pwd_column_is_read() {
        let row = Row::from([
            ("Name".into(), "Example".into()),
            ("URL".into(), "https://example.com".into()),
            ("Login".into(), "bob".into()),
            ("Pwd".into(), "x".into()),
        ]);
        let r = RoboformAdapter.import_row(&row);
        assert_eq!(r.password, "x");
        assert!(r.extra.is_empty());
        assert_eq!(RoboformAdapter.export_row(&r)["Password"], "x");
    }

    #[test]
    fn round_trip() {
        let original = Row::from([
            ("Name".into(), "Example".into()),
            ("URL".into(), "https://example.com".into()),
            ("MatchUrl".into(), "https://example.com/login".into()),
            ("Login".into(), "bob".into()),
            ("Password".into(), "x".into()),
            ("Note".into(), "n".into()),
            ("Folder".into(), "/Work".into()),
            ("RfFieldsV2".into(), "".into()),
        ]);
        assert_eq!(RoboformAdapter.export_row(&RoboformAdapter.import_row(&original)), original);
    }
}

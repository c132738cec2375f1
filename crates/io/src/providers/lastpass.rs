use creddedupe_engine::provider::{row_opt, row_value};
use creddedupe_engine::{HeaderSchema, ProviderAdapter, ProviderFormat, Record, Row};

use super::{flag, flag_cell, opt_cell, otp_cell, sourced, split_otp, title_or_site, unmapped};

const REQUIRED: &[&str] = &["url", "username", "password"];
const OPTIONAL: &[&str] = &["totp", "extra", "name", "grouping", "fav"];
const COLUMNS: &[&str] = &["url", "username", "password", "totp", "extra", "name", "grouping", "fav"];

pub struct LastpassAdapter;

impl ProviderAdapter for LastpassAdapter {
    fn format(&self) -> ProviderFormat {
        ProviderFormat::Lastpass
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
        let (otp_uri, otp_secret) = split_otp(row_value(row, "totp"));
        Record {
            title: row_value(row, "name").to_string(),
            username: row_value(row, "username").to_string(),
            password: row_value(row, "password").to_string(),
            primary_site: row_opt(row, "url"),
            notes: row_value(row, "extra").to_string(),
            folder: row_opt(row, "grouping"),
            favorite: flag(row, "fav"),
            otp_uri,
            otp_secret,
            extra: unmapped(row, COLUMNS),
            ..sourced(self.format())
        }
    }

    fn export_row(&self, record: &Record) -> Row {
        Row::from([
            ("url".into(), opt_cell(&record.primary_site)),
            ("username".into(), record.username.clone()),
            ("password".into(), record.password.clone()),
            ("totp".into(), otp_cell(record)),
            ("extra".into(), record.notes.clone()),
            ("name".into(), title_or_site(record)),
            ("grouping".into(), opt_cell(&record.folder)),
            ("fav".into(), flag_cell(record.favorite)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_maps_lastpass_columns() {
        let row = Row::from([
            ("url".into(), "https://example.com".into()),
            ("username".into(), "bob".into()),
            ("password".into(), "x".into()),
            ("extra".into(), "secure note".into()),
            ("name".into(), "Example".into()),
            ("grouping".into(), "Work".into()),
            ("fav".into(), "1".into()),
        ]);
        let r = LastpassAdapter.import_row(&row);
        assert_eq!(r.notes, "secure note");
        assert_eq!(r.folder.as_deref(), Some("Work"));
        assert!(r.favorite);
        assert!(r.otp_uri.is_none() && r.otp_secret.is_none());
        assert!(r.extra.is_empty());
    }

    #[test]
    fn export_fills_missing_name_from_url() {
        let record = Record {
            primary_site: Some("https://example.com".into()),
            ..Record::default()
        };
        let row = LastpassAdapter.export_row(&record);
        assert_eq!(row["name"], "https://example.com");
        assert_eq!(row["fav"], "0");
        assert_eq!(row["grouping"], "");
    }
}

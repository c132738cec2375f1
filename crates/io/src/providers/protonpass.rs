use creddedupe_engine::model::EMAIL_KEY;
use creddedupe_engine::provider::{row_opt, row_value};
use creddedupe_engine::{HeaderSchema, ProviderAdapter, ProviderFormat, Record, RecordKind, Row};

use super::{extra_cell, opt_cell, otp_cell, parse_timestamp_ms, set_email, sourced, split_otp, unmapped};

const COLUMNS: &[&str] = &[
    "type", "name", "url", "email", "username", "password", "note", "totp", "createTime", "modifyTime",
    "vault",
];

pub const TYPE_KEY: &str = "proton_type";
pub const VAULT_KEY: &str = "proton_vault";
pub const CREATE_TIME_KEY: &str = "proton_createTime";
pub const MODIFY_TIME_KEY: &str = "proton_modifyTime";

/// Proton Pass CSV export.
pub struct ProtonpassAdapter;

impl ProviderAdapter for ProtonpassAdapter {
    fn format(&self) -> ProviderFormat {
        ProviderFormat::Protonpass
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
        let raw_type = row_value(row, "type");
        let (otp_uri, otp_secret) = split_otp(row_value(row, "totp"));
        let create_time = row_value(row, "createTime");
        let modify_time = row_value(row, "modifyTime");

        let mut record = Record {
            kind: RecordKind::from_label(raw_type),
            title: row_value(row, "name").to_string(),
            username: row_value(row, "username").to_string(),
            password: row_value(row, "password").to_string(),
            primary_site: row_opt(row, "url"),
            notes: row_value(row, "note").to_string(),
            otp_uri,
            otp_secret,
            created_at: parse_timestamp_ms(create_time),
            updated_at: parse_timestamp_ms(modify_time),
            extra: unmapped(row, COLUMNS),
            ..sourced(self.format())
        };
        set_email(&mut record, row_value(row, "email"));
        record.extra.insert(TYPE_KEY.into(), raw_type.to_string());
        record.extra.insert(VAULT_KEY.into(), row_value(row, "vault").to_string());
        record.extra.insert(CREATE_TIME_KEY.into(), create_time.to_string());
        record.extra.insert(MODIFY_TIME_KEY.into(), modify_time.to_string());
        record
    }

    fn export_row(&self, record: &Record) -> Row {
        let stamp = |key: &str, fallback: Option<i64>| {
            record
                .extra
                .get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .or_else(|| fallback.map(|ms| (ms / 1000).to_string()))
                .unwrap_or_default()
        };
        let kind = record
            .extra
            .get(TYPE_KEY)
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| record.kind.to_string());

        Row::from([
            ("type".into(), kind),
            ("name".into(), record.title.clone()),
            ("url".into(), opt_cell(&record.primary_site)),
            ("email".into(), extra_cell(record, EMAIL_KEY)),
            ("username".into(), record.username.clone()),
            ("password".into(), record.password.clone()),
            ("note".into(), record.notes.clone()),
            ("totp".into(), otp_cell(record)),
            ("createTime".into(), stamp(CREATE_TIME_KEY, record.created_at)),
            ("modifyTime".into(), stamp(MODIFY_TIME_KEY, record.updated_at)),
            ("vault".into(), extra_cell(record, VAULT_KEY)),
        ])
    }
}

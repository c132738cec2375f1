//! Text normalization shared by detection and grouping.

use url::Url;

use crate::config::DedupeOptions;
use crate::model::Record;

/// Normalize a CSV header cell for detection: trim, strip surrounding
/// quotes, lowercase, drop a trailing ':'.
pub fn normalize_header(header: &str) -> String {
    let h = header
        .trim()
        .trim_matches('"')
        .trim_matches('\'')
        .to_lowercase();
    match h.strip_suffix(':') {
        Some(stripped) => stripped.trim_end().to_string(),
        None => h,
    }
}

/// Normalize a site reference for grouping and comparison.
///
/// Host is lowercased with a leading `www.` removed, a trailing slash is
/// dropped from the path (bare `/` stays), and the query is retained. The
/// scheme only guides parsing, so `http://` and `https://` forms of a site
/// compare equal. Strings that do not parse as URLs are trimmed and
/// lowercased.
pub fn normalize_site(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let candidate = if trimmed.starts_with("//") {
        format!("https:{trimmed}")
    } else if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let Ok(url) = Url::parse(&candidate) else {
        return trimmed.to_lowercase();
    };
    let Some(host) = url.host_str() else {
        return trimmed.to_lowercase();
    };

    let host = host.to_lowercase();
    let mut out = host.strip_prefix("www.").unwrap_or(&host).to_string();
    if let Some(port) = url.port() {
        out.push(':');
        out.push_str(&port.to_string());
    }

    let path = url.path();
    let path = if path.len() > 1 && path.ends_with('/') {
        &path[..path.len() - 1]
    } else {
        path
    };
    out.push_str(path);

    if let Some(query) = url.query() {
        out.push('?');
        out.push_str(query);
    }
    out
}

/// Lowercased login identity: username, else email when configured, else "".
pub fn login_identity(record: &Record, options: &DedupeOptions) -> String {
    let username = record.username.trim();
    if !username.is_empty() {
        return username.to_lowercase();
    }
    if options.treat_email_as_username {
        if let Some(email) = record.email() {
            return email.to_lowercase();
        }
    }
    String::new()
}

/// Coarse bucket key for candidate duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupingKey {
    pub site: String,
    pub login: String,
}

impl GroupingKey {
    pub fn for_record(record: &Record, options: &DedupeOptions) -> Self {
        Self {
            site: normalize_site(record.primary_site.as_deref().unwrap_or("")),
            login: login_identity(record, options),
        }
    }
}

use serde::Deserialize;

/// Engine options that change how records are grouped.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DedupeOptions {
    /// Fall back to the record's email when the username is empty.
    pub treat_email_as_username: bool,
}

impl Default for DedupeOptions {
    fn default() -> Self {
        Self {
            treat_email_as_username: true,
        }
    }
}

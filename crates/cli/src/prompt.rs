//! Interactive review of near-duplicate groups.
//!
//! Questions go to the writer (stderr in the binary) so stdout stays free for
//! `--json`. Answers are read one line at a time; malformed answers are
//! reported and asked again. End of input skips whatever was being decided.

use std::fmt::Display;
use std::io::{self, BufRead, Write};

use creddedupe_engine::merge::{
    choose_best, parse_bool, parse_entry_index, parse_field_choice, parse_group_action, parse_index_pair,
    GroupAction,
};
use creddedupe_engine::review::{
    diff_flags, format_timestamp, mask_secret, password_matches, preview_notes, VAULT_KEY,
};
use creddedupe_engine::{
    Detection, EngineError, FieldChoice, FieldDecisions, MergeDecision, MergeError, MergeField, ProviderFormat,
    Record,
};

const GROUP_MENU: &str =
    "  1) keep one  2) keep best [default]  3) keep all (different accounts)  4) skip  5) merge two field by field\n  choice: ";

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// One trimmed answer, or `None` at end of input.
    fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Ask until `parse` accepts the answer.
    fn ask_until<T, E: Display>(
        &mut self,
        question: &str,
        mut parse: impl FnMut(&str) -> Result<T, E>,
    ) -> io::Result<Option<T>> {
        loop {
            let Some(answer) = self.ask(question)? else {
                return Ok(None);
            };
            match parse(&answer) {
                Ok(value) => return Ok(Some(value)),
                Err(e) => writeln!(self.output, "  {e}; try again")?,
            }
        }
    }

    /// Show group `group_index` (1-based) and read a decision for it.
    pub fn decide(&mut self, group_index: usize, group: &[Record]) -> io::Result<MergeDecision> {
        let best = choose_best(group);
        self.show_group(group_index, group, best)?;

        let Some(action) = self.ask_until(GROUP_MENU, parse_group_action)? else {
            return Ok(MergeDecision::Skip);
        };
        let decision = match action {
            GroupAction::KeepBest => Some(MergeDecision::KeepBest),
            GroupAction::KeepAll => Some(MergeDecision::KeepAll),
            GroupAction::Skip => Some(MergeDecision::Skip),
            GroupAction::KeepOne => {
                let question = format!("  keep which entry? [1-{}, default {}]: ", group.len(), best + 1);
                self.ask_until(&question, |t| parse_entry_index(t, group.len(), best))?
                    .map(MergeDecision::KeepOne)
            }
            GroupAction::MergeFields => self.merge_two(group)?,
        };
        Ok(decision.unwrap_or(MergeDecision::Skip))
    }

    fn merge_two(&mut self, group: &[Record]) -> io::Result<Option<MergeDecision>> {
        let question = format!("  merge which two entries? [two of 1-{}]: ", group.len());
        let Some((first, second)) = self.ask_until(&question, |t| parse_index_pair(t, group.len()))? else {
            return Ok(None);
        };
        let (a, b) = (&group[first], &group[second]);
        writeln!(
            self.output,
            "  per field: a = entry {}, b = entry {}, s = skip, c:VALUE = custom [default a]",
            first + 1,
            second + 1
        )?;

        let mut fields = FieldDecisions::new();
        for field in MergeField::ALL {
            let question = format!(
                "  {:<10}  a: {}  |  b: {}\n  take: ",
                field.name(),
                field_display(a, field),
                field_display(b, field)
            );
            let choice = self.ask_until(&question, |t| {
                let choice = parse_field_choice(t)?;
                if let (MergeField::Favorite, FieldChoice::Custom(value)) = (field, &choice) {
                    parse_bool(value)?;
                }
                Ok::<_, MergeError>(choice)
            })?;
            let Some(choice) = choice else {
                return Ok(None);
            };
            fields.insert(field, choice);
        }

        Ok(Some(MergeDecision::MergeFields { first, second, fields }))
    }

    fn show_group(&mut self, group_index: usize, group: &[Record], best: usize) -> io::Result<()> {
        let flags = diff_flags(group, best);
        let shared = password_matches(group);
        let site = group
            .first()
            .and_then(|r| r.primary_site.as_deref())
            .unwrap_or("(no site)");

        writeln!(self.output)?;
        writeln!(self.output, "Near-duplicate group {group_index}: {} entries for {site}", group.len())?;
        for (pos, record) in group.iter().enumerate() {
            let marker = if pos == best { "  <- recommended" } else { "" };
            writeln!(self.output, "  [{}] {}{marker}", pos + 1, or_empty(&record.title))?;
            writeln!(self.output, "      username: {}", or_empty(&record.username))?;
            if let Some(email) = record.email() {
                writeln!(self.output, "      email:    {email}")?;
            }
            writeln!(self.output, "      password: {}", mask_secret(&record.password))?;
            if let Some(others) = shared.get(pos).filter(|o| !o.is_empty()) {
                let others: Vec<String> = others.iter().map(|p| (p + 1).to_string()).collect();
                writeln!(self.output, "      same password as: {}", others.join(", "))?;
            }
            if let Some(folder) = &record.folder {
                writeln!(self.output, "      folder:   {folder}")?;
            }
            if let Some(vault) = record.extra.get(VAULT_KEY).filter(|v| !v.is_empty()) {
                writeln!(self.output, "      vault:    {vault}")?;
            }
            let otp = if record.otp_uri.is_some() || record.otp_secret.is_some() { "yes" } else { "no" };
            writeln!(self.output, "      otp:      {otp}")?;
            writeln!(self.output, "      changed:  {}", format_timestamp(Some(record.last_touched())))?;
            writeln!(self.output, "      notes:    {}", preview_notes(&record.notes))?;
            if let Some(labels) = flags.get(pos) {
                writeln!(self.output, "      differs:  {}", labels.join(", "))?;
            }
        }
        Ok(())
    }

    /// Offer a low-confidence guess. `None` when the user declines.
    pub fn confirm_format(&mut self, detection: &Detection) -> io::Result<Option<ProviderFormat>> {
        let Some(guess) = detection.format() else {
            return Ok(None);
        };
        writeln!(
            self.output,
            "Input looks like {guess}, but only with {:.0}% confidence. {}",
            detection.confidence() * 100.0,
            detection.reason()
        )?;
        let question = format!("Use {guess}? [Y/n, or a provider name]: ");
        let answer = self.ask_until(&question, |t| -> Result<Option<ProviderFormat>, EngineError> {
            match t.to_ascii_lowercase().as_str() {
                "" | "y" | "yes" => Ok(Some(guess)),
                "n" | "no" => Ok(None),
                other => other.parse().map(Some),
            }
        })?;
        Ok(answer.flatten())
    }
}

fn or_empty(value: &str) -> &str {
    if value.is_empty() {
        "(empty)"
    } else {
        value
    }
}

/// One field of a record for side-by-side display. Secrets are masked.
fn field_display(record: &Record, field: MergeField) -> String {
    let text = match field {
        MergeField::Title => record.title.clone(),
        MergeField::Username => record.username.clone(),
        MergeField::Password => record.password.clone(),
        MergeField::PrimarySite => record.primary_site.clone().unwrap_or_default(),
        MergeField::Notes => return preview_notes(&record.notes),
        MergeField::Folder => record.folder.clone().unwrap_or_default(),
        MergeField::Favorite => record.favorite.to_string(),
        MergeField::OtpUri => record.otp_uri.clone().unwrap_or_default(),
        MergeField::OtpSecret => record.otp_secret.clone().unwrap_or_default(),
    };
    if field.is_secret() {
        mask_secret(&text)
    } else {
        or_empty(&text).to_string()
    }
}

//! Header-based format detection.
//!
//! Per-adapter score = matched_required / total_required
//!                   + 0.25 * matched_optional / total_optional
//!
//! Highest score wins. Ties keep registry enumeration order (stable sort).

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::normalize::normalize_header;
use crate::provider::{HeaderSchema, ProviderFormat, ProviderRegistry};

const OPTIONAL_WEIGHT: f64 = 0.25;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionMatch {
    pub format: ProviderFormat,
    pub score: f64,
    pub matched_required: usize,
    pub total_required: usize,
    pub matched_optional: usize,
    pub total_optional: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UndetectedCause {
    NoHeaders,
    NoAdapters,
    NoMatch,
}

/// Outcome of detection. `Undetected` is a normal value, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Detection {
    Detected {
        format: ProviderFormat,
        /// Best score clamped to [0, 1].
        confidence: f64,
        /// All non-zero matches, score-descending.
        matches: Vec<DetectionMatch>,
        reason: String,
    },
    Undetected {
        cause: UndetectedCause,
        reason: String,
    },
}

impl Detection {
    pub fn format(&self) -> Option<ProviderFormat> {
        match self {
            Self::Detected { format, .. } => Some(*format),
            Self::Undetected { .. } => None,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            Self::Detected { confidence, .. } => *confidence,
            Self::Undetected { .. } => 0.0,
        }
    }

    pub fn matches(&self) -> &[DetectionMatch] {
        match self {
            Self::Detected { matches, .. } => matches,
            Self::Undetected { .. } => &[],
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            Self::Detected { reason, .. } | Self::Undetected { reason, .. } => reason,
        }
    }

    fn undetected(cause: UndetectedCause, reason: &str) -> Self {
        Self::Undetected {
            cause,
            reason: reason.to_string(),
        }
    }
}

/// Score one schema against an already-normalized header set.
pub fn score_headers(
    format: ProviderFormat,
    schema: &HeaderSchema,
    headers: &BTreeSet<String>,
) -> DetectionMatch {
    let required = schema.normalized_required();
    let optional = schema.normalized_optional();

    let matched_required = required.intersection(headers).count();
    let matched_optional = optional.intersection(headers).count();

    let ratio = |matched: usize, total: usize| {
        if total == 0 {
            0.0
        } else {
            matched as f64 / total as f64
        }
    };

    DetectionMatch {
        format,
        score: ratio(matched_required, required.len())
            + OPTIONAL_WEIGHT * ratio(matched_optional, optional.len()),
        matched_required,
        total_required: required.len(),
        matched_optional,
        total_optional: optional.len(),
    }
}

/// Pick the most likely format for a header row. Pure; never fails.
pub fn detect_format<S: AsRef<str>>(headers: &[S], registry: &ProviderRegistry) -> Detection {
    if headers.is_empty() {
        return Detection::undetected(UndetectedCause::NoHeaders, "No headers provided");
    }
    if registry.is_empty() {
        return Detection::undetected(UndetectedCause::NoAdapters, "No provider adapters registered");
    }

    let normalized: BTreeSet<String> = headers.iter().map(|h| normalize_header(h.as_ref())).collect();

    let mut matches: Vec<DetectionMatch> = registry
        .adapters()
        .map(|a| score_headers(a.format(), &a.header_schema(), &normalized))
        .filter(|m| m.score > 0.0)
        .collect();

    if matches.is_empty() {
        return Detection::undetected(UndetectedCause::NoMatch, "No adapter matched the header row");
    }

    // Stable: equal scores stay in registration order.
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));

    let best = &matches[0];
    let reason = format!(
        "Best match: {} (score={:.2}, matched_required={}/{}, matched_optional={}/{})",
        best.format,
        best.score,
        best.matched_required,
        best.total_required,
        best.matched_optional,
        best.total_optional,
    );
    debug!(format = %best.format, score = best.score, candidates = matches.len(), "format detected");

    Detection::Detected {
        format: best.format,
        confidence: best.score.clamp(0.0, 1.0),
        matches,
        reason,
    }
}

/// How the run's input format was settled.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderChoice {
    /// Caller named a registered format.
    Explicit(ProviderFormat),
    /// Auto-detected at or above the confidence threshold.
    Detected { format: ProviderFormat, detection: Detection },
    /// Auto-detected, but below the threshold; the caller should confirm.
    LowConfidence { detection: Detection },
    Undetected { detection: Detection },
    /// Caller named something that is not a format identifier.
    UnknownName(String),
    /// A valid format with no adapter in this registry.
    MissingPlugin(ProviderFormat),
}

/// Resolve `requested` ("auto", empty, or a format name) against `registry`.
pub fn choose_provider<S: AsRef<str>>(
    headers: &[S],
    registry: &ProviderRegistry,
    requested: Option<&str>,
    confirm_threshold: f64,
) -> ProviderChoice {
    let requested = requested.map(str::trim).unwrap_or("auto");
    if !requested.is_empty() && !requested.eq_ignore_ascii_case("auto") {
        let Ok(format) = requested.parse::<ProviderFormat>() else {
            return ProviderChoice::UnknownName(requested.to_string());
        };
        if registry.get(format).is_none() {
            return ProviderChoice::MissingPlugin(format);
        }
        return ProviderChoice::Explicit(format);
    }

    let detection = detect_format(headers, registry);
    match detection.format() {
        None => ProviderChoice::Undetected { detection },
        Some(format) if detection.confidence() >= confirm_threshold => {
            ProviderChoice::Detected { format, detection }
        }
        Some(_) => ProviderChoice::LowConfidence { detection },
    }
}

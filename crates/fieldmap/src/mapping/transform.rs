//! Pure conversions from canonical profile values into the conventions a form expects.
//!
//! Transform names are persisted inside cached mappings, so the serialized names below are
//! a stable contract: new transforms may be added, existing names never change.

use std::fmt;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use super::domain::CanonicalKey;

const DMY_FORMAT: &str = "%d/%m/%Y";
const YMD_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformName {
    CnicDashes,
    CnicNoDashes,
    PhonePak,
    DateDmy,
    DateYmd,
    #[serde(rename = "percent_to_marks_1100")]
    PercentToMarks1100,
    #[serde(rename = "percent_to_marks_1050")]
    PercentToMarks1050,
    MarksToPercent,
    FirstName,
    MiddleName,
    LastName,
}

impl TransformName {
    pub const ALL: &'static [TransformName] = &[
        TransformName::CnicDashes,
        TransformName::CnicNoDashes,
        TransformName::PhonePak,
        TransformName::DateDmy,
        TransformName::DateYmd,
        TransformName::PercentToMarks1100,
        TransformName::PercentToMarks1050,
        TransformName::MarksToPercent,
        TransformName::FirstName,
        TransformName::MiddleName,
        TransformName::LastName,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TransformName::CnicDashes => "cnic_dashes",
            TransformName::CnicNoDashes => "cnic_no_dashes",
            TransformName::PhonePak => "phone_pak",
            TransformName::DateDmy => "date_dmy",
            TransformName::DateYmd => "date_ymd",
            TransformName::PercentToMarks1100 => "percent_to_marks_1100",
            TransformName::PercentToMarks1050 => "percent_to_marks_1050",
            TransformName::MarksToPercent => "marks_to_percent",
            TransformName::FirstName => "first_name",
            TransformName::MiddleName => "middle_name",
            TransformName::LastName => "last_name",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.iter().copied().find(|name| name.as_str() == raw)
    }

    /// Profile key the raw value is read from when this transform targets `target`.
    ///
    /// Name splitting reads the full name; every other transform reads the target key.
    pub fn source_key(self, target: CanonicalKey) -> CanonicalKey {
        match self {
            TransformName::FirstName | TransformName::MiddleName | TransformName::LastName => {
                CanonicalKey::FullName
            }
            _ => target,
        }
    }
}

impl fmt::Display for TransformName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side inputs some transforms need in addition to the value itself.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransformContext {
    /// Denominator for `marks_to_percent` (e.g. the profile's `fsc_total`).
    pub marks_total: Option<f64>,
}

impl TransformContext {
    pub fn with_total(total: f64) -> Self {
        Self {
            marks_total: Some(total),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    #[error("{transform} cannot convert '{value}': {reason}")]
    UnsupportedValue {
        transform: TransformName,
        value: String,
        reason: String,
    },
}

/// Applies `transform` to `raw`, or trims and passes the value through when none is named.
pub fn apply(
    transform: Option<TransformName>,
    raw: &str,
    context: &TransformContext,
) -> Result<String, TransformError> {
    let value = raw.trim();
    let Some(transform) = transform else {
        return Ok(value.to_string());
    };

    let unsupported = |reason: &str| TransformError::UnsupportedValue {
        transform,
        value: value.to_string(),
        reason: reason.to_string(),
    };

    match transform {
        TransformName::CnicDashes => {
            let digits = cnic_digits(value).ok_or_else(|| unsupported("expected 13 digits"))?;
            Ok(format!(
                "{}-{}-{}",
                &digits[..5],
                &digits[5..12],
                &digits[12..]
            ))
        }
        TransformName::CnicNoDashes => {
            cnic_digits(value).ok_or_else(|| unsupported("expected 13 digits"))
        }
        TransformName::PhonePak => {
            pakistani_mobile(value).ok_or_else(|| unsupported("not a Pakistani phone number"))
        }
        TransformName::DateDmy => parse_date(value)
            .map(|date| date.format(DMY_FORMAT).to_string())
            .ok_or_else(|| unsupported("unparsable date")),
        TransformName::DateYmd => parse_date(value)
            .map(|date| date.format(YMD_FORMAT).to_string())
            .ok_or_else(|| unsupported("unparsable date")),
        TransformName::PercentToMarks1100 => percent_to_marks(value, 1100.0)
            .map(|marks| marks.to_string())
            .ok_or_else(|| unsupported("percentage must be a number in [0, 100]")),
        TransformName::PercentToMarks1050 => percent_to_marks(value, 1050.0)
            .map(|marks| marks.to_string())
            .ok_or_else(|| unsupported("percentage must be a number in [0, 100]")),
        TransformName::MarksToPercent => {
            let total = context
                .marks_total
                .filter(|total| total.is_finite() && *total > 0.0)
                .ok_or_else(|| unsupported("marks total is missing, zero or negative"))?;
            let marks = value
                .parse::<f64>()
                .ok()
                .filter(|marks| marks.is_finite() && *marks >= 0.0)
                .ok_or_else(|| unsupported("marks must be a non-negative number"))?;
            Ok(format!("{:.2}", marks / total * 100.0))
        }
        TransformName::FirstName => name_tokens(value)
            .first()
            .map(|token| token.to_string())
            .ok_or_else(|| unsupported("empty name")),
        TransformName::MiddleName => {
            let tokens = name_tokens(value);
            if tokens.is_empty() {
                return Err(unsupported("empty name"));
            }
            if tokens.len() < 3 {
                return Ok(String::new());
            }
            Ok(tokens[1..tokens.len() - 1].join(" "))
        }
        TransformName::LastName => {
            let tokens = name_tokens(value);
            match tokens.as_slice() {
                [_, .., last] => Ok(last.to_string()),
                _ => Err(unsupported("name has no separate last name")),
            }
        }
    }
}

fn cnic_digits(value: &str) -> Option<String> {
    let mut digits = String::with_capacity(13);
    for ch in value.chars() {
        match ch {
            '0'..='9' => digits.push(ch),
            '-' | ' ' => {}
            _ => return None,
        }
    }
    (digits.len() == 13).then_some(digits)
}

/// Canonical local format: leading `0`, eleven digits.
fn pakistani_mobile(value: &str) -> Option<String> {
    let compact: String = value
        .chars()
        .filter(|ch| !matches!(ch, ' ' | '-' | '(' | ')' | '.'))
        .collect();
    let compact = compact.strip_prefix('+').unwrap_or(&compact);
    if compact.is_empty() || !compact.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }

    let after_country_code = if let Some(rest) = compact.strip_prefix("0092") {
        Some(rest)
    } else if compact.len() == 12 || (compact.len() == 13 && compact[2..].starts_with('0')) {
        compact.strip_prefix("92")
    } else {
        None
    };

    // A trunk zero typed after the country code ("+92 0300 ...") is dropped.
    let national = if let Some(rest) = after_country_code {
        rest.strip_prefix('0').unwrap_or(rest)
    } else if let Some(rest) = compact.strip_prefix('0') {
        rest
    } else {
        compact
    };

    (national.len() == 10 && !national.starts_with('0')).then(|| format!("0{national}"))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, YMD_FORMAT) {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|timestamp| timestamp.date_naive())
}

fn percent_to_marks(value: &str, denominator: f64) -> Option<i64> {
    let percent = value.trim_end_matches('%').trim().parse::<f64>().ok()?;
    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return None;
    }
    Some((percent * denominator / 100.0).round() as i64)
}

fn name_tokens(value: &str) -> Vec<&str> {
    value.split_whitespace().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(name: TransformName, value: &str) -> Result<String, TransformError> {
        apply(Some(name), value, &TransformContext::default())
    }

    #[test]
    fn cnic_formats_round_trip() {
        for raw in ["3520212345671", "4210100000009", "6110198765432"] {
            let dashed = run(TransformName::CnicDashes, raw).expect("valid cnic");
            assert_eq!(dashed.len(), 15);
            let digits = run(TransformName::CnicNoDashes, &dashed).expect("dashed cnic");
            assert_eq!(digits, raw);
        }
        assert_eq!(
            run(TransformName::CnicDashes, "35202-1234567-1").expect("already dashed"),
            "35202-1234567-1"
        );
    }

    #[test]
    fn cnic_rejects_wrong_length_and_letters() {
        assert!(run(TransformName::CnicDashes, "352021234567").is_err());
        assert!(run(TransformName::CnicNoDashes, "35202123456712").is_err());
        assert!(run(TransformName::CnicDashes, "35202A2345671").is_err());
    }

    #[test]
    fn phone_accepts_country_code_variants() {
        for raw in [
            "03001234567",
            "3001234567",
            "+92 300 1234567",
            "923001234567",
            "0092-300-1234567",
            "+92 0300 1234567",
            "0092 0300 1234567",
        ] {
            assert_eq!(
                run(TransformName::PhonePak, raw).expect("valid phone"),
                "03001234567",
                "input {raw}"
            );
        }
    }

    #[test]
    fn phone_rejects_non_numeric_remainder() {
        let err = run(TransformName::PhonePak, "0300-CALL-NOW").expect_err("letters rejected");
        assert!(matches!(
            err,
            TransformError::UnsupportedValue {
                transform: TransformName::PhonePak,
                ..
            }
        ));
        assert!(run(TransformName::PhonePak, "12345").is_err());
    }

    #[test]
    fn dates_reformat_iso_input() {
        assert_eq!(
            run(TransformName::DateDmy, "2026-02-21").expect("iso date"),
            "21/02/2026"
        );
        assert_eq!(
            run(TransformName::DateYmd, "2026-02-21T08:30:00+05:00").expect("timestamp"),
            "2026-02-21"
        );
        assert!(run(TransformName::DateDmy, "not-a-date").is_err());
        assert!(run(TransformName::DateYmd, "2026-02-30").is_err());
    }

    #[test]
    fn percent_and_marks_rescale_linearly() {
        assert_eq!(
            run(TransformName::PercentToMarks1100, "90").expect("percent"),
            "990"
        );
        assert_eq!(
            run(TransformName::PercentToMarks1050, "80%").expect("percent"),
            "840"
        );
        assert!(run(TransformName::PercentToMarks1100, "101").is_err());

        let context = TransformContext::with_total(1100.0);
        assert_eq!(
            apply(Some(TransformName::MarksToPercent), "990", &context).expect("marks"),
            "90.00"
        );
    }

    #[test]
    fn percent_survives_a_round_trip_through_marks() {
        let context = TransformContext::with_total(1100.0);
        for tenth in 0..=1000 {
            let percent = f64::from(tenth) / 10.0;
            let marks = run(TransformName::PercentToMarks1100, &percent.to_string())
                .expect("percent in range");
            let back = apply(Some(TransformName::MarksToPercent), &marks, &context)
                .expect("total present")
                .parse::<f64>()
                .expect("numeric output");
            assert!(
                (back - percent).abs() <= 0.051,
                "{percent} -> {marks} -> {back}"
            );
        }
    }

    #[test]
    fn marks_to_percent_requires_positive_total() {
        for context in [
            TransformContext::default(),
            TransformContext::with_total(0.0),
            TransformContext::with_total(-1100.0),
        ] {
            let err = apply(Some(TransformName::MarksToPercent), "900", &context)
                .expect_err("total rejected");
            assert!(matches!(err, TransformError::UnsupportedValue { .. }));
        }
    }

    #[test]
    fn untransformed_values_are_trimmed() {
        assert_eq!(
            apply(None, "  Lahore \n", &TransformContext::default()).expect("pass-through"),
            "Lahore"
        );
    }

    #[test]
    fn names_split_on_whitespace() {
        let full = "Muhammad  Ali Khan";
        assert_eq!(run(TransformName::FirstName, full).expect("first"), "Muhammad");
        assert_eq!(run(TransformName::MiddleName, full).expect("middle"), "Ali");
        assert_eq!(run(TransformName::LastName, full).expect("last"), "Khan");
        assert_eq!(run(TransformName::MiddleName, "Sara Ahmed").expect("none"), "");
        assert!(run(TransformName::LastName, "Cher").is_err());
        assert_eq!(
            TransformName::LastName.source_key(CanonicalKey::LastName),
            CanonicalKey::FullName
        );
    }

    #[test]
    fn names_are_stable_on_the_wire() {
        for name in TransformName::ALL {
            let json = serde_json::to_string(name).expect("serializes");
            assert_eq!(json, format!("\"{}\"", name.as_str()));
            assert_eq!(TransformName::parse(name.as_str()), Some(*name));
        }
    }
}

//! Date to recency score.
//!
//! Age is measured in whole months between the record's date and a
//! reference month, normalized by a horizon and mapped onto 0-10 where 0 is
//! "as recent as the reference" and 10 is saturated.
//!
//! An absent or unparseable date scores exactly 0, i.e. it is treated as the
//! most recent possible record. That inflates urgency for incomplete data;
//! it is kept deliberately so scores stay comparable with previously
//! persisted ones.

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::robust::round_to;
use crate::config::lenient::lenient;

/// Full-date layouts tried in order.
const DATE_FORMATS: [&str; 3] = ["%d/%m/%Y", "%Y-%m-%d", "%Y/%m/%d"];

/// How age grows toward saturation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecayMode {
    /// `10 * (1 - e^(-rate * months / horizon))`
    #[default]
    #[serde(alias = "exp")]
    Exponential,
    /// `10 * min(months / horizon, 1)`
    Linear,
}

/// Parameters of the age scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeConfig {
    /// Age in months at which the score saturates
    #[serde(default = "default_horizon_months", deserialize_with = "horizon_or_default")]
    pub horizon_months: u32,

    #[serde(default, deserialize_with = "decay_or_default")]
    pub decay: DecayMode,

    /// Rate constant for exponential decay
    #[serde(default = "default_decay_rate", deserialize_with = "rate_or_default")]
    pub rate: f64,
}

impl Default for AgeConfig {
    fn default() -> Self {
        Self {
            horizon_months: default_horizon_months(),
            decay: DecayMode::default(),
            rate: default_decay_rate(),
        }
    }
}

fn default_horizon_months() -> u32 {
    60
}

fn default_decay_rate() -> f64 {
    3.0
}

fn horizon_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(lenient(deserializer)?.unwrap_or_else(default_horizon_months))
}

fn decay_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DecayMode, D::Error> {
    Ok(lenient(deserializer)?.unwrap_or_default())
}

fn rate_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(lenient(deserializer)?.unwrap_or_else(default_decay_rate))
}

/// Calendar month that ages are measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReferenceMonth {
    pub year: i32,
    pub month: u32,
}

impl ReferenceMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self {
            year,
            month: month.clamp(1, 12),
        }
    }

    /// The current local month.
    pub fn current() -> Self {
        Self::from_date(Local::now().date_naive())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }

    /// Parse any of the accepted record date forms.
    pub fn parse(text: &str) -> Option<Self> {
        parse_year_month(text).map(|(year, month)| Self::new(year, month))
    }

    /// Whole months from `(year, month)` up to this reference, floored at 0.
    pub fn months_since(&self, year: i32, month: u32) -> u32 {
        let elapsed =
            (i64::from(self.year) - i64::from(year)) * 12 + i64::from(self.month) - i64::from(month);
        elapsed.clamp(0, i64::from(u32::MAX)) as u32
    }
}

/// Parse a date into `(year, month)`.
///
/// Accepted: `DD/MM/YYYY`, `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYY-MM`, `YYYY/MM`
/// and a bare `YYYY` (month taken as January).
pub fn parse_year_month(text: &str) -> Option<(i32, u32)> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    {
        return Some((date.year(), date.month()));
    }

    let mut parts = s.split(['-', '/']);
    let year = parse_year(parts.next()?)?;
    match (parts.next(), parts.next()) {
        (None, _) => Some((year, 1)),
        (Some(month), None) => parse_month(month).map(|m| (year, m)),
        _ => None,
    }
}

fn parse_year(text: &str) -> Option<i32> {
    if text.len() != 4 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<i32>().ok().filter(|y| *y >= 1)
}

fn parse_month(text: &str) -> Option<u32> {
    if text.is_empty() || text.len() > 2 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<u32>().ok().filter(|m| (1..=12).contains(m))
}

/// Age score of a textual date, in [0, 10], rounded to 6 digits.
pub fn age_score(date: &str, reference: ReferenceMonth, config: &AgeConfig) -> f64 {
    let Some((year, month)) = parse_year_month(date) else {
        return 0.0;
    };
    let months = f64::from(reference.months_since(year, month));
    let x = months / f64::from(config.horizon_months.max(1));

    let score = match config.decay {
        DecayMode::Linear => 10.0 * x.min(1.0),
        DecayMode::Exponential => 10.0 * (1.0 - (-config.rate * x).exp()),
    };
    round_to(score.clamp(0.0, 10.0), 6)
}

/// Age score of a raw field value.
///
/// Strings are parsed as dates and integers as bare years; any other value,
/// including an absent one, scores 0.
pub fn age_score_value(date: Option<&Value>, reference: ReferenceMonth, config: &AgeConfig) -> f64 {
    match date {
        Some(Value::String(s)) => age_score(s, reference, config),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(|year| age_score(&year.to_string(), reference, config))
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

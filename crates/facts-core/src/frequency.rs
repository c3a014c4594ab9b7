//! Filing period definitions.
//!
//! [`PeriodType`] narrows an observation series to the filings of one form
//! type before alignment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FactsError;
use crate::types::Observation;

/// Period type for fundamental financial data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    /// Annual reporting period (form 10-K).
    #[default]
    Annual,
    /// Quarterly reporting period (form 10-Q).
    Quarterly,
}

impl PeriodType {
    /// The SEC form type that reports this period.
    #[must_use]
    pub const fn form(&self) -> &'static str {
        match self {
            Self::Annual => "10-K",
            Self::Quarterly => "10-Q",
        }
    }

    /// Returns true if the observation belongs to this period type.
    ///
    /// Observations without a `form` carry no evidence either way and are kept.
    #[must_use]
    pub fn matches(&self, observation: &Observation) -> bool {
        observation
            .form
            .as_deref()
            .is_none_or(|form| form == self.form())
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Annual => write!(f, "annual"),
            Self::Quarterly => write!(f, "quarterly"),
        }
    }
}

impl FromStr for PeriodType {
    type Err = FactsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "annual" | "10-k" => Ok(Self::Annual),
            "quarterly" | "10-q" => Ok(Self::Quarterly),
            other => Err(FactsError::InvalidParameter(format!(
                "Unknown period type: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn observation(form: Option<&str>) -> Observation {
        Observation {
            end: Some("2023-12-31".to_string()),
            form: form.map(str::to_string),
            ..Default::default()
        }
    }

    #[rstest]
    #[case(PeriodType::Annual, Some("10-K"), true)]
    #[case(PeriodType::Annual, Some("10-Q"), false)]
    #[case(PeriodType::Quarterly, Some("10-Q"), true)]
    #[case(PeriodType::Quarterly, Some("8-K"), false)]
    #[case(PeriodType::Annual, None, true)]
    fn test_period_matches_form(
        #[case] period: PeriodType,
        #[case] form: Option<&str>,
        #[case] expected: bool,
    ) {
        assert_eq!(period.matches(&observation(form)), expected);
    }

    #[test]
    fn test_parse_period_type() {
        assert_eq!("annual".parse::<PeriodType>().unwrap(), PeriodType::Annual);
        assert_eq!("10-Q".parse::<PeriodType>().unwrap(), PeriodType::Quarterly);
        assert!("monthly".parse::<PeriodType>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for period in [PeriodType::Annual, PeriodType::Quarterly] {
            assert_eq!(period.to_string().parse::<PeriodType>().unwrap(), period);
        }
    }
}

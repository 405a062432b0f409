use crate::escalas::ScheduleEntry;
use chrono::Datelike;
use serde::Serialize;
use std::fmt;

pub const ALL_MONTHS: &str = "todos";
pub const ALL_UNITS: &str = "ALL";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("invalid month filter '{0}': expected 'todos' or 01-12")]
    InvalidMonth(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MonthFilter {
    #[default]
    All,
    Month(u32),
}

impl MonthFilter {
    pub fn parse(raw: &str) -> Result<Self, FilterError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL_MONTHS) {
            return Ok(Self::All);
        }
        match trimmed.parse::<u32>() {
            Ok(month @ 1..=12) => Ok(Self::Month(month)),
            _ => Err(FilterError::InvalidMonth(trimmed.to_string())),
        }
    }

    /// Entries without a start date never match a specific month.
    pub fn matches(&self, entry: &ScheduleEntry) -> bool {
        match self {
            Self::All => true,
            Self::Month(month) => entry
                .valid_from
                .is_some_and(|date| date.month() == *month),
        }
    }
}

impl fmt::Display for MonthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL_MONTHS),
            Self::Month(month) => write!(f, "{month:02}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UnitFilter {
    #[default]
    All,
    Unit(String),
}

impl UnitFilter {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == ALL_UNITS {
            Self::All
        } else {
            Self::Unit(trimmed.to_string())
        }
    }

    pub fn matches(&self, entry: &ScheduleEntry) -> bool {
        match self {
            Self::All => true,
            Self::Unit(unit) => entry.unit.trim() == unit,
        }
    }
}

impl fmt::Display for UnitFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL_UNITS),
            Self::Unit(unit) => f.write_str(unit),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardFilter {
    pub month: MonthFilter,
    pub unit: UnitFilter,
}

impl DashboardFilter {
    pub fn parse(month: &str, unit: &str) -> Result<Self, FilterError> {
        Ok(Self {
            month: MonthFilter::parse(month)?,
            unit: UnitFilter::parse(unit),
        })
    }

    pub fn matches(&self, entry: &ScheduleEntry) -> bool {
        self.unit.matches(entry) && self.month.matches(entry)
    }

    pub fn view(&self) -> FilterView {
        FilterView {
            month: self.month.to_string(),
            unit: self.unit.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterView {
    #[serde(rename = "mes")]
    pub month: String,
    #[serde(rename = "unidade")]
    pub unit: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(unit: &str, start: Option<(i32, u32, u32)>) -> ScheduleEntry {
        ScheduleEntry {
            unit: unit.to_string(),
            valid_from: start.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            ..ScheduleEntry::default()
        }
    }

    #[test]
    fn month_filter_parses_and_matches() {
        assert_eq!(MonthFilter::parse("todos"), Ok(MonthFilter::All));
        assert_eq!(MonthFilter::parse("03"), Ok(MonthFilter::Month(3)));
        assert!(MonthFilter::parse("13").is_err());
        assert!(MonthFilter::parse("marco").is_err());

        let march = MonthFilter::Month(3);
        assert!(march.matches(&entry("X", Some((2024, 3, 5)))));
        assert!(!march.matches(&entry("X", Some((2024, 4, 5)))));
        assert!(!march.matches(&entry("X", None)));
        assert_eq!(march.to_string(), "03");
    }

    #[test]
    fn unit_filter_compares_trimmed_names() {
        let filter = DashboardFilter::parse("todos", "UBS SUL").expect("filter");
        assert!(filter.matches(&entry(" UBS SUL ", None)));
        assert!(!filter.matches(&entry("UBS NORTE", None)));

        let all = DashboardFilter::parse("", "ALL").expect("filter");
        assert!(all.matches(&entry("", None)));
        assert_eq!(
            all.view(),
            FilterView {
                month: "todos".to_string(),
                unit: "ALL".to_string()
            }
        );
    }
}

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::search_console::DateRange;

/// Comparison window presets offered by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AnalyticsPeriod {
    #[serde(rename = "7d")]
    Days7,
    #[default]
    #[serde(rename = "28d")]
    Days28,
    #[serde(rename = "3mo")]
    Months3,
    #[serde(rename = "6mo")]
    Months6,
    #[serde(rename = "12mo")]
    Months12,
    #[serde(rename = "16mo")]
    Months16,
}

impl AnalyticsPeriod {
    pub const fn days(self) -> u32 {
        match self {
            Self::Days7 => 7,
            Self::Days28 => 28,
            Self::Months3 => 90,
            Self::Months6 => 180,
            Self::Months12 => 365,
            Self::Months16 => 480,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Days7 => "7d",
            Self::Days28 => "28d",
            Self::Months3 => "3mo",
            Self::Months6 => "6mo",
            Self::Months12 => "12mo",
            Self::Months16 => "16mo",
        }
    }
}

impl fmt::Display for AnalyticsPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalyticsPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "7d" => Ok(Self::Days7),
            "28d" => Ok(Self::Days28),
            "3mo" => Ok(Self::Months3),
            "6mo" => Ok(Self::Months6),
            "12mo" => Ok(Self::Months12),
            "16mo" => Ok(Self::Months16),
            other => Err(format!(
                "unknown period '{other}', expected one of 7d, 28d, 3mo, 6mo, 12mo, 16mo"
            )),
        }
    }
}

/// The three date windows one snapshot is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindows {
    /// `[today - N, today]`
    pub current: DateRange,
    /// `[today - 2N, today - N - 1]`
    pub previous: DateRange,
    /// `[today - 2N, today]`, feeds the daily graph
    pub graph: DateRange,
}

impl PeriodWindows {
    pub fn ending(today: NaiveDate, period_days: u32) -> Self {
        let n = Duration::days(i64::from(period_days));
        let current_start = today - n;
        let previous_start = today - n - n;
        let previous_end = current_start - Duration::days(1);

        Self {
            current: DateRange::new(current_start, today),
            previous: DateRange::new(previous_start, previous_end),
            graph: DateRange::new(previous_start, today),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_presets_parse_and_display() {
        for period in [
            AnalyticsPeriod::Days7,
            AnalyticsPeriod::Days28,
            AnalyticsPeriod::Months3,
            AnalyticsPeriod::Months6,
            AnalyticsPeriod::Months12,
            AnalyticsPeriod::Months16,
        ] {
            assert_eq!(period.as_str().parse::<AnalyticsPeriod>().unwrap(), period);
        }
        assert_eq!(" 3MO ".parse::<AnalyticsPeriod>().unwrap(), AnalyticsPeriod::Months3);
        assert!("30d".parse::<AnalyticsPeriod>().is_err());
    }

    #[test]
    fn test_windows_for_28_days() {
        let windows = PeriodWindows::ending(date(2024, 3, 31), 28);
        assert_eq!(windows.current, DateRange::new(date(2024, 3, 3), date(2024, 3, 31)));
        assert_eq!(windows.previous, DateRange::new(date(2024, 2, 4), date(2024, 3, 2)));
        assert_eq!(windows.graph, DateRange::new(date(2024, 2, 4), date(2024, 3, 31)));
    }

    #[test]
    fn test_previous_window_ends_the_day_before_current_starts() {
        let windows = PeriodWindows::ending(date(2025, 1, 10), 7);
        assert_eq!(windows.current.start_date, date(2025, 1, 3));
        assert_eq!(windows.previous.end_date, date(2025, 1, 2));
        assert_eq!(windows.previous.start_date, date(2024, 12, 27));
    }
}

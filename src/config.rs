use chrono::{Duration, NaiveDate, Utc};

#[derive(Clone, Debug)]
pub struct Config {
    pub sqlite_path: String,
    /// Number of reporting weeks generated per workstream.
    pub num_weeks: u32,
    /// First `week_ending` of the generation window.
    pub start_date: NaiveDate,
    /// Added to cumulative spend before the CPI division so week 1
    /// (zero spend) cannot divide by zero. One currency unit.
    pub cpi_epsilon: f64,
    /// Divisor turning total approved CR cost into a bubble radius.
    /// Display scaling only; tune per dataset scale.
    pub bubble_cost_scale: f64,
}

impl Config {
    pub fn from_env() -> Self {
        let num_weeks: u32 = std::env::var("NUM_WEEKS").ok().and_then(|v| v.parse().ok()).unwrap_or(24);
        let start_date = std::env::var("START_DATE")
            .ok()
            .and_then(|v| NaiveDate::parse_from_str(&v, "%Y-%m-%d").ok())
            .unwrap_or_else(|| Utc::now().date_naive() - Duration::weeks(num_weeks as i64));
        Self {
            sqlite_path: std::env::var("SQLITE_PATH").unwrap_or_else(|_| "./oversight.sqlite".to_string()),
            num_weeks,
            start_date,
            cpi_epsilon: std::env::var("CPI_EPSILON").ok().and_then(|v| v.parse().ok()).unwrap_or(1.0),
            bubble_cost_scale: std::env::var("BUBBLE_COST_SCALE").ok().and_then(|v| v.parse().ok()).unwrap_or(10_000.0),
        }
    }

    /// Fixed-window config for tests, without touching env vars.
    pub fn fixed(start_date: NaiveDate, num_weeks: u32) -> Self {
        Self {
            sqlite_path: String::new(),
            num_weeks,
            start_date,
            cpi_epsilon: 1.0,
            bubble_cost_scale: 10_000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_config_defaults() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        let cfg = Config::fixed(start, 24);
        assert_eq!(cfg.num_weeks, 24);
        assert_eq!(cfg.start_date, start);
        assert!(cfg.cpi_epsilon > 0.0);
        assert_eq!(cfg.bubble_cost_scale, 10_000.0);
    }
}

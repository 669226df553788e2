//! Earned-value arithmetic. Pure and total; the same functions serve the
//! synthetic generator and any real status-intake path.

/// `actual - planned`, in percentage points. Negative = behind schedule.
pub fn schedule_variance(actual_pct: f64, planned_pct: f64) -> f64 {
    actual_pct - planned_pct
}

/// Budget fraction attributable to work actually completed.
pub fn earned_value(actual_pct: f64, budget: f64) -> f64 {
    actual_pct / 100.0 * budget
}

/// Earned value over cumulative spend. `epsilon` must be positive; it keeps
/// the week-1 case (zero spend) finite without an error path.
pub fn cost_performance_index(earned_value: f64, cumulative_spend: f64, epsilon: f64) -> f64 {
    earned_value / (cumulative_spend + epsilon)
}

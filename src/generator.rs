//! Synthetic multi-week status histories.
//!
//! Each workstream is driven by a persona that biases the relationship between
//! planned and actual progress, and between budget and spend. The generator
//! only produces raw weekly facts and feeds them through the metrics engine;
//! it never derives metric fields on its own. Randomness comes in through a
//! generic `Rng` so tests can seed a `StdRng` and production can use
//! `thread_rng()`.

use chrono::Duration;
use rand::Rng;

use crate::config::Config;
use crate::domain::{ChangeRequest, CrStatus, ProgressSnapshot, ValidationError, Workstream};
use crate::metrics;

/// Delivery/spend behavior of a simulated workstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persona {
    /// Mild under-delivery, on-budget spend.
    Nominal,
    /// Tracks plan closely, may slightly exceed it.
    OnTrack,
    /// Systematically under-delivers while overspending.
    AtRisk,
}

impl Persona {
    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::Nominal => "nominal",
            Persona::OnTrack => "on-track",
            Persona::AtRisk => "at-risk",
        }
    }

    /// Uniform range for the weekly delivery factor `f` (actual increment =
    /// planned increment * f).
    pub fn delivery_range(&self) -> (f64, f64) {
        match self {
            Persona::Nominal => (0.8, 1.0),
            Persona::OnTrack => (0.95, 1.05),
            Persona::AtRisk => (0.3, 0.8),
        }
    }

    /// Uniform range for the weekly spend factor `g` (spend rate =
    /// budget / weeks * g).
    pub fn spend_range(&self) -> (f64, f64) {
        match self {
            Persona::Nominal | Persona::OnTrack => (0.9, 1.1),
            Persona::AtRisk => (1.1, 1.5),
        }
    }

    /// Inclusive range for how many change requests the workstream attracts
    /// over the whole window. At-risk workstreams accumulate many more, which
    /// is what the risk-bubble view is meant to surface.
    pub fn cr_count_range(&self) -> (u32, u32) {
        match self {
            Persona::Nominal => (3, 8),
            Persona::OnTrack => (0, 3),
            Persona::AtRisk => (15, 25),
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub struct HistoryGenerator<'a, R: Rng> {
    cfg: &'a Config,
    rng: R,
    cr_seq: u32,
}

impl<'a, R: Rng> HistoryGenerator<'a, R> {
    pub fn new(cfg: &'a Config, rng: R) -> Self {
        Self { cfg, rng, cr_seq: 1000 }
    }

    /// One snapshot per week from `cfg.start_date`, `week_ending` advancing by
    /// exactly 7 days. The plan is a straight line (100 / weeks per week);
    /// actuals and spend follow the persona. Cumulative percentages cap at
    /// 100, spend is monotone and uncapped.
    pub fn weekly_history(
        &mut self,
        ws: &Workstream,
        persona: Persona,
    ) -> Result<Vec<ProgressSnapshot>, ValidationError> {
        let weeks = self.cfg.num_weeks;
        let planned_step = 100.0 / weeks as f64;
        let weekly_budget = ws.budget / weeks as f64;

        let mut cum_planned: f64 = 0.0;
        let mut cum_actual: f64 = 0.0;
        let mut cum_spend: f64 = 0.0;
        let mut out = Vec::with_capacity(weeks as usize);

        for i in 0..weeks {
            let week_ending = self.cfg.start_date + Duration::weeks(i as i64);

            cum_planned = (cum_planned + planned_step).min(100.0);

            let (f_lo, f_hi) = persona.delivery_range();
            let f = self.rng.gen_range(f_lo..f_hi);
            cum_actual = (cum_actual + planned_step * f).min(100.0);

            let (g_lo, g_hi) = persona.spend_range();
            let g = self.rng.gen_range(g_lo..g_hi);
            cum_spend += weekly_budget * g;

            let variance = metrics::schedule_variance(cum_actual, cum_planned);
            let cpi = metrics::cost_performance_index(
                metrics::earned_value(cum_actual, ws.budget),
                cum_spend,
                self.cfg.cpi_epsilon,
            );

            out.push(ProgressSnapshot::new(
                week_ending,
                ws.id.clone(),
                round2(cum_planned),
                round2(cum_actual),
                round2(cum_spend),
                round2(variance),
                round2(cpi),
            )?);
        }
        Ok(out)
    }

    /// Persona-dependent batch of change requests, raise dates uniform within
    /// the generation window, status weighted 2:1:1 Approved:Rejected:Pending.
    pub fn change_requests(
        &mut self,
        ws: &Workstream,
        persona: Persona,
    ) -> Result<Vec<ChangeRequest>, ValidationError> {
        let (lo, hi) = persona.cr_count_range();
        let count = self.rng.gen_range(lo..=hi);
        let window_days = self.cfg.num_weeks as i64 * 7;

        let mut out = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let date_raised = self.cfg.start_date + Duration::days(self.rng.gen_range(0..=window_days));
            let status = match self.rng.gen_range(0..4u8) {
                0 | 1 => CrStatus::Approved,
                2 => CrStatus::Rejected,
                _ => CrStatus::Pending,
            };
            let id = format!("CR_{}", self.cr_seq);
            self.cr_seq += 1;
            out.push(ChangeRequest::new(
                id,
                ws.id.clone(),
                date_raised,
                format!("Change Req #{}", self.rng.gen_range(1..100u32)),
                status,
                self.rng.gen_range(5_000..=50_000i64) as f64,
                self.rng.gen_range(1..=10u32),
            )?);
        }
        Ok(out)
    }
}

//! Dashboard aggregation. Every invocation recomputes the four views from the
//! full fact set; there is no cached or incremental state. The view builders
//! are pure functions over in-memory slices so they can be exercised without a
//! database; `build_dashboard` wires them to the fact store.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;

use crate::config::Config;
use crate::domain::{ChangeRequest, CrStatus, ProgressSnapshot, Workstream};
use crate::storage::FactStore;

/// Portfolio-level headline numbers.
#[derive(Debug, Clone, Serialize)]
pub struct KpiSummary {
    /// Sum of `budget_spent` over the latest-week snapshots.
    pub total_spend: f64,
    /// Mean CPI over the latest-week snapshots; `None` when no snapshots exist.
    pub avg_cpi: Option<f64>,
    /// Approved change requests across the whole portfolio (not week-scoped).
    pub active_risks: usize,
}

/// One line of the status grid: workstream metadata joined with its
/// latest-week snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct StatusRow {
    pub workstream_id: String,
    pub name: String,
    pub owner: String,
    pub planned_pct: f64,
    pub actual_pct: f64,
    pub schedule_variance: f64,
    pub budget_spent: f64,
    pub cpi: f64,
}

/// Per-workstream chart series, aligned index-for-index with the global label
/// list. `None` marks a week the workstream did not report.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesPair {
    pub actual: Vec<Option<f64>>,
    pub planned: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeSeries {
    /// Distinct `week_ending` values across all history, ascending.
    pub labels: Vec<NaiveDate>,
    pub series: BTreeMap<String, SeriesPair>,
}

/// Risk/cost correlation point: CR volume on x, schedule delay on y, approved
/// CR cost as the bubble size.
#[derive(Debug, Clone, Serialize)]
pub struct RiskBubble {
    pub label: String,
    pub cr_count: usize,
    pub total_cr_cost: f64,
    pub schedule_variance: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub kpis: KpiSummary,
    pub grid: Vec<StatusRow>,
    pub history: TimeSeries,
    pub bubbles: Vec<RiskBubble>,
}

/// Latest reporting week across all snapshots; `None` on an empty fact log.
pub fn latest_week(snapshots: &[ProgressSnapshot]) -> Option<NaiveDate> {
    snapshots.iter().map(|s| s.week_ending).max()
}

pub fn kpi_summary(snapshots: &[ProgressSnapshot], change_requests: &[ChangeRequest]) -> KpiSummary {
    let active_risks = change_requests.iter().filter(|cr| cr.status == CrStatus::Approved).count();
    let Some(week) = latest_week(snapshots) else {
        return KpiSummary { total_spend: 0.0, avg_cpi: None, active_risks };
    };
    let current: Vec<&ProgressSnapshot> = snapshots.iter().filter(|s| s.week_ending == week).collect();
    let total_spend = current.iter().map(|s| s.budget_spent).sum();
    let avg_cpi = Some(current.iter().map(|s| s.cpi).sum::<f64>() / current.len() as f64);
    KpiSummary { total_spend, avg_cpi, active_risks }
}

/// Inner join of workstream metadata with latest-week snapshots, most behind
/// schedule first. Workstreams without a latest-week snapshot are excluded.
pub fn status_grid(workstreams: &[Workstream], snapshots: &[ProgressSnapshot]) -> Vec<StatusRow> {
    let Some(week) = latest_week(snapshots) else {
        return Vec::new();
    };
    let mut rows: Vec<StatusRow> = workstreams
        .iter()
        .filter_map(|ws| {
            let snap = snapshots.iter().find(|s| s.workstream_id == ws.id && s.week_ending == week)?;
            Some(StatusRow {
                workstream_id: ws.id.clone(),
                name: ws.name.clone(),
                owner: ws.owner.clone(),
                planned_pct: snap.planned_pct,
                actual_pct: snap.actual_pct,
                schedule_variance: snap.schedule_variance,
                budget_spent: snap.budget_spent,
                cpi: snap.cpi,
            })
        })
        .collect();
    // Worst problems first; this ordering is part of the view contract.
    rows.sort_by(|a, b| a.schedule_variance.partial_cmp(&b.schedule_variance).unwrap_or(Ordering::Equal));
    rows
}

pub fn time_series(snapshots: &[ProgressSnapshot]) -> TimeSeries {
    let mut labels: Vec<NaiveDate> = snapshots.iter().map(|s| s.week_ending).collect();
    labels.sort_unstable();
    labels.dedup();

    let mut by_workstream: BTreeMap<&str, HashMap<NaiveDate, (f64, f64)>> = BTreeMap::new();
    for s in snapshots {
        by_workstream
            .entry(s.workstream_id.as_str())
            .or_default()
            .insert(s.week_ending, (s.actual_pct, s.planned_pct));
    }

    let series = by_workstream
        .into_iter()
        .map(|(id, weeks)| {
            let mut actual = Vec::with_capacity(labels.len());
            let mut planned = Vec::with_capacity(labels.len());
            for week in &labels {
                match weeks.get(week) {
                    Some(&(a, p)) => {
                        actual.push(Some(a));
                        planned.push(Some(p));
                    }
                    None => {
                        actual.push(None);
                        planned.push(None);
                    }
                }
            }
            (id.to_string(), SeriesPair { actual, planned })
        })
        .collect();

    TimeSeries { labels, series }
}

/// One bubble per workstream with a latest-week snapshot. CR count and cost
/// cover `Approved` requests only; a workstream with none still gets a bubble
/// with zero count and cost.
pub fn risk_bubbles(
    workstreams: &[Workstream],
    snapshots: &[ProgressSnapshot],
    change_requests: &[ChangeRequest],
    cost_scale: f64,
) -> Vec<RiskBubble> {
    let Some(week) = latest_week(snapshots) else {
        return Vec::new();
    };
    workstreams
        .iter()
        .filter_map(|ws| {
            let snap = snapshots.iter().find(|s| s.workstream_id == ws.id && s.week_ending == week)?;
            let (cr_count, total_cr_cost) = change_requests
                .iter()
                .filter(|cr| cr.workstream_id == ws.id && cr.status == CrStatus::Approved)
                .fold((0usize, 0.0f64), |(n, cost), cr| (n + 1, cost + cr.cost_impact));
            Some(RiskBubble {
                label: ws.name.clone(),
                cr_count,
                total_cr_cost,
                schedule_variance: snap.schedule_variance,
                radius: total_cr_cost / cost_scale,
            })
        })
        .collect()
}

/// One aggregation pass: bulk-read the fact set and recompute all four views.
/// Storage failures propagate to the caller; an empty fact set yields neutral
/// views, not an error.
pub fn build_dashboard(store: &FactStore, cfg: &Config) -> Result<Dashboard> {
    let workstreams = store.all_workstreams()?;
    let snapshots = store.all_snapshots()?;
    let change_requests = store.all_change_requests()?;
    Ok(Dashboard {
        kpis: kpi_summary(&snapshots, &change_requests),
        grid: status_grid(&workstreams, &snapshots),
        history: time_series(&snapshots),
        bubbles: risk_bubbles(&workstreams, &snapshots, &change_requests, cfg.bubble_cost_scale),
    })
}

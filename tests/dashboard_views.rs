//! End-to-end aggregation over an on-disk SQLite fact log.
//!
//! Seeds hand-built facts (no randomness) and checks the dashboard contract:
//!   1. Canonical two-workstream example -- grid order [B, A], spend 2500
//!   2. Grid ordering invariant          -- variance ascending
//!   3. Latest-week scoping              -- older weeks never leak into KPIs
//!   4. Empty database                   -- neutral views, no error
//!   5. Approved-only CR aggregation     -- zero-fill, never dropped rows

use chrono::NaiveDate;
use tempfile::TempDir;

use oversight::aggregate::build_dashboard;
use oversight::config::Config;
use oversight::domain::{ChangeRequest, Complexity, CrStatus, ProgressSnapshot, Workstream};
use oversight::metrics;
use oversight::storage::FactStore;

fn week(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

fn test_config() -> Config {
    Config::fixed(week(7), 24)
}

fn open_store(dir: &TempDir) -> FactStore {
    let path = dir.path().join("facts.sqlite");
    let mut store = FactStore::open(path.to_str().unwrap()).unwrap();
    store.init().unwrap();
    store
}

fn workstream(id: &str, name: &str, budget: f64) -> Workstream {
    Workstream::new(id, name, "Owner", budget, Complexity::Medium).unwrap()
}

/// Snapshot with derived fields computed the same way the intake path would.
fn snapshot(ws: &str, day: u32, planned: f64, actual: f64, spent: f64, budget: f64) -> ProgressSnapshot {
    let variance = metrics::schedule_variance(actual, planned);
    let cpi = metrics::cost_performance_index(metrics::earned_value(actual, budget), spent, 1.0);
    ProgressSnapshot::new(week(day), ws, planned, actual, spent, variance, cpi).unwrap()
}

#[test]
fn canonical_two_workstream_example() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir);

    store.insert_workstream(&workstream("A", "Alpha", 2000.0)).unwrap();
    store.insert_workstream(&workstream("B", "Beta", 2000.0)).unwrap();
    store.insert_snapshot(&snapshot("A", 7, 50.0, 50.0, 1000.0, 2000.0)).unwrap();
    store.insert_snapshot(&snapshot("B", 7, 50.0, 20.0, 1500.0, 2000.0)).unwrap();

    let dashboard = build_dashboard(&store, &test_config()).unwrap();

    // B's variance of -30 sorts before A's 0.
    let order: Vec<&str> = dashboard.grid.iter().map(|r| r.workstream_id.as_str()).collect();
    assert_eq!(order, vec!["B", "A"]);
    assert_eq!(dashboard.kpis.total_spend, 2500.0);
    assert_eq!(dashboard.kpis.active_risks, 0);
}

#[test]
fn grid_sorted_by_variance_ascending() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir);

    for (i, actual) in [70.0, 20.0, 55.0, 40.0].iter().enumerate() {
        let id = format!("WS_{i}");
        store.insert_workstream(&workstream(&id, &format!("W{i}"), 1000.0)).unwrap();
        store.insert_snapshot(&snapshot(&id, 7, 50.0, *actual, 500.0, 1000.0)).unwrap();
    }

    let dashboard = build_dashboard(&store, &test_config()).unwrap();
    assert_eq!(dashboard.grid.len(), 4);
    for pair in dashboard.grid.windows(2) {
        assert!(pair[0].schedule_variance <= pair[1].schedule_variance);
    }
}

#[test]
fn kpis_scoped_to_latest_week_only() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir);

    store.insert_workstream(&workstream("A", "Alpha", 2000.0)).unwrap();
    store.insert_workstream(&workstream("B", "Beta", 2000.0)).unwrap();
    // Older weeks with large spends that must not leak into the KPI total.
    store.insert_snapshot(&snapshot("A", 7, 25.0, 25.0, 9000.0, 2000.0)).unwrap();
    store.insert_snapshot(&snapshot("B", 7, 25.0, 25.0, 9000.0, 2000.0)).unwrap();
    store.insert_snapshot(&snapshot("A", 14, 50.0, 50.0, 1000.0, 2000.0)).unwrap();
    store.insert_snapshot(&snapshot("B", 14, 50.0, 40.0, 1500.0, 2000.0)).unwrap();

    let dashboard = build_dashboard(&store, &test_config()).unwrap();
    assert_eq!(dashboard.kpis.total_spend, 2500.0);

    // Both weeks still chart.
    assert_eq!(dashboard.history.labels, vec![week(7), week(14)]);
    let a = &dashboard.history.series["A"];
    assert_eq!(a.actual, vec![Some(25.0), Some(50.0)]);
}

#[test]
fn empty_database_yields_neutral_dashboard() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let dashboard = build_dashboard(&store, &test_config()).unwrap();
    assert_eq!(dashboard.kpis.total_spend, 0.0);
    assert_eq!(dashboard.kpis.avg_cpi, None);
    assert_eq!(dashboard.kpis.active_risks, 0);
    assert!(dashboard.grid.is_empty());
    assert!(dashboard.history.labels.is_empty());
    assert!(dashboard.history.series.is_empty());
    assert!(dashboard.bubbles.is_empty());
}

#[test]
fn bubbles_aggregate_approved_requests_with_zero_fill() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir);

    store.insert_workstream(&workstream("A", "Alpha", 2000.0)).unwrap();
    store.insert_workstream(&workstream("B", "Beta", 2000.0)).unwrap();
    store.insert_snapshot(&snapshot("A", 7, 50.0, 50.0, 1000.0, 2000.0)).unwrap();
    store.insert_snapshot(&snapshot("B", 7, 50.0, 20.0, 1500.0, 2000.0)).unwrap();

    for (id, status, cost) in [
        ("CR_1", CrStatus::Approved, 20_000.0),
        ("CR_2", CrStatus::Approved, 15_000.0),
        ("CR_3", CrStatus::Pending, 50_000.0),
        ("CR_4", CrStatus::Rejected, 50_000.0),
    ] {
        let cr = ChangeRequest::new(id, "B", week(10), "Scope change", status, cost, 5).unwrap();
        store.insert_change_request(&cr).unwrap();
    }

    let dashboard = build_dashboard(&store, &test_config()).unwrap();
    assert_eq!(dashboard.kpis.active_risks, 2);
    assert_eq!(dashboard.bubbles.len(), 2);

    let alpha = dashboard.bubbles.iter().find(|b| b.label == "Alpha").unwrap();
    assert_eq!((alpha.cr_count, alpha.total_cr_cost), (0, 0.0));

    let beta = dashboard.bubbles.iter().find(|b| b.label == "Beta").unwrap();
    assert_eq!(beta.cr_count, 2);
    assert_eq!(beta.total_cr_cost, 35_000.0);
    assert_eq!(beta.radius, 3.5);
    assert_eq!(beta.schedule_variance, -30.0);
}

#[test]
fn avg_cpi_is_mean_over_latest_week() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir);

    store.insert_workstream(&workstream("A", "Alpha", 2000.0)).unwrap();
    store.insert_workstream(&workstream("B", "Beta", 2000.0)).unwrap();
    let a = snapshot("A", 7, 50.0, 50.0, 999.0, 2000.0); // cpi = 1000/1000 = 1.0
    let b = snapshot("B", 7, 50.0, 50.0, 1999.0, 2000.0); // cpi = 1000/2000 = 0.5
    store.insert_snapshot(&a).unwrap();
    store.insert_snapshot(&b).unwrap();

    let dashboard = build_dashboard(&store, &test_config()).unwrap();
    let avg = dashboard.kpis.avg_cpi.unwrap();
    assert!((avg - 0.75).abs() < 1e-9, "avg_cpi {avg}");
}

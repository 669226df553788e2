//! SQLite-backed fact store. Dates are persisted as ISO-8601 text so
//! lexicographic `MAX`/`ORDER BY` match chronological order. Malformed rows
//! surface as errors to the caller; there are no retries here.

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection};

use crate::domain::{ChangeRequest, Complexity, CrStatus, ProgressSnapshot, Workstream};

const DATE_FMT: &str = "%Y-%m-%d";

pub struct FactStore {
    conn: Connection,
}

impl FactStore {
    pub fn open(path: &str) -> Result<Self> {
        Ok(Self { conn: Connection::open(path)? })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self { conn: Connection::open_in_memory()? })
    }

    pub fn init(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "BEGIN;
            CREATE TABLE IF NOT EXISTS workstreams (
                ws_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                owner TEXT NOT NULL,
                budget REAL NOT NULL,
                complexity TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS progress (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                week_ending TEXT NOT NULL,
                ws_id TEXT NOT NULL REFERENCES workstreams(ws_id),
                planned_pct REAL NOT NULL,
                actual_pct REAL NOT NULL,
                budget_spent REAL NOT NULL,
                schedule_variance REAL NOT NULL,
                cpi REAL NOT NULL,
                UNIQUE (ws_id, week_ending)
            );
            CREATE TABLE IF NOT EXISTS change_requests (
                cr_id TEXT PRIMARY KEY,
                ws_id TEXT NOT NULL REFERENCES workstreams(ws_id),
                date_raised TEXT NOT NULL,
                title TEXT NOT NULL,
                status TEXT NOT NULL,
                cost_impact REAL NOT NULL,
                time_impact_days INTEGER NOT NULL
            );
            COMMIT;",
        )?;
        Ok(())
    }

    pub fn insert_workstream(&self, ws: &Workstream) -> Result<()> {
        self.conn.execute(
            "INSERT INTO workstreams (ws_id, name, owner, budget, complexity)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![ws.id, ws.name, ws.owner, ws.budget, ws.complexity.as_str()],
        )?;
        Ok(())
    }

    /// Append a whole history in one transaction. The unique index on
    /// `(ws_id, week_ending)` rejects a second snapshot for the same week.
    pub fn insert_snapshots(&mut self, snapshots: &[ProgressSnapshot]) -> Result<()> {
        let tx = self.conn.transaction()?;
        for s in snapshots {
            tx.execute(
                "INSERT INTO progress
                    (week_ending, ws_id, planned_pct, actual_pct, budget_spent, schedule_variance, cpi)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    s.week_ending.format(DATE_FMT).to_string(),
                    s.workstream_id,
                    s.planned_pct,
                    s.actual_pct,
                    s.budget_spent,
                    s.schedule_variance,
                    s.cpi
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn insert_snapshot(&mut self, snapshot: &ProgressSnapshot) -> Result<()> {
        self.insert_snapshots(std::slice::from_ref(snapshot))
    }

    pub fn insert_change_request(&self, cr: &ChangeRequest) -> Result<()> {
        self.conn.execute(
            "INSERT INTO change_requests
                (cr_id, ws_id, date_raised, title, status, cost_impact, time_impact_days)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                cr.id,
                cr.workstream_id,
                cr.date_raised.format(DATE_FMT).to_string(),
                cr.title,
                cr.status.as_str(),
                cr.cost_impact,
                cr.time_impact_days
            ],
        )?;
        Ok(())
    }

    pub fn all_workstreams(&self) -> Result<Vec<Workstream>> {
        let mut stmt = self
            .conn
            .prepare("SELECT ws_id, name, owner, budget, complexity FROM workstreams ORDER BY ws_id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, name, owner, budget, complexity) = row?;
            out.push(Workstream::new(id, name, owner, budget, Complexity::parse(&complexity)?)?);
        }
        Ok(out)
    }

    /// Full history in chronological order.
    pub fn all_snapshots(&self) -> Result<Vec<ProgressSnapshot>> {
        let mut stmt = self.conn.prepare(
            "SELECT week_ending, ws_id, planned_pct, actual_pct, budget_spent, schedule_variance, cpi
             FROM progress ORDER BY week_ending ASC, ws_id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, f64>(6)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (week, ws_id, planned, actual, spent, variance, cpi) = row?;
            let week = NaiveDate::parse_from_str(&week, DATE_FMT)?;
            out.push(ProgressSnapshot::new(week, ws_id, planned, actual, spent, variance, cpi)?);
        }
        Ok(out)
    }

    pub fn all_change_requests(&self) -> Result<Vec<ChangeRequest>> {
        let mut stmt = self.conn.prepare(
            "SELECT cr_id, ws_id, date_raised, title, status, cost_impact, time_impact_days
             FROM change_requests ORDER BY cr_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, u32>(6)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, ws_id, raised, title, status, cost, days) = row?;
            let raised = NaiveDate::parse_from_str(&raised, DATE_FMT)?;
            out.push(ChangeRequest::new(id, ws_id, raised, title, CrStatus::parse(&status)?, cost, days)?);
        }
        Ok(out)
    }

    /// `MAX(week_ending)` over all snapshots; `None` when the log is empty.
    pub fn latest_week(&self) -> Result<Option<NaiveDate>> {
        let max: Option<String> =
            self.conn.query_row("SELECT MAX(week_ending) FROM progress", [], |row| row.get(0))?;
        match max {
            Some(s) => Ok(Some(NaiveDate::parse_from_str(&s, DATE_FMT)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> FactStore {
        let mut store = FactStore::open_in_memory().unwrap();
        store.init().unwrap();
        store
    }

    fn week(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn snapshot(ws: &str, day: u32, spend: f64) -> ProgressSnapshot {
        ProgressSnapshot::new(week(day), ws, 50.0, 40.0, spend, -10.0, 0.9).unwrap()
    }

    #[test]
    fn round_trips_all_three_tables() {
        let mut store = store();
        let ws = Workstream::new("WS_001", "Finance", "Sarah J.", 1_500_000.0, Complexity::High).unwrap();
        store.insert_workstream(&ws).unwrap();
        store.insert_snapshot(&snapshot("WS_001", 7, 1000.0)).unwrap();
        let cr = ChangeRequest::new("CR_1000", "WS_001", week(10), "Scope change", CrStatus::Approved, 20_000.0, 4)
            .unwrap();
        store.insert_change_request(&cr).unwrap();

        let workstreams = store.all_workstreams().unwrap();
        assert_eq!(workstreams.len(), 1);
        assert_eq!(workstreams[0].name, "Finance");
        assert_eq!(workstreams[0].complexity, Complexity::High);

        let snaps = store.all_snapshots().unwrap();
        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].week_ending, week(7));
        assert_eq!(snaps[0].budget_spent, 1000.0);

        let crs = store.all_change_requests().unwrap();
        assert_eq!(crs.len(), 1);
        assert_eq!(crs[0].status, CrStatus::Approved);
        assert_eq!(crs[0].time_impact_days, 4);
    }

    #[test]
    fn snapshots_come_back_in_chronological_order() {
        let mut store = store();
        store.insert_snapshot(&snapshot("WS_001", 21, 3000.0)).unwrap();
        store.insert_snapshot(&snapshot("WS_001", 7, 1000.0)).unwrap();
        store.insert_snapshot(&snapshot("WS_001", 14, 2000.0)).unwrap();

        let weeks: Vec<NaiveDate> = store.all_snapshots().unwrap().iter().map(|s| s.week_ending).collect();
        assert_eq!(weeks, vec![week(7), week(14), week(21)]);
    }

    #[test]
    fn duplicate_week_for_same_workstream_is_rejected() {
        let mut store = store();
        store.insert_snapshot(&snapshot("WS_001", 7, 1000.0)).unwrap();
        assert!(store.insert_snapshot(&snapshot("WS_001", 7, 1100.0)).is_err());
        // A different workstream may report the same week.
        store.insert_snapshot(&snapshot("WS_002", 7, 500.0)).unwrap();
    }

    #[test]
    fn latest_week_is_max_or_none() {
        let mut store = store();
        assert_eq!(store.latest_week().unwrap(), None);
        store.insert_snapshot(&snapshot("WS_001", 7, 1000.0)).unwrap();
        store.insert_snapshot(&snapshot("WS_001", 14, 2000.0)).unwrap();
        assert_eq!(store.latest_week().unwrap(), Some(week(14)));
    }

    #[test]
    fn unknown_status_row_surfaces_as_error() {
        let store = store();
        store
            .conn
            .execute(
                "INSERT INTO change_requests VALUES ('CR_X', 'WS_001', '2024-01-07', 't', 'Open', 0.0, 1)",
                [],
            )
            .unwrap();
        assert!(store.all_change_requests().is_err());
    }
}

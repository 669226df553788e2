use anyhow::Result;
use rand::thread_rng;

use oversight::aggregate;
use oversight::config::Config;
use oversight::domain::{Complexity, Workstream};
use oversight::generator::{HistoryGenerator, Persona};
use oversight::logging::{json_log, obj, v_num, v_str};
use oversight::storage::FactStore;

/// The sample portfolio: one on-track workstream, one at-risk (the failing
/// project narrative), the rest nominal.
fn sample_portfolio() -> Result<Vec<(Workstream, Persona)>> {
    Ok(vec![
        (
            Workstream::new("WS_001", "Finance (FICO)", "Sarah J.", 1_500_000.0, Complexity::High)?,
            Persona::OnTrack,
        ),
        (
            Workstream::new("WS_002", "Supply Chain (MM/SD)", "Mike R.", 2_200_000.0, Complexity::High)?,
            Persona::AtRisk,
        ),
        (
            Workstream::new("WS_003", "Human Capital (HXM)", "Amit P.", 800_000.0, Complexity::Medium)?,
            Persona::Nominal,
        ),
        (
            Workstream::new("WS_004", "Data Migration", "Emily W.", 600_000.0, Complexity::Critical)?,
            Persona::Nominal,
        ),
        (
            Workstream::new("WS_005", "Analytics (BW/SAC)", "John D.", 450_000.0, Complexity::Medium)?,
            Persona::Nominal,
        ),
    ])
}

fn main() -> Result<()> {
    let cfg = Config::from_env();

    // Rebuild the fact log from scratch on every run.
    if std::path::Path::new(&cfg.sqlite_path).exists() {
        std::fs::remove_file(&cfg.sqlite_path)?;
    }
    let mut store = FactStore::open(&cfg.sqlite_path)?;
    store.init()?;
    json_log(
        "seed",
        obj(&[
            ("status", v_str("schema_created")),
            ("path", v_str(&cfg.sqlite_path)),
            ("weeks", v_num(cfg.num_weeks as f64)),
            ("start_date", v_str(&cfg.start_date.to_string())),
        ]),
    );

    let mut gen = HistoryGenerator::new(&cfg, thread_rng());
    for (ws, persona) in sample_portfolio()? {
        store.insert_workstream(&ws)?;
        let history = gen.weekly_history(&ws, persona)?;
        store.insert_snapshots(&history)?;
        let change_requests = gen.change_requests(&ws, persona)?;
        for cr in &change_requests {
            store.insert_change_request(cr)?;
        }
        json_log(
            "seed",
            obj(&[
                ("workstream", v_str(&ws.id)),
                ("persona", v_str(persona.as_str())),
                ("snapshots", v_num(history.len() as f64)),
                ("change_requests", v_num(change_requests.len() as f64)),
            ]),
        );
    }

    let dashboard = aggregate::build_dashboard(&store, &cfg)?;
    json_log(
        "aggregate",
        obj(&[
            ("workstreams", v_num(dashboard.grid.len() as f64)),
            ("weeks", v_num(dashboard.history.labels.len() as f64)),
            ("total_spend", v_num(dashboard.kpis.total_spend)),
            ("avg_cpi", dashboard.kpis.avg_cpi.map(v_num).unwrap_or(serde_json::Value::Null)),
            ("active_risks", v_num(dashboard.kpis.active_risks as f64)),
        ]),
    );

    println!("{}", serde_json::to_string_pretty(&dashboard)?);
    Ok(())
}

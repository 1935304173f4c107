//! Non-interactive views printed as JSON.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use harvest_core::error::HarvestError;
use harvest_core::settings::Settings;
use harvest_data::reader::{open_source, RecordSource};
use harvest_runtime::dashboard::DashboardService;
use serde_json::{json, Value};

/// Build the JSON payload for `settings.view` (anything but `dashboard`).
///
/// The `health` view never fails: problems are reported inside the payload.
pub fn json_view(settings: &Settings, source_path: &Path) -> Result<Value> {
    if settings.view == "health" {
        let result = open_source(source_path, &settings.format).and_then(|source| {
            let rows = source.fetch_rows()?;
            build_service(settings, &rows)
        });
        return Ok(serde_json::to_value(DashboardService::health(&result))?);
    }

    let source = open_source(source_path, &settings.format)
        .with_context(|| format!("opening {}", source_path.display()))?;
    let rows = source.fetch_rows()?;
    tracing::debug!(rows = rows.len(), view = %settings.view, "building view");
    let service = build_service(settings, &rows)?;

    let today = Local::now().date_naive();
    let section = || {
        settings
            .section
            .clone()
            .or_else(|| service.sections().first().cloned())
            .context("no section to chart; pass --section")
    };
    let year = settings.year.unwrap_or(today.year());

    let value = match settings.view.as_str() {
        "dates" => json!({ "ok": true, "dates": service.available_dates() }),
        "day" => serde_json::to_value(service.snapshot(settings.date))?,
        "monthly" => {
            let month = settings.month.unwrap_or(today.month());
            serde_json::to_value(service.monthly_chart(&section()?, year, month))?
        }
        "yearly" => serde_json::to_value(service.yearly_chart(&section()?, year))?,
        "diag" => serde_json::to_value(service.diagnostics(source.describe()?))?,
        other => anyhow::bail!("Unknown view: {other}"),
    };

    Ok(value)
}

/// JSON body reported for a failed view.
///
/// `kind` is `configuration` when the settings do not match the data (fix the
/// flags), `source` for unreadable or malformed exports and `internal` for
/// anything else.
pub fn error_payload(err: &anyhow::Error) -> Value {
    let kind = match err.chain().find_map(|e| e.downcast_ref::<HarvestError>()) {
        Some(e) if e.is_configuration() => "configuration",
        Some(_) => "source",
        None => "internal",
    };
    json!({ "ok": false, "kind": kind, "error": format!("{err:#}") })
}

fn build_service(
    settings: &Settings,
    rows: &[harvest_core::models::SheetRow],
) -> harvest_core::Result<DashboardService> {
    DashboardService::from_rows(
        rows,
        &settings.bindings(),
        settings.date_order(),
        &settings.sections,
    )
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const CSV: &str = "Tanggal,Seksi,Nama Pemanen,Jumlah Janjang\n\
                       10/08/2025,A III,Agus,12\n\
                       10/08/2025,A III,Agus,3\n\
                       10/08/2025,C II,Sari,\"1,234\"\n\
                       not-a-date,A III,Budi,9\n\
                       02/14/2025,C II,Sari,4\n";

    fn export(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("panen.csv");
        std::fs::write(&path, CSV).unwrap();
        path
    }

    fn settings(extra: &[&str]) -> Settings {
        let mut args = vec!["harvest-dashboard"];
        args.extend_from_slice(extra);
        Settings::parse_from(args)
    }

    #[test]
    fn test_dates_view() {
        let dir = TempDir::new().unwrap();
        let value = json_view(&settings(&["--view", "dates"]), &export(&dir)).unwrap();
        assert_eq!(value["dates"], json!(["2025-10-08", "2025-02-14"]));
    }

    #[test]
    fn test_day_view_defaults_to_newest() {
        let dir = TempDir::new().unwrap();
        let value = json_view(&settings(&["--view", "day"]), &export(&dir)).unwrap();
        assert_eq!(value["selected_date"], "2025-10-08");
        assert_eq!(value["total"], 1249.0);
        assert_eq!(value["tables"][0]["section"], "A III");
        assert_eq!(value["tables"][0]["workers"][0]["worker"], "Agus");
        assert_eq!(value["tables"][0]["workers"][0]["quantity"], 15.0);
    }

    #[test]
    fn test_day_view_day_first_order() {
        let dir = TempDir::new().unwrap();
        let value = json_view(
            &settings(&["--view", "dates", "--date-order", "day-first"]),
            &export(&dir),
        )
        .unwrap();
        // 02/14/2025 is only valid month-first and still resolves.
        assert_eq!(value["dates"], json!(["2025-08-10", "2025-02-14"]));
    }

    #[test]
    fn test_monthly_view() {
        let dir = TempDir::new().unwrap();
        let value = json_view(
            &settings(&[
                "--view", "monthly", "--section", "C II", "--year", "2025", "--month", "2",
            ]),
            &export(&dir),
        )
        .unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(value["month"], 2);
        assert_eq!(value["data"].as_array().unwrap().len(), 28);
        assert_eq!(value["data"][13], json!({ "x": "2025-02-14", "y": 4.0 }));
    }

    #[test]
    fn test_yearly_view_defaults_to_first_section() {
        let dir = TempDir::new().unwrap();
        let value = json_view(
            &settings(&["--view", "yearly", "--year", "2025"]),
            &export(&dir),
        )
        .unwrap();
        assert_eq!(value["section"], "A III");
        assert_eq!(value["data"][9], json!({ "x": "2025-10", "y": 15.0 }));
        assert!(value.get("month").is_none());
    }

    #[test]
    fn test_diag_view() {
        let dir = TempDir::new().unwrap();
        let value = json_view(&settings(&["--view", "diag"]), &export(&dir)).unwrap();
        assert_eq!(value["dates_sample"], json!(["2025-02-14", "2025-10-08"]));
        assert_eq!(value["columns"]["quantity"], "Jumlah Janjang");
        assert_eq!(value["source"]["rows_count"], 5);
    }

    #[test]
    fn test_health_view_ok_and_failing() {
        let dir = TempDir::new().unwrap();
        let value = json_view(&settings(&["--view", "health"]), &export(&dir)).unwrap();
        assert_eq!(value, json!({ "ok": true, "msg": "healthy" }));

        let value = json_view(
            &settings(&["--view", "health", "--col-quantity", "Janjang"]),
            &export(&dir),
        )
        .unwrap();
        assert_eq!(value["ok"], false);
        assert!(value["error"].as_str().unwrap().contains("Janjang"));

        let missing = dir.path().join("missing.csv");
        let value = json_view(&settings(&["--view", "health"]), &missing).unwrap();
        assert_eq!(value["ok"], false);
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = json_view(
            &settings(&["--view", "day"]),
            &dir.path().join("missing.csv"),
        )
        .unwrap_err();
        let payload = error_payload(&err);
        assert_eq!(payload["ok"], false);
        assert_eq!(payload["kind"], "source");
        assert!(payload["error"].as_str().unwrap().contains("missing.csv"));
    }

    #[test]
    fn test_unbound_column_is_a_configuration_error() {
        let dir = TempDir::new().unwrap();
        let err = json_view(
            &settings(&["--view", "day", "--col-worker", "Pemanen"]),
            &export(&dir),
        )
        .unwrap_err();
        let payload = error_payload(&err);
        assert_eq!(payload["kind"], "configuration");
        assert!(payload["error"].as_str().unwrap().contains("Pemanen"));
    }

    #[test]
    fn test_unknown_view_is_internal() {
        let dir = TempDir::new().unwrap();
        let mut weekly = settings(&["--view", "day"]);
        weekly.view = "weekly".to_string();
        let err = json_view(&weekly, &export(&dir)).unwrap_err();
        assert_eq!(error_payload(&err)["kind"], "internal");
    }
}

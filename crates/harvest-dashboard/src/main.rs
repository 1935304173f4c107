mod bootstrap;
mod views;

use anyhow::{Context, Result};
use chrono::Local;
use harvest_core::settings::Settings;
use harvest_data::reader::open_source;
use harvest_runtime::data_manager::DataManager;
use harvest_runtime::orchestrator::{AggregationConfig, DashboardOrchestrator};
use harvest_ui::app::{App, ViewMode};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    let state_dir = bootstrap::ensure_directories()?;
    let interactive = settings.view == "dashboard";
    let log_file = settings
        .log_file
        .clone()
        .or_else(|| interactive.then(|| bootstrap::default_log_file(&state_dir)));
    bootstrap::setup_logging(&settings.log_level, log_file.as_deref())?;

    tracing::info!("Harvest Dashboard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "View: {}, Theme: {}, Date order: {}",
        settings.view,
        settings.theme,
        settings.date_order()
    );

    let source_path = settings
        .source
        .clone()
        .context("No data source configured; pass --source <export file or directory>")?;

    if !interactive {
        let value = match views::json_view(&settings, &source_path) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(error = %e, "view failed");
                println!("{}", serde_json::to_string_pretty(&views::error_payload(&e))?);
                std::process::exit(1);
            }
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    tracing::info!("Starting dashboard on {}", source_path.display());

    let source = open_source(&source_path, &settings.format)
        .with_context(|| format!("opening {}", source_path.display()))?;
    let data_manager = DataManager::new(source, settings.cache_ttl);
    let orchestrator = DashboardOrchestrator::new(
        u64::from(settings.refresh_rate),
        data_manager,
        AggregationConfig {
            bindings: settings.bindings(),
            order: settings.date_order(),
            sections: settings.sections.clone(),
        },
    );
    let (rx, handle) = orchestrator.start();

    let app = App::new(
        &settings.theme,
        ViewMode::Day,
        settings.date,
        Local::now().date_naive(),
    )
    .with_section(settings.section.as_deref(), &settings.sections)
    .with_period(settings.year, settings.month);

    tokio::select! {
        result = app.run(rx, handle) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received; shutting down");
        }
    }

    Ok(())
}

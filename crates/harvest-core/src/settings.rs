use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::{
    ColumnBindings, DateOrder, COL_DATE, COL_QUANTITY, COL_SECTION, COL_WORKER, DEFAULT_SECTIONS,
};

/// Name of the per-user state directory under `$HOME`.
pub const STATE_DIR: &str = ".harvest-dashboard";

fn default_sections() -> Vec<String> {
    DEFAULT_SECTIONS.iter().map(|s| s.to_string()).collect()
}

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Daily, monthly and yearly harvest summaries from a spreadsheet export
#[derive(Parser, Debug, Clone)]
#[command(
    name = "harvest-dashboard",
    about = "Daily, monthly and yearly harvest summaries from a spreadsheet export",
    version
)]
pub struct Settings {
    /// Spreadsheet export (CSV or JSON file, or a directory of exports)
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Export format
    #[arg(long, default_value = "auto", value_parser = ["auto", "csv", "json"])]
    pub format: String,

    /// View to produce
    #[arg(long, default_value = "dashboard", value_parser = ["dashboard", "dates", "day", "monthly", "yearly", "health", "diag"])]
    pub view: String,

    /// Date for the day view (YYYY-MM-DD); defaults to the newest date
    #[arg(long)]
    pub date: Option<chrono::NaiveDate>,

    /// Section for chart views; defaults to the first preferred section
    #[arg(long)]
    pub section: Option<String>,

    /// Year for chart views; defaults to the current year
    #[arg(long)]
    pub year: Option<i32>,

    /// Month for the monthly chart (1-12); defaults to the current month
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    /// Column holding the harvest date
    #[arg(long, default_value = COL_DATE)]
    pub col_date: String,

    /// Column holding the section
    #[arg(long, default_value = COL_SECTION)]
    pub col_section: String,

    /// Column holding the harvester's name
    #[arg(long, default_value = COL_WORKER)]
    pub col_worker: String,

    /// Column holding the bunch count
    #[arg(long, default_value = COL_QUANTITY)]
    pub col_quantity: String,

    /// Order of day and month in ambiguous dates
    #[arg(long, default_value = "month-first", value_parser = ["day-first", "month-first"])]
    pub date_order: String,

    /// Preferred section display order (comma separated)
    #[arg(long, value_delimiter = ',', default_values_t = default_sections())]
    pub sections: Vec<String>,

    /// Seconds before fetched rows are considered stale
    #[arg(long, default_value = "30")]
    pub cache_ttl: u64,

    /// Dashboard refresh rate in seconds (1-300)
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u32).range(1..=300))]
    pub refresh_rate: u32,

    /// Display theme
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "classic", "auto"])]
    pub theme: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.harvest-dashboard/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_order: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<ColumnBindings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_ttl: Option<u64>,
}

impl LastUsedParams {
    /// Default path of the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir`.
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(STATE_DIR).join("last_used.json")
    }

    /// Load persisted params; `Default` when the file is absent or unreadable.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to `path`, creating parent directories.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at `path` if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, fill unset values from the last run and persist
    /// the merged result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Same as [`Settings::load_with_last_used`] with explicit arguments and
    /// config path.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!(error = %e, "could not clear saved configuration");
            }
            return Self::resolve(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins.
        if !is_arg_explicitly_set(&matches, "source") && settings.source.is_none() {
            settings.source = last.source;
        }
        if !is_arg_explicitly_set(&matches, "format") {
            if let Some(v) = last.format {
                settings.format = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "theme") {
            if let Some(v) = last.theme {
                settings.theme = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "date_order") {
            if let Some(v) = last.date_order {
                settings.date_order = v;
            }
        }
        if let Some(columns) = last.columns {
            if !is_arg_explicitly_set(&matches, "col_date") {
                settings.col_date = columns.date;
            }
            if !is_arg_explicitly_set(&matches, "col_section") {
                settings.col_section = columns.section;
            }
            if !is_arg_explicitly_set(&matches, "col_worker") {
                settings.col_worker = columns.worker;
            }
            if !is_arg_explicitly_set(&matches, "col_quantity") {
                settings.col_quantity = columns.quantity;
            }
        }
        if !is_arg_explicitly_set(&matches, "sections") {
            if let Some(v) = last.sections {
                settings.sections = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "refresh_rate") {
            if let Some(v) = last.refresh_rate {
                settings.refresh_rate = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "cache_ttl") {
            if let Some(v) = last.cache_ttl {
                settings.cache_ttl = v;
            }
        }

        settings = Self::resolve(settings);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::debug!(error = %e, "could not persist last-used parameters");
        }

        settings
    }

    /// Column bindings assembled from the `--col-*` flags.
    pub fn bindings(&self) -> ColumnBindings {
        ColumnBindings {
            date: self.col_date.clone(),
            section: self.col_section.clone(),
            worker: self.col_worker.clone(),
            quantity: self.col_quantity.clone(),
        }
    }

    /// Parsed `--date-order`, falling back to the default for unknown values.
    pub fn date_order(&self) -> DateOrder {
        self.date_order.parse().unwrap_or_default()
    }

    /// Apply `--debug` and tidy the section list.
    fn resolve(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings.sections = settings
            .sections
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        settings
    }
}

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            source: s.source.clone(),
            format: Some(s.format.clone()),
            theme: Some(s.theme.clone()),
            date_order: Some(s.date_order.clone()),
            columns: Some(s.bindings()),
            sections: Some(s.sections.clone()),
            refresh_rate: Some(s.refresh_rate),
            cache_ttl: Some(s.cache_ttl),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line.
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

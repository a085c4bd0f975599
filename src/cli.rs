//! Command-line interface components.

use crate::config::{ExtractorConfig, SheetPolicy, default_catalog_dir, default_data_dir};
use crate::constants::LAYOUTS_DIR_NAME;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "schedule-extractor")]
#[command(about = "Extract typed subject records from university schedule workbooks")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Path to the schedule workbook (.xlsx, .xls, .ods)
    #[arg(value_name = "WORKBOOK")]
    pub workbook: PathBuf,

    /// Directory of layout definition files
    #[arg(short, long, value_name = "DIR")]
    pub layouts: Option<PathBuf>,

    /// Directory of per-program catalog files used to fill missing semesters
    #[arg(short, long, value_name = "DIR")]
    pub catalogs: Option<PathBuf>,

    /// Disable semester backfill even when catalogs are available
    #[arg(long)]
    pub no_backfill: bool,

    /// Skip sheets whose header matches no layout instead of failing
    #[arg(long)]
    pub skip_unmatched: bool,

    /// Header marker word, repeatable (replaces the defaults)
    #[arg(long = "marker", value_name = "WORD")]
    pub markers: Vec<String>,

    /// Write the extracted records as JSON ('-' for stdout)
    #[arg(long, value_name = "FILE")]
    pub json: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Get the layouts directory, defaulting to the user data directory
    pub fn layouts_dir(&self) -> PathBuf {
        self.layouts
            .clone()
            .unwrap_or_else(|| default_data_dir().join(LAYOUTS_DIR_NAME))
    }

    /// Get the catalogs directory when one was given or the default exists
    pub fn catalog_dir(&self) -> Option<PathBuf> {
        self.catalogs.clone().or_else(|| {
            let default = default_catalog_dir();
            default.is_dir().then_some(default)
        })
    }

    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }

    /// Build the engine configuration from the arguments
    pub fn to_config(&self) -> ExtractorConfig {
        let mut config = ExtractorConfig::new(self.layouts_dir());

        if let Some(catalog_dir) = self.catalog_dir() {
            config = config.with_catalog_dir(catalog_dir);
        }
        if self.no_backfill {
            config = config.without_backfill();
        }
        if self.skip_unmatched {
            config = config.with_sheet_policy(SheetPolicy::Skip);
        }
        if !self.markers.is_empty() {
            config = config.with_header_markers(self.markers.iter().cloned());
        }

        config
    }

    /// Whether JSON goes to stdout rather than a file
    pub fn json_to_stdout(&self) -> bool {
        self.json.as_deref().is_some_and(|p| p.as_os_str() == "-")
    }
}

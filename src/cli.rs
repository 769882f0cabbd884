//! Command-line surface of the `workday-autofill` binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::config::BrowserConfig;
use crate::profile::Settings;

/// Fill Workday job applications from a YAML profile
#[derive(Debug, Parser)]
#[command(name = "workday-autofill")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Profile and run settings
    #[arg(short, long, default_value = "config/data.yml", global = true)]
    pub config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run Chrome headless (overrides `headless` in the profile)
    #[arg(long, global = true)]
    pub headless: Option<bool>,

    /// Upper bound in seconds for every page wait
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Chrome/Chromium executable to launch
    #[arg(long, global = true)]
    pub chrome_path: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sign in and walk the application, filling every step
    Apply {
        /// Stop on the review page without clicking Submit
        #[arg(long)]
        no_submit: bool,

        /// Write the per-step reports as JSON
        #[arg(long)]
        report: Option<PathBuf>,

        /// Fill attempts per step before validation errors end the run
        #[arg(long, default_value_t = 3)]
        max_attempts: u32,

        /// Directory for failure screenshots
        #[arg(long, default_value = ".")]
        artifacts_dir: PathBuf,
    },

    /// Walk the application without submitting and dump every step's fields
    Extract {
        /// Output file, keyed by step
        #[arg(short, long, default_value = "extracted_form_data.json")]
        output: PathBuf,
    },
}

impl Cli {
    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }

    /// Browser settings: command line first, then the profile, then defaults.
    pub fn browser_config(&self, settings: &Settings) -> BrowserConfig {
        let mut config = BrowserConfig::default();
        if let Some(headless) = self.headless.or(settings.headless) {
            config.headless = headless;
        }
        if let Some(secs) = self.timeout_secs.or(settings.timeout_secs) {
            config.default_timeout = Duration::from_secs(secs);
        }
        config.chrome_path = self.chrome_path.clone();
        config
    }
}

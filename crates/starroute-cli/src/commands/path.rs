//! Path command handler for point-to-point routes.

use anyhow::{Context, Result};
use tracing::info;

use starroute_cli::output::{emit, format_path};
use starroute_lib::{PathOptions, Router, DEFAULT_CORRIDOR_BUFFER, DEFAULT_JUMP_RANGE};

use crate::commands::load_dataset;
use crate::GlobalOptions;

#[derive(clap::Args, Debug, Clone)]
pub struct PathArgs {
    /// Starting system name.
    #[arg(long = "from")]
    pub from: String,
    /// Destination system name.
    #[arg(long = "to")]
    pub to: String,
    /// Maximum jump distance in light-years.
    #[arg(long, default_value_t = DEFAULT_JUMP_RANGE)]
    pub jump_range: f64,
    /// Search corridor radius around the direct line, in light-years.
    #[arg(long, default_value_t = DEFAULT_CORRIDOR_BUFFER)]
    pub buffer: f64,
}

impl PathArgs {
    pub fn to_options(&self) -> PathOptions {
        PathOptions {
            jump_range: self.jump_range,
            corridor_buffer: self.buffer,
        }
    }
}

/// Handle the path subcommand.
pub fn handle_path(global: &GlobalOptions, args: &PathArgs) -> Result<()> {
    let options = args.to_options();
    options.validate().context("invalid path options")?;

    let catalog = load_dataset(global)?;
    let start = catalog.resolve(&args.from)?;
    let goal = catalog.resolve(&args.to)?;

    let router = Router::new(&catalog);
    let result = router.solve(&start.name, &goal.name, &options);
    info!(
        from = %start.name,
        to = %goal.name,
        valid = result.is_valid(),
        jumps = result.hop_count(),
        "path computed"
    );

    emit(&format_path(&result, global.format, global.names_only)?)
}

//! Subcommand handlers. `main.rs` parses arguments and dispatches here.

pub mod path;
pub mod tour;

use anyhow::{Context, Result};
use starroute_lib::{load_catalog, resolve_dataset_path, Catalog};

use crate::GlobalOptions;

/// Resolve and load the systems dataset selected by the global options.
pub fn load_dataset(global: &GlobalOptions) -> Result<Catalog> {
    let path = resolve_dataset_path(global.data.as_deref())
        .context("failed to locate the systems dataset")?;
    load_catalog(&path).with_context(|| format!("failed to load dataset from {}", path.display()))
}

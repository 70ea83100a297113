//! Tour and matrix command handlers.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::ValueEnum;
use tracing::info;

use starroute_cli::output::{emit, format_matrix, format_tour};
use starroute_lib::tour::preview_matrix;
use starroute_lib::{
    load_destinations, spawn_tour, Catalog, CostModel, FirstSolution, OptimizerOptions,
    PathOptions, TourPlanner, TourRequest, DEFAULT_CORRIDOR_BUFFER, DEFAULT_JUMP_RANGE,
    DEFAULT_MAX_STOPS,
};

use crate::commands::load_dataset;
use crate::GlobalOptions;

/// Cost used to fill the tour matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CostArg {
    /// Straight-line distance between stops.
    #[default]
    Euclidean,
    /// Number of jumps on the path between stops.
    Jumps,
}

/// Heuristic building the first tour before local search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FirstSolutionArg {
    #[default]
    CheapestInsertion,
    NearestNeighbor,
}

impl From<FirstSolutionArg> for FirstSolution {
    fn from(value: FirstSolutionArg) -> Self {
        match value {
            FirstSolutionArg::CheapestInsertion => FirstSolution::CheapestInsertion,
            FirstSolutionArg::NearestNeighbor => FirstSolution::NearestNeighbor,
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct TourArgs {
    /// JSON file listing the destinations to visit.
    #[arg(long)]
    pub destinations: PathBuf,
    /// System the tour starts and ends at. Without it, the first destination
    /// is used as reference and the closest destination becomes the start.
    #[arg(long)]
    pub origin: Option<String>,
    /// Keep at most this many destinations, closest first.
    #[arg(long, default_value_t = DEFAULT_MAX_STOPS)]
    pub max_stops: usize,
    /// Cost model for ordering stops.
    #[arg(long, value_enum, default_value_t = CostArg::Euclidean)]
    pub cost: CostArg,
    /// Jump range used by the `jumps` cost model, in light-years.
    #[arg(long, default_value_t = DEFAULT_JUMP_RANGE)]
    pub jump_range: f64,
    /// Corridor radius used by the `jumps` cost model, in light-years.
    #[arg(long, default_value_t = DEFAULT_CORRIDOR_BUFFER)]
    pub buffer: f64,
    /// First-solution heuristic.
    #[arg(long, value_enum, default_value_t = FirstSolutionArg::CheapestInsertion)]
    pub first_solution: FirstSolutionArg,
    /// Skip 2-opt improvement of the first solution.
    #[arg(long)]
    pub no_improve: bool,
}

impl TourArgs {
    pub fn cost_model(&self) -> Result<CostModel> {
        match self.cost {
            CostArg::Euclidean => Ok(CostModel::Euclidean),
            CostArg::Jumps => {
                let options = PathOptions {
                    jump_range: self.jump_range,
                    corridor_buffer: self.buffer,
                };
                options.validate().context("invalid path options")?;
                Ok(CostModel::JumpCount(options))
            }
        }
    }

    pub fn optimizer(&self) -> OptimizerOptions {
        OptimizerOptions {
            first_solution: self.first_solution.into(),
            improve: !self.no_improve,
        }
    }

    /// Load destinations into `catalog` and build the planning request.
    pub fn to_request(&self, catalog: &mut Catalog) -> Result<TourRequest> {
        let cost_model = self.cost_model()?;
        let destinations = load_destinations(&self.destinations, catalog).with_context(|| {
            format!(
                "failed to load destinations from {}",
                self.destinations.display()
            )
        })?;

        let mut request = TourRequest::new(destinations)
            .with_max_count(self.max_stops)
            .with_cost_model(cost_model)
            .with_optimizer(self.optimizer());
        if let Some(origin) = &self.origin {
            request = request.with_origin(catalog.resolve(origin)?);
        }
        Ok(request)
    }
}

/// Handle the tour subcommand.
///
/// Planning runs on the blocking pool and the command waits for its single
/// completion.
pub async fn handle_tour(global: &GlobalOptions, args: &TourArgs) -> Result<()> {
    let mut catalog = load_dataset(global)?;
    let request = args.to_request(&mut catalog)?;
    let planner = TourPlanner::new(&catalog);

    let started = Instant::now();
    let outcome = spawn_tour(planner, request)
        .await
        .context("tour planning did not complete")?;
    info!(
        state = ?outcome.final_state(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "tour request finished"
    );

    emit(&format_tour(&outcome, global.format, global.names_only)?)
}

/// Handle the matrix subcommand.
pub fn handle_matrix(global: &GlobalOptions, args: &TourArgs) -> Result<()> {
    let mut catalog = load_dataset(global)?;
    let request = args.to_request(&mut catalog)?;
    let planner = TourPlanner::new(&catalog);

    let (stops, matrix) = preview_matrix(&planner, &request);

    emit(&format_matrix(&stops, &matrix, global.format)?)
}

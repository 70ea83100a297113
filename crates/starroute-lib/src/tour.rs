//! Multi-stop tour planning.
//!
//! A [`TourPlanner`] takes a set of candidate destinations, keeps the ones
//! closest to the origin, builds their pairwise cost matrix, lets a
//! [`RouteOptimizer`] order them and finally expands every stop into one row
//! per settlement with running distances.
//!
//! Planning can run synchronously through [`TourPlanner::plan`] or in the
//! background through [`spawn_tour`], which hands back a [`TourTask`] future.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, Location};
use crate::error::Result;
use crate::matrix::{build_matrix_with, CostModel, DistanceMatrix};
use crate::optimizer::{LocalSearchOptimizer, OptimizerOptions, RouteOptimizer};
use crate::path::Router;

/// Default cap on the number of destinations in one tour.
pub const DEFAULT_MAX_STOPS: usize = 100;

/// Label shown for rows at the origin, which has no settlements of its own.
pub const ORIGIN_LABEL: &str = "Point of Origin";

/// Input to the tour planner.
#[derive(Debug, Clone)]
pub struct TourRequest {
    /// Destinations to choose from.
    pub candidates: Vec<Arc<Location>>,
    /// Fixed start and end of the tour. When `None`, the first candidate acts
    /// as reference for selection and the closest candidate becomes the depot.
    pub origin: Option<Arc<Location>>,
    /// Maximum number of destinations kept after sorting by distance.
    pub max_count: usize,
    pub cost_model: CostModel,
    pub optimizer: OptimizerOptions,
}

impl TourRequest {
    pub fn new(candidates: Vec<Arc<Location>>) -> Self {
        Self {
            candidates,
            origin: None,
            max_count: DEFAULT_MAX_STOPS,
            cost_model: CostModel::default(),
            optimizer: OptimizerOptions::default(),
        }
    }

    pub fn with_origin(mut self, origin: Arc<Location>) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = max_count;
        self
    }

    pub fn with_cost_model(mut self, cost_model: CostModel) -> Self {
        self.cost_model = cost_model;
        self
    }

    pub fn with_optimizer(mut self, optimizer: OptimizerOptions) -> Self {
        self.optimizer = optimizer;
        self
    }
}

/// Phases of a single planning request. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TourState {
    Idle,
    Sorting,
    MatrixBuilding,
    Optimizing,
    Assembling,
    Completed,
    Failed,
}

impl TourState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TourState::Completed | TourState::Failed)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition(self, next: TourState) -> bool {
        use TourState::*;
        matches!(
            (self, next),
            (Idle, Sorting)
                | (Sorting, MatrixBuilding)
                | (Sorting, Completed)
                | (MatrixBuilding, Optimizing)
                | (Optimizing, Assembling)
                | (Optimizing, Failed)
                | (Assembling, Completed)
        )
    }
}

/// One line of a tour: a stop, or one settlement of a stop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TourRow {
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement: Option<String>,
    /// Row sits at the tour origin.
    pub origin: bool,
    pub leg_distance: f64,
    pub cumulative_distance: f64,
}

impl TourRow {
    /// Sub-location label: `planet / settlement`, the planet alone, or the origin marker.
    pub fn sublabel(&self) -> String {
        match (&self.planet, &self.settlement) {
            (Some(planet), Some(settlement)) => format!("{planet} / {settlement}"),
            (Some(planet), None) => planet.clone(),
            _ if self.origin => ORIGIN_LABEL.to_string(),
            _ => String::new(),
        }
    }
}

/// Ordered tour rows with running totals.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TourResult {
    pub rows: Vec<TourRow>,
    pub total_distance: f64,
}

impl TourResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row, adding `leg_distance` to the running total.
    pub fn push_row(
        &mut self,
        location: &str,
        planet: Option<&str>,
        settlement: Option<&str>,
        origin: bool,
        leg_distance: f64,
    ) {
        self.total_distance += leg_distance;
        self.rows.push(TourRow {
            location: location.to_string(),
            planet: planet.map(str::to_string),
            settlement: settlement.map(str::to_string),
            origin,
            leg_distance,
            cumulative_distance: self.total_distance,
        });
    }

    /// Location names in visiting order, with consecutive duplicates collapsed.
    pub fn stops(&self) -> Vec<&str> {
        let mut stops: Vec<&str> = Vec::new();
        for row in &self.rows {
            if stops.last() != Some(&row.location.as_str()) {
                stops.push(row.location.as_str());
            }
        }
        stops
    }
}

/// Completion delivered for a planning request.
///
/// Serializes as `{"status": ..., "tour": {"rows": [...], "total_distance": ...}}`;
/// outcomes without a tour carry an empty one.
#[derive(Debug, Clone, PartialEq)]
pub enum TourOutcome {
    Completed(TourResult),
    /// Nothing to visit; completes immediately.
    Empty,
    /// The optimizer found no feasible tour.
    NoSolution,
}

impl TourOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TourOutcome::Completed(_))
    }

    pub fn final_state(&self) -> TourState {
        match self {
            TourOutcome::Completed(_) | TourOutcome::Empty => TourState::Completed,
            TourOutcome::NoSolution => TourState::Failed,
        }
    }

    /// The tour, empty unless planning completed with rows.
    pub fn into_result(self) -> TourResult {
        match self {
            TourOutcome::Completed(result) => result,
            TourOutcome::Empty | TourOutcome::NoSolution => TourResult::default(),
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            TourOutcome::Completed(_) => "completed",
            TourOutcome::Empty => "empty",
            TourOutcome::NoSolution => "no_solution",
        }
    }
}

impl Serialize for TourOutcome {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let empty = TourResult::default();
        let tour = match self {
            TourOutcome::Completed(result) => result,
            TourOutcome::Empty | TourOutcome::NoSolution => &empty,
        };
        let mut state = serializer.serialize_struct("TourOutcome", 2)?;
        state.serialize_field("status", self.status())?;
        state.serialize_field("tour", tour)?;
        state.end()
    }
}

/// Records state transitions of one request.
#[derive(Debug)]
struct Progress {
    state: TourState,
    history: Vec<TourState>,
    started: Instant,
}

impl Progress {
    fn new() -> Self {
        Self {
            state: TourState::Idle,
            history: vec![TourState::Idle],
            started: Instant::now(),
        }
    }

    fn advance(&mut self, next: TourState) {
        debug_assert!(
            self.state.can_transition(next),
            "invalid tour transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(
            from = ?self.state,
            state = ?next,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "tour state transition"
        );
        self.state = next;
        self.history.push(next);
    }
}

/// Plans tours against a frozen snapshot of the catalog.
#[derive(Debug, Clone, Default)]
pub struct TourPlanner {
    router: Router,
}

impl TourPlanner {
    pub fn new(catalog: &Catalog) -> Self {
        Self::with_router(Router::new(catalog))
    }

    /// Use an existing router, which point-to-point matrix costs are solved with.
    pub fn with_router(router: Router) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Plan a tour with the optimizer configured on the request.
    pub fn plan(&self, request: &TourRequest) -> TourOutcome {
        let optimizer = LocalSearchOptimizer::new(request.optimizer);
        self.plan_with(request, &optimizer).0
    }

    /// Plan a tour with a caller-supplied optimizer, also returning the
    /// sequence of states the request went through.
    pub fn plan_with(
        &self,
        request: &TourRequest,
        optimizer: &dyn RouteOptimizer,
    ) -> (TourOutcome, Vec<TourState>) {
        let mut progress = Progress::new();
        let outcome = self.run(request, optimizer, &mut progress);
        (outcome, progress.history)
    }

    fn run(
        &self,
        request: &TourRequest,
        optimizer: &dyn RouteOptimizer,
        progress: &mut Progress,
    ) -> TourOutcome {
        progress.advance(TourState::Sorting);
        let stops = select_stops(request);
        if stops.is_empty() {
            debug!(candidates = request.candidates.len(), "nothing to visit");
            progress.advance(TourState::Completed);
            return TourOutcome::Empty;
        }

        progress.advance(TourState::MatrixBuilding);
        let matrix = build_matrix_with(&stops, &request.cost_model, &self.router);

        progress.advance(TourState::Optimizing);
        let Some(order) = optimizer.solve(&matrix, 0) else {
            warn!(stops = stops.len(), "no solution found");
            progress.advance(TourState::Failed);
            return TourOutcome::NoSolution;
        };

        progress.advance(TourState::Assembling);
        let result = assemble(&stops, &order.stops);
        progress.advance(TourState::Completed);

        info!(
            stops = stops.len(),
            rows = result.rows.len(),
            total_distance = result.total_distance,
            matrix_cost = order.cost,
            "tour planned"
        );
        TourOutcome::Completed(result)
    }
}

/// Sort candidates by distance to the reference, keep the closest
/// `max_count` and put the fixed origin (if any) at index 0.
///
/// A candidate sharing the origin's name is dropped, since the origin is
/// visited anyway.
pub fn select_stops(request: &TourRequest) -> Vec<Arc<Location>> {
    let mut candidates: Vec<Arc<Location>> = match &request.origin {
        Some(origin) => request
            .candidates
            .iter()
            .filter(|candidate| candidate.name != origin.name)
            .cloned()
            .collect(),
        None => request.candidates.clone(),
    };

    let Some(reference) = request
        .origin
        .as_ref()
        .or_else(|| request.candidates.first())
        .map(|location| location.position)
    else {
        return Vec::new();
    };

    candidates.sort_by(|a, b| {
        a.position
            .distance_to(&reference)
            .total_cmp(&b.position.distance_to(&reference))
    });
    candidates.truncate(request.max_count);
    if candidates.is_empty() {
        return candidates;
    }

    if let Some(origin) = &request.origin {
        candidates.insert(0, Arc::clone(origin));
    }
    candidates
}

/// Expand an optimized visiting order into tour rows.
///
/// Leg distances are straight-line distances between consecutive stops,
/// whatever cost model ordered them. The first row of a stop carries its leg,
/// later settlement rows at the same stop carry zero. A final row returns to
/// the depot.
pub fn assemble(stops: &[Arc<Location>], order: &[usize]) -> TourResult {
    let mut result = TourResult::default();
    let Some(depot) = stops.first() else {
        return result;
    };

    let mut previous = 0usize;
    for &index in order {
        let stop = &stops[index];
        let leg = if index == 0 {
            0.0
        } else {
            stop.distance_to(&stops[previous])
        };
        previous = index;
        push_stop(&mut result, stop, index == 0, leg);
    }

    let closing = depot.distance_to(&stops[previous]);
    result.push_row(&depot.name, None, None, true, closing);
    result
}

fn push_stop(result: &mut TourResult, stop: &Location, is_depot: bool, leg: f64) {
    if stop.planets.is_empty() {
        result.push_row(&stop.name, None, None, is_depot, leg);
        return;
    }

    let mut leg = leg;
    for planet in &stop.planets {
        if planet.settlements.is_empty() {
            result.push_row(&stop.name, Some(&planet.name), None, false, leg);
            leg = 0.0;
            continue;
        }
        for settlement in &planet.settlements {
            result.push_row(&stop.name, Some(&planet.name), Some(settlement), false, leg);
            leg = 0.0;
        }
    }
}

/// Handle to a tour being planned on the blocking thread pool.
///
/// Awaiting the task yields the single completion for the request. A task
/// that panicked surfaces as [`crate::Error::TaskFailed`].
#[derive(Debug)]
pub struct TourTask {
    handle: JoinHandle<TourOutcome>,
}

impl TourTask {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Future for TourTask {
    type Output = Result<TourOutcome>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle)
            .poll(cx)
            .map(|joined| joined.map_err(Into::into))
    }
}

/// Plan a tour in the background. Must be called from within a tokio runtime.
pub fn spawn_tour(planner: TourPlanner, request: TourRequest) -> TourTask {
    let handle = tokio::task::spawn_blocking(move || planner.plan(&request));
    TourTask { handle }
}

/// Plan a tour in the background and deliver the completion to `on_complete`.
pub fn spawn_tour_with<F>(planner: TourPlanner, request: TourRequest, on_complete: F) -> JoinHandle<()>
where
    F: FnOnce(Result<TourOutcome>) + Send + 'static,
{
    let task = spawn_tour(planner, request);
    tokio::spawn(async move {
        on_complete(task.await);
    })
}

/// Select the stops of a request and build the matrix they would be
/// optimized with, without optimizing. Row `i` belongs to `stops[i]`.
pub fn preview_matrix(
    planner: &TourPlanner,
    request: &TourRequest,
) -> (Vec<Arc<Location>>, DistanceMatrix) {
    let stops = select_stops(request);
    let matrix = build_matrix_with(&stops, &request.cost_model, planner.router());
    (stops, matrix)
}

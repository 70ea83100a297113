//! Single-vehicle route optimizer over a [`DistanceMatrix`].
//!
//! The optimizer builds a first solution with a construction heuristic
//! (cheapest insertion by default) and then improves it with 2-opt moves
//! until no improving move is left. Arcs whose matrix cell is not a finite
//! value are forbidden. When a greedy construction gets stuck on them, the
//! other heuristic and then a depth-first search over reachable arcs are
//! tried before the optimizer reports that no solution exists.

use serde::Serialize;
use tracing::debug;

use crate::matrix::DistanceMatrix;

/// Upper bound on 2-opt passes, so degenerate floating point input cannot
/// keep the improvement loop alive.
const MAX_IMPROVEMENT_PASSES: usize = 1_000;

/// Improvements smaller than this are treated as noise.
const IMPROVEMENT_EPSILON: f64 = 1e-9;

/// Node extensions the fallback tour search may try before giving up.
const MAX_SEARCH_STEPS: usize = 200_000;

/// Construction heuristic used for the first solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FirstSolution {
    /// Repeatedly insert the stop whose cheapest insertion adds the least cost.
    #[default]
    CheapestInsertion,
    /// Always travel to the closest unvisited stop.
    NearestNeighbor,
}

/// Optimizer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OptimizerOptions {
    pub first_solution: FirstSolution,
    /// Run 2-opt local search on the first solution.
    pub improve: bool,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            first_solution: FirstSolution::CheapestInsertion,
            improve: true,
        }
    }
}

/// Visiting order produced by an optimizer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TourOrder {
    /// Matrix indices in visiting order, starting at the depot. The return to
    /// the depot is implicit and not repeated at the end.
    pub stops: Vec<usize>,
    /// Matrix cost of the closed tour, including the return leg.
    pub cost: f64,
}

/// Strategy seam for combinatorial route solvers.
pub trait RouteOptimizer: Send + Sync {
    /// Order every matrix index into one closed tour starting at `depot`.
    ///
    /// Returns `None` when no tour uses only reachable arcs.
    fn solve(&self, matrix: &DistanceMatrix, depot: usize) -> Option<TourOrder>;
}

/// Construction heuristic followed by optional 2-opt improvement.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSearchOptimizer {
    options: OptimizerOptions,
}

impl LocalSearchOptimizer {
    pub fn new(options: OptimizerOptions) -> Self {
        Self { options }
    }

    /// Build a first tour with the configured heuristic, falling back to the
    /// other heuristic and finally to [`search_tour`] when it gets stuck.
    fn first_solution(&self, matrix: &DistanceMatrix, depot: usize) -> Option<Vec<usize>> {
        let insertion = cheapest_insertion as Construction;
        let greedy = nearest_neighbor as Construction;
        let (primary, secondary) = match self.options.first_solution {
            FirstSolution::CheapestInsertion => (insertion, greedy),
            FirstSolution::NearestNeighbor => (greedy, insertion),
        };

        if let Some(stops) = primary(matrix, depot) {
            return Some(stops);
        }
        debug!(
            strategy = ?self.options.first_solution,
            "first-solution heuristic stuck on unreachable arcs, falling back"
        );
        secondary(matrix, depot).or_else(|| search_tour(matrix, depot))
    }
}

type Construction = fn(&DistanceMatrix, usize) -> Option<Vec<usize>>;

impl RouteOptimizer for LocalSearchOptimizer {
    fn solve(&self, matrix: &DistanceMatrix, depot: usize) -> Option<TourOrder> {
        if depot >= matrix.len() {
            return None;
        }

        let mut stops = self.first_solution(matrix, depot)?;
        let first_cost = tour_cost(matrix, &stops)?;

        if self.options.improve {
            two_opt(matrix, &mut stops);
        }
        let cost = tour_cost(matrix, &stops)?;

        debug!(
            stops = stops.len(),
            first_cost,
            cost,
            strategy = ?self.options.first_solution,
            "optimized tour"
        );
        Some(TourOrder { stops, cost })
    }
}

/// Cost of the closed tour, or `None` if it uses an unreachable arc.
pub fn tour_cost(matrix: &DistanceMatrix, stops: &[usize]) -> Option<f64> {
    if stops.len() < 2 {
        return Some(0.0);
    }
    let mut total = 0.0;
    for (index, &from) in stops.iter().enumerate() {
        let to = stops[(index + 1) % stops.len()];
        total += matrix.cost(from, to)?;
    }
    Some(total)
}

/// Insertion delta for placing `node` between `before` and `after`.
fn insertion_cost(matrix: &DistanceMatrix, before: usize, node: usize, after: usize) -> Option<f64> {
    let added = matrix.cost(before, node)? + matrix.cost(node, after)?;
    let removed = if before == after {
        0.0
    } else {
        matrix.cost(before, after)?
    };
    Some(added - removed)
}

fn cheapest_insertion(matrix: &DistanceMatrix, depot: usize) -> Option<Vec<usize>> {
    let size = matrix.len();
    let mut tour = vec![depot];
    let mut remaining: Vec<usize> = (0..size).filter(|&node| node != depot).collect();

    while !remaining.is_empty() {
        // (remaining index, insert position, delta)
        let mut best: Option<(usize, usize, f64)> = None;
        for (candidate, &node) in remaining.iter().enumerate() {
            for position in 0..tour.len() {
                let before = tour[position];
                let after = tour[(position + 1) % tour.len()];
                let Some(delta) = insertion_cost(matrix, before, node, after) else {
                    continue;
                };
                if best.map_or(true, |(_, _, cost)| delta < cost) {
                    best = Some((candidate, position + 1, delta));
                }
            }
        }

        let (candidate, position, _) = best?;
        let node = remaining.swap_remove(candidate);
        tour.insert(position, node);
    }

    Some(tour)
}

fn nearest_neighbor(matrix: &DistanceMatrix, depot: usize) -> Option<Vec<usize>> {
    let size = matrix.len();
    let mut visited = vec![false; size];
    let mut tour = Vec::with_capacity(size);
    let mut current = depot;
    visited[depot] = true;
    tour.push(depot);

    while tour.len() < size {
        let next = (0..size)
            .filter(|&node| !visited[node])
            .filter_map(|node| matrix.cost(current, node).map(|cost| (node, cost)))
            .min_by(|a, b| a.1.total_cmp(&b.1))?;
        visited[next.0] = true;
        tour.push(next.0);
        current = next.0;
    }

    matrix.cost(current, depot)?;
    Some(tour)
}

/// Depth-first search for any closed tour over reachable arcs, trying the
/// closest stop first at each step.
///
/// Returns `None` when no such tour exists or the search budget runs out.
pub fn search_tour(matrix: &DistanceMatrix, depot: usize) -> Option<Vec<usize>> {
    let size = matrix.len();
    if depot >= size {
        return None;
    }

    let mut tour = Vec::with_capacity(size);
    let mut visited = vec![false; size];
    let mut budget = MAX_SEARCH_STEPS;
    tour.push(depot);
    visited[depot] = true;

    if extend_tour(matrix, &mut tour, &mut visited, &mut budget) {
        Some(tour)
    } else {
        debug!(
            stops = size,
            exhausted = budget == 0,
            "no tour over reachable arcs"
        );
        None
    }
}

fn extend_tour(
    matrix: &DistanceMatrix,
    tour: &mut Vec<usize>,
    visited: &mut [bool],
    budget: &mut usize,
) -> bool {
    let (Some(&depot), Some(&current)) = (tour.first(), tour.last()) else {
        return false;
    };
    if tour.len() == visited.len() {
        return matrix.cost(current, depot).is_some();
    }

    let mut next: Vec<(usize, f64)> = (0..visited.len())
        .filter(|&node| !visited[node])
        .filter_map(|node| matrix.cost(current, node).map(|cost| (node, cost)))
        .collect();
    next.sort_by(|a, b| a.1.total_cmp(&b.1));

    for (node, _) in next {
        if *budget == 0 {
            return false;
        }
        *budget -= 1;

        visited[node] = true;
        tour.push(node);
        if extend_tour(matrix, tour, visited, budget) {
            return true;
        }
        tour.pop();
        visited[node] = false;
    }
    false
}

/// Improve `stops` in place with first-improvement 2-opt moves. The depot
/// stays at index 0.
fn two_opt(matrix: &DistanceMatrix, stops: &mut [usize]) {
    let n = stops.len();
    if n < 4 {
        return;
    }

    for _ in 0..MAX_IMPROVEMENT_PASSES {
        let mut improved = false;
        for i in 1..n - 1 {
            for j in i + 1..n {
                let a = stops[i - 1];
                let b = stops[i];
                let c = stops[j];
                let d = stops[(j + 1) % n];
                if a == d {
                    continue;
                }

                let (Some(ab), Some(cd), Some(ac), Some(bd)) = (
                    matrix.cost(a, b),
                    matrix.cost(c, d),
                    matrix.cost(a, c),
                    matrix.cost(b, d),
                ) else {
                    continue;
                };

                if ac + bd + IMPROVEMENT_EPSILON < ab + cd {
                    stops[i..=j].reverse();
                    improved = true;
                }
            }
        }
        if !improved {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::{Location, Position};
    use crate::matrix::{build_matrix, EuclideanCost, MatrixCell};

    fn matrix_for(coords: &[(f64, f64)]) -> DistanceMatrix {
        let locations: Vec<Arc<Location>> = coords
            .iter()
            .enumerate()
            .map(|(i, (x, y))| Arc::new(Location::new(format!("P{i}"), Position::new(*x, *y, 0.0))))
            .collect();
        build_matrix(&locations, &EuclideanCost)
    }

    fn square() -> DistanceMatrix {
        matrix_for(&[(0.0, 0.0), (10.0, 10.0), (10.0, 0.0), (0.0, 10.0)])
    }

    fn is_permutation(stops: &[usize], size: usize) -> bool {
        let mut sorted = stops.to_vec();
        sorted.sort_unstable();
        sorted == (0..size).collect::<Vec<_>>()
    }

    #[test]
    fn cheapest_insertion_walks_the_square_perimeter() {
        let order = LocalSearchOptimizer::default().solve(&square(), 0).expect("solution");
        assert_eq!(order.stops[0], 0);
        assert!(is_permutation(&order.stops, 4));
        assert!((order.cost - 40.0).abs() < 1e-9);
    }

    #[test]
    fn two_opt_untangles_crossing_tour() {
        let matrix = square();
        let mut stops = vec![0, 1, 2, 3];
        let crossed = tour_cost(&matrix, &stops).unwrap();
        two_opt(&matrix, &mut stops);
        let fixed = tour_cost(&matrix, &stops).unwrap();

        assert!(fixed < crossed);
        assert!((fixed - 40.0).abs() < 1e-9);
        assert_eq!(stops[0], 0);
    }

    #[test]
    fn nearest_neighbor_visits_everything() {
        let options = OptimizerOptions {
            first_solution: FirstSolution::NearestNeighbor,
            improve: false,
        };
        let matrix = matrix_for(&[(0.0, 0.0), (1.0, 0.0), (5.0, 0.0), (2.0, 0.0)]);
        let order = LocalSearchOptimizer::new(options).solve(&matrix, 0).unwrap();
        assert_eq!(order.stops, vec![0, 1, 3, 2]);
        assert!((order.cost - 10.0).abs() < 1e-9);
    }

    #[test]
    fn depot_only_tour_costs_nothing() {
        let matrix = matrix_for(&[(3.0, 3.0)]);
        let order = LocalSearchOptimizer::default().solve(&matrix, 0).unwrap();
        assert_eq!(order.stops, vec![0]);
        assert_eq!(order.cost, 0.0);
    }

    #[test]
    fn unreachable_stop_has_no_solution() {
        let mut matrix = matrix_for(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        matrix.set_pair(0, 2, MatrixCell::Unreachable);
        matrix.set_pair(1, 2, MatrixCell::Unreachable);

        assert!(LocalSearchOptimizer::default().solve(&matrix, 0).is_none());
        let nn = LocalSearchOptimizer::new(OptimizerOptions {
            first_solution: FirstSolution::NearestNeighbor,
            improve: true,
        });
        assert!(nn.solve(&matrix, 0).is_none());
    }

    #[test]
    fn optimizer_routes_around_a_single_forbidden_arc() {
        let mut matrix = square();
        matrix.set_pair(0, 2, MatrixCell::Unreachable);
        let order = LocalSearchOptimizer::default().solve(&matrix, 0).unwrap();

        assert!(is_permutation(&order.stops, 4));
        assert!(tour_cost(&matrix, &order.stops).is_some());
    }

    #[test]
    fn stop_bridging_two_unlinked_stops_is_still_visited() {
        // Node 4 only links to 0 and 1, which cannot reach each other, so no
        // insertion position ever exists for it.
        let mut matrix = matrix_for(&[
            (0.0, 0.0),
            (20.0, 0.0),
            (20.0, 15.0),
            (0.0, 15.0),
            (10.0, -5.0),
        ]);
        matrix.set_pair(0, 1, MatrixCell::Unreachable);
        matrix.set_pair(4, 2, MatrixCell::Unreachable);
        matrix.set_pair(4, 3, MatrixCell::Unreachable);
        assert!(cheapest_insertion(&matrix, 0).is_none());

        let order = LocalSearchOptimizer::default()
            .solve(&matrix, 0)
            .expect("feasible tour exists");
        assert_eq!(order.stops, vec![0, 4, 1, 2, 3]);
        assert_eq!(tour_cost(&matrix, &order.stops), Some(order.cost));
    }

    #[test]
    fn search_finds_tour_when_both_heuristics_get_stuck() {
        let mut matrix = matrix_for(&[(0.0, 0.0), (2.0, 0.0), (3.0, 1.0), (4.0, 0.0), (1.0, 0.0)]);
        matrix.set_pair(0, 1, MatrixCell::Unreachable);
        matrix.set_pair(0, 3, MatrixCell::Unreachable);
        matrix.set_pair(4, 2, MatrixCell::Unreachable);
        matrix.set_pair(4, 3, MatrixCell::Unreachable);

        assert!(cheapest_insertion(&matrix, 0).is_none());
        assert!(nearest_neighbor(&matrix, 0).is_none());
        assert_eq!(search_tour(&matrix, 0), Some(vec![0, 4, 1, 3, 2]));

        for first_solution in [FirstSolution::CheapestInsertion, FirstSolution::NearestNeighbor] {
            let order = LocalSearchOptimizer::new(OptimizerOptions {
                first_solution,
                improve: true,
            })
            .solve(&matrix, 0)
            .expect("feasible tour exists");
            assert!(is_permutation(&order.stops, 5));
            assert_eq!(order.stops[0], 0);
            assert!(tour_cost(&matrix, &order.stops).is_some());
        }
    }

    #[test]
    fn out_of_range_depot_is_rejected() {
        assert!(LocalSearchOptimizer::default().solve(&square(), 9).is_none());
    }
}

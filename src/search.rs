use std::cmp::Ordering;
use std::collections::BinaryHeap;

use grid_util::grid::{BoolGrid, Grid as _, SimpleGrid};
use grid_util::point::Point;
use log::{debug, info, warn};
use thiserror::Error;

use crate::grid::{Cell, Grid, GridError, Weight};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("The grid has no start cell")]
    MissingStart,
    #[error("The grid has no finish cell")]
    MissingFinish,
    #[error("({x}, {y}) is not the start cell of the grid")]
    NotStart { x: i32, y: i32 },
    #[error("({x}, {y}) is not the finish cell of the grid")]
    NotFinish { x: i32, y: i32 },
    #[error("({x}, {y}) lies outside the grid")]
    OutOfBounds { x: i32, y: i32 },
    #[error("The search context must be reset for this grid before running")]
    StaleContext,
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Frontier entry. Pops the smallest distance first and, among equal distances, the smallest
/// row-major index, which makes the visitation order fully deterministic.
struct SmallestDistanceHolder<W> {
    distance: W,
    index: usize,
    point: Point,
}

impl<W: PartialEq> Eq for SmallestDistanceHolder<W> {}

impl<W: PartialEq> PartialEq for SmallestDistanceHolder<W> {
    fn eq(&self, other: &Self) -> bool {
        self.distance.eq(&other.distance) && self.index == other.index
    }
}

impl<W: Ord> PartialOrd for SmallestDistanceHolder<W> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<W: Ord> Ord for SmallestDistanceHolder<W> {
    fn cmp(&self, other: &Self) -> Ordering {
        match other.distance.cmp(&self.distance) {
            Ordering::Equal => other.index.cmp(&self.index),
            s => s,
        }
    }
}

/// Per-run scoring of a Dijkstra search: tentative distances, the visited flags, the
/// predecessor of every reached cell (as a flat row-major index) and the visitation order. The
/// buffers are kept between runs; [reset](Self::reset) must be called before every run.
#[derive(Clone, Debug)]
pub struct SearchContext<W: Weight = u32> {
    distance: SimpleGrid<Option<W>>,
    visited: BoolGrid,
    previous: SimpleGrid<Option<usize>>,
    order: Vec<Point>,
    fresh: bool,
}

impl<W: Weight> SearchContext<W> {
    /// Creates a context sized for `grid` that is ready to run.
    pub fn new(grid: &Grid<W>) -> SearchContext<W> {
        let (w, h) = (grid.width(), grid.height());
        SearchContext {
            distance: SimpleGrid::new(w, h, None),
            visited: BoolGrid::new(w, h, false),
            previous: SimpleGrid::new(w, h, None),
            order: Vec::new(),
            fresh: true,
        }
    }

    /// Clears the scoring of the previous run: every distance becomes infinite, nothing is
    /// visited and no cell has a predecessor.
    pub fn reset(&mut self, grid: &Grid<W>) {
        let (w, h) = (grid.width(), grid.height());
        if self.distance.width() == w && self.distance.height() == h {
            let rect = self.distance.rect();
            self.distance.set_rectangle(&rect, None);
            self.visited.set_rectangle(&rect, false);
            self.previous.set_rectangle(&rect, None);
        } else {
            self.distance = SimpleGrid::new(w, h, None);
            self.visited = BoolGrid::new(w, h, false);
            self.previous = SimpleGrid::new(w, h, None);
        }
        self.order.clear();
        self.fresh = true;
    }

    fn in_bounds(&self, point: &Point) -> bool {
        self.distance.point_in_bounds(*point)
    }

    fn point_of(&self, ix: usize) -> Point {
        let w = self.distance.width();
        Point::new((ix % w) as i32, (ix / w) as i32)
    }

    fn check_role(
        &self,
        grid: &Grid<W>,
        point: &Point,
        is_role: impl Fn(&Cell<W>) -> bool,
        not_role: SearchError,
    ) -> Result<(), SearchError> {
        let cell = grid.cell(point).ok_or(SearchError::OutOfBounds {
            x: point.x,
            y: point.y,
        })?;
        if is_role(&cell) {
            Ok(())
        } else {
            Err(not_role)
        }
    }

    /// Runs Dijkstra's algorithm from `start` until `finish` is finalized or no reachable cell
    /// is left, and returns the cells in the order they were finalized.
    ///
    /// Among cells with equal distance the one that comes first in row-major order is finalized
    /// first. If `finish` cannot be reached the order simply does not contain it, and
    /// [reconstruct_path](Self::reconstruct_path) returns an empty path.
    pub fn dijkstra(
        &mut self,
        grid: &Grid<W>,
        start: Point,
        finish: Point,
    ) -> Result<&[Point], SearchError> {
        if !self.fresh
            || self.distance.width() != grid.width()
            || self.distance.height() != grid.height()
        {
            return Err(SearchError::StaleContext);
        }
        if grid.start().is_none() {
            return Err(SearchError::MissingStart);
        }
        if grid.finish().is_none() {
            return Err(SearchError::MissingFinish);
        }
        self.check_role(
            grid,
            &start,
            |c| c.is_start,
            SearchError::NotStart {
                x: start.x,
                y: start.y,
            },
        )?;
        self.check_role(
            grid,
            &finish,
            |c| c.is_finish,
            SearchError::NotFinish {
                x: finish.x,
                y: finish.y,
            },
        )?;
        self.fresh = false;
        info!("Searching for a path from {} to {}", start, finish);

        let mut frontier = BinaryHeap::new();
        self.distance.set_point(start, Some(W::zero()));
        frontier.push(SmallestDistanceHolder {
            distance: W::zero(),
            index: self.distance.get_ix_point(&start),
            point: start,
        });
        while let Some(SmallestDistanceHolder {
            distance,
            index,
            point,
        }) = frontier.pop()
        {
            // A cell is pushed again every time its distance improves, only the entry with the
            // current distance counts.
            if self.visited.get_point(point)
                || self.distance.get_point(point).map_or(true, |d| distance > d)
            {
                continue;
            }
            self.visited.set_point(point, true);
            self.order.push(point);
            // The start is never a wall and relaxation skips walls, so a wall is never popped.
            // If one were, it would be recorded but not expanded.
            if grid.cells().get_point(point).is_wall {
                continue;
            }
            if point == finish {
                debug!(
                    "Reached {} at distance {} after visiting {} cells",
                    finish,
                    distance,
                    self.order.len()
                );
                return Ok(&self.order);
            }
            for n in grid.neighbours(&point) {
                let neighbour = grid.cells().get_point(n);
                if neighbour.is_wall || self.visited.get_point(n) {
                    continue;
                }
                let tentative = match neighbour.step_cost().and_then(|c| distance.checked_add(&c))
                {
                    Some(t) => t,
                    None => continue,
                };
                if self.distance.get_point(n).map_or(true, |d| tentative < d) {
                    self.distance.set_point(n, Some(tentative));
                    self.previous.set_point(n, Some(index));
                    frontier.push(SmallestDistanceHolder {
                        distance: tentative,
                        index: self.distance.get_ix_point(&n),
                        point: n,
                    });
                }
            }
        }
        warn!(
            "{} is not reachable from {}, visited {} cells",
            finish,
            start,
            self.order.len()
        );
        Ok(&self.order)
    }

    /// The cells finalized by the last run, in order.
    pub fn visited_order(&self) -> &[Point] {
        &self.order
    }

    /// Follows the predecessor links back from `finish` and returns the path in start to finish
    /// order. The path is empty if `finish` was not reached in the last run.
    pub fn reconstruct_path(&self, finish: Point) -> Vec<Point> {
        if !self.is_visited(&finish) {
            return Vec::new();
        }
        let mut path: Vec<Point> =
            std::iter::successors(Some(finish), |p| self.previous(p)).collect();
        path.reverse();
        path
    }

    /// Current best distance from the start, [None] while it is infinite.
    pub fn distance(&self, point: &Point) -> Option<W> {
        if self.in_bounds(point) {
            self.distance.get_point(*point)
        } else {
            None
        }
    }

    pub fn is_visited(&self, point: &Point) -> bool {
        self.in_bounds(point) && self.visited.get_point(*point)
    }

    /// The predecessor of a cell on its current best path.
    pub fn previous(&self, point: &Point) -> Option<Point> {
        if self.in_bounds(point) {
            self.previous
                .get_point(*point)
                .map(|ix| self.point_of(ix))
        } else {
            None
        }
    }
}

/// Sums the cost of stepping along a path. The first cell is free, every following cell costs
/// its [step_cost](crate::grid::Cell::step_cost). [None] if a cell is off the grid or the sum
/// overflows.
pub fn path_cost<W: Weight>(grid: &Grid<W>, path: &[Point]) -> Option<W> {
    path.iter().skip(1).try_fold(W::zero(), |total, p| {
        grid.cell(p)
            .and_then(|cell| cell.step_cost())
            .and_then(|c| total.checked_add(&c))
    })
}

/// Everything a single search produces.
#[derive(Clone, Debug)]
pub struct SearchOutcome<W: Weight = u32> {
    pub start: Point,
    pub finish: Point,
    pub visited: Vec<Point>,
    pub path: Vec<Point>,
    pub context: SearchContext<W>,
}

impl<W: Weight> SearchOutcome<W> {
    pub fn found(&self) -> bool {
        !self.path.is_empty()
    }

    pub fn finish_distance(&self) -> Option<W> {
        self.context.distance(&self.finish)
    }
}

/// Searches from the grid's start cell to its finish cell with a fresh [SearchContext].
pub fn search<W: Weight>(grid: &Grid<W>) -> Result<SearchOutcome<W>, SearchError> {
    let start = grid.start().ok_or(SearchError::MissingStart)?;
    let finish = grid.finish().ok_or(SearchError::MissingFinish)?;
    let mut context = SearchContext::new(grid);
    let visited = context.dijkstra(grid, start, finish)?.to_vec();
    let path = context.reconstruct_path(finish);
    Ok(SearchOutcome {
        start,
        finish,
        visited,
        path,
        context,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_3x3() -> Grid {
        Grid::new(3, 3, Point::new(0, 0), Point::new(2, 2)).unwrap()
    }

    #[test]
    fn ties_break_in_row_major_order() {
        let outcome = search(&open_3x3()).unwrap();
        let expected = [(0, 0), (1, 0), (0, 1), (2, 0), (1, 1), (0, 2), (2, 1), (1, 2), (2, 2)]
            .iter()
            .map(|&(x, y)| Point::new(x, y))
            .collect::<Vec<_>>();
        assert_eq!(outcome.visited, expected);
        assert_eq!(outcome.finish_distance(), Some(4));
    }

    #[test]
    fn path_follows_first_finalized_predecessors() {
        let outcome = search(&open_3x3()).unwrap();
        let expected = [(0, 0), (1, 0), (2, 0), (2, 1), (2, 2)]
            .iter()
            .map(|&(x, y)| Point::new(x, y))
            .collect::<Vec<_>>();
        assert_eq!(outcome.path, expected);
    }

    #[test]
    fn stops_when_finish_is_finalized() {
        let grid: Grid = "S.F.\n....".parse().unwrap();
        let outcome = search(&grid).unwrap();
        assert_eq!(outcome.visited.last(), Some(&Point::new(2, 0)));
        assert!(!outcome.context.is_visited(&Point::new(3, 1)));
        assert_eq!(outcome.context.distance(&Point::new(3, 1)), None);
    }

    #[test]
    fn weights_detour_when_cheaper() {
        // Going straight through the 9 costs 11, around the bottom costs 4.
        let grid: Grid = "S9F\n...".parse().unwrap();
        let outcome = search(&grid).unwrap();
        assert_eq!(outcome.finish_distance(), Some(4));
        assert!(!outcome.path.contains(&Point::new(1, 0)));
        assert_eq!(path_cost(&grid, &outcome.path), Some(4));
    }

    #[test]
    fn predecessors_form_a_tree_to_the_start() {
        let grid: Grid = "S..\n.#.\n..F".parse().unwrap();
        let outcome = search(&grid).unwrap();
        for p in &outcome.visited {
            let mut cur = *p;
            let mut steps = 0;
            while let Some(prev) = outcome.context.previous(&cur) {
                cur = prev;
                steps += 1;
                assert!(steps <= grid.len());
            }
            assert_eq!(cur, outcome.start);
        }
    }

    #[test]
    fn context_must_be_reset_between_runs() {
        let grid = open_3x3();
        let (start, finish) = (grid.start().unwrap(), grid.finish().unwrap());
        let mut context = SearchContext::new(&grid);
        context.dijkstra(&grid, start, finish).unwrap();
        assert_eq!(
            context.dijkstra(&grid, start, finish).unwrap_err(),
            SearchError::StaleContext
        );
        context.reset(&grid);
        assert!(context.dijkstra(&grid, start, finish).is_ok());
    }

    #[test]
    fn context_sized_for_another_grid_is_stale() {
        let small = open_3x3();
        let big: Grid = Grid::new(4, 4, Point::new(0, 0), Point::new(3, 3)).unwrap();
        let mut context = SearchContext::new(&small);
        assert_eq!(
            context
                .dijkstra(&big, Point::new(0, 0), Point::new(3, 3))
                .unwrap_err(),
            SearchError::StaleContext
        );
    }

    #[test]
    fn rejects_wrong_endpoints() {
        let grid = open_3x3();
        let mut context = SearchContext::new(&grid);
        assert_eq!(
            context
                .dijkstra(&grid, Point::new(1, 1), Point::new(2, 2))
                .unwrap_err(),
            SearchError::NotStart { x: 1, y: 1 }
        );
        assert_eq!(
            context
                .dijkstra(&grid, Point::new(0, 0), Point::new(1, 1))
                .unwrap_err(),
            SearchError::NotFinish { x: 1, y: 1 }
        );
        assert_eq!(
            context
                .dijkstra(&grid, Point::new(0, 0), Point::new(3, 0))
                .unwrap_err(),
            SearchError::OutOfBounds { x: 3, y: 0 }
        );
    }

    #[test]
    fn missing_roles_fail_fast() {
        let no_start: Grid = "...\n..F".parse().unwrap();
        assert_eq!(search(&no_start).unwrap_err(), SearchError::MissingStart);
        let no_finish: Grid = "S..\n...".parse().unwrap();
        assert_eq!(search(&no_finish).unwrap_err(), SearchError::MissingFinish);
    }

    #[test]
    fn path_of_unreached_cell_is_empty() {
        let grid: Grid = "S#F".parse().unwrap();
        let outcome = search(&grid).unwrap();
        assert_eq!(outcome.visited, vec![Point::new(0, 0)]);
        assert!(outcome.path.is_empty());
        assert!(!outcome.found());
        assert_eq!(
            outcome.context.reconstruct_path(Point::new(0, 0)),
            vec![Point::new(0, 0)]
        );
    }

    #[test]
    fn overflowing_weights_are_not_relaxed() {
        let mut grid: Grid<u8> = "S.F\n...".parse().unwrap();
        grid.set_weight(Point::new(1, 0), Some(u8::MAX)).unwrap();
        let outcome = search(&grid).unwrap();
        assert_eq!(outcome.finish_distance(), Some(4));
        assert_eq!(outcome.context.distance(&Point::new(1, 0)), None);
    }

    #[test]
    fn walls_are_never_finalized() {
        let grid: Grid = "S#.\n.#.\n..F".parse().unwrap();
        let outcome = search(&grid).unwrap();
        assert!(outcome.found());
        assert!(outcome.visited.iter().all(|p| !grid.cell(p).unwrap().is_wall));
        assert!(!outcome.context.is_visited(&Point::new(1, 0)));
        assert_eq!(outcome.context.distance(&Point::new(1, 1)), None);
    }

    #[test]
    fn reset_clears_scoring_of_a_same_sized_board() {
        let mut grid = open_3x3();
        let (start, finish) = (grid.start().unwrap(), grid.finish().unwrap());
        let mut context = SearchContext::new(&grid);
        context.dijkstra(&grid, start, finish).unwrap();
        assert!(context.is_visited(&Point::new(1, 0)));
        grid.toggle_wall(Point::new(1, 0)).unwrap();
        grid.toggle_wall(Point::new(1, 1)).unwrap();
        context.reset(&grid);
        context.dijkstra(&grid, start, finish).unwrap();
        assert!(!context.is_visited(&Point::new(1, 0)));
        assert!(!context.is_visited(&Point::new(-1, 0)));
        assert_eq!(context.distance(&finish), Some(4));
        let expected = [(0, 0), (0, 1), (0, 2), (1, 2), (2, 2)]
            .iter()
            .map(|&(x, y)| Point::new(x, y))
            .collect::<Vec<_>>();
        assert_eq!(context.reconstruct_path(finish), expected);
    }
}

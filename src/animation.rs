//! Turns the output of a search into a timeline of visual state changes.
//!
//! Nothing here waits or draws. [visited_transitions] and [path_transitions] produce
//! [Transition]s with offsets relative to the moment the timeline is dispatched, and a
//! [Scheduler](crate::scheduler::Scheduler) decides when they are applied.
use grid_util::point::Point;
use itertools::Itertools;
use log::debug;

use crate::grid::{Cell, Grid, GridError, Weight};
use crate::{PATH_STEP, VISITED_STEP};

/// Display state of a cell as seen by a renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VisualState {
    Default,
    Start,
    Finish,
    Wall,
    Weight,
    Visited,
    VisitedWeight,
    ShortestPath,
}

impl VisualState {
    /// The state a cell shows when no animation has touched it.
    pub fn of<W: Weight>(cell: &Cell<W>) -> VisualState {
        if cell.is_start {
            VisualState::Start
        } else if cell.is_finish {
            VisualState::Finish
        } else if cell.is_wall {
            VisualState::Wall
        } else if cell.is_weight {
            VisualState::Weight
        } else {
            VisualState::Default
        }
    }

    /// Style class a DOM-like renderer attaches to the cell.
    pub fn class_name(&self) -> &'static str {
        match self {
            VisualState::Default => "node",
            VisualState::Start => "node node-start",
            VisualState::Finish => "node node-finish",
            VisualState::Wall => "node node-wall",
            VisualState::Weight => "node node-weight",
            VisualState::Visited => "node node-visited",
            VisualState::VisitedWeight => "node node-visitedWeight",
            VisualState::ShortestPath => "node node-shortest-path",
        }
    }

    /// Single character used by text renderers.
    pub fn symbol(&self) -> char {
        match self {
            VisualState::Default => '.',
            VisualState::Start => 'S',
            VisualState::Finish => 'F',
            VisualState::Wall => '#',
            VisualState::Weight => 'w',
            VisualState::Visited => 'o',
            VisualState::VisitedWeight => 'O',
            VisualState::ShortestPath => '*',
        }
    }
}

/// Apply `state` to the cell at `point`, `offset` time units after dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub offset: u64,
    pub point: Point,
    pub state: VisualState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimationConfig {
    /// Time between two consecutive visited cells.
    pub visited_step: u64,
    /// Time between two consecutive path cells.
    pub path_step: u64,
    /// Leave the first visited cell (the start) untouched.
    pub skip_start: bool,
    /// Leave the second-to-last visited cell untouched, so nothing flickers right before the
    /// path is drawn over it.
    pub skip_penultimate: bool,
}

impl Default for AnimationConfig {
    fn default() -> AnimationConfig {
        AnimationConfig {
            visited_step: VISITED_STEP,
            path_step: PATH_STEP,
            skip_start: true,
            skip_penultimate: true,
        }
    }
}

/// One transition per visited cell at `visited_step * position`, marking it visited (or
/// visited-weight for weighted cells). The last cell of the order never gets one, and depending
/// on `config` neither do the first and the second-to-last.
///
/// Fails with [GridError::OutOfBounds] on the first cell of `visited` that is not on `grid`.
pub fn visited_transitions<W: Weight>(
    grid: &Grid<W>,
    visited: &[Point],
    config: &AnimationConfig,
) -> Result<Vec<Transition>, GridError> {
    let n = visited.len();
    visited
        .iter()
        .enumerate()
        .filter_map(|(i, point)| {
            let last = i + 1 == n;
            let penultimate = config.skip_penultimate && i + 2 == n;
            let start = config.skip_start && i == 0;
            match grid.cell(point) {
                None => Some(Err(GridError::OutOfBounds {
                    x: point.x,
                    y: point.y,
                })),
                Some(_) if last || penultimate || start => None,
                Some(cell) => Some(Ok(Transition {
                    offset: config.visited_step.saturating_mul(i as u64),
                    point: *point,
                    state: if cell.is_weight {
                        VisualState::VisitedWeight
                    } else {
                        VisualState::Visited
                    },
                })),
            }
        })
        .collect()
}

/// Offset at which the path pass begins: one visited step after the slot of the last visited
/// cell.
pub fn path_start_offset(visited_len: usize, config: &AnimationConfig) -> u64 {
    config.visited_step.saturating_mul(visited_len as u64)
}

/// One [VisualState::ShortestPath] transition per interior path cell, at
/// `base_offset + path_step * position`. Start and finish keep their own look.
pub fn path_transitions(
    path: &[Point],
    base_offset: u64,
    config: &AnimationConfig,
) -> Vec<Transition> {
    let interior = path.len().saturating_sub(1);
    (1..interior)
        .map(|i| Transition {
            offset: base_offset.saturating_add(config.path_step.saturating_mul(i as u64)),
            point: path[i],
            state: VisualState::ShortestPath,
        })
        .collect()
}

/// Both animation passes of a run, visited cells first and path cells after.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Timeline {
    transitions: Vec<Transition>,
    path_offset: u64,
    visited_count: usize,
}

impl Timeline {
    /// Fails if a visited cell is not on `grid`.
    pub fn build<W: Weight>(
        grid: &Grid<W>,
        visited: &[Point],
        path: &[Point],
        config: &AnimationConfig,
    ) -> Result<Timeline, GridError> {
        let mut transitions = visited_transitions(grid, visited, config)?;
        let visited_count = transitions.len();
        let path_offset = path_start_offset(visited.len(), config);
        transitions.extend(path_transitions(path, path_offset, config));
        debug_assert!(transitions
            .iter()
            .tuple_windows()
            .all(|(a, b)| a.offset <= b.offset));
        debug!(
            "Timeline with {} visited and {} path transitions, path pass at {}",
            visited_count,
            transitions.len() - visited_count,
            path_offset
        );
        Ok(Timeline {
            transitions,
            path_offset,
            visited_count,
        })
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn visited_pass(&self) -> &[Transition] {
        &self.transitions[..self.visited_count]
    }

    pub fn path_pass(&self) -> &[Transition] {
        &self.transitions[self.visited_count..]
    }

    pub fn path_offset(&self) -> u64 {
        self.path_offset
    }

    /// Offset of the last transition, 0 for an empty timeline.
    pub fn duration(&self) -> u64 {
        self.transitions.last().map_or(0, |t| t.offset)
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transition> {
        self.transitions.iter()
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a Transition;
    type IntoIter = std::slice::Iter<'a, Transition>;

    fn into_iter(self) -> Self::IntoIter {
        self.transitions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(n: i32) -> Vec<Point> {
        (0..n).map(|x| Point::new(x, 0)).collect()
    }

    fn row_grid(n: usize) -> Grid {
        Grid::new(1, n, Point::new(0, 0), Point::new(n as i32 - 1, 0)).unwrap()
    }

    #[test]
    fn visited_pass_skips_start_and_the_last_two() {
        let grid = row_grid(6);
        let events = visited_transitions(&grid, &points(6), &AnimationConfig::default()).unwrap();
        let offsets = events.iter().map(|t| t.offset).collect::<Vec<_>>();
        assert_eq!(offsets, vec![10, 20, 30]);
        assert!(events.iter().all(|t| t.state == VisualState::Visited));
        assert_eq!(events[0].point, Point::new(1, 0));
    }

    #[test]
    fn visited_pass_skips_can_be_disabled() {
        let grid = row_grid(6);
        let config = AnimationConfig {
            skip_start: false,
            skip_penultimate: false,
            ..AnimationConfig::default()
        };
        let events = visited_transitions(&grid, &points(6), &config).unwrap();
        let offsets = events.iter().map(|t| t.offset).collect::<Vec<_>>();
        assert_eq!(offsets, vec![0, 10, 20, 30, 40]);
    }

    #[test]
    fn weighted_cells_get_their_own_visited_state() {
        let mut grid = row_grid(5);
        grid.set_weight(Point::new(2, 0), Some(3)).unwrap();
        let events = visited_transitions(&grid, &points(5), &AnimationConfig::default()).unwrap();
        let states = events.iter().map(|t| t.state).collect::<Vec<_>>();
        assert_eq!(states, vec![VisualState::Visited, VisualState::VisitedWeight]);
    }

    #[test]
    fn path_pass_covers_interior_only() {
        let config = AnimationConfig::default();
        let events = path_transitions(&points(5), 100, &config);
        assert_eq!(
            events,
            vec![
                Transition {
                    offset: 150,
                    point: Point::new(1, 0),
                    state: VisualState::ShortestPath
                },
                Transition {
                    offset: 200,
                    point: Point::new(2, 0),
                    state: VisualState::ShortestPath
                },
                Transition {
                    offset: 250,
                    point: Point::new(3, 0),
                    state: VisualState::ShortestPath
                },
            ]
        );
        assert!(path_transitions(&points(2), 0, &config).is_empty());
        assert!(path_transitions(&[], 0, &config).is_empty());
    }

    #[test]
    fn timeline_orders_visited_before_path() {
        let grid = row_grid(8);
        let order = points(8);
        let timeline = Timeline::build(&grid, &order, &order, &AnimationConfig::default()).unwrap();
        assert_eq!(timeline.path_offset(), 80);
        assert_eq!(timeline.visited_pass().len(), 5);
        assert_eq!(timeline.path_pass().len(), 6);
        let last_visited = timeline.visited_pass().last().unwrap().offset;
        let first_path = timeline.path_pass()[0].offset;
        assert!(last_visited < first_path);
        assert!(timeline
            .transitions()
            .windows(2)
            .all(|w| w[0].offset < w[1].offset));
        assert_eq!(timeline.duration(), 80 + 6 * 50);
    }

    #[test]
    fn class_names_match_resting_states() {
        let grid: Grid = "S#1\n..F".parse().unwrap();
        let names = grid
            .cells()
            .values
            .iter()
            .map(|c| VisualState::of(c).class_name())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                "node node-start",
                "node node-wall",
                "node node-weight",
                "node",
                "node",
                "node node-finish"
            ]
        );
    }

    #[test]
    fn visited_order_of_another_grid_is_rejected() {
        let board: Grid = Grid::new(3, 5, Point::new(0, 0), Point::new(4, 2)).unwrap();
        let outcome = crate::search::search(&board).unwrap();
        let small: Grid = "SF".parse().unwrap();
        let config = AnimationConfig::default();
        assert_eq!(
            visited_transitions(&small, &outcome.visited, &config).unwrap_err(),
            GridError::OutOfBounds { x: 0, y: 1 }
        );
        assert!(Timeline::build(&small, &outcome.visited, &outcome.path, &config).is_err());
        let timeline = Timeline::build(&board, &outcome.visited, &outcome.path, &config).unwrap();
        assert_eq!(timeline.visited_pass().len(), outcome.visited.len() - 3);
    }

    #[test]
    fn huge_steps_saturate_instead_of_overflowing() {
        let grid = row_grid(6);
        let order = points(6);
        let config = AnimationConfig {
            visited_step: u64::MAX / 2,
            path_step: u64::MAX / 2,
            ..AnimationConfig::default()
        };
        assert_eq!(path_start_offset(order.len(), &config), u64::MAX);
        let events = path_transitions(&order, u64::MAX - 10, &config);
        assert!(events.iter().all(|t| t.offset == u64::MAX));
        let timeline = Timeline::build(&grid, &order, &order, &config).unwrap();
        assert_eq!(timeline.len(), 3 + 4);
        assert_eq!(timeline.duration(), u64::MAX);
    }
}

//! # grid_visualizer
//!
//! The engine behind a grid pathfinding visualizer. Walls and weighted cells are painted onto
//! a [Grid], then [Dijkstra's algorithm](https://en.wikipedia.org/wiki/Dijkstra%27s_algorithm)
//! searches from the start cell to the finish cell over 4-connected neighbours. The order in
//! which cells are finalized and the reconstructed shortest path are turned into a [Timeline]
//! of visual state changes, which a [Scheduler] replays into a [Renderer].
//!
//! Ties between cells at equal distance are broken in row-major order, so a given board always
//! produces the same visitation order, path and timeline.
//!
//! ```
//! use grid_visualizer::{search, Grid};
//!
//! let grid: Grid = "S.#\n.5.\n..F".parse().unwrap();
//! let outcome = search(&grid).unwrap();
//! assert_eq!(outcome.finish_distance(), Some(4));
//! assert_eq!(outcome.path.len(), 5);
//! ```
pub mod animation;
pub mod grid;
pub mod scheduler;
pub mod search;
pub mod visualizer;

pub use animation::{
    path_start_offset, path_transitions, visited_transitions, AnimationConfig, Timeline,
    Transition, VisualState,
};
pub use grid::{Cell, Grid, GridError, Weight};
pub use scheduler::{CellCanvas, Renderer, Scheduler, VirtualScheduler};
pub use search::{path_cost, search, SearchContext, SearchError, SearchOutcome};
pub use visualizer::{Visualization, Visualizer};

pub use grid_util::point::Point;

/// Rows of the default board.
pub const DEFAULT_ROWS: usize = 20;
/// Columns of the default board.
pub const DEFAULT_COLS: usize = 50;
/// (row, column) of the start cell on the default board.
pub const DEFAULT_START: (usize, usize) = (10, 15);
/// (row, column) of the finish cell on the default board.
pub const DEFAULT_FINISH: (usize, usize) = (10, 35);

/// Time between two visited-cell transitions.
pub const VISITED_STEP: u64 = 10;
/// Time between two path-cell transitions.
pub const PATH_STEP: u64 = 50;

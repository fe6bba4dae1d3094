use grid_util::point::Point;
use log::info;

use crate::animation::{AnimationConfig, Timeline};
use crate::grid::{Grid, GridError, Weight};
use crate::search::{SearchContext, SearchError};

/// Everything needed to animate one run.
#[derive(Clone, Debug)]
pub struct Visualization<W = u32> {
    pub visited: Vec<Point>,
    pub path: Vec<Point>,
    pub finish_distance: Option<W>,
    pub timeline: Timeline,
}

impl<W: Weight> Visualization<W> {
    pub fn found(&self) -> bool {
        !self.path.is_empty()
    }
}

/// Board of the visualizer: a grid that the user paints walls and weights on, and a search
/// context reused by every run.
#[derive(Clone, Debug)]
pub struct Visualizer<W: Weight = u32> {
    grid: Grid<W>,
    context: SearchContext<W>,
    pub config: AnimationConfig,
}

impl<W: Weight> Default for Visualizer<W> {
    fn default() -> Visualizer<W> {
        Visualizer::from_grid(Grid::default())
    }
}

impl<W: Weight> Visualizer<W> {
    pub fn from_grid(grid: Grid<W>) -> Visualizer<W> {
        let context = SearchContext::new(&grid);
        Visualizer {
            grid,
            context,
            config: AnimationConfig::default(),
        }
    }

    pub fn grid(&self) -> &Grid<W> {
        &self.grid
    }

    pub fn toggle_wall(&mut self, point: Point) -> Result<bool, GridError> {
        self.grid.toggle_wall(point)
    }

    pub fn set_weight(&mut self, point: Point, weight: Option<W>) -> Result<(), GridError> {
        self.grid.set_weight(point, weight)
    }

    /// Runs the search from start to finish on the current board and builds the timeline that
    /// animates it.
    pub fn visualize(&mut self) -> Result<Visualization<W>, SearchError> {
        let start = self.grid.start().ok_or(SearchError::MissingStart)?;
        let finish = self.grid.finish().ok_or(SearchError::MissingFinish)?;
        self.context.reset(&self.grid);
        let visited = self.context.dijkstra(&self.grid, start, finish)?.to_vec();
        let path = self.context.reconstruct_path(finish);
        let timeline = Timeline::build(&self.grid, &visited, &path, &self.config)?;
        info!(
            "Visited {} cells, path of {} cells, animation lasts {}",
            visited.len(),
            path.len(),
            timeline.duration()
        );
        Ok(Visualization {
            finish_distance: self.context.distance(&finish),
            visited,
            path,
            timeline,
        })
    }
}

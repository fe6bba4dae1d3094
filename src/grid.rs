use core::fmt;
use std::str::FromStr;

use grid_util::grid::{Grid as _, SimpleGrid};
use grid_util::point::Point;
use log::info;
use num_traits::{PrimInt, Unsigned};
use petgraph::unionfind::UnionFind;
use thiserror::Error;

use crate::{DEFAULT_COLS, DEFAULT_FINISH, DEFAULT_ROWS, DEFAULT_START};

/// Cost type of a grid. Any unsigned primitive integer works; [u32] is the default.
pub trait Weight: PrimInt + Unsigned + fmt::Debug + fmt::Display {}

impl<T> Weight for T where T: PrimInt + Unsigned + fmt::Debug + fmt::Display {}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("({x}, {y}) lies outside the grid")]
    OutOfBounds { x: i32, y: i32 },
    #[error("A grid needs at least one row and one column")]
    EmptyGrid,
    #[error("Start and finish must be different cells")]
    StartEqualsFinish,
    #[error("({x}, {y}) is the start or finish cell and cannot be painted")]
    ProtectedCell { x: i32, y: i32 },
    #[error("Unknown tile {ch:?} on line {line}")]
    UnknownTile { line: usize, ch: char },
    #[error("Tile {0:?} appears more than once")]
    DuplicateRole(char),
    #[error("Line {line} has a different length than the first line")]
    RaggedRow { line: usize },
}

/// A single grid position. The role flags and the wall/weight flags describe the board; the
/// per-run scoring of a search lives in [SearchContext](crate::search::SearchContext).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell<W = u32> {
    pub row: usize,
    pub col: usize,
    pub is_start: bool,
    pub is_finish: bool,
    pub is_wall: bool,
    pub is_weight: bool,
    /// Extra cost of entering this cell, only counted if `is_weight` is set.
    pub weight: W,
}

impl<W: Weight> Cell<W> {
    pub fn new(row: usize, col: usize) -> Cell<W> {
        Cell {
            row,
            col,
            is_start: false,
            is_finish: false,
            is_wall: false,
            is_weight: false,
            weight: W::zero(),
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.col as i32, self.row as i32)
    }

    /// Start and finish keep their role; walls and weights cannot be painted over them.
    pub fn is_protected(&self) -> bool {
        self.is_start || self.is_finish
    }

    /// Cost of stepping onto this cell: 1, plus the weight for weighted cells. [None] if that
    /// overflows `W`.
    pub fn step_cost(&self) -> Option<W> {
        if self.is_weight {
            W::one().checked_add(&self.weight)
        } else {
            Some(W::one())
        }
    }
}

/// [Grid] stores its [Cell]s in a [SimpleGrid], row-major: the cell in row `y`, column `x` sits
/// at flat index `y * width + x`. Points use `x` for the column and `y` for the row. In addition
/// to the cells it maintains information about connected components of non-wall cells using a
/// [UnionFind] structure, which is used to answer reachability queries without searching.
#[derive(Clone, Debug)]
pub struct Grid<W: Weight = u32> {
    cells: SimpleGrid<Cell<W>>,
    start: Option<Point>,
    finish: Option<Point>,
    pub components: UnionFind<usize>,
    pub components_dirty: bool,
}

impl<W: Weight> Default for Grid<W> {
    /// The 20 x 50 board with the start on the left and the finish on the right.
    fn default() -> Grid<W> {
        let mut grid = Grid::blank(DEFAULT_COLS, DEFAULT_ROWS);
        let (start_row, start_col) = DEFAULT_START;
        let (finish_row, finish_col) = DEFAULT_FINISH;
        grid.place_start(Point::new(start_col as i32, start_row as i32));
        grid.place_finish(Point::new(finish_col as i32, finish_row as i32));
        grid
    }
}

impl<W: Weight> Grid<W> {
    /// Creates a `rows` x `cols` grid without walls or weights, with the start and finish placed
    /// at the given points.
    pub fn new(
        rows: usize,
        cols: usize,
        start: Point,
        finish: Point,
    ) -> Result<Grid<W>, GridError> {
        if rows == 0 || cols == 0 {
            return Err(GridError::EmptyGrid);
        }
        let mut grid = Grid::blank(cols, rows);
        grid.checked_cell(&start)?;
        grid.checked_cell(&finish)?;
        if start == finish {
            return Err(GridError::StartEqualsFinish);
        }
        grid.place_start(start);
        grid.place_finish(finish);
        Ok(grid)
    }

    fn blank(width: usize, height: usize) -> Grid<W> {
        let mut cells = SimpleGrid::new(width, height, Cell::new(0, 0));
        for y in 0..height {
            for x in 0..width {
                cells.set(x, y, Cell::new(y, x));
            }
        }
        let mut grid = Grid {
            cells,
            start: None,
            finish: None,
            components: UnionFind::new(width * height),
            components_dirty: false,
        };
        grid.generate_components();
        grid
    }

    /// Applies `f` to the cell at an in-bounds point.
    fn modify(&mut self, point: Point, f: impl FnOnce(&mut Cell<W>)) {
        let mut cell = self.cells.get_point(point);
        f(&mut cell);
        self.cells.set_point(point, cell);
    }

    fn place_start(&mut self, point: Point) {
        if let Some(old) = self.start.replace(point) {
            self.modify(old, |c| c.is_start = false);
        }
        self.modify(point, |c| c.is_start = true);
    }

    fn place_finish(&mut self, point: Point) {
        if let Some(old) = self.finish.replace(point) {
            self.modify(old, |c| c.is_finish = false);
        }
        self.modify(point, |c| c.is_finish = true);
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.cells.width()
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.cells.height()
    }

    pub fn len(&self) -> usize {
        self.cells.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.values.is_empty()
    }

    pub fn start(&self) -> Option<Point> {
        self.start
    }

    pub fn finish(&self) -> Option<Point> {
        self.finish
    }

    /// The cell storage. Bounds checks and flat indices come from its
    /// [Grid](grid_util::grid::Grid) implementation.
    pub fn cells(&self) -> &SimpleGrid<Cell<W>> {
        &self.cells
    }

    pub fn cell(&self, point: &Point) -> Option<Cell<W>> {
        self.cells
            .point_in_bounds(*point)
            .then(|| self.cells.get_point(*point))
    }

    fn checked_cell(&self, point: &Point) -> Result<Cell<W>, GridError> {
        self.cell(point).ok_or(GridError::OutOfBounds {
            x: point.x,
            y: point.y,
        })
    }

    /// In-bounds orthogonal neighbours of a point.
    pub fn neighbours(&self, point: &Point) -> impl Iterator<Item = Point> + '_ {
        point
            .neumann_neighborhood()
            .into_iter()
            .filter(move |p| self.cells.point_in_bounds(*p))
    }

    /// Flips the wall flag of a cell and returns the new value.
    pub fn toggle_wall(&mut self, point: Point) -> Result<bool, GridError> {
        let blocked = !self.checked_cell(&point)?.is_wall;
        self.set_wall(point, blocked)?;
        Ok(blocked)
    }

    /// Updates the wall flag of a cell. Joins newly connected components and flags the
    /// components as dirty if components are (potentially) broken apart into multiple.
    pub fn set_wall(&mut self, point: Point, blocked: bool) -> Result<(), GridError> {
        let cell = self.checked_cell(&point)?;
        if cell.is_protected() {
            return Err(GridError::ProtectedCell {
                x: point.x,
                y: point.y,
            });
        }
        if cell.is_wall == blocked {
            return Ok(());
        }
        self.modify(point, |c| c.is_wall = blocked);
        if blocked {
            self.components_dirty = true;
        } else {
            let ix = self.cells.get_ix_point(&point);
            let open = self
                .neighbours(&point)
                .filter(|n| !self.cells.get_point(*n).is_wall)
                .collect::<Vec<Point>>();
            for n in open {
                self.components.union(ix, self.cells.get_ix_point(&n));
            }
        }
        Ok(())
    }

    /// Marks a cell as weighted with the given extra cost, or clears the weight with [None].
    pub fn set_weight(&mut self, point: Point, weight: Option<W>) -> Result<(), GridError> {
        if self.checked_cell(&point)?.is_protected() {
            return Err(GridError::ProtectedCell {
                x: point.x,
                y: point.y,
            });
        }
        self.modify(point, |c| {
            c.is_weight = weight.is_some();
            c.weight = weight.unwrap_or_else(W::zero);
        });
        Ok(())
    }

    /// Checks if start and goal are on the same component.
    pub fn reachable(&self, start: &Point, goal: &Point) -> bool {
        !self.unreachable(start, goal)
    }

    /// Checks if start and goal are not on the same component.
    pub fn unreachable(&self, start: &Point, goal: &Point) -> bool {
        if self.cells.point_in_bounds(*start) && self.cells.point_in_bounds(*goal) {
            let start_ix = self.cells.get_ix_point(start);
            let goal_ix = self.cells.get_ix_point(goal);
            !self.components.equiv(start_ix, goal_ix)
        } else {
            true
        }
    }

    /// Regenerates the components if they are marked as dirty.
    pub fn update(&mut self) {
        if self.components_dirty {
            info!("Components are dirty: regenerating components");
            self.generate_components();
        }
    }

    /// Generates a new [UnionFind] structure and links up open grid neighbours to the same
    /// components.
    pub fn generate_components(&mut self) {
        let w = self.width();
        let h = self.height();
        self.components = UnionFind::new(w * h);
        self.components_dirty = false;
        for y in 0..h as i32 {
            for x in 0..w as i32 {
                let point = Point::new(x, y);
                if self.cells.get_point(point).is_wall {
                    continue;
                }
                let ix = self.cells.get_ix_point(&point);
                // Right and down are enough, the other two directions are covered from the neighbour.
                for n in [Point::new(x + 1, y), Point::new(x, y + 1)] {
                    if self.cell(&n).map_or(false, |c| !c.is_wall) {
                        self.components.union(ix, self.cells.get_ix_point(&n));
                    }
                }
            }
        }
    }
}

impl<W: Weight> fmt::Display for Grid<W> {
    /// Writes the grid in the text form accepted by [FromStr]: `S` start, `F` finish, `#` wall,
    /// `.` open, a digit for a weighted cell. Weights above 9 are written as `+`.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for y in 0..self.height() {
            let line = (0..self.width())
                .map(|x| {
                    let cell = self.cells.get(x, y);
                    if cell.is_start {
                        'S'
                    } else if cell.is_finish {
                        'F'
                    } else if cell.is_wall {
                        '#'
                    } else if cell.is_weight {
                        cell.weight
                            .to_u32()
                            .and_then(|w| char::from_digit(w, 10))
                            .unwrap_or('+')
                    } else {
                        '.'
                    }
                })
                .collect::<String>();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

impl<W: Weight> FromStr for Grid<W> {
    type Err = GridError;

    /// Parses a text map. Blank lines and surrounding whitespace are ignored. A map without an
    /// `S` or `F` is accepted; searching it fails.
    fn from_str(s: &str) -> Result<Grid<W>, GridError> {
        let lines = s
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<&str>>();
        let width = lines.first().map_or(0, |l| l.chars().count());
        if width == 0 {
            return Err(GridError::EmptyGrid);
        }
        let mut grid = Grid::blank(width, lines.len());
        for (y, line) in lines.iter().enumerate() {
            if line.chars().count() != width {
                return Err(GridError::RaggedRow { line: y + 1 });
            }
            for (x, ch) in line.chars().enumerate() {
                let point = Point::new(x as i32, y as i32);
                match ch {
                    '.' => {}
                    '#' => grid.modify(point, |c| c.is_wall = true),
                    'S' => {
                        if grid.start.is_some() {
                            return Err(GridError::DuplicateRole(ch));
                        }
                        grid.place_start(point);
                    }
                    'F' => {
                        if grid.finish.is_some() {
                            return Err(GridError::DuplicateRole(ch));
                        }
                        grid.place_finish(point);
                    }
                    _ => {
                        let weight = ch
                            .to_digit(10)
                            .and_then(num_traits::cast::<u32, W>)
                            .ok_or(GridError::UnknownTile { line: y + 1, ch })?;
                        grid.modify(point, |c| {
                            c.is_weight = true;
                            c.weight = weight;
                        });
                    }
                }
            }
        }
        grid.generate_components();
        Ok(grid)
    }
}

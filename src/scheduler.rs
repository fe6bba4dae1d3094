use core::fmt;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use grid_util::grid::{Grid as _, SimpleGrid};
use grid_util::point::Point;
use log::debug;

use crate::animation::{Timeline, Transition, VisualState};
use crate::grid::{Grid, Weight};

/// Applies a visual state to a cell, e.g. by swapping the style class of a DOM node.
pub trait Renderer {
    fn apply(&mut self, point: Point, state: VisualState);
}

/// Records every applied state in order.
impl Renderer for Vec<(Point, VisualState)> {
    fn apply(&mut self, point: Point, state: VisualState) {
        self.push((point, state));
    }
}

/// A timer that fires transitions `offset` time units after they were scheduled.
pub trait Scheduler {
    fn schedule(&mut self, transition: Transition);
}

impl Timeline {
    /// Hands every transition to the scheduler, visited pass first.
    pub fn dispatch<S: Scheduler>(&self, scheduler: &mut S) {
        for transition in self {
            scheduler.schedule(*transition);
        }
    }
}

struct Pending {
    due: u64,
    seq: u64,
    transition: Transition,
}

impl Eq for Pending {}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        // Earliest due first, ties in scheduling order
        match other.due.cmp(&self.due) {
            Ordering::Equal => other.seq.cmp(&self.seq),
            s => s,
        }
    }
}

/// Deterministic [Scheduler] driven by virtual time. Nothing fires until the clock is advanced;
/// due transitions are then applied in non-decreasing due time, ties in the order they were
/// scheduled. There is no cancellation: dispatching a second timeline before the first one has
/// finished interleaves both.
#[derive(Default)]
pub struct VirtualScheduler {
    now: u64,
    seq: u64,
    queue: BinaryHeap<Pending>,
}

impl VirtualScheduler {
    pub fn new() -> VirtualScheduler {
        VirtualScheduler::default()
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Moves the clock forward by `by` and fires everything that became due. Returns the number
    /// of fired transitions.
    pub fn advance<R: Renderer>(&mut self, by: u64, renderer: &mut R) -> usize {
        let until = self.now.saturating_add(by);
        let mut fired = 0;
        while self.queue.peek().map_or(false, |p| p.due <= until) {
            if let Some(Pending { due, transition, .. }) = self.queue.pop() {
                self.now = due;
                renderer.apply(transition.point, transition.state);
                fired += 1;
            }
        }
        self.now = until;
        fired
    }

    /// Fires everything that is scheduled and leaves the clock at the last due time.
    pub fn run_to_end<R: Renderer>(&mut self, renderer: &mut R) -> usize {
        let mut fired = 0;
        while let Some(Pending { due, transition, .. }) = self.queue.pop() {
            self.now = due;
            renderer.apply(transition.point, transition.state);
            fired += 1;
        }
        debug!("Fired {} transitions, clock at {}", fired, self.now);
        fired
    }
}

impl Scheduler for VirtualScheduler {
    fn schedule(&mut self, transition: Transition) {
        self.queue.push(Pending {
            due: self.now.saturating_add(transition.offset),
            seq: self.seq,
            transition,
        });
        self.seq += 1;
    }
}

/// In-memory [Renderer] holding the visual state of every cell.
#[derive(Clone, Debug)]
pub struct CellCanvas {
    states: SimpleGrid<VisualState>,
}

impl CellCanvas {
    /// A canvas showing the resting state of every cell of `grid`.
    pub fn from_grid<W: Weight>(grid: &Grid<W>) -> CellCanvas {
        let mut states = SimpleGrid::new(grid.width(), grid.height(), VisualState::Default);
        for cell in &grid.cells().values {
            states.set_point(cell.point(), VisualState::of(cell));
        }
        CellCanvas { states }
    }

    pub fn state(&self, point: &Point) -> Option<VisualState> {
        self.states
            .point_in_bounds(*point)
            .then(|| self.states.get_point(*point))
    }

    pub fn count(&self, state: VisualState) -> usize {
        self.states.values.iter().filter(|&&s| s == state).count()
    }
}

impl Renderer for CellCanvas {
    /// Points outside the canvas are ignored.
    fn apply(&mut self, point: Point, state: VisualState) {
        if self.states.point_in_bounds(point) {
            self.states.set_point(point, state);
        }
    }
}

impl fmt::Display for CellCanvas {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for y in 0..self.states.height() {
            let line = (0..self.states.width())
                .map(|x| self.states.get(x, y).symbol())
                .collect::<String>();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

use grid_visualizer::{CellCanvas, Point, Scheduler, VirtualScheduler, Visualizer};

// Runs the visualizer on the default 20x50 board with a wall between start and finish and a
// few weighted cells, then replays the animation in virtual time and prints a frame after each
// second of animation.
//
// - S marks the start, F the finish
// - # marks a wall, w a weighted cell
// - o / O mark visited (weighted) cells, * the shortest path
fn main() {
    env_logger::init();
    let mut visualizer: Visualizer = Visualizer::default();
    for y in 3..17 {
        visualizer
            .toggle_wall(Point::new(25, y))
            .expect("wall inside the board");
    }
    for y in 8..13 {
        visualizer
            .set_weight(Point::new(20, y), Some(5))
            .expect("weight inside the board");
    }

    let run = match visualizer.visualize() {
        Ok(run) => run,
        Err(e) => {
            eprintln!("Search failed: {e}");
            return;
        }
    };
    println!("{}", visualizer.grid());
    match run.finish_distance {
        Some(d) => println!("Shortest path costs {d} over {} cells", run.path.len()),
        None => println!("No path to the finish"),
    }

    let mut canvas = CellCanvas::from_grid(visualizer.grid());
    let mut scheduler = VirtualScheduler::new();
    for transition in run.timeline.iter() {
        scheduler.schedule(*transition);
    }
    while scheduler.pending() > 0 {
        scheduler.advance(1000, &mut canvas);
        println!("t = {}\n{}", scheduler.now(), canvas);
    }
}

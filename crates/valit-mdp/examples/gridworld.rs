use valit_core::{MdpModel, SolverConfig, SweepMode, value_iteration};

const WIDTH: usize = 4;
const HEIGHT: usize = 3;
const GOAL: (usize, usize) = (3, 0);
const PIT: (usize, usize) = (3, 1);
const WALL: (usize, usize) = (1, 1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    fn perpendicular(self) -> [Dir; 2] {
        match self {
            Dir::Up | Dir::Down => [Dir::Left, Dir::Right],
            Dir::Left | Dir::Right => [Dir::Up, Dir::Down],
        }
    }
}

/// Classic 4x3 grid: 80% intended move, 10% each sideways slip.
struct GridWorld {
    cells: Vec<(usize, usize)>,
    step_cost: f64,
}

impl GridWorld {
    fn new(step_cost: f64) -> Self {
        let cells = (0..HEIGHT)
            .flat_map(|y| (0..WIDTH).map(move |x| (x, y)))
            .filter(|cell| *cell != WALL)
            .collect();
        Self { cells, step_cost }
    }

    fn is_exit(cell: (usize, usize)) -> bool {
        cell == GOAL || cell == PIT
    }

    fn moved(&self, cell: (usize, usize), dir: Dir) -> (usize, usize) {
        let (x, y) = cell;
        let target = match dir {
            Dir::Up => (x, y.saturating_sub(1)),
            Dir::Down => (x, (y + 1).min(HEIGHT - 1)),
            Dir::Left => (x.saturating_sub(1), y),
            Dir::Right => ((x + 1).min(WIDTH - 1), y),
        };
        if target == WALL { cell } else { target }
    }

    fn position(&self, cell: (usize, usize)) -> usize {
        self.cells
            .iter()
            .position(|c| *c == cell)
            .unwrap_or_default()
    }
}

impl MdpModel<(usize, usize), Dir> for GridWorld {
    fn transition(&self, state: &(usize, usize), action: &Dir) -> Vec<f64> {
        let mut probs = vec![0.0; self.cells.len()];
        if Self::is_exit(*state) {
            probs[self.position(*state)] = 1.0;
            return probs;
        }
        probs[self.position(self.moved(*state, *action))] += 0.8;
        for side in action.perpendicular() {
            probs[self.position(self.moved(*state, side))] += 0.1;
        }
        probs
    }

    /// Exits pay on entry and then loop with no further reward.
    fn reward(&self, state: &(usize, usize), action: &Dir) -> f64 {
        if Self::is_exit(*state) {
            return 0.0;
        }
        let exit_reward: f64 = [*action]
            .into_iter()
            .chain(action.perpendicular())
            .zip([0.8, 0.1, 0.1])
            .map(|(dir, p)| match self.moved(*state, dir) {
                GOAL => p,
                PIT => -p,
                _ => 0.0,
            })
            .sum();
        self.step_cost + exit_reward
    }
}

fn main() {
    let world = GridWorld::new(-0.04);
    let actions = [Dir::Up, Dir::Down, Dir::Left, Dir::Right];
    let config = SolverConfig::new(100, 0.99).with_sweep_mode(SweepMode::Parallel);

    let solution = value_iteration(&world.cells, &actions, &world, &config)
        .expect("grid world should solve");

    for y in 0..HEIGHT {
        let row: Vec<String> = (0..WIDTH)
            .map(|x| match solution.value(&(x, y)) {
                Some(value) => format!("{value:>7.3}"),
                None => "  #####".to_string(),
            })
            .collect();
        println!("{}", row.join(" "));
    }
    for (cell, dir, _) in solution.iter() {
        if !GridWorld::is_exit(*cell) {
            println!("{cell:?}: {dir:?}");
        }
    }
}


use std::path::PathBuf;

use valit_core::SolverConfig;
use valit_mdp::{MdpSimulator, compile_yaml};

fn main() {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("crates/valit-mdp/examples/sample.mdp.yaml"));

    let compiled = compile_yaml(&path).expect("failed to compile MDP YAML");
    let config = SolverConfig::new(500, 0.9);

    let solution = compiled.solve(&config).expect("value iteration failed");

    for (state, action, value) in solution.iter() {
        println!(
            "{:>10} -> {:<10} value={:.6}",
            compiled.state_id(*state).unwrap_or("?"),
            compiled.action_id(*action).unwrap_or("?"),
            value
        );
    }

    let start = solution.states()[0];
    let mut simulator = MdpSimulator::new(compiled, 12345);
    let sampled = simulator.evaluate(&solution, start, 1000, 200, config.discount);
    println!("sampled_return_from_start={sampled:.6}");
}

use lsystem_gen::{GrammarBuilder, LSystem, presets};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::error::Error;

/// Grow a few plants from the built-in grammar and from one assembled in code
fn main() -> Result<(), Box<dyn Error>> {
    // Example 1: the bundled stochastic plant, one seed per specimen
    let grammar = presets::find("plant").ok_or("plant preset missing")?.grammar()?;

    println!("Plant specimens after 3 generations:");
    for seed in 1..=3 {
        let mut system = LSystem::new(grammar.clone());
        let mut rng = StdRng::seed_from_u64(seed);
        let instructions = system.run(3, &mut rng)?;
        println!("{}. {} symbols, {} segments", seed, instructions.len(), instructions.matches('F').count());
    }

    // Example 2: a grammar built in code. 'B' only covers 90% of the
    // probability mass, so buds occasionally wither away.
    let grammar = GrammarBuilder::new("A")
        .rule('A', "F[+A][-A]B", 0.6)
        .rule('A', "FA", 0.4)
        .rule('B', "B", 0.9)
        .build();

    for issue in grammar.coverage_issues(lsystem_gen::DEFAULT_TOLERANCE) {
        println!("note: {}", issue);
    }

    let mut system = LSystem::new(grammar);
    let mut rng = StdRng::from_entropy();
    for _ in 0..4 {
        system.step(&mut rng)?;
        println!("gen {}: {}", system.generation(), system.current());
    }

    Ok(())
}

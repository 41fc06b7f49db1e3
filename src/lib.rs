//! LSystem-Gen generates build instructions from stochastic Lindenmayer grammars.
//!
//! A grammar is an axiom plus per-symbol rewrite rules, each production
//! carrying a probability. Every generation rewrites all symbols of the
//! previous one at once; symbols without a rule are copied through.
//!
//! # Example
//!
//! ```rust
//! use lsystem_gen::{Grammar, advance_n};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let grammar = Grammar::parse("A\n0:A:AB:1.0\n").unwrap();
//! let mut rng = StdRng::seed_from_u64(7);
//!
//! let text = advance_n(grammar.axiom(), &grammar, 3, &mut rng).unwrap();
//! assert_eq!(text, "ABBB");
//! ```

pub mod config;
pub mod engine;
pub mod grammar;
pub mod presets;
pub mod utils;

pub use config::{CoverageMode, RunConfig};
pub use engine::{DrawSource, LSystem, ReplayDraws, advance, advance_n};
pub use grammar::{
    CoverageIssue, DEFAULT_TOLERANCE, Grammar, GrammarBuilder, Production, ProductionRule,
};
pub use utils::{GrammarError, Result};

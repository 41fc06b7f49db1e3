//! Generation engine: rewrites one generation into the next.
//!
//! Every character of the current generation is handled independently. A
//! character with a rule consumes exactly one draw in [0, 1) and is replaced by
//! the first production whose running probability sum reaches the draw; if the
//! sum never reaches it the character is dropped. A character without a rule is
//! copied through unchanged and consumes no draw.

use std::collections::VecDeque;

use rand::Rng;
use tracing::trace;

use crate::grammar::{Grammar, Production, ProductionRule};
use crate::utils::{GrammarError, Result};

/// Source of uniform draws in [0, 1) consumed by [`advance`]
pub trait DrawSource {
    fn next_draw(&mut self) -> Result<f64>;
}

impl<R: Rng + ?Sized> DrawSource for R {
    fn next_draw(&mut self) -> Result<f64> {
        Ok(self.gen_range(0.0..1.0))
    }
}

/// A fixed sequence of draws, replayed in order.
///
/// Fails with [`GrammarError::RandomSourceExhausted`] once every value has been
/// handed out.
#[derive(Debug, Clone, Default)]
pub struct ReplayDraws {
    draws: VecDeque<f64>,
    consumed: usize,
}

impl ReplayDraws {
    pub fn new<I: IntoIterator<Item = f64>>(draws: I) -> Self {
        ReplayDraws {
            draws: draws.into_iter().collect(),
            consumed: 0,
        }
    }

    /// Draws still available
    pub fn remaining(&self) -> usize {
        self.draws.len()
    }

    /// Draws handed out so far
    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

impl DrawSource for ReplayDraws {
    fn next_draw(&mut self) -> Result<f64> {
        let draw = self
            .draws
            .pop_front()
            .ok_or(GrammarError::RandomSourceExhausted {
                consumed: self.consumed,
            })?;
        self.consumed += 1;
        Ok(draw)
    }
}

/// Pick the production selected by `draw`, or `None` when the rule's total
/// probability never reaches it.
pub fn select(rule: &ProductionRule, draw: f64) -> Option<&Production> {
    let mut cumulative = 0.0;
    rule.productions.iter().find(|production| {
        cumulative += production.probability;
        draw <= cumulative
    })
}

/// Produce the next generation from `current`
pub fn advance<D: DrawSource + ?Sized>(
    current: &str,
    grammar: &Grammar,
    draws: &mut D,
) -> Result<String> {
    let mut next = String::with_capacity(current.len());

    for symbol in current.chars() {
        let Some(rule) = grammar.rule_for(symbol) else {
            next.push(symbol);
            continue;
        };

        let draw = draws.next_draw()?;
        if let Some(production) = select(rule, draw) {
            next.push_str(&production.replacement);
        }
    }

    trace!(from = current.len(), to = next.len(), "advanced generation");
    Ok(next)
}

/// Apply [`advance`] `generations` times starting from `start`
pub fn advance_n<D: DrawSource + ?Sized>(
    start: &str,
    grammar: &Grammar,
    generations: usize,
    draws: &mut D,
) -> Result<String> {
    let mut current = start.to_string();
    for _ in 0..generations {
        current = advance(&current, grammar, draws)?;
    }
    Ok(current)
}

/// A grammar together with its current build instructions
#[derive(Debug, Clone)]
pub struct LSystem {
    grammar: Grammar,
    current: String,
    generation: usize,
}

impl LSystem {
    /// Start at generation 0, the grammar's axiom
    pub fn new(grammar: Grammar) -> Self {
        let current = grammar.axiom().to_string();
        LSystem {
            grammar,
            current,
            generation: 0,
        }
    }

    /// Rewrite the current instructions once.
    ///
    /// On error the current generation is left untouched.
    pub fn step<D: DrawSource + ?Sized>(&mut self, draws: &mut D) -> Result<&str> {
        self.current = advance(&self.current, &self.grammar, draws)?;
        self.generation += 1;
        Ok(&self.current)
    }

    /// Rewrite `generations` more times
    pub fn run<D: DrawSource + ?Sized>(&mut self, generations: usize, draws: &mut D) -> Result<&str> {
        for _ in 0..generations {
            self.step(draws)?;
        }
        Ok(&self.current)
    }

    /// Go back to the axiom
    pub fn reset(&mut self) {
        self.current = self.grammar.axiom().to_string();
        self.generation = 0;
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn into_instructions(self) -> String {
        self.current
    }
}

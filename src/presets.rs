//! Built-in grammars, embedded from `grammars/`.

use crate::grammar::Grammar;
use crate::utils::Result;

/// A named example grammar in rule file format
#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub source: &'static str,
}

impl Preset {
    pub fn grammar(&self) -> Result<Grammar> {
        Grammar::parse(self.source)
    }
}

pub const PRESETS: &[Preset] = &[
    Preset {
        name: "plant",
        description: "stochastic branching plant with three equally likely shapes",
        source: include_str!("../grammars/plant.txt"),
    },
    Preset {
        name: "koch",
        description: "quadratic Koch curve, best drawn at 90 degrees",
        source: include_str!("../grammars/koch.txt"),
    },
    Preset {
        name: "algae",
        description: "Lindenmayer's original algae system",
        source: include_str!("../grammars/algae.txt"),
    },
];

/// Look up a preset by name
pub fn find(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|preset| preset.name == name)
}

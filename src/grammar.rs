use std::cmp::Ordering;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::utils::{GrammarError, OptionExt, Result};

/// Tolerance used when comparing a rule's total probability mass against 1.0
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// One possible rewrite outcome for a symbol
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Production {
    /// The literal substitution string
    pub replacement: String,
    /// Weight of this outcome, expected in [0, 1]
    pub probability: f64,
}

impl Production {
    pub fn new(replacement: &str, probability: f64) -> Self {
        Production {
            replacement: replacement.to_string(),
            probability,
        }
    }
}

/// A symbol together with its productions, in declaration order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionRule {
    /// The symbol this rule rewrites
    pub symbol: char,
    /// Productions tried in order when accumulating probability mass
    pub productions: Vec<Production>,
}

impl ProductionRule {
    /// Sum of all production probabilities
    pub fn total_probability(&self) -> f64 {
        self.productions.iter().map(|p| p.probability).sum()
    }
}

/// Problems found by the optional coverage pass.
///
/// None of these stop generation: under-covered rules delete their symbol on
/// some draws, over-covered rules leave trailing productions unreachable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoverageIssue {
    Undercovered { symbol: char, total: f64 },
    Overcovered { symbol: char, total: f64 },
    OutOfRange { symbol: char, position: usize, probability: f64 },
    ShadowedRule { symbol: char, index: usize },
}

impl fmt::Display for CoverageIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverageIssue::Undercovered { symbol, total } => write!(
                f,
                "rule '{}' covers only {} of the probability mass; unmatched draws delete the symbol",
                symbol, total
            ),
            CoverageIssue::Overcovered { symbol, total } => write!(
                f,
                "rule '{}' sums to {}; productions past 1.0 are unreachable",
                symbol, total
            ),
            CoverageIssue::OutOfRange {
                symbol,
                position,
                probability,
            } => write!(
                f,
                "production {} of rule '{}' has probability {} outside [0, 1]",
                position, symbol, probability
            ),
            CoverageIssue::ShadowedRule { symbol, index } => write!(
                f,
                "rule {} for '{}' is shadowed by an earlier rule for the same symbol",
                index, symbol
            ),
        }
    }
}

/// A stochastic L-system grammar: an axiom plus an ordered rule table.
///
/// Rules keep first-seen order from the source; lookups return the first rule
/// whose symbol matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Grammar {
    axiom: String,
    rules: Vec<ProductionRule>,
}

/// One parsed `index:symbol:replacement:probability` line
struct Record<'a> {
    index: usize,
    symbol: char,
    replacement: &'a str,
    probability: f64,
}

impl Grammar {
    /// Load a grammar from a rule file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| GrammarError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load_from(io::BufReader::new(file), path)
    }

    /// Load a grammar from any buffered reader.
    ///
    /// The first line is the axiom, taken verbatim. Every following non-blank
    /// line is a record `index:symbol:replacement:probability`. A record whose
    /// index equals the current rule count opens a new rule; a smaller index
    /// appends to the existing rule at that position.
    pub fn load<R: BufRead>(reader: R) -> Result<Self> {
        Self::load_from(reader, Path::new("<reader>"))
    }

    /// Parse a grammar held in memory
    pub fn parse(text: &str) -> Result<Self> {
        Self::load_from(text.as_bytes(), Path::new("<string>"))
    }

    fn load_from<R: BufRead>(reader: R, origin: &Path) -> Result<Self> {
        let unavailable = |source: io::Error| GrammarError::SourceUnavailable {
            path: origin.to_path_buf(),
            source,
        };

        let mut grammar = Grammar::default();
        let mut lines = reader.lines();

        if let Some(axiom) = lines.next() {
            grammar.axiom = axiom.map_err(unavailable)?;
        }

        for (offset, line) in lines.enumerate() {
            let line = line.map_err(unavailable)?;
            // The axiom occupies line 1
            let line_no = offset + 2;

            if line.trim().is_empty() {
                continue;
            }

            let record = Self::parse_record(&line, line_no)?;
            grammar.insert_record(record, &line, line_no)?;
        }

        debug!(
            origin = %origin.display(),
            rules = grammar.rules.len(),
            axiom_len = grammar.axiom.chars().count(),
            "loaded grammar"
        );

        Ok(grammar)
    }

    /// Split a record line into its fields.
    ///
    /// Fields are cut at successive ':' characters; only the first character
    /// of the symbol field is kept and anything after the probability field is
    /// ignored. There is no escaping, so a replacement cannot contain ':'.
    fn parse_record(line: &str, line_no: usize) -> Result<Record<'_>> {
        let mut fields = line.splitn(4, ':');

        let index = fields
            .next()
            .ok_or_malformed(line_no, line, "missing index field")?
            .trim()
            .parse::<usize>()
            .map_err(|_| GrammarError::malformed(line_no, line, "non-numeric index"))?;

        let symbol = fields
            .next()
            .ok_or_malformed(line_no, line, "missing symbol field")?
            .chars()
            .next()
            .ok_or_malformed(line_no, line, "empty symbol field")?;

        let replacement = fields
            .next()
            .ok_or_malformed(line_no, line, "missing replacement field")?;

        let probability_field = fields
            .next()
            .ok_or_malformed(line_no, line, "missing probability field")?
            .split(':')
            .next()
            .unwrap_or_default();

        let probability = probability_field
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite())
            .ok_or_malformed(line_no, line, "non-numeric probability")?;

        Ok(Record {
            index,
            symbol,
            replacement,
            probability,
        })
    }

    fn insert_record(&mut self, record: Record<'_>, line: &str, line_no: usize) -> Result<()> {
        let production = Production::new(record.replacement, record.probability);

        match record.index.cmp(&self.rules.len()) {
            Ordering::Less => {
                let rule = &mut self.rules[record.index];
                if rule.symbol != record.symbol {
                    warn!(
                        line = line_no,
                        index = record.index,
                        rule_symbol = %rule.symbol,
                        record_symbol = %record.symbol,
                        "record symbol differs from its rule; using the rule's symbol"
                    );
                }
                rule.productions.push(production);
            }
            Ordering::Equal => self.rules.push(ProductionRule {
                symbol: record.symbol,
                productions: vec![production],
            }),
            Ordering::Greater => {
                return Err(GrammarError::malformed(
                    line_no,
                    line,
                    format!(
                        "index {} skips ahead of the {} rules defined so far",
                        record.index,
                        self.rules.len()
                    ),
                ));
            }
        }

        Ok(())
    }

    /// Serialize this grammar back into the rule file format
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        if self.axiom.contains('\n') {
            return Err(GrammarError::ValidationFailed(
                "axiom spans multiple lines".to_string(),
            ));
        }
        writeln!(writer, "{}", self.axiom)?;

        for (index, rule) in self.rules.iter().enumerate() {
            if rule.symbol == ':' || rule.symbol == '\n' {
                return Err(GrammarError::ValidationFailed(format!(
                    "symbol {:?} cannot be written to a rule file",
                    rule.symbol
                )));
            }
            for production in &rule.productions {
                if production.replacement.contains([':', '\n']) {
                    return Err(GrammarError::ValidationFailed(format!(
                        "replacement {:?} for '{}' cannot be written to a rule file",
                        production.replacement, rule.symbol
                    )));
                }
                writeln!(
                    writer,
                    "{}:{}:{}:{}",
                    index, rule.symbol, production.replacement, production.probability
                )?;
            }
        }

        Ok(())
    }

    /// Run the optional coverage pass over every rule
    pub fn coverage_issues(&self, tolerance: f64) -> Vec<CoverageIssue> {
        let mut issues = Vec::new();

        for (index, rule) in self.rules.iter().enumerate() {
            if self.rules[..index].iter().any(|r| r.symbol == rule.symbol) {
                issues.push(CoverageIssue::ShadowedRule {
                    symbol: rule.symbol,
                    index,
                });
            }

            for (position, production) in rule.productions.iter().enumerate() {
                if !(0.0..=1.0).contains(&production.probability) {
                    issues.push(CoverageIssue::OutOfRange {
                        symbol: rule.symbol,
                        position,
                        probability: production.probability,
                    });
                }
            }

            let total = rule.total_probability();
            if total < 1.0 - tolerance {
                issues.push(CoverageIssue::Undercovered {
                    symbol: rule.symbol,
                    total,
                });
            } else if total > 1.0 + tolerance {
                issues.push(CoverageIssue::Overcovered {
                    symbol: rule.symbol,
                    total,
                });
            }
        }

        issues
    }

    /// Fail if the coverage pass reports anything
    pub fn validate(&self, tolerance: f64) -> Result<()> {
        let issues = self.coverage_issues(tolerance);
        if issues.is_empty() {
            return Ok(());
        }

        let summary = issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(GrammarError::ValidationFailed(summary))
    }

    /// First rule whose symbol matches, in stored order
    pub fn rule_for(&self, symbol: char) -> Option<&ProductionRule> {
        self.rules.iter().find(|rule| rule.symbol == symbol)
    }

    /// Check if the grammar rewrites a symbol
    pub fn has_rule(&self, symbol: char) -> bool {
        self.rule_for(symbol).is_some()
    }

    /// Get the rule table in first-seen order
    pub fn rules(&self) -> &[ProductionRule] {
        &self.rules
    }

    /// Get the initial string
    pub fn axiom(&self) -> &str {
        &self.axiom
    }

    /// Symbols that have a rule, in rule order
    pub fn symbols(&self) -> impl Iterator<Item = char> + '_ {
        self.rules.iter().map(|rule| rule.symbol)
    }
}

/// Builder for constructing Grammar instances in code
#[derive(Debug, Default)]
pub struct GrammarBuilder {
    grammar: Grammar,
}

impl GrammarBuilder {
    /// Create a new grammar builder with the given axiom
    pub fn new(axiom: &str) -> Self {
        GrammarBuilder {
            grammar: Grammar {
                axiom: axiom.to_string(),
                rules: Vec::new(),
            },
        }
    }

    /// Replace the axiom
    pub fn axiom(mut self, axiom: &str) -> Self {
        self.grammar.axiom = axiom.to_string();
        self
    }

    /// Add a production, appending to the first rule for `symbol` or opening a new one
    pub fn rule(mut self, symbol: char, replacement: &str, probability: f64) -> Self {
        let production = Production::new(replacement, probability);
        match self.grammar.rules.iter_mut().find(|r| r.symbol == symbol) {
            Some(rule) => rule.productions.push(production),
            None => self.grammar.rules.push(ProductionRule {
                symbol,
                productions: vec![production],
            }),
        }
        self
    }

    /// Build the grammar
    pub fn build(self) -> Grammar {
        self.grammar
    }
}

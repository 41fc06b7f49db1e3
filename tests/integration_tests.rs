use lsystem_gen::{
    CoverageIssue, DEFAULT_TOLERANCE, Grammar, GrammarBuilder, GrammarError, LSystem,
    ReplayDraws, RunConfig, advance, advance_n,
};
use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

fn grammar_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_from_file() {
    let file = grammar_file("A\n0:A:AB:1.0\n");

    let grammar = Grammar::from_file(file.path()).unwrap();

    assert_eq!(grammar.axiom(), "A");
    assert_eq!(grammar.rules().len(), 1);
    assert_eq!(grammar.rules()[0].productions[0].replacement, "AB");
    assert_eq!(grammar.rules()[0].productions[0].probability, 1.0);
}

#[test]
fn test_missing_file_is_source_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.txt");

    match Grammar::from_file(&path) {
        Err(GrammarError::SourceUnavailable { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("Expected SourceUnavailable, got {:?}", other),
    }
}

#[test]
fn test_malformed_file_reports_line() {
    let file = grammar_file("F\n0:F:FF:1.0\n1:G:GG:0.5\n7:H:HH:1.0\n");

    let err = Grammar::from_file(file.path()).unwrap_err();
    assert_eq!(err.line(), Some(4));
    assert!(err.to_string().contains("7:H:HH:1.0"));
}

#[test]
fn test_generations_from_loaded_grammar() {
    let file = grammar_file("A\n0:A:AB:1.0\n");
    let grammar = Grammar::from_file(file.path()).unwrap();
    let mut rng = StdRng::seed_from_u64(3);

    let mut system = LSystem::new(grammar);
    let mut seen = vec![system.current().to_string()];
    for _ in 0..3 {
        seen.push(system.step(&mut rng).unwrap().to_string());
    }

    assert_eq!(seen, vec!["A", "AB", "ABB", "ABBB"]);
}

#[test]
fn test_stochastic_branching_with_replayed_draws() {
    let grammar = Grammar::parse("F\n0:F:F[+F]:0.5\n0:F:F[-F]:0.5\n").unwrap();

    let mut draws = ReplayDraws::new([0.25, 0.75, 0.5]);
    let first = advance(grammar.axiom(), &grammar, &mut draws).unwrap();
    assert_eq!(first, "F[+F]");

    let second = advance(&first, &grammar, &mut draws).unwrap();
    assert_eq!(second, "F[-F][+F[+F]]");
    assert_eq!(draws.remaining(), 0);
}

#[test]
fn test_unmatched_symbols_survive_many_generations() {
    let grammar = GrammarBuilder::new("x+F-y")
        .rule('F', "F+F", 0.5)
        .rule('F', "F-F", 0.5)
        .build();
    let mut rng = StdRng::seed_from_u64(11);

    let result = advance_n(grammar.axiom(), &grammar, 4, &mut rng).unwrap();

    assert!(result.starts_with("x+"));
    assert!(result.ends_with("-y"));
    assert_eq!(result.matches('x').count(), 1);
    assert_eq!(result.matches('y').count(), 1);
    assert_eq!(result.matches('F').count(), 16);
}

#[test]
fn test_undercovered_rule_can_delete_everything() {
    let grammar = Grammar::parse("AAAA\n0:A:A:0.2\n").unwrap();

    assert_eq!(
        grammar.coverage_issues(DEFAULT_TOLERANCE),
        vec![CoverageIssue::Undercovered { symbol: 'A', total: 0.2 }]
    );

    let mut draws = ReplayDraws::new([0.2, 0.21, 0.5, 0.999]);
    assert_eq!(advance(grammar.axiom(), &grammar, &mut draws).unwrap(), "A");
}

#[test]
fn test_same_seed_same_instructions() {
    let text = "X\n0:X:F[+X]F[-X]+X:0.34\n0:X:F[-X]F[+X]-X:0.33\n0:X:F[+X][-X]FX:0.33\n1:F:FF:1.0\n";
    let grammar = Grammar::parse(text).unwrap();

    let run = |seed| {
        let mut system = LSystem::new(grammar.clone());
        system.run(4, &mut StdRng::seed_from_u64(seed)).unwrap();
        system.into_instructions()
    };

    assert_eq!(run(2024), run(2024));
}

#[test]
fn test_written_grammar_reloads() {
    let grammar = GrammarBuilder::new("F+F+F")
        .rule('F', "F-F+F", 0.75)
        .rule('F', "F", 0.25)
        .build();

    let file = NamedTempFile::new().unwrap();
    grammar.write_to(fs::File::create(file.path()).unwrap()).unwrap();

    assert_eq!(Grammar::from_file(file.path()).unwrap(), grammar);
}

#[test]
fn test_config_file() {
    let file = grammar_file(r#"{ "generations": 5, "angle_degrees": 25, "coverage": "ignore" }"#);

    let config = RunConfig::from_file(file.path()).unwrap();

    assert_eq!(config.generations, 5);
    assert_eq!(config.angle_degrees, 25);
    assert_eq!(config.seed, None);
}

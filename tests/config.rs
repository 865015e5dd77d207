use canopy::config::{Marginal, Scenario};
use canopy::Error;
use std::io::Write;

#[test]
fn test_default_round_trip() {
    let scenario = Scenario::default();
    let content = scenario.to_toml().unwrap();
    let parsed = Scenario::from_toml(&content).unwrap();
    assert_eq!(parsed, scenario);
}

#[test]
fn test_round_trip_with_marginals() {
    let mut scenario = Scenario::default();
    scenario.reporting_threshold = 100.0;
    scenario.sensitivity.seed = 1234;
    scenario.sensitivity.marginals.insert(
        "post_closure_rate".to_string(),
        Marginal { mean: 2.5, sd: 0.5 },
    );

    let content = scenario.to_toml().unwrap();
    assert!(content.contains("[sensitivity.marginals.post_closure_rate]"));
    assert_eq!(Scenario::from_toml(&content).unwrap(), scenario);
}

#[test]
fn test_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "initial_stock = 20.0\n\n[solver]\nrtol = 1e-6").unwrap();

    let scenario = Scenario::from_file(file.path()).unwrap();
    assert_eq!(scenario.initial_stock, 20.0);
    assert_eq!(scenario.solver.rtol, 1e-6);
    assert_eq!(scenario.solver.atol, 1e-8);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = Scenario::from_file(dir.path().join("missing.toml"));
    assert!(matches!(result, Err(Error::Io(_))));
}

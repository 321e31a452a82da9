//! Conformance tests that run YAML fixtures against casewise
//!
//! Run with: cargo test -p casewise-test --test conformance
//!
//! Note: This test file requires the `fixtures` feature (on by default).

#![cfg(feature = "fixtures")]

use casewise_test::fixture::Fixture;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the spec/tests directory relative to the workspace root
fn fixtures_dir() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let ext_test = Path::new(manifest_dir);

    // Go up: ext/test -> ext -> workspace root
    let root = ext_test
        .parent() // ext
        .and_then(|p| p.parent()) // root
        .expect("Could not find workspace root");

    root.join("spec").join("tests")
}

/// Load and run all fixtures in a directory
fn run_fixtures_in_dir(dir: &Path) {
    assert!(
        dir.exists(),
        "Fixtures directory does not exist: {}",
        dir.display()
    );

    let mut ran = 0;
    for entry in fs::read_dir(dir).expect("read dir") {
        let path = entry.expect("dir entry").path();

        if path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml")
        {
            println!("Running fixture: {}", path.display());

            let yaml = fs::read_to_string(&path).expect("read yaml");

            // Parse potentially multiple fixtures (separated by ---)
            let fixtures = Fixture::from_yaml_multi(&yaml).unwrap_or_else(|e| {
                panic!("Failed to parse {}: {}", path.display(), e);
            });

            for fixture in fixtures {
                println!("  Running: {}", fixture.name);
                fixture.run_and_assert();
                ran += 1;
            }
        }
    }
    assert!(ran > 0, "no fixtures found in {}", dir.display());
}

#[test]
fn test_validity() {
    run_fixtures_in_dir(&fixtures_dir().join("01_validity"));
}

#[test]
fn test_validate() {
    run_fixtures_in_dir(&fixtures_dir().join("02_validate"));
}

#[test]
fn test_filter() {
    run_fixtures_in_dir(&fixtures_dir().join("03_filter"));
}

#[test]
fn test_single_fixture_parses() {
    let fixture = Fixture::from_yaml(
        r#"
name: inline
kind: validity
cases:
  - name: blank string
    payload: ""
    expect: false
"#,
    )
    .expect("parse");

    let results = fixture.run().expect("run");
    assert_eq!(results.len(), 1);
    assert!(results[0].passed, "{results:?}");
}

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

const GRAPH: &str = r#"{
    "name": "A",
    "children": [
        { "name": "B", "children": [ { "name": "E" }, { "name": "F" } ] },
        { "name": "C", "children": [ { "name": "G" }, { "name": "H" }, { "name": "I" } ] },
        { "name": "D", "children": [ { "name": "J" } ] }
    ]
}"#;

fn write_graph(dir: &TempDir) -> Result<PathBuf> {
    let path = dir.path().join("input_graph.json");
    fs::write(&path, GRAPH)?;
    Ok(path)
}

fn tagscout(dir: &TempDir) -> Result<Command> {
    let mut cmd = Command::cargo_bin("tagscout")?;
    cmd.current_dir(dir.path()).env_remove("RUST_LOG");
    Ok(cmd)
}

#[test]
fn test_walk_prints_pre_order() -> Result<()> {
    let dir = tempdir()?;
    write_graph(&dir)?;

    tagscout(&dir)?
        .arg("walk")
        .assert()
        .success()
        .stdout("A\nB\nE\nF\nC\nG\nH\nI\nD\nJ\n");
    Ok(())
}

#[test]
fn test_paths_prints_every_leaf_path() -> Result<()> {
    let dir = tempdir()?;
    let graph = write_graph(&dir)?;

    tagscout(&dir)?
        .args(["paths", "--input", graph.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "paths(A) = ( (A B E) (A B F) (A C G) (A C H) (A C I) (A D J) )",
        ));
    Ok(())
}

#[test]
fn test_search_prints_subtree() -> Result<()> {
    let dir = tempdir()?;
    write_graph(&dir)?;

    let output = tagscout(&dir)?
        .args(["search", "--tag", "C", "-j", "2"])
        .output()?;
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["name"], "C");
    assert_eq!(json["children"].as_array().map(Vec::len), Some(3));
    Ok(())
}

#[test]
fn test_search_for_absent_tag_fails() -> Result<()> {
    let dir = tempdir()?;
    write_graph(&dir)?;

    tagscout(&dir)?
        .args(["search", "--tag", "Z"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Tag Z was not found"));
    Ok(())
}

#[test]
fn test_missing_input_fails() -> Result<()> {
    let dir = tempdir()?;

    tagscout(&dir)?
        .arg("walk")
        .assert()
        .failure()
        .stderr(predicate::str::contains("input_graph.json"));
    Ok(())
}

#[test]
fn test_config_file_sets_input() -> Result<()> {
    let dir = tempdir()?;
    let graph = dir.path().join("custom.json");
    fs::write(&graph, GRAPH)?;
    let config = dir.path().join("tagscout.yaml");
    fs::write(&config, format!("graph_path: {}\n", graph.display()))?;

    tagscout(&dir)?
        .args(["--config", config.to_str().unwrap(), "walk"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("A\nB\n"));
    Ok(())
}

#[test]
fn test_count_words() -> Result<()> {
    let dir = tempdir()?;
    let text = dir.path().join("text.txt");
    fs::write(&text, "the cat and the hat, THE end")?;

    tagscout(&dir)?
        .args(["count-words", text.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("3 the\n1 and\n"));
    Ok(())
}

#[test]
fn test_empty_tag_is_rejected() -> Result<()> {
    let dir = tempdir()?;
    write_graph(&dir)?;

    tagscout(&dir)?
        .args(["search", "--tag", ""])
        .assert()
        .failure()
        .stderr(predicate::str::contains("tag must not be empty"));
    Ok(())
}

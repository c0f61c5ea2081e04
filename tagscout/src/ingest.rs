use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::errors::{TagScoutError, TagScoutResult};
use crate::node::Node;

/// Parses a tree from `{ "name": ..., "children": [...] }` JSON
///
/// Nesting depth is unbounded; deep documents grow the stack on the heap
/// instead of overflowing it.
pub fn parse_tree(json: &str) -> TagScoutResult<Node> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    deserializer.disable_recursion_limit();
    let root = Node::deserialize(serde_stacker::Deserializer::new(&mut deserializer))?;
    deserializer.end()?;
    debug!("Parsed tree with {} nodes", root.size());
    Ok(root)
}

/// Reads and parses a tree from a JSON file
pub fn load_tree(path: impl AsRef<Path>) -> TagScoutResult<Node> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => TagScoutError::tree_not_found(path),
        _ => TagScoutError::IoError(e),
    })?;

    let root = parse_tree(&content)?;
    info!("Loaded {} nodes from {}", root.size(), path.display());
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::TreeNode;
    use tempfile::tempdir;

    #[test]
    fn test_parse_nested_tree() {
        let root = parse_tree(
            r#"{
                "name": "A",
                "children": [
                    { "name": "B", "children": [ { "name": "E" }, { "name": "F" } ] },
                    { "name": "D", "children": [] }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(root.name(), "A");
        assert_eq!(root.size(), 5);
        assert_eq!(root.children()[0].children()[1].name(), "F");
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        let err = parse_tree(r#"{"name": "A", "children": ["#).unwrap_err();
        assert!(matches!(err, TagScoutError::JsonError(_)));
    }

    #[test]
    fn test_parse_rejects_trailing_content() {
        let err = parse_tree(r#"{"name": "A"} {"name": "B"}"#).unwrap_err();
        assert!(matches!(err, TagScoutError::JsonError(_)));
    }

    #[test]
    fn test_load_tree_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.json");
        fs::write(&path, r#"{"name": "root", "children": [{"name": "leaf"}]}"#).unwrap();

        let root = load_tree(&path).unwrap();
        assert_eq!(root.name(), "root");
        assert_eq!(root.children()[0].name(), "leaf");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_tree(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, TagScoutError::TreeNotFound(_)));
    }
}

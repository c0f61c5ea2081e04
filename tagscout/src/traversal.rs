//! Sequential, deterministic walks over any [`TreeNode`]
//!
//! Both utilities visit children in their stored order on the caller's
//! thread. Neither uses the task pool.

use crate::node::TreeNode;

/// Every node in pre-order: parent first, then children left to right
pub fn walk<N: TreeNode>(root: Option<&N>) -> Vec<&N> {
    let mut nodes = Vec::new();
    if let Some(root) = root {
        collect(root, &mut nodes);
    }
    nodes
}

fn collect<'a, N: TreeNode>(node: &'a N, nodes: &mut Vec<&'a N>) {
    nodes.push(node);
    for child in node.children() {
        collect(child, nodes);
    }
}

/// Every root-to-leaf path, left to right
pub fn paths<N: TreeNode>(root: Option<&N>) -> Vec<Vec<&N>> {
    let mut paths = Vec::new();
    if let Some(root) = root {
        let mut path = Vec::new();
        descend(root, &mut path, &mut paths);
    }
    paths
}

fn descend<'a, N: TreeNode>(node: &'a N, path: &mut Vec<&'a N>, paths: &mut Vec<Vec<&'a N>>) {
    path.push(node);
    if node.children().is_empty() {
        paths.push(path.clone());
    } else {
        for child in node.children() {
            descend(child, path, paths);
        }
    }
    path.pop();
}

/// Render paths as `paths(A) = ( (A B E) (A B F) )`
pub fn format_paths<N: TreeNode>(paths: &[Vec<&N>]) -> String {
    let root = paths
        .first()
        .and_then(|path| path.first())
        .map(|node| node.name())
        .unwrap_or_default();

    let rendered: String = paths
        .iter()
        .map(|path| {
            let names: Vec<&str> = path.iter().map(|node| node.name()).collect();
            format!(" ({})", names.join(" "))
        })
        .collect();

    format!("paths({}) = ({} )", root, rendered)
}

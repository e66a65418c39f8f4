//! Cycle detection over the unresolved function graph.
//!
//! Depth-first traversal from every unresolved function in lexicographic
//! name order, dependencies in first-appearance order. Hitting a node
//! already on the path emits the path suffix as a candidate cycle;
//! candidates sharing a node are then fused pairwise until a fixed point.
//! The result is the set of strongly connected components among the
//! unresolved functions, in a deterministic order.

use indexmap::IndexMap;
use std::collections::HashSet;

/// Find the cycles among `deps` (a map restricted to unresolved
/// functions; dependency lists must likewise only mention unresolved
/// functions).
pub(crate) fn detect_cycles(deps: &IndexMap<String, Vec<String>>) -> Vec<Vec<String>> {
    let mut starts: Vec<&String> = deps.keys().collect();
    starts.sort();

    let mut candidates: Vec<Vec<String>> = Vec::new();
    for start in starts {
        let mut path = vec![start.clone()];
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(start.clone());
        dfs(start, deps, &mut path, &mut visited, &mut candidates);
    }

    merge_candidates(candidates)
}

fn dfs(
    node: &str,
    deps: &IndexMap<String, Vec<String>>,
    path: &mut Vec<String>,
    visited: &mut HashSet<String>,
    candidates: &mut Vec<Vec<String>>,
) {
    let Some(node_deps) = deps.get(node) else {
        return;
    };
    for dep in node_deps {
        if let Some(i) = path.iter().position(|n| n == dep) {
            candidates.push(path[i..].to_vec());
        } else if visited.insert(dep.clone()) {
            path.push(dep.clone());
            dfs(dep, deps, path, visited, candidates);
            path.pop();
        }
    }
}

/// Fuse candidate cycles that share a node: order comes from the first,
/// new members of the second append in their order.
fn merge_candidates(mut cycles: Vec<Vec<String>>) -> Vec<Vec<String>> {
    loop {
        let mut merged_pair = None;
        'search: for i in 0..cycles.len() {
            for j in i + 1..cycles.len() {
                if cycles[i].iter().any(|n| cycles[j].contains(n)) {
                    merged_pair = Some((i, j));
                    break 'search;
                }
            }
        }
        let Some((i, j)) = merged_pair else {
            return cycles;
        };
        let second = cycles.remove(j);
        for node in second {
            if !cycles[i].contains(&node) {
                cycles[i].push(node);
            }
        }
    }
}

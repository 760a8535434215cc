//! Skill dependency graph.
//!
//! An edge `from -> to` means "`from` requires `to`". The graph of a project
//! must stay acyclic, so an insertion is only accepted when `to` cannot
//! already reach `from`.
//!
//! The graph is rebuilt from the stored edges for each check. Check and
//! insert happen while holding the project's entry in [`GraphLocks`], which
//! keeps two concurrent insertions from jointly closing a cycle.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Directed prerequisite graph over skill ids.
///
/// Adjacency is kept in ordered collections so searches, and therefore the
/// reported cycle paths, are deterministic.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from `(from, to)` pairs without cycle checks.
    pub fn from_edges<I, S>(edges: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let mut graph = Self::new();
        for (from, to) in edges {
            graph
                .edges
                .entry(from.into())
                .or_default()
                .insert(to.into());
        }
        graph
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    pub fn contains_edge(&self, from: &str, to: &str) -> bool {
        self.edges.get(from).is_some_and(|targets| targets.contains(to))
    }

    /// Direct prerequisites of `skill`.
    pub fn direct_prerequisites(&self, skill: &str) -> Vec<String> {
        self.edges
            .get(skill)
            .map(|targets| targets.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Insert `from -> to` unless it would close a cycle.
    ///
    /// On rejection returns the cycle: the existing path from `to` to `from`
    /// followed by `to` again, e.g. `[A, B, A]` when `A -> B` exists and
    /// `B -> A` is being added. Inserting an existing edge is a no-op.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<(), Vec<String>> {
        if self.contains_edge(from, to) {
            return Ok(());
        }
        if let Some(mut path) = self.path(to, from) {
            path.push(to.to_string());
            return Err(path);
        }
        self.edges
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
        Ok(())
    }

    /// Remove `from -> to`. Returns whether the edge existed.
    pub fn remove_edge(&mut self, from: &str, to: &str) -> bool {
        let Some(targets) = self.edges.get_mut(from) else {
            return false;
        };
        let removed = targets.remove(to);
        if targets.is_empty() {
            self.edges.remove(from);
        }
        removed
    }

    /// Shortest path from `start` to `goal` along edge direction (BFS).
    ///
    /// A node trivially reaches itself: `path(a, a) == Some([a])`.
    pub fn path(&self, start: &str, goal: &str) -> Option<Vec<String>> {
        if start == goal {
            return Some(vec![start.to_string()]);
        }

        let mut parents: HashMap<&str, &str> = HashMap::new();
        let mut visited: HashSet<&str> = HashSet::from([start]);
        let mut queue: VecDeque<&str> = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            let Some(targets) = self.edges.get(current) else {
                continue;
            };
            for next in targets {
                if !visited.insert(next.as_str()) {
                    continue;
                }
                parents.insert(next.as_str(), current);
                if next == goal {
                    return Some(Self::unwind(&parents, start, goal));
                }
                queue.push_back(next.as_str());
            }
        }

        None
    }

    fn unwind<'a>(parents: &HashMap<&'a str, &'a str>, start: &'a str, goal: &'a str) -> Vec<String> {
        let mut path = vec![goal.to_string()];
        let mut current = goal;
        while current != start {
            // every visited node except start has a parent
            let Some(&parent) = parents.get(current) else {
                break;
            };
            path.push(parent.to_string());
            current = parent;
        }
        path.reverse();
        path
    }

    /// Every skill transitively required by `skill`, nearest first.
    pub fn prerequisites(&self, skill: &str) -> Vec<String> {
        let mut visited: HashSet<&str> = HashSet::from([skill]);
        let mut queue: VecDeque<&str> = VecDeque::from([skill]);
        let mut order = Vec::new();

        while let Some(current) = queue.pop_front() {
            if let Some(targets) = self.edges.get(current) {
                for next in targets {
                    if visited.insert(next.as_str()) {
                        order.push(next.clone());
                        queue.push_back(next.as_str());
                    }
                }
            }
        }

        order
    }

    /// Check the whole graph for cycles (Kahn's algorithm).
    pub fn is_acyclic(&self) -> bool {
        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        for (from, targets) in &self.edges {
            in_degree.entry(from.as_str()).or_insert(0);
            for to in targets {
                *in_degree.entry(to.as_str()).or_insert(0) += 1;
            }
        }

        let mut queue: VecDeque<&str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(node, _)| *node)
            .collect();
        let mut seen = 0;

        while let Some(node) = queue.pop_front() {
            seen += 1;
            if let Some(targets) = self.edges.get(node) {
                for to in targets {
                    if let Some(degree) = in_degree.get_mut(to.as_str()) {
                        *degree -= 1;
                        if *degree == 0 {
                            queue.push_back(to.as_str());
                        }
                    }
                }
            }
        }

        seen == in_degree.len()
    }
}

/// One async mutex per project graph.
///
/// The outer map lock is only held long enough to fetch or create the
/// project's entry; callers then await the project mutex itself.
#[derive(Debug, Default)]
pub struct GraphLocks {
    projects: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl GraphLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `project_id`'s graph.
    pub async fn lock(&self, project_id: &str) -> OwnedMutexGuard<()> {
        let entry = {
            let mut projects = self
                .projects
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            projects
                .entry(project_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        entry.lock_owned().await
    }

    /// Drop the lock entry of a deleted project.
    pub fn forget(&self, project_id: &str) {
        let mut projects = self
            .projects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        projects.remove(project_id);
    }
}

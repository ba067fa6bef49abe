//! Package import graph built on petgraph
//!
//! ## Graph Structure
//!
//! - **Directed Graph**: `A → B` means "A imports B"
//! - **Nodes**: packages of the analyzed module set, stored in petgraph's arena
//! - **Edges**: direct imports; imports outside the set are dropped
//! - **Index**: import path → node index
//!
//! The graph is built once and never mutated afterwards. Neighbours are always
//! returned in the order the imports were declared, which keeps path
//! tie-breaking and walk order reproducible.

use crate::core::error::{AffectedError, AffectedResult};
use crate::module::{ImportPath, Package, RawPackage};
use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::str::FromStr;

/// Which way [`PackageGraph::walk`] travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkDirection {
  /// Towards packages that import the current one
  Parents,
  /// Towards packages the current one imports
  Imports,
}

impl FromStr for WalkDirection {
  type Err = AffectedError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "parents" => Ok(Self::Parents),
      "imports" => Ok(Self::Imports),
      other => Err(AffectedError::InvalidWalkDirection {
        direction: other.to_string(),
      }),
    }
  }
}

impl WalkDirection {
  fn petgraph(self) -> Direction {
    match self {
      WalkDirection::Parents => Direction::Incoming,
      WalkDirection::Imports => Direction::Outgoing,
    }
  }
}

/// What a walk visitor wants to happen next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
  /// Descend into this package's neighbours
  Continue,
  /// Do not descend from this package; the rest of the walk goes on
  SkipChildren,
}

/// Import graph of the analyzed packages.
pub struct PackageGraph {
  graph: DiGraph<Package, ()>,
  id_to_node: HashMap<String, NodeIndex>,
}

impl PackageGraph {
  /// Build the graph from resolver output.
  ///
  /// Packages are added in input order; a repeated import path keeps its first
  /// occurrence. An edge exists only when both ends are in the input.
  pub fn build(raw: &[RawPackage]) -> Self {
    let mut graph = DiGraph::with_capacity(raw.len(), raw.len() * 2);
    let mut id_to_node = HashMap::with_capacity(raw.len());
    let mut sources = Vec::with_capacity(raw.len());

    for pkg in raw {
      if id_to_node.contains_key(&pkg.id) {
        continue;
      }
      let idx = graph.add_node(Package::from(pkg));
      id_to_node.insert(pkg.id.clone(), idx);
      sources.push((idx, pkg));
    }

    for (from, pkg) in sources {
      for import in &pkg.imports {
        if let Some(&to) = id_to_node.get(import) {
          graph.update_edge(from, to, ());
        }
      }
    }

    Self { graph, id_to_node }
  }

  pub fn len(&self) -> usize {
    self.graph.node_count()
  }

  pub fn is_empty(&self) -> bool {
    self.graph.node_count() == 0
  }

  pub fn edge_count(&self) -> usize {
    self.graph.edge_count()
  }

  /// All packages in insertion order.
  pub fn packages(&self) -> impl Iterator<Item = (NodeIndex, &Package)> {
    self.graph.node_indices().map(move |idx| (idx, &self.graph[idx]))
  }

  pub fn package(&self, idx: NodeIndex) -> &Package {
    &self.graph[idx]
  }

  /// First package (in insertion order) satisfying `predicate`.
  ///
  /// Multiple matches are not disambiguated, so predicates should be unique.
  pub fn find(&self, predicate: impl Fn(&Package) -> bool) -> Option<NodeIndex> {
    self.graph.node_indices().find(|&idx| predicate(&self.graph[idx]))
  }

  pub fn find_by_id(&self, id: &str) -> Option<NodeIndex> {
    self.id_to_node.get(id).copied()
  }

  pub fn find_by_dir(&self, dir: &Path) -> Option<NodeIndex> {
    self.find(|pkg| !pkg.dir.as_os_str().is_empty() && pkg.dir == dir)
  }

  /// Direct imports of a package, in declaration order.
  pub fn imports(&self, idx: NodeIndex) -> Vec<NodeIndex> {
    self.neighbours(idx, Direction::Outgoing)
  }

  /// Packages that directly import this one, in graph construction order.
  pub fn parents(&self, idx: NodeIndex) -> Vec<NodeIndex> {
    self.neighbours(idx, Direction::Incoming)
  }

  /// petgraph yields neighbours newest-first; sort by edge index to restore insertion order.
  fn neighbours(&self, idx: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
    let mut edges: Vec<(EdgeIndex, NodeIndex)> = self
      .graph
      .edges_directed(idx, direction)
      .map(|edge| {
        let other = match direction {
          Direction::Outgoing => edge.target(),
          Direction::Incoming => edge.source(),
        };
        (edge.id(), other)
      })
      .collect();
    edges.sort_by_key(|(edge, _)| *edge);
    edges.into_iter().map(|(_, node)| node).collect()
  }

  /// Shortest import chain from `start` down to `end`.
  ///
  /// Breadth-first over imports, so the path is cycle-free and minimal; among
  /// equally short paths the first one discovered in declaration order wins.
  /// Returns `[start]` when `start == end` and `None` when `start` does not
  /// (transitively) import `end`.
  pub fn import_path(&self, start: NodeIndex, end: NodeIndex) -> Option<ImportPath> {
    if start == end {
      return Some(vec![self.graph[start].clone()]);
    }

    let mut previous: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut queue = VecDeque::from([start]);
    previous.insert(start, start);

    while let Some(current) = queue.pop_front() {
      for next in self.imports(current) {
        if previous.contains_key(&next) {
          continue;
        }
        previous.insert(next, current);
        if next == end {
          return Some(self.unwind(&previous, start, end));
        }
        queue.push_back(next);
      }
    }

    None
  }

  fn unwind(&self, previous: &HashMap<NodeIndex, NodeIndex>, start: NodeIndex, end: NodeIndex) -> ImportPath {
    let mut path = vec![self.graph[end].clone()];
    let mut node = end;
    while node != start {
      node = previous[&node];
      path.push(self.graph[node].clone());
    }
    path.reverse();
    path
  }

  /// Shortest import chain to `end` from every package that reaches it.
  ///
  /// One reverse breadth-first search instead of one search per package.
  /// Results are in graph insertion order and include `end` itself as `[end]`.
  pub fn import_paths_to(&self, end: NodeIndex) -> Vec<(NodeIndex, ImportPath)> {
    // node -> next hop towards `end`
    let mut next_hop: HashMap<NodeIndex, Option<NodeIndex>> = HashMap::new();
    let mut queue = VecDeque::from([end]);
    next_hop.insert(end, None);

    while let Some(current) = queue.pop_front() {
      for parent in self.parents(current) {
        if next_hop.contains_key(&parent) {
          continue;
        }
        next_hop.insert(parent, Some(current));
        queue.push_back(parent);
      }
    }

    self
      .graph
      .node_indices()
      .filter(|idx| next_hop.contains_key(idx))
      .map(|start| {
        let mut path = vec![self.graph[start].clone()];
        let mut node = start;
        while let Some(Some(next)) = next_hop.get(&node) {
          path.push(self.graph[*next].clone());
          node = *next;
        }
        (start, path)
      })
      .collect()
  }

  /// Depth-first walk from `start`, calling `visit` for `start` and then for
  /// every package reachable in `direction`.
  ///
  /// There is no global visited set: a package reachable along two branches
  /// is visited twice. A package already on the current branch is not
  /// re-entered, so cycles cannot recurse forever. `visit` returning
  /// [`WalkControl::SkipChildren`] prunes that branch only; an error aborts
  /// the whole walk and is returned unchanged.
  pub fn walk<F>(&self, start: NodeIndex, direction: WalkDirection, mut visit: F) -> AffectedResult<()>
  where
    F: FnMut(NodeIndex, &Package) -> AffectedResult<WalkControl>,
  {
    let mut branch = Vec::new();
    self.walk_from(start, direction.petgraph(), &mut branch, &mut visit)
  }

  fn walk_from<F>(
    &self,
    node: NodeIndex,
    direction: Direction,
    branch: &mut Vec<NodeIndex>,
    visit: &mut F,
  ) -> AffectedResult<()>
  where
    F: FnMut(NodeIndex, &Package) -> AffectedResult<WalkControl>,
  {
    if visit(node, &self.graph[node])? == WalkControl::SkipChildren {
      return Ok(());
    }

    branch.push(node);
    for next in self.neighbours(node, direction) {
      if branch.contains(&next) {
        continue;
      }
      self.walk_from(next, direction, branch, visit)?;
    }
    branch.pop();

    Ok(())
  }
}

//! Resource graph - ordered declarations plus the edges between them
//!
//! The graph only records edges. Ordering, diffing against live state and
//! applying belong to the engine; `waves` exists to preview an order and to
//! prove the graph is acyclic.

use crate::error::{GraphError, Result};
use crate::resource::Declaration;
use crate::types::{Kind, ResourceId};
use std::collections::HashMap;

/// Declarations in declaration order, indexed by id and by symbol
#[derive(Debug, Clone, Default)]
pub struct ResourceGraph {
    declarations: Vec<Declaration>,
    by_id: HashMap<ResourceId, usize>,
    by_symbol: HashMap<String, usize>,
}

impl ResourceGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from declarations, e.g. ones read back from a snapshot
    pub fn from_declarations(declarations: impl IntoIterator<Item = Declaration>) -> Result<Self> {
        let mut graph = Self::new();
        for declaration in declarations {
            graph.add(declaration)?;
        }
        Ok(graph)
    }

    /// Add a declaration, returning its id for use in later edges
    ///
    /// Fails if the (kind, name) pair or its program symbol is already taken.
    pub fn add(&mut self, declaration: Declaration) -> Result<ResourceId> {
        let id = declaration.id.clone();
        if self.by_id.contains_key(&id) {
            return Err(GraphError::Duplicate(id));
        }

        let symbol = id.symbol();
        if let Some(&existing) = self.by_symbol.get(&symbol) {
            return Err(GraphError::SymbolCollision {
                symbol,
                first: self.declarations[existing].id.clone(),
                second: id,
            });
        }

        let index = self.declarations.len();
        self.by_id.insert(id.clone(), index);
        self.by_symbol.insert(symbol, index);
        self.declarations.push(declaration);
        Ok(id)
    }

    pub fn get(&self, id: &ResourceId) -> Option<&Declaration> {
        self.by_id.get(id).map(|&i| &self.declarations[i])
    }

    pub fn get_by_symbol(&self, symbol: &str) -> Option<&Declaration> {
        self.by_symbol.get(symbol).map(|&i| &self.declarations[i])
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Declarations in the order they were added
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Number of declarations of a given kind
    pub fn count_kind(&self, kind: Kind) -> usize {
        self.declarations.iter().filter(|d| d.kind() == kind).count()
    }

    /// Every predecessor of a declaration: explicit edges first, then
    /// declarations its parameters interpolate. Unresolvable names are skipped.
    pub fn predecessors(&self, id: &ResourceId) -> Vec<&ResourceId> {
        match self.by_id.get(id) {
            Some(&index) => self
                .predecessor_indices(index)
                .into_iter()
                .map(|i| &self.declarations[i].id)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Check that every edge resolves and the graph is acyclic
    pub fn validate(&self) -> Result<()> {
        for declaration in &self.declarations {
            for predecessor in declaration.explicit_predecessors() {
                if !self.by_id.contains_key(predecessor) {
                    return Err(GraphError::UnknownPredecessor {
                        from: declaration.id.clone(),
                        missing: predecessor.clone(),
                    });
                }
            }
            for symbol in declaration.references() {
                if !self.by_symbol.contains_key(&symbol) {
                    return Err(GraphError::UnknownReference {
                        from: declaration.id.clone(),
                        symbol,
                    });
                }
            }
        }

        let waves = self.wave_indices()?;
        log::debug!(
            "graph valid: {} declarations in {} waves",
            self.len(),
            waves.len()
        );
        Ok(())
    }

    /// Layer the graph so every declaration sits after all its predecessors
    ///
    /// Within a wave, declarations keep their declaration order. This is a
    /// preview only; the engine is free to order independent branches as it
    /// likes.
    pub fn waves(&self) -> Result<Vec<Vec<&Declaration>>> {
        Ok(self
            .wave_indices()?
            .into_iter()
            .map(|wave| wave.into_iter().map(|i| &self.declarations[i]).collect())
            .collect())
    }

    /// Declarations matching a target of the form "kind" or "kind.name"
    ///
    /// A target that is not a kind matches declarations whose name contains it.
    pub fn filter_by_target(&self, target: Option<&str>) -> Vec<&Declaration> {
        match target {
            None => self.declarations.iter().collect(),
            Some(t) => {
                let (kind, name) = parse_target(t);
                self.declarations
                    .iter()
                    .filter(|d| matches_filter(d, kind, name.as_deref()))
                    .collect()
            }
        }
    }

    fn predecessor_indices(&self, index: usize) -> Vec<usize> {
        let declaration = &self.declarations[index];
        let mut indices: Vec<usize> = Vec::new();

        let explicit = declaration
            .explicit_predecessors()
            .filter_map(|p| self.by_id.get(p).copied());
        let referenced = declaration
            .references()
            .into_iter()
            .filter_map(|s| self.by_symbol.get(&s).copied())
            .collect::<Vec<_>>();

        for i in explicit.chain(referenced) {
            if !indices.contains(&i) {
                indices.push(i);
            }
        }
        indices
    }

    /// Kahn's algorithm, level by level
    fn wave_indices(&self) -> Result<Vec<Vec<usize>>> {
        let n = self.declarations.len();
        let mut in_degree = vec![0usize; n];
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];

        for (index, degree) in in_degree.iter_mut().enumerate() {
            for predecessor in self.predecessor_indices(index) {
                *degree += 1;
                successors[predecessor].push(index);
            }
        }

        let mut waves = Vec::new();
        let mut current: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut placed = 0;

        while !current.is_empty() {
            placed += current.len();
            let mut next = Vec::new();
            for &i in &current {
                for &s in &successors[i] {
                    in_degree[s] -= 1;
                    if in_degree[s] == 0 {
                        next.push(s);
                    }
                }
            }
            next.sort_unstable();
            waves.push(current);
            current = next;
        }

        if placed < n {
            let remaining: Vec<usize> = (0..n).filter(|&i| in_degree[i] > 0).collect();
            return Err(GraphError::Cycle(self.find_cycle(&remaining)));
        }

        Ok(waves)
    }

    /// Walk predecessors from the first unplaced node until a node repeats
    ///
    /// Every unplaced node has at least one unplaced predecessor, so the walk
    /// always closes a loop.
    fn find_cycle(&self, remaining: &[usize]) -> Vec<ResourceId> {
        let Some(&start) = remaining.first() else {
            return Vec::new();
        };

        let mut path = vec![start];
        let mut current = start;
        loop {
            let next = self
                .predecessor_indices(current)
                .into_iter()
                .find(|p| remaining.contains(p));
            let Some(next) = next else {
                break;
            };
            if let Some(pos) = path.iter().position(|&p| p == next) {
                let mut cycle: Vec<usize> = path[pos..].to_vec();
                cycle.push(next);
                // walked predecessor-wards; report in edge direction
                cycle.reverse();
                return cycle
                    .into_iter()
                    .map(|i| self.declarations[i].id.clone())
                    .collect();
            }
            path.push(next);
            current = next;
        }

        path.into_iter()
            .map(|i| self.declarations[i].id.clone())
            .collect()
    }
}

/// Parse a target string like "kind.name" into (kind, name)
fn parse_target(target: &str) -> (Option<Kind>, Option<String>) {
    if let Ok(kind) = target.parse::<Kind>() {
        return (Some(kind), None);
    }
    if let Some((kind, name)) = target.split_once('.')
        && let Ok(kind) = kind.parse::<Kind>()
    {
        return (Some(kind), Some(name.to_string()));
    }
    (None, Some(target.to_string()))
}

/// Check if a declaration matches the filter criteria
fn matches_filter(declaration: &Declaration, kind: Option<Kind>, name: Option<&str>) -> bool {
    if let Some(k) = kind
        && declaration.kind() != k
    {
        return false;
    }

    if let Some(n) = name
        && !declaration.name().contains(n)
    {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(name: &str) -> Declaration {
        Declaration::new(Kind::Namespace, name)
    }

    fn release(name: &str) -> Declaration {
        Declaration::new(Kind::HelmRelease, name)
    }

    fn names(wave: &[&Declaration]) -> Vec<String> {
        wave.iter().map(|d| d.name().to_string()).collect()
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(parse_target("namespace"), (Some(Kind::Namespace), None));
        assert_eq!(
            parse_target("helm-release.kong"),
            (Some(Kind::HelmRelease), Some("kong".to_string()))
        );
        assert_eq!(parse_target("kong"), (None, Some("kong".to_string())));
        assert_eq!(
            parse_target("a.b.c"),
            (None, Some("a.b.c".to_string()))
        );
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let mut graph = ResourceGraph::new();
        graph.add(ns("kong")).unwrap();
        assert!(matches!(
            graph.add(ns("kong")),
            Err(GraphError::Duplicate(_))
        ));
        // same name, different kind is fine
        graph.add(release("kong")).unwrap();
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_add_rejects_symbol_collision() {
        let mut graph = ResourceGraph::new();
        graph.add(ns("a-b")).unwrap();
        let err = graph.add(ns("a_b")).unwrap_err();
        assert!(matches!(err, GraphError::SymbolCollision { .. }));
    }

    #[test]
    fn test_validate_unknown_predecessor() {
        let mut graph = ResourceGraph::new();
        let missing = ResourceId::new(Kind::Namespace, "missing");
        graph.add(release("r").depends_on(&missing)).unwrap();

        match graph.validate() {
            Err(GraphError::UnknownPredecessor { from, missing: m }) => {
                assert_eq!(from.name, "r");
                assert_eq!(m, missing);
            }
            other => panic!("expected UnknownPredecessor, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_unknown_reference() {
        let mut graph = ResourceGraph::new();
        graph
            .add(release("r").param("namespace", "${namespace_ghost.metadata.name}"))
            .unwrap();

        assert!(matches!(
            graph.validate(),
            Err(GraphError::UnknownReference { symbol, .. }) if symbol == "namespace_ghost"
        ));
    }

    #[test]
    fn test_validate_detects_cycle() {
        let a = ResourceId::new(Kind::HelmRelease, "a");
        let b = ResourceId::new(Kind::HelmRelease, "b");
        let c = ResourceId::new(Kind::HelmRelease, "c");

        let mut graph = ResourceGraph::new();
        graph.add(ns("root")).unwrap();
        graph.add(release("a").depends_on(&c)).unwrap();
        graph.add(release("b").depends_on(&a)).unwrap();
        graph.add(release("c").depends_on(&b)).unwrap();

        match graph.validate() {
            Err(GraphError::Cycle(path)) => {
                assert_eq!(path.first(), path.last());
                assert_eq!(path.len(), 4);
                for id in [&a, &b, &c] {
                    assert!(path.contains(id));
                }
            }
            other => panic!("expected Cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let a = ResourceId::new(Kind::HelmRelease, "a");
        let mut graph = ResourceGraph::new();
        graph.add(release("a").depends_on(&a)).unwrap();

        match graph.validate() {
            Err(GraphError::Cycle(path)) => assert_eq!(path, vec![a.clone(), a]),
            other => panic!("expected Cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_cycle_through_reference() {
        let b = ResourceId::new(Kind::HelmRelease, "b");
        let mut graph = ResourceGraph::new();
        graph
            .add(release("a").param("x", "${helm_release_b.status}"))
            .unwrap();
        let a = ResourceId::new(Kind::HelmRelease, "a");
        graph.add(release("b").depends_on(&a)).unwrap();

        assert!(matches!(graph.validate(), Err(GraphError::Cycle(_))));
        assert_eq!(graph.predecessors(&a), vec![&b]);
    }

    #[test]
    fn test_waves_respect_edges_and_declaration_order() {
        let mut graph = ResourceGraph::new();
        let logging = graph.add(ns("logging")).unwrap();
        let es = graph.add(release("elasticsearch").depends_on(&logging)).unwrap();
        graph.add(release("kibana").depends_on(&es)).unwrap();
        graph.add(release("fluent-bit").depends_on(&es)).unwrap();
        graph.add(ns("monitoring")).unwrap();

        let waves = graph.waves().unwrap();
        assert_eq!(waves.len(), 3);
        assert_eq!(names(&waves[0]), vec!["logging", "monitoring"]);
        assert_eq!(names(&waves[1]), vec!["elasticsearch"]);
        assert_eq!(names(&waves[2]), vec!["kibana", "fluent-bit"]);
    }

    #[test]
    fn test_empty_graph_is_valid() {
        let graph = ResourceGraph::new();
        assert!(graph.validate().is_ok());
        assert!(graph.waves().unwrap().is_empty());
    }

    #[test]
    fn test_filter_by_target() {
        let mut graph = ResourceGraph::new();
        graph.add(ns("kong")).unwrap();
        graph.add(release("kong")).unwrap();
        graph.add(release("kibana")).unwrap();

        assert_eq!(graph.filter_by_target(None).len(), 3);
        assert_eq!(graph.filter_by_target(Some("helm-release")).len(), 2);
        assert_eq!(graph.filter_by_target(Some("helm-release.kong")).len(), 1);
        assert_eq!(graph.filter_by_target(Some("kong")).len(), 2);
        assert!(graph.filter_by_target(Some("argocd")).is_empty());
    }

    #[test]
    fn test_from_declarations_rejects_duplicates() {
        let result = ResourceGraph::from_declarations([ns("a"), ns("a")]);
        assert!(result.is_err());
    }
}

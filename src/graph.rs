//! The ontology DAG contract and a minimal in-memory implementation
use std::collections::{HashMap, HashSet};

use smallvec::SmallVec;

use crate::{EnrichmentError, Namespace, Result, TermId};

/// Access to the term hierarchy
///
/// The enrichment engine never builds or parses the DAG itself, it only
/// queries parent/child relations and walks towards the root. Every
/// implementation must guarantee that the graph is acyclic and that all
/// terms are reachable from the single root term.
pub trait OntologyGraph {
    /// The root term of the DAG
    fn root(&self) -> TermId;

    /// Returns `true` if the term is the root
    fn is_root(&self, term: TermId) -> bool {
        term == self.root()
    }

    /// The direct parents of a term, empty for the root or unknown terms
    fn parents_of(&self, term: TermId) -> &[TermId];

    /// The direct children of a term
    fn children_of(&self, term: TermId) -> &[TermId];

    /// The namespace of the term, `None` for unknown terms
    fn namespace_of(&self, term: TermId) -> Option<Namespace>;

    /// Returns `true` if the term is part of the graph
    fn contains(&self, term: TermId) -> bool;

    /// Returns `true` if the term takes part in the current analysis
    ///
    /// Implementations restricting the analysis to a sub-ontology or a
    /// term subset override this hook. Annotations of non-relevant terms
    /// are skipped during annotation propagation.
    fn is_relevant(&self, term: TermId) -> bool {
        self.contains(term)
    }

    /// Visits every start term and every one of its ancestors exactly once
    ///
    /// The visit order between independent branches is unspecified.
    /// Returning `false` from the callback stops the walk.
    fn walk_to_root(&self, start: &[TermId], visit: &mut dyn FnMut(TermId) -> bool) {
        let mut seen: HashSet<TermId> = HashSet::new();
        let mut stack: Vec<TermId> = start.to_vec();
        while let Some(term) = stack.pop() {
            if !seen.insert(term) {
                continue;
            }
            if !visit(term) {
                return;
            }
            stack.extend_from_slice(self.parents_of(term));
        }
    }

    /// Returns `true` if `descendant` is reachable from `ancestor`
    /// by following child edges. A term is reachable from itself.
    fn exists_path(&self, ancestor: TermId, descendant: TermId) -> bool {
        let mut found = false;
        self.walk_to_root(&[descendant], &mut |term| {
            if term == ancestor {
                found = true;
                return false;
            }
            true
        });
        found
    }

    /// The terms of the subgraph induced by the given terms, i.e. the
    /// terms themselves plus all of their ancestors
    fn induced_subgraph(&self, terms: &[TermId]) -> HashSet<TermId> {
        let mut induced = HashSet::new();
        self.walk_to_root(terms, &mut |term| {
            induced.insert(term);
            true
        });
        induced
    }
}

#[derive(Debug, Clone)]
struct TermNode {
    id: TermId,
    name: String,
    namespace: Namespace,
    parents: SmallVec<[TermId; 4]>,
    children: Vec<TermId>,
}

impl TermNode {
    fn new(id: TermId, name: &str, namespace: Namespace) -> Self {
        Self {
            id,
            name: name.to_string(),
            namespace,
            parents: SmallVec::new(),
            children: Vec::new(),
        }
    }
}

/// A minimal in-memory [`OntologyGraph`]
///
/// Terms are stored in an arena, the identifier lookup goes through a
/// hash index. The container supports exactly what the enrichment engine
/// needs: inserting terms and linking them to their parents. Parsing
/// ontology files and handling obsolete terms is the responsibility of
/// upstream crates.
///
/// # Examples
///
/// ```
/// use goenrich::{Namespace, Ontology, OntologyGraph, TermId};
///
/// let root = TermId::go(1);
/// let mut ontology = Ontology::new(root, "all", Namespace::BiologicalProcess);
/// let child = TermId::go(2);
/// ontology
///     .insert_term(child, "child", Namespace::BiologicalProcess)
///     .unwrap();
/// ontology.add_parent(child, root).unwrap();
///
/// assert!(ontology.is_root(root));
/// assert_eq!(ontology.parents_of(child), &[root]);
/// ```
#[derive(Debug, Clone)]
pub struct Ontology {
    arena: Vec<TermNode>,
    index: HashMap<TermId, usize>,
    root: TermId,
}

impl Ontology {
    /// Constructs a new ontology holding only the root term
    pub fn new(root: TermId, name: &str, namespace: Namespace) -> Self {
        Self {
            arena: vec![TermNode::new(root, name, namespace)],
            index: HashMap::from([(root, 0)]),
            root,
        }
    }

    /// Adds a new term to the ontology
    ///
    /// # Errors
    ///
    /// Returns [`EnrichmentError::DuplicateTerm`] if the identifier is
    /// already present.
    pub fn insert_term(&mut self, id: TermId, name: &str, namespace: Namespace) -> Result<()> {
        if self.index.contains_key(&id) {
            return Err(EnrichmentError::DuplicateTerm(id));
        }
        self.index.insert(id, self.arena.len());
        self.arena.push(TermNode::new(id, name, namespace));
        Ok(())
    }

    /// Links `child` to `parent`, recording both edge directions
    ///
    /// # Errors
    ///
    /// Returns [`EnrichmentError::DoesNotExist`] if either term is unknown.
    pub fn add_parent(&mut self, child: TermId, parent: TermId) -> Result<()> {
        let child_idx = self.idx(child)?;
        let parent_idx = self.idx(parent)?;
        if !self.arena[child_idx].parents.contains(&parent) {
            self.arena[child_idx].parents.push(parent);
            self.arena[parent_idx].children.push(child);
        }
        Ok(())
    }

    /// The number of terms in the ontology
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Returns `true` if only the root is present
    pub fn is_empty(&self) -> bool {
        self.arena.len() == 1
    }

    /// The name of a term
    pub fn name_of(&self, term: TermId) -> Option<&str> {
        self.node(term).map(|node| node.name.as_str())
    }

    /// Iterates over all term identifiers, in insertion order
    pub fn terms(&self) -> impl Iterator<Item = TermId> + '_ {
        self.arena.iter().map(|node| node.id)
    }

    fn idx(&self, term: TermId) -> Result<usize> {
        self.index
            .get(&term)
            .copied()
            .ok_or(EnrichmentError::DoesNotExist(term))
    }

    fn node(&self, term: TermId) -> Option<&TermNode> {
        self.index.get(&term).map(|idx| &self.arena[*idx])
    }
}

impl OntologyGraph for Ontology {
    fn root(&self) -> TermId {
        self.root
    }

    fn parents_of(&self, term: TermId) -> &[TermId] {
        self.node(term).map_or(&[], |node| node.parents.as_slice())
    }

    fn children_of(&self, term: TermId) -> &[TermId] {
        self.node(term).map_or(&[], |node| node.children.as_slice())
    }

    fn namespace_of(&self, term: TermId) -> Option<Namespace> {
        self.node(term).map(|node| node.namespace)
    }

    fn contains(&self, term: TermId) -> bool {
        self.index.contains_key(&term)
    }
}

//! Genes, gene sets and gene-term associations
use core::fmt::Debug;
use std::collections::HashMap;
use std::fmt::Display;
use std::ops::{BitAnd, BitOr, Sub};

use crate::{Result, TermId};

/// A unique identifier for a gene or gene product
///
/// The value can represent any numerical unique value, e.g. the NCBI Gene
/// ID. Symbol interning is the responsibility of the upstream annotation
/// parser, the enrichment engine only handles pre-interned identifiers.
#[derive(Clone, Copy, Default, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub struct GeneId {
    inner: u32,
}

impl GeneId {
    /// Convert `self` to `u32`
    pub fn as_u32(&self) -> u32 {
        self.inner
    }
}

impl From<u32> for GeneId {
    fn from(inner: u32) -> Self {
        GeneId { inner }
    }
}

impl TryFrom<&str> for GeneId {
    type Error = crate::EnrichmentError;
    fn try_from(value: &str) -> Result<Self> {
        Ok(GeneId {
            inner: value.parse::<u32>()?,
        })
    }
}

impl Display for GeneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Gene:{}", self.inner)
    }
}

/// A set of [`GeneId`]s
///
/// Each gene can occur only once. The set is backed by a sorted vector,
/// which keeps iteration deterministic and makes unions and intersections
/// cheap merge operations.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GeneSet {
    ids: Vec<GeneId>,
}

impl GeneSet {
    /// An empty set, usable in `static` context
    pub(crate) const EMPTY: GeneSet = GeneSet { ids: Vec::new() };

    /// Constructs a new, empty [`GeneSet`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs a new, empty [`GeneSet`] with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
        }
    }

    /// Returns `true` if the set contains no genes
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns the number of genes in the set
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Adds a new gene to the set
    ///
    /// Returns whether the gene was newly inserted.
    pub fn insert(&mut self, id: GeneId) -> bool {
        match self.ids.binary_search(&id) {
            Ok(_) => false,
            Err(idx) => {
                self.ids.insert(idx, id);
                true
            }
        }
    }

    /// Adds a new gene to the end of the vector without checking
    /// uniqueness or sort order
    fn insert_unchecked(&mut self, id: GeneId) {
        self.ids.push(id);
    }

    /// Returns `true` if the set contains the gene
    pub fn contains(&self, id: &GeneId) -> bool {
        self.ids.binary_search(id).is_ok()
    }

    /// Returns an iterator of the genes in the set
    pub fn iter(&self) -> GeneIds<'_> {
        GeneIds {
            inner: self.ids.iter(),
        }
    }

    /// Counts the genes of the set that are not members of `other`
    pub fn count_without(&self, other: &GeneSet) -> usize {
        self.iter().filter(|id| !other.contains(id)).count()
    }
}

impl FromIterator<GeneId> for GeneSet {
    fn from_iter<I: IntoIterator<Item = GeneId>>(iter: I) -> Self {
        let mut set = GeneSet::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

impl<'a> IntoIterator for &'a GeneSet {
    type Item = GeneId;
    type IntoIter = GeneIds<'a>;
    fn into_iter(self) -> GeneIds<'a> {
        self.iter()
    }
}

/// An iterator over [`GeneId`]s
pub struct GeneIds<'a> {
    inner: std::slice::Iter<'a, GeneId>,
}

impl Iterator for GeneIds<'_> {
    type Item = GeneId;
    fn next(&mut self) -> Option<GeneId> {
        self.inner.next().copied()
    }
}

impl BitOr for &GeneSet {
    type Output = GeneSet;

    fn bitor(self, rhs: &GeneSet) -> GeneSet {
        let mut set = GeneSet::with_capacity(self.len() + rhs.len());
        let (large, small) = if self.len() > rhs.len() {
            (self, rhs)
        } else {
            (rhs, self)
        };

        for id in &large.ids {
            set.insert_unchecked(*id);
        }
        for id in &small.ids {
            set.insert(*id);
        }
        set
    }
}

impl BitAnd for &GeneSet {
    type Output = GeneSet;

    fn bitand(self, rhs: &GeneSet) -> GeneSet {
        let mut set = GeneSet::with_capacity(self.len().min(rhs.len()));
        let (large, small) = if self.len() > rhs.len() {
            (self, rhs)
        } else {
            (rhs, self)
        };

        for id in &small.ids {
            if large.contains(id) {
                set.insert_unchecked(*id);
            }
        }
        set
    }
}

impl Sub for &GeneSet {
    type Output = GeneSet;

    fn sub(self, rhs: &GeneSet) -> GeneSet {
        let mut set = GeneSet::with_capacity(self.len());
        for id in &self.ids {
            if !rhs.contains(id) {
                set.insert_unchecked(*id);
            }
        }
        set
    }
}

/// Access to the direct gene-term associations
///
/// The container is produced by an upstream annotation parser. Qualifiers
/// like `NOT` are expected to be resolved before the data reaches the
/// enrichment engine. A gene can carry multiple association records for
/// the same term, e.g. one per evidence code.
pub trait AssociationContainer {
    /// Returns all terms the gene is directly annotated to
    ///
    /// Returns an empty slice for unknown genes.
    fn terms_of(&self, gene: GeneId) -> &[TermId];
}

/// A simple in-memory [`AssociationContainer`]
#[derive(Debug, Default, Clone)]
pub struct Associations {
    map: HashMap<GeneId, Vec<TermId>>,
}

impl Associations {
    /// Constructs a new, empty association container
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a direct annotation of `gene` to `term`
    ///
    /// Every call adds one association record, even if the same pair was
    /// recorded before.
    pub fn add(&mut self, gene: GeneId, term: TermId) {
        self.map.entry(gene).or_default().push(term);
    }

    /// Returns the number of genes with at least one association
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns whether the container is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl AssociationContainer for Associations {
    fn terms_of(&self, gene: GeneId) -> &[TermId] {
        self.map.get(&gene).map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn set(ids: &[u32]) -> GeneSet {
        ids.iter().map(|id| GeneId::from(*id)).collect()
    }

    #[test]
    fn insert_is_sorted_and_unique() {
        let mut genes = GeneSet::new();
        assert!(genes.insert(3u32.into()));
        assert!(genes.insert(1u32.into()));
        assert!(!genes.insert(3u32.into()));

        let ids: Vec<GeneId> = genes.iter().collect();
        assert_eq!(ids, vec![GeneId::from(1u32), GeneId::from(3u32)]);
    }

    #[test]
    fn union_and_intersection() {
        let a = set(&[1, 2, 3]);
        let b = set(&[2, 4]);

        assert_eq!(&a | &b, set(&[1, 2, 3, 4]));
        assert_eq!(&a & &b, set(&[2]));
        assert_eq!(&a - &b, set(&[1, 3]));
    }

    #[test]
    fn count_without() {
        let a = set(&[1, 2, 3, 4]);
        let b = set(&[2, 4, 7]);
        assert_eq!(a.count_without(&b), 2);
        assert_eq!(a.count_without(&GeneSet::new()), 4);
    }

    #[test]
    fn duplicate_association_records() {
        let mut assocs = Associations::new();
        assocs.add(1u32.into(), TermId::go(10));
        assocs.add(1u32.into(), TermId::go(10));

        // one record per evidence code is kept
        assert_eq!(assocs.terms_of(1u32.into()).len(), 2);
        assert!(assocs.terms_of(99u32.into()).is_empty());
    }
}

//! Study and population gene sets
use rand::Rng;

use crate::annotations::GeneIds;
use crate::sampling::KSubsetSampler;
use crate::{EnrichmentError, GeneId, GeneSet, Result};

/// An ordered, duplicate-free collection of genes
///
/// A `StudySet` holds the genes of interest of an analysis, e.g. the
/// differentially expressed genes of an experiment. The background
/// population is represented by the same type, see [`PopulationSet`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StudySet {
    genes: GeneSet,
}

/// The background population an analysis compares a [`StudySet`] against
///
/// Every gene of a study set is expected to be part of the population.
pub type PopulationSet = StudySet;

impl StudySet {
    /// Constructs a new, empty study set
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of genes in the set
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// Returns `true` if the set contains no genes
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Returns `true` if the set contains the gene
    pub fn contains(&self, gene: &GeneId) -> bool {
        self.genes.contains(gene)
    }

    /// Adds a gene to the set, returns whether it was newly inserted
    pub fn insert(&mut self, gene: GeneId) -> bool {
        self.genes.insert(gene)
    }

    /// Returns an iterator over all genes of the set
    pub fn iter(&self) -> GeneIds<'_> {
        self.genes.iter()
    }

    /// Returns the underlying [`GeneSet`]
    pub fn genes(&self) -> &GeneSet {
        &self.genes
    }

    /// Draws a uniform random subset of `size` genes without replacement
    ///
    /// # Errors
    ///
    /// Returns [`EnrichmentError::SampleTooLarge`] if `size` exceeds the
    /// number of genes in the set.
    pub fn random_subset<R: Rng>(&self, size: usize, rng: &mut R) -> Result<StudySet> {
        if size > self.len() {
            return Err(EnrichmentError::SampleTooLarge {
                requested: size,
                available: self.len(),
            });
        }
        let mut sampler = KSubsetSampler::new(self.iter());
        Ok(sampler.sample_one_ordered(size, rng).into_iter().collect())
    }
}

impl From<GeneSet> for StudySet {
    fn from(genes: GeneSet) -> Self {
        Self { genes }
    }
}

impl FromIterator<GeneId> for StudySet {
    fn from_iter<I: IntoIterator<Item = GeneId>>(iter: I) -> Self {
        Self {
            genes: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a StudySet {
    type Item = GeneId;
    type IntoIter = GeneIds<'a>;
    fn into_iter(self) -> GeneIds<'a> {
        self.iter()
    }
}

#[cfg(test)]
mod test {
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    use super::*;

    fn study(ids: std::ops::Range<u32>) -> StudySet {
        ids.map(GeneId::from).collect()
    }

    #[test]
    fn subset_of_full_size_is_a_permutation() {
        let set = study(0..25);
        let mut rng = Xoshiro256StarStar::seed_from_u64(7);

        let subset = set.random_subset(25, &mut rng).unwrap();
        assert_eq!(subset.len(), 25);
        assert_eq!(subset, set);
    }

    #[test]
    fn subset_is_duplicate_free() {
        let set = study(0..50);
        let mut rng = Xoshiro256StarStar::seed_from_u64(11);

        let subset = set.random_subset(20, &mut rng).unwrap();
        assert_eq!(subset.len(), 20);
        for gene in &subset {
            assert!(set.contains(&gene));
        }
    }

    #[test]
    fn oversized_subset_is_a_config_error() {
        let set = study(0..5);
        let mut rng = Xoshiro256StarStar::seed_from_u64(1);

        assert_eq!(
            set.random_subset(6, &mut rng),
            Err(EnrichmentError::SampleTooLarge {
                requested: 6,
                available: 5
            })
        );
    }
}

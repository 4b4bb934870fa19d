//! Gene set enrichment analysis for ontology terms
//!
//! This crate scores the terms of an ontology DAG for over-representation
//! of annotated genes in a study set, compared to a background population.
//! Every term receives a raw p-value from one of several interchangeable
//! test strategies and an adjusted p-value from a multiple testing
//! correction procedure.
//!
//! The building blocks are:
//!
//! - [`enumeration::AnnotationIndex`]: propagates direct gene annotations
//!   transitively towards the DAG root
//! - [`calculation`]: the p-value strategies ([`calculation::TermForTerm`],
//!   [`calculation::ParentChild`], [`calculation::TopologyElim`],
//!   [`calculation::Generative`]) and the [`calculation::run_seeded`]
//!   entry point
//! - [`mtc`]: multiple testing corrections, including resampling based
//!   Westfall-Young variants with a cross-run sample cache
//! - [`sampling`]: random study set generation for the resampling engine
//!   and for benchmark data sets
//!
//! The ontology DAG itself and the gene-term association data are consumed
//! through the [`graph::OntologyGraph`] and
//! [`annotations::AssociationContainer`] traits. A minimal in-memory
//! [`Ontology`] is included so the crate is usable without an external
//! graph implementation.
//!
//! # Examples
//!
//! ```
//! use goenrich::annotations::Associations;
//! use goenrich::calculation::{run_seeded, TermForTerm};
//! use goenrich::mtc::{NoCorrection, RunControl};
//! use goenrich::{GeneId, Namespace, Ontology, StudySet, TermId};
//!
//! let root = TermId::go(1);
//! let mut ontology = Ontology::new(root, "all", Namespace::BiologicalProcess);
//! let leaf = TermId::go(2);
//! ontology
//!     .insert_term(leaf, "leaf", Namespace::BiologicalProcess)
//!     .unwrap();
//! ontology.add_parent(leaf, root).unwrap();
//!
//! let mut associations = Associations::new();
//! for gene in 0u32..3 {
//!     associations.add(gene.into(), leaf);
//! }
//!
//! let population: StudySet = (0u32..10).map(GeneId::from).collect();
//! let study: StudySet = [0u32, 1, 5, 6].into_iter().map(GeneId::from).collect();
//!
//! let result = run_seeded(
//!     &ontology,
//!     &associations,
//!     &population,
//!     &study,
//!     &TermForTerm,
//!     &NoCorrection,
//!     &RunControl::default(),
//!     42,
//! )
//! .unwrap();
//!
//! // both the leaf and the root carry study annotations
//! assert_eq!(result.len(), 2);
//! ```
use std::num::ParseIntError;

use thiserror::Error;

pub mod annotations;
pub mod calculation;
pub mod enumeration;
pub mod graph;
pub mod mtc;
pub mod sampling;
pub mod set;
pub mod stats;
pub mod term;

pub use annotations::{GeneId, GeneSet};
pub use calculation::EnrichedResult;
pub use graph::{Ontology, OntologyGraph};
pub use mtc::{CancelFlag, RunControl};
pub use set::{PopulationSet, StudySet};
pub use stats::PValue;
pub use term::{Namespace, TermId};

/// Default number of random trials for resampling based corrections
pub const DEFAULT_RESAMPLING_STEPS: usize = 500;

/// Default study set size tolerance (in percent) for the approximate
/// Westfall-Young correction
pub const DEFAULT_SIZE_TOLERANCE: f64 = 10.0;

/// Error variants of the enrichment engine
///
/// Configuration errors are returned before any computation starts.
/// Degenerate per-term conditions are never errors, they are encoded
/// in the [`PValue::ignore_at_mtc`] flag instead.
#[derive(Error, Debug, PartialEq)]
pub enum EnrichmentError {
    #[error("not implemented")]
    NotImplemented,
    #[error("term {0} does not exist")]
    DoesNotExist(TermId),
    #[error("term {0} already exists")]
    DuplicateTerm(TermId),
    #[error("unable to parse integer")]
    ParseIntError,
    #[error("invalid number of resampling steps: {0}")]
    InvalidResamplingSteps(usize),
    #[error("invalid size tolerance: {0}")]
    InvalidSizeTolerance(f64),
    #[error("percentage out of range: {0}")]
    InvalidPercentage(u8),
    #[error("requested {requested} genes but only {available} are available")]
    SampleTooLarge { requested: usize, available: usize },
    #[error("calculation cancelled")]
    Cancelled,
}

impl From<ParseIntError> for EnrichmentError {
    fn from(_: ParseIntError) -> Self {
        EnrichmentError::ParseIntError
    }
}

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, EnrichmentError>;

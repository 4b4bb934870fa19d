//! Identifiers for ontology terms
use core::fmt::Debug;
use std::fmt::Display;

use crate::{EnrichmentError, Result};

/// The interned namespace prefix of a [`TermId`]
///
/// Term identifiers from the Gene Ontology use the `GO` prefix, the Human
/// Phenotype Ontology uses `HP`. Identifiers from other ontologies can be
/// represented through a pre-interned prefix index, the actual prefix
/// string is maintained by the upstream parser.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Prefix {
    #[default]
    Go,
    Hp,
    Other(u16),
}

impl Display for Prefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Prefix::Go => write!(f, "GO"),
            Prefix::Hp => write!(f, "HP"),
            Prefix::Other(idx) => write!(f, "X{idx}"),
        }
    }
}

impl TryFrom<&str> for Prefix {
    type Error = EnrichmentError;
    fn try_from(s: &str) -> Result<Self> {
        match s {
            "GO" => Ok(Prefix::Go),
            "HP" => Ok(Prefix::Hp),
            _ => Err(EnrichmentError::ParseIntError),
        }
    }
}

/// A unique identifier of an ontology term
///
/// Identity is defined by the numerical value within a prefix, two terms
/// from different ontologies never compare equal. `TermId` is `Copy` and
/// cheap to pass around, the human readable term name lives in the
/// ontology graph.
#[derive(Copy, Clone, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TermId {
    prefix: Prefix,
    num: u32,
}

impl TermId {
    /// Constructs a new `TermId` from a prefix and a numerical value
    pub fn new(prefix: Prefix, num: u32) -> Self {
        Self { prefix, num }
    }

    /// Constructs a Gene Ontology `TermId`
    pub fn go(num: u32) -> Self {
        Self {
            prefix: Prefix::Go,
            num,
        }
    }

    /// The numerical part of the identifier
    pub fn num(&self) -> u32 {
        self.num
    }

    /// The namespace prefix of the identifier
    pub fn prefix(&self) -> Prefix {
        self.prefix
    }
}

impl From<u32> for TermId {
    fn from(num: u32) -> Self {
        TermId::go(num)
    }
}

impl TryFrom<&str> for TermId {
    type Error = EnrichmentError;

    /// Parses identifiers like `GO:0008150`
    fn try_from(s: &str) -> Result<Self> {
        let (prefix, num) = s.split_once(':').ok_or(EnrichmentError::ParseIntError)?;
        Ok(TermId {
            prefix: Prefix::try_from(prefix)?,
            num: num.parse::<u32>()?,
        })
    }
}

impl Debug for TermId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TermId({self})")
    }
}

impl Display for TermId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{:07}", self.prefix, self.num)
    }
}

/// The sub-ontology a term belongs to
///
/// Every term belongs to exactly one namespace. Annotation counters keep
/// one bucket per namespace so the three sub-ontologies can be analyzed
/// independently.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Namespace {
    BiologicalProcess,
    MolecularFunction,
    CellularComponent,
}

impl Namespace {
    /// All namespaces, in bucket order
    pub const ALL: [Namespace; 3] = [
        Namespace::BiologicalProcess,
        Namespace::MolecularFunction,
        Namespace::CellularComponent,
    ];

    /// The bucket index of the namespace
    pub(crate) fn index(self) -> usize {
        match self {
            Namespace::BiologicalProcess => 0,
            Namespace::MolecularFunction => 1,
            Namespace::CellularComponent => 2,
        }
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Namespace::BiologicalProcess => write!(f, "biological_process"),
            Namespace::MolecularFunction => write!(f, "molecular_function"),
            Namespace::CellularComponent => write!(f, "cellular_component"),
        }
    }
}

use std::fmt::{self, Display};

use crate::tree::{NodeIdx, Tree};

/// Decides whether a tree leaf id stands for a taxon label from the cluster table.
pub trait TaxonMatcher: Sync {
    fn matches(&self, leaf_id: &str, taxon: &str) -> bool;

    /// First leaf, in the tree's leaf order, that matches the taxon.
    fn find_leaf(&self, tree: &Tree, taxon: &str) -> Option<NodeIdx> {
        tree.leaves()
            .find(|leaf| self.matches(&leaf.id, taxon))
            .map(|leaf| leaf.idx)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatch;

impl TaxonMatcher for ExactMatch {
    fn matches(&self, leaf_id: &str, taxon: &str) -> bool {
        leaf_id == taxon
    }
}

/// Leaf ids may carry extra tags added by relabelling steps, e.g. `A12|3`.
/// NOTE: a label that is a substring of another taxon's id can resolve to the wrong leaf.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMatch;

impl TaxonMatcher for SubstringMatch {
    fn matches(&self, leaf_id: &str, taxon: &str) -> bool {
        leaf_id.contains(taxon)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixMatch;

impl TaxonMatcher for PrefixMatch {
    fn matches(&self, leaf_id: &str, taxon: &str) -> bool {
        leaf_id.starts_with(taxon)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchingStrategy {
    Exact,
    #[default]
    Substring,
    Prefix,
}

impl TaxonMatcher for MatchingStrategy {
    fn matches(&self, leaf_id: &str, taxon: &str) -> bool {
        match self {
            MatchingStrategy::Exact => ExactMatch.matches(leaf_id, taxon),
            MatchingStrategy::Substring => SubstringMatch.matches(leaf_id, taxon),
            MatchingStrategy::Prefix => PrefixMatch.matches(leaf_id, taxon),
        }
    }
}

impl Display for MatchingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchingStrategy::Exact => write!(f, "exact"),
            MatchingStrategy::Substring => write!(f, "substring"),
            MatchingStrategy::Prefix => write!(f, "prefix"),
        }
    }
}

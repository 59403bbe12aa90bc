use anyhow::{bail, Result};

use crate::ranks::NUM_RANKS;
use crate::taxonomy::{NameRef, TaxonomyIndex};

/// Column value emitted for a canonical rank absent from a lineage. Legacy
/// output convention.
pub const PLACEHOLDER: &str = "n";

/// One name slot per canonical rank, indexed by rank level 0 (root-most)
/// through `NUM_RANKS - 1` (deepest). Transient per-query record.
#[derive(Debug, Clone, PartialEq)]
pub struct Lineage {
    slots: [Option<NameRef>; NUM_RANKS],
}

impl Lineage {
    pub fn slots(&self) -> &[Option<NameRef>] {
        &self.slots
    }

    /// Renders slot `level` against the index the lineage was resolved
    /// from: the occupying name, or the placeholder.
    pub fn column<'a>(&self, index: &'a TaxonomyIndex, level: usize) -> &'a [u8] {
        match self.slots[level] {
            Some(name) => index.name_bytes(name),
            None => PLACEHOLDER.as_bytes(),
        }
    }
}

/// Walks the ancestor chain of `taxid` up to its forest root and lays the
/// visited names out by rank level. Nodes with no canonical rank are
/// transparent: they contribute no slot and do not disturb column
/// alignment. Returns `Ok(None)` for an ID absent from the index.
pub fn resolve_lineage(index: &TaxonomyIndex, taxid: u64) -> Result<Option<Lineage>> {
    let mut node = match index.get(taxid) {
        Some(node) => node,
        None => return Ok(None),
    };
    let mut slots = [None; NUM_RANKS];
    let mut hops = 0usize;
    loop {
        if let Some(level) = node.rank_level {
            slots[level] = Some(node.name);
        }
        let parent_id = match node.parent {
            Some(parent_id) => parent_id,
            None => break,
        };
        // More hops than indexed nodes means the hierarchy contains a
        // cycle; the legacy tool would walk it forever.
        hops += 1;
        if hops > index.len() {
            bail!("cycle detected while walking ancestors of taxon {}", taxid);
        }
        node = match index.get(parent_id) {
            Some(parent) => parent,
            None => bail!("dangling parent link {} for taxon {}", parent_id, taxid),
        };
    }
    Ok(Some(Lineage { slots }))
}

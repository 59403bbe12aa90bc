/// Canonical rank labels, root-most first. A node's rank level is its index
/// in this table.
///
/// `"root"` is not a rank string that occurs in NCBI dumps; level 0 is
/// reserved for the self-parented root node, which is forced there
/// regardless of its declared rank.
pub const RANK_LABELS: [&str; 9] = [
    "root",
    "superkingdom",
    "kingdom",
    "phylum",
    "class",
    "order",
    "family",
    "genus",
    "species",
];

/// Number of canonical ranks; every resolved lineage has exactly this many
/// columns.
pub const NUM_RANKS: usize = RANK_LABELS.len();

/// First exact match of `rank` in the table, in table order, or `None` when
/// the rank has no canonical equivalent.
pub fn rank_level(rank: &[u8]) -> Option<usize> {
    RANK_LABELS.iter().position(|label| label.as_bytes() == rank)
}

//! Bulk taxonomic lineage annotation from NCBI-style taxonomy dump files.
//!
//! The two reference files (names map, then hierarchy) are loaded once into
//! a [`taxonomy::TaxonomyIndex`]; query lines are then streamed through a
//! [`query::QueryEngine`], each resolvable line gaining one column per
//! canonical rank.

pub mod dump_parser;
pub mod gz_stream;
pub mod lineage;
pub mod query;
pub mod ranks;
pub mod taxonomy;

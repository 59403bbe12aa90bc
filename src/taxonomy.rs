use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::str;

use anyhow::{bail, Context, Result};

use crate::dump_parser::DumpLineParser;
use crate::gz_stream::open_reference;
use crate::ranks;

/// Field counts of the two NCBI dump formats: names.dmp records carry
/// `[id, name, unique name, name class]`, nodes.dmp records carry
/// `[id, parent id, rank, ...10 more]`.
pub const NAME_RECORD_FIELDS: usize = 4;
pub const NODE_RECORD_FIELDS: usize = 13;

const SCIENTIFIC_NAME: &[u8] = b"scientific name";

/// Location of a name in the append-only name store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NameRef {
    offset: usize,
    len: usize,
}

/// Append-only byte store holding every scientific name contiguously.
/// Never mutated or shrunk once a name has been appended.
#[derive(Debug, Default)]
pub struct NameBuffer {
    data: Vec<u8>,
}

impl NameBuffer {
    fn append(&mut self, bytes: &[u8]) -> NameRef {
        let offset = self.data.len();
        self.data.extend_from_slice(bytes);
        NameRef {
            offset,
            len: bytes.len(),
        }
    }

    fn get(&self, name: NameRef) -> &[u8] {
        &self.data[name.offset..name.offset + name.len]
    }
}

#[derive(Debug)]
pub struct TaxonNode {
    pub id: u64,
    /// Reference into the index's name store.
    pub name: NameRef,
    /// ID-valued weak reference, resolved through the index at walk time;
    /// `None` marks a forest root.
    pub parent: Option<u64>,
    /// Index into the canonical rank table, or `None` when the declared
    /// rank has no canonical equivalent.
    pub rank_level: Option<usize>,
}

/// In-memory taxonomy built by the two ingestion passes. Immutable once
/// built; the resolver and query engine take it by shared reference.
#[derive(Debug, Default)]
pub struct TaxonomyIndex {
    nodes: HashMap<u64, TaxonNode>,
    names: NameBuffer,
}

impl TaxonomyIndex {
    /// Builds the index from the names and nodes reference files, which may
    /// be gzip-compressed.
    pub fn from_files<P: AsRef<Path>>(names_filename: P, nodes_filename: P) -> Result<Self> {
        let names = open_reference(names_filename.as_ref())?;
        let nodes = open_reference(nodes_filename.as_ref())?;
        Self::from_readers(names, nodes)
    }

    /// Builds the index from the two reference streams. The names stream is
    /// fully consumed before the first byte of the nodes stream is read:
    /// hierarchy records may only reference already-indexed IDs.
    pub fn from_readers<N: Read, H: Read>(names_reader: N, nodes_reader: H) -> Result<Self> {
        let mut index = TaxonomyIndex::default();
        index
            .ingest_names(names_reader)
            .context("while reading the names file")?;
        index
            .ingest_nodes(nodes_reader)
            .context("while reading the nodes file")?;
        Ok(index)
    }

    /// Name ingestion pass: every record tagged `scientific name` creates a
    /// node whose name bytes are copied into the name store. Records with
    /// any other name class are parsed and discarded.
    fn ingest_names<R: Read>(&mut self, reader: R) -> Result<()> {
        let mut parser = DumpLineParser::new(reader, NAME_RECORD_FIELDS);
        while let Some((ordinal, fields)) = parser.next_record()? {
            if fields[3] != SCIENTIFIC_NAME {
                continue;
            }
            let id = parse_taxid(&fields[0], ordinal)?;
            if fields[1].is_empty() {
                bail!("empty name for taxon {} (record {})", id, ordinal);
            }
            if self.nodes.contains_key(&id) {
                bail!("duplicate taxon ID {} (record {})", id, ordinal);
            }
            let name = self.names.append(&fields[1]);
            self.nodes.insert(
                id,
                TaxonNode {
                    id,
                    name,
                    parent: None,
                    rank_level: None,
                },
            );
        }
        log::info!("indexed {} scientific names", self.nodes.len());
        Ok(())
    }

    /// Hierarchy ingestion pass: assigns parent links and rank levels.
    /// Both endpoints of every record must already be indexed.
    fn ingest_nodes<R: Read>(&mut self, reader: R) -> Result<()> {
        let mut parser = DumpLineParser::new(reader, NODE_RECORD_FIELDS);
        while let Some((ordinal, fields)) = parser.next_record()? {
            let id = parse_taxid(&fields[0], ordinal)?;
            let parent_id = parse_taxid(&fields[1], ordinal)?;
            if !self.nodes.contains_key(&parent_id) {
                bail!(
                    "unknown taxon ID {} referenced (record {})",
                    parent_id,
                    ordinal
                );
            }
            let node = match self.nodes.get_mut(&id) {
                Some(node) => node,
                None => bail!("unknown taxon ID {} referenced (record {})", id, ordinal),
            };
            if id == parent_id {
                // Self-parented root convention: no parent link, level 0,
                // declared rank string ignored.
                node.rank_level = Some(0);
            } else {
                node.parent = Some(parent_id);
                node.rank_level = ranks::rank_level(&fields[2]);
            }
        }
        Ok(())
    }

    pub fn get(&self, taxid: u64) -> Option<&TaxonNode> {
        self.nodes.get(&taxid)
    }

    pub fn name_bytes(&self, name: NameRef) -> &[u8] {
        self.names.get(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn parse_taxid(digits: &[u8], ordinal: u64) -> Result<u64> {
    // The dump parser only lets ASCII digits through, so this can fail only
    // on an ID too large for u64.
    str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .with_context(|| format!("taxon ID out of range (record {})", ordinal))
}

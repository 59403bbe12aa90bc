use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use crate::lineage::resolve_lineage;
use crate::ranks::NUM_RANKS;
use crate::taxonomy::TaxonomyIndex;

/// Default 0-based index of the taxon ID column in query lines.
pub const DEFAULT_ID_FIELD: usize = 1;

/// Streams tab-delimited query lines against a built index, emitting each
/// resolvable line with the lineage columns appended. Lines that cannot be
/// resolved are skipped silently; bad query input never aborts the run.
pub struct QueryEngine<'a> {
    index: &'a TaxonomyIndex,
    id_field: usize,
}

impl<'a> QueryEngine<'a> {
    pub fn new(index: &'a TaxonomyIndex, id_field: usize) -> Self {
        QueryEngine { index, id_field }
    }

    /// Reads query lines from `input` until end of stream, writing one
    /// augmented line per resolvable query. Returns the number of lines
    /// emitted. Lines are handled as raw bytes and their length is
    /// unbounded, unlike the legacy tool's 2048-byte cap.
    pub fn run<R: BufRead, W: Write>(&self, mut input: R, mut output: W) -> Result<u64> {
        let mut line = Vec::new();
        let mut emitted = 0u64;
        loop {
            line.clear();
            let bytes_read = input
                .read_until(b'\n', &mut line)
                .context("failed to read query line")?;
            if bytes_read == 0 {
                break;
            }
            if self.annotate_line(&line, &mut output)? {
                emitted += 1;
            }
        }
        Ok(emitted)
    }

    fn annotate_line<W: Write>(&self, line: &[u8], output: &mut W) -> Result<bool> {
        let line = line.strip_suffix(b"\n").unwrap_or(line);
        let line = line.strip_suffix(b"\r").unwrap_or(line);

        let taxid = match self.extract_taxid(line) {
            Some(taxid) => taxid,
            None => {
                log::debug!("query line has no usable taxon ID, skipping");
                return Ok(false);
            }
        };
        let lineage = match resolve_lineage(self.index, taxid)? {
            Some(lineage) => lineage,
            None => {
                log::debug!("taxon {} not in index, skipping", taxid);
                return Ok(false);
            }
        };

        output.write_all(line)?;
        for level in 0..NUM_RANKS {
            output.write_all(b"\t")?;
            output.write_all(lineage.column(self.index, level))?;
        }
        output.write_all(b"\n")?;
        Ok(true)
    }

    /// The ID field must be present, numeric, and positive; anything else
    /// disqualifies the line.
    fn extract_taxid(&self, line: &[u8]) -> Option<u64> {
        let field = line.split(|&byte| byte == b'\t').nth(self.id_field)?;
        match std::str::from_utf8(field).ok()?.parse::<u64>() {
            Ok(taxid) if taxid > 0 => Some(taxid),
            _ => None,
        }
    }
}

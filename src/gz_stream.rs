use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;

/// Opens a reference file for streaming reads, transparently decompressing
/// it when the path carries a `.gz` extension (NCBI distributes the taxdump
/// files compressed).
pub fn open_reference(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open input file: {}", path.display()))?;
    if path.extension().map_or(false, |ext| ext == "gz") {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

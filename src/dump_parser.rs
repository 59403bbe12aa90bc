use std::io::Read;

use anyhow::{bail, Context, Result};

/// Refill chunk size for reference file reads. Chunk boundaries may fall
/// anywhere inside a token; the automaton state carries across refills.
pub const READ_CHUNK_SIZE: usize = 2048;

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    /// Start of a line; expecting a digit (or a bare line break to skip).
    LineStart,
    /// Accumulating the leading numeric ID.
    ReadingId,
    /// Expecting exactly `|`.
    ExpectPipe,
    /// After a `|`: a tab opens the next field, a line break ends the record.
    FieldBoundary,
    /// Accumulating arbitrary field bytes until the next tab.
    ReadingField,
}

/// Incremental tokenizer for the pipe/tab dump grammar used by the NCBI
/// taxonomy reference files:
///
/// ```text
/// <digits> TAB '|' TAB <field> ( TAB '|' TAB <field> )* TAB '|' <line break>
/// ```
///
/// The parser consumes its reader in fixed-size chunks rather than whole
/// lines, so reference files of any size are handled in constant memory.
/// Each valid record yields a field vector of exactly `expected_fields`
/// entries, `fields[0]` being the raw digit string of the ID; any deviation
/// from the grammar is a fatal error carrying the 1-based record ordinal.
pub struct DumpLineParser<R: Read> {
    reader: R,
    chunk: Vec<u8>,
    chunk_pos: usize,
    chunk_len: usize,
    state: State,
    fields: Vec<Vec<u8>>,
    current_field: usize,
    records_done: u64,
    expected_fields: usize,
}

impl<R: Read> DumpLineParser<R> {
    pub fn new(reader: R, expected_fields: usize) -> Self {
        Self::with_chunk_size(reader, expected_fields, READ_CHUNK_SIZE)
    }

    fn with_chunk_size(reader: R, expected_fields: usize, chunk_size: usize) -> Self {
        DumpLineParser {
            reader,
            chunk: vec![0; chunk_size],
            chunk_pos: 0,
            chunk_len: 0,
            state: State::LineStart,
            fields: vec![Vec::new(); expected_fields],
            current_field: 0,
            records_done: 0,
            expected_fields,
        }
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        if self.chunk_pos >= self.chunk_len {
            self.chunk_len = self
                .reader
                .read(&mut self.chunk)
                .context("failed to read from reference file")?;
            self.chunk_pos = 0;
            if self.chunk_len == 0 {
                return Ok(None);
            }
        }
        let byte = self.chunk[self.chunk_pos];
        self.chunk_pos += 1;
        Ok(Some(byte))
    }

    /// Advances to the next record, returning its 1-based ordinal and its
    /// fields, or `None` at a clean end of input. The field buffers are
    /// reused: the returned slice is valid until the next call.
    pub fn next_record(&mut self) -> Result<Option<(u64, &[Vec<u8>])>> {
        if self.records_done > 0 {
            for field in &mut self.fields {
                field.clear();
            }
        }
        // Ordinal of the record being parsed, for diagnostics.
        let ordinal = self.records_done + 1;
        loop {
            let byte = match self.next_byte()? {
                Some(byte) => byte,
                None => {
                    if self.state == State::LineStart {
                        return Ok(None);
                    }
                    // The legacy reader silently dropped a final record with
                    // no terminating line break.
                    bail!("truncated record at end of file (record {})", ordinal);
                }
            };
            match self.state {
                State::LineStart => match byte {
                    b'0'..=b'9' => {
                        self.state = State::ReadingId;
                        self.fields[0].push(byte);
                    }
                    b'\n' | b'\r' => {}
                    _ => bail!(
                        "could not find a valid taxon ID to start the line (record {})",
                        ordinal
                    ),
                },
                State::ReadingId => match byte {
                    b'0'..=b'9' => self.fields[0].push(byte),
                    b'\t' => self.state = State::ExpectPipe,
                    _ => bail!("expected a tab following the taxon ID (record {})", ordinal),
                },
                State::ExpectPipe => {
                    if byte != b'|' {
                        bail!("expected a '|' following the tab (record {})", ordinal);
                    }
                    self.state = State::FieldBoundary;
                }
                State::FieldBoundary => match byte {
                    b'\t' => {
                        self.current_field += 1;
                        if self.current_field == self.expected_fields {
                            bail!("too many fields (record {})", ordinal);
                        }
                        self.state = State::ReadingField;
                    }
                    b'\n' | b'\r' => {
                        if self.current_field < self.expected_fields - 1 {
                            bail!("too few fields (record {})", ordinal);
                        }
                        self.current_field = 0;
                        self.state = State::LineStart;
                        self.records_done += 1;
                        return Ok(Some((ordinal, &self.fields)));
                    }
                    _ => bail!("expected a tab following the '|' (record {})", ordinal),
                },
                State::ReadingField => match byte {
                    b'\t' => self.state = State::ExpectPipe,
                    b'\n' | b'\r' => bail!("unexpected end of line (record {})", ordinal),
                    _ => self.fields[self.current_field].push(byte),
                },
            }
        }
    }
}

use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::exit;

use anyhow::Result;
use clap::Parser;

use lineage_rs::query::{QueryEngine, DEFAULT_ID_FIELD};
use lineage_rs::taxonomy::TaxonomyIndex;

/// Annotates tab-delimited lines from stdin with the full taxonomic lineage
/// of the taxon ID found in one of their columns.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Options {
    /// GenBank taxid-to-name map file (e.g. names.dmp from the NCBI taxdump
    /// archive; may be gzip-compressed)
    #[clap(value_parser)]
    names_filename: PathBuf,

    /// GenBank taxonomic hierarchy file (e.g. nodes.dmp from the NCBI
    /// taxdump archive; may be gzip-compressed)
    #[clap(value_parser)]
    nodes_filename: PathBuf,

    /// 0-based index of the tab-separated field holding the taxon ID in
    /// each input line
    #[clap(default_value_t = DEFAULT_ID_FIELD, value_parser)]
    id_field: usize,
}

fn run(opts: &Options) -> Result<u64> {
    let index = TaxonomyIndex::from_files(&opts.names_filename, &opts.nodes_filename)?;
    log::info!("taxonomy loaded, {} taxa indexed", index.len());

    let engine = QueryEngine::new(&index, opts.id_field);
    let stdin = io::stdin();
    let stdout = io::stdout();
    engine.run(stdin.lock(), BufWriter::new(stdout.lock()))
}

fn main() {
    env_logger::init();
    let opts = Options::parse();
    match run(&opts) {
        Ok(emitted) => log::info!("annotated {} lines", emitted),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            exit(1);
        }
    }
}

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::TempDir;

use lineage_rs::query::{QueryEngine, DEFAULT_ID_FIELD};
use lineage_rs::taxonomy::TaxonomyIndex;

fn name_line(id: u64, name: &str) -> String {
    format!("{}\t|\t{}\t|\t\t|\tscientific name\t|\n", id, name)
}

fn node_line(id: u64, parent: u64, rank: &str) -> String {
    format!(
        "{}\t|\t{}\t|\t{}\t|\t\t|\t8\t|\t0\t|\t1\t|\t0\t|\t0\t|\t0\t|\t0\t|\t0\t|\t\t|\n",
        id, parent, rank
    )
}

/// The Homo sapiens ancestor chain, with the unranked "cellular organisms"
/// node between Eukaryota and the root.
fn names_data() -> String {
    [
        name_line(1, "root"),
        name_line(131567, "cellular organisms"),
        name_line(2759, "Eukaryota"),
        name_line(33208, "Metazoa"),
        name_line(7711, "Chordata"),
        name_line(40674, "Mammalia"),
        name_line(9443, "Primates"),
        name_line(9604, "Hominidae"),
        name_line(9605, "Homo"),
        name_line(9606, "Homo sapiens"),
        name_line(2, "Bacteria"),
    ]
    .concat()
}

fn nodes_data() -> String {
    [
        node_line(1, 1, "no rank"),
        node_line(131567, 1, "no rank"),
        node_line(2759, 131567, "superkingdom"),
        node_line(33208, 2759, "kingdom"),
        node_line(7711, 33208, "phylum"),
        node_line(40674, 7711, "class"),
        node_line(9443, 40674, "order"),
        node_line(9604, 9443, "family"),
        node_line(9605, 9604, "genus"),
        node_line(9606, 9605, "species"),
        node_line(2, 131567, "superkingdom"),
    ]
    .concat()
}

fn write_reference(dir: &Path, filename: &str, data: &str) -> std::path::PathBuf {
    let path = dir.join(filename);
    fs::write(&path, data).unwrap();
    path
}

fn write_reference_gz(dir: &Path, filename: &str, data: &str) -> std::path::PathBuf {
    let path = dir.join(filename);
    let file = fs::File::create(&path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(data.as_bytes()).unwrap();
    encoder.finish().unwrap();
    path
}

fn annotate(index: &TaxonomyIndex, queries: &str) -> String {
    let engine = QueryEngine::new(index, DEFAULT_ID_FIELD);
    let mut output = Vec::new();
    engine
        .run(Cursor::new(queries.to_string()), &mut output)
        .unwrap();
    String::from_utf8(output).unwrap()
}

#[test]
fn test_full_lineage_from_reference_files() {
    let dir = TempDir::new().unwrap();
    let names = write_reference(dir.path(), "names.dmp", &names_data());
    let nodes = write_reference(dir.path(), "nodes.dmp", &nodes_data());

    let index = TaxonomyIndex::from_files(&names, &nodes).unwrap();
    assert_eq!(index.len(), 11);

    let output = annotate(&index, "read_0017\t9606\t0.97\n");
    assert_eq!(
        output,
        "read_0017\t9606\t0.97\troot\tEukaryota\tMetazoa\tChordata\tMammalia\
         \tPrimates\tHominidae\tHomo\tHomo sapiens\n"
    );
}

#[test]
fn test_partial_lineage_keeps_placeholder_columns() {
    let dir = TempDir::new().unwrap();
    let names = write_reference(dir.path(), "names.dmp", &names_data());
    let nodes = write_reference(dir.path(), "nodes.dmp", &nodes_data());
    let index = TaxonomyIndex::from_files(&names, &nodes).unwrap();

    // Bacteria has only the superkingdom rank on its path to root; the
    // unranked "cellular organisms" node must stay invisible.
    let output = annotate(&index, "read_0018\t2\n");
    assert_eq!(output, "read_0018\t2\troot\tBacteria\tn\tn\tn\tn\tn\tn\tn\n");
}

#[test]
fn test_bad_query_lines_are_skipped_and_processing_continues() {
    let dir = TempDir::new().unwrap();
    let names = write_reference(dir.path(), "names.dmp", &names_data());
    let nodes = write_reference(dir.path(), "nodes.dmp", &nodes_data());
    let index = TaxonomyIndex::from_files(&names, &nodes).unwrap();

    let queries = "a\tnotanumber\tb\n\
                   a\t999999\tb\n\
                   a\t9606\tb\n";
    let output = annotate(&index, queries);
    assert_eq!(output.lines().count(), 1);
    assert!(output.starts_with("a\t9606\tb\troot\t"));
}

#[test]
fn test_gzip_compressed_reference_files() {
    let dir = TempDir::new().unwrap();
    let names = write_reference_gz(dir.path(), "names.dmp.gz", &names_data());
    let nodes = write_reference_gz(dir.path(), "nodes.dmp.gz", &nodes_data());

    let index = TaxonomyIndex::from_files(&names, &nodes).unwrap();
    let output = annotate(&index, "x\t9605\n");
    assert_eq!(
        output,
        "x\t9605\troot\tEukaryota\tMetazoa\tChordata\tMammalia\
         \tPrimates\tHominidae\tHomo\tn\n"
    );
}

#[test]
fn test_hierarchy_referencing_unknown_id_aborts_ingestion() {
    let dir = TempDir::new().unwrap();
    let names = write_reference(dir.path(), "names.dmp", &name_line(9, "Homo sapiens"));
    // Parent 1 never appeared in the names file.
    let nodes = write_reference(dir.path(), "nodes.dmp", &node_line(9, 1, "species"));

    let err = TaxonomyIndex::from_files(&names, &nodes).unwrap_err();
    assert!(format!("{:#}", err).contains("unknown taxon ID 1"));
}

#[test]
fn test_missing_reference_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let names = write_reference(dir.path(), "names.dmp", &names_data());
    let err = TaxonomyIndex::from_files(&names, &dir.path().join("absent.dmp")).unwrap_err();
    assert!(format!("{:#}", err).contains("failed to open input file"));
}

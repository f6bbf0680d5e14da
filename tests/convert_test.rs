mod common;

use common::{fixture_path, gzip_fixture, load_schema, read_csv, strings};
use complex_xml_to_csvs::convert::{convert_with_schema, open_input, ConvertConfig};
use complex_xml_to_csvs::parser::{ErrorPolicy, StopReason};
use complex_xml_to_csvs::{xml_to_csv_batches, ConvertError};
use std::fs;
use std::io::Read;
use std::path::Path;
use tempfile::TempDir;

fn config_for(input: &Path, output: &TempDir) -> ConvertConfig {
    let mut config = ConvertConfig::new(input, fixture_path("schema.json"));
    config.output_dir = output.path().join("out");
    config.batch_size = 2;
    config
}

fn assert_multi_output(out: &Path) {
    assert_eq!(
        read_csv(&out.join("table_0/complex_multi_0000.csv")),
        vec![
            strings(&["record_id", "subcategory_id", "bir", "cf", "szam"]),
            strings(&["0000000001", "1", "01", "10", "000001"]),
            strings(&["0000000002", "1", "02", "10", "000002"]),
        ]
    );
    assert_eq!(
        read_csv(&out.join("table_2/complex_multi_0000.csv")),
        vec![
            strings(&["record_id", "subcategory_id", "nev", "cim"]),
            strings(&["0000000001", "1", "Alpha & Co.", "Fo utca 1.\nBudapest"]),
            strings(&["0000000001", "2", "Alpha <Kft>", ""]),
        ]
    );
    assert_eq!(
        read_csv(&out.join("table_0/complex_multi_0001.csv")),
        vec![
            strings(&["record_id", "subcategory_id", "bir", "cf", "szam"]),
            strings(&["0000000003", "1", "03", "", ""]),
        ]
    );
    assert_eq!(
        read_csv(&out.join("table_2/complex_multi_0001.csv")),
        vec![
            strings(&["record_id", "subcategory_id", "nev", "cim"]),
            strings(&["0000000003", "5", "Gamma", ""]),
        ]
    );
}

#[test]
fn converts_plain_export_into_batches() {
    let output = TempDir::new().unwrap();
    let config = config_for(&fixture_path("complex_multi.xml"), &output);

    let summary = xml_to_csv_batches(&config).expect("conversion should succeed");

    assert_eq!(summary.records, 3);
    assert_eq!(summary.stop, StopReason::EndOfInput);
    assert_eq!(summary.batches_written, 2);
    assert_eq!(summary.files_written, 4);
    assert_eq!(summary.rows_written, 6);
    assert_multi_output(&config.output_dir);
}

#[test]
fn converts_gzipped_export() {
    let output = TempDir::new().unwrap();
    let input = gzip_fixture("complex_multi.xml", output.path());
    let config = config_for(&input, &output);

    let summary = xml_to_csv_batches(&config).expect("conversion should succeed");

    assert_eq!(summary.records, 3);
    assert_multi_output(&config.output_dir);
}

#[test]
fn open_input_decompresses_gz() {
    let dir = TempDir::new().unwrap();
    let input = gzip_fixture("complex_sample.xml", dir.path());

    let mut content = String::new();
    open_input(&input)
        .expect("gz input should open")
        .read_to_string(&mut content)
        .unwrap();
    assert!(content.contains(r#"<ceg id="0006414987">"#));
}

#[test]
fn creates_a_directory_per_table() {
    let output = TempDir::new().unwrap();
    let config = config_for(&fixture_path("complex_sample.xml"), &output);
    let schema = complex_xml_to_csvs::schema::Schema::from_json(
        r#"{"tables": [
            {"name": "table_0", "columns": ["record_id", "bir"]},
            {"name": "table_9", "columns": ["record_id"]}
        ]}"#,
    )
    .unwrap();

    convert_with_schema(&config, schema).expect("conversion should succeed");

    assert!(config.output_dir.join("table_9").is_dir());
    assert_eq!(
        read_csv(&config.output_dir.join("table_0/complex_sample_0000.csv")),
        vec![strings(&["record_id", "bir"]), strings(&["0006414987", "00"])]
    );
}

#[test]
fn max_records_limits_output() {
    let output = TempDir::new().unwrap();
    let mut config = config_for(&fixture_path("complex_multi.xml"), &output);
    config.max_records = Some(1);
    config.batch_size = 1000;

    let summary = xml_to_csv_batches(&config).expect("limit is not an error");

    assert_eq!(summary.records, 1);
    assert_eq!(summary.stop, StopReason::LimitReached { count: 1 });
    assert_eq!(
        read_csv(&config.output_dir.join("table_0/complex_multi_0000.csv")).len(),
        2
    );
    assert!(!config
        .output_dir
        .join("table_0/complex_multi_0001.csv")
        .exists());
}

#[test]
fn zero_max_records_converts_everything() {
    let output = TempDir::new().unwrap();
    let mut config = config_for(&fixture_path("complex_multi.xml"), &output);
    config.max_records = Some(0);

    let summary = xml_to_csv_batches(&config).expect("conversion should succeed");
    assert_eq!(summary.records, 3);
}

#[test]
fn completed_records_are_written_before_a_structural_error() {
    let output = TempDir::new().unwrap();
    let input = output.path().join("broken.xml");
    fs::write(
        &input,
        r#"<export>
<ceg id="1"><rovat id="0"><alrovat id="1"><mezo id="bir">01</mezo></alrovat></rovat></ceg>
<ceg id="2"><rovat id="0"><rovat id="1"></rovat></rovat></ceg>
</export>"#,
    )
    .unwrap();
    let mut config = config_for(&input, &output);

    let err = xml_to_csv_batches(&config).unwrap_err();
    assert!(matches!(err, ConvertError::Structural { .. }));
    assert_eq!(
        read_csv(&config.output_dir.join("table_0/broken_0000.csv"))[1],
        strings(&["1", "1", "01", "", ""])
    );

    config.output_dir = output.path().join("second");
    config.parse.error_policy = ErrorPolicy::LogAndStop;
    let summary = xml_to_csv_batches(&config).expect("policy should swallow the error");
    assert!(matches!(summary.stop, StopReason::Aborted(_)));
    assert_eq!(summary.records, 1);
}

#[test]
fn second_run_into_same_directory_collides() {
    let output = TempDir::new().unwrap();
    let config = config_for(&fixture_path("complex_sample.xml"), &output);

    xml_to_csv_batches(&config).expect("first run should succeed");
    let err = xml_to_csv_batches(&config).unwrap_err();
    assert!(matches!(err, ConvertError::WriteCollision { .. }));
}

#[test]
fn schema_fixture_lists_both_tables() {
    let schema = load_schema();
    assert_eq!(schema.tables().len(), 2);
    assert!(schema.columns("table_2").is_some());
}

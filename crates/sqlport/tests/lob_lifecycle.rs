use std::io::Read;
use std::path::PathBuf;

use sqlport::prelude::*;

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("sqlport-{}-{name}", std::process::id()))
}

fn decode_lob(types: &mut Datatype<AnsiBackend>, contents: &str, type_name: &str) -> LobLocator {
    types
        .decode(Value::from(contents), type_name, false)
        .unwrap()
        .as_lob()
        .unwrap()
        .clone()
}

#[test]
fn lob_values_decode_to_locators() {
    let mut types = Datatype::new(AnsiBackend::new("main"));
    let locator = decode_lob(&mut types, "large text", "clob");

    assert_eq!(locator.identity(), "main");
    assert!(locator.to_string().starts_with("sqlportlob://"));
    let parsed: LobLocator = locator.to_string().parse().unwrap();
    assert_eq!(parsed, locator);

    assert_eq!(types.lob_contents(&locator).unwrap(), b"large text");
    assert_eq!(types.decode(Value::Null, "blob", false).unwrap(), Value::Null);
}

#[test]
fn streams_advance_and_report_end() {
    let mut types = Datatype::new(AnsiBackend::new("main"));
    let locator = decode_lob(&mut types, "abcdef", "blob");

    assert_eq!(types.read_lob(&locator, 4).unwrap(), b"abcd");
    assert_eq!(types.read_lob(&locator, 4).unwrap(), b"abcd");

    let mut stream = types.lob_stream(&locator).unwrap();
    let mut buffer = [0u8; 4];
    assert_eq!(stream.read(&mut buffer).unwrap(), 4);
    assert_eq!(stream.read(&mut buffer).unwrap(), 2);
    assert_eq!(&buffer[..2], b"ef");
    assert!(!stream.at_end());
    assert_eq!(stream.read(&mut buffer).unwrap(), 0);
    assert!(stream.at_end());
    assert_eq!(stream.position(), 6);

    assert!(types.end_of_lob(&locator).unwrap());
    assert_eq!(types.read_lob(&locator, 4).unwrap(), b"");
}

#[test]
fn destroyed_locators_are_never_reused() {
    let mut types = Datatype::new(AnsiBackend::new("main"));
    let first = decode_lob(&mut types, "one", "clob");
    types.destroy_lob(&first).unwrap();
    assert!(types.lobs().is_empty());

    let second = decode_lob(&mut types, "two", "clob");
    assert_ne!(first, second);
    assert!(!types.lobs().contains(&first));
    assert!(types.lob_contents(&first).unwrap_err().is_invalid());
    assert_eq!(types.lob_contents(&second).unwrap(), b"two");

    // Destroying twice is a no-op.
    types.destroy_lob(&first).unwrap();
    assert_eq!(types.lobs().len(), 1);
}

#[test]
fn reset_invalidates_every_lob() {
    let mut types = Datatype::new(AnsiBackend::new("main"));
    let a = decode_lob(&mut types, "a", "clob");
    let b = decode_lob(&mut types, "b", "blob");
    types.reset_lobs();

    assert!(types.lobs().is_empty());
    assert!(types.lob_contents(&a).is_err());
    assert!(types.lob_contents(&b).is_err());
}

#[test]
fn locators_are_bound_to_their_connection() {
    let mut main = Datatype::new(AnsiBackend::new("main"));
    let mut replica = Datatype::new(AnsiBackend::new("replica"));
    let locator = decode_lob(&mut main, "data", "clob");

    let err = replica.lob_contents(&locator).unwrap_err();
    assert!(err.is_invalid());
    assert!(err.message().contains("another connection"));
}

#[test]
fn quoting_a_lob_inlines_its_contents() {
    let mut types = Datatype::new(AnsiBackend::new("main"));
    let locator = decode_lob(&mut types, "it's big", "clob");

    assert_eq!(
        types.quote_literal(&Value::Lob(locator), Some("clob")).unwrap(),
        "'it''s big'"
    );
}

#[test]
fn binary_lobs_survive_a_round_trip() {
    let mut types = Datatype::new(AnsiBackend::new("main"));
    let raw = vec![0x00, 0xff, 0x41, 0xfe, 0x00];
    let locator = types
        .decode(Value::Bytes(raw.clone()), "blob", false)
        .unwrap()
        .as_lob()
        .unwrap()
        .clone();

    assert_eq!(types.lob_contents(&locator).unwrap(), raw);
    assert_eq!(
        types.quote_literal(&Value::Lob(locator.clone()), Some("blob")).unwrap(),
        "X'00FF41FE00'"
    );
    assert!(
        types
            .quote(&Value::Lob(locator), Some("blob"), QuoteOptions::UNQUOTED)
            .unwrap_err()
            .is_invalid()
    );
}

#[test]
fn lobs_are_written_to_files() {
    let mut types = Datatype::new(
        AnsiBackend::new("main").with_options(Options::new().lob_buffer_length(3)),
    );
    let locator = decode_lob(&mut types, "chunked contents", "blob");
    let path = scratch_path("write.bin");
    let url = format!("file://{}", path.display());

    types.write_lob_to_file(&locator, &url).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"chunked contents");
    assert!(types.end_of_lob(&locator).unwrap());
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn writing_to_a_directory_fails() {
    let mut types = Datatype::new(AnsiBackend::new("main"));
    let locator = decode_lob(&mut types, "x", "blob");
    let dir = std::env::temp_dir();

    let err = types
        .write_lob_to_file(&locator, &dir.display().to_string())
        .unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(err.message(), "could not write to the output file");
}

#[test]
fn file_urls_are_inlined_only_when_allowed() {
    let path = scratch_path("source.txt");
    std::fs::write(&path, "from disk").unwrap();
    let url = format!("file://{}", path.display());

    let mut types = Datatype::new(AnsiBackend::new("main"));
    assert_eq!(
        types.quote_literal(&Value::from(url.as_str()), Some("clob")).unwrap(),
        format!("'{url}'")
    );

    let mut types = Datatype::new(
        AnsiBackend::new("main").with_options(Options::new().lob_allow_url_include(true)),
    );
    assert_eq!(
        types.quote_literal(&Value::from(url.as_str()), Some("clob")).unwrap(),
        "'from disk'"
    );
    assert_eq!(
        types.quote_literal(&Value::from("not a url"), Some("blob")).unwrap(),
        "'not a url'"
    );

    std::fs::remove_file(&path).unwrap();
    let err = types
        .quote_literal(&Value::from(url.as_str()), Some("clob"))
        .unwrap_err();
    assert!(err.is_fatal());
    assert!(err.message().starts_with("could not read LOB source"));
}

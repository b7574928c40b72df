//! Comic archive tests: CBZ placeholder extraction and the CBR refusal.

mod common;

use bookflat::comic::read_comic;
use bookflat::error::Error;
use bookflat::render::RenderOptions;
use bookflat::{ConversionRequest, InputKind, OutputFormat, convert_file};
use common::{cbz_bytes, tiny_jpeg, write_fixture};
use tempfile::TempDir;

#[test]
fn test_cbz_pages_in_name_order() {
    let dir = TempDir::new().unwrap();
    let jpeg = tiny_jpeg();
    // Archive order deliberately scrambled; page order is name-sorted
    let bytes = cbz_bytes(&[
        ("003.jpg", jpeg.as_slice()),
        ("001.jpg", jpeg.as_slice()),
        ("ComicInfo.xml", b"<ComicInfo/>"),
        ("002.jpg", jpeg.as_slice()),
    ]);
    let path = write_fixture(dir.path(), "issue-1.cbz", &bytes);

    let package = read_comic(&path, InputKind::Cbz).unwrap();
    assert_eq!(package.document.title.as_deref(), Some("issue-1"));
    assert_eq!(package.document.sections.len(), 3);
    assert_eq!(package.document.sections[0].path, "001.jpg");
    assert_eq!(package.document.sections[2].path, "003.jpg");
}

#[test]
fn test_cbz_to_text_emits_placeholders() {
    let dir = TempDir::new().unwrap();
    let jpeg = tiny_jpeg();
    let bytes = cbz_bytes(&[("p1.jpg", jpeg.as_slice()), ("p2.jpg", jpeg.as_slice())]);
    let path = write_fixture(dir.path(), "mini.cbz", &bytes);

    let request = ConversionRequest::new(&path, OutputFormat::Text);
    convert_file(&request, &RenderOptions::default()).unwrap();
    let text = std::fs::read_to_string(&request.output).unwrap();

    assert!(text.contains("Page 1: p1.jpg"));
    assert!(text.contains("Page 2: p2.jpg"));
    assert!(text.contains("[Image content cannot be converted to text]"));
}

#[test]
fn test_cbr_is_unsupported() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "issue.cbr", b"Rar!\x1a\x07\x00");

    let request = ConversionRequest::new(&path, OutputFormat::Text);
    let err = convert_file(&request, &RenderOptions::default()).unwrap_err();
    match err {
        Error::UnsupportedFormat(msg) => assert!(msg.contains("CBZ")),
        other => panic!("expected UnsupportedFormat, got {other:?}"),
    }
    assert!(!request.output.exists(), "no output for a failed conversion");
}

#[test]
fn test_empty_cbz_yields_empty_output() {
    let dir = TempDir::new().unwrap();
    let bytes = cbz_bytes(&[("readme.txt", b"no pages here")]);
    let path = write_fixture(dir.path(), "empty.cbz", &bytes);

    let request = ConversionRequest::new(&path, OutputFormat::Text);
    convert_file(&request, &RenderOptions::default()).unwrap();
    let text = std::fs::read_to_string(&request.output).unwrap();
    assert!(text.is_empty());
}

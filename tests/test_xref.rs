//! Cross-reference resolution on synthesized files.

mod common;

use common::{PdfBuilder, deflate, png_up};
use pdf_strata::brute_force::BruteForceSearcher;
use pdf_strata::error::{Error, ErrorCategory};
use pdf_strata::filters::StandardFilters;
use pdf_strata::warnings::{CollectingSink, ParseWarning};
use pdf_strata::xref::{XrefEntry, XrefResolver};
use pdf_strata::{MemoryCursor, Object, ObjectId, ParserOptions, PdfDocument};
use std::sync::Arc;

fn open_collecting(data: Vec<u8>, options: &ParserOptions) -> (pdf_strata::Result<PdfDocument>, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::new());
    let doc = PdfDocument::open_with(MemoryCursor::new(data), options, Box::new(StandardFilters), sink.clone());
    (doc, sink)
}

#[test]
fn test_sample_table() {
    common::init_logging();
    let data = b"xref\n0 3\n0000000000 65535 f\n0000000100 00000 n\n0000000200 00005 n\ntrailer\n<<>>\n";
    let mut cursor = MemoryCursor::new(&data[..]);
    let sink = CollectingSink::new();
    let resolver = XrefResolver::new(&ParserOptions::strict(), &StandardFilters, &sink);
    let index = resolver.resolve(&mut cursor, 0, &mut BruteForceSearcher::new()).unwrap();

    assert_eq!(index.get(ObjectId::new(1, 0)), Some(XrefEntry::InUse { offset: 100 }));
    assert_eq!(index.get(ObjectId::new(2, 5)), Some(XrefEntry::InUse { offset: 200 }));
    let object_zero_in_use = index
        .iter()
        .any(|(id, entry)| id.number == 0 && matches!(entry, XrefEntry::InUse { .. }));
    assert!(!object_zero_in_use);
}

#[test]
fn test_main_section_wins_over_prev() {
    common::init_logging();
    let mut b = PdfBuilder::new();
    b.object(1, "(old)").object(2, "<< /Type /Catalog >>").object(3, "42");
    let old_offset = b.offset(1);
    let older = b.full_xref("/Root 2 0 R /Info 3 0 R");

    b.object(1, "(new)");
    let entries = [(1, b.offset(1)), (2, b.offset(2)), (3, b.offset(3))];
    let main = b.xref_section(&entries, &format!("/Size 4 /Root 2 0 R /Prev {}", older));
    let data = b.finish(main);

    let (doc, sink) = open_collecting(data, &ParserOptions::strict());
    let mut doc = doc.unwrap();
    let entry = doc.xref().get(ObjectId::new(1, 0));
    assert_eq!(entry, Some(XrefEntry::InUse { offset: entries[0].1 as u64 }));
    assert_ne!(entries[0].1, old_offset);
    assert_eq!(doc.get(ObjectId::new(1, 0)).unwrap(), Object::String(b"new".to_vec()));

    // keys only the older trailer has are still merged in
    assert_eq!(doc.trailer().get("Info"), Some(&Object::Reference(ObjectId::new(3, 0))));
    assert_eq!(doc.trailer().get("Size"), Some(&Object::Integer(4)));
    assert!(sink.warnings().is_empty());
}

#[test]
fn test_hybrid_xref_stream_outranks_prev() {
    common::init_logging();
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog >>").object(3, "(old three)");
    let older = b.full_xref("/Root 1 0 R");

    b.object(3, "(new three)");
    let new_three = b.offset(3) as u32;
    let mut row = vec![1u8];
    row.extend_from_slice(&new_three.to_be_bytes());
    row.push(0);
    b.stream(9, "/Type /XRef /W [1 4 1] /Index [3 1] /Size 10", &row);
    let stm = b.offset(9);

    let catalog = [(1, b.offset(1))];
    let main = b.xref_section(&catalog, &format!("/Size 10 /Root 1 0 R /Prev {} /XRefStm {}", older, stm));
    let data = b.finish(main);

    let mut doc = PdfDocument::from_bytes(data, &ParserOptions::strict()).unwrap();
    assert_eq!(doc.get(ObjectId::new(3, 0)).unwrap(), Object::String(b"new three".to_vec()));
    assert!(doc.catalog().is_ok());
}

#[test]
fn test_compressed_xref_stream_with_predictor() {
    common::init_logging();
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog /Pages 2 0 R >>").object(2, "<< /Type /Pages /Count 0 >>");
    let xref_at = b.len();

    let row = |kind: u8, offset: usize, gen: u8| vec![kind, (offset >> 8) as u8, offset as u8, gen];
    let rows = vec![row(0, 0, 255), row(1, b.offset(1), 0), row(1, b.offset(2), 0), row(1, xref_at, 0)];
    let packed = deflate(&png_up(&rows));
    b.stream(
        3,
        "/Type /XRef /Size 4 /W [1 2 1] /Root 1 0 R /Filter /FlateDecode /DecodeParms << /Predictor 12 /Columns 4 >>",
        &packed,
    );
    let data = b.finish(xref_at);

    let mut doc = PdfDocument::from_bytes(data, &ParserOptions::strict()).unwrap();
    assert_eq!(doc.xref().get(ObjectId::new(3, 0)), Some(XrefEntry::InUse { offset: xref_at as u64 }));
    assert_eq!(doc.xref().get(ObjectId::new(0, 255)), Some(XrefEntry::Free));
    assert!(!doc.trailer().contains_key("Filter"));

    let catalog = doc.catalog().unwrap();
    let pages = catalog.as_dict().and_then(|d| d.get("Pages")).and_then(Object::as_reference).unwrap();
    let pages = doc.get(pages).unwrap();
    assert_eq!(pages.as_dict().and_then(|d| d.get("Count")), Some(&Object::Integer(0)));
}

fn self_referencing_file() -> (Vec<u8>, usize) {
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog >>");
    let catalog_at = b.offset(1);
    let table_start = b.len();
    let table = format!(
        "xref\n0 2\n0000000000 65535 f \n{:010} 00000 n \ntrailer\n<< /Size 2 /Root 1 0 R >>\n",
        table_start + 10
    );
    b.raw(table.as_bytes());
    (b.finish(table_start), catalog_at)
}

#[test]
fn test_self_referencing_offset_strict() {
    common::init_logging();
    let (data, _) = self_referencing_file();
    let (doc, _) = open_collecting(data, &ParserOptions::strict());
    let err = doc.unwrap_err();
    assert!(matches!(err, Error::XrefSelfReference { .. }));
    assert_eq!(err.category(), ErrorCategory::Integrity);
}

#[test]
fn test_self_referencing_offset_lenient() {
    common::init_logging();
    let (data, catalog_at) = self_referencing_file();
    let (doc, sink) = open_collecting(data, &ParserOptions::lenient());
    let mut doc = doc.unwrap();
    assert_eq!(doc.xref().get(ObjectId::new(1, 0)), Some(XrefEntry::InUse { offset: catalog_at as u64 }));
    assert!(doc.catalog().is_ok());
    assert!(sink
        .warnings()
        .iter()
        .any(|w| matches!(w, ParseWarning::XrefSelfReference { object, .. } if *object == ObjectId::new(1, 0))));
}

#[test]
fn test_missing_startxref() {
    common::init_logging();
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog >>").object(2, "(two)");
    b.raw(b"trailer\n<< /Root 1 0 R /Size 3 /ID [<01> <02>] >>\n%%EOF\n");
    let mut data = Vec::new();
    data.extend_from_slice(&b.finish(0));
    // drop the startxref footer the builder appended
    let footer = data.windows(9).rposition(|w| w == b"startxref").unwrap();
    data.truncate(footer);

    let (doc, _) = open_collecting(data.clone(), &ParserOptions::strict());
    assert!(matches!(doc.unwrap_err(), Error::InvalidXref(_)));

    let (doc, sink) = open_collecting(data, &ParserOptions::lenient());
    let mut doc = doc.unwrap();
    assert!(doc.xref().is_recovered());
    assert!(doc.trailer().contains_key("ID"));
    assert_eq!(doc.get(ObjectId::new(2, 0)).unwrap(), Object::String(b"two".to_vec()));
    assert!(sink
        .warnings()
        .iter()
        .any(|w| matches!(w, ParseWarning::BruteForceFallback { .. })));
}

#[test]
fn test_unreadable_prev_section() {
    common::init_logging();
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog >>");
    let main = b.full_xref("/Root 1 0 R /Prev 999999");
    let data = b.finish(main);

    let (doc, _) = open_collecting(data.clone(), &ParserOptions::strict());
    assert!(matches!(doc.unwrap_err(), Error::OffsetOutOfRange { offset: 999999, .. }));

    let (doc, _) = open_collecting(data, &ParserOptions::lenient());
    let doc = doc.unwrap();
    assert!(!doc.xref().is_recovered());
    assert!(doc.xref().get(ObjectId::new(1, 0)).is_some());
}

//! Synthesized PDF fixtures with computed offsets.

#![allow(dead_code)]

use flate2::Compression;
use flate2::write::ZlibEncoder;
use std::collections::BTreeMap;
use std::io::Write;

/// Route `log` output through the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// zlib-compress `data`.
pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Encode rows with the PNG "Up" predictor (tag 2).
pub fn png_up(rows: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut prev = vec![0u8; rows.first().map_or(0, Vec::len)];
    for row in rows {
        out.push(2);
        out.extend(row.iter().zip(&prev).map(|(b, p)| b.wrapping_sub(*p)));
        prev = row.clone();
    }
    out
}

/// Appends objects and cross-reference sections, remembering where each
/// object header landed.
pub struct PdfBuilder {
    out: Vec<u8>,
    offsets: BTreeMap<u32, usize>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self {
            out: b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n".to_vec(),
            offsets: BTreeMap::new(),
        }
    }

    /// Current length, which is the offset of whatever is appended next.
    pub fn len(&self) -> usize {
        self.out.len()
    }

    /// Offset of the most recent header written for `number`.
    pub fn offset(&self, number: u32) -> usize {
        self.offsets[&number]
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.out.extend_from_slice(bytes);
        self
    }

    pub fn object(&mut self, number: u32, body: &str) -> &mut Self {
        self.offsets.insert(number, self.out.len());
        self.out
            .extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", number, body).as_bytes());
        self
    }

    /// Stream object; `/Length` is appended to `dict_entries`.
    pub fn stream(&mut self, number: u32, dict_entries: &str, data: &[u8]) -> &mut Self {
        self.offsets.insert(number, self.out.len());
        self.out.extend_from_slice(
            format!("{} 0 obj\n<< {} /Length {} >>\nstream\n", number, dict_entries, data.len()).as_bytes(),
        );
        self.out.extend_from_slice(data);
        self.out.extend_from_slice(b"\nendstream\nendobj\n");
        self
    }

    /// Classic section with one subsection per entry. Returns its offset.
    pub fn xref_section(&mut self, entries: &[(u32, usize)], trailer: &str) -> usize {
        let start = self.out.len();
        let mut text = String::from("xref\n0 1\n0000000000 65535 f \n");
        for (number, offset) in entries {
            text.push_str(&format!("{} 1\n{:010} 00000 n \n", number, offset));
        }
        text.push_str(&format!("trailer\n<< {} >>\n", trailer));
        self.out.extend_from_slice(text.as_bytes());
        start
    }

    /// Classic section covering every object written so far.
    pub fn full_xref(&mut self, trailer: &str) -> usize {
        let entries: Vec<(u32, usize)> = self.offsets.iter().map(|(n, o)| (*n, *o)).collect();
        let size = self.offsets.keys().max().map_or(1, |n| n + 1);
        self.xref_section(&entries, &format!("/Size {} {}", size, trailer))
    }

    pub fn finish(&mut self, startxref: usize) -> Vec<u8> {
        self.out
            .extend_from_slice(format!("startxref\n{}\n%%EOF\n", startxref).as_bytes());
        self.out.clone()
    }
}

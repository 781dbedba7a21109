// file: src/exporter/json.rs
// description: turns search hits into the printed json result list

use crate::error::Result;
use crate::models::{FormattedResult, SearchHit};
use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use std::io;

const INDENT: &[u8] = b"    ";

#[derive(Debug, Clone)]
pub struct JsonExporter {
    snippet_length: usize,
}

impl JsonExporter {
    pub fn new(snippet_length: usize) -> Self {
        Self { snippet_length }
    }

    pub fn format(&self, hits: &[SearchHit]) -> Vec<FormattedResult> {
        hits.iter()
            .map(|hit| FormattedResult::from_hit(hit, self.snippet_length))
            .collect()
    }

    /// JSON array indented with four spaces, non-ASCII text as `\uXXXX`.
    pub fn render(&self, results: &[FormattedResult]) -> Result<String> {
        let mut buffer = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, AsciiFormatter::new());
        results.serialize(&mut serializer)?;

        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Pretty printing with every non-ASCII character escaped, surrogate pairs
/// included, so the output survives any terminal encoding.
struct AsciiFormatter<'a> {
    pretty: PrettyFormatter<'a>,
}

impl AsciiFormatter<'_> {
    fn new() -> Self {
        Self {
            pretty: PrettyFormatter::with_indent(INDENT),
        }
    }
}

impl Formatter for AsciiFormatter<'_> {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        let mut units = [0u16; 2];
        let mut plain = 0;

        for (offset, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[plain..offset])?;
            for unit in ch.encode_utf16(&mut units) {
                writer.write_all(format!("\\u{:04x}", unit).as_bytes())?;
            }
            plain = offset + ch.len_utf8();
        }

        writer.write_all(&fragment.as_bytes()[plain..])
    }
}

impl Default for JsonExporter {
    fn default() -> Self {
        Self::new(50)
    }
}

//! Table reader for Office Open XML (.docx) documents
//!
//! Only `word/document.xml` is read. Tables are collected in document order;
//! tables nested inside a cell and tables inside text boxes are not counted,
//! matching what a word processor lists as the document's tables.

use crate::error::{LedgerError, LedgerResult};
use quick_xml::encoding::Decoder;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek};
use std::path::Path;
use thiserror::Error;
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";

const TAG_TABLE: QName = QName(b"w:tbl");
const TAG_ROW: QName = QName(b"w:tr");
const TAG_CELL: QName = QName(b"w:tc");
const TAG_GRID_SPAN: QName = QName(b"w:gridSpan");
const TAG_VERTICAL_MERGE: QName = QName(b"w:vMerge");
const TAG_PARAGRAPH: QName = QName(b"w:p");
const TAG_RUN: QName = QName(b"w:r");
const TAG_TEXT: QName = QName(b"w:t");
const TAG_TAB: QName = QName(b"w:tab");
const TAG_BREAK: QName = QName(b"w:br");
const TAG_CARRIAGE_RETURN: QName = QName(b"w:cr");
const TAG_TEXTBOX: QName = QName(b"w:txbxContent");

#[derive(Error, Debug)]
pub(crate) enum DocxError {
    #[error("not a .docx package: {0}")]
    Package(#[from] zip::result::ZipError),

    #[error("missing word/document.xml")]
    MissingDocumentPart,

    #[error("XML error: {0}")]
    Xml(String),

    #[error("unknown XML entity '&{0};'")]
    Entity(String),
}

/// One table as a grid of cell texts, row by row
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocxTable {
    rows: Vec<Vec<String>>,
}

impl DocxTable {
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Text of the cell at a grid position
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
    }
}

/// Read all top-level tables of a .docx file
pub fn read_tables(path: &Path) -> LedgerResult<Vec<DocxTable>> {
    let file = File::open(path)?;
    read_tables_from(file).map_err(|e| LedgerError::DocumentUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

pub(crate) fn read_tables_from<R: Read + Seek>(reader: R) -> Result<Vec<DocxTable>, DocxError> {
    let mut archive = ZipArchive::new(reader)?;
    let part = match archive.by_name(DOCUMENT_PART) {
        Ok(part) => part,
        Err(zip::result::ZipError::FileNotFound) => return Err(DocxError::MissingDocumentPart),
        Err(e) => return Err(e.into()),
    };
    parse_document_xml(BufReader::new(part))
}

/// Vertical merge state of a cell (`w:vMerge`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VerticalMerge {
    None,
    Restart,
    Continue,
}

#[derive(Debug)]
struct CellBuilder {
    paragraphs: Vec<String>,
    current: Option<String>,
    grid_span: usize,
    vertical_merge: VerticalMerge,
}

impl CellBuilder {
    fn new() -> Self {
        Self {
            paragraphs: Vec::new(),
            current: None,
            grid_span: 1,
            vertical_merge: VerticalMerge::None,
        }
    }

    fn push_str(&mut self, text: &str) {
        self.current.get_or_insert_with(String::new).push_str(text);
    }

    fn end_paragraph(&mut self) {
        self.paragraphs.push(self.current.take().unwrap_or_default());
    }

    fn text(mut self) -> String {
        if let Some(rest) = self.current.take() {
            self.paragraphs.push(rest);
        }
        self.paragraphs.join("\n")
    }
}

/// Streaming state while walking document.xml
#[derive(Debug, Default)]
struct TableCollector {
    tables: Vec<DocxTable>,
    /// w:tbl nesting depth; only depth 1 is collected
    depth: usize,
    textbox_depth: usize,
    rows: Vec<Vec<String>>,
    /// (text, grid span, vertical merge) for each cell of the row being read
    row: Vec<(String, usize, VerticalMerge)>,
    cell: Option<CellBuilder>,
    in_run: bool,
    in_text: bool,
}

impl TableCollector {
    fn top_level(&self) -> bool {
        self.depth == 1 && self.textbox_depth == 0
    }

    fn start(&mut self, e: &BytesStart<'_>, decoder: Decoder) -> Result<(), DocxError> {
        let name = e.name();
        if name == TAG_TEXTBOX {
            self.textbox_depth += 1;
            return Ok(());
        }
        if self.textbox_depth > 0 {
            return Ok(());
        }
        if name == TAG_TABLE {
            self.depth += 1;
            if self.depth == 1 {
                self.rows.clear();
            }
            return Ok(());
        }
        if !self.top_level() {
            return Ok(());
        }

        if name == TAG_ROW {
            self.row.clear();
        } else if name == TAG_CELL {
            self.cell = Some(CellBuilder::new());
        } else if let Some(cell) = self.cell.as_mut() {
            if name == TAG_GRID_SPAN {
                cell.grid_span = attribute(e, "w:val", decoder)?
                    .and_then(|v| v.parse().ok())
                    .filter(|span| *span > 0)
                    .unwrap_or(1);
            } else if name == TAG_VERTICAL_MERGE {
                cell.vertical_merge = match attribute(e, "w:val", decoder)?.as_deref() {
                    Some("restart") => VerticalMerge::Restart,
                    _ => VerticalMerge::Continue,
                };
            } else if name == TAG_PARAGRAPH {
                cell.current = Some(String::new());
            } else if name == TAG_RUN {
                self.in_run = true;
            } else if name == TAG_TEXT && self.in_run {
                self.in_text = true;
            } else if name == TAG_TAB && self.in_run {
                cell.push_str("\t");
            } else if (name == TAG_BREAK || name == TAG_CARRIAGE_RETURN) && self.in_run {
                cell.push_str("\n");
            }
        }
        Ok(())
    }

    fn end(&mut self, name: QName<'_>) {
        if name == TAG_TEXTBOX {
            self.textbox_depth = self.textbox_depth.saturating_sub(1);
            return;
        }
        if self.textbox_depth > 0 {
            return;
        }
        if name == TAG_TABLE {
            if self.depth == 1 {
                let rows = std::mem::take(&mut self.rows);
                self.tables.push(DocxTable::from_rows(rows));
            }
            self.depth = self.depth.saturating_sub(1);
            return;
        }
        if !self.top_level() {
            return;
        }

        if name == TAG_ROW {
            let grid = self.expand_row();
            self.rows.push(grid);
        } else if name == TAG_CELL {
            if let Some(cell) = self.cell.take() {
                let span = cell.grid_span;
                let merge = cell.vertical_merge;
                self.row.push((cell.text(), span, merge));
            }
        } else if name == TAG_PARAGRAPH {
            if let Some(cell) = self.cell.as_mut() {
                cell.end_paragraph();
            }
        } else if name == TAG_RUN {
            self.in_run = false;
        } else if name == TAG_TEXT {
            self.in_text = false;
        }
    }

    /// Lay the row's cells out on the table grid
    fn expand_row(&mut self) -> Vec<String> {
        let previous = self.rows.last();
        let mut grid = Vec::new();
        for (text, span, merge) in self.row.drain(..) {
            let text = match merge {
                VerticalMerge::Continue => previous
                    .and_then(|row| row.get(grid.len()))
                    .cloned()
                    .unwrap_or(text),
                VerticalMerge::None | VerticalMerge::Restart => text,
            };
            for _ in 0..span {
                grid.push(text.clone());
            }
        }
        grid
    }

    fn text(&mut self, text: &str) {
        if self.in_text && self.top_level() {
            if let Some(cell) = self.cell.as_mut() {
                cell.push_str(text);
            }
        }
    }

    fn reference(&mut self, bytes: &BytesRef<'_>) -> Result<(), DocxError> {
        if !(self.in_text && self.top_level()) {
            return Ok(());
        }
        let raw = bytes
            .xml_content()
            .map_err(|e| DocxError::Xml(e.to_string()))?;
        let resolved = resolve_reference(&raw)?;
        self.text(&resolved);
        Ok(())
    }
}

/// Resolve `&name;` or `&#NNN;` / `&#xHHH;` to its text
fn resolve_reference(raw: &str) -> Result<String, DocxError> {
    if let Some(number) = raw.strip_prefix('#') {
        let code = match number.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => number.parse::<u32>(),
        }
        .map_err(|_| DocxError::Entity(raw.to_string()))?;
        return Ok(std::char::from_u32(code)
            .map(String::from)
            .unwrap_or_default());
    }
    resolve_xml_entity(raw)
        .map(str::to_string)
        .ok_or_else(|| DocxError::Entity(raw.to_string()))
}

fn attribute(
    e: &BytesStart<'_>,
    key: &str,
    decoder: Decoder,
) -> Result<Option<String>, DocxError> {
    let attr = e
        .try_get_attribute(key)
        .map_err(|err| DocxError::Xml(err.to_string()))?;
    attr.map(|a| {
        a.decode_and_unescape_value(decoder)
            .map(|v| v.into_owned())
            .map_err(|err| DocxError::Xml(err.to_string()))
    })
    .transpose()
}

/// Collect the top-level tables of a `word/document.xml` stream
pub(crate) fn parse_document_xml<R: BufRead>(input: R) -> Result<Vec<DocxTable>, DocxError> {
    let mut reader = Reader::from_reader(input);
    let config = reader.config_mut();
    config.expand_empty_elements = true;
    config.check_end_names = false;
    config.trim_text(false);

    let mut collector = TableCollector::default();
    let mut buffer = Vec::with_capacity(1024);
    loop {
        buffer.clear();
        let event = reader
            .read_event_into(&mut buffer)
            .map_err(|e| DocxError::Xml(e.to_string()))?;
        match event {
            Event::Eof => break,
            Event::Start(ref e) => collector.start(e, reader.decoder())?,
            Event::End(ref e) => collector.end(e.name()),
            Event::Text(ref t) => {
                let text = t.xml_content().map_err(|e| DocxError::Xml(e.to_string()))?;
                collector.text(&text);
            }
            Event::GeneralRef(ref r) => collector.reference(r)?,
            _ => (),
        }
    }

    Ok(collector.tables)
}

//! Shared fixtures: contract documents, ledgers and a stand-in converter
#![allow(dead_code)]

use contract_ledger::config::Config;
use contract_ledger::contract::{converted_path, DocumentConverter};
use contract_ledger::ledger::{create_ledger_template, ColumnMap};
use contract_ledger::{LedgerError, LedgerResult};
use std::cell::RefCell;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const SHEET: &str = "订单2020";

/// OLE2 signature, enough for a file to pass as a legacy .doc
pub const CFB_HEADER: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn table_xml(rows: &[Vec<&str>]) -> String {
    let mut xml = String::from("<w:tbl>");
    for row in rows {
        xml.push_str("<w:tr>");
        for cell in row {
            xml.push_str(&format!(
                "<w:tc><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:tc>",
                escape(cell)
            ));
        }
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
    xml
}

/// A .docx package holding the given tables, separated by a paragraph
pub fn docx_bytes(tables: &[Vec<Vec<&str>>]) -> Vec<u8> {
    let mut body = String::from("<w:p><w:r><w:t>购销合同</w:t></w:r></w:p>");
    for table in tables {
        body.push_str(&table_xml(table));
        body.push_str("<w:p/>");
    }
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("word/document.xml", document.as_str()),
    ] {
        zip.start_file(name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Header row, the given order rows, then a totals row
pub fn order_table<'a>(orders: &[[&'a str; 7]]) -> Vec<Vec<&'a str>> {
    let mut rows = vec![vec!["品名", "牌号", "规格", "单位", "数量", "单价", "金额"]];
    rows.extend(orders.iter().map(|order| order.to_vec()));
    rows.push(vec!["合计", "", "", "", "", "", ""]);
    rows
}

pub fn steel_order() -> [&'static str; 7] {
    ["圆钢", "45#", "Φ20", "吨", "2", "4,500", "9,000"]
}

pub fn pipe_order() -> [&'static str; 7] {
    ["钢管", "Q235", "DN50", "米", "120", "35.5", "4260"]
}

/// Write a .docx contract with one order table and return its path
pub fn write_docx_contract(dir: &Path, name: &str, orders: &[[&str; 7]]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, docx_bytes(&[order_table(orders)])).unwrap();
    path
}

/// Write a stand-in legacy .doc (only the signature is real)
pub fn write_doc_contract(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let mut bytes = CFB_HEADER.to_vec();
    bytes.extend_from_slice(&[0u8; 504]);
    fs::write(&path, bytes).unwrap();
    path
}

/// Create a ledger with the standard account form header
pub fn write_ledger(dir: &Path) -> PathBuf {
    let path = dir.join("A1账目.xlsx");
    create_ledger_template(&path, SHEET, &ColumnMap::default()).unwrap();
    path
}

/// Config rooted at `dir` using the standard layout
pub fn config_in(dir: &Path, prefix: &str) -> Config {
    let yaml = format!(
        "\
general:
  log_file: contract-ledger.log
source:
  prefix: \"{}\"
  converter: disabled
destination:
  ledger: A1账目.xlsx
  sheet: {}
",
        prefix, SHEET
    );
    Config::from_yaml(&yaml, dir).unwrap()
}

/// Converter writing a prepared .docx next to the source, like soffice does
pub struct StubConverter {
    docx: Vec<u8>,
    pub calls: RefCell<Vec<PathBuf>>,
}

impl StubConverter {
    pub fn new(docx: Vec<u8>) -> Self {
        Self {
            docx,
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl DocumentConverter for StubConverter {
    fn convert(&self, source: &Path) -> LedgerResult<PathBuf> {
        self.calls.borrow_mut().push(source.to_path_buf());
        let target = converted_path(source);
        fs::write(&target, &self.docx)?;
        Ok(target)
    }
}

/// Converter that always fails
pub struct BrokenConverter;

impl DocumentConverter for BrokenConverter {
    fn convert(&self, source: &Path) -> LedgerResult<PathBuf> {
        Err(LedgerError::Conversion {
            path: source.to_path_buf(),
            reason: "office tool exited with status 1".to_string(),
        })
    }
}

/// All .docx files left in `dir`
pub fn docx_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "docx"))
        .collect();
    files.sort();
    files
}

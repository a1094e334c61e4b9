//! Contract documents: file name convention, legacy conversion and order tables

mod convert;
mod docx;
mod extractor;
mod filename;

pub use convert::{
    converted_path, is_legacy_document, ConvertedDocument, DisabledConverter, DocumentConverter,
    OfficeConverter, OfficeTool, LEGACY_EXTENSION, MODERN_EXTENSION,
};
pub use docx::{read_tables, DocxTable};
pub use extractor::{extract_orders, ContractReader, TableLayout, ORDER_CELLS};
pub use filename::{parse_contract_filename, parse_contract_stem};

pub(crate) use convert::has_extension;

//! DocumentReader: lazy text access for discovered input items.

use serde_json::Value;

use super::sanitize::sanitize_extracted_text;
use super::{ExtractionError, PdfExtractor};
use crate::models::SourceKind;
use crate::pipeline::import::{Corpus, InputItem, MAX_FILE_SIZE};

/// Record fields searched for text, in priority order.
pub const TEXT_FIELDS: [&str; 4] = ["text", "content", "texto_completo", "description"];
const TITLE_FIELDS: [&str; 2] = ["title", "titulo"];

/// Raw material for one document result.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceText {
    pub text: String,
    pub title: String,
    pub original_data: Option<Value>,
}

pub struct DocumentReader {
    pdf: Box<dyn PdfExtractor>,
}

impl DocumentReader {
    pub fn new(pdf: Box<dyn PdfExtractor>) -> Self {
        Self { pdf }
    }

    /// Fetch the text of `item`. Any error, or text that is blank, fails the
    /// document.
    pub fn read(&self, item: &InputItem, corpus: &Corpus) -> Result<SourceText, ExtractionError> {
        let source = match item.source_kind {
            SourceKind::Pdf => self.read_pdf(item)?,
            SourceKind::JsonRecord => {
                let index = item.record_index.ok_or(ExtractionError::MissingRecord(0))?;
                let record = corpus
                    .record(index)
                    .ok_or(ExtractionError::MissingRecord(index))?;
                read_record(record, &item.document_id)?
            }
        };

        if source.text.trim().is_empty() {
            return Err(ExtractionError::EmptyText);
        }
        Ok(source)
    }

    fn read_pdf(&self, item: &InputItem) -> Result<SourceText, ExtractionError> {
        let size = std::fs::metadata(&item.path)?.len();
        if size > MAX_FILE_SIZE {
            return Err(ExtractionError::FileTooLarge {
                size_mb: size as f64 / (1024.0 * 1024.0),
                max_mb: MAX_FILE_SIZE / (1024 * 1024),
            });
        }

        let bytes = std::fs::read(&item.path)?;
        let pages = self.pdf.extract_pages(&bytes)?;
        tracing::debug!(document_id = %item.document_id, pages = pages.len(), "PDF text extracted");

        let raw = pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(SourceText {
            text: sanitize_extracted_text(&raw),
            title: item
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| item.document_id.clone()),
            original_data: None,
        })
    }
}

fn read_record(record: &Value, document_id: &str) -> Result<SourceText, ExtractionError> {
    let object = record.as_object().ok_or(ExtractionError::InvalidRecord)?;

    let text = TEXT_FIELDS
        .iter()
        .filter_map(|field| object.get(*field).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
        .ok_or(ExtractionError::MissingText)?;

    let title = TITLE_FIELDS
        .iter()
        .filter_map(|field| object.get(*field).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
        .unwrap_or(document_id);

    Ok(SourceText {
        text: text.to_string(),
        title: title.to_string(),
        original_data: Some(record.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::PageText;
    use serde_json::json;
    use std::path::Path;

    /// Treats the file bytes as the page text.
    struct Utf8Pdf;

    impl PdfExtractor for Utf8Pdf {
        fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageText>, ExtractionError> {
            Ok(vec![PageText {
                page_number: 1,
                text: String::from_utf8_lossy(pdf_bytes).into_owned(),
            }])
        }
    }

    fn reader() -> DocumentReader {
        DocumentReader::new(Box::new(Utf8Pdf))
    }

    #[test]
    fn json_text_field_priority() {
        let corpus = Corpus::from_records(
            Path::new("c.json"),
            vec![json!({"_id": "a", "text": "  ", "content": "Brasil colonial", "description": "x"})],
        );
        let source = reader().read(&corpus.items[0], &corpus).unwrap();
        assert_eq!(source.text, "Brasil colonial");
        assert_eq!(source.title, "a");
        assert!(source.original_data.is_some());
    }

    #[test]
    fn json_title_falls_back_to_titulo() {
        let corpus = Corpus::from_records(
            Path::new("c.json"),
            vec![json!({"_id": "a", "titulo": "Carta", "texto_completo": "texto"})],
        );
        let source = reader().read(&corpus.items[0], &corpus).unwrap();
        assert_eq!(source.title, "Carta");
        assert_eq!(source.text, "texto");
    }

    #[test]
    fn record_without_text_fails() {
        let corpus =
            Corpus::from_records(Path::new("c.json"), vec![json!({"_id": "a", "title": "t"})]);
        assert!(matches!(
            reader().read(&corpus.items[0], &corpus),
            Err(ExtractionError::MissingText)
        ));
    }

    #[test]
    fn non_object_record_fails() {
        let corpus = Corpus::from_records(Path::new("c.json"), vec![json!("just a string")]);
        assert!(matches!(
            reader().read(&corpus.items[0], &corpus),
            Err(ExtractionError::InvalidRecord)
        ));
    }

    #[test]
    fn pdf_text_is_sanitized_and_titled_by_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("carta_1654.pdf");
        std::fs::write(&path, "  Recife\x01\n\n1654  ").unwrap();
        let corpus = Corpus::discover(dir.path()).unwrap();

        let source = reader().read(&corpus.items[0], &corpus).unwrap();
        assert_eq!(source.text, "Recife\n1654");
        assert_eq!(source.title, "carta_1654");
        assert!(source.original_data.is_none());
    }

    #[test]
    fn blank_pdf_text_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blank.pdf"), " \n\x02 ").unwrap();
        let corpus = Corpus::discover(dir.path()).unwrap();
        assert!(matches!(
            reader().read(&corpus.items[0], &corpus),
            Err(ExtractionError::EmptyText)
        ));
    }

    #[test]
    fn vanished_pdf_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.pdf");
        std::fs::write(&path, "x").unwrap();
        let corpus = Corpus::discover(dir.path()).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            reader().read(&corpus.items[0], &corpus),
            Err(ExtractionError::Io(_))
        ));
    }
}

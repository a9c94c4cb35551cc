// Document Extraction Service
// Pulls plain text out of uploaded PDF, Word and text files

use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_DOC: &str = "application/msword";
pub const MIME_TXT: &str = "text/plain";

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Unsupported document type: {0}")]
    UnsupportedType(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("Word extraction failed: {0}")]
    Word(String),
    #[error("Not enough text extracted ({0} characters)")]
    InsufficientText(usize),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    /// Legacy binary Word. Only readable when the file is in fact OOXML.
    Doc,
    PlainText,
}

impl DocumentKind {
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            MIME_PDF => Some(Self::Pdf),
            MIME_DOCX => Some(Self::Docx),
            MIME_DOC => Some(Self::Doc),
            MIME_TXT => Some(Self::PlainText),
            _ => None,
        }
    }

    /// Case-insensitive file extension lookup; `None` for anything else.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "doc" => Some(Self::Doc),
            "txt" => Some(Self::PlainText),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => MIME_PDF,
            Self::Docx => MIME_DOCX,
            Self::Doc => MIME_DOC,
            Self::PlainText => MIME_TXT,
        }
    }
}

/// Raw extracted text, not normalized
pub fn extract_text(mime_type: &str, bytes: &[u8]) -> Result<String, ExtractionError> {
    let kind = DocumentKind::from_mime(mime_type)
        .ok_or_else(|| ExtractionError::UnsupportedType(mime_type.to_string()))?;

    let text = match kind {
        DocumentKind::Pdf => extract_pdf(bytes)?,
        DocumentKind::Docx | DocumentKind::Doc => extract_word(bytes)?,
        DocumentKind::PlainText => String::from_utf8_lossy(bytes).into_owned(),
    };

    debug!(kind = ?kind, bytes = bytes.len(), chars = text.chars().count(), "extraction.done");
    Ok(text)
}

pub fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractionError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractionError::Pdf(e.to_string()))
}

/// DOCX through docx-rs, falling back to reading `word/document.xml` directly
pub fn extract_word(bytes: &[u8]) -> Result<String, ExtractionError> {
    match docx_rs::read_docx(bytes) {
        Ok(docx) => Ok(docx_paragraphs(&docx).join("\n")),
        Err(e) => {
            warn!("[EXTRACT] docx reader failed ({:?}), trying raw document.xml", e);
            extract_document_xml(bytes)
        }
    }
}

fn docx_paragraphs(docx: &docx_rs::Docx) -> Vec<String> {
    use docx_rs::{DocumentChild, ParagraphChild, RunChild};

    let mut paragraphs = Vec::new();
    for child in &docx.document.children {
        let DocumentChild::Paragraph(paragraph) = child else {
            continue;
        };
        let mut line = String::new();
        for p_child in &paragraph.children {
            let ParagraphChild::Run(run) = p_child else {
                continue;
            };
            for r_child in &run.children {
                match r_child {
                    RunChild::Text(t) => line.push_str(&t.text),
                    RunChild::Tab(_) => line.push('\t'),
                    RunChild::Break(_) => line.push('\n'),
                    _ => {}
                }
            }
        }
        paragraphs.push(line);
    }
    paragraphs
}

fn paragraph_end_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"</w:p>|<w:br[^>]*/>").expect("paragraph end regex"))
}

fn tab_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<w:tab[^>]*/>").expect("tab regex"))
}

fn xml_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("xml tag regex"))
}

fn extract_document_xml(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::Word(format!("not a Word archive: {}", e)))?;
    let mut entry = archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractionError::Word(format!("missing word/document.xml: {}", e)))?;

    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::Word(format!("unreadable document.xml: {}", e)))?;

    Ok(document_xml_to_text(&xml))
}

/// Strip WordprocessingML markup, keeping paragraph breaks and tabs
pub fn document_xml_to_text(xml: &str) -> String {
    let s = paragraph_end_re().replace_all(xml, "\n");
    let s = tab_re().replace_all(&s, "\t");
    let s = xml_tag_re().replace_all(&s, "");
    unescape_xml(&s)
}

fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

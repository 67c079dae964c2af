//! Document ingestion: raw bytes to narrative text plus table metrics.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::schema::Metric;

/// Text and measurements pulled out of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub text: String,
    pub metrics: Vec<Metric>,
}

/// Turns an uploaded document into plain text and metrics.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(&self, bytes: &[u8]) -> PipelineResult<ExtractedDocument>;
}

/// Extractor that picks the PDF or text path from the document's magic bytes.
///
/// PDF input (`%PDF`) goes to [`PdfExtractor`]; everything else is treated as
/// UTF-8 text by [`TextExtractor`].
#[derive(Debug, Clone, Default)]
pub struct AutoExtractor {
    pdf: PdfExtractor,
    text: TextExtractor,
}

impl AutoExtractor {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentExtractor for AutoExtractor {
    async fn extract(&self, bytes: &[u8]) -> PipelineResult<ExtractedDocument> {
        if is_pdf(bytes) {
            self.pdf.extract(bytes).await
        } else {
            self.text.extract(bytes).await
        }
    }
}

/// Extractor for PDF documents, backed by `pdf-extract`.
///
/// Page text is concatenated in reading order and then scanned for tables
/// with the same rule as [`TextExtractor`].
#[derive(Debug, Clone, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentExtractor for PdfExtractor {
    async fn extract(&self, bytes: &[u8]) -> PipelineResult<ExtractedDocument> {
        if !is_pdf(bytes) {
            return Err(PipelineError::Ingestion {
                message: "Document is not a PDF".to_string(),
            });
        }

        // Parsing is CPU-bound and may panic on malformed files
        let owned = bytes.to_vec();
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&owned))
            .await
            .map_err(|e| PipelineError::Ingestion {
                message: format!("PDF extraction aborted: {}", e),
            })?
            .map_err(|e| PipelineError::Ingestion {
                message: format!("Failed to extract PDF text: {}", e),
            })?;

        document_from_text(&text, "pdf")
    }
}

/// Extractor for UTF-8 text documents (plain text, markdown, TSV).
///
/// Tables are pipe- or tab-delimited blocks of consecutive lines. The first
/// row of a block is the header; in each later row the first cell names the
/// region and every numeric cell becomes a metric named by its column.
#[derive(Debug, Clone, Default)]
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentExtractor for TextExtractor {
    async fn extract(&self, bytes: &[u8]) -> PipelineResult<ExtractedDocument> {
        if is_pdf(bytes) {
            return Err(PipelineError::Ingestion {
                message: "PDF documents are not supported by the text extractor".to_string(),
            });
        }

        let text = std::str::from_utf8(bytes).map_err(|e| PipelineError::Ingestion {
            message: format!("Document is not valid UTF-8 text: {}", e),
        })?;

        document_from_text(text, "text")
    }
}

fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF")
}

fn document_from_text(text: &str, format: &'static str) -> PipelineResult<ExtractedDocument> {
    let text = text.trim();
    if text.is_empty() {
        return Err(PipelineError::Ingestion {
            message: "No text could be extracted from document".to_string(),
        });
    }

    let metrics = extract_table_metrics(text);
    debug!(
        format,
        chars = text.len(),
        metrics = metrics.len(),
        "Document extracted"
    );

    Ok(ExtractedDocument {
        text: text.to_string(),
        metrics,
    })
}

fn extract_table_metrics(text: &str) -> Vec<Metric> {
    let mut metrics = Vec::new();
    let mut block: Vec<Vec<String>> = Vec::new();

    for line in text.lines() {
        match split_row(line) {
            Some(cells) if is_separator_row(&cells) => {}
            Some(cells) => block.push(cells),
            None => {
                metrics.extend(metrics_from_block(&block));
                block.clear();
            }
        }
    }
    metrics.extend(metrics_from_block(&block));

    metrics
}

/// Split a table row into trimmed cells; `None` if the line is not a row.
fn split_row(line: &str) -> Option<Vec<String>> {
    let trimmed = line.trim();
    let delimiter = if trimmed.contains('|') {
        '|'
    } else if line.contains('\t') {
        '\t'
    } else {
        return None;
    };

    let inner = trimmed.trim_matches('|');
    let cells: Vec<String> = inner.split(delimiter).map(|c| c.trim().to_string()).collect();

    (cells.len() >= 2).then_some(cells)
}

fn is_separator_row(cells: &[String]) -> bool {
    cells
        .iter()
        .all(|c| !c.is_empty() && c.chars().all(|ch| matches!(ch, '-' | ':' | ' ')))
}

fn metrics_from_block(block: &[Vec<String>]) -> Vec<Metric> {
    let Some((header, rows)) = block.split_first() else {
        return Vec::new();
    };

    let mut metrics = Vec::new();
    for row in rows {
        let region = row.first().filter(|r| !r.is_empty()).cloned();

        for (name, cell) in header.iter().zip(row.iter()) {
            let Ok(value) = cell.parse::<f64>() else {
                continue;
            };
            if !value.is_finite() {
                continue;
            }
            metrics.push(Metric {
                name: name.clone(),
                region: region.clone(),
                value,
            });
        }
    }

    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_extracts_pipe_table_metrics() {
        let doc = "Quarterly results were mixed.\n\n\
                   | Region | Revenue | Churn |\n\
                   |--------|---------|-------|\n\
                   | North  | 120     | 4.5   |\n\
                   | South  | 95.5    | n/a   |\n\n\
                   Outlook remains cautious.";

        let extracted = TextExtractor::new().extract(doc.as_bytes()).await.unwrap();
        assert_eq!(
            extracted.metrics,
            vec![
                Metric::new("Revenue", 120.0).with_region("North"),
                Metric::new("Churn", 4.5).with_region("North"),
                Metric::new("Revenue", 95.5).with_region("South"),
            ]
        );
        assert!(extracted.text.starts_with("Quarterly results"));
    }

    #[tokio::test]
    async fn test_extracts_tab_separated_metrics() {
        let doc = "Team\tHeadcount\nOps\t14\nSales\t22\n";
        let extracted = TextExtractor::new().extract(doc.as_bytes()).await.unwrap();
        assert_eq!(extracted.metrics.len(), 2);
        assert_eq!(extracted.metrics[1], Metric::new("Headcount", 22.0).with_region("Sales"));
    }

    #[tokio::test]
    async fn test_plain_prose_has_no_metrics() {
        let extracted = TextExtractor::new()
            .extract(b"Sales grew 6% but churn rose")
            .await
            .unwrap();
        assert!(extracted.metrics.is_empty());
        assert_eq!(extracted.text, "Sales grew 6% but churn rose");
    }

    const QUARTERLY_PDF: &[u8] = include_bytes!("../../tests/fixtures/quarterly_report.pdf");
    const BLANK_PDF: &[u8] = include_bytes!("../../tests/fixtures/blank.pdf");

    #[tokio::test]
    async fn test_extracts_pdf_text() {
        let extracted = PdfExtractor::new().extract(QUARTERLY_PDF).await.unwrap();
        assert!(extracted.text.contains("Quarterly sales grew"));
        assert!(extracted.text.contains("churn rose"));
        assert!(extracted.text.contains("Revenue"));
    }

    #[tokio::test]
    async fn test_auto_extractor_routes_by_magic() {
        let auto = AutoExtractor::new();

        let pdf = auto.extract(QUARTERLY_PDF).await.unwrap();
        assert!(pdf.text.contains("Quarterly sales grew"));

        let text = auto.extract(b"Region\tRevenue\nNorth\t120\n").await.unwrap();
        assert_eq!(text.metrics, vec![Metric::new("Revenue", 120.0).with_region("North")]);
    }

    #[tokio::test]
    async fn test_rejects_textless_pdf() {
        let err = PdfExtractor::new().extract(BLANK_PDF).await.unwrap_err();
        assert!(matches!(err, PipelineError::Ingestion { .. }));
    }

    #[tokio::test]
    async fn test_rejects_corrupt_pdf() {
        let err = AutoExtractor::new()
            .extract(b"%PDF-1.7 truncated")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Ingestion { .. }));
    }

    #[tokio::test]
    async fn test_text_extractor_leaves_pdf_to_pdf_extractor() {
        let err = TextExtractor::new().extract(QUARTERLY_PDF).await.unwrap_err();
        assert!(err.to_string().contains("text extractor"));

        let err = PdfExtractor::new().extract(b"plain text").await.unwrap_err();
        assert!(err.to_string().contains("not a PDF"));
    }

    #[tokio::test]
    async fn test_rejects_invalid_utf8() {
        let err = TextExtractor::new().extract(&[0xff, 0xfe, 0x00]).await.unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }

    #[tokio::test]
    async fn test_rejects_blank_document() {
        let err = TextExtractor::new().extract(b"   \n\n").await.unwrap_err();
        assert!(matches!(err, PipelineError::Ingestion { .. }));
    }
}

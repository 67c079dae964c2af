//! Paginated report rendering.

use serde::Serialize;

use crate::schema::{AnalysisResult, DebateTrace};

/// A rendered, paginated report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedDocument {
    pub pages: Vec<String>,
    pub media_type: &'static str,
}

impl RenderedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All pages joined with form feeds.
    pub fn to_text(&self) -> String {
        self.pages.join("\n\u{000C}\n")
    }
}

/// Turns a completed analysis into a presentable document.
pub trait ReportRenderer: Send + Sync {
    fn render(&self, result: &AnalysisResult, narrative: &str) -> RenderedDocument;
}

/// Markdown renderer with fixed-height pages.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    lines_per_page: usize,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self { lines_per_page: 60 }
    }
}

impl MarkdownRenderer {
    /// Body lines per page, excluding the footer. Values below 1 are raised to 1.
    pub fn with_lines_per_page(lines_per_page: usize) -> Self {
        Self {
            lines_per_page: lines_per_page.max(1),
        }
    }

    fn body(result: &AnalysisResult, narrative: &str) -> Vec<String> {
        let report = &result.final_report;
        let mut out = vec![
            "# AETHER Analysis Report".to_string(),
            String::new(),
            format!("**Confidence score:** {:.1} / 100", report.confidence_score()),
            String::new(),
            "## Executive Summary".to_string(),
            String::new(),
        ];

        let mut section = |title: &str, text: &str| {
            if text.trim().is_empty() {
                return;
            }
            out.push(format!("### {}", title));
            out.extend(text.lines().map(str::to_string));
            out.push(String::new());
        };
        section("What Worked", &report.what_worked);
        section("What Failed", &report.what_failed);
        section("Why It Happened", &report.why_it_happened);
        section("How to Improve", &report.how_to_improve);
        section("Synthesis", &report.synthesis);
        section("Recommendation", &report.recommendation);

        out.push("## Factor Debates".to_string());
        out.push(String::new());
        for trace in &result.debate_logs {
            out.extend(Self::trace_lines(trace));
        }

        out.push("## Source Narrative".to_string());
        out.push(String::new());
        out.extend(narrative.lines().map(|l| format!("> {}", l)));

        out
    }

    fn trace_lines(trace: &DebateTrace) -> Vec<String> {
        let mut lines = vec![
            format!(
                "### {} ({})",
                trace.factor_id,
                trace.factor.domain.display_name()
            ),
            trace.factor.description.clone(),
            String::new(),
            format!("**Support ({})**", trace.support_count()),
        ];
        for arg in &trace.support.support_arguments {
            lines.push(format!("- {}", arg.claim));
            lines.push(format!("  - Evidence: {}", arg.evidence));
            lines.push(format!("  - Assumption: {}", arg.assumption));
        }
        lines.push(String::new());

        lines.push(format!("**Opposition ({})**", trace.opposition_count()));
        for arg in &trace.opposition.counter_arguments {
            lines.push(format!("- Re: {}", arg.target_claim));
            lines.push(format!("  - Challenge: {}", arg.challenge));
            lines.push(format!("  - Risk: {}", arg.risk));
        }
        lines.push(String::new());

        lines
    }
}

impl ReportRenderer for MarkdownRenderer {
    fn render(&self, result: &AnalysisResult, narrative: &str) -> RenderedDocument {
        let body = Self::body(result, narrative);
        let chunks: Vec<&[String]> = body.chunks(self.lines_per_page).collect();
        let total = chunks.len();

        let pages = chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| {
                let mut page = chunk.join("\n");
                page.push_str(&format!("\n\n---\nPage {} of {}", i + 1, total));
                page
            })
            .collect();

        RenderedDocument {
            pages,
            media_type: "text/markdown",
        }
    }
}

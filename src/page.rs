// src/page.rs

use askama::Template;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::chart::{Chart, DEFAULT_SIZE};
use crate::error::DashboardError;
use crate::process::PipelineOutput;

pub const PAGE_TITLE: &str = "Global Electricity Production Data";

const INTRO: &str = "This page shows a simple trend of **global electricity production over time**. \
Data is loaded directly from the repository, cleaned by dropping missing values, \
and aggregated by year before plotting.";

const SOURCE_CAPTION: &str = "Data source: GitHub • \
[electricity-analysis / data/raw/global_electricity_production_data.csv]\
(https://www.kaggle.com/datasets/sazidthe1/global-electricity-production)";

const EXPANDER_LABEL: &str = "What happens under the hood?";

const CLEANING_STEPS: &[&str] = &[
    "Drop rows with missing `value`.",
    "Parse `date` to a calendar date; drop rows where parsing fails.",
    "Create a `year` column from `date`.",
    "Group by `year` and sum `value` to plot the trend.",
];

const FALLBACK_UNIT: &str = "GWh";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Warning,
    Error,
}

/// One piece of page content, in display order.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Title(String),
    Markdown(String),
    Caption(String),
    Bullets(Vec<String>),
    Chart(Chart),
    Message { kind: MessageKind, text: String },
    Expander { label: String, items: Vec<String> },
}

/// Everything shown for one render. Text blocks carry light markup:
/// `**bold**`, `` `code` `` and `[label](href)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub blocks: Vec<Block>,
}

impl Page {
    /// Lay out the result of one pipeline run. Fetch failures and empty data
    /// replace the stats and chart with a message; the rest of the page stays.
    pub fn build(outcome: &Result<PipelineOutput, DashboardError>) -> Self {
        let mut blocks = vec![
            Block::Title(PAGE_TITLE.to_string()),
            Block::Markdown(INTRO.to_string()),
            Block::Caption(SOURCE_CAPTION.to_string()),
        ];

        match outcome {
            Ok(out) => {
                let unit = out.unit.as_deref().unwrap_or(FALLBACK_UNIT);
                blocks.push(Block::Bullets(vec![
                    format!(
                        "**Years covered:** {}–{}",
                        out.stats.min_year, out.stats.max_year
                    ),
                    format!("**Rows used after cleaning:** {}", out.stats.rows),
                    format!(
                        "**Unit:** values reported in the `unit` column (typically {}).",
                        unit
                    ),
                ]));
                blocks.push(Block::Chart(out.chart.clone()));
            }
            Err(DashboardError::EmptyDataset(e)) => blocks.push(Block::Message {
                kind: MessageKind::Warning,
                text: format!(
                    "No usable rows remained after cleaning ({} rows read), so there is nothing to chart.",
                    e.raw_rows
                ),
            }),
            Err(DashboardError::DataFetch(e)) => blocks.push(Block::Message {
                kind: MessageKind::Error,
                text: format!("Could not load the electricity dataset: {}", e),
            }),
            Err(e @ DashboardError::Processing(_)) => blocks.push(Block::Message {
                kind: MessageKind::Error,
                text: format!("Could not process the electricity dataset: {}", e),
            }),
        }

        blocks.push(Block::Expander {
            label: EXPANDER_LABEL.to_string(),
            items: CLEANING_STEPS.iter().map(|s| s.to_string()).collect(),
        });

        Self { blocks }
    }

    pub fn has_chart(&self) -> bool {
        self.blocks.iter().any(|b| matches!(b, Block::Chart(_)))
    }

    /// Self-contained HTML document; the chart is inlined as SVG.
    pub fn to_html(&self) -> Result<String, askama::Error> {
        PageTemplate {
            title: PAGE_TITLE,
            sections: self.blocks.iter().map(Section::from_block).collect(),
        }
        .render()
    }
}

#[derive(Template)]
#[template(path = "page.html")]
struct PageTemplate<'a> {
    title: &'a str,
    sections: Vec<Section<'a>>,
}

/// A block as the template draws it: markup split into spans, chart drawn.
enum Section<'a> {
    Heading(&'a str),
    Paragraph(&'static str, Vec<Span<'a>>),
    List(Vec<Vec<Span<'a>>>),
    Figure(String),
    Alert(&'static str, String),
    Details(&'a str, Vec<Vec<Span<'a>>>),
}

impl<'a> Section<'a> {
    fn from_block(block: &'a Block) -> Self {
        match block {
            Block::Title(t) => Section::Heading(t),
            Block::Markdown(md) => Section::Paragraph("intro", spans(md)),
            Block::Caption(c) => Section::Paragraph("caption", spans(c)),
            Block::Bullets(items) => Section::List(items.iter().map(|i| spans(i)).collect()),
            Block::Chart(chart) => match chart.to_svg(DEFAULT_SIZE) {
                Ok(svg) => Section::Figure(svg),
                Err(e) => {
                    warn!(error = %e, "chart could not be drawn");
                    Section::Alert("error", format!("The chart could not be drawn: {}", e))
                }
            },
            Block::Message { kind, text } => {
                let class = match kind {
                    MessageKind::Warning => "warning",
                    MessageKind::Error => "error",
                };
                Section::Alert(class, text.clone())
            }
            Block::Expander { label, items } => {
                Section::Details(label, items.iter().map(|i| spans(i)).collect())
            }
        }
    }
}

/// A run of text with at most one inline style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Span<'a> {
    Text(&'a str),
    Strong(&'a str),
    Code(&'a str),
    Link(&'a str, &'a str),
}

static MARKUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\*\*(?P<strong>.+?)\*\*|`(?P<code>[^`]+)`|\[(?P<label>[^\]]+)\]\((?P<href>[^)\s]+)\)",
    )
    .expect("markup regex should compile")
});

/// Split `**bold**`, `` `code` `` and `[label](href)` out of plain text.
fn spans(text: &str) -> Vec<Span<'_>> {
    let mut out = Vec::new();
    let mut last = 0;
    for caps in MARKUP.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            out.push(Span::Text(&text[last..whole.start()]));
        }
        let span = if let Some(m) = caps.name("strong") {
            Span::Strong(m.as_str())
        } else if let Some(m) = caps.name("code") {
            Span::Code(m.as_str())
        } else if let (Some(label), Some(href)) = (caps.name("label"), caps.name("href")) {
            Span::Link(label.as_str(), href.as_str())
        } else {
            Span::Text(whole.as_str())
        };
        out.push(span);
        last = whole.end();
    }
    if last < text.len() {
        out.push(Span::Text(&text[last..]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DataFetchError, EmptyDatasetError};
    use crate::process::{
        aggregate::{SummaryStats, YearlyAggregate},
        PipelineOutput,
    };

    fn output() -> PipelineOutput {
        let yearly: YearlyAggregate = vec![(2020, 150.0), (2021, 200.0)].into_iter().collect();
        PipelineOutput {
            chart: Chart::from_yearly(&yearly),
            yearly,
            stats: SummaryStats {
                min_year: 2020,
                max_year: 2021,
                rows: 3,
            },
            unit: Some("GWh".into()),
        }
    }

    #[test]
    fn test_success_layout() {
        let page = Page::build(&Ok(output()));
        assert!(page.has_chart());
        assert_eq!(page.blocks[0], Block::Title(PAGE_TITLE.into()));
        assert!(matches!(page.blocks.last(), Some(Block::Expander { items, .. }) if items.len() == 4));

        let Block::Bullets(stats) = &page.blocks[3] else {
            panic!("expected stats bullets, got {:?}", page.blocks[3]);
        };
        assert_eq!(stats[0], "**Years covered:** 2020–2021");
        assert_eq!(stats[1], "**Rows used after cleaning:** 3");
        assert!(stats[2].contains("(typically GWh)"));
    }

    #[test]
    fn test_empty_dataset_shows_message_not_chart() {
        let page = Page::build(&Err(EmptyDatasetError { raw_rows: 2 }.into()));
        assert!(!page.has_chart());
        assert!(!page.blocks.iter().any(|b| matches!(b, Block::Bullets(_))));
        assert!(page.blocks.iter().any(|b| matches!(
            b,
            Block::Message { kind: MessageKind::Warning, text } if text.contains("2 rows read")
        )));
    }

    #[test]
    fn test_fetch_failure_shows_error() {
        let err = DataFetchError::Timeout {
            url: "https://example.com/x.csv".into(),
        };
        let page = Page::build(&Err(err.into()));
        assert!(!page.has_chart());
        let html = page.to_html().unwrap();
        assert!(html.contains("class=\"message error\""));
        assert!(html.contains("Could not load the electricity dataset: request to https://example.com/x.csv timed out"));
        assert!(!html.contains("<svg"));
    }

    #[test]
    fn test_html_contains_everything() {
        let html = Page::build(&Ok(output())).to_html().unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>Global Electricity Production Data</h1>"));
        assert!(html.contains("<strong>global electricity production over time</strong>"));
        assert!(html.contains(
            r#"<a href="https://www.kaggle.com/datasets/sazidthe1/global-electricity-production">"#
        ));
        assert!(html.contains("<li><strong>Years covered:</strong> 2020–2021</li>"));
        assert!(html.contains("<summary>What happens under the hood?</summary>"));
        assert!(html.contains("<li>Drop rows with missing <code>value</code>.</li>"));
        assert!(html.contains("<svg"));
    }

    #[test]
    fn test_spans_split_markup() {
        assert_eq!(
            spans("a **b** `c` [d](https://e.com)."),
            vec![
                Span::Text("a "),
                Span::Strong("b"),
                Span::Text(" "),
                Span::Code("c"),
                Span::Text(" "),
                Span::Link("d", "https://e.com"),
                Span::Text("."),
            ]
        );
        assert_eq!(spans("plain"), vec![Span::Text("plain")]);
        assert!(spans("").is_empty());
    }

    #[test]
    fn test_html_escapes_text() {
        let page = Page {
            blocks: vec![
                Block::Markdown("a <b> & **<i>** [x](https://e.com/?a=1&b=2)".into()),
                Block::Message {
                    kind: MessageKind::Error,
                    text: "bad <script>".into(),
                },
            ],
        };
        let html = page.to_html().unwrap();
        assert!(html.contains("a &lt;b&gt; &amp; <strong>&lt;i&gt;</strong>"));
        assert!(html.contains(r#"<a href="https://e.com/?a=1&amp;b=2">x</a>"#));
        assert!(html.contains("bad &lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_undrawable_chart_shows_message() {
        let chart = Chart::from_yearly(&vec![(2020, f64::INFINITY)].into_iter().collect());
        let page = Page {
            blocks: vec![Block::Chart(chart)],
        };
        let html = page.to_html().unwrap();
        assert!(!html.contains("<svg"));
        assert!(html.contains("The chart could not be drawn"));
    }
}

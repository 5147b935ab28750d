//! Report generation.
//!
//! This module renders statistics reports as Markdown, JSON, or HTML in
//! the layout of the dashboard stats widget.

use crate::models::{FactStats, Report, ReportMetadata, SnapshotReport, Stats};
use anyhow::Result;

/// Shown when a visualization has no fact column to compute statistics for.
pub const NO_FACT_COLUMN_MESSAGE: &str =
    "The selected visualization does not contain any fact column";

/// Rendering settings shared by the text formats.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Fixed number of decimal places (unset = shortest representation).
    pub precision: Option<usize>,
    /// Include source paths and value counts.
    pub include_details: bool,
}

impl From<&crate::config::ReportConfig> for RenderOptions {
    fn from(config: &crate::config::ReportConfig) -> Self {
        Self {
            precision: config.precision,
            include_details: config.include_details,
        }
    }
}

/// Format a statistic for display.
pub fn format_value(value: f64, precision: Option<usize>) -> String {
    match precision {
        Some(digits) => format!("{:.*}", digits, value),
        None => value.to_string(),
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, options: &RenderOptions) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", report.metadata.title));
    output.push_str(&generate_metadata_section(&report.metadata));

    for snapshot in &report.snapshots {
        output.push_str(&generate_snapshot_section(snapshot, options));
    }

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Snapshots:** {}\n", metadata.snapshots));
    if metadata.snapshots_failed > 0 {
        section.push_str(&format!("- **Failed:** {}\n", metadata.snapshots_failed));
    }
    section.push_str(&format!("- **Fact Columns:** {}\n", metadata.fact_columns));
    section.push_str(&format!(
        "- **Duration:** {:.3}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the section for a single snapshot.
fn generate_snapshot_section(snapshot: &SnapshotReport, options: &RenderOptions) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", snapshot.name));

    if options.include_details {
        section.push_str(&format!(
            "*Source: `{}` | Rows: {}*\n\n",
            snapshot.source, snapshot.row_count
        ));
    }

    if let Some(ref error) = snapshot.error {
        section.push_str(&format!("> ⚠️ **Error:** {}\n\n", error));
        return section;
    }

    let stats = match snapshot.stats {
        Some(ref stats) if !stats.is_empty() => stats,
        _ => {
            section.push_str(&format!("{}.\n\n", NO_FACT_COLUMN_MESSAGE));
            return section;
        }
    };

    if options.include_details {
        section.push_str("| Fact | Values | Average | Min | Min Attributes | Max | Max Attributes |\n");
        section.push_str("|:---|:---:|---:|---:|:---|---:|:---|\n");
    } else {
        section.push_str("| Fact | Average | Min | Min Attributes | Max | Max Attributes |\n");
        section.push_str("|:---|---:|---:|:---|---:|:---|\n");
    }

    for fact in stats {
        section.push_str(&generate_fact_row(fact, options));
    }
    section.push('\n');

    section
}

/// Generate one Markdown table row.
fn generate_fact_row(fact: &FactStats, options: &RenderOptions) -> String {
    let count = if options.include_details {
        format!(" {} |", fact.count)
    } else {
        String::new()
    };

    format!(
        "| {} |{} {} | {} | {} | {} | {} |\n",
        escape_markdown_cell(&fact.label),
        count,
        format_value(fact.avg.value, options.precision),
        format_value(fact.min.value, options.precision),
        escape_markdown_cell(&fact.min.attributes_label),
        format_value(fact.max.value, options.precision),
        escape_markdown_cell(&fact.max.attributes_label),
    )
}

/// Escape text for a single Markdown table cell.
///
/// Inline HTML is neutralized and line breaks become `<br>` so the cell
/// stays on one table row.
fn escape_markdown_cell(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '|' => escaped.push_str("\\|"),
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                escaped.push_str("<br>");
            }
            '\n' => escaped.push_str("<br>"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Escape text for inclusion in HTML.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render statistics in the stats widget markup.
///
/// Each fact gets a header followed by Average, Min and Max blocks; the
/// extremes also show the attribute labels of their row.
pub fn render_stats_html(stats: &Stats, precision: Option<usize>) -> String {
    if stats.is_empty() {
        return format!("<h1>{}</h1>", NO_FACT_COLUMN_MESSAGE);
    }

    let mut html = String::new();
    for fact in stats {
        html.push_str(&format!(
            "<div class=\"header\">{}</div>",
            escape_html(&fact.label)
        ));
        html.push_str("<div class=\"section\">");

        html.push_str("<div class=\"stat\">");
        html.push_str("<div class=\"header\">Average</div>");
        html.push_str(&format!(
            "<div class=\"content\">{}</div>",
            format_value(fact.avg.value, precision)
        ));
        html.push_str("</div>");

        for (name, stat) in [("Min", &fact.min), ("Max", &fact.max)] {
            html.push_str("<div class=\"stat\">");
            html.push_str(&format!("<div class=\"header\">{}</div>", name));
            html.push_str("<div class=\"content\">");
            html.push_str(&format!(
                "<div>{}</div>",
                escape_html(&stat.attributes_label)
            ));
            html.push_str(&format!(
                "<div>{}</div>",
                format_value(stat.value, precision)
            ));
            html.push_str("</div>");
            html.push_str("</div>");
        }

        html.push_str("</div>");
    }

    html
}

/// Generate an HTML report with one stats panel per snapshot.
pub fn generate_html_report(report: &Report, options: &RenderOptions) -> String {
    let title = escape_html(&report.metadata.title);
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", title));
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("<h1>{}</h1>\n", title));

    for snapshot in &report.snapshots {
        html.push_str(&format!(
            "<h2>{}</h2>\n<div class=\"vizDataStats\">",
            escape_html(&snapshot.name)
        ));

        match (&snapshot.error, &snapshot.stats) {
            (Some(error), _) => {
                html.push_str(&format!("<h1>{}</h1>", escape_html(error)));
            }
            (None, Some(stats)) => html.push_str(&render_stats_html(stats, options.precision)),
            (None, None) => {
                html.push_str(&format!("<h1>{}</h1>", NO_FACT_COLUMN_MESSAGE));
            }
        }

        html.push_str("</div>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AvgValue, StatValue};
    use chrono::Utc;

    fn revenue_stats() -> Stats {
        let mut stats = Stats::new();
        stats.push(FactStats {
            label: "Revenue".to_string(),
            column: 0,
            count: 3,
            min: StatValue {
                value: 10.0,
                attributes_label: "A".to_string(),
            },
            max: StatValue {
                value: 30.0,
                attributes_label: "<C>".to_string(),
            },
            avg: AvgValue {
                value: 50.0 / 3.0,
            },
        });
        stats
    }

    fn create_test_report() -> Report {
        Report {
            metadata: ReportMetadata {
                title: "Data Statistics".to_string(),
                generated_at: Utc::now(),
                snapshots: 3,
                snapshots_failed: 1,
                fact_columns: 1,
                duration_seconds: 0.25,
            },
            snapshots: vec![
                SnapshotReport::computed(
                    "Sales".to_string(),
                    "sales.json".to_string(),
                    4,
                    revenue_stats(),
                ),
                SnapshotReport::computed(
                    "Regions".to_string(),
                    "regions.json".to_string(),
                    2,
                    Stats::new(),
                ),
                SnapshotReport::failed(
                    "Broken".to_string(),
                    "broken.json".to_string(),
                    "fact column 'Cost' has no data".to_string(),
                ),
            ],
        }
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(10.0, None), "10");
        assert_eq!(format_value(50.0 / 3.0, None), "16.666666666666668");
        assert_eq!(format_value(50.0 / 3.0, Some(2)), "16.67");
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let options = RenderOptions {
            precision: Some(2),
            include_details: true,
        };
        let markdown = generate_markdown_report(&report, &options);

        assert!(markdown.contains("# Data Statistics"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("- **Failed:** 1"));
        assert!(markdown.contains("## Sales"));
        assert!(markdown.contains("| Revenue | 3 | 16.67 | 10.00 | A | 30.00 | &lt;C&gt; |"));
        assert!(markdown.contains(NO_FACT_COLUMN_MESSAGE));
        assert!(markdown.contains("fact column 'Cost' has no data"));
    }

    #[test]
    fn test_markdown_without_details() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report, &RenderOptions::default());

        assert!(!markdown.contains("Source:"));
        assert!(markdown.contains("| Revenue | 16.666666666666668 | 10 | A | 30 | &lt;C&gt; |"));
    }

    #[test]
    fn test_escape_markdown_cell() {
        assert_eq!(escape_markdown_cell("North|South"), "North\\|South");
        assert_eq!(
            escape_markdown_cell("<b>A & B</b>"),
            "&lt;b&gt;A &amp; B&lt;/b&gt;"
        );
        assert_eq!(escape_markdown_cell("line1\nline2\r\nline3"), "line1<br>line2<br>line3");
    }

    #[test]
    fn test_markdown_row_stays_on_one_line() {
        let mut fact = revenue_stats().get("Revenue").unwrap().clone();
        fact.label = "Rev\nenue".to_string();
        let mut stats = Stats::new();
        stats.push(fact);

        let report = Report {
            snapshots: vec![SnapshotReport::computed(
                "Sales".to_string(),
                "sales.json".to_string(),
                4,
                stats,
            )],
            ..create_test_report()
        };
        let markdown = generate_markdown_report(&report, &RenderOptions::default());

        let row = markdown
            .lines()
            .find(|l| l.starts_with("| Rev"))
            .unwrap();
        assert!(row.starts_with("| Rev<br>enue | "));
        assert!(row.ends_with("| &lt;C&gt; |"));
    }

    #[test]
    fn test_render_stats_html() {
        let html = render_stats_html(&revenue_stats(), None);

        assert!(html.starts_with("<div class=\"header\">Revenue</div><div class=\"section\">"));
        assert!(html.contains("<div class=\"header\">Average</div><div class=\"content\">16.666666666666668</div>"));
        assert!(html.contains("<div class=\"header\">Min</div><div class=\"content\"><div>A</div><div>10</div></div>"));
        assert!(html.contains("<div>&lt;C&gt;</div><div>30</div>"));
    }

    #[test]
    fn test_render_stats_html_without_facts() {
        let html = render_stats_html(&Stats::new(), None);
        assert_eq!(html, format!("<h1>{}</h1>", NO_FACT_COLUMN_MESSAGE));
    }

    #[test]
    fn test_generate_html_report() {
        let report = create_test_report();
        let html = generate_html_report(&report, &RenderOptions::default());

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h2>Sales</h2>"));
        assert!(html.contains("<h1>fact column &#39;Cost&#39; has no data</h1>"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"snapshots\""));
        assert!(json.contains("\"attributesLabel\""));
        assert!(json.contains("\"error\""));
    }
}

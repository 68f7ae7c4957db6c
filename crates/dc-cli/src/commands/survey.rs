use clap::Subcommand;
use dc_models::SurveyQuestionHit;
use dc_services::surveys::{SearchSummary, THRESHOLD_OPTIONS};
use dc_services::SurveySearch;
use serde::Serialize;

use crate::app::App;
use crate::output::{render_fields, render_table, Tabular};

#[derive(Subcommand, Debug)]
pub enum SurveyCommand {
    /// Find survey questions similar to a free-text question
    Search {
        query: String,
        /// Minimum match score: 1.0, 0.8, 0.6 or 0.2
        #[arg(long)]
        threshold: Option<f64>,
        #[arg(long)]
        segment: Option<String>,
        #[arg(long)]
        panel: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Every question asked of one segment
    Segment {
        name: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Segment names with their survey counts
    Segments,
    /// Where the timeline report lives and what the user may do there
    Timeline,
}

#[derive(Serialize)]
struct TimelineView<'a> {
    url: &'a str,
    interactive: bool,
}

pub async fn run(app: &App, command: SurveyCommand) -> anyhow::Result<()> {
    let user = app.require_user()?;
    let mut search = app.survey();

    match command {
        SurveyCommand::Search {
            query,
            threshold,
            segment,
            panel,
            page,
        } => {
            if let Some(threshold) = threshold {
                search.set_threshold(threshold);
            }
            search.search(&query).await?;
            if let Some(segment) = segment {
                search.toggle_segment(&segment);
            }
            if let Some(panel) = panel {
                search.toggle_panel(&panel);
            }
            search.go_to_page(page);
            show(app, &search)
        }
        SurveyCommand::Segment { name, page } => {
            search.search_segment(&name).await?;
            search.go_to_page(page);
            show(app, &search)
        }
        SurveyCommand::Segments => app.output.list(&search.segments().await?),
        SurveyCommand::Timeline => {
            let view = TimelineView {
                url: &app.config.survey.timeline_report_url,
                interactive: user.can_interact_with_reports(),
            };
            app.output.record(&view, || {
                render_fields(&[
                    ("report", view.url.to_string()),
                    (
                        "mode",
                        if view.interactive { "interactive" } else { "view only" }.to_string(),
                    ),
                ])
            })
        }
    }
}

fn show(app: &App, search: &SurveySearch) -> anyhow::Result<()> {
    let summary = search.summary();
    app.output.record(&summary, || render_summary(search, &summary))
}

fn threshold_label(threshold: f64) -> String {
    THRESHOLD_OPTIONS
        .iter()
        .find(|(value, _)| (value - threshold).abs() < f64::EPSILON)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| format!("{:.0}%", threshold * 100.0))
}

fn render_summary(search: &SurveySearch, summary: &SearchSummary) -> String {
    let mut header = vec![
        ("query", if summary.query.is_empty() { "-".to_string() } else { summary.query.clone() }),
        ("threshold", threshold_label(summary.threshold)),
        ("segments", search.unique_segments().join(", ")),
        ("panels", search.unique_panels().join(", ")),
    ];
    if let Some(segment) = &summary.segment {
        header.push(("segment filter", segment.clone()));
    }
    if let Some(panel) = &summary.panel {
        header.push(("panel filter", panel.clone()));
    }

    let page = &summary.page;
    let body = if page.items.is_empty() {
        "No matching questions".to_string()
    } else {
        let rows: Vec<Vec<String>> = page.items.iter().map(Tabular::row).collect();
        render_table(&SurveyQuestionHit::headers(), &rows)
    };
    format!(
        "{}\n\n{}\n\npage {}/{} ({} total)",
        render_fields(&header),
        body,
        page.page,
        page.total_pages.max(1),
        page.total
    )
}

/// Report assembly and the single entry point used by the CLI.
///
/// `build_report` runs classification, aggregation, ranking and rendering
/// over one fetched history and decides where the result goes. Posting is
/// only ever reachable through [`Delivery::Post`], which dry runs never
/// produce.
use crate::activity::{aggregate, ActivityHistogram};
use crate::directory::{Channel, User, UserDirectory};
use crate::history::{extract_calls, extract_messages, truncation_warning, CallEvent, RawHistory};
use crate::ranking::{rank_by_inactivity, CallRole};
use crate::renderer::activity::{render_callout, render_full, render_lite};
use crate::renderer::calls::{render_call_counts, render_call_summary};
use crate::renderer::graph::render_call_graph;
use crate::renderer::{introduction, ReportSection, ReportView};
use crate::window::ActivityWindow;

/// Fence used for the platform's fixed-width formatting.
pub const CODE_BLOCK_DELIMITER: &str = "```";

/// Whether a run may post to the output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Render and print only
    DryRun,
    /// Render and post to the output channel
    Post,
}

impl RunMode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run {
            RunMode::DryRun
        } else {
            RunMode::Post
        }
    }
}

/// Where an assembled report should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Print,
    Post { channel_id: String },
}

pub struct ReportRequest<'a> {
    /// Channel whose history was read
    pub channel: &'a Channel,
    /// Channel the report is posted to
    pub output_channel: &'a Channel,
    pub window: ActivityWindow,
    pub directory: &'a UserDirectory,
    pub history: &'a RawHistory,
    pub views: &'a [ReportView],
    pub code_block: bool,
    pub mode: RunMode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportOutcome {
    pub text: String,
    /// Set when the history was truncated; also included in `text`
    pub warning: Option<String>,
    pub delivery: Delivery,
}

/// Joins the introduction and sections with blank lines, optionally fenced.
pub fn assemble(introduction: &str, sections: &[ReportSection], code_block: bool) -> String {
    let mut parts = vec![introduction.to_string()];
    parts.extend(sections.iter().map(ReportSection::to_text));
    let body = parts.join("\n\n");

    if code_block {
        format!(
            "{delim}\n{body}\n{delim}",
            delim = CODE_BLOCK_DELIMITER,
            body = body
        )
    } else {
        body
    }
}

pub fn build_report(request: &ReportRequest<'_>) -> ReportOutcome {
    let messages = extract_messages(&request.history.messages);
    let calls = extract_calls(&request.history.messages);
    tracing::info!(
        "Classified {} messages and {} calls from {} records",
        messages.len(),
        calls.len(),
        request.history.messages.len()
    );

    let warning = truncation_warning(request.history);
    if let Some(ref text) = warning {
        tracing::warn!("{}", text);
    }

    let histogram = aggregate(&messages, &request.window, request.directory);
    if histogram.is_empty() {
        tracing::warn!("No tracked users; the activity views will be empty");
    } else {
        tracing::info!(
            "Counted {} messages from {} tracked users",
            histogram.total_messages(),
            histogram.len()
        );
    }
    let ranked = rank_by_inactivity(&histogram, request.directory);

    let view_context = ViewContext {
        ranked: &ranked,
        histogram: &histogram,
        calls: &calls,
        directory: request.directory,
        days: request.window.days,
    };

    let mut sections = Vec::with_capacity(request.views.len() + 1);
    if let Some(ref text) = warning {
        let mut section = ReportSection::default();
        section.push(text.clone());
        sections.push(section);
    }
    for view in request.views {
        sections.push(view_context.render(*view));
    }

    let intro = introduction(request.window.now, request.window.days, request.channel);
    let text = assemble(&intro, &sections, request.code_block);

    let delivery = match request.mode {
        RunMode::DryRun => Delivery::Print,
        RunMode::Post => Delivery::Post {
            channel_id: request.output_channel.channel_id.clone(),
        },
    };

    ReportOutcome {
        text,
        warning,
        delivery,
    }
}

struct ViewContext<'a> {
    ranked: &'a [&'a User],
    histogram: &'a ActivityHistogram,
    calls: &'a [CallEvent],
    directory: &'a UserDirectory,
    days: u32,
}

impl ViewContext<'_> {
    fn render(&self, view: ReportView) -> ReportSection {
        match view {
            ReportView::Lite => render_lite(self.ranked, self.histogram),
            ReportView::Full => render_full(self.ranked, self.histogram, self.days),
            ReportView::Callout => render_callout(self.ranked, self.histogram),
            ReportView::Calls => render_call_summary(self.calls, self.directory),
            ReportView::Graph => render_call_graph(self.calls, self.directory),
            ReportView::Participation => {
                render_call_counts(self.calls, self.directory, CallRole::Participation)
            }
            ReportView::Initiation => {
                render_call_counts(self.calls, self.directory, CallRole::Initiation)
            }
        }
    }
}

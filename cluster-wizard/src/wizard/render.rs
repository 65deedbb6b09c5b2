// Read-only display transforms for the summary, status and results steps

use super::form::FieldId;
use super::schema::{self, StepId};
use crate::i18n::Messages;
use crate::models::context::{FlowKind, SecurityType, WizardContext};
use crate::models::test_results::{TestCategory, TestStatus};

pub use crate::models::test_results::overall_status;

/// Asterisks matching the value's character count, or "N/A" when absent or empty.
pub fn mask_secret(value: Option<&str>, messages: &Messages) -> String {
    match value {
        Some(v) if !v.is_empty() => "*".repeat(v.chars().count()),
        _ => messages.get("common.na"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIcon {
    Pass,
    Warning,
    Fail,
}

impl StatusIcon {
    pub fn glyph(self) -> &'static str {
        match self {
            StatusIcon::Pass => "✔",
            StatusIcon::Warning => "▲",
            StatusIcon::Fail => "✖",
        }
    }

    pub fn asset(self) -> &'static str {
        match self {
            StatusIcon::Pass => "success_criteria.svg",
            StatusIcon::Warning => "warning_criteria.svg",
            StatusIcon::Fail => "fail_criteria.svg",
        }
    }
}

/// Skipped (no status) renders as a warning.
pub fn status_icon(status: Option<TestStatus>) -> StatusIcon {
    match status {
        Some(TestStatus::Pass) => StatusIcon::Pass,
        Some(TestStatus::Fail) => StatusIcon::Fail,
        Some(TestStatus::Warning) | None => StatusIcon::Warning,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub label: String,
    pub value: String,
}

fn summary_steps(ctx: &WizardContext) -> Vec<StepId> {
    match ctx.flow {
        FlowKind::S3 | FlowKind::Catalog => vec![StepId::Intro, StepId::Details],
        FlowKind::HadoopCluster => {
            let mut steps = vec![schema::entry_step(ctx.flow, ctx.flow_type)];
            if ctx.secure_enabled {
                steps.push(StepId::Security);
                match ctx.modes.security {
                    SecurityType::None => {}
                    SecurityType::Kerberos => steps.push(StepId::Kerberos),
                    SecurityType::Knox => steps.push(StepId::Knox),
                }
            }
            steps
        }
        FlowKind::Driver => vec![StepId::AddDriver],
    }
}

/// Label/value rows for everything the user entered, selectors first per step.
/// Secrets are masked; empty values read "N/A".
pub fn summary_rows(ctx: &WizardContext, messages: &Messages) -> Vec<SummaryRow> {
    let mut rows = Vec::new();
    for step in summary_steps(ctx) {
        for kind in schema::selectors(ctx.flow, step) {
            rows.push(SummaryRow {
                label: messages.get(kind.label_key()),
                value: messages.get(ctx.modes.get(*kind).label_key()),
            });
        }
        for field in schema::visible_fields(ctx.flow, step, &ctx.modes) {
            let raw = ctx.model.get(field);
            let value = if field.is_secret() {
                mask_secret(raw, messages)
            } else {
                match raw.map(str::trim).filter(|v| !v.is_empty()) {
                    Some(v) => v.to_string(),
                    None => messages.get("common.na"),
                }
            };
            rows.push(SummaryRow {
                label: messages.get(field.label_key()),
                value,
            });
        }
    }
    rows
}

// Category display order, matched on the category name prefix.
const CATEGORY_ORDER: &[&str] = &["hadoop", "zookeeper", "job", "oozie", "kafka"];

fn category_rank(name: &str) -> usize {
    let lower = name.trim().to_ascii_lowercase();
    CATEGORY_ORDER
        .iter()
        .position(|p| lower.starts_with(p))
        .unwrap_or(CATEGORY_ORDER.len())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultLine {
    pub icon: StatusIcon,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub category: ResultLine,
    pub tests: Vec<ResultLine>,
}

/// Known categories in display order, unknown ones after them in server order.
pub fn result_rows(categories: &[TestCategory], messages: &Messages) -> Vec<ResultRow> {
    let mut ordered: Vec<&TestCategory> = categories.iter().collect();
    ordered.sort_by_key(|c| category_rank(&c.category_name));
    ordered
        .into_iter()
        .map(|c| {
            let text = if c.is_skipped() {
                format!("{} {}", c.category_name, messages.get("results.skipped"))
            } else {
                c.category_name.clone()
            };
            ResultRow {
                category: ResultLine {
                    icon: status_icon(c.category_status),
                    text,
                },
                tests: c
                    .tests
                    .iter()
                    .map(|t| ResultLine {
                        icon: status_icon(t.test_status),
                        text: t.test_name.clone(),
                    })
                    .collect(),
            }
        })
        .collect()
}

/// Headline of the results step from the worst category status.
pub fn overall_line(categories: &[TestCategory], messages: &Messages) -> ResultLine {
    let status = overall_status(categories);
    let key = match status {
        Some(TestStatus::Pass) => "results.overall.pass",
        Some(TestStatus::Warning) => "results.overall.warning",
        Some(TestStatus::Fail) => "results.overall.fail",
        None => "results.overall.none",
    };
    ResultLine {
        icon: status_icon(status),
        text: messages.get(key),
    }
}

/// Field values shown on a step, with secrets masked for display only.
pub fn display_value(field: FieldId, value: &str) -> String {
    if field.is_secret() {
        "*".repeat(value.chars().count())
    } else {
        value.to_string()
    }
}

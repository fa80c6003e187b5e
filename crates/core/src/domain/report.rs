use crate::domain::record::{FinancialRecord, RecordId};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type ReportId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSection {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub order: u32,
    pub included: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
    Area,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub title: String,
    pub included: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: ReportId,
    pub financial_data_id: RecordId,
    pub title: String,
    pub sections: Vec<ReportSection>,
    pub charts: Vec<ChartDescriptor>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
    pub financial_data_id: RecordId,
    pub title: String,
    pub sections: Vec<ReportSection>,
    pub charts: Vec<ChartDescriptor>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sections: Option<Vec<ReportSection>>,
    #[serde(default)]
    pub charts: Option<Vec<ChartDescriptor>>,
}

impl Report {
    pub fn from_new(id: ReportId, new: NewReport) -> Self {
        Self {
            id,
            financial_data_id: new.financial_data_id,
            title: new.title,
            sections: new.sections,
            charts: new.charts,
            generated_at: new.generated_at,
        }
    }

    pub fn apply_patch(&mut self, patch: ReportPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(sections) = patch.sections {
            self.sections = sections;
        }
        if let Some(charts) = patch.charts {
            self.charts = charts;
        }
    }
}

/// Builder state for a report: every available section and chart, each with an inclusion flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTemplate {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sections: Vec<ReportSection>,
    #[serde(default)]
    pub charts: Vec<ChartDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TemplateEdit {
    SetTitle { title: String },
    UpdateSectionContent { section_id: String, content: String },
    SetSectionIncluded { section_id: String, included: bool },
    ToggleSectionIncluded { section_id: String },
    SetChartIncluded { chart_id: String, included: bool },
    ToggleChartIncluded { chart_id: String },
}

fn section(id: &str, title: &str, order: u32, included: bool) -> ReportSection {
    ReportSection {
        id: id.to_string(),
        title: title.to_string(),
        content: String::new(),
        order,
        included,
    }
}

fn chart(id: &str, kind: ChartKind, title: &str, included: bool) -> ChartDescriptor {
    ChartDescriptor {
        id: id.to_string(),
        kind,
        title: title.to_string(),
        included,
    }
}

impl ReportTemplate {
    pub fn standard() -> Self {
        Self {
            title: String::new(),
            sections: vec![
                section("executive-summary", "Executive Summary", 1, true),
                section("liquidity-analysis", "Liquidity Analysis", 2, true),
                section("profitability-analysis", "Profitability Analysis", 3, true),
                section("leverage-analysis", "Leverage Analysis", 4, false),
                section("efficiency-analysis", "Efficiency Analysis", 5, false),
            ],
            charts: vec![
                chart("revenue-trend", ChartKind::Line, "Revenue Trend", true),
                chart("profit-margins", ChartKind::Bar, "Profit Margins", true),
                chart(
                    "balance-sheet",
                    ChartKind::Pie,
                    "Balance Sheet Structure",
                    false,
                ),
            ],
        }
    }

    pub fn for_record(record: &FinancialRecord) -> Self {
        Self {
            title: format!(
                "Financial Analysis Report - {} ({})",
                record.display_name(),
                record.period
            ),
            ..Self::standard()
        }
    }

    pub fn apply(&mut self, edit: TemplateEdit) -> Result<()> {
        match edit {
            TemplateEdit::SetTitle { title } => self.title = title,
            TemplateEdit::UpdateSectionContent {
                section_id,
                content,
            } => self.section_mut(&section_id)?.content = content,
            TemplateEdit::SetSectionIncluded {
                section_id,
                included,
            } => self.section_mut(&section_id)?.included = included,
            TemplateEdit::ToggleSectionIncluded { section_id } => {
                let s = self.section_mut(&section_id)?;
                s.included = !s.included;
            }
            TemplateEdit::SetChartIncluded { chart_id, included } => {
                self.chart_mut(&chart_id)?.included = included
            }
            TemplateEdit::ToggleChartIncluded { chart_id } => {
                let c = self.chart_mut(&chart_id)?;
                c.included = !c.included;
            }
        }
        Ok(())
    }

    fn section_mut(&mut self, id: &str) -> Result<&mut ReportSection> {
        self.sections
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::not_found("Report section", id))
    }

    fn chart_mut(&mut self, id: &str) -> Result<&mut ChartDescriptor> {
        self.charts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::not_found("Report chart", id))
    }
}

use crate::domain::record::RecordId;
use crate::domain::report::{NewReport, ReportTemplate};
use chrono::{DateTime, Utc};

/// Materializes a report from a template: keeps only included sections and charts, in template
/// order, and stamps the generation time.
pub fn assemble(
    financial_data_id: RecordId,
    template: &ReportTemplate,
    generated_at: DateTime<Utc>,
) -> NewReport {
    let title = match template.title.trim() {
        "" => format!(
            "Financial Analysis Report - {}",
            generated_at.format("%Y-%m-%d")
        ),
        t => t.to_string(),
    };

    NewReport {
        financial_data_id,
        title,
        sections: template
            .sections
            .iter()
            .filter(|s| s.included)
            .cloned()
            .collect(),
        charts: template
            .charts
            .iter()
            .filter(|c| c.included)
            .cloned()
            .collect(),
        generated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::report::TemplateEdit;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 15, 12, 30, 0).unwrap()
    }

    #[test]
    fn keeps_included_sections_in_template_order() {
        let mut template = ReportTemplate::standard();
        template.title = "Q2 review".to_string();
        // 5 sections: leverage and efficiency excluded; move exclusion to the middle.
        template
            .apply(TemplateEdit::ToggleSectionIncluded {
                section_id: "liquidity-analysis".into(),
            })
            .unwrap();
        template
            .apply(TemplateEdit::SetSectionIncluded {
                section_id: "efficiency-analysis".into(),
                included: true,
            })
            .unwrap();

        let report = assemble(3, &template, at());
        let ids: Vec<_> = report.sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            ["executive-summary", "profitability-analysis", "efficiency-analysis"]
        );
        assert_eq!(report.financial_data_id, 3);
        assert_eq!(report.title, "Q2 review");
        assert_eq!(report.generated_at, at());
    }

    #[test]
    fn drops_excluded_charts() {
        let report = assemble(1, &ReportTemplate::standard(), at());
        let ids: Vec<_> = report.charts.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["revenue-trend", "profit-margins"]);
    }

    #[test]
    fn blank_title_gets_dated_default() {
        let mut template = ReportTemplate::standard();
        template.title = "   ".to_string();
        let report = assemble(1, &template, at());
        assert_eq!(report.title, "Financial Analysis Report - 2024-07-15");
    }

    #[test]
    fn section_content_is_carried_verbatim() {
        let mut template = ReportTemplate::standard();
        template
            .apply(TemplateEdit::UpdateSectionContent {
                section_id: "executive-summary".into(),
                content: "  Margins widened.\n".into(),
            })
            .unwrap();
        let report = assemble(1, &template, at());
        assert_eq!(report.sections[0].content, "  Margins widened.\n");
    }
}

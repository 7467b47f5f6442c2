use super::shared::format_heading;
use crate::run::GenerateReport;
use crate::story::Wave;

pub fn format_generate_summary(report: &GenerateReport) -> String {
    format!(
        "{}\nSections: {} ({} body, {} framing)\nCharacters: {}\nWritten to: {}",
        format_heading("Story Complete"),
        report.plan.len(),
        report.plan.wave_len(Wave::Body),
        report.plan.wave_len(Wave::Framing),
        report.document_chars,
        report.output_path.display()
    )
}

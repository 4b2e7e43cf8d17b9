//! End-of-run summary.

use log::info;
use strum::IntoEnumIterator;

use crate::engine::Severity;
use crate::error_handling::StatKind;
use crate::run::RunReport;

/// Logs every non-zero counter and the number of findings per severity.
pub fn print_run_summary(report: &RunReport) {
    info!("Run statistics:");
    for kind in StatKind::iter() {
        let count = report.stats.get(kind);
        if count > 0 {
            info!("   {}: {}", kind.label(), count);
        }
    }

    let findings = |severity: Severity| {
        report
            .pages
            .iter()
            .flat_map(|page| page.tags.iter())
            .filter(|tag| tag.severity == severity)
            .count()
    };
    let danger = findings(Severity::Danger);
    let warning = findings(Severity::Warning);
    if danger + warning > 0 {
        info!("Findings: {danger} danger, {warning} warning");
    }
}

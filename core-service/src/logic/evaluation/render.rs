//! Text rendering of evaluation reports for operators.

use serde::{Deserialize, Serialize};

use super::report::EvaluationReport;
use crate::logic::dataset::FaultCode;

const WIDTH: usize = 60;

/// Fixed-width dashboard: one line per numeric class, ascending, then accuracy
pub fn render(report: &EvaluationReport) -> String {
    let heavy = "=".repeat(WIDTH);
    let light = "-".repeat(WIDTH);

    let mut out = String::new();
    out.push_str(&heavy);
    out.push('\n');
    out.push_str(&format!("{:^width$}\n", "TEP PERFORMANCE DASHBOARD", width = WIDTH));
    out.push_str(&heavy);
    out.push('\n');
    out.push_str(&format!(
        "{:<12}{:>16}{:>16}{:>16}\n",
        "", "precision", "recall", "f1-score"
    ));
    for (code, m) in report.fault_classes() {
        out.push_str(&format!(
            "{:<12}{:>15.2}%{:>15.2}%{:>15.2}%\n",
            format!("Fault {}", code),
            m.precision * 100.0,
            m.recall * 100.0,
            m.f1_score * 100.0
        ));
    }
    out.push_str(&light);
    out.push('\n');
    out.push_str(&format!(
        "{:^width$}\n",
        format!("GLOBAL ACCURACY: {:.2}%", report.accuracy * 100.0),
        width = WIDTH
    ));
    out.push_str(&heavy);
    out.push('\n');
    out
}

/// Per-fault performance summary shown next to a live monitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultProfile {
    pub fault_code: FaultCode,
    pub description: String,
    pub f1_score: f64,
    pub accuracy: f64,
    pub comment: String,
}

pub fn fault_profile(report: &EvaluationReport, code: FaultCode) -> FaultProfile {
    match report.class(code) {
        Some(m) => FaultProfile {
            fault_code: code,
            description: format!("Fault {}", code),
            f1_score: m.f1_score,
            accuracy: report.accuracy,
            comment: format!("Recall: {:.1}%", m.recall * 100.0),
        },
        None => FaultProfile {
            fault_code: code,
            description: "N/A".to_string(),
            f1_score: 0.0,
            accuracy: 0.0,
            comment: "No data in report".to_string(),
        },
    }
}

// file: src/seed.rs
// description: sample KPI cards and audit entries the dashboard starts from

use crate::types::{AuditLogEntry, Kpi, Status, Trend};

/// Id of the KPI card that tax deltas fold into.
pub const TAX_TOTAL_KPI: &str = "1";

pub fn kpis() -> Vec<Kpi> {
    vec![
        Kpi {
            id: TAX_TOTAL_KPI.to_string(),
            title: "Total Taxes (Month)".to_string(),
            value: 12_450,
            subtext: None,
            status: Status::Approved,
            badge: Some("UP TO DATE".to_string()),
            trend: Trend::Up,
            trend_value: "+2.5%".to_string(),
        },
        Kpi {
            id: "2".to_string(),
            title: "Parafiscal Load".to_string(),
            value: 4_200,
            subtext: Some("Payroll: 150 employees".to_string()),
            status: Status::Pending,
            badge: None,
            trend: Trend::Neutral,
            trend_value: "0%".to_string(),
        },
        Kpi {
            id: "3".to_string(),
            title: "Operating Expenses".to_string(),
            value: 8_120,
            subtext: Some("vs budget $8k".to_string()),
            status: Status::Rejected,
            badge: None,
            trend: Trend::Down,
            trend_value: "+1.5%".to_string(),
        },
    ]
}

/// Newest first.
pub fn recent_logs() -> Vec<AuditLogEntry> {
    let entry = |id: &str, title: &str, category: &str, amount, date: &str, status| AuditLogEntry {
        id: id.to_string(),
        title: title.to_string(),
        category: category.to_string(),
        amount,
        date: date.to_string(),
        status,
    };

    vec![
        entry("log-1", "SENIAT - VAT Return", "National Taxes", 2_450, "20/10/2023", Status::Approved),
        entry("log-2", "IVSS - Employer Contributions", "Payroll Levies", 1_850, "19/10/2023", Status::Pending),
        entry("log-3", "Municipality - Business License", "Municipal Taxes", 1_200, "18/10/2023", Status::Pending),
        entry("log-4", "AWS Server", "Infrastructure", 450, "18/10/2023", Status::Approved),
    ]
}

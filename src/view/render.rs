//! Terminal renderers.
//!
//! Pure functions from records to text. Money is shown the Brazilian way
//! (`R$ 1.234,56`) and ISO dates as `dd/mm/yyyy`.

use chrono::NaiveDate;
use std::fmt::Write;

use super::customers::Customer;
use crate::dashboard::DashboardStats;
use crate::model::{Fatura, HealthResponse};

const RULE_WIDTH: usize = 96;

/// `R$ 1.234,56`
pub fn format_money(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let digits = (cents / 100).to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}R$ {},{:02}", sign, grouped, cents % 100)
}

/// ISO dates become `dd/mm/yyyy`; anything else is shown as-is
pub fn format_date(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return "N/A".to_string();
    }
    // Accept a trailing time component
    let date_part = raw.split('T').next().unwrap_or(raw);
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => date.format("%d/%m/%Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

pub fn status_label(paid: bool) -> &'static str {
    if paid {
        "Paid"
    } else {
        "Pending"
    }
}

/// Truncate or pad to exactly `width` characters
fn fit(s: &str, width: usize) -> String {
    let count = s.chars().count();
    if count <= width {
        format!("{}{}", s, " ".repeat(width - count))
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

fn bar(percent: u32, width: usize) -> String {
    let filled = (percent as usize * width + 50) / 100;
    format!("[{}{}]", "#".repeat(filled.min(width)), ".".repeat(width - filled.min(width)))
}

pub fn empty_state() -> String {
    "No invoices found.\n\
     Run `faturas process-emails` to fetch new invoices from the mailbox.\n"
        .to_string()
}

pub fn unavailable(message: &str) -> String {
    format!(
        "⚠ Invoices unavailable: {}\n  Nothing is shown until the backend can be reached.\n",
        message
    )
}

pub fn invoice_table(faturas: &[Fatura]) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{:>5}  {}  {}  {}  {}  {:>14}  {}",
        "ID",
        fit("Customer", 28),
        fit("Installation", 12),
        fit("Month", 10),
        fit("Due", 10),
        "Amount",
        "Status"
    );
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));

    for f in faturas {
        let _ = writeln!(
            out,
            "{:>5}  {}  {}  {}  {}  {:>14}  {}",
            f.id,
            fit(&f.customer_name, 28),
            fit(&f.installation_number, 12),
            fit(&f.reference_month, 10),
            fit(&format_date(&f.due_date), 10),
            format_money(f.total_amount),
            status_label(f.paid)
        );
    }

    let total: f64 = faturas.iter().map(|f| f.total_amount).sum();
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
    let _ = writeln!(
        out,
        "{} invoice(s), total {}",
        faturas.len(),
        format_money(total)
    );

    out
}

pub fn invoice_cards(faturas: &[Fatura]) -> String {
    faturas.iter().map(invoice_detail).collect::<Vec<_>>().join("\n")
}

pub fn invoice_detail(f: &Fatura) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#{} [{}] {}", f.id, status_label(f.paid), f.customer_name);
    let _ = writeln!(out, "  Installation: {}", f.installation_number);
    let _ = writeln!(out, "  Document:     {}", f.customer_document);
    let _ = writeln!(out, "  Email:        {}", f.customer_email);
    let _ = writeln!(out, "  Total:        {}", format_money(f.total_amount));
    let _ = writeln!(out, "  Month:        {}", f.reference_month);
    let _ = writeln!(out, "  Due:          {}", format_date(&f.due_date));
    if let Some(pdf) = &f.pdf_url {
        let _ = writeln!(out, "  PDF:          {}", pdf);
    }
    if !f.paid {
        let _ = writeln!(out, "  Pay with:     faturas pay {}", f.id);
    }
    out
}

pub fn dashboard_panel(stats: &DashboardStats, recent: &[Fatura]) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Dashboard");
    let _ = writeln!(out, "{}", "=".repeat(40));
    let _ = writeln!(out, "  Customers:        {}", stats.customer_count);
    let _ = writeln!(out, "  Total invoices:   {}", stats.total_invoices);
    let _ = writeln!(out, "  Pending invoices: {}", stats.unpaid_count);
    let _ = writeln!(out, "  Paid invoices:    {}", stats.paid_count);
    let _ = writeln!(out, "  Total amount:     {}", format_money(stats.total_amount));
    let _ = writeln!(out);

    let _ = writeln!(out, "Invoice status");
    let _ = writeln!(
        out,
        "  Paid     {} {:>3}%",
        bar(stats.paid_percentage(), 20),
        stats.paid_percentage()
    );
    let _ = writeln!(
        out,
        "  Pending  {} {:>3}%",
        bar(stats.unpaid_percentage(), 20),
        stats.unpaid_percentage()
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "Amounts by status");
    let _ = writeln!(
        out,
        "  Pending  {} {}",
        bar(stats.pending_percentage(), 20),
        format_money(stats.pending_amount)
    );
    let _ = writeln!(
        out,
        "  Received {} {}",
        bar(stats.received_percentage(), 20),
        format_money(stats.received_amount)
    );
    let _ = writeln!(out);

    if recent.is_empty() {
        out.push_str(&empty_state());
        return out;
    }

    let _ = writeln!(out, "Recent invoices");
    for f in recent {
        let _ = writeln!(
            out,
            "  {} {}  Inst. {}  {}  due {}",
            fit(status_label(f.paid), 7),
            fit(&f.customer_name, 24),
            fit(&f.installation_number, 10),
            format_money(f.total_amount),
            format_date(&f.due_date)
        );
    }

    out
}

pub fn customer_table(customers: &[Customer]) -> String {
    if customers.is_empty() {
        return "No clients found.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}  {}  {}  {:>8}  {:>14}  {:>14}",
        fit("Installation", 12),
        fit("Customer", 28),
        fit("Document", 18),
        "Invoices",
        "Total",
        "Pending"
    );
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));

    for c in customers {
        let _ = writeln!(
            out,
            "{}  {}  {}  {:>8}  {:>14}  {:>14}",
            fit(&c.installation_number, 12),
            fit(&c.name, 28),
            fit(&c.document, 18),
            c.invoice_count,
            format_money(c.total_amount),
            format_money(c.unpaid_amount)
        );
    }

    out
}

pub fn health_report(health: &HealthResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "API status:  {}", health.status);
    if !health.environment.is_empty() {
        let _ = writeln!(out, "Environment: {}", health.environment);
    }
    if !health.timestamp.is_empty() {
        let _ = writeln!(out, "Checked at:  {}", health.timestamp);
    }
    if !health.services.is_empty() {
        let _ = writeln!(out, "Services:");
        for (name, status) in &health.services {
            let _ = writeln!(out, "  {:<10} {}", name, status);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::sample;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(150.0), "R$ 150,00");
        assert_eq!(format_money(1234.5), "R$ 1.234,50");
        assert_eq!(format_money(1234567.891), "R$ 1.234.567,89");
        assert_eq!(format_money(0.0), "R$ 0,00");
        assert_eq!(format_money(-5.5), "-R$ 5,50");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-02-10"), "10/02/2024");
        assert_eq!(format_date("2024-02-10T00:00:00"), "10/02/2024");
        assert_eq!(format_date("10/02/2024"), "10/02/2024");
        assert_eq!(format_date("FEV/24"), "FEV/24");
        assert_eq!(format_date(""), "N/A");
    }

    #[test]
    fn test_fit() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdef", 4), "abc…");
        assert_eq!(fit("João", 4), "João");
    }

    #[test]
    fn test_invoice_table_rows() {
        let table = invoice_table(&[
            sample(1, "João Silva", "300123", 100.0, false),
            sample(2, "Maria Souza", "300456", 50.0, true),
        ]);

        assert!(table.contains("João Silva"));
        assert!(table.contains("Maria Souza"));
        assert!(table.contains("Pending"));
        assert!(table.contains("2 invoice(s), total R$ 150,00"));
    }

    #[test]
    fn test_detail_offers_payment_only_when_unpaid() {
        let unpaid = invoice_detail(&sample(1, "A", "1", 10.0, false));
        assert!(unpaid.contains("faturas pay 1"));

        let paid = invoice_detail(&sample(2, "B", "2", 10.0, true));
        assert!(!paid.contains("faturas pay"));
    }

    #[test]
    fn test_dashboard_panel() {
        let faturas = vec![
            sample(1, "João Silva", "300123", 100.0, false),
            sample(2, "Maria Souza", "300456", 50.0, true),
        ];
        let stats = DashboardStats::compute(&faturas);
        let panel = dashboard_panel(&stats, &faturas);

        assert!(panel.contains("Total amount:     R$ 150,00"));
        assert!(panel.contains("Pending invoices: 1"));
        assert!(panel.contains("Paid invoices:    1"));
        assert!(panel.contains("Recent invoices"));
    }

    #[test]
    fn test_dashboard_panel_empty() {
        let panel = dashboard_panel(&DashboardStats::default(), &[]);
        assert!(panel.contains("No invoices found"));
    }

    #[test]
    fn test_bar() {
        assert_eq!(bar(0, 4), "[....]");
        assert_eq!(bar(50, 4), "[##..]");
        assert_eq!(bar(100, 4), "[####]");
    }
}

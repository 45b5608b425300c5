//! Dashboard Aggregates
//!
//! Statistics derived from the invoice sequence. Nothing here is stored;
//! everything is recomputed from the store's records on every redraw.

use std::collections::HashSet;

use crate::model::Fatura;

/// Aggregate figures shown on the dashboard
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardStats {
    pub total_invoices: usize,
    /// Distinct installation numbers
    pub customer_count: usize,
    pub paid_count: usize,
    pub unpaid_count: usize,
    pub total_amount: f64,
    pub pending_amount: f64,
    pub received_amount: f64,
}

impl DashboardStats {
    pub fn compute(faturas: &[Fatura]) -> Self {
        let mut stats = DashboardStats {
            total_invoices: faturas.len(),
            ..Default::default()
        };

        let installations: HashSet<&str> = faturas
            .iter()
            .map(|f| f.installation_number.as_str())
            .collect();
        stats.customer_count = installations.len();

        for fatura in faturas {
            stats.total_amount += fatura.total_amount;
            if fatura.paid {
                stats.paid_count += 1;
                stats.received_amount += fatura.total_amount;
            } else {
                stats.unpaid_count += 1;
                stats.pending_amount += fatura.total_amount;
            }
        }

        stats
    }

    /// Share of invoices already paid, 0-100
    pub fn paid_percentage(&self) -> u32 {
        percentage(self.paid_count as f64, self.total_invoices as f64)
    }

    pub fn unpaid_percentage(&self) -> u32 {
        percentage(self.unpaid_count as f64, self.total_invoices as f64)
    }

    /// Share of the total amount already received, 0-100
    pub fn received_percentage(&self) -> u32 {
        percentage(self.received_amount, self.total_amount)
    }

    pub fn pending_percentage(&self) -> u32 {
        percentage(self.pending_amount, self.total_amount)
    }
}

/// Rounded percentage, 0 when `total` is zero
pub fn percentage(value: f64, total: f64) -> u32 {
    if total <= 0.0 {
        return 0;
    }
    ((value / total) * 100.0).round().clamp(0.0, 100.0) as u32
}

/// Most recently created invoices first; records without a creation
/// timestamp sort after dated ones, newest id first.
pub fn recent(faturas: &[Fatura], limit: usize) -> Vec<Fatura> {
    let mut sorted: Vec<&Fatura> = faturas.iter().collect();
    sorted.sort_by(|a, b| {
        b.created_at_parsed()
            .cmp(&a.created_at_parsed())
            .then_with(|| b.id.cmp(&a.id))
    });
    sorted.into_iter().take(limit).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::sample;

    #[test]
    fn test_two_invoice_scenario() {
        let faturas = vec![
            sample(1, "João Silva", "300123", 100.0, false),
            sample(2, "Maria Souza", "300456", 50.0, true),
        ];

        let stats = DashboardStats::compute(&faturas);
        assert_eq!(format!("{:.2}", stats.total_amount), "150.00");
        assert_eq!(stats.unpaid_count, 1);
        assert_eq!(stats.paid_count, 1);
        assert_eq!(stats.customer_count, 2);
        assert_eq!(stats.pending_amount, 100.0);
        assert_eq!(stats.received_amount, 50.0);
        assert_eq!(stats.paid_percentage(), 50);
        assert_eq!(stats.received_percentage(), 33);
    }

    #[test]
    fn test_customers_counted_by_installation() {
        let faturas = vec![
            sample(1, "João Silva", "300123", 10.0, false),
            sample(2, "João Silva", "300123", 10.0, false),
            sample(3, "João Silva", "300999", 10.0, true),
        ];
        assert_eq!(DashboardStats::compute(&faturas).customer_count, 2);
    }

    #[test]
    fn test_empty_sequence() {
        let stats = DashboardStats::compute(&[]);
        assert_eq!(stats, DashboardStats::default());
        assert_eq!(stats.paid_percentage(), 0);
        assert_eq!(stats.received_percentage(), 0);
    }

    #[test]
    fn test_recent_ordering() {
        let mut a = sample(1, "A", "1", 1.0, false);
        a.created_at = Some("2024-01-01T10:00:00".to_string());
        let mut b = sample(2, "B", "2", 1.0, false);
        b.created_at = Some("2024-03-01T10:00:00".to_string());
        let c = sample(3, "C", "3", 1.0, false);

        let ids: Vec<_> = recent(&[a, b, c], 5).iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_recent_limit() {
        let faturas: Vec<_> = (1..=8).map(|i| sample(i, "X", "1", 1.0, false)).collect();
        let ids: Vec<_> = recent(&faturas, 5).iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![8, 7, 6, 5, 4]);
    }
}

//! Customers derived from invoices.
//!
//! There is no customer record on the backend; a customer is the set of
//! invoices sharing an installation number.

use crate::model::Fatura;

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub installation_number: String,
    pub name: String,
    pub document: String,
    pub email: String,
    pub invoice_count: usize,
    pub total_amount: f64,
    pub unpaid_count: usize,
    pub unpaid_amount: f64,
}

/// Group invoices by installation number, in first-seen order.
/// Contact fields come from the first invoice of each group.
pub fn group_by_installation(faturas: &[Fatura]) -> Vec<Customer> {
    let mut customers: Vec<Customer> = Vec::new();

    for fatura in faturas {
        let index = match customers
            .iter()
            .position(|c| c.installation_number == fatura.installation_number)
        {
            Some(i) => i,
            None => {
                customers.push(Customer {
                    installation_number: fatura.installation_number.clone(),
                    name: fatura.customer_name.clone(),
                    document: fatura.customer_document.clone(),
                    email: fatura.customer_email.clone(),
                    invoice_count: 0,
                    total_amount: 0.0,
                    unpaid_count: 0,
                    unpaid_amount: 0.0,
                });
                customers.len() - 1
            }
        };

        let customer = &mut customers[index];
        customer.invoice_count += 1;
        customer.total_amount += fatura.total_amount;
        if !fatura.paid {
            customer.unpaid_count += 1;
            customer.unpaid_amount += fatura.total_amount;
        }
    }

    customers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::sample;

    #[test]
    fn test_grouping() {
        let faturas = vec![
            sample(1, "João Silva", "300123", 100.0, false),
            sample(2, "Maria Souza", "300456", 50.0, true),
            sample(3, "João S.", "300123", 80.0, true),
        ];

        let customers = group_by_installation(&faturas);
        assert_eq!(customers.len(), 2);

        assert_eq!(customers[0].installation_number, "300123");
        assert_eq!(customers[0].name, "João Silva");
        assert_eq!(customers[0].invoice_count, 2);
        assert_eq!(customers[0].total_amount, 180.0);
        assert_eq!(customers[0].unpaid_count, 1);
        assert_eq!(customers[0].unpaid_amount, 100.0);

        assert_eq!(customers[1].unpaid_count, 0);
    }

    #[test]
    fn test_empty() {
        assert!(group_by_installation(&[]).is_empty());
    }
}

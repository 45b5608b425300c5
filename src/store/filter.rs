//! Client-side invoice filtering.

use std::str::FromStr;

use crate::model::Fatura;

/// Paid-status criterion; `Any` passes everything through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaidStatus {
    #[default]
    Any,
    Paid,
    Pending,
}

impl PaidStatus {
    pub fn matches(&self, paid: bool) -> bool {
        match self {
            PaidStatus::Any => true,
            PaidStatus::Paid => paid,
            PaidStatus::Pending => !paid,
        }
    }
}

impl From<Option<bool>> for PaidStatus {
    fn from(paid: Option<bool>) -> Self {
        match paid {
            None => PaidStatus::Any,
            Some(true) => PaidStatus::Paid,
            Some(false) => PaidStatus::Pending,
        }
    }
}

impl FromStr for PaidStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" | "any" | "todas" => Ok(PaidStatus::Any),
            "paid" | "pagas" | "pago" => Ok(PaidStatus::Paid),
            "pending" | "unpaid" | "pendentes" | "pendente" => Ok(PaidStatus::Pending),
            other => Err(format!(
                "unknown status '{}' (expected all, paid or pending)",
                other
            )),
        }
    }
}

/// Text query plus paid status, combined with AND
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaturaFilter {
    /// Case-insensitive substring of customer name OR installation number
    pub query: Option<String>,
    pub status: PaidStatus,
}

impl FaturaFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_status(mut self, status: PaidStatus) -> Self {
        self.status = status;
        self
    }

    /// Lower-cased query, `None` when blank
    fn needle(&self) -> Option<String> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    pub fn is_empty(&self) -> bool {
        self.needle().is_none() && self.status == PaidStatus::Any
    }

    pub fn matches(&self, fatura: &Fatura) -> bool {
        text_matches(self.needle().as_deref(), fatura) && self.status.matches(fatura.paid)
    }

    /// Matching records in their original order
    pub fn apply(&self, faturas: &[Fatura]) -> Vec<Fatura> {
        let needle = self.needle();
        faturas
            .iter()
            .filter(|f| text_matches(needle.as_deref(), f) && self.status.matches(f.paid))
            .cloned()
            .collect()
    }
}

fn text_matches(needle: Option<&str>, fatura: &Fatura) -> bool {
    match needle {
        None => true,
        Some(q) => {
            fatura.customer_name.to_lowercase().contains(q)
                || fatura.installation_number.to_lowercase().contains(q)
        }
    }
}

//! Section and modal visibility.

use std::fmt;
use std::str::FromStr;

use crate::model::FaturaId;

/// Top-level sections; exactly one is visible at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Dashboard,
    Clients,
    Invoices,
    Payments,
    Reports,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Dashboard,
        Section::Clients,
        Section::Invoices,
        Section::Payments,
        Section::Reports,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Section::Dashboard => "Dashboard",
            Section::Clients => "Client Management",
            Section::Invoices => "Invoice Management",
            Section::Payments => "Payments",
            Section::Reports => "Reports",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dashboard" => Ok(Section::Dashboard),
            "clients" | "clientes" => Ok(Section::Clients),
            "invoices" | "faturas" => Ok(Section::Invoices),
            "payments" | "pagamentos" => Ok(Section::Payments),
            "reports" | "relatorios" => Ok(Section::Reports),
            other => Err(format!("unknown section '{}'", other)),
        }
    }
}

/// Dialogs layered over the active section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    NewInvoice,
    /// Carries the invoice being edited
    EditInvoice(FaturaId),
    NewClient,
}

/// Visibility state: one active section, at most one open modal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewController {
    active: Section,
    modal: Option<Modal>,
}

impl ViewController {
    pub fn new() -> Self {
        Self {
            active: Section::Dashboard,
            modal: None,
        }
    }

    pub fn active(&self) -> Section {
        self.active
    }

    pub fn is_visible(&self, section: Section) -> bool {
        self.active == section
    }

    /// Switch sections; returns whether the active section changed.
    /// Switching closes any open modal.
    pub fn show(&mut self, section: Section) -> bool {
        if self.active == section {
            return false;
        }
        self.active = section;
        self.modal = None;
        true
    }

    /// Open a modal, replacing any modal already open
    pub fn open(&mut self, modal: Modal) -> Option<Modal> {
        self.modal.replace(modal)
    }

    pub fn close(&mut self) -> Option<Modal> {
        self.modal.take()
    }

    pub fn modal(&self) -> Option<Modal> {
        self.modal
    }

    /// Invoice selected in the edit modal
    pub fn editing(&self) -> Option<FaturaId> {
        match self.modal {
            Some(Modal::EditInvoice(id)) => Some(id),
            _ => None,
        }
    }
}

impl Default for ViewController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_active_section() {
        let mut controller = ViewController::new();
        assert_eq!(controller.active(), Section::Dashboard);

        assert!(controller.show(Section::Invoices));
        assert!(!controller.show(Section::Invoices));

        let visible: Vec<_> = Section::ALL
            .iter()
            .filter(|s| controller.is_visible(**s))
            .collect();
        assert_eq!(visible, vec![&Section::Invoices]);
    }

    #[test]
    fn test_modal_selection() {
        let mut controller = ViewController::new();
        assert_eq!(controller.editing(), None);

        controller.open(Modal::EditInvoice(4));
        assert_eq!(controller.editing(), Some(4));

        assert_eq!(controller.open(Modal::NewInvoice), Some(Modal::EditInvoice(4)));
        assert_eq!(controller.editing(), None);

        controller.show(Section::Clients);
        assert_eq!(controller.modal(), None);
    }

    #[test]
    fn test_section_parsing() {
        assert_eq!("faturas".parse::<Section>(), Ok(Section::Invoices));
        assert_eq!("Clients".parse::<Section>(), Ok(Section::Clients));
        assert!("settings".parse::<Section>().is_err());
        assert_eq!(Section::Clients.to_string(), "Client Management");
    }
}

//! Views
//!
//! Everything that displays invoices. Views hold no data of their own: the
//! store owns the mounted views and redraws every visible one from its full
//! invoice sequence after each change.
//!
//! - [`ViewController`]: which section is visible, which modal is open
//! - [`render`]: terminal renderers returning `String`
//! - [`TerminalView`]: a [`View`] writing one of those renderings to a writer
//! - [`customers`]: the derived per-installation customer grouping
//! - [`report`]: CSV export

mod controller;
pub mod customers;
pub mod render;
pub mod report;

pub use controller::{Modal, Section, ViewController};
pub use customers::{group_by_installation, Customer};

use std::io::Write;

use crate::dashboard::DashboardStats;
use crate::model::Fatura;
use crate::store::FaturaFilter;

/// A display surface redrawn from the store's current sequence
pub trait View: Send + Sync {
    /// Section this view belongs to; only views of the active section are drawn
    fn section(&self) -> Section;

    /// Redraw from scratch with the full current sequence
    fn render(&mut self, faturas: &[Fatura]);

    /// Show an explicit empty/error state instead of data
    fn render_unavailable(&mut self, message: &str);
}

/// Which rendering a [`TerminalView`] produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Table,
    Cards,
    Dashboard,
    Customers,
}

impl Layout {
    pub fn section(&self) -> Section {
        match self {
            Layout::Table | Layout::Cards => Section::Invoices,
            Layout::Dashboard => Section::Dashboard,
            Layout::Customers => Section::Clients,
        }
    }
}

/// Writes a rendering to any writer (stdout for the CLI)
pub struct TerminalView {
    layout: Layout,
    filter: FaturaFilter,
    out: Box<dyn Write + Send + Sync>,
}

impl TerminalView {
    pub fn new(layout: Layout, out: Box<dyn Write + Send + Sync>) -> Self {
        Self {
            layout,
            filter: FaturaFilter::default(),
            out,
        }
    }

    pub fn stdout(layout: Layout) -> Self {
        Self::new(layout, Box::new(std::io::stdout()))
    }

    /// Only show records matching `filter`
    pub fn with_filter(mut self, filter: FaturaFilter) -> Self {
        self.filter = filter;
        self
    }

    fn compose(&self, faturas: &[Fatura]) -> String {
        let visible = self.filter.apply(faturas);

        match self.layout {
            Layout::Table if visible.is_empty() => render::empty_state(),
            Layout::Table => render::invoice_table(&visible),
            Layout::Cards if visible.is_empty() => render::empty_state(),
            Layout::Cards => render::invoice_cards(&visible),
            Layout::Dashboard => {
                let stats = DashboardStats::compute(&visible);
                let recent = crate::dashboard::recent(&visible, 5);
                render::dashboard_panel(&stats, &recent)
            }
            Layout::Customers => render::customer_table(&group_by_installation(&visible)),
        }
    }

    fn write(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::warn!("Failed to write view output: {}", e);
        }
    }
}

impl View for TerminalView {
    fn section(&self) -> Section {
        self.layout.section()
    }

    fn render(&mut self, faturas: &[Fatura]) {
        tracing::debug!(layout = ?self.layout, records = faturas.len(), "rendering view");
        let text = self.compose(faturas);
        self.write(&text);
    }

    fn render_unavailable(&mut self, message: &str) {
        let text = render::unavailable(message);
        self.write(&text);
    }
}

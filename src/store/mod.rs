//! Invoice Store
//!
//! The single owner of the in-memory invoice sequence. It mirrors the
//! backend's collection, applies each confirmed mutation locally, and
//! redraws the mounted views of the active section before returning.
//!
//! State lives behind a synchronous lock that is never held across a
//! backend call, so [`InvoiceStore::filter`] stays a plain read.
//!
//! Each load takes a ticket when it starts; only the newest load may
//! replace the sequence. Mutations confirmed while that load is in flight
//! are journaled and replayed over its list, so a slow response never
//! drops or resurrects a record the user already changed.

mod confirm;
mod error;
mod filter;
mod process;

pub use confirm::{AlwaysConfirm, Confirm};
pub use error::{StoreError, StoreResult};
pub use filter::{FaturaFilter, PaidStatus};
pub use process::{LogEntry, ProcessLog};

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::client::{ClientError, FaturaBackend};
use crate::dashboard::DashboardStats;
use crate::model::{
    CheckoutSession, Fatura, FaturaId, FaturaInput, HealthResponse, ProcessEmailResponse,
};
use crate::notify::{NotificationLevel, Notifier};
use crate::view::render::format_money;
use crate::view::{group_by_installation, Customer, Modal, Section, View, ViewController};

/// Result of a [`InvoiceStore::load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The sequence was replaced with this many records
    Applied(usize),
    /// A newer load was started; this response was dropped
    Superseded,
}

/// Result of a [`InvoiceStore::pay`]
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentOutcome {
    /// Continue in the browser at `checkout_url`
    Redirect(CheckoutSession),
    /// Demo mode stood in for a failed checkout request
    Simulated,
}

/// A confirmed mutation, as applied to the local sequence
#[derive(Debug, Clone)]
enum Change {
    Upsert(Fatura),
    Remove(FaturaId),
}

struct StoreState {
    faturas: Vec<Fatura>,
    loaded: bool,
    /// Last load failure, shown while nothing has been loaded
    unavailable: Option<String>,
    /// Bumped by every applied load or mutation
    revision: u64,
    /// Ticket of the newest load still in flight
    pending_load: Option<u64>,
    /// Changes confirmed since `pending_load` started
    journal: Vec<Change>,
    controller: ViewController,
    views: Vec<Box<dyn View>>,
}

impl StoreState {
    fn position(&self, id: FaturaId) -> Option<usize> {
        self.faturas.iter().position(|f| f.id == id)
    }

    fn get(&self, id: FaturaId) -> Option<&Fatura> {
        self.faturas.iter().find(|f| f.id == id)
    }

    /// Replace the record with the same id in place, or append it
    fn upsert(&mut self, fatura: Fatura) {
        match self.position(fatura.id) {
            Some(index) => self.faturas[index] = fatura,
            None => self.faturas.push(fatura),
        }
    }

    fn replay(&mut self, change: &Change) {
        match change {
            Change::Upsert(fatura) => self.upsert(fatura.clone()),
            Change::Remove(id) => self.faturas.retain(|f| f.id != *id),
        }
    }

    /// Apply a confirmed mutation, journaling it for the pending load
    fn record(&mut self, change: Change) {
        self.replay(&change);
        self.revision += 1;
        if self.pending_load.is_some() {
            self.journal.push(change);
        }
    }

    /// Full redraw of every view in the active section
    fn redraw(&mut self) {
        let active = self.controller.active();
        let StoreState {
            faturas,
            loaded,
            unavailable,
            views,
            ..
        } = self;

        for view in views.iter_mut().filter(|v| v.section() == active) {
            paint(view.as_mut(), faturas, *loaded, unavailable.as_deref());
        }
    }
}

fn paint(view: &mut dyn View, faturas: &[Fatura], loaded: bool, unavailable: Option<&str>) {
    match unavailable {
        Some(message) if !loaded => view.render_unavailable(message),
        _ if loaded => view.render(faturas),
        _ => {}
    }
}

/// Counts in-flight backend calls; released on drop, including on error
struct BusyGuard<'a>(&'a AtomicUsize);

impl<'a> BusyGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Authoritative in-memory invoice sequence
pub struct InvoiceStore {
    backend: Arc<dyn FaturaBackend>,
    state: RwLock<StoreState>,
    load_seq: AtomicU64,
    busy: AtomicUsize,
    notifier: Notifier,
    demo_mode: bool,
}

impl InvoiceStore {
    pub fn new(backend: Arc<dyn FaturaBackend>, notifier: Notifier) -> Self {
        Self {
            backend,
            state: RwLock::new(StoreState {
                faturas: Vec::new(),
                loaded: false,
                unavailable: None,
                revision: 0,
                pending_load: None,
                journal: Vec::new(),
                controller: ViewController::new(),
                views: Vec::new(),
            }),
            load_seq: AtomicU64::new(0),
            busy: AtomicUsize::new(0),
            notifier,
            demo_mode: false,
        }
    }

    /// Allow [`pay`](Self::pay) to simulate success when checkout fails
    pub fn with_demo_mode(mut self, demo_mode: bool) -> Self {
        self.demo_mode = demo_mode;
        self
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Whether any backend call is in flight
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst) > 0
    }

    // ---- Views ----

    /// Attach a view; it is drawn right away when its section is visible
    /// and there is something to show
    pub fn mount(&self, mut view: Box<dyn View>) {
        let mut state = self.write();
        if state.controller.is_visible(view.section()) {
            paint(
                view.as_mut(),
                &state.faturas,
                state.loaded,
                state.unavailable.as_deref(),
            );
        }
        state.views.push(view);
    }

    /// Make `section` the visible one; redraws its views when it changed
    pub fn show_section(&self, section: Section) -> bool {
        let mut state = self.write();
        let changed = state.controller.show(section);
        if changed {
            tracing::debug!(%section, "section shown");
            state.redraw();
        }
        changed
    }

    pub fn active_section(&self) -> Section {
        self.read().controller.active()
    }

    pub fn modal(&self) -> Option<Modal> {
        self.read().controller.modal()
    }

    pub fn begin_create(&self) {
        self.write().controller.open(Modal::NewInvoice);
    }

    /// Select an invoice for editing; returns its current editable fields
    pub fn begin_edit(&self, id: FaturaId) -> StoreResult<FaturaInput> {
        let input = self.read().get(id).map(FaturaInput::from_fatura);
        let Some(input) = input else {
            return Err(self.fail(StoreError::NotFound(id)));
        };
        self.write().controller.open(Modal::EditInvoice(id));
        Ok(input)
    }

    /// Update the invoice selected by [`begin_edit`](Self::begin_edit)
    pub async fn submit_edit(&self, input: &FaturaInput) -> StoreResult<Fatura> {
        let editing = self.read().controller.editing();
        match editing {
            Some(id) => self.update(id, input).await,
            None => Err(self.fail(StoreError::NothingSelected)),
        }
    }

    pub fn close_modal(&self) -> Option<Modal> {
        self.write().controller.close()
    }

    // ---- Reads ----

    pub fn records(&self) -> Vec<Fatura> {
        self.read().faturas.clone()
    }

    pub fn get(&self, id: FaturaId) -> Option<Fatura> {
        self.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().faturas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().faturas.is_empty()
    }

    pub fn is_loaded(&self) -> bool {
        self.read().loaded
    }

    /// Number of loads and mutations applied so far
    pub fn revision(&self) -> u64 {
        self.read().revision
    }

    /// Matching records in sequence order; never calls the backend
    pub fn filter(&self, filter: &FaturaFilter) -> Vec<Fatura> {
        filter.apply(&self.read().faturas)
    }

    pub fn stats(&self) -> DashboardStats {
        DashboardStats::compute(&self.read().faturas)
    }

    pub fn customers(&self) -> Vec<Customer> {
        group_by_installation(&self.read().faturas)
    }

    // ---- Backend operations ----

    /// Replace the whole sequence with the backend's collection
    pub async fn load(&self) -> StoreResult<LoadOutcome> {
        let ticket = self.load_seq.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.write();
            state.pending_load = Some(ticket);
            state.journal.clear();
        }

        let result = {
            let _busy = BusyGuard::new(&self.busy);
            self.backend.list().await
        };

        let mut state = self.write();
        if state.pending_load != Some(ticket) {
            tracing::debug!(ticket, "discarding superseded invoice list");
            return Ok(LoadOutcome::Superseded);
        }
        state.pending_load = None;
        let journal = std::mem::take(&mut state.journal);

        match result {
            Ok(faturas) => {
                state.faturas = faturas;
                for change in &journal {
                    state.replay(change);
                }
                state.loaded = true;
                state.unavailable = None;
                state.revision += 1;
                state.redraw();

                let count = state.faturas.len();
                if !journal.is_empty() {
                    tracing::debug!(replayed = journal.len(), "re-applied changes confirmed during load");
                }
                tracing::info!(count, "invoices loaded");
                Ok(LoadOutcome::Applied(count))
            }
            Err(e) => {
                let message = e.user_message();
                if !state.loaded {
                    state.unavailable = Some(message.clone());
                    state.redraw();
                }
                drop(state);

                self.notifier
                    .error(format!("Failed to load invoices: {}", message));
                Err(e.into())
            }
        }
    }

    /// Create an invoice and append the backend's record
    pub async fn create(&self, input: &FaturaInput) -> StoreResult<Fatura> {
        self.validate(input)?;

        let result = {
            let _busy = BusyGuard::new(&self.busy);
            self.backend.create(input).await
        };
        let created = self.report(result, "Failed to create invoice")?;

        {
            let mut state = self.write();
            state.record(Change::Upsert(created.clone()));
            if state.controller.modal() == Some(Modal::NewInvoice) {
                state.controller.close();
            }
            state.redraw();
        }

        tracing::info!(id = created.id, "invoice created");
        self.notifier.success("Invoice created successfully");
        Ok(created)
    }

    /// Full replace of one invoice, keeping its position in the sequence
    pub async fn update(&self, id: FaturaId, input: &FaturaInput) -> StoreResult<Fatura> {
        if self.read().position(id).is_none() {
            return Err(self.fail(StoreError::NotFound(id)));
        }
        self.validate(input)?;

        let result = {
            let _busy = BusyGuard::new(&self.busy);
            self.backend.update(id, input).await
        };
        let updated = self.report(result, "Failed to update invoice")?;

        {
            let mut state = self.write();
            if state.position(id).is_none() {
                drop(state);
                tracing::warn!(id, "invoice removed locally while its update was in flight");
                return Err(self.fail(StoreError::NotFound(id)));
            }
            state.record(Change::Upsert(updated.clone()));
            if state.controller.editing() == Some(id) {
                state.controller.close();
            }
            state.redraw();
        }

        tracing::info!(id, "invoice updated");
        self.notifier.success("Invoice updated successfully");
        Ok(updated)
    }

    /// Delete after the user confirms
    pub async fn delete(&self, id: FaturaId, confirm: &dyn Confirm) -> StoreResult<()> {
        let prompt = match self.read().get(id) {
            Some(f) => format!(
                "Delete invoice #{} ({}, {})?",
                f.id,
                f.customer_name,
                format_money(f.total_amount)
            ),
            None => return Err(self.fail(StoreError::NotFound(id))),
        };

        if !confirm.confirm(&prompt) {
            tracing::debug!(id, "deletion cancelled");
            return Err(StoreError::Cancelled);
        }

        let result = {
            let _busy = BusyGuard::new(&self.busy);
            self.backend.delete(id).await
        };
        self.report(result, "Failed to delete invoice")?;

        {
            let mut state = self.write();
            state.record(Change::Remove(id));
            if state.controller.editing() == Some(id) {
                state.controller.close();
            }
            state.redraw();
        }

        tracing::info!(id, "invoice deleted");
        self.notifier.success("Invoice deleted successfully");
        Ok(())
    }

    /// Fetch one invoice and splice it into the sequence
    pub async fn refresh(&self, id: FaturaId) -> StoreResult<Fatura> {
        let result = {
            let _busy = BusyGuard::new(&self.busy);
            self.backend.get(id).await
        };
        let fatura = self.report(result, "Failed to fetch invoice")?;

        {
            let mut state = self.write();
            state.record(Change::Upsert(fatura.clone()));
            state.redraw();
        }
        Ok(fatura)
    }

    /// Start a checkout for an unpaid invoice. The paid flag is never
    /// touched here; it changes on a later load once the backend knows.
    pub async fn pay(&self, id: FaturaId) -> StoreResult<PaymentOutcome> {
        let paid = self.read().get(id).map(|f| f.paid);
        match paid {
            None => return Err(self.fail(StoreError::NotFound(id))),
            Some(true) => {
                let err = StoreError::AlreadyPaid(id);
                self.notifier.warning(err.user_message());
                return Err(err);
            }
            Some(false) => {}
        }

        let result = {
            let _busy = BusyGuard::new(&self.busy);
            self.backend.checkout_session(id).await
        };

        match result {
            Ok(session) => {
                tracing::info!(id, session_id = %session.session_id, "checkout session created");
                self.notifier.info("Redirecting to payment...");
                Ok(PaymentOutcome::Redirect(session))
            }
            Err(e) if self.demo_mode => {
                tracing::warn!(id, error = %e, "checkout failed, simulating payment");
                self.notifier
                    .warning("Demo mode: payment simulated, nothing was charged");
                Ok(PaymentOutcome::Simulated)
            }
            Err(e) => Err(self.fail(StoreError::PaymentUnavailable(e))),
        }
    }

    /// Ask the backend to scrape the mailbox for new invoices, then reload
    pub async fn process_emails(&self, log: &mut ProcessLog) -> StoreResult<ProcessEmailResponse> {
        let started = "Starting email processing...";
        log.push(NotificationLevel::Info, started);
        self.notifier.info(started);

        let result = {
            let _busy = BusyGuard::new(&self.busy);
            self.backend.process_emails().await
        };

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                log.push(NotificationLevel::Error, format!("Processing failed: {}", e));
                self.notifier
                    .error(format!("Failed to process emails: {}", e.user_message()));
                return Err(e.into());
            }
        };

        if !response.is_success() {
            let message = format!("Processing error: {}", response.message);
            log.push(NotificationLevel::Error, &message);
            self.notifier.error(message);
        } else if response.processed > 0 {
            log.push(
                NotificationLevel::Success,
                format!(
                    "Processing finished: {} invoice(s) found, {} saved",
                    response.processed,
                    response.saved.unwrap_or(0)
                ),
            );
            self.notifier.success(format!(
                "Processing finished: {} invoice(s) processed",
                response.processed
            ));
        } else {
            let message = "No new invoices found in the mailbox";
            log.push(NotificationLevel::Info, message);
            self.notifier.info(message);
        }

        // The load reports its own failure
        match self.load().await {
            Ok(_) => log.push(NotificationLevel::Info, "Invoice list reloaded"),
            Err(e) => log.push(
                NotificationLevel::Error,
                format!("Reload failed: {}", e.user_message()),
            ),
        }

        Ok(response)
    }

    pub async fn health(&self) -> StoreResult<HealthResponse> {
        let result = {
            let _busy = BusyGuard::new(&self.busy);
            self.backend.health().await
        };
        self.report(result, "Health check failed")
    }

    // ---- Helpers ----

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn validate(&self, input: &FaturaInput) -> StoreResult<()> {
        input
            .validate()
            .map_err(|message| self.fail(StoreError::Validation(message)))
    }

    /// Report a backend failure once and convert it
    fn report<T>(&self, result: Result<T, ClientError>, context: &str) -> StoreResult<T> {
        result.map_err(|e| {
            self.notifier
                .error(format!("{}: {}", context, e.user_message()));
            StoreError::from(e)
        })
    }

    fn fail(&self, err: StoreError) -> StoreError {
        self.notifier.error(err.user_message());
        err
    }
}

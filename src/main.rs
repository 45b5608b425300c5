//! Faturas CLI
//!
//! Command-line interface for invoice operations:
//! - Dashboard, invoice list, customers
//! - Create, edit, delete, pay
//! - Trigger backend email processing
//! - Switch backend environments

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use faturas::view::render;
use faturas::view::report::csv_report;
use faturas::{
    generate_default_config, AlwaysConfirm, Config, Confirm, EnvironmentSelection, FaturaFilter,
    FaturaId, FaturaInput, HttpBackend, InvoiceStore, Layout, LoggingConfig, Notifier, PaidStatus,
    PaymentOutcome, ProcessEmailResponse, ProcessLog, Section, StoreError, TerminalView,
};

#[derive(Parser)]
#[command(name = "faturas")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Manage energy invoices from the terminal")]
#[command(long_about = "Faturas talks to the Moara Energia invoice backend.\nList, create, edit and pay invoices, and pull new ones from the mailbox.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ~/.config/faturas/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend environment for this run only (local, vercel, ...)
    #[arg(long, global = true)]
    pub env: Option<String>,

    /// Do not ask for confirmation
    #[arg(short, long, global = true)]
    pub yes: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show totals and the most recent invoices
    Dashboard,

    /// List invoices
    List {
        /// Text matched against customer name or installation number
        #[arg(short, long)]
        query: Option<String>,
        /// Paid status (all, paid, pending)
        #[arg(short, long, default_value = "all")]
        status: PaidStatus,
        /// One card per invoice instead of a table
        #[arg(long)]
        cards: bool,
    },

    /// Show one invoice as the backend has it now
    Show {
        id: FaturaId,
    },

    /// List customers, grouped by installation number
    Clients,

    /// Create an invoice
    Create(CreateArgs),

    /// Edit an invoice; omitted fields keep their current value
    Edit {
        id: FaturaId,
        #[command(flatten)]
        fields: EditArgs,
    },

    /// Delete an invoice
    Delete {
        id: FaturaId,
    },

    /// Start the payment of an invoice
    Pay {
        id: FaturaId,
    },

    /// Ask the backend to fetch new invoices from the mailbox
    ProcessEmails,

    /// Check backend connectivity
    Health,

    /// Backend environments
    Env {
        #[command(subcommand)]
        action: EnvCommand,
    },

    /// Export invoices as CSV
    Export {
        #[arg(short, long)]
        query: Option<String>,
        #[arg(short, long, default_value = "all")]
        status: PaidStatus,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum EnvCommand {
    /// List configured environments
    List,
    /// Switch environment and remember the choice
    Use { key: String },
    /// Show the active environment
    Show,
}

#[derive(Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub name: String,
    /// CPF or CNPJ
    #[arg(long)]
    pub document: String,
    #[arg(long, default_value = "")]
    pub email: String,
    #[arg(long)]
    pub installation: String,
    #[arg(long)]
    pub amount: f64,
    /// Reference month label, e.g. JAN/2024
    #[arg(long)]
    pub month: String,
    /// Due date, e.g. 2024-02-10
    #[arg(long)]
    pub due: String,
    #[arg(long)]
    pub pdf: Option<String>,
}

impl From<CreateArgs> for FaturaInput {
    fn from(args: CreateArgs) -> Self {
        FaturaInput {
            customer_name: args.name,
            customer_document: args.document,
            customer_email: args.email,
            installation_number: args.installation,
            total_amount: args.amount,
            reference_month: args.month,
            due_date: args.due,
            pdf_url: args.pdf,
        }
    }
}

#[derive(Args)]
pub struct EditArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub document: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub installation: Option<String>,
    #[arg(long)]
    pub amount: Option<f64>,
    #[arg(long)]
    pub month: Option<String>,
    #[arg(long)]
    pub due: Option<String>,
    #[arg(long)]
    pub pdf: Option<String>,
}

impl EditArgs {
    fn apply(self, input: &mut FaturaInput) {
        if let Some(v) = self.name {
            input.customer_name = v;
        }
        if let Some(v) = self.document {
            input.customer_document = v;
        }
        if let Some(v) = self.email {
            input.customer_email = v;
        }
        if let Some(v) = self.installation {
            input.installation_number = v;
        }
        if let Some(v) = self.amount {
            input.total_amount = v;
        }
        if let Some(v) = self.month {
            input.reference_month = v;
        }
        if let Some(v) = self.due {
            input.due_date = v;
        }
        if self.pdf.is_some() {
            input.pdf_url = self.pdf;
        }
    }
}

/// A failure the backend reported in a success response, already notified
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct Reported(String);

/// Whether the failure was already shown through a notification
fn already_reported(e: &anyhow::Error) -> bool {
    e.is::<StoreError>() || e.is::<Reported>()
}

/// An error status in the body fails the command like a failed request
fn processing_result(response: &ProcessEmailResponse) -> Result<(), Reported> {
    if response.is_success() {
        Ok(())
    } else {
        Err(Reported(response.message.clone()))
    }
}

/// Asks on stderr, reads the answer from stdin
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        eprint!("{} [y/N] ", prompt);
        let _ = std::io::stderr().flush();

        let mut answer = String::new();
        if std::io::stdin().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(
            answer.trim().to_lowercase().as_str(),
            "y" | "yes" | "s" | "sim"
        )
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let selection = EnvironmentSelection::default_location();
    let mut config = Config::resolve(cli.config.as_deref(), &selection)
        .context("Failed to load configuration")?;
    if let Some(env) = &cli.env {
        config.use_environment(env)?;
    }

    init_logging(&config.logging)?;
    for issue in config.validate() {
        tracing::warn!("{}", issue);
    }

    let notifier = Notifier::new(Duration::from_secs(config.notifications.ttl_secs));
    let result = run(cli, &mut config, &selection, &notifier).await;

    for notification in notifier.drain() {
        eprintln!("{}", notification);
    }

    match result {
        Ok(()) => Ok(()),
        // Already reported through the notifications above
        Err(e) if already_reported(&e) => std::process::exit(1),
        Err(e) => Err(e),
    }
}

fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("faturas={}", config.level)))
        .unwrap_or_else(|_| EnvFilter::new("faturas=warn"));

    let writer = match &config.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format.as_str() {
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .boxed(),
        _ => tracing_subscriber::fmt::layer().with_writer(writer).boxed(),
    };

    tracing_subscriber::registry().with(layer).with(filter).init();
    Ok(())
}

fn open_store(config: &Config, notifier: &Notifier) -> anyhow::Result<InvoiceStore> {
    let backend = HttpBackend::from_config(config)?;
    tracing::debug!("Using backend at {}", backend.base_url());

    Ok(InvoiceStore::new(Arc::new(backend), notifier.clone()).with_demo_mode(config.backend.demo_mode))
}

fn build_filter(query: Option<String>, status: PaidStatus) -> FaturaFilter {
    let filter = FaturaFilter::new().with_status(status);
    match query {
        Some(q) => filter.with_query(q),
        None => filter,
    }
}

fn write_output(output: Option<PathBuf>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(&path, content)
                .with_context(|| format!("Failed to write {:?}", path))?;
            println!("Written to {:?}", path);
        }
        None => print!("{}", content),
    }
    Ok(())
}

async fn run(
    cli: Cli,
    config: &mut Config,
    selection: &EnvironmentSelection,
    notifier: &Notifier,
) -> anyhow::Result<()> {
    match cli.command {
        Commands::Dashboard => {
            let store = open_store(config, notifier)?;
            store.mount(Box::new(TerminalView::stdout(Layout::Dashboard)));
            store.load().await?;
        }

        Commands::List {
            query,
            status,
            cards,
        } => {
            let store = open_store(config, notifier)?;
            let layout = if cards { Layout::Cards } else { Layout::Table };
            store.show_section(Section::Invoices);
            store.mount(Box::new(
                TerminalView::stdout(layout).with_filter(build_filter(query, status)),
            ));
            store.load().await?;
        }

        Commands::Show { id } => {
            let store = open_store(config, notifier)?;
            let fatura = store.refresh(id).await?;
            print!("{}", render::invoice_detail(&fatura));
        }

        Commands::Clients => {
            let store = open_store(config, notifier)?;
            store.show_section(Section::Clients);
            store.mount(Box::new(TerminalView::stdout(Layout::Customers)));
            store.load().await?;
        }

        Commands::Create(args) => {
            let store = open_store(config, notifier)?;
            store.begin_create();
            let created = store.create(&FaturaInput::from(args)).await?;
            print!("{}", render::invoice_detail(&created));
        }

        Commands::Edit { id, fields } => {
            let store = open_store(config, notifier)?;
            store.load().await?;

            let mut input = store.begin_edit(id)?;
            fields.apply(&mut input);
            let updated = store.submit_edit(&input).await?;
            print!("{}", render::invoice_detail(&updated));
        }

        Commands::Delete { id } => {
            let store = open_store(config, notifier)?;
            store.load().await?;

            let confirm: Box<dyn Confirm> = if cli.yes {
                Box::new(AlwaysConfirm)
            } else {
                Box::new(StdinConfirm)
            };

            match store.delete(id, confirm.as_ref()).await {
                Ok(()) => println!("Deleted invoice #{}", id),
                Err(StoreError::Cancelled) => println!("Deletion cancelled"),
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Pay { id } => {
            let store = open_store(config, notifier)?;
            store.load().await?;

            match store.pay(id).await? {
                PaymentOutcome::Redirect(session) => {
                    println!("Open this address to complete the payment:");
                    println!("  {}", session.checkout_url);
                    println!();
                    println!("The invoice shows as paid once the backend confirms it.");
                }
                PaymentOutcome::Simulated => {
                    println!("Payment simulated (demo mode). Nothing was charged.");
                }
            }
        }

        Commands::ProcessEmails => {
            let store = open_store(config, notifier)?;
            let mut log = ProcessLog::new();
            let result = store.process_emails(&mut log).await;

            for entry in log.entries() {
                println!("{}", entry);
            }
            let response = result?;
            processing_result(&response)?;

            if let Some(saved) = response.saved {
                println!();
                println!("Processed: {}  Saved: {}", response.processed, saved);
            }
            println!("{} invoice(s) loaded", store.len());
        }

        Commands::Health => {
            let store = open_store(config, notifier)?;
            println!("Backend:     {}", config.base_url());
            let health = store.health().await?;
            print!("{}", render::health_report(&health));
        }

        Commands::Env { action } => match action {
            EnvCommand::List => {
                let active = config.backend.environment.clone();
                for (key, env) in &config.environments {
                    let marker = if *key == active { "*" } else { " " };
                    println!(
                        "{} {:<10} {} {:<28} {}",
                        marker, key, env.icon, env.name, env.api_url
                    );
                }
            }
            EnvCommand::Use { key } => {
                config.switch_environment(&key, selection)?;
                println!("Environment set to {} ({})", key, config.base_url());
            }
            EnvCommand::Show => {
                let info = config.environment_info();
                println!("Environment: {} {} ({})", info.icon, info.name, info.key);
                println!("API URL:     {}", info.api_url);
                println!(
                    "Production:  {}",
                    if info.is_production { "yes" } else { "no" }
                );
                if config.backend.demo_mode {
                    println!("Demo mode:   on");
                }
            }
        },

        Commands::Export {
            query,
            status,
            output,
        } => {
            let store = open_store(config, notifier)?;
            store.load().await?;

            let faturas = store.filter(&build_filter(query, status));
            let csv = csv_report(&faturas).context("Failed to build CSV report")?;
            write_output(output, &csv)?;
        }

        Commands::Config { output } => {
            write_output(output, &generate_default_config())?;
        }
    }

    Ok(())
}

use std::{fs, path::PathBuf, str::FromStr, time::Duration};

use agritrace::{
    assembler::{EntryView, ExitView, UsageView},
    auth::Identity,
    config,
    generation::{ViewSlot, ViewState},
    handlers::AppServices,
    models::{NewEntry, NewExit, NewProduct, NewUsage, Product},
    query::{self, QueryFacade},
    services::{AccountSummary, AnalyticsReport, BatchLabel, TraceQuery, TraceReport},
};
use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize(cli.user)?;

    match cli.command {
        Commands::Products(command) => handle_products_command(&context, command, cli.json).await?,
        Commands::Entries(command) => handle_entries_command(&context, command, cli.json).await?,
        Commands::Exits(command) => handle_exits_command(&context, command, cli.json).await?,
        Commands::Usage(command) => handle_usage_command(&context, command, cli.json).await?,
        Commands::Trace(args) => handle_trace(&context, args, cli.json).await?,
        Commands::Analytics(args) => handle_analytics(&context, args, cli.json).await?,
        Commands::Label(args) => handle_label(&context, args, cli.json).await?,
        Commands::Me => handle_me(&context, cli.json).await?,
        Commands::Dashboard(args) => handle_dashboard(&context, args, cli.json).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "agritrace", about = "Organic supply-chain tracking from the command line")]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[arg(long, global = true, help = "User id to act as")]
    user: Option<Uuid>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(subcommand)]
    Products(ProductsCommands),
    #[command(subcommand)]
    Entries(EntriesCommands),
    #[command(subcommand)]
    Exits(ExitsCommands),
    #[command(subcommand)]
    Usage(UsageCommands),
    /// Chain-of-custody lookup by batch number or product name
    Trace(TraceArgs),
    /// Totals and distributions, optionally exported as JSON
    Analytics(AnalyticsArgs),
    /// QR label payload for one of your entries
    Label(LabelArgs),
    /// Your profile and role
    Me,
    /// Entries, exits and usage side by side
    Dashboard(DashboardArgs),
}

#[derive(Subcommand)]
enum ProductsCommands {
    List,
    Add(AddProductArgs),
}

#[derive(Subcommand)]
enum EntriesCommands {
    List,
    Add(AddEntryArgs),
}

#[derive(Subcommand)]
enum ExitsCommands {
    List,
    Add(AddExitArgs),
}

#[derive(Subcommand)]
enum UsageCommands {
    List,
    Add(AddUsageArgs),
}

#[derive(Args)]
struct AddProductArgs {
    #[arg(long, help = "Display name for the product")]
    name: String,
    #[arg(long, help = "Optional long-form description")]
    description: Option<String>,
    #[arg(long, help = "Category, e.g. Millets")]
    category: String,
    #[arg(long, help = "Unit quantities are recorded in, e.g. kg")]
    unit: String,
    #[arg(long, help = "Region the product comes from")]
    origin: String,
    #[arg(long, help = "Organic certification, e.g. NPOP")]
    certification: String,
}

#[derive(Args)]
struct AddEntryArgs {
    #[arg(long, help = "Product id")]
    product: Uuid,
    #[arg(long, value_parser = parse_decimal, help = "Quantity received")]
    quantity: Decimal,
    #[arg(long, help = "Batch number (3-50 characters)")]
    batch: String,
    #[arg(long, help = "User id the batch was received from")]
    from: Option<Uuid>,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Args)]
struct AddExitArgs {
    #[arg(long, help = "Entry id the goods leave from")]
    entry: Uuid,
    #[arg(long, value_parser = parse_decimal, help = "Quantity shipped out")]
    quantity: Decimal,
    #[arg(long, help = "User id the goods are assigned to")]
    to: Option<Uuid>,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Args)]
struct AddUsageArgs {
    #[arg(long, help = "Entry id the goods were taken from")]
    entry: Uuid,
    #[arg(long, value_parser = parse_decimal, help = "Quantity used")]
    quantity: Decimal,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct TraceArgs {
    #[arg(long, help = "Exact batch number")]
    batch: Option<String>,
    #[arg(long, help = "Part of a product name")]
    product: Option<String>,
}

#[derive(Args)]
struct AnalyticsArgs {
    #[arg(long, help = "Write the report as JSON to this file")]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct LabelArgs {
    #[arg(long, help = "Entry id")]
    entry: Uuid,
}

#[derive(Args)]
struct DashboardArgs {
    #[arg(long, help = "Refresh every N seconds until interrupted")]
    watch: Option<u64>,
}

struct CliContext {
    services: AppServices,
    user: Option<Uuid>,
}

impl CliContext {
    fn initialize(user: Option<Uuid>) -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let client = query::connect(&config).context("failed to set up table backend")?;
        Ok(Self {
            services: AppServices::new(QueryFacade::new(client)),
            user,
        })
    }

    fn identity(&self) -> Result<Identity> {
        self.user
            .map(Identity::new)
            .ok_or_else(|| anyhow!("this command needs --user <UUID>"))
    }
}

async fn handle_products_command(
    context: &CliContext,
    command: ProductsCommands,
    json: bool,
) -> Result<()> {
    let identity = context.identity()?;
    let service = &context.services.products;
    let products = match command {
        ProductsCommands::List => service.list(&identity).await?,
        ProductsCommands::Add(args) => {
            let draft = NewProduct {
                name: args.name,
                description: args.description,
                category: args.category,
                unit: args.unit,
                origin: args.origin,
                certification: args.certification,
            };
            service
                .create(&identity, draft)
                .await
                .context("failed to create product")?
        }
    };

    if json {
        return print_json(&products);
    }
    if products.is_empty() {
        println!("No products yet.");
    }
    products.iter().for_each(render_product);
    Ok(())
}

async fn handle_entries_command(
    context: &CliContext,
    command: EntriesCommands,
    json: bool,
) -> Result<()> {
    let identity = context.identity()?;
    let service = &context.services.entries;
    let entries = match command {
        EntriesCommands::List => service.list(&identity).await?,
        EntriesCommands::Add(args) => {
            let draft = NewEntry {
                product_id: Some(args.product),
                quantity: Some(args.quantity),
                batch_number: args.batch,
                received_from: args.from,
                notes: args.notes,
            };
            service
                .create(&identity, draft)
                .await
                .context("failed to record entry")?
        }
    };

    if json {
        return print_json(&entries);
    }
    entries.iter().for_each(render_entry);
    Ok(())
}

async fn handle_exits_command(
    context: &CliContext,
    command: ExitsCommands,
    json: bool,
) -> Result<()> {
    let identity = context.identity()?;
    let service = &context.services.exits;
    let exits = match command {
        ExitsCommands::List => service.list(&identity).await?,
        ExitsCommands::Add(args) => {
            let draft = NewExit {
                entry_product_id: Some(args.entry),
                quantity: Some(args.quantity),
                assigned_to: args.to,
                notes: args.notes,
            };
            service
                .create(&identity, draft)
                .await
                .context("failed to record exit")?
        }
    };

    if json {
        return print_json(&exits);
    }
    exits.iter().for_each(render_exit);
    Ok(())
}

async fn handle_usage_command(
    context: &CliContext,
    command: UsageCommands,
    json: bool,
) -> Result<()> {
    let identity = context.identity()?;
    let service = &context.services.usage;
    let usage = match command {
        UsageCommands::List => service.list(&identity).await?,
        UsageCommands::Add(args) => {
            let draft = NewUsage {
                entry_product_id: Some(args.entry),
                quantity: Some(args.quantity),
                notes: args.notes,
            };
            service
                .create(&identity, draft)
                .await
                .context("failed to record usage")?
        }
    };

    if json {
        return print_json(&usage);
    }
    usage.iter().for_each(render_usage);
    Ok(())
}

async fn handle_trace(context: &CliContext, args: TraceArgs, json: bool) -> Result<()> {
    let query = match (args.batch, args.product) {
        (Some(batch), _) => TraceQuery::Batch(batch),
        (None, Some(product)) => TraceQuery::Product(product),
        (None, None) => return Err(anyhow!("pass --batch or --product")),
    };
    let report = context.services.trace.search(&query).await?;

    if json {
        return print_json(&report);
    }
    render_trace(&report);
    Ok(())
}

async fn handle_analytics(context: &CliContext, args: AnalyticsArgs, json: bool) -> Result<()> {
    let report = context.services.analytics.report().await?;

    if let Some(path) = args.output {
        fs::write(&path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Report written to {}", path.display());
        return Ok(());
    }
    if json {
        return print_json(&report);
    }
    render_analytics(&report);
    Ok(())
}

async fn handle_label(context: &CliContext, args: LabelArgs, json: bool) -> Result<()> {
    let identity = context.identity()?;
    let label: BatchLabel = context
        .services
        .labels
        .for_entry(&identity, args.entry)
        .await?;

    if json {
        return print_json(&label);
    }
    println!("{}", label.file_name);
    println!("{}", label.encoded);
    Ok(())
}

async fn handle_me(context: &CliContext, json: bool) -> Result<()> {
    let identity = context.identity()?;
    let summary: AccountSummary = context.services.account.summary(&identity).await?;

    if json {
        return print_json(&summary);
    }
    let name = summary
        .profile
        .as_ref()
        .map(|p| p.full_name.as_str())
        .unwrap_or("(no profile)");
    let role = summary
        .role
        .map(|r| r.to_string())
        .unwrap_or_else(|| "(no role)".to_string());
    println!("{} • {} • {}", summary.user_id, name, role);
    Ok(())
}

#[derive(Serialize)]
struct DashboardSnapshot {
    entries: ViewState<EntryView>,
    exits: ViewState<ExitView>,
    usage: ViewState<UsageView>,
}

async fn handle_dashboard(context: &CliContext, args: DashboardArgs, json: bool) -> Result<()> {
    let identity = context.identity()?;
    let services = &context.services;
    let entries = ViewSlot::new();
    let exits = ViewSlot::new();
    let usage = ViewSlot::new();

    loop {
        tokio::join!(
            entries.refresh(services.entries.list(&identity)),
            exits.refresh(services.exits.list(&identity)),
            usage.refresh(services.usage.list(&identity)),
        );
        let snapshot = DashboardSnapshot {
            entries: entries.snapshot().await,
            exits: exits.snapshot().await,
            usage: usage.snapshot().await,
        };

        if json {
            print_json(&snapshot)?;
        } else {
            render_section("Entries", &snapshot.entries, render_entry);
            render_section("Exits", &snapshot.exits, render_exit);
            render_section("Used today", &snapshot.usage, render_usage);
        }

        match args.watch {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs.max(1))).await,
            None => break,
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_section<T>(title: &str, state: &ViewState<T>, render: fn(&T)) {
    println!("== {} ==", title);
    if let Some(error) = &state.error {
        println!("! {}", error);
    }
    state.rows.iter().for_each(render);
}

fn render_product(product: &Product) {
    println!(
        "- {} • {} • {} • {}",
        product.id,
        product.name,
        product.category.as_deref().unwrap_or("-"),
        product.origin.as_deref().unwrap_or("-"),
    );
}

fn render_entry(entry: &EntryView) {
    println!(
        "- {} • batch {} • {} × {}{}",
        entry.entry.id,
        entry.entry.batch_number,
        entry.product_name,
        entry.entry.quantity,
        entry
            .source_name
            .as_ref()
            .map(|name| format!(" • from {}", name))
            .unwrap_or_default(),
    );
}

fn render_exit(exit: &ExitView) {
    println!(
        "- {} • batch {} • {} × {}{}",
        exit.exit.id,
        exit.batch_number.as_deref().unwrap_or("-"),
        exit.product_name.as_deref().unwrap_or("-"),
        exit.exit.quantity,
        exit.assignee_name
            .as_ref()
            .map(|name| format!(" • to {}", name))
            .unwrap_or_default(),
    );
}

fn render_usage(usage: &UsageView) {
    println!("- {} • {} × {}", usage.id, usage.product_name, usage.quantity);
}

fn render_trace(report: &TraceReport) {
    println!("{} ({})", report.product.name, report.product.id);
    if report.timeline.is_empty() {
        println!("No supply-chain events recorded yet.");
    }
    for entry in &report.timeline {
        let event = &entry.event;
        println!(
            "{:>3}. {} • batch {} • {} → {} • {}",
            entry.step,
            event.event.event_type,
            event.event.batch_number,
            event.from_name.as_deref().unwrap_or("-"),
            event.to_name.as_deref().unwrap_or("-"),
            event
                .event
                .timestamp
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "-".to_string()),
        );
    }
}

fn render_analytics(report: &AnalyticsReport) {
    let totals = &report.totals;
    println!(
        "products {} • entries {} • exits {} • events {}",
        totals.products, totals.entries, totals.exits, totals.events
    );
    println!("Entries by product:");
    for bucket in &report.entries_by_product {
        println!("  {:<30} {}", bucket.label, bucket.count);
    }
    println!("Events by type:");
    for bucket in &report.events_by_type {
        println!("  {:<30} {}", bucket.label, bucket.count);
    }
}

fn parse_decimal(raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw).map_err(|_| format!("invalid decimal '{raw}'"))
}

//! fx-cache CLI - inspect and refresh cached exchange rates
//!
//! ## Example Usage
//!
//! ```bash
//! # Show cached rates and their age
//! fx-cache rates
//!
//! # Convert into the preferred currency
//! fx-cache convert 25 USD
//!
//! # Set the preferred currency
//! fx-cache prefer MYR
//!
//! # Total several balances
//! fx-cache total 1200:MYR 300:USD 50:EUR
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;
use fx_ratecache::config::{default_config_path, FxConfig};
use fx_ratecache::currency::{format_amount, CurrencyCode, KNOWN_CURRENCIES};
use fx_ratecache::data::fx::{total_in, unpriced_codes, CacheStatus, RateCache};
use fx_ratecache::data::sources::{ConfiguredProvider, RateProvider};
use fx_ratecache::error::RateCacheError;
use fx_ratecache::preference::PreferenceStore;
use fx_ratecache::storage::FileStore;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

type Cache = RateCache<ConfiguredProvider, Arc<FileStore>>;
type CliResult = Result<(), Box<dyn std::error::Error>>;

/// fx-cache: cached exchange rates for expense tracking
#[derive(Parser)]
#[command(name = "fx-cache")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Cached exchange rates and currency conversion", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the cached rate table
    Rates {
        /// Refresh before printing, even if the rates are fresh
        #[arg(short, long)]
        refresh: bool,
    },

    /// Fetch new rates from the configured provider
    Refresh,

    /// Convert an amount between currencies
    Convert {
        #[arg(value_name = "AMOUNT", allow_hyphen_values = true)]
        amount: f64,

        #[arg(value_name = "FROM")]
        from: String,

        /// Target currency (default: preferred currency)
        #[arg(value_name = "TO")]
        to: Option<String>,

        /// Fail instead of assuming parity for currencies without a rate
        #[arg(short, long)]
        strict: bool,
    },

    /// Show or set the preferred display currency
    Prefer {
        #[arg(value_name = "CODE")]
        code: Option<String>,

        /// Forget the stored preference
        #[arg(long, conflicts_with = "code")]
        clear: bool,
    },

    /// Sum balances held in different currencies
    Total {
        /// Balances as AMOUNT:CODE, e.g. 1200:MYR
        #[arg(value_name = "AMOUNT:CODE", required = true, allow_hyphen_values = true)]
        balances: Vec<String>,

        /// Currency for the total (default: preferred currency)
        #[arg(short, long)]
        to: Option<String>,
    },

    /// Show configuration and cache status
    Info,
}

struct App {
    cache: Cache,
    prefs: PreferenceStore<Arc<FileStore>>,
    config: FxConfig,
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = FxConfig::load(cli.config.as_deref());
    let app = match App::open(config, cli.verbose) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    };

    if cli.verbose {
        println!(
            "{} v{}",
            "fx-cache".cyan().bold(),
            env!("CARGO_PKG_VERSION")
        );
        println!(
            "Data dir: {}",
            app.config.data_dir.display().to_string().dimmed()
        );
    }

    let result = match cli.command {
        Commands::Rates { refresh } => show_rates(&app, refresh).await,
        Commands::Refresh => refresh_rates(&app).await,
        Commands::Convert {
            amount,
            from,
            to,
            strict,
        } => convert(&app, amount, &from, to.as_deref(), strict).await,
        Commands::Prefer { code, clear } => prefer(&app, code.as_deref(), clear),
        Commands::Total { balances, to } => total(&app, &balances, to.as_deref()).await,
        Commands::Info => show_info(&app).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

impl App {
    fn open(config: FxConfig, verbose: bool) -> Result<Self, RateCacheError> {
        let store = Arc::new(config.open_store()?);
        let provider =
            ConfiguredProvider::from_config(&config.provider, config.request_timeout_secs)?;
        let cache = RateCache::builder(provider, Arc::clone(&store))
            .ttl(config.ttl())
            .build();

        Ok(Self {
            cache,
            prefs: PreferenceStore::new(store),
            config,
            verbose,
        })
    }

    /// Restore cached rates, waiting for the background refresh if one starts
    async fn ready(&self) {
        let init = self.cache.initialize();
        if let Some(handle) = init.refresh {
            let spinner = updating_spinner();
            let outcome = handle.await;
            spinner.finish_and_clear();

            match outcome {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn_stale(&e, init.restored),
                Err(e) => warn_stale(&RateCacheError::ProviderUnavailable(e.to_string()), init.restored),
            }
        }
    }

    fn target_or_preference(&self, to: Option<&str>) -> Result<CurrencyCode, RateCacheError> {
        match to {
            Some(code) => CurrencyCode::parse(code),
            None => Ok(self.prefs.load()),
        }
    }
}

fn updating_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Rates updating…");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn warn_stale(error: &RateCacheError, have_rates: bool) {
    let fallback = if have_rates {
        "showing last known rates"
    } else {
        "no rates available, amounts shown at parity"
    };
    eprintln!("{} {} ({})", "Warning:".yellow(), error, fallback);
}

async fn show_rates(app: &App, force_refresh: bool) -> CliResult {
    app.ready().await;
    if force_refresh {
        refresh_with_spinner(app).await?;
    }

    let Some(entry) = app.cache.snapshot() else {
        println!("{}", "No rates cached yet".yellow());
        return Ok(());
    };

    let preferred = app.prefs.load();
    println!(
        "{} per 1 {} (captured {})",
        "Exchange rates".bold(),
        "USD".cyan(),
        entry.timestamp.format("%Y-%m-%d %H:%M UTC")
    );
    for (code, rate) in entry.rates.iter() {
        let line = format!("  {:<4} {:>14.4}", code, rate);
        if code == preferred {
            println!("{}", line.green().bold());
        } else {
            println!("{}", line);
        }
    }
    print_freshness(app);
    Ok(())
}

async fn refresh_rates(app: &App) -> CliResult {
    // A stale cache already starts a refresh; wait for that one instead of fetching twice.
    let init = app.cache.initialize();
    let entry = match init.refresh {
        Some(handle) => {
            let spinner = updating_spinner();
            let outcome = handle.await;
            spinner.finish_and_clear();
            outcome??
        }
        None => refresh_with_spinner(app).await?,
    };
    println!(
        "{} {} rates via {}",
        "✓".green(),
        entry.rates.len(),
        app.cache.provider().name()
    );
    Ok(())
}

async fn refresh_with_spinner(
    app: &App,
) -> Result<Arc<fx_ratecache::data::fx::CacheEntry>, RateCacheError> {
    let spinner = updating_spinner();
    let outcome = app.cache.refresh().await;
    spinner.finish_and_clear();
    outcome
}

async fn convert(app: &App, amount: f64, from: &str, to: Option<&str>, strict: bool) -> CliResult {
    let from = CurrencyCode::parse(from)?;
    let to = app.target_or_preference(to)?;
    app.ready().await;

    let converted = if strict {
        app.cache.try_convert(amount, from, to)?
    } else {
        for code in unpriced_codes(&app.cache.rates(), &[(amount, from), (0.0, to)]) {
            eprintln!("{} no rate for {}, assuming parity", "Warning:".yellow(), code);
        }
        app.cache.convert(amount, from, to)
    };

    println!(
        "{} = {}",
        format_amount(amount, from),
        format_amount(converted, to).bold()
    );
    if app.verbose {
        print_freshness(app);
    }
    Ok(())
}

fn prefer(app: &App, code: Option<&str>, clear: bool) -> CliResult {
    if clear {
        app.prefs.clear()?;
        println!("Preferred currency reset to {}", app.prefs.load());
        return Ok(());
    }

    match code {
        Some(code) => {
            let code = CurrencyCode::parse(code)?;
            if code.info().is_none() {
                eprintln!(
                    "{} {} is not a listed currency; conversions may assume parity",
                    "Warning:".yellow(),
                    code
                );
            }
            app.prefs.save(code)?;
            println!("{} Preferred currency set to {}", "✓".green(), code.to_string().bold());
        }
        None => println!("{}", app.prefs.load()),
    }
    Ok(())
}

async fn total(app: &App, balances: &[String], to: Option<&str>) -> CliResult {
    let to = app.target_or_preference(to)?;
    let parsed = balances
        .iter()
        .map(|raw| parse_balance(raw))
        .collect::<Result<Vec<_>, _>>()?;
    app.ready().await;

    let table = app.cache.rates();
    for code in unpriced_codes(&table, &parsed) {
        eprintln!("{} no rate for {}, assuming parity", "Warning:".yellow(), code);
    }

    for (amount, code) in &parsed {
        println!(
            "  {:>16}  →  {}",
            format_amount(*amount, *code),
            format_amount(table.convert(*amount, *code, to), to)
        );
    }
    println!(
        "{} {}",
        "Total:".bold(),
        format_amount(total_in(&table, &parsed, to), to).bold()
    );
    Ok(())
}

fn parse_balance(raw: &str) -> Result<(f64, CurrencyCode), Box<dyn std::error::Error>> {
    let (amount, code) = raw
        .rsplit_once(':')
        .ok_or_else(|| format!("Expected AMOUNT:CODE, got {:?}", raw))?;
    let amount: f64 = amount
        .trim()
        .parse()
        .map_err(|e| format!("Invalid amount in {:?}: {}", raw, e))?;
    Ok((amount, CurrencyCode::parse(code)?))
}

async fn show_info(app: &App) -> CliResult {
    app.ready().await;

    println!("{}", "Configuration".bold());
    println!("  Config file:  {}", default_config_path().display());
    println!("  Data dir:     {}", app.config.data_dir.display());
    println!("  Provider:     {}", app.cache.provider().name());
    println!("  TTL:          {} min", app.config.ttl().num_minutes());
    println!();

    println!("{}", "Cache".bold());
    println!("  Preferred:    {}", app.prefs.load());
    match app.cache.snapshot() {
        Some(entry) => {
            println!("  Currencies:   {}", entry.rates.len());
            println!("  Captured:     {}", entry.timestamp.to_rfc3339());
        }
        None => println!("  Currencies:   {}", "none cached".yellow()),
    }
    print_freshness(app);
    println!();

    println!("{}", "Listed currencies".bold());
    let listed: Vec<&str> = KNOWN_CURRENCIES.iter().map(|info| info.code).collect();
    println!("  {}", listed.join(" "));
    Ok(())
}

fn print_freshness(app: &App) {
    match (app.cache.status(), app.cache.age()) {
        (CacheStatus::Fresh, Some(age)) => {
            println!("  Status:       {} ({} min old)", "fresh".green(), age.num_minutes())
        }
        (_, Some(age)) => println!(
            "  Status:       {} ({} min old, rates may be outdated)",
            "stale".yellow(),
            age.num_minutes()
        ),
        (_, None) => println!("  Status:       {}", "empty".red()),
    }
}

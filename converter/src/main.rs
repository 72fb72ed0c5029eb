//! csv2ynab CLI - Convert bank statement CSV files to YNAB imports
//!
//! # Main Commands
//!
//! ```bash
//! csv2ynab convert statement.csv             # Write ynab-import-<today>.csv
//! csv2ynab convert statement.csv -o -        # Write to stdout
//! csv2ynab preview statement.csv --auto-clean
//! csv2ynab inspect statement.csv             # Show detected layout and mapping
//! ```
//!
//! # Cached configurations
//!
//! ```bash
//! csv2ynab config list
//! csv2ynab config show statement.csv
//! csv2ynab config forget statement.csv
//! ```

use clap::{Args, Parser, Subcommand};
use csv2ynab::logs::LOG_BROADCASTER;
use csv2ynab::transform::pipeline::{format_delimiter, start_session};
use csv2ynab::{
    default_file_name, parse_file, preview, storage_key, to_ynab_csv, write_ynab_csv,
    CanonicalRow, ConfigRegistry, Conversion, ConvertOptions, DateFormat, DecimalSeparator,
    MappingConfig, MappingOverrides, PayeeRule, ProcessingStats, Settings,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "csv2ynab")]
#[command(about = "Convert bank statement CSV files to the YNAB import format", long_about = None)]
struct Cli {
    /// Don't print progress messages
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full conversion: bank CSV → YNAB CSV
    Convert {
        /// Input CSV file
        input: PathBuf,

        /// Output file, `-` for stdout (default: ynab-import-<today>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Show the first converted rows and statistics without writing anything
    Preview {
        /// Input CSV file
        input: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Show encoding, delimiter, headers and the proposed mapping
    Inspect {
        /// Input CSV file
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,
    },

    /// Manage cached mapping configurations
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// List all cached configurations
    List,

    /// Show the cached configuration for a file's headers
    Show {
        /// Input CSV file
        input: PathBuf,
        #[arg(short, long)]
        delimiter: Option<char>,
    },

    /// Delete the cached configuration for a file's headers
    Forget {
        /// Input CSV file
        input: PathBuf,
        #[arg(short, long)]
        delimiter: Option<char>,
    },
}

/// Options shared by `convert` and `preview`
#[derive(Args)]
struct RunArgs {
    /// CSV delimiter (auto-detect if not specified)
    #[arg(short, long)]
    delimiter: Option<char>,

    /// Use this mapping configuration (JSON) instead of the cached one
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the configuration used to a JSON file
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Neither read nor write the configuration cache
    #[arg(long)]
    no_cache: bool,

    #[command(flatten)]
    mapping: MappingArgs,
}

/// Changes on top of the cached or detected mapping
#[derive(Args)]
struct MappingArgs {
    #[arg(long)]
    date_column: Option<String>,

    #[arg(long)]
    payee_column: Option<String>,

    #[arg(long)]
    memo_column: Option<String>,

    /// Signed amount column (single mode)
    #[arg(long)]
    amount_column: Option<String>,

    /// Outflow column (switches to separate mode)
    #[arg(long)]
    outflow_column: Option<String>,

    /// Inflow column (switches to separate mode)
    #[arg(long)]
    inflow_column: Option<String>,

    /// `auto` or a pattern such as dd/MM/yyyy
    #[arg(long)]
    date_format: Option<String>,

    /// `.` or `,`
    #[arg(long)]
    decimal_separator: Option<DecimalSeparator>,

    /// Positive amounts are outflows
    #[arg(long)]
    positive_outflow: bool,

    /// Keep rows whose amount is empty
    #[arg(long)]
    keep_empty_amount: bool,

    /// Don't trim payee and memo
    #[arg(long)]
    no_trim: bool,

    /// Strip common card-terminal noise from payees
    #[arg(long)]
    auto_clean: bool,

    /// Payee replacement rule MATCH=REPLACEMENT (repeatable)
    #[arg(long = "rule", value_name = "MATCH=REPLACEMENT")]
    rules: Vec<PayeeRule>,

    /// Exchange payee and memo columns (before --payee-column/--memo-column)
    #[arg(long)]
    swap_payee_memo: bool,
}

impl MappingArgs {
    fn into_overrides(self) -> MappingOverrides {
        MappingOverrides {
            date_column: self.date_column,
            payee_column: self.payee_column,
            memo_column: self.memo_column,
            amount_column: self.amount_column,
            outflow_column: self.outflow_column,
            inflow_column: self.inflow_column,
            date_format: self.date_format.map(DateFormat::from),
            decimal_separator: self.decimal_separator,
            positive_outflow: self.positive_outflow,
            keep_empty_amount: self.keep_empty_amount,
            no_trim: self.no_trim,
            auto_clean: self.auto_clean,
            rules: self.rules,
            swap_payee_memo: self.swap_payee_memo,
        }
    }
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    LOG_BROADCASTER.set_quiet(cli.quiet);
    let settings = Settings::from_env();

    let result = match cli.command {
        Commands::Convert { input, output, run } => {
            cmd_convert(&input, output.as_deref(), run, settings)
        }

        Commands::Preview { input, run } => cmd_preview(&input, run, settings),

        Commands::Inspect { input, delimiter } => cmd_inspect(&input, delimiter, settings),

        Commands::Config { action } => cmd_config(action, settings),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn build_options(run: RunArgs, settings: Settings, no_save: bool) -> Result<ConvertOptions, Box<dyn std::error::Error>> {
    let config = match run.config {
        Some(ref path) => {
            let content = fs::read_to_string(path)?;
            Some(MappingConfig::from_json(&content)?)
        }
        None => None,
    };

    Ok(ConvertOptions {
        config,
        overrides: run.mapping.into_overrides(),
        settings,
        no_cache: run.no_cache,
        no_save: no_save || run.no_cache,
    })
}

fn run_conversion(input: &Path, run: RunArgs, settings: Settings, no_save: bool) -> Result<Conversion, Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let delimiter = run.delimiter;
    let save_config = run.save_config.clone();
    let options = build_options(run, settings, no_save)?;

    let conversion = csv2ynab::convert_file(input, delimiter, &options)?;

    if let Some(path) = save_config {
        fs::write(&path, conversion.config.to_json()?)?;
        eprintln!("   💾 Configuration saved to: {}", path.display());
    }

    Ok(conversion)
}

fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    run: RunArgs,
    settings: Settings,
) -> Result<(), Box<dyn std::error::Error>> {
    let conversion = run_conversion(input, run, settings, false)?;
    print_stats(&conversion.stats);

    match output {
        Some(p) if p == Path::new("-") => {
            write_ynab_csv(&conversion.rows, std::io::stdout().lock())?;
        }
        Some(p) => write_output(&to_ynab_csv(&conversion.rows)?, p)?,
        None => {
            let name = default_file_name(chrono::Local::now().date_naive());
            write_output(&to_ynab_csv(&conversion.rows)?, Path::new(&name))?;
        }
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_preview(input: &Path, run: RunArgs, settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let conversion = run_conversion(input, run, settings, true)?;
    let shown = preview(&conversion.rows);

    println!(
        "{:<10}  {:<32}  {:<24}  {:>10}  {:>10}",
        CanonicalRow::HEADERS[0],
        CanonicalRow::HEADERS[1],
        CanonicalRow::HEADERS[2],
        CanonicalRow::HEADERS[3],
        CanonicalRow::HEADERS[4]
    );
    for row in shown {
        println!(
            "{:<10}  {:<32}  {:<24}  {:>10}  {:>10}",
            row.date,
            truncate(&row.payee, 32),
            truncate(&row.memo, 24),
            row.outflow,
            row.inflow
        );
    }
    if conversion.rows.len() > shown.len() {
        println!("... {} more rows", conversion.rows.len() - shown.len());
    }

    print_stats(&conversion.stats);
    Ok(())
}

fn cmd_inspect(input: &Path, delimiter: Option<char>, settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Inspecting: {}", input.display());

    let parsed = parse_file(input, delimiter)?;
    eprintln!("   Encoding: {}", parsed.encoding);
    eprintln!(
        "   Delimiter: '{}'{}",
        format_delimiter(parsed.delimiter),
        if delimiter.is_none() { " (auto-detected)" } else { "" }
    );
    eprintln!("   Rows: {}", parsed.records.len());
    eprintln!("   Columns: {}", parsed.headers.join(", "));
    eprintln!("   Cache key: {}", storage_key(&parsed.headers));

    let options = ConvertOptions {
        settings,
        ..ConvertOptions::default()
    };
    let (session, from_cache) = start_session(&parsed, &options);
    eprintln!(
        "   Mapping: {}",
        if from_cache { "cached" } else { "detected" }
    );
    if !session.config().is_valid() {
        eprintln!("   ⚠️  Mapping is incomplete, use the column options of `convert`");
    }

    println!("{}", session.config().to_json()?);
    Ok(())
}

fn cmd_config(action: ConfigAction, settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = ConfigRegistry::from_settings(&settings);

    match action {
        ConfigAction::List => {
            let stored = registry.list();
            if stored.is_empty() {
                eprintln!("📋 No configurations cached in {}", registry.dir().display());
                return Ok(());
            }

            eprintln!("📋 Cached configurations ({}):\n", stored.len());
            for s in stored {
                println!("  📄 {}", s.key);
                println!("     Columns: {}", s.headers.join(", "));
                println!("     Saved: {} ({} times)", s.saved_at, s.save_count);
                println!();
            }
        }

        ConfigAction::Show { input, delimiter } => {
            let parsed = parse_file(&input, delimiter)?;
            match registry.get(&parsed.headers) {
                Some(s) => {
                    eprintln!("📄 Configuration {} (saved {})", s.key, s.saved_at);
                    println!("{}", s.config.to_json()?);
                }
                None => {
                    return Err(format!(
                        "No cached configuration for {}",
                        storage_key(&parsed.headers)
                    )
                    .into());
                }
            }
        }

        ConfigAction::Forget { input, delimiter } => {
            let parsed = parse_file(&input, delimiter)?;
            registry.forget(&parsed.headers)?;
            eprintln!("🗑️  Configuration deleted: {}", storage_key(&parsed.headers));
        }
    }

    Ok(())
}

fn print_stats(stats: &ProcessingStats) {
    eprintln!("\n📊 Results:");
    eprintln!(
        "   Rows:     {} total, {} converted, {} skipped",
        stats.total_rows, stats.valid_rows, stats.skipped_rows
    );
    eprintln!("   Outflow:  {:.2}", stats.total_outflow);
    eprintln!("   Inflow:   {:.2}", stats.total_inflow);
    eprintln!("   Net:      {:.2}", stats.net());
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut short: String = value.chars().take(width.saturating_sub(1)).collect();
    short.push('…');
    short
}

fn write_output(content: &str, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    fs::write(path, content)?;
    eprintln!("💾 Output written to: {}", path.display());
    Ok(())
}

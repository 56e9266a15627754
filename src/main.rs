use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use ledger::cli::{
    handle_audit, handle_balance_sheet, handle_cashflow, handle_check, handle_clean,
    handle_close, handle_confirm, handle_export, handle_process, handle_process_bank,
    handle_status, handle_summary, handle_train, handle_trial, CheckTarget,
};
use ledger::config::{logging, paths::LedgerPaths, settings::Settings};
use ledger::export::ExportFormat;
use ledger::models::{Bank, ChartOfAccounts};
use ledger::services::StageOptions;
use ledger::storage::Storage;

/// Header written to a fresh override rules file
const RULES_TEMPLATE: &str =
    "target_bank,keyword,direction,new_debit_code,new_credit_code,new_remarks\n";

#[derive(Parser)]
#[command(
    name = "ledger",
    author = "Kaylee Beyene",
    version,
    about = "Double-entry household ledger",
    long_about = "Stages bank statements and hand-written journal CSVs, checks that \
                  every transaction set balances, confirms them into the journal \
                  and renders trial balance, cashflow and balance sheet reports."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory, database and default configuration
    Init,

    /// Stage a journal CSV (Date, SubjectCode, Amount, Remarks[, SetID])
    #[command(alias = "p")]
    Process {
        /// Path to the CSV file
        file: PathBuf,
        /// Keep rows already in the staging table
        #[arg(long)]
        no_clear: bool,
        /// Do not check whether the file is already staged
        #[arg(long)]
        no_duplicates: bool,
    },

    /// Stage a bank or card statement, classifying each row
    #[command(name = "process-bank", alias = "pb")]
    ProcessBank {
        /// Statement source (ufj or jcb)
        bank: Bank,
        /// Path to the statement CSV
        file: PathBuf,
        /// Keep rows already in the staging table
        #[arg(long)]
        no_clear: bool,
        /// Do not check whether the file is already staged
        #[arg(long)]
        no_duplicates: bool,
    },

    /// Move the staged entries into the journal
    #[command(alias = "c")]
    Confirm,

    /// Trial balance of the confirmed journal
    #[command(alias = "t")]
    Trial {
        /// Month (YYYY-MM); every month when omitted
        period: Option<String>,
        /// Export to CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Cash movements of the staged sets
    Cashflow {
        /// Export to CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Staged entries grouped by transaction set
    Summary {
        /// Export to CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Monthly balances per subject with totals
    #[command(name = "balance-sheet")]
    BalanceSheet {
        /// Export to CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Train the classifier models of a bank from its snapshots
    Train {
        /// Statement source (ufj or jcb)
        bank: Bank,
    },

    /// Close a month's income and expense accounts
    Close {
        /// Month (YYYY-MM); the previous month when omitted
        period: Option<String>,
        /// Replace existing closing entries
        #[arg(long)]
        reclose: bool,
    },

    /// Financial position, monthly trend and closing state
    Status,

    /// Inspect the staging table and the journal
    Check {
        #[arg(value_enum, default_value = "all")]
        target: CheckTarget,
    },

    /// Empty the staging table
    Clean,

    /// Show recent audit log entries
    Audit {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "20")]
        count: usize,
    },

    /// Export the confirmed journal
    Export {
        #[arg(value_enum)]
        format: ExportFormat,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Only this month (YYYY-MM)
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Show current configuration and paths
    Config,
}

fn stage_options(no_clear: bool, no_duplicates: bool) -> StageOptions {
    StageOptions {
        clear_staging: !no_clear,
        check_duplicates: !no_duplicates,
    }
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = LedgerPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    let chart = ChartOfAccounts::load_or_default(&paths.codes_file())?;

    // Initialize storage
    let storage = Storage::new(paths.clone())?;

    match cli.command {
        Some(Commands::Init) => {
            println!("Initializing ledger at: {}", paths.base_dir().display());
            settings.save(&paths)?;
            if !paths.codes_file().exists() {
                chart.save(&paths.codes_file())?;
                println!("Wrote default chart of accounts ({} subjects).", chart.len());
            }
            if !paths.rules_file().exists() {
                std::fs::write(paths.rules_file(), RULES_TEMPLATE)?;
            }
            if storage.test_connection() {
                println!("Database ready: {}", paths.database_file().display());
            }
            println!("Initialization complete!");
            println!();
            println!("Run 'ledger process <file>' to stage a journal CSV.");
        }
        Some(Commands::Process {
            file,
            no_clear,
            no_duplicates,
        }) => {
            handle_process(&storage, &settings, &chart, &file, stage_options(no_clear, no_duplicates))?;
        }
        Some(Commands::ProcessBank {
            bank,
            file,
            no_clear,
            no_duplicates,
        }) => {
            handle_process_bank(
                &storage,
                &settings,
                &chart,
                bank,
                &file,
                stage_options(no_clear, no_duplicates),
            )?;
        }
        Some(Commands::Confirm) => handle_confirm(&storage, &settings)?,
        Some(Commands::Trial { period, csv }) => handle_trial(&storage, period, csv)?,
        Some(Commands::Cashflow { csv }) => handle_cashflow(&storage, &settings, csv)?,
        Some(Commands::Summary { csv }) => handle_summary(&storage, csv)?,
        Some(Commands::BalanceSheet { csv }) => handle_balance_sheet(&storage, csv)?,
        Some(Commands::Train { bank }) => handle_train(&storage, &settings, bank)?,
        Some(Commands::Close { period, reclose }) => {
            handle_close(&storage, &settings, &chart, period, reclose)?;
        }
        Some(Commands::Status) => handle_status(&storage, &settings)?,
        Some(Commands::Check { target }) => handle_check(&storage, &settings, target)?,
        Some(Commands::Clean) => handle_clean(&storage)?,
        Some(Commands::Audit { count }) => handle_audit(&storage, count)?,
        Some(Commands::Export {
            format,
            output,
            month,
        }) => handle_export(&storage, format, output, month)?,
        Some(Commands::Config) => {
            println!("Household Ledger Configuration");
            println!("==============================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Database:         {}", paths.database_file().display());
            println!("Chart of accounts: {}", paths.codes_file().display());
            println!("Override rules:   {}", paths.rules_file().display());
            println!("Audit log:        {}", paths.audit_log().display());
            println!("Uploads:          {}", paths.uploads_dir().display());
            println!("Models:           {}", paths.models_dir().display());
            println!();
            println!("Settings:");
            println!("  Balance tolerance:    {}", settings.balance_tolerance);
            let cash: Vec<String> = settings.cash_codes.iter().map(|c| c.to_string()).collect();
            println!("  Cash accounts:        {}", cash.join(", "));
            println!("  Retained earnings:    {}", settings.retained_earnings_code);
            println!("  Confidence threshold: {}", settings.classifier.confidence_threshold);
            println!("  Min training samples: {}", settings.classifier.min_training_samples);
        }
        None => {
            println!("Household ledger - double-entry bookkeeping from CSV statements");
            println!();
            println!("Run 'ledger --help' for usage information.");
            println!("Run 'ledger init' to set up a new ledger.");
        }
    }

    Ok(())
}

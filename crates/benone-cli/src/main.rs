//! CLI for benone: profile the digits of any CSV/TSV file against Benford's Law.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "benone")]
#[command(about = "benone: digit profiles of tabular files and Benford's Law conformance")]
#[command(version = benone_core::VERSION)]
struct Cli {
    /// JSON config file (upload_folder, analyses_db, default_format)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a file: per-column digit counts, leading-digit frequencies and
    /// Benford p-values. Results are cached by content id.
    Analyze {
        /// File to analyze
        path: String,

        /// Format hint (.csv or .tsv); detected from the file suffix when omitted
        #[arg(long)]
        format: Option<String>,

        /// Show full simple and lead counters for one column
        #[arg(long)]
        column: Option<String>,

        /// Write the full analysis record as JSON
        #[arg(long)]
        output: Option<String>,

        /// Analysis store file (default: analyses_db from config)
        #[arg(long)]
        store: Option<String>,

        /// Always recompute; neither read nor write the store
        #[arg(long)]
        no_cache: bool,
    },

    /// Print the content id of a file (SHA-256 + format tag)
    Identity {
        /// File to hash
        path: String,

        /// Format hint (.csv or .tsv); detected from the file suffix when omitted
        #[arg(long)]
        format: Option<String>,
    },

    /// Check an upload against the stored file of the same name.
    /// Exits with status 1 when the name is taken by different content.
    Check {
        /// Newly uploaded file
        file: String,

        /// Name to check under (default: the file's own name)
        #[arg(long)]
        name: Option<String>,

        /// Compare against this file instead of <upload_folder>/<name>
        #[arg(long)]
        against: Option<String>,
    },

    /// List the supported file formats
    Formats,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref());

    match cli.command {
        Commands::Analyze {
            path,
            format,
            column,
            output,
            store,
            no_cache,
        } => commands::analyze::run(commands::analyze::AnalyzeCommandConfig {
            path: &path,
            hint: &commands::format_hint(format.as_deref(), &config),
            column: column.as_deref(),
            output_path: output.as_deref(),
            store_path: (!no_cache).then(|| commands::store_path(store.as_deref(), &config)),
        }),
        Commands::Identity { path, format } => {
            commands::identity::run(&path, &commands::format_hint(format.as_deref(), &config))
        }
        Commands::Check {
            file,
            name,
            against,
        } => commands::check::run(&file, name.as_deref(), against.as_deref(), &config),
        Commands::Formats => commands::formats::run(),
    }
}

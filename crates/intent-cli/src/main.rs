use std::process;

use clap::{Parser, Subcommand};
use tracing::Level;

mod commands;

/// intent-store: Development tool for saved-field databases.
///
/// Inspect, export, save, load, and clear preference namespaces in a
/// SQLite database from the command line.
#[derive(Parser)]
#[command(name = "intent-store", version, about, long_about = None)]
struct Cli {
    /// Log store activity (debug level) to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show database status and per-namespace statistics.
    Status {
        /// Path to the SQLite database file.
        db: String,
    },

    /// List entries, or show one entry in detail.
    Inspect {
        /// Path to the SQLite database file.
        db: String,

        /// Key to inspect. If omitted, lists every entry.
        key: Option<String>,

        /// Namespace to scope the lookup.
        #[arg(short, long)]
        namespace: Option<String>,
    },

    /// Export entries as JSON.
    Export {
        /// Path to the SQLite database file.
        db: String,

        /// Namespace to export. Defaults to all.
        #[arg(short, long)]
        namespace: Option<String>,
    },

    /// Save fields described by a schema file.
    Save {
        /// Path to the SQLite database file.
        db: String,

        /// Path to the schema TOML file.
        #[arg(short, long, default_value = "intent-schema.toml")]
        schema: String,

        /// Field values as KEY=VALUE. Blob values are XML text.
        values: Vec<String>,
    },

    /// Load the saved record and print it as JSON.
    Load {
        /// Path to the SQLite database file.
        db: String,

        /// Path to the schema TOML file.
        #[arg(short, long, default_value = "intent-schema.toml")]
        schema: String,
    },

    /// Erase the namespace described by a schema file.
    Clear {
        /// Path to the SQLite database file.
        db: String,

        /// Path to the schema TOML file.
        #[arg(short, long, default_value = "intent-schema.toml")]
        schema: String,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let result: Result<(), Box<dyn std::error::Error>> = match cli.command {
        Commands::Status { db } => commands::status(&db),
        Commands::Inspect { db, key, namespace } => {
            commands::inspect(&db, key.as_deref(), namespace.as_deref())
        }
        Commands::Export { db, namespace } => commands::export(&db, namespace.as_deref()),
        Commands::Save { db, schema, values } => commands::save(&db, &schema, &values),
        Commands::Load { db, schema } => commands::load(&db, &schema),
        Commands::Clear { db, schema, yes } => commands::clear(&db, &schema, yes),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

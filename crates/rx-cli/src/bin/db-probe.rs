use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use rx_config::{Credentials, StoreSettings, DEFAULT_TABLE};
use rx_store::SupabaseClient;

#[derive(Parser)]
#[command(name = "db-probe")]
#[command(about = "Insert one test prescription into Supabase and print the stored row")]
struct Cli {
    /// Target table
    #[arg(long, default_value = DEFAULT_TABLE)]
    table: String,
    /// Delete the inserted row again afterwards
    #[arg(long)]
    cleanup: bool,
    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
    /// Dotenv file with fallback credentials
    #[arg(long, default_value = rx_cli::DEFAULT_ENV_FILE)]
    env_file: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    rx_cli::init_tracing();

    let credentials = Credentials::load(&cli.env_file)?;
    let settings = StoreSettings {
        table: cli.table,
        timeout: Duration::from_secs(cli.timeout_secs),
        cleanup: cli.cleanup,
    };

    let timeout = settings.timeout;
    let mut stdout = io::stdout().lock();
    let outcome = rx_store::test_connection(
        &credentials,
        &settings,
        |url, key| SupabaseClient::new(url, key, timeout),
        &mut stdout,
    )
    .await?;

    rx_cli::finish("Database probe", &outcome)
}

use clap::Parser;
use datachat::core::config::{self, CliOverrides};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "datachat", about = "Chat with your data analysis backend")]
struct Args {
    /// Base address of the analysis backend (overrides DATACHAT_BACKEND_URL)
    #[arg(short, long)]
    backend_url: Option<String>,

    /// Request timeout in seconds
    #[arg(short, long)]
    timeout_secs: Option<u64>,

    /// Directory where downloaded charts are saved
    #[arg(short, long)]
    download_dir: Option<PathBuf>,

    /// Log level written to datachat.log
    #[arg(long, default_value_t = LevelFilter::Debug)]
    log_level: LevelFilter,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to datachat.log in current directory
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create("datachat.log") {
        let _ = WriteLogger::init(args.log_level, log_config, log_file);
    }

    let file_config = config::load_config().unwrap_or_else(|e| {
        log::warn!("Ignoring config file: {}", e);
        config::DatachatConfig::default()
    });
    let resolved = config::resolve(
        &file_config,
        &CliOverrides {
            backend_url: args.backend_url,
            timeout_secs: args.timeout_secs,
            download_dir: args.download_dir,
        },
    );

    log::info!("datachat starting up against {}", resolved.backend_url);

    datachat::tui::run(resolved)
}

use macrobot::{AppResult, cli::Cli, config::Config, init_logging, supervisor::Supervisor};

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse_args();

    // Credentials may live in a .env file, as in a local deployment
    dotenv::dotenv().ok();

    // Load configuration (file + environment overrides)
    let config = Config::load_or_default(&cli.config_file);

    // Initialize logging; the guard must outlive the session loops
    let _log_guard = init_logging(&cli.effective_log_level(), &config.log)?;

    tracing::info!("MacroBot starting...");
    tracing::debug!("CLI arguments: {:?}", cli);

    if cli.is_dry_run_mode() {
        config.display_summary()?;
        return Ok(());
    }

    config.validate()?;

    // Launch one client session per configured credential
    let mut supervisor = Supervisor::start_console(&config)?;
    tracing::info!("{} client session(s) running", supervisor.session_count());

    // Stay alive until externally terminated
    supervisor.wait_for_shutdown().await?;

    Ok(())
}

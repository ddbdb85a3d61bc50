use clap::Parser;
use procure_search::config::cli::{FpdsQueryArgs, SearchArgs, ServeArgs};
use procure_search::core::export;
use procure_search::core::query_builder::build_fpds_query;
use procure_search::domain::ports::Storage;
use procure_search::utils::{logger, validation, validation::Validate};
use procure_search::{AppState, CliConfig, Command, LocalStorage, SearchError, TomlConfig};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = run(cli).await {
        tracing::error!("❌ {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }
}

async fn run(cli: CliConfig) -> Result<(), SearchError> {
    cli.validate()?;

    let config = TomlConfig::load(cli.config.as_deref())?;
    config.validate()?;

    match cli.command {
        Some(Command::Search(args)) => search(&config, args).await,
        Some(Command::FpdsQuery(args)) => {
            fpds_query(args);
            Ok(())
        }
        Some(Command::Serve(args)) => serve(config, args).await,
        None => serve(config, ServeArgs::default()).await,
    }
}

async fn serve(config: TomlConfig, args: ServeArgs) -> Result<(), SearchError> {
    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());
    let addr = validation::validate_socket_addr("bind", &bind)?;

    let state = AppState::from_config(&config)?;
    procure_search::app::serve(state, addr).await
}

async fn search(config: &TomlConfig, args: SearchArgs) -> Result<(), SearchError> {
    let state = AppState::from_config(config)?;
    let outcome = state
        .aggregator
        .search_requested(&args.filters(), &args.platforms)
        .await;

    if outcome.synthetic {
        tracing::warn!("⚠️ Some sources failed; results include demo records");
    }

    let data = export::render(&outcome.results, args.format)?;
    match args.output {
        Some(path) => {
            let storage = LocalStorage::new(".");
            storage.write_file(&path, &data).await?;
            tracing::info!("📁 Wrote {} records to {}", outcome.total, path);
            println!("✅ {} records saved to {}", outcome.total, path);
        }
        None => println!("{}", String::from_utf8_lossy(&data)),
    }

    Ok(())
}

fn fpds_query(args: FpdsQueryArgs) {
    println!("{}", build_fpds_query(&args.filters()));
}

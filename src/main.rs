use clap::Parser;
use tradefill::config::cli::Command;
use tradefill::utils::error::ErrorSeverity;
use tradefill::utils::{logger, validation::Validate};
use tradefill::{
    AppConfig, AppError, Cli, EtlEngine, HttpFetcher, LocalStorage, ShopScrapePipeline,
    SqftFillPipeline,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting tradefill");

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            match AppConfig::from_file(path) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("❌ Failed to load config file '{}': {}", path, e);
                    eprintln!("💡 Make sure the file exists and is valid TOML format");
                    std::process::exit(1);
                }
            }
        }
        None => AppConfig::default(),
    };
    cli.apply_overrides(&mut config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if cli.dry_run {
        print_dry_run(&cli.command, &config);
        return;
    }

    let monitor_enabled = config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    match run(&cli.command, config, monitor_enabled).await {
        Ok(output_path) => {
            println!("✅ Done!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }
}

async fn run(command: &Command, config: AppConfig, monitor: bool) -> Result<String, AppError> {
    match command {
        Command::Scrape(_) => {
            let scraper = config.scraper;
            let fetcher = HttpFetcher::new(&scraper.session)?;
            let storage = LocalStorage::new(scraper.output_dir.clone());
            let pipeline = ShopScrapePipeline::new(fetcher, storage, scraper)?;
            EtlEngine::new_with_monitoring(pipeline, monitor).run().await
        }
        Command::Fill(_) => {
            let filler = config.filler;
            let storage = LocalStorage::new(filler.data_dir.clone());
            let pipeline = SqftFillPipeline::from_storage(storage, filler).await?;
            EtlEngine::new_with_monitoring(pipeline, monitor).run().await
        }
    }
}

fn print_dry_run(command: &Command, config: &AppConfig) {
    println!("🔍 Dry Run Analysis:");
    match command {
        Command::Scrape(_) => {
            let scraper = &config.scraper;
            println!("  Directory: {}", scraper.base_url);
            println!("  User-Agent: {}", scraper.session.user_agent);
            println!(
                "  Page wait: {:?} (poll {:?}, settle {:?})",
                scraper.page_wait(),
                scraper.poll_interval(),
                scraper.settle_delay()
            );
            println!("  Inventory pattern: {}", scraper.parsing.inventory_pattern);
            println!(
                "  Output: {}/{} ({:?})",
                scraper.output_dir, scraper.output_file, scraper.output_layout
            );
        }
        Command::Fill(_) => {
            let filler = &config.filler;
            println!("  Data dir: {}", filler.data_dir);
            println!("  Model: {}", filler.model_path);
            println!("  Candidates: {}", filler.candidates_path);
            println!(
                "  Master: {} (flag '{}', target '{}')",
                filler.master_path, filler.flag_column, filler.target_column
            );
            println!("  Categorical columns: {}", filler.categorical_columns.len());
            match filler.target_transform {
                Some(t) => println!("  Target transform: {:?} (override)", t),
                None => println!("  Target transform: from model artifact"),
            }
            println!("  Output: {}", filler.output_path);
        }
    }
}

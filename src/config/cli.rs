use crate::config::{AppConfig, OutputLayout};
use crate::domain::model::TargetTransform;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "tradefill")]
#[command(about = "Trading-post shop scraper and square-footage filler")]
pub struct Cli {
    /// Path to a TOML configuration file; built-in defaults apply when omitted
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Log CPU and memory usage after each phase
    #[arg(long, global = true)]
    pub monitor: bool,

    /// Show the resolved configuration without touching the network or files
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Scrape every shop's buy and sell tables into a JSON file
    Scrape(ScrapeArgs),
    /// Fill missing square footage using a regression model
    Fill(FillArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct ScrapeArgs {
    #[arg(long)]
    pub base_url: Option<String>,

    #[arg(long)]
    pub output_dir: Option<String>,

    #[arg(long)]
    pub output_file: Option<String>,

    #[arg(long, value_enum)]
    pub layout: Option<OutputLayout>,

    #[arg(long)]
    pub pretty: bool,

    /// Seconds to wait for a page's marker headings
    #[arg(long)]
    pub wait: Option<u64>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct FillArgs {
    #[arg(long)]
    pub data_dir: Option<String>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub candidates: Option<String>,

    #[arg(long)]
    pub master: Option<String>,

    #[arg(long)]
    pub output: Option<String>,

    #[arg(long, value_enum)]
    pub target_transform: Option<TargetTransform>,

    /// Treat indicator columns missing from this batch as all zeros
    #[arg(long)]
    pub absent_as_zero: bool,
}

impl Cli {
    /// Applies command-line flags on top of the file configuration.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if self.monitor {
            config.monitoring.enabled = true;
        }

        match &self.command {
            Command::Scrape(args) => {
                let scraper = &mut config.scraper;
                if let Some(base_url) = &args.base_url {
                    scraper.base_url = base_url.clone();
                }
                if let Some(output_dir) = &args.output_dir {
                    scraper.output_dir = output_dir.clone();
                }
                if let Some(output_file) = &args.output_file {
                    scraper.output_file = output_file.clone();
                }
                if let Some(layout) = args.layout {
                    scraper.output_layout = layout;
                }
                if args.pretty {
                    scraper.pretty = true;
                }
                if let Some(wait) = args.wait {
                    scraper.page_wait_seconds = wait;
                }
            }
            Command::Fill(args) => {
                let filler = &mut config.filler;
                if let Some(data_dir) = &args.data_dir {
                    filler.data_dir = data_dir.clone();
                }
                if let Some(model) = &args.model {
                    filler.model_path = model.clone();
                }
                if let Some(candidates) = &args.candidates {
                    filler.candidates_path = candidates.clone();
                }
                if let Some(master) = &args.master {
                    filler.master_path = master.clone();
                }
                if let Some(output) = &args.output {
                    filler.output_path = output.clone();
                }
                if args.target_transform.is_some() {
                    filler.target_transform = args.target_transform;
                }
                if args.absent_as_zero {
                    filler.absent_indicators_as_zero = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_overrides() {
        let cli = Cli::parse_from([
            "tradefill",
            "--monitor",
            "scrape",
            "--base-url",
            "http://localhost:8080/shops",
            "--layout",
            "tuples",
            "--wait",
            "3",
        ]);
        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config);

        assert!(config.monitoring_enabled());
        assert_eq!(config.scraper.base_url, "http://localhost:8080/shops");
        assert_eq!(config.scraper.output_layout, OutputLayout::Tuples);
        assert_eq!(config.scraper.page_wait_seconds, 3);
        assert_eq!(config.filler.master_path, "full.csv");
    }

    #[test]
    fn test_fill_overrides_and_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "tradefill",
            "fill",
            "--data-dir",
            "/data",
            "--target-transform",
            "log",
            "--absent-as-zero",
            "--verbose",
        ]);
        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config);

        assert!(cli.verbose);
        assert_eq!(config.filler.data_dir, "/data");
        assert_eq!(config.filler.target_transform, Some(TargetTransform::Log));
        assert!(config.filler.absent_indicators_as_zero);
        assert_eq!(config.scraper.base_url, "https://sc-trade.tools/shops");
    }
}

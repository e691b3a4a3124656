pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::Cli;

pub use adapters::{HttpFetcher, LinearModel, LocalStorage};
pub use config::AppConfig;
pub use core::{
    etl::EtlEngine, fill_pipeline::SqftFillPipeline, scrape_pipeline::ShopScrapePipeline,
};
pub use domain::model::{Commodity, Shop};
pub use utils::error::{AppError, Result};

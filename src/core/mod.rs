pub mod etl;
pub mod fill_pipeline;
pub mod numbers;
pub mod page_wait;
pub mod scrape_pipeline;
pub mod shop_page;
pub mod table;

pub use crate::domain::model::{Commodity, FeatureMatrix, ScrapeOutcome, Shop, ShopPage};
pub use crate::domain::ports::{PageFetcher, Pipeline, RegressionModel, Storage};
pub use crate::utils::error::Result;

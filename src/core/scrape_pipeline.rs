use crate::config::{OutputLayout, ScraperConfig};
use crate::core::page_wait::{wait_for_page, WaitPolicy};
use crate::core::shop_page::ShopPageParser;
use crate::core::{PageFetcher, Pipeline, Storage};
use crate::domain::model::{Commodity, ScrapeOutcome, Shop, ShopPage};
use crate::utils::error::{AppError, Result};
use serde_json::{json, Value};
use std::collections::HashSet;
use url::Url;

/// Walks the shop directory and every shop page, then writes all shops as JSON.
pub struct ShopScrapePipeline<F: PageFetcher, S: Storage> {
    fetcher: F,
    storage: S,
    config: ScraperConfig,
    parser: ShopPageParser,
}

impl<F: PageFetcher, S: Storage> ShopScrapePipeline<F, S> {
    pub fn new(fetcher: F, storage: S, config: ScraperConfig) -> Result<Self> {
        let parser = ShopPageParser::new(&config.selectors, &config.parsing)?;
        Ok(Self {
            fetcher,
            storage,
            config,
            parser,
        })
    }

    fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy {
            timeout: self.config.page_wait(),
            poll_interval: self.config.poll_interval(),
        }
    }

    async fn shop_identifiers(&self) -> Result<Vec<String>> {
        let url = &self.config.base_url;
        let html = wait_for_page(
            &self.fetcher,
            url,
            &self.parser.directory_markers(),
            self.wait_policy(),
            |html| self.parser.is_directory_ready(html),
        )
        .await?;

        let mut seen = HashSet::new();
        let identifiers = self
            .parser
            .shop_identifiers(&html)
            .into_iter()
            .filter(|id| {
                let fresh = seen.insert(id.clone());
                if !fresh {
                    tracing::warn!("⚠️ Shop '{}' listed twice, visiting once", id);
                }
                fresh
            })
            .collect();
        Ok(identifiers)
    }
}

/// `{base_url}/{identifier}` with the identifier encoded as one path segment.
pub fn shop_url(base_url: &str, identifier: &str) -> Result<String> {
    let invalid = |reason: &str| AppError::InvalidConfigValueError {
        field: "scraper.base_url".to_string(),
        value: base_url.to_string(),
        reason: reason.to_string(),
    };

    let mut url = Url::parse(base_url).map_err(|e| invalid(&e.to_string()))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| invalid("URL cannot have path segments"))?;
        segments.pop_if_empty().push(identifier);
    }
    Ok(url.into())
}

fn commodity_tuple(commodity: &Commodity) -> Value {
    json!([
        commodity.name,
        commodity.price,
        commodity.stock,
        commodity.refresh_rate
    ])
}

fn shop_tuple(shop: &Shop) -> Value {
    json!([
        shop.identifier,
        shop.buy_list.iter().map(commodity_tuple).collect::<Vec<_>>(),
        shop.sell_list.iter().map(commodity_tuple).collect::<Vec<_>>()
    ])
}

pub fn render_shops(shops: &[Shop], layout: OutputLayout, pretty: bool) -> Result<Vec<u8>> {
    let document = match layout {
        OutputLayout::Objects => serde_json::to_value(shops)?,
        OutputLayout::Tuples => Value::Array(shops.iter().map(shop_tuple).collect()),
    };

    let bytes = if pretty {
        serde_json::to_vec_pretty(&document)?
    } else {
        serde_json::to_vec(&document)?
    };
    Ok(bytes)
}

#[async_trait::async_trait]
impl<F: PageFetcher, S: Storage> Pipeline for ShopScrapePipeline<F, S> {
    type Extracted = Vec<ShopPage>;
    type Transformed = ScrapeOutcome;

    fn name(&self) -> &str {
        "shop scrape"
    }

    async fn extract(&self) -> Result<Vec<ShopPage>> {
        let identifiers = self.shop_identifiers().await?;
        tracing::info!("Found {} shops", identifiers.len());

        let settle = self.config.settle_delay();
        let mut pages = Vec::with_capacity(identifiers.len());
        for identifier in identifiers {
            tracing::info!("Retrieving: {}", identifier);
            let url = shop_url(&self.config.base_url, &identifier)?;

            let html = wait_for_page(
                &self.fetcher,
                &url,
                &self.parser.shop_page_markers(),
                self.wait_policy(),
                |html| self.parser.is_shop_page_ready(html),
            )
            .await?;
            if !settle.is_zero() {
                tokio::time::sleep(settle).await;
            }

            pages.push(ShopPage {
                identifier,
                url,
                html,
            });
        }

        Ok(pages)
    }

    async fn transform(&self, pages: Vec<ShopPage>) -> Result<ScrapeOutcome> {
        let mut outcome = ScrapeOutcome::default();

        for page in &pages {
            let (shop, skipped) = self.parser.parse_shop(page);
            tracing::debug!(
                "{} ({}): {} buy, {} sell, {} skipped",
                shop.identifier,
                page.url,
                shop.buy_list.len(),
                shop.sell_list.len(),
                skipped
            );
            outcome.skipped_rows += skipped;
            outcome.shops.push(shop);
        }

        if outcome.skipped_rows > 0 {
            tracing::warn!(
                "⚠️ {} malformed rows skipped across {} shops",
                outcome.skipped_rows,
                outcome.shops.len()
            );
        }
        Ok(outcome)
    }

    async fn load(&self, outcome: ScrapeOutcome) -> Result<String> {
        let bytes = render_shops(
            &outcome.shops,
            self.config.output_layout,
            self.config.pretty,
        )?;

        let file = &self.config.output_file;
        self.storage.write_file(file, &bytes).await?;
        tracing::info!("Wrote {} shops ({} bytes)", outcome.shops.len(), bytes.len());

        Ok(self.storage.location(file))
    }
}

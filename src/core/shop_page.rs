use crate::config::{ParsingConfig, SelectorConfig};
use crate::core::numbers::QuoteParser;
use crate::domain::model::{Commodity, Shop, ShopPage};
use crate::utils::error::{AppError, Result};
use scraper::{ElementRef, Html, Selector};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Buy,
    Sell,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Buy => write!(f, "buy"),
            Section::Sell => write!(f, "sell"),
        }
    }
}

/// Why a table row was left out of the result.
#[derive(Debug, thiserror::Error)]
pub enum RowIssue {
    #[error("row has {0} cells, expected at least 3")]
    TooFewCells(usize),
    #[error("no {0} in the row")]
    MissingElement(&'static str),
    #[error("unreadable price {0:?}")]
    Price(String),
    #[error("inventory text {0:?} does not match the expected pattern")]
    Inventory(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRows {
    pub commodities: Vec<Commodity>,
    pub skipped: usize,
}

/// Knows the DOM layout of the trading-post directory and shop pages.
pub struct ShopPageParser {
    shop_list: Selector,
    shop_option: Selector,
    section_heading: Selector,
    body_row: Selector,
    link: Selector,
    span: Selector,
    buy_heading_text: String,
    sell_heading_text: String,
    transactions_element: String,
    quotes: QuoteParser,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AppError::SelectorError {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

/// Visible text with runs of whitespace collapsed to one space.
fn normalized_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

impl ShopPageParser {
    pub fn new(selectors: &SelectorConfig, parsing: &ParsingConfig) -> Result<Self> {
        Ok(Self {
            shop_list: selector(&selectors.shop_list)?,
            shop_option: selector(&selectors.shop_option)?,
            section_heading: selector(&selectors.section_heading)?,
            body_row: selector("tbody > tr")?,
            link: selector("a")?,
            span: selector("span")?,
            buy_heading_text: selectors.buy_heading_text.clone(),
            sell_heading_text: selectors.sell_heading_text.clone(),
            transactions_element: selectors.transactions_element.to_ascii_lowercase(),
            quotes: QuoteParser::new(parsing)?,
        })
    }

    pub fn directory_markers(&self) -> String {
        "shop selector".to_string()
    }

    pub fn shop_page_markers(&self) -> String {
        format!(
            "{} heading, {} heading",
            self.buy_heading_text, self.sell_heading_text
        )
    }

    pub fn is_directory_ready(&self, html: &str) -> bool {
        let document = Html::parse_document(html);
        let ready = document.select(&self.shop_list).next().is_some();
        ready
    }

    pub fn is_shop_page_ready(&self, html: &str) -> bool {
        let document = Html::parse_document(html);
        let ready = self.heading(&document, &self.buy_heading_text).is_some()
            && self.heading(&document, &self.sell_heading_text).is_some();
        ready
    }

    /// Shop identifiers from the first selector list, in page order.
    pub fn shop_identifiers(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let Some(list) = document.select(&self.shop_list).next() else {
            return Vec::new();
        };

        list.select(&self.shop_option)
            .map(normalized_text)
            .filter(|name| !name.is_empty())
            .collect()
    }

    pub fn parse_shop(&self, page: &ShopPage) -> (Shop, usize) {
        let document = Html::parse_document(&page.html);

        let buy = self.parse_section(&document, Section::Buy, &page.identifier);
        let sell = self.parse_section(&document, Section::Sell, &page.identifier);
        let skipped = buy.skipped + sell.skipped;

        let shop = Shop {
            identifier: page.identifier.clone(),
            buy_list: buy.commodities,
            sell_list: sell.commodities,
        };
        (shop, skipped)
    }

    fn parse_section(&self, document: &Html, section: Section, identifier: &str) -> TableRows {
        match self.section_table(document, section) {
            Some(table) => self.parse_table(table, section, identifier),
            None => {
                tracing::debug!("{}: no {} table", identifier, section);
                TableRows::default()
            }
        }
    }

    fn heading<'a>(&self, document: &'a Html, text: &str) -> Option<ElementRef<'a>> {
        document
            .select(&self.section_heading)
            .find(|h| h.text().any(|t| t.contains(text)))
    }

    /// The `table` inside the first transactions element that follows the
    /// section heading as a sibling, before the next section heading.
    pub fn section_table<'a>(&self, document: &'a Html, section: Section) -> Option<ElementRef<'a>> {
        let text = match section {
            Section::Buy => &self.buy_heading_text,
            Section::Sell => &self.sell_heading_text,
        };
        let heading = self.heading(document, text)?;

        let transactions = heading
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .take_while(|el| !self.section_heading.matches(el))
            .find(|el| el.value().name() == self.transactions_element)?;

        transactions
            .children()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "table")
    }

    pub fn parse_table(&self, table: ElementRef<'_>, section: Section, identifier: &str) -> TableRows {
        let mut rows = TableRows::default();

        for (index, row) in table.select(&self.body_row).enumerate() {
            match self.parse_row(row) {
                Ok(commodity) => rows.commodities.push(commodity),
                Err(issue) => {
                    tracing::warn!(
                        "⚠️ {} {} row {} skipped: {}",
                        identifier,
                        section,
                        index + 1,
                        issue
                    );
                    rows.skipped += 1;
                }
            }
        }

        rows
    }

    pub fn parse_row(&self, row: ElementRef<'_>) -> std::result::Result<Commodity, RowIssue> {
        let cells: Vec<ElementRef<'_>> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "td")
            .collect();
        if cells.len() < 3 {
            return Err(RowIssue::TooFewCells(cells.len()));
        }

        let name = cells[0]
            .select(&self.link)
            .next()
            .map(normalized_text)
            .ok_or(RowIssue::MissingElement("commodity link"))?;

        let price_text = cells[1]
            .select(&self.span)
            .next()
            .map(normalized_text)
            .ok_or(RowIssue::MissingElement("price"))?;
        let price = self
            .quotes
            .price(&price_text)
            .map_err(|_| RowIssue::Price(price_text.clone()))?;

        let inventory_text = normalized_text(cells[2]);
        let inventory = self
            .quotes
            .inventory(&inventory_text)
            .ok_or_else(|| RowIssue::Inventory(inventory_text.clone()))?;

        Ok(Commodity {
            name,
            price,
            stock: inventory.stock,
            refresh_rate: inventory.refresh_rate,
        })
    }
}

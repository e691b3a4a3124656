use crate::config::ParsingConfig;
use crate::utils::error::{AppError, Result};
use regex::Regex;

/// Separators of the locale the site renders numbers in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    pub thousands_separator: char,
    pub decimal_separator: char,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            thousands_separator: ',',
            decimal_separator: '.',
        }
    }
}

impl NumberFormat {
    pub fn parse(&self, text: &str) -> Result<f64> {
        let mut normalized = String::with_capacity(text.len());
        for c in text.trim().chars() {
            if c == self.thousands_separator || c.is_whitespace() {
                continue;
            }
            if c == self.decimal_separator {
                normalized.push('.');
            } else {
                normalized.push(c);
            }
        }

        normalized
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| AppError::NumberParseError {
                text: text.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inventory {
    pub stock: f64,
    pub refresh_rate: f64,
}

/// Turns the site's price and inventory texts into corrected units.
///
/// The site encodes prices a factor `price_divisor` too high and inventory a
/// factor `inventory_multiplier` too low.
#[derive(Debug, Clone)]
pub struct QuoteParser {
    inventory_pattern: Regex,
    numbers: NumberFormat,
    price_divisor: f64,
    inventory_multiplier: f64,
}

impl QuoteParser {
    pub fn new(config: &ParsingConfig) -> Result<Self> {
        Ok(Self {
            inventory_pattern: Regex::new(&config.inventory_pattern)?,
            numbers: NumberFormat {
                thousands_separator: config.thousands_separator,
                decimal_separator: config.decimal_separator,
            },
            price_divisor: config.price_divisor,
            inventory_multiplier: config.inventory_multiplier,
        })
    }

    pub fn price(&self, text: &str) -> Result<f64> {
        Ok(self.numbers.parse(text)? / self.price_divisor)
    }

    /// `None` when the text does not have the expected shape.
    pub fn inventory(&self, text: &str) -> Option<Inventory> {
        let caps = self.inventory_pattern.captures(text)?;
        let stock = self.numbers.parse(caps.name("stock")?.as_str()).ok()?;
        let rate = self.numbers.parse(caps.name("rate")?.as_str()).ok()?;

        Some(Inventory {
            stock: stock * self.inventory_multiplier,
            refresh_rate: rate * self.inventory_multiplier,
        })
    }
}

#[cfg(feature = "cli")]
pub mod cli;

use crate::domain::model::TargetTransform;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/101.0.4951.67 Safari/537.36";

pub const DEFAULT_INVENTORY_PATTERN: &str =
    r"Max (?P<stock>[0-9,]+) SCU \+ [<>=]*(?P<rate>[0-9,]+)/min";

pub const DEFAULT_CATEGORICAL_COLUMNS: &[&str] = &[
    "air.level",
    "base.num",
    "busi.level",
    "has.covered",
    "has.garage",
    "has.lot",
    "has.street",
    "neighborhood",
    "pet.allowed",
    "traffic.level",
    "has.parking",
    "has.pub.elementary",
    "has.priv.elementary",
    "has.pub.mid",
    "has.cha.high",
    "has.priv.high",
    "count.pub.high",
    "pub.elt.mid",
    "priv.elt.mid",
    "has.cha.mid.high",
    "has.priv.mid.high",
    "has.pub.mid.high",
    "priv.el.hi",
    "cha.elt.mid.hi",
    "priv.elt.mid.hi",
    "zip",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scraper: ScraperConfig,
    pub filler: FillerConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub base_url: String,
    pub output_dir: String,
    pub output_file: String,
    pub output_layout: OutputLayout,
    pub pretty: bool,
    pub page_wait_seconds: u64,
    pub poll_interval_ms: u64,
    pub settle_ms: u64,
    pub session: SessionConfig,
    pub selectors: SelectorConfig,
    pub parsing: ParsingConfig,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: "https://sc-trade.tools/shops".to_string(),
            output_dir: ".".to_string(),
            output_file: "shops.json".to_string(),
            output_layout: OutputLayout::Objects,
            pretty: false,
            page_wait_seconds: 10,
            poll_interval_ms: 500,
            settle_ms: 1000,
            session: SessionConfig::default(),
            selectors: SelectorConfig::default(),
            parsing: ParsingConfig::default(),
        }
    }
}

impl ScraperConfig {
    pub fn page_wait(&self) -> Duration {
        Duration::from_secs(self.page_wait_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputLayout {
    /// `[{identifier, buy_list, sell_list}]`
    #[default]
    Objects,
    /// `[[identifier, [[name, price, stock, refresh], ...], [...]]]`
    Tuples,
}

/// HTTP stand-ins for the browser launch flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub user_agent: String,
    pub accept_language: String,
    pub accept_invalid_certs: bool,
    pub request_timeout_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "en".to_string(),
            accept_invalid_certs: true,
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub shop_list: String,
    pub shop_option: String,
    pub section_heading: String,
    pub buy_heading_text: String,
    pub sell_heading_text: String,
    pub transactions_element: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            shop_list: "div.form-select-options".to_string(),
            shop_option: "div.form-select-option".to_string(),
            section_heading: "h2".to_string(),
            buy_heading_text: "Buy".to_string(),
            sell_heading_text: "Sell".to_string(),
            transactions_element: "app-transactions".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    pub inventory_pattern: String,
    pub thousands_separator: char,
    pub decimal_separator: char,
    pub price_divisor: f64,
    pub inventory_multiplier: f64,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            inventory_pattern: DEFAULT_INVENTORY_PATTERN.to_string(),
            thousands_separator: ',',
            decimal_separator: '.',
            price_divisor: 100.0,
            inventory_multiplier: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FillerConfig {
    pub data_dir: String,
    pub model_path: String,
    pub candidates_path: String,
    pub master_path: String,
    pub output_path: String,
    pub flag_column: String,
    pub target_column: String,
    pub categorical_columns: Vec<String>,
    /// Overrides the transform the model artifact declares.
    pub target_transform: Option<TargetTransform>,
    pub expected_features: Option<Vec<String>>,
    pub absent_indicators_as_zero: bool,
}

impl Default for FillerConfig {
    fn default() -> Self {
        Self {
            data_dir: ".".to_string(),
            model_path: "final_sqft_mod.json".to_string(),
            candidates_path: "fill_sqft.csv".to_string(),
            master_path: "full.csv".to_string(),
            output_path: "full_sqft.csv".to_string(),
            flag_column: "sqft.regressed".to_string(),
            target_column: "sqft".to_string(),
            categorical_columns: DEFAULT_CATEGORICAL_COLUMNS
                .iter()
                .map(|c| c.to_string())
                .collect(),
            target_transform: None,
            expected_features: None,
            absent_indicators_as_zero: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content)?;

        toml::from_str(&processed).map_err(|e| AppError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${NAME}` with the environment variable; unknown names are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.enabled
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.scraper.validate()?;
        self.filler.validate()
    }
}

impl Validate for ScraperConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("scraper.base_url", &self.base_url)?;
        validation::validate_path("scraper.output_dir", &self.output_dir)?;
        validation::validate_file_extension("scraper.output_file", &self.output_file, &["json"])?;
        validation::validate_positive_number("scraper.page_wait_seconds", self.page_wait_seconds, 1)?;
        validation::validate_positive_number("scraper.poll_interval_ms", self.poll_interval_ms, 1)?;
        validation::validate_non_empty_string("scraper.session.user_agent", &self.session.user_agent)?;

        let selectors = &self.selectors;
        for (field, value) in [
            ("scraper.selectors.shop_list", &selectors.shop_list),
            ("scraper.selectors.shop_option", &selectors.shop_option),
            ("scraper.selectors.section_heading", &selectors.section_heading),
            ("scraper.selectors.buy_heading_text", &selectors.buy_heading_text),
            ("scraper.selectors.sell_heading_text", &selectors.sell_heading_text),
            ("scraper.selectors.transactions_element", &selectors.transactions_element),
        ] {
            validation::validate_non_empty_string(field, value)?;
        }

        let parsing = &self.parsing;
        let pattern = Regex::new(&parsing.inventory_pattern)?;
        for group in ["stock", "rate"] {
            if !pattern.capture_names().flatten().any(|name| name == group) {
                return Err(AppError::InvalidConfigValueError {
                    field: "scraper.parsing.inventory_pattern".to_string(),
                    value: parsing.inventory_pattern.clone(),
                    reason: format!("Pattern must define a named group '{}'", group),
                });
            }
        }
        if parsing.thousands_separator == parsing.decimal_separator {
            return Err(AppError::InvalidConfigValueError {
                field: "scraper.parsing.decimal_separator".to_string(),
                value: parsing.decimal_separator.to_string(),
                reason: "Decimal and thousands separators must differ".to_string(),
            });
        }
        validation::validate_range(
            "scraper.parsing.price_divisor",
            parsing.price_divisor,
            f64::MIN_POSITIVE,
            f64::MAX,
        )?;
        validation::validate_range(
            "scraper.parsing.inventory_multiplier",
            parsing.inventory_multiplier,
            f64::MIN_POSITIVE,
            f64::MAX,
        )?;

        Ok(())
    }
}

impl Validate for FillerConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("filler.data_dir", &self.data_dir)?;
        validation::validate_file_extension("filler.model_path", &self.model_path, &["json"])?;
        validation::validate_file_extension("filler.candidates_path", &self.candidates_path, &["csv"])?;
        validation::validate_file_extension("filler.master_path", &self.master_path, &["csv"])?;
        validation::validate_file_extension("filler.output_path", &self.output_path, &["csv"])?;
        validation::validate_non_empty_string("filler.flag_column", &self.flag_column)?;
        validation::validate_non_empty_string("filler.target_column", &self.target_column)?;

        if let Some(expected) = &self.expected_features {
            if expected.is_empty() {
                return Err(AppError::InvalidConfigValueError {
                    field: "filler.expected_features".to_string(),
                    value: "[]".to_string(),
                    reason: "Omit the field instead of listing no features".to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_reproduce_fixed_entry_points() {
        let config = AppConfig::from_toml_str("").unwrap();

        assert_eq!(config.scraper.base_url, "https://sc-trade.tools/shops");
        assert_eq!(config.scraper.output_file, "shops.json");
        assert_eq!(config.scraper.page_wait(), Duration::from_secs(10));
        assert_eq!(config.scraper.settle_delay(), Duration::from_secs(1));
        assert_eq!(config.filler.flag_column, "sqft.regressed");
        assert_eq!(config.filler.categorical_columns.len(), 26);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
[scraper]
base_url = "http://localhost:9000/shops"
output_layout = "tuples"

[scraper.parsing]
thousands_separator = "."
decimal_separator = ","

[filler]
target_transform = "log"
absent_indicators_as_zero = true
"#,
        )
        .unwrap();

        assert_eq!(config.scraper.base_url, "http://localhost:9000/shops");
        assert_eq!(config.scraper.output_layout, OutputLayout::Tuples);
        assert_eq!(config.scraper.parsing.thousands_separator, '.');
        assert_eq!(config.scraper.parsing.price_divisor, 100.0);
        assert_eq!(config.filler.target_transform, Some(TargetTransform::Log));
        assert!(config.filler.absent_indicators_as_zero);
        assert_eq!(config.filler.master_path, "full.csv");
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TRADEFILL_TEST_DATA_DIR", "/srv/apartments");
        let config = AppConfig::from_toml_str(
            r#"
[filler]
data_dir = "${TRADEFILL_TEST_DATA_DIR}"
output_path = "${TRADEFILL_TEST_UNSET_VAR}.csv"
"#,
        )
        .unwrap();

        assert_eq!(config.filler.data_dir, "/srv/apartments");
        assert_eq!(config.filler.output_path, "${TRADEFILL_TEST_UNSET_VAR}.csv");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = AppConfig::from_toml_str("[scraper\nbase_url = 1").unwrap_err();
        assert!(matches!(err, AppError::ConfigError { ref message } if message.starts_with("TOML parsing error")));
    }

    #[test]
    fn test_pattern_without_rate_group_is_rejected() {
        let mut config = AppConfig::default();
        config.scraper.parsing.inventory_pattern = r"Max (?P<stock>[0-9,]+) SCU".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("rate"));
    }

    #[test]
    fn test_zero_wait_is_rejected() {
        let mut config = AppConfig::default();
        config.scraper.page_wait_seconds = 0;
        assert!(config.validate().is_err());
    }
}

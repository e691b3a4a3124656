use serde::{Deserialize, Serialize};

/// One listing row of a shop's buy or sell table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commodity {
    pub name: String,
    pub price: f64,
    pub stock: f64,
    pub refresh_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shop {
    pub identifier: String,
    pub buy_list: Vec<Commodity>,
    pub sell_list: Vec<Commodity>,
}

/// A shop detail page as loaded, before any table is parsed.
#[derive(Debug, Clone)]
pub struct ShopPage {
    pub identifier: String,
    pub url: String,
    pub html: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScrapeOutcome {
    pub shops: Vec<Shop>,
    pub skipped_rows: usize,
}

/// Dense, row-major numeric input for a regression model.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// How a model's raw output maps back to the target's units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum TargetTransform {
    #[default]
    Identity,
    /// Trained on ln(target); predictions are exponentiated.
    Log,
}

impl TargetTransform {
    pub fn apply(self, raw: f64) -> f64 {
        match self {
            TargetTransform::Identity => raw,
            TargetTransform::Log => raw.exp(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillSummary {
    pub total_rows: usize,
    pub filled_rows: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shop_serializes_with_named_fields() {
        let shop = Shop {
            identifier: "Port Olisar".to_string(),
            buy_list: vec![],
            sell_list: vec![Commodity {
                name: "Laranite".to_string(),
                price: 27.5,
                stock: 120000.0,
                refresh_rate: 30000.0,
            }],
        };

        let value = serde_json::to_value(&shop).unwrap();
        assert_eq!(value["identifier"], "Port Olisar");
        assert_eq!(value["buy_list"], serde_json::json!([]));
        assert_eq!(value["sell_list"][0]["refresh_rate"], 30000.0);
    }

    #[test]
    fn test_target_transform() {
        assert_eq!(TargetTransform::Identity.apply(2.0), 2.0);
        assert!((TargetTransform::Log.apply(0.0) - 1.0).abs() < f64::EPSILON);
        let parsed: TargetTransform = serde_json::from_str("\"log\"").unwrap();
        assert_eq!(parsed, TargetTransform::Log);
    }
}

use crate::domain::model::FeatureMatrix;
use crate::utils::error::{AppError, Result};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Cell texts read as "missing", the same set pandas' CSV reader treats as NaN.
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_missing(value: &str) -> bool {
    MISSING_MARKERS.contains(&value)
}

/// A CSV table kept as text so untouched cells are written back verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl DataTable {
    pub fn new(name: &str, headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != headers.len()) {
            return Err(AppError::ShapeMismatch {
                message: format!(
                    "{}: row {} has {} cells but the header has {}",
                    name,
                    i + 1,
                    row.len(),
                    headers.len()
                ),
            });
        }

        Ok(Self {
            name: name.to_string(),
            headers,
            rows,
        })
    }

    pub fn from_csv_bytes(name: &str, bytes: &[u8]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(bytes);

        let headers = reader.headers()?.iter().map(String::from).collect();
        let rows = reader
            .records()
            .map(|record| Ok(record?.iter().map(String::from).collect()))
            .collect::<Result<Vec<Vec<String>>>>()?;

        Self::new(name, headers, rows)
    }

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| AppError::IoError(e.into_error()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    pub fn require_column(&self, column: &str) -> Result<usize> {
        self.column_index(column)
            .ok_or_else(|| AppError::MissingColumn {
                column: column.to_string(),
                table: self.name.clone(),
            })
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    /// Index of `column`, appending it with empty cells when absent.
    pub fn ensure_column(&mut self, column: &str) -> usize {
        if let Some(index) = self.column_index(column) {
            return index;
        }
        self.headers.push(column.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    pub fn set(&mut self, row: usize, column: usize, value: String) {
        self.rows[row][column] = value;
    }
}

/// How a categorical column's cells are named in indicator headers.
///
/// Mirrors pandas' dtype inference: a column of integers names levels as
/// integers, but any missing cell or fractional value turns the whole column
/// into floats, so `98103` becomes `98103.0`. Anything else keeps its text.
#[derive(Debug, Clone, Copy, PartialEq)]
enum LevelKind {
    Integer,
    Float,
    Text,
}

impl LevelKind {
    fn infer<'a>(values: impl Iterator<Item = &'a str>) -> Self {
        let mut any_missing = false;
        let mut all_integer = true;
        for value in values {
            if is_missing(value) {
                any_missing = true;
                continue;
            }
            let trimmed = value.trim();
            if trimmed.parse::<i64>().is_err() {
                all_integer = false;
                match trimmed.parse::<f64>() {
                    Ok(number) if number.is_finite() => {}
                    _ => return LevelKind::Text,
                }
            }
        }

        if all_integer && !any_missing {
            LevelKind::Integer
        } else {
            LevelKind::Float
        }
    }

    /// Indicator suffix for a cell; `None` for missing cells.
    fn label(self, value: &str) -> Option<String> {
        if is_missing(value) {
            return None;
        }
        let trimmed = value.trim();
        let label = match self {
            LevelKind::Integer => trimmed.parse::<i64>().map(|n| n.to_string()).ok(),
            LevelKind::Float => trimmed.parse::<f64>().ok().map(float_label),
            LevelKind::Text => None,
        };
        Some(label.unwrap_or_else(|| value.to_string()))
    }
}

fn float_label(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e16 {
        format!("{:.1}", number)
    } else {
        number.to_string()
    }
}

/// Distinct labels of the non-missing values, numerically ordered when the
/// column is numeric.
fn levels(kind: LevelKind, labels: &[Option<String>]) -> Vec<String> {
    let distinct: BTreeSet<&str> = labels.iter().flatten().map(String::as_str).collect();
    let mut levels: Vec<String> = distinct.into_iter().map(String::from).collect();

    if kind != LevelKind::Text {
        let mut paired: Vec<(f64, String)> = levels
            .into_iter()
            .map(|v| (v.parse::<f64>().unwrap_or(f64::NAN), v))
            .collect();
        paired.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        levels = paired.into_iter().map(|(_, v)| v).collect();
    }

    levels
}

/// Replaces each of `columns` with one `1`/`0` indicator column per observed
/// value, named `<column>_<value>`.
///
/// Indicators are appended after the remaining columns. Values that never
/// occur in `table` get no column, and missing cells set no indicator.
pub fn one_hot_encode(table: &DataTable, columns: &[String]) -> Result<DataTable> {
    let mut encoded: Vec<(usize, &str)> = Vec::with_capacity(columns.len());
    for column in columns {
        let index = table.require_column(column)?;
        if !encoded.iter().any(|(i, _)| *i == index) {
            encoded.push((index, column.as_str()));
        }
    }

    let kept: Vec<usize> = (0..table.headers.len())
        .filter(|i| !encoded.iter().any(|(e, _)| e == i))
        .collect();

    let mut headers: Vec<String> = kept.iter().map(|&i| table.headers[i].clone()).collect();
    // Per encoded column: each row's label, then the sorted distinct levels.
    let mut expansions: Vec<(Vec<Option<String>>, Vec<String>)> =
        Vec::with_capacity(encoded.len());
    for &(index, column) in &encoded {
        let kind = LevelKind::infer(table.rows.iter().map(|row| row[index].as_str()));
        let labels: Vec<Option<String>> =
            table.rows.iter().map(|row| kind.label(&row[index])).collect();
        let values = levels(kind, &labels);
        headers.extend(values.iter().map(|v| format!("{}_{}", column, v)));
        expansions.push((labels, values));
    }

    let rows = table
        .rows
        .iter()
        .enumerate()
        .map(|(r, row)| {
            let mut out: Vec<String> = kept.iter().map(|&i| row[i].clone()).collect();
            for (labels, values) in &expansions {
                out.extend(values.iter().map(|v| {
                    let indicator = if labels[r].as_deref() == Some(v.as_str()) {
                        "1"
                    } else {
                        "0"
                    };
                    indicator.to_string()
                }));
            }
            out
        })
        .collect();

    DataTable::new(&table.name, headers, rows)
}

/// Reads a regression-needed flag cell.
pub fn parse_flag(value: &str, row: usize, column: &str) -> Result<bool> {
    match value.trim() {
        "True" | "true" | "TRUE" | "1" | "1.0" | "yes" => Ok(true),
        "False" | "false" | "FALSE" | "0" | "0.0" | "no" => Ok(false),
        other => Err(AppError::InvalidValue {
            row,
            column: column.to_string(),
            value: other.to_string(),
        }),
    }
}

fn parse_feature(value: &str, row: usize, column: &str) -> Result<f64> {
    let trimmed = value.trim();
    let parsed = match trimmed {
        "True" | "true" => Some(1.0),
        "False" | "false" => Some(0.0),
        _ if is_missing(trimmed) => None,
        _ => trimmed.parse::<f64>().ok().filter(|v| v.is_finite()),
    };

    parsed.ok_or_else(|| AppError::InvalidValue {
        row,
        column: column.to_string(),
        value: value.to_string(),
    })
}

enum FeatureSource {
    Column(usize),
    Zero,
}

/// Builds the model input from the rows where `mask` is set, with columns in
/// `features` order.
///
/// A feature that is not a column of `table` is an error, unless it is an
/// indicator `<column>_<value>` for one of `zero_fill_columns`; those are
/// read as all zeros.
pub fn select_features(
    table: &DataTable,
    features: &[String],
    mask: &[bool],
    zero_fill_columns: &[String],
) -> Result<FeatureMatrix> {
    if mask.len() != table.len() {
        return Err(AppError::ShapeMismatch {
            message: format!(
                "{} has {} rows but the flag column has {}",
                table.name,
                table.len(),
                mask.len()
            ),
        });
    }

    let sources = features
        .iter()
        .map(|feature| match table.column_index(feature) {
            Some(index) => Ok(FeatureSource::Column(index)),
            None if zero_fill_columns
                .iter()
                .any(|c| feature.starts_with(&format!("{}_", c))) =>
            {
                tracing::warn!("⚠️ Indicator '{}' absent from this batch, using zeros", feature);
                Ok(FeatureSource::Zero)
            }
            None => Err(AppError::MissingFeature {
                feature: feature.clone(),
            }),
        })
        .collect::<Result<Vec<_>>>()?;

    let mut rows = Vec::new();
    for (i, row) in table.rows.iter().enumerate().filter(|(i, _)| mask[*i]) {
        let values = sources
            .iter()
            .zip(features)
            .map(|(source, feature)| match source {
                FeatureSource::Column(index) => parse_feature(&row[*index], i + 1, feature),
                FeatureSource::Zero => Ok(0.0),
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(values);
    }

    Ok(FeatureMatrix {
        columns: features.to_vec(),
        rows,
    })
}

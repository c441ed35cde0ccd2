use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::field::FieldValue;
use super::grid::GridRow;

/// Operators of a text column filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextOperator {
    Contains,
    NotContains,
    Equals,
    NotEqual,
    StartsWith,
    EndsWith,
    Blank,
    NotBlank,
}

/// Operators of a number column filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NumberOperator {
    Equals,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    InRange,
    Blank,
    NotBlank,
}

/// Filter on a single column, in the grid's JSON filter-model shape:
/// `{"filterType": "text", "type": "contains", "filter": "ACME"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "filterType", rename_all = "lowercase")]
pub enum ColumnFilter {
    Text {
        #[serde(rename = "type")]
        operator: TextOperator,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter: Option<String>,
    },
    Number {
        #[serde(rename = "type")]
        operator: NumberOperator,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter: Option<f64>,
        #[serde(rename = "filterTo", default, skip_serializing_if = "Option::is_none")]
        filter_to: Option<f64>,
    },
}

impl ColumnFilter {
    pub fn text(operator: TextOperator, filter: impl Into<String>) -> Self {
        ColumnFilter::Text {
            operator,
            filter: Some(filter.into()),
        }
    }

    pub fn number(operator: NumberOperator, filter: f64) -> Self {
        ColumnFilter::Number {
            operator,
            filter: Some(filter),
            filter_to: None,
        }
    }

    /// Whether a cell passes this filter. Text matching is case-insensitive.
    /// An empty filter term does not restrict anything.
    pub fn matches(&self, value: &FieldValue<'_>) -> bool {
        match self {
            ColumnFilter::Text { operator, filter } => {
                let term = filter.as_deref().map(str::to_lowercase).unwrap_or_default();
                let cell = value.to_string().to_lowercase();
                match operator {
                    TextOperator::Blank => value.is_blank(),
                    TextOperator::NotBlank => !value.is_blank(),
                    _ if term.is_empty() => true,
                    TextOperator::Contains => cell.contains(&term),
                    TextOperator::NotContains => !cell.contains(&term),
                    TextOperator::Equals => cell == term,
                    TextOperator::NotEqual => cell != term,
                    TextOperator::StartsWith => cell.starts_with(&term),
                    TextOperator::EndsWith => cell.ends_with(&term),
                }
            }
            ColumnFilter::Number {
                operator,
                filter,
                filter_to,
            } => {
                let cell = value.as_number();
                match (operator, *filter, cell) {
                    (NumberOperator::Blank, _, c) => c.is_none(),
                    (NumberOperator::NotBlank, _, c) => c.is_some(),
                    (_, None, _) => true,
                    (_, Some(_), None) => false,
                    (NumberOperator::Equals, Some(b), Some(c)) => c == b,
                    (NumberOperator::NotEqual, Some(b), Some(c)) => c != b,
                    (NumberOperator::LessThan, Some(b), Some(c)) => c < b,
                    (NumberOperator::LessThanOrEqual, Some(b), Some(c)) => c <= b,
                    (NumberOperator::GreaterThan, Some(b), Some(c)) => c > b,
                    (NumberOperator::GreaterThanOrEqual, Some(b), Some(c)) => c >= b,
                    (NumberOperator::InRange, Some(b), Some(c)) => match filter_to {
                        Some(upper) => c >= b && c <= *upper,
                        None => c >= b,
                    },
                }
            }
        }
    }
}

/// Filters of a whole grid: column id → column filter.
///
/// The same model is mirrored onto every grid; columns a grid does not
/// have are ignored when evaluating its rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterModel {
    columns: BTreeMap<String, ColumnFilter>,
}

impl FilterModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, column_id: impl Into<String>, filter: ColumnFilter) -> Self {
        self.columns.insert(column_id.into(), filter);
        self
    }

    pub fn set(&mut self, column_id: impl Into<String>, filter: ColumnFilter) {
        self.columns.insert(column_id.into(), filter);
    }

    pub fn remove(&mut self, column_id: &str) -> Option<ColumnFilter> {
        self.columns.remove(column_id)
    }

    pub fn get(&self, column_id: &str) -> Option<&ColumnFilter> {
        self.columns.get(column_id)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &ColumnFilter)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// A row passes when every filter on a column it has passes.
    pub fn matches<R: GridRow + ?Sized>(&self, row: &R) -> bool {
        self.columns.iter().all(|(column_id, filter)| {
            row.column(column_id)
                .map_or(true, |value| filter.matches(&value))
        })
    }
}

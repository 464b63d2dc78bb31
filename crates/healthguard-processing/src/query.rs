//! Keyword-driven question answering over a table.
//!
//! Not natural-language understanding: the lower-cased question is checked
//! against [`RULES`] in order and the first keyword it contains picks the
//! answer. Same table and question always give the same text.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::utils::is_numeric_dtype;

/// Answer returned when no keyword matches.
pub const FALLBACK_ANSWER: &str =
    "Sorry, I can only answer questions about rows, columns, missing values, and column means.";

/// What a question is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryTopic {
    RowCount,
    ColumnCount,
    MissingTotal,
    ColumnMeans,
    Unsupported,
}

/// Keyword rules, first match wins.
pub const RULES: &[(&str, QueryTopic)] = &[
    ("row", QueryTopic::RowCount),
    ("column", QueryTopic::ColumnCount),
    ("missing", QueryTopic::MissingTotal),
    ("mean", QueryTopic::ColumnMeans),
];

impl QueryTopic {
    /// Classify a question by the first rule whose keyword it contains.
    pub fn classify(question: &str) -> Self {
        let lower = question.to_lowercase();
        RULES
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map_or(Self::Unsupported, |(_, topic)| *topic)
    }
}

/// Answer `question` about `df`.
pub fn answer(df: &DataFrame, question: &str) -> String {
    match QueryTopic::classify(question) {
        QueryTopic::RowCount => format!("The dataset has {} rows.", df.height()),
        QueryTopic::ColumnCount => {
            let names: Vec<&str> = df.get_columns().iter().map(|c| c.name().as_str()).collect();
            format!("The dataset has {} columns: {}.", df.width(), names.join(", "))
        }
        QueryTopic::MissingTotal => {
            let total: usize = df.get_columns().iter().map(|c| c.null_count()).sum();
            format!("Missing values in total: {}.", total)
        }
        QueryTopic::ColumnMeans => column_means(df),
        QueryTopic::Unsupported => FALLBACK_ANSWER.to_string(),
    }
}

fn column_means(df: &DataFrame) -> String {
    let means: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|c| is_numeric_dtype(c.dtype()))
        .map(|c| match c.as_materialized_series().mean() {
            Some(mean) => format!("{}: {:.2}", c.name(), mean),
            None => format!("{}: n/a", c.name()),
        })
        .collect();

    if means.is_empty() {
        "The dataset has no numeric columns.".to_string()
    } else {
        format!("Column means: {}", means.join(", "))
    }
}

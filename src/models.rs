use std::collections::HashSet;
use std::fmt;

use serde::Deserialize;

use crate::error::{MergeError, MergeResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Template {
    pub(crate) name: String,
    pub(crate) body: String,
}

impl Template {
    pub(crate) fn new(name: &str, body: &str) -> Self {
        Self {
            name: name.to_string(),
            body: body.to_string(),
        }
    }

    pub(crate) fn from_bytes(name: &str, bytes: Vec<u8>) -> MergeResult<Self> {
        let body = String::from_utf8(bytes).map_err(|err| MergeError::Extraction {
            name: name.to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self {
            name: name.to_string(),
            body,
        })
    }
}

/// A `{{...}}` token, identified by its exact text including the braces.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Placeholder(String);

impl Placeholder {
    pub(crate) fn new(token: &str) -> Self {
        Self(token.to_string())
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn inner(&self) -> &str {
        self.0
            .strip_prefix("{{")
            .and_then(|rest| rest.strip_suffix("}}"))
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Row {
    cells: Vec<(String, String)>,
}

impl Row {
    pub(crate) fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            cells: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    pub(crate) fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Table {
    pub(crate) columns: Vec<String>,
    pub(crate) rows: Vec<Row>,
}

impl Table {
    /// `columns` are the field names of the header row. Short records leave their trailing columns
    /// absent.
    pub(crate) fn from_records(columns: Vec<String>, records: Vec<Vec<String>>) -> MergeResult<Self> {
        ensure_distinct(&columns)?;
        let mut rows = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            if record.len() > columns.len() {
                return Err(MergeError::InvalidInput(format!(
                    "record {} has {} fields but only {} columns are defined",
                    index + 1,
                    record.len(),
                    columns.len()
                )));
            }
            rows.push(Row::from_pairs(columns.iter().cloned().zip(record)));
        }
        Ok(Self { columns, rows })
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn ensure_distinct(columns: &[String]) -> MergeResult<()> {
    let mut seen = HashSet::new();
    for column in columns {
        if !seen.insert(column.as_str()) {
            return Err(MergeError::InvalidInput(format!(
                "column '{column}' appears more than once"
            )));
        }
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RenderResult {
    pub(crate) body: String,
    /// 1-based.
    pub(crate) position: usize,
    pub(crate) total: usize,
}

/// What a mapped placeholder becomes when its column is empty or missing in a row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum EmptyValuePolicy {
    /// Leave the raw token in the output.
    #[default]
    KeepToken,
    /// Substitute an empty string.
    Blank,
}

//! Class index to label lookup
//!
//! Tables load from plain text (one label per line, line number = class
//! index) or from JSON, either a list or an index-keyed object.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::LabelError;

/// Immutable mapping from class index to label string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LabelSource", into = "BTreeMap<usize, String>")]
pub struct LabelTable {
    labels: BTreeMap<usize, String>,
}

/// Accepted JSON shapes: `["cat", "dog"]` or `{"0": "cat", "1": "dog"}`
#[derive(Deserialize)]
#[serde(untagged)]
enum LabelSource {
    List(Vec<String>),
    // Keys stay strings here: untagged buffering cannot parse integer keys.
    Map(BTreeMap<String, String>),
}

impl TryFrom<LabelSource> for LabelTable {
    type Error = LabelError;

    fn try_from(src: LabelSource) -> Result<Self, Self::Error> {
        match src {
            LabelSource::List(names) => Ok(names.into_iter().collect()),
            LabelSource::Map(entries) => {
                let pairs = entries
                    .into_iter()
                    .map(|(key, name)| {
                        key.trim()
                            .parse::<usize>()
                            .map(|idx| (idx, name))
                            .map_err(|_| LabelError::InvalidIndex(key))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Self::from_pairs(pairs)
            }
        }
    }
}

impl From<LabelTable> for BTreeMap<usize, String> {
    fn from(table: LabelTable) -> Self {
        table.labels
    }
}

impl LabelTable {
    /// Build from explicit `(index, label)` pairs, rejecting duplicates
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, LabelError>
    where
        I: IntoIterator<Item = (usize, S)>,
        S: Into<String>,
    {
        let mut labels = BTreeMap::new();
        for (idx, name) in pairs {
            if labels.insert(idx, name.into()).is_some() {
                return Err(LabelError::Duplicate(idx));
            }
        }
        Ok(Self { labels })
    }

    /// Load a text file with one label per line.
    ///
    /// Empty lines are skipped and do not consume an index.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open label file: {:?}", path))?;
        let reader = BufReader::new(file);

        let mut names = Vec::new();
        for (line_num, line) in reader.lines().enumerate() {
            let line = line
                .with_context(|| format!("Failed to read line {} from {:?}", line_num + 1, path))?;

            let name = line.trim();
            if name.is_empty() {
                continue;
            }
            names.push(name.to_string());
        }

        if names.is_empty() {
            warn!("Label file {:?} contains no labels", path);
        }
        debug!("Loaded {} labels from {:?}", names.len(), path);
        Ok(names.into_iter().collect())
    }

    /// Load a JSON label table (list or index map)
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read label file: {:?}", path))?;
        serde_json::from_str(&text).with_context(|| format!("Invalid label JSON in {:?}", path))
    }

    /// Label for a class index
    pub fn get(&self, idx: usize) -> Result<&str, LabelError> {
        self.labels
            .get(&idx)
            .map(String::as_str)
            .ok_or(LabelError::Missing(idx))
    }

    /// Number of labels
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for LabelTable {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            labels: iter.into_iter().map(Into::into).enumerate().collect(),
        }
    }
}

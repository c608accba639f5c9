// Copyright 2024 The DocAssert Authors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

use bigdecimal::BigDecimal;
use serde_json::Value;
use std::{fmt, sync::OnceLock};

use crate::json_diff::{misc::Indent, path::Path};

mod convert;
mod json_diff;

pub use convert::{IntoJson, Serialized};
pub use json_diff::{
    path::{array_path, field_path},
    CompareOption, Config, Difference, DifferenceKind, Differences, Options,
    DEFAULT_IGNORE_PLACEHOLDER,
};

const DIFF_TARGET: &str = "json_unit_diff::difference::diff";
const VALUES_TARGET: &str = "json_unit_diff::difference::values";

/// Report returned by [`Diff::differences`] when nothing differs.
pub const SAME_VALUE: &str = "JSON documents have the same value.";

/// Comparison of an expected JSON document with an actual one.
///
/// The comparison runs on the first call to [`Diff::similar`],
/// [`Diff::differences`] or [`Diff::difference_list`]; later calls return the
/// same result without comparing again.
///
/// # Examples
///
/// ```
/// use json_unit_diff::{CompareOption, Config, Diff};
///
/// let diff = Diff::create(
///     r#"{"a": 1, "b": [1, 2]}"#,
///     r#"{"b": [2, 1], "a": 1, "c": null}"#,
///     "actual",
///     Config::new()
///         .option(CompareOption::IgnoreArrayOrder)
///         .option(CompareOption::TreatNullAsAbsent),
/// )
/// .unwrap();
///
/// assert!(diff.similar());
/// assert_eq!(diff.differences(), "JSON documents have the same value.");
/// ```
#[derive(Debug)]
pub struct Diff {
    expected: Value,
    actual: Value,
    config: Config,
    differences: OnceLock<Differences>,
}

impl Diff {
    /// Constructs a comparison of two already parsed documents.
    ///
    /// The configuration is used as it is, see [`Config::validate`].
    pub fn new(expected: Value, actual: Value, config: Config) -> Self {
        Self {
            expected,
            actual,
            config,
            differences: OnceLock::new(),
        }
    }

    /// Constructs a comparison from any supported input.
    ///
    /// `actual_name` names the actual document in conversion errors.
    ///
    /// # Examples
    ///
    /// ```
    /// use json_unit_diff::{Config, Diff, Serialized};
    /// use serde_json::json;
    /// use std::collections::HashMap;
    ///
    /// let actual = HashMap::from([("name", "John")]);
    /// let diff = Diff::create(
    ///     json!({ "name": "John" }),
    ///     Serialized(&actual),
    ///     "user",
    ///     Config::new(),
    /// )
    /// .unwrap();
    /// assert!(diff.similar());
    ///
    /// let err = Diff::create("1", "{", "user", Config::new()).unwrap_err();
    /// assert_eq!(err.to_string(), "can not parse user value: '{'");
    /// ```
    pub fn create(
        expected: impl IntoJson,
        actual: impl IntoJson,
        actual_name: &str,
        config: Config,
    ) -> Result<Self, Error> {
        config.validate()?;

        let expected = expected.into_expected_json()?;
        let actual = actual.into_json(actual_name)?;

        Ok(Self::new(expected, actual, config))
    }

    fn compare(&self) -> &Differences {
        self.differences
            .get_or_init(|| json_diff::diff(&self.expected, &self.actual, &self.config))
    }

    /// Returns true if no difference was found.
    pub fn similar(&self) -> bool {
        let result = self.compare().is_empty();
        self.log_differences(result);
        result
    }

    /// Returns the report of all differences, one per line, or
    /// [`SAME_VALUE`] if there are none.
    pub fn differences(&self) -> String {
        if self.similar() {
            return SAME_VALUE.to_string();
        }
        self.compare().to_string()
    }

    /// Returns the differences found, in the order they were found.
    pub fn difference_list(&self) -> &Differences {
        self.compare()
    }

    fn log_differences(&self, result: bool) {
        if result {
            return;
        }

        if tracing::enabled!(target: DIFF_TARGET, tracing::Level::DEBUG) {
            tracing::debug!(target: DIFF_TARGET, "{}", self.compare().to_string().trim());
        }

        if tracing::enabled!(target: VALUES_TARGET, tracing::Level::DEBUG) {
            let start_path = Path::parse(&self.config.start_path);
            let actual = start_path
                .locate(&self.actual)
                .map_or_else(|| "(missing)".to_string(), pretty);

            tracing::debug!(
                target: VALUES_TARGET,
                "Comparing expected:\n{}\n------------\nwith actual at \"{}\":\n{}\n",
                pretty(&self.expected),
                start_path,
                actual
            );
        }
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|_| value.to_string())
        .indent(4)
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.differences())
    }
}

/// Error raised before a comparison can run.
///
/// Differences between documents are never errors, they are reported by
/// [`Diff::differences`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input text is not valid JSON
    #[error("can not parse {label} value: '{text}'")]
    Parse {
        label: String,
        text: String,
        #[source]
        source: serde_json::Error,
    },
    /// Input could not be serialized into a JSON tree
    #[error("can not convert {label} value to JSON")]
    Convert {
        label: String,
        #[source]
        source: serde_json::Error,
    },
    /// Numeric tolerance must not be negative
    #[error("numeric tolerance must not be negative, got {0}")]
    NegativeTolerance(BigDecimal),
    /// Name of a comparison option is not known
    #[error("unknown option '{0}'")]
    UnknownOption(String),
}

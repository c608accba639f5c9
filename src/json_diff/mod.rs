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

pub(crate) mod misc;
pub mod path;

use bigdecimal::{BigDecimal, Signed, Zero};
use misc::{compare_keys, render_keys, render_list};
use path::{array_path, field_path, Path};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::{cmp::Ordering, collections::BTreeSet, fmt, str::FromStr};

use crate::Error;

/// Placeholder which, used as a string value in the expected document,
/// accepts any actual value at that position.
pub const DEFAULT_IGNORE_PLACEHOLDER: &str = "${json-unit.ignore}";

/// Option relaxing how JSON documents are compared.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompareOption {
    /// Fields present only in the actual document are not reported.
    IgnoreExtraFields,
    /// Only the shape of containers is compared, leaf values are not.
    IgnoreValues,
    /// Arrays are compared as multisets.
    IgnoreArrayOrder,
    /// A field with `null` value in the actual document counts as absent.
    TreatNullAsAbsent,
    /// Only structural differences (keys, array lengths) are reported.
    CompareOnlyStructure,
}

impl CompareOption {
    const ALL: [CompareOption; 5] = [
        CompareOption::IgnoreExtraFields,
        CompareOption::IgnoreValues,
        CompareOption::IgnoreArrayOrder,
        CompareOption::TreatNullAsAbsent,
        CompareOption::CompareOnlyStructure,
    ];

    fn name(&self) -> &'static str {
        match self {
            CompareOption::IgnoreExtraFields => "IGNORE_EXTRA_FIELDS",
            CompareOption::IgnoreValues => "IGNORE_VALUES",
            CompareOption::IgnoreArrayOrder => "IGNORE_ARRAY_ORDER",
            CompareOption::TreatNullAsAbsent => "TREAT_NULL_AS_ABSENT",
            CompareOption::CompareOnlyStructure => "COMPARE_ONLY_STRUCTURE",
        }
    }
}

impl fmt::Display for CompareOption {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Accepts both `IGNORE_ARRAY_ORDER` and `ignore-array-order` spellings.
impl FromStr for CompareOption {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_").to_uppercase();

        CompareOption::ALL
            .into_iter()
            .find(|option| option.name() == normalized)
            .ok_or_else(|| Error::UnknownOption(s.to_string()))
    }
}

/// Set of [`CompareOption`]s, queried by membership only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(BTreeSet<CompareOption>);

impl Options {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns a copy of the set with `option` added.
    pub fn with(mut self, option: CompareOption) -> Self {
        self.0.insert(option);
        self
    }

    pub fn contains(&self, option: CompareOption) -> bool {
        self.0.contains(&option)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<CompareOption> for Options {
    fn from_iter<I: IntoIterator<Item = CompareOption>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Configuration for how JSON values should be compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub(crate) start_path: String,
    pub(crate) ignore_placeholder: String,
    pub(crate) numeric_tolerance: Option<BigDecimal>,
    pub(crate) options: Options,
}

impl Config {
    /// Create a new [`Config`] comparing from the root, with no options,
    /// no numeric tolerance and [`DEFAULT_IGNORE_PLACEHOLDER`].
    pub fn new() -> Self {
        Self {
            start_path: String::new(),
            ignore_placeholder: DEFAULT_IGNORE_PLACEHOLDER.to_string(),
            numeric_tolerance: None,
            options: Options::empty(),
        }
    }

    /// Compare the expected document against the node of the actual
    /// document found at `start_path`, e.g. `data.users[0]`.
    pub fn start_path(mut self, start_path: impl Into<String>) -> Self {
        self.start_path = start_path.into();
        self
    }

    /// Change the string which marks expected values as "any value".
    pub fn ignore_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.ignore_placeholder = placeholder.into();
        self
    }

    /// Numbers are equal when their absolute difference is at most `tolerance`.
    pub fn numeric_tolerance(mut self, tolerance: BigDecimal) -> Self {
        self.numeric_tolerance = Some(tolerance);
        self
    }

    /// Add a single option to the option set.
    pub fn option(mut self, option: CompareOption) -> Self {
        self.options = self.options.with(option);
        self
    }

    /// Replace the option set.
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn has_option(&self, option: CompareOption) -> bool {
        self.options.contains(option)
    }

    /// Checks the configuration can be used for a comparison.
    pub fn validate(&self) -> Result<(), Error> {
        match &self.numeric_tolerance {
            Some(tolerance) if *tolerance < BigDecimal::from(0) => {
                Err(Error::NegativeTolerance(tolerance.clone()))
            }
            _ => Ok(()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a difference is about the shape of the documents or their content.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DifferenceKind {
    /// Missing node, different keys or different array length.
    Structure,
    /// Different type, different value or different array content.
    Value,
}

/// A single difference, with its message formatted when it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Difference {
    kind: DifferenceKind,
    path: String,
    message: String,
}

impl Difference {
    pub fn kind(&self) -> DifferenceKind {
        self.kind
    }

    /// Path of the node the difference was found in.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Ordered, append-only list of differences found by one comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Differences {
    entries: Vec<Difference>,
}

impl Differences {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, kind: DifferenceKind, path: &str, message: String) {
        self.entries.push(Difference {
            kind,
            path: path.to_string(),
            message,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Difference> {
        self.entries.iter()
    }
}

/// Every message on its own line, in the order they were found.
impl fmt::Display for Differences {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for difference in &self.entries {
            writeln!(f, "{}", difference)?;
        }
        Ok(())
    }
}

/// Kind of a JSON node.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum NodeType {
    Object,
    Array,
    String,
    Number,
    Boolean,
    Null,
}

impl NodeType {
    pub(crate) fn of(node: &Value) -> Self {
        match node {
            Value::Object(_) => NodeType::Object,
            Value::Array(_) => NodeType::Array,
            Value::String(_) => NodeType::String,
            Value::Number(_) => NodeType::Number,
            Value::Bool(_) => NodeType::Boolean,
            Value::Null => NodeType::Null,
        }
    }
}

/// Compares `expected` with the node of `actual` at the configured start path.
pub(crate) fn diff(expected: &Value, actual: &Value, config: &Config) -> Differences {
    let mut acc = Differences::new();
    let start_path = config.start_path.as_str();

    match Path::parse(start_path).locate(actual) {
        Some(part) => diff_with(expected, part, config, start_path, &mut acc),
        None => acc.add(
            DifferenceKind::Structure,
            start_path,
            format!("Missing node in path \"{}\".", start_path),
        ),
    }

    acc
}

/// True if the two nodes compare without any difference. Used to match array
/// elements when their order is ignored; the differences are thrown away.
pub(crate) fn is_similar(expected: &Value, actual: &Value, config: &Config) -> bool {
    let mut acc = Differences::new();
    diff_with(expected, actual, config, "", &mut acc);
    acc.is_empty()
}

fn diff_with(
    expected: &Value,
    actual: &Value,
    config: &Config,
    path: &str,
    acc: &mut Differences,
) {
    let mut folder = DiffFolder {
        actual,
        path,
        acc,
        config,
    };

    fold_json(expected, &mut folder);
}

#[derive(Debug)]
struct DiffFolder<'a, 'b> {
    actual: &'a Value,
    path: &'b str,
    acc: &'b mut Differences,
    config: &'b Config,
}

/// Leaf value as shown in messages: strings in double quotes, the rest as-is.
#[derive(Debug, Copy, Clone)]
enum Scalar<'a> {
    Text(&'a str),
    Number(&'a Number),
    Bool(bool),
}

impl<'a> PartialEq for Scalar<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Text(lhs), Scalar::Text(rhs)) => lhs == rhs,
            (Scalar::Number(lhs), Scalar::Number(rhs)) => match (decimal(lhs), decimal(rhs)) {
                (Some(lhs), Some(rhs)) => lhs == rhs,
                _ => lhs == rhs,
            },
            (Scalar::Bool(lhs), Scalar::Bool(rhs)) => lhs == rhs,
            _ => false,
        }
    }
}

impl<'a> fmt::Display for Scalar<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Scalar::Text(text) => write!(f, "\"{}\"", text),
            Scalar::Number(number) => write!(f, "{}", number),
            Scalar::Bool(flag) => write!(f, "{}", flag),
        }
    }
}

fn decimal(number: &Number) -> Option<BigDecimal> {
    BigDecimal::from_str(&number.to_string()).ok()
}

/// Extra orders of magnitude, on top of the digits of both operands and the
/// tolerance, below which the smaller operand is subtracted exactly.
const EXACT_SUBTRACTION_MARGIN: i64 = 64;

/// Exponent of the leading digit of a non-zero decimal.
fn magnitude(value: &BigDecimal) -> i64 {
    let (_, scale) = value.as_bigint_and_exponent();
    value.digits() as i64 - scale - 1
}

/// Returns `|lhs - rhs|` when it is greater than `tolerance`.
///
/// An operand lying entirely below the last digit of both the other operand
/// and the tolerance can not tip the comparison either way except on a tie,
/// so it is never aligned with the other one. The difference is then reported
/// as the larger operand.
fn difference_over(
    lhs: &BigDecimal,
    rhs: &BigDecimal,
    tolerance: &BigDecimal,
) -> Option<BigDecimal> {
    let (larger, smaller) = if lhs.abs() >= rhs.abs() {
        (lhs, rhs)
    } else {
        (rhs, lhs)
    };

    if smaller.is_zero() {
        let difference = larger.abs();
        return (difference > *tolerance).then_some(difference);
    }

    let digits = (larger.digits() + smaller.digits() + tolerance.digits()) as i64;
    if magnitude(larger) - magnitude(smaller) <= digits + EXACT_SUBTRACTION_MARGIN {
        let difference = (lhs - rhs).abs();
        return (difference > *tolerance).then_some(difference);
    }

    let difference = larger.abs();
    let over = match difference.cmp(tolerance) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => larger.is_negative() != smaller.is_negative(),
    };
    over.then_some(difference)
}

impl<'a, 'b> DiffFolder<'a, 'b> {
    fn structure_difference_found(&mut self, message: String) {
        self.acc.add(DifferenceKind::Structure, self.path, message);
    }

    fn value_difference_found(&mut self, message: String) {
        if !self.config.has_option(CompareOption::CompareOnlyStructure) {
            self.acc.add(DifferenceKind::Value, self.path, message);
        }
    }

    fn is_ignored(&self, expected: &Value) -> bool {
        matches!(expected, Value::String(text) if *text == self.config.ignore_placeholder)
    }

    fn on_type_mismatch(&mut self, expected: &Value) {
        debug_assert_ne!(NodeType::of(expected), NodeType::of(self.actual));
        self.value_difference_found(format!(
            "Different value found in node \"{}\". Expected '{}', got '{}'.",
            self.path, expected, self.actual
        ));
    }

    fn compare_values(&mut self, expected: Scalar, actual: Scalar) {
        if self.config.has_option(CompareOption::IgnoreValues) {
            return;
        }

        if expected != actual {
            self.value_difference_found(format!(
                "Different value found in node \"{}\". Expected {}, got {}.",
                self.path, expected, actual
            ));
        }
    }

    fn on_number(&mut self, expected: &Number, actual: &Number) {
        let config = self.config;
        let tolerance = match &config.numeric_tolerance {
            Some(tolerance) if !config.has_option(CompareOption::IgnoreValues) => tolerance,
            _ => return self.compare_values(Scalar::Number(expected), Scalar::Number(actual)),
        };

        let (Some(lhs), Some(rhs)) = (decimal(expected), decimal(actual)) else {
            return self.compare_values(Scalar::Number(expected), Scalar::Number(actual));
        };

        if let Some(difference) = difference_over(&lhs, &rhs, tolerance) {
            self.value_difference_found(format!(
                "Different value found in node \"{}\". Expected {}, got {}, difference is {}, tolerance is {}",
                self.path, expected, actual, difference, tolerance
            ));
        }
    }

    fn on_array(&mut self, expected: &[Value], actual: &'a [Value]) {
        if expected.len() != actual.len() {
            self.structure_difference_found(format!(
                "Array \"{}\" has different length. Expected {}, got {}.",
                self.path,
                expected.len(),
                actual.len()
            ));
        }

        if self.config.has_option(CompareOption::IgnoreArrayOrder) {
            let mut missing_values = expected.iter().collect::<Vec<_>>();
            let mut extra_values = vec![];

            for actual in actual {
                let found = missing_values
                    .iter()
                    .position(|expected| is_similar(expected, actual, self.config));

                match found {
                    Some(idx) => {
                        missing_values.remove(idx);
                    }
                    None => extra_values.push(actual),
                }
            }

            if !missing_values.is_empty() || !extra_values.is_empty() {
                self.value_difference_found(format!(
                    "Array \"{}\" has different content. Missing values {}, extra values {}",
                    self.path,
                    render_list(&missing_values),
                    render_list(&extra_values)
                ));
            }
        } else {
            for (idx, (expected, actual)) in expected.iter().zip(actual).enumerate() {
                let path = array_path(self.path, idx);
                diff_with(expected, actual, self.config, &path, self.acc);
            }
        }
    }

    fn on_object(&mut self, expected: &Map<String, Value>, actual: &'a Map<String, Value>) {
        let expected_keys = expected.keys().collect::<BTreeSet<_>>();
        let actual_keys = actual.keys().collect::<BTreeSet<_>>();

        if expected_keys != actual_keys {
            let mut missing_keys = expected_keys
                .difference(&actual_keys)
                .copied()
                .collect::<Vec<_>>();
            missing_keys.sort_unstable_by(|lhs, rhs| compare_keys(lhs, rhs));

            let mut extra_keys = if self.config.has_option(CompareOption::IgnoreExtraFields) {
                vec![]
            } else {
                let null_as_absent = self.config.has_option(CompareOption::TreatNullAsAbsent);
                actual_keys
                    .difference(&expected_keys)
                    .copied()
                    .filter(|key| !(null_as_absent && actual[key.as_str()].is_null()))
                    .collect::<Vec<_>>()
            };
            extra_keys.sort_unstable_by(|lhs, rhs| compare_keys(lhs, rhs));

            if !missing_keys.is_empty() || !extra_keys.is_empty() {
                self.structure_difference_found(format!(
                    "Different keys found in node \"{}\". Expected {}, got {}. {} {}",
                    self.path,
                    render_keys(expected_keys.iter().copied()),
                    render_keys(actual_keys.iter().copied()),
                    keys_message("Missing: ", &missing_keys, self.path),
                    keys_message("Extra: ", &extra_keys, self.path)
                ));
            }
        }

        let mut common_keys = expected_keys
            .intersection(&actual_keys)
            .copied()
            .collect::<Vec<_>>();
        common_keys.sort_unstable_by(|lhs, rhs| compare_keys(lhs, rhs));

        for key in common_keys {
            let (Some(expected), Some(actual)) = (expected.get(key), actual.get(key)) else {
                continue;
            };

            let path = field_path(self.path, key);
            diff_with(expected, actual, self.config, &path, self.acc);
        }
    }
}

/// `Missing: "a.b","a.c"`, or an empty string when there are no keys.
fn keys_message(prefix: &str, keys: &[&String], path: &str) -> String {
    if keys.is_empty() {
        return String::new();
    }

    let keys = keys
        .iter()
        .map(|key| format!("\"{}\"", field_path(path, key)))
        .collect::<Vec<_>>();
    format!("{}{}", prefix, keys.join(","))
}

fn fold_json<'a>(expected: &Value, folder: &mut DiffFolder<'a, '_>) {
    if folder.is_ignored(expected) {
        return;
    }

    match (expected, folder.actual) {
        (Value::Object(expected), Value::Object(actual)) => folder.on_object(expected, actual),
        (Value::Array(expected), Value::Array(actual)) => folder.on_array(expected, actual),
        (Value::String(expected), Value::String(actual)) => {
            folder.compare_values(Scalar::Text(expected), Scalar::Text(actual))
        }
        (Value::Number(expected), Value::Number(actual)) => folder.on_number(expected, actual),
        (Value::Bool(expected), Value::Bool(actual)) => {
            folder.compare_values(Scalar::Bool(*expected), Scalar::Bool(*actual))
        }
        (Value::Null, Value::Null) => {}
        _ => folder.on_type_mismatch(expected),
    }
}

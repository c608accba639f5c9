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

use serde::Serialize;
use serde_json::{Number, Value};
use std::borrow::Cow;

use crate::Error;

/// Input which can be turned into a JSON tree for comparison.
///
/// Text is parsed as JSON, trees are taken as they are and any other
/// serializable value can be passed wrapped in [`Serialized`].
///
/// # Examples
///
/// ```
/// use json_unit_diff::IntoJson;
/// use serde_json::json;
///
/// assert_eq!(r#"{"a": 1}"#.into_json("actual").unwrap(), json!({ "a": 1 }));
/// assert_eq!("abc".into_expected_json().unwrap(), json!("abc"));
/// assert!("abc".into_json("actual").is_err());
/// ```
pub trait IntoJson {
    /// Converts the input, `label` names it in error messages.
    fn into_json(self, label: &str) -> Result<Value, Error>;

    /// Converts the expected side of a comparison, which may be lenient
    /// about what it accepts.
    fn into_expected_json(self) -> Result<Value, Error>
    where
        Self: Sized,
    {
        self.into_json("expected")
    }
}

impl IntoJson for Value {
    fn into_json(self, _label: &str) -> Result<Value, Error> {
        Ok(self)
    }
}

impl IntoJson for &Value {
    fn into_json(self, _label: &str) -> Result<Value, Error> {
        Ok(self.clone())
    }
}

/// Bare words such as `abc` are accepted as expected strings.
impl IntoJson for &str {
    fn into_json(self, label: &str) -> Result<Value, Error> {
        parse_json(self, label)
    }

    fn into_expected_json(self) -> Result<Value, Error> {
        parse_json(&quote_if_needed(self), "expected")
    }
}

impl IntoJson for &String {
    fn into_json(self, label: &str) -> Result<Value, Error> {
        self.as_str().into_json(label)
    }

    fn into_expected_json(self) -> Result<Value, Error> {
        self.as_str().into_expected_json()
    }
}

impl IntoJson for String {
    fn into_json(self, label: &str) -> Result<Value, Error> {
        self.as_str().into_json(label)
    }

    fn into_expected_json(self) -> Result<Value, Error> {
        self.as_str().into_expected_json()
    }
}

/// Wrapper for any [`Serialize`] value, e.g. a map or a struct.
///
/// ```
/// use json_unit_diff::{IntoJson, Serialized};
/// use serde_json::json;
/// use std::collections::BTreeMap;
///
/// let map = BTreeMap::from([("a", vec![1, 2])]);
/// assert_eq!(Serialized(&map).into_json("actual").unwrap(), json!({ "a": [1, 2] }));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Serialized<T>(pub T);

impl<T: Serialize> IntoJson for Serialized<T> {
    fn into_json(self, label: &str) -> Result<Value, Error> {
        serde_json::to_value(&self.0).map_err(|source| Error::Convert {
            label: label.to_string(),
            source,
        })
    }
}

fn parse_json(text: &str, label: &str) -> Result<Value, Error> {
    serde_json::from_str(text).map_err(|source| Error::Parse {
        label: label.to_string(),
        text: text.to_string(),
        source,
    })
}

/// Wraps text in a JSON string literal unless it already reads as JSON.
fn quote_if_needed(text: &str) -> Cow<'_, str> {
    let trimmed = text.trim();

    let is_json = trimmed.starts_with('{')
        || trimmed.starts_with('[')
        || trimmed.starts_with('"')
        || matches!(trimmed, "true" | "false" | "null")
        || serde_json::from_str::<Number>(trimmed).is_ok();

    if is_json {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(Value::String(text.to_string()).to_string())
    }
}

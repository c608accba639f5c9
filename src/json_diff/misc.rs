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

use serde_json::Value;
use std::cmp::Ordering;

pub trait Indent {
    fn indent(&self, level: usize) -> String;
}

impl<T> Indent for T
where
    T: ToString,
{
    fn indent(&self, level: usize) -> String {
        let indent = " ".repeat(level);

        self.to_string()
            .lines()
            .map(|line| format!("{}{}", indent, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Renders a list of nodes the way difference messages show them: `[1, "a", {}]`.
pub fn render_list(values: &[&Value]) -> String {
    let items = values
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>();
    format!("[{}]", items.join(", "))
}

/// Orders object keys by their UTF-16 code units, so that characters outside
/// the Basic Multilingual Plane sort before `U+E000..=U+FFFF`.
pub fn compare_keys(lhs: &str, rhs: &str) -> Ordering {
    lhs.encode_utf16().cmp(rhs.encode_utf16())
}

/// Renders a set of object keys in sorted order: `[a, b]`.
pub fn render_keys<'a>(keys: impl IntoIterator<Item = &'a String>) -> String {
    let mut keys = keys.into_iter().map(String::as_str).collect::<Vec<_>>();
    keys.sort_unstable_by(|lhs, rhs| compare_keys(lhs, rhs));
    format!("[{}]", keys.join(", "))
}

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

use regex::Regex;
use serde_json::Value;
use std::{fmt, sync::OnceLock};

/// Path to a field of an object, e.g. `a.b` for field `b` under `a`.
///
/// The root has an empty path, so its fields are addressed by name alone.
pub fn field_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

/// Path to an element of an array, e.g. `a[1]`, or `[1]` for a root array.
pub fn array_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

/// Parsed form of a dotted path such as `a.b[1].c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Path<'a> {
    Root,
    Keys(Vec<Key<'a>>),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Key<'a> {
    Idx(usize),
    Field(&'a str),
}

// A segment is a field name followed by any number of `[n]` suffixes. The
// field name may be empty for paths that start at a root array.
fn segment_regex() -> &'static Regex {
    static SEGMENT: OnceLock<Regex> = OnceLock::new();
    SEGMENT.get_or_init(|| Regex::new(r"^([^\[\]]*)((?:\[\d+\])+)$").unwrap())
}

fn index_regex() -> &'static Regex {
    static INDEX: OnceLock<Regex> = OnceLock::new();
    INDEX.get_or_init(|| Regex::new(r"\[(\d+)\]").unwrap())
}

impl<'a> Path<'a> {
    /// Parses a path in the syntax produced by [`field_path`] and [`array_path`].
    ///
    /// Parsing never fails: a segment that does not look like `name[n]` is
    /// taken whole as a field name, and empty segments are skipped.
    pub fn parse(path: &'a str) -> Path<'a> {
        let mut keys = Vec::new();

        for segment in path.split('.').filter(|s| !s.is_empty()) {
            keys.extend(Self::parse_segment(segment));
        }

        if keys.is_empty() {
            Path::Root
        } else {
            Path::Keys(keys)
        }
    }

    fn parse_segment(segment: &'a str) -> Vec<Key<'a>> {
        let Some(captures) = segment_regex().captures(segment) else {
            return vec![Key::Field(segment)];
        };

        let name = captures.get(1).map_or("", |m| m.as_str());
        let suffixes = captures.get(2).map_or("", |m| m.as_str());

        let mut keys = Vec::new();
        if !name.is_empty() {
            keys.push(Key::Field(name));
        }

        for index in index_regex().captures_iter(suffixes) {
            match index[1].parse::<usize>() {
                Ok(idx) => keys.push(Key::Idx(idx)),
                // index does not fit, nothing can live there
                Err(_) => return vec![Key::Field(segment)],
            }
        }

        keys
    }

    /// Finds the node this path points to, `None` if there is no such node.
    pub fn locate<'v>(&self, root: &'v Value) -> Option<&'v Value> {
        match self {
            Path::Root => Some(root),
            Path::Keys(keys) => keys.iter().try_fold(root, |node, key| match key {
                Key::Field(name) => node.as_object()?.get(*name),
                Key::Idx(idx) => node.as_array()?.get(*idx),
            }),
        }
    }
}

impl<'a> fmt::Display for Path<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Path::Root => Ok(()),
            Path::Keys(keys) => {
                let rendered = keys.iter().fold(String::new(), |path, key| match key {
                    Key::Field(name) => field_path(&path, name),
                    Key::Idx(idx) => array_path(&path, *idx),
                });
                write!(f, "{}", rendered)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_and_array_path() {
        assert_eq!(field_path("", "a"), "a");
        assert_eq!(field_path("a", "b"), "a.b");
        assert_eq!(field_path("a[0]", "b"), "a[0].b");

        assert_eq!(array_path("", 0), "[0]");
        assert_eq!(array_path("a", 3), "a[3]");
        assert_eq!(array_path("a[3]", 1), "a[3][1]");
    }

    #[test]
    fn test_parse_path() {
        assert_eq!(Path::parse(""), Path::Root);

        let path = Path::parse("a.b.c");
        assert_eq!(
            path,
            Path::Keys(vec![Key::Field("a"), Key::Field("b"), Key::Field("c")])
        );

        let path = Path::parse("a[0].b[12].c");
        assert_eq!(
            path,
            Path::Keys(vec![
                Key::Field("a"),
                Key::Idx(0),
                Key::Field("b"),
                Key::Idx(12),
                Key::Field("c"),
            ])
        );

        let path = Path::parse("[1].matrix[2][0]");
        assert_eq!(
            path,
            Path::Keys(vec![
                Key::Idx(1),
                Key::Field("matrix"),
                Key::Idx(2),
                Key::Idx(0),
            ])
        );

        // not an index, so the whole segment is a field name
        let path = Path::parse("a[x].b");
        assert_eq!(path, Path::Keys(vec![Key::Field("a[x]"), Key::Field("b")]));

        let path = Path::parse("a..b.");
        assert_eq!(path, Path::Keys(vec![Key::Field("a"), Key::Field("b")]));
    }

    #[test]
    fn test_display_matches_builders() {
        for path in ["a.b.c", "a[0].b[12].c", "[1].matrix[2][0]", "x"] {
            assert_eq!(Path::parse(path).to_string(), path);
        }
        assert_eq!(Path::Root.to_string(), "");
    }

    #[test]
    fn test_locate() {
        let root = json!({
            "a": { "b": [ { "c": 1 }, { "c": null } ] },
            "matrix": [[1, 2], [3, 4]]
        });

        assert_eq!(Path::parse("").locate(&root), Some(&root));
        assert_eq!(Path::parse("a.b[0].c").locate(&root), Some(&json!(1)));
        assert_eq!(Path::parse("a.b[1].c").locate(&root), Some(&json!(null)));
        assert_eq!(Path::parse("matrix[1][0]").locate(&root), Some(&json!(3)));

        assert_eq!(Path::parse("a.x").locate(&root), None);
        assert_eq!(Path::parse("a.b[2]").locate(&root), None);
        assert_eq!(Path::parse("a.b.c").locate(&root), None);
        assert_eq!(Path::parse("a.b[0].c.d").locate(&root), None);

        let array = json!([{ "name": "x" }]);
        assert_eq!(Path::parse("[0].name").locate(&array), Some(&json!("x")));
    }
}

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

use std::path::PathBuf;

use bigdecimal::BigDecimal;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use json_unit_diff::{CompareOption, Config, Diff, Error, DEFAULT_IGNORE_PLACEHOLDER};

#[doc(hidden)]
#[macro_export]
macro_rules! handle_error {
    ($code:expr, $msg:expr, $($arg:tt)*) => {{
        eprintln!($msg, $($arg)*);
        return $code;
    }};

    ($code:expr, $msg:expr) => {{
        eprintln!($msg);
        return $code;
    }};
}

#[doc(hidden)]
struct Code;

impl Code {
    const SUCCESS: i32 = 0;
    const INTERNAL_ERROR: i32 = 1;
    const INVALID_ARGUMENT: i32 = 2;
    const JSON_PARSING_ERROR: i32 = 3;
    const DIFFERENCES_FOUND: i32 = 4;
}

#[doc(hidden)]
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// File with the expected JSON document
    expected: PathBuf,

    /// File with the actual JSON document
    actual: PathBuf,

    /// Path of the node in the actual document to compare against, e.g. `data.users[0]`
    #[clap(short, long, default_value = "")]
    start_path: String,

    /// Expected value which accepts any actual value
    #[clap(short, long, default_value = DEFAULT_IGNORE_PLACEHOLDER)]
    ignore_placeholder: String,

    /// Numbers are equal when they differ by at most this much
    #[clap(short, long)]
    tolerance: Option<BigDecimal>,

    /// Comparison option, e.g. `ignore-array-order`; can be repeated
    #[clap(short, long = "option")]
    options: Vec<CompareOption>,
}

#[doc(hidden)]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    std::process::exit(run(Cli::parse()));
}

/// Compares the two files named on the command line, printing the result,
/// and returns the exit code.
fn run(cli: Cli) -> i32 {
    let mut config = Config::new()
        .start_path(cli.start_path)
        .ignore_placeholder(cli.ignore_placeholder)
        .options(cli.options.into_iter().collect());

    if let Some(tolerance) = cli.tolerance {
        config = config.numeric_tolerance(tolerance);
    }

    let expected = match std::fs::read_to_string(&cli.expected) {
        Ok(content) => content,
        Err(err) => {
            handle_error!(
                Code::INTERNAL_ERROR,
                "Error reading {}: {}",
                cli.expected.display(),
                err
            );
        }
    };
    let actual = match std::fs::read_to_string(&cli.actual) {
        Ok(content) => content,
        Err(err) => {
            handle_error!(
                Code::INTERNAL_ERROR,
                "Error reading {}: {}",
                cli.actual.display(),
                err
            );
        }
    };
    let actual_name = cli.actual.display().to_string();

    let diff = match Diff::create(expected, actual, &actual_name, config) {
        Ok(diff) => diff,
        Err(err @ Error::Parse { .. }) => {
            handle_error!(Code::JSON_PARSING_ERROR, "Error: {}", err);
        }
        Err(err) => {
            handle_error!(Code::INVALID_ARGUMENT, "Error: {}", err);
        }
    };

    if diff.similar() {
        println!("{}", diff);
        return Code::SUCCESS;
    }

    print!("{}", diff);
    Code::DIFFERENCES_FOUND
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    fn write_documents(expected: &str, actual: &str) -> TempDir {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("expected.json"), expected).unwrap();
        std::fs::write(dir.path().join("actual.json"), actual).unwrap();
        dir
    }

    fn cli(dir: &Path, args: &[&str]) -> Result<Cli, clap::Error> {
        let expected = dir.join("expected.json");
        let actual = dir.join("actual.json");
        let files = [expected.to_str().unwrap(), actual.to_str().unwrap()];

        Cli::try_parse_from(
            ["json-unit-diff"]
                .iter()
                .chain(files.iter())
                .chain(args.iter()),
        )
    }

    #[test]
    fn test_similar_documents() {
        let dir = write_documents(r#"{"a": [1, 2]}"#, r#"{"a": [2, 1], "b": null}"#);

        let cli = cli(
            dir.path(),
            &["-o", "ignore-array-order", "-o", "TREAT_NULL_AS_ABSENT"],
        )
        .unwrap();
        assert_eq!(cli.options.len(), 2);
        assert_eq!(run(cli), Code::SUCCESS);
    }

    #[test]
    fn test_differences_found() {
        let dir = write_documents(r#"{"a": [1, 2]}"#, r#"{"a": [2, 1], "b": null}"#);

        assert_eq!(run(cli(dir.path(), &[]).unwrap()), Code::DIFFERENCES_FOUND);

        let dir = write_documents(r#"{"n": 1.0}"#, r#"{"n": 1.05}"#);
        assert_eq!(
            run(cli(dir.path(), &["--tolerance", "0.01"]).unwrap()),
            Code::DIFFERENCES_FOUND
        );
        assert_eq!(
            run(cli(dir.path(), &["--tolerance", "0.1"]).unwrap()),
            Code::SUCCESS
        );
    }

    #[test]
    fn test_start_path() {
        let dir = write_documents(r#"{"id": 1}"#, r#"{"data": [{"id": 1}]}"#);

        assert_eq!(
            run(cli(dir.path(), &["--start-path", "data[0]"]).unwrap()),
            Code::SUCCESS
        );
        assert_eq!(
            run(cli(dir.path(), &["--start-path", "data[1]"]).unwrap()),
            Code::DIFFERENCES_FOUND
        );
    }

    #[test]
    fn test_invalid_input() {
        let dir = write_documents(r#"{"a": 1}"#, r#"{"a": "#);
        assert_eq!(run(cli(dir.path(), &[]).unwrap()), Code::JSON_PARSING_ERROR);

        let dir = write_documents(r#"{"a": 1}"#, r#"{"a": 1}"#);
        assert_eq!(
            run(cli(dir.path(), &["--tolerance=-1"]).unwrap()),
            Code::INVALID_ARGUMENT
        );

        let cli = Cli::try_parse_from(["json-unit-diff", "missing.json", "missing.json"]).unwrap();
        assert_eq!(run(cli), Code::INTERNAL_ERROR);
    }

    #[test]
    fn test_unknown_option_rejected() {
        let dir = write_documents("{}", "{}");

        assert!(cli(dir.path(), &["--option", "bogus"]).is_err());
        assert!(cli(dir.path(), &["--tolerance", "abc"]).is_err());
    }
}

use std::path::Path;

use anyhow::{bail, Context, Result};
use plan_state::{State, Value};
use tracing::{debug, info, instrument};

/// Which accessor `get` uses, and therefore which coercions apply
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum AccessorType {
    /// Return the stored value as is
    #[default]
    Any,
    String,
    Number,
    Bool,
    Object,
}

fn is_stdin(file: &Path) -> bool {
    file.as_os_str() == "-"
}

/// Read a state document from a file, or from stdin if `file` is `-`.
pub(crate) fn read_state(file: &Path) -> Result<State> {
    debug!(file = %file.display(), "reading state");
    if is_stdin(file) {
        State::from_reader(std::io::stdin().lock()).context("reading state from stdin")
    } else {
        let text = std::fs::read_to_string(file)
            .with_context(|| format!("reading state file {}", file.display()))?;
        State::from_json(&text).with_context(|| format!("parsing state file {}", file.display()))
    }
}

pub(crate) fn write_state(file: &Path, state: &State, pretty: bool) -> Result<()> {
    if is_stdin(file) {
        bail!("cannot write state in place when reading from stdin");
    }
    let mut text = render_state(state, pretty);
    text.push('\n');
    std::fs::write(file, text).with_context(|| format!("writing state file {}", file.display()))?;
    info!(file = %file.display(), "wrote state");
    Ok(())
}

pub(crate) fn render_state(state: &State, pretty: bool) -> String {
    if pretty {
        state.to_json_pretty()
    } else {
        state.to_json()
    }
}

pub(crate) fn render_json(value: &serde_json::Value, pretty: bool) -> String {
    if pretty {
        format!("{:#}", value)
    } else {
        value.to_string()
    }
}

#[instrument(level = "debug", skip(state))]
pub(crate) fn get(state: &State, path: &str, as_type: AccessorType) -> Result<serde_json::Value> {
    let value: Value = match as_type {
        AccessorType::Any => state.get(path)?.clone(),
        AccessorType::String => state.get_string(path)?.into(),
        AccessorType::Number => state.get_number(path)?.into(),
        AccessorType::Bool => state.get_bool(path)?.into(),
        AccessorType::Object => state.get_object(path)?.clone().into(),
    };
    Ok(value.into())
}

/// Parse a value given on the command line: JSON, or a plain string when
/// `as_string` is set.
pub(crate) fn parse_value(raw: &str, as_string: bool) -> Result<Value> {
    if as_string {
        return Ok(Value::String(raw.to_owned()));
    }
    let json: serde_json::Value = serde_json::from_str(raw)
        .with_context(|| format!("failed to parse JSON value: {}", raw))?;
    Ok(json.into())
}

#[instrument(level = "debug", skip(state, value))]
pub(crate) fn set(state: &mut State, path: &str, value: Value) {
    state.set(path, value);
}

/// Merge each of `others` into `base`, left to right, so that later files
/// win on conflicting values.
#[instrument(level = "debug", skip_all, fields(count = others.len()))]
pub(crate) fn merge(mut base: State, others: Vec<State>) -> State {
    for other in others {
        base.merge(other);
    }
    base
}

pub(crate) fn diff(a: &State, b: &State) -> Result<serde_json::Value> {
    let patch = a.diff(b);
    debug!(operations = patch.0.len(), "computed patch");
    serde_json::to_value(&patch).context("serializing patch")
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;

    use super::*;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn state(s: &str) -> State {
        State::from_json(s).unwrap()
    }

    #[test]
    fn test_read_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "a.json", r#"{ "foo": { "bar": 1 } }"#);
        let s = read_state(&path).unwrap();
        assert_eq!(s, state(r#"{"foo":{"bar":1}}"#));
    }

    #[test]
    fn test_read_state_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let e = read_state(&dir.path().join("nope.json")).unwrap_err();
        assert!(e.to_string().starts_with("reading state file"));
    }

    #[test]
    fn test_read_state_not_an_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "a.json", "[1, 2]");
        let e = read_state(&path).unwrap_err();
        assert!(e.to_string().starts_with("parsing state file"));
        assert!(e.root_cause().to_string().contains("must be an object"));
    }

    #[test]
    fn test_write_state_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let s = state(r#"{ "foo": { "bar": [1, "x"] }, "n": 0.5 }"#);
        write_state(&path, &s, true).unwrap();
        assert_eq!(read_state(&path).unwrap(), s);
        write_state(&path, &s, false).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "{\"foo\":{\"bar\":[1,\"x\"]},\"n\":0.5}\n"
        );
    }

    #[test]
    fn test_write_state_stdin() {
        assert!(write_state(Path::new("-"), &State::new(), false).is_err());
    }

    #[test]
    fn test_get() {
        let s = state(r#"{ "xxx": "yyy", "n": "0.2", "foo": { "bar": { "baz": 3 }, "b": "true" } }"#);
        assert_eq!(get(&s, "xxx", AccessorType::Any).unwrap(), json!("yyy"));
        assert_eq!(get(&s, "n", AccessorType::Any).unwrap(), json!("0.2"));
        assert_eq!(get(&s, "n", AccessorType::Number).unwrap(), json!(0.2));
        assert_eq!(get(&s, "foo.b", AccessorType::Bool).unwrap(), json!(true));
        assert_eq!(
            get(&s, "foo.bar", AccessorType::Object).unwrap(),
            json!({ "baz": 3 })
        );
        assert_eq!(
            get(&s, "foo.bar.baz", AccessorType::Number).unwrap(),
            json!(3)
        );
        assert!(get(&s, "foo.bar.baz", AccessorType::String).is_err());
        assert!(get(&s, "foo.missing", AccessorType::Any).is_err());
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("2", false).unwrap(), Value::Number(2.0));
        assert_eq!(parse_value("2", true).unwrap(), Value::from("2"));
        assert_eq!(
            parse_value(r#"{ "a": true }"#, false).unwrap(),
            Value::from(state(r#"{ "a": true }"#))
        );
        assert!(parse_value("not json", false).is_err());
    }

    #[test]
    fn test_set() {
        let mut s = state(r#"{ "foo": { "xxx": 42 } }"#);
        set(&mut s, "foo.yyy.zzz", parse_value("true", false).unwrap());
        assert_eq!(
            s,
            state(r#"{ "foo": { "xxx": 42, "yyy": { "zzz": true } } }"#)
        );
    }

    #[test]
    fn test_merge_left_to_right() {
        let merged = merge(
            state(r#"{ "foo": 1, "n": { "a": 1 } }"#),
            vec![
                state(r#"{ "foo": 2, "n": { "b": 2 } }"#),
                state(r#"{ "foo": 3, "n": { "c": 3 } }"#),
            ],
        );
        assert_eq!(
            merged,
            state(r#"{ "foo": 3, "n": { "a": 1, "b": 2, "c": 3 } }"#)
        );
    }

    #[test]
    fn test_diff() {
        let a = state(r#"{ "foo": 1 }"#);
        let b = state(r#"{ "foo": 2 }"#);
        assert_eq!(diff(&a, &a).unwrap(), json!([]));
        assert_eq!(
            diff(&a, &b).unwrap(),
            json!([{ "op": "replace", "path": "/foo", "value": 2 }])
        );
    }

    #[test]
    fn test_render() {
        let s = state(r#"{ "a": 1 }"#);
        assert_eq!(render_state(&s, false), r#"{"a":1}"#);
        assert_eq!(render_state(&s, true), "{\n  \"a\": 1\n}");
        assert_eq!(render_json(&json!([1]), false), "[1]");
    }
}

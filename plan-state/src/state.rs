use std::{
    collections::{btree_map, BTreeMap},
    fmt, io,
    str::FromStr,
};

use tracing::{debug, trace};

use crate::{
    error::{Result, StateError},
    value::Value,
};

/// A hierarchical, JSON-shaped state document.
///
/// Fields are addressed by paths of `.`-separated keys, e.g. `"foo.bar"`.
/// There is no escaping, so keys containing `.` can be stored and serialized,
/// but not reached by path.
///
/// Equality is structural and type strict: `{"foo": 2}` is not equal to
/// `{"foo": "2"}`, and key order never matters.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "serde_json::Value", into = "serde_json::Value")]
pub struct State {
    entries: BTreeMap<String, Value>,
}

impl State {
    pub fn new() -> Self {
        State {
            entries: BTreeMap::new(),
        }
    }

    /// Parse a document from JSON text. The top level must be an object.
    pub fn from_json(text: &str) -> Result<State> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        State::try_from(value)
    }

    /// Like [`State::from_json`], reading the text from `reader`.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<State> {
        let value: serde_json::Value = serde_json::from_reader(reader)?;
        State::try_from(value)
    }

    /// Compact JSON text for this document.
    pub fn to_json(&self) -> String {
        serde_json::Value::from(self.clone()).to_string()
    }

    pub fn to_json_pretty(&self) -> String {
        format!("{:#}", serde_json::Value::from(self.clone()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of keys at the top level
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.entries.iter()
    }

    /// Resolve `path` and return the stored value as is, without coercion.
    ///
    /// Every segment but the last must name a nested object.
    pub fn get(&self, path: &str) -> Result<&Value> {
        let (parents, last) = split_path(path);
        let mut current = self;
        for key in parents.into_iter().flat_map(|p| p.split('.')) {
            current = match current.entries.get(key) {
                Some(Value::Object(o)) => o,
                Some(other) => {
                    return Err(StateError::NotTraversable {
                        path: path.to_owned(),
                        key: key.to_owned(),
                        found: other.value_type(),
                    })
                }
                None => return Err(not_found(path, key)),
            };
        }
        current
            .entries
            .get(last)
            .ok_or_else(|| not_found(path, last))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_ok()
    }

    /// Assign `value` at `path`, creating empty objects for missing
    /// intermediate keys and overwriting whatever was stored at `path`.
    ///
    /// An intermediate key that holds something other than an object is
    /// replaced by an empty object.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) {
        let (parents, last) = split_path(path);
        let parents: Vec<&str> = parents.into_iter().flat_map(|p| p.split('.')).collect();
        self.set_at(path, &parents, last, value.into());
    }

    fn set_at(&mut self, path: &str, parents: &[&str], last: &str, value: Value) {
        let Some((key, rest)) = parents.split_first() else {
            self.entries.insert(last.to_owned(), value);
            return;
        };
        let slot = self
            .entries
            .entry((*key).to_owned())
            .or_insert_with(|| Value::Object(State::new()));
        match slot {
            Value::Object(o) => o.set_at(path, rest, last, value),
            other => {
                debug!(
                    path,
                    key = *key,
                    found = ?other.value_type(),
                    "replacing non-object value on the way to a new field"
                );
                let mut child = State::new();
                child.set_at(path, rest, last, value);
                *other = Value::Object(child);
            }
        }
    }

    /// Remove and return the value at `path`.
    pub fn remove(&mut self, path: &str) -> Result<Value> {
        let (parents, last) = split_path(path);
        let mut current = self;
        for key in parents.into_iter().flat_map(|p| p.split('.')) {
            current = match current.entries.get_mut(key) {
                Some(Value::Object(o)) => o,
                Some(other) => {
                    return Err(StateError::NotTraversable {
                        path: path.to_owned(),
                        key: key.to_owned(),
                        found: other.value_type(),
                    })
                }
                None => return Err(not_found(path, key)),
            };
        }
        current
            .entries
            .remove(last)
            .ok_or_else(|| not_found(path, last))
    }

    /// The string at `path`. Other types are not stringified.
    pub fn get_string(&self, path: &str) -> Result<&str> {
        match self.get(path)? {
            Value::String(s) => Ok(s),
            other => Err(type_mismatch(path, "string", other)),
        }
    }

    /// The number at `path`, or a string at `path` that parses as a finite
    /// decimal number. `"NaN"`, `"inf"` and out-of-range strings like
    /// `"1e400"` are type mismatches.
    pub fn get_number(&self, path: &str) -> Result<f64> {
        let value = self.get(path)?;
        match value {
            Value::Number(n) => Ok(*n),
            Value::String(s) => s
                .parse()
                .ok()
                .filter(|n: &f64| n.is_finite())
                .ok_or_else(|| type_mismatch(path, "number", value)),
            other => Err(type_mismatch(path, "number", other)),
        }
    }

    /// The boolean at `path`, or a string at `path` that is exactly `"true"`
    /// or `"false"`.
    pub fn get_bool(&self, path: &str) -> Result<bool> {
        match self.get(path)? {
            Value::Bool(b) => Ok(*b),
            Value::String(s) if s == "true" => Ok(true),
            Value::String(s) if s == "false" => Ok(false),
            other => Err(type_mismatch(path, "bool", other)),
        }
    }

    pub fn get_object(&self, path: &str) -> Result<&State> {
        match self.get(path)? {
            Value::Object(o) => Ok(o),
            other => Err(type_mismatch(path, "object", other)),
        }
    }

    /// Deep merge `other` into `self`.
    ///
    /// Keys missing from `self` are moved over. When both sides hold an
    /// object, they are merged recursively. Any other conflict is resolved in
    /// favor of `other`, replacing the value wholesale.
    pub fn merge(&mut self, other: State) {
        for (key, theirs) in other.entries {
            match self.entries.entry(key) {
                btree_map::Entry::Vacant(e) => {
                    e.insert(theirs);
                }
                btree_map::Entry::Occupied(mut e) => match (e.get_mut(), theirs) {
                    (Value::Object(ours), Value::Object(theirs)) => ours.merge(theirs),
                    (ours, theirs) => {
                        trace!(
                            from = ?ours.value_type(),
                            to = ?theirs.value_type(),
                            "merge replaces conflicting value"
                        );
                        *ours = theirs;
                    }
                },
            }
        }
    }

    /// A JSON Patch (RFC 6902) that turns `self` into `other`.
    ///
    /// The patch is empty exactly when the two documents are equal.
    pub fn diff(&self, other: &State) -> json_patch::Patch {
        json_patch::diff(
            &serde_json::Value::from(self.clone()),
            &serde_json::Value::from(other.clone()),
        )
    }

    /// Apply a JSON Patch (RFC 6902). If any operation fails, or the patch
    /// does not leave an object at the top level, `self` is left unchanged.
    pub fn apply_patch(&mut self, patch: &json_patch::Patch) -> Result<()> {
        let mut doc = serde_json::Value::from(self.clone());
        json_patch::patch(&mut doc, patch.0.as_slice())?;
        match doc {
            serde_json::Value::Object(o) => {
                *self = State::from(o);
                Ok(())
            }
            other => Err(StateError::PatchResult {
                found: Value::from(other).value_type(),
            }),
        }
    }
}

/// Split a path into its parent path, if any, and its final key.
fn split_path(path: &str) -> (Option<&str>, &str) {
    match path.rsplit_once('.') {
        Some((parents, last)) => (Some(parents), last),
        None => (None, path),
    }
}

fn not_found(path: &str, key: &str) -> StateError {
    StateError::NotFound {
        path: path.to_owned(),
        key: key.to_owned(),
    }
}

fn type_mismatch(path: &str, expected: &'static str, found: &Value) -> StateError {
    StateError::TypeMismatch {
        path: path.to_owned(),
        expected,
        found: found.value_type(),
    }
}

impl FromStr for State {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self> {
        State::from_json(s)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

impl TryFrom<serde_json::Value> for State {
    type Error = StateError;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Object(o) => Ok(State::from(o)),
            other => Err(StateError::NotAnObject {
                found: Value::from(other).value_type(),
            }),
        }
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for State {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
    }
}

impl From<State> for serde_json::Map<String, serde_json::Value> {
    fn from(state: State) -> Self {
        state
            .entries
            .into_iter()
            .map(|(k, v)| (k, serde_json::Value::from(v)))
            .collect()
    }
}

impl From<State> for serde_json::Value {
    fn from(state: State) -> Self {
        serde_json::Value::Object(state.into())
    }
}

impl From<BTreeMap<String, Value>> for State {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        State { entries }
    }
}

impl FromIterator<(String, Value)> for State {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        State {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for State {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a State {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// A single variable value.
#[derive(Debug, Clone, PartialEq)]
pub enum VarValue {
    String(String),
    Number(serde_json::Number),
    Bool(bool),
    /// Arrays, objects and null, kept as JSON.
    Structured(JsonValue),
}

impl VarValue {
    pub fn to_json(&self) -> JsonValue {
        match self {
            VarValue::String(s) => JsonValue::String(s.clone()),
            VarValue::Number(n) => JsonValue::Number(n.clone()),
            VarValue::Bool(b) => JsonValue::Bool(*b),
            VarValue::Structured(v) => v.clone(),
        }
    }

    /// Plain text form used where only a string fits (shell exports).
    pub fn to_plain_string(&self) -> String {
        match self {
            VarValue::String(s) => s.clone(),
            VarValue::Number(n) => n.to_string(),
            VarValue::Bool(b) => b.to_string(),
            VarValue::Structured(v) => v.to_string(),
        }
    }
}

impl From<JsonValue> for VarValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::String(s) => VarValue::String(s),
            JsonValue::Number(n) => VarValue::Number(n),
            JsonValue::Bool(b) => VarValue::Bool(b),
            other => VarValue::Structured(other),
        }
    }
}

impl From<&str> for VarValue {
    fn from(value: &str) -> Self {
        VarValue::String(value.to_string())
    }
}

/// Where a variable came from. Decides how it is rendered as YAML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarOrigin {
    Terraform,
    Extra,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub value: VarValue,
    pub origin: VarOrigin,
}

/// Merged variables, iterated in key order.
///
/// Inserting a key that already exists replaces the earlier entry, so the
/// caller controls precedence through insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableSet {
    vars: BTreeMap<String, Variable>,
}

impl VariableSet {
    pub fn new() -> Self {
        VariableSet::default()
    }

    pub fn insert(&mut self, key: &str, value: VarValue, origin: VarOrigin) -> Option<Variable> {
        self.vars.insert(key.to_string(), Variable { value, origin })
    }

    pub fn extend<I>(&mut self, entries: I, origin: VarOrigin)
    where
        I: IntoIterator<Item = (String, VarValue)>,
    {
        for (key, value) in entries {
            self.insert(&key, value, origin);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Variable> {
        self.vars.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Variable)> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

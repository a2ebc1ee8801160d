//! Named string variables passed between semantic functions.

use std::collections::HashMap;

/// Name of the main variable every function reads and writes.
pub const INPUT_VARIABLE: &str = "input";

/// Case-insensitive variable map with a distinguished `input` slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextVariables {
    variables: HashMap<String, String>,
}

impl ContextVariables {
    pub fn new(input: impl Into<String>) -> Self {
        let mut variables = HashMap::new();
        variables.insert(INPUT_VARIABLE.to_string(), input.into());
        Self { variables }
    }

    pub fn input(&self) -> &str {
        self.get(INPUT_VARIABLE).unwrap_or_default()
    }

    /// Replace the `input` value, e.g. with a function's output.
    pub fn update(&mut self, input: impl Into<String>) {
        self.variables
            .insert(INPUT_VARIABLE.to_string(), input.into());
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.variables.insert(name.to_lowercase(), value.into());
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(&name.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.variables
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Default for ContextVariables {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl std::fmt::Display for ContextVariables {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.input())
    }
}

impl From<&str> for ContextVariables {
    fn from(input: &str) -> Self {
        Self::new(input)
    }
}

impl From<String> for ContextVariables {
    fn from(input: String) -> Self {
        Self::new(input)
    }
}

use crate::error::ConfigError;
use std::collections::BTreeMap;

///
/// MissingVarPolicy
///
/// What a definition does when it names a path variable the request
/// never bound. Path variables are part of the route contract, so the
/// default treats a miss as a configuration fault.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum MissingVarPolicy {
    #[default]
    Error,
    Empty,
}

///
/// Args
///
/// The request-shaped argument source a definition tree resolves
/// against: multi-valued query params, single-valued path variables
/// and headers, and an optional JSON body.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Args {
    params: BTreeMap<String, Vec<String>>,
    path_vars: BTreeMap<String, String>,
    headers: BTreeMap<String, String>,
    body: Option<serde_json::Value>,
    missing_path_var: MissingVarPolicy,
}

impl Args {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one value under a query parameter name.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.entry(name.into()).or_default().push(value.into());
        self
    }

    #[must_use]
    pub fn path_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_vars.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub const fn missing_path_var(mut self, policy: MissingVarPolicy) -> Self {
        self.missing_path_var = policy;
        self
    }

    pub(crate) fn param_values(&self, name: &str) -> Vec<String> {
        self.params.get(name).cloned().unwrap_or_default()
    }

    pub(crate) fn path_var_values(&self, name: &str) -> Result<Vec<String>, ConfigError> {
        match self.path_vars.get(name) {
            Some(value) => Ok(vec![value.clone()]),
            None => match self.missing_path_var {
                MissingVarPolicy::Error => Err(ConfigError::MissingPathVariable {
                    name: name.to_string(),
                }),
                MissingVarPolicy::Empty => Ok(Vec::new()),
            },
        }
    }

    pub(crate) fn header_values(&self, name: &str) -> Vec<String> {
        self.headers.get(name).cloned().map_or_else(Vec::new, |value| vec![value])
    }

    /// Read values from the JSON body at a dotted path. Arrays yield
    /// one value per element, scalars one value, nulls and misses
    /// nothing.
    pub(crate) fn body_values(&self, name: &str) -> Vec<String> {
        let Some(body) = &self.body else {
            return Vec::new();
        };

        let mut node = body;
        for segment in name.split('.') {
            match node.get(segment) {
                Some(next) => node = next,
                None => return Vec::new(),
            }
        }

        match node {
            serde_json::Value::Array(items) => items.iter().filter_map(json_scalar).collect(),
            other => json_scalar(other).into_iter().collect(),
        }
    }
}

fn json_scalar(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) => Some(text.clone()),
        serde_json::Value::Number(number) => Some(number.to_string()),
        serde_json::Value::Bool(flag) => Some(flag.to_string()),
        serde_json::Value::Null | serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            None
        }
    }
}

use crate::error::FederationError;
use crate::queue::types::TaskInput;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// What a registered job is for. Inspected by the dispatcher and the node runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// Turns a source locator into the node's dataset.
    DataExtraction,
    /// Transforms a dataset before a federated job consumes it.
    PreProcessing,
    /// Runs on every target node and returns a partial result.
    Federated,
    /// Runs as the orchestrator: dispatches federated jobs and combines their partials.
    Central,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobKind::DataExtraction => "data extraction",
            JobKind::PreProcessing => "pre-processing",
            JobKind::Federated => "federated",
            JobKind::Central => "central",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub required: bool,
}

/// Ordered parameter list of a job. Positional arguments bind in this order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobSignature {
    params: Vec<Param>,
}

impl JobSignature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: &str) -> Self {
        self.params.push(Param {
            name: name.to_string(),
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: &str) -> Self {
        self.params.push(Param {
            name: name.to_string(),
            required: false,
        });
        self
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Checks the signature itself: valid, unique names and no required after optional.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen_optional = false;
        for (index, param) in self.params.iter().enumerate() {
            if !is_identifier(&param.name) {
                return Err(format!("parameter '{}' is not a valid identifier", param.name));
            }
            if self.params[..index].iter().any(|other| other.name == param.name) {
                return Err(format!("parameter '{}' is declared twice", param.name));
            }
            if param.required && seen_optional {
                return Err(format!(
                    "required parameter '{}' follows an optional one",
                    param.name
                ));
            }
            seen_optional |= !param.required;
        }
        Ok(())
    }
}

/// Arguments of one invocation, bound to parameter names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobArgs {
    method: String,
    values: BTreeMap<String, Value>,
}

impl JobArgs {
    /// Binds positional and keyword arguments of `input` to `signature`.
    pub fn bind(signature: &JobSignature, input: &TaskInput) -> Result<Self, FederationError> {
        let invalid = |message: String| FederationError::InvalidArguments {
            method: input.method.clone(),
            message,
        };

        if input.args.len() > signature.params.len() {
            return Err(invalid(format!(
                "takes at most {} positional argument(s), got {}",
                signature.params.len(),
                input.args.len()
            )));
        }

        let mut values = BTreeMap::new();
        for (param, value) in signature.params.iter().zip(&input.args) {
            values.insert(param.name.clone(), value.clone());
        }

        for (name, value) in &input.kwargs {
            if !signature.params.iter().any(|param| &param.name == name) {
                return Err(invalid(format!("unexpected keyword argument '{}'", name)));
            }
            if values.insert(name.clone(), value.clone()).is_some() {
                return Err(invalid(format!("argument '{}' given twice", name)));
            }
        }

        if let Some(missing) = signature
            .params
            .iter()
            .find(|param| param.required && !values.contains_key(&param.name))
        {
            return Err(invalid(format!("missing required argument '{}'", missing.name)));
        }

        Ok(Self {
            method: input.method.clone(),
            values,
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).filter(|value| !value.is_null())
    }

    /// The raw value of a required argument, any JSON type.
    pub fn value(&self, name: &str) -> Result<&Value, FederationError> {
        self.values.get(name).ok_or_else(|| self.invalid(name, "is missing"))
    }

    pub fn str(&self, name: &str) -> Result<&str, FederationError> {
        self.value(name)?
            .as_str()
            .ok_or_else(|| self.invalid(name, "must be a string"))
    }

    pub fn f64_or(&self, name: &str, default: f64) -> Result<f64, FederationError> {
        match self.get(name) {
            None => Ok(default),
            Some(value) => value
                .as_f64()
                .ok_or_else(|| self.invalid(name, "must be a number")),
        }
    }

    fn invalid(&self, name: &str, problem: &str) -> FederationError {
        FederationError::InvalidArguments {
            method: self.method.clone(),
            message: format!("argument '{}' {}", name, problem),
        }
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

//! Declared tool parameters and argument validation.

use std::fmt;

use ethers_core::types::{Address, U256};
use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::utils;

/// Accepted shape of one argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Number,
    /// A JSON number that is a non-negative integer.
    Integer,
    Boolean,
    Enum(&'static [&'static str]),
    /// 0x-prefixed 20-byte hex address.
    Address,
    /// Raw integer amount as a decimal string (wei).
    WeiAmount,
    /// Human decimal amount as a string, e.g. `"1.5"`.
    DecimalAmount,
}

impl ParamKind {
    fn expected(&self) -> String {
        match self {
            ParamKind::String => "a string".to_string(),
            ParamKind::Number => "a number".to_string(),
            ParamKind::Integer => "a non-negative integer".to_string(),
            ParamKind::Boolean => "a boolean".to_string(),
            ParamKind::Enum(values) => format!("one of [{}]", values.join(", ")),
            ParamKind::Address => "a 0x-prefixed 20-byte hex address".to_string(),
            ParamKind::WeiAmount => "a decimal integer string (wei)".to_string(),
            ParamKind::DecimalAmount => "a decimal amount string".to_string(),
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (ParamKind::String, Value::String(_)) => true,
            (ParamKind::Number, Value::Number(_)) => true,
            (ParamKind::Integer, Value::Number(n)) => n.is_u64(),
            (ParamKind::Boolean, Value::Bool(_)) => true,
            (ParamKind::Enum(values), Value::String(s)) => values.contains(&s.as_str()),
            (ParamKind::Address, Value::String(s)) => is_address(s),
            (ParamKind::WeiAmount, Value::String(s)) => utils::parse_wei(s).is_ok(),
            (ParamKind::DecimalAmount, Value::String(s)) => is_decimal(s),
            _ => false,
        }
    }

    fn json_schema(&self) -> Value {
        match self {
            ParamKind::String => json!({ "type": "string" }),
            ParamKind::Number => json!({ "type": "number" }),
            ParamKind::Integer => json!({ "type": "integer", "minimum": 0 }),
            ParamKind::Boolean => json!({ "type": "boolean" }),
            ParamKind::Enum(values) => json!({ "type": "string", "enum": values }),
            ParamKind::Address => json!({ "type": "string", "pattern": "^0x[0-9a-fA-F]{40}$" }),
            ParamKind::WeiAmount => json!({ "type": "string", "pattern": "^[0-9]+$" }),
            ParamKind::DecimalAmount => {
                json!({ "type": "string", "pattern": "^[0-9]+(\\.[0-9]+)?$" })
            }
        }
    }
}

fn is_address(s: &str) -> bool {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(body) => body.len() == 40 && hex::decode(body).is_ok(),
        None => false,
    }
}

fn is_decimal(s: &str) -> bool {
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s, None),
    };
    let digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    digits(int_part) && frac_part.map_or(true, digits)
}

/// Contract for one input field of a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
    pub required: bool,
    pub default: Option<Value>,
}

impl ParameterSpec {
    pub fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    /// Optional parameter filled with `default` when absent.
    pub fn with_default(mut self, default: Value) -> Self {
        self.required = false;
        self.default = Some(default);
        self
    }
}

/// Why one argument was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub problem: String,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' {}", self.field, self.problem)
    }
}

/// Every problem found in one set of arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid arguments: {}", render_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

fn render_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    pub fn fields(&self) -> Vec<&str> {
        self.issues.iter().map(|i| i.field.as_str()).collect()
    }
}

/// Checks `args` against `params`, collecting every failure.
///
/// Returns the arguments with defaults applied. Fields not declared in
/// `params` are dropped.
pub fn validate(params: &[ParameterSpec], args: &Value) -> Result<ToolArgs, ValidationError> {
    let empty = Map::new();
    let object = match args {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => {
            return Err(ValidationError {
                issues: vec![FieldIssue {
                    field: "arguments".to_string(),
                    problem: "must be a JSON object".to_string(),
                }],
            })
        }
    };

    let mut issues = Vec::new();
    let mut values = Map::new();
    for spec in params {
        match object.get(spec.name) {
            None | Some(Value::Null) => {
                if let Some(default) = &spec.default {
                    values.insert(spec.name.to_string(), default.clone());
                } else if spec.required {
                    issues.push(FieldIssue {
                        field: spec.name.to_string(),
                        problem: "is required".to_string(),
                    });
                }
            }
            Some(value) if spec.kind.accepts(value) => {
                values.insert(spec.name.to_string(), value.clone());
            }
            Some(_) => issues.push(FieldIssue {
                field: spec.name.to_string(),
                problem: format!("must be {}", spec.kind.expected()),
            }),
        }
    }

    if issues.is_empty() {
        Ok(ToolArgs { values })
    } else {
        Err(ValidationError { issues })
    }
}

/// JSON Schema object describing `params`, as listed by `tools/list`.
pub fn json_schema(params: &[ParameterSpec]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for spec in params {
        let mut property = spec.kind.json_schema();
        if let Value::Object(map) = &mut property {
            map.insert("description".into(), Value::String(spec.description.to_string()));
            if let Some(default) = &spec.default {
                map.insert("default".into(), default.clone());
            }
        }
        properties.insert(spec.name.to_string(), property);
        if spec.required {
            required.push(Value::String(spec.name.to_string()));
        }
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false
    })
}

/// Arguments that passed validation.
///
/// Getters still return `Result` so handlers stay total, but after
/// [`validate`] the declared fields have the declared shapes.
#[derive(Clone, Default)]
pub struct ToolArgs {
    values: Map<String, Value>,
}

/// Argument names whose values never appear in logs.
const REDACTED: &[&str] = &["privateKey"];

impl fmt::Debug for ToolArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.values {
            if REDACTED.contains(&key.as_str()) {
                map.entry(key, &"[REDACTED]");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

/// Failure to read a validated argument in the expected form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value for '{field}': {reason}")]
pub struct ArgumentError {
    pub field: String,
    pub reason: String,
}

impl ArgumentError {
    pub fn new(field: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl ToolArgs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn str(&self, name: &str) -> Result<&str, ArgumentError> {
        self.opt_str(name)
            .ok_or_else(|| ArgumentError::new(name, "missing string value"))
    }

    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn u64(&self, name: &str) -> Result<u64, ArgumentError> {
        self.values
            .get(name)
            .and_then(Value::as_u64)
            .ok_or_else(|| ArgumentError::new(name, "missing non-negative integer"))
    }

    pub fn opt_u64(&self, name: &str) -> Option<u64> {
        self.values.get(name).and_then(Value::as_u64)
    }

    pub fn address(&self, name: &str) -> Result<Address, ArgumentError> {
        self.str(name)?
            .parse()
            .map_err(|_| ArgumentError::new(name, "not a valid address"))
    }

    pub fn opt_address(&self, name: &str) -> Result<Option<Address>, ArgumentError> {
        match self.opt_str(name) {
            Some(_) => self.address(name).map(Some),
            None => Ok(None),
        }
    }

    pub fn wei(&self, name: &str) -> Result<U256, ArgumentError> {
        utils::parse_wei(self.str(name)?).map_err(|e| ArgumentError::new(name, e))
    }

    /// Parses a human decimal amount into raw units.
    pub fn units(&self, name: &str, decimals: u32) -> Result<U256, ArgumentError> {
        utils::parse_units(self.str(name)?, decimals).map_err(|e| ArgumentError::new(name, e))
    }
}

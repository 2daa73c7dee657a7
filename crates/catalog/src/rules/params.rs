//! Dynamic rule parameters and the schema they are checked against.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use tempora_core::ValueObject;

/// A concrete parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ParamValue {
    String(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    List(Vec<ParamValue>),
    Map(BTreeMap<String, ParamValue>),
}

impl ParamValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ParamValue::String(_) => "string",
            ParamValue::Number(_) => "number",
            ParamValue::Bool(_) => "bool",
            ParamValue::Date(_) => "date",
            ParamValue::List(_) => "list",
            ParamValue::Map(_) => "map",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            ParamValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl ValueObject for ParamValue {}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::String(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<NaiveDate> for ParamValue {
    fn from(value: NaiveDate) -> Self {
        ParamValue::Date(value)
    }
}

/// Expected shape of a parameter value.
///
/// Non-finite numbers are rejected at any depth, including inside `Map` and
/// `Any` values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "items", rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Number,
    Bool,
    Date,
    /// Homogeneous list; every element must match the inner kind.
    List(Box<ParamKind>),
    /// Nested map; entries may hold any kind.
    Map,
    Any,
}

fn check_finite(value: &ParamValue, path: &str, violations: &mut Vec<String>) {
    match value {
        ParamValue::Number(n) if !n.is_finite() => {
            violations.push(format!("`{path}` must be a finite number"));
        }
        ParamValue::List(items) => {
            for (idx, item) in items.iter().enumerate() {
                check_finite(item, &format!("{path}[{idx}]"), violations);
            }
        }
        ParamValue::Map(entries) => {
            for (key, entry) in entries {
                check_finite(entry, &format!("{path}.{key}"), violations);
            }
        }
        _ => {}
    }
}

impl ParamKind {
    fn check(&self, value: &ParamValue, path: &str, violations: &mut Vec<String>) {
        match (self, value) {
            (ParamKind::String, ParamValue::String(_))
            | (ParamKind::Bool, ParamValue::Bool(_))
            | (ParamKind::Date, ParamValue::Date(_)) => {}
            (ParamKind::Any, value)
            | (ParamKind::Number, value @ ParamValue::Number(_))
            | (ParamKind::Map, value @ ParamValue::Map(_)) => check_finite(value, path, violations),
            (ParamKind::List(inner), ParamValue::List(items)) => {
                for (idx, item) in items.iter().enumerate() {
                    inner.check(item, &format!("{path}[{idx}]"), violations);
                }
            }
            (expected, actual) => violations.push(format!(
                "`{path}` expected {}, got {}",
                expected.name(),
                actual.kind_name()
            )),
        }
    }

    pub fn name(&self) -> String {
        match self {
            ParamKind::String => "string".to_string(),
            ParamKind::Number => "number".to_string(),
            ParamKind::Bool => "bool".to_string(),
            ParamKind::Date => "date".to_string(),
            ParamKind::List(inner) => format!("list<{}>", inner.name()),
            ParamKind::Map => "map".to_string(),
            ParamKind::Any => "any".to_string(),
        }
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub kind: ParamKind,
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

impl ParamSpec {
    pub fn required(kind: ParamKind) -> Self {
        Self {
            kind,
            required: true,
            description: String::new(),
        }
    }

    pub fn optional(kind: ParamKind) -> Self {
        Self {
            kind,
            required: false,
            description: String::new(),
        }
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Parameter schema of a rule template: key → expected kind.
///
/// Keys not declared here are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamSchema {
    params: BTreeMap<String, ParamSpec>,
}

impl ParamSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, spec: ParamSpec) -> Self {
        self.params.insert(name.into(), spec);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.params.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamSpec)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Structural walk over `parameters`. Returns every violation, in key order.
    pub fn validate(&self, parameters: &BTreeMap<String, ParamValue>) -> Result<(), Vec<String>> {
        let mut violations = Vec::new();

        for (name, spec) in &self.params {
            match parameters.get(name) {
                Some(value) => spec.kind.check(value, name, &mut violations),
                None if spec.required => violations.push(format!("missing required `{name}`")),
                None => {}
            }
        }

        for name in parameters.keys() {
            if !self.params.contains_key(name) {
                violations.push(format!("unknown parameter `{name}`"));
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ParamSchema {
        ParamSchema::new()
            .with("limit", ParamSpec::required(ParamKind::Number))
            .with("currency", ParamSpec::optional(ParamKind::String))
            .with("cutoffs", ParamSpec::optional(ParamKind::List(Box::new(ParamKind::Date))))
    }

    fn params(entries: Vec<(&str, ParamValue)>) -> BTreeMap<String, ParamValue> {
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn accepts_required_and_optional_keys() {
        let p = params(vec![("limit", 100.0.into()), ("currency", "EUR".into())]);
        assert!(schema().validate(&p).is_ok());
        assert!(schema().validate(&params(vec![("limit", 1.0.into())])).is_ok());
    }

    #[test]
    fn reports_every_violation() {
        let p = params(vec![("currency", true.into()), ("lmit", 5.0.into())]);
        let violations = schema().validate(&p).unwrap_err();
        assert_eq!(
            violations,
            vec![
                "`currency` expected string, got bool".to_string(),
                "missing required `limit`".to_string(),
                "unknown parameter `lmit`".to_string(),
            ]
        );
    }

    #[test]
    fn walks_into_list_elements() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let p = params(vec![
            ("limit", 1.0.into()),
            ("cutoffs", ParamValue::List(vec![date.into(), "soon".into()])),
        ]);
        assert_eq!(
            schema().validate(&p).unwrap_err(),
            vec!["`cutoffs[1]` expected date, got string".to_string()]
        );
    }

    #[test]
    fn rejects_non_finite_numbers() {
        let p = params(vec![("limit", f64::NAN.into())]);
        assert!(schema().validate(&p).is_err());
    }

    #[test]
    fn rejects_non_finite_numbers_nested_in_maps_and_any() {
        let schema = ParamSchema::new()
            .with("limits", ParamSpec::required(ParamKind::Map).described("per-currency caps"))
            .with("extra", ParamSpec::optional(ParamKind::Any));
        assert_eq!(schema.get("limits").map(|s| s.description.as_str()), Some("per-currency caps"));

        let limits = ParamValue::Map(BTreeMap::from([
            ("EUR".to_string(), ParamValue::Number(10.0)),
            ("USD".to_string(), ParamValue::Number(f64::INFINITY)),
        ]));
        let extra = ParamValue::List(vec![ParamValue::Number(f64::NAN)]);
        let p = params(vec![("limits", limits), ("extra", extra)]);

        assert_eq!(
            schema.validate(&p).unwrap_err(),
            vec![
                "`extra[0]` must be a finite number".to_string(),
                "`limits.USD` must be a finite number".to_string(),
            ]
        );

        let ok = params(vec![(
            "limits",
            ParamValue::Map(BTreeMap::from([("EUR".to_string(), "none".into())])),
        )]);
        assert!(schema.validate(&ok).is_ok());
    }

    #[test]
    fn typed_accessors_match_only_their_variant() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(ParamValue::from(2.5).as_number(), Some(2.5));
        assert_eq!(ParamValue::from(true).as_bool(), Some(true));
        assert_eq!(ParamValue::from(date).as_date(), Some(date));
        assert_eq!(ParamValue::from("EUR").as_str(), Some("EUR"));
        assert_eq!(ParamValue::from("EUR").as_number(), None);
        assert_eq!(ParamValue::from(1.0).as_bool(), None);
        assert_eq!(ParamValue::from(false).as_date(), None);
    }

    #[test]
    fn values_serialize_tagged() {
        let json = serde_json::to_value(ParamValue::Number(2.5)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "number", "value": 2.5}));
    }
}

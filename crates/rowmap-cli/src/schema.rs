//! Column specifications and the dynamically typed record they build.
//!
//! Each `--column NAME:KIND` flag becomes a column parser that coerces the
//! raw field into a [`Value`] and stores it in a [`DynamicRecord`] at the
//! column's position.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rowmap::{MapperConfig, Tabulate};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Date format accepted by `date` columns.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Target type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Int,
    Float,
    Bool,
    Date,
    /// Accept the column without storing it.
    Skip,
}

impl ColumnKind {
    /// Coerce raw field text. Empty fields are null for every non-text kind.
    pub fn parse_value(self, raw: &str) -> Result<Value, ValueError> {
        if self == Self::Text {
            return Ok(Value::Text(raw.to_string()));
        }
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Value::Null);
        }
        match self {
            Self::Text | Self::Skip => Ok(Value::Null),
            Self::Int => trimmed
                .parse()
                .map(Value::Int)
                .map_err(|_| ValueError::invalid("integer", raw)),
            Self::Float => trimmed
                .parse()
                .map(Value::Float)
                .map_err(|_| ValueError::invalid("float", raw)),
            Self::Bool => parse_bool(trimmed)
                .map(Value::Bool)
                .ok_or_else(|| ValueError::invalid("boolean", raw)),
            Self::Date => NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
                .map(Value::Date)
                .map_err(|_| ValueError::invalid("date", raw)),
        }
    }
}

impl FromStr for ColumnKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "string" | "str" | "text" => Ok(Self::Text),
            "int" | "integer" => Ok(Self::Int),
            "float" | "number" => Ok(Self::Float),
            "bool" | "boolean" => Ok(Self::Bool),
            "date" => Ok(Self::Date),
            "skip" | "ignore" => Ok(Self::Skip),
            other => Err(format!(
                "unknown column kind '{other}' (expected string, int, float, bool, date or skip)"
            )),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

/// A `NAME:KIND` column flag. A bare `NAME` is a text column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

impl FromStr for ColumnSpec {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (name, kind) = match value.rsplit_once(':') {
            Some((name, kind)) => (name, kind.parse()?),
            None => (value, ColumnKind::Text),
        };
        if name.is_empty() {
            return Err(format!("column spec '{value}' has no name"));
        }
        Ok(Self {
            name: name.to_string(),
            kind,
        })
    }
}

/// Field value rejected by its column kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {expected} value '{value}'")]
pub struct ValueError {
    pub expected: &'static str,
    pub value: String,
}

impl ValueError {
    fn invalid(expected: &'static str, value: &str) -> Self {
        Self {
            expected,
            value: value.to_string(),
        }
    }
}

/// A coerced field value.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Text(value) => f.write_str(value),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Date(value) => write!(f, "{}", value.format(DATE_FORMAT)),
        }
    }
}

/// Record built from column specs, ordered by column position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicRecord {
    cells: BTreeMap<usize, (String, Value)>,
}

impl DynamicRecord {
    pub fn set(&mut self, position: usize, name: impl Into<String>, value: Value) {
        self.cells.insert(position, (name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.cells
            .values()
            .find(|(cell, _)| cell == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells
            .values()
            .map(|(name, value)| (name.as_str(), value))
    }
}

impl Tabulate for DynamicRecord {
    fn fields(&self) -> Vec<(String, String)> {
        self.iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }
}

impl Serialize for DynamicRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Build a mapper configuration with one parser per column spec.
///
/// A spec's position decides where its value sits in the record, so records
/// list their fields in the order the columns were given.
pub fn build_config(specs: &[ColumnSpec]) -> MapperConfig<DynamicRecord, ValueError> {
    specs
        .iter()
        .enumerate()
        .fold(MapperConfig::new(), |config, (position, spec)| {
            let name = spec.name.clone();
            let kind = spec.kind;
            config.with_column(spec.name.clone(), move |raw, record: &mut DynamicRecord| {
                if kind == ColumnKind::Skip {
                    return Ok(());
                }
                record.set(position, name.clone(), kind.parse_value(raw)?);
                Ok(())
            })
        })
}

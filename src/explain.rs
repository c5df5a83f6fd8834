use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;

pub const GROUP_NAME: &str = "Bao";
pub const PREDICTION_PROPERTY: &str = "Bao prediction";
pub const PLAN_JSON_PROPERTY: &str = "Bao plan JSON";
pub const BUFFER_JSON_PROPERTY: &str = "Bao buffer JSON";
pub const HINT_PROPERTY: &str = "Bao recommended hint";
pub const NO_HINT: &str = "(no hint)";

/// A property value as the host's explain output understands it.
#[derive(Debug, Clone, PartialEq)]
pub enum ExplainValue {
    Text(String),
    /// Always finite; see [`ExplainValue::float`].
    Float {
        value: f64,
        unit: &'static str,
        precision: usize,
    },
}

impl ExplainValue {
    /// Non-finite values become the text `NaN`, which structured explain
    /// formats can carry.
    pub fn float(value: f64, unit: &'static str, precision: usize) -> Self {
        if value.is_finite() {
            Self::Float {
                value,
                unit,
                precision,
            }
        } else {
            Self::Text("NaN".to_string())
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Float { .. } => None,
        }
    }

    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float { value, .. } => Some(*value),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for ExplainValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text}"),
            Self::Float {
                value,
                unit,
                precision,
            } => write!(f, "{value:.prec$} {unit}", prec = *precision),
        }
    }
}

impl Serialize for ExplainValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(text) => serializer.serialize_str(text),
            Self::Float { value, .. } => serializer.serialize_f64(*value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExplainProperty {
    pub name: &'static str,
    pub value: ExplainValue,
}

/// Named group of properties added to a query's explain output.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainGroup {
    pub name: &'static str,
    pub properties: Vec<ExplainProperty>,
}

impl ExplainGroup {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            properties: Vec::new(),
        }
    }

    pub fn push(&mut self, name: &'static str, value: ExplainValue) {
        self.properties.push(ExplainProperty { name, value });
    }

    pub fn get(&self, name: &str) -> Option<&ExplainValue> {
        self.properties
            .iter()
            .find(|property| property.name == name)
            .map(|property| &property.value)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Serialize for ExplainGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Properties<'a>(&'a [ExplainProperty]);

        impl Serialize for Properties<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for property in self.0 {
                    map.serialize_entry(property.name, &property.value)?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.name, &Properties(&self.properties))?;
        map.end()
    }
}

impl fmt::Display for ExplainGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.name)?;
        for property in &self.properties {
            writeln!(f, "  {}: {}", property.name, property.value)?;
        }
        Ok(())
    }
}

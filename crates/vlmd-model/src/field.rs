use std::fmt;
use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::scalar::Scalar;

/// Primitive type of a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Integer,
    Number,
    Boolean,
    Date,
    Datetime,
    Other,
}

impl FieldType {
    pub const ALL: [FieldType; 7] = [
        FieldType::String,
        FieldType::Integer,
        FieldType::Number,
        FieldType::Boolean,
        FieldType::Date,
        FieldType::Datetime,
        FieldType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Other => "other",
        }
    }

    /// Comma-separated list of accepted type names, for error messages.
    pub fn accepted_names() -> String {
        Self::ALL
            .iter()
            .map(FieldType::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|ty| ty.as_str() == normalized)
            .ok_or_else(|| format!("unknown field type: {s}"))
    }
}

/// Categorical value labels: raw stored value to human label, in declaration order.
///
/// Serialized as a JSON object keyed by the value's text form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Encodings(Vec<(Scalar, String)>);

impl Encodings {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert a label, replacing the label of an equal value if present.
    pub fn insert(&mut self, value: Scalar, label: impl Into<String>) {
        let label = label.into();
        match self.0.iter_mut().find(|(existing, _)| existing.same_value(&value)) {
            Some(entry) => entry.1 = label,
            None => self.0.push((value, label)),
        }
    }

    pub fn get(&self, value: &Scalar) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing.same_value(value))
            .map(|(_, label)| label.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Scalar, &str)> {
        self.0.iter().map(|(value, label)| (value, label.as_str()))
    }

    /// Encoded values in declaration order.
    pub fn values(&self) -> impl Iterator<Item = &Scalar> {
        self.0.iter().map(|(value, _)| value)
    }
}

impl FromIterator<(Scalar, String)> for Encodings {
    fn from_iter<I: IntoIterator<Item = (Scalar, String)>>(iter: I) -> Self {
        let mut encodings = Encodings::new();
        for (value, label) in iter {
            encodings.insert(value, label);
        }
        encodings
    }
}

impl Serialize for Encodings {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.0.iter().map(|(value, label)| (value.to_string(), label)))
    }
}

impl<'de> Deserialize<'de> for Encodings {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EncodingsVisitor;

        impl<'de> Visitor<'de> for EncodingsVisitor {
            type Value = Encodings;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of stored values to labels")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut encodings = Encodings::new();
                while let Some((key, label)) = map.next_entry::<String, String>()? {
                    encodings.insert(Scalar::parse_text(&key), label);
                }
                Ok(encodings)
            }
        }

        deserializer.deserialize_map(EncodingsVisitor)
    }
}

/// Value constraints attached to a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    /// Exhaustive list of legal values.
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enumeration: Vec<Scalar>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.enumeration.is_empty()
    }
}

/// Canonical per-column metadata record.
///
/// Optional attributes are omitted from serialized output when empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Encodings::is_empty")]
    pub encodings: Encodings,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_values: Vec<Scalar>,
    #[serde(default, skip_serializing_if = "Constraints::is_empty")]
    pub constraints: Constraints,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            description: None,
            encodings: Encodings::new(),
            missing_values: Vec::new(),
            constraints: Constraints::default(),
        }
    }

    /// Set the description; blank text leaves it unset.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        if !description.trim().is_empty() {
            self.description = Some(description);
        }
        self
    }

    #[must_use]
    pub fn with_encodings(mut self, encodings: Encodings) -> Self {
        self.encodings = encodings;
        self
    }

    #[must_use]
    pub fn with_missing_values(mut self, values: Vec<Scalar>) -> Self {
        self.missing_values = values;
        self
    }

    #[must_use]
    pub fn with_enum(mut self, values: Vec<Scalar>) -> Self {
        self.constraints.enumeration = values;
        self
    }

    /// Legal values, if an enum constraint is attached.
    pub fn enum_values(&self) -> Option<&[Scalar]> {
        if self.constraints.enumeration.is_empty() {
            None
        } else {
            Some(&self.constraints.enumeration)
        }
    }
}

//! Value conversion - raw sensor readings to display units.
//!
//! Each sensor type tag maps to a formula. Unknown tags pass the raw value
//! through unchanged with no unit. Conversion is pure: the same
//! `(type, raw)` pair always yields the same result.

use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::fmt;

/// A converted reading: numeric value plus display unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvertedValue {
    pub value: f64,
    pub unit: &'static str,
    /// Fixed number of decimals when rendering, if the formula wants one.
    pub decimals: Option<usize>,
}

impl ConvertedValue {
    /// A value rendered as-is with no unit.
    pub fn plain(value: f64) -> Self {
        Self {
            value,
            unit: "",
            decimals: None,
        }
    }
}

impl fmt::Display for ConvertedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decimals {
            Some(d) => write!(f, "{:.*}{}", d, self.value, self.unit),
            None => write!(f, "{}{}", self.value, self.unit),
        }
    }
}

/// Conversion formula for one sensor type.
pub type Formula = fn(f64) -> ConvertedValue;

/// Resistor-divider inverse for the TLC1549 10-bit ADC.
///
/// raw/1024 = r/(250+r) with a 250 Ω reference, so r = 250·raw/(1024 - raw).
/// The denominator is nudged to avoid dividing by zero at full scale.
fn tlc1549(raw: f64) -> ConvertedValue {
    ConvertedValue {
        value: (250.0 * raw) / (1024.01 - raw),
        unit: "Ω",
        decimals: Some(2),
    }
}

/// Stub sensors count events.
fn stub(raw: f64) -> ConvertedValue {
    ConvertedValue {
        value: raw,
        unit: "次",
        decimals: None,
    }
}

fn random(raw: f64) -> ConvertedValue {
    ConvertedValue::plain(raw.ceil())
}

/// Maps sensor type tags to conversion formulas.
#[derive(Clone)]
pub struct ValueConverter {
    formulas: HashMap<String, Formula>,
}

impl ValueConverter {
    /// Creates a converter with no formulas; every type passes through.
    pub fn empty() -> Self {
        Self {
            formulas: HashMap::new(),
        }
    }

    /// Registers (or replaces) the formula for a sensor type.
    pub fn with_formula(mut self, sensor_type: impl Into<String>, formula: Formula) -> Self {
        self.formulas.insert(sensor_type.into(), formula);
        self
    }

    /// Returns true if the type has a dedicated formula.
    pub fn knows(&self, sensor_type: &str) -> bool {
        self.formulas.contains_key(sensor_type)
    }

    /// Converts a raw value to its display value and unit.
    pub fn convert(&self, sensor_type: &str, raw: f64) -> ConvertedValue {
        match self.formulas.get(sensor_type) {
            Some(formula) => formula(raw),
            None => ConvertedValue::plain(raw),
        }
    }

    /// Converts a raw value and returns only the numeric component,
    /// for feeding chart series.
    pub fn convert_numeric(&self, sensor_type: &str, raw: f64) -> f64 {
        self.convert(sensor_type, raw).value
    }

    /// Converts a raw value straight to its display string.
    pub fn display(&self, sensor_type: &str, raw: f64) -> String {
        self.convert(sensor_type, raw).to_string()
    }
}

impl Default for ValueConverter {
    fn default() -> Self {
        Self::empty()
            .with_formula("tlc1549", tlc1549)
            .with_formula("stub", stub)
            .with_formula("random", random)
    }
}

impl fmt::Debug for ValueConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&String> = self.formulas.keys().collect();
        types.sort();
        f.debug_struct("ValueConverter").field("types", &types).finish()
    }
}

/// Accepts a raw reading encoded either as a JSON number or a numeric string.
pub fn deserialize_raw_value<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("raw_value '{}': {}", s, e))),
    }
}

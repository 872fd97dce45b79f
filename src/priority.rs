use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityLevel {
    pub value: u8,
    pub label: &'static str,
}

/// Ordered from most urgent (1) to least urgent (5).
pub const PRIORITY_SCALE: [PriorityLevel; 5] = [
    PriorityLevel { value: 1, label: "Very high" },
    PriorityLevel { value: 2, label: "High" },
    PriorityLevel { value: 3, label: "Medium" },
    PriorityLevel { value: 4, label: "Low" },
    PriorityLevel { value: 5, label: "Very low" },
];

/// A priority that is always a whole number in `1..=5`.
///
/// The only ways to build one go through [`normalize`], so holding a
/// `Priority` is proof that the value was clamped and rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(u8);

impl Priority {
    pub const HIGHEST: Priority = Priority(1);
    pub const DEFAULT: Priority = Priority(3);
    pub const LOWEST: Priority = Priority(5);

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn label(self) -> &'static str {
        PRIORITY_SCALE
            .iter()
            .find(|level| level.value == self.0)
            .map(|level| level.label)
            .unwrap_or(PRIORITY_SCALE[2].label)
    }

    /// One step more urgent, saturating at 1.
    pub fn raise(self) -> Priority {
        Priority(self.0.saturating_sub(1).max(Self::HIGHEST.0))
    }

    /// One step less urgent, saturating at 5.
    pub fn lower(self) -> Priority {
        Priority((self.0 + 1).min(Self::LOWEST.0))
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.0, self.label())
    }
}

/// Anything that can be coerced into a number for priority normalization.
pub trait PriorityInput {
    /// The numeric reading of the input; `NaN` when there is none.
    fn as_number(&self) -> f64;
}

impl PriorityInput for f64 {
    fn as_number(&self) -> f64 {
        *self
    }
}

impl PriorityInput for i64 {
    fn as_number(&self) -> f64 {
        *self as f64
    }
}

impl PriorityInput for u8 {
    fn as_number(&self) -> f64 {
        f64::from(*self)
    }
}

impl PriorityInput for Priority {
    fn as_number(&self) -> f64 {
        f64::from(self.0)
    }
}

impl PriorityInput for bool {
    fn as_number(&self) -> f64 {
        if *self {
            1.0
        } else {
            0.0
        }
    }
}

impl PriorityInput for str {
    fn as_number(&self) -> f64 {
        let trimmed = self.trim();
        if trimmed.is_empty() {
            return 0.0;
        }
        trimmed.parse::<f64>().unwrap_or(f64::NAN)
    }
}

impl PriorityInput for &str {
    fn as_number(&self) -> f64 {
        (**self).as_number()
    }
}

impl PriorityInput for String {
    fn as_number(&self) -> f64 {
        self.as_str().as_number()
    }
}

impl PriorityInput for Value {
    fn as_number(&self) -> f64 {
        match self {
            Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
            Value::String(s) => s.as_number(),
            Value::Bool(b) => b.as_number(),
            // a missing priority takes the fallback rather than clamping to 1
            Value::Null | Value::Array(_) | Value::Object(_) => f64::NAN,
        }
    }
}

impl<T: PriorityInput> PriorityInput for Option<T> {
    fn as_number(&self) -> f64 {
        self.as_ref().map_or(f64::NAN, PriorityInput::as_number)
    }
}

/// Clamp and round any input into the priority scale.
///
/// Non-finite readings return `fallback`; below 1 is 1, above 5 is 5,
/// everything else rounds to the nearest level with halves going up.
pub fn normalize<T: PriorityInput + ?Sized>(value: &T, fallback: Priority) -> Priority {
    let numeric = value.as_number();
    if !numeric.is_finite() {
        return fallback;
    }
    if numeric < 1.0 {
        return Priority::HIGHEST;
    }
    if numeric > 5.0 {
        return Priority::LOWEST;
    }
    Priority((numeric + 0.5).floor() as u8)
}

/// [`normalize`] with the default fallback.
pub fn normalize_or_default<T: PriorityInput + ?Sized>(value: &T) -> Priority {
    normalize(value, Priority::DEFAULT)
}

pub fn label_for<T: PriorityInput + ?Sized>(value: &T) -> &'static str {
    normalize_or_default(value).label()
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(normalize_or_default(&raw))
    }
}

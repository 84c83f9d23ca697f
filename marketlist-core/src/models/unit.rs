use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unit a product is priced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Kg,
    Lb,
    Unidad,
}

impl Unit {
    pub const ALL: [Unit; 3] = [Unit::Kg, Unit::Lb, Unit::Unidad];

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::Lb => "lb",
            Unit::Unidad => "unidad",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kg" => Ok(Unit::Kg),
            "lb" => Ok(Unit::Lb),
            "unidad" => Ok(Unit::Unidad),
            _ => Err(format!(
                "Invalid unit '{}'. Valid options: kg, lb, unidad",
                s
            )),
        }
    }
}

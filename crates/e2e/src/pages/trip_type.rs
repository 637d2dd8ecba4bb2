//! Trip type picker options

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TripType {
    #[serde(rename = "return")]
    Return,
    #[serde(rename = "oneWay")]
    OneWay,
    #[serde(rename = "multicity")]
    MultiCity,
    #[serde(rename = "nomad")]
    Nomad,
}

impl TripType {
    pub const ALL: [TripType; 4] = [
        TripType::Return,
        TripType::OneWay,
        TripType::MultiCity,
        TripType::Nomad,
    ];

    /// Identifier the site uses for the option
    pub fn tag(&self) -> &'static str {
        match self {
            TripType::Return => "return",
            TripType::OneWay => "oneWay",
            TripType::MultiCity => "multicity",
            TripType::Nomad => "nomad",
        }
    }

    /// Fill the `{tag}` placeholder of an option selector template
    pub fn option_selector(&self, template: &str) -> String {
        template.replace("{tag}", self.tag())
    }
}

impl FromStr for TripType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "return" | "roundtrip" => Ok(TripType::Return),
            "oneway" => Ok(TripType::OneWay),
            "multicity" => Ok(TripType::MultiCity),
            "nomad" => Ok(TripType::Nomad),
            _ => Err(format!("unknown trip type '{}'", s)),
        }
    }
}

impl std::fmt::Display for TripType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// The three forecast rate streams charted by the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RateStream {
    Oil,
    Gas,
    Water,
}

impl RateStream {
    /// Panel order in the viewer.
    pub const ALL: [RateStream; 3] = [RateStream::Oil, RateStream::Gas, RateStream::Water];

    /// Heading shown above the chart panel.
    pub fn title(&self) -> &'static str {
        match self {
            RateStream::Oil => "Oil Forecasts",
            RateStream::Gas => "Gas Forecasts",
            RateStream::Water => "Water Forecasts",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            RateStream::Oil => "oil",
            RateStream::Gas => "gas",
            RateStream::Water => "water",
        }
    }
}

impl fmt::Display for RateStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for RateStream {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "oil" => Ok(RateStream::Oil),
            "gas" => Ok(RateStream::Gas),
            "water" => Ok(RateStream::Water),
            _ => Err(format!("Invalid rate stream: {}", s)),
        }
    }
}

//! Common transport types shared between the date resolver and the viewer.
//! These structs describe the rows of the flat forecast table and the
//! payloads the viewer API returns, so both sides agree on one shape.

mod forecast;
mod interval;
mod rate;

pub use forecast::{ForecastRow, StartDateRecord};
pub use interval::DateInterval;
pub use rate::RateStream;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generic API response wrapper used by the viewer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success flag
    pub success: bool,
}

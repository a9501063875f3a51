use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::NodeId;
use crate::error::RecordError;
use crate::input::Fields;

/// Rates below this are treated as unset.
pub const MIN_DATA_RATE_BPS: u64 = 1_000;
pub const FALLBACK_DATA_RATE_BPS: u64 = 1_000_000;
pub const FALLBACK_DELAY_MS: f64 = 1.0;

/// One row of the link input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkParam {
    pub src_id: NodeId,
    pub dst_id: NodeId,
    pub src_name: String,
    pub dst_name: String,
    pub delay_ms: f64,
    pub data_rate_bps: u64,
    pub packet_loss_rate: f64,
    /// Informational only, never used for routing.
    pub distance_km: f64,
}

impl LinkParam {
    /// Applies the delay and rate floors. Non-finite delays count as unset.
    pub fn normalized(mut self) -> Self {
        if !(self.delay_ms.is_finite() && self.delay_ms > 0.0) {
            self.delay_ms = FALLBACK_DELAY_MS;
        }
        if self.data_rate_bps < MIN_DATA_RATE_BPS {
            self.data_rate_bps = FALLBACK_DATA_RATE_BPS;
        }
        self
    }

    /// Saturates at `Duration::MAX` for delays too large to represent.
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay_ms / 1e3).unwrap_or(Duration::MAX)
    }
}

impl FromStr for LinkParam {
    type Err = RecordError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = Fields::new(line);
        Ok(Self {
            src_id: fields.required("src_id")?,
            dst_id: fields.required("dst_id")?,
            src_name: fields.required("src_name")?,
            dst_name: fields.required("dst_name")?,
            delay_ms: fields.required("delay_ms")?,
            data_rate_bps: fields.required("data_rate_bps")?,
            packet_loss_rate: fields.optional("packet_loss_rate", 0.0)?,
            distance_km: fields.optional("distance_km", 0.0)?,
        })
    }
}

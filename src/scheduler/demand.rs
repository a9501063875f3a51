use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::NodeId;
use crate::engine::SimTime;
use crate::error::RecordError;
use crate::input::Fields;

/// One requested flow, times relative to the start of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficDemand {
    pub demand_id: u32,
    pub src_name: String,
    pub dst_name: String,
    pub src_id: NodeId,
    pub dst_id: NodeId,
    pub data_rate_mbps: f64,
    pub start_time_sec: f64,
    pub duration_sec: f64,
}

impl TrafficDemand {
    /// Flow number used in route reports.
    pub fn flow_number(&self) -> u64 {
        u64::from(self.demand_id) + 1
    }

    pub fn data_rate_bps(&self) -> u64 {
        (self.data_rate_mbps * 1e6) as u64
    }

    pub fn start(&self) -> SimTime {
        SimTime::from_secs_f64(self.start_time_sec)
    }

    pub fn stop(&self) -> SimTime {
        SimTime::from_secs_f64(self.start_time_sec + self.duration_sec)
    }
}

impl FromStr for TrafficDemand {
    type Err = RecordError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = Fields::new(line);
        Ok(Self {
            demand_id: fields.required("demand_id")?,
            src_name: fields.required("src_node")?,
            dst_name: fields.required("dst_node")?,
            src_id: fields.required("src_id")?,
            dst_id: fields.required("dst_id")?,
            data_rate_mbps: fields.required("data_rate_mbps")?,
            start_time_sec: fields.required("start_time_sec")?,
            duration_sec: fields.required("duration_sec")?,
        })
    }
}

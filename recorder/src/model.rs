use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One validated humidity/temperature sample from the sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub humidity_percent: f64,
    pub temperature_celsius: f64,
}

/// One aggregated record, written once per recording cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub timestamp: DateTime<Utc>,
    pub humidity_percent: f64,
    pub temperature_celsius: f64,
    pub device_active: bool,
}

/// REST API response wrapper
#[derive(Debug, Serialize)]
pub struct RecordsResponse {
    pub data: Vec<Record>,
    pub total: usize,
}

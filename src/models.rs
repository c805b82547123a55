use serde::{Deserialize, Serialize};
use std::fmt;

/// One validated sensor snapshot, fields in canonical feature order.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SensorReading {
    pub footfall: f64,
    #[serde(rename = "tempMode")]
    pub temp_mode: f64,
    #[serde(rename = "AQ")]
    pub aq: f64,
    #[serde(rename = "USS")]
    pub uss: f64,
    #[serde(rename = "CS")]
    pub cs: f64,
    #[serde(rename = "VOC")]
    pub voc: f64,
    #[serde(rename = "RP")]
    pub rp: f64,
    #[serde(rename = "IP")]
    pub ip: f64,
    #[serde(rename = "Temperature")]
    pub temperature: f64,
}

impl SensorReading {
    pub fn from_values(values: [f64; 9]) -> Self {
        let [footfall, temp_mode, aq, uss, cs, voc, rp, ip, temperature] = values;
        Self {
            footfall,
            temp_mode,
            aq,
            uss,
            cs,
            voc,
            rp,
            ip,
            temperature,
        }
    }

    pub fn values(&self) -> [f64; 9] {
        [
            self.footfall,
            self.temp_mode,
            self.aq,
            self.uss,
            self.cs,
            self.voc,
            self.rp,
            self.ip,
            self.temperature,
        ]
    }
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = crate::features::FEATURES;
        for (i, (name, value)) in names.iter().zip(self.values()).enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predictions: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

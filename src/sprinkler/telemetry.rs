//! Best-effort valve telemetry (InfluxDB line protocol).
//!
//! Disabled by default. Export failures are warned and swallowed; telemetry
//! must never stop watering.

use std::time::Duration;

use super::station::StationIndex;

const NANOS_PER_SEC: i64 = 1_000_000_000;

pub struct Telemetry {
    client: reqwest::blocking::Client,
}

impl Telemetry {
    pub fn new() -> Self {
        Telemetry {
            client: reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(2))
                .build()
                .unwrap_or_else(|_| reqwest::blocking::Client::new()),
        }
    }

    /// Report one valve transition plus the highest-active summary series.
    pub fn valve_changed(&self, url: &str, station: StationIndex, value: bool, highest_active: usize, now: i64) {
        if url.is_empty() {
            return;
        }

        let body = line_protocol(station, value, highest_active, now);
        match self.client.post(url).body(body).send() {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!("telemetry write returned {}", response.status());
            }
            Ok(_) => {}
            Err(error) => {
                tracing::warn!("telemetry write failed: {}", error);
            }
        }
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

/// `valveNN value=0|1 <ts_ns>` plus `valves value=<highest_active_1based_or_0> <ts_ns>`.
fn line_protocol(station: StationIndex, value: bool, highest_active: usize, now: i64) -> String {
    let ts_ns = now * NANOS_PER_SEC;
    format!(
        "valve{:02} value={} {}\nvalves value={} {}\n",
        station + 1,
        u8::from(value),
        ts_ns,
        highest_active,
        ts_ns
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_protocol_shape() {
        let body = line_protocol(2, true, 3, 1_754_000_000);
        assert_eq!(body, "valve03 value=1 1754000000000000000\nvalves value=3 1754000000000000000\n");
    }

    #[test]
    fn line_protocol_all_off() {
        let body = line_protocol(0, false, 0, 100);
        assert_eq!(body, "valve01 value=0 100000000000\nvalves value=0 100000000000\n");
    }
}

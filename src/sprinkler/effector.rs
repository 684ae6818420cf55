//! Actuation seam for non-standard station kinds.
//!
//! The shift register only drives standard stations; anything else (GPIO
//! pin, HTTP relay, remote controller, RF socket) is switched through an
//! [`Effector`] right before the register is applied. Failures here are
//! logged and swallowed: a dead relay bridge must not stop the loop.

use std::time::Duration;

use super::gpio::{self, Backend, Level, Mode};
use super::station::{Station, StationKind, MAX_WATER_TIME};

pub trait Effector: Send {
    fn switch(&self, backend: &mut dyn Backend, station: &Station, device_key: &str, value: bool);
}

/// Production effector: GPIO via the pin backend, HTTP/remote via blocking
/// GET. RF transmission is not implemented here; swap in a dedicated
/// effector for RF hardware.
pub struct DefaultEffector {
    client: reqwest::blocking::Client,
}

impl DefaultEffector {
    pub fn new() -> Self {
        DefaultEffector {
            client: reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap_or_else(|_| reqwest::blocking::Client::new()),
        }
    }
}

impl Default for DefaultEffector {
    fn default() -> Self {
        Self::new()
    }
}

impl Effector for DefaultEffector {
    fn switch(&self, backend: &mut dyn Backend, station: &Station, device_key: &str, value: bool) {
        match &station.kind {
            StationKind::Standard => {}
            StationKind::Gpio(data) => {
                if gpio::pin::RESERVED.contains(&data.pin) {
                    tracing::error!("GPIO station {} claims reserved pin {}", station.name, data.pin);
                    return;
                }
                let level = Level::from_bool(value == data.active_high);
                let result = backend
                    .pin_mode(data.pin, Mode::Output)
                    .and_then(|_| backend.digital_write(data.pin, level));
                if let Err(error) = result {
                    tracing::error!("GPIO station {} pin {}: {}", station.name, data.pin, error);
                }
            }
            StationKind::Http(data) => {
                let command = if value { &data.cmd_on } else { &data.cmd_off };
                let uri = format!("{}/{}", data.uri.trim_end_matches('/'), command);
                if let Err(error) = self.client.get(&uri).send() {
                    tracing::error!("HTTP station {} request failed: {}", station.name, error);
                }
            }
            StationKind::RemoteIp(data) => {
                // the remote controller is assumed to share our device key
                let uri = format!("http://{}:{}/cm", data.host, data.port);
                let response = self
                    .client
                    .get(&uri)
                    .query(&[
                        ("pw", device_key),
                        ("sid", &data.station_index.to_string()),
                        ("en", if value { "1" } else { "0" }),
                        ("t", &MAX_WATER_TIME.to_string()),
                    ])
                    .send();
                if let Err(error) = response {
                    tracing::error!("remote station {} request failed: {}", station.name, error);
                }
            }
            StationKind::RadioFrequency(data) => {
                tracing::warn!(
                    "RF station {} (code {:06x}/{:06x}) needs an RF-capable effector; ignoring switch",
                    station.name,
                    data.on,
                    data.off
                );
            }
        }
    }
}

/// Effector that records nothing and touches nothing (tests, demo mode).
pub struct NullEffector;

impl Effector for NullEffector {
    fn switch(&self, _backend: &mut dyn Backend, _station: &Station, _device_key: &str, _value: bool) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprinkler::gpio::MemoryBackend;
    use crate::sprinkler::station::GpioStationData;

    fn gpio_station(pin: u8, active_high: bool) -> Station {
        Station {
            name: "G1".into(),
            kind: StationKind::Gpio(GpioStationData { pin, active_high }),
            ..Default::default()
        }
    }

    #[test]
    fn gpio_station_drives_configured_level() {
        let effector = DefaultEffector::new();
        let mut backend = MemoryBackend::new();
        let station = gpio_station(5, true);

        effector.switch(&mut backend, &station, "", true);
        assert_eq!(backend.level(5), Level::High);
        effector.switch(&mut backend, &station, "", false);
        assert_eq!(backend.level(5), Level::Low);
    }

    #[test]
    fn gpio_station_inverts_for_active_low_relays() {
        let effector = DefaultEffector::new();
        let mut backend = MemoryBackend::new();
        let station = gpio_station(6, false);

        effector.switch(&mut backend, &station, "", true);
        assert_eq!(backend.level(6), Level::Low);
        effector.switch(&mut backend, &station, "", false);
        assert_eq!(backend.level(6), Level::High);
    }

    #[test]
    fn reserved_pins_are_refused() {
        let effector = DefaultEffector::new();
        let mut backend = MemoryBackend::new();
        backend.set_level(gpio::pin::SHIFT_REGISTER_DATA, Level::Low);
        let station = gpio_station(gpio::pin::SHIFT_REGISTER_DATA, true);

        effector.switch(&mut backend, &station, "", true);
        assert_eq!(backend.level(gpio::pin::SHIFT_REGISTER_DATA), Level::Low, "write was refused");
    }
}

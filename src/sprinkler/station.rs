use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr};
use std::num::ParseIntError;

use serde::{Deserialize, Serialize};

pub type StationIndex = usize;

/// Stations/zones per 74HC595 board.
pub const SHIFT_REGISTER_LINES: usize = 8;

/// Maximum number of eight-station boards (including the base board).
pub const MAX_NUM_BOARDS: usize = 25;

/// Maximum number of stations.
pub const MAX_NUM_STATIONS: usize = MAX_NUM_BOARDS * SHIFT_REGISTER_LINES;

pub const MAX_MASTER_STATIONS: usize = 2;

/// Sequential groups 0..=3; group [`PARALLEL_GROUP_ID`] bypasses serialization.
pub const NUM_SEQUENTIAL_GROUPS: usize = 4;
pub const PARALLEL_GROUP_ID: u8 = 255;

/// Maximum water time (seconds) = 18 hours.
pub const MAX_WATER_TIME: u16 = 64800;

pub type Stations = Vec<Station>;

/// A single solenoid output channel.
///
/// Identity is the stable 0-based index into the station list; board index is
/// `id >> 3`, bit position `id & 7`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    /// Sequential group (0..=3) or [`PARALLEL_GROUP_ID`].
    pub group_id: u8,
    pub master1_bound: bool,
    pub master2_bound: bool,
    pub ignore_sensor1: bool,
    pub ignore_sensor2: bool,
    /// Run even while rain is sensed or a rain delay is active.
    pub ignore_rain: bool,
    pub disabled: bool,
    pub activate_relay: bool,
    #[serde(flatten)]
    pub kind: StationKind,
}

impl Station {
    pub fn is_parallel(&self) -> bool {
        self.group_id == PARALLEL_GROUP_ID
    }

    pub fn bound_to_master(&self, master_index: usize) -> bool {
        match master_index {
            0 => self.master1_bound,
            1 => self.master2_bound,
            _ => false,
        }
    }

    pub fn ignores_sensor(&self, sensor_index: usize) -> bool {
        match sensor_index {
            0 => self.ignore_sensor1,
            1 => self.ignore_sensor2,
            _ => true,
        }
    }
}

impl Default for Station {
    fn default() -> Self {
        Station {
            name: String::new(),
            group_id: 0,
            master1_bound: false,
            master2_bound: false,
            ignore_sensor1: false,
            ignore_sensor2: false,
            ignore_rain: false,
            disabled: false,
            activate_relay: false,
            kind: StationKind::Standard,
        }
    }
}

/// Station kind tag plus kind-specific payload.
///
/// Non-standard kinds are actuated through the effector seam, never by the
/// shift register directly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "special_data", rename_all = "snake_case")]
pub enum StationKind {
    Standard,
    Gpio(GpioStationData),
    Http(HttpStationData),
    RemoteIp(RemoteStationData),
    RadioFrequency(RfStationData),
}

impl StationKind {
    /// Legacy wire code: 0 standard, 1 RF, 2 remote, 3 GPIO, 4 HTTP.
    pub fn code(&self) -> u8 {
        match self {
            StationKind::Standard => 0,
            StationKind::RadioFrequency(_) => 1,
            StationKind::RemoteIp(_) => 2,
            StationKind::Gpio(_) => 3,
            StationKind::Http(_) => 4,
        }
    }

    /// Parse a legacy `st`/`sd` parameter pair.
    pub fn try_from_legacy(code: u8, data: &str) -> Result<Self, PayloadError> {
        match code {
            0 => Ok(StationKind::Standard),
            1 => Ok(StationKind::RadioFrequency(RfStationData::try_from_legacy(data)?)),
            2 => Ok(StationKind::RemoteIp(RemoteStationData::try_from_legacy(data)?)),
            3 => Ok(StationKind::Gpio(GpioStationData::try_from_legacy(data)?)),
            4 => Ok(StationKind::Http(HttpStationData::try_from_legacy(data)?)),
            _ => Err(PayloadError::UnknownKind(code)),
        }
    }

    /// Legacy `sd` payload string, [None] for standard stations.
    pub fn legacy_data(&self) -> Option<String> {
        match self {
            StationKind::Standard => None,
            StationKind::RadioFrequency(data) => Some(format!("{:06x}{:06x}{:04x}", data.on, data.off, data.timing)),
            StationKind::RemoteIp(data) => match data.host {
                IpAddr::V4(addr) => Some(format!("{:08x}{:04x}{:02x}", u32::from(addr), data.port, data.station_index)),
                IpAddr::V6(_) => None,
            },
            StationKind::Gpio(data) => Some(format!("{:02}{}", data.pin, u8::from(data.active_high))),
            StationKind::Http(data) => {
                let uri = url::Url::parse(&data.uri).ok()?;
                Some(format!("{},{},{},{}", uri.host_str()?, uri.port().unwrap_or(80), data.cmd_on, data.cmd_off))
            }
        }
    }
}

#[derive(Debug)]
pub enum PayloadError {
    UnknownKind(u8),
    BadLength,
    BadNumber,
}

impl Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadError::UnknownKind(code) => write!(f, "unknown station kind {}", code),
            PayloadError::BadLength => write!(f, "station payload has the wrong length"),
            PayloadError::BadNumber => write!(f, "station payload contains an unparsable number"),
        }
    }
}

impl std::error::Error for PayloadError {}

impl From<ParseIntError> for PayloadError {
    fn from(_: ParseIntError) -> Self {
        PayloadError::BadNumber
    }
}

/// GPIO-kind payload: three ASCII decimal characters.
///
/// ```text
///    0     1     2
/// +-----+-----+-----+
/// | GPIO PIN  | LVL |
/// +-----+-----+-----+
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GpioStationData {
    /// BCM pin number
    pub pin: u8,
    /// `true` for +3V3 relays, `false` for active-low (GND) relays
    pub active_high: bool,
}

impl GpioStationData {
    pub fn try_from_legacy(data: &str) -> Result<Self, PayloadError> {
        if data.len() != 3 {
            return Err(PayloadError::BadLength);
        }
        let pin = data[0..2].parse::<u8>()?;
        let active_high = match &data[2..3] {
            "0" => false,
            "1" => true,
            _ => return Err(PayloadError::BadNumber),
        };
        Ok(GpioStationData { pin, active_high })
    }
}

/// HTTP-kind payload: comma-separated `host,port,on_cmd,off_cmd`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HttpStationData {
    pub uri: String,
    pub cmd_on: String,
    pub cmd_off: String,
}

impl HttpStationData {
    pub fn try_from_legacy(data: &str) -> Result<Self, PayloadError> {
        let fields: Vec<&str> = data.splitn(4, ',').collect();
        if fields.len() != 4 {
            return Err(PayloadError::BadLength);
        }
        fields[1].parse::<u16>()?;
        Ok(HttpStationData {
            uri: format!("http://{}:{}", fields[0], fields[1]),
            cmd_on: fields[2].into(),
            cmd_off: fields[3].into(),
        })
    }
}

/// Remote-IP payload: 14 hex characters.
///
/// ```text
///  0               1
///  0 1 2 3 4 5 6 7 0 1 2 3 4 5
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  IP ADDRESS   | PORT  | I |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteStationData {
    pub host: IpAddr,
    pub port: u16,
    pub station_index: StationIndex,
}

impl RemoteStationData {
    pub fn try_from_legacy(data: &str) -> Result<Self, PayloadError> {
        if data.len() != 14 {
            return Err(PayloadError::BadLength);
        }
        Ok(RemoteStationData {
            host: IpAddr::V4(Ipv4Addr::from(u32::from_str_radix(&data[0..8], 16)?)),
            port: u16::from_str_radix(&data[8..12], 16)?,
            station_index: usize::from_str_radix(&data[12..14], 16)?,
        })
    }
}

/// RF payload: 16 hex characters (24-bit on code, 24-bit off code, 16-bit timing).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RfStationData {
    pub on: u32,
    pub off: u32,
    pub timing: u16,
}

impl RfStationData {
    pub fn try_from_legacy(data: &str) -> Result<Self, PayloadError> {
        if data.len() != 16 {
            return Err(PayloadError::BadLength);
        }
        Ok(RfStationData {
            on: u32::from_str_radix(&data[0..6], 16)?,
            off: u32::from_str_radix(&data[6..12], 16)?,
            timing: u16::from_str_radix(&data[12..16], 16)?,
        })
    }
}

/// The default station set: `S001`..`S200`, standard kind, group 0.
pub fn default_stations() -> Stations {
    (0..MAX_NUM_STATIONS)
        .map(|i| Station {
            name: format!("S{:0>3}", i + 1),
            ..Default::default()
        })
        .collect()
}

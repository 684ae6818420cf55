use serde::Serialize;

use crate::sprinkler::Controller;

/// `/js` body: one 0/1 per station plus the station count.
#[derive(Serialize)]
pub struct Status {
    sn: Vec<u8>,
    nstations: usize,
}

impl Status {
    pub fn new(controller: &Controller) -> Self {
        let station_count = controller.options.station_count();
        Status {
            sn: (0..station_count).map(|station| u8::from(controller.is_station_on(station))).collect(),
            nstations: station_count,
        }
    }
}

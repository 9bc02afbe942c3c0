// Copyright (C) 2025 Paul Hampson
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License version 3 as  published by the
// Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <https://www.gnu.org/licenses/>.

//! Host-side session logic for a serial-attached scale controller board and
//! the TCP collector it reports to. The device interaction is an explicit
//! state machine over a swappable line transport; the collector link is a
//! length-prefix framed text protocol.

pub mod device;
pub mod error;
pub mod relay;
pub mod retry;
pub mod transport;

#[cfg(test)]
pub(crate) mod testkit;

pub use device::{BOOT_BANNER, DeviceSession, SessionState};
pub use error::{Result, SessionError};
pub use relay::RelayClient;
pub use retry::RetryPolicy;
pub use transport::DeviceLink;

pub use scale_messages::{Measurement, MeasurementParseError, WeightUnits};

use std::io::{Read, Write};

/// One field session: the scale controller on a serial link and the
/// collector on a socket, owned together so both are released on every exit
/// path.
pub struct ScaleSession<L: DeviceLink, S: Read + Write> {
    device: DeviceSession<L>,
    relay: RelayClient<S>,
}

impl<L: DeviceLink, S: Read + Write> ScaleSession<L, S> {
    pub fn new(device: DeviceSession<L>, relay: RelayClient<S>) -> Self {
        Self { device, relay }
    }

    /// Announce this instrument to the collector.
    pub fn announce(&mut self) -> Result<()> {
        self.relay.announce()
    }

    /// Wait for the board to finish booting.
    pub fn await_device_boot(&mut self) -> Result<()> {
        self.device.await_boot_banner()
    }

    /// Tare the board, with the collector confirming the scale is empty.
    pub fn calibrate(&mut self) -> Result<()> {
        self.device.enter_menu()?;
        let relay = &mut self.relay;
        self.device.run_tare_step(|| relay.confirm_empty_scale())
    }

    /// Take one measurement from the board.
    pub fn sample(&mut self) -> Result<Measurement> {
        self.device.read_weight()
    }

    /// Deliver a measurement's weight to the collector.
    pub fn deliver(&mut self, measurement: &Measurement) -> Result<()> {
        self.relay.send_weight(&measurement.weight)
    }

    /// The whole linear flow: announce, boot wait, tare calibration, one
    /// measurement, delivery. The measurement taken is the one delivered.
    pub fn run(&mut self) -> Result<Measurement> {
        self.announce()?;
        self.await_device_boot()?;
        self.calibrate()?;
        let measurement = self.sample()?;
        self.deliver(&measurement)?;
        Ok(measurement)
    }
}

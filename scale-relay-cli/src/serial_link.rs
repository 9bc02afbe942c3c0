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

use scale_host_core::DeviceLink;
use std::io::{self, BufRead, BufReader, ErrorKind, Write};

/// `DeviceLink` over a real serial port.
///
/// A timeout with no pending bytes reads as `None`; a timeout with pending
/// bytes yields them as a partial line. The board's bare `>` prompt has no
/// terminator and only ever arrives through the partial-line path.
pub struct SerialDeviceLink {
    port: BufReader<Box<dyn serialport::SerialPort>>,
    pending: Vec<u8>,
}

impl SerialDeviceLink {
    pub fn new(port: Box<dyn serialport::SerialPort>) -> Self {
        Self {
            port: BufReader::new(port),
            pending: Vec::new(),
        }
    }
}

impl DeviceLink for SerialDeviceLink {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        match self.port.read_until(b'\n', &mut self.pending) {
            Ok(0) => Ok(None),
            Ok(_) => {
                let line = String::from_utf8_lossy(&self.pending).into_owned();
                self.pending.clear();
                log::trace!("serial line {:?}", line);
                Ok(Some(line))
            }
            Err(e) if e.kind() == ErrorKind::TimedOut => {
                if self.pending.is_empty() {
                    Ok(None)
                } else {
                    let line = String::from_utf8_lossy(&self.pending).into_owned();
                    self.pending.clear();
                    log::trace!("serial partial line {:?}", line);
                    Ok(Some(line))
                }
            }
            Err(e) => Err(e),
        }
    }

    fn send_command(&mut self, command: u8) -> io::Result<()> {
        log::trace!("serial command {:?}", command as char);
        let port = self.port.get_mut();
        port.write_all(&[command])?;
        port.flush()
    }
}

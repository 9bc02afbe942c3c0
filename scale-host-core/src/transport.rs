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

use std::io;

/// Line-oriented link to the scale controller board.
///
/// The session state machine drives the board exclusively through this trait
/// so tests can substitute a scripted link for the serial port.
pub trait DeviceLink {
    /// Read one line from the board, including its terminator.
    ///
    /// `Ok(None)` is a timed-out read that yielded no bytes, the board's cue
    /// that it needs re-prompting. A timed-out read that did yield bytes
    /// returns them as a partial line; the bare `>` prompt arrives this way
    /// because the board sends it without a terminator.
    fn read_line(&mut self) -> io::Result<Option<String>>;

    /// Send one single-byte menu command to the board.
    fn send_command(&mut self, command: u8) -> io::Result<()>;
}

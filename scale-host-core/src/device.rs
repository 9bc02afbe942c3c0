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

use crate::error::{Result, SessionError};
use crate::retry::RetryPolicy;
use crate::transport::DeviceLink;
use scale_messages::Measurement;

/// Line the board prints when its boot sequence is done and continuous
/// readings begin.
pub const BOOT_BANNER: &str = "Readings:\r\n";

const CMD_MENU: u8 = b'x';
const CMD_TARE: u8 = b'1';
const CMD_READ: u8 = b't';

fn is_prompt(line: &str) -> bool {
    line.trim_end_matches(['\r', '\n']) == ">"
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingBanner,
    EnteringMenu,
    AwaitingTareConfirmation,
    Taring,
    ExitingMenu,
    Ready,
}

/// Drives the scale controller board through its text-menu interface.
///
/// The interaction is an explicit state machine: every operation checks the
/// session is in its expected entry state, so calling out of order is an
/// error rather than a silently confused board.
pub struct DeviceSession<L: DeviceLink> {
    link: L,
    state: SessionState,
    retry: RetryPolicy,
}

impl<L: DeviceLink> DeviceSession<L> {
    pub fn new(link: L, retry: RetryPolicy) -> Self {
        Self {
            link,
            state: SessionState::AwaitingBanner,
            retry,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The underlying link, for inspection.
    pub fn link(&self) -> &L {
        &self.link
    }

    fn expect_state(&self, expected: SessionState) -> Result<()> {
        if self.state != expected {
            return Err(SessionError::UnexpectedState {
                expected,
                actual: self.state,
            });
        }
        Ok(())
    }

    fn set_state(&mut self, next: SessionState) {
        log::trace!("device session {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Consume boot output until the banner line, then discard the one
    /// reading that is already in flight when the banner lands.
    pub fn await_boot_banner(&mut self) -> Result<()> {
        self.expect_state(SessionState::AwaitingBanner)?;

        let mut budget = self.retry.budget("boot banner");
        loop {
            budget.spend()?;
            match self.link.read_line()? {
                Some(line) if line == BOOT_BANNER => break,
                Some(line) => log::trace!("discarding boot output {:?}", line),
                None => log::trace!("no boot output yet"),
            }
        }
        let _ = self.link.read_line()?;

        self.set_state(SessionState::EnteringMenu);
        Ok(())
    }

    /// Interrupt the continuous-reading stream and wait for the menu prompt.
    pub fn enter_menu(&mut self) -> Result<()> {
        self.expect_state(SessionState::EnteringMenu)?;

        self.link.send_command(CMD_MENU)?;
        self.await_prompt("menu prompt")?;

        self.set_state(SessionState::AwaitingTareConfirmation);
        Ok(())
    }

    /// Tare the board once `confirm` reports the scale is empty, then leave
    /// the menu.
    ///
    /// `confirm` blocks until an answer is available: the networked variant
    /// polls the collector, the standalone variant prompts the operator.
    pub fn run_tare_step<F>(&mut self, mut confirm: F) -> Result<()>
    where
        F: FnMut() -> Result<bool>,
    {
        self.expect_state(SessionState::AwaitingTareConfirmation)?;

        let mut budget = self.retry.budget("empty-scale confirmation");
        loop {
            budget.spend()?;
            if confirm()? {
                break;
            }
            log::debug!("scale not confirmed empty yet");
        }

        self.set_state(SessionState::Taring);
        self.link.send_command(CMD_TARE)?;
        self.await_prompt("tare completion")?;

        self.set_state(SessionState::ExitingMenu);
        self.link.send_command(CMD_MENU)?;
        // The board echoes one line on the way out of the menu
        let _ = self.link.read_line()?;

        self.set_state(SessionState::Ready);
        Ok(())
    }

    /// Request one reading and parse it.
    ///
    /// The board occasionally misses the request byte; an empty read re-sends
    /// it, bounded by the retry policy. A line that does not match the
    /// measurement format fails rather than yielding partial data.
    pub fn read_weight(&mut self) -> Result<Measurement> {
        self.expect_state(SessionState::Ready)?;

        self.link.send_command(CMD_READ)?;
        let mut budget = self.retry.budget("measurement line");
        let line = loop {
            budget.spend()?;
            match self.link.read_line()? {
                Some(line) => break line,
                None => self.link.send_command(CMD_READ)?,
            }
        };

        let measurement = Measurement::parse_line(&line)?;
        log::debug!(
            "board reported {} at {} ms since boot",
            measurement,
            measurement.timestamp_ms
        );
        Ok(measurement)
    }

    // Consume lines until the prompt, re-sending the menu command whenever a
    // read comes back empty.
    fn await_prompt(&mut self, waiting_for: &'static str) -> Result<()> {
        let mut budget = self.retry.budget(waiting_for);
        loop {
            budget.spend()?;
            match self.link.read_line()? {
                Some(line) if is_prompt(&line) => return Ok(()),
                Some(line) => log::trace!("discarding menu output {:?}", line),
                None => self.link.send_command(CMD_MENU)?,
            }
        }
    }
}

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

use crate::device::SessionState;
use scale_messages::{FrameError, MeasurementParseError};
use thiserror::Error;

/// Error type for host-side session failures.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("I/O failure on a session endpoint: {0}")]
    Io(#[from] std::io::Error),

    #[error("relay framing error: {0}")]
    Frame(#[from] FrameError),

    #[error("malformed measurement line: {0}")]
    Measurement(#[from] MeasurementParseError),

    #[error("operation requires the {expected:?} state but the session is in {actual:?}")]
    UnexpectedState {
        expected: SessionState,
        actual: SessionState,
    },

    #[error("gave up waiting for {waiting_for} after {attempts} attempts")]
    RetriesExhausted {
        waiting_for: &'static str,
        attempts: u32,
    },

    #[error("relay closed the connection")]
    RelayDisconnected,

    #[error("relay frame of {0} bytes exceeds the receive buffer")]
    FrameTooLarge(usize),
}

/// Result type alias using the session error.
pub type Result<T> = std::result::Result<T, SessionError>;

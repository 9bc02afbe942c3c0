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

pub mod measurement;
pub mod relay;

pub use measurement::{Measurement, MeasurementParseError, WeightUnits};
pub use relay::RelayRequest;

use thiserror::Error;

/// Largest payload the relay link will carry in a single frame.
pub const MAX_PAYLOAD_SIZE: usize = 1024;

const PREFIX_BYTE_COUNT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The buffer is too small to hold the length prefix plus the payload,
    /// value is the total number of bytes required
    #[error("need {0} bytes for the complete frame")]
    BufferTooSmall(usize),
    #[error("payload of {0} bytes does not fit the u16 length prefix")]
    PayloadTooLarge(usize),
}

/// Frame a payload with a length prefix for sending across a data link.
///
/// Returns the number of bytes written on success, or a FrameError on failure.
///
/// # Errors
///
/// - `BufferTooSmall`: if the buffer is not large enough to hold the length
///   prefix (2 bytes) plus the payload
/// - `PayloadTooLarge`: if the payload length does not fit the u16 prefix
pub fn frame_payload(payload: &[u8], buffer: &mut [u8]) -> Result<usize, FrameError> {
    if payload.len() > u16::MAX as usize {
        return Err(FrameError::PayloadTooLarge(payload.len()));
    }

    let total_bytes_needed = payload.len() + PREFIX_BYTE_COUNT;
    if buffer.len() < total_bytes_needed {
        return Err(FrameError::BufferTooSmall(total_bytes_needed));
    }

    buffer[0..PREFIX_BYTE_COUNT].copy_from_slice(&(payload.len() as u16).to_be_bytes());
    buffer[PREFIX_BYTE_COUNT..total_bytes_needed].copy_from_slice(payload);

    Ok(total_bytes_needed)
}

/// Decode one length-prefixed frame from the front of `buffer`.
///
/// Returns the number of bytes consumed and the payload slice. A
/// `BufferTooSmall` error means the frame is not complete yet and carries the
/// total byte count required to decode it.
pub fn decode_frame(buffer: &[u8]) -> Result<(usize, &[u8]), FrameError> {
    if buffer.len() < PREFIX_BYTE_COUNT {
        return Err(FrameError::BufferTooSmall(PREFIX_BYTE_COUNT));
    }

    let mut length_bytes = [0u8; PREFIX_BYTE_COUNT];
    length_bytes.copy_from_slice(&buffer[..PREFIX_BYTE_COUNT]);
    let payload_len = u16::from_be_bytes(length_bytes) as usize;

    let frame_end = PREFIX_BYTE_COUNT + payload_len;
    if buffer.len() < frame_end {
        return Err(FrameError::BufferTooSmall(frame_end));
    }

    Ok((frame_end, &buffer[PREFIX_BYTE_COUNT..frame_end]))
}

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

//! Payload texts exchanged with the collector. The collector acknowledges an
//! announce with any payload; the confirmation poll only ends on the literal
//! `yes`.

/// First payload sent after connecting.
pub const ANNOUNCE: &str = "scale connecting";

/// Repeated query asking the operator (via the collector) to empty the scale.
pub const EMPTY_SCALE_QUERY: &str = "is scale empty";

/// Collector reply that ends the confirmation poll.
pub const SCALE_EMPTY_REPLY: &str = "yes";

/// A client-to-collector message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayRequest {
    Announce,
    EmptyScaleQuery,
    /// The measured weight as raw decimal text
    Weight(String),
}

impl RelayRequest {
    pub fn payload(&self) -> &[u8] {
        match self {
            RelayRequest::Announce => ANNOUNCE.as_bytes(),
            RelayRequest::EmptyScaleQuery => EMPTY_SCALE_QUERY.as_bytes(),
            RelayRequest::Weight(weight) => weight.as_bytes(),
        }
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayRequest::Announce => "announce",
            RelayRequest::EmptyScaleQuery => "empty-scale query",
            RelayRequest::Weight(_) => "weight",
        }
    }
}

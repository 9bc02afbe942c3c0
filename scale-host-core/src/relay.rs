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
use circular_buffer::CircularBuffer;
use scale_messages::relay::SCALE_EMPTY_REPLY;
use scale_messages::{FrameError, RelayRequest, decode_frame, frame_payload};
use std::io::{BufRead, Read, Write};

/// Receive buffer size; also bounds a single frame.
pub const RX_BUFFER_SIZE: usize = scale_messages::MAX_PAYLOAD_SIZE;

/// Client side of the collector link.
///
/// Every message in both directions is a u16 big-endian length prefix
/// followed by the payload text. Received bytes accumulate in a circular
/// buffer and frames are decoded from its front, so a frame split across
/// TCP segments is reassembled rather than misread.
pub struct RelayClient<S: Read + Write> {
    stream: S,
    rx_buffer: CircularBuffer<RX_BUFFER_SIZE, u8>,
    retry: RetryPolicy,
}

impl<S: Read + Write> RelayClient<S> {
    pub fn new(stream: S, retry: RetryPolicy) -> Self {
        Self {
            stream,
            rx_buffer: CircularBuffer::new(),
            retry,
        }
    }

    /// The underlying stream, for inspection.
    pub fn stream(&self) -> &S {
        &self.stream
    }

    /// Announce this instrument to the collector and wait for the
    /// acknowledgement frame. The acknowledgement content is ignored.
    pub fn announce(&mut self) -> Result<()> {
        self.send(&RelayRequest::Announce)?;
        let ack = self.read_reply()?;
        log::debug!("collector acknowledged announce with {} bytes", ack.len());
        Ok(())
    }

    /// Ask the collector whether the scale is empty, repeating the query
    /// until the reply is the confirmation literal or the retry budget runs
    /// out.
    pub fn confirm_empty_scale(&mut self) -> Result<bool> {
        let mut budget = self.retry.budget("empty-scale confirmation from collector");
        loop {
            budget.spend()?;
            self.send(&RelayRequest::EmptyScaleQuery)?;
            let reply = self.read_reply()?;
            if reply == SCALE_EMPTY_REPLY.as_bytes() {
                return Ok(true);
            }
            log::debug!(
                "collector replied {:?}, asking again",
                String::from_utf8_lossy(&reply)
            );
        }
    }

    /// Deliver the measured weight as raw decimal text. No acknowledgement
    /// is awaited.
    pub fn send_weight(&mut self, weight: &str) -> Result<()> {
        self.send(&RelayRequest::Weight(weight.to_string()))
    }

    fn send(&mut self, request: &RelayRequest) -> Result<()> {
        let mut buffer = [0u8; RX_BUFFER_SIZE + 2];
        let frame_len = frame_payload(request.payload(), &mut buffer)?;
        self.stream.write_all(&buffer[..frame_len])?;
        self.stream.flush()?;
        log::trace!("sent {} frame of {} bytes", request.kind(), frame_len);
        Ok(())
    }

    fn read_reply(&mut self) -> Result<Vec<u8>> {
        loop {
            self.rx_buffer.make_contiguous();
            let decoded = {
                let (buffered, _) = self.rx_buffer.as_slices();
                match decode_frame(buffered) {
                    Ok((consumed, payload)) => Some((consumed, payload.to_vec())),
                    Err(FrameError::BufferTooSmall(needed)) => {
                        if needed > self.rx_buffer.capacity() {
                            return Err(SessionError::FrameTooLarge(needed));
                        }
                        None
                    }
                    Err(e) => return Err(e.into()),
                }
            };

            match decoded {
                Some((consumed, payload)) => {
                    self.rx_buffer.consume(consumed);
                    log::trace!("received frame with {} byte payload", payload.len());
                    return Ok(payload);
                }
                None => self.fill_rx_buffer()?,
            }
        }
    }

    fn fill_rx_buffer(&mut self) -> Result<()> {
        let mut chunk = [0u8; RX_BUFFER_SIZE];
        let free = self.rx_buffer.capacity() - self.rx_buffer.len();
        let read = self.stream.read(&mut chunk[..free])?;
        if read == 0 {
            return Err(SessionError::RelayDisconnected);
        }
        self.rx_buffer.extend_from_slice(&chunk[..read]);
        log::trace!("buffered {} bytes from collector", read);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{ScriptedStream, decode_frames, framed};
    use scale_messages::relay::{ANNOUNCE, EMPTY_SCALE_QUERY};

    #[test]
    fn announce_sends_the_literal_and_consumes_the_ack() {
        let stream = ScriptedStream::new(vec![framed(b"ok")]);
        let mut client = RelayClient::new(stream, RetryPolicy::default());

        client.announce().unwrap();

        let sent = decode_frames(&client.stream.written);
        assert_eq!(sent, vec![ANNOUNCE.as_bytes().to_vec()]);
    }

    #[test]
    fn confirmation_polls_until_yes() {
        let stream = ScriptedStream::new(vec![framed(b"no"), framed(b"no"), framed(b"yes")]);
        let mut client = RelayClient::new(stream, RetryPolicy::default());

        assert!(client.confirm_empty_scale().unwrap());

        let sent = decode_frames(&client.stream.written);
        assert_eq!(sent.len(), 3, "one query per reply");
        assert!(sent.iter().all(|p| p == EMPTY_SCALE_QUERY.as_bytes()));
    }

    #[test]
    fn confirmation_gives_up_when_the_budget_runs_out() {
        let stream = ScriptedStream::new(vec![framed(b"no"), framed(b"no")]);
        let mut client = RelayClient::new(stream, RetryPolicy::new(2));

        let err = client.confirm_empty_scale().unwrap_err();
        assert!(matches!(err, SessionError::RetriesExhausted { .. }));
        assert_eq!(decode_frames(&client.stream.written).len(), 2);
    }

    #[test]
    fn replies_split_across_reads_are_reassembled() {
        // Deliver the ack one byte per read() call
        let stream = ScriptedStream::new(vec![framed(b"acknowledged")]).with_chunk_limit(1);
        let mut client = RelayClient::new(stream, RetryPolicy::default());

        client.announce().unwrap();
    }

    #[test]
    fn two_replies_in_one_read_are_consumed_one_frame_at_a_time() {
        let mut bytes = framed(b"no");
        bytes.extend(framed(b"yes"));
        let stream = ScriptedStream::from_bytes(bytes);
        let mut client = RelayClient::new(stream, RetryPolicy::default());

        assert!(client.confirm_empty_scale().unwrap());
        assert_eq!(decode_frames(&client.stream.written).len(), 2);
    }

    #[test]
    fn weight_payload_arrives_byte_exact() {
        let stream = ScriptedStream::new(vec![]);
        let mut client = RelayClient::new(stream, RetryPolicy::default());

        client.send_weight("72.5").unwrap();

        let sent = decode_frames(&client.stream.written);
        assert_eq!(sent, vec![b"72.5".to_vec()]);
    }

    #[test]
    fn a_closed_collector_is_an_error() {
        let stream = ScriptedStream::new(vec![]);
        let mut client = RelayClient::new(stream, RetryPolicy::default());

        let err = client.announce().unwrap_err();
        assert!(matches!(err, SessionError::RelayDisconnected));
    }
}

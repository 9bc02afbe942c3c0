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

//! Scripted stand-ins for the serial link and the collector socket.

use crate::transport::DeviceLink;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
pub(crate) enum ScriptedRead {
    Line(String),
    /// A timed-out read that yielded nothing
    Empty,
}

impl ScriptedRead {
    pub(crate) fn line(text: &str) -> Self {
        ScriptedRead::Line(text.to_string())
    }
}

/// Serial link that replays a fixed script of reads and records every
/// command byte. Once the script runs dry every read times out, which is
/// how a dead board behaves.
pub(crate) struct ScriptedLink {
    reads: VecDeque<ScriptedRead>,
    pub(crate) commands: Vec<u8>,
    drop_counter: Option<Arc<AtomicUsize>>,
}

impl ScriptedLink {
    pub(crate) fn new(script: Vec<ScriptedRead>) -> Self {
        Self {
            reads: script.into(),
            commands: Vec::new(),
            drop_counter: None,
        }
    }

    pub(crate) fn with_drop_counter(mut self, counter: Arc<AtomicUsize>) -> Self {
        self.drop_counter = Some(counter);
        self
    }
}

impl DeviceLink for ScriptedLink {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        match self.reads.pop_front() {
            Some(ScriptedRead::Line(line)) => Ok(Some(line)),
            Some(ScriptedRead::Empty) | None => Ok(None),
        }
    }

    fn send_command(&mut self, command: u8) -> io::Result<()> {
        self.commands.push(command);
        Ok(())
    }
}

impl Drop for ScriptedLink {
    fn drop(&mut self) {
        if let Some(counter) = &self.drop_counter {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// In-memory collector socket: serves a queue of pre-framed replies and
/// captures everything written. An exhausted queue reads as a closed
/// connection.
pub(crate) struct ScriptedStream {
    incoming: VecDeque<u8>,
    chunk_limit: usize,
    pub(crate) written: Vec<u8>,
    drop_counter: Option<Arc<AtomicUsize>>,
}

impl ScriptedStream {
    pub(crate) fn new(replies: Vec<Vec<u8>>) -> Self {
        Self::from_bytes(replies.concat())
    }

    pub(crate) fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            incoming: bytes.into(),
            chunk_limit: usize::MAX,
            written: Vec::new(),
            drop_counter: None,
        }
    }

    /// Cap how many bytes a single read() may return, to exercise frame
    /// reassembly across partial reads.
    pub(crate) fn with_chunk_limit(mut self, limit: usize) -> Self {
        self.chunk_limit = limit;
        self
    }

    pub(crate) fn with_drop_counter(mut self, counter: Arc<AtomicUsize>) -> Self {
        self.drop_counter = Some(counter);
        self
    }
}

impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let count = buf.len().min(self.chunk_limit).min(self.incoming.len());
        for slot in buf.iter_mut().take(count) {
            *slot = self.incoming.pop_front().unwrap();
        }
        Ok(count)
    }
}

impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ScriptedStream {
    fn drop(&mut self) {
        if let Some(counter) = &self.drop_counter {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Frame a payload into a fresh Vec, for building scripted replies.
pub(crate) fn framed(payload: &[u8]) -> Vec<u8> {
    let mut buffer = vec![0u8; payload.len() + 2];
    let written = scale_messages::frame_payload(payload, &mut buffer).unwrap();
    buffer.truncate(written);
    buffer
}

/// Split a captured byte stream back into frame payloads.
pub(crate) fn decode_frames(mut bytes: &[u8]) -> Vec<Vec<u8>> {
    let mut payloads = Vec::new();
    while !bytes.is_empty() {
        let (consumed, payload) = scale_messages::decode_frame(bytes).unwrap();
        payloads.push(payload.to_vec());
        bytes = &bytes[consumed..];
    }
    payloads
}

//! In-memory transports for exercising acquisition without hardware.

use crate::serial_transport::{Transport, TransportError, TransportOpener};
use std::collections::{HashSet, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A transport that replays a fixed script of lines.
///
/// Each `read_line` yields the next scripted line followed by `\n`. Once the
/// script runs out every read returns an empty buffer, like a port that has
/// gone quiet until its timeout.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    lines: VecDeque<Vec<u8>>,
    fail_after: Option<usize>,
    reads: usize,
}

impl ScriptedTransport {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        Self {
            lines: lines
                .into_iter()
                .map(|line| {
                    let mut bytes = line.as_ref().to_vec();
                    bytes.push(b'\n');
                    bytes
                })
                .collect(),
            fail_after: None,
            reads: 0,
        }
    }

    /// Make every read after the first `reads` fail with a broken pipe.
    pub fn failing_after(mut self, reads: usize) -> Self {
        self.fail_after = Some(reads);
        self
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl Transport for ScriptedTransport {
    fn read_line(&mut self) -> Result<Vec<u8>, TransportError> {
        if self.fail_after.is_some_and(|limit| self.reads >= limit) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted transport failure").into());
        }
        self.reads += 1;
        Ok(self.lines.pop_front().unwrap_or_default())
    }
}

/// Hands out scripted transports and records how they were opened.
///
/// Ports listed as unavailable fail to open with a `NotFound` I/O error.
#[derive(Debug, Clone, Default)]
pub struct ScriptedOpener {
    script: Vec<String>,
    unavailable: Arc<Mutex<HashSet<String>>>,
    opened: Arc<Mutex<Vec<(String, u32, Duration)>>>,
}

impl ScriptedOpener {
    pub fn new<I, S>(script: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: script.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_unavailable<I, S>(self, ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for port in ports {
            self.set_available(port, false);
        }
        self
    }

    /// Change whether `port` can be opened. Clones of this opener see the change.
    pub fn set_available(&self, port: impl Into<String>, available: bool) {
        if let Ok(mut unavailable) = self.unavailable.lock() {
            let port = port.into();
            if available {
                unavailable.remove(&port);
            } else {
                unavailable.insert(port);
            }
        }
    }

    /// Every `(port, baud_rate, timeout)` that was successfully opened.
    pub fn opened(&self) -> Vec<(String, u32, Duration)> {
        self.opened
            .lock()
            .map(|opened| opened.clone())
            .unwrap_or_default()
    }
}

impl TransportOpener for ScriptedOpener {
    fn open(
        &self,
        port: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<Box<dyn Transport>, TransportError> {
        let is_unavailable = self
            .unavailable
            .lock()
            .map(|unavailable| unavailable.contains(port))
            .unwrap_or(false);
        if is_unavailable {
            return Err(io::Error::new(io::ErrorKind::NotFound, format!("{port} is unavailable")).into());
        }
        if let Ok(mut opened) = self.opened.lock() {
            opened.push((port.to_string(), baud_rate, timeout));
        }
        Ok(Box::new(ScriptedTransport::new(&self.script)))
    }
}

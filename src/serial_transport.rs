use serialport::SerialPort;
use std::fmt;
use std::io::{ErrorKind, Read};
use std::time::{Duration, Instant};

/// Read timeout used when probing or acquiring from a port.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Baud rate used when a port is only opened to check that it exists.
pub const PROBE_BAUD_RATE: u32 = 9600;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A line-oriented connection to a device.
///
/// Dropping the transport releases the underlying handle.
pub trait Transport: Send {
    /// Read bytes up to and including the next `\n`.
    ///
    /// Returns whatever arrived before the read timeout elapsed, which may be
    /// a partial line or nothing at all.
    fn read_line(&mut self) -> Result<Vec<u8>, TransportError>;
}

/// Opens transports by port name.
pub trait TransportOpener {
    fn open(
        &self,
        port: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<Box<dyn Transport>, TransportError>;
}

pub struct SerialTransport {
    serial: Box<dyn SerialPort>,
    timeout: Duration,
}

impl fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialTransport")
            .field("port", &self.serial.name())
            .finish()
    }
}

impl SerialTransport {
    pub fn open(port: &str, baud_rate: u32, timeout: Duration) -> Result<Self, TransportError> {
        let serial = serialport::new(port, baud_rate).timeout(timeout).open()?;
        log::debug!("Opened {} at {} baud", port, baud_rate);
        Ok(Self { serial, timeout })
    }
}

/// Read up to and including the next `\n`, giving up once `timeout` has
/// elapsed since the call started. Bytes that keep arriving without a newline
/// do not extend the deadline.
fn read_line_until(reader: &mut dyn Read, timeout: Duration) -> std::io::Result<Vec<u8>> {
    let mut line = Vec::new();
    let now = Instant::now();

    while now.elapsed() < timeout {
        let mut byte = [0u8; 1];
        match reader.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                line.push(byte[0]);
                if byte[0] == b'\n' {
                    break;
                }
            }
            Err(e) if e.kind() == ErrorKind::TimedOut => break,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }

    Ok(line)
}

impl Transport for SerialTransport {
    fn read_line(&mut self) -> Result<Vec<u8>, TransportError> {
        Ok(read_line_until(&mut self.serial, self.timeout)?)
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        log::debug!(
            "Closing {}",
            self.serial.name().unwrap_or_else(|| "serial port".to_string())
        );
    }
}

/// Opens real serial ports through the `serialport` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialPortOpener;

impl TransportOpener for SerialPortOpener {
    fn open(
        &self,
        port: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<Box<dyn Transport>, TransportError> {
        Ok(Box::new(SerialTransport::open(port, baud_rate, timeout)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_port_fails() {
        let result = SerialPortOpener.open(
            "/dev/this-port-does-not-exist",
            PROBE_BAUD_RATE,
            DEFAULT_READ_TIMEOUT,
        );
        assert!(matches!(result, Err(TransportError::SerialPort(_))));
    }

    /// Yields one non-newline byte every `interval`, forever.
    struct Trickle {
        interval: Duration,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            std::thread::sleep(self.interval);
            buf[0] = b'x';
            Ok(1)
        }
    }

    #[test]
    fn test_trickling_bytes_do_not_extend_line_timeout() {
        let mut reader = Trickle {
            interval: Duration::from_millis(20),
        };
        let start = Instant::now();
        let line = read_line_until(&mut reader, Duration::from_millis(100)).unwrap();

        assert!(start.elapsed() < Duration::from_millis(500));
        assert!(!line.is_empty());
        assert!(line.iter().all(|&b| b == b'x'));
    }

    #[test]
    fn test_read_line_stops_at_newline() {
        let mut reader = std::io::Cursor::new(b"12.5\r\n7\n".to_vec());
        let timeout = Duration::from_secs(1);
        assert_eq!(read_line_until(&mut reader, timeout).unwrap(), b"12.5\r\n");
        assert_eq!(read_line_until(&mut reader, timeout).unwrap(), b"7\n");
        assert!(read_line_until(&mut reader, timeout).unwrap().is_empty());
    }

    #[test]
    fn test_default_timeout_is_a_tenth_of_a_second() {
        assert_eq!(DEFAULT_READ_TIMEOUT, Duration::from_millis(100));
    }
}

//! # Sensor Core RS
//!
//! A Rust library for discovering serial ports and acquiring fixed-shape windows
//! of multi-channel numeric data from line-oriented serial devices.
//!
//! Devices are expected to print one reading per line, timepoint by timepoint
//! and channel by channel. Each acquisition reads one window of
//! `window_size * num_channels` lines, assembles it into a timepoint-by-channel
//! matrix and validates its shape before handing it back.
//!
//! ## Features
//!
//! - **Port discovery**: Lists candidate device nodes per platform and keeps the ones that open
//! - **Window acquisition**: Tolerates line noise by zeroing undecodable readings
//!   and dropping incomplete rows
//! - **Shape validation**: Short windows are reported as warnings, channel mismatches as errors
//! - **Pluggable decoding**: Swap in your own [`WindowDecoder`] for other framings
//! - **DataFrame output**: Uses `polars` for handing acquired windows to analysis code
//! - **Hardware-free testing**: [`mock_transport`] replays scripted device output
//!
//! ## Examples
//!
//! ### Listing Ports
//!
//! ```rust,no_run
//! use sensor_core_rs::list_available_ports;
//!
//! for port in list_available_ports()? {
//!     println!("Found port: {}", port);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ### Acquiring a Window
//!
//! ```rust,no_run
//! use sensor_core_rs::{AcquisitionConfig, AcquisitionSession};
//!
//! let config = AcquisitionConfig::builder("/dev/ttyUSB0", 115_200)
//!     .num_channels(2)
//!     .window_size(100)
//!     .build()?;
//!
//! let mut session = AcquisitionSession::new(config);
//! session.open()?;
//!
//! match session.acquire(None)? {
//!     Some(window) => println!("Acquired {:?} window", window.shape()),
//!     None => println!("No valid rows in this window"),
//! }
//!
//! session.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ### Custom Decoding
//!
//! ```rust
//! use sensor_core_rs::mock_transport::ScriptedOpener;
//! use sensor_core_rs::{
//!     AcquisitionConfig, AcquisitionSession, ChannelMatrix, DecodeError, FnDecoder, Transport,
//! };
//!
//! let config = AcquisitionConfig::builder("COM3", 9600)
//!     .num_channels(3)
//!     .window_size(1)
//!     .build()?;
//! let mut session = AcquisitionSession::with_opener(config, ScriptedOpener::new(["4;5;6"]));
//! session.open()?;
//!
//! let mut csv_line = FnDecoder::new("semicolon_line", |t: &mut dyn Transport| {
//!     let line = String::from_utf8(t.read_line()?)?;
//!     let values = line
//!         .trim()
//!         .split(';')
//!         .map(str::parse)
//!         .collect::<Result<Vec<f64>, _>>()?;
//!     Ok::<_, DecodeError>(ChannelMatrix::from_flat(values, 3)?)
//! });
//!
//! let window = session.acquire(Some(&mut csv_line))?.unwrap();
//! assert_eq!(window.into_rows(), vec![vec![4.0, 5.0, 6.0]]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod acquisition_config;
pub mod acquisition_session;
pub mod channel_matrix;
pub mod mock_transport;
pub mod port_enumerator;
pub mod serial_transport;
pub mod window_decoder;

// Re-export the main types for convenience
pub use acquisition_config::{AcquisitionConfig, AcquisitionConfigBuilder, ConfigError};

pub use acquisition_session::{AcquisitionError, AcquisitionSession, SessionState, ShapeWarning};

pub use channel_matrix::{ChannelMatrix, MatrixError};

pub use port_enumerator::{
    list_available_ports, list_available_ports_for, AvailablePorts, CandidateSource, ComPortRange,
    DeviceNodeScan, Platform, PortEnumerator, PortEnumeratorError,
};

pub use serial_transport::{
    SerialPortOpener, SerialTransport, Transport, TransportError, TransportOpener,
};

pub use window_decoder::{DecodeError, FnDecoder, LineDecoder, WindowDecoder};

use crate::acquisition_config::AcquisitionConfig;
use crate::channel_matrix::{ChannelMatrix, MatrixError};
use crate::serial_transport::{SerialPortOpener, Transport, TransportError, TransportOpener};
use crate::window_decoder::{DecodeError, LineDecoder, WindowDecoder, WindowReadError};
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError {
    #[error("Error setting up serial port {port}: {source}")]
    TransportOpen {
        port: String,
        #[source]
        source: TransportError,
    },

    #[error("Serial port must be opened before acquiring data")]
    NotOpen,

    #[error(
        "Acquired data must have {expected} channels, one per column, but has {actual} columns"
    )]
    ChannelMismatch { expected: usize, actual: usize },

    #[error("Malformed acquisition: {0}")]
    MalformedAcquisition(#[from] MatrixError),

    #[error("Custom decoder '{decoder}' failed: {source}")]
    CustomDecode {
        decoder: String,
        #[source]
        source: DecodeError,
    },

    #[error("End-of-line framing with {eol:?} is not supported by the line decoder")]
    UnsupportedEol { eol: String },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl From<WindowReadError> for AcquisitionError {
    fn from(e: WindowReadError) -> Self {
        match e {
            WindowReadError::Transport(e) => Self::Transport(e),
            WindowReadError::Matrix(e) => Self::MalformedAcquisition(e),
        }
    }
}

/// Fewer timepoints survived than the window asked for.
///
/// Expected whenever rows are dropped by the zero filter, so it is reported
/// rather than raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeWarning {
    pub expected_rows: usize,
    pub actual_rows: usize,
}

impl fmt::Display for ShapeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "number of rows in serial data should be {}, acquired serial data has {}",
            self.expected_rows, self.actual_rows
        )
    }
}

/// Lifecycle of the session's transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Configured,
    Open,
    Closed,
}

/// Acquires fixed-shape windows of channel data from one serial port.
///
/// The session exclusively owns its transport between `open` and `close`;
/// dropping the session releases it as well.
pub struct AcquisitionSession<O = SerialPortOpener> {
    config: AcquisitionConfig,
    opener: O,
    transport: Option<Box<dyn Transport>>,
    state: SessionState,
    last_warning: Option<ShapeWarning>,
}

impl AcquisitionSession<SerialPortOpener> {
    pub fn new(config: AcquisitionConfig) -> Self {
        Self::with_opener(config, SerialPortOpener)
    }
}

impl<O: TransportOpener> AcquisitionSession<O> {
    /// Create a session that opens its transport through `opener`.
    pub fn with_opener(config: AcquisitionConfig, opener: O) -> Self {
        Self {
            config,
            opener,
            transport: None,
            state: SessionState::Configured,
            last_warning: None,
        }
    }

    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Shape warning raised by the most recent `acquire`, if any.
    pub fn last_warning(&self) -> Option<ShapeWarning> {
        self.last_warning
    }

    /// Open the configured port. An already open transport is closed first.
    pub fn open(&mut self) -> Result<(), AcquisitionError> {
        let reopening = self.transport.take().is_some();
        if reopening {
            log::debug!("Reopening {}", self.config.port());
        }

        match self.opener.open(
            self.config.port(),
            self.config.baud_rate(),
            self.config.read_timeout(),
        ) {
            Ok(transport) => {
                self.transport = Some(transport);
                self.state = SessionState::Open;
                log::debug!(
                    "Session open on {} at {} baud",
                    self.config.port(),
                    self.config.baud_rate()
                );
                Ok(())
            }
            Err(source) => {
                if reopening {
                    self.state = SessionState::Closed;
                }
                Err(AcquisitionError::TransportOpen {
                    port: self.config.port().to_string(),
                    source,
                })
            }
        }
    }

    /// Release the transport.
    pub fn close(&mut self) -> Result<(), AcquisitionError> {
        match self.transport.take() {
            Some(transport) => {
                drop(transport);
                self.state = SessionState::Closed;
                log::debug!("Session closed on {}", self.config.port());
                Ok(())
            }
            None => Err(AcquisitionError::NotOpen),
        }
    }

    /// Acquire one window of data.
    ///
    /// With no decoder, reads one value per line for every cell of the window
    /// and drops rows holding a zero. Returns `Ok(None)` when no rows remain.
    /// A row count below `window_size` is logged and kept in
    /// [`last_warning`](Self::last_warning); a column count other than
    /// `num_channels` is an error.
    #[tracing::instrument(level = "debug", skip_all, fields(port = %self.config.port()))]
    pub fn acquire(
        &mut self,
        decoder: Option<&mut dyn WindowDecoder>,
    ) -> Result<Option<ChannelMatrix>, AcquisitionError> {
        self.last_warning = None;

        let transport = self
            .transport
            .as_deref_mut()
            .ok_or(AcquisitionError::NotOpen)?;

        let matrix = match decoder {
            Some(decoder) => {
                decoder
                    .decode(transport)
                    .map_err(|source| AcquisitionError::CustomDecode {
                        decoder: decoder.name().to_string(),
                        source,
                    })?
            }
            None => {
                if let Some(eol) = self.config.eol() {
                    return Err(AcquisitionError::UnsupportedEol {
                        eol: eol.to_string(),
                    });
                }
                let window =
                    LineDecoder::new(self.config.window_size(), self.config.num_channels())
                        .read_window(transport)?;
                log::debug!(
                    "Decoded window from {}: {} undecodable cell(s), {} row(s) discarded",
                    self.config.port(),
                    window.undecodable_cells,
                    window.discarded_rows
                );
                window.matrix
            }
        };

        self.last_warning = self.check_shape(&matrix)?;

        if matrix.is_empty() {
            Ok(None)
        } else {
            Ok(Some(matrix))
        }
    }

    /// Compare a decoded matrix against the configured window shape.
    ///
    /// Too few rows is a warning; the wrong number of columns is an error.
    pub fn check_shape(
        &self,
        matrix: &ChannelMatrix,
    ) -> Result<Option<ShapeWarning>, AcquisitionError> {
        let warning = (matrix.rows() != self.config.window_size()).then(|| ShapeWarning {
            expected_rows: self.config.window_size(),
            actual_rows: matrix.rows(),
        });
        if let Some(warning) = warning {
            log::warn!("{}", warning);
        }

        if matrix.columns() != self.config.num_channels() {
            return Err(AcquisitionError::ChannelMismatch {
                expected: self.config.num_channels(),
                actual: matrix.columns(),
            });
        }

        Ok(warning)
    }
}

impl<O> fmt::Debug for AcquisitionSession<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcquisitionSession")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("last_warning", &self.last_warning)
            .finish_non_exhaustive()
    }
}

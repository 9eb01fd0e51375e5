use crate::serial_transport::DEFAULT_READ_TIMEOUT;
use std::time::Duration;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Number of channels must be at least 1")]
    NoChannels,

    #[error("Window size must be at least 1 timepoint")]
    EmptyWindow,
}

/// Shape and connection settings for an acquisition session.
///
/// Every window acquired by a session is expected to be
/// `window_size` rows by `num_channels` columns.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionConfig {
    port: String,
    baud_rate: u32,
    num_channels: usize,
    window_size: usize,
    eol: Option<String>,
    read_timeout: Duration,
}

impl AcquisitionConfig {
    pub fn builder(port: impl Into<String>, baud_rate: u32) -> AcquisitionConfigBuilder {
        AcquisitionConfigBuilder {
            port: port.into(),
            baud_rate,
            num_channels: 1,
            window_size: 1,
            eol: None,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// End-of-line token separating timepoints, if the device frames them.
    pub fn eol(&self) -> Option<&str> {
        self.eol.as_deref()
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }
}

#[derive(Debug, Clone)]
pub struct AcquisitionConfigBuilder {
    port: String,
    baud_rate: u32,
    num_channels: usize,
    window_size: usize,
    eol: Option<String>,
    read_timeout: Duration,
}

impl AcquisitionConfigBuilder {
    pub fn num_channels(mut self, num_channels: usize) -> Self {
        self.num_channels = num_channels;
        self
    }

    pub fn window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn eol(mut self, eol: impl Into<String>) -> Self {
        self.eol = Some(eol.into());
        self
    }

    /// Upper bound on how long a single line read may block.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<AcquisitionConfig, ConfigError> {
        if self.num_channels == 0 {
            return Err(ConfigError::NoChannels);
        }
        if self.window_size == 0 {
            return Err(ConfigError::EmptyWindow);
        }

        Ok(AcquisitionConfig {
            port: self.port,
            baud_rate: self.baud_rate,
            num_channels: self.num_channels,
            window_size: self.window_size,
            eol: self.eol,
            read_timeout: self.read_timeout,
        })
    }
}

use crate::channel_matrix::{ChannelMatrix, MatrixError};
use crate::serial_transport::{Transport, TransportError};

/// Error type returned by custom decoders.
pub type DecodeError = Box<dyn std::error::Error + Send + Sync>;

/// Turns raw transport input into one window of channel data.
///
/// Implement this to replace the default one-value-per-line decoding.
pub trait WindowDecoder {
    fn decode(&mut self, transport: &mut dyn Transport) -> Result<ChannelMatrix, DecodeError>;

    /// Name used when reporting a failed decode.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Adapts a closure into a named [`WindowDecoder`].
pub struct FnDecoder<F> {
    name: String,
    func: F,
}

impl<F> FnDecoder<F>
where
    F: FnMut(&mut dyn Transport) -> Result<ChannelMatrix, DecodeError>,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> WindowDecoder for FnDecoder<F>
where
    F: FnMut(&mut dyn Transport) -> Result<ChannelMatrix, DecodeError>,
{
    fn decode(&mut self, transport: &mut dyn Transport) -> Result<ChannelMatrix, DecodeError> {
        (self.func)(transport)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Reads one value per line, timepoint by timepoint, channel by channel.
///
/// Lines that are empty, not UTF-8 or not a number leave their cell at zero.
/// Any row holding a zero is then dropped, so a real reading of `0` is
/// indistinguishable from a failed read and is discarded too.
#[derive(Debug, Clone, Copy)]
pub struct LineDecoder {
    window_size: usize,
    num_channels: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum WindowReadError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Matrix error: {0}")]
    Matrix(#[from] MatrixError),
}

/// What [`LineDecoder::read_window`] produced.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedWindow {
    pub matrix: ChannelMatrix,
    /// Cells whose line could not be parsed.
    pub undecodable_cells: usize,
    /// Rows dropped because they held a zero.
    pub discarded_rows: usize,
}

impl LineDecoder {
    pub fn new(window_size: usize, num_channels: usize) -> Self {
        Self {
            window_size,
            num_channels,
        }
    }

    /// Parse one line into a sample, or `None` if it is not a number.
    pub fn parse_sample(line: &[u8]) -> Option<f64> {
        std::str::from_utf8(line).ok()?.trim().parse().ok()
    }

    /// Read `window_size * num_channels` lines and keep the all-nonzero rows.
    ///
    /// Hard transport failures are returned as errors; decode failures are
    /// counted in the result.
    pub fn read_window(
        &self,
        transport: &mut dyn Transport,
    ) -> Result<DecodedWindow, WindowReadError> {
        #[cfg(feature = "cpu-profiling")]
        let _zone = tracy_client::Client::running()
            .map(|client| client.span(tracy_client::span_location!("read_window"), 0));

        let mut cells = vec![0.0_f64; self.window_size * self.num_channels];
        let mut undecodable_cells = 0;

        for cell in cells.iter_mut() {
            let line = transport.read_line()?;
            match Self::parse_sample(&line) {
                Some(value) => *cell = value,
                None => undecodable_cells += 1,
            }
        }

        let (flat, discarded_rows) = self.filter_zero_rows(&cells);
        if discarded_rows > 0 {
            log::debug!(
                "Discarded {} of {} rows containing zeros",
                discarded_rows,
                self.window_size
            );
        }

        Ok(DecodedWindow {
            matrix: ChannelMatrix::from_flat(flat, self.num_channels)?,
            undecodable_cells,
            discarded_rows,
        })
    }

    /// Concatenate the rows of `cells` that contain no zero.
    fn filter_zero_rows(&self, cells: &[f64]) -> (Vec<f64>, usize) {
        let mut flat = Vec::with_capacity(cells.len());
        let mut discarded = 0;

        for row in cells.chunks(self.num_channels) {
            if row.iter().any(|&v| v == 0.0) {
                discarded += 1;
            } else {
                flat.extend_from_slice(row);
            }
        }

        (flat, discarded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_transport::ScriptedTransport;

    #[test]
    fn test_parse_sample() {
        assert_eq!(LineDecoder::parse_sample(b" 12.5\r\n"), Some(12.5));
        assert_eq!(LineDecoder::parse_sample(b"-3\n"), Some(-3.0));
        assert_eq!(LineDecoder::parse_sample(b""), None);
        assert_eq!(LineDecoder::parse_sample(b"garbage\n"), None);
        assert_eq!(LineDecoder::parse_sample(&[0xff, 0xfe, b'\n']), None);
    }

    #[test]
    fn test_well_formed_window() {
        let mut transport = ScriptedTransport::new(["1", "2", "3", "4", "5", "6"]);
        let window = LineDecoder::new(3, 2)
            .read_window(&mut transport)
            .unwrap();
        assert_eq!(
            window.matrix.into_rows(),
            vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]
        );
        assert_eq!(window.undecodable_cells, 0);
        assert_eq!(window.discarded_rows, 0);
    }

    #[test]
    fn test_rows_with_zero_are_dropped() {
        let mut transport = ScriptedTransport::new(["1", "0", "3", "4", "5", "oops"]);
        let window = LineDecoder::new(3, 2)
            .read_window(&mut transport)
            .unwrap();
        assert_eq!(window.matrix.into_rows(), vec![vec![3.0, 4.0]]);
        assert_eq!(window.undecodable_cells, 1);
        assert_eq!(window.discarded_rows, 2);
    }

    #[test]
    fn test_silent_transport_yields_empty_matrix() {
        let mut transport = ScriptedTransport::new(Vec::<&str>::new());
        let window = LineDecoder::new(4, 3)
            .read_window(&mut transport)
            .unwrap();
        assert!(window.matrix.is_empty());
        assert_eq!(window.matrix.columns(), 3);
        assert_eq!(window.undecodable_cells, 12);
        assert_eq!(window.discarded_rows, 4);
    }

    #[test]
    fn test_reads_exactly_one_window_of_lines() {
        let mut transport = ScriptedTransport::new(["1", "2", "3", "4", "5"]);
        LineDecoder::new(2, 2)
            .read_window(&mut transport)
            .unwrap();
        assert_eq!(transport.remaining(), 1);
    }

    #[test]
    fn test_transport_failure_is_propagated() {
        let mut transport = ScriptedTransport::new(["1", "2", "3"]).failing_after(2);
        assert!(matches!(
            LineDecoder::new(2, 2).read_window(&mut transport),
            Err(WindowReadError::Transport(_))
        ));
    }

    #[test]
    fn test_fn_decoder_reports_its_name() {
        let mut decoder = FnDecoder::new("two_by_one", |_t: &mut dyn Transport| {
            ChannelMatrix::from_rows([[1.0], [2.0]]).map_err(Into::into)
        });
        let mut transport = ScriptedTransport::default();
        assert_eq!(decoder.name(), "two_by_one");
        assert_eq!(decoder.decode(&mut transport).unwrap().shape(), (2, 1));
    }
}

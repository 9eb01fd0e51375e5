use crate::serial_transport::{
    SerialPortOpener, TransportOpener, DEFAULT_READ_TIMEOUT, PROBE_BAUD_RATE,
};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PortEnumeratorError {
    #[error("Unsupported platform: {platform}")]
    UnsupportedPlatform { platform: String },
}

/// Host platform families with a known serial device naming scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
    Darwin,
}

impl Platform {
    /// Recognise a platform identifier such as `linux`, `win32`, `cygwin`,
    /// `darwin` or Rust's `macos`.
    pub fn from_identifier(identifier: &str) -> Result<Self, PortEnumeratorError> {
        let id = identifier.to_ascii_lowercase();
        if id.starts_with("win") {
            Ok(Self::Windows)
        } else if id.starts_with("linux") || id.starts_with("cygwin") {
            Ok(Self::Linux)
        } else if id.starts_with("darwin") || id.starts_with("macos") {
            Ok(Self::Darwin)
        } else {
            Err(PortEnumeratorError::UnsupportedPlatform {
                platform: identifier.to_string(),
            })
        }
    }

    /// The platform this binary runs on.
    pub fn current() -> Result<Self, PortEnumeratorError> {
        Self::from_identifier(std::env::consts::OS)
    }

    /// Candidate source matching this platform's device naming.
    pub fn candidate_source(self) -> Box<dyn CandidateSource> {
        match self {
            Self::Windows => Box::new(ComPortRange::default()),
            Self::Linux => Box::new(DeviceNodeScan::linux()),
            Self::Darwin => Box::new(DeviceNodeScan::darwin()),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Darwin => "darwin",
        };
        f.write_str(name)
    }
}

/// Produces device identifiers that might be serial ports.
pub trait CandidateSource {
    fn candidate_paths(&self) -> Vec<String>;
}

/// `COM1` through `COM<count>`.
#[derive(Debug, Clone, Copy)]
pub struct ComPortRange {
    count: u16,
}

impl Default for ComPortRange {
    fn default() -> Self {
        Self { count: 256 }
    }
}

impl CandidateSource for ComPortRange {
    fn candidate_paths(&self) -> Vec<String> {
        (1..=self.count).map(|i| format!("COM{i}")).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodePattern {
    /// `tty[A-Za-z]*`, which leaves out the controlling terminal `tty`.
    TtyAlpha,
    /// `tty.*`
    TtyDot,
}

impl NodePattern {
    fn matches(self, name: &str) -> bool {
        match self {
            Self::TtyAlpha => name
                .strip_prefix("tty")
                .and_then(|rest| rest.chars().next())
                .is_some_and(|c| c.is_ascii_alphabetic()),
            Self::TtyDot => name.starts_with("tty."),
        }
    }
}

/// Scans a device directory for node names matching a platform pattern.
#[derive(Debug, Clone)]
pub struct DeviceNodeScan {
    dir: PathBuf,
    pattern: NodePattern,
}

impl DeviceNodeScan {
    pub fn linux() -> Self {
        Self {
            dir: PathBuf::from("/dev"),
            pattern: NodePattern::TtyAlpha,
        }
    }

    pub fn darwin() -> Self {
        Self {
            dir: PathBuf::from("/dev"),
            pattern: NodePattern::TtyDot,
        }
    }

    /// Scan `dir` instead of `/dev`.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }
}

impl CandidateSource for DeviceNodeScan {
    fn candidate_paths(&self) -> Vec<String> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Cannot list {}: {}", self.dir.display(), e);
                return Vec::new();
            }
        };

        let mut paths: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| self.pattern.matches(name))
            })
            .map(|entry| entry.path().to_string_lossy().into_owned())
            .collect();
        paths.sort();
        paths
    }
}

/// Ports reported by the operating system through `serialport::available_ports`.
///
/// Unlike the naming-scheme sources this finds devices with unusual names,
/// but it depends on the platform's enumeration support.
#[derive(Debug, Default, Clone, Copy)]
pub struct AvailablePorts;

impl CandidateSource for AvailablePorts {
    fn candidate_paths(&self) -> Vec<String> {
        match serialport::available_ports() {
            Ok(ports) => ports.into_iter().map(|port| port.port_name).collect(),
            Err(e) => {
                log::warn!("Cannot enumerate serial ports: {}", e);
                Vec::new()
            }
        }
    }
}

/// Finds serial ports that can currently be opened.
///
/// Probing opens and immediately closes every candidate, so devices that
/// reset on open will notice.
pub struct PortEnumerator<C, O = SerialPortOpener> {
    source: C,
    opener: O,
}

impl PortEnumerator<Box<dyn CandidateSource>, SerialPortOpener> {
    /// Enumerator for the platform this binary runs on.
    pub fn for_current_platform() -> Result<Self, PortEnumeratorError> {
        Ok(Self::for_platform(Platform::current()?))
    }

    pub fn for_platform(platform: Platform) -> Self {
        log::debug!("Enumerating serial ports for {}", platform);
        Self::new(platform.candidate_source(), SerialPortOpener)
    }
}

impl<C: CandidateSource, O: TransportOpener> PortEnumerator<C, O> {
    pub fn new(source: C, opener: O) -> Self {
        Self { source, opener }
    }

    /// Candidates that opened successfully, in candidate order.
    pub fn list_available_ports(&self) -> Vec<String> {
        self.source
            .candidate_paths()
            .into_iter()
            .filter(|port| {
                match self
                    .opener
                    .open(port, PROBE_BAUD_RATE, DEFAULT_READ_TIMEOUT)
                {
                    Ok(_transport) => true,
                    Err(e) => {
                        log::debug!("Skipping {}: {}", port, e);
                        false
                    }
                }
            })
            .collect()
    }
}

impl<C: CandidateSource + ?Sized> CandidateSource for Box<C> {
    fn candidate_paths(&self) -> Vec<String> {
        (**self).candidate_paths()
    }
}

/// List the serial ports on this host that can be opened right now.
pub fn list_available_ports() -> Result<Vec<String>, PortEnumeratorError> {
    Ok(PortEnumerator::for_current_platform()?.list_available_ports())
}

/// Same as [`list_available_ports`] for an explicit platform identifier.
pub fn list_available_ports_for(platform: &str) -> Result<Vec<String>, PortEnumeratorError> {
    Ok(PortEnumerator::for_platform(Platform::from_identifier(platform)?).list_available_ports())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_transport::ScriptedOpener;
    use std::collections::HashSet;

    struct FixedCandidates(Vec<&'static str>);

    impl CandidateSource for FixedCandidates {
        fn candidate_paths(&self) -> Vec<String> {
            self.0.iter().map(|s| s.to_string()).collect()
        }
    }

    #[test]
    fn test_platform_identifiers() {
        assert_eq!(Platform::from_identifier("win32").unwrap(), Platform::Windows);
        assert_eq!(Platform::from_identifier("windows").unwrap(), Platform::Windows);
        assert_eq!(Platform::from_identifier("linux").unwrap(), Platform::Linux);
        assert_eq!(Platform::from_identifier("cygwin").unwrap(), Platform::Linux);
        assert_eq!(Platform::from_identifier("darwin").unwrap(), Platform::Darwin);
        assert_eq!(Platform::from_identifier("macos").unwrap(), Platform::Darwin);
    }

    #[test]
    fn test_unrecognized_platform_is_rejected() {
        match list_available_ports_for("haiku") {
            Err(PortEnumeratorError::UnsupportedPlatform { platform }) => {
                assert_eq!(platform, "haiku");
            }
            other => panic!("Expected UnsupportedPlatform, got {:?}", other),
        }
    }

    #[test]
    fn test_com_port_range() {
        let ports = ComPortRange::default().candidate_paths();
        assert_eq!(ports.len(), 256);
        assert_eq!(ports.first().map(String::as_str), Some("COM1"));
        assert_eq!(ports.last().map(String::as_str), Some("COM256"));
    }

    #[test]
    fn test_node_patterns() {
        assert!(NodePattern::TtyAlpha.matches("ttyUSB0"));
        assert!(NodePattern::TtyAlpha.matches("ttyS0"));
        assert!(!NodePattern::TtyAlpha.matches("tty"));
        assert!(!NodePattern::TtyAlpha.matches("tty0"));
        assert!(!NodePattern::TtyAlpha.matches("null"));
        assert!(NodePattern::TtyDot.matches("tty.usbserial-1410"));
        assert!(!NodePattern::TtyDot.matches("ttys000"));
    }

    #[test]
    fn test_device_node_scan_in_dir() {
        let dir = std::env::temp_dir().join(format!("sensor-core-scan-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["ttyUSB0", "ttyACM1", "tty", "tty1", "random"] {
            std::fs::write(dir.join(name), b"").unwrap();
        }

        let found = DeviceNodeScan::linux().in_dir(&dir).candidate_paths();
        let _ = std::fs::remove_dir_all(&dir);

        let expected = vec![
            dir.join("ttyACM1").to_string_lossy().into_owned(),
            dir.join("ttyUSB0").to_string_lossy().into_owned(),
        ];
        assert_eq!(found, expected);
    }

    #[test]
    fn test_missing_device_dir_yields_no_candidates() {
        let scan = DeviceNodeScan::linux().in_dir("/this/dir/does/not/exist");
        assert!(scan.candidate_paths().is_empty());
    }

    #[test]
    fn test_available_ports_source_feeds_enumerator() {
        // Host dependent; every reported port name must reach the opener unchanged.
        let reported = AvailablePorts.candidate_paths();
        let opener = ScriptedOpener::default();
        let enumerator = PortEnumerator::new(AvailablePorts, opener.clone());

        let listed = enumerator.list_available_ports();
        let opened: Vec<String> = opener.opened().into_iter().map(|(port, _, _)| port).collect();
        assert_eq!(listed, opened);
        for port in &listed {
            assert!(!port.is_empty());
            assert!(reported.contains(port));
        }
    }

    #[test]
    fn test_unopenable_candidates_are_filtered() {
        let enumerator = PortEnumerator::new(
            FixedCandidates(vec!["/dev/ttyUSB0", "/dev/ttyBUSY", "/dev/ttyACM0"]),
            ScriptedOpener::default().with_unavailable(["/dev/ttyBUSY"]),
        );
        assert_eq!(
            enumerator.list_available_ports(),
            vec!["/dev/ttyUSB0".to_string(), "/dev/ttyACM0".to_string()]
        );
    }

    #[test]
    fn test_enumeration_is_repeatable() {
        let enumerator = PortEnumerator::new(
            FixedCandidates(vec!["COM1", "COM2", "COM3"]),
            ScriptedOpener::default().with_unavailable(["COM2"]),
        );
        let first: HashSet<String> = enumerator.list_available_ports().into_iter().collect();
        let second: HashSet<String> = enumerator.list_available_ports().into_iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_probe_uses_short_timeout() {
        let opener = ScriptedOpener::default();
        let enumerator = PortEnumerator::new(FixedCandidates(vec!["COM7"]), opener.clone());
        enumerator.list_available_ports();
        assert_eq!(
            opener.opened(),
            vec![("COM7".to_string(), PROBE_BAUD_RATE, DEFAULT_READ_TIMEOUT)]
        );
    }

    #[test]
    fn test_current_platform_enumeration() {
        // Depends on the host; only checks that a supported host does not error.
        match list_available_ports() {
            Ok(ports) => {
                for port in ports {
                    assert!(!port.is_empty());
                }
            }
            Err(PortEnumeratorError::UnsupportedPlatform { .. }) => {}
        }
    }
}

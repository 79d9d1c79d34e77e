//! Static peer set loaded once at startup.

use std::path::Path;

use tracing::info;

use crate::error::Result;

/// One cooperating node's address.
///
/// A bare host or IP inherits the exchange's own port, which is the common
/// deployment: every node listens on the same port. An explicit `host:port`
/// entry overrides it so that several nodes can share a machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    host: String,
    port: Option<u16>,
}

impl Peer {
    fn parse(line: &str) -> Self {
        // Bare IPv6 addresses keep their colons; only a single-colon suffix
        // with a valid port is treated as host:port.
        if let Some((host, port)) = line.rsplit_once(':') {
            if !host.contains(':') {
                if let Ok(port) = port.parse() {
                    return Self {
                        host: host.to_string(),
                        port: Some(port),
                    };
                }
            }
        }

        Self {
            host: line.to_string(),
            port: None,
        }
    }

    /// The address to send to, with `default_port` applied when the entry
    /// did not name one.
    pub fn endpoint(&self, default_port: u16) -> (&str, u16) {
        (&self.host, self.port.unwrap_or(default_port))
    }
}

impl std::fmt::Display for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{}", self.host, port),
            None => write!(f, "{}", self.host),
        }
    }
}

/// The immutable list of peer nodes, fixed for the process lifetime.
#[derive(Debug, Clone, Default)]
pub struct PeerSet {
    peers: Vec<Peer>,
}

impl PeerSet {
    /// Load peers from a plain-text file, one host or `host:port` per line.
    ///
    /// Blank lines are ignored. A missing or unreadable file is fatal to
    /// startup.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let set = Self::from_lines(&contents);

        info!(path = %path.display(), peers = set.len(), "loaded peer set");
        Ok(set)
    }

    /// Parse peers from newline-separated text.
    pub fn from_lines(contents: &str) -> Self {
        let peers = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(Peer::parse)
            .collect();

        Self { peers }
    }

    /// Number of configured peers.
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Whether the node has any peers at all.
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Iterate over the peers.
    pub fn iter(&self) -> impl Iterator<Item = &Peer> {
        self.peers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines_and_whitespace_are_ignored() {
        let set = PeerSet::from_lines("10.0.0.1\n\n  10.0.0.2  \n\n");

        assert_eq!(set.len(), 2);
        let hosts: Vec<_> = set.iter().map(|p| p.endpoint(12033)).collect();
        assert_eq!(hosts, vec![("10.0.0.1", 12033), ("10.0.0.2", 12033)]);
    }

    #[test]
    fn test_explicit_port_overrides_default() {
        let set = PeerSet::from_lines("10.0.0.1:13000\nthrottle-2.internal");

        let endpoints: Vec<_> = set.iter().map(|p| p.endpoint(12033)).collect();
        assert_eq!(
            endpoints,
            vec![("10.0.0.1", 13000), ("throttle-2.internal", 12033)]
        );
    }

    #[test]
    fn test_bare_ipv6_address_is_kept_whole() {
        let set = PeerSet::from_lines("::1");

        let endpoints: Vec<_> = set.iter().map(|p| p.endpoint(12033)).collect();
        assert_eq!(endpoints, vec![("::1", 12033)]);
    }

    #[test]
    fn test_empty_input_yields_empty_set() {
        assert!(PeerSet::from_lines("").is_empty());
        assert!(PeerSet::from_lines("\n\n").is_empty());
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join("globethrottle-peers-test.txt");
        std::fs::write(&path, "127.0.0.1\n\n127.0.0.2:13044\n").unwrap();

        let set = PeerSet::from_file(&path).unwrap();
        assert_eq!(set.len(), 2);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(PeerSet::from_file("/nonexistent/nodes.txt").is_err());
    }

    #[test]
    fn test_peer_display() {
        let set = PeerSet::from_lines("10.0.0.1:13000\n10.0.0.2");
        let printed: Vec<_> = set.iter().map(|p| p.to_string()).collect();
        assert_eq!(printed, vec!["10.0.0.1:13000", "10.0.0.2"]);
    }
}

//! Classification of enroot diagnostic output
//!
//! enroot reports progress and errors on stderr. A probe only needs the
//! first decisive line: progress (or a layer-cache hit) proves the
//! reference is reachable, an `[ERROR]` line proves it is not.

use serde::Serialize;
use std::fmt;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

const PROGRESS_MARKER: &str = "Downloading";
const LAYER_CACHE_MARKER: &str = "Found all layers in cache";
const ERROR_MARKER: &str = "[ERROR]";
const UNAUTHORIZED_MARKER: &str = "401 Unauthorized";

/// Outcome of a dry-run import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeVerdict {
    /// Transfer started or layers were already cached
    Accessible,
    /// Registry rejected the credentials
    Unauthorized,
    /// Any other error reported by the tool
    Inaccessible,
    /// Process ended (or timed out) without a decisive line
    Unknown,
}

impl ProbeVerdict {
    pub fn is_accessible(&self) -> bool {
        matches!(self, Self::Accessible)
    }
}

impl fmt::Display for ProbeVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accessible => write!(f, "accessible"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::Inaccessible => write!(f, "inaccessible"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Classify a single diagnostic line, `None` if it decides nothing
pub fn classify_line(line: &str) -> Option<ProbeVerdict> {
    if line.contains(PROGRESS_MARKER) || line.contains(LAYER_CACHE_MARKER) {
        return Some(ProbeVerdict::Accessible);
    }
    if line.contains(ERROR_MARKER) {
        if line.contains(UNAUTHORIZED_MARKER) {
            return Some(ProbeVerdict::Unauthorized);
        }
        return Some(ProbeVerdict::Inaccessible);
    }
    None
}

/// Read `stream` line by line until a decisive line appears.
///
/// Returns the verdict with the line that produced it, or `None` once
/// the stream ends (or fails) without one. Invalid UTF-8 is decoded
/// lossily so binary noise cannot abort the watch.
pub async fn watch_stream<R>(stream: R) -> Option<(ProbeVerdict, String)>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) | Err(_) => return None,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end();
                if let Some(verdict) = classify_line(line) {
                    return Some((verdict, line.to_string()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_accessible() {
        assert_eq!(
            classify_line("Downloading layer sha256:4f4fb700ef54..."),
            Some(ProbeVerdict::Accessible)
        );
        assert_eq!(
            classify_line("[INFO] Found all layers in cache"),
            Some(ProbeVerdict::Accessible)
        );
    }

    #[test]
    fn unauthorized_refines_error() {
        assert_eq!(
            classify_line("[ERROR] 401 Unauthorized"),
            Some(ProbeVerdict::Unauthorized)
        );
    }

    #[test]
    fn other_errors_are_inaccessible() {
        assert_eq!(
            classify_line("[ERROR] host not found"),
            Some(ProbeVerdict::Inaccessible)
        );
    }

    #[test]
    fn unauthorized_without_error_marker_is_ignored() {
        assert_eq!(classify_line("retrying after 401 Unauthorized"), None);
        assert_eq!(classify_line("[INFO] Querying registry for permission grant"), None);
    }

    #[tokio::test]
    async fn watch_stops_at_first_decisive_line() {
        let stream: &[u8] = b"[INFO] Querying registry\nDownloading layer ...\n[ERROR] late\n";
        let (verdict, line) = watch_stream(stream).await.unwrap();
        assert_eq!(verdict, ProbeVerdict::Accessible);
        assert_eq!(line, "Downloading layer ...");
    }

    #[tokio::test]
    async fn watch_reports_error_line() {
        let stream: &[u8] = b"[INFO] Querying registry\n[ERROR] host not found\n";
        let (verdict, line) = watch_stream(stream).await.unwrap();
        assert_eq!(verdict, ProbeVerdict::Inaccessible);
        assert_eq!(line, "[ERROR] host not found");
    }

    #[tokio::test]
    async fn watch_without_signal_is_none() {
        let stream: &[u8] = b"[INFO] Querying registry\n[INFO] done\n";
        assert!(watch_stream(stream).await.is_none());
    }

    #[tokio::test]
    async fn watch_tolerates_invalid_utf8() {
        let stream: &[u8] = b"\xff\xfe garbage\n[ERROR] 401 Unauthorized";
        let (verdict, _) = watch_stream(stream).await.unwrap();
        assert_eq!(verdict, ProbeVerdict::Unauthorized);
    }
}

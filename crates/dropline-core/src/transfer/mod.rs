//! Single-file transfer over TCP.
//!
//! ## Handshake
//!
//! ```text
//! sender                          receiver
//!   | ---- "<basename>\n" ----------> |   offer
//!   | <--- "accept\n" | "reject\n" -- |   decision
//!   | ---- raw file bytes ----------> |   only after "accept"
//!   | ---- close -------------------> |   end of file
//! ```
//!
//! There is no length prefix and no checksum: the receiver treats the
//! sender closing the connection as the end of the file.

mod initiator;
mod listener;

pub use initiator::{send_file, SentFile, TransferInitiator};
pub use listener::{ReceivedFile, TransferListener, TransferOffer};

use std::io;
use std::path::{Component, Path};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Response sent by a receiver that accepts an offer.
pub const ACCEPT_TOKEN: &str = "accept";

/// Response sent by a receiver that declines an offer.
pub const REJECT_TOKEN: &str = "reject";

/// Terminates the header line and the response line.
pub const LINE_DELIMITER: u8 = b'\n';

/// Longest header or response line either side will read, delimiter included.
pub const MAX_LINE_LEN: usize = 4096;

/// Outcome of reading one delimited line.
#[derive(Debug, PartialEq, Eq)]
enum Line {
    /// A complete line, delimiter stripped
    Complete(Vec<u8>),
    /// The peer closed the connection before any byte arrived
    Closed,
    /// The peer closed the connection mid-line
    Truncated,
    /// No delimiter within [`MAX_LINE_LEN`] bytes
    TooLong,
}

/// Read a single `\n`-terminated line without consuming anything past it.
async fn read_line<R>(reader: &mut R) -> io::Result<Line>
where
    R: AsyncBufRead + Unpin,
{
    let mut raw = Vec::new();
    let limit = u64::try_from(MAX_LINE_LEN).unwrap_or(u64::MAX);
    let read = reader
        .take(limit)
        .read_until(LINE_DELIMITER, &mut raw)
        .await?;

    Ok(match raw.pop() {
        Some(LINE_DELIMITER) => Line::Complete(raw),
        Some(_) if read >= MAX_LINE_LEN => Line::TooLong,
        Some(_) => Line::Truncated,
        None => Line::Closed,
    })
}

/// Reduce a header line to a bare file name.
///
/// Surrounding whitespace is trimmed and every directory component is
/// dropped, whichever separator the sender's platform uses. Names with a
/// `:` are refused, since a drive prefix (`C:evil.txt`) or an alternate
/// data stream would escape the destination directory on Windows. Returns
/// `None` when nothing usable is left.
#[must_use]
pub fn sanitize_file_name(header: &str) -> Option<String> {
    let trimmed = header.trim().trim_end_matches(['/', '\\']);
    let name = trimmed.rsplit(['/', '\\']).next()?.trim();

    if name.is_empty() || name.contains(['\0', ':']) {
        return None;
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Some(name.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_plain_name() {
        assert_eq!(
            sanitize_file_name("report.txt"),
            Some("report.txt".to_string())
        );
    }

    #[test]
    fn test_sanitize_strips_traversal() {
        assert_eq!(
            sanitize_file_name("../../etc/passwd\n"),
            Some("passwd".to_string())
        );
        assert_eq!(
            sanitize_file_name("/abs/path/notes.md"),
            Some("notes.md".to_string())
        );
        assert_eq!(
            sanitize_file_name("..\\..\\Windows\\win.ini"),
            Some("win.ini".to_string())
        );
    }

    #[test]
    fn test_sanitize_trims_whitespace() {
        assert_eq!(
            sanitize_file_name("  my file.txt \r\n"),
            Some("my file.txt".to_string())
        );
        assert_eq!(sanitize_file_name("photos/"), Some("photos".to_string()));
    }

    #[test]
    fn test_sanitize_rejects_unusable_names() {
        assert_eq!(sanitize_file_name(""), None);
        assert_eq!(sanitize_file_name("   \n"), None);
        assert_eq!(sanitize_file_name("."), None);
        assert_eq!(sanitize_file_name("a/.."), None);
        assert_eq!(sanitize_file_name("/"), None);
        assert_eq!(sanitize_file_name(".."), None);
        assert_eq!(sanitize_file_name("bad\0name"), None);
    }

    #[test]
    fn test_sanitize_rejects_drive_prefixes() {
        assert_eq!(sanitize_file_name("C:evil.txt"), None);
        assert_eq!(sanitize_file_name("C:"), None);
        assert_eq!(sanitize_file_name("report.txt:hidden"), None);
        // The separator is stripped first, leaving a plain name.
        assert_eq!(sanitize_file_name("C:\\x"), Some("x".to_string()));
        assert_eq!(
            sanitize_file_name("D:\\Users\\me\\notes.md"),
            Some("notes.md".to_string())
        );
    }

    #[tokio::test]
    async fn test_read_line_stops_at_delimiter() {
        let mut input: &[u8] = b"report.txt\nhello";
        assert_eq!(
            read_line(&mut input).await.unwrap(),
            Line::Complete(b"report.txt".to_vec())
        );
        assert_eq!(input, b"hello");
    }

    #[tokio::test]
    async fn test_read_line_closed_and_truncated() {
        let mut empty: &[u8] = b"";
        assert_eq!(read_line(&mut empty).await.unwrap(), Line::Closed);

        let mut partial: &[u8] = b"report.t";
        assert_eq!(read_line(&mut partial).await.unwrap(), Line::Truncated);
    }

    #[tokio::test]
    async fn test_read_line_too_long() {
        let long = vec![b'a'; MAX_LINE_LEN + 10];
        let mut input: &[u8] = &long;
        assert_eq!(read_line(&mut input).await.unwrap(), Line::TooLong);
    }
}

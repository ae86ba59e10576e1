//! Directory operations.

use crate::ftp::client::FtpClient;
use crate::ftp::error::FtpResult;

impl FtpClient {
    // ─── MKD ─────────────────────────────────────────────────────

    /// Create a directory on the remote server. Returns the path the server
    /// reports, or `path` when the reply does not quote one.
    pub async fn mkdir(&mut self, path: &str) -> FtpResult<String> {
        let resp = self.codec.expect_ok(&format!("MKD {}", path)).await?;
        Ok(quoted_path(&resp.text()).unwrap_or_else(|| path.to_string()))
    }
}

/// Parse the created path from `257 "/new/dir" created`. Embedded quotes
/// are doubled per RFC 959.
fn quoted_path(text: &str) -> Option<String> {
    let start = text.find('"')? + 1;
    let mut out = String::new();
    let mut chars = text[start..].chars().peekable();
    while let Some(c) = chars.next() {
        if c == '"' {
            if chars.peek() == Some(&'"') {
                chars.next();
                out.push('"');
            } else {
                return Some(out);
            }
        } else {
            out.push(c);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_path() {
        assert_eq!(
            quoted_path("257 \"/out/new\" created").as_deref(),
            Some("/out/new")
        );
        assert_eq!(
            quoted_path("257 \"/out/say \"\"hi\"\"\" created").as_deref(),
            Some("/out/say \"hi\"")
        );
        assert_eq!(quoted_path("257 Directory created"), None);
    }
}

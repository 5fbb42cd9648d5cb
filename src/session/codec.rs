//! JSON-RPC message framing
//!
//! Messages travel as `Content-Length: N\r\n\r\n{json}`. Headers other than
//! `Content-Length` are accepted and ignored.

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::types::{ConnectorError, Result};

const CONTENT_LENGTH: &str = "content-length";

/// Largest message body accepted from a peer
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

/// Read one framed message
///
/// Returns `Ok(None)` on a clean end of stream between messages.
pub async fn read_message<R>(reader: &mut R) -> Result<Option<Value>>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length: Option<usize> = None;
    let mut line = String::new();
    let mut first = true;

    loop {
        line.clear();
        let read = reader.read_line(&mut line).await?;
        if read == 0 {
            if first {
                return Ok(None);
            }
            return Err(ConnectorError::Protocol(
                "stream ended inside message headers".to_string(),
            ));
        }
        first = false;

        let header = line.trim_end_matches(['\r', '\n']);
        if header.is_empty() {
            break;
        }

        let Some((name, value)) = header.split_once(':') else {
            return Err(ConnectorError::Protocol(format!("malformed header: {}", header)));
        };
        if name.trim().eq_ignore_ascii_case(CONTENT_LENGTH) {
            let length = value.trim().parse::<usize>().map_err(|_| {
                ConnectorError::Protocol(format!("invalid Content-Length: {}", value.trim()))
            })?;
            content_length = Some(length);
        }
    }

    let length = content_length
        .ok_or_else(|| ConnectorError::Protocol("missing Content-Length header".to_string()))?;

    if length > MAX_MESSAGE_SIZE {
        return Err(ConnectorError::Protocol(format!(
            "Content-Length {} exceeds the {} byte limit",
            length, MAX_MESSAGE_SIZE
        )));
    }

    let mut body = Vec::new();
    (&mut *reader).take(length as u64).read_to_end(&mut body).await?;
    if body.len() < length {
        return Err(ConnectorError::Protocol(format!(
            "message body shorter than {} bytes",
            length
        )));
    }

    Ok(Some(serde_json::from_slice(&body)?))
}

/// Write one framed message and flush
pub async fn write_message<W>(writer: &mut W, message: &Value) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let body = serde_json::to_string(message)?;
    let frame = format!("Content-Length: {}\r\n\r\n{}", body.len(), body);
    writer.write_all(frame.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn test_write_then_read() {
        let mut buf = Vec::new();
        let message = json!({"jsonrpc": "2.0", "id": 1, "method": "shutdown"});
        write_message(&mut buf, &message).await.unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("Content-Length: "));

        let mut reader = BufReader::new(buf.as_slice());
        assert_eq!(read_message(&mut reader).await.unwrap(), Some(message));
        assert_eq!(read_message(&mut reader).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_extra_headers_ignored() {
        let body = r#"{"jsonrpc":"2.0","method":"exit"}"#;
        let raw = format!(
            "Content-Type: application/vscode-jsonrpc; charset=utf-8\r\ncontent-length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        let mut reader = BufReader::new(raw.as_bytes());
        let message = read_message(&mut reader).await.unwrap().unwrap();
        assert_eq!(message["method"], "exit");
    }

    #[tokio::test]
    async fn test_missing_length() {
        let raw = "Content-Type: application/json\r\n\r\n{}";
        let mut reader = BufReader::new(raw.as_bytes());
        let err = read_message(&mut reader).await.unwrap_err();
        assert!(matches!(err, ConnectorError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_truncated_body() {
        let raw = "Content-Length: 50\r\n\r\n{\"jsonrpc\":\"2.0\"}";
        let mut reader = BufReader::new(raw.as_bytes());
        let err = read_message(&mut reader).await.unwrap_err();
        assert!(err.to_string().contains("shorter than 50"));
    }

    #[tokio::test]
    async fn test_oversized_length_rejected() {
        let raw = "Content-Length: 18446744073709551615\r\n\r\n";
        let mut reader = BufReader::new(raw.as_bytes());
        let err = read_message(&mut reader).await.unwrap_err();
        assert!(matches!(err, ConnectorError::Protocol(_)));

        let just_over = format!("Content-Length: {}\r\n\r\n", MAX_MESSAGE_SIZE + 1);
        let mut reader = BufReader::new(just_over.as_bytes());
        let err = read_message(&mut reader).await.unwrap_err();
        assert!(err.to_string().contains("exceeds"));
    }

    #[tokio::test]
    async fn test_eof_inside_headers() {
        let raw = "Content-Length: 2\r\n";
        let mut reader = BufReader::new(raw.as_bytes());
        assert!(read_message(&mut reader).await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_length() {
        let raw = "Content-Length: lots\r\n\r\n{}";
        let mut reader = BufReader::new(raw.as_bytes());
        let err = read_message(&mut reader).await.unwrap_err();
        assert!(err.to_string().contains("lots"));
    }
}

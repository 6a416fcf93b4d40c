//! Minimal HTTP/1.x framing for the JSON-RPC endpoint
//!
//! Only what a JSON-RPC client needs: a `GET`/`POST` request line, headers,
//! and a `Content-Length` body. Bodies are read exactly so the next request
//! on a keep-alive connection starts at the right byte.

use http::StatusCode;
use std::collections::HashMap;
use std::io;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Default cap on a request body (32 MiB)
pub const MAX_BODY_BYTES: usize = 0x0200_0000;

const MAX_LINE_BYTES: u64 = 16 * 1024;
const MAX_HEADERS: usize = 256;

const UNAUTHORIZED_BODY: &str = "<!DOCTYPE HTML PUBLIC \"-//W3C//DTD HTML 4.01 Transitional//EN\"\r\n\
\"http://www.w3.org/TR/1999/REC-html401-19991224/loose.dtd\">\r\n\
<HTML>\r\n\
<HEAD>\r\n\
<TITLE>Error</TITLE>\r\n\
<META HTTP-EQUIV='Content-Type' CONTENT='text/html; charset=ISO-8859-1'>\r\n\
</HEAD>\r\n\
<BODY><H1>401 Unauthorized.</H1></BODY>\r\n\
</HTML>\r\n";

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("connection closed")]
    Closed,
    #[error("malformed request line")]
    MalformedRequestLine,
    #[error("header line too long")]
    LineTooLong,
    #[error("too many headers")]
    TooManyHeaders,
    #[error("invalid Content-Length")]
    InvalidContentLength,
    #[error("request body too large: {0} bytes")]
    BodyTooLarge(usize),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl HttpError {
    /// Status to answer with before closing, if any
    pub fn reply_status(&self) -> Option<StatusCode> {
        match self {
            HttpError::BodyTooLarge(_) => Some(StatusCode::INTERNAL_SERVER_ERROR),
            HttpError::InvalidContentLength | HttpError::TooManyHeaders => {
                Some(StatusCode::BAD_REQUEST)
            }
            _ => None,
        }
    }
}

/// A parsed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub uri: String,
    /// `y` in `HTTP/1.y`; 0 when the version is missing
    pub minor_version: u32,
    /// Keys lowercased, values trimmed
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// HTTP/1.1 stays open unless told to close; HTTP/1.0 the reverse.
    pub fn keep_alive(&self) -> bool {
        match self.header("connection") {
            Some(value) if value.eq_ignore_ascii_case("close") => false,
            Some(value) if value.eq_ignore_ascii_case("keep-alive") => true,
            _ => self.minor_version >= 1,
        }
    }
}

async fn read_line<R>(reader: &mut R) -> Result<Option<String>, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let read = (&mut *reader)
        .take(MAX_LINE_BYTES)
        .read_until(b'\n', &mut buf)
        .await?;
    if read == 0 {
        return Ok(None);
    }
    if !buf.ends_with(b"\n") && read as u64 >= MAX_LINE_BYTES {
        return Err(HttpError::LineTooLong);
    }
    Ok(Some(String::from_utf8_lossy(&buf).trim_end_matches(['\r', '\n']).to_string()))
}

fn parse_request_line(line: &str) -> Result<(String, String, u32), HttpError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.len() < 2 {
        return Err(HttpError::MalformedRequestLine);
    }

    let method = words[0];
    if method != "GET" && method != "POST" {
        return Err(HttpError::MalformedRequestLine);
    }

    let uri = words[1];
    if !uri.starts_with('/') {
        return Err(HttpError::MalformedRequestLine);
    }

    let minor_version = words
        .get(2)
        .and_then(|proto| proto.find("HTTP/1.").map(|at| &proto[at + 7..]))
        .map(|rest| {
            let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().unwrap_or(0)
        })
        .unwrap_or(0);

    Ok((method.to_string(), uri.to_string(), minor_version))
}

/// Read one request: request line, headers and body.
///
/// EOF before the request line yields `HttpError::Closed`.
pub async fn read_request<R>(reader: &mut R, max_body: usize) -> Result<HttpRequest, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    let line = read_line(reader).await?.ok_or(HttpError::Closed)?;
    let (method, uri, minor_version) = parse_request_line(&line)?;

    let mut headers = HashMap::new();
    loop {
        let line = read_line(reader).await?.ok_or(HttpError::Closed)?;
        if line.trim().is_empty() {
            break;
        }
        if headers.len() >= MAX_HEADERS {
            return Err(HttpError::TooManyHeaders);
        }
        if let Some((key, value)) = line.split_once(':') {
            headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let length = match headers.get("content-length") {
        Some(value) => value
            .parse::<usize>()
            .map_err(|_| HttpError::InvalidContentLength)?,
        None => 0,
    };
    if length > max_body {
        return Err(HttpError::BodyTooLarge(length));
    }

    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;

    Ok(HttpRequest {
        method,
        uri,
        minor_version,
        headers,
        body,
    })
}

/// Serialize a JSON (or empty) reply
pub fn reply(status: StatusCode, body: &str, keep_alive: bool) -> Vec<u8> {
    if status == StatusCode::UNAUTHORIZED {
        return unauthorized_reply();
    }
    format!(
        "HTTP/1.1 {} {}\r\n\
         Date: {}\r\n\
         Connection: {}\r\n\
         Content-Length: {}\r\n\
         Content-Type: application/json\r\n\
         Server: clam-json-rpc/{}\r\n\
         \r\n\
         {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or(""),
        rfc1123_date(SystemTime::now()),
        if keep_alive { "keep-alive" } else { "close" },
        body.len(),
        env!("CARGO_PKG_VERSION"),
        body
    )
    .into_bytes()
}

/// 401 challenge with an HTML body
pub fn unauthorized_reply() -> Vec<u8> {
    format!(
        "HTTP/1.0 401 Authorization Required\r\n\
         Date: {}\r\n\
         Server: clam-json-rpc/{}\r\n\
         WWW-Authenticate: Basic realm=\"jsonrpc\"\r\n\
         Content-Type: text/html\r\n\
         Content-Length: {}\r\n\
         \r\n\
         {}",
        rfc1123_date(SystemTime::now()),
        env!("CARGO_PKG_VERSION"),
        UNAUTHORIZED_BODY.len(),
        UNAUTHORIZED_BODY
    )
    .into_bytes()
}

/// `Sun, 06 Nov 1994 08:49:37 GMT`
pub fn rfc1123_date(at: SystemTime) -> String {
    const DAYS: [&str; 7] = ["Thu", "Fri", "Sat", "Sun", "Mon", "Tue", "Wed"];
    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];

    let secs = at.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
    let days = (secs / 86_400) as i64;
    let rem = secs % 86_400;

    // Civil date from days since 1970-01-01 (proleptic Gregorian)
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);

    format!(
        "{}, {:02} {} {} {:02}:{:02}:{:02} GMT",
        DAYS[(days.rem_euclid(7)) as usize],
        day,
        MONTHS[(month - 1) as usize],
        year,
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::BufReader;

    async fn parse(raw: &str) -> Result<HttpRequest, HttpError> {
        let mut reader = BufReader::new(raw.as_bytes());
        read_request(&mut reader, MAX_BODY_BYTES).await
    }

    #[tokio::test]
    async fn test_read_post_request() {
        let raw = "POST / HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: 17\r\n\r\n{\"method\":\"help\"}";
        let req = parse(raw).await.unwrap();
        assert_eq!(req.method, "POST");
        assert_eq!(req.uri, "/");
        assert_eq!(req.minor_version, 1);
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        assert_eq!(req.body, b"{\"method\":\"help\"}");
        assert!(req.keep_alive());
    }

    #[tokio::test]
    async fn test_two_requests_on_one_stream() {
        let raw = "POST / HTTP/1.1\r\nContent-Length: 2\r\n\r\n[]POST /x HTTP/1.1\r\nContent-Length: 0\r\n\r\n";
        let mut reader = BufReader::new(raw.as_bytes());
        let first = read_request(&mut reader, MAX_BODY_BYTES).await.unwrap();
        assert_eq!(first.body, b"[]");
        let second = read_request(&mut reader, MAX_BODY_BYTES).await.unwrap();
        assert_eq!(second.uri, "/x");
        assert!(matches!(
            read_request(&mut reader, MAX_BODY_BYTES).await,
            Err(HttpError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_keep_alive_rules() {
        let req = parse("POST / HTTP/1.0\r\n\r\n").await.unwrap();
        assert!(!req.keep_alive());
        let req = parse("POST / HTTP/1.0\r\nConnection: keep-alive\r\n\r\n").await.unwrap();
        assert!(req.keep_alive());
        let req = parse("POST / HTTP/1.1\r\nConnection: close\r\n\r\n").await.unwrap();
        assert!(!req.keep_alive());
        let req = parse("POST /\r\n\r\n").await.unwrap();
        assert_eq!(req.minor_version, 0);
        assert!(!req.keep_alive());
    }

    #[tokio::test]
    async fn test_malformed_request_lines() {
        assert!(matches!(parse("").await, Err(HttpError::Closed)));
        assert!(matches!(
            parse("POST\r\n\r\n").await,
            Err(HttpError::MalformedRequestLine)
        ));
        assert!(matches!(
            parse("PUT / HTTP/1.1\r\n\r\n").await,
            Err(HttpError::MalformedRequestLine)
        ));
        assert!(matches!(
            parse("POST http://host/ HTTP/1.1\r\n\r\n").await,
            Err(HttpError::MalformedRequestLine)
        ));
    }

    #[tokio::test]
    async fn test_body_limits() {
        let mut reader = BufReader::new("POST / HTTP/1.1\r\nContent-Length: 100\r\n\r\n".as_bytes());
        let err = read_request(&mut reader, 10).await.unwrap_err();
        assert!(matches!(err, HttpError::BodyTooLarge(100)));
        assert_eq!(err.reply_status(), Some(StatusCode::INTERNAL_SERVER_ERROR));

        let err = parse("POST / HTTP/1.1\r\nContent-Length: abc\r\n\r\n").await.unwrap_err();
        assert_eq!(err.reply_status(), Some(StatusCode::BAD_REQUEST));

        // Body shorter than advertised
        let err = parse("POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc").await.unwrap_err();
        assert!(matches!(err, HttpError::Io(_)));
        assert_eq!(err.reply_status(), None);
    }

    #[tokio::test]
    async fn test_overlong_header_line() {
        let raw = format!("POST / HTTP/1.1\r\nX-Big: {}\r\n\r\n", "a".repeat(20_000));
        assert!(matches!(parse(&raw).await, Err(HttpError::LineTooLong)));
    }

    #[test]
    fn test_reply_format() {
        let bytes = reply(StatusCode::OK, "{\"result\":1}\n", true);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Connection: keep-alive\r\n"));
        assert!(text.contains("Content-Length: 13\r\n"));
        assert!(text.contains("Content-Type: application/json\r\n"));
        assert!(text.ends_with("\r\n\r\n{\"result\":1}\n"));

        let text = String::from_utf8(reply(StatusCode::FORBIDDEN, "", false)).unwrap();
        assert!(text.starts_with("HTTP/1.1 403 Forbidden\r\n"));
        assert!(text.contains("Connection: close\r\n"));
    }

    #[test]
    fn test_unauthorized_reply() {
        let text = String::from_utf8(reply(StatusCode::UNAUTHORIZED, "", true)).unwrap();
        assert!(text.starts_with("HTTP/1.0 401 Authorization Required\r\n"));
        assert!(text.contains("WWW-Authenticate: Basic realm=\"jsonrpc\"\r\n"));
        assert!(text.contains(&format!("Content-Length: {}\r\n", UNAUTHORIZED_BODY.len())));
    }

    #[test]
    fn test_rfc1123_date() {
        assert_eq!(rfc1123_date(UNIX_EPOCH), "Thu, 01 Jan 1970 00:00:00 GMT");
        let at = UNIX_EPOCH + Duration::from_secs(784_111_777);
        assert_eq!(rfc1123_date(at), "Sun, 06 Nov 1994 08:49:37 GMT");
        let at = UNIX_EPOCH + Duration::from_secs(1_709_210_096);
        assert_eq!(rfc1123_date(at), "Thu, 29 Feb 2024 12:34:56 GMT");
    }
}

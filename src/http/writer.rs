use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::Result;
use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Product token used in the `Server` header.
pub const SERVER_NAME: &str = "Nocturne";

/// Value of the `Server` header, with or without the crate version.
pub fn server_banner(hide_version: bool) -> String {
    if hide_version {
        SERVER_NAME.to_string()
    } else {
        format!("{}/{}", SERVER_NAME, env!("CARGO_PKG_VERSION"))
    }
}

/// Finishes `resp` and renders it to wire bytes.
///
/// Encodes the body if that has not happened yet, injects `Content-Length`
/// when absent and stamps the `Server` banner.
pub fn serialize_response(resp: Response, banner: &str) -> Result<Vec<u8>> {
    Ok(serialize_parts(resp, banner)?.0)
}

/// Wire bytes plus the length of the head (status line, headers and the
/// blank line).
fn serialize_parts(mut resp: Response, banner: &str) -> Result<(Vec<u8>, usize)> {
    resp.prepare()?;
    let body = resp.body.as_bytes().unwrap_or_default();

    resp.headers
        .entry("Content-Length".to_string())
        .or_insert_with(|| body.len().to_string());
    resp.headers
        .insert("Server".to_string(), banner.to_string());

    let mut buf = Vec::with_capacity(128 + body.len());

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.status_line_reason()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    for (k, v) in &resp.headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");
    let head_len = buf.len();

    // Body
    buf.extend_from_slice(body);

    Ok((buf, head_len))
}

pub struct ResponseWriter {
    buffer: Vec<u8>,
    head_len: usize,
    written: usize,
    status: u16,
}

impl ResponseWriter {
    pub fn new(response: Response, banner: &str) -> Result<Self> {
        let status = response.status.as_u16();
        let (buffer, head_len) = serialize_parts(response, banner)?;
        Ok(Self {
            buffer,
            head_len,
            written: 0,
            status,
        })
    }

    /// Answer to a `HEAD` request: same head, `Content-Length` included,
    /// no body bytes.
    pub fn omit_body(&mut self) {
        self.buffer.truncate(self.head_len);
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..]).await?;

            if n == 0 {
                return Err(std::io::Error::from(std::io::ErrorKind::WriteZero).into());
            }

            self.written += n;
        }
        stream.flush().await?;

        Ok(())
    }
}

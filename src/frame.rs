//! The STOMP 1.2 frame codec: a byte-precise, transport-agnostic parser
//! and builder for the wire format in use by this client.
//!
//! ```text
//! <COMMAND>\n
//! <key>:<value>\n
//! \n
//! <body bytes>
//! \0
//! ```
//!
//! Decoding is one-shot over a buffer that already holds exactly one
//! frame (plus optional trailing line feeds) — finding where one frame
//! ends and the next begins in a raw byte stream is a transport-adapter
//! concern (see [`crate::transport`]), not this module's.

use crate::vocabulary::{CodecError, CommandKind, HeaderKind};

/// A validated STOMP frame: one command, an ordered header list
/// (duplicates preserved), and an opaque body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    command: CommandKind,
    headers: Vec<(HeaderKind, String)>,
    body: Vec<u8>,
}

const MISSING: &str = "";

impl Frame {
    /// Build and validate a frame from its parts, enforcing the same
    /// invariants [`Frame::decode`] enforces on the way in: every header
    /// value is non-empty, a supplied `content-length` agrees with the
    /// body's actual length, and CONNECT/STOMP frames carry
    /// `accept-version` and `host`.
    ///
    /// This is the "build-frame" step the session uses before handing a
    /// frame to [`Frame::encode`]; it is what lets `subscribe()` return
    /// an empty id when the frame could not be built.
    pub fn try_new(
        command: CommandKind,
        headers: Vec<(HeaderKind, String)>,
        body: Vec<u8>,
    ) -> Result<Self, CodecError> {
        for (_, value) in &headers {
            if value.is_empty() {
                return Err(CodecError::EmptyHeaderValue);
            }
        }
        if let Some(declared) = lookup(&headers, HeaderKind::ContentLength) {
            let n: usize = declared.parse().map_err(|_| CodecError::WrongContentLength)?;
            if n != body.len() {
                return Err(CodecError::WrongContentLength);
            }
        }
        require_handshake_headers(command, &headers)?;
        Ok(Frame { command, headers, body })
    }

    /// Parse a complete wire buffer into a validated frame.
    pub fn decode(input: &[u8]) -> Result<Frame, CodecError> {
        let mut pos = 0usize;

        // Command phase.
        let nl = find(input, pos, b'\n').ok_or(CodecError::UndefinedCommand)?;
        let command = CommandKind::from_bytes(&input[pos..nl]).ok_or(CodecError::UndefinedCommand)?;
        pos = nl + 1;

        // Header phase: an empty line — including the very first line
        // read, right after the command — ends it. This is what gives
        // us the leading-empty-header-line tolerance for free.
        let mut headers = Vec::new();
        loop {
            let nl = find(input, pos, b'\n').ok_or(CodecError::MissingBodyNewline)?;
            let line = &input[pos..nl];
            pos = nl + 1;
            if line.is_empty() {
                break;
            }
            let colon = line.iter().position(|&b| b == b':').ok_or(CodecError::BadHeader)?;
            let key = std::str::from_utf8(&line[..colon]).map_err(|_| CodecError::BadHeader)?;
            let kind = HeaderKind::from_str(key).ok_or(CodecError::BadHeader)?;
            let value = &line[colon + 1..];
            if value.is_empty() {
                return Err(CodecError::EmptyHeaderValue);
            }
            let value = std::str::from_utf8(value).map_err(|_| CodecError::BadHeader)?;
            headers.push((kind, value.to_string()));
        }

        // Body phase.
        let body: Vec<u8>;
        if let Some(declared) = lookup(&headers, HeaderKind::ContentLength) {
            let n: usize = declared.parse().map_err(|_| CodecError::WrongContentLength)?;
            let end = pos.checked_add(n).ok_or(CodecError::WrongContentLength)?;
            if end >= input.len() || input[end] != 0 {
                return Err(CodecError::WrongContentLength);
            }
            body = input[pos..end].to_vec();
            pos = end + 1;
        } else {
            let nul = input[pos..]
                .iter()
                .position(|&b| b == 0)
                .ok_or(CodecError::UnterminatedBody)?;
            body = input[pos..pos + nul].to_vec();
            pos += nul + 1;
        }

        if input[pos..].iter().any(|&b| b != b'\n') {
            return Err(CodecError::JunkAfterBody);
        }

        require_handshake_headers(command, &headers)?;
        Ok(Frame { command, headers, body })
    }

    /// Render canonical wire bytes for this frame: headers in stored
    /// order, a single blank separator line, the body, and exactly one
    /// terminating NUL. Never escapes header values and never inserts a
    /// `content-length` header of its own.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.body.len() + 32);
        out.extend_from_slice(self.command.as_str().as_bytes());
        out.push(b'\n');
        for (key, value) in &self.headers {
            out.extend_from_slice(key.as_str().as_bytes());
            out.push(b':');
            out.extend_from_slice(value.as_bytes());
            out.push(b'\n');
        }
        out.push(b'\n');
        out.extend_from_slice(&self.body);
        out.push(0);
        out
    }

    pub fn command(&self) -> CommandKind {
        self.command
    }

    pub fn headers(&self) -> &[(HeaderKind, String)] {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Lossy UTF-8 view of the body, for diagnostics.
    pub fn body_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Value of the first header of this kind, or the empty-string
    /// sentinel if none is present.
    pub fn header(&self, kind: HeaderKind) -> &str {
        lookup(&self.headers, kind).unwrap_or(MISSING)
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.encode()))
    }
}

fn lookup(headers: &[(HeaderKind, String)], kind: HeaderKind) -> Option<&str> {
    headers.iter().find(|(k, _)| *k == kind).map(|(_, v)| v.as_str())
}

fn require_handshake_headers(command: CommandKind, headers: &[(HeaderKind, String)]) -> Result<(), CodecError> {
    if matches!(command, CommandKind::Connect | CommandKind::Stomp) {
        if lookup(headers, HeaderKind::AcceptVersion).is_none() {
            return Err(CodecError::MissingAcceptVersion);
        }
        if lookup(headers, HeaderKind::Host).is_none() {
            return Err(CodecError::MissingHost);
        }
    }
    Ok(())
}

fn find(buf: &[u8], from: usize, needle: u8) -> Option<usize> {
    buf.get(from..)?.iter().position(|&b| b == needle).map(|i| i + from)
}

/// Scan `buf` for the byte length of one complete STOMP frame starting
/// at its beginning. Returns `None` when `buf` does not yet hold a
/// complete frame.
///
/// This is framing, not decoding: it never reports *why* a prefix isn't
/// a frame yet, only whether one is present. A transport adapter that
/// reads a raw byte stream (such as [`crate::transport::TcpTransport`])
/// uses this to know when to hand a slice to [`Frame::decode`]; the
/// codec itself stays one-shot, per its decode contract above.
pub(crate) fn scan_boundary(buf: &[u8]) -> Option<usize> {
    let mut pos = find(buf, 0, b'\n')? + 1;
    loop {
        let nl = find(buf, pos, b'\n')?;
        let empty = nl == pos;
        pos = nl + 1;
        if empty {
            break;
        }
    }
    // Framing only needs to know "is the NUL here yet" — a declared
    // content-length that disagrees with the NUL position is decode()'s
    // job to reject as WrongContentLength, not this scan's.
    let nul = buf[pos..].iter().position(|&b| b == 0)?;
    Some(pos + nul + 1)
}

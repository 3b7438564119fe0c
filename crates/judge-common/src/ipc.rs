//! Supervisor<->worker wire protocol (spec.md §5).
//!
//! Framing is an 8-byte little-endian length prefix followed by a
//! `parity-scale-codec`-encoded [`IpcMessage`], the same convention the
//! prepare/execute workers use for their own request/response framing.

use codec::{Decode, Encode};
use std::io::{self, Read, Write};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::model::GradeResult;

/// One event in the supervisor<->worker stream (spec.md §5 event table).
#[derive(Debug, Clone, Encode, Decode)]
pub enum IpcMessage {
    Hello,
    Bye,
    CompileError(Vec<u8>),
    CompileMessage(Vec<u8>),
    GradingBegin { pretests_only: bool },
    GradingEnd,
    GradingAborted,
    BatchBegin(u32),
    BatchEnd(u32),
    Result { case_number: u32, result: GradeResult },
    UnhandledException(String),
    RequestAbort,
}

const LEN_PREFIX_BYTES: usize = 8;

/// Blocking send, used by the worker process (its grading loop is
/// synchronous; only the supervisor runs on a tokio runtime).
pub fn send_blocking<W: Write>(writer: &mut W, message: &IpcMessage) -> io::Result<()> {
    let payload = message.encode();
    writer.write_all(&(payload.len() as u64).to_le_bytes())?;
    writer.write_all(&payload)?;
    writer.flush()
}

/// Blocking receive; returns `Ok(None)` on a clean EOF (peer closed the pipe
/// without sending anything further, e.g. after a hard kill).
pub fn recv_blocking<R: Read>(reader: &mut R) -> io::Result<Option<IpcMessage>> {
    let mut len_buf = [0u8; LEN_PREFIX_BYTES];
    if !read_exact_or_eof(reader, &mut len_buf)? {
        return Ok(None);
    }
    let len = u64::from_le_bytes(len_buf) as usize;
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;
    let message = IpcMessage::decode(&mut &payload[..])
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    Ok(Some(message))
}

fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<bool> {
    let mut read = 0;
    while read < buf.len() {
        match reader.read(&mut buf[read..]) {
            Ok(0) if read == 0 => return Ok(false),
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "peer closed mid-frame",
                ))
            }
            Ok(n) => read += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

/// Async send, used by the supervisor.
pub async fn send_async<W: AsyncWrite + Unpin>(
    writer: &mut W,
    message: &IpcMessage,
) -> io::Result<()> {
    let payload = message.encode();
    writer.write_all(&(payload.len() as u64).to_le_bytes()).await?;
    writer.write_all(&payload).await?;
    writer.flush().await
}

/// Async receive; `Ok(None)` on clean EOF, same contract as
/// [`recv_blocking`].
pub async fn recv_async<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<Option<IpcMessage>> {
    let mut len_buf = [0u8; LEN_PREFIX_BYTES];
    match reader.read_exact(&mut len_buf).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }
    let len = u64::from_le_bytes(len_buf) as usize;
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    let message = IpcMessage::decode(&mut &payload[..])
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    Ok(Some(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_hello_over_a_pipe() {
        let mut buf = Vec::new();
        send_blocking(&mut buf, &IpcMessage::Hello).unwrap();
        let decoded = recv_blocking(&mut &buf[..]).unwrap().unwrap();
        assert_matches::assert_matches!(decoded, IpcMessage::Hello);
    }

    #[test]
    fn recv_blocking_reports_clean_eof() {
        let mut empty: &[u8] = &[];
        assert!(recv_blocking(&mut empty).unwrap().is_none());
    }

    #[test]
    fn recv_blocking_rejects_truncated_frame() {
        let mut buf = Vec::new();
        send_blocking(&mut buf, &IpcMessage::GradingEnd).unwrap();
        buf.truncate(buf.len() - 1);
        assert!(recv_blocking(&mut &buf[..]).is_err());
    }
}

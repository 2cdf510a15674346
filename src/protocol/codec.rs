// Newline-delimited JSON framing for the bridge socket
//
// A frame is one JSON document followed by '\n'. Commands and responses
// must not contain raw newlines; serde_json never emits them.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::{Command, Response};

/// Maximum frame size (4 MB). Scene info payloads are small; asset search
/// results are the largest legitimate frames.
pub const MAX_FRAME_SIZE: usize = 4 * 1024 * 1024;

/// Framing/parse error. Fatal to the connection, never to the process.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },
}

/// Codec for the bridge client side: encodes Commands, decodes Responses.
#[derive(Debug, Default)]
pub struct ClientCodec;

impl ClientCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for ClientCodec {
    type Item = Response;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        decode_frame(src)
    }
}

impl Encoder<Command> for ClientCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_frame(&item, dst)
    }
}

/// Codec for the executor side: decodes Commands, encodes Responses.
#[derive(Debug, Default)]
pub struct ServerCodec;

impl ServerCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for ServerCodec {
    type Item = Command;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        decode_frame(src)
    }
}

impl Encoder<Response> for ServerCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Response, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_frame(&item, dst)
    }
}

/// Decode one newline-terminated JSON frame, if a complete one is buffered.
fn decode_frame<T: serde::de::DeserializeOwned>(
    src: &mut BytesMut,
) -> Result<Option<T>, CodecError> {
    let newline = match src.iter().position(|&b| b == b'\n') {
        Some(pos) => pos,
        None => {
            // No delimiter yet; refuse to buffer without bound
            if src.len() > MAX_FRAME_SIZE {
                return Err(CodecError::FrameTooLarge {
                    size: src.len(),
                    max: MAX_FRAME_SIZE,
                });
            }
            return Ok(None);
        }
    };

    if newline > MAX_FRAME_SIZE {
        return Err(CodecError::FrameTooLarge {
            size: newline,
            max: MAX_FRAME_SIZE,
        });
    }

    let line = src.split_to(newline);
    src.advance(1); // consume the '\n'

    // Tolerate a trailing '\r' from line-oriented peers
    let line = if line.last() == Some(&b'\r') {
        &line[..line.len() - 1]
    } else {
        &line[..]
    };

    let item: T = serde_json::from_slice(line)?;
    Ok(Some(item))
}

/// Encode one JSON frame with its trailing newline.
fn encode_frame<T: serde::Serialize>(item: &T, dst: &mut BytesMut) -> Result<(), CodecError> {
    let data = serde_json::to_vec(item)?;

    if data.len() > MAX_FRAME_SIZE {
        return Err(CodecError::FrameTooLarge {
            size: data.len(),
            max: MAX_FRAME_SIZE,
        });
    }

    dst.reserve(data.len() + 1);
    dst.put_slice(&data);
    dst.put_u8(b'\n');
    Ok(())
}

//! Single-frame WebSocket codec.
//!
//! Decoding works on a growing buffer the same way the request parser does:
//! `Ok(None)` means more bytes are needed and nothing was consumed.

use bytes::{Buf, BytesMut};

use super::WsError;

/// Largest payload the server-side encoder can frame.
///
/// The 64-bit length form is not produced when sending.
pub const MAX_SEND_PAYLOAD: usize = u16::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    Continuation = 0x0,
    Text = 0x1,
    Binary = 0x2,
    Close = 0x8,
    Ping = 0x9,
    Pong = 0xA,
}

impl OpCode {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x0 => Some(OpCode::Continuation),
            0x1 => Some(OpCode::Text),
            0x2 => Some(OpCode::Binary),
            0x8 => Some(OpCode::Close),
            0x9 => Some(OpCode::Ping),
            0xA => Some(OpCode::Pong),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub fin: bool,
    pub opcode: OpCode,
    pub payload: Vec<u8>,
}

/// Frames `payload` for sending from the server: FIN set, never masked.
pub fn encode_frame(opcode: OpCode, payload: &[u8]) -> Result<Vec<u8>, WsError> {
    let len = payload.len();
    if len > MAX_SEND_PAYLOAD {
        return Err(WsError::MessageTooLong(len));
    }

    let mut frame = Vec::with_capacity(len + 4);
    frame.push(0x80 | opcode as u8);
    if len <= 125 {
        frame.push(len as u8);
    } else {
        frame.push(126);
        frame.extend_from_slice(&(len as u16).to_be_bytes());
    }
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Frames `payload` the way a client must: FIN set, masked with `mask`.
///
/// Unlike [`encode_frame`] this covers the 64-bit length form.
pub fn encode_client_frame(opcode: OpCode, payload: &[u8], mask: [u8; 4]) -> Vec<u8> {
    let len = payload.len();
    let mut frame = Vec::with_capacity(len + 14);
    frame.push(0x80 | opcode as u8);
    if len <= 125 {
        frame.push(0x80 | len as u8);
    } else if len <= MAX_SEND_PAYLOAD {
        frame.push(0x80 | 126);
        frame.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        frame.push(0x80 | 127);
        frame.extend_from_slice(&(len as u64).to_be_bytes());
    }
    frame.extend_from_slice(&mask);
    frame.extend(payload.iter().enumerate().map(|(i, b)| b ^ mask[i % 4]));
    frame
}

/// Takes one complete frame off the front of `buf`, unmasking its payload.
pub fn decode_frame(buf: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>, WsError> {
    if buf.len() < 2 {
        return Ok(None);
    }

    let fin = buf[0] & 0x80 != 0;
    let opcode = OpCode::from_u8(buf[0] & 0x0F).ok_or(WsError::InvalidOpcode(buf[0] & 0x0F))?;
    let masked = buf[1] & 0x80 != 0;

    let (len, mut offset) = match buf[1] & 0x7F {
        126 => {
            if buf.len() < 4 {
                return Ok(None);
            }
            (u16::from_be_bytes([buf[2], buf[3]]) as u64, 4)
        }
        127 => {
            if buf.len() < 10 {
                return Ok(None);
            }
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&buf[2..10]);
            (u64::from_be_bytes(raw), 10)
        }
        short => (short as u64, 2),
    };

    let len = usize::try_from(len)
        .ok()
        .filter(|len| *len <= max_payload)
        .ok_or(WsError::MessageTooLong(len.min(usize::MAX as u64) as usize))?;

    let mask = if masked {
        if buf.len() < offset + 4 {
            return Ok(None);
        }
        let mut mask = [0u8; 4];
        mask.copy_from_slice(&buf[offset..offset + 4]);
        offset += 4;
        Some(mask)
    } else {
        None
    };

    let end = offset.checked_add(len).ok_or(WsError::MessageTooLong(len))?;
    if buf.len() < end {
        return Ok(None);
    }

    buf.advance(offset);
    let mut payload = buf.split_to(len).to_vec();
    if let Some(mask) = mask {
        for (i, byte) in payload.iter_mut().enumerate() {
            *byte ^= mask[i % 4];
        }
    }

    Ok(Some(Frame { fin, opcode, payload }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASK: [u8; 4] = [0x37, 0xfa, 0x21, 0x3d];

    #[test]
    fn decodes_rfc_masked_hello() {
        // RFC 6455 section 5.7, single-frame masked text message
        let mut buf = BytesMut::from(&[0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58][..]);

        let frame = decode_frame(&mut buf, 1024).unwrap().unwrap();

        assert!(frame.fin);
        assert_eq!(frame.opcode, OpCode::Text);
        assert_eq!(frame.payload, b"Hello");
        assert!(buf.is_empty());
    }

    #[test]
    fn partial_frame_consumes_nothing() {
        let full = encode_client_frame(OpCode::Text, &[b'x'; 300], MASK);
        let mut buf = BytesMut::from(&full[..full.len() - 1]);

        assert_eq!(decode_frame(&mut buf, 1024).unwrap(), None);
        assert_eq!(buf.len(), full.len() - 1);
    }

    #[test]
    fn short_server_frame_layout() {
        let frame = encode_frame(OpCode::Text, b"hi").unwrap();

        assert_eq!(frame, vec![0x81, 0x02, b'h', b'i']);
    }

    #[test]
    fn oversized_inbound_payload_is_rejected() {
        let full = encode_client_frame(OpCode::Binary, &[0u8; 200], MASK);
        let mut buf = BytesMut::from(&full[..]);

        assert!(matches!(
            decode_frame(&mut buf, 100),
            Err(WsError::MessageTooLong(200))
        ));
    }

    #[test]
    fn huge_declared_length_does_not_overflow() {
        let mut raw = vec![0x82, 0x80 | 127];
        raw.extend_from_slice(&u64::MAX.to_be_bytes());
        raw.extend_from_slice(&MASK);
        let mut buf = BytesMut::from(&raw[..]);

        assert!(matches!(
            decode_frame(&mut buf, usize::MAX),
            Err(WsError::MessageTooLong(_))
        ));
        assert_eq!(buf.len(), raw.len());
    }
}

//! Length-prefixed frames.
//!
//! Each frame is a 4-byte big-endian length followed by that many bytes of
//! bincode payload.

use bytes::{BufMut, Bytes, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::TransportError;

/// Largest payload accepted in either direction: 1 MiB.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Serialize `message` into a complete frame.
pub fn encode<T: Serialize>(message: &T) -> Result<Bytes, TransportError> {
    let payload = bincode::serialize(message)?;
    if payload.len() > MAX_FRAME_SIZE {
        return Err(TransportError::FrameTooLarge(payload.len()));
    }

    let mut frame = BytesMut::with_capacity(4 + payload.len());
    frame.put_u32(payload.len() as u32);
    frame.extend_from_slice(&payload);
    Ok(frame.freeze())
}

pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let frame = encode(message)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame. Returns `None` if the stream ends cleanly before a new
/// frame starts. Ending inside the length prefix is an error.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<Option<T>, TransportError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut header = [0u8; 4];
    let filled = reader.read(&mut header).await?;
    if filled == 0 {
        return Ok(None);
    }
    // A short read must be completed by the rest of the prefix.
    reader.read_exact(&mut header[filled..]).await?;
    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(TransportError::FrameTooLarge(len));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(Some(bincode::deserialize(&payload)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Envelope, Request};
    use corelib::Node;

    #[tokio::test]
    async fn test_frames_back_to_back() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        let first = Envelope {
            service: "ring-links".into(),
            request: Request::UpdateLinks(Node::new(30, "c", "127.0.0.1:1")),
        };
        let second = Envelope {
            service: "ring-links".into(),
            request: Request::GetNext,
        };

        write_frame(&mut client, &first).await.unwrap();
        write_frame(&mut client, &second).await.unwrap();
        drop(client);

        let got: Envelope = read_frame(&mut server).await.unwrap().unwrap();
        assert_eq!(got, first);
        let got: Envelope = read_frame(&mut server).await.unwrap().unwrap();
        assert_eq!(got, second);
        let end: Option<Envelope> = read_frame(&mut server).await.unwrap();
        assert!(end.is_none());
    }

    #[tokio::test]
    async fn test_oversized_length_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client
            .write_all(&((MAX_FRAME_SIZE as u32) + 1).to_be_bytes())
            .await
            .unwrap();

        let result: Result<Option<Envelope>, _> = read_frame(&mut server).await;
        assert!(matches!(result, Err(TransportError::FrameTooLarge(_))));
    }

    #[tokio::test]
    async fn test_truncated_payload_is_an_error() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(&10u32.to_be_bytes()).await.unwrap();
        client.write_all(&[1, 2, 3]).await.unwrap();
        drop(client);

        let result: Result<Option<Envelope>, _> = read_frame(&mut server).await;
        assert!(matches!(result, Err(TransportError::Io(_))));
    }

    #[tokio::test]
    async fn test_truncated_length_prefix_is_an_error() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(&[0, 0]).await.unwrap();
        drop(client);

        let result: Result<Option<Envelope>, _> = read_frame(&mut server).await;
        assert!(matches!(result, Err(TransportError::Io(_))));
    }

    #[tokio::test]
    async fn test_length_prefix_split_across_writes() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let frame = encode(&Request::GetPrev).unwrap();
        client.write_all(&frame[..1]).await.unwrap();
        let rest = frame[1..].to_vec();
        let writer = tokio::spawn(async move {
            tokio::task::yield_now().await;
            client.write_all(&rest).await.unwrap();
        });

        let got: Request = read_frame(&mut server).await.unwrap().unwrap();
        assert_eq!(got, Request::GetPrev);
        writer.await.unwrap();
    }

    #[test]
    fn test_encode_prefixes_length() {
        let frame = encode(&Request::GetThisNode).unwrap();
        let len = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
        assert_eq!(len, frame.len() - 4);
    }
}

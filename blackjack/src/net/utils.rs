use std::{io, time::Duration};

use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    time::timeout,
};

use super::{errors::SessionError, messages::Message};

/// Reads exactly one fixed-size message.
///
/// A peer that closes the stream, even mid-message, yields
/// [`SessionError::Closed`]. With `read_timeout` set, a read that does not
/// complete in time yields [`SessionError::Timeout`].
pub async fn read_message<T, R>(
    reader: &mut R,
    read_timeout: Option<Duration>,
) -> Result<T, SessionError>
where
    T: Message,
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0; T::SIZE];
    let read = reader.read_exact(&mut buf);
    let result = match read_timeout {
        Some(duration) => timeout(duration, read)
            .await
            .map_err(|_| SessionError::Timeout(duration))?,
        None => read.await,
    };
    match result {
        Ok(_) => Ok(T::decode(&buf)?),
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => Err(SessionError::Closed),
        Err(error) => Err(error.into()),
    }
}

/// Writes one message in a single chunk and flushes it.
pub async fn write_message<T, W>(writer: &mut W, message: &T) -> Result<(), SessionError>
where
    T: Message,
    W: AsyncWrite + Unpin,
{
    writer.write_all(&message.encode()).await?;
    writer.flush().await?;
    Ok(())
}

//! The receiving end of the framed broker channel.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{LEN_TYPE_SIZE, LenType};

/// The receiving end handle of the communication.
pub struct FrameReceiver<R: AsyncRead + Unpin> {
    rx: R,
}

impl<R: AsyncRead + Unpin> FrameReceiver<R> {
    /// Creates a new `FrameReceiver` instance.
    ///
    /// # Arguments
    /// * `rx` - The underlying reader.
    pub(super) fn new(rx: R) -> Self {
        Self { rx }
    }

    /// Waits for the next frame and reads its body into `buf`.
    ///
    /// # Arguments
    /// * `buf` - Reused scratch buffer; resized to the frame length.
    ///
    /// # Returns
    /// A result object that returns `io::Error` on failure. EOF between
    /// frames surfaces as `io::ErrorKind::UnexpectedEof`.
    pub async fn recv(&mut self, buf: &mut Vec<u8>) -> io::Result<()> {
        let mut size_buf = [0; LEN_TYPE_SIZE];
        self.rx.read_exact(&mut size_buf).await?;
        let len = LenType::from_be_bytes(size_buf) as usize;

        buf.resize(len, 0);
        self.rx.read_exact(buf).await?;

        Ok(())
    }
}

//! Wire protocol shared between the worker and its broker.
//!
//! Frames are a `u32` big-endian length prefix followed by a JSON body.
//! Inbound frames decode into [`Job`]s, outbound frames are serialized
//! [`Reply`]s.

mod frame;
mod receiver;
mod sender;

use tokio::io::{AsyncRead, AsyncWrite};

pub use frame::{DecodeErr, ErrorReport, Job, JobResult, Operation, Reply};
pub use receiver::FrameReceiver;
pub use sender::FrameSender;

type LenType = u32;
const LEN_TYPE_SIZE: usize = size_of::<LenType>();

/// Creates both `FrameReceiver` and `FrameSender` channel parts.
///
/// Given a reader and writer creates and returns both ends of the framed
/// communication.
///
/// # Arguments
/// * `rx` - An async readable.
/// * `tx` - An async writable.
///
/// # Returns
/// The broker channel in the form of a frame receiver and sender.
pub fn channel<R, W>(rx: R, tx: W) -> (FrameReceiver<R>, FrameSender<W>)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    (FrameReceiver::new(rx), FrameSender::new(tx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io;

    /// Roundtrip over an in-memory duplex stream: broker sends a job frame,
    /// worker decodes it, replies, broker parses the reply back.
    #[tokio::test]
    async fn frame_roundtrip_duplex() -> io::Result<()> {
        const BUF_SIZE: usize = 4096;

        let (broker_stream, worker_stream) = io::duplex(BUF_SIZE);

        let (broker_rx, broker_tx) = io::split(broker_stream);
        let (mut broker_rx, mut broker_tx) = channel(broker_rx, broker_tx);

        let (worker_rx, worker_tx) = io::split(worker_stream);
        let (mut worker_rx, mut worker_tx) = channel(worker_rx, worker_tx);

        broker_tx
            .send(&serde_json::json!({
                "job_id": "42",
                "data": { "operation": "square_array", "array": [1, 2, 3] }
            }))
            .await?;

        let mut buf = Vec::new();
        worker_rx.recv(&mut buf).await?;
        let job = Job::decode(&buf).expect("valid job frame");
        assert_eq!(job.job_id, "42");
        assert_eq!(
            job.op,
            Operation::SquareArray {
                array: vec![1.0, 2.0, 3.0]
            }
        );

        let reply = Reply::Result(JobResult {
            job_id: "42".to_string(),
            data: vec![1.0, 4.0, 9.0],
        });
        worker_tx.send(&reply).await?;

        broker_rx.recv(&mut buf).await?;
        let parsed: Reply = serde_json::from_slice(&buf)?;
        assert_eq!(parsed, reply);

        Ok(())
    }

    /// Two frames in flight arrive in order and decode independently.
    #[tokio::test]
    async fn frames_preserve_order() -> io::Result<()> {
        let (broker_stream, worker_stream) = io::duplex(4096);

        let (_, broker_tx) = io::split(broker_stream);
        let (_, mut broker_tx) = channel(io::empty(), broker_tx);

        let (worker_rx, _) = io::split(worker_stream);
        let mut worker_rx = FrameReceiver::new(worker_rx);

        for id in ["a", "b"] {
            broker_tx
                .send(&serde_json::json!({
                    "job_id": id,
                    "data": { "operation": "load_model" }
                }))
                .await?;
        }

        let mut buf = Vec::new();
        for id in ["a", "b"] {
            worker_rx.recv(&mut buf).await?;
            let job = Job::decode(&buf).expect("valid job frame");
            assert_eq!(job.job_id, id);
        }

        Ok(())
    }
}

//! The broker session: connection lifecycle and the receive/dispatch/
//! transmit loop.

use std::io;

use log::{info, warn};
use tokio::io::{AsyncRead, AsyncWrite};
use wire::{FrameReceiver, FrameSender, Job};

use crate::{context::WorkerContext, router};

/// Lifecycle of the single broker connection. Exactly one instance,
/// owned by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// The worker's session with its broker.
///
/// Owns the connection state machine, the frame channel and the engine
/// context. There is no automatic reconnect: once the connection drops
/// the session is finished.
pub struct Session<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    rx: FrameReceiver<R>,
    tx: FrameSender<W>,
    state: ConnectionState,
    ctx: WorkerContext,
}

impl<R, W> Session<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Wraps an established transport into a session in the `Connecting`
    /// state; `run` completes the transition.
    pub fn new(rx: FrameReceiver<R>, tx: FrameSender<W>, ctx: WorkerContext) -> Self {
        Self {
            rx,
            tx,
            state: ConnectionState::Connecting,
            ctx,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn context(&self) -> &WorkerContext {
        &self.ctx
    }

    /// Serves jobs until the broker closes the connection.
    ///
    /// Contract: jobs are strictly serialized. Each handler runs to
    /// completion before the next frame is received, so at most one job
    /// is ever in flight and the engines' single-instance resources are
    /// never raced.
    ///
    /// Failure policy per frame:
    /// - undecodable frame: logged and dropped, no reply possible;
    /// - unknown operation: logged and dropped by the router;
    /// - handler failure: replied as an error report by the router;
    /// - transmit failure: logged, the reply is dropped, not retried.
    ///
    /// Only transport-level events end the loop: a clean close returns
    /// `Ok(())`, an I/O error propagates. Either way the state is
    /// `Disconnected` afterwards.
    pub async fn run(&mut self) -> io::Result<()> {
        self.state = ConnectionState::Connected;
        info!("session established, waiting for jobs");

        let mut frame = Vec::new();
        loop {
            if let Err(err) = self.rx.recv(&mut frame).await {
                self.state = ConnectionState::Disconnected;

                return if err.kind() == io::ErrorKind::UnexpectedEof {
                    info!("broker closed the session");
                    Ok(())
                } else {
                    warn!("session transport error: {err}");
                    Err(err)
                };
            }

            let job = match Job::decode(&frame) {
                Ok(job) => job,
                Err(err) => {
                    warn!("dropping undecodable frame: {err}");
                    continue;
                }
            };

            let Some(reply) = router::dispatch(job, &mut self.ctx).await else {
                continue;
            };

            // Not retried; the broker recovers via its own job timeout.
            if let Err(err) = self.tx.send(&reply).await {
                warn!(
                    "failed to transmit reply, dropping it: job_id={} error={err}",
                    reply.job_id()
                );
            }
        }
    }
}

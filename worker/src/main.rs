use std::io;

use log::info;
use tokio::{net::TcpStream, signal};

use worker::{
    config::BrokerConfig, context::WorkerContext, runtime::UnlinkedRuntime, session::Session,
};

#[tokio::main]
async fn main() -> io::Result<()> {
    env_logger::init();

    let cfg = BrokerConfig::from_env()?;
    let addr = cfg.addr();

    let stream = TcpStream::connect(&addr).await?;
    info!("connected to broker at {addr}");

    let (rx, tx) = stream.into_split();
    let (rx, tx) = wire::channel(rx, tx);

    let ctx = WorkerContext::new(Box::new(UnlinkedRuntime));
    let mut session = Session::new(rx, tx, ctx);

    tokio::select! {
        ret = session.run() => {
            ret?;
            info!("session ended");
        }
        _ = signal::ctrl_c() => {
            info!("received shutdown signal");
        }
    }

    Ok(())
}

mod config;

use actor_protocol::ActorError;
use actor_runtime::{actor_error, actor_info, actor_warn, Actor, ActorHandles, ChannelManager};
use config::{AppConfig, CONFIG_FILE};
use modem_actors::{discover, ModemPoller, PollerConfig, PortActor, SessionActor};
use transport_native::{list_ports, NativeSerialTransport};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        actor_error!("sms-poller: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ActorError> {
    let config = AppConfig::load(CONFIG_FILE)?;

    let (port_name, transport) = match &config.com_port {
        Some(port) => {
            actor_info!("Using configured port {}", port);
            (port.clone(), NativeSerialTransport::open(port, &config.serial)?)
        }
        None => {
            let ports = list_ports()?;
            actor_info!(
                "No port configured, searching {} ports: {:?}",
                ports.len(),
                ports.iter().map(|p| p.path.as_str()).collect::<Vec<_>>()
            );
            let (found, transport) =
                discover(&ports, |info| NativeSerialTransport::open(&info.path, &config.serial))
                    .await?;
            (found.path, transport)
        }
    };

    let (manager, handles) = ChannelManager::new();
    let ActorHandles {
        session_rx,
        port_rx,
        event_tx,
    } = handles;

    let session = SessionActor::new(event_tx.clone());
    let port = PortActor::new(
        port_name,
        transport,
        manager.session_sender(),
        event_tx.clone(),
    );

    let session_events = event_tx.clone();
    tokio::spawn(async move { session.run(session_rx, session_events).await });
    let port_task = tokio::spawn(async move { port.run(port_rx, event_tx).await });

    let closer = manager.clone();
    let result = ModemPoller::new(manager, PollerConfig::default()).run().await;

    // Release the device before exiting
    if let Err(e) = closer.close_port() {
        actor_warn!("sms-poller: close failed: {}", e);
    }
    drop(closer);
    if let Err(e) = port_task.await {
        actor_warn!("sms-poller: port task ended abnormally: {}", e);
    }

    result
}

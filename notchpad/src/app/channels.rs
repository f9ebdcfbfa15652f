use std::sync::mpsc as std_mpsc;

use tokio::sync::mpsc;

use crate::ipc::IpcServer;
use crate::macos::DisplayReconfigEvent;
use notchpad_ipc::{Command, Response};

pub type IpcCommandWithResponse = (Command, mpsc::Sender<Response>);

pub struct TokioChannels {
    pub cmd_tx: std_mpsc::Sender<IpcCommandWithResponse>,
    pub server_tx: mpsc::Sender<IpcCommandWithResponse>,
    pub server_rx: mpsc::Receiver<IpcCommandWithResponse>,
}

pub struct MainChannels {
    pub ipc_cmd_rx: std_mpsc::Receiver<IpcCommandWithResponse>,
    pub display_reconfig_tx: std_mpsc::Sender<DisplayReconfigEvent>,
    pub display_reconfig_rx: std_mpsc::Receiver<DisplayReconfigEvent>,
}

pub fn create_channels() -> (TokioChannels, MainChannels) {
    // Channel: IPC commands (tokio -> main thread)
    let (ipc_cmd_tx, ipc_cmd_rx) = std_mpsc::channel::<IpcCommandWithResponse>();

    // Channel for IPC server (tokio internal)
    let (server_tx, server_rx) = mpsc::channel::<IpcCommandWithResponse>(64);

    // Channel: display reconfiguration events (callback -> main thread)
    let (display_reconfig_tx, display_reconfig_rx) = std_mpsc::channel::<DisplayReconfigEvent>();

    let tokio_channels = TokioChannels {
        cmd_tx: ipc_cmd_tx,
        server_tx,
        server_rx,
    };

    let main_channels = MainChannels {
        ipc_cmd_rx,
        display_reconfig_tx,
        display_reconfig_rx,
    };

    (tokio_channels, main_channels)
}

pub async fn run_async(channels: TokioChannels) {
    let TokioChannels {
        cmd_tx,
        server_tx,
        mut server_rx,
    } = channels;

    tracing::info!("Tokio runtime started");

    let ipc_server = IpcServer::new(server_tx);
    tokio::spawn(async move {
        if let Err(e) = ipc_server.run().await {
            tracing::error!("IPC server error: {}", e);
        }
    });

    // The main thread picks these up on its next tick
    while let Some((cmd, resp_tx)) = server_rx.recv().await {
        if cmd_tx.send((cmd, resp_tx)).is_err() {
            tracing::error!("Failed to forward IPC command to main thread");
            break;
        }
    }

    tracing::info!("Tokio runtime exiting");
}

mod client;
mod server;

pub use client::IpcClient;
pub use server::IpcServer;

pub const SOCKET_PATH: &str = "/tmp/notchpad.sock";

//! Minimal echo server: accepts one peer and echoes messages back.
//!
//! Run with:
//!   cargo run --example echo-server
//!
//! In another terminal:
//!   cargo run --features cli -- send 127.0.0.1 --data 'hello' --wait

use linelink::{Messenger, Server, SessionConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = Server::bind(SessionConfig::default())?;
    eprintln!("Listening on {}", server.local_addr());

    let peer = server.establish()?;
    eprintln!("Peer connected: {peer}");

    loop {
        match server.receive() {
            Ok(message) => {
                eprintln!("Received {} bytes", message.len());
                server.send(&message)?;
            }
            Err(e) if e.is_end_of_stream() => {
                eprintln!("Peer disconnected");
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    server.close()?;
    Ok(())
}

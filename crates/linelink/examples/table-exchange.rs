//! Send a table from a client to a server on the same machine and print what arrives.
//!
//! Run with:
//!   cargo run --example table-exchange

use std::thread;

use linelink::{Client, Messenger, Server, SessionConfig, Table};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = SessionConfig::default()
        .with_bind_host("127.0.0.1")
        .with_port(0);
    let mut server = Server::bind(config.clone())?;
    let port = server.local_addr().port();

    let sender = thread::spawn(move || -> Result<(), linelink::SessionError> {
        let mut client = Client::connect("127.0.0.1", config.with_port(port))?;
        let table = Table::new(vec![
            vec![1.0, 2.0, 3.0],
            vec![4.0, 5.0, 6.0],
            vec![7.0, 8.0, 9.0],
        ])?;
        client.send_table(&table)?;
        client.close()
    });

    server.establish()?;
    let table = server.receive_table()?;
    for row in table.rows() {
        println!("{row:?}");
    }

    sender.join().map_err(|_| "sender thread panicked")??;
    server.close()?;
    Ok(())
}

use std::fs;

use linelink_session::{Client, Messenger, SessionConfig};
use linelink_table::Table;

use crate::cmd::SendArgs;
use crate::exit::{io_error, session_error, table_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_message, print_table, OutputFormat};

enum Outgoing {
    Message(Vec<u8>),
    Table(Table),
}

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let outgoing = resolve_payload(&args)?;

    let config = SessionConfig::default()
        .with_port(args.port)
        .with_connect_timeout(args.connect_timeout)
        .with_read_timeout(args.wait.then_some(args.wait_timeout));
    let mut client = Client::new(config);
    let peer = client
        .establish(&args.host)
        .map_err(|err| session_error("connect failed", err))?;

    let sent = match &outgoing {
        Outgoing::Message(payload) => client.send(payload),
        Outgoing::Table(table) => client.send_table(table),
    };
    sent.map_err(|err| session_error("send failed", err))?;

    if args.wait {
        match &outgoing {
            Outgoing::Message(_) => {
                let reply = client
                    .receive()
                    .map_err(|err| session_error("receive failed", err))?;
                print_message(&reply, peer, format);
            }
            Outgoing::Table(_) => {
                let reply = client
                    .receive_table()
                    .map_err(|err| session_error("receive failed", err))?;
                print_table(&reply, peer, format);
            }
        }
    }

    client
        .close()
        .map_err(|err| session_error("close failed", err))?;
    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Outgoing> {
    if let Some(data) = &args.data {
        return Ok(Outgoing::Message(data.as_bytes().to_vec()));
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map(Outgoing::Message)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    if let Some(text) = &args.table {
        return parse_table_arg(text).map(Outgoing::Table);
    }
    Err(CliError::new(USAGE, "one of --data, --file or --table is required"))
}

/// Parse `"1,2;3,4"` into a two-by-two table.
fn parse_table_arg(text: &str) -> CliResult<Table> {
    let rows = text
        .split(';')
        .map(|row| {
            if row.trim().is_empty() {
                return Ok(Vec::new());
            }
            row.split(',')
                .map(|cell| {
                    let cell = cell.trim();
                    cell.parse::<f64>()
                        .map_err(|err| CliError::new(USAGE, format!("invalid cell {cell:?}: {err}")))
                })
                .collect::<CliResult<Vec<f64>>>()
        })
        .collect::<CliResult<Vec<Vec<f64>>>>()?;

    Table::new(rows).map_err(|err| table_error("invalid --table", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::DATA_INVALID;

    #[test]
    fn parse_table_arg_builds_rows() {
        let table = parse_table_arg("1,2,3; 4, 5.5, -6e2").unwrap();
        assert_eq!(table.dims(), (2, 3));
        assert_eq!(table.rows()[1], vec![4.0, 5.5, -600.0]);
    }

    #[test]
    fn parse_table_arg_rejects_bad_cells() {
        let err = parse_table_arg("1,two").unwrap_err();
        assert_eq!(err.code, USAGE);
        assert!(err.message.contains("two"));
    }

    #[test]
    fn parse_table_arg_rejects_bad_shapes() {
        assert_eq!(parse_table_arg("1,2;3").unwrap_err().code, DATA_INVALID);
        assert_eq!(parse_table_arg("").unwrap_err().code, DATA_INVALID);
        assert_eq!(parse_table_arg("1;").unwrap_err().code, DATA_INVALID);
    }
}

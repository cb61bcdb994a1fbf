//! Command-line front end for the parcel tracker.
//!
//! # Responsibility
//! - Parse flags, start logging and open the database.
//! - Drive `ParcelService` one command at a time and print the results.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use parcel_core::db::open_db;
use parcel_core::{
    default_log_level, init_logging, ClientId, Parcel, ParcelNumber, ParcelService,
    SqliteParcelStore,
};
use std::fmt::Display;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "parcel_cli", version, about = "Track parcel shipments in SQLite")]
struct Cli {
    /// SQLite database file; created and migrated when missing.
    #[arg(long, env = "PARCEL_DB", default_value = "tracker.db")]
    db: PathBuf,

    #[arg(long, default_value_t = default_log_level().to_string())]
    log_level: String,

    /// Absolute directory for rolling log files. Logging is off when omitted.
    #[arg(long)]
    log_dir: Option<String>,

    /// Print parcels as JSON lines.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// Register a new parcel.
    Register {
        #[arg(long)]
        client: ClientId,
        #[arg(long)]
        address: String,
    },
    /// List all parcels of a client.
    List {
        #[arg(long)]
        client: ClientId,
    },
    /// Advance a parcel to its next status.
    NextStatus { number: ParcelNumber },
    /// Change the address of a registered parcel.
    SetAddress {
        number: ParcelNumber,
        address: String,
    },
    /// Delete a registered parcel.
    Delete { number: ParcelNumber },
    /// Walk one parcel through its lifecycle.
    Demo {
        #[arg(long, default_value_t = 1)]
        client: ClientId,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let code = execute(cli, &mut io::stdout().lock(), &mut io::stderr().lock());
    ExitCode::from(code)
}

/// Runs one command and maps the outcome to a process exit code.
fn execute(cli: Cli, out: &mut dyn Write, err: &mut dyn Write) -> u8 {
    match run(cli, out) {
        Ok(()) => 0,
        Err(error) => {
            let _ = writeln!(err, "error: {error:#}");
            1
        }
    }
}

fn run(cli: Cli, sink: &mut dyn Write) -> Result<()> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        init_logging(&cli.log_level, log_dir)
            .map_err(|err| anyhow!("failed to initialize logging: {err}"))?;
    }

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open parcel database at {}", cli.db.display()))?;
    let store = SqliteParcelStore::try_new(&conn)?;
    let service = ParcelService::new(store);
    let mut out = Printer {
        json: cli.json,
        sink,
    };

    info!("event=cli_command module=cli status=start command={:?}", cli.command);

    match cli.command {
        Command::Register { client, address } => {
            let parcel = service.register(client, address)?;
            out.parcel(&parcel)?;
        }
        Command::List { client } => {
            out.client_parcels(client, &service.client_parcels(client)?)?;
        }
        Command::NextStatus { number } => {
            let status = service.next_status(number)?;
            out.line(format_args!("parcel #{number} is now {status}"))?;
        }
        Command::SetAddress { number, address } => {
            service.change_address(number, address)?;
            out.parcel(&service.parcel(number)?)?;
        }
        Command::Delete { number } => {
            service.delete(number)?;
            out.line(format_args!("parcel #{number} deleted"))?;
        }
        Command::Demo { client } => demo(&service, &mut out, client)?,
    }

    Ok(())
}

fn demo(
    service: &ParcelService<SqliteParcelStore<'_>>,
    out: &mut Printer<'_>,
    client: ClientId,
) -> Result<()> {
    let parcel = service.register(client, "Pskov, Verkhnyaya 5")?;
    out.client_parcels(client, &service.client_parcels(client)?)?;

    service.change_address(parcel.number, "Saratov, Vesennyaya 3")?;
    let status = service.next_status(parcel.number)?;
    out.line(format_args!("parcel #{} is now {status}", parcel.number))?;
    out.client_parcels(client, &service.client_parcels(client)?)?;

    // Already sent, so this is expected to be refused.
    if let Err(err) = service.delete(parcel.number) {
        out.line(format_args!("delete refused: {err}"))?;
    }
    out.client_parcels(client, &service.client_parcels(client)?)?;

    let second = service.register(client, "Pskov, Verkhnyaya 5")?;
    service.delete(second.number)?;
    out.line(format_args!("parcel #{} deleted", second.number))?;
    out.client_parcels(client, &service.client_parcels(client)?)?;

    Ok(())
}

struct Printer<'a> {
    json: bool,
    sink: &'a mut dyn Write,
}

impl Printer<'_> {
    fn line(&mut self, message: impl Display) -> Result<()> {
        writeln!(self.sink, "{message}")?;
        Ok(())
    }

    fn parcel(&mut self, parcel: &Parcel) -> Result<()> {
        if self.json {
            serde_json::to_writer(&mut *self.sink, parcel)?;
            writeln!(self.sink)?;
        } else {
            writeln!(self.sink, "{parcel}")?;
        }
        Ok(())
    }

    fn client_parcels(&mut self, client: ClientId, parcels: &[Parcel]) -> Result<()> {
        if !self.json {
            writeln!(self.sink, "client {client} has {} parcel(s)", parcels.len())?;
        }
        parcels.iter().try_for_each(|parcel| self.parcel(parcel))
    }
}

#[cfg(test)]
mod tests {
    use super::{execute, Cli, Command};
    use clap::Parser;
    use parcel_core::{Parcel, ParcelStatus};
    use std::path::{Path, PathBuf};

    fn parse(db: &Path, args: &[&str]) -> Cli {
        let db = db.to_str().unwrap();
        let argv = ["parcel_cli", "--db", db].into_iter().chain(args.iter().copied());
        Cli::try_parse_from(argv).unwrap()
    }

    fn run_args(db: &Path, args: &[&str]) -> (u8, String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = execute(parse(db, args), &mut out, &mut err);
        (
            code,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn db_defaults_to_tracker_file_and_falls_back_to_env() {
        std::env::remove_var("PARCEL_DB");
        let cli = Cli::try_parse_from(["parcel_cli", "list", "--client", "5"]).unwrap();
        assert_eq!(cli.db, PathBuf::from("tracker.db"));
        assert!(!cli.json);
        assert!(cli.log_dir.is_none());
        assert_eq!(cli.command, Command::List { client: 5 });

        std::env::set_var("PARCEL_DB", "/tmp/from-env.db");
        let from_env = Cli::try_parse_from(["parcel_cli", "list", "--client", "5"]).unwrap();
        let explicit =
            Cli::try_parse_from(["parcel_cli", "--db", "flag.db", "list", "--client", "5"])
                .unwrap();
        std::env::remove_var("PARCEL_DB");

        assert_eq!(from_env.db, PathBuf::from("/tmp/from-env.db"));
        assert_eq!(explicit.db, PathBuf::from("flag.db"));
    }

    #[test]
    fn subcommands_take_expected_argument_shapes() {
        fn parsed(args: &[&str]) -> Result<Command, clap::Error> {
            let argv = std::iter::once("parcel_cli").chain(args.iter().copied());
            Cli::try_parse_from(argv).map(|cli| cli.command)
        }

        assert_eq!(
            parsed(&["register", "--client", "7", "--address", "Main st"]).unwrap(),
            Command::Register {
                client: 7,
                address: "Main st".to_string()
            }
        );
        assert_eq!(
            parsed(&["next-status", "3"]).unwrap(),
            Command::NextStatus { number: 3 }
        );
        assert_eq!(
            parsed(&["set-address", "3", "new addr"]).unwrap(),
            Command::SetAddress {
                number: 3,
                address: "new addr".to_string()
            }
        );
        assert_eq!(parsed(&["delete", "9"]).unwrap(), Command::Delete { number: 9 });
        assert_eq!(parsed(&["demo"]).unwrap(), Command::Demo { client: 1 });

        assert!(parsed(&["register", "--client", "7"]).is_err());
        assert!(parsed(&["delete"]).is_err());
        assert!(parsed(&["next-status", "abc"]).is_err());
    }

    #[test]
    fn json_flag_prints_one_parcel_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("tracker.db");

        let (code, registered, _) = run_args(
            &db,
            &["--json", "register", "--client", "42", "--address", "first"],
        );
        assert_eq!(code, 0);
        let first: Parcel = serde_json::from_str(registered.trim_end()).unwrap();
        assert_eq!(first.status, ParcelStatus::Registered);
        run_args(&db, &["register", "--client", "42", "--address", "second"]);

        let (code, listed, _) = run_args(&db, &["--json", "list", "--client", "42"]);
        assert_eq!(code, 0);
        let parcels: Vec<Parcel> = listed
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(parcels.len(), 2);
        assert!(parcels.contains(&first));
        assert!(parcels.iter().any(|parcel| parcel.address == "second"));
    }

    #[test]
    fn failing_command_reports_error_and_exits_with_one() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("tracker.db");

        let (code, out, err) = run_args(&db, &["delete", "999"]);
        assert_eq!(code, 1);
        assert!(out.is_empty());
        assert_eq!(err, "error: parcel not found: 999\n");
    }

    #[test]
    fn demo_lists_parcels_after_every_step() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("tracker.db");

        let (code, out, err) = run_args(&db, &["demo", "--client", "7"]);
        assert_eq!(code, 0, "{err}");

        let listings = out
            .lines()
            .filter(|line| *line == "client 7 has 1 parcel(s)")
            .count();
        assert_eq!(listings, 4);

        let refused = out.find("delete refused:").unwrap();
        let after_refused = &out[refused..];
        assert!(after_refused
            .lines()
            .nth(1)
            .unwrap()
            .starts_with("client 7 has 1 parcel(s)"));
        assert!(out.contains("is now sent"));
        assert!(out.contains("to `Saratov, Vesennyaya 3`"));
        assert!(out.contains("deleted"));
    }
}

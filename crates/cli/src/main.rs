//! `moonsql` — the `--show=token|ast|sem|plan|result` surface over
//! [`database::Database`]. Reads SQL from a file argument or stdin, runs
//! each statement it finds against the data directory, and prints the
//! artifact `--show` names. Exit codes follow the boundary contract: 0
//! success, 1 I/O failure, 2 compilation error (lex/parse/sem), 3 runtime
//! error (exec/storage).

use clap::{Parser, ValueEnum};
use common::{Config, DbError};
use database::{Database, StatementRun};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Show {
    Token,
    Ast,
    Sem,
    Plan,
    Result,
}

#[derive(Parser, Debug)]
#[command(name = "moonsql", about = "compile and run MoonSQL statements")]
struct Args {
    /// Artifact to print for each statement.
    #[arg(long, value_enum)]
    show: Show,

    /// Data directory the catalog and table files live under.
    #[arg(long, default_value = "./db_data")]
    db: PathBuf,

    /// SQL file to run; reads stdin when omitted.
    file: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let source = match read_source(args.file.as_deref()) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(1);
        }
    };

    let config = Config::builder().data_dir(args.db).build();
    let mut db = match Database::open(&config) {
        Ok(db) => db,
        Err(err) => return report(&err),
    };

    match db.run_source(&source) {
        Ok(runs) => {
            for run in runs {
                match run {
                    Ok(run) => print_artifact(args.show, &run),
                    Err(err) => return report(&err),
                }
            }
            ExitCode::SUCCESS
        }
        Err(err) => report(&err),
    }
}

fn read_source(file: Option<&std::path::Path>) -> std::io::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn print_artifact(show: Show, run: &StatementRun) {
    match show {
        Show::Token => println!("{:#?}", run.tokens),
        Show::Ast => println!("{:#?}", run.ast),
        Show::Sem => println!("OK"),
        Show::Plan => match serde_json::to_string_pretty(&run.plan) {
            Ok(json) => println!("{json}"),
            Err(err) => eprintln!("failed to serialize plan: {err}"),
        },
        Show::Result => print_result(&run.outcome),
    }
}

fn print_result(outcome: &executor::ExecOutcome) {
    match outcome {
        executor::ExecOutcome::Rows(batch) => {
            println!("{}", common::pretty::render_record_batch(batch, common::pretty::TableStyleKind::Modern));
        }
        executor::ExecOutcome::Affected(n) => println!("OK ({n})"),
    }
}

fn report(err: &DbError) -> ExitCode {
    eprintln!("{}", err.to_boundary_json());
    ExitCode::from(err.exit_code() as u8)
}

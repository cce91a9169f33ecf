use anyhow::Result;
use env_logger::{Builder, Env};
use log::error;

mod cli;
mod util;
mod cmd_init;
mod cmd_get;
mod cmd_set;
mod cmd_del;
mod cmd_keys;
mod cmd_version;
mod cmd_status;
mod cmd_remove;

fn init_logger() {
    // Уровень берём из RUST_LOG, иначе дефолт: info.
    // Пример: RUST_LOG=debug ./inivault status --path board.ini
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse_args();
    match cli.cmd {
        cli::Cmd::Init { path, version } =>
            cmd_init::exec(path, version),

        cli::Cmd::Get { path, key } =>
            cmd_get::exec(path, key),

        cli::Cmd::Set { path, key, value } =>
            cmd_set::exec(path, key, value),

        cli::Cmd::Del { path, key } =>
            cmd_del::exec(path, key),

        cli::Cmd::Keys { path, json } =>
            cmd_keys::exec(path, json),

        cli::Cmd::Version { path, set } =>
            cmd_version::exec(path, set),

        cli::Cmd::Status { path, json } =>
            cmd_status::exec(path, json),

        cli::Cmd::Remove { path } =>
            cmd_remove::exec(path),
    }
}

mod cli;
mod config;

use std::{io::Write, process::ExitCode, time::SystemTime};

use anyhow::{Context, Result};
use clap::Parser;
use oxidauth::{commands, store::SecretStore, AuthError};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Cli, Command};

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    // stdout carries Alfred's JSON, so logs go to stderr and stay quiet by default.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Opens the store, runs one command and closes the store on every path.
fn run(cli: Cli) -> Result<()> {
    let path = config::db_path(cli.db.as_deref())?;
    let mut store = SecretStore::open(&path)
        .with_context(|| format!("failed to open secret store at {}", path.display()))?;

    let mut stdout = std::io::stdout().lock();
    let outcome = dispatch(
        &mut store,
        cli.key,
        cli.command,
        SystemTime::now(),
        &mut stdout,
    );
    let closed = store.close().context("failed to close secret store");

    outcome.and(closed)
}

/// Runs one command, writing what Alfred should see to `out`.
fn dispatch(
    store: &mut SecretStore,
    key: Option<String>,
    command: Option<Command>,
    now: SystemTime,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        None => {
            let key = key.context("--key is required")?;
            match commands::generate(store, &key, now) {
                Ok(code) => writeln!(out, "{code}")?,
                Err(AuthError::NotFound(_)) => debug!(key = %key, "no secret stored, nothing to print"),
                Err(err) => return Err(err).context(format!("failed to generate code for [{key}]")),
            }
        }
        Some(Command::Query { args }) => {
            let items = commands::query(store, &args)?;
            write!(out, "{}", serde_json::to_string(&items)?)?;
        }
        Some(Command::Add { key, secret }) => {
            let message = commands::add(store, &key, &secret, now)?;
            write!(out, "{message}")?;
        }
        Some(Command::Del { key }) => {
            let message = commands::delete(store, &key)?;
            write!(out, "{message}")?;
        }
    }

    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::dispatch;
    use crate::cli::Command;
    use oxidauth::store::SecretStore;

    struct Fixture {
        _dir: TempDir,
        store: SecretStore,
    }

    #[fixture]
    fn store() -> Fixture {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SecretStore::open(dir.path().join("config.db")).expect("open store");

        Fixture { _dir: dir, store }
    }

    fn at(seconds: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(seconds)
    }

    fn run(
        fixture: &mut Fixture,
        key: Option<&str>,
        command: Option<Command>,
        now: SystemTime,
    ) -> String {
        let mut out = Vec::new();
        dispatch(
            &mut fixture.store,
            key.map(str::to_string),
            command,
            now,
            &mut out,
        )
        .expect("dispatch");

        String::from_utf8(out).expect("utf8 output")
    }

    fn add(key: &str, secret: &str) -> Option<Command> {
        Some(Command::Add {
            key: key.into(),
            secret: secret.into(),
        })
    }

    #[rstest]
    fn add_confirmation_has_no_trailing_newline(mut store: Fixture) {
        let output = run(&mut store, None, add("github", "JBSWY3DPEHPK3PXP"), at(0));

        assert_eq!("add [github] secret success", output);
    }

    #[rstest]
    fn generate_prints_code_with_newline(mut store: Fixture) {
        run(&mut store, None, add("github", "JBSWY3DPEHPK3PXP"), at(0));

        let output = run(&mut store, Some("github"), None, at(1700000000));

        assert_eq!("324550\n", output);
    }

    #[rstest]
    fn generate_for_deleted_key_prints_nothing(mut store: Fixture) {
        run(&mut store, None, add("github", "JBSWY3DPEHPK3PXP"), at(0));
        let deleted = run(
            &mut store,
            None,
            Some(Command::Del {
                key: "github".into(),
            }),
            at(0),
        );

        let output = run(&mut store, Some("github"), None, at(1700000000));

        assert_eq!("del [github] secret success", deleted);
        assert_eq!("", output);
    }

    #[rstest]
    fn query_prints_alfred_json(mut store: Fixture) {
        run(&mut store, None, add("b", "JBSWY3DPEHPK3PXP"), at(0));
        run(&mut store, None, add("a", "MZXW6"), at(0));

        let output = run(
            &mut store,
            None,
            Some(Command::Query { args: vec![] }),
            at(0),
        );

        assert_eq!(
            concat!(
                r#"{"items":["#,
                r#"{"type":"default","title":"a","arg":"--key a","autocomplete":"--key a"},"#,
                r#"{"type":"default","title":"b","arg":"--key b","autocomplete":"--key b"}"#,
                r#"]}"#
            ),
            output
        );
    }

    #[rstest]
    fn invalid_secret_fails_without_output(mut store: Fixture) {
        let mut out = Vec::new();

        let result = dispatch(
            &mut store.store,
            None,
            add("bank", "not base32!"),
            at(0),
            &mut out,
        );

        assert!(result.is_err());
        assert!(out.is_empty());
        assert!(store.store.keys().unwrap().is_empty());
    }
}

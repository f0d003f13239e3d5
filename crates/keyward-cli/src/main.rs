mod cli;
mod config;
mod storage;

use std::path::Path;

use clap::Parser;
use color_eyre::Result;
use keyward_cipher::Token;
use keyward_core::config::ConfigStore;
use keyward_storage::{
    key_file::{PersistencePolicy, SaveOutcome},
    key_store::KeyStore,
    toml_config::TomlConfigStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Command, ConfigCommand};

/// Entry point wiring the CLI to the key store.
fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    let output = match cli.command {
        Command::Version => version_line(),
        command => {
            let config_path = config::resolve_path(cli.config)?;
            let mut store = storage::open_key_store(&config_path)?;
            run_command(&mut store, command)?
        }
    };
    println!("{output}");

    Ok(())
}

fn run_command(store: &mut KeyStore<TomlConfigStore>, command: Command) -> Result<String> {
    match command {
        Command::Generate {
            path,
            create_dirs,
            force,
            print,
        } => {
            let policy = PersistencePolicy {
                create_missing_directory: create_dirs,
                overwrite_existing: force,
            };
            run_generate(store, path.as_deref(), policy, print)
        }
        Command::ShowKey { path } => run_show_key(store, path.as_deref()),
        Command::Encrypt { text, key_file } => run_encrypt(store, &text, key_file.as_deref()),
        Command::Decrypt { token, key_file } => run_decrypt(store, &token, key_file.as_deref()),
        Command::Config(ConfigCommand::Show) => Ok(format!(
            "Config file: {}\nDefault key file: {}",
            store.config().path().display(),
            store.default_path().display()
        )),
        Command::Config(ConfigCommand::SetKeyFile { path }) => {
            store.set_default_path(&path)?;
            Ok(format!("Default key file set to {}", path.display()))
        }
        Command::Version => Ok(version_line()),
    }
}

fn init_tracing() {
    // Respect user-provided filters, default to info; logs go to stderr so stdout stays pipeable.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn version_line() -> String {
    format!("keyward {}", env!("CARGO_PKG_VERSION"))
}

fn run_generate<C: ConfigStore>(
    store: &KeyStore<C>,
    path: Option<&Path>,
    policy: PersistencePolicy,
    print: bool,
) -> Result<String> {
    let key = store.generate_key();
    let target = path.unwrap_or(store.default_path());
    let outcome = store.save_key(&key, Some(target), policy)?;

    let mut lines = Vec::new();
    if print {
        lines.push(format!("Generated key: {}", key.encode()));
    }
    lines.push(match outcome {
        SaveOutcome::Written => format!("Saved key to {}", target.display()),
        SaveOutcome::PreservedExisting => format!(
            "Key file {} already exists; left unchanged (use --force to replace it)",
            target.display()
        ),
    });
    Ok(lines.join("\n"))
}

fn run_show_key<C: ConfigStore>(store: &KeyStore<C>, path: Option<&Path>) -> Result<String> {
    Ok(store.load_key(path)?.encode())
}

fn run_encrypt<C: ConfigStore>(
    store: &KeyStore<C>,
    text: &str,
    key_file: Option<&Path>,
) -> Result<String> {
    let key = store.load_key(key_file)?;
    Ok(store.encrypt(text, &key)?.into_string())
}

fn run_decrypt<C: ConfigStore>(
    store: &KeyStore<C>,
    token: &str,
    key_file: Option<&Path>,
) -> Result<String> {
    let key = store.load_key(key_file)?;
    Ok(store.decrypt(&Token::from(token), &key)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage;

    #[test]
    fn generate_then_round_trip_text() {
        let dir = tempfile::tempdir().expect("tempdir");
        let key_path = dir.path().join("keys").join("key.env");
        let store = storage::test_store(&key_path);

        let policy = PersistencePolicy {
            create_missing_directory: true,
            overwrite_existing: false,
        };
        let message = run_generate(&store, None, policy, false).expect("generate");
        assert!(message.starts_with("Saved key to"));

        let token = run_encrypt(&store, "héllo", None).expect("encrypt");
        let text = run_decrypt(&store, &token, None).expect("decrypt");
        assert_eq!(text, "héllo");
    }

    #[test]
    fn generate_without_force_keeps_existing_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let key_path = dir.path().join("key.env");
        let store = storage::test_store(&key_path);

        run_generate(&store, None, PersistencePolicy::default(), false).expect("first");
        let before = run_show_key(&store, None).expect("show");

        let message =
            run_generate(&store, None, PersistencePolicy::default(), true).expect("second");
        assert!(message.contains("left unchanged"));
        assert!(message.starts_with("Generated key: "));
        assert_eq!(run_show_key(&store, None).expect("show"), before);
    }

    #[test]
    fn show_key_reports_missing_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = storage::test_store(&dir.path().join("absent.env"));

        let err = run_show_key(&store, None).expect_err("missing key");
        assert!(err.to_string().contains("save a key first"));
    }

    #[test]
    fn decrypt_with_other_key_file_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = dir.path().join("first.env");
        let second = dir.path().join("second.env");
        let store = storage::test_store(&first);

        run_generate(&store, None, PersistencePolicy::default(), false).expect("first");
        run_generate(
            &store,
            Some(second.as_path()),
            PersistencePolicy::default(),
            false,
        )
        .expect("second");

        let token = run_encrypt(&store, "hello", None).expect("encrypt");
        let err = run_decrypt(&store, &token, Some(second.as_path())).expect_err("wrong key");
        assert!(err.to_string().contains("authentication"));
    }
}

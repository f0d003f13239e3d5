use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// CLI surface definition.
#[derive(Parser, Debug)]
#[command(
    name = "keyward",
    about = "Generate, store and use symmetric encryption keys",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Config file (defaults to $KEYWARD_CONFIG, then the platform config directory).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Generate a new key and save it (to the default key file unless --path is given).
    Generate {
        #[arg(long, value_name = "FILE")]
        path: Option<PathBuf>,
        /// Create the key file's directory if it is missing.
        #[arg(long)]
        create_dirs: bool,
        /// Replace an existing key file instead of keeping it.
        #[arg(long)]
        force: bool,
        /// Also print the generated key.
        #[arg(long)]
        print: bool,
    },
    /// Print a stored key.
    ShowKey {
        #[arg(long, value_name = "FILE")]
        path: Option<PathBuf>,
    },
    /// Encrypt text with a stored key and print the token.
    Encrypt {
        text: String,
        #[arg(long, value_name = "FILE")]
        key_file: Option<PathBuf>,
    },
    /// Decrypt a token with a stored key and print the text.
    Decrypt {
        token: String,
        #[arg(long, value_name = "FILE")]
        key_file: Option<PathBuf>,
    },
    /// Inspect or change configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version and exit.
    Version,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Show the config file and the default key file.
    Show,
    /// Change the default key file and save it to the config file.
    SetKeyFile { path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_generate_with_flags() {
        let cli = Cli::try_parse_from([
            "keyward",
            "generate",
            "--path",
            "keys/app.env",
            "--create-dirs",
            "--force",
        ])
        .expect("parse should succeed");
        assert_eq!(
            cli.command,
            Command::Generate {
                path: Some(PathBuf::from("keys/app.env")),
                create_dirs: true,
                force: true,
                print: false,
            }
        );
    }

    #[test]
    fn parses_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["keyward", "show-key", "--config", "alt.toml"])
            .expect("parse should succeed");
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
        assert_eq!(cli.command, Command::ShowKey { path: None });
    }

    #[test]
    fn parses_encrypt_subcommand() {
        let cli = Cli::try_parse_from(["keyward", "encrypt", "hello world"])
            .expect("parse should succeed");
        assert_eq!(
            cli.command,
            Command::Encrypt {
                text: "hello world".into(),
                key_file: None,
            }
        );
    }

    #[test]
    fn parses_config_set_key_file_subcommand() {
        let cli = Cli::try_parse_from(["keyward", "config", "set-key-file", "new.env"])
            .expect("parse should succeed");
        assert_eq!(
            cli.command,
            Command::Config(ConfigCommand::SetKeyFile {
                path: PathBuf::from("new.env"),
            })
        );
    }

    #[test]
    fn requires_a_subcommand() {
        assert!(Cli::try_parse_from(["keyward"]).is_err());
    }
}

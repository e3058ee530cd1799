use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use cryptdl_config::ConfigLoader;
use std::io;
use std::path::PathBuf;

mod commands;
mod logging;

/// Manage dm-crypt volumes through a runtime-loaded libcryptsetup.
///
/// libcryptsetup is opened when a command first needs it, so `cryptdl`
/// starts (and prints help or completions) on hosts without it.
///
/// EXAMPLES:
///     cryptdl probe                              Show the loaded library
///     cryptdl info /dev/sdb1                     Show header summary
///     cryptdl format disk.img --params luks2.toml
///     cryptdl open /dev/sdb1 data < pass.txt     Activate /dev/mapper/data
///     cryptdl close data                         Deactivate a mapping
///
/// ENVIRONMENT VARIABLES:
///     CRYPTDL_LIBRARY       libcryptsetup soname or path
///     CRYPTDL_LIBC          C runtime soname or path
///     CRYPTDL_LIBRARY_PATH  Extra library directories (colon-separated)
///     CRYPTDL_LOG           Log level (error, warn, info, debug, trace)
///     CRYPTDL_DEBUG         libcryptsetup debug level (-1 all, 0 none)
///     RUST_LOG              Log filter, overrides CRYPTDL_LOG
#[derive(Parser)]
#[command(name = "cryptdl")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable libcryptsetup debug output
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load libcryptsetup and report what it supports
    Probe {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the header summary of a device
    Info {
        /// Block device or image file
        device: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the on-disk header
    Dump {
        /// Block device or image file
        device: String,
        /// Print LUKS2 metadata as JSON (libcryptsetup 2.4+)
        #[arg(long)]
        json: bool,
    },

    /// Write a new header to a device
    ///
    /// The parameter file holds a `[volume]` table (cipher, cipher_mode,
    /// volume_key_size, uuid) and exactly one of `[plain]`, `[luks1]` or
    /// `[luks2]`. LUKS devices get a first keyslot for the passphrase.
    ///
    /// EXAMPLES:
    ///     cryptdl format disk.img --params luks2.toml --passphrase-file pw
    Format {
        /// Block device or image file
        device: String,
        /// TOML file describing the volume
        #[arg(long, short = 'p')]
        params: PathBuf,
        /// Read the passphrase from this file instead of stdin
        #[arg(long)]
        passphrase_file: Option<PathBuf>,
    },

    /// Activate a device as /dev/mapper/<name>
    Open {
        /// Block device or image file
        device: String,
        /// Mapping name
        name: String,
        /// Only try this keyslot
        #[arg(long, short = 'S')]
        keyslot: Option<i32>,
        /// Create a read-only mapping
        #[arg(long)]
        readonly: bool,
        /// Read the passphrase from this file instead of stdin
        #[arg(long)]
        passphrase_file: Option<PathBuf>,
    },

    /// Deactivate /dev/mapper/<name>
    Close {
        /// Mapping name
        name: String,
    },

    /// Add a keyslot, unlocking with an existing passphrase
    ///
    /// Without files, the current passphrase is the first stdin line and the
    /// new one the second.
    AddKey {
        /// Block device or image file
        device: String,
        /// Keyslot to fill (any free slot by default)
        #[arg(long, short = 'S')]
        keyslot: Option<i32>,
        /// File holding an existing passphrase
        #[arg(long)]
        passphrase_file: Option<PathBuf>,
        /// File holding the passphrase to add
        #[arg(long)]
        new_passphrase_file: Option<PathBuf>,
    },

    /// Inspect LUKS2 tokens
    Token {
        /// Block device or image file
        device: String,
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Generate shell completions
    ///
    /// EXAMPLES:
    ///     cryptdl completions bash > /etc/bash_completion.d/cryptdl
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Print the JSON definition of a token
    Json {
        /// Token id
        id: i32,
    },
    /// Print the state and type of a token
    Status {
        /// Token id
        id: i32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new()
        .load()
        .context("Failed to load cryptdl configuration")?;
    logging::init(config.log_level());

    let session = commands::Session {
        native_debug: cli.debug || config.native_debug() != cryptdl::consts::CRYPT_DEBUG_NONE,
    };

    match cli.command {
        Commands::Probe { json } => commands::probe::run(&session, json)?,
        Commands::Info { device, json } => commands::info::run(&session, &device, json)?,
        Commands::Dump { device, json } => commands::info::dump(&session, &device, json)?,
        Commands::Format {
            device,
            params,
            passphrase_file,
        } => {
            let args = commands::format::FormatArgs {
                device,
                params,
                passphrase_file,
            };
            commands::format::run(&session, args)?;
        }
        Commands::Open {
            device,
            name,
            keyslot,
            readonly,
            passphrase_file,
        } => {
            let args = commands::activate::OpenArgs {
                device,
                name,
                keyslot,
                readonly,
                passphrase_file,
            };
            commands::activate::open(&session, args)?;
        }
        Commands::Close { name } => commands::activate::close(&session, &name)?,
        Commands::AddKey {
            device,
            keyslot,
            passphrase_file,
            new_passphrase_file,
        } => {
            let args = commands::keyslot::AddKeyArgs {
                device,
                keyslot,
                passphrase_file,
                new_passphrase_file,
            };
            commands::keyslot::add(&session, args)?;
        }
        Commands::Token { device, action } => match action {
            TokenAction::Json { id } => commands::token::json(&session, &device, id)?,
            TokenAction::Status { id } => commands::token::status(&session, &device, id)?,
        },
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
    }

    Ok(())
}

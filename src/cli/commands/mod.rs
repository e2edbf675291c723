//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod catalog;
pub mod cmd;
pub mod defaults;
pub mod firmware;
pub mod hardware;
pub mod image;
pub mod os;
pub mod run;
pub mod status;

use anyhow::Result;
use clap::Subcommand;

use crate::cli::Session;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage hardware profiles
    Hardware {
        #[command(subcommand)]
        command: HardwareCommands,
    },

    /// Manage operating systems
    Os {
        #[command(subcommand)]
        command: OsCommands,
    },

    /// Manage firmware
    Firmware {
        #[command(subcommand)]
        command: FirmwareCommands,
    },

    /// Manage disk images
    Image {
        #[command(subcommand)]
        command: ImageCommands,
    },

    /// Print the emulator command for an image
    Cmd {
        /// Image id (defaults to the last image)
        image: Option<String>,
    },

    /// Start the emulator for an image
    Run {
        /// Image id (defaults to the last image)
        image: Option<String>,
    },

    /// Manage catalog defaults
    Defaults {
        #[command(subcommand)]
        command: DefaultsCommands,
    },

    /// Show data directory status
    Status,

    /// Show the default catalog shipped with rpem
    Catalog,
}

/// Hardware subcommands
#[derive(Subcommand, Debug)]
pub enum HardwareCommands {
    /// List hardware profiles
    List,

    /// Add a hardware profile
    Add {
        /// Hardware id
        id: String,

        /// Display name
        #[arg(long)]
        name: String,

        /// QEMU architecture (binary suffix), e.g. aarch64
        #[arg(long)]
        arch: String,

        /// Extra QEMU arguments, passed verbatim
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        args: String,
    },

    /// Remove a hardware profile
    Remove {
        /// Hardware id
        id: String,
    },
}

/// Operating system subcommands
#[derive(Subcommand, Debug)]
pub enum OsCommands {
    /// List operating systems
    List,

    /// Add an operating system
    Add {
        /// Operating system id
        id: String,

        /// Display name
        #[arg(long)]
        name: String,

        /// Free-form details
        #[arg(long, default_value = "")]
        details: String,

        /// Firmware id the OS boots with
        #[arg(long)]
        firmware: String,

        /// Supported hardware ids
        #[arg(long = "hardware", required = true, num_args = 1..)]
        hardware: Vec<String>,

        /// Download URL of the disk image (.gz and .xz are decompressed)
        #[arg(long)]
        url: String,
    },

    /// Remove an operating system
    Remove {
        /// Operating system id
        id: String,
    },
}

/// Firmware subcommands
#[derive(Subcommand, Debug)]
pub enum FirmwareCommands {
    /// List firmware
    List,

    /// Add firmware (downloads it)
    Add {
        /// Firmware id
        id: String,

        /// Download URL
        #[arg(long)]
        url: String,
    },

    /// Remove firmware and its file
    Remove {
        /// Firmware id
        id: String,
    },
}

/// Image subcommands
#[derive(Subcommand, Debug)]
pub enum ImageCommands {
    /// List images
    List,

    /// Create an image (downloads the OS)
    Create {
        /// Image name
        name: String,

        /// Hardware id
        #[arg(long)]
        hardware: String,

        /// Operating system id
        #[arg(long)]
        os: String,
    },

    /// Remove an image and its file
    Remove {
        /// Image id
        id: String,
    },

    /// Print the path of an image file
    Path {
        /// Image id
        id: String,
    },
}

/// Defaults subcommands
#[derive(Subcommand, Debug)]
pub enum DefaultsCommands {
    /// Re-seed catalog entries, keeping user entries
    Update,
}

impl Commands {
    /// Execute the command
    pub async fn run(self, session: &Session) -> Result<()> {
        match self {
            Self::Hardware { command } => match command {
                HardwareCommands::List => hardware::execute_list(session),
                HardwareCommands::Add {
                    id,
                    name,
                    arch,
                    args,
                } => hardware::execute_add(session, &id, &name, &arch, &args),
                HardwareCommands::Remove { id } => hardware::execute_remove(session, &id),
            },
            Self::Os { command } => match command {
                OsCommands::List => os::execute_list(session),
                OsCommands::Add {
                    id,
                    name,
                    details,
                    firmware,
                    hardware,
                    url,
                } => {
                    let options = os::AddOptions {
                        id,
                        name,
                        details,
                        firmware,
                        hardware,
                        url,
                    };
                    os::execute_add(session, &options)
                }
                OsCommands::Remove { id } => os::execute_remove(session, &id),
            },
            Self::Firmware { command } => match command {
                FirmwareCommands::List => firmware::execute_list(session),
                FirmwareCommands::Add { id, url } => {
                    firmware::execute_add(session, &id, &url).await
                }
                FirmwareCommands::Remove { id } => firmware::execute_remove(session, &id),
            },
            Self::Image { command } => match command {
                ImageCommands::List => image::execute_list(session),
                ImageCommands::Create { name, hardware, os } => {
                    image::execute_create(session, &name, &hardware, &os).await
                }
                ImageCommands::Remove { id } => image::execute_remove(session, &id),
                ImageCommands::Path { id } => image::execute_path(session, &id),
            },
            Self::Cmd { image } => cmd::execute(session, image.as_deref()).await,
            Self::Run { image } => run::execute(session, image.as_deref()).await,
            Self::Defaults { command } => match command {
                DefaultsCommands::Update => defaults::execute_update(session),
            },
            Self::Status => status::execute(session),
            Self::Catalog => catalog::execute(session),
        }
    }
}

use clap::{Args, Command, CommandFactory, Parser, Subcommand, ValueEnum};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

impl From<CompletionShell> for clap_complete::Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => clap_complete::Shell::Bash,
            CompletionShell::Zsh => clap_complete::Shell::Zsh,
            CompletionShell::Fish => clap_complete::Shell::Fish,
            CompletionShell::Powershell => clap_complete::Shell::PowerShell,
        }
    }
}

/// Returns the version string, including the git hash for non-release builds.
/// Format: "0.1.0" for releases, "0.1.0@abc1234" for dev builds
pub fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" || GIT_HASH.is_empty() {
            VERSION.to_string()
        } else {
            format!("{}@{}", VERSION, GIT_HASH)
        }
    })
}

/// The version compared against published releases, without build metadata.
pub fn release_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[derive(Parser, Debug)]
#[command(
    name = "lnbot",
    bin_name = "lnbot",
    version = get_version(),
    about = "Lightning wallets for agents",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Target a specific wallet
    #[arg(short, long, global = true, value_name = "NAME")]
    pub wallet: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Skip confirmation prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Verbose logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Command group definitions for help output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandGroup {
    Start,
    Money,
    Identity,
    Security,
    Integrations,
    Other,
}

impl CommandGroup {
    pub fn heading(&self) -> &'static str {
        match self {
            CommandGroup::Start => "Getting Started:",
            CommandGroup::Money => "Money:",
            CommandGroup::Identity => "Identity:",
            CommandGroup::Security => "Security:",
            CommandGroup::Integrations => "Integrations:",
            CommandGroup::Other => "Additional:",
        }
    }

    /// Returns the group for a given command name
    pub fn for_command(name: &str) -> Option<Self> {
        match name {
            "init" | "wallet" => Some(CommandGroup::Start),
            "balance" | "invoice" | "pay" | "payment" | "transactions" => {
                Some(CommandGroup::Money)
            }
            "address" | "whoami" | "status" => Some(CommandGroup::Identity),
            "key" | "backup" | "restore" => Some(CommandGroup::Security),
            "webhook" | "mcp" => Some(CommandGroup::Integrations),
            "update" | "completion" | "version" | "help" => Some(CommandGroup::Other),
            _ => None,
        }
    }

    /// Returns all groups in display order
    pub fn all() -> &'static [CommandGroup] {
        &[
            CommandGroup::Start,
            CommandGroup::Money,
            CommandGroup::Identity,
            CommandGroup::Security,
            CommandGroup::Integrations,
            CommandGroup::Other,
        ]
    }
}

const EXAMPLES: &str = "  $ lnbot init
  $ lnbot wallet create --name agent01
  $ lnbot invoice create --amount 1000 --memo \"coffee\"
  $ lnbot pay alice@ln.bot --amount 500
  $ lnbot balance";

/// Returns the grouped top-level help
pub fn get_grouped_help(cmd: &Command) -> String {
    let mut output = String::new();
    output.push_str("ln.bot, Bitcoin Lightning wallets for AI agents\n");
    output.push('\n');
    output.push_str("Usage: lnbot [OPTIONS] <COMMAND>\n");

    let subcommands: Vec<_> = cmd.get_subcommands().collect();
    for group in CommandGroup::all() {
        let group_cmds: Vec<_> = subcommands
            .iter()
            .filter(|sc| {
                !sc.is_hide_set() && CommandGroup::for_command(sc.get_name()) == Some(*group)
            })
            .collect();

        if !group_cmds.is_empty() {
            output.push('\n');
            output.push_str(&format!("{}\n", group.heading()));
            for sc in group_cmds {
                let name = sc.get_name();
                let about = sc.get_about().map(|s| s.to_string()).unwrap_or_default();
                output.push_str(&format!("  {:<14} {}\n", name, about));
            }
        }
    }

    output.push('\n');
    output.push_str("Options:\n");
    output.push_str("  -w, --wallet <NAME>  Target a specific wallet\n");
    output.push_str("      --json           Output as JSON\n");
    output.push_str("  -y, --yes            Skip confirmation prompts\n");
    output.push_str("  -v, --verbose        Verbose logging on stderr\n");
    output.push_str("  -h, --help           Print help\n");
    output.push_str("  -V, --version        Print version\n");
    output.push('\n');
    output.push_str("Examples:\n");
    output.push_str(EXAMPLES);
    output.push('\n');
    output.push('\n');
    output.push_str("Docs: https://ln.bot/docs\n");
    output
}

/// The clap command with the grouped top-level help installed.
pub fn build_command() -> Command {
    let cmd = Cli::command();
    let help = get_grouped_help(&cmd);
    cmd.override_help(help)
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create local config file
    Init,

    /// Create, list, switch, rename, and delete wallets
    Wallet {
        #[command(subcommand)]
        command: WalletCommands,
    },

    /// Show wallet balance
    Balance,

    /// Create and list Lightning invoices
    Invoice {
        #[command(subcommand)]
        command: InvoiceCommands,
    },

    /// Send sats to a Lightning address, LNURL or BOLT11 invoice
    Pay(PayArgs),

    /// List outgoing payments
    Payment {
        #[command(subcommand)]
        command: PaymentCommands,
    },

    /// List all transaction history
    #[command(visible_aliases = ["tx", "txns"])]
    Transactions {
        /// Max number of results
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },

    /// Manage Lightning addresses
    Address {
        #[command(subcommand)]
        command: AddressCommands,
    },

    /// Show current wallet info
    Whoami,

    /// Wallet status and API health
    Status,

    /// Show or rotate API keys
    Key {
        #[command(subcommand)]
        command: KeyCommands,
    },

    /// Back up wallet credentials
    Backup {
        #[command(subcommand)]
        command: BackupCommands,
    },

    /// Restore a wallet from backup
    Restore {
        #[command(subcommand)]
        command: RestoreCommands,
    },

    /// Manage webhook endpoints
    Webhook {
        #[command(subcommand)]
        command: WebhookCommands,
    },

    /// MCP server config for AI agents
    Mcp {
        #[command(subcommand)]
        command: McpCommands,
    },

    /// Check for updates or show upgrade instructions
    Update,

    /// Generate shell completion scripts
    Completion {
        #[arg(value_enum)]
        shell: CompletionShell,
    },

    /// Print lnbot version
    Version,
}

#[derive(Subcommand, Debug)]
pub enum WalletCommands {
    /// Create a new wallet
    Create {
        /// Wallet name (auto-generated if omitted)
        #[arg(long)]
        name: Option<String>,
    },

    /// List wallets in local config
    #[command(alias = "ls")]
    List,

    /// Switch the active wallet
    Use {
        /// Wallet name or id
        #[arg(value_name = "NAME|ID")]
        target: String,
    },

    /// Remove a wallet from local config (it keeps existing on the server)
    Delete {
        /// Wallet to remove; the active one when omitted
        name: Option<String>,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Rename the active wallet
    Rename {
        #[arg(value_name = "NEW_NAME")]
        new_name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum InvoiceCommands {
    /// Create a Lightning invoice to receive sats, then wait for payment
    Create {
        /// Amount in sats
        #[arg(long, allow_negative_numbers = true)]
        amount: i64,

        /// Short description attached to the invoice
        #[arg(long)]
        memo: Option<String>,
    },

    /// List invoices
    #[command(alias = "ls")]
    List {
        /// Max number of results
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

#[derive(Args, Debug)]
pub struct PayArgs {
    /// Lightning address, LNURL or BOLT11 invoice
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Amount in sats (required for Lightning addresses and LNURLs)
    #[arg(long, allow_negative_numbers = true)]
    pub amount: Option<i64>,

    /// Maximum routing fee in sats
    #[arg(long)]
    pub max_fee: Option<i64>,
}

#[derive(Subcommand, Debug)]
pub enum PaymentCommands {
    /// List outgoing payments
    #[command(alias = "ls")]
    List {
        /// Max number of results
        #[arg(long, default_value_t = 20)]
        limit: u32,

        /// Show results after this payment number (for pagination)
        #[arg(long)]
        after: Option<u64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum AddressCommands {
    /// List Lightning addresses
    #[command(alias = "ls")]
    List,

    /// Buy a vanity Lightning address
    Buy { name: String },

    /// Transfer an address to another wallet
    Transfer {
        address: String,

        /// Target wallet name (from local config)
        #[arg(long)]
        to: Option<String>,

        /// Target wallet API key (if not in local config)
        #[arg(long)]
        target_key: Option<String>,
    },

    /// Delete a Lightning address
    Delete { address: String },
}

#[derive(Subcommand, Debug)]
pub enum KeyCommands {
    /// Show API keys from local config
    Show,

    /// Rotate an API key (0 = primary, 1 = secondary)
    Rotate { slot: String },
}

#[derive(Subcommand, Debug)]
pub enum BackupCommands {
    /// Generate a 12-word recovery passphrase
    Recovery,

    /// Register a passkey (browser only)
    Passkey,
}

#[derive(Subcommand, Debug)]
pub enum RestoreCommands {
    /// Restore a wallet via recovery passphrase
    Recovery {
        /// 12-word recovery passphrase
        #[arg(long)]
        passphrase: String,
    },

    /// Restore via passkey (browser only)
    Passkey,
}

#[derive(Subcommand, Debug)]
pub enum WebhookCommands {
    /// Register a webhook endpoint
    Create {
        /// Webhook endpoint URL
        #[arg(long)]
        url: String,
    },

    /// List webhook endpoints
    #[command(alias = "ls")]
    List,

    /// Delete a webhook endpoint
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum McpCommands {
    /// Print MCP server configuration JSON
    Config {
        /// Generate remote config (required for now)
        #[arg(long)]
        remote: bool,
    },

    /// Start local MCP server (coming soon)
    Serve,
}

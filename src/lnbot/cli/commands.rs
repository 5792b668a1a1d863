use super::render::{print_messages, print_output, render_update, render_update_notice};
use super::setup::{
    build_command, get_version, release_version, AddressCommands, BackupCommands, Cli, Commands,
    CompletionShell, InvoiceCommands, KeyCommands, McpCommands, PayArgs, PaymentCommands,
    RestoreCommands, WalletCommands, WebhookCommands,
};
use clap::{CommandFactory, FromArgMatches};
use lnbot::api::{LnbotApi, Output, PaymentRequest, TransferTarget};
use lnbot::client::http::HttpConnector;
use lnbot::commands::{address, keys, CmdResult};
use lnbot::config::{Settings, LOG_ENV};
use lnbot::error::Result;
use lnbot::store::fs::FileStore;
use crossbeam_channel::Receiver;
use lnbot::update::{UpdateCheck, UpdateChecker};
use lnbot::watch::CancelSignal;
use std::io::{BufRead, IsTerminal, Write};
use std::time::Duration;

/// How long a finished command waits for the background update check.
const UPDATE_NOTICE_WAIT: Duration = Duration::from_millis(300);

struct AppContext {
    api: LnbotApi<FileStore, HttpConnector>,
    settings: Settings,
    wallet: Option<String>,
    json: bool,
    yes: bool,
}

impl AppContext {
    fn wallet(&self) -> Option<&str> {
        self.wallet.as_deref()
    }

    fn print(&self, result: &CmdResult) -> Result<()> {
        print_messages(&result.messages, self.json);
        print_output(&result.output, self.json)
    }

    /// Asks on stdout and reads one line from stdin. `--yes` answers for
    /// the user. A refusal prints "Cancelled.".
    fn confirm(&self, prompt: &str) -> Result<bool> {
        if self.yes {
            return Ok(true);
        }
        print!("{} (y/N) ", prompt);
        std::io::stdout().flush()?;
        let mut answer = String::new();
        std::io::stdin().lock().read_line(&mut answer)?;
        let accepted = matches!(answer.trim(), "y" | "Y");
        if !accepted {
            println!("Cancelled.");
        }
        Ok(accepted)
    }
}

pub fn run() -> Result<()> {
    let matches = build_command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    init_logging(cli.verbose);

    // Neither touches the registry nor the network.
    match &cli.command {
        Commands::Completion { shell } => return handle_completion(*shell),
        Commands::Version => {
            println!("lnbot {}", get_version());
            return Ok(());
        }
        _ => {}
    }

    let ctx = init_context(&cli)?;
    let text_mode = !ctx.json;
    let is_update = matches!(cli.command, Commands::Update);
    let pending_update = (text_mode && !is_update && std::io::stderr().is_terminal())
        .then(|| spawn_update_check(&ctx.settings));

    let outcome = match cli.command {
        Commands::Init => handle_init(&ctx),
        Commands::Wallet { command } => handle_wallet(&ctx, command),
        Commands::Balance => ctx.print(&ctx.api.balance(ctx.wallet())?),
        Commands::Status => ctx.print(&ctx.api.status(ctx.wallet())?),
        Commands::Whoami => ctx.print(&ctx.api.whoami(ctx.wallet(), true)?),
        Commands::Invoice { command } => handle_invoice(&ctx, command),
        Commands::Pay(args) => handle_pay(&ctx, args),
        Commands::Payment {
            command: PaymentCommands::List { limit, after },
        } => ctx.print(&ctx.api.payment_list(ctx.wallet(), limit, after)?),
        Commands::Transactions { limit } => {
            ctx.print(&ctx.api.transactions(ctx.wallet(), limit)?)
        }
        Commands::Address { command } => handle_address(&ctx, command),
        Commands::Key { command } => handle_key(&ctx, command),
        Commands::Backup { command } => match command {
            BackupCommands::Recovery => ctx.print(&ctx.api.backup_recovery(ctx.wallet())?),
            BackupCommands::Passkey => ctx.print(&ctx.api.backup_passkey()?),
        },
        Commands::Restore { command } => match command {
            RestoreCommands::Recovery { passphrase } => {
                ctx.print(&ctx.api.restore_recovery(&passphrase)?)
            }
            RestoreCommands::Passkey => ctx.print(&ctx.api.restore_passkey()?),
        },
        Commands::Webhook { command } => handle_webhook(&ctx, command),
        Commands::Mcp { command } => match command {
            McpCommands::Config { remote } => {
                ctx.print(&ctx.api.mcp_config(ctx.wallet(), remote)?)
            }
            McpCommands::Serve => ctx.print(&ctx.api.mcp_serve()),
        },
        Commands::Update => handle_update(&ctx),
        Commands::Completion { .. } | Commands::Version => Ok(()),
    };
    outcome?;

    if let Some(check) = pending_update.and_then(|rx| finished_within(&rx, UPDATE_NOTICE_WAIT)) {
        notify_update(&check);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::new().filter_or(LOG_ENV, default))
        .format_timestamp(None)
        .try_init();
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let settings = Settings::from_env();
    log::debug!("registry at {}", settings.registry_path.display());
    let store = FileStore::new(&settings.registry_path);
    let connector = HttpConnector::new(settings.api_url.clone())?;
    Ok(AppContext {
        api: LnbotApi::new(store, connector, settings.api_url.clone()),
        settings,
        wallet: cli.wallet.clone(),
        json: cli.json,
        yes: cli.yes,
    })
}

fn handle_init(ctx: &AppContext) -> Result<()> {
    ctx.print(&ctx.api.init()?)
}

fn handle_wallet(ctx: &AppContext, command: WalletCommands) -> Result<()> {
    match command {
        WalletCommands::Create { name } => ctx.print(&ctx.api.wallet_create(name.as_deref())?),
        WalletCommands::List => ctx.print(&ctx.api.wallet_list()?),
        WalletCommands::Use { target } => ctx.print(&ctx.api.wallet_use(&target)?),
        WalletCommands::Delete { name, force } => {
            let credential = ctx.api.resolve(name.as_deref().or(ctx.wallet()))?;
            if !force {
                let prompt = format!(
                    "Remove '{}' ({}) from config?",
                    credential.name, credential.record.id
                );
                if !ctx.confirm(&prompt)? {
                    return Ok(());
                }
            }
            ctx.print(&ctx.api.wallet_delete(Some(&credential.name))?)
        }
        WalletCommands::Rename { new_name } => {
            ctx.print(&ctx.api.wallet_rename(ctx.wallet(), &new_name)?)
        }
    }
}

fn handle_invoice(ctx: &AppContext, command: InvoiceCommands) -> Result<()> {
    match command {
        InvoiceCommands::Create { amount, memo } => {
            let created = ctx
                .api
                .invoice_create(ctx.wallet(), amount, memo.as_deref())?;
            ctx.print(&created)?;
            if ctx.json {
                return Ok(());
            }
            let Output::Invoice(invoice) = created.output else {
                return Ok(());
            };
            println!();
            println!("  Waiting for payment... (Ctrl+C to stop)");
            let cancel = CancelSignal::on_interrupt()?;
            let waited = ctx.api.invoice_wait(ctx.wallet(), invoice, &cancel)?;
            ctx.print(&waited)
        }
        InvoiceCommands::List { limit } => ctx.print(&ctx.api.invoice_list(ctx.wallet(), limit)?),
    }
}

fn handle_pay(ctx: &AppContext, args: PayArgs) -> Result<()> {
    let request = PaymentRequest::parse(&args.target, args.amount, args.max_fee)?;
    ctx.api.resolve(ctx.wallet())?;
    if !ctx.confirm(&request.confirmation_prompt())? {
        return Ok(());
    }
    let cancel = CancelSignal::on_interrupt()?;
    ctx.print(&ctx.api.pay(ctx.wallet(), &request, &cancel)?)
}

fn handle_address(ctx: &AppContext, command: AddressCommands) -> Result<()> {
    match command {
        AddressCommands::List => ctx.print(&ctx.api.address_list(ctx.wallet())?),
        AddressCommands::Buy { name } => {
            ctx.api.resolve(ctx.wallet())?;
            if !ctx.confirm(&address::buy_prompt(&name))? {
                return Ok(());
            }
            ctx.print(&ctx.api.address_buy(ctx.wallet(), &name)?)
        }
        AddressCommands::Transfer {
            address,
            to,
            target_key,
        } => {
            let target = TransferTarget::from_flags(to.as_deref(), target_key.as_deref())?;
            let key = ctx.api.transfer_key(&target)?;
            ctx.api.resolve(ctx.wallet())?;
            if !ctx.confirm(&target.prompt(&address))? {
                return Ok(());
            }
            ctx.print(&ctx.api.address_transfer(ctx.wallet(), &address, &key)?)
        }
        AddressCommands::Delete { address } => {
            ctx.api.resolve(ctx.wallet())?;
            if !ctx.confirm(&format!("Delete address {}?", address))? {
                return Ok(());
            }
            ctx.print(&ctx.api.address_delete(ctx.wallet(), &address)?)
        }
    }
}

fn handle_key(ctx: &AppContext, command: KeyCommands) -> Result<()> {
    match command {
        KeyCommands::Show => ctx.print(&ctx.api.key_show(ctx.wallet())?),
        KeyCommands::Rotate { slot } => {
            let slot = keys::parse_slot(&slot)?;
            ctx.api.resolve(ctx.wallet())?;
            let prompt = format!(
                "Rotate {} key? The old key will stop working.",
                slot.label()
            );
            if !ctx.confirm(&prompt)? {
                return Ok(());
            }
            ctx.print(&ctx.api.key_rotate(ctx.wallet(), slot)?)
        }
    }
}

fn handle_webhook(ctx: &AppContext, command: WebhookCommands) -> Result<()> {
    match command {
        WebhookCommands::Create { url } => ctx.print(&ctx.api.webhook_create(ctx.wallet(), &url)?),
        WebhookCommands::List => ctx.print(&ctx.api.webhook_list(ctx.wallet())?),
        WebhookCommands::Delete { id } => ctx.print(&ctx.api.webhook_delete(ctx.wallet(), &id)?),
    }
}

fn handle_update(ctx: &AppContext) -> Result<()> {
    let current = release_version();
    let checker = UpdateChecker::new(
        &ctx.settings.update_cache_path,
        ctx.settings.update_check_disabled,
    );
    let check = checker.check(current);
    print!("{}", render_update(current, &check, cfg!(windows)));
    Ok(())
}

/// Starts the update check on its own thread so the command never waits
/// on the release endpoint.
fn spawn_update_check(settings: &Settings) -> Receiver<UpdateCheck> {
    let cache_path = settings.update_cache_path.clone();
    let disabled = settings.update_check_disabled;
    run_in_background(move || UpdateChecker::new(cache_path, disabled).check(release_version()))
}

fn run_in_background<F>(check: F) -> Receiver<UpdateCheck>
where
    F: FnOnce() -> UpdateCheck + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::bounded(1);
    std::thread::spawn(move || {
        let _ = tx.send(check());
    });
    rx
}

/// The check result if it arrives before `deadline`; a slow check is
/// abandoned.
fn finished_within(rx: &Receiver<UpdateCheck>, deadline: Duration) -> Option<UpdateCheck> {
    rx.recv_timeout(deadline).ok()
}

fn notify_update(check: &UpdateCheck) {
    if let Some(latest) = check.latest.as_deref().filter(|_| check.available) {
        eprintln!();
        eprintln!("{}", render_update_notice(release_version(), latest));
    }
}

fn handle_completion(shell: CompletionShell) -> Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(
        clap_complete::Shell::from(shell),
        &mut cmd,
        "lnbot",
        &mut std::io::stdout(),
    );
    Ok(())
}

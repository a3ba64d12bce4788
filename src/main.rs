use color_eyre::eyre::{
    Result,
    eyre,
};
use murmurations::{
    client::{
        self,
        ConnectionController,
    },
    config,
    contract::NftContract,
    wallets,
};
use std::sync::OnceLock;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling,
};
use tracing_subscriber::{
    EnvFilter,
    fmt,
};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn print_usage_and_exit() -> ! {
    println!(
        "Usage: murmurations [--rpc-url <url>] [--wallet <name>] [--wallet-dir <path>] [--unlock]\n\
         \n\
         Flags:\n\
           --rpc-url <url>     Ethereum JSON-RPC endpoint (default {})\n\
           --wallet <name>     Keystore wallet to connect with; omit to run without a wallet\n\
           --wallet-dir <path> Override the keystore directory (defaults to ~/.ethereum/keystore)\n\
           --unlock            Unlock the wallet at startup instead of on first connect",
        config::DEFAULT_LOCAL_RPC_URL,
    );
    std::process::exit(0);
}

struct AppArgs {
    rpc_url: String,
    wallet: Option<String>,
    wallet_dir: Option<String>,
    unlock: bool,
}

fn parse_cli_args() -> Result<AppArgs> {
    let mut args = std::env::args().skip(1);
    let mut rpc_url: Option<String> = None;
    let mut wallet: Option<String> = None;
    let mut wallet_dir: Option<String> = None;
    let mut unlock = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--rpc-url" => {
                let url = args
                    .next()
                    .ok_or_else(|| eyre!("--rpc-url requires a URL argument"))?;
                if rpc_url.is_some() {
                    return Err(eyre!("--rpc-url may only be specified once"));
                }
                rpc_url = Some(url);
            }
            "--wallet" => {
                let name = args
                    .next()
                    .ok_or_else(|| eyre!("--wallet requires a wallet name"))?;
                if wallet.is_some() {
                    return Err(eyre!("--wallet may only be specified once"));
                }
                wallet = Some(name);
            }
            "--wallet-dir" => {
                let dir = args
                    .next()
                    .ok_or_else(|| eyre!("--wallet-dir requires a path argument"))?;
                if wallet_dir.is_some() {
                    return Err(eyre!("--wallet-dir may only be specified once"));
                }
                wallet_dir = Some(dir);
            }
            "--unlock" => unlock = true,
            "--help" | "-h" => print_usage_and_exit(),
            other => return Err(eyre!("Unknown argument: {other}")),
        }
    }

    Ok(AppArgs {
        rpc_url: rpc_url.unwrap_or_else(|| config::DEFAULT_LOCAL_RPC_URL.to_string()),
        wallet,
        wallet_dir,
        unlock,
    })
}

fn init_logging() {
    // The terminal belongs to the page; logs go to a rolling file.
    let appender = rolling::daily("logs", "murmurations.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_logging();
    let args = parse_cli_args()?;
    tracing::info!("starting murmurations mint page");

    let session = wallets::WalletSession::default();
    let provider = match args.wallet.as_deref() {
        Some(name) => {
            let dir = wallets::resolve_wallet_dir(args.wallet_dir.as_deref())?;
            let descriptor = wallets::find_wallet(&dir, name)?;
            if args.unlock {
                let signer = wallets::unlock_wallet(&descriptor).await?;
                session.authorize(signer);
            }
            Some(wallets::KeystoreWallet::new(
                descriptor,
                args.rpc_url.clone(),
                session.clone(),
            ))
        }
        None => None,
    };
    let contract = NftContract::new(&config::TARGET_CHAIN, args.rpc_url.clone(), session)?;
    let controller = ConnectionController::new(provider, contract, config::TARGET_CHAIN);
    client::run_app(controller).await
}

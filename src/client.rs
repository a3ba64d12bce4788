use crate::{
    config::{
        self,
        TargetChain,
    },
    ui,
};
use alloy_primitives::{
    Address,
    U256,
};
use color_eyre::eyre::Result;
use std::future;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
};
use tracing::{
    error,
    info,
    warn,
};

const MAX_RETAINED_ERRORS: usize = 50;

/// Observable wallet-session state. `account` is `None` iff no session has been
/// established; `chain_id` is only meaningful while `account` is set.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConnectionState {
    pub account: Option<Address>,
    pub chain_id: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChainGate {
    Disconnected,
    WrongChain,
    ReadyToMint,
}

/// Read-only classifier over ConnectionState; recomputed on every render.
pub fn classify(state: &ConnectionState, target: &TargetChain) -> ChainGate {
    match (&state.account, state.chain_id.as_deref()) {
        (None, _) => ChainGate::Disconnected,
        (Some(_), Some(id)) if id == target.chain_id => ChainGate::ReadyToMint,
        (Some(_), _) => ChainGate::WrongChain,
    }
}

/// Injected wallet capability. Mirrors the request surface the page depends on:
/// `eth_accounts`, `eth_requestAccounts`, `eth_chainId`.
pub trait WalletProvider {
    /// Accounts this page is already authorized to use. Must not prompt.
    fn accounts(&self) -> impl Future<Output = Result<Vec<Address>>>;

    /// Interactive authorization. May fail if the user declines.
    fn request_accounts(&self) -> impl Future<Output = Result<Vec<Address>>>;

    /// Identifier of the currently active network, as a hex string.
    fn chain_id(&self) -> impl Future<Output = Result<String>>;
}

/// Client of the fixed mint contract.
pub trait ContractClient {
    /// Submit the mint call and await on-chain confirmation.
    fn mint(&self) -> impl Future<Output = Result<MintReceipt>>;

    /// Subscribe to the contract's mint event stream.
    fn subscribe_mint_events(&self) -> impl Future<Output = Result<MintEventSubscription>>;
}

#[derive(Clone, Debug)]
pub struct MintReceipt {
    pub tx_hash: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MintEvent {
    pub from: Address,
    pub token_id: U256,
}

/// Owned handle to the contract's mint-event stream. Dropping the handle tears
/// the forwarding task down, so a listener cannot outlive its owner.
pub struct MintEventSubscription {
    rx: mpsc::UnboundedReceiver<MintEvent>,
    task: Option<JoinHandle<()>>,
}

impl MintEventSubscription {
    pub fn new(rx: mpsc::UnboundedReceiver<MintEvent>, task: Option<JoinHandle<()>>) -> Self {
        Self { rx, task }
    }

    pub async fn recv(&mut self) -> Option<MintEvent> {
        self.rx.recv().await
    }
}

impl Drop for MintEventSubscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectOutcome {
    Connected,
    MissingProvider,
    NoAccounts,
    Failed,
}

#[derive(Clone, Debug)]
pub struct AppSnapshot {
    pub gate: ChainGate,
    pub account: Option<Address>,
    pub chain_id: Option<String>,
    pub status: String,
    pub errors: Vec<String>,
}

pub struct ConnectionController<P, C> {
    provider: Option<P>,
    contract: C,
    target: TargetChain,
    state: ConnectionState,
    mint_events: Option<MintEventSubscription>,
    mint_in_flight: bool,
    pub status: String,
    errors: Vec<String>,
}

impl<P: WalletProvider, C: ContractClient> ConnectionController<P, C> {
    pub fn new(provider: Option<P>, contract: C, target: TargetChain) -> Self {
        Self {
            provider,
            contract,
            target,
            state: ConnectionState::default(),
            mint_events: None,
            mint_in_flight: false,
            status: String::from("Ready"),
            errors: Vec::new(),
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn target(&self) -> &TargetChain {
        &self.target
    }

    pub fn gate(&self) -> ChainGate {
        classify(&self.state, &self.target)
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn listener_registered(&self) -> bool {
        self.mint_events.is_some()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Startup probe for a session authorized in the past. Non-interactive;
    /// every failure mode leaves state untouched and is logged only.
    pub async fn check_existing_connection(&mut self) {
        let Some(provider) = self.provider.as_ref() else {
            info!("no wallet provider detected");
            return;
        };
        match provider.accounts().await {
            Ok(accounts) => match accounts.first() {
                Some(account) => {
                    let account = *account;
                    info!(%account, "found an authorized account");
                    if self.adopt_account(account).await {
                        self.status = format!("Connected as {account}");
                    }
                }
                None => info!("no authorized account found"),
            },
            Err(err) => warn!(error = %err, "account query failed"),
        }
    }

    /// Explicit connect action. Declined or failed authorization leaves state
    /// unchanged; only the missing-provider case is surfaced to the caller so
    /// the page can raise its alert.
    pub async fn request_connection(&mut self) -> ConnectOutcome {
        let Some(provider) = self.provider.as_ref() else {
            warn!("connect requested but no wallet provider is present");
            return ConnectOutcome::MissingProvider;
        };
        match provider.request_accounts().await {
            Ok(accounts) => match accounts.first() {
                Some(account) => {
                    let account = *account;
                    info!(%account, "wallet authorized");
                    if self.adopt_account(account).await {
                        self.status = format!("Connected as {account}");
                        ConnectOutcome::Connected
                    } else {
                        ConnectOutcome::Failed
                    }
                }
                None => {
                    warn!("wallet granted authorization with no accounts");
                    ConnectOutcome::NoAccounts
                }
            },
            Err(err) => {
                warn!(error = %err, "wallet authorization failed");
                ConnectOutcome::Failed
            }
        }
    }

    /// Route user intent to the contract. The chain gate is enforced here, not
    /// in the UI, so correctness does not depend on the caller.
    pub async fn submit_mint_request(&mut self) {
        match self.gate() {
            ChainGate::ReadyToMint => {}
            gate => {
                warn!(?gate, "mint refused; not connected to {}", self.target.name);
                return;
            }
        }
        if self.mint_in_flight {
            warn!("mint refused; another mint is pending");
            return;
        }
        self.mint_in_flight = true;
        self.status = String::from("Minting... confirm the transaction in your wallet");
        info!("submitting mint request");
        match self.contract.mint().await {
            Ok(receipt) => {
                info!(tx = %receipt.tx_hash, "mint confirmed");
                self.status = format!("Mined: {}", config::etherscan_tx_url(&receipt.tx_hash));
            }
            Err(err) => {
                self.push_error(format!("Mint failed: {err}"));
                self.status = String::from("Mint failed");
            }
        }
        self.mint_in_flight = false;
    }

    /// Resolves the next confirmed mint observed on-chain. Pends forever while
    /// no listener is registered, which makes it safe to park in a select arm.
    pub async fn next_mint_event(&mut self) -> MintEvent {
        loop {
            match self.mint_events.as_mut() {
                Some(sub) => match sub.recv().await {
                    Some(event) => return event,
                    None => {
                        warn!("mint event stream ended");
                        self.mint_events = None;
                    }
                },
                None => future::pending::<()>().await,
            }
        }
    }

    pub fn snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            gate: self.gate(),
            account: self.state.account,
            chain_id: self.state.chain_id.clone(),
            status: self.status.clone(),
            errors: self.errors.iter().rev().take(5).cloned().collect(),
        }
    }

    /// Commit a freshly authorized account. The chain id is fetched first so a
    /// failed query commits nothing at all.
    async fn adopt_account(&mut self, account: Address) -> bool {
        let Some(provider) = self.provider.as_ref() else {
            return false;
        };
        let chain_id = match provider.chain_id().await {
            Ok(id) => id,
            Err(err) => {
                warn!(error = %err, "chain id query failed");
                return false;
            }
        };
        info!(%chain_id, "active chain resolved");
        self.state.account = Some(account);
        self.state.chain_id = Some(chain_id);
        self.register_mint_listener().await;
        true
    }

    /// One active listener per page session, no matter how many times the user
    /// reconnects.
    async fn register_mint_listener(&mut self) {
        if self.mint_events.is_some() {
            return;
        }
        match self.contract.subscribe_mint_events().await {
            Ok(sub) => {
                info!("mint event listener registered");
                self.mint_events = Some(sub);
            }
            Err(err) => warn!(error = %err, "mint event subscription failed"),
        }
    }

    fn push_error(&mut self, message: String) {
        error!("{}", message);
        self.errors.push(message);
        if self.errors.len() > MAX_RETAINED_ERRORS {
            let drain = self.errors.len() - MAX_RETAINED_ERRORS;
            self.errors.drain(0..drain);
        }
    }
}

pub fn mint_success_notice(target: &TargetChain, event: &MintEvent) -> String {
    format!(
        "Hey there! We've minted your NFT and sent it to your wallet. It may be \
         blank right now; it can take up to 10 minutes to show up on OpenSea.\n\n{}",
        config::opensea_asset_url(target.contract_address, event.token_id),
    )
}

pub async fn run_app<P: WalletProvider, C: ContractClient>(
    mut controller: ConnectionController<P, C>,
) -> Result<()> {
    // Page load: passive wallet probe before anything renders.
    controller.check_existing_connection().await;

    let mut ui_state = ui::UiState::default();
    let mut input = ui::input_event_stream();

    ui::terminal_enter(&mut ui_state)?;
    let res = run_loop(&mut controller, &mut ui_state, &mut input).await;
    ui::terminal_exit()?;
    res
}

enum LoopEvent {
    Quit,
    Minted(MintEvent),
    User(ui::UserEvent),
}

async fn run_loop<P: WalletProvider, C: ContractClient>(
    controller: &mut ConnectionController<P, C>,
    ui_state: &mut ui::UiState,
    input: &mut ui::InputEvents,
) -> Result<()> {
    ui::draw(ui_state, &controller.snapshot())?;
    loop {
        // Resolve the select to an owned value first; the handlers below need
        // the controller the mint-event arm borrows.
        let loop_event = tokio::select! {
            _ = tokio::signal::ctrl_c() => LoopEvent::Quit,
            event = controller.next_mint_event() => LoopEvent::Minted(event),
            ev = ui::next_event(ui_state, input) => LoopEvent::User(ev?),
        };
        match loop_event {
            LoopEvent::Quit => break,
            LoopEvent::Minted(event) => {
                info!(from = %event.from, token_id = %event.token_id, "mint event observed");
                ui_state.open_alert(mint_success_notice(controller.target(), &event));
            }
            LoopEvent::User(ui::UserEvent::Quit) => break,
            LoopEvent::User(ui::UserEvent::Connect) => {
                if controller.has_provider() {
                    // The keystore prompts on the plain terminal; hand the tty
                    // back for the duration.
                    input.pause().await;
                    ui::terminal_exit()?;
                    let _ = controller.request_connection().await;
                    ui::terminal_enter(ui_state)?;
                    input.resume();
                } else if matches!(
                    controller.request_connection().await,
                    ConnectOutcome::MissingProvider
                ) {
                    ui_state.open_alert(config::WALLET_REQUIRED_NOTICE.to_string());
                }
            }
            LoopEvent::User(ui::UserEvent::Mint) => controller.submit_mint_request().await,
            LoopEvent::User(ui::UserEvent::Redraw) => {}
        }
        ui::draw(ui_state, &controller.snapshot())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TARGET_CHAIN;
    use proptest::prelude::*;

    fn account() -> Address {
        Address::repeat_byte(0x11)
    }

    #[test]
    fn classify__empty_state_is_disconnected() {
        let state = ConnectionState::default();
        assert_eq!(classify(&state, &TARGET_CHAIN), ChainGate::Disconnected);
    }

    #[test]
    fn classify__matching_chain_is_ready() {
        let state = ConnectionState {
            account: Some(account()),
            chain_id: Some(TARGET_CHAIN.chain_id.to_string()),
        };
        assert_eq!(classify(&state, &TARGET_CHAIN), ChainGate::ReadyToMint);
    }

    #[test]
    fn classify__other_chain_is_wrong_chain() {
        let state = ConnectionState {
            account: Some(account()),
            chain_id: Some(String::from("0x1")),
        };
        assert_eq!(classify(&state, &TARGET_CHAIN), ChainGate::WrongChain);
    }

    #[test]
    fn classify__account_with_unknown_chain_is_wrong_chain() {
        let state = ConnectionState {
            account: Some(account()),
            chain_id: None,
        };
        assert_eq!(classify(&state, &TARGET_CHAIN), ChainGate::WrongChain);
    }

    proptest! {
        #[test]
        fn classify__no_account_is_disconnected_on_any_chain(chain in "0x[0-9a-f]{1,8}") {
            let state = ConnectionState {
                account: None,
                chain_id: Some(chain),
            };
            prop_assert_eq!(classify(&state, &TARGET_CHAIN), ChainGate::Disconnected);
        }

        #[test]
        fn classify__mismatched_chain_never_mints(chain in "0x[0-9a-f]{1,8}") {
            prop_assume!(chain != TARGET_CHAIN.chain_id);
            let state = ConnectionState {
                account: Some(account()),
                chain_id: Some(chain),
            };
            prop_assert_eq!(classify(&state, &TARGET_CHAIN), ChainGate::WrongChain);
        }
    }
}

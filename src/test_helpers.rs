use crate::client::{
    ContractClient,
    MintEvent,
    MintEventSubscription,
    MintReceipt,
    WalletProvider,
};
use alloy_primitives::Address;
use color_eyre::eyre::{
    Result,
    eyre,
};
use std::sync::{
    Arc,
    Mutex,
    atomic::{
        AtomicBool,
        AtomicUsize,
        Ordering,
    },
};
use tokio::sync::mpsc;

pub fn test_account() -> Address {
    Address::repeat_byte(0x11)
}

/// Scriptable stand-in for the injected wallet.
#[derive(Clone, Debug, Default)]
pub struct FakeWallet {
    pub authorized_accounts: Vec<Address>,
    pub connectable_accounts: Vec<Address>,
    pub decline_connection: bool,
    pub fail_chain_query: bool,
    pub chain_id: String,
}

impl FakeWallet {
    pub fn on_chain(chain_id: impl Into<String>) -> Self {
        FakeWallet {
            chain_id: chain_id.into(),
            ..FakeWallet::default()
        }
    }

    pub fn authorized(mut self, account: Address) -> Self {
        self.authorized_accounts.push(account);
        self
    }

    pub fn connectable(mut self, account: Address) -> Self {
        self.connectable_accounts.push(account);
        self
    }

    pub fn declining(mut self) -> Self {
        self.decline_connection = true;
        self
    }

    pub fn with_broken_chain_query(mut self) -> Self {
        self.fail_chain_query = true;
        self
    }
}

impl WalletProvider for FakeWallet {
    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(self.authorized_accounts.clone())
    }

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        if self.decline_connection {
            return Err(eyre!("user rejected the request"));
        }
        Ok(self.connectable_accounts.clone())
    }

    async fn chain_id(&self) -> Result<String> {
        if self.fail_chain_query {
            return Err(eyre!("provider disconnected"));
        }
        Ok(self.chain_id.clone())
    }
}

/// Contract double that records calls and lets tests push mint events into
/// whatever subscription the controller registered.
#[derive(Clone, Default)]
pub struct FakeContract {
    inner: Arc<FakeContractInner>,
}

#[derive(Default)]
struct FakeContractInner {
    mint_calls: AtomicUsize,
    subscriptions: AtomicUsize,
    fail_mint: AtomicBool,
    event_feeds: Mutex<Vec<mpsc::UnboundedSender<MintEvent>>>,
}

impl FakeContract {
    pub fn mint_calls(&self) -> usize {
        self.inner.mint_calls.load(Ordering::SeqCst)
    }

    pub fn subscription_count(&self) -> usize {
        self.inner.subscriptions.load(Ordering::SeqCst)
    }

    pub fn fail_mints(&self) {
        self.inner.fail_mint.store(true, Ordering::SeqCst);
    }

    /// Deliver a confirmed mint to every registered listener.
    pub fn emit(&self, event: MintEvent) {
        let feeds = self
            .inner
            .event_feeds
            .lock()
            .expect("event feed lock poisoned");
        for feed in feeds.iter() {
            let _ = feed.send(event.clone());
        }
    }
}

impl ContractClient for FakeContract {
    async fn mint(&self) -> Result<MintReceipt> {
        self.inner.mint_calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_mint.load(Ordering::SeqCst) {
            return Err(eyre!("execution reverted"));
        }
        Ok(MintReceipt {
            tx_hash: String::from(
                "0x60a79acc467e2f3712cdb73fa4425e9e307dd556f8131dfcfd52e4ae6b659c23",
            ),
        })
    }

    async fn subscribe_mint_events(&self) -> Result<MintEventSubscription> {
        self.inner.subscriptions.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .event_feeds
            .lock()
            .expect("event feed lock poisoned")
            .push(tx);
        Ok(MintEventSubscription::new(rx, None))
    }
}

use crate::{
    client::{
        ContractClient,
        MintEvent,
        MintEventSubscription,
        MintReceipt,
    },
    config::TargetChain,
    nft_types::Murmurations::{
        self,
        NewEpicNFTMinted,
    },
    wallets::WalletSession,
};
use alloy_contract::Event;
use alloy_network::EthereumWallet;
use alloy_primitives::Address;
use alloy_provider::ProviderBuilder;
use alloy_rpc_types_eth::Filter;
use alloy_sol_types::SolEvent;
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use futures::StreamExt;
use std::str::FromStr;
use tokio::sync::mpsc;
use tracing::{
    info,
    warn,
};

/// Contract client bound to the page's fixed mint contract. Signing capability
/// comes from the shared wallet session at call time, so the instance used to
/// mint is always built around whichever signer is currently authorized.
pub struct NftContract {
    address: Address,
    rpc_url: String,
    session: WalletSession,
}

impl NftContract {
    pub fn new(
        target: &TargetChain,
        rpc_url: impl Into<String>,
        session: WalletSession,
    ) -> Result<Self> {
        let address = Address::from_str(target.contract_address)
            .wrap_err("Configured contract address is invalid")?;
        Ok(Self {
            address,
            rpc_url: rpc_url.into(),
            session,
        })
    }
}

impl ContractClient for NftContract {
    async fn mint(&self) -> Result<MintReceipt> {
        let signer = self
            .session
            .signer()
            .ok_or_else(|| eyre!("No signer available; connect a wallet first"))?;
        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(self.rpc_url.parse().wrap_err("Invalid RPC URL")?);
        let contract = Murmurations::new(self.address, provider);

        info!(contract = %self.address, "submitting mint transaction");
        let pending = contract
            .makeAnEpicNFT()
            .send()
            .await
            .wrap_err("Mint submission failed")?;
        let tx_hash = *pending.tx_hash();
        info!(%tx_hash, "mint pending, waiting for confirmation");

        let receipt = pending
            .get_receipt()
            .await
            .wrap_err("Mint confirmation failed")?;
        info!(tx = %receipt.transaction_hash, "mint confirmed");
        Ok(MintReceipt {
            tx_hash: receipt.transaction_hash.to_string(),
        })
    }

    async fn subscribe_mint_events(&self) -> Result<MintEventSubscription> {
        // Watching logs needs no signer; a read-only provider keeps the
        // subscription alive across reconnects. Built around an owned provider
        // so the poller can move into the forwarding task.
        let provider = ProviderBuilder::new()
            .connect_http(self.rpc_url.parse().wrap_err("Invalid RPC URL")?);
        let event: Event<_, NewEpicNFTMinted> = Event::new(provider, Filter::new())
            .address(self.address)
            .event_signature(NewEpicNFTMinted::SIGNATURE_HASH);
        let poller = event
            .watch()
            .await
            .wrap_err("Mint event subscription failed")?;

        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            // The poller holds only a weak handle to the RPC client; the
            // filter must stay alive for the life of the stream.
            let _event = event;
            let mut stream = poller.into_stream();
            while let Some(item) = stream.next().await {
                match item {
                    Ok((event, _log)) => {
                        let event = MintEvent {
                            from: event.sender,
                            token_id: event.tokenId,
                        };
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!(error = %err, "failed to decode mint event"),
                }
            }
        });
        Ok(MintEventSubscription::new(rx, Some(task)))
    }
}

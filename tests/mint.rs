use alloy_primitives::U256;
use murmurations::{
    client::{
        ChainGate,
        ConnectionController,
        MintEvent,
        mint_success_notice,
    },
    config::{
        CONTRACT_ADDRESS,
        TARGET_CHAIN,
    },
    test_helpers::{
        FakeContract,
        FakeWallet,
        test_account,
    },
};
use std::time::Duration;

fn controller(
    wallet: Option<FakeWallet>,
    contract: &FakeContract,
) -> ConnectionController<FakeWallet, FakeContract> {
    ConnectionController::new(wallet, contract.clone(), TARGET_CHAIN)
}

#[tokio::test]
async fn submit_mint_request__refused_while_disconnected() {
    let contract = FakeContract::default();
    let wallet = FakeWallet::on_chain("0x4").connectable(test_account());
    let mut page = controller(Some(wallet), &contract);

    page.submit_mint_request().await;

    assert_eq!(contract.mint_calls(), 0);
}

#[tokio::test]
async fn submit_mint_request__refused_on_wrong_chain() {
    let contract = FakeContract::default();
    let wallet = FakeWallet::on_chain("0x38").authorized(test_account());
    let mut page = controller(Some(wallet), &contract);
    page.check_existing_connection().await;
    assert_eq!(page.gate(), ChainGate::WrongChain);

    page.submit_mint_request().await;

    assert_eq!(contract.mint_calls(), 0);
}

#[tokio::test]
async fn submit_mint_request__submits_on_target_chain() {
    let contract = FakeContract::default();
    let wallet = FakeWallet::on_chain("0x4").authorized(test_account());
    let mut page = controller(Some(wallet), &contract);
    page.check_existing_connection().await;

    page.submit_mint_request().await;

    assert_eq!(contract.mint_calls(), 1);
    // Confirmation points the user at the block explorer.
    assert!(page.status.contains("rinkeby.etherscan.io/tx/"));
}

#[tokio::test]
async fn submit_mint_request__failure_is_recorded_and_state_kept() {
    let contract = FakeContract::default();
    contract.fail_mints();
    let wallet = FakeWallet::on_chain("0x4").authorized(test_account());
    let mut page = controller(Some(wallet), &contract);
    page.check_existing_connection().await;
    let before = page.state().clone();

    page.submit_mint_request().await;

    assert_eq!(contract.mint_calls(), 1);
    assert_eq!(*page.state(), before);
    assert_eq!(page.gate(), ChainGate::ReadyToMint);
    assert!(page.errors().iter().any(|e| e.contains("Mint failed")));
}

#[tokio::test]
async fn mint_event__notice_links_to_marketplace_asset() {
    let event = MintEvent {
        from: test_account(),
        token_id: U256::from(42u64),
    };

    let notice = mint_success_notice(&TARGET_CHAIN, &event);

    assert!(notice.contains(CONTRACT_ADDRESS));
    assert!(notice.contains("/42"));
}

#[tokio::test]
async fn mint_event__delivered_through_subscription() {
    let contract = FakeContract::default();
    let wallet = FakeWallet::on_chain("0x4").authorized(test_account());
    let mut page = controller(Some(wallet), &contract);
    page.check_existing_connection().await;

    let event = MintEvent {
        from: test_account(),
        token_id: U256::from(7u64),
    };
    contract.emit(event.clone());

    let received = tokio::time::timeout(Duration::from_millis(100), page.next_mint_event())
        .await
        .expect("mint event should be delivered");
    assert_eq!(received, event);
}

#[tokio::test]
async fn reconnect__registers_single_listener() {
    let contract = FakeContract::default();
    let wallet = FakeWallet::on_chain("0x4")
        .authorized(test_account())
        .connectable(test_account());
    let mut page = controller(Some(wallet), &contract);

    // Connect on page load, then reconnect manually in the same session.
    page.check_existing_connection().await;
    page.request_connection().await;

    assert_eq!(contract.subscription_count(), 1);

    // One on-chain event, one notification.
    contract.emit(MintEvent {
        from: test_account(),
        token_id: U256::from(42u64),
    });
    tokio::time::timeout(Duration::from_millis(100), page.next_mint_event())
        .await
        .expect("first notification should arrive");
    let second = tokio::time::timeout(Duration::from_millis(100), page.next_mint_event()).await;
    assert!(second.is_err(), "a single event must notify exactly once");
}

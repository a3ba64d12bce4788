use murmurations::{
    client::{
        ChainGate,
        ConnectOutcome,
        ConnectionController,
        ConnectionState,
    },
    config::TARGET_CHAIN,
    test_helpers::{
        FakeContract,
        FakeWallet,
        test_account,
    },
};

fn controller(
    wallet: Option<FakeWallet>,
    contract: &FakeContract,
) -> ConnectionController<FakeWallet, FakeContract> {
    ConnectionController::new(wallet, contract.clone(), TARGET_CHAIN)
}

#[tokio::test]
async fn check_existing_connection__zero_accounts_leaves_state_empty() {
    let contract = FakeContract::default();
    let wallet = FakeWallet::on_chain("0x4");
    let mut page = controller(Some(wallet), &contract);

    // when
    page.check_existing_connection().await;

    // then
    assert_eq!(*page.state(), ConnectionState::default());
    assert_eq!(page.gate(), ChainGate::Disconnected);
    assert!(!page.listener_registered());
}

#[tokio::test]
async fn check_existing_connection__missing_provider_is_silent() {
    let contract = FakeContract::default();
    let mut page = controller(None, &contract);

    page.check_existing_connection().await;

    assert_eq!(*page.state(), ConnectionState::default());
    assert!(!page.listener_registered());
}

#[tokio::test]
async fn check_existing_connection__adopts_first_authorized_account() {
    let contract = FakeContract::default();
    let other = alloy_primitives::Address::repeat_byte(0x22);
    let wallet = FakeWallet::on_chain("0x4")
        .authorized(test_account())
        .authorized(other);
    let mut page = controller(Some(wallet), &contract);

    page.check_existing_connection().await;

    assert_eq!(page.state().account, Some(test_account()));
    assert_eq!(page.state().chain_id.as_deref(), Some("0x4"));
    assert_eq!(page.gate(), ChainGate::ReadyToMint);
    assert!(page.listener_registered());
}

#[tokio::test]
async fn check_existing_connection__foreign_chain_classifies_wrong_chain() {
    let contract = FakeContract::default();
    let wallet = FakeWallet::on_chain("0x1").authorized(test_account());
    let mut page = controller(Some(wallet), &contract);

    page.check_existing_connection().await;

    assert_eq!(page.state().account, Some(test_account()));
    assert_eq!(page.gate(), ChainGate::WrongChain);
}

#[tokio::test]
async fn request_connection__missing_provider_signals_user() {
    let contract = FakeContract::default();
    let mut page = controller(None, &contract);

    let outcome = page.request_connection().await;

    assert_eq!(outcome, ConnectOutcome::MissingProvider);
    assert_eq!(*page.state(), ConnectionState::default());
}

#[tokio::test]
async fn request_connection__declined_leaves_state_unchanged() {
    let contract = FakeContract::default();
    let wallet = FakeWallet::on_chain("0x4")
        .connectable(test_account())
        .declining();
    let mut page = controller(Some(wallet), &contract);

    let outcome = page.request_connection().await;

    assert_eq!(outcome, ConnectOutcome::Failed);
    assert_eq!(*page.state(), ConnectionState::default());
    assert!(!page.listener_registered());
}

#[tokio::test]
async fn request_connection__connects_and_registers_listener() {
    let contract = FakeContract::default();
    let wallet = FakeWallet::on_chain("0x4").connectable(test_account());
    let mut page = controller(Some(wallet), &contract);

    let outcome = page.request_connection().await;

    assert_eq!(outcome, ConnectOutcome::Connected);
    assert_eq!(page.state().account, Some(test_account()));
    assert_eq!(page.state().chain_id.as_deref(), Some("0x4"));
    assert_eq!(contract.subscription_count(), 1);
}

#[tokio::test]
async fn request_connection__chain_query_failure_commits_nothing() {
    let contract = FakeContract::default();
    let wallet = FakeWallet::on_chain("0x4")
        .connectable(test_account())
        .with_broken_chain_query();
    let mut page = controller(Some(wallet), &contract);

    let outcome = page.request_connection().await;

    // No partial mutation: neither field may be set on a failed connect.
    assert_eq!(outcome, ConnectOutcome::Failed);
    assert_eq!(*page.state(), ConnectionState::default());
    assert!(!page.listener_registered());
}

#[tokio::test]
async fn request_connection__empty_grant_leaves_state_unchanged() {
    let contract = FakeContract::default();
    let wallet = FakeWallet::on_chain("0x4");
    let mut page = controller(Some(wallet), &contract);

    let outcome = page.request_connection().await;

    assert_eq!(outcome, ConnectOutcome::NoAccounts);
    assert_eq!(*page.state(), ConnectionState::default());
}

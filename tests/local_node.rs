use perps_console::{
    Chain,
    dashboard::{CreationStatus, Dashboard},
    error::PerpsError,
    form::NewMarketForm,
    testing::{self, TEST_MARKET_PROXY, TestNode},
};

/// Tests the connection of a local signer to a node running the required chain.
#[tokio::test]
async fn test_connect_local_wallet() {
    let node = TestNode::new(84532);
    let wallet = node.wallet(0);
    let address = wallet.address();
    let mut dashboard = Dashboard::new(node.chain(), wallet);

    assert_eq!(dashboard.connect().await.unwrap(), address);
    assert_eq!(dashboard.chain_id(), Some(84532));
    assert!(dashboard.is_on_required_chain());
}

#[tokio::test]
async fn test_local_wallet_can_not_switch_chain() {
    let node = TestNode::new(31337);
    let mut dashboard = Dashboard::new(Chain::base_sepolia(), node.wallet(0));

    assert!(matches!(
        dashboard.connect().await,
        Err(PerpsError::ChainSwitchUnsupported(84532))
    ));
    assert_eq!(
        dashboard.error(),
        Some("wallet can not switch to chain 84532")
    );
    assert!(!dashboard.is_connected());
}

#[tokio::test]
async fn test_fetch_markets_without_contract() {
    let node = TestNode::new(84532);
    let mut dashboard = Dashboard::new(node.chain(), node.wallet(0));
    dashboard.connect().await.unwrap();

    assert!(matches!(
        dashboard.fetch_markets().await,
        Err(PerpsError::Fatal(_))
    ));
    assert!(
        dashboard
            .error()
            .unwrap()
            .starts_with("Failed to fetch markets: ")
    );
}

/// Tests that a confirmed transaction without the creation event is reported
/// as such and keeps the form for another attempt.
#[tokio::test]
async fn test_create_market_without_event() {
    let node = TestNode::new(84532);
    let mut dashboard = Dashboard::new(node.chain(), node.wallet(1));
    dashboard.connect().await.unwrap();

    let form = dashboard.form_mut();
    form.name = "Bitcoin Perpetual".to_string();
    form.symbol = "BTC-PERP".to_string();
    form.price = "50000".to_string();

    let creation = dashboard.create_market().await.unwrap();

    assert_eq!(creation.market_id, None);
    assert_eq!(
        dashboard.creation_status(),
        Some(CreationStatus::CreatedWithoutId(creation.tx_hash))
    );
    assert_eq!(dashboard.error(), None);
    assert_eq!(dashboard.form().name, "Bitcoin Perpetual");
    assert_eq!(dashboard.chain().market_proxy(), TEST_MARKET_PROXY);
}

/// Tests the full creation flow: progress statuses in order, market ID from
/// the receipt event, form reset and refreshed market list.
#[tokio::test]
async fn test_create_market() {
    let node = TestNode::new(84532);
    node.deploy_market(
        7,
        testing::summary("Bitcoin Perpetual", "BTC-PERP", 1_000, 2_000_000, 5, -1),
    )
    .await;
    let mut dashboard = Dashboard::new(node.chain(), node.wallet(1));
    dashboard.connect().await.unwrap();

    let mut statuses = dashboard.subscribe_creation_status();
    let watcher = tokio::spawn(async move {
        let mut seen = vec![];
        while statuses.changed().await.is_ok() {
            if let Some(status) = *statuses.borrow_and_update() {
                seen.push(status);
            }
        }
        seen
    });

    let form = dashboard.form_mut();
    form.name = "Bitcoin Perpetual".to_string();
    form.symbol = "BTC-PERP".to_string();
    form.price = "50000".to_string();
    form.maker_fee = "5".to_string();

    let creation = dashboard.create_market().await.unwrap();

    assert_eq!(creation.market_id, Some(7));
    assert_eq!(dashboard.creation_status(), Some(CreationStatus::Created(7)));
    assert_eq!(dashboard.error(), None);
    assert_eq!(*dashboard.form(), NewMarketForm::default());

    let markets = dashboard.markets();
    assert_eq!(markets.len(), 1);
    assert_eq!(markets[0].id(), 7);
    assert_eq!(markets[0].name(), "Bitcoin Perpetual");
    assert_eq!(markets[0].symbol(), "BTC-PERP");
    assert!(markets[0].summary().is_some());

    drop(dashboard);
    assert_eq!(
        watcher.await.unwrap(),
        vec![
            CreationStatus::Sending,
            CreationStatus::AwaitingConfirmation(creation.tx_hash),
            CreationStatus::Created(7),
        ]
    );
}

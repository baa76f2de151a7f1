//! Terminal output of the dashboard state.

use perps_console::{
    dashboard::{CreationStatus, Dashboard},
    display::{network_label, short_address},
    wallet::WalletProvider,
};

pub fn header<W: WalletProvider>(dashboard: &Dashboard<W>) {
    println!("Perps v3 Dashboard - {}", dashboard.chain().name());
    println!();
}

pub fn connection<W: WalletProvider>(dashboard: &Dashboard<W>) {
    if let Some(account) = dashboard.account() {
        println!("Account: {}", short_address(&account));
        println!(
            "Network: {}",
            network_label(
                dashboard.chain_id(),
                dashboard.chain().chain_id(),
                dashboard.chain().name()
            )
        );
    }
    error(dashboard);
}

pub fn markets<W: WalletProvider>(dashboard: &Dashboard<W>) {
    if dashboard.markets().is_empty() {
        println!("No markets found");
        return;
    }
    for market in dashboard.markets() {
        println!();
        println!("{market}");
    }
}

pub fn creation_status(status: Option<CreationStatus>) {
    if let Some(status) = status {
        println!("{status}");
    }
}

pub fn error<W: WalletProvider>(dashboard: &Dashboard<W>) {
    if let Some(error) = dashboard.error() {
        eprintln!("{error}");
    }
}

pub fn footer<W: WalletProvider>(dashboard: &Dashboard<W>) {
    println!();
    println!(
        "Perps v3 Tester | Using contract: {}",
        dashboard.chain().market_proxy()
    );
}

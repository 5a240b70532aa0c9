// SPDX-License-Identifier: Apache-2.0

//! Import accounts from a connected Ledger device and print them as JSON
//!
//! Usage: `import_accounts [config.json]`
//!
//! Without a configuration the first account of every supported protocol is
//! imported. Apps that are not open on the device are skipped.

use std::error::Error;
use std::sync::Arc;

use ledger_transport::SharedTransport;
use ledger_transport_hid::{hidapi::HidApi, TransportNativeHID};
use ledger_wallet::{open_apps, ImportConfig};
use log::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => ImportConfig::from_file(path)?,
        None => ImportConfig::default(),
    };

    let api = HidApi::new()?;
    let transport = Arc::new(SharedTransport::new(TransportNativeHID::new(&api)?));

    let mut wallets = Vec::new();
    for app in open_apps(&config, &transport) {
        if !app.is_available().await? {
            warn!("{} app is not open, skipping", app.protocol());
            continue;
        }

        match app.import_wallet().await {
            Ok(wallet) => {
                info!("imported {} account {}", wallet.protocol, wallet.address);
                wallets.push(wallet);
            }
            Err(err) if err.is_user_rejected() => warn!("{} import rejected on device", app.protocol()),
            Err(err) => return Err(err.into()),
        }
    }

    println!("{}", serde_json::to_string_pretty(&wallets)?);
    Ok(())
}

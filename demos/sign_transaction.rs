// SPDX-License-Identifier: Apache-2.0

//! Sign a transaction read from a JSON file
//!
//! Usage: `sign_transaction <transaction.json> [derivation path]`
//!
//! ```json
//! { "protocol": "kusama", "payload": "0400..." }
//! ```

use std::error::Error;
use std::sync::Arc;

use ledger_device_base::{DerivationPath, UnsignedTransaction};
use ledger_transport::SharedTransport;
use ledger_transport_hid::{hidapi::HidApi, TransportNativeHID};
use ledger_wallet::{default_settings, open_app};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(tx_path) = args.next() else {
        eprintln!("usage: sign_transaction <transaction.json> [derivation path]");
        std::process::exit(2);
    };

    let transaction: UnsignedTransaction =
        serde_json::from_str(&std::fs::read_to_string(tx_path)?)?;

    let mut settings = default_settings(transaction.protocol());
    if let Some(path) = args.next() {
        settings = settings.with_derivation_path(path.parse::<DerivationPath>()?);
    }

    let api = HidApi::new()?;
    let transport = Arc::new(SharedTransport::new(TransportNativeHID::new(&api)?));
    let app = open_app(transaction.protocol(), transport, Some(settings));

    if !app.is_available().await? {
        eprintln!("Open the {} app on the device first", app.protocol());
        std::process::exit(1);
    }

    eprintln!("Confirm the transaction on the device...");
    let signed = app.sign_transaction(&transaction).await?;
    println!("{}", serde_json::to_string_pretty(&signed)?);

    Ok(())
}

// SPDX-License-Identifier: Apache-2.0

//! Talk to the Ethereum app of a connected Ledger device
//!
//! 1. Connect to a Ledger device via HID
//! 2. Get the app configuration
//! 3. Get the address of account 0
//! 4. Sign a sample legacy transaction (requires confirmation on device)

use std::error::Error;
use std::sync::Arc;

use ledger_eth_app::{ethereum_standard_path, EthereumApp, GetAddressParams};
use ledger_transport::SharedTransport;
use ledger_transport_hid::{hidapi::HidApi, TransportNativeHID};

/// nonce 0, gas price 1 gwei, gas 21000, 0.001 ETH to 0x742d...5B90, chain id 1
const SAMPLE_TX: &str = "ea80843b9aca0082520894742d35cc6535c244b8c80a79d5d22efeadba5b9087038d7ea4c6800080018080";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let api = HidApi::new()?;
    let ledgers = TransportNativeHID::list_ledgers(&api).count();
    if ledgers == 0 {
        eprintln!("No Ledger device found. Connect and unlock it, then open the Ethereum app.");
        return Ok(());
    }
    println!("Found {} Ledger device(s)", ledgers);

    let transport = Arc::new(SharedTransport::new(TransportNativeHID::new(&api)?));
    let eth_app = EthereumApp::new(transport);

    let config = eth_app.get_configuration().await?;
    println!("Ethereum app {}", config.version);
    println!("  arbitrary data signature: {}", config.flags.arbitrary_data_signature());
    println!("  ERC20 external info: {}", config.flags.erc20_external_info());
    println!("  transaction check: {}", config.flags.transaction_check_enabled());

    let path = ethereum_standard_path(0, 0);
    println!("\nAddress at {}", path);
    let params = GetAddressParams::new(path).with_chain_code().with_chain_id(1);
    let key_info = eth_app.get_address(params).await?;
    println!("  address: {}", key_info.address);
    println!("  public key: {}", hex::encode(&key_info.public_key));

    println!("\nSigning sample transaction, confirm on the device...");
    let rlp = hex::decode(SAMPLE_TX)?;
    match eth_app.sign_rlp_transaction(&rlp).await {
        Ok(signature) => {
            println!("  v: {:#04x}", signature.v);
            println!("  r: {}", hex::encode(&signature.r));
            println!("  s: {}", hex::encode(&signature.s));
        }
        Err(err) if err.is_user_rejected() => println!("  rejected on device"),
        Err(err) => return Err(err.into()),
    }

    Ok(())
}

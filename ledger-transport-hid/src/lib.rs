// SPDX-License-Identifier: Apache-2.0

//! USB HID transport for Ledger devices

mod errors;
pub mod framing;

use std::{ops::Deref, sync::Mutex};

pub use errors::LedgerHIDError;
pub use hidapi;
use hidapi::{DeviceInfo, HidApi, HidDevice};
use ledger_transport::{async_trait, APDUAnswer, APDUCommand, Exchange};
use log::{info, trace};

use framing::{AnswerAssembler, PACKET_SIZE};

pub const LEDGER_VENDOR_ID: u16 = 0x2c97;
pub const LEDGER_CHANNEL: u16 = 0x0101;
pub const LEDGER_USAGE_PAGE: u16 = 0xffa0;
/// Default read timeout in milliseconds (five minutes).
///
/// Covers a user reviewing a transaction on the device. Use
/// [`TransportNativeHID::with_timeout`] for a tighter bound.
pub const LEDGER_TIMEOUT: i32 = 5 * 60 * 1000;

// USB Product IDs (Normal / Bootloader)
pub mod pid {
    pub const NANO_S_PLUS: u16 = 0x0050; // Identifiers: 0x50
    pub const NANO_S_PLUS_BL: u16 = 0x0005;

    pub const NANO_X: u16 = 0x0040; // Identifiers: 0x40
    pub const NANO_X_BL: u16 = 0x0004;

    pub const STAX: u16 = 0x0060; // Identifiers: 0x60
    pub const STAX_BL: u16 = 0x0006;

    pub const FLEX: u16 = 0x0070; // Identifiers: 0x70
    pub const FLEX_BL: u16 = 0x0007;
}

pub struct TransportNativeHID {
    device: Mutex<HidDevice>,
    timeout_ms: i32,
}

impl TransportNativeHID {
    fn is_ledger(dev: &DeviceInfo) -> bool {
        dev.vendor_id() == LEDGER_VENDOR_ID && dev.usage_page() == LEDGER_USAGE_PAGE
    }

    pub fn list_ledgers(api: &HidApi) -> impl Iterator<Item = &DeviceInfo> {
        api.device_list().filter(|dev| Self::is_ledger(dev))
    }

    pub fn open_device(api: &HidApi, device: &DeviceInfo) -> Result<Self, LedgerHIDError> {
        info!(
            "opening Ledger {:#06x} at {}",
            device.product_id(),
            device.path().to_string_lossy()
        );

        let device = device.open_device(api)?;
        device.set_blocking_mode(true)?;

        Ok(TransportNativeHID {
            device: Mutex::new(device),
            timeout_ms: LEDGER_TIMEOUT,
        })
    }

    pub fn new(api: &HidApi) -> Result<Self, LedgerHIDError> {
        let first_ledger = Self::list_ledgers(api)
            .next()
            .ok_or(LedgerHIDError::DeviceNotFound)?;

        Self::open_device(api, first_ledger)
    }

    /// Give up on an answer after `timeout_ms` milliseconds
    pub fn with_timeout(mut self, timeout_ms: i32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    fn write_apdu(device: &HidDevice, channel: u16, apdu: &[u8]) -> Result<(), LedgerHIDError> {
        for packet in framing::encode_packets(channel, apdu)? {
            trace!("[{:3}] >> {}", packet.len(), hex::encode(&packet));

            let size = device.write(&packet)?;
            if size < packet.len() {
                return Err(LedgerHIDError::Comm(
                    "USB write error. Could not send whole message",
                ));
            }
        }

        Ok(())
    }

    fn read_apdu(
        device: &HidDevice,
        channel: u16,
        timeout_ms: i32,
    ) -> Result<Vec<u8>, LedgerHIDError> {
        let mut buffer = [0u8; PACKET_SIZE];
        let mut assembler = AnswerAssembler::new(channel);

        loop {
            let read = device.read_timeout(&mut buffer, timeout_ms)?;
            if read == 0 {
                return Err(LedgerHIDError::Timeout(timeout_ms));
            }

            trace!("[{:3}] << {}", read, hex::encode(&buffer[..read]));

            if let Some(answer) = assembler.push(&buffer[..read])? {
                return Ok(answer);
            }
        }
    }

    pub fn exchange<I: Deref<Target = [u8]>>(
        &self,
        command: &APDUCommand<I>,
    ) -> Result<APDUAnswer<Vec<u8>>, LedgerHIDError> {
        let device = self
            .device
            .lock()
            .map_err(|_| LedgerHIDError::Comm("HID device poisoned"))?;

        Self::write_apdu(&device, LEDGER_CHANNEL, &command.serialize())?;
        let answer = Self::read_apdu(&device, LEDGER_CHANNEL, self.timeout_ms)?;

        APDUAnswer::from_answer(answer).map_err(|_| LedgerHIDError::Comm("response was too short"))
    }
}

#[async_trait]
impl Exchange for TransportNativeHID {
    type Error = LedgerHIDError;
    type AnswerType = Vec<u8>;

    async fn exchange<I>(
        &self,
        command: &APDUCommand<I>,
    ) -> Result<APDUAnswer<Self::AnswerType>, Self::Error>
    where
        I: Deref<Target = [u8]> + Send + Sync,
    {
        self.exchange(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout_is_minutes() {
        assert_eq!(LEDGER_TIMEOUT, 300_000);
    }
}

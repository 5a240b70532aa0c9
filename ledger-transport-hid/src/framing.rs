// SPDX-License-Identifier: Apache-2.0

//! Ledger HID packet framing
//!
//! An APDU travels as a big-endian `u16` length followed by the APDU bytes,
//! cut into 64-byte HID reports. Every report starts with
//! `channel (u16) || tag 0x05 || sequence index (u16)`.

use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::errors::LedgerHIDError;

/// Tag of APDU reports
pub const TAG_APDU: u8 = 0x05;

/// Size of a HID report
pub const PACKET_SIZE: usize = 64;

/// `channel || tag || sequence index`
const HEADER_SIZE: usize = 5;

/// Split a serialized APDU into HID reports.
///
/// Each report is prefixed with the `0x00` report id hidapi expects, so the
/// returned buffers are `PACKET_SIZE + 1` bytes long.
pub fn encode_packets(channel: u16, apdu: &[u8]) -> Result<Vec<Vec<u8>>, LedgerHIDError> {
    let apdu_len = u16::try_from(apdu.len())
        .map_err(|_| LedgerHIDError::Comm("APDU does not fit a HID exchange"))?;

    let mut payload = Vec::with_capacity(apdu.len() + 2);
    payload.write_u16::<BigEndian>(apdu_len)?;
    payload.extend_from_slice(apdu);

    payload
        .chunks(PACKET_SIZE - HEADER_SIZE)
        .enumerate()
        .map(|(idx, chunk)| {
            let sequence_idx = u16::try_from(idx)
                .map_err(|_| LedgerHIDError::Comm("too many HID packets"))?;

            let mut packet = Vec::with_capacity(PACKET_SIZE + 1);
            packet.push(0x00);
            packet.write_u16::<BigEndian>(channel)?;
            packet.write_u8(TAG_APDU)?;
            packet.write_u16::<BigEndian>(sequence_idx)?;
            packet.extend_from_slice(chunk);
            packet.resize(PACKET_SIZE + 1, 0);

            Ok(packet)
        })
        .collect()
}

/// Reassembles an answer from HID reports read from the device
#[derive(Debug)]
pub struct AnswerAssembler {
    channel: u16,
    sequence_idx: u16,
    expected_len: usize,
    answer: Vec<u8>,
}

impl AnswerAssembler {
    /// Expect an answer on `channel`
    pub fn new(channel: u16) -> Self {
        AnswerAssembler {
            channel,
            sequence_idx: 0,
            expected_len: 0,
            answer: Vec::with_capacity(256),
        }
    }

    /// Feed one report. Returns the full answer once every byte has arrived.
    pub fn push(&mut self, packet: &[u8]) -> Result<Option<Vec<u8>>, LedgerHIDError> {
        let header_len = if self.sequence_idx == 0 {
            HEADER_SIZE + 2
        } else {
            HEADER_SIZE
        };
        if packet.len() < header_len {
            return Err(LedgerHIDError::Comm("USB read error. Incomplete header"));
        }

        let mut rdr = Cursor::new(packet);

        if rdr.read_u16::<BigEndian>()? != self.channel {
            return Err(LedgerHIDError::Comm("Invalid channel"));
        }
        if rdr.read_u8()? != TAG_APDU {
            return Err(LedgerHIDError::Comm("Invalid tag"));
        }
        if rdr.read_u16::<BigEndian>()? != self.sequence_idx {
            return Err(LedgerHIDError::Comm("Invalid sequence index"));
        }
        if self.sequence_idx == 0 {
            self.expected_len = rdr.read_u16::<BigEndian>()? as usize;
        }

        let start = rdr.position() as usize;
        let missing = self.expected_len - self.answer.len();
        let end = start + missing.min(packet.len() - start);
        self.answer.extend_from_slice(&packet[start..end]);

        if self.answer.len() >= self.expected_len {
            return Ok(Some(std::mem::take(&mut self.answer)));
        }

        self.sequence_idx = self
            .sequence_idx
            .checked_add(1)
            .ok_or(LedgerHIDError::Comm("too many HID packets"))?;
        Ok(None)
    }
}

// SPDX-License-Identifier: Apache-2.0

//! Bounds-checked reading of device answers

use crate::errors::LedgerAppError;

/// Cursor over an answer body.
///
/// Every read checks the remaining length and fails with
/// [`LedgerAppError::InvalidResponseData`] instead of panicking on short answers.
pub struct AnswerReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> AnswerReader<'a> {
    /// Start reading at the beginning of `data`
    pub fn new(data: &'a [u8]) -> Self {
        AnswerReader { data, offset: 0 }
    }

    /// Bytes consumed so far
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Whether every byte has been consumed
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Read one byte
    pub fn read_u8<E: std::error::Error>(&mut self, field: &str) -> Result<u8, LedgerAppError<E>> {
        Ok(self.read_bytes(1, field)?[0])
    }

    /// Read `len` bytes
    pub fn read_bytes<E: std::error::Error>(
        &mut self,
        len: usize,
        field: &str,
    ) -> Result<&'a [u8], LedgerAppError<E>> {
        if self.remaining() < len {
            return Err(LedgerAppError::InvalidResponseData(format!(
                "Insufficient data for {}: available {}, needed {}",
                field,
                self.remaining(),
                len
            )));
        }

        let bytes = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    /// Read a length byte followed by that many bytes
    pub fn read_length_prefixed<E: std::error::Error>(
        &mut self,
        field: &str,
    ) -> Result<&'a [u8], LedgerAppError<E>> {
        let len = self.read_u8(field)? as usize;
        self.read_bytes(len, field)
    }

    /// Read everything left
    pub fn read_rest(&mut self) -> &'a [u8] {
        let bytes = &self.data[self.offset..];
        self.offset = self.data.len();
        bytes
    }
}

/// Decode UTF-8 text from the device
pub fn utf8<E: std::error::Error>(bytes: &[u8]) -> Result<String, LedgerAppError<E>> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| LedgerAppError::Utf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    type Error = LedgerAppError<std::io::Error>;

    #[test]
    fn reads_fields_in_order() {
        let data = [0x02, b'o', b'k', 0xFF, 0x01];
        let mut reader = AnswerReader::new(&data);

        let text = reader.read_length_prefixed::<std::io::Error>("name").unwrap();
        assert_eq!(text, b"ok");
        assert_eq!(reader.read_u8::<std::io::Error>("flag").unwrap(), 0xFF);
        assert_eq!(reader.offset(), 4);
        assert_eq!(reader.read_rest(), &[0x01]);
        assert!(reader.is_empty());
    }

    #[test]
    fn short_answer_is_an_error() {
        let data = [0x05, 1, 2];
        let mut reader = AnswerReader::new(&data);

        let err: Error = reader.read_length_prefixed("public key").unwrap_err();
        assert!(matches!(err, LedgerAppError::InvalidResponseData(_)));
    }

    #[test]
    fn invalid_utf8() {
        assert!(matches!(utf8::<std::io::Error>(&[0xFF]), Err(LedgerAppError::Utf8)));
    }
}

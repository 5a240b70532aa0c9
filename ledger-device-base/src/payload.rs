// SPDX-License-Identifier: Apache-2.0

//! Request body framing shared by every device application
//!
//! Both helpers produce the exact byte layout the device firmware parses.
//! Inputs they cannot represent are programming errors and panic.

use log::trace;

/// Largest data payload a single length byte can describe
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize;

/// Frame `data` behind a single length byte.
///
/// `None` is framed as the empty payload, the single byte `0x00`.
///
/// # Panics
///
/// Panics if `data` is longer than [`MAX_PAYLOAD_LEN`] bytes.
pub fn create_payload(data: Option<&[u8]>) -> Vec<u8> {
    let data = match data {
        None => return vec![0],
        Some(data) => data,
    };

    assert!(
        data.len() <= MAX_PAYLOAD_LEN,
        "payload of {} bytes exceeds the {} byte length prefix",
        data.len(),
        MAX_PAYLOAD_LEN
    );

    let mut payload = Vec::with_capacity(data.len() + 1);
    payload.push(data.len() as u8);
    payload.extend_from_slice(data);
    payload
}

/// Encode a slash-delimited derivation path, one byte per segment.
///
/// The first `'` or `h` marker of each segment is removed before parsing, so
/// hardened segments are encoded with their plain index: `"44/60/0'"` becomes
/// `[44, 60, 0]`.
///
/// # Panics
///
/// Panics on a non-numeric segment or an index above 255.
pub fn derivation_path_to_buffer(derivation_path: &str) -> Vec<u8> {
    let buffer: Vec<u8> = derivation_path
        .split('/')
        .map(|junction| {
            let junction = junction.replacen(['\'', 'h'], "", 1);
            let index: u32 = match junction.parse() {
                Ok(index) => index,
                Err(_) => panic!("derivation path segment `{}` is not a number", junction),
            };

            assert!(
                index <= u8::MAX as u32,
                "derivation path segment {} does not fit in a byte",
                index
            );
            index as u8
        })
        .collect();

    trace!("derivation path {} -> {:02x?}", derivation_path, buffer);
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_is_single_zero_byte() {
        assert_eq!(create_payload(None), vec![0x00]);
    }

    #[test]
    fn data_payload_is_length_prefixed() {
        for len in [0usize, 1, 32, 254, 255] {
            let data: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let payload = create_payload(Some(&data));

            assert_eq!(payload.len(), len + 1);
            assert_eq!(payload[0] as usize, len);
            assert_eq!(&payload[1..], data.as_slice());
        }
    }

    #[test]
    fn empty_slice_and_none_frame_identically() {
        assert_eq!(create_payload(Some(&[])), create_payload(None));
    }

    #[test]
    #[should_panic(expected = "exceeds")]
    fn oversized_payload_panics() {
        let _ = create_payload(Some(&[0u8; 256]));
    }

    #[test]
    fn hardened_marker_is_stripped() {
        assert_eq!(derivation_path_to_buffer("44/60/0'"), vec![44, 60, 0]);
        assert_eq!(derivation_path_to_buffer("0'/1h/2"), vec![0, 1, 2]);
        assert_eq!(derivation_path_to_buffer("255'/0"), vec![255, 0]);
    }

    #[test]
    fn one_byte_per_segment() {
        let segments = [44u8, 0, 7, 255, 1];
        let text = segments
            .iter()
            .map(|s| format!("{}'", s))
            .collect::<Vec<_>>()
            .join("/");

        let buffer = derivation_path_to_buffer(&text);
        assert_eq!(buffer, segments.to_vec());

        let rejoined = buffer
            .iter()
            .map(|b| b.to_string())
            .collect::<Vec<_>>()
            .join("/");
        assert_eq!(rejoined, "44/0/7/255/1");
    }

    #[test]
    #[should_panic(expected = "does not fit in a byte")]
    fn wide_segment_panics() {
        let _ = derivation_path_to_buffer("44'/434'/0'");
    }

    #[test]
    #[should_panic(expected = "is not a number")]
    fn non_numeric_segment_panics() {
        let _ = derivation_path_to_buffer("m/44'/0'");
    }
}

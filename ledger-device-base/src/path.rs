// SPDX-License-Identifier: Apache-2.0

//! Typed derivation paths
//!
//! A path is written `a/b'/c/...`, each segment an index optionally followed by
//! a hardened marker (`'` or `h`). A leading `m` is accepted and ignored.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// First hardened BIP-32 index
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// Deepest path accepted
pub const MAX_PATH_DEPTH: usize = 10;

/// Reasons a derivation path is rejected
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum PathError {
    /// No segment at all
    #[error("path is empty")]
    Empty,
    /// More segments than any device app accepts
    #[error("path too deep: {0} (max {MAX_PATH_DEPTH})")]
    TooDeep(usize),
    /// Segment is not a number with an optional hardened marker
    #[error("invalid segment `{0}`")]
    InvalidSegment(String),
    /// Segment does not fit the encoding asked for
    #[error("segment {index} does not fit in {max}")]
    IndexOutOfRange {
        /// Offending index
        index: u32,
        /// Largest accepted index
        max: u32,
    },
    /// Well formed, but refused by the device app
    #[error("path not accepted by the app: {0}")]
    Unsupported(String),
}

/// One level of a derivation path
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PathSegment {
    /// Index without the hardened marker
    pub index: u32,
    /// Whether the segment carried a hardened marker
    pub hardened: bool,
}

impl PathSegment {
    /// BIP-32 index, with the hardened bit set for hardened segments
    pub fn bip32_index(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED_OFFSET
        } else {
            self.index
        }
    }
}

impl FromStr for PathSegment {
    type Err = PathError;

    fn from_str(segment: &str) -> Result<Self, Self::Err> {
        let (digits, hardened) = match segment.strip_suffix(['\'', 'h']) {
            Some(digits) => (digits, true),
            None => (segment, false),
        };

        let index: u32 = digits
            .parse()
            .map_err(|_| PathError::InvalidSegment(segment.to_string()))?;

        if index >= HARDENED_OFFSET {
            return Err(PathError::IndexOutOfRange {
                index,
                max: HARDENED_OFFSET - 1,
            });
        }

        Ok(PathSegment { index, hardened })
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index)?;
        if self.hardened {
            write!(f, "'")?;
        }
        Ok(())
    }
}

/// Hierarchical key derivation path
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DerivationPath {
    segments: Vec<PathSegment>,
}

impl DerivationPath {
    /// Build a path from its segments
    pub fn new(segments: Vec<PathSegment>) -> Result<Self, PathError> {
        match segments.len() {
            0 => Err(PathError::Empty),
            n if n > MAX_PATH_DEPTH => Err(PathError::TooDeep(n)),
            _ => Ok(DerivationPath { segments }),
        }
    }

    /// Segments, outermost first
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Number of segments
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Append the segments of `child` to this path
    pub fn join(&self, child: &DerivationPath) -> Result<Self, PathError> {
        let mut segments = self.segments.clone();
        segments.extend_from_slice(&child.segments);
        DerivationPath::new(segments)
    }

    /// Single-byte-per-segment encoding.
    ///
    /// The hardened marker is dropped, not encoded as a high bit: this is the
    /// layout device apps built on [`crate::payload::derivation_path_to_buffer`]
    /// expect.
    pub fn to_buffer(&self) -> Result<Vec<u8>, PathError> {
        if let Some(segment) = self.segments.iter().find(|s| s.index > u8::MAX as u32) {
            return Err(PathError::IndexOutOfRange {
                index: segment.index,
                max: u8::MAX as u32,
            });
        }

        Ok(crate::payload::derivation_path_to_buffer(&self.to_string()))
    }

    /// BIP-32 indices with the hardened bit applied
    pub fn bip32_indices(&self) -> Vec<u32> {
        self.segments.iter().map(PathSegment::bip32_index).collect()
    }
}

impl FromStr for DerivationPath {
    type Err = PathError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let path = path.trim();
        let path = match path.strip_prefix('m') {
            Some(rest) if rest.is_empty() => return Err(PathError::Empty),
            Some(rest) => rest
                .strip_prefix('/')
                .ok_or_else(|| PathError::InvalidSegment(path.to_string()))?,
            None => path,
        };

        if path.is_empty() {
            return Err(PathError::Empty);
        }

        let segments = path
            .split('/')
            .map(PathSegment::from_str)
            .collect::<Result<Vec<_>, _>>()?;

        DerivationPath::new(segments)
    }
}

impl TryFrom<String> for DerivationPath {
    type Error = PathError;

    fn try_from(path: String) -> Result<Self, Self::Error> {
        path.parse()
    }
}

impl From<DerivationPath> for String {
    fn from(path: DerivationPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let path: DerivationPath = "44'/60'/0'/0/0".parse().unwrap();

        assert_eq!(path.depth(), 5);
        assert!(path.segments()[0].hardened);
        assert!(!path.segments()[3].hardened);
        assert_eq!(path.to_string(), "44'/60'/0'/0/0");
    }

    #[test]
    fn h_marker_renders_as_apostrophe() {
        let path: DerivationPath = "m/44h/354h/0h".parse().unwrap();
        assert_eq!(path.to_string(), "44'/354'/0'");
    }

    #[test]
    fn rejects_malformed_paths() {
        assert_eq!("".parse::<DerivationPath>(), Err(PathError::Empty));
        assert_eq!("m".parse::<DerivationPath>(), Err(PathError::Empty));
        assert_eq!(
            "44'/x/0".parse::<DerivationPath>(),
            Err(PathError::InvalidSegment("x".to_string()))
        );
        assert_eq!(
            "44''/0".parse::<DerivationPath>(),
            Err(PathError::InvalidSegment("44''".to_string()))
        );
        assert_eq!(
            "0/0/0/0/0/0/0/0/0/0/0".parse::<DerivationPath>(),
            Err(PathError::TooDeep(11))
        );
        assert!(matches!(
            "2147483648'".parse::<DerivationPath>(),
            Err(PathError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn single_byte_encoding_strips_hardened_marker() {
        let path: DerivationPath = "44/60/0'".parse().unwrap();
        assert_eq!(path.to_buffer().unwrap(), vec![44, 60, 0]);
    }

    #[test]
    fn single_byte_encoding_rejects_wide_indices() {
        let path: DerivationPath = "44'/434'/0'".parse().unwrap();
        assert_eq!(
            path.to_buffer(),
            Err(PathError::IndexOutOfRange {
                index: 434,
                max: 255
            })
        );
    }

    #[test]
    fn bip32_indices_set_hardened_bit() {
        let path: DerivationPath = "44'/60'/0'/0/7".parse().unwrap();
        assert_eq!(
            path.bip32_indices(),
            vec![0x8000002C, 0x8000003C, 0x80000000, 0, 7]
        );
    }

    #[test]
    fn join_paths() {
        let prefix: DerivationPath = "44'/434'".parse().unwrap();
        let account: DerivationPath = "0'/0'/3'".parse().unwrap();

        assert_eq!(
            prefix.join(&account).unwrap().to_string(),
            "44'/434'/0'/0'/3'"
        );
    }

    #[test]
    fn serde_uses_text_form() {
        let path: DerivationPath = "0'/0'/0'".parse().unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"0'/0'/0'\"");

        let back: DerivationPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
        assert!(serde_json::from_str::<DerivationPath>("\"a/b\"").is_err());
    }
}

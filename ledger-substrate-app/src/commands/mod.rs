// SPDX-License-Identifier: Apache-2.0

//! Command implementations for the Substrate applications

pub mod get_address;
pub mod sign;

pub use get_address::*;
pub use sign::*;

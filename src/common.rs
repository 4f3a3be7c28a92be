// Copyright 2025 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::error::Error;
use std::str::FromStr;

/// 20-byte EVM account identifier.
pub type Address = alloy::primitives::Address;
/// 32-byte digest used for leaves, tree nodes and roots.
pub type Hash = alloy::primitives::B256;
/// Token amount. Arbitrary precision; carried as a decimal string on the wire.
pub type Amount = alloy::primitives::U256;

/// Parse a hex-encoded account address, accepting mixed case.
pub fn parse_address(s: &str) -> Result<Address, Error> {
    Address::from_str(s.trim()).map_err(|_| Error::InvalidAddress(s.to_string()))
}

/// Canonical lowercase `0x`-prefixed form used for index lookups and record comparison.
pub fn to_lower_hex(address: &Address) -> String {
    format!("{address:#x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_address_accepts_mixed_case() {
        let lower = parse_address("0x70997970c51812dc3a010c7d01b50e0d17dc79c8").unwrap();
        let mixed = parse_address("0x70997970C51812dc3A010C7d01b50e0d17dc79C8").unwrap();
        assert_eq!(lower, mixed);
        assert_eq!(
            to_lower_hex(&mixed),
            "0x70997970c51812dc3a010c7d01b50e0d17dc79c8"
        );
    }

    #[test]
    fn parse_address_rejects_garbage() {
        assert!(matches!(
            parse_address("not-an-address"),
            Err(Error::InvalidAddress(_))
        ));
        assert!(matches!(
            parse_address("0x1234"),
            Err(Error::InvalidAddress(_))
        ));
    }
}

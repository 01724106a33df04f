use serde::{Deserialize, Serialize};
use std::fmt;

/// A quantity of TNG tokens. The model counts whole tokens, so there is no
/// decimal scaling.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TingeAmount(u64);

impl TingeAmount {
    pub const ZERO: Self = Self(0);

    pub fn from_units(units: u64) -> Self {
        Self(units)
    }

    pub fn to_units(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(&self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(&self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn checked_mul(&self, factor: u64) -> Option<Self> {
        self.0.checked_mul(factor).map(Self)
    }

    pub fn saturating_add(&self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(&self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    pub fn saturating_mul(&self, factor: u64) -> Self {
        Self(self.0.saturating_mul(factor))
    }
}

impl fmt::Display for TingeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} TNG", self.0)
    }
}

/// Opaque account identifier. Issued by the [`crate::AccountRegistry`];
/// the model treats address generation as a collision-resistant unique
/// identifier capability, not as real key material.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountAddress([u8; 32]);

impl AccountAddress {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountAddress({}...)", &self.to_hex()[..8])
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", &self.to_hex()[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_arithmetic() {
        let a = TingeAmount::from_units(100);
        let b = TingeAmount::from_units(30);

        assert_eq!(a.checked_add(b), Some(TingeAmount::from_units(130)));
        assert_eq!(a.checked_sub(b), Some(TingeAmount::from_units(70)));
        assert_eq!(b.checked_sub(a), None);
        assert_eq!(b.checked_mul(4), Some(TingeAmount::from_units(120)));
        assert_eq!(a.saturating_sub(b), TingeAmount::from_units(70));
        assert_eq!(b.saturating_sub(a), TingeAmount::ZERO);
    }

    #[test]
    fn test_amount_overflow() {
        let max = TingeAmount::from_units(u64::MAX);
        assert_eq!(max.checked_add(TingeAmount::from_units(1)), None);
        assert_eq!(max.saturating_add(TingeAmount::from_units(1)), max);
        assert_eq!(max.checked_mul(2), None);
    }

    #[test]
    fn test_address_hex_roundtrip() {
        let addr = AccountAddress::from_bytes([0xAB; 32]);
        let hex = addr.to_hex();
        assert_eq!(AccountAddress::from_hex(&hex).unwrap(), addr);
        assert!(AccountAddress::from_hex("abcd").is_err());
    }
}

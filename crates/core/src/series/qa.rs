//! QA bit decoding
//!
//! Satellite products pack quality flags into integer bands. Decoding
//! happens upstream of the algorithms and only decides `Observation::valid`.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Extract bits `start..=end` of `value`, shifted down to bit 0.
///
/// `(value >> start) & ((1 << (end - start + 1)) - 1)`
pub fn extract_bits(value: u32, start: u32, end: u32) -> Result<u32> {
    if start > end || end >= u32::BITS {
        return Err(Error::InvalidParameter {
            name: "bits",
            value: format!("{}..={}", start, end),
            reason: format!("need start <= end < {}", u32::BITS),
        });
    }
    let width = end - start + 1;
    let mask = if width == u32::BITS { u32::MAX } else { (1u32 << width) - 1 };
    Ok((value >> start) & mask)
}

/// True if bit `bit` of `value` is set
pub fn bit_flag(value: u32, bit: u32) -> Result<bool> {
    Ok(extract_bits(value, bit, bit)? == 1)
}

/// Accept an observation only when a QA bit field holds one of the
/// listed codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaMask {
    pub start: u32,
    pub end: u32,
    pub accepted: Vec<u32>,
}

impl QaMask {
    pub fn new(start: u32, end: u32, accepted: Vec<u32>) -> Result<Self> {
        extract_bits(0, start, end)?;
        Ok(Self { start, end, accepted })
    }

    /// Decoded field of `qa` is one of the accepted codes
    pub fn accepts(&self, qa: u32) -> bool {
        extract_bits(qa, self.start, self.end)
            .map(|code| self.accepted.contains(&code))
            .unwrap_or(false)
    }
}

impl std::str::FromStr for QaMask {
    type Err = Error;

    /// Parse `"start-end:code,code"` or `"bit:code"`, e.g. `"0-1:0,1"`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidParameter {
            name: "qa_mask",
            value: s.to_string(),
            reason: reason.to_string(),
        };
        let (bits, codes) = s
            .split_once(':')
            .ok_or_else(|| invalid("expected start-end:codes"))?;
        let (start, end) = match bits.split_once('-') {
            Some((a, b)) => (a.trim(), b.trim()),
            None => (bits.trim(), bits.trim()),
        };
        let start: u32 = start.parse().map_err(|_| invalid("bad start bit"))?;
        let end: u32 = end.parse().map_err(|_| invalid("bad end bit"))?;
        let accepted = codes
            .split(',')
            .map(|c| c.trim().parse::<u32>().map_err(|_| invalid("bad code")))
            .collect::<Result<Vec<_>>>()?;
        QaMask::new(start, end, accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bits() {
        // 0b1110_0000: bits 5-7 all set
        assert_eq!(extract_bits(0b1110_0000, 5, 7).unwrap(), 0b111);
        assert_eq!(extract_bits(0b0000_0100, 2, 2).unwrap(), 1);
        assert_eq!(extract_bits(0b0000_0100, 3, 3).unwrap(), 0);
        assert_eq!(extract_bits(0b1011, 0, 1).unwrap(), 0b11);
        assert_eq!(extract_bits(u32::MAX, 0, 31).unwrap(), u32::MAX);
    }

    #[test]
    fn test_extract_bits_rejects_bad_range() {
        assert!(extract_bits(1, 3, 2).is_err());
        assert!(extract_bits(1, 0, 32).is_err());
    }

    #[test]
    fn test_bit_flag() {
        assert!(bit_flag(0b100, 2).unwrap());
        assert!(!bit_flag(0b100, 1).unwrap());
    }

    #[test]
    fn test_qa_mask() {
        let mask: QaMask = "0-1:0,1".parse().unwrap();
        assert!(mask.accepts(0b00));
        assert!(mask.accepts(0b01));
        assert!(!mask.accepts(0b10));
        assert!(mask.accepts(0b1101));

        let single: QaMask = "5:0".parse().unwrap();
        assert!(single.accepts(0));
        assert!(!single.accepts(1 << 5));

        assert!("5".parse::<QaMask>().is_err());
        assert!("3-1:0".parse::<QaMask>().is_err());
    }
}

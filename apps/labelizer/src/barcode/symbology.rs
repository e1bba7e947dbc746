//! One-dimensional symbol encoders.
//!
//! An encoder turns product-code text into a run of bar modules
//! (`true` = dark). `UpcA` is the only symbology printed on labels today.

use barcoders::sym::ean13::EAN13;

use crate::errors::LabelError;

/// An encoded symbol: the data actually encoded and its module pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedSymbol {
    /// Data including the computed check digit.
    pub data: String,
    pub modules: Vec<bool>,
}

/// The encoder seam. Implement this to print a different symbology
/// without touching the generator.
pub trait SymbolEncoder: Send + Sync {
    fn name(&self) -> &'static str;
    fn encode(&self, code: &str) -> Result<EncodedSymbol, LabelError>;
}

// ────────────────────────────────────────────────────────────────────────────
// UPC-A
// ────────────────────────────────────────────────────────────────────────────

/// UPC-A: 11 data digits plus a computed check digit, 95 modules.
///
/// Codes longer than 11 characters are truncated to their first 11 and the
/// check digit is recomputed, so a full 12-digit UPC encodes to itself.
/// Bars come from the EAN-13 encoder with a leading 0, which is the UPC-A
/// symbol.
pub struct UpcA;

pub const UPC_DATA_DIGITS: usize = 11;
pub const UPC_MODULES: usize = 95;

impl UpcA {
    /// Check digit over 11 data digits: odd positions weigh 3, even weigh 1.
    pub fn check_digit(digits: &[u8]) -> u8 {
        let sum: u32 = digits
            .iter()
            .enumerate()
            .map(|(i, &d)| if i % 2 == 0 { d as u32 * 3 } else { d as u32 })
            .sum();
        ((10 - sum % 10) % 10) as u8
    }
}

impl SymbolEncoder for UpcA {
    fn name(&self) -> &'static str {
        "upc-a"
    }

    fn encode(&self, code: &str) -> Result<EncodedSymbol, LabelError> {
        let invalid = |reason: String| LabelError::InvalidCode {
            code: code.to_string(),
            reason,
        };

        let head: String = code.chars().take(UPC_DATA_DIGITS).collect();
        if head.chars().count() < UPC_DATA_DIGITS {
            return Err(invalid(format!("UPC-A needs {UPC_DATA_DIGITS} digits")));
        }
        if !head.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("UPC-A accepts digits only".to_string()));
        }

        let symbol = EAN13::new(format!("0{head}")).map_err(|e| invalid(e.to_string()))?;
        let modules: Vec<bool> = symbol.encode().into_iter().map(|m| m == 1).collect();
        if modules.len() != UPC_MODULES {
            return Err(invalid(format!(
                "encoder produced {} modules, expected {UPC_MODULES}",
                modules.len()
            )));
        }

        let mut digits: Vec<u8> = head.bytes().map(|b| b - b'0').collect();
        digits.push(Self::check_digit(&digits));

        Ok(EncodedSymbol {
            data: digits.iter().map(|d| char::from(b'0' + d)).collect(),
            modules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(symbol: &EncodedSymbol) -> String {
        symbol.modules.iter().map(|&m| if m { '1' } else { '0' }).collect()
    }

    #[test]
    fn test_check_digit_known_codes() {
        // 0-12345-67890-5 and 0-36000-29145-2 are published reference codes.
        assert_eq!(UpcA::check_digit(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 0]), 5);
        assert_eq!(UpcA::check_digit(&[0, 3, 6, 0, 0, 0, 2, 9, 1, 4, 5]), 2);
    }

    #[test]
    fn test_encode_twelve_digit_code_keeps_its_check_digit() {
        let symbol = UpcA.encode("012345678905").unwrap();
        assert_eq!(symbol.data, "012345678905");
        assert_eq!(symbol.modules.len(), UPC_MODULES);
    }

    #[test]
    fn test_encode_eleven_digits_appends_check_digit() {
        let symbol = UpcA.encode("03600029145").unwrap();
        assert_eq!(symbol.data, "036000291452");
    }

    #[test]
    fn test_encode_recomputes_wrong_check_digit() {
        let symbol = UpcA.encode("012345678909").unwrap();
        assert_eq!(symbol.data, "012345678905");
    }

    #[test]
    fn test_guards_are_in_place() {
        let p = pattern(&UpcA.encode("012345678905").unwrap());
        assert_eq!(&p[..3], "101");
        assert_eq!(&p[45..50], "01010");
        assert_eq!(&p[92..], "101");
        // First data digit 0 uses the L-code 0001101.
        assert_eq!(&p[3..10], "0001101");
        // Last data digit 5 uses the R-code 1001110.
        assert_eq!(&p[85..92], "1001110");
    }

    #[test]
    fn test_right_half_is_complemented() {
        // 0-36000-29145-2: right-hand digits are complements of their L-codes.
        let p = pattern(&UpcA.encode("036000291452").unwrap());
        assert_eq!(&p[50..57], "1101100", "digit 2 from L-code 0010011");
        assert_eq!(&p[57..64], "1110100", "digit 9 from L-code 0001011");
        assert_eq!(&p[10..17], "0111101", "second digit 3 uses L-code 0111101");
    }

    #[test]
    fn test_short_code_is_rejected() {
        let err = UpcA.encode("12345").unwrap_err();
        assert!(matches!(err, LabelError::InvalidCode { .. }));
    }

    #[test]
    fn test_non_digit_code_is_rejected() {
        let err = UpcA.encode("01234ABC78905").unwrap_err();
        assert!(matches!(err, LabelError::InvalidCode { .. }));
    }
}

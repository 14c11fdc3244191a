use rand::Rng;
use rand::rngs::OsRng;

pub const VERIFICATION_CODE_LEN: usize = 6;

/// 6-digit verification code, uniform over 000000..=999999 with leading zeros kept.
pub fn generate_verification_code() -> String {
    format!("{:06}", OsRng.gen_range(0..=999_999u32))
}

/// Whether `code` has the shape of an issued code (exactly six ASCII digits).
pub fn is_well_formed_code(code: &str) -> bool {
    code.len() == VERIFICATION_CODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_verification_code() {
        for _ in 0..1000 {
            let code = generate_verification_code();
            assert!(is_well_formed_code(&code), "bad code {code}");
            let n: u32 = code.parse().unwrap();
            assert!(n <= 999_999);
        }
    }

    #[test]
    fn test_leading_zeros_are_preserved() {
        // ~10% of codes start with '0'; 500 draws make a miss vanishingly unlikely
        let saw_leading_zero = (0..500).any(|_| generate_verification_code().starts_with('0'));
        assert!(saw_leading_zero);
    }

    #[test]
    fn test_is_well_formed_code() {
        assert!(is_well_formed_code("000123"));
        assert!(!is_well_formed_code("12345"));
        assert!(!is_well_formed_code("1234567"));
        assert!(!is_well_formed_code("12a456"));
        assert!(!is_well_formed_code("١٢٣٤٥٦"));
    }
}

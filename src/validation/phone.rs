/// Maximum digits kept: two-digit area code plus a nine-digit mobile number.
pub const PHONE_MAX_DIGITS: usize = 11;

/// Keeps only the ASCII digits of `input`.
pub fn digits_only(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Formats a Brazilian phone number as the user types it.
///
/// Non-digits are dropped and the result is truncated to 11 digits before
/// formatting: `(11) 98765-4321` for mobiles, `(11) 3456-7890` for landlines,
/// and a progressive `(11) 9876` while the number is incomplete.
///
/// Exactly 10 digits always get the landline grouping `(dd) dddd-dddd`. This
/// differs from a keystroke mask, which would show the same 10 digits as
/// `(11) 34567-890` on the way to a mobile number.
pub fn format_phone(input: &str) -> String {
    let mut digits = digits_only(input);
    digits.truncate(PHONE_MAX_DIGITS);

    match digits.len() {
        0..=2 => digits,
        3..=7 => format!("({}) {}", &digits[..2], &digits[2..]),
        10 => format!("({}) {}-{}", &digits[..2], &digits[2..6], &digits[6..]),
        _ => format!("({}) {}-{}", &digits[..2], &digits[2..7], &digits[7..]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_mobile_number() {
        assert_eq!(format_phone("11987654321"), "(11) 98765-4321");
    }

    #[test]
    fn truncates_before_formatting() {
        assert_eq!(format_phone("1198765432199"), "(11) 98765-4321");
    }

    #[test]
    fn formats_landline_number() {
        assert_eq!(format_phone("1134567890"), "(11) 3456-7890");
        assert_eq!(format_phone("11345678901"), "(11) 34567-8901");
    }

    #[test]
    fn strips_existing_formatting() {
        assert_eq!(format_phone("(11) 98765-4321"), "(11) 98765-4321");
        assert_eq!(format_phone("+55 abc"), "55");
    }

    #[test]
    fn formats_partial_input_progressively() {
        assert_eq!(format_phone(""), "");
        assert_eq!(format_phone("11"), "11");
        assert_eq!(format_phone("119"), "(11) 9");
        assert_eq!(format_phone("1198765"), "(11) 98765");
        assert_eq!(format_phone("11987654"), "(11) 98765-4");
    }
}

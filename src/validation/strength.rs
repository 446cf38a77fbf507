use serde::Serialize;

/// Lowest score accepted for a new password.
pub const MIN_ACCEPTED_SCORE: u8 = 3;
/// Highest score reported.
pub const MAX_SCORE: u8 = 5;

const SPECIAL_CHARS: &str = r#"!@#$%^&*()_+-=[]{};':"\|,.<>/?"#;

/// Which composition criteria a password satisfies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StrengthCriteria {
    pub min_length: bool,
    pub long_length: bool,
    pub lowercase: bool,
    pub uppercase: bool,
    pub digit: bool,
    pub special: bool,
}

impl StrengthCriteria {
    /// Evaluates every criterion against `password`.
    pub fn evaluate(password: &str) -> Self {
        let length = password.chars().count();
        Self {
            min_length: length >= 8,
            long_length: length >= 12,
            lowercase: password.chars().any(|c| c.is_ascii_lowercase()),
            uppercase: password.chars().any(|c| c.is_ascii_uppercase()),
            digit: password.chars().any(|c| c.is_ascii_digit()),
            special: password.chars().any(|c| SPECIAL_CHARS.contains(c)),
        }
    }

    fn satisfied(&self) -> u8 {
        [
            self.min_length,
            self.long_length,
            self.lowercase,
            self.uppercase,
            self.digit,
            self.special,
        ]
        .iter()
        .filter(|met| **met)
        .count() as u8
    }
}

/// Strength of a password on a 0–5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PasswordStrength {
    score: u8,
    criteria: StrengthCriteria,
}

/// Scores `password` by counting satisfied criteria, capped at 5.
pub fn score_password(password: &str) -> PasswordStrength {
    let criteria = StrengthCriteria::evaluate(password);
    PasswordStrength {
        score: criteria.satisfied().min(MAX_SCORE),
        criteria,
    }
}

impl PasswordStrength {
    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn criteria(&self) -> StrengthCriteria {
        self.criteria
    }

    /// Descriptive label for the score.
    pub fn label(&self) -> &'static str {
        match self.score {
            0..=2 => "Weak",
            3 => "Medium",
            4 => "Strong",
            _ => "Very Strong",
        }
    }

    /// Width of the strength bar, in percent.
    pub fn bar_width_percent(&self) -> u8 {
        match self.score {
            0 | 1 => 20,
            2 => 40,
            3 => 60,
            4 => 80,
            _ => 100,
        }
    }

    /// Color class applied to the strength bar.
    pub fn css_class(&self) -> &'static str {
        match self.score {
            0..=2 => "strength-weak",
            3 => "strength-medium",
            _ => "strength-strong",
        }
    }

    /// Whether the password is strong enough to be chosen at signup.
    pub fn is_acceptable(&self) -> bool {
        self.score >= MIN_ACCEPTED_SCORE
    }
}

use crate::{
    Result,
    constants::{DEFAULT_PASSWORD, MAX_FINGERPRINT_ID, MIN_FINGERPRINT_ID, PASSWORD_LENGTH},
    error::{CredentialError, Error},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Numeric door password (exactly four ASCII digits).
///
/// # Security
/// Comparison runs in constant time so a failed attempt does not reveal
/// how many leading digits were right. `Debug` never prints the digits.
#[derive(Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Credential(String);

impl Credential {
    /// Create a credential after validating length and content.
    ///
    /// # Errors
    /// Returns `Error::InvalidCredential` with [`CredentialError::Length`] when
    /// the input is not exactly four characters, or [`CredentialError::Format`]
    /// when any character is not a decimal digit.
    pub fn new(candidate: &str) -> Result<Self> {
        Self::validate(candidate)?;
        Ok(Credential(candidate.to_string()))
    }

    /// Check a candidate without building a credential.
    ///
    /// Length is measured in characters, so multi-byte input is reported as
    /// a format problem rather than a length problem.
    ///
    /// # Errors
    /// See [`Credential::new`].
    pub fn validate(candidate: &str) -> std::result::Result<(), CredentialError> {
        let actual = candidate.chars().count();
        if actual != PASSWORD_LENGTH {
            return Err(CredentialError::Length {
                expected: PASSWORD_LENGTH,
                actual,
            });
        }
        if !candidate.chars().all(|c| c.is_ascii_digit()) {
            return Err(CredentialError::Format);
        }
        Ok(())
    }

    /// Constant-time comparison against raw keypad input.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.0.as_bytes().ct_eq(candidate.as_bytes()).into()
    }

    /// Get the digits for persistence.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Credential {
    fn default() -> Self {
        Credential(DEFAULT_PASSWORD.to_string())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Credential(****)")
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl std::str::FromStr for Credential {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Credential::new(s)
    }
}

impl TryFrom<String> for Credential {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::validate(&value)?;
        Ok(Credential(value))
    }
}

impl From<Credential> for String {
    fn from(value: Credential) -> Self {
        value.0
    }
}

/// Fingerprint template slot on the sensor (1-127)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FingerprintId(u8);

impl FingerprintId {
    /// Create a slot identifier with range validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidFingerprintId` when `id` is outside 1-127.
    pub fn new(id: u16) -> Result<Self> {
        if id < u16::from(MIN_FINGERPRINT_ID) || id > u16::from(MAX_FINGERPRINT_ID) {
            return Err(Error::InvalidFingerprintId(id));
        }
        Ok(FingerprintId(id as u8))
    }

    /// Every addressable slot, lowest first.
    pub fn all() -> impl Iterator<Item = FingerprintId> {
        (MIN_FINGERPRINT_ID..=MAX_FINGERPRINT_ID).map(FingerprintId)
    }

    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for FingerprintId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for FingerprintId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let id: u16 = s
            .trim()
            .parse()
            .map_err(|_| Error::invalid_message(format!("Invalid fingerprint id: {s}")))?;
        FingerprintId::new(id)
    }
}

/// Consecutive failed authentication attempts.
///
/// Kept in memory only; a restart starts from zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCounter(u32);

impl FailureCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one more failure and return the new count.
    pub fn increment(&mut self) -> u32 {
        self.0 = self.0.saturating_add(1);
        self.0
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }

    #[must_use]
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for FailureCounter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1234")]
    #[case("0000")]
    #[case("0099")]
    #[case("9876")]
    fn test_credential_valid(#[case] input: &str) {
        let credential = Credential::new(input).unwrap();
        assert_eq!(credential.as_str(), input);
        assert!(credential.matches(input));
    }

    #[rstest]
    #[case("123", CredentialError::Length { expected: 4, actual: 3 })]
    #[case("12345", CredentialError::Length { expected: 4, actual: 5 })]
    #[case("", CredentialError::Length { expected: 4, actual: 0 })]
    #[case("12a4", CredentialError::Format)]
    #[case("12 4", CredentialError::Format)]
    #[case("-123", CredentialError::Format)]
    #[case("１２３４", CredentialError::Format)]
    fn test_credential_invalid(#[case] input: &str, #[case] expected: CredentialError) {
        assert_eq!(Credential::validate(input), Err(expected));
        assert!(matches!(
            Credential::new(input),
            Err(Error::InvalidCredential(e)) if e == expected
        ));
    }

    #[test]
    fn test_credential_default() {
        assert_eq!(Credential::default().as_str(), "1234");
    }

    #[test]
    fn test_credential_matches() {
        let credential = Credential::new("1234").unwrap();
        assert!(credential.matches("1234"));
        assert!(!credential.matches("1235"));
        assert!(!credential.matches("123"));
        assert!(!credential.matches("12345"));
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential::new("4321").unwrap();
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("4321"));
    }

    #[test]
    fn test_credential_serde() {
        let credential = Credential::new("0099").unwrap();
        let json = serde_json::to_string(&credential).unwrap();
        assert_eq!(json, "\"0099\"");
        let back: Credential = serde_json::from_str(&json).unwrap();
        assert_eq!(back, credential);

        assert!(serde_json::from_str::<Credential>("\"12a4\"").is_err());
    }

    #[rstest]
    #[case(1)]
    #[case(64)]
    #[case(127)]
    fn test_fingerprint_id_valid(#[case] id: u16) {
        assert_eq!(u16::from(FingerprintId::new(id).unwrap().as_u8()), id);
    }

    #[rstest]
    #[case(0)]
    #[case(128)]
    #[case(1000)]
    fn test_fingerprint_id_invalid(#[case] id: u16) {
        assert!(matches!(
            FingerprintId::new(id),
            Err(Error::InvalidFingerprintId(v)) if v == id
        ));
    }

    #[test]
    fn test_fingerprint_id_all() {
        let ids: Vec<u8> = FingerprintId::all().map(|id| id.as_u8()).collect();
        assert_eq!(ids.len(), 127);
        assert_eq!(ids.first(), Some(&1));
        assert_eq!(ids.last(), Some(&127));
    }

    #[test]
    fn test_fingerprint_id_parse() {
        let id: FingerprintId = "42".parse().unwrap();
        assert_eq!(id.to_string(), "42");
        assert!("abc".parse::<FingerprintId>().is_err());
        assert!("0".parse::<FingerprintId>().is_err());
    }

    #[test]
    fn test_failure_counter() {
        let mut counter = FailureCounter::new();
        assert_eq!(counter.get(), 0);
        assert_eq!(counter.increment(), 1);
        assert_eq!(counter.increment(), 2);
        counter.reset();
        assert_eq!(counter.get(), 0);
    }

    #[test]
    fn test_failure_counter_saturates() {
        let mut counter = FailureCounter(u32::MAX);
        assert_eq!(counter.increment(), u32::MAX);
    }
}

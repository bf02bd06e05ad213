//! Synthetic data for data-driven scenarios.
//!
//! Every generated value is valid by format for its kind (an email has one
//! `@` and a dotted domain, a phone number is all digits within the length
//! bounds). Values are not unique across calls and records carry no
//! cross-field guarantees beyond each field being well formed.
//!
//! # Example
//!
//! ```ignore
//! let mut factory = SyntheticDataFactory::new(Seed::from_u64(7));
//! let person = factory.generate(SyntheticKind::Person);
//! page.type_text(&Selector::input_named("email"), person.get("email").unwrap()).await?;
//! ```

use crate::result::{WaymarkError, WaymarkResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const FIRST_NAMES: &[&str] = &[
    "Anny", "Maria", "Olivia", "Emma", "Sofia", "Isabella", "Mia", "Charlotte", "Amelia",
    "Harper", "Evelyn", "Abigail", "Ella", "Grace", "Chloe", "Nora", "Lily", "Zoe", "Hannah",
    "Leah",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Wilson",
    "Anderson", "Taylor", "Thomas", "Moore", "Martin", "Jackson", "Thompson", "White", "Harris",
    "Clark", "Lewis",
];

const EMAIL_DOMAINS: &[&str] = &[
    "example.com",
    "example.org",
    "example.net",
    "mailbox.test",
    "inbox.example",
];

/// Deterministic seed for reproducible data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Seed(u64);

impl Seed {
    /// Create a seed from a u64 value
    #[must_use]
    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }

    /// Random seed from the thread-local generator
    #[must_use]
    pub fn from_entropy() -> Self {
        Self(rand::random::<u64>())
    }

    /// Get the raw seed value
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// xorshift64 PRNG
#[derive(Debug, Clone)]
struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    const fn new(seed: Seed) -> Self {
        // Ensure non-zero state
        let state = if seed.0 == 0 { 1 } else { seed.0 };
        Self { state }
    }

    const fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform-ish value in `min..max` (returns `min` when the range is empty)
    const fn next_range(&mut self, min: u64, max: u64) -> u64 {
        if min >= max {
            return min;
        }
        min + (self.next() % (max - min))
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.next_range(0, items.len() as u64) as usize]
    }

    fn digit(&mut self) -> char {
        char::from(b'0' + self.next_range(0, 10) as u8)
    }
}

/// Kinds of synthetic record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticKind {
    /// Given name
    FirstName,
    /// Family name
    LastName,
    /// Email address
    Email,
    /// Digit-only phone number
    Phone,
    /// Booking guest: first name, last name, email and phone
    Person,
}

impl SyntheticKind {
    /// All kinds
    pub const ALL: [Self; 5] = [
        Self::FirstName,
        Self::LastName,
        Self::Email,
        Self::Phone,
        Self::Person,
    ];

    /// Kind name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Person => "person",
        }
    }
}

impl fmt::Display for SyntheticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyntheticKind {
    type Err = WaymarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "first_name" | "firstname" => Ok(Self::FirstName),
            "last_name" | "lastname" => Ok(Self::LastName),
            "email" => Ok(Self::Email),
            "phone" => Ok(Self::Phone),
            "person" => Ok(Self::Person),
            _ => Err(WaymarkError::UnknownKind {
                kind: s.to_string(),
            }),
        }
    }
}

/// Longest phone number the generator will produce
pub const MAX_PHONE_LEN: usize = 64;

/// Length bounds for generated phone numbers (inclusive).
///
/// Always satisfies `1 <= min_len <= max_len <= MAX_PHONE_LEN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPhoneConstraint", into = "RawPhoneConstraint")]
pub struct PhoneConstraint {
    min_len: usize,
    max_len: usize,
}

#[derive(Serialize, Deserialize)]
struct RawPhoneConstraint {
    min_len: usize,
    max_len: usize,
}

impl From<RawPhoneConstraint> for PhoneConstraint {
    fn from(raw: RawPhoneConstraint) -> Self {
        Self::new(raw.min_len, raw.max_len)
    }
}

impl From<PhoneConstraint> for RawPhoneConstraint {
    fn from(c: PhoneConstraint) -> Self {
        Self {
            min_len: c.min_len,
            max_len: c.max_len,
        }
    }
}

impl Default for PhoneConstraint {
    /// The booking API accepts 11 to 21 characters
    fn default() -> Self {
        Self {
            min_len: 11,
            max_len: 21,
        }
    }
}

impl PhoneConstraint {
    /// Create bounds, clamped into `1..=MAX_PHONE_LEN` with `max_len >= min_len`
    #[must_use]
    pub fn new(min_len: usize, max_len: usize) -> Self {
        let min_len = min_len.clamp(1, MAX_PHONE_LEN);
        Self {
            min_len,
            max_len: max_len.clamp(min_len, MAX_PHONE_LEN),
        }
    }

    /// Create bounds, rejecting anything [`PhoneConstraint::new`] would clamp
    pub fn checked(min_len: usize, max_len: usize) -> WaymarkResult<Self> {
        if min_len == 0 || min_len > max_len || max_len > MAX_PHONE_LEN {
            return Err(WaymarkError::InvalidPhoneBounds { min_len, max_len });
        }
        Ok(Self { min_len, max_len })
    }

    /// Minimum digit count
    #[must_use]
    pub const fn min_len(&self) -> usize {
        self.min_len
    }

    /// Maximum digit count
    #[must_use]
    pub const fn max_len(&self) -> usize {
        self.max_len
    }

    /// Whether `value` is a phone number within these bounds
    #[must_use]
    pub fn accepts(&self, value: &str) -> bool {
        let len = value.chars().count();
        len >= self.min_len && len <= self.max_len && value.chars().all(|c| c.is_ascii_digit())
    }
}

/// Format check used by the email generator's invariant
#[must_use]
pub fn is_valid_email(value: &str) -> bool {
    let mut parts = value.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
        && !value.chars().any(char::is_whitespace)
}

/// One generated record; field names follow the booking form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticRecord {
    /// Kind the record was generated for
    pub kind: SyntheticKind,
    /// Field values
    pub fields: BTreeMap<String, String>,
}

impl SyntheticRecord {
    fn single(kind: SyntheticKind, field: &str, value: String) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.to_string(), value);
        Self { kind, fields }
    }

    /// Field value
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// The value of a single-field record
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        if self.fields.len() == 1 {
            self.fields.values().next().map(String::as_str)
        } else {
            None
        }
    }

    /// Record as a JSON object
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.fields).unwrap_or(serde_json::Value::Null)
    }
}

/// Generates format-valid random records
#[derive(Debug, Clone)]
pub struct SyntheticDataFactory {
    rng: Xorshift64,
    phone: PhoneConstraint,
    generated: u64,
}

impl Default for SyntheticDataFactory {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl SyntheticDataFactory {
    /// Create a factory with the given seed
    #[must_use]
    pub fn new(seed: Seed) -> Self {
        Self {
            rng: Xorshift64::new(seed),
            phone: PhoneConstraint::default(),
            generated: 0,
        }
    }

    /// Create a factory with a fresh, unpredictable seed
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(Seed::from_entropy())
    }

    /// Set phone length bounds
    #[must_use]
    pub const fn with_phone_constraint(mut self, constraint: PhoneConstraint) -> Self {
        self.phone = constraint;
        self
    }

    /// Current phone length bounds
    #[must_use]
    pub const fn phone_constraint(&self) -> PhoneConstraint {
        self.phone
    }

    /// Number of records generated so far
    #[must_use]
    pub const fn generated(&self) -> u64 {
        self.generated
    }

    /// Generate one record of `kind`
    pub fn generate(&mut self, kind: SyntheticKind) -> SyntheticRecord {
        self.generated += 1;
        match kind {
            SyntheticKind::FirstName => {
                SyntheticRecord::single(kind, "firstName", self.first_name())
            }
            SyntheticKind::LastName => SyntheticRecord::single(kind, "lastName", self.last_name()),
            SyntheticKind::Email => SyntheticRecord::single(kind, "email", self.email()),
            SyntheticKind::Phone => SyntheticRecord::single(kind, "phoneNo", self.phone()),
            SyntheticKind::Person => self.person(),
        }
    }

    /// Generate by kind name (`"email"`, `"phone"`, `"person"`, ...)
    pub fn generate_named(&mut self, kind: &str) -> WaymarkResult<SyntheticRecord> {
        Ok(self.generate(kind.parse()?))
    }

    /// Random given name
    pub fn first_name(&mut self) -> String {
        self.rng.pick(FIRST_NAMES).to_string()
    }

    /// Random family name
    pub fn last_name(&mut self) -> String {
        self.rng.pick(LAST_NAMES).to_string()
    }

    /// Random email address
    pub fn email(&mut self) -> String {
        let first = self.first_name();
        let last = self.last_name();
        self.email_for(&first, &last)
    }

    fn email_for(&mut self, first: &str, last: &str) -> String {
        let suffix = self.rng.next_range(0, 1000);
        let domain = self.rng.pick(EMAIL_DOMAINS);
        format!(
            "{}.{}{}@{}",
            first.to_lowercase(),
            last.to_lowercase(),
            suffix,
            domain
        )
    }

    /// Random phone number within the configured bounds
    pub fn phone(&mut self) -> String {
        let min = self.phone.min_len as u64;
        let max = (self.phone.max_len as u64).saturating_add(1);
        let len = self.rng.next_range(min, max) as usize;
        let mut number = String::with_capacity(len);
        // Leading digit is never zero
        number.push(char::from(b'1' + self.rng.next_range(0, 9) as u8));
        while number.len() < len {
            number.push(self.rng.digit());
        }
        number
    }

    /// Booking guest record
    fn person(&mut self) -> SyntheticRecord {
        let first = self.first_name();
        let last = self.last_name();
        let email = self.email_for(&first, &last);
        let phone = self.phone();

        let mut fields = BTreeMap::new();
        fields.insert("firstName".to_string(), first);
        fields.insert("lastName".to_string(), last);
        fields.insert("email".to_string(), email);
        fields.insert("phoneNo".to_string(), phone);
        SyntheticRecord {
            kind: SyntheticKind::Person,
            fields,
        }
    }
}

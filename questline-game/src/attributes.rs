//! Character attributes and the alias table that names them.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::constants::{ATTRIBUTE_DICE, ATTRIBUTE_DIE_MAX_FACE};

/// One of the four base attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Constitution,
    Intellect,
    Charisma,
    Luck,
}

impl Attribute {
    pub const ALL: [Self; 4] = [
        Self::Constitution,
        Self::Intellect,
        Self::Charisma,
        Self::Luck,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Constitution => "constitution",
            Self::Intellect => "intellect",
            Self::Charisma => "charisma",
            Self::Luck => "luck",
        }
    }

    /// Resolve a content or host key, accepting the legacy localized names.
    #[must_use]
    pub fn from_alias(key: &str) -> Option<Self> {
        let key = key.trim();
        match key {
            "体质" => return Some(Self::Constitution),
            "智力" => return Some(Self::Intellect),
            "情商" => return Some(Self::Charisma),
            "幸运" => return Some(Self::Luck),
            _ => {}
        }
        match key.to_ascii_lowercase().as_str() {
            "constitution" | "con" => Some(Self::Constitution),
            "intellect" | "intelligence" | "int" => Some(Self::Intellect),
            "charisma" | "cha" => Some(Self::Charisma),
            "luck" | "lck" => Some(Self::Luck),
            _ => None,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Attribute {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_alias(s).ok_or(())
    }
}

/// The four base attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Attributes {
    #[serde(default)]
    pub constitution: i32,
    #[serde(default)]
    pub intellect: i32,
    #[serde(default)]
    pub charisma: i32,
    #[serde(default)]
    pub luck: i32,
}

impl Attributes {
    #[must_use]
    pub const fn new(constitution: i32, intellect: i32, charisma: i32, luck: i32) -> Self {
        Self {
            constitution,
            intellect,
            charisma,
            luck,
        }
    }

    #[must_use]
    pub const fn get(&self, attribute: Attribute) -> i32 {
        match attribute {
            Attribute::Constitution => self.constitution,
            Attribute::Intellect => self.intellect,
            Attribute::Charisma => self.charisma,
            Attribute::Luck => self.luck,
        }
    }

    pub const fn get_mut(&mut self, attribute: Attribute) -> &mut i32 {
        match attribute {
            Attribute::Constitution => &mut self.constitution,
            Attribute::Intellect => &mut self.intellect,
            Attribute::Charisma => &mut self.charisma,
            Attribute::Luck => &mut self.luck,
        }
    }

    /// Add `amount` to every attribute.
    pub fn raise_all(&mut self, amount: i32) {
        for attribute in Attribute::ALL {
            let value = self.get_mut(attribute);
            *value = value.saturating_add(amount);
        }
    }

    #[must_use]
    pub fn total(&self) -> i64 {
        Attribute::ALL
            .iter()
            .map(|attribute| i64::from(self.get(*attribute)))
            .sum()
    }

    /// Parse a host-supplied attribute mapping such as
    /// `{"constitution": 6, "智力": 4}`.
    ///
    /// Keys go through the alias table; attributes that are not mentioned
    /// keep the value from `base`.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON, unknown keys, or values that are
    /// not non-negative integers.
    pub fn parse_onto(base: Self, input: &str) -> Result<Self, AttributeInputError> {
        let value: serde_json::Value = serde_json::from_str(input.trim())
            .map_err(|err| AttributeInputError::Malformed(err.to_string()))?;
        let serde_json::Value::Object(entries) = value else {
            return Err(AttributeInputError::NotAMapping);
        };
        let mut attributes = base;
        for (key, raw) in entries {
            let attribute = Attribute::from_alias(&key)
                .ok_or_else(|| AttributeInputError::UnknownAttribute(key.clone()))?;
            let parsed = raw
                .as_u64()
                .and_then(|value| i32::try_from(value).ok())
                .ok_or_else(|| AttributeInputError::InvalidValue {
                    attribute,
                    raw: raw.to_string(),
                })?;
            *attributes.get_mut(attribute) = parsed;
        }
        Ok(attributes)
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CON {} INT {} CHA {} LCK {}",
            self.constitution, self.intellect, self.charisma, self.luck
        )
    }
}

/// Errors raised while loading a host-supplied attribute mapping.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttributeInputError {
    #[error("attribute input is not valid JSON: {0}")]
    Malformed(String),
    #[error("attribute input must be a JSON object")]
    NotAMapping,
    #[error("unknown attribute key `{0}`")]
    UnknownAttribute(String),
    #[error("{attribute} must be a non-negative integer (got {raw})")]
    InvalidValue { attribute: Attribute, raw: String },
}

/// Roll a fresh attribute set: each attribute is the sum of two dice with
/// faces `0..=5`.
pub fn roll_attributes<R: Rng + ?Sized>(rng: &mut R) -> Attributes {
    let mut attributes = Attributes::default();
    for attribute in Attribute::ALL {
        let total: i32 = (0..ATTRIBUTE_DICE)
            .map(|_| rng.gen_range(0..=ATTRIBUTE_DIE_MAX_FACE))
            .sum();
        *attributes.get_mut(attribute) = total;
    }
    attributes
}

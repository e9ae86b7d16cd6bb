//! Content model: events, choices, auto-roll rules and their effects.
//!
//! Content is loaded once and never mutated. Effect keys and requirement
//! keys are resolved through the alias table at load time, so the rules only
//! ever see canonical [`EffectTarget`]s and [`Attribute`]s.
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;
use thiserror::Error;

use crate::attributes::{Attribute, Attributes};
use crate::constants::{DEFAULT_EVENT_WEIGHT, DEFAULT_MAX_LEVEL, STARTING_LEVEL};

pub(crate) const DEFAULT_CONTENT: &str = include_str!("../assets/events.json");
const FALLBACK_EVENT_NAME: &str = "Quiet Crossroads";

/// Free-form labels attached to an event.
pub type TagSet = SmallVec<[String; 4]>;

/// Errors raised while building an [`EventCatalog`].
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("content defines no events")]
    Empty,
    #[error("event `{event}` defines both choices and an auto_roll rule")]
    AmbiguousBody { event: String },
    #[error("event `{event}` defines neither choices nor an auto_roll rule")]
    MissingBody { event: String },
    #[error("event `{event}` has an empty choice list")]
    EmptyChoices { event: String },
    #[error("event `{event}` must have a positive weight")]
    ZeroWeight { event: String },
    #[error("event `{event}` level window invalid (min {min} > max {max})")]
    LevelBounds { event: String, min: u32, max: u32 },
    #[error("event `{event}` requirement `{key}` is invalid: {reason}")]
    InvalidRequirement {
        event: String,
        key: String,
        reason: String,
    },
    #[error("event `{event}` is defined more than once")]
    DuplicateEvent { event: String },
}

/// Canonical destination of a content effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectTarget {
    Attribute(Attribute),
    Health,
    Magic,
    Experience,
    Unknown,
}

impl EffectTarget {
    /// Resolve an effect key through the fixed alias table.
    #[must_use]
    pub fn resolve(key: &str) -> Self {
        if let Some(attribute) = Attribute::from_alias(key) {
            return Self::Attribute(attribute);
        }
        let key = key.trim();
        match key {
            "生命值" | "生命" | "血量" => return Self::Health,
            "魔法值" | "魔法" => return Self::Magic,
            "经验" | "经验值" => return Self::Experience,
            _ => {}
        }
        match key.to_ascii_lowercase().as_str() {
            "health" | "hp" => Self::Health,
            "magic" | "mp" | "mana" => Self::Magic,
            "experience" | "exp" | "xp" => Self::Experience,
            _ => Self::Unknown,
        }
    }
}

/// Fixed or ranged effect amount. Ranges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EffectValue {
    Fixed(i32),
    Range(i32, i32),
}

impl EffectValue {
    /// Inclusive bounds, normalised so that `lo <= hi`.
    #[must_use]
    pub const fn bounds(self) -> (i32, i32) {
        match self {
            Self::Fixed(value) => (value, value),
            Self::Range(a, b) if a <= b => (a, b),
            Self::Range(a, b) => (b, a),
        }
    }
}

/// A single keyed effect with its resolved target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effect {
    pub key: String,
    pub target: EffectTarget,
    pub value: EffectValue,
}

impl Effect {
    #[must_use]
    pub fn new(key: impl Into<String>, value: EffectValue) -> Self {
        let key = key.into();
        let target = EffectTarget::resolve(&key);
        Self { key, target, value }
    }
}

/// Ordered effect map; application order follows content order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EffectMap(Vec<Effect>);

impl EffectMap {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: EffectValue) -> Self {
        self.0.push(Effect::new(key, value));
        self
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Effect> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a EffectMap {
    type Item = &'a Effect;
    type IntoIter = std::slice::Iter<'a, Effect>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, EffectValue)> for EffectMap {
    fn from_iter<T: IntoIterator<Item = (String, EffectValue)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| Effect::new(key, value))
                .collect(),
        )
    }
}

impl Serialize for EffectMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for effect in &self.0 {
            map.serialize_entry(&effect.key, &effect.value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for EffectMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = OrderedEntries::<EffectValue>::deserialize(deserializer)?;
        Ok(entries.0.into_iter().collect())
    }
}

/// JSON object read as an ordered list of entries.
struct OrderedEntries<T>(Vec<(String, T)>);

impl<T> Default for OrderedEntries<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for OrderedEntries<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
            type Value = OrderedEntries<T>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a JSON object")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, T>()? {
                    entries.push((key, value));
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

/// Comparison operator used by attribute requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    AtLeast,
    Above,
    AtMost,
    Below,
    Equal,
}

impl Comparison {
    #[must_use]
    pub const fn holds(self, actual: i32, expected: i32) -> bool {
        match self {
            Self::AtLeast => actual >= expected,
            Self::Above => actual > expected,
            Self::AtMost => actual <= expected,
            Self::Below => actual < expected,
            Self::Equal => actual == expected,
        }
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::AtLeast => ">=",
            Self::Above => ">",
            Self::AtMost => "<=",
            Self::Below => "<",
            Self::Equal => "==",
        }
    }

    /// Split a threshold expression such as `">=5"` into operator and operand.
    /// A bare number compares with `==`.
    fn split(expr: &str) -> (Self, &str) {
        let expr = expr.trim();
        for (prefix, op) in [
            (">=", Self::AtLeast),
            ("<=", Self::AtMost),
            ("==", Self::Equal),
            (">", Self::Above),
            ("<", Self::Below),
        ] {
            if let Some(rest) = expr.strip_prefix(prefix) {
                return (op, rest.trim());
            }
        }
        (Self::Equal, expr)
    }
}

/// A single attribute threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeRequirement {
    pub attribute: Attribute,
    pub comparison: Comparison,
    pub value: i32,
}

impl AttributeRequirement {
    #[must_use]
    pub const fn holds(&self, attributes: &Attributes) -> bool {
        self.comparison
            .holds(attributes.get(self.attribute), self.value)
    }
}

/// Prerequisites an event needs before it becomes available.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Requirements {
    pub attributes: Vec<AttributeRequirement>,
    pub flags_all: Vec<String>,
    pub flags_any: Vec<String>,
}

impl Requirements {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.flags_all.is_empty() && self.flags_any.is_empty()
    }
}

/// One selectable action inside a choice event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    #[serde(default)]
    pub effects: EffectMap,
    #[serde(default)]
    pub description: String,
}

/// A probability-gated event resolved without player input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoRoll {
    pub success_probability: String,
    #[serde(default)]
    pub success_effects: EffectMap,
    #[serde(default)]
    pub failure_effects: EffectMap,
    #[serde(default)]
    pub success_description: String,
    #[serde(default)]
    pub failure_description: String,
}

/// Playable body of an event: exactly one of a choice set or an auto-roll rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventBody {
    Choices(Vec<Choice>),
    AutoRoll(AutoRoll),
}

/// Selection metadata for an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMeta {
    pub weight: u32,
    pub cooldown: u32,
    pub once: bool,
    pub min_level: u32,
    pub max_level: u32,
    pub requires: Requirements,
    /// Informational only; surfaced to the host, never enforced.
    pub excludes: TagSet,
    pub tags: TagSet,
}

impl Default for EventMeta {
    fn default() -> Self {
        Self {
            weight: DEFAULT_EVENT_WEIGHT,
            cooldown: 0,
            once: false,
            min_level: STARTING_LEVEL,
            max_level: DEFAULT_MAX_LEVEL,
            requires: Requirements::default(),
            excludes: TagSet::new(),
            tags: TagSet::new(),
        }
    }
}

/// A content-defined event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDefinition {
    pub name: String,
    pub description: String,
    pub body: EventBody,
    pub meta: EventMeta,
}

impl EventDefinition {
    #[must_use]
    pub fn with_choices(
        name: impl Into<String>,
        description: impl Into<String>,
        choices: Vec<Choice>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            body: EventBody::Choices(choices),
            meta: EventMeta::default(),
        }
    }

    #[must_use]
    pub fn with_auto_roll(
        name: impl Into<String>,
        description: impl Into<String>,
        rule: AutoRoll,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            body: EventBody::AutoRoll(rule),
            meta: EventMeta::default(),
        }
    }

    #[must_use]
    pub fn meta(mut self, meta: EventMeta) -> Self {
        self.meta = meta;
        self
    }

    #[must_use]
    pub const fn is_choice(&self) -> bool {
        matches!(self.body, EventBody::Choices(_))
    }

    #[must_use]
    pub fn choices(&self) -> &[Choice] {
        match &self.body {
            EventBody::Choices(choices) => choices,
            EventBody::AutoRoll(_) => &[],
        }
    }

    #[must_use]
    pub const fn auto_roll(&self) -> Option<&AutoRoll> {
        match &self.body {
            EventBody::AutoRoll(rule) => Some(rule),
            EventBody::Choices(_) => None,
        }
    }

    fn validate(&self) -> Result<(), ContentError> {
        if let EventBody::Choices(choices) = &self.body
            && choices.is_empty()
        {
            return Err(ContentError::EmptyChoices {
                event: self.name.clone(),
            });
        }
        if self.meta.weight == 0 {
            return Err(ContentError::ZeroWeight {
                event: self.name.clone(),
            });
        }
        if self.meta.min_level > self.meta.max_level {
            return Err(ContentError::LevelBounds {
                event: self.name.clone(),
                min: self.meta.min_level,
                max: self.meta.max_level,
            });
        }
        Ok(())
    }
}

/// Immutable set of event definitions plus the fixed negative-event set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCatalog {
    events: Vec<EventDefinition>,
    negative_events: BTreeSet<String>,
}

impl EventCatalog {
    /// Build a catalog from already-parsed definitions.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty catalog, duplicate names, or an event
    /// that violates the definition rules.
    pub fn new<I, S>(events: Vec<EventDefinition>, negative_events: I) -> Result<Self, ContentError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if events.is_empty() {
            return Err(ContentError::Empty);
        }
        let mut names = BTreeSet::new();
        for event in &events {
            event.validate()?;
            if !names.insert(event.name.as_str()) {
                return Err(ContentError::DuplicateEvent {
                    event: event.name.clone(),
                });
            }
        }
        let negative_events: BTreeSet<String> =
            negative_events.into_iter().map(Into::into).collect();
        for name in &negative_events {
            if !names.contains(name.as_str()) {
                log::warn!("negative event list names undefined event `{name}`");
            }
        }
        for event in &events {
            if !event.is_choice() && !negative_events.contains(&event.name) {
                log::debug!(
                    "auto-roll event `{}` is outside the negative set and competes in the positive pool",
                    event.name
                );
            }
            if !event.meta.excludes.is_empty() {
                log::warn!(
                    "event `{}` declares excludes {:?}; exclusions are not enforced",
                    event.name,
                    event.meta.excludes
                );
            }
        }
        Ok(Self {
            events,
            negative_events,
        })
    }

    /// Parse a catalog from the JSON content format.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or any definition is invalid.
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        let raw: RawCatalog = serde_json::from_str(json)?;
        raw.into_catalog()
    }

    /// Parse `json`, falling back to the built-in single-event catalog when
    /// the content is unusable. The error is returned alongside for the host
    /// to report.
    #[must_use]
    pub fn load_or_fallback(json: &str) -> (Self, Option<ContentError>) {
        match Self::from_json(json) {
            Ok(catalog) => (catalog, None),
            Err(err) => {
                log::warn!("content load failed, using fallback events: {err}");
                (Self::fallback(), Some(err))
            }
        }
    }

    /// Catalog bundled with the crate.
    #[must_use]
    pub fn bundled() -> Self {
        Self::load_or_fallback(DEFAULT_CONTENT).0
    }

    /// Minimal catalog used whenever real content cannot be loaded.
    #[must_use]
    pub fn fallback() -> Self {
        let choice = |text: &str, key: &str, value: EffectValue, description: &str| Choice {
            text: text.to_string(),
            effects: EffectMap::new().with(key, value),
            description: description.to_string(),
        };
        let event = EventDefinition::with_choices(
            FALLBACK_EVENT_NAME,
            "The road splits in four directions and nothing seems to be happening. \
             (No event content could be loaded.)",
            vec![
                choice(
                    "Study the signposts",
                    "intellect",
                    EffectValue::Range(1, 2),
                    "You work out where each road leads.",
                ),
                choice(
                    "Wander off",
                    "luck",
                    EffectValue::Fixed(1),
                    "You stumble onto a shortcut.",
                ),
                choice(
                    "Ask a traveler",
                    "charisma",
                    EffectValue::Fixed(1),
                    "A passing merchant points the way.",
                ),
                choice(
                    "Wait it out",
                    "constitution",
                    EffectValue::Fixed(1),
                    "You rest until the fog lifts.",
                ),
            ],
        );
        Self {
            events: vec![event],
            negative_events: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn events(&self) -> &[EventDefinition] {
        &self.events
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&EventDefinition> {
        self.events.iter().find(|event| event.name == name)
    }

    #[must_use]
    pub fn is_negative(&self, name: &str) -> bool {
        self.negative_events.contains(name)
    }

    #[must_use]
    pub const fn negative_events(&self) -> &BTreeSet<String> {
        &self.negative_events
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for EventCatalog {
    fn default() -> Self {
        Self::fallback()
    }
}

// Wire shapes ---------------------------------------------------------------

#[derive(Deserialize)]
struct RawCatalog {
    #[serde(default)]
    negative_events: Vec<String>,
    events: OrderedEntries<RawEvent>,
}

impl RawCatalog {
    fn into_catalog(self) -> Result<EventCatalog, ContentError> {
        let events = self
            .events
            .0
            .into_iter()
            .map(|(name, raw)| raw.into_definition(name))
            .collect::<Result<Vec<_>, _>>()?;
        EventCatalog::new(events, self.negative_events)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawThreshold {
    Number(i64),
    Text(String),
}

#[derive(Deserialize, Default)]
struct RawRequirements {
    #[serde(default)]
    attributes: OrderedEntries<RawThreshold>,
    #[serde(default)]
    flags_all: Vec<String>,
    #[serde(default)]
    flags_any: Vec<String>,
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(default)]
    description: String,
    #[serde(default)]
    choices: Option<Vec<Choice>>,
    #[serde(default)]
    auto_roll: Option<AutoRoll>,
    #[serde(default = "default_weight")]
    weight: u32,
    #[serde(default)]
    cooldown: u32,
    #[serde(default)]
    once: bool,
    #[serde(default = "default_min_level")]
    min_level: u32,
    #[serde(default = "default_max_level")]
    max_level: u32,
    #[serde(default)]
    requires: RawRequirements,
    #[serde(default)]
    excludes: TagSet,
    #[serde(default)]
    tags: TagSet,
}

const fn default_weight() -> u32 {
    DEFAULT_EVENT_WEIGHT
}

const fn default_min_level() -> u32 {
    STARTING_LEVEL
}

const fn default_max_level() -> u32 {
    DEFAULT_MAX_LEVEL
}

impl RawEvent {
    fn into_definition(self, name: String) -> Result<EventDefinition, ContentError> {
        let body = match (self.choices, self.auto_roll) {
            (Some(choices), None) => EventBody::Choices(choices),
            (None, Some(rule)) => EventBody::AutoRoll(rule),
            (Some(_), Some(_)) => return Err(ContentError::AmbiguousBody { event: name }),
            (None, None) => return Err(ContentError::MissingBody { event: name }),
        };
        let requires = self.requires.into_requirements(&name)?;
        Ok(EventDefinition {
            name,
            description: self.description,
            body,
            meta: EventMeta {
                weight: self.weight,
                cooldown: self.cooldown,
                once: self.once,
                min_level: self.min_level,
                max_level: self.max_level,
                requires,
                excludes: self.excludes,
                tags: self.tags,
            },
        })
    }
}

impl RawRequirements {
    fn into_requirements(self, event: &str) -> Result<Requirements, ContentError> {
        let invalid = |key: &str, reason: String| ContentError::InvalidRequirement {
            event: event.to_string(),
            key: key.to_string(),
            reason,
        };
        let mut attributes = Vec::with_capacity(self.attributes.0.len());
        for (key, threshold) in self.attributes.0 {
            let attribute = Attribute::from_alias(&key)
                .ok_or_else(|| invalid(&key, String::from("unknown attribute")))?;
            let (comparison, value) = match threshold {
                RawThreshold::Number(value) => (
                    Comparison::Equal,
                    i32::try_from(value)
                        .map_err(|_| invalid(&key, format!("{value} is out of range")))?,
                ),
                RawThreshold::Text(expr) => {
                    let (comparison, operand) = Comparison::split(&expr);
                    let value = operand
                        .parse::<i32>()
                        .map_err(|_| invalid(&key, format!("cannot parse `{expr}`")))?;
                    (comparison, value)
                }
            };
            attributes.push(AttributeRequirement {
                attribute,
                comparison,
                value,
            });
        }
        Ok(Requirements {
            attributes,
            flags_all: self.flags_all,
            flags_any: self.flags_any,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_from_json_preserves_order_and_metadata() {
        let json = r#"{
            "negative_events": ["Ambush"],
            "events": {
                "Old Library": {
                    "description": "Dusty shelves.",
                    "weight": 3,
                    "cooldown": 2,
                    "requires": { "attributes": { "智力": ">= 3", "luck": 1 }, "flags_any": ["seen:Gate"] },
                    "tags": ["study"],
                    "choices": [
                        { "text": "Read", "effects": { "intellect": [1, 3], "经验": 20, "stamina": 4 }, "description": "You read." }
                    ]
                },
                "Ambush": {
                    "description": "Bandits!",
                    "auto_roll": {
                        "success_probability": "luck*3+20",
                        "success_effects": { "experience": 15 },
                        "failure_effects": { "health": -10 }
                    }
                }
            }
        }"#;

        let catalog = EventCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.events()[0].name, "Old Library");
        assert_eq!(catalog.events()[1].name, "Ambush");
        assert!(catalog.is_negative("Ambush"));
        assert!(!catalog.is_negative("Old Library"));

        let library = catalog.get("Old Library").unwrap();
        assert_eq!(library.meta.weight, 3);
        assert_eq!(library.meta.cooldown, 2);
        assert_eq!(library.meta.tags.as_slice(), ["study".to_string()]);
        assert_eq!(
            library.meta.requires.attributes,
            vec![
                AttributeRequirement {
                    attribute: Attribute::Intellect,
                    comparison: Comparison::AtLeast,
                    value: 3,
                },
                AttributeRequirement {
                    attribute: Attribute::Luck,
                    comparison: Comparison::Equal,
                    value: 1,
                },
            ]
        );
        let targets: Vec<EffectTarget> = library.choices()[0]
            .effects
            .iter()
            .map(|effect| effect.target)
            .collect();
        assert_eq!(
            targets,
            vec![
                EffectTarget::Attribute(Attribute::Intellect),
                EffectTarget::Experience,
                EffectTarget::Unknown,
            ]
        );

        let ambush = catalog.get("Ambush").unwrap();
        assert!(!ambush.is_choice());
        assert_eq!(
            ambush.auto_roll().unwrap().success_probability,
            "luck*3+20"
        );
        assert_eq!(ambush.meta.weight, 1);
    }

    #[test]
    fn rejects_events_with_both_or_neither_body() {
        let both = r#"{ "events": { "X": {
            "choices": [ { "text": "a" } ],
            "auto_roll": { "success_probability": "50" }
        } } }"#;
        assert!(matches!(
            EventCatalog::from_json(both),
            Err(ContentError::AmbiguousBody { .. })
        ));

        let neither = r#"{ "events": { "X": { "description": "nothing" } } }"#;
        assert!(matches!(
            EventCatalog::from_json(neither),
            Err(ContentError::MissingBody { .. })
        ));
    }

    #[test]
    fn rejects_bad_requirements_and_empty_content() {
        let bad = r#"{ "events": { "X": {
            "requires": { "attributes": { "intellect": ">= lots" } },
            "choices": [ { "text": "a" } ]
        } } }"#;
        assert!(matches!(
            EventCatalog::from_json(bad),
            Err(ContentError::InvalidRequirement { .. })
        ));
        assert!(matches!(
            EventCatalog::from_json(r#"{ "events": {} }"#),
            Err(ContentError::Empty)
        ));
    }

    #[test]
    fn load_or_fallback_reports_error_and_uses_fallback() {
        let (catalog, err) = EventCatalog::load_or_fallback("{ broken");
        assert!(matches!(err, Some(ContentError::Parse(_))));
        assert_eq!(catalog, EventCatalog::fallback());
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.events()[0].choices().len(), 4);
    }

    #[test]
    fn bundled_content_parses() {
        let catalog = EventCatalog::from_json(DEFAULT_CONTENT).unwrap();
        assert!(catalog.len() > 5);
        assert!(!catalog.negative_events().is_empty());
    }

    #[test]
    fn effect_value_bounds_normalise_reversed_ranges() {
        assert_eq!(EffectValue::Range(5, 2).bounds(), (2, 5));
        assert_eq!(EffectValue::Fixed(-4).bounds(), (-4, -4));
    }

    #[test]
    fn effect_targets_resolve_aliases() {
        assert_eq!(EffectTarget::resolve("生命值"), EffectTarget::Health);
        assert_eq!(EffectTarget::resolve("HP"), EffectTarget::Health);
        assert_eq!(EffectTarget::resolve("魔法值"), EffectTarget::Magic);
        assert_eq!(EffectTarget::resolve("xp"), EffectTarget::Experience);
        assert_eq!(
            EffectTarget::resolve("幸运"),
            EffectTarget::Attribute(Attribute::Luck)
        );
        assert_eq!(EffectTarget::resolve("gold"), EffectTarget::Unknown);
    }

    #[test]
    fn comparison_split_defaults_to_equal() {
        assert_eq!(Comparison::split(" 7 "), (Comparison::Equal, "7"));
        assert_eq!(Comparison::split(">=3"), (Comparison::AtLeast, "3"));
        assert_eq!(Comparison::split("< 2"), (Comparison::Below, "2"));
        assert!(Comparison::Above.holds(4, 3));
        assert!(!Comparison::Below.holds(4, 3));
    }
}

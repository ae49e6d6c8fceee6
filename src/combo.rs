//! Key combinations and the held-key matcher.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AutoclickError, Result};
use crate::key::{KeyIdentity, Modifier, RawKey};

/// Shown in place of a combo that has no keys.
pub const PLACEHOLDER: &str = "...";

/// A set of modifiers plus at most one non-modifier key.
///
/// A spec with neither is "unset" and never matches anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ComboSpec {
    modifiers: BTreeSet<Modifier>,
    key: Option<KeyIdentity>,
}

impl ComboSpec {
    /// Build a combo. A modifier passed as `key` is folded into the
    /// modifier set so `key` only ever holds a non-modifier.
    pub fn new(modifiers: impl IntoIterator<Item = Modifier>, key: Option<KeyIdentity>) -> Self {
        let mut modifiers: BTreeSet<Modifier> = modifiers.into_iter().collect();
        let key = match key.as_ref().and_then(KeyIdentity::modifier) {
            Some(modifier) => {
                modifiers.insert(modifier);
                None
            }
            None => key,
        };
        Self { modifiers, key }
    }

    pub fn single(key: KeyIdentity) -> Self {
        Self::new([], Some(key))
    }

    /// Parse `"ctrl+shift+a"` in any order. Empty or `"..."` is the unset combo.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed == PLACEHOLDER {
            return Ok(Self::default());
        }

        // A trailing "+" key can't be split on the separator.
        let (rest, plus_key) = if trimmed == "+" {
            ("", true)
        } else if let Some(rest) = trimmed.strip_suffix("++") {
            (rest, true)
        } else {
            (trimmed, false)
        };

        let mut modifiers = BTreeSet::new();
        let mut key = plus_key.then_some(KeyIdentity::Character('+'));

        for part in rest.split('+').filter(|_| !rest.is_empty()) {
            let part = part.trim();
            if part.is_empty() {
                return Err(AutoclickError::invalid_combo(s, "empty key name"));
            }
            let identity = KeyIdentity::parse_canonical(part)
                .ok_or_else(|| AutoclickError::invalid_combo(s, format!("unknown key '{part}'")))?;
            match identity.modifier() {
                Some(modifier) => {
                    modifiers.insert(modifier);
                }
                None if key.is_some() => {
                    return Err(AutoclickError::invalid_combo(
                        s,
                        "only one non-modifier key is allowed",
                    ));
                }
                None => key = Some(identity),
            }
        }

        Ok(Self { modifiers, key })
    }

    pub fn modifiers(&self) -> impl Iterator<Item = Modifier> + '_ {
        self.modifiers.iter().copied()
    }

    pub fn key(&self) -> Option<&KeyIdentity> {
        self.key.as_ref()
    }

    pub fn is_unset(&self) -> bool {
        self.modifiers.is_empty() && self.key.is_none()
    }

    fn parts(&self) -> Vec<String> {
        self.modifiers
            .iter()
            .map(|m| m.name().to_string())
            .chain(self.key.iter().map(KeyIdentity::canonical))
            .collect()
    }

    /// Lowercase form with modifiers in ctrl, alt, shift, cmd order.
    pub fn canonical(&self) -> String {
        self.parts().join("+")
    }

    /// Uppercased canonical form, or `"..."` when unset.
    pub fn display(&self) -> String {
        if self.is_unset() {
            return PLACEHOLDER.to_string();
        }
        self.canonical().to_uppercase()
    }

    /// Whether every part of this combo is currently held.
    pub fn is_satisfied_by(&self, held: &HeldKeySet) -> bool {
        is_satisfied(self, held)
    }
}

impl fmt::Display for ComboSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl std::str::FromStr for ComboSpec {
    type Err = AutoclickError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ComboSpec {
    type Error = AutoclickError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ComboSpec> for String {
    fn from(spec: ComboSpec) -> Self {
        spec.canonical()
    }
}

/// Raw keys currently held down, as seen by one listener.
#[derive(Debug, Clone, Default)]
pub struct HeldKeySet {
    keys: HashSet<RawKey>,
}

impl HeldKeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the key was not already held.
    pub fn insert(&mut self, key: RawKey) -> bool {
        self.keys.insert(key)
    }

    pub fn remove(&mut self, key: &RawKey) -> bool {
        self.keys.remove(key)
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn contains(&self, key: &RawKey) -> bool {
        self.keys.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawKey> {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<RawKey> for HeldKeySet {
    fn from_iter<I: IntoIterator<Item = RawKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

/// Decide whether `spec` is satisfied by the keys in `held`.
///
/// Each modifier needs at least one held key of either side; the key, if
/// set, needs a held key with the same identity (characters compare
/// case-insensitively). Extra held keys are ignored, so adding keys never
/// un-satisfies a combo.
pub fn is_satisfied(spec: &ComboSpec, held: &HeldKeySet) -> bool {
    if spec.is_unset() {
        return false;
    }

    let modifiers_held = spec
        .modifiers
        .iter()
        .all(|wanted| held.iter().any(|raw| raw.modifier() == Some(*wanted)));
    if !modifiers_held {
        return false;
    }

    match &spec.key {
        Some(wanted) => held
            .iter()
            .filter_map(KeyIdentity::from_raw)
            .any(|identity| identity.matches(wanted)),
        None => true,
    }
}

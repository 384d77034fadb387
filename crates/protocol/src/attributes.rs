/*
 * dkimoracle signing daemon
 *
 * Copyright (c) the dkimoracle authors
 * Licensed under the Apache License, Version 2.0
 *
 * You should have received a copy of the Apache License, Version 2.0 along
 * with this program. If not, see https://www.apache.org/licenses/LICENSE-2.0.
 *
 */

/// An ordered attribute map: insertion order of distinct names is preserved,
/// and repeated occurrences of the same name accumulate into an ordered
/// list of values (spec §4.4).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap {
    order: Vec<String>,
    values: std::collections::HashMap<String, Vec<String>>,
}

impl AttributeMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of `name=value`, appending to any existing
    /// values under `name`.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if !self.values.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.values.entry(name).or_default().push(value.into());
    }

    /// The first value recorded for `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(|v| v.first()).map(String::as_str)
    }

    /// All values recorded for `name`, in occurrence order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> &[String] {
        self.values.get(name).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Iterate `(name, value)` pairs in the order they should appear on the
    /// wire: attribute names in first-seen order, each name's values in
    /// occurrence order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order.iter().flat_map(move |name| {
            self.values[name]
                .iter()
                .map(move |value| (name.as_str(), value.as_str()))
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

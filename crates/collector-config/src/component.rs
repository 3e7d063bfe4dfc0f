// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Component identifiers and the capabilities every component configuration exposes.
//!
//! A collector configuration declares four classes of components (receivers, processors,
//! exporters and extensions). Each configured instance is keyed by a [`ComponentId`], and its
//! configuration value is stored behind the [`ComponentConfig`] trait so that every component
//! kind owns its own validation logic.

use std::error::Error;
use std::fmt;

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error returned by a component's own validation or unmarshaling.
pub type ComponentError = Box<dyn Error + Send + Sync>;

/// Separator between the type and the name parts of a [`ComponentId`].
const TYPE_NAME_SEPARATOR: char = '/';

/// Identifier naming one configured component instance, e.g. `otlp` or `otlp/internal`.
///
/// Equality is exact string equality. The same value is used as a registry key and as a
/// cross-reference from the service section.
#[derive(Clone, Debug, Display, From, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the part of the identifier before the first `/`.
    ///
    /// ```
    /// use collector_config::component::{ComponentId, ComponentType};
    ///
    /// assert_eq!(ComponentId::new("otlp/2").component_type(), ComponentType::new("otlp"));
    /// assert_eq!(ComponentId::new("batch").component_type(), ComponentType::new("batch"));
    /// ```
    #[must_use]
    pub fn component_type(&self) -> ComponentType {
        match self.0.split_once(TYPE_NAME_SEPARATOR) {
            Some((ty, _)) => ComponentType::new(ty),
            None => ComponentType::new(self.0.as_str()),
        }
    }

    /// Returns the part of the identifier after the first `/`, or an empty string.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0
            .split_once(TYPE_NAME_SEPARATOR)
            .map_or("", |(_, name)| name)
    }
}

impl From<&str> for ComponentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl AsRef<str> for ComponentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Implementation type of a component as it appears in the config, e.g. `otlp` or `batch`.
#[derive(Clone, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentType(String);

impl ComponentType {
    pub fn new(ty: impl Into<String>) -> Self {
        Self(ty.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The four classes of configurable components.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentKind {
    Receiver,
    Processor,
    Exporter,
    Extension,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 4] = [
        ComponentKind::Receiver,
        ComponentKind::Processor,
        ComponentKind::Exporter,
        ComponentKind::Extension,
    ];

    /// Name of the top-level config section holding components of this kind.
    #[must_use]
    pub fn section(self) -> &'static str {
        match self {
            ComponentKind::Receiver => "receivers",
            ComponentKind::Processor => "processors",
            ComponentKind::Exporter => "exporters",
            ComponentKind::Extension => "extensions",
        }
    }
}

impl AsRef<str> for ComponentKind {
    fn as_ref(&self) -> &str {
        match self {
            ComponentKind::Receiver => "receiver",
            ComponentKind::Processor => "processor",
            ComponentKind::Exporter => "exporter",
            ComponentKind::Extension => "extension",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Capability every component configuration must expose to take part in a registry.
pub trait ComponentConfig: fmt::Debug + Send + Sync {
    /// Checks the component's own settings.
    ///
    /// # Errors
    ///
    /// Returns the reason the settings are unusable. The caller tags it with the component kind
    /// and identifier.
    fn validate(&self) -> Result<(), ComponentError>;
}

/// Optional capability for components whose section does not map directly onto their fields.
///
/// Whether a component type supports it is decided when its factory is registered, see
/// [`crate::factories::Factories::register_unmarshal`].
pub trait Unmarshal {
    /// Populates `self` from the untyped section. The section may be empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the section cannot be interpreted.
    fn unmarshal(&mut self, section: &ConfigMap) -> Result<(), ComponentError>;
}

/// Untyped configuration section of a single component.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigMap(Map<String, Value>);

impl ConfigMap {
    /// Builds a section from a raw value. `null` becomes an empty section, any other
    /// non-object value is kept under the empty key.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            Value::Null => Self::default(),
            other => {
                let mut map = Map::new();
                map.insert(String::new(), other);
                Self(map)
            }
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Component configuration that keeps its section verbatim and accepts anything.
///
/// Used when loading configs whose component types are not known to the loader.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OpaqueConfig {
    pub section: ConfigMap,
}

impl ComponentConfig for OpaqueConfig {
    fn validate(&self) -> Result<(), ComponentError> {
        Ok(())
    }
}

impl Unmarshal for OpaqueConfig {
    fn unmarshal(&mut self, section: &ConfigMap) -> Result<(), ComponentError> {
        self.section = section.clone();
        Ok(())
    }
}

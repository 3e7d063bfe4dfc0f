// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Registry of component types known to the loader.
//!
//! A factory turns the untyped section of one configured component into its typed
//! configuration. Whether a type decodes through `serde` or through its own [`Unmarshal`]
//! implementation is fixed when the type is registered.

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::component::{
    ComponentConfig, ComponentError, ComponentId, ComponentKind, ComponentType, ConfigMap,
    OpaqueConfig, Unmarshal,
};
use crate::errors::LoadError;

type FactoryFn =
    Box<dyn Fn(&ConfigMap) -> Result<Box<dyn ComponentConfig>, ComponentError> + Send + Sync>;

#[derive(Default)]
pub struct Factories {
    factories: HashMap<(ComponentKind, ComponentType), FactoryFn>,
    lenient: bool,
}

impl Factories {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Factories that accept components of unregistered types, keeping their sections as
    /// [`OpaqueConfig`]. Only the structure of the config gets checked.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            lenient: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_lenient(&self) -> bool {
        self.lenient
    }

    /// Registers a type decoded with `serde`. An empty section yields `T::default()`.
    #[must_use]
    pub fn register<T>(mut self, kind: ComponentKind, ty: &str) -> Self
    where
        T: ComponentConfig + DeserializeOwned + Default + 'static,
    {
        self.factories.insert(
            (kind, ComponentType::new(ty)),
            Box::new(|section: &ConfigMap| -> Result<Box<dyn ComponentConfig>, ComponentError> {
                let config = if section.is_empty() {
                    T::default()
                } else {
                    serde_json::from_value::<T>(section.clone().into_value())?
                };
                Ok(Box::new(config) as Box<dyn ComponentConfig>)
            }),
        );
        self
    }

    /// Registers a type that populates itself from its section, starting from `T::default()`.
    #[must_use]
    pub fn register_unmarshal<T>(mut self, kind: ComponentKind, ty: &str) -> Self
    where
        T: ComponentConfig + Unmarshal + Default + 'static,
    {
        self.factories.insert(
            (kind, ComponentType::new(ty)),
            Box::new(|section: &ConfigMap| -> Result<Box<dyn ComponentConfig>, ComponentError> {
                let mut config = T::default();
                config.unmarshal(section)?;
                Ok(Box::new(config) as Box<dyn ComponentConfig>)
            }),
        );
        self
    }

    #[must_use]
    pub fn contains(&self, kind: ComponentKind, ty: &ComponentType) -> bool {
        self.factories.contains_key(&(kind, ty.clone()))
    }

    /// Builds the configuration of component `id` from its section.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::UnknownComponentType`] when no factory matches the type part of
    /// `id` (and these factories are not lenient), or [`LoadError::InvalidComponentSection`]
    /// when the factory rejects the section.
    pub fn create(
        &self,
        kind: ComponentKind,
        id: &ComponentId,
        section: &ConfigMap,
    ) -> Result<Box<dyn ComponentConfig>, LoadError> {
        let ty = id.component_type();
        let Some(factory) = self.factories.get(&(kind, ty)) else {
            if !self.lenient {
                return Err(LoadError::UnknownComponentType {
                    kind,
                    id: id.clone(),
                });
            }
            debug!(%kind, %id, "No factory registered, keeping section as-is");
            let mut config = OpaqueConfig::default();
            config
                .unmarshal(section)
                .map_err(|source| LoadError::InvalidComponentSection {
                    kind,
                    id: id.clone(),
                    source,
                })?;
            return Ok(Box::new(config));
        };

        factory(section).map_err(|source| LoadError::InvalidComponentSection {
            kind,
            id: id.clone(),
            source,
        })
    }
}

impl fmt::Debug for Factories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut registered = self
            .factories
            .keys()
            .map(|(kind, ty)| format!("{kind}/{ty}"))
            .collect::<Vec<String>>();
        registered.sort();
        f.debug_struct("Factories")
            .field("registered", &registered)
            .field("lenient", &self.lenient)
            .finish()
    }
}

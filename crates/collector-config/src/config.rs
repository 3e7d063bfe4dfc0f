// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Root configuration object and the gate every configuration passes before a topology is
//! built from it.
//!
//! [`Config::validate`] reports the first violated invariant under a fixed order:
//!
//! 1. at least one receiver, then each receiver's own validation
//! 2. at least one exporter, then each exporter's own validation
//! 3. each processor's and each extension's own validation (both sets may be empty)
//! 4. the service section: telemetry, extension references, then every pipeline
//!
//! Registries and pipelines are `BTreeMap`s, so components are visited in identifier order
//! and the reported identifier is stable when several are invalid at once.
//!
//! Semantic conflicts between components (two receivers on the same endpoint, etc.) are not
//! detected here.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::component::{ComponentConfig, ComponentId, ComponentKind};
use crate::errors::ConfigError;
use crate::pipeline::Pipeline;
use crate::service::Service;

/// Configured components of one kind, keyed by identifier.
pub type Registry = BTreeMap<ComponentId, Box<dyn ComponentConfig>>;

#[derive(Debug, Default)]
pub struct Config {
    pub receivers: Registry,
    pub exporters: Registry,
    pub processors: Registry,
    pub extensions: Registry,
    pub service: Service,
}

impl Config {
    #[must_use]
    pub fn registry(&self, kind: ComponentKind) -> &Registry {
        match kind {
            ComponentKind::Receiver => &self.receivers,
            ComponentKind::Processor => &self.processors,
            ComponentKind::Exporter => &self.exporters,
            ComponentKind::Extension => &self.extensions,
        }
    }

    pub fn registry_mut(&mut self, kind: ComponentKind) -> &mut Registry {
        match kind {
            ComponentKind::Receiver => &mut self.receivers,
            ComponentKind::Processor => &mut self.processors,
            ComponentKind::Exporter => &mut self.exporters,
            ComponentKind::Extension => &mut self.extensions,
        }
    }

    /// Checks the whole configuration and returns the first violation found.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] describing the first violated invariant. A configuration that
    /// fails must not be used to build any component.
    pub fn validate(&self) -> Result<(), ConfigError> {
        debug!(
            receivers = self.receivers.len(),
            processors = self.processors.len(),
            exporters = self.exporters.len(),
            extensions = self.extensions.len(),
            pipelines = self.service.pipelines.len(),
            "Validating collector configuration"
        );

        // There is no default receiver, a config without one can never receive data.
        if self.receivers.is_empty() {
            return Err(ConfigError::MissingReceivers);
        }
        validate_components(ComponentKind::Receiver, &self.receivers)?;

        // Same for exporters.
        if self.exporters.is_empty() {
            return Err(ConfigError::MissingExporters);
        }
        validate_components(ComponentKind::Exporter, &self.exporters)?;

        validate_components(ComponentKind::Processor, &self.processors)?;
        validate_components(ComponentKind::Extension, &self.extensions)?;

        self.validate_service()
    }

    fn validate_service(&self) -> Result<(), ConfigError> {
        self.service.telemetry.validate()?;

        if let Some(id) = self
            .service
            .extensions
            .iter()
            .find(|id| !self.extensions.contains_key(*id))
        {
            return Err(ConfigError::UnknownExtensionReference { id: id.clone() });
        }

        if self.service.pipelines.is_empty() {
            return Err(ConfigError::MissingPipelines);
        }

        self.service
            .pipelines
            .values()
            .try_for_each(|pipeline| self.validate_pipeline(pipeline))
    }

    fn validate_pipeline(&self, pipeline: &Pipeline) -> Result<(), ConfigError> {
        if pipeline.receivers.is_empty() {
            return Err(ConfigError::EmptyPipelineReceivers {
                pipeline: pipeline.name.clone(),
            });
        }
        if let Some(id) = first_unknown(&pipeline.receivers, &self.receivers) {
            return Err(ConfigError::UnknownReceiverReference {
                pipeline: pipeline.name.clone(),
                id: id.clone(),
            });
        }

        if let Some(id) = first_unknown(&pipeline.processors, &self.processors) {
            return Err(ConfigError::UnknownProcessorReference {
                pipeline: pipeline.name.clone(),
                id: id.clone(),
            });
        }

        if pipeline.exporters.is_empty() {
            return Err(ConfigError::EmptyPipelineExporters {
                pipeline: pipeline.name.clone(),
            });
        }
        if let Some(id) = first_unknown(&pipeline.exporters, &self.exporters) {
            return Err(ConfigError::UnknownExporterReference {
                pipeline: pipeline.name.clone(),
                id: id.clone(),
            });
        }

        Ok(())
    }
}

fn validate_components(kind: ComponentKind, registry: &Registry) -> Result<(), ConfigError> {
    for (id, component) in registry {
        component
            .validate()
            .map_err(|source| ConfigError::InvalidComponentConfig {
                kind,
                id: id.clone(),
                source,
            })?;
    }
    Ok(())
}

/// Decodes an explicit null as `T::default()`, the same as an absent key.
///
/// # Errors
///
/// Returns the deserializer's error if the value is present but not a `T`.
pub fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn first_unknown<'a>(refs: &'a [ComponentId], registry: &Registry) -> Option<&'a ComponentId> {
    refs.iter().find(|id| !registry.contains_key(*id))
}

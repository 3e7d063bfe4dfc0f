// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use crate::component::{ComponentError, ComponentId, ComponentKind};

/// Broad class a [`ConfigError`] belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A required set is empty.
    StructuralEmptiness,
    /// An identifier does not resolve to a declared component.
    DanglingReference,
    /// A component rejected its own settings.
    ComponentValidationFailure,
    /// The collector's own telemetry settings are unsupported.
    TelemetryConfigInvalid,
}

/// First invariant a configuration violates.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no enabled receivers specified in config")]
    MissingReceivers,

    #[error("no enabled exporters specified in config")]
    MissingExporters,

    #[error("service must have at least one pipeline")]
    MissingPipelines,

    #[error("{kind} \"{id}\" has invalid configuration: {source}")]
    InvalidComponentConfig {
        kind: ComponentKind,
        id: ComponentId,
        #[source]
        source: ComponentError,
    },

    #[error(
        "service telemetry logs invalid encoding: \"{got}\", valid values are \"json\" and \"console\""
    )]
    InvalidTelemetryEncoding { got: String },

    #[error("service references extension \"{id}\" which does not exist")]
    UnknownExtensionReference { id: ComponentId },

    #[error("pipeline \"{pipeline}\" must have at least one receiver")]
    EmptyPipelineReceivers { pipeline: String },

    #[error("pipeline \"{pipeline}\" must have at least one exporter")]
    EmptyPipelineExporters { pipeline: String },

    #[error("pipeline \"{pipeline}\" references receiver \"{id}\" which does not exist")]
    UnknownReceiverReference { pipeline: String, id: ComponentId },

    #[error("pipeline \"{pipeline}\" references processor \"{id}\" which does not exist")]
    UnknownProcessorReference { pipeline: String, id: ComponentId },

    #[error("pipeline \"{pipeline}\" references exporter \"{id}\" which does not exist")]
    UnknownExporterReference { pipeline: String, id: ComponentId },
}

impl ConfigError {
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            ConfigError::MissingReceivers
            | ConfigError::MissingExporters
            | ConfigError::MissingPipelines
            | ConfigError::EmptyPipelineReceivers { .. }
            | ConfigError::EmptyPipelineExporters { .. } => ErrorCategory::StructuralEmptiness,
            ConfigError::UnknownExtensionReference { .. }
            | ConfigError::UnknownReceiverReference { .. }
            | ConfigError::UnknownProcessorReference { .. }
            | ConfigError::UnknownExporterReference { .. } => ErrorCategory::DanglingReference,
            ConfigError::InvalidComponentConfig { .. } => ErrorCategory::ComponentValidationFailure,
            ConfigError::InvalidTelemetryEncoding { .. } => ErrorCategory::TelemetryConfigInvalid,
        }
    }
}

/// Failure to turn a serialized document into a validated [`crate::config::Config`].
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read config file \"{}\": {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] Box<figment::Error>),

    #[error("unknown {kind} type \"{}\" for \"{id}\"", .id.component_type())]
    UnknownComponentType { kind: ComponentKind, id: ComponentId },

    #[error("error reading {kind} configuration for \"{id}\": {source}")]
    InvalidComponentSection {
        kind: ComponentKind,
        id: ComponentId,
        #[source]
        source: ComponentError,
    },

    #[error("pipeline \"{id}\": {reason}")]
    InvalidPipelineId { id: ComponentId, reason: String },

    #[error(transparent)]
    Validation(#[from] ConfigError),
}

impl From<figment::Error> for LoadError {
    fn from(err: figment::Error) -> Self {
        LoadError::Parse(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ConfigError::MissingReceivers.to_string(),
            "no enabled receivers specified in config"
        );
        assert_eq!(
            ConfigError::UnknownExporterReference {
                pipeline: "p1".to_string(),
                id: ComponentId::from("e2"),
            }
            .to_string(),
            "pipeline \"p1\" references exporter \"e2\" which does not exist"
        );
        assert_eq!(
            ConfigError::InvalidTelemetryEncoding {
                got: "yaml".to_string()
            }
            .to_string(),
            "service telemetry logs invalid encoding: \"yaml\", valid values are \"json\" and \"console\""
        );
    }

    #[test]
    fn test_invalid_component_keeps_cause() {
        let err = ConfigError::InvalidComponentConfig {
            kind: ComponentKind::Exporter,
            id: ComponentId::from("otlp/backend"),
            source: "endpoint must be set".into(),
        };
        assert_eq!(
            err.to_string(),
            "exporter \"otlp/backend\" has invalid configuration: endpoint must be set"
        );
        assert_eq!(
            err.source().map(ToString::to_string).as_deref(),
            Some("endpoint must be set")
        );
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            ConfigError::MissingPipelines.category(),
            ErrorCategory::StructuralEmptiness
        );
        assert_eq!(
            ConfigError::UnknownExtensionReference {
                id: ComponentId::from("health_check")
            }
            .category(),
            ErrorCategory::DanglingReference
        );
        assert_eq!(
            ConfigError::InvalidTelemetryEncoding { got: String::new() }.category(),
            ErrorCategory::TelemetryConfigInvalid
        );
    }

    #[test]
    fn test_load_error_display() {
        let err = LoadError::UnknownComponentType {
            kind: ComponentKind::Receiver,
            id: ComponentId::from("nosuch/1"),
        };
        assert_eq!(
            err.to_string(),
            "unknown receiver type \"nosuch\" for \"nosuch/1\""
        );

        let err = LoadError::from(ConfigError::MissingExporters);
        assert_eq!(err.to_string(), "no enabled exporters specified in config");
    }
}

// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! YAML configuration loading.
//!
//! The document is read through `figment`, each component section is handed to the factory
//! registered for its type, and pipeline keys are resolved to their data type.
//!
//! # Example Configuration
//!
//! ```yaml
//! receivers:
//!   otlp: {}
//! processors:
//!   batch: {}
//! exporters:
//!   logging: {}
//! extensions:
//!   health_check: {}
//! service:
//!   telemetry:
//!     logs:
//!       level: debug
//!       encoding: json
//!   extensions: [health_check]
//!   pipelines:
//!     traces:
//!       receivers: [otlp]
//!       processors: [batch]
//!       exporters: [logging]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use figment::{
    providers::{Format, Yaml},
    Figment,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::component::{ComponentId, ComponentKind, ConfigMap};
use crate::config::{deserialize_null_default, Config};
use crate::errors::LoadError;
use crate::factories::Factories;
use crate::pipeline::{DataType, Pipeline};
use crate::service::{Service, ServiceTelemetry};

/// Document shape before component sections are decoded.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    #[serde(deserialize_with = "deserialize_null_default")]
    receivers: BTreeMap<ComponentId, Value>,
    #[serde(deserialize_with = "deserialize_null_default")]
    processors: BTreeMap<ComponentId, Value>,
    #[serde(deserialize_with = "deserialize_null_default")]
    exporters: BTreeMap<ComponentId, Value>,
    #[serde(deserialize_with = "deserialize_null_default")]
    extensions: BTreeMap<ComponentId, Value>,
    #[serde(deserialize_with = "deserialize_null_default")]
    service: RawService,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawService {
    #[serde(deserialize_with = "deserialize_null_default")]
    telemetry: ServiceTelemetry,
    #[serde(deserialize_with = "deserialize_null_default")]
    extensions: Vec<ComponentId>,
    /// A pipeline written as a bare key decodes as empty.
    #[serde(deserialize_with = "deserialize_null_default")]
    pipelines: BTreeMap<ComponentId, Option<RawPipeline>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawPipeline {
    #[serde(deserialize_with = "deserialize_null_default")]
    receivers: Vec<ComponentId>,
    #[serde(deserialize_with = "deserialize_null_default")]
    processors: Vec<ComponentId>,
    #[serde(deserialize_with = "deserialize_null_default")]
    exporters: Vec<ComponentId>,
}

#[derive(Debug, Default)]
pub struct Loader {
    factories: Factories,
}

impl Loader {
    #[must_use]
    pub fn new(factories: Factories) -> Self {
        Self { factories }
    }

    /// Loads and validates the YAML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] if the file cannot be parsed, a section cannot be decoded, or
    /// the resulting configuration is invalid.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Config, LoadError> {
        let config = self.parse_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a YAML document.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load_file`].
    pub fn load_str(&self, yaml: &str) -> Result<Config, LoadError> {
        let config = self.parse_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Builds a configuration from the YAML file at `path` without validating it.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] if the file cannot be read or parsed, or a section cannot be
    /// decoded.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Config, LoadError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading collector configuration");
        let contents = fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_str(&contents)
    }

    /// Builds a configuration from a YAML document without validating it.
    ///
    /// # Errors
    ///
    /// Same as [`Self::parse_file`].
    pub fn parse_str(&self, yaml: &str) -> Result<Config, LoadError> {
        self.parse(Figment::new().merge(Yaml::string(yaml)))
    }

    /// Builds a configuration from any `figment` source without validating it.
    ///
    /// # Errors
    ///
    /// Same as [`Self::parse_file`].
    pub fn parse(&self, figment: Figment) -> Result<Config, LoadError> {
        let RawConfig {
            receivers,
            processors,
            exporters,
            extensions,
            service,
        } = figment.extract::<RawConfig>()?;

        let mut config = Config {
            service: Service {
                telemetry: service.telemetry,
                extensions: service.extensions,
                pipelines: BTreeMap::new(),
            },
            ..Default::default()
        };

        for (kind, sections) in [
            (ComponentKind::Receiver, receivers),
            (ComponentKind::Processor, processors),
            (ComponentKind::Exporter, exporters),
            (ComponentKind::Extension, extensions),
        ] {
            debug!(section = kind.section(), count = sections.len(), "Decoding components");
            for (id, section) in sections {
                let component = self
                    .factories
                    .create(kind, &id, &ConfigMap::from_value(section))?;
                config.registry_mut(kind).insert(id, component);
            }
        }

        for (id, raw) in service.pipelines {
            let raw = raw.unwrap_or_default();
            let input_type = DataType::from_str(id.component_type().as_str())
                .map_err(|reason| LoadError::InvalidPipelineId {
                    id: id.clone(),
                    reason,
                })?;
            let pipeline = Pipeline {
                name: id.to_string(),
                input_type,
                receivers: raw.receivers,
                processors: raw.processors,
                exporters: raw.exporters,
            };
            config.service.pipelines.insert(id, pipeline);
        }

        debug!(
            receivers = config.receivers.len(),
            processors = config.processors.len(),
            exporters = config.exporters.len(),
            extensions = config.extensions.len(),
            pipelines = config.service.pipelines.len(),
            "Parsed collector configuration"
        );
        Ok(config)
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentConfig, ComponentError};
    use crate::errors::ConfigError;
    use crate::log_level::LogLevel;
    use crate::service::LogEncoding;
    use std::path::Path;
    use tracing_test::traced_test;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct BatchConfig {
        send_batch_size: u32,
    }

    impl ComponentConfig for BatchConfig {
        fn validate(&self) -> Result<(), ComponentError> {
            if self.send_batch_size == 0 {
                return Err("send_batch_size must be greater than 0".into());
            }
            Ok(())
        }
    }

    const FULL_CONFIG: &str = r#"
receivers:
  otlp: {}
  otlp/2:
    endpoint: "localhost:55690"
processors:
  batch:
    send_batch_size: 512
exporters:
  logging:
    loglevel: debug
extensions:
  health_check: {}
  zpages: {}
service:
  telemetry:
    logs:
      level: warn
      development: true
      encoding: json
  extensions: [zpages, health_check]
  pipelines:
    traces:
      receivers: [otlp, otlp/2]
      processors: [batch]
      exporters: [logging]
    metrics/internal:
      receivers: [otlp]
      exporters: [logging]
"#;

    fn loader() -> Loader {
        Loader::new(Factories::lenient().register::<BatchConfig>(ComponentKind::Processor, "batch"))
    }

    #[test]
    fn test_load_full_config() {
        let config = loader().load_str(FULL_CONFIG).expect("config should be valid");

        assert_eq!(
            config.receivers.keys().map(ComponentId::as_str).collect::<Vec<_>>(),
            vec!["otlp", "otlp/2"]
        );
        assert_eq!(config.processors.len(), 1);
        assert_eq!(config.exporters.len(), 1);
        assert_eq!(config.extensions.len(), 2);

        let logs = &config.service.telemetry.logs;
        assert_eq!(logs.level, LogLevel::Warn);
        assert!(logs.development);
        assert_eq!(logs.log_encoding().unwrap(), LogEncoding::Json);

        // Declared order is kept.
        assert_eq!(
            config.service.extensions,
            vec![ComponentId::from("zpages"), ComponentId::from("health_check")]
        );

        let traces = &config.service.pipelines[&ComponentId::from("traces")];
        assert_eq!(traces.name, "traces");
        assert_eq!(traces.input_type, DataType::Traces);
        assert_eq!(
            traces.receivers,
            vec![ComponentId::from("otlp"), ComponentId::from("otlp/2")]
        );
        assert_eq!(traces.processors, vec![ComponentId::from("batch")]);

        let metrics = &config.service.pipelines[&ComponentId::from("metrics/internal")];
        assert_eq!(metrics.name, "metrics/internal");
        assert_eq!(metrics.input_type, DataType::Metrics);
        assert!(metrics.processors.is_empty());
    }

    #[test]
    fn test_telemetry_defaults_when_absent() {
        let yaml = r#"
receivers: {otlp: {}}
exporters: {logging: {}}
service:
  pipelines:
    logs:
      receivers: [otlp]
      exporters: [logging]
"#;
        let config = loader().load_str(yaml).unwrap();
        assert_eq!(config.service.telemetry, ServiceTelemetry::default());
        assert_eq!(
            config.service.pipelines[&ComponentId::from("logs")].input_type,
            DataType::Logs
        );
    }

    #[test]
    fn test_missing_sections_fail_validation_not_parsing() {
        let yaml = "service:\n  telemetry:\n    logs:\n      encoding: json\n";
        let config = loader().parse_str(yaml).unwrap();
        assert!(config.receivers.is_empty());
        assert!(config.service.pipelines.is_empty());
        assert!(matches!(
            loader().load_str(yaml),
            Err(LoadError::Validation(ConfigError::MissingReceivers))
        ));
    }

    #[test]
    fn test_component_validation_runs_after_decoding() {
        let yaml = FULL_CONFIG.replace("send_batch_size: 512", "send_batch_size: 0");
        match loader().load_str(&yaml) {
            Err(LoadError::Validation(ConfigError::InvalidComponentConfig { kind, id, .. })) => {
                assert_eq!(kind, ComponentKind::Processor);
                assert_eq!(id.as_str(), "batch");
            }
            other => panic!("expected invalid processor, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_component_section() {
        let yaml = FULL_CONFIG.replace("send_batch_size: 512", "send_batch_size: lots");
        assert!(matches!(
            loader().parse_str(&yaml),
            Err(LoadError::InvalidComponentSection {
                kind: ComponentKind::Processor,
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_type_with_strict_factories() {
        let strict = Loader::new(Factories::new());
        match strict.parse_str(FULL_CONFIG) {
            Err(LoadError::UnknownComponentType { kind, id }) => {
                assert_eq!(kind, ComponentKind::Receiver);
                assert_eq!(id.as_str(), "otlp");
            }
            other => panic!("expected unknown type, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_pipeline_type() {
        let yaml = FULL_CONFIG.replace("    traces:\n", "    spans:\n");
        match loader().parse_str(&yaml) {
            Err(err @ LoadError::InvalidPipelineId { .. }) => {
                assert_eq!(
                    err.to_string(),
                    "pipeline \"spans\": unknown data type 'spans', valid types are: traces, metrics, logs"
                );
            }
            other => panic!("expected invalid pipeline id, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_section_is_rejected() {
        let yaml = format!("{FULL_CONFIG}connectors: {{}}\n");
        assert!(matches!(
            loader().parse_str(&yaml),
            Err(LoadError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_log_level_is_a_parse_error() {
        let yaml = FULL_CONFIG.replace("level: warn", "level: loud");
        assert!(matches!(
            loader().parse_str(&yaml),
            Err(LoadError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_encoding_is_a_validation_error() {
        let yaml = FULL_CONFIG.replace("encoding: json", "encoding: yaml");
        assert!(loader().parse_str(&yaml).is_ok());
        assert!(matches!(
            loader().load_str(&yaml),
            Err(LoadError::Validation(ConfigError::InvalidTelemetryEncoding { got })) if got == "yaml"
        ));
    }

    #[test]
    fn test_null_lists_decode_as_empty() {
        let yaml = FULL_CONFIG
            .replace("      processors: [batch]\n", "      processors:\n")
            .replace("  extensions: [zpages, health_check]\n", "  extensions:\n");
        let config = loader().load_str(&yaml).expect("null lists should be empty");
        assert!(config.service.extensions.is_empty());
        assert!(config.service.pipelines[&ComponentId::from("traces")]
            .processors
            .is_empty());
    }

    #[test]
    fn test_null_pipeline_fails_validation() {
        let yaml = FULL_CONFIG.replace(
            "    metrics/internal:\n      receivers: [otlp]\n      exporters: [logging]\n",
            "    metrics/internal:\n",
        );
        let config = loader().parse_str(&yaml).unwrap();
        assert!(config.service.pipelines[&ComponentId::from("metrics/internal")]
            .receivers
            .is_empty());
        assert!(matches!(
            loader().load_str(&yaml),
            Err(LoadError::Validation(ConfigError::EmptyPipelineReceivers { pipeline }))
                if pipeline == "metrics/internal"
        ));
    }

    #[test]
    fn test_null_encoding_is_a_validation_error() {
        let yaml = FULL_CONFIG.replace("encoding: json", "encoding:");
        let config = loader().parse_str(&yaml).unwrap();
        assert_eq!(config.service.telemetry.logs.encoding, "");
        match loader().load_str(&yaml) {
            Err(LoadError::Validation(ConfigError::InvalidTelemetryEncoding { got })) => {
                assert_eq!(got, "");
            }
            other => panic!("expected invalid encoding, got {other:?}"),
        }
    }

    #[test]
    fn test_null_top_level_sections() {
        let yaml = "receivers:\nprocessors:\nservice:\n";
        let config = loader().parse_str(yaml).unwrap();
        assert!(config.receivers.is_empty());
        assert!(config.processors.is_empty());
        assert_eq!(config.service.telemetry, ServiceTelemetry::default());
    }

    #[test]
    #[traced_test]
    fn test_load_file() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("collector.yaml", FULL_CONFIG)?;

            let config = loader()
                .load_file(Path::new("collector.yaml"))
                .expect("Failed to load config");
            assert_eq!(config.service.pipelines.len(), 2);
            Ok(())
        });
        assert!(logs_contain("Loading collector configuration"));
        assert!(logs_contain("Parsed collector configuration"));
        assert!(logs_contain("Decoding components"));
    }

    #[test]
    fn test_load_missing_file() {
        figment::Jail::expect_with(|_jail| {
            match loader().load_file(Path::new("does-not-exist.yaml")) {
                Err(err @ LoadError::Read { .. }) => {
                    assert!(err.to_string().contains("does-not-exist.yaml"));
                }
                other => panic!("expected read error, got {other:?}"),
            }
            Ok(())
        });
    }
}

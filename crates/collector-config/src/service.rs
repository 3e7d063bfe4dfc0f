// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The `service` section: which extensions run, which pipelines are built, and how the
//! collector logs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::component::ComponentId;
use crate::config::deserialize_null_default;
use crate::errors::ConfigError;
use crate::log_level::LogLevel;
use crate::pipeline::Pipelines;

const DEFAULT_LOG_ENCODING: &str = "console";

#[derive(Debug, Default)]
pub struct Service {
    pub telemetry: ServiceTelemetry,
    /// Extensions to start, in order.
    pub extensions: Vec<ComponentId>,
    pub pipelines: Pipelines,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceTelemetry {
    #[serde(deserialize_with = "deserialize_null_default")]
    pub logs: ServiceTelemetryLogs,
}

impl ServiceTelemetry {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTelemetryEncoding`] if the log encoding is not supported.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logs.validate()
    }
}

/// Settings of the collector's own logger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceTelemetryLogs {
    /// Minimum enabled level.
    #[serde(deserialize_with = "deserialize_null_default")]
    pub level: LogLevel,
    /// Development mode takes stack traces more liberally and aborts on `dpanic`.
    #[serde(deserialize_with = "deserialize_null_default")]
    pub development: bool,
    /// Either `json` or `console`. Kept as written so that an invalid value can be reported
    /// verbatim. A null encoding is the empty string, which fails validation.
    #[serde(deserialize_with = "deserialize_null_default")]
    pub encoding: String,
}

impl Default for ServiceTelemetryLogs {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            development: false,
            encoding: DEFAULT_LOG_ENCODING.to_string(),
        }
    }
}

impl ServiceTelemetryLogs {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTelemetryEncoding`] unless the encoding is exactly `json`
    /// or `console`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.log_encoding().map(|_| ())
    }

    /// Parsed form of [`Self::encoding`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::validate`].
    pub fn log_encoding(&self) -> Result<LogEncoding, ConfigError> {
        LogEncoding::from_str(&self.encoding).map_err(|()| ConfigError::InvalidTelemetryEncoding {
            got: self.encoding.clone(),
        })
    }
}

/// Output format of the collector's own logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogEncoding {
    Json,
    Console,
}

impl AsRef<str> for LogEncoding {
    fn as_ref(&self) -> &str {
        match self {
            LogEncoding::Json => "json",
            LogEncoding::Console => "console",
        }
    }
}

impl fmt::Display for LogEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Case-sensitive: `JSON` is rejected.
impl FromStr for LogEncoding {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(LogEncoding::Json),
            "console" => Ok(LogEncoding::Console),
            _ => Err(()),
        }
    }
}

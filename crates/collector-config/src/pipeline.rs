// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::component::ComponentId;

/// Kind of telemetry a pipeline carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Traces,
    Metrics,
    Logs,
}

impl AsRef<str> for DataType {
    fn as_ref(&self) -> &str {
        match self {
            DataType::Traces => "traces",
            DataType::Metrics => "metrics",
            DataType::Logs => "logs",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "traces" => Ok(DataType::Traces),
            "metrics" => Ok(DataType::Metrics),
            "logs" => Ok(DataType::Logs),
            _ => Err(format!(
                "unknown data type '{s}', valid types are: traces, metrics, logs"
            )),
        }
    }
}

/// One data flow: receivers feed processors, in order, which feed exporters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pipeline {
    pub name: String,
    pub input_type: DataType,
    pub receivers: Vec<ComponentId>,
    /// Execution order.
    pub processors: Vec<ComponentId>,
    pub exporters: Vec<ComponentId>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, input_type: DataType) -> Self {
        Self {
            name: name.into(),
            input_type,
            receivers: Vec::new(),
            processors: Vec::new(),
            exporters: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_receivers<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ComponentId>,
    {
        self.receivers = ids.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_processors<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ComponentId>,
    {
        self.processors = ids.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_exporters<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ComponentId>,
    {
        self.exporters = ids.into_iter().map(Into::into).collect();
        self
    }
}

/// Pipelines keyed by pipeline identifier, traversed in identifier order.
pub type Pipelines = BTreeMap<ComponentId, Pipeline>;

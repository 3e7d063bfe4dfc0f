// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Configuration model, loader and validator for collector pipelines.
//!
//! A [`config::Config`] declares receivers, processors, exporters and extensions, and wires
//! them into named pipelines in its service section. [`config::Config::validate`] is the gate
//! between loading a configuration and building a running topology from it: it rejects
//! dangling references, empty required sets and unsupported telemetry settings.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod component;
pub mod config;
pub mod errors;
pub mod factories;
pub mod loader;
pub mod log_level;
pub mod pipeline;
pub mod service;

pub use component::{ComponentConfig, ComponentError, ComponentId, ComponentKind, Unmarshal};
pub use config::Config;
pub use errors::{ConfigError, LoadError};
pub use factories::Factories;
pub use loader::Loader;

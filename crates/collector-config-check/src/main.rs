// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::env;
use std::error::Error;
use std::process::ExitCode;

use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use collector_config::{Factories, Loader};

const CONFIG_PATH_ENV: &str = "COLLECTOR_CONFIG";
const LOG_LEVEL_ENV: &str = "COLLECTOR_LOG_LEVEL";
const LENIENT_ENV: &str = "COLLECTOR_LENIENT";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

pub fn main() -> ExitCode {
    let log_level = env::var(LOG_LEVEL_ENV)
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    let env_filter = match EnvFilter::try_new(&log_level) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("could not parse {LOG_LEVEL_ENV}={log_level}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(false)
        .without_time()
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("could not install log subscriber: {e}");
        return ExitCode::FAILURE;
    }

    let path = env::args()
        .nth(1)
        .or_else(|| env::var(CONFIG_PATH_ENV).ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let lenient = env::var(LENIENT_ENV)
        .map(|val| val.to_lowercase() == "true")
        .unwrap_or(true);

    // No component types are compiled into this binary, so only the structure of the
    // config can be checked unless strict mode is requested explicitly.
    let factories = if lenient {
        Factories::lenient()
    } else {
        Factories::new()
    };
    debug!(%path, lenient = factories.is_lenient(), "Checking collector configuration");

    match Loader::new(factories).load_file(&path) {
        Ok(config) => {
            let logs = &config.service.telemetry.logs;
            info!(
                %path,
                receivers = config.receivers.len(),
                processors = config.processors.len(),
                exporters = config.exporters.len(),
                extensions = config.extensions.len(),
                pipelines = config.service.pipelines.len(),
                log_level = %logs.level,
                log_encoding = %logs.encoding,
                "Configuration is valid"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            let cause = e.source().map(ToString::to_string);
            error!(%path, cause = ?cause, "Invalid configuration: {e}");
            ExitCode::FAILURE
        }
    }
}

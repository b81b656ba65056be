// Copyright 2022 jmjoy
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! CGI entry point: one request in, one response out.

use cgi_probe::{Config, Params, SessionManager, report};
use std::{io, process::ExitCode};
use tracing::{error, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_ENV: &str = "CGI_PROBE_LOG";
const DEFAULT_LOG_FILTER: &str = "cgi_probe=info";

fn main() -> ExitCode {
    let params = Params::from_env();
    init_logging(&params);

    let config = Config::from_params(&params).unwrap_or_else(|err| {
        warn!(error = %err, "Falling back to default configuration.");
        Config::default()
    });

    let mut sessions = SessionManager::new(config.session.clone());
    let result = report::respond(&params, io::stdin().lock(), &config, &mut sessions)
        .and_then(|response| response.write_to(io::stdout().lock()));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Failed to write response.");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr, stdout carries the response.
fn init_logging(params: &Params<'_>) {
    let filter = params
        .var(LOG_ENV)
        .or_else(|| params.var("RUST_LOG"))
        .and_then(|filter| EnvFilter::try_new(filter).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(false),
        )
        .init();
}

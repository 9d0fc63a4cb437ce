/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Command line front end: reads a page's stylesheets and prints the dark
//! theme override stylesheet for it.

use std::process::ExitCode;

use log::error;

mod analyzer;
mod fetch;
mod page;
mod prefs;

use crate::prefs::ArgumentParsingResult;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let prefs = match prefs::parse_command_line_arguments(std::env::args().collect()) {
        ArgumentParsingResult::Prefs(prefs) => prefs,
        ArgumentParsingResult::Exit => return ExitCode::SUCCESS,
        ArgumentParsingResult::ErrorParsing => return ExitCode::FAILURE,
    };

    // Current thread only: the engine is single threaded, the runtime just
    // drives timers like the site fix cache cleanup.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            error!("Failed to start the runtime: {error}");
            return ExitCode::FAILURE;
        },
    };

    match runtime.block_on(page::run(&prefs)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!("{error}");
            ExitCode::FAILURE
        },
    }
}

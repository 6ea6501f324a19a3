// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

use std::{env, process::exit};

use log::info;

use mutscan::{config::load_config, sequencer::run_analysis};

fn main() {
    env_logger::init();
    info!("Starting log");

    let args: Vec<String> = env::args().skip(1).collect();
    let config = load_config();
    exit(run_analysis(&args, config));
}

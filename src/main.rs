// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

use std::process::exit;

fn main() {
    if let Err(e) = mutscan::run() {
        eprintln!("Error: {}", e);
        exit(1);
    }
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Help output styling.
//!
//! Respects environment variables:
//! - `NO_COLOR=1`: Disables colors
//! - `COLOR=1`: Forces colors even without TTY

use clap::builder::Styles;
use std::io::IsTerminal;

/// ANSI 256-color codes used in help output.
pub mod codes {
    /// Section headers
    pub const HEADER: u8 = 74;
    /// Commands and flags
    pub const LITERAL: u8 = 250;
    /// Placeholders and defaults
    pub const CONTEXT: u8 = 245;
}

/// Check if colors should be enabled based on TTY and environment variables.
pub fn should_colorize() -> bool {
    if std::env::var("NO_COLOR").is_ok_and(|v| v == "1") {
        return false;
    }
    if std::env::var("COLOR").is_ok_and(|v| v == "1") {
        return true;
    }
    std::io::stdout().is_terminal()
}

pub fn styles() -> Styles {
    if !should_colorize() {
        return Styles::plain();
    }

    use anstyle::{Ansi256Color, Color, Style};

    let color = |code| Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(code))));
    let header = color(codes::HEADER);

    Styles::styled()
        .header(header)
        .usage(header)
        .literal(color(codes::LITERAL))
        .placeholder(color(codes::CONTEXT))
        .valid(color(codes::CONTEXT))
}

use std::io::IsTerminal as _;

use clap::{ColorChoice, Parser};

#[derive(Parser, Debug, Clone)]
pub struct Options {
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,

    #[arg(long, global = true, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Pretty-print JSON output
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,
}

impl Options {
    /// Whether log output on stderr should be colored
    pub fn use_color(&self) -> bool {
        match self.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => std::io::stderr().is_terminal(),
        }
    }
}

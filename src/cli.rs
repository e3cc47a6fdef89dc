use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::emoji::EmojiTarget;

#[derive(Parser, Debug)]
#[command(name = "slack-pusher-relay")]
#[command(about = "Slack to Pusher chat relay", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, global = true, env = "CONFIG_PATH", default_value = "config.yaml")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Run the HTTP relay (default)")]
    Serve,

    #[command(about = "Validate the configuration file and environment")]
    ValidateConfig,

    #[command(about = "Normalize an emoji token offline")]
    Normalize {
        token: String,

        #[arg(short, long, default_value = "display")]
        target: EmojiTarget,
    },
}

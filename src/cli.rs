//! Command-line interface for wakecam
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Wake-word triggered image capture over MQTT
#[derive(Parser, Debug)]
#[command(
    name = "wakecam",
    version,
    about = "Wake-word triggered image capture over MQTT"
)]
pub struct Cli {
    /// Node role to run
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose output (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Broker host override
    #[arg(long, global = true, value_name = "HOST")]
    pub broker_host: Option<String>,

    /// Broker port override
    #[arg(long, global = true, value_name = "PORT")]
    pub broker_port: Option<u16>,

    /// Topic prefix override
    #[arg(long, global = true, value_name = "PREFIX")]
    pub topic_prefix: Option<String>,
}

/// Available node roles
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the wake-word detection node
    Wake {
        /// Device id override
        #[arg(long, value_name = "ID")]
        device_id: Option<String>,

        /// Raw little-endian i16 PCM file to use as the microphone
        #[arg(long, value_name = "PATH")]
        audio: Option<PathBuf>,

        /// Run a single forced detection cycle, then exit
        #[arg(long)]
        once: bool,

        /// Trigger a detection cycle every N seconds
        #[arg(long, value_name = "SECONDS")]
        trigger_interval: Option<u64>,
    },

    /// Run the camera capture node
    Cam {
        /// Device id override
        #[arg(long, value_name = "ID")]
        device_id: Option<String>,

        /// JPEG file to publish on each capture request
        #[arg(long, value_name = "PATH")]
        frame: PathBuf,
    },

    /// Subscribe to image transfers and write reassembled JPEGs
    Recv {
        /// Directory to write received images into
        #[arg(long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,
    },
}

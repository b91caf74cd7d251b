// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Everything the user can tune lives here: which page to pack, where the
// archive goes, which format to write, and how the crawl behaves (timeout,
// headers, number of workers). main.rs turns these values into a validated,
// immutable PackOptions before any network work starts.
// =============================================================================

use crate::config::{DEFAULT_QUEUE_CAPACITY, DEFAULT_TIMEOUT_SECS, DEFAULT_WORKERS};
use crate::packer::PackFormat;
use clap::{ArgAction, Parser};

#[derive(Parser, Debug)]
#[command(
    name = "webpage-packer",
    version,
    about = "Pack a web page and the resources it references into one offline archive",
    long_about = "webpage-packer downloads a page together with the images, scripts and stylesheets \
                  it references and writes them into a single file: a Safari .webarchive or a \
                  self-contained HTML page."
)]
pub struct Cli {
    /// Page to pack (absolute http or https URL)
    #[arg(long)]
    pub url: String,

    /// Archive file output path
    #[arg(long, default_value = "output.webarchive")]
    pub output: String,

    /// Archive file type
    #[arg(long, value_enum, default_value_t = PackFormat::WebArchive)]
    pub pack_type: PackFormat,

    /// Request timeout in seconds (0 = default)
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Extra request header, e.g. --header 'Cookie: session=abc' (repeatable)
    #[arg(long = "header", value_name = "NAME: VALUE")]
    pub headers: Vec<String>,

    /// Number of concurrent fetch workers
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Maximum number of URLs waiting to be fetched
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Web page noise reduction (drop navigation, ads, banners, comments)
    #[arg(long)]
    pub clutter_free: bool,

    /// Refuse to fetch from loopback, private or link-local addresses
    #[arg(long)]
    pub block_private_network: bool,

    /// Print the pack report as JSON
    #[arg(long)]
    pub json: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

//! Command line surface

use clap::Parser;
use std::path::PathBuf;
use usenet_ul::Config;
use usenet_ul::discovery::{DEFAULT_BUNDLE_PATTERN, Selection};
use usenet_ul::pipeline::{ModeFlags, RunMode};
use usenet_ul::types::Scope;

/// Generate PAR2 recovery data and post files to Usenet, resuming where the last run stopped
#[derive(Debug, Parser)]
#[command(name = "usenet-ul", version, about)]
pub struct Cli {
    /// File or directory to upload
    #[arg(required_unless_present_any = ["clear_raw", "clear_resume", "raw"])]
    pub path: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, env = "USENET_UL_CONFIG", default_value = "config.yaml")]
    pub config: PathBuf,

    /// Upload with the public posting config and file receipts under `public/`
    #[arg(long)]
    pub public: bool,

    /// Only generate parity files, next to the inputs
    #[arg(long = "parpar", visible_alias = "generate-only")]
    pub generate_only: bool,

    /// Only upload, using parity files already next to the inputs
    #[arg(long = "nyuu", visible_alias = "upload-only")]
    pub upload_only: bool,

    /// Only repost raw articles left by earlier runs
    #[arg(long)]
    pub raw: bool,

    /// Do not repost raw articles before uploading
    #[arg(long)]
    pub skip_raw: bool,

    /// Delete every raw article and exit
    #[arg(long)]
    pub clear_raw: bool,

    /// Move each matched file into a folder of its own and exit
    #[arg(long = "move")]
    pub move_files: bool,

    /// Delete the resume ledger and exit
    #[arg(long)]
    pub clear_resume: bool,

    /// Extensions to match instead of the configured ones
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub exts: Vec<String>,

    /// Glob patterns, relative to the path, selecting files and folders
    #[arg(long, num_args = 1..)]
    pub glob: Vec<String>,

    /// Upload Blu-ray disc folders (`BDMV/index.bdmv`)
    #[arg(long, conflicts_with = "dvd")]
    pub bdmv: bool,

    /// Upload DVD folders (`VIDEO_TS/VIDEO_TS.{VOB,IFO,BUP}`)
    #[arg(long)]
    pub dvd: bool,

    /// Verbose logging, with tool output shown as it runs
    #[arg(long)]
    pub debug: bool,

    /// Neither consult nor update the resume ledger
    #[arg(long)]
    pub no_resume: bool,
}

impl Cli {
    /// Mode switches, before priority resolution
    pub fn mode_flags(&self) -> ModeFlags {
        ModeFlags {
            clear_resume: self.clear_resume,
            clear_raw: self.clear_raw,
            repost_only: self.raw,
            move_files: self.move_files,
            generate_only: self.generate_only,
            upload_only: self.upload_only,
            skip_repost: self.skip_raw,
        }
    }

    /// Resolved run mode
    pub fn mode(&self) -> RunMode {
        RunMode::from_flags(self.mode_flags())
    }

    /// Upload scope
    pub fn scope(&self) -> Scope {
        if self.public {
            Scope::Public
        } else {
            Scope::Private
        }
    }

    /// Whether directories are uploaded as disc bundles
    pub fn bundles(&self) -> bool {
        self.bdmv || self.dvd
    }

    /// Input selection; disc modes use `--glob` to pick the folders to search
    pub fn selection(&self, config: &Config) -> Selection {
        let patterns = || {
            if self.glob.is_empty() {
                vec![DEFAULT_BUNDLE_PATTERN.to_string()]
            } else {
                self.glob.clone()
            }
        };

        if self.bdmv {
            Selection::Bdmv(patterns())
        } else if self.dvd {
            Selection::Dvd(patterns())
        } else if !self.glob.is_empty() {
            Selection::Glob(self.glob.clone())
        } else if !self.exts.is_empty() {
            Selection::Extensions(self.exts.clone())
        } else {
            Selection::Extensions(config.discovery.extensions.clone())
        }
    }
}

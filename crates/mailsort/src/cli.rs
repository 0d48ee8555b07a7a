//! Command line definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use mailsort_core::RawWeights;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "mailsort")]
#[command(about = "Sort email into categories by weighted keyword matches")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Category database (default: data dir/mailsort/mailsort.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Settings file (default: config dir/mailsort/settings.json)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    #[command(flatten)]
    pub weights: WeightArgs,

    /// Log per-keyword match counts
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Weight overrides. Invalid values fall back to the defaults.
#[derive(Args, Default)]
pub struct WeightArgs {
    /// Weight per keyword match in the subject
    #[arg(long, global = true)]
    pub subject_weight: Option<String>,

    /// Weight per keyword match in the body
    #[arg(long, global = true)]
    pub body_weight: Option<String>,

    /// Recency multiplier applied per newer thread segment
    #[arg(long, global = true)]
    pub recency_multiplier: Option<String>,

    /// Minimum score required to apply a category
    #[arg(long, global = true)]
    pub score_threshold: Option<String>,
}

impl WeightArgs {
    /// The overrides as raw weights, for merging over the settings file.
    pub fn to_raw(&self) -> RawWeights {
        RawWeights {
            subject_weight: self.subject_weight.clone().map(Value::String),
            body_weight: self.body_weight.clone().map(Value::String),
            recency_multiplier: self.recency_multiplier.clone().map(Value::String),
            score_threshold: self.score_threshold.clone().map(Value::String),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify every message in a folder
    Run {
        /// Folder name under the Maildir root (e.g. Inbox)
        #[arg(index = 1)]
        folder: String,

        /// Maildir root (default: settings, then current directory)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// Score one message file without applying anything
    Score {
        /// RFC 5322 message file
        #[arg(index = 1)]
        file: PathBuf,
    },

    /// Manage categories
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },
}

#[derive(Subcommand)]
pub enum CategoryAction {
    /// List categories and their keywords
    List,
    /// Add a category, or replace its keywords
    Add {
        /// Category name
        #[arg(index = 1)]
        name: String,

        /// Keywords (matched case-insensitively as substrings)
        #[arg(index = 2, required = true)]
        keywords: Vec<String>,
    },
    /// Remove a category
    Remove {
        /// Category name
        #[arg(index = 1)]
        name: String,
    },
    /// Show a category's keywords and the messages assigned to it
    Show {
        /// Category name
        #[arg(index = 1)]
        name: String,
    },
}

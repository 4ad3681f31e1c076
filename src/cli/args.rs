//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum, ValueHint};

use crate::domain::{Direction, NodeKind};

/// Chapter outline editor: reorder, add, delete and edit chapters of an outline file
#[derive(Parser, Debug)]
#[command(name = "outline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug level: -d info, -dd debug, -ddd trace
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Outline file (default: `outline_file` setting)
    #[arg(short, long, global = true, env = "OUTLINE_FILE", value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an outline holding the default chapter
    Init,

    /// Show the outline as a tree
    Show,

    /// Verify ids, back-references and sibling groups
    Check,

    /// Add a chapter right after another one
    Add {
        /// Id of the chapter to insert after
        after: String,
        /// Kind of the new chapter
        #[arg(short, long, value_enum, default_value_t = KindArg::Leaf)]
        kind: KindArg,
    },

    /// Move a chapter one position among its siblings
    Move {
        /// Chapter id
        node: String,
        #[arg(value_enum)]
        direction: DirectionArg,
    },

    /// Delete a chapter and everything below it
    Delete {
        /// Chapter id
        node: String,
    },

    /// Rename a chapter
    Rename {
        /// Chapter id
        node: String,
        /// New display name
        name: String,
    },

    /// Replace a chapter's content through the editor bridge
    Edit {
        /// Chapter id
        node: String,
        /// Content as JSON, e.g. '{"blocks": []}'
        content: String,
    },

    /// Upload a file and append it as an image block
    Attach {
        /// Chapter id
        node: String,
        /// File to upload
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Append a YouTube embed block
    Embed {
        /// Chapter id
        node: String,
        /// Video URL (watch, youtu.be or embed link)
        url: String,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Print a commented template config
    Template,
    /// Show config file locations
    Path,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    Leaf,
    Container,
}

impl From<KindArg> for NodeKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Leaf => NodeKind::Leaf,
            KindArg::Container => NodeKind::Container,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionArg {
    Up,
    Down,
}

impl From<DirectionArg> for Direction {
    fn from(direction: DirectionArg) -> Self {
        match direction {
            DirectionArg::Up => Direction::Up,
            DirectionArg::Down => Direction::Down,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    // https://docs.rs/clap/latest/clap/_derive/_tutorial/index.html#testing
    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_add_with_kind() {
        let cli = Cli::try_parse_from(["outline", "add", "abc", "--kind", "container"]).unwrap();
        match cli.command {
            Some(Commands::Add { after, kind }) => {
                assert_eq!(after, "abc");
                assert_eq!(NodeKind::from(kind), NodeKind::Container);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn counts_debug_flags() {
        let cli = Cli::try_parse_from(["outline", "-ddd", "show"]).unwrap();
        assert_eq!(cli.debug, 3);
    }
}

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use docseek::Annotation;

#[derive(Debug, Parser)]
#[command(
    name = "docseek",
    about = "Keyword search over extracted and annotated documents"
)]
pub struct Cli {
    /// Override the XDG data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage stored documents
    Doc {
        #[command(subcommand)]
        action: DocAction,
    },
    /// Manage page annotations
    Annotation {
        #[command(subcommand)]
        action: AnnotationAction,
    },
    /// Search titles, pages, translations and annotations for a keyword
    Search(SearchArgs),
    /// Show or change snippet window settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show system status and statistics
    Status(StatusArgs),
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Documents --

#[derive(Debug, Subcommand)]
pub enum DocAction {
    /// Store the extraction output of one document
    Import {
        /// JSON file with `pages` or a flat `text` array
        path: PathBuf,
        /// Title to use instead of the one in the file
        #[arg(long)]
        title: Option<String>,
    },
    /// List stored documents
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print one document
    Show {
        id: u64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change the title of a document
    Rename { id: u64, title: String },
    /// Replace every page of a document
    Edit {
        id: u64,
        /// JSON file with `pages` or a flat `text` array
        path: PathBuf,
    },
    /// Change the text or translation of one page
    SetPage {
        id: u64,
        /// Page number, starting at 1
        page: usize,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        translation: Option<String>,
    },
    /// Remove a document with its pages and annotations
    Remove { id: u64 },
}

// -- Annotations --

#[derive(Debug, Args)]
pub struct AnnotationFields {
    /// Annotated term or phrase
    #[arg(long)]
    pub target: Option<String>,
    /// Free-form classification
    #[arg(long = "type")]
    pub kind: Option<String>,
    /// Note text
    #[arg(long)]
    pub content: Option<String>,
}

impl From<AnnotationFields> for Annotation {
    fn from(fields: AnnotationFields) -> Self {
        Self {
            target_text: fields.target,
            kind: fields.kind,
            content: fields.content,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum AnnotationAction {
    /// Attach an annotation to a page
    Add {
        doc: u64,
        page: usize,
        #[command(flatten)]
        fields: AnnotationFields,
    },
    /// Change the given fields of an annotation
    Update {
        doc: u64,
        page: usize,
        /// Annotation position on the page, starting at 1
        position: usize,
        #[command(flatten)]
        fields: AnnotationFields,
    },
    /// Remove an annotation
    Remove {
        doc: u64,
        page: usize,
        position: usize,
    },
    /// List the annotations of a page
    List {
        doc: u64,
        page: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

// -- Search --

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// Keyword to look for (case-insensitive substring)
    pub keyword: String,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Context characters before a hit in structured fields
    #[arg(long)]
    pub before: Option<usize>,

    /// Context characters after a hit in structured fields
    #[arg(long)]
    pub after: Option<usize>,

    /// Context characters before a hit in raw page text
    #[arg(long)]
    pub raw_before: Option<usize>,

    /// Context characters after a hit in raw page text
    #[arg(long)]
    pub raw_after: Option<usize>,
}

// -- Config --

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective snippet windows
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Persist one snippet window setting
    Set {
        /// One of structured_before, structured_after, raw_before, raw_after
        key: String,
        value: usize,
    },
}

// -- Status --

#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "docseek",
            &mut std::io::stdout(),
        );
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn parse_search_defaults() {
        let cli = Cli::parse_from(["docseek", "search", "report"]);
        match cli.command {
            Command::Search(args) => {
                assert_eq!(args.keyword, "report");
                assert!(!args.json);
                assert_eq!(args.before, None);
                assert_eq!(args.raw_after, None);
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn parse_annotation_type_flag() {
        let cli = Cli::parse_from([
            "docseek",
            "annotation",
            "add",
            "3",
            "2",
            "--target",
            "important",
            "--type",
            "term",
        ]);
        match cli.command {
            Command::Annotation {
                action: AnnotationAction::Add { doc, page, fields },
            } => {
                assert_eq!((doc, page), (3, 2));
                let annotation = Annotation::from(fields);
                assert_eq!(annotation.target_text.as_deref(), Some("important"));
                assert_eq!(annotation.kind.as_deref(), Some("term"));
                assert_eq!(annotation.content, None);
            }
            _ => panic!("expected annotation add command"),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}

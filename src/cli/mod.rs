use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::archive::models::ResourceKind;

#[derive(Parser)]
#[command(name = "termarchive")]
#[command(author, version, about = "Glossary and translation-memory archive with highlighted search", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Archive database file (overrides storage.database)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Acting user recorded on created and updated entries
    #[arg(long, global = true)]
    pub actor: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import a .txt, .tmx or .docx file into a resource
    Upload(UploadArgs),

    /// Search all resources for a substring
    Search(SearchArgs),

    /// Manage glossaries and translations
    Resource(ResourceArgs),

    /// Add or remove single entries
    Item(ItemArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    Glossary,
    Translation,
}

impl From<KindArg> for ResourceKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Glossary => ResourceKind::Glossary,
            KindArg::Translation => ResourceKind::Translation,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Html,
    Json,
}

#[derive(Parser, Debug)]
pub struct UploadArgs {
    /// File to import (.txt tab-delimited, .tmx or .docx)
    #[arg(required = true)]
    pub file: PathBuf,

    /// Append to the existing resource with this id
    #[arg(long, conflicts_with_all = ["title", "kind", "field", "client", "translator"])]
    pub into: Option<i64>,

    /// Create a new resource with this title
    #[arg(short, long)]
    pub title: Option<String>,

    /// Kind of a new resource (defaults by file type)
    #[arg(short, long, value_enum)]
    pub kind: Option<KindArg>,

    /// Notes (appended to existing notes when uploading into a resource)
    #[arg(short, long)]
    pub notes: Option<String>,

    /// Field or domain of a new resource
    #[arg(long)]
    pub field: Option<String>,

    /// Client of a new resource
    #[arg(long)]
    pub client: Option<String>,

    /// Translator of a new resource
    #[arg(long)]
    pub translator: Option<String>,
}

#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Text to search for; wrap in double quotes to keep surrounding spaces
    #[arg(required = true, allow_hyphen_values = true)]
    pub query: String,

    /// all, glossaries, translations, or the title of one resource
    #[arg(short, long, default_value = "all")]
    pub scope: String,

    /// Do not match against notes
    #[arg(long, default_value_t = false)]
    pub no_notes: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Show at most this many results
    #[arg(short, long)]
    pub limit: Option<usize>,
}

#[derive(Parser, Debug)]
pub struct ResourceArgs {
    #[command(subcommand)]
    pub action: ResourceAction,
}

#[derive(Subcommand, Debug)]
pub enum ResourceAction {
    /// List resources
    List {
        /// Only list this kind
        #[arg(short, long, value_enum)]
        kind: Option<KindArg>,
    },

    /// Show a resource
    Show {
        id: i64,

        /// Also list its entries
        #[arg(long, default_value_t = false)]
        items: bool,
    },

    /// Create an empty resource
    Create {
        #[arg(short, long)]
        title: String,

        #[arg(short, long, value_enum, default_value_t = KindArg::Glossary)]
        kind: KindArg,

        #[arg(short, long)]
        notes: Option<String>,

        #[arg(long)]
        field: Option<String>,

        #[arg(long)]
        client: Option<String>,

        #[arg(long)]
        translator: Option<String>,
    },

    /// Edit a resource's title or details (the kind cannot change)
    Update {
        id: i64,

        #[arg(short, long)]
        title: Option<String>,

        /// Replaces the existing notes
        #[arg(short, long)]
        notes: Option<String>,

        #[arg(long)]
        field: Option<String>,

        #[arg(long)]
        client: Option<String>,

        #[arg(long)]
        translator: Option<String>,
    },

    /// Delete a resource and all of its entries
    Delete { id: i64 },
}

#[derive(Parser, Debug)]
pub struct ItemArgs {
    #[command(subcommand)]
    pub action: ItemAction,
}

#[derive(Subcommand, Debug)]
pub enum ItemAction {
    /// Add an entry to a resource
    Add {
        resource_id: i64,

        #[arg(short, long)]
        source: String,

        #[arg(short, long, default_value = "")]
        target: String,

        #[arg(short, long, default_value = "")]
        notes: String,
    },

    /// Edit an entry
    Update {
        id: i64,

        #[arg(short, long)]
        source: Option<String>,

        #[arg(short, long)]
        target: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Delete an entry
    Delete { id: i64 },
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Initialize configuration file with defaults
    Init {
        /// Overwrite existing config
        #[arg(short, long, default_value_t = false)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., search.include_notes)
        key: String,
        /// Value to set
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Show config file path
    Path,

    /// Edit config file with default editor
    Edit,
}

use clap::Parser;

/// Builds the per-state presidential election dataset (1948-2020) from the
/// MEDSL returns and the historical results pages.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON configuration of the sources, the cache and the output.
    /// All the keys are optional. See the documentation of the election_records crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference dataset in JSON format. If provided, emdata will check that
    /// the dataset it builds is identical to the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path or '-') Where the dataset is written. '-' writes to the standard output.
    /// Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (URL or file path) The tabular source, tried before the local copy.
    #[clap(long, value_parser)]
    pub tabular_url: Option<String>,

    /// (file path) The local copy of the tabular source.
    #[clap(long, value_parser)]
    pub tabular_local: Option<String>,

    /// (directory) Where saved results pages are looked up as <year>.html when they cannot be
    /// fetched.
    #[clap(long, value_parser)]
    pub pages_dir: Option<String>,

    /// The cache key. A cached dataset stored under another key is rebuilt.
    #[clap(long, value_parser)]
    pub cache_key: Option<String>,

    /// Ignores the cached dataset and rebuilds it from the sources.
    #[clap(long, takes_value = false)]
    pub refresh: bool,

    /// Neither reads nor writes the cache.
    #[clap(long, takes_value = false)]
    pub no_cache: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}

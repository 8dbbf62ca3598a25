use crate::args::Args;
use crate::ingest::*;

use election_records::tabular::TabularShape;
use election_records::{FIRST_YEAR, LAST_SCRAPED_YEAR};
use serde::{Deserialize, Serialize};

pub const DEFAULT_URL_TEMPLATE: &str =
    "https://en.wikipedia.org/wiki/{year}_United_States_presidential_election";

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TabularSource {
    /// Tried first. A URL, or a file path.
    pub url: Option<String>,
    #[serde(rename = "localPath")]
    pub local_path: String,
    /// Detected from the header when not set.
    pub shape: Option<TabularShape>,
}

impl Default for TabularSource {
    fn default() -> Self {
        TabularSource {
            url: None,
            local_path: "data/1976-2020-president.csv".to_string(),
            shape: None,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapedSource {
    pub enabled: bool,
    /// `{year}` is replaced by the election year.
    #[serde(rename = "urlTemplate")]
    pub url_template: String,
    #[serde(rename = "firstYear")]
    pub first_year: u32,
    #[serde(rename = "lastYear")]
    pub last_year: u32,
    #[serde(rename = "pagesDir")]
    pub pages_dir: Option<String>,
    #[serde(rename = "tableHeading")]
    pub table_heading: String,
    #[serde(rename = "evCeiling")]
    pub ev_ceiling: u32,
}

impl Default for ScrapedSource {
    fn default() -> Self {
        ScrapedSource {
            enabled: true,
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            first_year: FIRST_YEAR,
            last_year: LAST_SCRAPED_YEAR,
            pages_dir: None,
            table_heading: "Results by state".to_string(),
            ev_ceiling: 100,
        }
    }
}

impl ScrapedSource {
    /// The election years in the configured range.
    pub fn years(&self) -> Vec<u32> {
        if !self.enabled {
            return vec![];
        }
        (self.first_year..=self.last_year)
            .filter(|y| y % 4 == 0)
            .collect()
    }

    pub fn page_url(&self, year: u32) -> String {
        self.url_template.replace("{year}", &year.to_string())
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub key: String,
    /// Defaults to the user cache directory.
    pub path: Option<String>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            enabled: true,
            key: "elections-v1".to_string(),
            path: None,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub tabular: TabularSource,
    pub scraped: ScrapedSource,
    pub cache: CacheSettings,
    /// A file path, or "-" for the standard output.
    pub output: String,
    #[serde(rename = "collisionPolicy")]
    pub collision_policy: CollisionPolicy,
    #[serde(rename = "requestDelayMs")]
    pub request_delay_ms: u64,
    #[serde(rename = "userAgent")]
    pub user_agent: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        IngestConfig {
            tabular: TabularSource::default(),
            scraped: ScrapedSource::default(),
            cache: CacheSettings::default(),
            output: "data/elections.json".to_string(),
            collision_policy: CollisionPolicy::default(),
            request_delay_ms: 700,
            user_agent: "electoral-map-data/0.1 (presidential results dataset builder)"
                .to_string(),
        }
    }
}

impl IngestConfig {
    /// The command line options take precedence over the file.
    pub fn with_args(self, args: &Args) -> IngestConfig {
        let mut config = self;
        if let Some(out) = &args.out {
            config.output = out.clone();
        }
        if let Some(url) = &args.tabular_url {
            config.tabular.url = Some(url.clone());
        }
        if let Some(local) = &args.tabular_local {
            config.tabular.local_path = local.clone();
        }
        if let Some(dir) = &args.pages_dir {
            config.scraped.pages_dir = Some(dir.clone());
        }
        if let Some(key) = &args.cache_key {
            config.cache.key = key.clone();
        }
        if args.no_cache {
            config.cache.enabled = false;
        }
        config
    }
}

/// Reads the configuration file, or the defaults when there is none.
pub fn read_config(path: Option<&str>) -> IngestResult<IngestConfig> {
    match path {
        None => Ok(IngestConfig::default()),
        Some(p) => {
            let contents = fs::read_to_string(p).context(OpeningJsonSnafu { path: p })?;
            debug!("read_config: {:?}", contents);
            let config: IngestConfig =
                serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
            Ok(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_keys_take_defaults() {
        let js = r#"{
            "tabular": { "url": "https://example.org/president.csv" },
            "scraped": { "firstYear": 1960 },
            "collisionPolicy": "preferTabular"
        }"#;
        let config: IngestConfig = serde_json::from_str(js).unwrap();
        assert_eq!(
            config.tabular.url.as_deref(),
            Some("https://example.org/president.csv")
        );
        assert_eq!(config.tabular.local_path, "data/1976-2020-president.csv");
        assert_eq!(config.scraped.years(), vec![1960, 1964, 1968, 1972]);
        assert_eq!(config.collision_policy, CollisionPolicy::PreferTabular);
        assert_eq!(config.request_delay_ms, 700);
        assert!(config.cache.enabled);
    }

    #[test]
    fn shape_and_policy_names() {
        let js = r#"{ "tabular": { "shape": "long" }, "collisionPolicy": "fail" }"#;
        let config: IngestConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.tabular.shape, Some(TabularShape::Long));
        assert_eq!(config.collision_policy, CollisionPolicy::Fail);
        assert!(serde_json::from_str::<IngestConfig>(r#"{ "collisionPolicy": "newest" }"#).is_err());
    }

    #[test]
    fn years_and_page_urls() {
        let scraped = ScrapedSource::default();
        let years = scraped.years();
        assert_eq!(years.first(), Some(&1948));
        assert_eq!(years.last(), Some(&1972));
        assert_eq!(years.len(), 7);
        assert_eq!(
            scraped.page_url(1960),
            "https://en.wikipedia.org/wiki/1960_United_States_presidential_election"
        );
        let disabled = ScrapedSource {
            enabled: false,
            ..ScrapedSource::default()
        };
        assert!(disabled.years().is_empty());
    }

    #[test]
    fn args_override_the_file() {
        let args = Args {
            out: Some("-".to_string()),
            tabular_local: Some("/tmp/president.csv".to_string()),
            pages_dir: Some("pages".to_string()),
            cache_key: Some("v2".to_string()),
            no_cache: true,
            ..Args::default()
        };
        let config = IngestConfig::default().with_args(&args);
        assert_eq!(config.output, "-");
        assert_eq!(config.tabular.local_path, "/tmp/president.csv");
        assert_eq!(config.tabular.url, None);
        assert_eq!(config.scraped.pages_dir.as_deref(), Some("pages"));
        assert_eq!(config.cache.key, "v2");
        assert!(!config.cache.enabled);
    }

    #[test]
    fn reading_files() {
        assert_eq!(read_config(None).unwrap(), IngestConfig::default());

        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{ "output": "out.json", "requestDelayMs": 0 }}"#).unwrap();
        let path = f.path().to_str().unwrap().to_string();
        let config = read_config(Some(&path)).unwrap();
        assert_eq!(config.output, "out.json");
        assert_eq!(config.request_delay_ms, 0);

        assert!(matches!(
            read_config(Some("/nonexistent/ingest.json")),
            Err(IngestError::OpeningJson { .. })
        ));
        let mut bad = tempfile::NamedTempFile::new().unwrap();
        write!(bad, "{{ not json").unwrap();
        let path = bad.path().to_str().unwrap().to_string();
        assert!(matches!(
            read_config(Some(&path)),
            Err(IngestError::ParsingJson { .. })
        ));
    }
}

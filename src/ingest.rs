use log::{debug, info, warn};

use election_records::legacy::HeuristicExtractor;
use election_records::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::ingest::config_reader::*;
use crate::ingest::io_common::{fetch_rendered_page, fetch_tabular, Fetcher, HttpFetcher};

mod cache;
mod config_reader;
mod io_common;
mod io_csv;
mod io_html;

#[derive(Debug, Snafu)]
pub enum IngestError {
    #[snafu(display("Could not fetch {url}"))]
    RemoteFetch { source: reqwest::Error, url: String },
    #[snafu(display("{url} answered with HTTP status {status}"))]
    RemoteStatus { url: String, status: u16 },
    #[snafu(display("Could not build the HTTP client"))]
    HttpClient { source: reqwest::Error },
    #[snafu(display("Error reading file {path}"))]
    LocalRead { source: std::io::Error, path: String },
    #[snafu(display("Source unavailable: neither {url} nor {local} could be read"))]
    SourceUnavailable { url: String, local: String },
    #[snafu(display("No results table found in the page of {year}"))]
    TableNotFound { year: u32 },
    #[snafu(display("Error reading CSV"))]
    CsvParse { source: csv::Error },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson { source: std::io::Error, path: String },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing {path}"))]
    Writing { source: std::io::Error, path: String },
    #[snafu(display("Cannot merge the sources"))]
    Merging { source: MergeError },
    #[snafu(display("No record could be read from the sources"))]
    EmptyDataset {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type IngestResult<T> = Result<T, IngestError>;

fn log_outcome(source: &str, outcome: &NormalizeOutcome) {
    info!(
        "{}: {} records, {} rows dropped",
        source,
        outcome.records.len(),
        outcome.dropped
    );
    if outcome.malformed > 0 {
        warn!("{}: {} malformed rows skipped", source, outcome.malformed);
    }
}

/// Reads all the sources, normalizes them and merges the result.
///
/// Nothing is normalized before every source has been read.
pub fn ingest_all(config: &IngestConfig, fetcher: &dyn Fetcher) -> IngestResult<Vec<ElectionRecord>> {
    let tabular_text = fetch_tabular(
        fetcher,
        config.tabular.url.as_deref(),
        &config.tabular.local_path,
    )?;
    let pages: Vec<(u32, String)> = config
        .scraped
        .years()
        .into_iter()
        .filter_map(|year| {
            let url = config.scraped.page_url(year);
            match fetch_rendered_page(fetcher, &url, year, config.scraped.pages_dir.as_deref()) {
                Ok(html) => Some((year, html)),
                Err(e) => {
                    warn!("ingest_all: skipping {}: {}", year, e);
                    None
                }
            }
        })
        .collect();

    let tabular = io_csv::normalize_tabular_text(&tabular_text, config.tabular.shape)?;
    log_outcome("tabular", &tabular);

    let extractor = HeuristicExtractor {
        ev_ceiling: config.scraped.ev_ceiling,
    };
    let scraped = pages
        .iter()
        .fold(NormalizeOutcome::default(), |acc, (year, html)| {
            match io_html::extract_year(*year, html, &config.scraped.table_heading, &extractor) {
                Ok(outcome) => acc.absorb(outcome),
                Err(e) => {
                    warn!("ingest_all: {}", e);
                    acc
                }
            }
        });
    log_outcome("scraped", &scraped);

    let merged = merge_records(scraped.records, tabular.records, config.collision_policy)
        .context(MergingSnafu {})?;
    ensure!(!merged.is_empty(), EmptyDatasetSnafu {});
    Ok(merged)
}

/// The dataset, from the cache when it holds an entry for the configured
/// key, otherwise built from the sources (and then cached).
pub fn get_dataset(
    config: &IngestConfig,
    fetcher: &dyn Fetcher,
    refresh: bool,
) -> IngestResult<Vec<ElectionRecord>> {
    let path: PathBuf = cache::cache_path(&config.cache);
    if config.cache.enabled && !refresh {
        if let Some(records) = cache::load(&path, &config.cache.key) {
            return Ok(records);
        }
    }
    let records = ingest_all(config, fetcher)?;
    if config.cache.enabled {
        cache::store(&path, &config.cache.key, &records)?;
    }
    Ok(records)
}

/// The pretty-printed dataset, with a final newline.
pub fn dataset_json(records: &[ElectionRecord]) -> IngestResult<String> {
    let js = serde_json::to_string_pretty(records).context(ParsingJsonSnafu {})?;
    Ok(format!("{}\n", js))
}

/// Writes the dataset to `out`, a file path or "-" for the standard output.
pub fn write_dataset(pretty: &str, out: &str) -> IngestResult<()> {
    if out == "-" {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(pretty.as_bytes())
            .context(WritingSnafu { path: out })?;
        return Ok(());
    }
    if let Some(parent) = PathBuf::from(out).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context(WritingSnafu { path: out })?;
        }
    }
    fs::write(out, pretty).context(WritingSnafu { path: out })?;
    info!("write_dataset: written to {}", out);
    Ok(())
}

/// Compares the dataset with a reference file, printing the differences.
pub fn check_reference(records: &[ElectionRecord], reference_path: &str) -> IngestResult<()> {
    let contents =
        fs::read_to_string(reference_path).context(OpeningJsonSnafu { path: reference_path })?;
    let reference: JSValue = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    let computed: JSValue = serde_json::to_value(records).context(ParsingJsonSnafu {})?;
    let pretty_reference = serde_json::to_string_pretty(&reference).context(ParsingJsonSnafu {})?;
    let pretty_computed = serde_json::to_string_pretty(&computed).context(ParsingJsonSnafu {})?;
    if pretty_reference != pretty_computed {
        warn!("Found differences with the reference dataset");
        print_diff(pretty_reference.as_str(), pretty_computed.as_str(), "\n");
        whatever!("Difference detected between the dataset and the reference {}", reference_path)
    }
    info!("check_reference: identical to {}", reference_path);
    Ok(())
}

pub fn run_ingestion(args: &Args) -> IngestResult<()> {
    let config = read_config(args.config.as_deref())?.with_args(args);
    info!("config: {:?}", config);

    let fetcher = HttpFetcher::new(
        &config.user_agent,
        Duration::from_millis(config.request_delay_ms),
    )?;
    let records = get_dataset(&config, &fetcher, args.refresh)?;
    let digest = dataset_digest(&records).context(ParsingJsonSnafu {})?;
    info!("dataset: {} records, digest {}", records.len(), digest);
    debug!(
        "dataset: years {:?} to {:?}",
        records.first().map(|r| r.year()),
        records.last().map(|r| r.year())
    );

    let pretty = dataset_json(&records)?;
    write_dataset(&pretty, &config.output)?;

    if let Some(reference_path) = &args.reference {
        check_reference(&records, reference_path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::io_common::StubFetcher;

    const TABULAR_URL: &str = "https://example.org/president.csv";

    const TABULAR: &str = "\
year,state_po,state_fips,office,democratic_percentage,republican_percentage,total_electoral_votes
2000,CA,6,US PRESIDENT,53.45,41.65,54
1976,AL,1,US PRESIDENT,55.73,42.61,9
2000,CA,6,US SENATE,55.84,36.53,
";

    const PAGE_1972: &str = r#"<html><body>
<h3>Results by state</h3>
<table class="wikitable">
  <tr><th>State</th><th>EV</th><th>%</th><th>%</th></tr>
  <tr><td>California</td><td>45</td><td>55.00%</td><td>41.54%</td><td>CA</td></tr>
  <tr><td>Massachusetts</td><td>14</td><td>45.23%</td><td>54.20%</td><td>MA</td></tr>
</table>
</body></html>"#;

    fn test_config(cache_dir: &std::path::Path) -> IngestConfig {
        let mut config = IngestConfig::default();
        config.tabular.url = Some(TABULAR_URL.to_string());
        config.tabular.local_path = "/nonexistent/president.csv".to_string();
        config.scraped.url_template = "https://example.org/{year}".to_string();
        config.scraped.first_year = 1968;
        config.scraped.last_year = 1972;
        config.cache.path = Some(cache_dir.join("dataset.json").display().to_string());
        config
    }

    fn fetcher() -> StubFetcher {
        StubFetcher::default()
            .with(TABULAR_URL, TABULAR)
            .with("https://example.org/1972", PAGE_1972)
    }

    #[test]
    fn sources_are_merged_in_key_order() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().unwrap();
        let records = ingest_all(&test_config(dir.path()), &fetcher()).unwrap();
        let keys: Vec<(u32, &str)> = records.iter().map(|r| (r.year(), r.state_fips().as_str())).collect();
        // 1968 has no page and is skipped.
        assert_eq!(keys, vec![(1972, "06"), (1972, "25"), (1976, "01"), (2000, "06")]);
        assert_eq!(records[0].winner_party(), Party::Rep);
        assert_eq!(records[1].winner_party(), Party::Dem);
        assert_eq!(records[1].winner_name(), "George McGovern");
        assert!(records.iter().all(|r| r.state_fips().as_str().len() == 2));
    }

    #[test]
    fn missing_tabular_source_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StubFetcher::default().with("https://example.org/1972", PAGE_1972);
        let res = ingest_all(&test_config(dir.path()), &fetcher);
        assert!(matches!(res, Err(IngestError::SourceUnavailable { .. })));
    }

    #[test]
    fn overlapping_years_follow_the_policy() {
        let dir = tempfile::tempdir().unwrap();
        let page_2000 = r#"<html><body><h3>Results by state</h3><table class="wikitable">
  <tr><td>California</td><td>54</td><td>53.40%</td><td>41.70%</td><td>CA</td></tr>
</table></body></html>"#;
        let fetcher = fetcher().with("https://example.org/2000", page_2000);
        let mut config = test_config(dir.path());
        config.scraped.first_year = 2000;
        config.scraped.last_year = 2000;

        let res = ingest_all(&config, &fetcher);
        assert!(matches!(res, Err(IngestError::Merging { .. })));

        config.collision_policy = CollisionPolicy::PreferTabular;
        let records = ingest_all(&config, &fetcher).unwrap();
        assert_eq!(records.len(), 2);
        assert!((records[1].dem_share().unwrap() - 0.5345).abs() < 1e-12);
    }

    #[test]
    fn empty_dataset_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StubFetcher::default().with(TABULAR_URL, "year,state_po,office\n");
        let mut config = test_config(dir.path());
        config.scraped.enabled = false;
        let res = ingest_all(&config, &fetcher);
        assert!(matches!(res, Err(IngestError::EmptyDataset {})));
    }

    #[test]
    fn cached_dataset_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let first = get_dataset(&config, &fetcher(), false).unwrap();

        // The sources are gone, the cache answers.
        let empty = StubFetcher::default();
        let second = get_dataset(&config, &empty, false).unwrap();
        assert_eq!(first, second);
        assert!(empty.requests.borrow().is_empty());

        // A refresh, or a new key, goes back to the sources.
        assert!(get_dataset(&config, &empty, true).is_err());
        let mut other_key = config.clone();
        other_key.cache.key = "elections-v2".to_string();
        assert!(get_dataset(&other_key, &empty, false).is_err());
    }

    #[test]
    fn output_is_byte_identical_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.cache.enabled = false;
        let out_a = dir.path().join("a").join("elections.json");
        let out_b = dir.path().join("elections.json");

        let a = dataset_json(&get_dataset(&config, &fetcher(), false).unwrap()).unwrap();
        write_dataset(&a, out_a.to_str().unwrap()).unwrap();
        let b = dataset_json(&get_dataset(&config, &fetcher(), false).unwrap()).unwrap();
        write_dataset(&b, out_b.to_str().unwrap()).unwrap();

        assert_eq!(fs::read(&out_a).unwrap(), fs::read(&out_b).unwrap());
        assert!(!dir.path().join("dataset.json").exists());
    }

    #[test]
    fn reference_check() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.cache.enabled = false;
        let records = ingest_all(&config, &fetcher()).unwrap();

        let reference = dir.path().join("reference.json");
        fs::write(&reference, dataset_json(&records).unwrap()).unwrap();
        assert!(check_reference(&records, reference.to_str().unwrap()).is_ok());

        let fewer = &records[1..];
        assert!(matches!(
            check_reference(fewer, reference.to_str().unwrap()),
            Err(IngestError::Whatever { .. })
        ));
    }
}

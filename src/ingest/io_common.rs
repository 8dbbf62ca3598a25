// Fetching of the raw sources, with the fallback on local copies.

use std::cell::Cell;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;

use crate::ingest::*;

/// Something that returns the body of a document given its URL.
pub trait Fetcher {
    /// The body of a successful (2xx) response.
    fn get(&self, url: &str) -> IngestResult<String>;
}

/// Blocking HTTP client, waiting `delay` between two consecutive requests.
pub struct HttpFetcher {
    client: Client,
    delay: Duration,
    last_request: Cell<Option<Instant>>,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, delay: Duration) -> IngestResult<HttpFetcher> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .context(HttpClientSnafu {})?;
        Ok(HttpFetcher {
            client,
            delay,
            last_request: Cell::new(None),
        })
    }

    fn pause(&self) {
        if let Some(last) = self.last_request.get() {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                thread::sleep(self.delay - elapsed);
            }
        }
        self.last_request.set(Some(Instant::now()));
    }
}

impl Fetcher for HttpFetcher {
    fn get(&self, url: &str) -> IngestResult<String> {
        self.pause();
        info!("Fetching {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .context(RemoteFetchSnafu { url })?;
        let status = response.status();
        ensure!(
            status.is_success(),
            RemoteStatusSnafu {
                url,
                status: status.as_u16()
            }
        );
        response.text().context(RemoteFetchSnafu { url })
    }
}

pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

pub fn read_local(path: &str) -> IngestResult<String> {
    fs::read_to_string(path).context(LocalReadSnafu { path })
}

fn read_location(fetcher: &dyn Fetcher, location: &str) -> IngestResult<String> {
    if is_remote(location) {
        fetcher.get(location)
    } else {
        read_local(location)
    }
}

/// Reads the tabular source from `url` if given, else (or when that fails)
/// from the local copy.
pub fn fetch_tabular(
    fetcher: &dyn Fetcher,
    url: Option<&str>,
    local_path: &str,
) -> IngestResult<String> {
    if let Some(url) = url {
        match read_location(fetcher, url) {
            Ok(text) => return Ok(text),
            Err(e) => warn!(
                "fetch_tabular: {} could not be read ({}), falling back on {}",
                url, e, local_path
            ),
        }
    }
    match read_local(local_path) {
        Ok(text) => {
            info!("fetch_tabular: read local copy {}", local_path);
            Ok(text)
        }
        Err(e) => {
            warn!("fetch_tabular: {}", e);
            SourceUnavailableSnafu {
                url: url.unwrap_or("(none)"),
                local: local_path,
            }
            .fail()
        }
    }
}

/// Reads the results page of one year, falling back on `<pages_dir>/<year>.html`.
pub fn fetch_rendered_page(
    fetcher: &dyn Fetcher,
    url: &str,
    year: u32,
    pages_dir: Option<&str>,
) -> IngestResult<String> {
    let remote_err = match read_location(fetcher, url) {
        Ok(text) => return Ok(text),
        Err(e) => e,
    };
    let local = pages_dir.map(|dir| Path::new(dir).join(format!("{}.html", year)));
    if let Some(path) = &local {
        let p = path.display().to_string();
        warn!(
            "fetch_rendered_page: {}: {} ({}), trying {}",
            year, url, remote_err, p
        );
        if let Ok(text) = read_local(&p) {
            return Ok(text);
        }
    }
    SourceUnavailableSnafu {
        url,
        local: local
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(no pages directory)".to_string()),
    }
    .fail()
}

/// Serves documents from memory. Unknown URLs answer 404.
#[cfg(test)]
#[derive(Default)]
pub struct StubFetcher {
    pub documents: std::collections::HashMap<String, String>,
    pub requests: std::cell::RefCell<Vec<String>>,
}

#[cfg(test)]
impl StubFetcher {
    pub fn with(mut self, url: &str, body: &str) -> StubFetcher {
        self.documents.insert(url.to_string(), body.to_string());
        self
    }
}

#[cfg(test)]
impl Fetcher for StubFetcher {
    fn get(&self, url: &str) -> IngestResult<String> {
        self.requests.borrow_mut().push(url.to_string());
        match self.documents.get(url) {
            Some(body) => Ok(body.clone()),
            None => RemoteStatusSnafu { url, status: 404u16 }.fail(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const URL: &str = "https://example.org/president.csv";

    fn temp_file(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{}", contents).unwrap();
        f
    }

    #[test]
    fn remote_is_preferred() {
        let local = temp_file("local");
        let fetcher = StubFetcher::default().with(URL, "remote");
        let text = fetch_tabular(&fetcher, Some(URL), local.path().to_str().unwrap()).unwrap();
        assert_eq!(text, "remote");
    }

    #[test]
    fn fallback_on_local_copy() {
        let local = temp_file("year,state_po\n");
        let fetcher = StubFetcher::default();
        let text = fetch_tabular(&fetcher, Some(URL), local.path().to_str().unwrap()).unwrap();
        assert_eq!(text, "year,state_po\n");
        assert_eq!(fetcher.requests.borrow().as_slice(), &[URL.to_string()]);
    }

    #[test]
    fn no_source_is_one_descriptive_error() {
        let fetcher = StubFetcher::default();
        let res = fetch_tabular(&fetcher, Some(URL), "/nonexistent/president.csv");
        match res {
            Err(IngestError::SourceUnavailable { url, local }) => {
                assert_eq!(url, URL);
                assert_eq!(local, "/nonexistent/president.csv");
            }
            x => panic!("expected SourceUnavailable, got {:?}", x),
        }
    }

    #[test]
    fn non_url_locations_are_files() {
        let remote = temp_file("from a path");
        let fetcher = StubFetcher::default();
        let text = fetch_tabular(
            &fetcher,
            Some(remote.path().to_str().unwrap()),
            "/nonexistent/president.csv",
        )
        .unwrap();
        assert_eq!(text, "from a path");
        assert!(fetcher.requests.borrow().is_empty());
    }

    #[test]
    fn pages_fall_back_on_saved_copies() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("1960.html"), "<html>1960</html>").unwrap();
        let fetcher = StubFetcher::default().with("https://example.org/1964", "<html>1964</html>");
        let pages = dir.path().to_str();

        let page = fetch_rendered_page(&fetcher, "https://example.org/1964", 1964, pages).unwrap();
        assert_eq!(page, "<html>1964</html>");
        let page = fetch_rendered_page(&fetcher, "https://example.org/1960", 1960, pages).unwrap();
        assert_eq!(page, "<html>1960</html>");
        let res = fetch_rendered_page(&fetcher, "https://example.org/1956", 1956, pages);
        assert!(matches!(res, Err(IngestError::SourceUnavailable { .. })));
        let res = fetch_rendered_page(&fetcher, "https://example.org/1956", 1956, None);
        assert!(matches!(res, Err(IngestError::SourceUnavailable { .. })));
    }

    #[test]
    fn http_fetcher_waits_between_requests() {
        let fetcher = HttpFetcher::new("test-agent", Duration::from_millis(50)).unwrap();
        let start = Instant::now();
        fetcher.pause();
        fetcher.pause();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}

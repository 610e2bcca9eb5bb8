//! Concurrent asset downloads into a mirrored directory tree

use crate::crawl::Fetcher;
use crate::error::{Error, Result};
use crate::progress::{advance_progress, finish_progress, start_progress_bar};
use serde::Serialize;
use std::collections::VecDeque;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

/// Map an asset URL to its place in the local mirror
///
/// `https://host/escudoteca/argentina/primeradivision/png/boca.png` with
/// root segment `escudoteca` maps to
/// `<output_dir>/escudoteca/argentina/primeradivision/png/boca.png`.
/// Segments are percent-decoded; decoded segments that would escape the
/// output directory are rejected.
pub fn local_path_for(output_dir: &Path, root_segment: &str, url: &Url) -> Result<PathBuf> {
    let marker = format!("/{}/", root_segment);
    let path = url.path();
    let rest = path
        .find(&marker)
        .map(|idx| &path[idx + marker.len()..])
        .ok_or_else(|| Error::OutOfScope(format!("{} is not below {}", url, marker)))?;

    if rest.is_empty() || rest.ends_with('/') {
        return Err(Error::OutOfScope(format!("{} does not name a file", url)));
    }

    let mut local = output_dir.join(root_segment);
    for raw in rest.split('/') {
        let segment = urlencoding::decode(raw)
            .map_err(|e| Error::OutOfScope(format!("{}: {}", url, e)))?;
        if segment.is_empty()
            || segment == "."
            || segment == ".."
            || segment.contains('/')
            || segment.contains('\\')
        {
            return Err(Error::OutOfScope(format!(
                "{} has an unusable path segment {:?}",
                url, raw
            )));
        }
        local.push(segment.as_ref());
    }

    Ok(local)
}

/// One asset that could not be saved
#[derive(Debug, Clone, Serialize)]
pub struct DownloadFailure {
    pub url: String,
    pub reason: String,
}

/// Outcome of a download batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct DownloadReport {
    pub attempted: usize,
    pub saved: usize,
    pub failures: Vec<DownloadFailure>,
}

impl DownloadReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Writes fetched assets under the output directory
#[derive(Clone)]
pub struct Downloader {
    fetcher: Arc<Fetcher>,
    output_dir: PathBuf,
    root_segment: String,
}

impl Downloader {
    pub fn new(fetcher: Arc<Fetcher>, output_dir: impl Into<PathBuf>, root_segment: &str) -> Self {
        Self {
            fetcher,
            output_dir: output_dir.into(),
            root_segment: root_segment.trim_matches('/').to_string(),
        }
    }

    /// Fetch one asset and write it to its local path
    pub async fn save(&self, url: &Url) -> Result<PathBuf> {
        let path = local_path_for(&self.output_dir, &self.root_segment, url)?;

        let resource = self.fetcher.fetch(url).await;
        self.fetcher.polite_pause().await;
        let resource = resource
            .ok_or_else(|| Error::Crawl(format!("unavailable after retries: {}", url)))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &resource.body).await?;

        debug!("Saved {} -> {}", url, path.display());
        Ok(path)
    }

    /// Download every URL with at most `workers` requests in flight
    ///
    /// A failed fetch or write is recorded and the batch carries on.
    pub async fn download_all(&self, urls: Vec<Url>, workers: usize, label: &str) -> DownloadReport {
        let downloader = self.clone();
        let report = run_batch(urls, workers, label, move |url: Url| {
            let downloader = downloader.clone();
            async move { downloader.save(&url).await }
        })
        .await;

        info!(
            "{}: {}/{} saved under {}",
            label,
            report.saved,
            report.attempted,
            self.output_dir.display()
        );
        report
    }
}

/// Worker pool behind [`Downloader::download_all`]
///
/// Every URL ends up either saved or in `failures`, including the one a
/// worker was handling when it panicked and any left queued after all
/// workers stopped.
async fn run_batch<F, Fut>(urls: Vec<Url>, workers: usize, label: &str, save: F) -> DownloadReport
where
    F: Fn(Url) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = Result<PathBuf>> + Send + 'static,
{
    let attempted = urls.len();
    if attempted == 0 {
        return DownloadReport::default();
    }

    let queue = Arc::new(Mutex::new(urls.into_iter().collect::<VecDeque<Url>>()));
    let saved = Arc::new(AtomicUsize::new(0));
    let failures = Arc::new(Mutex::new(Vec::new()));
    let pb = start_progress_bar(attempted, label);

    let mut handles = Vec::new();
    for _ in 0..workers.max(1).min(attempted) {
        let save = save.clone();
        let queue = queue.clone();
        let saved = saved.clone();
        let failures = failures.clone();
        let pb = pb.clone();
        let current: Arc<Mutex<Option<Url>>> = Arc::new(Mutex::new(None));
        let in_flight = current.clone();

        let handle = tokio::spawn(async move {
            loop {
                let next = queue.lock().await.pop_front();
                let Some(url) = next else {
                    break;
                };

                *in_flight.lock().await = Some(url.clone());
                let result = save(url.clone()).await;
                in_flight.lock().await.take();

                match result {
                    Ok(_) => {
                        saved.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        warn!("Failed to save {}: {}", url, e);
                        failures.lock().await.push(DownloadFailure {
                            url: url.to_string(),
                            reason: e.to_string(),
                        });
                    }
                }
                advance_progress(&pb);
            }
        });
        handles.push((handle, current));
    }

    for (handle, current) in handles {
        if let Err(e) = handle.await {
            warn!("Download worker stopped unexpectedly: {}", e);
            if let Some(url) = current.lock().await.take() {
                failures.lock().await.push(DownloadFailure {
                    url: url.to_string(),
                    reason: format!("download worker stopped: {}", e),
                });
                advance_progress(&pb);
            }
        }
    }

    // Only non-empty when every worker stopped early
    let leftover: Vec<Url> = queue.lock().await.drain(..).collect();
    for url in leftover {
        failures.lock().await.push(DownloadFailure {
            url: url.to_string(),
            reason: "no download worker left".to_string(),
        });
    }

    let saved = saved.load(Ordering::Relaxed);
    finish_progress(pb, &format!("{} saved", saved));

    let failures = std::mem::take(&mut *failures.lock().await);
    DownloadReport {
        attempted,
        saved,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::{FetchSettings, PoliteDelay};
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> Arc<Fetcher> {
        Arc::new(
            Fetcher::new(FetchSettings {
                user_agent: "crestmirror-test".to_string(),
                timeout: Duration::from_secs(5),
                max_attempts: 3,
                delay: PoliteDelay::none(),
                max_requests_per_second: 1000,
            })
            .unwrap(),
        )
    }

    #[test]
    fn test_local_path_for() {
        let url = Url::parse(
            "https://paladarnegro.net/escudoteca/argentina/primeradivision/png/boca_juniors.png",
        )
        .unwrap();
        let path = local_path_for(Path::new("out"), "escudoteca", &url).unwrap();
        assert_eq!(
            path,
            Path::new("out")
                .join("escudoteca")
                .join("argentina")
                .join("primeradivision")
                .join("png")
                .join("boca_juniors.png")
        );
    }

    #[test]
    fn test_local_path_decodes_segments() {
        let url = Url::parse("https://site/escudoteca/chile/primera/png/uni%C3%B3n%20espa%C3%B1ola.png")
            .unwrap();
        let path = local_path_for(Path::new("out"), "escudoteca", &url).unwrap();
        assert!(path.ends_with("png/unión española.png"));
    }

    #[test]
    fn test_local_path_rejects_unusable_urls() {
        let outside = Url::parse("https://site/other/a.png").unwrap();
        let dir = Url::parse("https://site/escudoteca/argentina/").unwrap();
        let sneaky = Url::parse("https://site/escudoteca/a/..%2F..%2Fetc.png").unwrap();

        assert!(local_path_for(Path::new("out"), "escudoteca", &outside).is_err());
        assert!(local_path_for(Path::new("out"), "escudoteca", &dir).is_err());
        assert!(local_path_for(Path::new("out"), "escudoteca", &sneaky).is_err());
    }

    async fn mount_png(server: &MockServer, at: &str, bytes: &[u8]) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(ResponseTemplate::new(200).set_body_raw(bytes.to_vec(), "image/png"))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_download_all_preserves_hierarchy_and_continues_on_failure() {
        let server = MockServer::start().await;
        mount_png(&server, "/escudoteca/argentina/primera/png/boca.png", &[1, 2, 3]).await;
        mount_png(&server, "/escudoteca/uruguay/primera/png/penarol.png", &[0, 255]).await;
        Mock::given(method("GET"))
            .and(path("/escudoteca/argentina/primera/png/missing.png"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let downloader = Downloader::new(fetcher(), tmp.path(), "escudoteca");
        let urls: Vec<Url> = [
            "/escudoteca/argentina/primera/png/boca.png",
            "/escudoteca/argentina/primera/png/missing.png",
            "/escudoteca/uruguay/primera/png/penarol.png",
        ]
        .iter()
        .map(|p| Url::parse(&format!("{}{}", server.uri(), p)).unwrap())
        .collect();

        let report = downloader.download_all(urls, 3, "Downloading PNG").await;

        assert_eq!(report.attempted, 3);
        assert_eq!(report.saved, 2);
        assert_eq!(report.failed(), 1);
        assert!(report.failures[0].url.ends_with("missing.png"));

        let boca = tmp.path().join("escudoteca/argentina/primera/png/boca.png");
        let penarol = tmp.path().join("escudoteca/uruguay/primera/png/penarol.png");
        assert_eq!(std::fs::read(boca).unwrap(), vec![1, 2, 3]);
        assert_eq!(std::fs::read(penarol).unwrap(), vec![0, 255]);
        assert!(!tmp
            .path()
            .join("escudoteca/argentina/primera/png/missing.png")
            .exists());
    }

    #[tokio::test]
    async fn test_download_is_idempotent() {
        let server = MockServer::start().await;
        mount_png(&server, "/escudoteca/argentina/primera/png/boca.png", b"\x89PNG crest").await;

        let tmp = TempDir::new().unwrap();
        let downloader = Downloader::new(fetcher(), tmp.path(), "escudoteca");
        let url = Url::parse(&format!(
            "{}/escudoteca/argentina/primera/png/boca.png",
            server.uri()
        ))
        .unwrap();

        let first = downloader.download_all(vec![url.clone()], 2, "first").await;
        let path = tmp.path().join("escudoteca/argentina/primera/png/boca.png");
        let before = std::fs::read(&path).unwrap();

        let second = downloader.download_all(vec![url], 2, "second").await;
        let after = std::fs::read(&path).unwrap();

        assert_eq!(first.saved, 1);
        assert_eq!(second.saved, 1);
        assert!(second.failures.is_empty());
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_panicking_worker_still_accounts_for_every_url() {
        let urls: Vec<Url> = ["a.png", "boom.png", "c.png"]
            .iter()
            .map(|name| Url::parse(&format!("https://site/escudoteca/x/png/{}", name)).unwrap())
            .collect();

        let report = run_batch(urls, 1, "Downloading PNG", |url: Url| async move {
            if url.path().ends_with("boom.png") {
                panic!("worker crashed");
            }
            Ok::<_, Error>(PathBuf::from(url.path()))
        })
        .await;

        assert_eq!(report.attempted, 3);
        assert_eq!(report.saved, 1);
        assert_eq!(report.saved + report.failed(), report.attempted);
        assert!(report.failures[0].url.ends_with("boom.png"));
        assert!(report.failures[0].reason.contains("worker stopped"));
        assert!(report.failures[1].url.ends_with("c.png"));
    }

    #[tokio::test]
    async fn test_write_failure_is_reported_per_file() {
        let server = MockServer::start().await;
        mount_png(&server, "/escudoteca/argentina/primera/png/boca.png", &[1]).await;
        mount_png(&server, "/escudoteca/uruguay/primera/png/penarol.png", &[2]).await;

        let tmp = TempDir::new().unwrap();
        // A plain file where the argentina directory would go
        std::fs::create_dir_all(tmp.path().join("escudoteca")).unwrap();
        std::fs::write(tmp.path().join("escudoteca/argentina"), b"not a dir").unwrap();

        let downloader = Downloader::new(fetcher(), tmp.path(), "escudoteca");
        let urls: Vec<Url> = [
            "/escudoteca/argentina/primera/png/boca.png",
            "/escudoteca/uruguay/primera/png/penarol.png",
        ]
        .iter()
        .map(|p| Url::parse(&format!("{}{}", server.uri(), p)).unwrap())
        .collect();

        let report = downloader.download_all(urls, 1, "Downloading PNG").await;

        assert_eq!(report.saved, 1);
        assert_eq!(report.failed(), 1);
        assert!(report.failures[0].url.ends_with("boca.png"));
        assert!(tmp
            .path()
            .join("escudoteca/uruguay/primera/png/penarol.png")
            .exists());
    }
}

//! In-memory catalog for discovery and orchestrator tests

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use catalog::{PageFuture, PageResult, PageSource};

/// How a key answers page requests.
#[derive(Debug, Clone)]
pub enum Behaviour {
    /// Pages `1..=len` return the titles, later pages 404.
    Pages(Vec<Vec<String>>),
    /// Every page returns one record, forever.
    Endless,
    /// Token acquisition fails before any request is made.
    TokenError,
    /// The catalog answers 401 for every page.
    TokenRejected,
    /// The catalog answers 500 for every page.
    ServerError,
}

#[derive(Default)]
pub struct MockCatalog {
    keys: HashMap<u32, Behaviour>,
    /// (key, page) pairs that succeed on the first request and answer with the
    /// stored result afterwards
    flaky: HashMap<(u32, u32), PageResult>,
    delay: Option<Duration>,
    hits: Mutex<HashMap<(u32, u32), usize>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pages with the given record counts and generated titles.
    pub fn with_page_sizes(self, key: u32, sizes: &[usize]) -> Self {
        let pages = sizes
            .iter()
            .enumerate()
            .map(|(p, &n)| (0..n).map(|i| format!("Movie {key}-{}-{i}", p + 1)).collect())
            .collect();
        self.with_behaviour(key, Behaviour::Pages(pages))
    }

    pub fn with_titles(self, key: u32, pages: Vec<Vec<&str>>) -> Self {
        let pages = pages
            .into_iter()
            .map(|page| page.into_iter().map(String::from).collect())
            .collect();
        self.with_behaviour(key, Behaviour::Pages(pages))
    }

    pub fn with_behaviour(mut self, key: u32, behaviour: Behaviour) -> Self {
        self.keys.insert(key, behaviour);
        self
    }

    /// Page answers 503 once it has been fetched before.
    pub fn with_flaky_page(self, key: u32, page: u32) -> Self {
        self.with_refetch_answer(
            key,
            page,
            PageResult::Failed {
                status: Some(503),
                detail: "flaky page".into(),
            },
        )
    }

    /// Page refuses the token once it has been fetched before.
    pub fn with_token_refused_on_refetch(self, key: u32, page: u32) -> Self {
        self.with_refetch_answer(key, page, PageResult::AuthFailed("invalid token".into()))
    }

    fn with_refetch_answer(mut self, key: u32, page: u32, answer: PageResult) -> Self {
        self.flaky.insert((key, page), answer);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn answer(&self, key: u32, page: u32) -> catalog_auth::Result<PageResult> {
        let hit = {
            let mut hits = self.hits.lock().unwrap();
            let count = hits.entry((key, page)).or_insert(0);
            *count += 1;
            *count
        };
        if hit > 1
            && let Some(answer) = self.flaky.get(&(key, page))
        {
            return Ok(answer.clone());
        }

        match self.keys.get(&key) {
            None => Ok(PageResult::NotFound("unknown key".into())),
            Some(Behaviour::Pages(pages)) => Ok(page
                .checked_sub(1)
                .and_then(|i| pages.get(i as usize))
                .map(|records| PageResult::Records(records.clone()))
                .unwrap_or_else(|| PageResult::NotFound("page not found".into()))),
            Some(Behaviour::Endless) => Ok(PageResult::Records(vec![format!("Movie {page}")])),
            Some(Behaviour::TokenError) => {
                Err(catalog_auth::Error::Auth("invalid credentials".into()))
            }
            Some(Behaviour::TokenRejected) => Ok(PageResult::AuthFailed("invalid token".into())),
            Some(Behaviour::ServerError) => Ok(PageResult::Failed {
                status: Some(500),
                detail: "database unavailable".into(),
            }),
        }
    }
}

impl PageSource<u32> for MockCatalog {
    fn fetch_page<'a>(&'a self, key: &'a u32, page: u32) -> PageFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let result = self.answer(*key, page);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        })
    }
}

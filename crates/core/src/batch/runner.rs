//! Batch orchestration: movie list resolution, concurrent acquisition,
//! collection population, channel programming and cleanup.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use futures::{stream, StreamExt};
use tracing::{debug, info, warn};

use crate::catalog::{CatalogError, CatalogService, PersonMatch};
use crate::channel::{ChannelService, ProgramEntry};
use crate::debrid::{ActivationPipeline, DebridClient};
use crate::library::LibraryService;
use crate::search::SearchAggregator;

use super::types::{BatchReport, CleanupReport, MovieOutcome, MovieTask};

const DEFAULT_WORKERS: usize = 10;
const DEFAULT_ACTIVE_LIMIT: u32 = 100;

/// Drives a batch run end to end.
///
/// One movie is one unit of work: check the library, search every site,
/// activate the ranked candidates. Units run concurrently under a bounded
/// worker pool and never abort each other.
pub struct BatchRunner {
    catalog: Arc<dyn CatalogService>,
    library: Arc<dyn LibraryService>,
    channel: Arc<dyn ChannelService>,
    debrid: Arc<dyn DebridClient>,
    aggregator: Arc<SearchAggregator>,
    pipeline: Arc<ActivationPipeline>,
    workers: usize,
    active_limit: u32,
}

impl BatchRunner {
    pub fn new(
        catalog: Arc<dyn CatalogService>,
        library: Arc<dyn LibraryService>,
        channel: Arc<dyn ChannelService>,
        debrid: Arc<dyn DebridClient>,
        aggregator: Arc<SearchAggregator>,
        pipeline: Arc<ActivationPipeline>,
    ) -> Self {
        Self {
            catalog,
            library,
            channel,
            debrid,
            aggregator,
            pipeline,
            workers: DEFAULT_WORKERS,
            active_limit: DEFAULT_ACTIVE_LIMIT,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_active_limit(mut self, limit: u32) -> Self {
        self.active_limit = limit;
        self
    }

    /// Movies tagged with a keyword, most popular first, paging until
    /// `limit` tasks are collected or the listing runs out.
    pub async fn movies_for_keyword(
        &self,
        keyword_id: u32,
        limit: usize,
    ) -> Result<Vec<MovieTask>, CatalogError> {
        let mut tasks = Vec::new();
        let mut page = 1;
        loop {
            let listing = self.catalog.movies_by_keyword(keyword_id, page).await?;
            for movie in listing.movies {
                tasks.push(MovieTask::from(movie));
                if tasks.len() >= limit {
                    return Ok(tasks);
                }
            }
            if page >= listing.total_pages {
                return Ok(tasks);
            }
            page += 1;
        }
    }

    /// The match with the most movie credits. Name searches return plenty
    /// of same-named people; the prolific one is almost always the one
    /// meant. Ties keep the earlier (more popular) match.
    pub async fn most_prolific_person(
        &self,
        matches: &[PersonMatch],
    ) -> Result<Option<PersonMatch>, CatalogError> {
        let mut best: Option<(PersonMatch, usize)> = None;
        for person in matches {
            let count = self.catalog.person_movie_credits(person.id).await?.len();
            debug!("Person '{}' ({}) has {} movie credits", person.name, person.id, count);
            if best.as_ref().map_or(true, |(_, top)| count > *top) {
                best = Some((person.clone(), count));
            }
        }
        Ok(best.map(|(person, _)| person))
    }

    /// Movies a person acted in, most popular first.
    pub async fn movies_for_person(
        &self,
        person_id: u32,
        limit: usize,
    ) -> Result<Vec<MovieTask>, CatalogError> {
        let credits = self.catalog.person_movie_credits(person_id).await?;
        Ok(credits.into_iter().take(limit).map(MovieTask::from).collect())
    }

    /// Acquire every task, `workers` movies at a time.
    pub async fn acquire_movies(&self, tasks: &[MovieTask]) -> BatchReport {
        info!(
            "Starting acquisition of {} movies ({} workers)",
            tasks.len(),
            self.workers
        );

        let outcomes: Vec<(String, MovieOutcome)> = stream::iter(tasks.iter().map(|task| async {
            let outcome = self.acquire_one(task).await;
            (task.title.clone(), outcome)
        }))
        .buffer_unordered(self.workers)
        .collect()
        .await;

        let mut report = BatchReport::default();
        for (title, outcome) in outcomes {
            report.record(&title, outcome);
        }
        info!(
            "Acquisition done: {} attempted, {} on service, {} already owned, {} without candidates, {} failed",
            report.attempted,
            report.succeeded(),
            report.skipped_existing,
            report.no_candidates + report.exhausted,
            report.failed.len()
        );
        report
    }

    async fn acquire_one(&self, task: &MovieTask) -> MovieOutcome {
        match self.library.find_item_by_title(&task.title).await {
            Ok(Some(item)) => {
                debug!("'{}' already in library as {}", task.title, item.id);
                return MovieOutcome::SkippedExisting;
            }
            Ok(None) => {}
            // An unreachable library should not stop acquisition; worst
            // case the debrid dedup catches the repeat.
            Err(e) => warn!("Library lookup failed for '{}': {}", task.title, e),
        }

        let result = self.aggregator.search_all(&task.search_query()).await;
        if result.candidates.is_empty() {
            debug!("No acceptable candidates for '{}'", task.title);
            return MovieOutcome::NoCandidates;
        }

        match self.pipeline.activate(&result.candidates).await {
            Ok(r) if r.already_active => MovieOutcome::AlreadyActive,
            Ok(r) if r.success => MovieOutcome::Activated,
            Ok(_) => MovieOutcome::Exhausted,
            Err(e) => MovieOutcome::Failed(e.to_string()),
        }
    }

    /// Gather every task that made it into the library under one
    /// collection. Returns the number of items newly added.
    pub async fn populate_collection(
        &self,
        name: &str,
        tasks: &[MovieTask],
    ) -> anyhow::Result<usize> {
        let collection_id = self
            .library
            .create_collection(name)
            .await
            .with_context(|| format!("creating collection '{}'", name))?;
        let present: HashSet<String> = self
            .library
            .collection_items(&collection_id)
            .await?
            .into_iter()
            .map(|i| i.id)
            .collect();

        let mut added = 0;
        for task in tasks {
            let item = match self.library.find_item_by_title(&task.title).await {
                Ok(Some(item)) => item,
                Ok(None) => {
                    debug!("'{}' not in library yet, skipping collection add", task.title);
                    continue;
                }
                Err(e) => {
                    warn!("Library lookup failed for '{}': {}", task.title, e);
                    continue;
                }
            };
            if present.contains(&item.id) {
                continue;
            }
            self.library
                .add_to_collection(&collection_id, &item.id)
                .await
                .with_context(|| format!("adding '{}' to collection '{}'", task.title, name))?;
            added += 1;
        }
        info!("Collection '{}': {} items added", name, added);
        Ok(added)
    }

    /// Program every owned task onto the named channel, skipping titles
    /// already in its lineup. Returns the number of programs appended.
    ///
    /// Channel numbers are compacted first so the new channel slots in
    /// right after the existing ones.
    pub async fn program_channel(
        &self,
        channel_name: &str,
        group: &str,
        tasks: &[MovieTask],
    ) -> anyhow::Result<usize> {
        let renumbered = self
            .channel
            .normalize_channel_numbers()
            .await
            .context("normalizing channel numbers")?;
        if renumbered > 0 {
            info!("Renumbered {} channels", renumbered);
        }

        let channel = self
            .channel
            .create_channel(channel_name, group)
            .await
            .with_context(|| format!("creating channel '{}'", channel_name))?;
        let programmed: HashSet<String> = self
            .channel
            .list_program_titles(&channel.id)
            .await?
            .into_iter()
            .map(|t| t.to_lowercase())
            .collect();

        let mut appended = 0;
        for task in tasks {
            if programmed.contains(&task.title.to_lowercase()) {
                debug!("'{}' already programmed on '{}'", task.title, channel.name);
                continue;
            }
            let item = match self.library.find_item_by_title(&task.title).await {
                Ok(Some(item)) => item,
                Ok(None) => {
                    debug!("'{}' not in library, cannot program", task.title);
                    continue;
                }
                Err(e) => {
                    warn!("Library lookup failed for '{}': {}", task.title, e);
                    continue;
                }
            };
            let details = match self.catalog.movie_details(task.catalog_id).await {
                Ok(details) => details,
                Err(e) => {
                    warn!("No catalog details for '{}': {}", task.title, e);
                    continue;
                }
            };
            let entry = match ProgramEntry::from_details(&details, &item.id) {
                Some(entry) => entry,
                None => {
                    debug!("'{}' has no runtime, cannot schedule", task.title);
                    continue;
                }
            };
            self.channel
                .append_program(&channel, &entry)
                .await
                .with_context(|| format!("programming '{}'", task.title))?;
            appended += 1;
        }
        info!("Channel '{}': {} programs appended", channel_name, appended);
        Ok(appended)
    }

    /// Kick off a library scan so freshly fetched media gets indexed.
    pub async fn refresh_library(&self) -> anyhow::Result<()> {
        self.library
            .trigger_library_scan()
            .await
            .context("triggering library scan")?;
        Ok(())
    }

    /// Remove duplicate library items and duplicate active torrents.
    ///
    /// Duplicates are removals, so individual failures are logged and
    /// skipped rather than aborting the pass.
    pub async fn cleanup(&self) -> anyhow::Result<CleanupReport> {
        let mut report = CleanupReport::default();

        for item in self
            .library
            .find_duplicate_items()
            .await
            .context("listing duplicate library items")?
        {
            match self.library.delete_item(&item.id).await {
                Ok(()) => {
                    info!("Removed duplicate library item '{}' ({})", item.name, item.id);
                    report.library_items_removed += 1;
                }
                Err(e) => warn!("Failed to delete library item {}: {}", item.id, e),
            }
        }

        let active = self
            .debrid
            .list_active(self.active_limit)
            .await
            .context("listing active torrents")?;
        let mut seen: HashSet<String> = HashSet::new();
        for torrent in active {
            if torrent.hash.is_empty() || seen.insert(torrent.hash.clone()) {
                continue;
            }
            match self.debrid.remove(&torrent.id).await {
                Ok(()) => {
                    info!(
                        "Removed duplicate torrent '{}' ({})",
                        torrent.name, torrent.id
                    );
                    report.torrents_removed += 1;
                }
                Err(e) => warn!("Failed to remove torrent {}: {}", torrent.id, e),
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MovieDetails, MovieSummary};
    use crate::channel::Channel;
    use crate::debrid::DebridError;
    use crate::search::types::SiteAdapter;
    use crate::testing::{
        active_torrent, search_candidate, MockCatalogService, MockChannelService,
        MockDebridClient, MockLibraryService, MockSiteAdapter,
    };

    const HASH_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const HASH_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    const HASH_C: &str = "cccccccccccccccccccccccccccccccccccccccc";

    struct Fixture {
        catalog: Arc<MockCatalogService>,
        library: Arc<MockLibraryService>,
        channel: Arc<MockChannelService>,
        debrid: Arc<MockDebridClient>,
        site: Arc<MockSiteAdapter>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                catalog: Arc::new(MockCatalogService::new()),
                library: Arc::new(MockLibraryService::new()),
                channel: Arc::new(MockChannelService::new()),
                debrid: Arc::new(MockDebridClient::new()),
                site: Arc::new(MockSiteAdapter::new("mock-site")),
            }
        }

        fn runner(&self) -> BatchRunner {
            let aggregator = Arc::new(SearchAggregator::new(vec![
                Arc::clone(&self.site) as Arc<dyn SiteAdapter>
            ]));
            let pipeline = Arc::new(ActivationPipeline::new(
                Arc::clone(&self.debrid) as Arc<dyn DebridClient>
            ));
            BatchRunner::new(
                Arc::clone(&self.catalog) as Arc<dyn CatalogService>,
                Arc::clone(&self.library) as Arc<dyn LibraryService>,
                Arc::clone(&self.channel) as Arc<dyn ChannelService>,
                Arc::clone(&self.debrid) as Arc<dyn DebridClient>,
                aggregator,
                pipeline,
            )
        }
    }

    fn task(id: u32, title: &str) -> MovieTask {
        MovieTask {
            catalog_id: id,
            title: title.to_string(),
            year: Some(1999),
        }
    }

    fn summary(id: u32, title: &str) -> MovieSummary {
        MovieSummary {
            id,
            title: title.to_string(),
            release_date: Some("1999-03-30".to_string()),
            popularity: 50.0,
        }
    }

    #[tokio::test]
    async fn test_acquire_skips_owned_movies() {
        let fx = Fixture::new();
        fx.library.add_item("jf-1", "The Matrix").await;

        let report = fx.runner().acquire_movies(&[task(603, "The Matrix")]).await;

        assert_eq!(report.skipped_existing, 1);
        assert_eq!(report.succeeded(), 0);
        // Owned movies are never searched.
        assert_eq!(fx.site.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_acquire_activates_candidates() {
        let fx = Fixture::new();
        fx.site
            .set_results(vec![search_candidate("Heat.1995.1080p", 80, HASH_A, "mock-site")])
            .await;

        let report = fx.runner().acquire_movies(&[task(949, "Heat")]).await;

        assert_eq!(report.activated, 1);
        assert_eq!(fx.debrid.submit_calls().await.len(), 1);
    }

    #[tokio::test]
    async fn test_acquire_searches_title_with_release_year() {
        let fx = Fixture::new();

        fx.runner()
            .acquire_movies(&[MovieTask {
                catalog_id: 949,
                title: "Heat".to_string(),
                year: Some(1995),
            }])
            .await;

        assert_eq!(fx.site.recorded_queries().await, vec!["Heat 1995"]);
    }

    #[tokio::test]
    async fn test_most_prolific_person_wins_by_credit_count() {
        let fx = Fixture::new();
        let catalog = MockCatalogService::new()
            .with_credits(10, vec![summary(1, "One")])
            .with_credits(
                20,
                vec![summary(2, "Two"), summary(3, "Three"), summary(4, "Four")],
            );
        let fx = Fixture {
            catalog: Arc::new(catalog),
            ..fx
        };
        let matches = vec![
            PersonMatch {
                id: 10,
                name: "Nicolas Cage".to_string(),
                popularity: 90.0,
            },
            PersonMatch {
                id: 20,
                name: "Nicolas Cage".to_string(),
                popularity: 10.0,
            },
        ];

        let chosen = fx
            .runner()
            .most_prolific_person(&matches)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(chosen.id, 20);
    }

    #[tokio::test]
    async fn test_acquire_isolates_failures() {
        let fx = Fixture::new();
        fx.site
            .set_results(vec![search_candidate("Heat.1995.1080p", 80, HASH_A, "mock-site")])
            .await;
        // The first movie's submission is rejected outright; the second
        // must still be processed.
        fx.debrid
            .queue_submit(Err(DebridError::ApiError {
                status: 400,
                message: "bad magnet".to_string(),
            }))
            .await;

        let report = fx
            .runner()
            .with_workers(1)
            .acquire_movies(&[task(949, "Heat"), task(603, "The Matrix")])
            .await;

        assert_eq!(report.attempted, 2);
        assert_eq!(report.exhausted, 1);
        assert_eq!(report.activated, 1);
    }

    #[tokio::test]
    async fn test_acquire_reports_no_candidates() {
        let fx = Fixture::new();

        let report = fx.runner().acquire_movies(&[task(1, "Obscurity")]).await;

        assert_eq!(report.no_candidates, 1);
        assert!(fx.debrid.submit_calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_movies_for_keyword_pages_until_limit() {
        let fx = Fixture::new();
        let catalog = MockCatalogService::new().with_pages(vec![
            vec![summary(1, "One"), summary(2, "Two")],
            vec![summary(3, "Three"), summary(4, "Four")],
        ]);
        let fx = Fixture {
            catalog: Arc::new(catalog),
            ..fx
        };

        let tasks = fx.runner().movies_for_keyword(99, 3).await.unwrap();
        let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["One", "Two", "Three"]);
    }

    #[tokio::test]
    async fn test_movies_for_keyword_stops_at_last_page() {
        let fx = Fixture::new();
        let catalog = MockCatalogService::new().with_pages(vec![vec![summary(1, "Only")]]);
        let fx = Fixture {
            catalog: Arc::new(catalog),
            ..fx
        };

        let tasks = fx.runner().movies_for_keyword(99, 10).await.unwrap();
        assert_eq!(tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_populate_collection_adds_owned_only() {
        let fx = Fixture::new();
        fx.library.add_item("jf-1", "Heat").await;

        let added = fx
            .runner()
            .populate_collection("Crime", &[task(949, "Heat"), task(603, "The Matrix")])
            .await
            .unwrap();

        assert_eq!(added, 1);
        assert_eq!(fx.library.collection_member_ids("Crime").await, vec!["jf-1"]);
    }

    #[tokio::test]
    async fn test_populate_collection_is_idempotent() {
        let fx = Fixture::new();
        fx.library.add_item("jf-1", "Heat").await;

        let runner = fx.runner();
        assert_eq!(runner.populate_collection("Crime", &[task(949, "Heat")]).await.unwrap(), 1);
        assert_eq!(runner.populate_collection("Crime", &[task(949, "Heat")]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_program_channel_skips_programmed_and_unowned() {
        let fx = Fixture::new();
        fx.library.add_item("jf-1", "Heat").await;
        fx.library.add_item("jf-2", "The Matrix").await;
        fx.catalog
            .set_details(MovieDetails {
                id: 603,
                title: "The Matrix".to_string(),
                release_date: Some("1999-03-30".to_string()),
                runtime_minutes: Some(136),
                overview: None,
                certification: Some("R".to_string()),
                imdb_id: None,
            })
            .await;
        fx.catalog
            .set_details(MovieDetails {
                id: 949,
                title: "Heat".to_string(),
                release_date: Some("1995-12-15".to_string()),
                runtime_minutes: Some(170),
                overview: None,
                certification: Some("R".to_string()),
                imdb_id: None,
            })
            .await;

        let runner = fx.runner();
        // First pass programs both owned movies; the unowned third is
        // skipped silently.
        let appended = runner
            .program_channel(
                "24/7 CRIME",
                "Movies",
                &[task(949, "Heat"), task(603, "The Matrix"), task(1, "Unowned")],
            )
            .await
            .unwrap();
        assert_eq!(appended, 2);

        // Second pass appends nothing.
        let appended = runner
            .program_channel("24/7 CRIME", "Movies", &[task(949, "Heat")])
            .await
            .unwrap();
        assert_eq!(appended, 0);

        let channels = fx.channel.list_channels().await.unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(fx.channel.programs_for(&channels[0].id).await.len(), 2);
    }

    #[tokio::test]
    async fn test_program_channel_requires_runtime() {
        let fx = Fixture::new();
        fx.library.add_item("jf-1", "Heat").await;
        fx.catalog
            .set_details(MovieDetails {
                id: 949,
                title: "Heat".to_string(),
                release_date: None,
                runtime_minutes: None,
                overview: None,
                certification: None,
                imdb_id: None,
            })
            .await;

        let appended = fx
            .runner()
            .program_channel("24/7 CRIME", "Movies", &[task(949, "Heat")])
            .await
            .unwrap();
        assert_eq!(appended, 0);
    }

    #[tokio::test]
    async fn test_program_channel_normalizes_numbering_and_group() {
        let fx = Fixture::new();
        let channel = Arc::new(
            MockChannelService::new().with_channels(vec![
                Channel {
                    id: "ch-a".to_string(),
                    name: "24/7 DRAMA".to_string(),
                    number: 3,
                },
                Channel {
                    id: "ch-b".to_string(),
                    name: "24/7 ACTION".to_string(),
                    number: 7,
                },
            ]),
        );
        let fx = Fixture {
            channel: Arc::clone(&channel),
            ..fx
        };

        fx.runner()
            .program_channel("24/7 CRIME", "Filmography", &[])
            .await
            .unwrap();

        // Existing channels compact to 1..n and the new one takes the
        // next slot, under the requested guide group.
        let mut numbers: Vec<(String, u32)> = channel
            .list_channels()
            .await
            .unwrap()
            .into_iter()
            .map(|c| (c.name, c.number))
            .collect();
        numbers.sort_by_key(|(_, n)| *n);
        assert_eq!(
            numbers,
            vec![
                ("24/7 DRAMA".to_string(), 1),
                ("24/7 ACTION".to_string(), 2),
                ("24/7 CRIME".to_string(), 3),
            ]
        );
        assert_eq!(
            channel.group_for("24/7 CRIME").await.as_deref(),
            Some("Filmography")
        );
    }

    #[tokio::test]
    async fn test_cleanup_removes_duplicates() {
        let fx = Fixture::new();
        fx.library.add_item("jf-1", "Heat").await;
        fx.library.add_item("jf-2", "heat").await;
        fx.debrid
            .set_active(vec![
                active_torrent("rd-1", "Heat.1080p", HASH_A),
                active_torrent("rd-2", "Heat.1080p.BluRay", HASH_A),
                active_torrent("rd-3", "Matrix.1080p", HASH_B),
                active_torrent("rd-4", "Other.1080p", HASH_C),
            ])
            .await;

        let report = fx.runner().cleanup().await.unwrap();

        assert_eq!(report.library_items_removed, 1);
        assert_eq!(fx.library.deleted_items().await, vec!["jf-2"]);
        assert_eq!(report.torrents_removed, 1);
        assert_eq!(fx.debrid.remove_calls().await, vec!["rd-2"]);
    }
}

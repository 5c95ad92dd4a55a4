//! Navigation state for one browsing session.
//!
//! A [`Session`] owns everything the client shows: the cached catalog, the
//! screen history, the search in flight, the detail tab, the landing picks and
//! the error banner. Time is passed in explicitly so banner expiry can be
//! driven from tests.

use std::sync::Arc;
use std::time::{Duration, Instant};

use pokedex_catalog::{Catalog, Record};
use rand::Rng;
use thiserror::Error;

use crate::error::ClientError;
use crate::service::QueryService;

/// How long a failure banner stays up before the session falls back to landing.
pub const ERROR_BANNER_TTL: Duration = Duration::from_secs(3);

/// Number of random picks on the landing screen.
pub const LANDING_PICKS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Landing,
    SearchResults,
    Detail { id: u32 },
}

impl Screen {
    pub fn detail_id(&self) -> Option<u32> {
        match self {
            Screen::Detail { id } => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DetailTab {
    #[default]
    General,
    MoreInfo,
}

impl DetailTab {
    pub const ORDER: [DetailTab; 2] = [DetailTab::General, DetailTab::MoreInfo];

    pub fn next(self) -> Self {
        let pos = Self::ORDER.iter().position(|t| *t == self).unwrap_or(0);
        Self::ORDER[(pos + 1) % Self::ORDER.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            DetailTab::General => "General",
            DetailTab::MoreInfo => "More Info",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace([' ', '_'], "-").as_str() {
            "general" => Some(DetailTab::General),
            "more-info" | "moreinfo" | "info" => Some(DetailTab::MoreInfo),
            _ => None,
        }
    }
}

/// Issued per search submission; only the latest one may apply its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SearchTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Applied,
    /// A newer search was submitted; this response was discarded.
    Stale,
}

#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<Record>,
    pub pending: Option<SearchTicket>,
    /// The latest search errored; `results` is empty but not a real miss.
    pub failed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBanner {
    pub message: String,
    pub raised_at: Instant,
}

impl ErrorBanner {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.raised_at) >= ERROR_BANNER_TTL
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavError {
    #[error("this action needs the {expected} screen")]
    WrongScreen { expected: &'static str },
    #[error("no entry {index} (there are {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("#{0} is not part of this evolution chain")]
    NotInChain(u32),
    #[error("the catalog is empty")]
    EmptyCatalog,
}

#[derive(Debug, Clone)]
pub struct Session {
    catalog: Arc<Catalog>,
    /// Top is the current screen; never empty.
    history: Vec<Screen>,
    tab: DetailTab,
    search: SearchState,
    last_ticket: u64,
    landing_picks: Vec<u32>,
    banner: Option<ErrorBanner>,
}

impl Session {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            history: vec![Screen::Landing],
            tab: DetailTab::General,
            search: SearchState::default(),
            last_ticket: 0,
            landing_picks: Vec::new(),
            banner: None,
        }
    }

    /// Fetch the full dataset once and start on the landing screen.
    pub fn bootstrap(service: &dyn QueryService) -> Result<Self, ClientError> {
        let records = service.list_all()?;
        let catalog = Catalog::from_records(records)?;
        tracing::debug!(records = catalog.len(), "session cache loaded");
        Ok(Self::new(Arc::new(catalog)))
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn screen(&self) -> Screen {
        self.history.last().copied().unwrap_or(Screen::Landing)
    }

    pub fn history(&self) -> &[Screen] {
        &self.history
    }

    pub fn tab(&self) -> DetailTab {
        self.tab
    }

    pub fn search_state(&self) -> &SearchState {
        &self.search
    }

    pub fn landing_picks(&self) -> &[u32] {
        &self.landing_picks
    }

    pub fn banner(&self) -> Option<&ErrorBanner> {
        self.banner.as_ref()
    }

    pub fn set_landing_picks(&mut self, ids: Vec<u32>) {
        self.landing_picks = ids;
    }

    pub fn refresh_landing_picks<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.landing_picks = self
            .catalog
            .random_sample(LANDING_PICKS, rng)
            .into_iter()
            .map(|r| r.id)
            .collect();
    }

    /// Start a search. An empty (trimmed) query changes nothing.
    ///
    /// History holds at most one results screen, showing the latest search:
    /// a new search replaces the top when already on results and otherwise
    /// drops the older results entry before pushing.
    pub fn submit_search(&mut self, query: &str) -> Option<SearchTicket> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        self.last_ticket += 1;
        let ticket = SearchTicket(self.last_ticket);
        self.search = SearchState {
            query: query.to_string(),
            results: Vec::new(),
            pending: Some(ticket),
            failed: false,
        };

        if self.screen() == Screen::SearchResults {
            self.replace_top(Screen::SearchResults);
        } else {
            self.history.retain(|screen| *screen != Screen::SearchResults);
            self.history.push(Screen::SearchResults);
        }
        Some(ticket)
    }

    /// Apply a search response if it belongs to the latest submission.
    ///
    /// A failed latest search raises the error banner.
    pub fn complete_search(
        &mut self,
        ticket: SearchTicket,
        response: Result<Vec<Record>, ClientError>,
        now: Instant,
    ) -> SearchOutcome {
        if ticket != SearchTicket(self.last_ticket) {
            tracing::debug!(?ticket, latest = self.last_ticket, "discarding stale search response");
            return SearchOutcome::Stale;
        }

        self.search.pending = None;
        match response {
            Ok(results) => self.search.results = results,
            Err(err) => {
                self.search.failed = true;
                self.raise_error(format!("search failed: {err}"), now);
            }
        }
        SearchOutcome::Applied
    }

    /// Submit and complete a search synchronously against `service`.
    pub fn run_search(
        &mut self,
        service: &dyn QueryService,
        query: &str,
        now: Instant,
    ) -> Option<SearchOutcome> {
        let ticket = self.submit_search(query)?;
        let response = service.search(&self.search.query);
        Some(self.complete_search(ticket, response, now))
    }

    pub fn select_result(&mut self, index: usize) -> Result<u32, NavError> {
        self.expect_screen(Screen::SearchResults, "search results")?;
        let id = self
            .search
            .results
            .get(index)
            .map(|r| r.id)
            .ok_or(NavError::IndexOutOfRange {
                index,
                len: self.search.results.len(),
            })?;
        self.push_detail(id);
        Ok(id)
    }

    pub fn select_random(&mut self, index: usize) -> Result<u32, NavError> {
        self.expect_screen(Screen::Landing, "landing")?;
        let id = *self
            .landing_picks
            .get(index)
            .ok_or(NavError::IndexOutOfRange {
                index,
                len: self.landing_picks.len(),
            })?;
        self.push_detail(id);
        Ok(id)
    }

    /// Open a detail screen directly, from anywhere.
    pub fn open(&mut self, id: u32) {
        self.push_detail(id);
    }

    pub fn select_chain_member(&mut self, id: u32) -> Result<(), NavError> {
        let current = self.current_detail()?;
        if !self.catalog.evolution_chain(current).contains(id) {
            return Err(NavError::NotInChain(id));
        }
        self.push_detail(id);
        Ok(())
    }

    /// Step to the next id in ascending order, wrapping. Replaces the current
    /// detail screen.
    pub fn next(&mut self) -> Result<u32, NavError> {
        let current = self.current_detail()?;
        let id = self
            .catalog
            .successor_id(current)
            .ok_or(NavError::EmptyCatalog)?;
        self.replace_detail(id);
        Ok(id)
    }

    pub fn previous(&mut self) -> Result<u32, NavError> {
        let current = self.current_detail()?;
        let id = self
            .catalog
            .predecessor_id(current)
            .ok_or(NavError::EmptyCatalog)?;
        self.replace_detail(id);
        Ok(id)
    }

    pub fn cycle_tab(&mut self) -> Result<DetailTab, NavError> {
        self.current_detail()?;
        self.tab = self.tab.next();
        Ok(self.tab)
    }

    pub fn set_tab(&mut self, tab: DetailTab) {
        self.tab = tab;
    }

    /// Back to landing with a fresh history. Landing picks are cleared so the
    /// caller can draw new ones.
    pub fn home(&mut self) {
        self.history.clear();
        self.history.push(Screen::Landing);
        self.landing_picks.clear();
        self.tab = DetailTab::General;
    }

    pub fn back(&mut self) {
        self.history.pop();
        if self.history.is_empty() {
            self.home();
            return;
        }
        self.tab = DetailTab::General;
    }

    pub fn raise_error(&mut self, message: impl Into<String>, now: Instant) {
        let message = message.into();
        tracing::warn!(%message, "showing error banner");
        self.banner = Some(ErrorBanner {
            message,
            raised_at: now,
        });
    }

    /// Expire the banner once its time is up and return to landing.
    /// Returns whether that happened.
    pub fn tick(&mut self, now: Instant) -> bool {
        match &self.banner {
            Some(banner) if banner.is_expired(now) => {
                self.banner = None;
                self.home();
                true
            }
            _ => false,
        }
    }

    fn current_detail(&self) -> Result<u32, NavError> {
        self.screen()
            .detail_id()
            .ok_or(NavError::WrongScreen { expected: "detail" })
    }

    fn expect_screen(&self, screen: Screen, expected: &'static str) -> Result<(), NavError> {
        if self.screen() == screen {
            Ok(())
        } else {
            Err(NavError::WrongScreen { expected })
        }
    }

    fn push_detail(&mut self, id: u32) {
        self.history.push(Screen::Detail { id });
        self.tab = DetailTab::General;
    }

    fn replace_detail(&mut self, id: u32) {
        self.replace_top(Screen::Detail { id });
        self.tab = DetailTab::General;
    }

    fn replace_top(&mut self, screen: Screen) {
        match self.history.last_mut() {
            Some(top) => *top = screen,
            None => self.history.push(screen),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pokedex_catalog::load::catalog_from_json_str;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn session() -> Session {
        let (catalog, _) = catalog_from_json_str(
            r#"[
                {"id": 1, "name": "bulbasaur", "primary_type": "grass", "next_evolution_id": "2"},
                {"id": 2, "name": "ivysaur", "primary_type": "grass", "previous_evolution_id": 1, "next_evolution_id": "3"},
                {"id": 3, "name": "venusaur", "primary_type": "grass", "previous_evolution_id": 2},
                {"id": 25, "name": "pikachu", "primary_type": "electric"},
                {"id": 384, "name": "rayquaza", "primary_type": "dragon", "secondary_type": "flying"}
            ]"#,
        )
        .unwrap();
        Session::new(Arc::new(catalog))
    }

    fn records(s: &Session, ids: &[u32]) -> Vec<Record> {
        ids.iter()
            .map(|id| s.catalog().get(*id).unwrap().clone())
            .collect()
    }

    #[test]
    fn starts_on_landing() {
        let s = session();
        assert_eq!(s.screen(), Screen::Landing);
        assert_eq!(s.history(), &[Screen::Landing]);
    }

    #[test]
    fn empty_search_does_not_transition() {
        let mut s = session();
        assert_eq!(s.submit_search("   "), None);
        assert_eq!(s.screen(), Screen::Landing);
    }

    #[test]
    fn search_then_select_opens_detail() {
        let mut s = session();
        let t = s.submit_search("saur").unwrap();
        let found = records(&s, &[1, 2, 3]);
        assert_eq!(s.complete_search(t, Ok(found), Instant::now()), SearchOutcome::Applied);
        assert_eq!(s.screen(), Screen::SearchResults);

        assert_eq!(s.select_result(1), Ok(2));
        assert_eq!(s.screen(), Screen::Detail { id: 2 });
        assert_eq!(
            s.select_result(0),
            Err(NavError::WrongScreen {
                expected: "search results"
            })
        );
    }

    #[test]
    fn select_result_out_of_range() {
        let mut s = session();
        let t = s.submit_search("pika").unwrap();
        let found = records(&s, &[25]);
        s.complete_search(t, Ok(found), Instant::now());
        assert_eq!(
            s.select_result(3),
            Err(NavError::IndexOutOfRange { index: 3, len: 1 })
        );
    }

    #[test]
    fn stale_search_response_is_discarded() {
        let mut s = session();
        let first = s.submit_search("bulba").unwrap();
        let second = s.submit_search("ray").unwrap();
        assert!(second > first);

        let late = records(&s, &[1]);
        assert_eq!(s.complete_search(first, Ok(late), Instant::now()), SearchOutcome::Stale);
        assert!(s.search_state().results.is_empty());
        assert_eq!(s.search_state().pending, Some(second));

        let fresh = records(&s, &[384]);
        assert_eq!(s.complete_search(second, Ok(fresh), Instant::now()), SearchOutcome::Applied);
        assert_eq!(s.search_state().results[0].id, 384);
        assert_eq!(s.search_state().query, "ray");
        // The second search replaced the results screen.
        assert_eq!(s.history(), &[Screen::Landing, Screen::SearchResults]);
    }

    #[test]
    fn stale_failure_does_not_raise_banner() {
        let mut s = session();
        let first = s.submit_search("a").unwrap();
        s.submit_search("b").unwrap();
        let err = ClientError::network("http://x", "boom");
        assert_eq!(s.complete_search(first, Err(err), Instant::now()), SearchOutcome::Stale);
        assert!(s.banner().is_none());
    }

    #[test]
    fn back_never_reaches_a_results_screen_for_an_older_query() {
        let mut s = session();
        let now = Instant::now();
        let local = crate::LocalQueryService::new(s.catalog().clone());
        s.run_search(&local, "saur", now);
        s.select_result(0).unwrap();

        let t = s.submit_search("pika").unwrap();
        let found = records(&s, &[25]);
        s.complete_search(t, Ok(found), now);
        assert_eq!(
            s.history(),
            &[Screen::Landing, Screen::Detail { id: 1 }, Screen::SearchResults]
        );

        s.select_result(0).unwrap();
        s.back();
        assert_eq!(s.screen(), Screen::SearchResults);
        assert_eq!(s.search_state().query, "pika");
        s.back();
        assert_eq!(s.screen(), Screen::Detail { id: 1 });
        s.back();
        assert_eq!(s.screen(), Screen::Landing);
    }

    #[test]
    fn failed_search_is_flagged_until_the_next_submission() {
        let mut s = session();
        let t = s.submit_search("ray").unwrap();
        s.complete_search(t, Err(ClientError::network("http://x", "boom")), Instant::now());
        assert!(s.search_state().failed);
        assert!(s.banner().is_some());

        s.submit_search("ray").unwrap();
        assert!(!s.search_state().failed);
    }

    #[test]
    fn next_and_previous_wrap_and_replace() {
        let mut s = session();
        s.open(384);
        assert_eq!(s.next(), Ok(1));
        assert_eq!(s.previous(), Ok(384));
        assert_eq!(s.previous(), Ok(25));
        assert_eq!(s.history(), &[Screen::Landing, Screen::Detail { id: 25 }]);
    }

    #[test]
    fn next_requires_detail() {
        let mut s = session();
        assert_eq!(s.next(), Err(NavError::WrongScreen { expected: "detail" }));
    }

    #[test]
    fn chain_member_pushes_and_back_returns() {
        let mut s = session();
        s.open(3);
        s.select_chain_member(1).unwrap();
        assert_eq!(s.screen(), Screen::Detail { id: 1 });
        assert_eq!(s.select_chain_member(25), Err(NavError::NotInChain(25)));

        s.back();
        assert_eq!(s.screen(), Screen::Detail { id: 3 });
        s.back();
        assert_eq!(s.screen(), Screen::Landing);
        s.back();
        assert_eq!(s.screen(), Screen::Landing);
        assert_eq!(s.history().len(), 1);
    }

    #[test]
    fn tab_cycles_and_resets_on_new_detail() {
        let mut s = session();
        assert!(s.cycle_tab().is_err());
        s.open(1);
        assert_eq!(s.cycle_tab(), Ok(DetailTab::MoreInfo));
        assert_eq!(s.cycle_tab(), Ok(DetailTab::General));
        s.cycle_tab().unwrap();
        s.next().unwrap();
        assert_eq!(s.tab(), DetailTab::General);
    }

    #[test]
    fn home_clears_history_and_picks() {
        let mut s = session();
        s.refresh_landing_picks(&mut StdRng::seed_from_u64(7));
        assert_eq!(s.landing_picks().len(), LANDING_PICKS);
        let pick = s.landing_picks()[0];
        assert_eq!(s.select_random(0), Ok(pick));
        s.home();
        assert_eq!(s.history(), &[Screen::Landing]);
        assert!(s.landing_picks().is_empty());
    }

    #[test]
    fn banner_expires_after_ttl_and_returns_to_landing() {
        let mut s = session();
        s.open(25);
        let t0 = Instant::now();
        s.raise_error("network down", t0);

        assert!(!s.tick(t0 + Duration::from_millis(2999)));
        assert!(s.banner().is_some());
        assert_eq!(s.screen(), Screen::Detail { id: 25 });

        assert!(s.tick(t0 + ERROR_BANNER_TTL));
        assert!(s.banner().is_none());
        assert_eq!(s.screen(), Screen::Landing);
        assert!(!s.tick(t0 + Duration::from_secs(10)));
    }

    #[test]
    fn tab_names_parse() {
        assert_eq!(DetailTab::parse("general"), Some(DetailTab::General));
        assert_eq!(DetailTab::parse("More Info"), Some(DetailTab::MoreInfo));
        assert_eq!(DetailTab::parse("more_info"), Some(DetailTab::MoreInfo));
        assert_eq!(DetailTab::parse("stats"), None);
    }
}

use std::cell::Cell;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pokedex_catalog::{load_path, Catalog, Record};
use pokedex_client::{
    ClientError, LocalQueryService, QueryService, Screen, ScreenView, SearchOutcome, Session,
    ERROR_BANNER_TTL,
};
use proptest::prelude::*;

fn sample_catalog() -> Arc<Catalog> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/catalog.json");
    Arc::new(load_path(&path).expect("sample dataset loads").catalog)
}

/// Answers from a catalog but can be told to fail.
struct FlakyService {
    inner: LocalQueryService,
    down: Cell<bool>,
}

impl QueryService for FlakyService {
    fn list_all(&self) -> Result<Vec<Record>, ClientError> {
        self.check()?;
        self.inner.list_all()
    }

    fn search(&self, query: &str) -> Result<Vec<Record>, ClientError> {
        self.check()?;
        self.inner.search(query)
    }

    fn get_by_id(&self, id: u32) -> Result<Record, ClientError> {
        self.check()?;
        self.inner.get_by_id(id)
    }

    fn random(&self, count: usize) -> Result<Vec<Record>, ClientError> {
        self.check()?;
        self.inner.random(count)
    }
}

impl FlakyService {
    fn check(&self) -> Result<(), ClientError> {
        if self.down.get() {
            Err(ClientError::network("http://test", "connection refused"))
        } else {
            Ok(())
        }
    }
}

#[test]
fn bootstrap_caches_the_whole_dataset() {
    let svc = LocalQueryService::new(sample_catalog());
    let session = Session::bootstrap(&svc).unwrap();
    assert_eq!(session.catalog().len(), svc.catalog().len());
    assert_eq!(session.screen(), Screen::Landing);
}

#[test]
fn bootstrap_reports_network_failure() {
    let svc = FlakyService {
        inner: LocalQueryService::new(sample_catalog()),
        down: Cell::new(true),
    };
    assert!(matches!(
        Session::bootstrap(&svc),
        Err(ClientError::Network { .. })
    ));
}

#[test]
fn search_for_ray_then_open_rayquaza() {
    let svc = LocalQueryService::new(sample_catalog());
    let mut s = Session::bootstrap(&svc).unwrap();
    let now = Instant::now();

    assert_eq!(s.run_search(&svc, "RAY", now), Some(SearchOutcome::Applied));
    let ids: Vec<u32> = s.search_state().results.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![384]);

    assert_eq!(s.select_result(0), Ok(384));
    let ScreenView::Detail(view) = s.view() else {
        panic!("expected detail screen");
    };
    assert_eq!(view.name, "Rayquaza");
}

#[test]
fn unknown_numeric_search_is_empty_not_an_error() {
    let svc = LocalQueryService::new(sample_catalog());
    let mut s = Session::bootstrap(&svc).unwrap();
    s.run_search(&svc, "99999", Instant::now());
    assert!(s.search_state().results.is_empty());
    assert!(s.banner().is_none());
    assert!(matches!(s.view(), ScreenView::SearchResults { ref cards, failed: false, .. } if cards.is_empty()));
}

#[test]
fn failed_search_shows_banner_then_returns_home() {
    let svc = FlakyService {
        inner: LocalQueryService::new(sample_catalog()),
        down: Cell::new(false),
    };
    let mut s = Session::bootstrap(&svc).unwrap();
    svc.down.set(true);

    let t0 = Instant::now();
    assert_eq!(s.run_search(&svc, "char", t0), Some(SearchOutcome::Applied));
    assert!(s.banner().is_some());
    assert_eq!(s.screen(), Screen::SearchResults);
    assert!(matches!(s.view(), ScreenView::SearchResults { failed: true, .. }));

    assert!(!s.tick(t0 + Duration::from_secs(1)));
    assert!(s.tick(t0 + ERROR_BANNER_TTL + Duration::from_millis(1)));
    assert_eq!(s.screen(), Screen::Landing);
    assert!(s.banner().is_none());
}

#[test]
fn walking_the_eevee_line() {
    let catalog = sample_catalog();
    let mut s = Session::new(catalog);
    s.open(133);
    for id in [134, 135, 136] {
        s.select_chain_member(id).unwrap();
        s.back();
    }
    assert_eq!(s.screen(), Screen::Detail { id: 133 });
    // 196 is referenced but missing from the sample, so it never shows up.
    assert!(s.select_chain_member(196).is_err());
}

fn ordered_ids(catalog: &Catalog) -> Vec<u32> {
    catalog.ids().collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn next_then_previous_is_identity(start in any::<prop::sample::Index>(), steps in 0usize..40) {
        let catalog = sample_catalog();
        let ids = ordered_ids(&catalog);
        let first = ids[start.index(ids.len())];
        let mut s = Session::new(catalog);
        s.open(first);

        for _ in 0..steps {
            s.next().unwrap();
        }
        let expected = ids[(start.index(ids.len()) + steps) % ids.len()];
        prop_assert_eq!(s.screen(), Screen::Detail { id: expected });

        for _ in 0..steps {
            s.previous().unwrap();
        }
        prop_assert_eq!(s.screen(), Screen::Detail { id: first });
        prop_assert_eq!(s.history().len(), 2);
    }
}

use std::sync::Arc;

use mockall::predicate::eq;
use mockall::Sequence;
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;

use show_scraper_core::contract::{
    MockCatalogSource, MockPageCursorStore, MockShowRepository, ShowRepository,
};
use show_scraper_core::error::{IngestError, SourceError};
use show_scraper_core::memory::InMemoryStore;
use show_scraper_core::model::{CastCredit, CatalogShow, Person};
use show_scraper_core::synchronise::{ingest_page, PageOutcome, PageReport};

fn catalog(ids: impl IntoIterator<Item = u64>) -> Vec<CatalogShow> {
    ids.into_iter()
        .map(|id| CatalogShow {
            id,
            name: format!("Show {id}"),
        })
        .collect()
}

fn cast_for(show_id: u64) -> Vec<CastCredit> {
    vec![CastCredit {
        person: Person {
            id: show_id * 1000,
            name: format!("Lead of {show_id}"),
            birthday: Some("1975-04-12".to_string()),
        },
    }]
}

fn server_error() -> SourceError {
    SourceError::Status {
        url: "http://catalog.test/shows/2/cast".to_string(),
        status: StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[tokio::test]
async fn exhausted_page_is_not_committed() {
    let mut source = MockCatalogSource::new();
    source
        .expect_fetch_page()
        .withf(|page, _| *page == 4)
        .times(1)
        .returning(|_, _| Ok(None));
    // No expectations: any store call fails the test.
    let shows = MockShowRepository::new();
    let cursor = MockPageCursorStore::new();

    let outcome = ingest_page(4, &source, &shows, &cursor, &CancellationToken::new())
        .await
        .expect("exhaustion is not an error");

    assert_eq!(outcome, PageOutcome::Exhausted);
}

#[tokio::test]
async fn new_shows_are_enriched_stored_and_then_the_page_is_committed() {
    let mut seq = Sequence::new();
    let mut source = MockCatalogSource::new();
    let mut shows = MockShowRepository::new();
    let mut cursor = MockPageCursorStore::new();

    source
        .expect_fetch_page()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(Some(catalog([11]))));
    shows
        .expect_find_by_id()
        .with(eq(11u64))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(None));
    source
        .expect_fetch_cast()
        .withf(|id, _| *id == 11)
        .times(1)
        .in_sequence(&mut seq)
        .returning(|id, _| Ok(cast_for(id)));
    shows
        .expect_insert()
        .withf(|show| show.id == 11 && show.name == "Show 11" && show.cast.len() == 1)
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    cursor
        .expect_mark_page_completed()
        .with(eq(1u32))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));

    let outcome = ingest_page(1, &source, &shows, &cursor, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        PageOutcome::RecordsProcessed(PageReport {
            page: 1,
            fetched: 1,
            inserted: 1,
            skipped: 0,
        })
    );
}

#[tokio::test]
async fn ingesting_the_same_page_twice_never_duplicates_or_re_enriches() {
    let store = Arc::new(InMemoryStore::new());
    let mut source = MockCatalogSource::new();
    source
        .expect_fetch_page()
        .times(2)
        .returning(|_, _| Ok(Some(catalog(1..=3))));
    source
        .expect_fetch_cast()
        .times(3)
        .returning(|id, _| Ok(cast_for(id)));

    let cancel = CancellationToken::new();
    ingest_page(1, &source, &store, &store, &cancel).await.unwrap();
    let second = ingest_page(1, &source, &store, &store, &cancel).await.unwrap();

    assert_eq!(
        second,
        PageOutcome::RecordsProcessed(PageReport {
            page: 1,
            fetched: 3,
            inserted: 0,
            skipped: 3,
        })
    );
    assert_eq!(store.show_count(), 3);
    assert_eq!(store.completed_pages(), vec![1]);
}

#[tokio::test]
async fn cast_fault_mid_page_keeps_earlier_shows_but_leaves_page_uncommitted() {
    let store = Arc::new(InMemoryStore::new());
    let cancel = CancellationToken::new();

    let mut failing = MockCatalogSource::new();
    failing
        .expect_fetch_page()
        .returning(|_, _| Ok(Some(catalog([1, 2, 3]))));
    failing
        .expect_fetch_cast()
        .withf(|id, _| *id == 1)
        .times(1)
        .returning(|id, _| Ok(cast_for(id)));
    failing
        .expect_fetch_cast()
        .withf(|id, _| *id == 2)
        .times(1)
        .returning(|_, _| Err(server_error()));

    let err = ingest_page(1, &failing, &store, &store, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Source(SourceError::Status { .. })));
    assert!(store.find_by_id(1).await.unwrap().is_some());
    assert_eq!(store.show_count(), 1);
    assert!(store.completed_pages().is_empty());

    // The retry of the page skips show 1 and enriches only 2 and 3.
    let mut healthy = MockCatalogSource::new();
    healthy
        .expect_fetch_page()
        .returning(|_, _| Ok(Some(catalog([1, 2, 3]))));
    healthy
        .expect_fetch_cast()
        .withf(|id, _| *id != 1)
        .times(2)
        .returning(|id, _| Ok(cast_for(id)));

    ingest_page(1, &healthy, &store, &store, &cancel).await.unwrap();
    assert_eq!(store.show_count(), 3);
    assert_eq!(store.completed_pages(), vec![1]);
}

#[tokio::test]
async fn empty_but_present_page_is_committed() {
    let store = Arc::new(InMemoryStore::new());
    let mut source = MockCatalogSource::new();
    source.expect_fetch_page().returning(|_, _| Ok(Some(vec![])));

    let outcome = ingest_page(2, &source, &store, &store, &CancellationToken::new())
        .await
        .unwrap();

    assert!(matches!(outcome, PageOutcome::RecordsProcessed(_)));
    assert_eq!(store.completed_pages(), vec![2]);
}

#[tokio::test]
async fn unparseable_birthday_does_not_abort_ingestion() {
    let store = Arc::new(InMemoryStore::new());
    let mut source = MockCatalogSource::new();
    source
        .expect_fetch_page()
        .returning(|_, _| Ok(Some(catalog([1, 2]))));
    source.expect_fetch_cast().returning(|id, _| {
        Ok(vec![CastCredit {
            person: Person {
                id: id * 10,
                name: format!("Actor {id}"),
                birthday: Some("not-a-date".to_string()),
            },
        }])
    });

    ingest_page(1, &source, &store, &store, &CancellationToken::new())
        .await
        .unwrap();

    let show = store.find_by_id(1).await.unwrap().expect("show 1 stored");
    assert_eq!(show.cast.len(), 1);
    assert_eq!(show.cast[0].id, 10);
    assert_eq!(show.cast[0].name, "Actor 1");
    assert_eq!(show.cast[0].birthday, None);
    assert_eq!(store.show_count(), 2);
    assert_eq!(store.completed_pages(), vec![1]);
}

#[tokio::test]
async fn cancellation_surfaces_as_cancelled_and_commits_nothing() {
    let store = Arc::new(InMemoryStore::new());
    let mut source = MockCatalogSource::new();
    source
        .expect_fetch_page()
        .returning(|_, _| Ok(Some(catalog([5]))));
    source
        .expect_fetch_cast()
        .returning(|_, _| Err(SourceError::Cancelled));

    let err = ingest_page(1, &source, &store, &store, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(store.show_count(), 0);
    assert!(store.completed_pages().is_empty());
}

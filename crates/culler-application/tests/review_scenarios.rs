use culler_application::ReviewSession;
use culler_core::config::{DeleteMode, ReviewConfig};
use culler_core::disposition::Disposition;
use culler_core::item::ItemId;
use culler_core::review::{CommitOutcome, SessionEvent, UndoOutcome, ViewOutcome};
use culler_infrastructure::{DirectoryItemStore, TomlStateRepository};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Library directory inside a temp dir; review state lives in the library.
struct Fixture {
    _temp_dir: TempDir,
    library: PathBuf,
}

impl Fixture {
    /// Creates `names` so that the first one is the newest.
    fn with_photos(names: &[&str]) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let library = temp_dir.path().join("library");
        std::fs::create_dir_all(&library).unwrap();
        let now = SystemTime::now();
        for (n, name) in names.iter().enumerate() {
            let file = File::create(library.join(name)).unwrap();
            file.set_modified(now - Duration::from_secs(60 * (n as u64 + 1)))
                .unwrap();
        }
        Self {
            _temp_dir: temp_dir,
            library,
        }
    }

    async fn session(&self) -> ReviewSession {
        let store = Arc::new(DirectoryItemStore::new(
            self.library.clone(),
            DeleteMode::Trash,
            None,
        ));
        let repository = Arc::new(
            TomlStateRepository::for_library(&self.library)
                .await
                .unwrap(),
        );
        ReviewSession::new(store, repository, ReviewConfig::default())
    }

    fn exists(&self, name: &str) -> bool {
        self.library.join(name).exists()
    }
}

fn id(s: &str) -> ItemId {
    ItemId::from(s)
}

fn ready(outcome: ViewOutcome) -> culler_core::review::ReviewSnapshot {
    match outcome {
        ViewOutcome::Ready(snapshot) => snapshot,
        ViewOutcome::Rejected(reason) => panic!("view rejected: {:?}", reason),
    }
}

#[tokio::test]
async fn test_tag_undo_commit_lands_on_surviving_item() {
    let fixture = Fixture::with_photos(&["a.jpg", "b.jpg", "c.jpg", "d.jpg"]);
    let session = fixture.session().await;
    let opened = ready(session.open(None).await.unwrap());
    assert_eq!(opened.cursor, 0);
    assert_eq!(opened.current.unwrap().id, id("a.jpg"));

    session.tag(Disposition::Delete).await;
    session.tag(Disposition::Keep).await;
    let undone = session.undo().await;
    assert_eq!(
        undone,
        UndoOutcome::Undone {
            id: id("b.jpg"),
            disposition: Disposition::Keep,
            cursor: 1,
        }
    );

    let CommitOutcome::Committed(report) = session.commit().await.unwrap() else {
        panic!("expected a committed outcome");
    };

    assert_eq!(report.deleted.len(), 1);
    assert_eq!(report.cursor, 0);
    assert!(!fixture.exists("a.jpg"));
    assert!(fixture.library.join(".culler-trash").join("a.jpg").exists());

    let snapshot = session.snapshot().await.unwrap();
    assert_eq!(snapshot.len, 3);
    assert_eq!(snapshot.current.unwrap().id, id("b.jpg"));
    assert_eq!(snapshot.stats.marked_for_delete, 0);
}

#[tokio::test]
async fn test_deleting_everything_empties_the_session() {
    let fixture = Fixture::with_photos(&["a.jpg", "b.png", "c.mp4"]);
    let session = fixture.session().await;
    session.open(None).await.unwrap();
    let mut events = session.subscribe();

    for _ in 0..3 {
        session.tag(Disposition::Delete).await;
    }
    assert_eq!(events.recv().await.unwrap(), SessionEvent::ReviewComplete);

    let CommitOutcome::Committed(report) = session.commit().await.unwrap() else {
        panic!("expected a committed outcome");
    };

    assert!(report.collection_empty);
    assert_eq!(report.cursor, 0);
    let snapshot = session.snapshot().await.unwrap();
    assert_eq!(snapshot.len, 0);
    assert!(snapshot.current.is_none());
    assert!(matches!(
        events.recv().await.unwrap(),
        SessionEvent::Committed { .. }
    ));
    assert_eq!(events.recv().await.unwrap(), SessionEvent::CollectionEmpty);
}

#[tokio::test]
async fn test_restart_resumes_position_and_ledger() {
    let fixture = Fixture::with_photos(&["a.jpg", "b.jpg", "c.jpg"]);
    {
        let session = fixture.session().await;
        session.open(None).await.unwrap();
        session.tag(Disposition::Keep).await;
        session.tag(Disposition::Delete).await;
    }

    let session = fixture.session().await;
    let snapshot = ready(session.open(None).await.unwrap());

    assert_eq!(snapshot.current.unwrap().id, id("c.jpg"));
    assert_eq!(snapshot.stats.kept, 1);
    assert_eq!(snapshot.stats.marked_for_delete, 1);
    // History is not persisted.
    assert!(!snapshot.can_undo);
}

#[tokio::test]
async fn test_explicit_target_overrides_remembered_position() {
    let fixture = Fixture::with_photos(&["a.jpg", "b.jpg", "c.jpg"]);
    {
        let session = fixture.session().await;
        session.open(None).await.unwrap();
        session.tag(Disposition::Keep).await;
    }

    let session = fixture.session().await;
    let snapshot = ready(session.open(Some(id("c.jpg"))).await.unwrap());
    assert_eq!(snapshot.cursor, 2);

    let session = fixture.session().await;
    let snapshot = ready(session.open(Some(id("gone.jpg"))).await.unwrap());
    assert_eq!(snapshot.cursor, 0);
}

#[tokio::test]
async fn test_refresh_picks_up_external_removal() {
    let fixture = Fixture::with_photos(&["a.jpg", "b.jpg", "c.jpg"]);
    let session = fixture.session().await;
    session.open(None).await.unwrap();
    session.tag(Disposition::Keep).await;

    std::fs::remove_file(fixture.library.join("a.jpg")).unwrap();
    let snapshot = ready(session.refresh().await.unwrap());

    assert_eq!(snapshot.len, 2);
    assert_eq!(snapshot.current.unwrap().id, id("b.jpg"));
}

#[tokio::test]
async fn test_missing_library_is_unavailable() {
    let fixture = Fixture::with_photos(&[]);
    std::fs::remove_dir_all(&fixture.library).unwrap();
    let session = fixture.session().await;

    let err = session.open(None).await.unwrap_err();

    assert!(err.is_permission_denied());
    assert!(session.snapshot().await.is_none());
}

//! End-to-end scenarios wiring the registry, virtual documents, and the
//! synchronizer together the way a hosting application would.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use url::Url;

use utsushi::{
    DocumentRegistry, DocumentSynchronizer, EmbeddedLanguageFactory, ProjectionError,
    SynchronizationTimeout, TextEdit, VirtualDocument,
};

struct Fixture {
    registry: DocumentRegistry,
    synchronizer: Arc<DocumentSynchronizer>,
    host_uri: Url,
}

impl Fixture {
    fn new(timeout: SynchronizationTimeout) -> Self {
        let registry = DocumentRegistry::new(vec![
            Arc::new(EmbeddedLanguageFactory::new("css")),
            Arc::new(EmbeddedLanguageFactory::new("javascript")),
        ]);
        let synchronizer = Arc::new(DocumentSynchronizer::new(timeout));
        registry.add_observer(synchronizer.clone());

        Self {
            registry,
            synchronizer,
            host_uri: Url::parse("file:///project/page.tmpl").unwrap(),
        }
    }

    fn tracked(timeout: SynchronizationTimeout) -> Self {
        let fixture = Self::new(timeout);
        fixture.registry.track(&fixture.host_uri);
        fixture
    }

    fn css_document(&self) -> Arc<VirtualDocument> {
        let host = self.registry.try_get(&self.host_uri).expect("host tracked");
        Arc::clone(
            host.virtual_document_for_language("css")
                .expect("css factory ran"),
        )
    }

    fn spawn_wait(
        &self,
        required_version: i32,
        cancel: &CancellationToken,
    ) -> tokio::task::JoinHandle<Result<bool, ProjectionError>> {
        let synchronizer = Arc::clone(&self.synchronizer);
        let uri = self.css_document().uri().clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { synchronizer.wait_for_version(required_version, &uri, &cancel).await })
    }
}

/// Virtual document starts unversioned; a wait for version 3 resolves `true`
/// only once the third update lands, and the final snapshot carries the
/// version tag.
#[tokio::test]
async fn wait_resolves_after_the_required_update_arrives() {
    let fixture = Fixture::tracked(SynchronizationTimeout::default());
    let css = fixture.css_document();
    assert_eq!(css.host_document_sync_version(), None);

    let waiter = fixture.spawn_wait(3, &CancellationToken::new());
    tokio::task::yield_now().await;

    css.update(&[], 1, false).expect("touch update applies");
    css.update(&[TextEdit::insert(0, "x")], 2, false)
        .expect("edit applies");
    assert!(!waiter.is_finished(), "still one version short");

    css.update(&[], 3, false).expect("touch update applies");

    let synchronized = waiter.await.unwrap().unwrap();
    assert!(synchronized);
    assert_eq!(css.current_snapshot().host_document_sync_version(), Some(3));
    assert_eq!(css.current_snapshot().text(), "x");
}

/// With no updates arriving, the wait gives up at the configured timeout and
/// reports `false` rather than an error.
#[tokio::test(start_paused = true)]
async fn wait_gives_up_at_the_configured_timeout() {
    let fixture = Fixture::tracked(SynchronizationTimeout::from_millis(50).unwrap());
    let css = fixture.css_document();

    let started = tokio::time::Instant::now();
    let synchronized = fixture
        .synchronizer
        .wait_for_version(5, css.uri(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(!synchronized);
    assert_eq!(started.elapsed(), Duration::from_millis(50));
}

/// A provisional edit echoed ahead of the authoritative round-trip never
/// composes with the authoritative batch that supersedes it.
#[tokio::test]
async fn provisional_edit_is_invisible_to_the_authoritative_update() {
    let fixture = Fixture::tracked(SynchronizationTimeout::default());
    let css = fixture.css_document();

    css.update(&[TextEdit::insert(0, "a { color")], 1, false)
        .expect("baseline applies");

    // Speculative ":" echoed for fast feedback.
    css.update(&[TextEdit::insert(9, ":")], 1, true)
        .expect("provisional applies");
    assert_eq!(css.current_snapshot().text(), "a { color:");

    // Authoritative edit for the same keystroke and more.
    let snapshot = css
        .update(&[TextEdit::insert(9, ": red; }")], 2, false)
        .expect("authoritative applies");

    assert_eq!(snapshot.text(), "a { color: red; }");

    let synchronized = fixture
        .synchronizer
        .wait_for_version(2, css.uri(), &CancellationToken::new())
        .await
        .unwrap();
    assert!(synchronized);
}

/// Untracking the host while a wait is outstanding resolves the wait `false`
/// instead of leaving it pending or panicking.
#[tokio::test]
async fn untracking_the_host_resolves_outstanding_waits() {
    let fixture = Fixture::tracked(SynchronizationTimeout::default());

    let waiter = fixture.spawn_wait(7, &CancellationToken::new());
    tokio::task::yield_now().await;

    fixture.registry.untrack(&fixture.host_uri);

    let synchronized = waiter.await.unwrap().unwrap();
    assert!(!synchronized);
}

/// An update that jumps past the awaited version makes the wait fail: the
/// exact target can never be reached anymore.
#[tokio::test]
async fn update_skipping_the_target_version_fails_the_wait() {
    let fixture = Fixture::tracked(SynchronizationTimeout::default());
    let css = fixture.css_document();

    let waiter = fixture.spawn_wait(2, &CancellationToken::new());
    tokio::task::yield_now().await;

    css.update(&[], 3, false).expect("update applies");

    let synchronized = waiter.await.unwrap().unwrap();
    assert!(!synchronized);
}

/// Two consumers waiting on the same version resolve together from a single
/// update.
#[tokio::test]
async fn coalesced_waiters_resolve_together() {
    let fixture = Fixture::tracked(SynchronizationTimeout::default());
    let css = fixture.css_document();

    let first = fixture.spawn_wait(1, &CancellationToken::new());
    let second = fixture.spawn_wait(1, &CancellationToken::new());
    tokio::task::yield_now().await;

    css.update(&[TextEdit::insert(0, "body {}")], 1, false)
        .expect("update applies");

    assert!(first.await.unwrap().unwrap());
    assert!(second.await.unwrap().unwrap());
}

/// Each embedded language synchronizes independently: an update to the CSS
/// projection says nothing about the JavaScript projection.
#[tokio::test]
async fn virtual_documents_synchronize_independently() {
    let fixture = Fixture::tracked(SynchronizationTimeout::from_millis(50).unwrap());
    let host = fixture.registry.try_get(&fixture.host_uri).unwrap();
    let css = fixture.css_document();
    let js = Arc::clone(host.virtual_document_for_language("javascript").unwrap());

    css.update(&[], 1, false).expect("css update applies");

    let css_synchronized = fixture
        .synchronizer
        .wait_for_version(1, css.uri(), &CancellationToken::new())
        .await
        .unwrap();
    assert!(css_synchronized);

    let js_synchronized = fixture
        .synchronizer
        .wait_for_version(1, js.uri(), &CancellationToken::new())
        .await
        .unwrap();
    assert!(!js_synchronized, "javascript never saw version 1");
}

/// Waits against a document of an untracked (never tracked) host are
/// contract violations, not timeouts.
#[tokio::test]
async fn wait_against_unannounced_document_errors() {
    let fixture = Fixture::new(SynchronizationTimeout::default());
    let phantom = Url::parse("file:///project/other.tmpl.utsushi-virtual.css").unwrap();

    let result = fixture
        .synchronizer
        .wait_for_version(1, &phantom, &CancellationToken::new())
        .await;

    assert!(matches!(
        result,
        Err(ProjectionError::UnknownDocument { .. })
    ));
}

/// External cancellation resolves the wait `false` promptly, well before the
/// timeout, and leaves the document usable.
#[tokio::test(start_paused = true)]
async fn cancellation_resolves_the_wait_before_the_timeout() {
    let fixture = Fixture::tracked(SynchronizationTimeout::default());
    let css = fixture.css_document();
    let cancel = CancellationToken::new();

    let waiter = fixture.spawn_wait(4, &cancel);
    tokio::task::yield_now().await;

    let started = tokio::time::Instant::now();
    cancel.cancel();
    let synchronized = waiter.await.unwrap().unwrap();

    assert!(!synchronized);
    assert_eq!(started.elapsed(), Duration::ZERO, "no timer wait involved");

    // The document still synchronizes normally afterwards.
    css.update(&[], 4, false).expect("update applies");
    let synchronized = fixture
        .synchronizer
        .wait_for_version(4, css.uri(), &CancellationToken::new())
        .await
        .unwrap();
    assert!(synchronized);
}

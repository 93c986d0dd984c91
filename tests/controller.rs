// tests/controller.rs
//
// Action dispatch, persistence and the rendered view model.
mod common;

use common::{FakeFetcher, GENERIC_PAGE, tmp_file};
use manga_reader::app::{EMPTY_LIBRARY, LOAD_FAILED, NO_IMAGES, UNSUPPORTED};
use manga_reader::config::{UnmatchedPolicy, builtin_sites};
use manga_reader::{Action, ChapterImageExtractor, Controller, Library, Screen};

const CH3: &str = "https://somewhere.test/series/chapter-3";
const CH4: &str = "https://somewhere.test/series/chapter-4";

fn add(title: &str, site: &str, chapter_url: &str) -> Action {
    Action::Add {
        title: title.to_owned(),
        site: site.to_owned(),
        chapter_url: chapter_url.to_owned(),
    }
}

async fn controller<'a>(
    fetcher: &'a FakeFetcher,
    name: &str,
    unmatched: UnmatchedPolicy,
) -> Controller<&'a FakeFetcher> {
    let library = Library::load(tmp_file(name)).await.unwrap();
    Controller::new(
        library,
        ChapterImageExtractor::new(fetcher, builtin_sites(), unmatched),
    )
}

#[tokio::test]
async fn empty_library_shows_placeholder() {
    let fetcher = FakeFetcher::new();
    let controller = controller(&fetcher, "placeholder", UnmatchedPolicy::Generic).await;

    let Screen::Library(view) = controller.render() else {
        panic!("expected the library screen");
    };
    assert!(view.items.is_empty());
    assert_eq!(view.placeholder, Some(EMPTY_LIBRARY));
}

#[tokio::test]
async fn duplicate_add_shows_error_and_keeps_library() {
    let fetcher = FakeFetcher::new();
    let mut controller = controller(&fetcher, "duplicate", UnmatchedPolicy::Generic).await;

    controller.dispatch(add("Kaiju No. 8", "somewhere", CH3)).await.unwrap();
    controller.dispatch(add("Kaiju No. 8", "somewhere", CH4)).await.unwrap();

    let Screen::Library(view) = controller.render() else {
        panic!("expected the library screen");
    };
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].last_chapter, CH3);
    assert_eq!(
        view.error.as_deref(),
        Some("This manga already exists in your library.")
    );

    let persisted = Library::load(controller.state().library.path()).await.unwrap();
    assert_eq!(persisted.len(), 1);
    let _ = std::fs::remove_file(controller.state().library.path());
}

#[tokio::test]
async fn every_mutation_is_persisted() {
    let fetcher = FakeFetcher::new();
    let mut controller = controller(&fetcher, "persist", UnmatchedPolicy::Generic).await;
    let path = controller.state().library.path().to_path_buf();

    controller.dispatch(add("A", "somewhere", CH3)).await.unwrap();
    controller.dispatch(add("B", "somewhere", CH3)).await.unwrap();
    controller
        .dispatch(Action::UpdateChapter {
            index: 1,
            chapter_url: CH4.to_owned(),
        })
        .await
        .unwrap();
    controller.dispatch(Action::Remove(0)).await.unwrap();

    let persisted = Library::load(&path).await.unwrap();
    assert_eq!(persisted.len(), 1);
    let entry = persisted.get(0).unwrap();
    assert_eq!(entry.title, "B");
    assert_eq!(entry.last_chapter, CH4);
    assert_eq!(entry.chapter_url, CH4);
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn reader_shows_images_and_next_chapter_advances() {
    let fetcher = FakeFetcher::new()
        .with_page(CH3, GENERIC_PAGE)
        .with_page(CH4, "<html><body></body></html>");
    let mut controller = controller(&fetcher, "reader", UnmatchedPolicy::Generic).await;
    let path = controller.state().library.path().to_path_buf();

    controller.dispatch(add("A", "somewhere", CH3)).await.unwrap();
    controller.dispatch(Action::OpenReader(0)).await.unwrap();

    let Screen::Reader(view) = controller.render() else {
        panic!("expected the reader screen");
    };
    assert_eq!(view.chapter_url, CH3);
    assert_eq!(view.images.len(), 3);
    assert_eq!(view.message, None);

    controller.dispatch(Action::NextChapter).await.unwrap();

    let Screen::Reader(view) = controller.render() else {
        panic!("expected the reader screen");
    };
    assert_eq!(view.chapter_url, CH4);
    assert!(view.images.is_empty());
    assert_eq!(view.message, Some(NO_IMAGES));
    assert_eq!(view.error, None);
    assert_eq!(fetcher.calls(), vec![CH3, CH4]);
    assert_eq!(Library::load(&path).await.unwrap().get(0).unwrap().last_chapter, CH4);

    controller.dispatch(Action::BackToLibrary).await.unwrap();
    assert!(matches!(controller.render(), Screen::Library(_)));
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn fetch_failure_is_distinguished_from_no_images() {
    let fetcher = FakeFetcher::new();
    let mut controller = controller(&fetcher, "failure", UnmatchedPolicy::Generic).await;

    controller.dispatch(add("A", "somewhere", CH3)).await.unwrap();
    controller.dispatch(Action::OpenReader(0)).await.unwrap();

    let Screen::Reader(view) = controller.render() else {
        panic!("expected the reader screen");
    };
    assert_eq!(view.message, Some(NO_IMAGES));
    assert_eq!(view.error.as_deref(), Some(LOAD_FAILED));
    let _ = std::fs::remove_file(controller.state().library.path());
}

#[tokio::test]
async fn unsupported_site_message() {
    let fetcher = FakeFetcher::new();
    let mut controller = controller(&fetcher, "unsupported", UnmatchedPolicy::Unsupported).await;

    controller.dispatch(add("A", "somewhere", CH3)).await.unwrap();
    controller.dispatch(Action::OpenReader(0)).await.unwrap();

    let Screen::Reader(view) = controller.render() else {
        panic!("expected the reader screen");
    };
    assert_eq!(view.message, Some(UNSUPPORTED));
    assert!(fetcher.calls().is_empty());
    let _ = std::fs::remove_file(controller.state().library.path());
}

#[tokio::test]
async fn navigation_without_reader_or_number_is_an_error_line() {
    let fetcher = FakeFetcher::new().with_page("https://somewhere.test/latest", GENERIC_PAGE);
    let mut controller = controller(&fetcher, "navigation", UnmatchedPolicy::Generic).await;

    controller.dispatch(Action::NextChapter).await.unwrap();
    assert!(controller.state().error.is_some());

    controller
        .dispatch(add("A", "somewhere", "https://somewhere.test/latest"))
        .await
        .unwrap();
    controller.dispatch(Action::OpenReader(0)).await.unwrap();
    controller.dispatch(Action::PrevChapter).await.unwrap();

    let Screen::Reader(view) = controller.render() else {
        panic!("expected the reader screen");
    };
    assert_eq!(view.chapter_url, "https://somewhere.test/latest");
    assert!(view.error.is_some());
    let _ = std::fs::remove_file(controller.state().library.path());
}

#[tokio::test]
async fn opening_a_missing_entry_is_rejected() {
    let fetcher = FakeFetcher::new();
    let mut controller = controller(&fetcher, "missing", UnmatchedPolicy::Generic).await;

    controller.dispatch(Action::OpenReader(4)).await.unwrap();

    let Screen::Library(view) = controller.render() else {
        panic!("expected the library screen");
    };
    assert_eq!(view.error.as_deref(), Some("no manga at position 5"));
    assert!(fetcher.calls().is_empty());
}

#[tokio::test]
async fn failed_save_still_moves_the_reader_with_the_library() {
    let fetcher = FakeFetcher::new()
        .with_page(CH3, GENERIC_PAGE)
        .with_page(CH4, GENERIC_PAGE);
    // A regular file as parent directory makes every save fail.
    let blocker = tmp_file("unwritable");
    std::fs::write(&blocker, "").unwrap();
    let library = Library::new(blocker.join("library.json"));
    let mut controller = Controller::new(
        library,
        ChapterImageExtractor::new(&fetcher, builtin_sites(), UnmatchedPolicy::Generic),
    );

    assert!(controller.dispatch(add("A", "somewhere", CH3)).await.is_err());
    controller.dispatch(Action::OpenReader(0)).await.unwrap();
    assert!(controller.dispatch(Action::NextChapter).await.is_err());

    let Screen::Reader(view) = controller.render() else {
        panic!("expected the reader screen");
    };
    assert_eq!(view.chapter_url, CH4);
    assert_eq!(view.images.len(), 3);
    assert_eq!(controller.state().library.get(0).unwrap().last_chapter, CH4);
    let _ = std::fs::remove_file(&blocker);
}

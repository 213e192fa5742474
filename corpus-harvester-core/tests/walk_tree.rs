mod common;

use common::{expect_tree, file_entry, repo, Tree};
use corpus_harvester_core::contract::{
    HostError, MockRepositoryHost, SkipReason, TreeEntry,
};
use corpus_harvester_core::filter::ContentFilter;
use corpus_harvester_core::storage::LocalStore;
use corpus_harvester_core::walk::TreeWalker;
use std::fs;
use tempfile::tempdir;

fn ts_filter() -> ContentFilter {
    ContentFilter::new([".ts", ".tsx"], 1_000)
}

#[tokio::test]
async fn sibling_file_is_accepted_before_nested_child() {
    let tree = Tree::new()
        .dir("", vec![TreeEntry::dir("A"), file_entry("B.ts", "b")])
        .dir("A", vec![file_entry("A/C.ts", "c")])
        .file("B.ts", "b")
        .file("A/C.ts", "c");
    let mut host = MockRepositoryHost::new();
    expect_tree(&mut host, tree);
    let tmp = tempdir().unwrap();
    let store = LocalStore::new(tmp.path());
    let filter = ts_filter();
    let walker = TreeWalker::new(&host, &filter, &store);

    let report = walker.walk("react", &repo("acme", "ui"), 2).await.unwrap();

    assert_eq!(report.accepted, vec!["B.ts", "A/C.ts"]);
}

#[tokio::test]
async fn budget_of_one_stops_after_the_sibling() {
    let tree = Tree::new()
        .dir("", vec![TreeEntry::dir("A"), file_entry("B.ts", "b")])
        .dir("A", vec![file_entry("A/C.ts", "c")])
        .file("B.ts", "b")
        .file("A/C.ts", "c");
    let mut host = MockRepositoryHost::new();
    let fetched = expect_tree(&mut host, tree);
    let tmp = tempdir().unwrap();
    let store = LocalStore::new(tmp.path());
    let filter = ts_filter();
    let walker = TreeWalker::new(&host, &filter, &store);

    let report = walker.walk("react", &repo("acme", "ui"), 1).await.unwrap();

    assert_eq!(report.accepted, vec!["B.ts"]);
    assert_eq!(*fetched.lock().unwrap(), vec!["B.ts"]);
    assert!(!tmp.path().join("react/acme/ui/A/C.ts").exists());
}

#[tokio::test]
async fn unlistable_directory_does_not_end_the_walk() {
    let tree = Tree::new()
        .dir("", vec![TreeEntry::dir("A"), file_entry("B.ts", "b")])
        .unlistable("A")
        .file("B.ts", "b");
    let mut host = MockRepositoryHost::new();
    expect_tree(&mut host, tree);
    let tmp = tempdir().unwrap();
    let store = LocalStore::new(tmp.path());
    let filter = ts_filter();
    let walker = TreeWalker::new(&host, &filter, &store);

    let report = walker.walk("react", &repo("acme", "ui"), 5).await.unwrap();

    assert_eq!(report.accepted, vec!["B.ts"]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].path, "A");
    assert!(matches!(report.skipped[0].reason, SkipReason::Listing(_)));
}

#[tokio::test]
async fn deep_tree_never_exceeds_the_budget() {
    // Ten nested levels, each holding three qualifying files and the next level.
    let mut tree = Tree::new();
    let mut parent = String::new();
    for depth in 0..10 {
        let dir = if parent.is_empty() {
            format!("d{depth}")
        } else {
            format!("{parent}/d{depth}")
        };
        let mut children = Vec::new();
        for i in 0..3 {
            let path = if parent.is_empty() {
                format!("f{depth}_{i}.ts")
            } else {
                format!("{parent}/f{depth}_{i}.ts")
            };
            tree = tree.file(&path, "x");
            children.push(file_entry(&path, "x"));
        }
        children.push(TreeEntry::dir(dir.clone()));
        tree = tree.dir(&parent, children);
        parent = dir;
    }
    tree = tree.dir(&parent, Vec::new());

    for budget in [0, 1, 4, 7, 29, 30, 31, 100] {
        let mut host = MockRepositoryHost::new();
        expect_tree(&mut host, tree.clone());
        let tmp = tempdir().unwrap();
        let store = LocalStore::new(tmp.path());
        let filter = ts_filter();
        let walker = TreeWalker::new(&host, &filter, &store);

        let report = walker.walk("react", &repo("acme", "deep"), budget).await.unwrap();

        assert_eq!(report.accepted.len(), budget.min(30), "budget {budget}");
    }
}

#[tokio::test]
async fn single_file_root_is_walked() {
    let mut tree = Tree::new().file("index.ts", "export {}");
    tree.root_file = Some(file_entry("index.ts", "export {}"));
    let mut host = MockRepositoryHost::new();
    expect_tree(&mut host, tree);
    let tmp = tempdir().unwrap();
    let store = LocalStore::new(tmp.path());
    let filter = ts_filter();
    let walker = TreeWalker::new(&host, &filter, &store);

    let report = walker.walk("react", &repo("acme", "one"), 30).await.unwrap();

    assert_eq!(report.accepted, vec!["index.ts"]);
    assert_eq!(
        fs::read_to_string(tmp.path().join("react/acme/one/index.ts")).unwrap(),
        "export {}"
    );
}

#[tokio::test]
async fn empty_root_accepts_nothing() {
    let mut host = MockRepositoryHost::new();
    expect_tree(&mut host, Tree::new().dir("", Vec::new()));
    let tmp = tempdir().unwrap();
    let store = LocalStore::new(tmp.path());
    let filter = ts_filter();
    let walker = TreeWalker::new(&host, &filter, &store);

    let report = walker.walk("react", &repo("acme", "empty"), 30).await.unwrap();

    assert!(report.accepted.is_empty());
    assert_eq!(report.dequeued, 0);
}

#[tokio::test]
async fn oversize_file_is_neither_written_nor_counted() {
    let big = "y".repeat(2_000);
    let tree = Tree::new()
        .dir(
            "",
            vec![file_entry("big.ts", &big), file_entry("small.ts", "s")],
        )
        .file("big.ts", &big)
        .file("small.ts", "s");
    let mut host = MockRepositoryHost::new();
    let fetched = expect_tree(&mut host, tree);
    let tmp = tempdir().unwrap();
    let store = LocalStore::new(tmp.path());
    let filter = ts_filter();
    let walker = TreeWalker::new(&host, &filter, &store);

    let report = walker.walk("react", &repo("acme", "ui"), 1).await.unwrap();

    assert_eq!(report.accepted, vec!["small.ts"]);
    assert!(!tmp.path().join("react/acme/ui/big.ts").exists());
    assert_eq!(*fetched.lock().unwrap(), vec!["small.ts"]);
    assert_eq!(
        report.skipped[0].reason,
        SkipReason::TooLarge {
            size: 2_000,
            limit: 1_000
        }
    );
}

#[tokio::test]
async fn file_at_exactly_the_limit_is_rejected() {
    let exact = "z".repeat(1_000);
    let tree = Tree::new()
        .dir("", vec![file_entry("exact.ts", &exact)])
        .file("exact.ts", &exact);
    let mut host = MockRepositoryHost::new();
    expect_tree(&mut host, tree);
    let tmp = tempdir().unwrap();
    let store = LocalStore::new(tmp.path());
    let filter = ts_filter();
    let walker = TreeWalker::new(&host, &filter, &store);

    let report = walker.walk("react", &repo("acme", "ui"), 5).await.unwrap();

    assert!(report.accepted.is_empty());
    assert!(!tmp.path().join("react/acme/ui/exact.ts").exists());
}

#[tokio::test]
async fn non_qualifying_files_are_not_fetched_or_counted() {
    let tree = Tree::new()
        .dir(
            "",
            vec![
                file_entry("README.md", "# hi"),
                file_entry("logo.SVG", "<svg/>"),
                file_entry("App.tsx", "<App/>"),
            ],
        )
        .file("README.md", "# hi")
        .file("App.tsx", "<App/>");
    let mut host = MockRepositoryHost::new();
    let fetched = expect_tree(&mut host, tree);
    let tmp = tempdir().unwrap();
    let store = LocalStore::new(tmp.path());
    let filter = ts_filter();
    let walker = TreeWalker::new(&host, &filter, &store);

    let report = walker.walk("react", &repo("acme", "ui"), 1).await.unwrap();

    assert_eq!(report.accepted, vec!["App.tsx"]);
    assert_eq!(*fetched.lock().unwrap(), vec!["App.tsx"]);
    assert!(report.skipped.is_empty());
}

#[tokio::test]
async fn skipped_retrievals_do_not_consume_budget() {
    let tree = Tree::new()
        .dir(
            "",
            vec![
                file_entry("missing.ts", "?"),
                file_entry("empty.ts", ""),
                file_entry("ok.ts", "ok"),
            ],
        )
        .file("empty.ts", "")
        .file("ok.ts", "ok");
    let mut host = MockRepositoryHost::new();
    expect_tree(&mut host, tree);
    let tmp = tempdir().unwrap();
    let store = LocalStore::new(tmp.path());
    let filter = ts_filter();
    let walker = TreeWalker::new(&host, &filter, &store);

    let report = walker.walk("react", &repo("acme", "ui"), 1).await.unwrap();

    assert_eq!(report.accepted, vec!["ok.ts"]);
    let reasons: Vec<_> = report.skipped.iter().map(|s| s.reason.clone()).collect();
    assert!(matches!(reasons[0], SkipReason::PrimaryFailed(_)));
    assert_eq!(reasons[1], SkipReason::Empty);
}

#[tokio::test]
async fn write_failures_are_skips_not_acceptances() {
    let tree = Tree::new()
        .dir("", vec![file_entry("a.ts", "a"), file_entry("b.ts", "b")])
        .file("a.ts", "a")
        .file("b.ts", "b");
    let mut host = MockRepositoryHost::new();
    expect_tree(&mut host, tree);
    let tmp = tempdir().unwrap();
    let blocker = tmp.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();
    let store = LocalStore::new(&blocker);
    let filter = ts_filter();
    let walker = TreeWalker::new(&host, &filter, &store);

    let report = walker.walk("react", &repo("acme", "ui"), 5).await.unwrap();

    assert!(report.accepted.is_empty());
    assert_eq!(report.skipped.len(), 2);
    assert!(report
        .skipped
        .iter()
        .all(|s| matches!(s.reason, SkipReason::Write(_))));
}

#[tokio::test]
async fn entry_cap_bounds_directory_traversal() {
    let dirs: Vec<_> = (0..10).map(|i| TreeEntry::dir(format!("d{i}"))).collect();
    let mut tree = Tree::new().dir("", dirs);
    for i in 0..10 {
        tree = tree.dir(&format!("d{i}"), vec![file_entry(&format!("d{i}/notes.md"), "n")]);
    }
    let mut host = MockRepositoryHost::new();
    expect_tree(&mut host, tree);
    let tmp = tempdir().unwrap();
    let store = LocalStore::new(tmp.path());
    let filter = ts_filter();
    let walker = TreeWalker::new(&host, &filter, &store).with_entry_cap(Some(3));

    let report = walker.walk("react", &repo("acme", "docs"), 30).await.unwrap();

    assert_eq!(report.dequeued, 3);
    assert!(report.entry_cap_reached);
    assert!(report.accepted.is_empty());
}

#[tokio::test]
async fn root_listing_failure_is_returned() {
    let mut host = MockRepositoryHost::new();
    host.expect_list_contents().returning(|_, _| {
        Err(HostError::Status {
            url: "https://api.github.com/repos/acme/gone/contents/".into(),
            status: 404,
        })
    });
    host.expect_get_file().never();
    let tmp = tempdir().unwrap();
    let store = LocalStore::new(tmp.path());
    let filter = ts_filter();
    let walker = TreeWalker::new(&host, &filter, &store);

    let err = walker.walk("react", &repo("acme", "gone"), 30).await.unwrap_err();

    assert!(err.to_string().contains("404"));
}

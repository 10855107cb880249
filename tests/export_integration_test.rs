//! Integration tests for export runs against the in-memory repository
//!
//! These tests verify that:
//! - Descent and date-query scopes produce the expected output tree
//! - Completed nodes are journaled and skipped when a job is resumed
//! - Cancellation stops between nodes and leaves a resumable journal
//! - Revisions, unreadable content and absent content are written correctly

use bulk_export::adapters::{InMemoryRepository, NodeSpec};
use bulk_export::core::export::{ExportDriver, ExportJob, ExportSettings, ExportState, RunStatus};
use bulk_export::core::state::{CompletionJournal, NodeListCache};
use bulk_export::core::transform::MetadataRules;
use bulk_export::domain::{BulkExportError, CacheKey, DateRange, JobScope, NodeId};
use chrono::{TimeZone, Utc};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn id(s: &str) -> NodeId {
    NodeId::new(s).unwrap()
}

fn ids(names: &[&str]) -> Vec<NodeId> {
    names.iter().map(|n| id(n)).collect()
}

fn descent() -> JobScope {
    JobScope::Descent { root: id("root") }
}

/// `/Home` with folder `A` (holding `c.txt`) and file `b.txt`
fn sample_repo() -> Arc<InMemoryRepository> {
    let repo = InMemoryRepository::new();
    repo.insert(NodeSpec::folder("root", "Home")).unwrap();
    repo.insert(NodeSpec::folder("a", "A").parent("root")).unwrap();
    repo.insert(NodeSpec::file("c", "c.txt").parent("a").content(b"sea"))
        .unwrap();
    repo.insert(NodeSpec::file("b", "b.txt").parent("root").content(b"bee"))
        .unwrap();
    Arc::new(repo)
}

fn driver(repo: &Arc<InMemoryRepository>, settings: ExportSettings, scope: &JobScope) -> ExportDriver {
    let job = Arc::new(ExportJob::new(ExportJob::id_for_scope(scope)));
    ExportDriver::new(repo.clone(), settings, job)
}

fn journaled(base: &Path, scope: &JobScope) -> Vec<NodeId> {
    CompletionJournal::inspect(base, &CacheKey::for_scope(scope))
        .load()
        .unwrap()
}

#[tokio::test]
async fn test_descent_writes_tree_in_depth_first_order() {
    let dir = TempDir::new().unwrap();
    let repo = sample_repo();
    let scope = descent();

    let driver = driver(&repo, ExportSettings::new(dir.path()), &scope);
    let report = driver.run(&scope).await;

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(driver.state(), ExportState::Completed);
    assert_eq!(report.total_candidates, 4);
    assert_eq!(report.exported, 4);
    assert_eq!(report.job_id, "root");

    let home = dir.path().join("Home");
    assert!(home.is_dir());
    assert!(home.join("A").is_dir());
    assert_eq!(fs::read(home.join("A/c.txt")).unwrap(), b"sea");
    assert_eq!(fs::read(home.join("b.txt")).unwrap(), b"bee");
    assert!(dir.path().join("Home.metadata.properties.xml").exists());
    assert!(home.join("b.txt.metadata.properties.xml").exists());

    assert_eq!(journaled(dir.path(), &scope), ids(&["root", "a", "c", "b"]));
    let cached = NodeListCache::new(dir.path())
        .get(&CacheKey::for_scope(&scope))
        .unwrap();
    assert_eq!(cached, Some(ids(&["root", "a", "c", "b"])));
}

#[tokio::test]
async fn test_metadata_document_layout() {
    let dir = TempDir::new().unwrap();
    let repo = InMemoryRepository::new();
    repo.insert(NodeSpec::folder("root", "Home")).unwrap();
    repo.insert(
        NodeSpec::file("doc", "report.txt")
            .parent("root")
            .aspect("cm:titled")
            .property("cm:title", "Q1 <draft> & notes")
            .content(b"body"),
    )
    .unwrap();
    let repo = Arc::new(repo);
    let scope = descent();

    let report = driver(&repo, ExportSettings::new(dir.path()), &scope)
        .run(&scope)
        .await;
    assert_eq!(report.status, RunStatus::Completed);

    let text =
        fs::read_to_string(dir.path().join("Home/report.txt.metadata.properties.xml")).unwrap();
    assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(text.contains("<entry key=\"type\">cm:content</entry>"));
    assert!(text.contains("<entry key=\"aspects\">cm:titled</entry>"));
    assert!(text.contains("<entry key=\"cm:title\">Q1 &lt;draft&gt; &amp; notes</entry>"));
    assert!(text.contains("<entry key=\"cm:name\">report.txt</entry>"));
    assert!(text.ends_with("</properties>"));
}

#[tokio::test]
async fn test_metadata_is_identical_across_runs() {
    let repo = sample_repo();
    let scope = descent();
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();

    driver(&repo, ExportSettings::new(first.path()), &scope)
        .run(&scope)
        .await;
    driver(&repo, ExportSettings::new(second.path()), &scope)
        .run(&scope)
        .await;

    for file in ["Home.metadata.properties.xml", "Home/A/c.txt.metadata.properties.xml"] {
        assert_eq!(
            fs::read_to_string(first.path().join(file)).unwrap(),
            fs::read_to_string(second.path().join(file)).unwrap(),
            "{file} differs between runs"
        );
    }
}

#[tokio::test]
async fn test_custom_metadata_rules_are_applied() {
    let dir = TempDir::new().unwrap();
    let repo = sample_repo();
    let scope = descent();

    let mut settings = ExportSettings::new(dir.path());
    settings.metadata = MetadataRules {
        custom_aspects: vec!["acme:migrated".to_string()],
        ..Default::default()
    };
    settings
        .metadata
        .custom_properties
        .insert("acme:source".to_string(), "legacy".to_string());

    let report = driver(&repo, settings, &scope).run(&scope).await;
    assert_eq!(report.status, RunStatus::Completed);

    let text = fs::read_to_string(dir.path().join("Home/b.txt.metadata.properties.xml")).unwrap();
    assert!(text.contains("acme:migrated"));
    assert!(text.contains("<entry key=\"acme:source\">legacy</entry>"));
}

#[tokio::test]
async fn test_cancellation_stops_between_nodes_and_resumes() {
    let dir = TempDir::new().unwrap();
    let repo = InMemoryRepository::new();
    repo.insert(NodeSpec::folder("root", "Home")).unwrap();
    for i in 0..10 {
        repo.insert(
            NodeSpec::file(format!("f{i}"), format!("f{i}.txt"))
                .parent("root")
                .content(format!("file {i}").as_bytes()),
        )
        .unwrap();
    }
    let repo = Arc::new(repo);
    let scope = descent();

    let job = Arc::new(ExportJob::new("root"));
    let cancel = Arc::clone(&job);
    repo.on_content_read(3, move || cancel.request_cancel());

    let driver = ExportDriver::new(repo.clone(), ExportSettings::new(dir.path()), job);
    let report = driver.run(&scope).await;

    assert_eq!(report.status, RunStatus::Cancelled);
    assert_eq!(driver.state(), ExportState::Cancelled);
    assert_eq!(report.total_candidates, 11);
    // The folder plus the three files whose reads completed.
    assert_eq!(report.exported, 4);
    assert_eq!(journaled(dir.path(), &scope), ids(&["root", "f0", "f1", "f2"]));
    assert!(dir.path().join("Home/f2.txt").exists());
    assert!(!dir.path().join("Home/f3.txt").exists());

    let resumed = driver_for_resume(&repo, dir.path(), &scope).run(&scope).await;
    assert_eq!(resumed.status, RunStatus::Completed);
    assert_eq!(resumed.previously_completed, 4);
    assert_eq!(resumed.planned, 7);
    assert_eq!(resumed.exported, 7);
    assert_eq!(journaled(dir.path(), &scope).len(), 11);
    assert_eq!(repo.content_reads(), 10);
}

fn driver_for_resume(repo: &Arc<InMemoryRepository>, base: &Path, scope: &JobScope) -> ExportDriver {
    driver(repo, ExportSettings::new(base), scope)
}

#[tokio::test]
async fn test_finished_job_rerun_exports_nothing() {
    let dir = TempDir::new().unwrap();
    let repo = sample_repo();
    let scope = descent();

    driver(&repo, ExportSettings::new(dir.path()), &scope)
        .run(&scope)
        .await;
    let reads = repo.content_reads();

    let report = driver(&repo, ExportSettings::new(dir.path()), &scope)
        .run(&scope)
        .await;
    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.previously_completed, 4);
    assert_eq!(report.planned, 0);
    assert_eq!(report.exported, 0);
    assert_eq!(repo.content_reads(), reads);
}

#[tokio::test]
async fn test_node_cache_only_then_export() {
    let dir = TempDir::new().unwrap();
    let repo = sample_repo();
    let scope = descent();

    let mut settings = ExportSettings::new(dir.path());
    settings.use_node_cache = true;

    let driver_a = driver(&repo, settings.clone(), &scope);
    let report = driver_a.run(&scope).await;
    assert_eq!(report.status, RunStatus::CacheGenerated);
    assert_eq!(driver_a.state(), ExportState::CacheGeneratedStop);
    assert!(report.is_success());
    assert_eq!(report.total_candidates, 4);
    assert!(NodeListCache::new(dir.path())
        .path_for(&CacheKey::for_scope(&scope))
        .exists());
    assert!(!dir.path().join("Home").exists());
    assert_eq!(repo.content_reads(), 0);

    let report = driver(&repo, settings, &scope).run(&scope).await;
    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.exported, 4);
    assert!(dir.path().join("Home/b.txt").exists());
}

#[tokio::test]
async fn test_cached_list_is_used_instead_of_replanning() {
    let dir = TempDir::new().unwrap();
    let repo = sample_repo();
    let scope = descent();
    let key = CacheKey::for_scope(&scope);

    NodeListCache::new(dir.path())
        .put(&key, &ids(&["b"]))
        .unwrap();

    let report = driver(&repo, ExportSettings::new(dir.path()), &scope)
        .run(&scope)
        .await;
    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.total_candidates, 1);
    assert!(dir.path().join("Home/b.txt").exists());
    assert!(!dir.path().join("Home/A").exists());
}

#[tokio::test]
async fn test_all_revisions_are_exported() {
    let dir = TempDir::new().unwrap();
    let repo = InMemoryRepository::new();
    repo.insert(NodeSpec::folder("root", "Home")).unwrap();
    let doc = repo
        .insert(NodeSpec::file("doc", "report.txt").parent("root").content(b"live"))
        .unwrap();
    repo.add_revision(&doc, "1.0", "first", Some(b"one")).unwrap();
    repo.add_revision(&doc, "1.1", "second", Some(b"two")).unwrap();
    let repo = Arc::new(repo);
    let scope = descent();

    let mut settings = ExportSettings::new(dir.path());
    settings.export_versions = true;
    let report = driver(&repo, settings, &scope).run(&scope).await;
    assert_eq!(report.status, RunStatus::Completed);

    let home = dir.path().join("Home");
    assert_eq!(fs::read(home.join("report.txt.v1.0")).unwrap(), b"one");
    assert!(home.join("report.txt.metadata.properties.xml.v1.0").exists());
    // The head comes from the live node without a suffix.
    assert_eq!(fs::read(home.join("report.txt")).unwrap(), b"live");
    assert!(home.join("report.txt.metadata.properties.xml").exists());
    assert!(!home.join("report.txt.v1.1").exists());
}

#[tokio::test]
async fn test_numbered_head_revision() {
    let dir = TempDir::new().unwrap();
    let repo = InMemoryRepository::new();
    repo.insert(NodeSpec::folder("root", "Home")).unwrap();
    let doc = repo
        .insert(NodeSpec::file("doc", "report.txt").parent("root").content(b"live"))
        .unwrap();
    repo.add_revision(&doc, "1.0", "first", Some(b"one")).unwrap();
    repo.add_revision(&doc, "2.0", "second", Some(b"two")).unwrap();
    let repo = Arc::new(repo);
    let scope = descent();

    let mut settings = ExportSettings::new(dir.path());
    settings.export_versions = true;
    settings.revision_head = true;
    driver(&repo, settings, &scope).run(&scope).await;

    let home = dir.path().join("Home");
    assert_eq!(fs::read(home.join("report.txt.v1.0")).unwrap(), b"one");
    assert_eq!(fs::read(home.join("report.txt.v2.0")).unwrap(), b"live");
    assert!(home.join("report.txt.metadata.properties.xml.v2.0").exists());
    assert!(!home.join("report.txt").exists());
}

#[tokio::test]
async fn test_empty_history_fails_and_keeps_journal() {
    let dir = TempDir::new().unwrap();
    let repo = InMemoryRepository::new();
    repo.insert(NodeSpec::folder("root", "Home")).unwrap();
    repo.insert(NodeSpec::file("ok", "ok.txt").parent("root").content(b"ok"))
        .unwrap();
    let bad = repo
        .insert(NodeSpec::file("bad", "bad.txt").parent("root"))
        .unwrap();
    repo.set_empty_history(&bad).unwrap();
    let repo = Arc::new(repo);
    let scope = descent();

    let mut settings = ExportSettings::new(dir.path());
    settings.export_versions = true;
    let driver = driver(&repo, settings, &scope);
    let report = driver.run(&scope).await;

    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(driver.state(), ExportState::Failed);
    assert!(matches!(report.error, Some(BulkExportError::NoRevisions(ref n)) if n == "bad"));
    assert!(!report.is_success());
    assert_eq!(journaled(dir.path(), &scope), ids(&["root", "ok"]));
}

#[tokio::test]
async fn test_unreadable_content_writes_placeholder() {
    let dir = TempDir::new().unwrap();
    let repo = InMemoryRepository::new();
    repo.insert(NodeSpec::folder("root", "Home")).unwrap();
    repo.insert(
        NodeSpec::file("locked", "locked.bin")
            .parent("root")
            .content(b"secret")
            .unreadable(),
    )
    .unwrap();
    let repo = Arc::new(repo);
    let scope = descent();

    let report = driver(&repo, ExportSettings::new(dir.path()), &scope)
        .run(&scope)
        .await;
    assert_eq!(report.status, RunStatus::Completed);

    let placeholder = dir.path().join("Home/locked.bin");
    assert_eq!(fs::metadata(&placeholder).unwrap().len(), 0);
    assert!(dir
        .path()
        .join("Home/locked.bin.metadata.properties.xml")
        .exists());
    assert_eq!(journaled(dir.path(), &scope), ids(&["root", "locked"]));
}

#[tokio::test]
async fn test_absent_content_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let repo = InMemoryRepository::new();
    repo.insert(NodeSpec::folder("root", "Home")).unwrap();
    repo.insert(NodeSpec::file("empty", "empty.txt").parent("root").no_content())
        .unwrap();
    let repo = Arc::new(repo);
    let scope = descent();

    let report = driver(&repo, ExportSettings::new(dir.path()), &scope)
        .run(&scope)
        .await;
    assert_eq!(report.status, RunStatus::Completed);
    assert!(!dir.path().join("Home/empty.txt").exists());
    assert_eq!(journaled(dir.path(), &scope), ids(&["root", "empty"]));
}

#[tokio::test]
async fn test_skip_existing_keeps_content() {
    let dir = TempDir::new().unwrap();
    let repo = sample_repo();
    let scope = descent();
    fs::create_dir_all(dir.path().join("Home")).unwrap();
    fs::write(dir.path().join("Home/b.txt"), b"kept").unwrap();

    let mut settings = ExportSettings::new(dir.path());
    settings.skip_existing = true;
    let report = driver(&repo, settings, &scope).run(&scope).await;

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(fs::read(dir.path().join("Home/b.txt")).unwrap(), b"kept");
    assert!(dir.path().join("Home/b.txt.metadata.properties.xml").exists());
    assert_eq!(fs::read(dir.path().join("Home/A/c.txt")).unwrap(), b"sea");
}

#[tokio::test]
async fn test_skip_existing_pairs_revision_metadata_with_its_own_content() {
    let dir = TempDir::new().unwrap();
    let repo = InMemoryRepository::new();
    repo.insert(NodeSpec::folder("root", "Home")).unwrap();
    let doc = repo
        .insert(NodeSpec::file("doc", "report.txt").parent("root").content(b"live"))
        .unwrap();
    repo.add_revision(&doc, "1.0", "first", Some(b"one")).unwrap();
    repo.add_revision(&doc, "1.1", "second", Some(b"two")).unwrap();
    let repo = Arc::new(repo);
    let scope = descent();

    let home = dir.path().join("Home");
    fs::create_dir_all(&home).unwrap();
    fs::write(home.join("report.txt.v1.0"), b"old").unwrap();
    fs::write(home.join("report.txt.metadata.properties.xml.v1.0"), "kept").unwrap();

    let mut settings = ExportSettings::new(dir.path());
    settings.export_versions = true;
    settings.skip_existing = true;
    let report = driver(&repo, settings, &scope).run(&scope).await;

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(fs::read(home.join("report.txt.v1.0")).unwrap(), b"old");
    assert_eq!(
        fs::read_to_string(home.join("report.txt.metadata.properties.xml.v1.0")).unwrap(),
        "kept"
    );
    assert_eq!(fs::read(home.join("report.txt")).unwrap(), b"live");
    assert!(home.join("report.txt.metadata.properties.xml").exists());
}

#[tokio::test]
async fn test_repository_failure_aborts_run() {
    let dir = TempDir::new().unwrap();
    let repo = sample_repo();
    let scope = descent();

    // Planning reads the node type, so the failure is armed after the cache
    // exists.
    NodeListCache::new(dir.path())
        .put(&CacheKey::for_scope(&scope), &ids(&["root", "a", "c", "b"]))
        .unwrap();
    repo.fail_on(&id("c"));

    let report = driver(&repo, ExportSettings::new(dir.path()), &scope)
        .run(&scope)
        .await;
    assert_eq!(report.status, RunStatus::Failed);
    assert!(report.error.is_some());
    assert_eq!(journaled(dir.path(), &scope), ids(&["root", "a"]));
}

#[tokio::test]
async fn test_modified_scope_exports_matching_nodes_only() {
    let dir = TempDir::new().unwrap();
    let repo = InMemoryRepository::new();
    repo.insert(NodeSpec::folder("root", "Home")).unwrap();
    repo.insert(
        NodeSpec::file("old", "old.txt")
            .parent("root")
            .content(b"old")
            .modified(Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap()),
    )
    .unwrap();
    repo.insert(
        NodeSpec::file("new", "new.txt")
            .parent("root")
            .content(b"new")
            .modified(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
    )
    .unwrap();
    let repo = Arc::new(repo);

    let scope = JobScope::Modified {
        root: id("root"),
        path: "/Home".to_string(),
        range: DateRange::new(Some("2024-01-01".to_string()), None).unwrap(),
    };
    let report = driver(&repo, ExportSettings::new(dir.path()), &scope)
        .run(&scope)
        .await;

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.job_id, "2024-01-01");
    assert_eq!(report.cache_key.as_str(), "FROM-2024-01-01");
    assert_eq!(report.exported, 1);
    assert_eq!(fs::read(dir.path().join("Home/new.txt")).unwrap(), b"new");
    assert!(!dir.path().join("Home/old.txt").exists());
}

//! End-to-end folder runs against an in-memory host.

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{TimeZone, Utc};
use mailsort_core::{
    CancelFlag, Category, CategoryRepository, CategorySet, CategoryStore, Error, FolderRun,
    HostError, MailHost, MailMessage, MemoryReporter, Severity, WeightConfig,
};

#[derive(Default)]
struct InMemoryHost {
    folders: HashMap<String, Vec<MailMessage>>,
    bodies: HashMap<String, String>,
    broken_listing: Option<String>,
    reject_apply: Vec<String>,
    cancel_after_body: Option<(String, CancelFlag)>,
    applied: Mutex<Vec<(String, String, f64)>>,
}

impl InMemoryHost {
    fn add(&mut self, folder: &str, id: &str, subject: &str, body: Option<&str>) {
        self.folders
            .entry(folder.to_string())
            .or_default()
            .push(MailMessage::new(id, subject));
        if let Some(body) = body {
            self.bodies.insert(id.to_string(), body.to_string());
        }
    }

    fn applied(&self) -> Vec<(String, String, f64)> {
        self.applied.lock().unwrap().clone()
    }
}

impl MailHost for InMemoryHost {
    async fn list_messages(&self, folder: &str) -> Result<Vec<MailMessage>, HostError> {
        if self.broken_listing.as_deref() == Some(folder) {
            return Err(HostError::Operation("connection reset".to_string()));
        }
        self.folders
            .get(folder)
            .cloned()
            .ok_or_else(|| HostError::FolderNotFound(folder.to_string()))
    }

    async fn plain_text_body(&self, message: &MailMessage) -> Result<String, HostError> {
        if let Some((id, flag)) = &self.cancel_after_body
            && id == message.id.as_str()
        {
            flag.cancel();
        }
        self.bodies
            .get(message.id.as_str())
            .cloned()
            .ok_or_else(|| HostError::MessageNotFound(message.id.to_string()))
    }

    async fn apply_category(
        &self,
        message: &MailMessage,
        category: &str,
        score: f64,
    ) -> Result<(), HostError> {
        if self.reject_apply.iter().any(|id| id == message.id.as_str()) {
            return Err(HostError::Operation("message is locked".to_string()));
        }
        self.applied
            .lock()
            .unwrap()
            .push((message.id.to_string(), category.to_string(), score));
        Ok(())
    }
}

struct FixedStore(CategorySet);

impl CategoryStore for FixedStore {
    async fn get_all(&self) -> Result<CategorySet, HostError> {
        Ok(self.0.clone())
    }
}

struct BrokenStore;

impl CategoryStore for BrokenStore {
    async fn get_all(&self) -> Result<CategorySet, HostError> {
        Err(HostError::Operation("store offline".to_string()))
    }
}

fn categories() -> FixedStore {
    FixedStore(
        [
            Category::new("Finance", ["invoice", "payment"]),
            Category::new("Travel", ["flight", "hotel"]),
            Category::new("Work", ["standup", "release"]),
        ]
        .into_iter()
        .collect(),
    )
}

fn inbox() -> InMemoryHost {
    let mut host = InMemoryHost::default();
    host.add(
        "Inbox",
        "1",
        "Invoice #2024-17",
        Some("Please find the invoice attached. Payment due in 30 days."),
    );
    host.add(
        "Inbox",
        "2",
        "Re: Trip",
        Some(
            "Booked the hotel.\n\n\
             From: Dana\n\
             Sent: 5/28/2024 9:00 AM\n\
             Subject: Trip\n\n\
             Can you book the flight and a hotel?",
        ),
    );
    host.add("Inbox", "3", "Lunch?", Some("Are you free at noon?"));
    host.add("Inbox", "4", "Standup notes", None);
    host
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

#[tokio::test]
async fn classifies_whole_folder() {
    let host = inbox();
    let store = categories();
    let reporter = MemoryReporter::new();

    let summary = FolderRun::new(&host, &store, &reporter, WeightConfig::default())
        .with_now(now())
        .run("Inbox")
        .await
        .unwrap();

    assert_eq!(summary.total, 4);
    assert_eq!(summary.processed, 4);
    // 1 -> Finance (subject), 4 -> Work (subject); 2 scores 1.5 + 1 + 1 for Travel
    assert_eq!(summary.categorized, 2);
    assert_eq!(summary.body_failures, 1);
    assert_eq!(summary.apply_failures, 0);
    assert!(!summary.cancelled);

    let applied: Vec<(String, String)> = host
        .applied()
        .into_iter()
        .map(|(id, category, _)| (id, category))
        .collect();
    assert_eq!(
        applied,
        [
            ("1".to_string(), "Finance".to_string()),
            ("4".to_string(), "Work".to_string())
        ]
    );

    let success = reporter.events_with(Severity::Success);
    assert_eq!(
        success.last().unwrap().message,
        "Processed 4 message(s), categorized 2"
    );
}

#[tokio::test]
async fn lower_threshold_categorizes_thread_by_recency() {
    let host = inbox();
    let store = categories();
    let reporter = MemoryReporter::new();
    let weights = WeightConfig {
        score_threshold: 3.0,
        ..WeightConfig::default()
    };

    let summary = FolderRun::new(&host, &store, &reporter, weights)
        .with_now(now())
        .run("Inbox")
        .await
        .unwrap();

    assert_eq!(summary.categorized, 3);
    let thread = host
        .applied()
        .into_iter()
        .find(|(id, _, _)| id == "2")
        .unwrap();
    // newest "hotel" x1.5, quoted "flight" + "hotel" x1
    assert_eq!(thread.1, "Travel");
    assert_eq!(thread.2, 3.5);
}

#[tokio::test]
async fn apply_failure_does_not_stop_the_run() {
    let mut host = inbox();
    host.reject_apply.push("1".to_string());
    let store = categories();
    let reporter = MemoryReporter::new();

    let summary = FolderRun::new(&host, &store, &reporter, WeightConfig::default())
        .with_now(now())
        .run("Inbox")
        .await
        .unwrap();

    assert_eq!(summary.processed, 4);
    assert_eq!(summary.categorized, 1);
    assert_eq!(summary.apply_failures, 1);
    assert!(
        reporter
            .events_with(Severity::Error)
            .iter()
            .any(|e| e.message.contains("Failed to apply 'Finance'"))
    );
}

#[tokio::test]
async fn missing_folder_aborts() {
    let host = inbox();
    let store = categories();
    let reporter = MemoryReporter::new();

    let result = FolderRun::new(&host, &store, &reporter, WeightConfig::default())
        .run("Archive")
        .await;

    assert!(matches!(result, Err(Error::FolderLoad { ref folder, .. }) if folder == "Archive"));
    assert!(host.applied().is_empty());
    assert!(reporter.events_with(Severity::Success).is_empty());
}

#[tokio::test]
async fn listing_failure_aborts() {
    let mut host = inbox();
    host.broken_listing = Some("Inbox".to_string());
    let store = categories();
    let reporter = MemoryReporter::new();

    let result = FolderRun::new(&host, &store, &reporter, WeightConfig::default())
        .run("Inbox")
        .await;

    assert!(matches!(result, Err(Error::MessageList { .. })));
    assert_eq!(reporter.events_with(Severity::Error).len(), 1);
}

#[tokio::test]
async fn category_store_failure_aborts() {
    let host = inbox();
    let reporter = MemoryReporter::new();

    let result = FolderRun::new(&host, &BrokenStore, &reporter, WeightConfig::default())
        .run("Inbox")
        .await;

    assert!(matches!(result, Err(Error::CategoryStore(_))));
}

#[tokio::test]
async fn empty_category_set_applies_nothing() {
    let host = inbox();
    let store = FixedStore(CategorySet::new());
    let reporter = MemoryReporter::new();

    let summary = FolderRun::new(&host, &store, &reporter, WeightConfig::default())
        .run("Inbox")
        .await
        .unwrap();

    assert_eq!(summary.processed, 4);
    assert_eq!(summary.categorized, 0);
    assert!(host.applied().is_empty());
}

#[tokio::test]
async fn cancellation_stops_between_messages() {
    let cancel = CancelFlag::new();
    let mut host = inbox();
    host.cancel_after_body = Some(("2".to_string(), cancel.clone()));
    let store = categories();
    let reporter = MemoryReporter::new();

    let summary = FolderRun::new(&host, &store, &reporter, WeightConfig::default())
        .with_cancel(cancel)
        .with_now(now())
        .run("Inbox")
        .await
        .unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.categorized, 1);
}

#[tokio::test]
async fn runs_against_sqlite_categories() {
    let repo = CategoryRepository::in_memory().await.unwrap();
    repo.save(&Category::new("Travel", ["flight", "hotel"]))
        .await
        .unwrap();
    repo.save(&Category::new("Finance", ["invoice"]))
        .await
        .unwrap();

    let host = inbox();
    let reporter = MemoryReporter::new();

    let summary = FolderRun::new(&host, &repo, &reporter, WeightConfig::default())
        .with_now(now())
        .run("Inbox")
        .await
        .unwrap();

    assert_eq!(summary.categorized, 1);
    assert_eq!(host.applied()[0].1, "Finance");
}

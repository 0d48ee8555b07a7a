//! Command handlers.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use mailsort_core::{
    CancelFlag, Category, CategoryRepository, Decision, FolderRun, MaildirHost, MessageText,
    ScoreResult, ScoringEngine, ThreadSegmenter, TracingReporter, WeightConfig, decide,
};
use tracing::{info, warn};

use crate::cli::CategoryAction;

/// Open the category database, creating its directory if needed.
pub async fn open_repository(path: &Path) -> Result<CategoryRepository> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    CategoryRepository::new(&path.to_string_lossy())
        .await
        .with_context(|| format!("Failed to open database {}", path.display()))
}

/// Classify a folder. Ctrl-C stops the run after the current message.
pub async fn run(
    repository: CategoryRepository,
    root: PathBuf,
    folder: &str,
    weights: WeightConfig,
) -> Result<()> {
    let host = MaildirHost::new(root, repository.clone());
    let reporter = TracingReporter;

    let cancel = CancelFlag::new();
    let flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current message");
            flag.cancel();
        }
    });

    info!(root = %host.root().display(), folder, "Starting run");
    let summary = FolderRun::new(&host, &repository, &reporter, weights)
        .with_cancel(cancel)
        .run(folder)
        .await?;

    println!(
        "{}: {} of {} message(s) processed, {} categorized",
        summary.folder, summary.processed, summary.total, summary.categorized
    );
    if summary.apply_failures > 0 {
        println!("  {} category update(s) failed", summary.apply_failures);
    }
    if summary.body_failures > 0 {
        println!(
            "  {} message(s) scored on subject only",
            summary.body_failures
        );
    }
    if summary.cancelled {
        println!("  run cancelled");
    }
    Ok(())
}

/// Score one message file against every category and print the breakdown.
pub async fn score(repository: &CategoryRepository, file: &Path, weights: WeightConfig) -> Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let raw = String::from_utf8_lossy(&bytes);
    let message = mailsort_mime::Message::parse(&raw)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    let subject = message.subject_decoded().unwrap_or_default();
    let body = match message.plain_text() {
        Ok(body) => body,
        Err(e) => {
            warn!("No usable body, scoring subject only: {e}");
            String::new()
        }
    };

    let segments = ThreadSegmenter::new(Utc::now()).segment(&body);
    let text = MessageText::new(&subject, &segments);
    let engine = ScoringEngine::new(weights);
    let categories = repository.categories().await?;

    println!("Subject:  {subject}");
    println!("Segments: {}", segments.len());
    for (i, segment) in segments.iter().enumerate() {
        println!(
            "  [{i}] {}{} weight {:.3}",
            segment.timestamp.format("%Y-%m-%d %H:%M"),
            if segment.inferred { " (inferred)" } else { "" },
            engine.recency_weight(i, segments.len())
        );
    }
    println!();

    let mut scores = ScoreResult::new();
    for category in &categories {
        let breakdown = engine.breakdown(&text, category.keywords());
        println!(
            "{:<20} {:>8.2}  (subject {:.2}, body {:.2})",
            category.name(),
            breakdown.total(),
            breakdown.subject_score,
            breakdown.body_score
        );
        scores.add(category.name(), breakdown.total());
    }

    match decide(&scores, weights.score_threshold) {
        Decision::Apply { category, score } => println!(
            "\nWould apply '{category}' ({score:.2} >= {})",
            weights.score_threshold
        ),
        Decision::BelowThreshold { best: Some((category, score)) } => println!(
            "\nNo category: best '{category}' scored {score:.2}, below {}",
            weights.score_threshold
        ),
        Decision::BelowThreshold { best: None } => println!("\nNo category: no keyword matched"),
    }
    Ok(())
}

/// Manage category definitions.
pub async fn category(repository: &CategoryRepository, action: CategoryAction) -> Result<()> {
    match action {
        CategoryAction::List => {
            let categories = repository.categories().await?;
            if categories.is_empty() {
                println!("No categories defined");
            }
            for category in &categories {
                println!("{}: {}", category.name(), category.keywords().join(", "));
            }
        }
        CategoryAction::Add { name, keywords } => {
            let category = Category::new(name, keywords);
            if category.keywords().is_empty() {
                bail!("Category '{}' needs at least one non-blank keyword", category.name());
            }
            repository.save(&category).await?;
            println!(
                "Saved '{}' with {} keyword(s)",
                category.name(),
                category.keywords().len()
            );
        }
        CategoryAction::Remove { name } => {
            if !repository.delete(&name).await? {
                bail!("No category named '{name}'");
            }
            println!("Removed '{name}'");
        }
        CategoryAction::Show { name } => {
            let categories = repository.categories().await?;
            let Some(category) = categories.get(&name) else {
                bail!("No category named '{name}'");
            };
            println!("{}: {}", category.name(), category.keywords().join(", "));

            let assignments = repository.assignments_for(&name).await?;
            println!("{} message(s) assigned", assignments.len());
            for assignment in assignments {
                println!(
                    "  {}  {:>8.2}  {}",
                    assignment.assigned_at.format("%Y-%m-%d %H:%M"),
                    assignment.score,
                    assignment.message_id
                );
            }
        }
    }
    Ok(())
}

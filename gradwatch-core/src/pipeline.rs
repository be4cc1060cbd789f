//! High-level flows: publish new regional postings, and refresh stored ages.
//!
//! Both flows share [`collect_postings`] (fetch → slice sections → extract rows).
//!
//! # Publish
//! Every extracted posting is [`screen`]ed against the ledger, the title
//! disqualifiers and the region matcher. Eligible postings are created in the
//! [`RecordStore`], announced through the [`Notifier`] and added to the ledger.
//! The ledger is written back exactly once, after all publish attempts,
//! whether or not one of them failed.
//!
//! # Refresh
//! Every stored record is matched by its source link against the current rows
//! and its age field overwritten with the freshly computed `age_days`.
//! Unmatched records are counted, not escalated.
//!
//! # Error Handling
//! Document fetch, record creation and record query failures abort the flow
//! with a [`HarvestError`]. Notification failures are logged and dropped.
//! A failed age update is logged and counted in [`RefreshReport::errors`].

use std::collections::HashMap;

use tracing::{debug, error, info, warn};

use crate::config::HarvestConfig;
use crate::contract::{fetch_all_records, DocumentSource, NewRecord, Notifier, RecordStore};
use crate::error::HarvestError;
use crate::ledger::Ledger;
use crate::location::RegionMatcher;
use crate::posting::Posting;
use crate::sections::slice_sections;
use crate::table::extract_postings;

/// Outcome of screening one posting for publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screening {
    /// No link in the apply cell.
    Untrackable,
    /// The url is already in the ledger.
    AlreadySeen,
    /// The title carries a degree-program marker.
    Disqualified,
    /// The location does not match the region.
    OutOfRegion,
    Eligible(NewRecord),
}

/// Decide whether `posting` should be published. Checks run in the order of
/// the [`Screening`] variants and the first failing check wins.
pub fn screen(posting: &Posting, ledger: &Ledger, region: &RegionMatcher) -> Screening {
    let Some(record) = NewRecord::from_posting(posting) else {
        return Screening::Untrackable;
    };
    if ledger.contains(&record.url) {
        return Screening::AlreadySeen;
    }
    if posting.is_disqualified() {
        return Screening::Disqualified;
    }
    if !region.is_regional(&posting.location) {
        return Screening::OutOfRegion;
    }
    Screening::Eligible(record)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub rows_checked: usize,
    pub added: usize,
    pub untrackable: usize,
    pub already_seen: usize,
    pub disqualified: usize,
    pub out_of_region: usize,
}

impl PublishReport {
    pub fn summary(&self, region_label: &str) -> String {
        format!(
            "Checked {} rows, added {} {region_label} items ({} already seen, {} out of region, {} disqualified, {} without link).",
            self.rows_checked,
            self.added,
            self.already_seen,
            self.out_of_region,
            self.disqualified,
            self.untrackable,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub records: usize,
    pub updated: usize,
    pub not_found: usize,
    pub errors: usize,
}

impl RefreshReport {
    pub fn summary(&self) -> String {
        format!(
            "Refreshed ages for {} records: {} updated, {} not found, {} errors.",
            self.records, self.updated, self.not_found, self.errors
        )
    }
}

/// Fetch the source document and extract every row of the configured sections.
pub async fn collect_postings<D>(
    source: &D,
    config: &HarvestConfig,
) -> Result<Vec<Posting>, HarvestError>
where
    D: DocumentSource + ?Sized,
{
    info!("[HARVEST] Fetching source document");
    let document = source.fetch_document().await.map_err(|e| {
        error!(error = ?e, "[HARVEST][ERROR] Document fetch failed");
        HarvestError::Fetch(e)
    })?;

    let subset = slice_sections(&document, &config.sections);
    if subset.is_empty() {
        warn!(
            markers = ?config.sections,
            "[HARVEST] None of the section markers were found in the document"
        );
    }
    let postings = extract_postings(&subset, &config.columns);
    info!(
        document_bytes = document.len(),
        rows = postings.len(),
        "[HARVEST] Extracted postings"
    );
    Ok(postings)
}

/// Publish flow with ledger persistence: load the ledger, publish, then save
/// the ledger unconditionally.
pub async fn publish<D, S, N>(
    source: &D,
    store: &S,
    notifier: &N,
    config: &HarvestConfig,
) -> Result<PublishReport, HarvestError>
where
    D: DocumentSource + ?Sized,
    S: RecordStore + ?Sized,
    N: Notifier + ?Sized,
{
    let mut ledger = Ledger::load(&config.ledger_path)?;
    let outcome = publish_with_ledger(source, store, notifier, config, &mut ledger).await;
    let saved = ledger.save(&config.ledger_path);

    match (outcome, saved) {
        (Ok(report), Ok(())) => {
            info!(entries = ledger.len(), "[PUBLISH] Ledger persisted");
            Ok(report)
        }
        (Ok(_), Err(e)) => {
            error!(error = %e, "[PUBLISH][ERROR] Failed to persist ledger");
            Err(e.into())
        }
        (Err(e), saved) => {
            if let Err(save_err) = saved {
                error!(error = %save_err, "[PUBLISH][ERROR] Failed to persist ledger after failed run");
            }
            Err(e)
        }
    }
}

/// Publish flow against an in-memory ledger. Urls of published postings are
/// added to `ledger` as they are created, so on error it reflects everything
/// published so far.
pub async fn publish_with_ledger<D, S, N>(
    source: &D,
    store: &S,
    notifier: &N,
    config: &HarvestConfig,
    ledger: &mut Ledger,
) -> Result<PublishReport, HarvestError>
where
    D: DocumentSource + ?Sized,
    S: RecordStore + ?Sized,
    N: Notifier + ?Sized,
{
    info!(ledger_entries = ledger.len(), "[PUBLISH] Starting publish flow");
    let postings = collect_postings(source, config).await?;
    let mut report = PublishReport {
        rows_checked: postings.len(),
        ..PublishReport::default()
    };

    for posting in &postings {
        let record = match screen(posting, ledger, &config.region) {
            Screening::Eligible(record) => record,
            Screening::Untrackable => {
                debug!(company = %posting.company, title = %posting.title, "[PUBLISH] Skipping row without link");
                report.untrackable += 1;
                continue;
            }
            Screening::AlreadySeen => {
                report.already_seen += 1;
                continue;
            }
            Screening::Disqualified => {
                debug!(title = %posting.title, "[PUBLISH] Skipping disqualified title");
                report.disqualified += 1;
                continue;
            }
            Screening::OutOfRegion => {
                debug!(location = %posting.location, "[PUBLISH] Skipping out-of-region posting");
                report.out_of_region += 1;
                continue;
            }
        };

        let url = record.url.clone();
        info!(url = %url, title = %record.title, "[PUBLISH] Creating record");
        let created = store.create_record(record).await.map_err(|source| {
            error!(url = %url, error = ?source, "[PUBLISH][ERROR] create_record failed");
            HarvestError::Create {
                url: url.clone(),
                source,
            }
        })?;
        debug!(record_id = %created.id, "[PUBLISH] create_record succeeded");

        let text = posting.notification_text(&config.region_label);
        if let Err(e) = notifier.notify(&text).await {
            warn!(url = %url, error = ?e, "[PUBLISH] Notification failed, continuing");
        }

        ledger.insert(url);
        report.added += 1;
    }

    info!(
        rows_checked = report.rows_checked,
        added = report.added,
        "[PUBLISH] Publish flow complete"
    );
    Ok(report)
}

/// Age-refresh flow: overwrite every stored record's age with the value
/// computed from the current document.
pub async fn refresh_ages<D, S>(
    source: &D,
    store: &S,
    config: &HarvestConfig,
) -> Result<RefreshReport, HarvestError>
where
    D: DocumentSource + ?Sized,
    S: RecordStore + ?Sized,
{
    info!("[REFRESH] Fetching existing records");
    let records = fetch_all_records(store).await.map_err(|e| {
        error!(error = ?e, "[REFRESH][ERROR] Record query failed");
        HarvestError::Query(e)
    })?;

    let postings = collect_postings(source, config).await?;
    let ages = ages_by_url(&postings);

    let mut report = RefreshReport {
        records: records.len(),
        ..RefreshReport::default()
    };

    for record in &records {
        let link = record.source_link.as_deref().filter(|l| !l.is_empty());
        let Some(age) = link.and_then(|l| ages.get(l)) else {
            warn!(record_id = %record.id, link = ?link, "[REFRESH] No current row for record");
            report.not_found += 1;
            continue;
        };

        match store.update_age(&record.id, age).await {
            Ok(()) => {
                debug!(record_id = %record.id, age, "[REFRESH] Age updated");
                report.updated += 1;
            }
            Err(e) => {
                error!(record_id = %record.id, error = ?e, "[REFRESH][ERROR] update_age failed");
                report.errors += 1;
            }
        }
    }

    info!(
        updated = report.updated,
        not_found = report.not_found,
        errors = report.errors,
        "[REFRESH] Age refresh complete"
    );
    Ok(report)
}

/// Map each url to its canonical age. The first row wins for duplicated urls.
fn ages_by_url(postings: &[Posting]) -> HashMap<&str, &str> {
    let mut ages = HashMap::with_capacity(postings.len());
    for posting in postings {
        if let Some(url) = posting.url.as_deref() {
            ages.entry(url).or_insert(posting.age_days.as_str());
        }
    }
    ages
}

//! Sync and maintenance command handlers.
//!
//! Per-receipt failures are logged and skipped rather than propagated, so a
//! single bad ticket does not abort the full run. An expired session does
//! abort, since every remaining request would fail the same way.

use std::collections::HashSet;
use std::time::Duration;

use kassenbon_client::{
    load_cookie_header, normalize_purchase_date, ClientError, PortalClient, StoreField,
    TicketSummary,
};
use kassenbon_core::AppConfig;
use kassenbon_parser::parse_receipt;
use kassenbon_store::{ReceiptStore, UpsertOutcome};

/// Domain substring used to pick the portal's cookies out of the export.
const COOKIE_DOMAIN_FILTER: &str = "lidl";

/// Fetches receipts from the portal and merges them into the dataset.
///
/// With `refresh_existing` false this is a full backfill: every listing
/// page is walked and only tickets missing from the dataset are fetched.
/// With it true the first `pages_to_check` pages are re-fetched and
/// re-parsed (after a parser change, say). `dry_run` prints the pending ids
/// and exits.
///
/// # Errors
///
/// Returns an error when the configuration, cookie file, listing request,
/// or final dataset write fails, and on an expired portal session.
pub(crate) async fn run_sync(
    config: &AppConfig,
    refresh_existing: bool,
    dry_run: bool,
) -> anyhow::Result<()> {
    let cookie_header = load_cookie_header(&config.cookies_path, COOKIE_DOMAIN_FILTER)?;
    let client = PortalClient::new(config, cookie_header)?;
    let mut store = ReceiptStore::load(&config.receipts_path)?;
    let existing = store.existing_ids();

    let page_budget = if refresh_existing {
        config.pages_to_check
    } else {
        0
    };
    let summaries = client.list_ticket_summaries(page_budget).await?;
    let pending = select_pending(summaries, &existing, refresh_existing);

    if dry_run {
        let ids: Vec<&str> = pending.iter().map(|s| s.id.as_str()).collect();
        println!(
            "dry-run: would fetch {} receipts: [{}]",
            pending.len(),
            ids.join(", ")
        );
        return Ok(());
    }
    if pending.is_empty() {
        println!("dataset is up to date ({} receipts)", store.len());
        return Ok(());
    }

    let mut added = 0usize;
    let mut updated = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;

    for (i, summary) in pending.iter().enumerate() {
        if i > 0 && config.request_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(config.request_delay_ms)).await;
        }

        let (detail, html) = match client.fetch_receipt_html(&summary.id).await {
            Ok(fetched) => fetched,
            Err(err @ ClientError::Unauthorized { .. }) => return Err(err.into()),
            Err(ClientError::MissingReceiptHtml { .. }) => {
                tracing::debug!(ticket_id = %summary.id, "no printed receipt, skipping");
                skipped += 1;
                continue;
            }
            Err(err) => {
                tracing::warn!(ticket_id = %summary.id, error = %err, "fetch failed, skipping");
                failed += 1;
                continue;
            }
        };

        let raw_date = detail
            .date
            .or_else(|| summary.date.clone())
            .unwrap_or_default();
        let purchase_date = normalize_purchase_date(&raw_date);
        let store_name = detail
            .store
            .as_ref()
            .or(summary.store.as_ref())
            .map(StoreField::display)
            .unwrap_or_default();

        let receipt = parse_receipt(&html, &summary.id, &purchase_date, &store_name);
        if receipt.is_empty() {
            tracing::warn!(ticket_id = %summary.id, "nothing extractable in receipt, skipping");
            skipped += 1;
            continue;
        }
        match store.upsert(receipt) {
            UpsertOutcome::Added => added += 1,
            UpsertOutcome::Updated => updated += 1,
        }
    }

    store.sort_by_date_desc();
    store.save()?;
    println!(
        "sync done: {added} added, {updated} updated, {skipped} skipped, {failed} failed ({} total in {})",
        store.len(),
        store.path().display()
    );
    Ok(())
}

/// Picks the tickets worth fetching: only entries explicitly flagged as
/// having a printed HTML receipt are eligible (a missing flag means a
/// legacy record with nothing to parse), and already-stored tickets are
/// skipped unless the run refreshes existing records.
fn select_pending(
    summaries: Vec<TicketSummary>,
    existing: &HashSet<String>,
    refresh_existing: bool,
) -> Vec<TicketSummary> {
    summaries
        .into_iter()
        .filter(|s| {
            if s.is_html != Some(true) {
                tracing::debug!(ticket_id = %s.id, "skipping ticket without a printed HTML receipt");
                return false;
            }
            refresh_existing || !existing.contains(&s.id)
        })
        .collect()
}

/// Re-sorts the dataset newest first and writes it back.
pub(crate) fn run_sort(config: &AppConfig) -> anyhow::Result<()> {
    let mut store = ReceiptStore::load(&config.receipts_path)?;
    store.sort_by_date_desc();
    store.save()?;
    println!("sorted {} receipts in {}", store.len(), store.path().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str, is_html: Option<bool>) -> TicketSummary {
        TicketSummary {
            id: id.to_string(),
            date: None,
            is_html,
            store: None,
        }
    }

    #[test]
    fn skips_entries_without_the_html_flag() {
        let summaries = vec![
            summary("with-html", Some(true)),
            summary("legacy", Some(false)),
            summary("unflagged", None),
        ];
        let pending = select_pending(summaries, &HashSet::new(), false);
        let ids: Vec<&str> = pending.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["with-html"]);
    }

    #[test]
    fn skips_already_stored_tickets() {
        let summaries = vec![summary("old", Some(true)), summary("new", Some(true))];
        let existing: HashSet<String> = ["old".to_string()].into_iter().collect();
        let pending = select_pending(summaries, &existing, false);
        let ids: Vec<&str> = pending.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["new"]);
    }

    #[test]
    fn refresh_keeps_already_stored_tickets() {
        let summaries = vec![summary("old", Some(true)), summary("new", Some(true))];
        let existing: HashSet<String> = ["old".to_string()].into_iter().collect();
        let pending = select_pending(summaries, &existing, true);
        assert_eq!(pending.len(), 2);
    }
}

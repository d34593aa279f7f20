//! # Reminder Dispatcher
//!
//! Sends due reminders through the notification gateway and marks them sent.
//! A sweep isolates per-reminder failures; a single-item send reports them.
//!
//! Before the gateway is called the reminder is claimed in the store
//! (`delivering_since`), a compare-and-swap write that only one sweep or
//! manual send can win. The claim is cleared when the outcome is persisted.
//! If that last write fails the claim stays behind, so no later run sends the
//! reminder again: this process retries the bookkeeping from its own ledger,
//! and a claim older than the send timeout left by an earlier run is settled
//! as delivered.
//!
//! - **Version**: 1.3.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.3.0: Persisted delivery claims, settled across processes
//! - 1.2.0: Ledger for delivered-but-unrecorded reminders, `sent_at`
//! - 1.1.0: Bounded timeout per gateway call
//! - 1.0.0: Batch sweep and single-item send

use crate::core::{PendingReminder, PotluckError, PotluckResult};
use crate::database::{keys, BlobStore, Collection};
use crate::features::notifications::{send_with_timeout, NotificationGateway};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

pub fn compose_message(guest_name: &str, base_url: &str) -> String {
    format!(
        "Hey {guest_name}! Just a friendly reminder to pick what you're bringing to the potluck. \
         Check out the options here: {base_url}/rsvp"
    )
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepReport {
    pub processed: usize,
    pub sent: usize,
    pub failed: usize,
    /// Claimed reminders whose delivery outcome is not yet persisted
    pub unrecorded: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    /// Delivered, but marking it sent failed; held in the ledger
    DeliveredUnrecorded,
}

impl SendOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, SendOutcome::Delivered)
    }
}

/// Outcome this process knows but could not write back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settlement {
    Delivered(DateTime<Utc>),
    Undelivered,
}

#[derive(Clone)]
pub struct ReminderDispatcher {
    reminders: Collection<PendingReminder>,
    gateway: Arc<dyn NotificationGateway>,
    base_url: String,
    send_timeout: Duration,
    ledger: Arc<DashMap<String, Settlement>>,
}

impl ReminderDispatcher {
    pub fn new(
        store: Arc<dyn BlobStore>,
        gateway: Arc<dyn NotificationGateway>,
        base_url: &str,
        send_timeout: Duration,
    ) -> Self {
        Self {
            reminders: Collection::new(store, keys::PENDING_REMINDERS),
            gateway,
            base_url: base_url.trim_end_matches('/').to_string(),
            send_timeout,
            ledger: Arc::new(DashMap::new()),
        }
    }

    fn ensure_configured(&self) -> PotluckResult<()> {
        if self.gateway.is_configured() {
            Ok(())
        } else {
            Err(PotluckError::configuration("SMS service not configured"))
        }
    }

    /// Age after which a foreign claim can no longer have a gateway call in flight
    fn claim_expiry(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.send_timeout).unwrap_or_else(|_| chrono::Duration::minutes(1))
            + chrono::Duration::minutes(1)
    }

    pub async fn sweep(&self) -> PotluckResult<SweepReport> {
        self.sweep_at(Utc::now()).await
    }

    /// Send every reminder that is unsent, unclaimed and due at `now`
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> PotluckResult<SweepReport> {
        self.ensure_configured()?;
        self.reconcile(now).await;

        let due: Vec<PendingReminder> = self
            .reminders
            .list()
            .await?
            .into_iter()
            .filter(|r| r.is_due(now) && r.delivering_since.is_none())
            .collect();

        let mut report = SweepReport::default();

        for reminder in &due {
            match self.claim(&reminder.id).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!("Reminder {} was claimed elsewhere, skipping", reminder.id);
                    continue;
                }
                Err(e) => {
                    report.processed += 1;
                    report.failed += 1;
                    warn!("Could not claim reminder {} for {}: {:#}", reminder.id, reminder.guest_name, e);
                    continue;
                }
            }

            report.processed += 1;
            let body = compose_message(&reminder.guest_name, &self.base_url);
            match send_with_timeout(self.gateway.as_ref(), &reminder.phone_number, &body, self.send_timeout).await {
                Ok(_) => {
                    report.sent += 1;
                    self.record_sent(reminder).await;
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        "Failed to send reminder to {} ({}): {}",
                        reminder.guest_name, reminder.phone_number, e
                    );
                    self.release(&reminder.id).await;
                }
            }
        }

        report.unrecorded = self.in_doubt().await;

        info!(
            "Reminder sweep: {} processed, {} sent, {} failed, {} unrecorded",
            report.processed,
            report.sent,
            report.failed,
            report.unrecorded.len()
        );
        Ok(report)
    }

    /// Send one reminder now, regardless of its scheduled time
    pub async fn send_now(&self, id: &str) -> PotluckResult<SendOutcome> {
        self.ensure_configured()?;

        let reminder = self
            .reminders
            .find(id)
            .await?
            .ok_or(PotluckError::NotFound("Reminder"))?;

        if reminder.sent || reminder.delivering_since.is_some() || !self.claim(id).await? {
            return Err(PotluckError::AlreadySent);
        }

        let body = compose_message(&reminder.guest_name, &self.base_url);
        if let Err(e) = send_with_timeout(self.gateway.as_ref(), &reminder.phone_number, &body, self.send_timeout).await {
            error!(
                "Manual reminder to {} ({}) failed: {}",
                reminder.guest_name, reminder.phone_number, e
            );
            self.release(id).await;
            return Err(PotluckError::Delivery(e.to_string()));
        }

        if self.record_sent(&reminder).await {
            info!("Reminder {} sent to {}", reminder.id, reminder.guest_name);
            Ok(SendOutcome::Delivered)
        } else {
            Ok(SendOutcome::DeliveredUnrecorded)
        }
    }

    /// Ids this process delivered or released without persisting the result
    pub fn unrecorded(&self) -> Vec<String> {
        self.ledger.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Write the delivery claim; false when already sent or claimed by someone else
    async fn claim(&self, id: &str) -> anyhow::Result<bool> {
        let claimed_at = Utc::now();
        let mut taken = false;
        let updated = self
            .reminders
            .update_item(id, |r| {
                taken = r.sent || r.delivering_since.is_some();
                if !taken {
                    r.delivering_since = Some(claimed_at);
                }
            })
            .await?;
        Ok(updated.is_some() && !taken)
    }

    /// Mark a delivered reminder; on failure park it in the ledger
    async fn record_sent(&self, reminder: &PendingReminder) -> bool {
        let sent_at = Utc::now();
        match self.mark_sent(&reminder.id, sent_at).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "Reminder {} delivered to {} ({}) but could not be marked sent: {:#}",
                    reminder.id, reminder.guest_name, reminder.phone_number, e
                );
                self.ledger.insert(reminder.id.clone(), Settlement::Delivered(sent_at));
                false
            }
        }
    }

    /// Drop the claim after a failed send so a later sweep retries it
    async fn release(&self, id: &str) {
        if let Err(e) = self.clear_claim(id).await {
            warn!("Reminder {id} could not be released for retry: {e:#}");
            self.ledger.insert(id.to_string(), Settlement::Undelivered);
        }
    }

    async fn mark_sent(&self, id: &str, sent_at: DateTime<Utc>) -> anyhow::Result<()> {
        self.reminders
            .update_item(id, |r| {
                r.sent = true;
                r.sent_at.get_or_insert(sent_at);
                r.delivering_since = None;
            })
            .await?;
        Ok(())
    }

    async fn clear_claim(&self, id: &str) -> anyhow::Result<()> {
        self.reminders
            .update_item(id, |r| r.delivering_since = None)
            .await?;
        Ok(())
    }

    /// Retry ledger entries, then settle expired claims left by earlier runs
    async fn reconcile(&self, now: DateTime<Utc>) {
        let pending: Vec<(String, Settlement)> = self
            .ledger
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();

        for (id, settlement) in pending {
            let result = match settlement {
                Settlement::Delivered(sent_at) => self.mark_sent(&id, sent_at).await,
                Settlement::Undelivered => self.clear_claim(&id).await,
            };
            match result {
                Ok(()) => {
                    info!("Recorded earlier delivery attempt for reminder {id}");
                    self.ledger.remove(&id);
                }
                Err(e) => warn!("Reminder {id} still unrecorded: {e:#}"),
            }
        }

        let reminders = match self.reminders.list().await {
            Ok(reminders) => reminders,
            Err(e) => {
                warn!("Could not scan for abandoned delivery claims: {e:#}");
                return;
            }
        };

        let expiry = self.claim_expiry();
        for reminder in reminders {
            let Some(claimed_at) = reminder.delivering_since else {
                continue;
            };
            if reminder.sent || self.ledger.contains_key(&reminder.id) || now - claimed_at < expiry {
                continue;
            }

            // Outcome unknown; counted as delivered
            warn!(
                "Reminder {} for {} was left mid-delivery at {}; recording it as sent",
                reminder.id, reminder.guest_name, claimed_at
            );
            if let Err(e) = self.mark_sent(&reminder.id, claimed_at).await {
                warn!("Reminder {} still unrecorded: {e:#}", reminder.id);
            }
        }
    }

    /// Ids whose claim is still in the store, from this or any other run
    async fn in_doubt(&self) -> Vec<String> {
        let mut ids: Vec<String> = match self.reminders.list().await {
            Ok(reminders) => reminders
                .into_iter()
                .filter(|r| r.is_in_doubt())
                .map(|r| r.id)
                .collect(),
            Err(e) => {
                warn!("Could not list unrecorded reminders: {e:#}");
                self.unrecorded()
            }
        };
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::temp_store;
    use crate::database::StoredBlob;
    use crate::features::notifications::sms::test_support::ScriptedGateway;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store that accepts a fixed number of writes, then fails until healed
    struct FlakyStore {
        inner: Arc<dyn BlobStore>,
        writes_left: AtomicUsize,
    }

    impl FlakyStore {
        fn failing_after(inner: Arc<dyn BlobStore>, writes: usize) -> Arc<Self> {
            Arc::new(Self {
                inner,
                writes_left: AtomicUsize::new(writes),
            })
        }

        fn heal(&self) {
            self.writes_left.store(usize::MAX, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl BlobStore for FlakyStore {
        async fn get(&self, key: &str) -> anyhow::Result<Option<StoredBlob>> {
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, value: String, expected: Option<i64>) -> anyhow::Result<bool> {
            if self
                .writes_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_err()
            {
                anyhow::bail!("disk I/O error");
            }
            self.inner.put(key, value, expected).await
        }
    }

    fn reminder(id: &str, phone: &str, scheduled_for: DateTime<Utc>, sent: bool) -> PendingReminder {
        PendingReminder {
            id: id.to_string(),
            guest_id: format!("guest-{id}"),
            guest_name: format!("Guest {id}"),
            phone_number: phone.to_string(),
            scheduled_for,
            sent,
            sent_at: None,
            delivering_since: None,
            created_at: scheduled_for - ChronoDuration::hours(24),
        }
    }

    async fn seed(store: &Arc<dyn BlobStore>, reminders: Vec<PendingReminder>) -> Collection<PendingReminder> {
        let collection = Collection::new(store.clone(), keys::PENDING_REMINDERS);
        for r in reminders {
            collection.insert(r).await.unwrap();
        }
        collection
    }

    fn dispatcher(store: Arc<dyn BlobStore>, gateway: Arc<ScriptedGateway>) -> ReminderDispatcher {
        ReminderDispatcher::new(store, gateway, "https://potluck.test/", std::time::Duration::from_secs(1))
    }

    #[test]
    fn test_compose_message() {
        let message = compose_message("Ada", "https://potluck.test");
        assert!(message.starts_with("Hey Ada!"));
        assert!(message.ends_with("https://potluck.test/rsvp"));
    }

    #[tokio::test]
    async fn test_sweep_counts_and_leaves_others_untouched() {
        let (_dir, store) = temp_store().await;
        let now = Utc::now();
        let past = now - ChronoDuration::hours(1);
        let future = now + ChronoDuration::hours(1);

        let collection = seed(
            &store,
            vec![
                reminder("a", "5551111111", past, false),
                reminder("b", "5550000000", past, false),
                reminder("c", "5552222222", now, false),
                reminder("d", "5553333333", future, false),
                reminder("e", "5554444444", past, true),
            ],
        )
        .await;

        let gateway = Arc::new(ScriptedGateway::failing_for(&["5550000000"]));
        let report = dispatcher(store, gateway.clone()).sweep_at(now).await.unwrap();

        assert_eq!(report.processed, 3);
        assert_eq!(report.sent, 2);
        assert_eq!(report.failed, 1);
        assert!(report.unrecorded.is_empty());
        assert_eq!(gateway.sent_to(), vec!["5551111111", "5552222222"]);

        let stored = collection.list().await.unwrap();
        let sent: Vec<bool> = stored.iter().map(|r| r.sent).collect();
        assert_eq!(sent, vec![true, false, true, false, true]);
        assert!(stored[0].sent_at.is_some());
        assert!(stored[4].sent_at.is_none());
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_sweep() {
        let (_dir, store) = temp_store().await;
        let now = Utc::now();
        let past = now - ChronoDuration::minutes(5);
        seed(
            &store,
            vec![
                reminder("a", "5550000000", past, false),
                reminder("b", "5551111111", past, false),
            ],
        )
        .await;

        let gateway = Arc::new(ScriptedGateway::failing_for(&["5550000000"]));
        let report = dispatcher(store, gateway.clone()).sweep_at(now).await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.sent, 1);
        assert_eq!(gateway.sent_to(), vec!["5551111111"]);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let (_dir, store) = temp_store().await;
        let now = Utc::now();
        seed(&store, vec![reminder("a", "5551111111", now, false)]).await;

        let gateway = Arc::new(ScriptedGateway {
            delay: Some(std::time::Duration::from_millis(200)),
            ..Default::default()
        });
        let dispatcher = ReminderDispatcher::new(
            store,
            gateway,
            "https://potluck.test",
            std::time::Duration::from_millis(20),
        );

        let report = dispatcher.sweep_at(now).await.unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn test_second_sweep_sends_nothing() {
        let (_dir, store) = temp_store().await;
        let now = Utc::now();
        seed(&store, vec![reminder("a", "5551111111", now, false)]).await;

        let gateway = Arc::new(ScriptedGateway::default());
        let dispatcher = dispatcher(store, gateway.clone());

        assert_eq!(dispatcher.sweep_at(now).await.unwrap().sent, 1);
        let second = dispatcher.sweep_at(now).await.unwrap();
        assert_eq!(second, SweepReport::default());
        assert_eq!(gateway.sent_to().len(), 1);
    }

    #[tokio::test]
    async fn test_sweep_requires_configured_gateway() {
        let (_dir, store) = temp_store().await;
        let gateway = Arc::new(ScriptedGateway {
            unconfigured: true,
            ..Default::default()
        });

        assert!(matches!(
            dispatcher(store, gateway).sweep().await,
            Err(PotluckError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_send_now_ignores_schedule() {
        let (_dir, store) = temp_store().await;
        let future = Utc::now() + ChronoDuration::hours(20);
        let collection = seed(&store, vec![reminder("a", "5551111111", future, false)]).await;

        let gateway = Arc::new(ScriptedGateway::default());
        let outcome = dispatcher(store, gateway.clone()).send_now("a").await.unwrap();

        assert!(outcome.is_recorded());
        assert_eq!(gateway.sent_to(), vec!["5551111111"]);
        assert!(collection.find("a").await.unwrap().unwrap().sent);
    }

    #[tokio::test]
    async fn test_send_now_already_sent_makes_no_call() {
        let (_dir, store) = temp_store().await;
        seed(&store, vec![reminder("a", "5551111111", Utc::now(), true)]).await;

        let gateway = Arc::new(ScriptedGateway::default());
        let result = dispatcher(store, gateway.clone()).send_now("a").await;

        assert!(matches!(result, Err(PotluckError::AlreadySent)));
        assert!(gateway.sent_to().is_empty());
    }

    #[tokio::test]
    async fn test_send_now_error_order() {
        let (_dir, store) = temp_store().await;
        seed(&store, vec![reminder("bad", "5550000000", Utc::now(), false)]).await;

        let unconfigured = Arc::new(ScriptedGateway {
            unconfigured: true,
            ..Default::default()
        });
        assert!(matches!(
            dispatcher(store.clone(), unconfigured).send_now("missing").await,
            Err(PotluckError::Configuration(_))
        ));

        let gateway = Arc::new(ScriptedGateway::failing_for(&["5550000000"]));
        let dispatcher = dispatcher(store, gateway);
        assert!(matches!(
            dispatcher.send_now("missing").await,
            Err(PotluckError::NotFound("Reminder"))
        ));
        assert!(matches!(
            dispatcher.send_now("bad").await,
            Err(PotluckError::Delivery(_))
        ));
    }

    #[tokio::test]
    async fn test_unrecorded_delivery_is_never_resent() {
        let (_dir, inner) = temp_store().await;
        let now = Utc::now();
        let collection = seed(&inner, vec![reminder("a", "5551111111", now, false)]).await;

        // The claim is written, marking it sent is not
        let flaky = FlakyStore::failing_after(inner, 1);
        let gateway = Arc::new(ScriptedGateway::default());
        let dispatcher = dispatcher(flaky.clone(), gateway.clone());

        let first = dispatcher.sweep_at(now).await.unwrap();
        assert_eq!(first.sent, 1);
        assert_eq!(first.failed, 0);
        assert_eq!(first.unrecorded, vec!["a".to_string()]);

        let second = dispatcher.sweep_at(now).await.unwrap();
        assert_eq!(second.processed, 0);
        assert_eq!(second.unrecorded, vec!["a".to_string()]);
        assert!(matches!(dispatcher.send_now("a").await, Err(PotluckError::AlreadySent)));
        assert_eq!(gateway.sent_to().len(), 1);

        flaky.heal();
        let third = dispatcher.sweep_at(now).await.unwrap();
        assert_eq!(third.processed, 0);
        assert!(third.unrecorded.is_empty());
        assert!(dispatcher.unrecorded().is_empty());
        assert_eq!(gateway.sent_to().len(), 1);

        let stored = collection.find("a").await.unwrap().unwrap();
        assert!(stored.sent);
        assert!(stored.sent_at.is_some());
        assert!(stored.delivering_since.is_none());
    }

    #[tokio::test]
    async fn test_separate_runs_never_resend_unrecorded_delivery() {
        let (_dir, inner) = temp_store().await;
        let now = Utc::now();
        let collection = seed(&inner, vec![reminder("a", "5551111111", now, false)]).await;

        let flaky = FlakyStore::failing_after(inner, 1);
        let gateway = Arc::new(ScriptedGateway::default());

        let first = dispatcher(flaky.clone(), gateway.clone()).sweep_at(now).await.unwrap();
        assert_eq!(first.sent, 1);
        assert_eq!(first.unrecorded, vec!["a".to_string()]);

        // A new process starts with an empty ledger over a healthy store
        flaky.heal();
        let second_run = dispatcher(flaky.clone(), gateway.clone());
        let second = second_run.sweep_at(now).await.unwrap();
        assert_eq!(second.processed, 0);
        assert_eq!(second.sent, 0);
        assert_eq!(second.unrecorded, vec!["a".to_string()]);
        assert!(matches!(second_run.send_now("a").await, Err(PotluckError::AlreadySent)));

        let later = now + ChronoDuration::hours(1);
        let third = dispatcher(flaky, gateway.clone()).sweep_at(later).await.unwrap();
        assert_eq!(third.processed, 0);
        assert!(third.unrecorded.is_empty());
        assert_eq!(gateway.sent_to().len(), 1);

        let stored = collection.find("a").await.unwrap().unwrap();
        assert!(stored.sent);
        assert!(stored.delivering_since.is_none());
        assert!(stored.sent_at.is_some());
    }

    #[tokio::test]
    async fn test_claim_failure_skips_gateway() {
        let (_dir, inner) = temp_store().await;
        let now = Utc::now();
        let collection = seed(&inner, vec![reminder("a", "5551111111", now, false)]).await;

        let flaky = FlakyStore::failing_after(inner, 0);
        let gateway = Arc::new(ScriptedGateway::default());
        let report = dispatcher(flaky, gateway.clone()).sweep_at(now).await.unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.sent, 0);
        assert!(gateway.sent_to().is_empty());

        let stored = collection.find("a").await.unwrap().unwrap();
        assert!(!stored.sent);
        assert!(stored.delivering_since.is_none());
    }

    #[tokio::test]
    async fn test_failed_send_releases_claim() {
        let (_dir, store) = temp_store().await;
        let now = Utc::now();
        let collection = seed(&store, vec![reminder("a", "5550000000", now, false)]).await;

        let gateway = Arc::new(ScriptedGateway::failing_for(&["5550000000"]));
        let dispatcher = dispatcher(store, gateway);

        assert_eq!(dispatcher.sweep_at(now).await.unwrap().failed, 1);
        let stored = collection.find("a").await.unwrap().unwrap();
        assert!(!stored.is_in_doubt());

        let retry = dispatcher.sweep_at(now).await.unwrap();
        assert_eq!(retry.processed, 1);
        assert!(retry.unrecorded.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_sweeps_and_manual_send_deliver_once() {
        let (_dir, store) = temp_store().await;
        let now = Utc::now();
        seed(&store, vec![reminder("a", "5551111111", now, false)]).await;

        let gateway = Arc::new(ScriptedGateway {
            delay: Some(std::time::Duration::from_millis(50)),
            ..Default::default()
        });
        let first = dispatcher(store.clone(), gateway.clone());
        let second = dispatcher(store, gateway.clone());

        let (a, b, manual) = tokio::join!(first.sweep_at(now), second.sweep_at(now), first.send_now("a"));

        let sent = a.unwrap().sent + b.unwrap().sent + usize::from(manual.is_ok());
        assert_eq!(sent, 1);
        assert_eq!(gateway.sent_to().len(), 1);
    }

    #[tokio::test]
    async fn test_send_now_unrecorded_outcome() {
        let (_dir, inner) = temp_store().await;
        seed(&inner, vec![reminder("a", "5551111111", Utc::now(), false)]).await;

        let flaky = FlakyStore::failing_after(inner, 1);
        let gateway = Arc::new(ScriptedGateway::default());
        let outcome = dispatcher(flaky, gateway).send_now("a").await.unwrap();

        assert_eq!(outcome, SendOutcome::DeliveredUnrecorded);
    }
}

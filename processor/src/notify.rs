use judge_apis::live::LiveJudgeStatus;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    Mutex,
};
use uuid::Uuid;

const SUBSCRIBER_BUFFER: usize = 16;

/// Delivers live status of submissions to subscribers.
///
/// Subscriptions of a submission are removed once a final status has been
/// published for it. Dropped receivers are pruned on the next publish.
#[derive(Clone, Default)]
pub struct Notifier {
    subscribers: Arc<Mutex<HashMap<Uuid, Vec<mpsc::Sender<LiveJudgeStatus>>>>>,
}

impl Notifier {
    pub fn new() -> Notifier {
        Notifier::default()
    }

    pub async fn subscribe(&self, submission_id: Uuid) -> mpsc::Receiver<LiveJudgeStatus> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        self.subscribers
            .lock()
            .await
            .entry(submission_id)
            .or_default()
            .push(tx);
        rx
    }

    pub async fn publish(&self, status: LiveJudgeStatus) {
        let mut subscribers = self.subscribers.lock().await;
        let id = status.submission_id;
        let senders = match subscribers.get_mut(&id) {
            Some(s) => s,
            None => return,
        };
        senders.retain(|tx| match tx.try_send(status.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(submission_id = %id, "subscriber is lagging, dropping event");
                true
            }
            Err(TrySendError::Closed(_)) => false,
        });
        if status.is_final() || senders.is_empty() {
            subscribers.remove(&id);
        }
    }

    /// Drops every subscriber of `submission_id`, ending their streams.
    pub async fn close(&self, submission_id: Uuid) {
        self.subscribers.lock().await.remove(&submission_id);
    }

    /// Forgets subscribers of `submission_id` whose receivers were dropped.
    pub async fn prune(&self, submission_id: Uuid) {
        let mut subscribers = self.subscribers.lock().await;
        if let Some(senders) = subscribers.get_mut(&submission_id) {
            senders.retain(|tx| !tx.is_closed());
            if senders.is_empty() {
                subscribers.remove(&submission_id);
            }
        }
    }

    pub async fn subscriber_count(&self, submission_id: Uuid) -> usize {
        self.subscribers
            .lock()
            .await
            .get(&submission_id)
            .map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use judge_apis::Verdict;

    #[tokio::test]
    async fn delivers_until_final() {
        let notifier = Notifier::new();
        let id = Uuid::new_v4();
        let mut rx = notifier.subscribe(id).await;

        notifier.publish(LiveJudgeStatus::judging(id)).await;
        assert_eq!(notifier.subscriber_count(id).await, 1);
        notifier
            .publish(LiveJudgeStatus {
                submission_id: id,
                verdict: Verdict::Accepted,
                passed: Some(2),
                total: Some(2),
            })
            .await;
        assert_eq!(notifier.subscriber_count(id).await, 0);

        assert_eq!(rx.recv().await.unwrap().verdict, Verdict::Judging);
        assert_eq!(rx.recv().await.unwrap().passed, Some(2));
        // sender side was removed, so the stream ends
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn dropped_subscribers_are_pruned() {
        let notifier = Notifier::new();
        let id = Uuid::new_v4();
        let rx = notifier.subscribe(id).await;
        drop(rx);
        notifier.publish(LiveJudgeStatus::judging(id)).await;
        assert_eq!(notifier.subscriber_count(id).await, 0);

        let rx = notifier.subscribe(id).await;
        drop(rx);
        notifier.prune(id).await;
        assert_eq!(notifier.subscriber_count(id).await, 0);
    }

    #[tokio::test]
    async fn close_ends_streams() {
        let notifier = Notifier::new();
        let id = Uuid::new_v4();
        let mut rx = notifier.subscribe(id).await;
        notifier.close(id).await;
        assert_eq!(notifier.subscriber_count(id).await, 0);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn other_submissions_are_unaffected() {
        let notifier = Notifier::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let _ra = notifier.subscribe(a).await;
        let mut rb = notifier.subscribe(b).await;
        notifier.publish(LiveJudgeStatus::judging(a)).await;
        assert!(rb.try_recv().is_err());
        assert_eq!(notifier.subscriber_count(a).await, 1);
    }
}

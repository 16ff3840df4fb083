//! RetentionService - periodic removal of old finished interviews
//!
//! Runs `cleanup_older_than` on a fixed period over the configured
//! terminal statuses. Active interviews are never removed.

use std::sync::Arc;
use survey_core::config::RetentionConfig;
use survey_core::db::InterviewStatus;
use survey_core::Database;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info};

/// Time between cleanup passes
pub const RETENTION_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

pub struct RetentionService {
    db: Arc<Database>,
    days: u32,
    statuses: Vec<InterviewStatus>,
}

impl RetentionService {
    pub fn new(db: Arc<Database>, config: &RetentionConfig) -> Self {
        Self {
            db,
            days: config.days,
            statuses: config.statuses.clone(),
        }
    }

    /// One cleanup pass; returns the number of interviews removed
    pub fn run_once(&self) -> survey_core::Result<usize> {
        let removed = self.db.cleanup_older_than(self.days, &self.statuses)?;
        if removed > 0 {
            info!(removed, days = self.days, "Removed old interviews");
        } else {
            debug!(days = self.days, "Retention pass found nothing to remove");
        }
        Ok(removed)
    }

    /// Spawn the periodic task. The first pass runs immediately.
    pub fn start(self: Arc<Self>, period: Duration) -> tokio::task::AbortHandle {
        info!(
            days = self.days,
            period_secs = period.as_secs(),
            "Starting retention cleanup"
        );

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if let Err(e) = self.run_once() {
                    error!(error = %e, "Retention cleanup failed");
                }
            }
        });

        handle.abort_handle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database() -> Arc<Database> {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        Arc::new(db)
    }

    fn immediate() -> RetentionConfig {
        RetentionConfig {
            enabled: true,
            days: 0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_run_once_keeps_active_interviews() {
        let db = database();
        let done = db.start_interview("a", None).unwrap().interview;
        db.complete_interview(done.id).unwrap();
        let replaced = db.start_interview("b", None).unwrap().interview;
        let active = db.start_interview("b", None).unwrap().interview;
        tokio::time::sleep(Duration::from_millis(5)).await;

        let service = RetentionService::new(db.clone(), &immediate());
        assert_eq!(service.run_once().unwrap(), 2);

        assert!(db.get_interview(done.id).unwrap().is_none());
        assert!(db.get_interview(replaced.id).unwrap().is_none());
        assert!(db.get_interview(active.id).unwrap().is_some());
    }

    #[test]
    fn test_run_once_respects_age() {
        let db = database();
        let done = db.start_interview("a", None).unwrap().interview;
        db.complete_interview(done.id).unwrap();

        let service = RetentionService::new(db.clone(), &RetentionConfig::default());
        assert_eq!(service.run_once().unwrap(), 0);
        assert!(db.get_interview(done.id).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_start_runs_first_pass_immediately() {
        let db = database();
        let done = db.start_interview("a", None).unwrap().interview;
        db.complete_interview(done.id).unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let service = Arc::new(RetentionService::new(db.clone(), &immediate()));
        let handle = service.start(Duration::from_secs(3600));

        for _ in 0..50 {
            if db.get_interview(done.id).unwrap().is_none() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();
        assert!(db.get_interview(done.id).unwrap().is_none());
    }
}

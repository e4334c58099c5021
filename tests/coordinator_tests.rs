
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use graceful_jobs::config::JobsConfig;
use graceful_jobs::scheduler::{
    Coordinator, JobId, JobRequest, JobStatus, Registry, ResultStore,
};
use graceful_jobs::JobError;
use test_harness::{
    blocking_action, coordinator, delayed_action, failing_action, instant_action,
    wait_for_idle, wait_for_terminal,
};

const WAIT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_submitted_job_starts_pending() {
    let coordinator = coordinator(blocking_action(), Duration::from_secs(30));

    let id = coordinator.submit(JobRequest::new("ping")).unwrap();
    let result = coordinator.get(&id).unwrap();

    assert_eq!(result.id, id);
    assert_eq!(result.status, JobStatus::Pending);
    assert!(result.finish_time.is_none());
    assert_eq!(coordinator.in_flight(), 1);
}

#[tokio::test]
async fn test_ping_resolves_success() {
    let coordinator = coordinator(instant_action(), Duration::from_secs(5));

    let id = coordinator.submit(JobRequest::new("ping")).unwrap();
    let result = wait_for_terminal(&coordinator, &id, WAIT).await;

    assert_eq!(result.status, JobStatus::Success);
    assert_eq!(result.result, "ping");
    let finished = result.finish_time.expect("terminal job has a finish time");
    assert!(finished >= result.start_time);
}

#[tokio::test]
async fn test_terminal_status_never_changes() {
    let coordinator = coordinator(instant_action(), Duration::from_secs(5));

    let id = coordinator.submit(JobRequest::new("ping")).unwrap();
    let first = wait_for_terminal(&coordinator, &id, WAIT).await;

    for _ in 0..20 {
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(coordinator.get(&id).unwrap(), first);
    }
    // Cancelling a finished job neither succeeds nor changes it.
    assert!(matches!(coordinator.cancel(&id), Err(JobError::NotFound(_))));
    assert_eq!(coordinator.get(&id).unwrap(), first);
}

#[tokio::test]
async fn test_action_failure_is_recorded() {
    let coordinator = coordinator(failing_action("disk on fire"), Duration::from_secs(5));

    let id = coordinator.submit(JobRequest::new("ping")).unwrap();
    let result = wait_for_terminal(&coordinator, &id, WAIT).await;

    assert_eq!(result.status, JobStatus::Failed);
    assert!(result.result.contains("disk on fire"));
}

#[tokio::test]
async fn test_deadline_resolves_failed_timeout() {
    let deadline = Duration::from_millis(150);
    let coordinator = coordinator(blocking_action(), deadline);

    let id = coordinator.submit(JobRequest::new("slow")).unwrap();
    let result = wait_for_terminal(&coordinator, &id, WAIT).await;

    assert_eq!(result.status, JobStatus::Failed);
    assert!(result.result.contains("timed out"));

    let elapsed = (result.finish_time.unwrap() - result.start_time)
        .to_std()
        .unwrap();
    assert!(
        elapsed + Duration::from_millis(5) >= deadline,
        "finished early: {:?}",
        elapsed
    );
    assert!(
        elapsed < deadline + Duration::from_secs(1),
        "finished late: {:?}",
        elapsed
    );
    assert_eq!(coordinator.in_flight(), 0);
}

#[tokio::test]
async fn test_cancel_then_cancel_again() {
    let coordinator = coordinator(blocking_action(), Duration::from_secs(30));

    let id = coordinator.submit(JobRequest::new("ping")).unwrap();
    let snapshot = coordinator.cancel(&id).unwrap();
    assert_eq!(snapshot.id, id);

    let result = wait_for_terminal(&coordinator, &id, WAIT).await;
    assert_eq!(result.status, JobStatus::Cancelled);
    assert!(result.finish_time.is_some());

    let second = coordinator.cancel(&id);
    assert!(matches!(second, Err(JobError::NotFound(found)) if found == id));
}

#[tokio::test]
async fn test_cancel_unknown_job() {
    let coordinator = coordinator(instant_action(), Duration::from_secs(5));
    let unknown = JobId::generate();

    assert!(matches!(coordinator.cancel(&unknown), Err(JobError::NotFound(_))));
    assert!(matches!(coordinator.get(&unknown), Err(JobError::NotFound(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_cancel_single_winner() {
    let coordinator = coordinator(blocking_action(), Duration::from_secs(30));
    let id = coordinator.submit(JobRequest::new("ping")).unwrap();

    let attempts: Vec<_> = (0..8)
        .map(|_| {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.cancel(&id) })
        })
        .collect();

    let mut succeeded = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(JobError::NotFound(_)) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    assert_eq!(succeeded, 1);

    let result = wait_for_terminal(&coordinator, &id, WAIT).await;
    assert_eq!(result.status, JobStatus::Cancelled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_hundred_concurrent_jobs() {
    let coordinator = coordinator(
        delayed_action(Duration::from_millis(20)),
        Duration::from_secs(5),
    );

    let submissions: Vec<_> = (0..100)
        .map(|i| {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.submit(JobRequest::new(format!("job-{}", i))) })
        })
        .collect();

    let mut ids = HashSet::new();
    for submission in submissions {
        ids.insert(submission.await.unwrap().unwrap());

        let info = coordinator.info();
        assert!(info.total() >= ids.len() && info.total() <= 100);
    }
    assert_eq!(ids.len(), 100);

    wait_for_idle(&coordinator, WAIT).await;

    let info = coordinator.info();
    assert_eq!(info.total(), 100);
    assert_eq!(info.success, 100);
    assert_eq!(coordinator.list().len(), 100);
}

#[tokio::test]
async fn test_rejects_invalid_payload() {
    let coordinator = coordinator(instant_action(), Duration::from_secs(5));

    let err = coordinator.submit(JobRequest::new("")).unwrap_err();
    assert!(matches!(err, JobError::Validation(_)));
    assert!(coordinator.list().is_empty());
}

#[tokio::test]
async fn test_in_flight_capacity() {
    let config = JobsConfig::default()
        .with_deadline(Duration::from_secs(30))
        .with_max_in_flight(2);
    let coordinator = Coordinator::new(config, blocking_action());

    let first = coordinator.submit(JobRequest::new("a")).unwrap();
    coordinator.submit(JobRequest::new("b")).unwrap();

    let err = coordinator.submit(JobRequest::new("c")).unwrap_err();
    assert!(matches!(err, JobError::ResourceExhausted(_)));
    assert_eq!(coordinator.list().len(), 2);

    // Finishing a job frees its slot.
    coordinator.cancel(&first).unwrap();
    wait_for_terminal(&coordinator, &first, WAIT).await;
    let mut accepted = false;
    for _ in 0..100 {
        if coordinator.submit(JobRequest::new("c")).is_ok() {
            accepted = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(accepted, "slot was not returned to the pool");
}

#[tokio::test]
async fn test_drain_cancels_in_flight_and_rejects_new() {
    let coordinator = coordinator(blocking_action(), Duration::from_secs(30));
    let ids: Vec<JobId> = (0..3)
        .map(|_| coordinator.submit(JobRequest::new("ping")).unwrap())
        .collect();

    assert_eq!(coordinator.drain(), 3);
    assert!(coordinator.is_draining());
    assert!(matches!(
        coordinator.submit(JobRequest::new("late")),
        Err(JobError::Draining)
    ));

    for id in &ids {
        let result = wait_for_terminal(&coordinator, id, WAIT).await;
        assert_eq!(result.status, JobStatus::Cancelled);
    }
    assert_eq!(coordinator.in_flight(), 0);
}

#[tokio::test]
async fn test_injected_stores_are_shared() {
    let store = Arc::new(ResultStore::new());
    let registry = Arc::new(Registry::new());
    let coordinator = Coordinator::with_stores(
        JobsConfig::default().with_deadline(Duration::from_secs(30)),
        blocking_action(),
        store.clone(),
        registry.clone(),
    );

    let id = coordinator.submit(JobRequest::new("ping")).unwrap();
    assert_eq!(store.get(&id).unwrap().status, JobStatus::Pending);
    assert!(registry.contains(&id));

    coordinator.cancel(&id).unwrap();
    assert!(!registry.contains(&id));
}

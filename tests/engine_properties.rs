//! Tests de integración del motor de jobs
//! tests/engine_properties.rs
//!
//! Propiedades observables desde la API pública: unicidad de tokens,
//! estados monotónicos, aislamiento de lecturas, tolerancia a fallos del
//! workload, orden FIFO y carga concurrente.

use std::collections::HashSet;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use wordcount_server::jobs::{
    EngineConfig, FnWorkload, JobEngine, JobPoll, JobResult, Token, Workload,
};

/// Espera hasta que el job tenga resultado y lo retorna
fn wait_ready<W: Workload>(engine: &JobEngine<W>, token: &Token) -> JobResult<W::Output> {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        match engine.query(token, false) {
            JobPoll::Ready { result, .. } => return result,
            JobPoll::Pending { .. } => {}
            JobPoll::NotFound => panic!("token {token} disappeared"),
        }
        assert!(Instant::now() < deadline, "job {token} never finished");
        thread::sleep(Duration::from_millis(2));
    }
}

fn config(workers: usize) -> EngineConfig {
    EngineConfig::default().with_workers(workers)
}

// ==================== Tokens ====================

#[test]
fn test_tokens_distinct_under_concurrent_submission() {
    let engine = Arc::new(
        JobEngine::new(FnWorkload::new(|n: u32| Ok::<_, String>(n)), config(4)).unwrap(),
    );

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                (0..200)
                    .map(|i| engine.submit(t * 1000 + i).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let tokens: Vec<Token> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    let unique: HashSet<&Token> = tokens.iter().collect();

    assert_eq!(tokens.len(), 1600);
    assert_eq!(unique.len(), 1600);
}

#[test]
fn test_unknown_tokens_not_found() {
    let engine = JobEngine::new(FnWorkload::new(|n: u32| Ok::<_, String>(n)), config(1)).unwrap();
    engine.submit(1).unwrap();

    for token in [Token::generate(), Token::from(""), Token::from("not-a-token")] {
        assert!(engine.query(&token, false).is_not_found());
        assert!(engine.query(&token, true).is_not_found());
    }
}

// ==================== Lifecycle ====================

#[test]
fn test_pending_then_ready_forever() {
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = Mutex::new(release_rx);

    let workload = FnWorkload::new(move |word: String| {
        release_rx.lock().unwrap().recv().unwrap();
        Ok::<_, String>(word.len())
    });
    let engine = JobEngine::new(workload, config(1)).unwrap();

    let token = engine.submit("hello".to_string()).unwrap();

    // Nunca NotFound desde que submit retorna
    for _ in 0..20 {
        let poll = engine.query(&token, false);
        assert!(poll.is_pending(), "expected pending, got {poll:?}");
    }

    release_tx.send(()).unwrap();
    assert_eq!(wait_ready(&engine, &token), JobResult::Completed(5));

    for _ in 0..100 {
        assert_eq!(
            engine.query(&token, false).result(),
            Some(&JobResult::Completed(5))
        );
    }
}

#[test]
fn test_query_returns_isolated_records() {
    let engine = JobEngine::new(
        FnWorkload::new(|v: Vec<u8>| Ok::<_, String>(v.len())),
        config(1),
    )
    .unwrap();
    let token = engine.submit(vec![1, 2, 3]).unwrap();
    wait_ready(&engine, &token);

    let JobPoll::Ready {
        record: Some(mut record),
        ..
    } = engine.query(&token, true)
    else {
        panic!("expected ready record");
    };
    record.payload.clear();
    record.result = Some(JobResult::Failed("tampered".to_string()));

    let JobPoll::Ready {
        result,
        record: Some(fresh),
    } = engine.query(&token, true)
    else {
        panic!("expected ready record");
    };
    assert_eq!(result, JobResult::Completed(3));
    assert_eq!(fresh.payload, vec![1, 2, 3]);
    assert_eq!(fresh.result, Some(JobResult::Completed(3)));
}

// ==================== Failures ====================

#[test]
fn test_failures_do_not_kill_the_pool() {
    let workload = FnWorkload::new(|n: i64| match n {
        n if n < 0 => Err(format!("negative input: {n}")),
        0 => panic!("zero is not allowed"),
        n => Ok(n * 2),
    });
    let engine = JobEngine::new(workload, config(2)).unwrap();

    let bad: Vec<_> = (0..4)
        .flat_map(|_| [engine.submit(-1).unwrap(), engine.submit(0).unwrap()])
        .collect();
    for token in &bad {
        assert!(wait_ready(&engine, token).is_failed());
    }

    let good: Vec<_> = (1..=10).map(|n| (n, engine.submit(n).unwrap())).collect();
    for (n, token) in good {
        assert_eq!(wait_ready(&engine, &token), JobResult::Completed(n * 2));
    }

    let stats = engine.stats();
    assert_eq!(stats.failed, 4);
    assert_eq!(stats.panicked, 4);
    assert_eq!(stats.completed, 10);
}

#[test]
fn test_failure_message_is_stored() {
    let engine = JobEngine::new(
        FnWorkload::new(|_: ()| Err::<(), _>("upstream unavailable")),
        config(1),
    )
    .unwrap();
    let token = engine.submit(()).unwrap();

    assert_eq!(
        wait_ready(&engine, &token),
        JobResult::Failed("upstream unavailable".to_string())
    );
}

/// Error que entra en pánico al describirse
struct PanickyError;

impl std::fmt::Display for PanickyError {
    fn fmt(&self, _: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        panic!("cannot describe this error")
    }
}

#[test]
fn test_single_worker_survives_fault_outside_workload() {
    let workload = FnWorkload::new(|word: String| {
        if word.is_empty() {
            Err(PanickyError)
        } else {
            Ok(word.len())
        }
    });
    let engine = JobEngine::new(workload, config(1)).unwrap();

    let broken: Vec<_> = (0..3)
        .map(|_| engine.submit(String::new()).unwrap())
        .collect();
    let good = engine.submit("survivor".to_string()).unwrap();

    for token in &broken {
        assert!(wait_ready(&engine, token).is_failed());
    }
    assert_eq!(wait_ready(&engine, &good), JobResult::Completed(8));
    assert_eq!(engine.stats().pending_jobs, 0);
}

// ==================== Ordering ====================

#[test]
fn test_single_worker_completes_in_submission_order() {
    let workload = FnWorkload::new(|ms: u64| {
        thread::sleep(Duration::from_millis(ms));
        Ok::<_, String>(ms)
    });
    let engine = JobEngine::new(workload, config(1)).unwrap();

    // La más lenta primero: con un solo worker igual termina primero
    let tokens: Vec<_> = [40, 5, 20]
        .into_iter()
        .map(|ms| engine.submit(ms).unwrap())
        .collect();
    for token in &tokens {
        wait_ready(&engine, token);
    }

    let finished: Vec<_> = tokens
        .iter()
        .map(|token| match engine.query(token, true) {
            JobPoll::Ready {
                record: Some(record),
                ..
            } => record.finished_at.unwrap(),
            other => panic!("expected ready record, got {other:?}"),
        })
        .collect();

    assert!(finished[0] < finished[1]);
    assert!(finished[1] < finished[2]);
}

// ==================== Shutdown ====================

#[test]
fn test_shutdown_drains_and_rejects() {
    let workload = FnWorkload::new(|ms: u64| {
        thread::sleep(Duration::from_millis(ms));
        Ok::<_, String>(ms)
    });
    let engine = JobEngine::new(workload, config(2)).unwrap();

    let tokens: Vec<_> = (0..6).map(|_| engine.submit(10).unwrap()).collect();
    engine.shutdown();

    for token in &tokens {
        assert_eq!(
            engine.query(token, false).result(),
            Some(&JobResult::Completed(10))
        );
    }
    assert!(engine.submit(1).is_err());
    assert!(engine.is_shut_down());
}

// ==================== Stress ====================

#[test]
fn test_stress_thousand_submissions() {
    let workload = FnWorkload::new(|n: u64| Ok::<_, String>(n % 97));
    let engine = Arc::new(JobEngine::new(workload, config(10)).unwrap());

    let handles: Vec<_> = (0..10)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                (0..100)
                    .map(|i| {
                        let n = t * 100 + i;
                        (n, engine.submit(n).unwrap())
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let submitted: Vec<(u64, Token)> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    let unique: HashSet<&Token> = submitted.iter().map(|(_, token)| token).collect();
    assert_eq!(unique.len(), 1000);

    for (n, token) in &submitted {
        assert_eq!(wait_ready(&engine, token), JobResult::Completed(n % 97));
    }

    let stats = engine.stats();
    assert_eq!(stats.submitted, 1000);
    assert_eq!(stats.completed, 1000);
    assert_eq!(stats.pending_jobs, 0);
    assert_eq!(stats.stored_jobs, 1000);
}

use std::collections::BTreeSet;
use std::thread;
use std::time::{Duration, Instant};

use shardbench::error::{Result, ShardBenchError};
use shardbench::pool::work_queue::WorkQueue;

#[test]
fn task_group_collects_every_unit_once() -> Result<()> {
    let pool = WorkQueue::new(5)?;
    let mut group = pool.task_group();
    for i in 0..5usize {
        group.submit(
            |i: usize| {
                thread::sleep(Duration::from_millis(10));
                i
            },
            i,
        )?;
    }

    let results = group.wait(None);
    assert!(results.is_complete());
    let seen: BTreeSet<usize> = results.into_results().into_iter().collect();
    assert_eq!(seen, (0..5).collect());
    Ok(())
}

#[test]
fn groups_on_one_pool_do_not_mix_results() -> Result<()> {
    let pool = WorkQueue::new(4)?;

    thread::scope(|s| {
        let handles: Vec<_> = (0..3usize)
            .map(|g| {
                let pool = &pool;
                s.spawn(move || -> Result<Vec<usize>> {
                    let mut group = pool.task_group();
                    for i in 0..10usize {
                        group.submit(move |i: usize| g * 100 + i, i)?;
                    }
                    let mut results = group.wait(Some(Duration::from_secs(5))).into_results();
                    results.sort_unstable();
                    Ok(results)
                })
            })
            .collect();

        for (g, handle) in handles.into_iter().enumerate() {
            let results = handle.join().unwrap()?;
            let expected: Vec<usize> = (0..10).map(|i| g * 100 + i).collect();
            assert_eq!(results, expected);
        }
        Ok(())
    })
}

#[test]
fn bounded_pool_limits_parallelism() -> Result<()> {
    let pool = WorkQueue::new(2)?;
    let start = Instant::now();
    let mut group = pool.task_group();
    for _ in 0..4 {
        group.submit(|_: ()| thread::sleep(Duration::from_millis(50)), ())?;
    }

    let results = group.wait(None);
    assert_eq!(results.results.len(), 4);
    // Two rounds of two sleeps each
    assert!(start.elapsed() >= Duration::from_millis(90));
    Ok(())
}

#[test]
fn shutdown_rejects_new_work() -> Result<()> {
    let pool = WorkQueue::new(1)?;
    let handle = pool.submit(|x: u32| x * 2, 21)?;
    assert_eq!(handle.wait(Some(Duration::from_secs(1)))?, 42);

    pool.shutdown();
    assert!(pool.is_closed());
    assert!(matches!(
        pool.submit(|x: u32| x, 1),
        Err(ShardBenchError::PoolClosed)
    ));
    Ok(())
}

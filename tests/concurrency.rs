// ==============================================
// CONCURRENCY TESTS (integration)
// ==============================================
//
// Caches are shared across threads behind an `Arc`; every method takes
// `&self`. These tests hammer each policy and then check that the store,
// its bookkeeping and the counters still agree.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use evictcache::builder::{Cache, CacheBuilder, CachePolicy};
use evictcache::clock::ManualClock;
use evictcache::stats::StatsAccessor;
use evictcache::traits::CoreCache;

const THREADS: usize = 8;
const OPS_PER_THREAD: usize = 2_000;

fn shared(policy: CachePolicy, capacity: usize) -> Arc<Cache<u64, u64>> {
    Arc::new(
        CacheBuilder::new(capacity)
            .policy(policy)
            .build()
            .expect("valid configuration"),
    )
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

mod mixed_workload {
    use super::*;

    #[test]
    fn counters_stay_consistent_under_contention() {
        init_tracing();
        for policy in CachePolicy::ALL {
            let cache = shared(policy, 64);
            let lookups = Arc::new(AtomicUsize::new(0));

            let handles: Vec<_> = (0..THREADS)
                .map(|thread_id| {
                    let cache = Arc::clone(&cache);
                    let lookups = Arc::clone(&lookups);
                    thread::spawn(move || {
                        for i in 0..OPS_PER_THREAD {
                            let key = ((thread_id * 31 + i) % 128) as u64;
                            match i % 5 {
                                0 | 1 => cache.set(key, i as u64),
                                2 => {
                                    let _ = cache.get(&key);
                                    lookups.fetch_add(1, Ordering::Relaxed);
                                },
                                3 => {
                                    let _ = cache.ttl(&key);
                                    lookups.fetch_add(1, Ordering::Relaxed);
                                },
                                _ => {
                                    let _ = cache.del(&key);
                                },
                            }
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().expect("worker panicked");
            }

            assert!(cache.key_count() <= 64, "{policy}: capacity exceeded");
            assert_eq!(cache.key_count() as usize, cache.keys().len(), "{policy}");
            assert_eq!(
                cache.lookup_count() as usize,
                lookups.load(Ordering::Relaxed) + cache.key_count() as usize,
                "{policy}: keys() re-reads each live key once"
            );
        }
    }

    #[test]
    fn disjoint_writers_lose_nothing_when_unbounded() {
        let cache = shared(CachePolicy::Simple, 0);

        let handles: Vec<_> = (0..THREADS as u64)
            .map(|thread_id| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..500u64 {
                        cache.set(thread_id * 1_000 + i, i);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker panicked");
        }

        assert_eq!(cache.key_count(), THREADS as u64 * 500);
        assert_eq!(cache.len(), THREADS * 500);
        assert_eq!(cache.evict_count(), 0);
    }
}

mod key_count {
    use super::*;

    #[test]
    fn clear_racing_inserts_leaves_count_matching_store() {
        init_tracing();
        for policy in CachePolicy::ALL {
            let cache = shared(policy, 256);

            let writers: Vec<_> = (0..THREADS as u64)
                .map(|thread_id| {
                    let cache = Arc::clone(&cache);
                    thread::spawn(move || {
                        for i in 0..OPS_PER_THREAD as u64 {
                            cache.set(thread_id * 100_000 + i, i);
                        }
                    })
                })
                .collect();
            for _ in 0..500 {
                cache.clear();
                thread::yield_now();
            }
            for handle in writers {
                handle.join().expect("worker panicked");
            }

            assert_eq!(cache.key_count() as usize, cache.keys().len(), "{policy}");
            assert!(cache.key_count() <= 256, "{policy}");
        }
    }

    #[test]
    fn set_and_del_on_same_keys_never_underflow() {
        for policy in CachePolicy::ALL {
            let cache = shared(policy, 16);
            let done = Arc::new(AtomicBool::new(false));

            let reader = {
                let cache = Arc::clone(&cache);
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    while !done.load(Ordering::Relaxed) {
                        assert!(cache.key_count() <= 16, "key count wrapped");
                    }
                })
            };
            let workers: Vec<_> = (0..THREADS as u64)
                .map(|thread_id| {
                    let cache = Arc::clone(&cache);
                    thread::spawn(move || {
                        for i in 0..OPS_PER_THREAD as u64 {
                            let key = (thread_id + i) % 4;
                            if (thread_id + i) % 2 == 0 {
                                cache.set(key, i);
                            } else {
                                let _ = cache.del(&key);
                            }
                        }
                    })
                })
                .collect();
            for handle in workers {
                handle.join().expect("worker panicked");
            }
            done.store(true, Ordering::Relaxed);
            reader.join().expect("reader saw a wrapped key count");

            assert_eq!(cache.key_count() as usize, cache.keys().len(), "{policy}");
        }
    }
}

mod expiry_race {
    use super::*;

    #[test]
    fn concurrent_readers_remove_expired_once() {
        let clock = Arc::new(ManualClock::new(0));
        let cache: Arc<Cache<u64, u64>> = Arc::new(
            CacheBuilder::new(0)
                .clock(clock.clone())
                .build()
                .expect("valid configuration"),
        );
        for key in 0..100 {
            cache.set_with_expire(key, key, 1);
        }
        clock.advance(2);

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for key in 0..100 {
                        assert!(cache.get(&key).is_err());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker panicked");
        }

        assert_eq!(cache.key_count(), 0);
        assert_eq!(cache.miss_count(), (THREADS * 100) as u64);
        assert!(cache.is_empty());
    }
}

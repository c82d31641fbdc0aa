use std::cell::Cell;

use super::*;
use pretty_assertions::assert_eq;

fn fp(raw: u64) -> Fingerprint {
    Fingerprint::from_raw(raw)
}

fn cache(config: CacheConfig) -> SurfaceCache<u32> {
    SurfaceCache::new(config)
}

fn store(cache: &mut SurfaceCache<u32>, token: SessionToken, raw: u64, tick: u64) {
    match cache.begin(fp(raw), token, tick) {
        Begin::Miss(ticket) => {
            assert_eq!(cache.finish(ticket, raw as u32, tick), Finish::Stored(raw as u32));
        }
        other => panic!("expected a miss for {raw}, got {other:?}"),
    }
}

#[test]
fn miss_then_hit() {
    let mut cache = cache(CacheConfig::default());
    let token = cache.register_session(1);
    store(&mut cache, token, 7, 1);
    assert_eq!(cache.begin(fp(7), token, 2), Begin::Hit(7));
    assert_eq!(cache.last_used(fp(7)), Some(2));
    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses), (1, 1));
}

#[test]
fn concurrent_requests_share_one_render() {
    let mut cache = cache(CacheConfig::default());
    let a = cache.register_session(1);
    let b = cache.register_session(2);
    let Begin::Miss(ticket) = cache.begin(fp(3), a, 1) else {
        panic!("expected a miss");
    };
    assert_eq!(cache.begin(fp(3), b, 1), Begin::InFlight);
    assert_eq!(cache.begin(fp(3), a, 1), Begin::InFlight);
    assert_eq!(cache.finish(ticket, 30, 1), Finish::Stored(30));
    assert_eq!(cache.owners(fp(3)), &[1, 2]);
    assert_eq!(cache.stats().joined, 2);
}

#[test]
fn acquire_renders_each_fingerprint_once() {
    let mut cache = cache(CacheConfig::default());
    let token = cache.register_session(1);
    let renders = Cell::new(0);
    let render = || -> Result<u32, String> {
        renders.set(renders.get() + 1);
        Ok(11)
    };
    assert_eq!(cache.acquire(fp(1), token, 1, render), Ok(Acquired::Fresh(11)));
    assert_eq!(cache.acquire(fp(1), token, 1, render), Ok(Acquired::Cached(11)));
    assert_eq!(cache.acquire(fp(1), token, 2, render), Ok(Acquired::Cached(11)));
    assert_eq!(renders.get(), 1);
}

#[test]
fn capacity_evicts_least_recently_used() {
    let mut cache = cache(CacheConfig::default().with_capacity(2));
    let token = cache.register_session(1);
    store(&mut cache, token, 1, 1);
    store(&mut cache, token, 2, 2);
    assert_eq!(cache.begin(fp(1), token, 3), Begin::Hit(1));
    store(&mut cache, token, 3, 4);

    assert_eq!(cache.len(), 2);
    assert!(cache.contains(fp(1)));
    assert!(!cache.contains(fp(2)));
    assert!(cache.contains(fp(3)));
    assert_eq!(cache.take_evicted(), vec![2]);
    assert!(cache.take_evicted().is_empty());
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn idle_sweep_runs_on_its_interval() {
    let config = CacheConfig::default()
        .with_max_idle_ticks(5)
        .with_eviction_interval(10);
    let mut cache = cache(config);
    let token = cache.register_session(1);
    store(&mut cache, token, 1, 1);
    store(&mut cache, token, 2, 8);

    assert!(cache.maybe_evict(7).is_empty());
    assert_eq!(cache.len(), 2);

    assert_eq!(cache.maybe_evict(10), vec![1]);
    assert!(cache.contains(fp(2)));
    assert!(cache.maybe_evict(15).is_empty());
    assert_eq!(cache.maybe_evict(20), vec![2]);
}

#[test]
fn unmount_releases_only_unshared_surfaces() {
    let mut cache = cache(CacheConfig::default());
    let a = cache.register_session(1);
    let b = cache.register_session(2);
    store(&mut cache, a, 1, 1);
    store(&mut cache, a, 2, 1);
    assert_eq!(cache.begin(fp(1), b, 2), Begin::Hit(1));

    assert_eq!(cache.unmount(1), vec![2]);
    assert_eq!(cache.owners(fp(1)), &[2]);
    assert!(!cache.is_current(a));
    assert!(cache.is_current(b));
    assert_eq!(cache.unmount(2), vec![1]);
    assert!(cache.is_empty());
}

#[test]
fn completion_after_unmount_is_stale() {
    let mut cache = cache(CacheConfig::default());
    let token = cache.register_session(4);
    let Begin::Miss(ticket) = cache.begin(fp(9), token, 1) else {
        panic!("expected a miss");
    };
    assert!(cache.unmount(4).is_empty());
    assert!(!cache.is_in_flight(fp(9)));

    assert_eq!(cache.finish(ticket, 90, 2), Finish::Stale(90));
    assert!(!cache.contains(fp(9)));
    assert_eq!(cache.stats().stale_completions, 1);

    let remounted = cache.register_session(4);
    assert_eq!(remounted.generation, 1);
    assert_ne!(remounted, token);
}

#[test]
fn unmount_keeps_renders_started_by_other_sessions() {
    let mut cache = cache(CacheConfig::default());
    let a = cache.register_session(1);
    let b = cache.register_session(2);
    let Begin::Miss(ticket) = cache.begin(fp(5), a, 1) else {
        panic!("expected a miss");
    };
    assert_eq!(cache.begin(fp(5), b, 1), Begin::InFlight);
    cache.unmount(2);
    assert!(cache.is_in_flight(fp(5)));
    assert_eq!(cache.finish(ticket, 50, 2), Finish::Stored(50));
    assert_eq!(cache.owners(fp(5)), &[1]);
}

#[test]
fn failed_render_can_be_retried() {
    let mut cache = cache(CacheConfig::default());
    let token = cache.register_session(1);
    let failed: Result<Acquired<u32>, &str> = cache.acquire(fp(2), token, 1, || Err("decode error"));
    assert_eq!(failed, Err("decode error"));
    assert!(!cache.is_in_flight(fp(2)));
    assert_eq!(cache.stats().abandoned, 1);

    let retried = cache.acquire(fp(2), token, 2, || Ok::<_, &str>(20));
    assert_eq!(retried, Ok(Acquired::Fresh(20)));
}

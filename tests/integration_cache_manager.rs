//! Integration tests for the cache managers
//!
//! Origin-to-cache bridge on the in-process backend.

mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use common::*;
use content_feeder::{CacheBackend, CacheError, OriginError, PageListRequest, SubListRequest};

/// Test `set_cache` then `get_cache` returns the origin list unchanged
#[tokio::test]
async fn test_set_then_get_round_trips() {
    let env = setup_env(test_config(&[], &[])).await;
    let catalog = test_data::catalog(&["one_piece", "kagamigami"]);
    env.origin.set_catalog(Ok(catalog.clone()));

    let manager = env.ctx.catalog_cache();
    manager.set_cache(&()).await.unwrap();

    assert_eq!(manager.get_cache(&()).await.unwrap(), catalog);
}

/// Test round trip of fractional chapter numbers and page lists
#[tokio::test]
async fn test_round_trip_every_resource() {
    let env = setup_env(test_config(&[], &[])).await;
    let chapters = test_data::sub_list("bleach", &[650.0, 650.5, 651.0]);
    let pages = test_data::page_list(&["http://x/01.jpg", "http://x/02 b.jpg"]);
    env.origin.set_sub_list("bleach", Ok(chapters.clone()));
    env.origin.set_page_list("bleach", 650.5, Ok(pages.clone()));

    let sub_req = SubListRequest::new("bleach");
    let page_req = PageListRequest::new("bleach", 650.5);
    env.ctx.sub_list_cache().set_cache(&sub_req).await.unwrap();
    env.ctx.page_list_cache().set_cache(&page_req).await.unwrap();

    assert_eq!(env.ctx.sub_list_cache().get_cache(&sub_req).await.unwrap(), chapters);
    assert_eq!(env.ctx.page_list_cache().get_cache(&page_req).await.unwrap(), pages);
}

/// Test a key that was never set is a plain miss
#[tokio::test]
async fn test_get_never_set_is_not_found() {
    let env = setup_env(test_config(&[], &[])).await;

    let err = env
        .ctx
        .sub_list_cache()
        .get_cache(&SubListRequest::new("bleach"))
        .await
        .unwrap_err();

    assert!(matches!(err, CacheError::NotFound { ref key } if key == "SubListCache|bleach"));
}

/// Test an undecodable payload is `InvalidCache`, not a miss
#[tokio::test]
async fn test_corrupt_payload_is_invalid_cache() {
    let env = setup_env(test_config(&[], &[])).await;
    env.backend
        .set_with_ttl("PageListCache|bleach|650", b"not json", Duration::from_secs(60))
        .await
        .unwrap();

    let err = env
        .ctx
        .page_list_cache()
        .get_cache(&PageListRequest::new("bleach", 650.0))
        .await
        .unwrap_err();

    assert!(!err.is_not_found());
    assert_eq!(err.to_string(), "invalid content cache");
    assert_eq!(env.ctx.page_list_cache().get_stats().invalid, 1);
}

/// Test an origin failure is returned unchanged and nothing is written
#[tokio::test]
async fn test_origin_failure_leaves_cache_untouched() {
    let env = setup_env(test_config(&[], &[])).await;
    env.origin
        .set_catalog(Err(OriginError::Timeout(Duration::from_millis(3000))));

    let err = env.ctx.catalog_cache().set_cache(&()).await.unwrap_err();

    assert!(matches!(err, CacheError::Origin(OriginError::Timeout(_))));
    assert!(env.backend.is_empty());
    assert_eq!(env.ctx.catalog_cache().get_stats().set_failures, 1);
}

/// Test the refresh overwrites the previous entry (last writer wins)
#[tokio::test]
async fn test_set_cache_overwrites_previous_entry() {
    let env = setup_env(test_config(&[], &[])).await;
    let manager = env.ctx.catalog_cache();

    env.origin.set_catalog(Ok(test_data::catalog(&["bleach"])));
    manager.set_cache(&()).await.unwrap();
    env.origin.set_catalog(Ok(test_data::catalog(&["bleach", "naruto"])));
    manager.set_cache(&()).await.unwrap();

    assert_eq!(manager.get_cache(&()).await.unwrap().items.len(), 2);
    assert_eq!(env.origin.catalog_calls.load(Ordering::SeqCst), 2);
}

/// Test each resource is written with its own TTL
#[tokio::test]
async fn test_entries_carry_resource_ttl() {
    let env = setup_env(test_config(&[], &[])).await;
    env.origin.set_catalog(Ok(test_data::catalog(&["bleach"])));
    env.origin
        .set_sub_list("bleach", Ok(test_data::sub_list("bleach", &[1.0])));
    env.origin
        .set_page_list("bleach", 1.0, Ok(test_data::page_list(&["http://x/1.jpg"])));

    env.ctx.catalog_cache().set_cache(&()).await.unwrap();
    env.ctx
        .sub_list_cache()
        .set_cache(&SubListRequest::new("bleach"))
        .await
        .unwrap();
    env.ctx
        .page_list_cache()
        .set_cache(&PageListRequest::new("bleach", 1.0))
        .await
        .unwrap();

    let within = |key: &str, expected: Duration| {
        let remaining = env.backend.ttl_remaining(key).unwrap();
        remaining <= expected && remaining > expected - Duration::from_secs(5)
    };
    assert!(within("CatalogCache", Duration::from_secs(60 * 60)));
    assert!(within("SubListCache|bleach", Duration::from_secs(30 * 60)));
    assert!(within("PageListCache|bleach|1", Duration::from_secs(48 * 60 * 60)));
}

/// Test expiry turns a hit back into a miss
#[tokio::test(start_paused = true)]
async fn test_expired_entry_is_not_found() {
    let env = setup_env(test_config(&[], &[])).await;
    let req = SubListRequest::new("bleach");
    env.origin
        .set_sub_list("bleach", Ok(test_data::sub_list("bleach", &[1.0])));
    env.ctx.sub_list_cache().set_cache(&req).await.unwrap();

    tokio::time::advance(Duration::from_secs(30 * 60 + 1)).await;

    let err = env.ctx.sub_list_cache().get_cache(&req).await.unwrap_err();
    assert!(err.is_not_found());
}

/// Test explicit deletion
#[tokio::test]
async fn test_delete_cache() {
    let env = setup_env(test_config(&[], &[])).await;
    env.origin.set_catalog(Ok(test_data::catalog(&["bleach"])));
    let manager = env.ctx.catalog_cache();

    manager.set_cache(&()).await.unwrap();
    manager.delete_cache(&()).await.unwrap();

    assert!(manager.get_cache(&()).await.unwrap_err().is_not_found());
}

/// Test statistics follow reads
#[tokio::test]
async fn test_stats_count_hits_and_misses() {
    let env = setup_env(test_config(&[], &[])).await;
    env.origin.set_catalog(Ok(test_data::catalog(&["bleach"])));
    let manager = env.ctx.catalog_cache();

    let _ = manager.get_cache(&()).await;
    manager.set_cache(&()).await.unwrap();
    let _ = manager.get_cache(&()).await;
    let _ = manager.get_cache(&()).await;

    let stats = manager.get_stats();
    assert_eq!(stats.resource, "manga");
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.sets, 1);
    assert!((stats.hit_rate - 200.0 / 3.0).abs() < 0.01);
}

//! Benchmarks for optimistic toggling and feed decoding
//!
//! Run with: cargo bench

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use reso::{
    ApiClient, ApiConfig, Collection, MemoryStore, MutationController, Post, Session,
    SessionAction, SessionStore, ToggleState, User,
};
use std::sync::Arc;

fn create_test_posts(count: u64) -> Vec<Post> {
    (0..count)
        .map(|i| Post {
            id: i,
            content: format!("post number {}", i),
            user: None,
            created_at: Utc::now(),
            likes_count: i % 50,
            liked: i % 3 == 0,
            comments_count: 0,
            image: None,
        })
        .collect()
}

/// Controller over a logged-in session; the toggle requests never reach
/// the network
fn create_controller() -> MutationController {
    let storage = Arc::new(MemoryStore::new());
    Session::default()
        .reduce(SessionAction::Login {
            token: "bench".into(),
            user: User {
                id: 1,
                name: "bench".into(),
                email: "bench@example.com".into(),
                image_url: None,
            },
        })
        .save(storage.as_ref())
        .unwrap();

    let api = Arc::new(ApiClient::new(&ApiConfig::default()).unwrap());
    MutationController::new(Arc::new(SessionStore::hydrate(api, storage)))
}

fn bench_toggle(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("toggle");

    for size in [10u64, 100, 1000] {
        let controller = &create_controller();
        let posts = &Collection::new(create_test_posts(size));
        let target = size / 2;

        group.throughput(Throughput::Elements(size));

        group.bench_function(format!("confirmed_{}", size), |b| {
            b.to_async(&rt).iter(|| async move {
                controller
                    .toggle(posts, black_box(target), |_token, _id| async {
                        Ok(ToggleState::new(true, 1))
                    })
                    .await
                    .unwrap()
            })
        });

        group.bench_function(format!("rolled_back_{}", size), |b| {
            b.to_async(&rt).iter(|| async move {
                controller
                    .toggle(posts, black_box(target), |_token, _id| async {
                        Err(reso::ApiError::Timeout)
                    })
                    .await
                    .unwrap_err()
            })
        });
    }

    group.finish();
}

fn bench_feed_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("feed_decode");

    for size in [10u64, 100, 1000] {
        let body = serde_json::to_string(&serde_json::json!({
            "posts": create_test_posts(size)
        }))
        .unwrap();

        group.throughput(Throughput::Bytes(body.len() as u64));

        group.bench_function(format!("posts_{}", size), |b| {
            b.iter(|| {
                let value: serde_json::Value = serde_json::from_str(black_box(&body)).unwrap();
                serde_json::from_value::<Vec<Post>>(value["posts"].clone()).unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_toggle, bench_feed_decode);
criterion_main!(benches);

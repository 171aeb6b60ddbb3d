use chrono::{Duration, Utc};
use relay_shortener::domain::entities::NewAnalyticRecord;
use relay_shortener::domain::repositories::AnalyticsRepository;
use relay_shortener::infrastructure::persistence::PgAnalyticsRepository;
use sqlx::PgPool;
use std::sync::Arc;

fn record(code: &str) -> NewAnalyticRecord {
    NewAnalyticRecord {
        short_code: code.to_string(),
        long_url: format!("https://example.com/{}", code),
        created_at: Utc::now(),
    }
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_create_is_idempotent(pool: PgPool) {
    let repo = PgAnalyticsRepository::new(Arc::new(pool));

    let first = repo.create(record("1")).await.unwrap();
    let second = repo.create(record("1")).await.unwrap();

    assert_eq!(first.unwrap().access_count, 0);
    assert!(second.is_none());
    assert_eq!(repo.count().await.unwrap(), 1);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_increment_access(pool: PgPool) {
    let repo = PgAnalyticsRepository::new(Arc::new(pool));
    repo.create(record("1")).await.unwrap();

    let later = Utc::now() + Duration::minutes(5);
    let updated = repo.increment_access("1", later).await.unwrap().unwrap();
    assert_eq!(updated.access_count, 1);
    assert_eq!(updated.last_accessed_at.timestamp(), later.timestamp());

    // An older event still counts but never moves the timestamp back.
    let earlier = Utc::now() - Duration::hours(1);
    let updated = repo.increment_access("1", earlier).await.unwrap().unwrap();
    assert_eq!(updated.access_count, 2);
    assert_eq!(updated.last_accessed_at.timestamp(), later.timestamp());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_increment_unknown_code(pool: PgPool) {
    let repo = PgAnalyticsRepository::new(Arc::new(pool));

    let updated = repo.increment_access("missing", Utc::now()).await.unwrap();
    assert!(updated.is_none());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_list_orders_by_access_count(pool: PgPool) {
    let repo = PgAnalyticsRepository::new(Arc::new(pool));
    for code in ["1", "2", "3"] {
        repo.create(record(code)).await.unwrap();
    }
    repo.increment_access("2", Utc::now()).await.unwrap();
    repo.increment_access("2", Utc::now()).await.unwrap();
    repo.increment_access("3", Utc::now()).await.unwrap();

    let records = repo.list(0, 10).await.unwrap();
    let codes: Vec<&str> = records.iter().map(|r| r.short_code.as_str()).collect();
    assert_eq!(codes, vec!["2", "3", "1"]);

    let page = repo.list(1, 1).await.unwrap();
    assert_eq!(page[0].short_code, "3");
}

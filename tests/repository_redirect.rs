use relay_shortener::domain::entities::NewRedirectRecord;
use relay_shortener::domain::repositories::RedirectRepository;
use relay_shortener::infrastructure::persistence::PgRedirectRepository;
use sqlx::PgPool;
use std::sync::Arc;

fn record(code: &str, url: &str) -> NewRedirectRecord {
    NewRedirectRecord {
        short_code: code.to_string(),
        long_url: url.to_string(),
    }
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_create_and_find(pool: PgPool) {
    let repo = PgRedirectRepository::new(Arc::new(pool));

    repo.create(record("1", "https://example.com/a"))
        .await
        .unwrap();

    let found = repo.find_by_short_code("1").await.unwrap().unwrap();
    assert_eq!(found.long_url, "https://example.com/a");
    assert!(repo.find_by_short_code("2").await.unwrap().is_none());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicates_are_appended_and_newest_wins(pool: PgPool) {
    let repo = PgRedirectRepository::new(Arc::new(pool));

    repo.create(record("1", "https://example.com/old"))
        .await
        .unwrap();
    repo.create(record("1", "https://example.com/new"))
        .await
        .unwrap();

    assert_eq!(repo.count_by_short_code("1").await.unwrap(), 2);

    let found = repo.find_by_short_code("1").await.unwrap().unwrap();
    assert_eq!(found.long_url, "https://example.com/new");
}

//! Integration tests for the `trips` queries and the migration set.

use tripplan_db::models::NewTrip;
use tripplan_db::pool;
use tripplan_db::queries::trips;
use tripplan_test_utils::{create_test_db, date, drop_test_db, seed_trip};

#[tokio::test]
async fn insert_and_get_trip() {
    let (pool, db_name) = create_test_db().await;

    let new = NewTrip {
        title: "  Porto weekend ".to_owned(),
        city: " Porto".to_owned(),
        country: "Portugal ".to_owned(),
        start_date: date("2025-11-14"),
        end_date: date("2025-11-16"),
        notes: Some("Book a port cellar tour".to_owned()),
    };
    let trip = trips::insert_trip(&pool, &new).await.expect("insert should succeed");

    assert!(trip.id > 0);
    assert_eq!(trip.title, "Porto weekend");
    assert_eq!(trip.city, "Porto");
    assert_eq!(trip.country, "Portugal");
    assert_eq!(trip.notes.as_deref(), Some("Book a port cellar tour"));

    let fetched = trips::get_trip(&pool, trip.id)
        .await
        .unwrap()
        .expect("trip should exist");
    assert_eq!(fetched, trip);

    assert!(trips::get_trip(&pool, trip.id + 1000).await.unwrap().is_none());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn inverted_dates_are_rejected_by_schema() {
    let (pool, db_name) = create_test_db().await;

    let new = NewTrip {
        title: "Backwards".to_owned(),
        city: "Oslo".to_owned(),
        country: "Norway".to_owned(),
        start_date: date("2025-06-10"),
        end_date: date("2025-06-01"),
        notes: None,
    };
    assert!(trips::insert_trip(&pool, &new).await.is_err());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn list_trips_orders_by_start_date() {
    let (pool, db_name) = create_test_db().await;

    let later = seed_trip(&pool, "2026-03-01", "2026-03-04").await;
    let sooner = seed_trip(&pool, "2025-12-20", "2025-12-27").await;

    let listed = trips::list_trips(&pool).await.unwrap();
    let ids: Vec<i64> = listed.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![sooner.id, later.id]);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn migrations_are_idempotent_and_tables_exist() {
    let (pool, db_name) = create_test_db().await;

    pool::run_migrations(&pool)
        .await
        .expect("re-running migrations should be a no-op");

    let summary = pool::database_summary(&pool).await.unwrap();
    assert_eq!(
        summary,
        pool::DatabaseSummary {
            trips: 0,
            day_plans: 0,
            migrations_applied: 2,
        }
    );

    pool.close().await;
    drop_test_db(&db_name).await;
}

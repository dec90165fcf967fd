//! Integration tests for trip queries.

use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

use tripweaver_db::queries::trips::{self, NewEvent};
use tripweaver_db::queries::users;
use tripweaver_test_utils::{create_test_db, drop_test_db};

fn event<'a>(title: &'a str, city: &'a str) -> NewEvent<'a> {
    NewEvent {
        title,
        description: "Worth a visit",
        address: "12 Harbour Road",
        country: "Japan",
        city,
        tickets: "Available",
    }
}

#[tokio::test]
async fn insert_trip_preserves_order() {
    let (pool, db_name) = create_test_db().await;

    let user = users::insert_user(&pool, "kai@example.com", "kai", "hash")
        .await
        .unwrap()
        .unwrap();

    let start = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap();
    let days = vec![
        vec![event("Temple", "Kyoto"), event("Market", "Kyoto")],
        vec![event("Castle", "Osaka")],
    ];
    let trip = trips::insert_trip_with_days(&pool, user.id, start, &days)
        .await
        .expect("insert should succeed");
    assert_eq!(trip.start_date, start);

    let stored_days = trips::get_trip_days(&pool, trip.id).await.unwrap();
    assert_eq!(stored_days.len(), 2);
    assert_eq!(stored_days[0].position, 0);
    assert_eq!(stored_days[1].position, 1);

    let events = trips::get_trip_events(&pool, trip.id).await.unwrap();
    let titles: Vec<&str> = events.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Temple", "Market", "Castle"]);
    assert_eq!(events[2].trip_day_id, stored_days[1].id);

    let participants = trips::get_trip_participants(&pool, trip.id).await.unwrap();
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0].id, user.id);

    assert!(trips::is_participant(&pool, trip.id, user.id).await.unwrap());
    assert!(
        !trips::is_participant(&pool, trip.id, Uuid::new_v4())
            .await
            .unwrap()
    );

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn list_trips_only_returns_own_trips() {
    let (pool, db_name) = create_test_db().await;

    let a = users::insert_user(&pool, "a@example.com", "aaa", "hash")
        .await
        .unwrap()
        .unwrap();
    let b = users::insert_user(&pool, "b@example.com", "bbb", "hash")
        .await
        .unwrap()
        .unwrap();

    let later = Utc::now() + Duration::days(30);
    let sooner = Utc::now() + Duration::days(3);
    let t1 = trips::insert_trip_with_days(&pool, a.id, later, &[])
        .await
        .unwrap();
    let t2 = trips::insert_trip_with_days(&pool, a.id, sooner, &[])
        .await
        .unwrap();
    trips::insert_trip_with_days(&pool, b.id, sooner, &[])
        .await
        .unwrap();

    let listed = trips::list_trips_for_user(&pool, a.id).await.unwrap();
    let ids: Vec<Uuid> = listed.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![t2.id, t1.id], "soonest trip should come first");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn update_trip_replaces_days_and_start_date() {
    let (pool, db_name) = create_test_db().await;

    let user = users::insert_user(&pool, "up@example.com", "upd", "hash")
        .await
        .unwrap()
        .unwrap();
    let trip = trips::insert_trip_with_days(
        &pool,
        user.id,
        Utc::now(),
        &[vec![event("Old", "Nara")], vec![event("Older", "Nara")]],
    )
    .await
    .unwrap();

    let new_start = Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap();
    let new_days = vec![vec![event("New", "Kobe"), event("Newer", "Kobe")]];
    let updated = trips::update_trip(&pool, trip.id, Some(new_start), Some(&new_days))
        .await
        .unwrap()
        .expect("trip should exist");
    assert_eq!(updated.start_date, new_start);
    assert!(updated.updated_at >= trip.updated_at);

    let days = trips::get_trip_days(&pool, trip.id).await.unwrap();
    assert_eq!(days.len(), 1);
    let events = trips::get_trip_events(&pool, trip.id).await.unwrap();
    let titles: Vec<&str> = events.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["New", "Newer"]);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn update_trip_start_date_only_keeps_days() {
    let (pool, db_name) = create_test_db().await;

    let user = users::insert_user(&pool, "keep@example.com", "keep", "hash")
        .await
        .unwrap()
        .unwrap();
    let trip =
        trips::insert_trip_with_days(&pool, user.id, Utc::now(), &[vec![event("Stay", "Sapporo")]])
            .await
            .unwrap();

    let new_start = Utc.with_ymd_and_hms(2027, 2, 2, 0, 0, 0).unwrap();
    trips::update_trip(&pool, trip.id, Some(new_start), None)
        .await
        .unwrap()
        .unwrap();

    let events = trips::get_trip_events(&pool, trip.id).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "Stay");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn update_missing_trip_returns_none() {
    let (pool, db_name) = create_test_db().await;

    let result = trips::update_trip(&pool, Uuid::new_v4(), Some(Utc::now()), None)
        .await
        .unwrap();
    assert!(result.is_none());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn delete_trip_removes_days_and_events() {
    let (pool, db_name) = create_test_db().await;

    let user = users::insert_user(&pool, "del@example.com", "del", "hash")
        .await
        .unwrap()
        .unwrap();
    let trip =
        trips::insert_trip_with_days(&pool, user.id, Utc::now(), &[vec![event("Bye", "Fukuoka")]])
            .await
            .unwrap();

    assert!(trips::delete_trip(&pool, trip.id).await.unwrap());
    assert!(trips::get_trip(&pool, trip.id).await.unwrap().is_none());
    assert!(trips::get_trip_days(&pool, trip.id).await.unwrap().is_empty());
    assert!(trips::get_trip_events(&pool, trip.id).await.unwrap().is_empty());
    assert!(!trips::delete_trip(&pool, trip.id).await.unwrap());

    pool.close().await;
    drop_test_db(&db_name).await;
}

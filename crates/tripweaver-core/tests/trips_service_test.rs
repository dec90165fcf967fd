//! Integration tests for the trip service.

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use tripweaver_core::itinerary::{EventDraft, TripDayDraft};
use tripweaver_core::trips::{self, TripDraft, TripServiceError, TripUpdate};
use tripweaver_db::models::User;
use tripweaver_db::queries::users as user_queries;
use tripweaver_test_utils::{create_test_db, drop_test_db};

fn event(title: &str) -> EventDraft {
    EventDraft {
        title: title.to_string(),
        description: "Worth seeing".to_string(),
        address: "Rua Augusta 100".to_string(),
        country: "Portugal".to_string(),
        city: "Lisbon".to_string(),
        tickets: "Available".to_string(),
    }
}

fn draft(days: &[&[&str]]) -> TripDraft {
    TripDraft {
        start_date: Utc.with_ymd_and_hms(2025, 9, 1, 9, 0, 0).unwrap(),
        days: days
            .iter()
            .map(|titles| TripDayDraft {
                events: titles.iter().map(|t| event(t)).collect(),
            })
            .collect(),
    }
}

async fn make_user(pool: &sqlx::PgPool, name: &str) -> User {
    user_queries::insert_user(pool, &format!("{name}@example.com"), name, "hash")
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn save_and_get_round_trip() {
    let (pool, db_name) = create_test_db().await;
    let user = make_user(&pool, "rita").await;

    let lisbon = draft(&[&["Tram 28", "Castle"], &["Belem Tower"]]);
    let saved = trips::save_trip(&pool, user.id, &lisbon).await.unwrap();
    assert_eq!(saved.days.len(), 2);
    assert_eq!(saved.days[0].events[1].title, "Castle");
    assert_eq!(saved.participants.len(), 1);
    assert_eq!(saved.participants[0].id, user.id);

    let fetched = trips::get_trip(&pool, user.id, saved.id).await.unwrap();
    assert_eq!(fetched.days[1].events[0].title, "Belem Tower");
    assert_eq!(fetched.days[1].position, 1);

    let listed = trips::list_trips(&pool, user.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, saved.id);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn save_rejects_invalid_days_and_unknown_user() {
    let (pool, db_name) = create_test_db().await;
    let user = make_user(&pool, "rui").await;

    let err = trips::save_trip(&pool, user.id, &draft(&[&["No"]]))
        .await
        .unwrap_err();
    assert!(matches!(err, TripServiceError::InvalidInput(_)), "got {err:?}");

    let err = trips::save_trip(&pool, Uuid::new_v4(), &draft(&[&["Museum"]]))
        .await
        .unwrap_err();
    assert!(matches!(err, TripServiceError::UserNotFound));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn other_users_see_not_found() {
    let (pool, db_name) = create_test_db().await;
    let owner = make_user(&pool, "owner").await;
    let stranger = make_user(&pool, "stranger").await;

    let saved = trips::save_trip(&pool, owner.id, &draft(&[&["Oceanarium"]]))
        .await
        .unwrap();

    let err = trips::get_trip(&pool, stranger.id, saved.id).await.unwrap_err();
    assert!(matches!(err, TripServiceError::NotFound));

    let update = TripUpdate {
        start_date: Some(Utc::now()),
        days: None,
    };
    let err = trips::update_trip(&pool, stranger.id, saved.id, &update)
        .await
        .unwrap_err();
    assert!(matches!(err, TripServiceError::NotFound));

    let err = trips::delete_trip(&pool, stranger.id, saved.id).await.unwrap_err();
    assert!(matches!(err, TripServiceError::NotFound));

    assert!(trips::list_trips(&pool, stranger.id).await.unwrap().is_empty());

    let err = trips::get_trip(&pool, owner.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, TripServiceError::NotFound));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn update_replaces_days_and_start_date() {
    let (pool, db_name) = create_test_db().await;
    let user = make_user(&pool, "ana").await;

    let saved = trips::save_trip(&pool, user.id, &draft(&[&["Alfama"], &["Sintra"]]))
        .await
        .unwrap();

    let err = trips::update_trip(&pool, user.id, saved.id, &TripUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, TripServiceError::InvalidInput(_)));

    let new_start = Utc.with_ymd_and_hms(2025, 10, 5, 8, 0, 0).unwrap();
    let update = TripUpdate {
        start_date: Some(new_start),
        days: Some(draft(&[&["Cascais", "Estoril"]]).days),
    };
    let updated = trips::update_trip(&pool, user.id, saved.id, &update)
        .await
        .unwrap();
    assert_eq!(updated.start_date, new_start);
    assert_eq!(updated.days.len(), 1);
    let titles: Vec<&str> = updated.days[0].events.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["Cascais", "Estoril"]);

    let dates_only = TripUpdate {
        start_date: Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()),
        days: None,
    };
    let updated = trips::update_trip(&pool, user.id, saved.id, &dates_only)
        .await
        .unwrap();
    assert_eq!(updated.days.len(), 1, "days kept when not provided");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn delete_removes_trip() {
    let (pool, db_name) = create_test_db().await;
    let user = make_user(&pool, "duarte").await;

    let saved = trips::save_trip(&pool, user.id, &draft(&[&["Chiado"]]))
        .await
        .unwrap();
    trips::delete_trip(&pool, user.id, saved.id).await.unwrap();

    let err = trips::get_trip(&pool, user.id, saved.id).await.unwrap_err();
    assert!(matches!(err, TripServiceError::NotFound));
    assert!(trips::list_trips(&pool, user.id).await.unwrap().is_empty());

    pool.close().await;
    drop_test_db(&db_name).await;
}

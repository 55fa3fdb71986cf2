// ABOUTME: Integration tests for review submission through the engine
// ABOUTME: Completed-booking gate, party checks, duplicates and rating projection

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use trainlink_engine::errors::EngineError;
use trainlink_engine::models::Sport;
use uuid::Uuid;

use common::{completed_booking, engine, future_window, trainer};

#[tokio::test]
async fn test_both_parties_review_once_each() {
    let engine = engine();
    let trainer = trainer(80, &[Sport::Tennis]);
    let athlete = Uuid::new_v4();
    let booking = completed_booking(&engine, &trainer, athlete, future_window(24, 60)).await;

    let athlete_review = engine
        .submit_review(booking.id, athlete, 5, Some("great coaching".into()))
        .await
        .unwrap();
    assert_eq!(athlete_review.reviewee_id, trainer.trainer_id);

    let trainer_review = engine
        .submit_review(booking.id, trainer.trainer_id, 4, None)
        .await
        .unwrap();
    assert_eq!(trainer_review.reviewee_id, athlete);

    let err = engine
        .submit_review(booking.id, athlete, 3, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DuplicateReview));
}

#[tokio::test]
async fn test_invalid_rating_rejected_before_booking_lookup() {
    let engine = engine();
    // nonexistent booking: the rating check still fires first
    let err = engine
        .submit_review(Uuid::new_v4(), Uuid::new_v4(), 0, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidRating(0)));

    let err = engine
        .submit_review(Uuid::new_v4(), Uuid::new_v4(), 6, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidRating(6)));
}

#[tokio::test]
async fn test_open_booking_cannot_be_reviewed() {
    let engine = engine();
    let trainer = trainer(80, &[Sport::Tennis]);
    let athlete = Uuid::new_v4();
    let booking = engine
        .resolve_request(&trainer, athlete, Sport::Tennis, future_window(24, 60))
        .await
        .unwrap();

    let err = engine
        .submit_review(booking.id, athlete, 5, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::BookingNotCompleted));
}

#[tokio::test]
async fn test_outsider_cannot_review() {
    let engine = engine();
    let trainer = trainer(80, &[Sport::Tennis]);
    let athlete = Uuid::new_v4();
    let booking = completed_booking(&engine, &trainer, athlete, future_window(24, 60)).await;

    let err = engine
        .submit_review(booking.id, Uuid::new_v4(), 5, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotAParty));
}

#[tokio::test]
async fn test_trainer_rating_projection_reflects_reviews() {
    let engine = engine();
    let trainer = trainer(80, &[Sport::Tennis]);

    let first = completed_booking(&engine, &trainer, Uuid::new_v4(), future_window(24, 60)).await;
    let second = completed_booking(&engine, &trainer, Uuid::new_v4(), future_window(48, 60)).await;

    engine
        .submit_review(first.id, first.athlete_id, 5, None)
        .await
        .unwrap();
    engine
        .submit_review(second.id, second.athlete_id, 4, None)
        .await
        .unwrap();

    let summary = engine.trainer_rating(trainer.trainer_id).await.unwrap();
    assert_eq!(summary.total_reviews, 2);
    assert_eq!(summary.average, Some(4.5));
    assert_eq!(summary.distribution[4].count, 1);
    assert_eq!(summary.distribution[3].count, 1);
    assert!((summary.distribution[4].percentage - 50.0).abs() < f64::EPSILON);
}

//! Booking lifecycle tests against the in-memory adapters.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use booking_service_lib::config::BookingPolicy;
use booking_service_lib::repository::{
    BookingRepository, InMemoryBookingStore, InMemoryDirectory, InMemoryNotifier,
    NotificationKind,
};
use booking_service_lib::service::{BookingManager, BookingService};
use common::AppError;
use domain::{
    Actor, Area, Booking, BookingStatus, CategoryMatcher, CreateBooking, DomainError,
    ProviderProfile, Service,
};

struct Fixture {
    bookings: Arc<InMemoryBookingStore>,
    directory: Arc<InMemoryDirectory>,
    notifier: Arc<InMemoryNotifier>,
    engine: Arc<BookingManager>,
    plumbing: Service,
    electrical: Service,
}

impl Fixture {
    async fn new() -> Self {
        Self::with_policy(BookingPolicy::default()).await
    }

    async fn with_policy(policy: BookingPolicy) -> Self {
        let bookings = Arc::new(InMemoryBookingStore::new());
        let directory = Arc::new(InMemoryDirectory::new());
        let notifier = Arc::new(InMemoryNotifier::new());

        let plumbing = Service::new(Uuid::new_v4(), "Plumbing");
        let electrical = Service::new(Uuid::new_v4(), "Electrical");
        directory.insert_service(plumbing.clone()).await;
        directory.insert_service(electrical.clone()).await;

        let engine = Arc::new(
            BookingManager::new(
                bookings.clone(),
                directory.clone(),
                notifier.clone(),
                CategoryMatcher::default(),
            )
            .with_policy(policy),
        );

        Self {
            bookings,
            directory,
            notifier,
            engine,
            plumbing,
            electrical,
        }
    }

    async fn provider(&self, role: Option<&str>) -> Uuid {
        let id = Uuid::new_v4();
        self.directory
            .insert_provider(ProviderProfile::new(id, role.map(str::to_string)))
            .await;
        id
    }

    async fn book(&self, user_id: Uuid, service: &Service, hour: u32) -> Booking {
        self.engine
            .create_booking(user_id, request(service, hour))
            .await
            .unwrap()
    }

    async fn count(&self, kind: NotificationKind) -> usize {
        self.notifier
            .recorded()
            .await
            .iter()
            .filter(|n| n.kind == kind)
            .count()
    }
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 11, 3).unwrap()
}

fn request(service: &Service, hour: u32) -> CreateBooking {
    CreateBooking {
        service_id: service.id,
        date: day(),
        time_slot: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        area: Area::Central,
        provider_id: None,
    }
}

fn domain_err(err: AppError) -> DomainError {
    match err {
        AppError::Domain(err) => err,
        other => panic!("expected a domain error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_new_booking_visible_only_to_matching_providers() {
    let fx = Fixture::new().await;
    let electrician = fx.provider(Some("Electrician")).await;
    let plumber = fx.provider(Some("Plumber")).await;

    let booking = fx.book(Uuid::new_v4(), &fx.plumbing, 9).await;
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.provider_id, None);

    let seen_by_electrician = fx.engine.list_for_provider(electrician, None).await.unwrap();
    assert!(seen_by_electrician.is_empty());

    let seen_by_plumber = fx.engine.list_for_provider(plumber, None).await.unwrap();
    assert_eq!(seen_by_plumber.len(), 1);
    assert_eq!(seen_by_plumber[0].id, booking.id);
}

#[tokio::test]
async fn test_create_announces_to_matching_active_providers() {
    let fx = Fixture::new().await;
    let plumber = fx.provider(Some("Plumber")).await;
    fx.provider(Some("Electrician")).await;
    fx.provider(None).await;
    let idle = Uuid::new_v4();
    fx.directory
        .insert_provider(ProviderProfile::new(idle, Some("Plumber".to_string())).deactivate())
        .await;

    fx.book(Uuid::new_v4(), &fx.plumbing, 9).await;

    let sent = fx.notifier.recorded().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, NotificationKind::BookingAvailable);
    assert_eq!(sent[0].provider_id, Some(plumber));
}

#[tokio::test]
async fn test_create_rejects_unknown_and_inactive_service() {
    let fx = Fixture::new().await;

    let missing = Service::new(Uuid::new_v4(), "Roofing");
    let err = fx
        .engine
        .create_booking(Uuid::new_v4(), request(&missing, 9))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "SERVICE_NOT_FOUND");

    let retired = Service::new(Uuid::new_v4(), "Painting").deactivate();
    fx.directory.insert_service(retired.clone()).await;
    let err = fx
        .engine
        .create_booking(Uuid::new_v4(), request(&retired, 9))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "SERVICE_INACTIVE");
    assert_eq!(fx.bookings.count().await, 0);
}

#[tokio::test]
async fn test_requested_provider_ignored_by_default() {
    let fx = Fixture::new().await;
    let plumber = fx.provider(Some("Plumber")).await;

    let mut input = request(&fx.plumbing, 9);
    input.provider_id = Some(plumber);
    let booking = fx.engine.create_booking(Uuid::new_v4(), input).await.unwrap();

    assert_eq!(booking.provider_id, None);
    assert_eq!(booking.status, BookingStatus::Pending);
}

#[tokio::test]
async fn test_direct_assignment_validates_requested_provider() {
    let fx = Fixture::with_policy(BookingPolicy {
        direct_assignment: true,
    })
    .await;
    let plumber = fx.provider(Some("Plumber")).await;
    let electrician = fx.provider(Some("Electrician")).await;

    let mut input = request(&fx.plumbing, 9);
    input.provider_id = Some(electrician);
    let err = fx.engine.create_booking(Uuid::new_v4(), input).await.unwrap_err();
    assert_eq!(err.code(), "CATEGORY_NOT_ALLOWED");

    let mut input = request(&fx.plumbing, 9);
    input.provider_id = Some(Uuid::new_v4());
    let err = fx.engine.create_booking(Uuid::new_v4(), input).await.unwrap_err();
    assert_eq!(err.code(), "PROVIDER_PROFILE_NOT_FOUND");

    let mut input = request(&fx.plumbing, 9);
    input.provider_id = Some(plumber);
    let booking = fx.engine.create_booking(Uuid::new_v4(), input).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.provider_id, Some(plumber));

    let mut input = request(&fx.plumbing, 9);
    input.provider_id = Some(plumber);
    let err = fx.engine.create_booking(Uuid::new_v4(), input).await.unwrap_err();
    assert_eq!(err.code(), "DUPLICATE_BOOKING_TIME");

    // The requested provider confirms through the normal claim path
    let confirmed = fx
        .engine
        .transition_status(booking.id, BookingStatus::Confirmed, Actor::Provider(plumber))
        .await
        .unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn test_direct_assignment_rejects_inactive_provider() {
    let fx = Fixture::with_policy(BookingPolicy {
        direct_assignment: true,
    })
    .await;
    let idle = Uuid::new_v4();
    fx.directory
        .insert_provider(ProviderProfile::new(idle, Some("Plumber".to_string())).deactivate())
        .await;

    let mut input = request(&fx.plumbing, 9);
    input.provider_id = Some(idle);
    let err = fx.engine.create_booking(Uuid::new_v4(), input).await.unwrap_err();
    assert_eq!(err.code(), "PROVIDER_INACTIVE");
}

#[tokio::test]
async fn test_second_claim_is_rejected() {
    let fx = Fixture::new().await;
    let first = fx.provider(Some("Plumber")).await;
    let second = fx.provider(Some("Plumber")).await;
    let booking = fx.book(Uuid::new_v4(), &fx.plumbing, 9).await;

    let confirmed = fx
        .engine
        .transition_status(booking.id, BookingStatus::Confirmed, Actor::Provider(first))
        .await
        .unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert_eq!(confirmed.provider_id, Some(first));

    let err = fx
        .engine
        .transition_status(booking.id, BookingStatus::Confirmed, Actor::Provider(second))
        .await
        .unwrap_err();
    assert_eq!(domain_err(err), DomainError::BookingAlreadyAssigned);
}

#[tokio::test]
async fn test_complete_requires_confirmation_then_notifies_both_parties() {
    let fx = Fixture::new().await;
    let plumber = fx.provider(Some("Plumber")).await;
    let owner = Uuid::new_v4();
    let booking = fx.book(owner, &fx.plumbing, 9).await;

    let err = fx
        .engine
        .transition_status(booking.id, BookingStatus::Completed, Actor::Provider(plumber))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_STATUS_TRANSITION");

    fx.engine
        .transition_status(booking.id, BookingStatus::Confirmed, Actor::Provider(plumber))
        .await
        .unwrap();
    assert_eq!(fx.count(NotificationKind::BookingAccepted).await, 1);

    let completed = fx
        .engine
        .transition_status(booking.id, BookingStatus::Completed, Actor::Provider(plumber))
        .await
        .unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);

    let sent: Vec<_> = fx
        .notifier
        .recorded()
        .await
        .into_iter()
        .filter(|n| n.kind == NotificationKind::BookingCompleted)
        .collect();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().any(|n| n.user_id == Some(owner)));
    assert!(sent.iter().any(|n| n.provider_id == Some(plumber)));
}

#[tokio::test]
async fn test_owner_cancels_confirmed_booking_once() {
    let fx = Fixture::new().await;
    let plumber = fx.provider(Some("Plumber")).await;
    let owner = Uuid::new_v4();
    let booking = fx.book(owner, &fx.plumbing, 9).await;
    fx.engine
        .transition_status(booking.id, BookingStatus::Confirmed, Actor::Provider(plumber))
        .await
        .unwrap();

    let cancelled = fx
        .engine
        .transition_status(booking.id, BookingStatus::Cancelled, Actor::User(owner))
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.provider_id, Some(plumber));

    let notices = fx.notifier.recorded().await;
    let notice = notices
        .iter()
        .find(|n| n.kind == NotificationKind::BookingCancelled)
        .unwrap();
    assert_eq!(notice.provider_id, Some(plumber));

    let err = fx
        .engine
        .transition_status(booking.id, BookingStatus::Cancelled, Actor::User(owner))
        .await
        .unwrap_err();
    assert_eq!(domain_err(err), DomainError::TerminalStatus(BookingStatus::Cancelled));
}

#[tokio::test]
async fn test_stranger_cannot_cancel() {
    let fx = Fixture::new().await;
    let booking = fx.book(Uuid::new_v4(), &fx.plumbing, 9).await;

    let err = fx
        .engine
        .transition_status(booking.id, BookingStatus::Cancelled, Actor::User(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "BOOKING_NOT_OWNED");
}

#[tokio::test]
async fn test_owner_cancels_unclaimed_booking() {
    let fx = Fixture::new().await;
    let owner = Uuid::new_v4();
    let booking = fx.book(owner, &fx.plumbing, 9).await;
    let before = fx.notifier.recorded().await.len();

    let cancelled = fx
        .engine
        .transition_status(booking.id, BookingStatus::Cancelled, Actor::User(owner))
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.provider_id, None);
    // Nobody to tell
    assert_eq!(fx.notifier.recorded().await.len(), before);
}

#[tokio::test]
async fn test_user_may_only_cancel() {
    let fx = Fixture::new().await;
    let owner = Uuid::new_v4();
    let booking = fx.book(owner, &fx.plumbing, 9).await;

    for status in [
        BookingStatus::Confirmed,
        BookingStatus::Completed,
        BookingStatus::Declined,
        BookingStatus::Pending,
    ] {
        let err = fx
            .engine
            .transition_status(booking.id, status, Actor::User(owner))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_USER_STATUS", "{}", status);
    }
}

#[tokio::test]
async fn test_provider_cannot_reopen() {
    let fx = Fixture::new().await;
    let plumber = fx.provider(Some("Plumber")).await;
    let booking = fx.book(Uuid::new_v4(), &fx.plumbing, 9).await;

    let err = fx
        .engine
        .transition_status(booking.id, BookingStatus::Pending, Actor::Provider(plumber))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_PROVIDER_STATUS");
}

#[tokio::test]
async fn test_terminal_bookings_are_locked_for_everyone() {
    let fx = Fixture::new().await;
    let plumber = fx.provider(Some("Plumber")).await;
    let owner = Uuid::new_v4();
    let booking = fx.book(owner, &fx.plumbing, 9).await;
    fx.engine
        .transition_status(booking.id, BookingStatus::Confirmed, Actor::Provider(plumber))
        .await
        .unwrap();
    fx.engine
        .transition_status(booking.id, BookingStatus::Completed, Actor::Provider(plumber))
        .await
        .unwrap();

    for (status, actor) in [
        (BookingStatus::Cancelled, Actor::User(owner)),
        (BookingStatus::Cancelled, Actor::Provider(plumber)),
        (BookingStatus::Confirmed, Actor::Provider(plumber)),
        (BookingStatus::Pending, Actor::Provider(plumber)),
    ] {
        let err = fx
            .engine
            .transition_status(booking.id, status, actor)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "TERMINAL_STATUS");
    }
}

#[tokio::test]
async fn test_reconfirm_by_holder_is_idempotent() {
    let fx = Fixture::new().await;
    let plumber = fx.provider(Some("Plumber")).await;
    let booking = fx.book(Uuid::new_v4(), &fx.plumbing, 9).await;

    let first = fx
        .engine
        .transition_status(booking.id, BookingStatus::Confirmed, Actor::Provider(plumber))
        .await
        .unwrap();
    let sent = fx.notifier.recorded().await.len();

    let second = fx
        .engine
        .transition_status(booking.id, BookingStatus::Confirmed, Actor::Provider(plumber))
        .await
        .unwrap();

    assert_eq!(second, first);
    assert_eq!(fx.notifier.recorded().await.len(), sent);
}

#[tokio::test]
async fn test_category_gate_on_claim() {
    let fx = Fixture::new().await;
    let electrician = fx.provider(Some("Electrician")).await;
    let unverified = fx.provider(None).await;
    let booking = fx.book(Uuid::new_v4(), &fx.plumbing, 9).await;

    let err = fx
        .engine
        .transition_status(booking.id, BookingStatus::Confirmed, Actor::Provider(electrician))
        .await
        .unwrap_err();
    let err = domain_err(err);
    assert_eq!(err.code(), "CATEGORY_NOT_ALLOWED");
    assert!(err.to_string().contains("Plumbing"));
    assert!(err.to_string().contains("Electrician"));

    let err = fx
        .engine
        .transition_status(booking.id, BookingStatus::Confirmed, Actor::Provider(unverified))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "CATEGORY_NOT_ALLOWED");

    let stranger = Uuid::new_v4();
    let err = fx
        .engine
        .transition_status(booking.id, BookingStatus::Confirmed, Actor::Provider(stranger))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "PROVIDER_PROFILE_NOT_FOUND");
}

#[tokio::test]
async fn test_provider_cannot_double_book_a_slot() {
    let fx = Fixture::new().await;
    let plumber = fx.provider(Some("Plumber")).await;
    let morning = fx.book(Uuid::new_v4(), &fx.plumbing, 9).await;
    let same_slot = fx.book(Uuid::new_v4(), &fx.plumbing, 9).await;
    let later = fx.book(Uuid::new_v4(), &fx.plumbing, 14).await;

    fx.engine
        .transition_status(morning.id, BookingStatus::Confirmed, Actor::Provider(plumber))
        .await
        .unwrap();

    let err = fx
        .engine
        .transition_status(same_slot.id, BookingStatus::Confirmed, Actor::Provider(plumber))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "DUPLICATE_BOOKING_TIME");

    fx.engine
        .transition_status(later.id, BookingStatus::Confirmed, Actor::Provider(plumber))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_cancelled_claim_frees_slot() {
    let fx = Fixture::new().await;
    let plumber = fx.provider(Some("Plumber")).await;
    let first = fx.book(Uuid::new_v4(), &fx.plumbing, 9).await;
    let second = fx.book(Uuid::new_v4(), &fx.plumbing, 9).await;

    fx.engine
        .transition_status(first.id, BookingStatus::Confirmed, Actor::Provider(plumber))
        .await
        .unwrap();
    fx.engine
        .transition_status(first.id, BookingStatus::Cancelled, Actor::Provider(plumber))
        .await
        .unwrap();

    fx.engine
        .transition_status(second.id, BookingStatus::Confirmed, Actor::Provider(plumber))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_decline_records_provider_and_notifies_owner() {
    let fx = Fixture::new().await;
    let plumber = fx.provider(Some("Plumber")).await;
    let other = fx.provider(Some("Plumber")).await;
    let owner = Uuid::new_v4();
    let booking = fx.book(owner, &fx.plumbing, 9).await;

    let declined = fx
        .engine
        .transition_status(booking.id, BookingStatus::Declined, Actor::Provider(plumber))
        .await
        .unwrap();
    assert_eq!(declined.status, BookingStatus::Declined);
    assert_eq!(declined.provider_id, Some(plumber));
    assert!(declined.is_consistent());

    let notices = fx.notifier.recorded().await;
    let notice = notices
        .iter()
        .find(|n| n.kind == NotificationKind::BookingDeclined)
        .unwrap();
    assert_eq!(notice.user_id, Some(owner));

    let err = fx
        .engine
        .transition_status(booking.id, BookingStatus::Declined, Actor::Provider(other))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "BOOKING_NOT_ASSIGNED");

    let err = fx
        .engine
        .transition_status(booking.id, BookingStatus::Declined, Actor::Provider(plumber))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_STATUS_TRANSITION");
}

#[tokio::test]
async fn test_any_provider_may_cancel_unclaimed_booking() {
    let fx = Fixture::new().await;
    let electrician = fx.provider(Some("Electrician")).await;
    let booking = fx.book(Uuid::new_v4(), &fx.plumbing, 9).await;

    let cancelled = fx
        .engine
        .transition_status(booking.id, BookingStatus::Cancelled, Actor::Provider(electrician))
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.provider_id, Some(electrician));
}

#[tokio::test]
async fn test_only_holder_completes() {
    let fx = Fixture::new().await;
    let plumber = fx.provider(Some("Plumber")).await;
    let other = fx.provider(Some("Plumber")).await;
    let booking = fx.book(Uuid::new_v4(), &fx.plumbing, 9).await;
    fx.engine
        .transition_status(booking.id, BookingStatus::Confirmed, Actor::Provider(plumber))
        .await
        .unwrap();

    let err = fx
        .engine
        .transition_status(booking.id, BookingStatus::Completed, Actor::Provider(other))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "BOOKING_NOT_ASSIGNED");

    let err = fx
        .engine
        .transition_status(booking.id, BookingStatus::Cancelled, Actor::Provider(other))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "BOOKING_NOT_ASSIGNED");
}

#[tokio::test]
async fn test_unknown_booking() {
    let fx = Fixture::new().await;
    let err = fx
        .engine
        .transition_status(Uuid::new_v4(), BookingStatus::Cancelled, Actor::User(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "BOOKING_NOT_FOUND");
}

#[tokio::test]
async fn test_notification_failure_does_not_fail_operations() {
    let fx = Fixture::new().await;
    let plumber = fx.provider(Some("Plumber")).await;
    fx.notifier.set_failing(true);

    let booking = fx.book(Uuid::new_v4(), &fx.plumbing, 9).await;
    let confirmed = fx
        .engine
        .transition_status(booking.id, BookingStatus::Confirmed, Actor::Provider(plumber))
        .await
        .unwrap();

    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert!(fx.notifier.recorded().await.is_empty());
}

#[tokio::test]
async fn test_provider_listing_filters() {
    let fx = Fixture::new().await;
    let plumber = fx.provider(Some("Plumber")).await;
    let claimed = fx.book(Uuid::new_v4(), &fx.plumbing, 9).await;
    let open = fx.book(Uuid::new_v4(), &fx.plumbing, 11).await;
    fx.book(Uuid::new_v4(), &fx.electrical, 11).await;
    fx.engine
        .transition_status(claimed.id, BookingStatus::Confirmed, Actor::Provider(plumber))
        .await
        .unwrap();

    let all = fx.engine.list_for_provider(plumber, None).await.unwrap();
    assert_eq!(all.len(), 2);

    let pending = fx
        .engine
        .list_for_provider(plumber, Some(BookingStatus::Pending))
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, open.id);

    let confirmed = fx
        .engine
        .list_for_provider(plumber, Some(BookingStatus::Confirmed))
        .await
        .unwrap();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].id, claimed.id);

    let err = fx
        .engine
        .list_for_provider(Uuid::new_v4(), None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "PROVIDER_PROFILE_NOT_FOUND");
}

#[tokio::test]
async fn test_roleless_provider_sees_only_assigned() {
    let fx = Fixture::new().await;
    let provider = fx.provider(Some("Plumber")).await;
    let claimed = fx.book(Uuid::new_v4(), &fx.plumbing, 9).await;
    let open = fx.book(Uuid::new_v4(), &fx.plumbing, 11).await;
    fx.engine
        .transition_status(claimed.id, BookingStatus::Confirmed, Actor::Provider(provider))
        .await
        .unwrap();

    // Role revoked after the claim
    fx.directory
        .insert_provider(ProviderProfile::new(provider, None))
        .await;

    let seen = fx.engine.list_for_provider(provider, None).await.unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].id, claimed.id);

    let err = fx
        .engine
        .transition_status(open.id, BookingStatus::Declined, Actor::Provider(provider))
        .await
        .unwrap_err();
    assert_eq!(
        domain_err(err),
        DomainError::category_not_allowed("Plumbing", None)
    );

    let untouched = fx.bookings.find_by_id(open.id).await.unwrap().unwrap();
    assert_eq!(untouched.status, BookingStatus::Pending);
    assert_eq!(untouched.provider_id, None);
}

#[tokio::test]
async fn test_roleless_provider_cannot_close_open_booking() {
    let fx = Fixture::new().await;
    let unverified = fx.provider(None).await;
    let booking = fx.book(Uuid::new_v4(), &fx.plumbing, 9).await;

    for status in [BookingStatus::Declined, BookingStatus::Cancelled] {
        let err = fx
            .engine
            .transition_status(booking.id, status, Actor::Provider(unverified))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CATEGORY_NOT_ALLOWED");
    }

    assert_eq!(fx.count(NotificationKind::BookingDeclined).await, 0);
    assert_eq!(fx.count(NotificationKind::BookingCancelled).await, 0);
    let seen = fx.engine.list_for_provider(unverified, None).await.unwrap();
    assert!(seen.is_empty());
}

#[tokio::test]
async fn test_unknown_provider_cannot_close_open_booking() {
    let fx = Fixture::new().await;
    let stranger = Uuid::new_v4();
    let booking = fx.book(Uuid::new_v4(), &fx.plumbing, 9).await;

    for status in [BookingStatus::Declined, BookingStatus::Cancelled] {
        let err = fx
            .engine
            .transition_status(booking.id, status, Actor::Provider(stranger))
            .await
            .unwrap_err();
        assert_eq!(domain_err(err), DomainError::ProviderProfileNotFound);
    }

    let untouched = fx.bookings.find_by_id(booking.id).await.unwrap().unwrap();
    assert_eq!(untouched.status, BookingStatus::Pending);
    assert!(untouched.provider_id.is_none());
}

#[tokio::test]
async fn test_user_listing_newest_first() {
    let fx = Fixture::new().await;
    let owner = Uuid::new_v4();
    let early = fx
        .engine
        .create_booking(
            owner,
            CreateBooking {
                date: day().pred_opt().unwrap(),
                ..request(&fx.plumbing, 9)
            },
        )
        .await
        .unwrap();
    let first_today = fx.book(owner, &fx.electrical, 9).await;
    let second_today = fx.book(owner, &fx.plumbing, 15).await;
    fx.book(Uuid::new_v4(), &fx.plumbing, 9).await;

    let listed = fx.engine.list_for_user(owner, None).await.unwrap();
    let ids: Vec<Uuid> = listed.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![second_today.id, first_today.id, early.id]);

    fx.engine
        .transition_status(early.id, BookingStatus::Cancelled, Actor::User(owner))
        .await
        .unwrap();
    let cancelled = fx
        .engine
        .list_for_user(owner, Some(BookingStatus::Cancelled))
        .await
        .unwrap();
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled[0].id, early.id);
}

#[tokio::test]
async fn test_get_booking_visibility() {
    let fx = Fixture::new().await;
    let plumber = fx.provider(Some("Plumber")).await;
    let electrician = fx.provider(Some("Electrician")).await;
    let owner = Uuid::new_v4();
    let booking = fx.book(owner, &fx.plumbing, 9).await;

    assert!(fx.engine.get_booking(booking.id, Actor::User(owner)).await.is_ok());
    assert!(fx.engine.get_booking(booking.id, Actor::Provider(plumber)).await.is_ok());

    let err = fx
        .engine
        .get_booking(booking.id, Actor::Provider(electrician))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "BOOKING_NOT_FOUND");

    let err = fx
        .engine
        .get_booking(booking.id, Actor::User(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "BOOKING_NOT_FOUND");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_claims_have_one_winner() {
    let fx = Fixture::new().await;
    let booking = fx.book(Uuid::new_v4(), &fx.plumbing, 9).await;
    let booking_id = booking.id;

    let mut providers = Vec::new();
    for _ in 0..8 {
        providers.push(fx.provider(Some("Plumber")).await);
    }

    let handles: Vec<_> = providers
        .into_iter()
        .map(|provider_id| {
            let engine = fx.engine.clone();
            tokio::spawn(async move {
                engine
                    .transition_status(
                        booking_id,
                        BookingStatus::Confirmed,
                        Actor::Provider(provider_id),
                    )
                    .await
            })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(err) => assert_eq!(domain_err(err), DomainError::BookingAlreadyAssigned),
        }
    }
    assert_eq!(winners, 1);

    let stored = fx.bookings.find_by_id(booking_id).await.unwrap().unwrap();
    assert_eq!(stored.status, BookingStatus::Confirmed);
    assert!(stored.provider_id.is_some());
    assert_eq!(fx.count(NotificationKind::BookingAccepted).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_claims_in_one_slot_keep_slot_unique() {
    let fx = Fixture::new().await;
    let plumber = fx.provider(Some("Plumber")).await;

    let mut bookings = Vec::new();
    for _ in 0..6 {
        bookings.push(fx.book(Uuid::new_v4(), &fx.plumbing, 9).await);
    }

    let handles: Vec<_> = bookings
        .iter()
        .map(|booking| {
            let engine = fx.engine.clone();
            let booking_id = booking.id;
            tokio::spawn(async move {
                engine
                    .transition_status(
                        booking_id,
                        BookingStatus::Confirmed,
                        Actor::Provider(plumber),
                    )
                    .await
            })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(err) => assert_eq!(err.code(), "DUPLICATE_BOOKING_TIME"),
        }
    }
    assert_eq!(winners, 1);

    let held = fx
        .bookings
        .find_by_provider(plumber, Some(BookingStatus::Confirmed))
        .await
        .unwrap();
    assert_eq!(held.len(), 1);
}

//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, TimeZone, Utc};
use gather_core::{
  event::{EventPatch, NewEvent},
  store::{GatherStore, Stats},
  user::{NewUser, Role, UserQuery, UserUpdate},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_user(email: &str, role: Role) -> NewUser {
  NewUser {
    first_name:    "Grace".into(),
    last_name:     "Hopper".into(),
    email:         email.into(),
    password_hash: "$argon2id$v=19$placeholder".into(),
    role,
  }
}

fn new_event(title: &str, days_from_now: i64) -> NewEvent {
  NewEvent {
    title:       title.into(),
    description: "Bring a laptop".into(),
    location:    "Main hall".into(),
    starts_at:   Utc::now() + Duration::days(days_from_now),
    category:    Some("workshop".into()),
  }
}

fn core_err(e: Error) -> gather_core::Error { e.into() }

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_user() {
  let s = store().await;

  let user = s.create_user(new_user("grace@navy.mil", Role::Student)).await.unwrap();
  assert_eq!(user.role, Role::Student);
  assert!(user.photo.is_none());

  let fetched = s.get_user(user.user_id).await.unwrap().unwrap();
  assert_eq!(fetched.email, "grace@navy.mil");
  assert_eq!(fetched.password_hash, user.password_hash);
  assert_eq!(fetched.created_at, user.created_at);

  let by_email = s.find_user_by_email("grace@navy.mil").await.unwrap().unwrap();
  assert_eq!(by_email.user_id, user.user_id);
}

#[tokio::test]
async fn get_user_missing_returns_none() {
  let s = store().await;
  assert!(s.get_user(Uuid::new_v4()).await.unwrap().is_none());
  assert!(s.find_user_by_email("nobody@x.com").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
  let s = store().await;
  s.create_user(new_user("a@x.com", Role::Student)).await.unwrap();

  let err = s.create_user(new_user("a@x.com", Role::Organizer)).await.unwrap_err();
  assert!(matches!(core_err(err), gather_core::Error::EmailTaken(e) if e == "a@x.com"));
}

#[tokio::test]
async fn update_user_replaces_profile_fields() {
  let s = store().await;
  let user = s.create_user(new_user("a@x.com", Role::Student)).await.unwrap();

  let updated = s
    .update_user(user.user_id, UserUpdate {
      first_name:    "Amazing".into(),
      last_name:     "Grace".into(),
      email:         "grace@x.com".into(),
      password_hash: None,
    })
    .await
    .unwrap();
  assert_eq!(updated.first_name, "Amazing");
  assert_eq!(updated.password_hash, user.password_hash);

  let fetched = s.get_user(user.user_id).await.unwrap().unwrap();
  assert_eq!(fetched.email, "grace@x.com");
  assert!(s.find_user_by_email("a@x.com").await.unwrap().is_none());
}

#[tokio::test]
async fn update_user_keeping_own_email_is_allowed() {
  let s = store().await;
  let user = s.create_user(new_user("a@x.com", Role::Student)).await.unwrap();

  let updated = s
    .update_user(user.user_id, UserUpdate {
      first_name:    "G".into(),
      last_name:     "H".into(),
      email:         "a@x.com".into(),
      password_hash: Some("$argon2id$new".into()),
    })
    .await
    .unwrap();
  assert_eq!(updated.password_hash, "$argon2id$new");
}

#[tokio::test]
async fn update_user_to_taken_email_conflicts() {
  let s = store().await;
  s.create_user(new_user("a@x.com", Role::Student)).await.unwrap();
  let b = s.create_user(new_user("b@x.com", Role::Student)).await.unwrap();

  let err = s
    .update_user(b.user_id, UserUpdate {
      first_name:    "B".into(),
      last_name:     "B".into(),
      email:         "a@x.com".into(),
      password_hash: None,
    })
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), gather_core::Error::EmailTaken(_)));
}

#[tokio::test]
async fn set_user_photo_roundtrip() {
  let s = store().await;
  let user = s.create_user(new_user("a@x.com", Role::Student)).await.unwrap();

  let updated = s
    .set_user_photo(user.user_id, Some("1700000000000-123456789.png".into()))
    .await
    .unwrap();
  assert_eq!(updated.photo.as_deref(), Some("1700000000000-123456789.png"));

  let fetched = s.get_user(user.user_id).await.unwrap().unwrap();
  assert_eq!(fetched.photo, updated.photo);
}

#[tokio::test]
async fn set_photo_for_missing_user_is_not_found() {
  let s = store().await;
  let err = s.set_user_photo(Uuid::new_v4(), None).await.unwrap_err();
  assert!(matches!(core_err(err), gather_core::Error::UserNotFound(_)));
}

#[tokio::test]
async fn list_users_applies_exclusions() {
  let s = store().await;
  let me = s.create_user(new_user("me@x.com", Role::Student)).await.unwrap();
  let peer = s.create_user(new_user("peer@x.com", Role::Student)).await.unwrap();
  s.create_user(new_user("org@x.com", Role::Organizer)).await.unwrap();

  assert_eq!(s.list_users(&UserQuery::default()).await.unwrap().len(), 3);

  let suggestions = s
    .list_users(&UserQuery {
      exclude_user: Some(me.user_id),
      exclude_role: Some(Role::Organizer),
    })
    .await
    .unwrap();
  assert_eq!(suggestions.len(), 1);
  assert_eq!(suggestions[0].user_id, peer.user_id);
}

// ─── Events ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_event() {
  let s = store().await;
  let owner = Uuid::new_v4();

  let event = s.create_event(owner, new_event("Hackathon", 3)).await.unwrap();
  assert_eq!(event.owner_id, owner);

  let fetched = s.get_event(event.event_id).await.unwrap().unwrap();
  assert_eq!(fetched.title, "Hackathon");
  assert_eq!(fetched.category.as_deref(), Some("workshop"));
  assert_eq!(fetched.starts_at, event.starts_at);
  assert!(fetched.likes.is_empty());
}

#[tokio::test]
async fn create_event_requires_descriptive_fields() {
  let s = store().await;
  let mut input = new_event("Hackathon", 1);
  input.title = "   ".into();
  let err = s.create_event(Uuid::new_v4(), input).await.unwrap_err();
  assert!(matches!(core_err(err), gather_core::Error::Invalid(_)));
  assert!(s.list_events().await.unwrap().is_empty());
}

#[tokio::test]
async fn list_events_orders_by_start() {
  let s = store().await;
  let owner = Uuid::new_v4();
  s.create_event(owner, new_event("Later", 10)).await.unwrap();
  s.create_event(owner, new_event("Sooner", 1)).await.unwrap();

  let titles: Vec<_> = s
    .list_events()
    .await
    .unwrap()
    .into_iter()
    .map(|e| e.title)
    .collect();
  assert_eq!(titles, ["Sooner", "Later"]);
}

#[tokio::test]
async fn owner_can_update_event() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let event = s.create_event(owner, new_event("Hackathon", 3)).await.unwrap();
  let new_start = Utc.with_ymd_and_hms(2031, 1, 2, 9, 30, 0).unwrap();

  let updated = s
    .update_event(event.event_id, owner, EventPatch {
      title: Some("Hackathon 2".into()),
      starts_at: Some(new_start),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(updated.title, "Hackathon 2");

  let fetched = s.get_event(event.event_id).await.unwrap().unwrap();
  assert_eq!(fetched.title, "Hackathon 2");
  assert_eq!(fetched.starts_at, new_start);
  assert_eq!(fetched.location, "Main hall");
}

#[tokio::test]
async fn non_owner_cannot_update_or_delete() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let stranger = Uuid::new_v4();
  let event = s.create_event(owner, new_event("Hackathon", 3)).await.unwrap();

  let patch = EventPatch { title: Some("Mine now".into()), ..Default::default() };
  let err = s.update_event(event.event_id, stranger, patch).await.unwrap_err();
  assert!(matches!(core_err(err), gather_core::Error::NotOwner { .. }));

  let err = s.delete_event(event.event_id, stranger).await.unwrap_err();
  assert!(matches!(core_err(err), gather_core::Error::NotOwner { .. }));

  let fetched = s.get_event(event.event_id).await.unwrap().unwrap();
  assert_eq!(fetched.title, "Hackathon");
}

#[tokio::test]
async fn owner_can_delete_event() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let event = s.create_event(owner, new_event("Hackathon", 3)).await.unwrap();

  s.delete_event(event.event_id, owner).await.unwrap();
  assert!(s.get_event(event.event_id).await.unwrap().is_none());

  let err = s.delete_event(event.event_id, owner).await.unwrap_err();
  assert!(matches!(core_err(err), gather_core::Error::EventNotFound(_)));
}

#[tokio::test]
async fn mutations_on_missing_event_are_not_found() {
  let s = store().await;
  let id = Uuid::new_v4();
  let actor = Uuid::new_v4();

  let err = s.like_event(id, actor).await.unwrap_err();
  assert!(matches!(core_err(err), gather_core::Error::EventNotFound(e) if e == id));

  let err = s.add_comment(id, actor, "hi".into()).await.unwrap_err();
  assert!(matches!(core_err(err), gather_core::Error::EventNotFound(_)));

  let err = s.update_event(id, actor, EventPatch::default()).await.unwrap_err();
  assert!(matches!(core_err(err), gather_core::Error::EventNotFound(_)));
}

#[tokio::test]
async fn likes_are_a_set() {
  let s = store().await;
  let event = s.create_event(Uuid::new_v4(), new_event("Gig", 2)).await.unwrap();
  let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

  s.like_event(event.event_id, a).await.unwrap();
  s.like_event(event.event_id, b).await.unwrap();
  let twice = s.like_event(event.event_id, a).await.unwrap();
  assert_eq!(twice.likes, vec![a, b]);

  let fetched = s.get_event(event.event_id).await.unwrap().unwrap();
  assert_eq!(fetched.likes, vec![a, b]);

  let after = s.unlike_event(event.event_id, a).await.unwrap();
  assert_eq!(after.likes, vec![b]);
  let fetched = s.get_event(event.event_id).await.unwrap().unwrap();
  assert_eq!(fetched.likes, vec![b]);
}

#[tokio::test]
async fn comments_are_appended() {
  let s = store().await;
  let event = s.create_event(Uuid::new_v4(), new_event("Gig", 2)).await.unwrap();
  let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

  s.add_comment(event.event_id, a, "See you there".into()).await.unwrap();
  let updated = s.add_comment(event.event_id, b, " Me too ".into()).await.unwrap();
  assert_eq!(updated.comments.len(), 2);

  let fetched = s.get_event(event.event_id).await.unwrap().unwrap();
  assert_eq!(fetched.comments[0].author_id, a);
  assert_eq!(fetched.comments[1].author_id, b);
  assert_eq!(fetched.comments[1].text, "Me too");

  let err = s.add_comment(event.event_id, a, "   ".into()).await.unwrap_err();
  assert!(matches!(core_err(err), gather_core::Error::Invalid(_)));
}

// ─── Statistics ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn stats_on_empty_store_are_zero() {
  let s = store().await;
  assert_eq!(s.stats().await.unwrap(), Stats::default());
}

#[tokio::test]
async fn stats_count_users_events_and_reactions() {
  let s = store().await;
  let a = s.create_user(new_user("a@x.com", Role::Student)).await.unwrap();
  let b = s.create_user(new_user("b@x.com", Role::Student)).await.unwrap();
  let org = s.create_user(new_user("o@x.com", Role::Organizer)).await.unwrap();

  let e1 = s.create_event(org.user_id, new_event("One", 1)).await.unwrap();
  let e2 = s.create_event(org.user_id, new_event("Two", 2)).await.unwrap();
  s.like_event(e1.event_id, a.user_id).await.unwrap();
  s.like_event(e1.event_id, b.user_id).await.unwrap();
  s.like_event(e2.event_id, a.user_id).await.unwrap();
  s.add_comment(e2.event_id, b.user_id, "nice".into()).await.unwrap();

  let stats = s.stats().await.unwrap();
  assert_eq!(stats, Stats {
    users:      3,
    students:   2,
    organizers: 1,
    events:     2,
    likes:      3,
    comments:   1,
  });
}

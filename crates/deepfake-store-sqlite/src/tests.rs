//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{DateTime, TimeDelta, TimeZone as _, Utc};
use deepfake_core::{
  artifact::Freshness,
  deployment::DeploymentKind,
  scope::{ActionContext, ExternalId, Scope},
  settings::MarkovSettings,
  store::TrainerStore,
};

use crate::SqliteStore;

const TRAINER: u64 = 1_000_000_000_000_000_001;
const OTHER_TRAINER: u64 = 1_000_000_000_000_000_002;
const SERVER: u64 = 700_000_000_000_000_000;
const SUBJECT: u64 = 900_000_000_000_000_000;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

/// A store with the trainer already registered.
async fn store_with_trainer() -> SqliteStore {
  let s = store().await;
  s.register_trainer(ExternalId(TRAINER), "trainer#0001".into())
    .await
    .unwrap();
  s
}

fn scope() -> Scope { Scope::new(TRAINER, SERVER, SUBJECT) }

fn ctx() -> ActionContext { ActionContext::new(scope(), "subject#1234", "Test Server") }

fn ctx_for(trainer: u64) -> ActionContext {
  ActionContext::new(
    Scope::new(trainer, SERVER, SUBJECT),
    "subject#1234",
    "Test Server",
  )
}

fn words(ws: &[&str]) -> Vec<String> { ws.iter().map(|w| w.to_string()).collect() }

fn fixed(at: DateTime<Utc>) -> impl Fn() -> DateTime<Utc> + Send + Sync + 'static {
  move || at
}

fn t0() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap() }

// ─── Trainers ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_trainer_twice_creates_one_row_and_one_welcome() {
  let s = store().await;

  let first = s
    .register_trainer(ExternalId(TRAINER), "trainer#0001".into())
    .await
    .unwrap();
  let second = s
    .register_trainer(ExternalId(TRAINER), "renamed#0002".into())
    .await
    .unwrap();

  assert!(first.is_created());
  assert!(first.welcome().is_some());
  assert!(!second.is_created());
  assert!(second.welcome().is_none());
  assert_eq!(first.get().id, second.get().id);
  // The second call wrote nothing, not even the new name.
  assert_eq!(second.get().user_name, "trainer#0001");
  assert_eq!(s.count_rows("SELECT COUNT(*) FROM trainers").await.unwrap(), 1);
}

#[tokio::test]
async fn new_trainer_is_subscribed() {
  let s = store_with_trainer().await;
  let trainer = s.get_trainer(ExternalId(TRAINER)).await.unwrap().unwrap();
  assert!(trainer.subscribed);
  assert_eq!(trainer.user_id, ExternalId(TRAINER));
}

#[tokio::test]
async fn external_ids_above_i64_max_roundtrip() {
  let s = store().await;
  let id = ExternalId(u64::MAX - 7);
  s.register_trainer(id, "big".into()).await.unwrap();
  let trainer = s.get_trainer(id).await.unwrap().unwrap();
  assert_eq!(trainer.user_id, id);
}

#[tokio::test]
async fn set_subscription_toggles_flag() {
  let s = store_with_trainer().await;

  let t = s.set_subscription(ExternalId(TRAINER), false).await.unwrap();
  assert!(!t.subscribed);
  assert!(s.subscribed_trainers().await.unwrap().is_empty());

  let t = s.set_subscription(ExternalId(TRAINER), true).await.unwrap();
  assert!(t.subscribed);
  assert_eq!(s.subscribed_trainers().await.unwrap(), vec![ExternalId(TRAINER)]);
}

#[tokio::test]
async fn set_subscription_unknown_trainer_is_not_found() {
  let s = store().await;
  let err = s.set_subscription(ExternalId(42), false).await.unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(deepfake_core::Error::TrainerNotFound(ExternalId(42)))
  ));
}

#[tokio::test]
async fn concurrent_registrations_create_one_trainer() {
  let s = store().await;

  let (a, b) = tokio::join!(
    s.register_trainer(ExternalId(TRAINER), "trainer#0001".into()),
    s.register_trainer(ExternalId(TRAINER), "trainer#0001".into()),
  );
  let (a, b) = (a.unwrap(), b.unwrap());

  assert_eq!(
    [a.is_created(), b.is_created()].iter().filter(|c| **c).count(),
    1
  );
  assert_eq!(a.get().id, b.get().id);
  assert_eq!(s.count_rows("SELECT COUNT(*) FROM trainers").await.unwrap(), 1);
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_subject_is_idempotent() {
  let s = store_with_trainer().await;

  for i in 0..5 {
    let reg = s.register_subject(ctx()).await.unwrap();
    assert_eq!(reg.is_created(), i == 0);
  }
  assert_eq!(s.count_rows("SELECT COUNT(*) FROM subjects").await.unwrap(), 1);

  let subject = s.get_subject(scope()).await.unwrap().unwrap();
  assert_eq!(subject.scope, scope());
  assert_eq!(subject.subject_name, "subject#1234");
  assert_eq!(subject.server_name, "Test Server");
}

#[tokio::test]
async fn register_subject_requires_registered_trainer() {
  let s = store().await;
  let err = s.register_subject(ctx()).await.unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(deepfake_core::Error::TrainerNotFound(_))
  ));
  assert_eq!(s.count_rows("SELECT COUNT(*) FROM subjects").await.unwrap(), 0);
}

#[tokio::test]
async fn same_person_on_another_server_is_another_subject() {
  let s = store_with_trainer().await;
  s.register_subject(ctx()).await.unwrap();
  let elsewhere = ActionContext::new(
    Scope::new(TRAINER, SERVER + 1, SUBJECT),
    "subject#1234",
    "Other Server",
  );
  assert!(s.register_subject(elsewhere).await.unwrap().is_created());
  assert_eq!(s.count_rows("SELECT COUNT(*) FROM subjects").await.unwrap(), 2);
}

#[tokio::test]
async fn get_subject_missing_returns_none() {
  let s = store_with_trainer().await;
  assert!(s.get_subject(scope()).await.unwrap().is_none());
}

// ─── Cross-tenant isolation ──────────────────────────────────────────────────

#[tokio::test]
async fn trainers_do_not_see_each_others_subjects() {
  let s = store_with_trainer().await;
  s.register_trainer(ExternalId(OTHER_TRAINER), "other#0002".into())
    .await
    .unwrap();

  let mine = s.register_subject(ctx_for(TRAINER)).await.unwrap().into_inner();
  let theirs = s
    .register_subject(ctx_for(OTHER_TRAINER))
    .await
    .unwrap()
    .into_inner();
  assert_ne!(mine.id, theirs.id);

  s.add_filter(ctx_for(TRAINER), "secret".into()).await.unwrap();
  s.update_settings(
    ctx_for(TRAINER),
    MarkovSettings { state_size: 5, newline: true },
  )
  .await
  .unwrap();

  assert!(s.list_filters(ctx_for(OTHER_TRAINER)).await.unwrap().is_empty());
  assert_eq!(
    s.settings(ctx_for(OTHER_TRAINER)).await.unwrap(),
    MarkovSettings::default()
  );
  assert_eq!(s.list_filters(ctx_for(TRAINER)).await.unwrap(), words(&["secret"]));
}

#[tokio::test]
async fn data_sets_are_scoped_to_their_trainer() {
  let s = store_with_trainer().await;
  s.register_trainer(ExternalId(OTHER_TRAINER), "other#0002".into())
    .await
    .unwrap();
  s.register_subject(ctx_for(TRAINER)).await.unwrap();
  s.register_subject(ctx_for(OTHER_TRAINER)).await.unwrap();

  s.record_data_set(scope(), "mine".into()).await.unwrap();

  let theirs = s
    .latest_data_set(Scope::new(OTHER_TRAINER, SERVER, SUBJECT))
    .await
    .unwrap();
  assert!(theirs.is_absent());
}

// ─── Filters ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_filter_registers_subject_lazily() {
  let s = store_with_trainer().await;
  assert!(s.add_filter(ctx(), "hello".into()).await.unwrap());
  assert!(s.get_subject(scope()).await.unwrap().is_some());
}

#[tokio::test]
async fn add_filter_twice_leaves_one_row() {
  let s = store_with_trainer().await;
  assert!(s.add_filter(ctx(), "hello".into()).await.unwrap());
  assert!(!s.add_filter(ctx(), "hello".into()).await.unwrap());
  assert_eq!(
    s.count_rows("SELECT COUNT(*) FROM text_filters WHERE word = 'hello'")
      .await
      .unwrap(),
    1
  );
}

#[tokio::test]
async fn add_filters_returns_only_new_words_in_input_order() {
  let s = store_with_trainer().await;
  s.add_filter(ctx(), "b".into()).await.unwrap();

  let added = s
    .add_filters(ctx(), words(&["c", "b", "a", "c"]))
    .await
    .unwrap();
  assert_eq!(added, words(&["c", "a"]));

  let listed = s.list_filters(ctx()).await.unwrap();
  assert_eq!(listed, words(&["b", "c", "a"]));
}

#[tokio::test]
async fn add_filters_all_present_adds_nothing() {
  let s = store_with_trainer().await;
  s.add_filters(ctx(), words(&["x", "y"])).await.unwrap();
  let added = s.add_filters(ctx(), words(&["y", "x"])).await.unwrap();
  assert!(added.is_empty());
  assert_eq!(
    s.count_rows("SELECT COUNT(*) FROM text_filters").await.unwrap(),
    2
  );
}

#[tokio::test]
async fn remove_missing_filter_returns_false() {
  let s = store_with_trainer().await;
  s.add_filter(ctx(), "keep".into()).await.unwrap();
  assert!(!s.remove_filter(ctx(), "nope".into()).await.unwrap());
  assert_eq!(s.list_filters(ctx()).await.unwrap(), words(&["keep"]));
}

#[tokio::test]
async fn remove_filter_deletes_word() {
  let s = store_with_trainer().await;
  s.add_filters(ctx(), words(&["one", "two"])).await.unwrap();
  assert!(s.remove_filter(ctx(), "one".into()).await.unwrap());
  assert_eq!(s.list_filters(ctx()).await.unwrap(), words(&["two"]));
}

#[tokio::test]
async fn clear_filters_empties_subject() {
  let s = store_with_trainer().await;
  assert_eq!(s.clear_filters(ctx()).await.unwrap(), 0);

  s.add_filters(ctx(), words(&["one", "two", "three"])).await.unwrap();
  assert_eq!(s.clear_filters(ctx()).await.unwrap(), 3);
  assert!(s.list_filters(ctx()).await.unwrap().is_empty());
}

#[tokio::test]
async fn filter_ops_require_registered_trainer() {
  let s = store().await;
  let err = s.add_filter(ctx(), "x".into()).await.unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(deepfake_core::Error::TrainerNotFound(_))
  ));
}

#[tokio::test]
async fn concurrent_filter_adds_leave_one_row() {
  let s = store_with_trainer().await;

  let (a, b) = tokio::join!(
    s.add_filter(ctx(), "spoiler".into()),
    s.add_filter(ctx(), "spoiler".into()),
  );

  assert_ne!(a.unwrap(), b.unwrap());
  assert_eq!(
    s.count_rows("SELECT COUNT(*) FROM text_filters").await.unwrap(),
    1
  );
  assert_eq!(s.count_rows("SELECT COUNT(*) FROM subjects").await.unwrap(), 1);
}

// ─── Markov settings ─────────────────────────────────────────────────────────

#[tokio::test]
async fn settings_default_without_writing_a_row() {
  let s = store_with_trainer().await;
  assert_eq!(s.settings(ctx()).await.unwrap(), MarkovSettings::default());
  assert_eq!(
    s.count_rows("SELECT COUNT(*) FROM markov_settings").await.unwrap(),
    0
  );
}

#[tokio::test]
async fn update_settings_inserts_then_updates_in_place() {
  let s = store_with_trainer().await;
  let first = MarkovSettings { state_size: 2, newline: true };
  let second = MarkovSettings { state_size: 4, newline: false };

  s.update_settings(ctx(), first).await.unwrap();
  assert_eq!(s.settings(ctx()).await.unwrap(), first);
  let id_before = s
    .count_rows("SELECT MAX(id) FROM markov_settings")
    .await
    .unwrap();

  s.update_settings(ctx(), second).await.unwrap();
  assert_eq!(s.settings(ctx()).await.unwrap(), second);
  assert_eq!(
    s.count_rows("SELECT COUNT(*) FROM markov_settings").await.unwrap(),
    1
  );
  // Same row, mutated rather than replaced.
  assert_eq!(
    s.count_rows("SELECT MAX(id) FROM markov_settings").await.unwrap(),
    id_before
  );
}

#[tokio::test]
async fn update_settings_collapses_duplicate_rows() {
  let s = store_with_trainer().await;
  s.register_subject(ctx()).await.unwrap();

  // Simulate a database written before the uniqueness index existed.
  s.execute_raw(
    "DROP INDEX markov_settings_subject_idx;
     INSERT INTO markov_settings (subject_id, state_size, newline) VALUES (1, 2, 0);
     INSERT INTO markov_settings (subject_id, state_size, newline) VALUES (1, 5, 1);",
  )
  .await
  .unwrap();
  // Ambiguous state reads as defaults.
  assert_eq!(s.settings(ctx()).await.unwrap(), MarkovSettings::default());

  let wanted = MarkovSettings { state_size: 6, newline: true };
  s.update_settings(ctx(), wanted).await.unwrap();

  assert_eq!(
    s.count_rows("SELECT COUNT(*) FROM markov_settings").await.unwrap(),
    1
  );
  assert_eq!(s.settings(ctx()).await.unwrap(), wanted);
}

// ─── Artifacts ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn record_data_set_requires_subject() {
  let s = store_with_trainer().await;
  let err = s.record_data_set(scope(), "ds".into()).await.unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(deepfake_core::Error::SubjectNotFound(sc)) if sc == scope()
  ));
}

#[tokio::test]
async fn latest_data_set_absent_when_none_recorded() {
  let s = store_with_trainer().await;
  s.register_subject(ctx()).await.unwrap();
  assert_eq!(s.latest_data_set(scope()).await.unwrap(), Freshness::Absent);
}

#[tokio::test]
async fn latest_data_set_is_most_recently_recorded() {
  let s = store_with_trainer().await.with_clock(fixed(t0()));
  s.register_subject(ctx()).await.unwrap();

  // Same timestamp for both: order comes from the row sequence.
  s.record_data_set(scope(), "older".into()).await.unwrap();
  s.record_data_set(scope(), "newer".into()).await.unwrap();

  let got = s.latest_data_set(scope()).await.unwrap();
  assert_eq!(got.fresh_uid(), Some("newer"));
}

#[tokio::test]
async fn data_set_freshness_boundary() {
  let s = store_with_trainer().await.with_clock(fixed(t0()));
  s.register_subject(ctx()).await.unwrap();
  s.record_data_set(scope(), "ds-1".into()).await.unwrap();

  let at = |days| s.clone().with_clock(fixed(t0() + TimeDelta::days(days)));

  let day29 = at(29).latest_data_set(scope()).await.unwrap();
  assert_eq!(day29.fresh_uid(), Some("ds-1"));

  let day30 = at(30).latest_data_set(scope()).await.unwrap();
  assert!(day30.is_expired());

  let day31 = at(31).latest_data_set(scope()).await.unwrap();
  assert_eq!(
    day31,
    Freshness::Expired { uid: "ds-1".into(), collected_at: t0() }
  );
}

#[tokio::test]
async fn duplicate_data_set_uid_is_rejected() {
  let s = store_with_trainer().await;
  s.register_subject(ctx()).await.unwrap();
  s.record_data_set(scope(), "same".into()).await.unwrap();
  let err = s.record_data_set(scope(), "same".into()).await.unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(deepfake_core::Error::DuplicateArtifact(_))
  ));
  assert_eq!(s.count_rows("SELECT COUNT(*) FROM data_sets").await.unwrap(), 1);
}

#[tokio::test]
async fn record_model_unknown_data_set_is_not_found() {
  let s = store().await;
  let err = s
    .record_model("missing".into(), "m".into())
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(deepfake_core::Error::DataSetNotFound(ref uid)) if uid == "missing"
  ));
}

#[tokio::test]
async fn model_freshness_boundary() {
  let s = store_with_trainer().await.with_clock(fixed(t0()));
  s.register_subject(ctx()).await.unwrap();
  s.record_data_set(scope(), "ds".into()).await.unwrap();
  let model = s.record_model("ds".into(), "model-1".into()).await.unwrap();
  assert_eq!(model.time_collected, t0());

  let at = |days| s.clone().with_clock(fixed(t0() + TimeDelta::days(days)));

  assert_eq!(
    at(29).latest_model(scope()).await.unwrap().fresh_uid(),
    Some("model-1")
  );
  assert!(at(30).latest_model(scope()).await.unwrap().is_expired());
  assert!(at(31).latest_model(scope()).await.unwrap().is_expired());
}

#[tokio::test]
async fn latest_model_spans_data_sets() {
  let s = store_with_trainer().await;
  s.register_subject(ctx()).await.unwrap();
  s.record_data_set(scope(), "ds-a".into()).await.unwrap();
  s.record_data_set(scope(), "ds-b".into()).await.unwrap();
  s.record_model("ds-b".into(), "m-b".into()).await.unwrap();
  s.record_model("ds-a".into(), "m-a".into()).await.unwrap();

  // Most recently recorded model wins, whatever data set it came from.
  assert_eq!(
    s.latest_model(scope()).await.unwrap().fresh_uid(),
    Some("m-a")
  );
}

#[tokio::test]
async fn latest_model_absent_without_models() {
  let s = store_with_trainer().await;
  s.register_subject(ctx()).await.unwrap();
  s.record_data_set(scope(), "ds".into()).await.unwrap();
  assert!(s.latest_model(scope()).await.unwrap().is_absent());
}

// ─── Deployments ─────────────────────────────────────────────────────────────

async fn store_with_model() -> SqliteStore {
  let s = store_with_trainer().await;
  s.register_subject(ctx()).await.unwrap();
  s.record_data_set(scope(), "ds".into()).await.unwrap();
  s.record_model("ds".into(), "model".into()).await.unwrap();
  s
}

#[tokio::test]
async fn deployment_without_token_is_self_hosted() {
  let s = store_with_model().await;

  for token in [None, Some(String::new())] {
    let dep = s
      .create_deployment(ExternalId(TRAINER), "model".into(), "key".into(), token)
      .await
      .unwrap();
    assert_eq!(dep.kind, DeploymentKind::SelfHosted);

    let stored = s.get_deployment(dep.id).await.unwrap().unwrap();
    assert_eq!(stored, dep);
  }
  assert_eq!(
    s.count_rows("SELECT COUNT(*) FROM deployments WHERE hosted = 0")
      .await
      .unwrap(),
    2
  );
  assert_eq!(
    s.count_rows("SELECT COUNT(*) FROM hosted_deployments").await.unwrap(),
    0
  );
}

#[tokio::test]
async fn deployment_with_token_stores_hosting_defaults() {
  let s = store_with_model().await;

  let dep = s
    .create_deployment(
      ExternalId(TRAINER),
      "model".into(),
      "key".into(),
      Some("bot-token".into()),
    )
    .await
    .unwrap();

  let stored = s.get_deployment(dep.id).await.unwrap().unwrap();
  assert_eq!(stored.secret_key, "key");
  let cfg = stored.kind.hosted_config().expect("hosted config");
  assert_eq!(cfg.bot_token, "bot-token");
  assert_eq!(cfg.ip_address, "0.0.0.0");
  assert!(cfg.active);
  assert_eq!(cfg.reply_probability, 0.3);
  assert_eq!(cfg.new_conversation_min_wait, 60);
  assert_eq!(cfg.new_conversation_max_wait, 3600);
  assert_eq!(cfg.max_sentence_length, 250);
  assert!(!cfg.quiet_mode);
  assert_eq!(
    s.count_rows("SELECT COUNT(*) FROM deployments WHERE hosted = 1")
      .await
      .unwrap(),
    1
  );
}

#[tokio::test]
async fn hosted_token_roundtrips_verbatim() {
  let s = store_with_model().await;

  let dep = s
    .create_deployment(
      ExternalId(TRAINER),
      "model".into(),
      "key".into(),
      Some("  bot-token\n".into()),
    )
    .await
    .unwrap();

  let stored = s.get_deployment(dep.id).await.unwrap().unwrap();
  assert_eq!(stored.kind.hosted_config().unwrap().bot_token, "  bot-token\n");
}

#[tokio::test]
async fn deployment_unknown_model_writes_nothing() {
  let s = store_with_model().await;
  let err = s
    .create_deployment(
      ExternalId(TRAINER),
      "nope".into(),
      "key".into(),
      Some("tok".into()),
    )
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(deepfake_core::Error::ModelNotFound(_))
  ));
  assert_eq!(s.count_rows("SELECT COUNT(*) FROM deployments").await.unwrap(), 0);
}

#[tokio::test]
async fn deployment_unknown_trainer_is_not_found() {
  let s = store_with_model().await;
  let err = s
    .create_deployment(ExternalId(5), "model".into(), "key".into(), None)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(deepfake_core::Error::TrainerNotFound(ExternalId(5)))
  ));
}

#[tokio::test]
async fn get_deployment_missing_returns_none() {
  let s = store().await;
  assert!(s.get_deployment(99).await.unwrap().is_none());
}

// ─── Housekeeping ────────────────────────────────────────────────────────────

#[tokio::test]
async fn statistics_counts_records() {
  let s = store_with_model().await;
  s.register_trainer(ExternalId(OTHER_TRAINER), "other".into())
    .await
    .unwrap();
  // Same person under another trainer: one distinct subject user.
  s.register_subject(ctx_for(OTHER_TRAINER)).await.unwrap();
  s.add_filters(ctx(), words(&["a", "b"])).await.unwrap();
  s.create_deployment(ExternalId(TRAINER), "model".into(), "k".into(), None)
    .await
    .unwrap();

  let stats = s.statistics().await.unwrap();
  assert_eq!(stats.registered_users, 2);
  assert_eq!(stats.model_subjects, 1);
  assert_eq!(stats.servers, 1);
  assert_eq!(stats.data_sets, 1);
  assert_eq!(stats.filters_applied, 2);
  assert_eq!(stats.markov_models, 1);
  assert_eq!(stats.bots_deployed, 1);
  assert!(!stats.version.is_empty());
}

#[tokio::test]
async fn ping_succeeds() {
  let s = store().await;
  s.ping().await.unwrap();
}

#![cfg(feature = "sqlite")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::DateTime;
use common::{event, post, ticket, user, Fixture};
use modkit_admin::{
    AdminError, AdminRequest, AdminResult, FieldKind, FormValidationError, ModelView, Record,
    RequestAction,
};
use modkit_admin_sea::{SeaModelView, ViewHooks};
use sea_orm::{ConnectionTrait, Set};
use serde_json::{json, Value};

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn related_ids(value: &Value) -> Vec<i64> {
    let mut ids: Vec<i64> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    ids.sort_unstable();
    ids
}

#[tokio::test]
async fn create_coerces_form_values() {
    let fx = Fixture::new().await;
    let req = fx.request(RequestAction::Create);
    let created = fx
        .view("users")
        .create(
            &req,
            record(json!({"name": "Dave", "email": "dave@example.net", "score": "7"})),
        )
        .await
        .unwrap();
    assert_eq!(created["id"], json!(4));
    assert_eq!(created["score"], json!(7));
    assert_eq!(created["avatar"], Value::Null);
    assert_eq!(created["posts"], json!([]));
}

#[tokio::test]
async fn create_with_belongs_to_relation() {
    let fx = Fixture::new().await;
    let req = fx.request(RequestAction::Create);
    let created = fx
        .view("posts")
        .create(
            &req,
            record(json!({"title": "Compost", "views": 1, "published": "on", "user": 2})),
        )
        .await
        .unwrap();
    assert_eq!(created["user_id"], json!(2));
    assert_eq!(created["published"], json!(true));
    assert_eq!(created["user"]["name"], json!("Bob"));
}

#[tokio::test]
async fn create_with_has_many_relation_attaches_rows() {
    let fx = Fixture::new().await;
    let req = fx.request(RequestAction::Create);
    let created = fx
        .view("users")
        .create(
            &req,
            record(json!({"name": "Eve", "email": "eve@example.net", "posts": [4]})),
        )
        .await
        .unwrap();
    assert_eq!(related_ids(&created["posts"]), vec![4]);

    let draft = fx
        .view("posts")
        .find_by_pk(&fx.request(RequestAction::Detail), &json!(4))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(draft["user_id"], created["id"]);
}

#[tokio::test]
async fn edit_replaces_has_many_relation() {
    let fx = Fixture::new().await;
    let req = fx.request(RequestAction::Edit);
    let edited = fx
        .view("users")
        .edit(&req, &json!(1), record(json!({"posts": [2, 3]})))
        .await
        .unwrap();
    assert_eq!(related_ids(&edited["posts"]), vec![2, 3]);
    assert_eq!(edited["name"], json!("Alice"));

    let detail = fx.request(RequestAction::Detail);
    let first = fx.view("posts").find_by_pk(&detail, &json!(1)).await.unwrap().unwrap();
    assert_eq!(first["user_id"], Value::Null);
    let bob = fx.view("users").find_by_pk(&detail, &json!(2)).await.unwrap().unwrap();
    assert_eq!(bob["posts"], json!([]));
}

#[tokio::test]
async fn edit_clearing_has_many_detaches_all() {
    let fx = Fixture::new().await;
    let edited = fx
        .view("users")
        .edit(&fx.request(RequestAction::Edit), &json!(1), record(json!({"posts": []})))
        .await
        .unwrap();
    assert_eq!(edited["posts"], json!([]));
}

#[tokio::test]
async fn edit_touches_only_submitted_keys() {
    let fx = Fixture::new().await;
    let req = fx.request(RequestAction::Edit);
    let edited = fx
        .view("posts")
        .edit(&req, &json!("1"), record(json!({"title": "Ownership, revisited"})))
        .await
        .unwrap();
    assert_eq!(edited["title"], json!("Ownership, revisited"));
    assert_eq!(edited["views"], json!(120));
    assert_eq!(edited["user"]["name"], json!("Alice"));
}

#[tokio::test]
async fn edit_can_unset_belongs_to() {
    let fx = Fixture::new().await;
    let edited = fx
        .view("posts")
        .edit(&fx.request(RequestAction::Edit), &json!(3), record(json!({"user": null})))
        .await
        .unwrap();
    assert_eq!(edited["user_id"], Value::Null);
    assert_eq!(edited["user"], Value::Null);
}

#[tokio::test]
async fn edit_missing_row_is_not_found() {
    let fx = Fixture::new().await;
    let err = fx
        .view("users")
        .edit(&fx.request(RequestAction::Edit), &json!(404), record(json!({"name": "x"})))
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::NotFound));
}

#[tokio::test]
async fn unconvertible_value_becomes_form_error() {
    let fx = Fixture::new().await;
    let users = fx.view("users");
    let err = users
        .create(
            &fx.request(RequestAction::Create),
            record(json!({"name": "Zed", "email": "zed@example.net", "score": "lots"})),
        )
        .await
        .unwrap_err();
    let AdminError::FormValidation(errors) = err else {
        panic!("expected form validation error, got {err:?}");
    };
    assert!(errors.get("score").is_some());
    assert_eq!(users.count(&fx.request(RequestAction::List), None).await.unwrap(), 3);
}

#[tokio::test]
async fn null_for_required_column_becomes_form_error() {
    let fx = Fixture::new().await;
    let err = fx
        .view("users")
        .edit(&fx.request(RequestAction::Edit), &json!(1), record(json!({"name": null})))
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::FormValidation(e) if e.get("name").is_some()));
}

#[tokio::test]
async fn delete_removes_rows_and_reports_count() {
    let fx = Fixture::new().await;
    let posts = fx.view("posts");
    let req = fx.request(RequestAction::List);

    let deleted = posts.delete(&req, &[json!(3), json!("4"), json!(99)]).await.unwrap();
    assert_eq!(deleted, Some(2));
    assert_eq!(posts.count(&req, None).await.unwrap(), 2);
    assert_eq!(posts.delete(&req, &[]).await.unwrap(), Some(0));
}

#[tokio::test]
async fn delete_action_message() {
    let fx = Fixture::new().await;
    let req = fx.request(RequestAction::List);
    let msg = fx
        .view("posts")
        .handle_action(&req, &[json!(1), json!(2)], "delete")
        .await
        .unwrap();
    assert_eq!(msg, "2 items were successfully deleted");
}

#[tokio::test]
async fn database_failure_in_action_is_action_failed() {
    let fx = Fixture::new().await;
    fx.session
        .conn()
        .execute_unprepared("DROP TABLE posts")
        .await
        .unwrap();
    let err = fx
        .view("posts")
        .handle_row_action(&fx.request(RequestAction::List), &json!(1), "delete")
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::ActionFailed(_)));
}

#[derive(Default)]
struct UserHooks {
    created: AtomicUsize,
    deleted: AtomicUsize,
    calls: Mutex<Vec<&'static str>>,
}

impl UserHooks {
    fn record_call(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }
}

#[async_trait]
impl ViewHooks<user::Entity> for UserHooks {
    async fn validate(&self, _req: &AdminRequest, data: &Record) -> AdminResult<()> {
        self.record_call("validate");
        let email = data.get("email").and_then(Value::as_str).unwrap_or_default();
        if data.contains_key("email") && !email.contains('@') {
            return Err(FormValidationError::new()
                .with("email", "Enter a valid email address")
                .into());
        }
        Ok(())
    }

    async fn before_create(
        &self,
        _req: &AdminRequest,
        _data: &Record,
        obj: &mut user::ActiveModel,
    ) -> AdminResult<()> {
        obj.score = Set(100);
        Ok(())
    }

    async fn after_create(&self, _req: &AdminRequest, _obj: &user::Model) -> AdminResult<()> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn before_edit(
        &self,
        _req: &AdminRequest,
        _data: &Record,
        obj: &mut user::ActiveModel,
    ) -> AdminResult<()> {
        self.record_call("before_edit");
        obj.name = Set("Alice B.".to_owned());
        Ok(())
    }

    async fn after_edit(&self, _req: &AdminRequest, obj: &user::Model) -> AdminResult<()> {
        assert_eq!(obj.name, "Alice B.");
        self.record_call("after_edit");
        Ok(())
    }

    async fn after_delete(&self, _req: &AdminRequest, _obj: &user::Model) -> AdminResult<()> {
        self.deleted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn extra_actions(&self) -> Vec<String> {
        vec!["reset_score".to_owned()]
    }

    async fn custom_action(
        &self,
        _req: &AdminRequest,
        pks: &[Value],
        name: &str,
    ) -> AdminResult<Option<String>> {
        Ok((name == "reset_score").then(|| format!("{} scores reset", pks.len())))
    }
}

fn hooked_view() -> SeaModelView<user::Entity, UserHooks> {
    SeaModelView::<user::Entity>::builder()
        .hooks(UserHooks::default())
        .build()
        .unwrap()
}

#[tokio::test]
async fn hooks_run_around_create() {
    let fx = Fixture::new().await;
    let view = hooked_view();
    let created = view
        .create(
            &fx.request(RequestAction::Create),
            record(json!({"name": "Hook", "email": "hook@example.net", "score": 1})),
        )
        .await
        .unwrap();
    assert_eq!(created["score"], json!(100));
    assert_eq!(view.hooks().created.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn hooks_run_around_edit_in_order() {
    let fx = Fixture::new().await;
    let view = hooked_view();
    let edited = view
        .edit(&fx.request(RequestAction::Edit), &json!(1), record(json!({"score": "55"})))
        .await
        .unwrap();
    assert_eq!(edited["score"], json!(55));
    assert_eq!(edited["name"], json!("Alice B."));
    assert_eq!(
        *view.hooks().calls.lock().unwrap(),
        vec!["validate", "before_edit", "after_edit"]
    );
}

#[tokio::test]
async fn validation_hook_rejects_and_writes_nothing() {
    let fx = Fixture::new().await;
    let view = hooked_view();
    let err = view
        .create(
            &fx.request(RequestAction::Create),
            record(json!({"name": "Bad", "email": "nowhere"})),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::FormValidation(e) if e.get("email").is_some()));
    assert_eq!(view.hooks().created.load(Ordering::SeqCst), 0);
    assert_eq!(view.count(&fx.request(RequestAction::List), None).await.unwrap(), 3);
}

#[tokio::test]
async fn delete_hooks_see_each_row() {
    let fx = Fixture::new().await;
    let view = hooked_view();
    // Carol has no posts, so the foreign key does not block the delete.
    let deleted = view
        .delete(&fx.request(RequestAction::List), &[json!(3)])
        .await
        .unwrap();
    assert_eq!(deleted, Some(1));
    assert_eq!(view.hooks().deleted.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn custom_actions_are_offered_and_dispatched() {
    let fx = Fixture::new().await;
    let view = hooked_view();
    assert_eq!(view.actions(), vec!["delete".to_owned(), "reset_score".to_owned()]);
    let msg = view
        .handle_action(&fx.request(RequestAction::List), &[json!(1), json!(2)], "reset_score")
        .await
        .unwrap();
    assert_eq!(msg, "2 scores reset");
    let err = view
        .handle_action(&fx.request(RequestAction::List), &[json!(1)], "archive")
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::ActionFailed(_)));
}

#[tokio::test]
async fn file_fields_accept_value_and_delete_flag() {
    let fx = Fixture::new().await;
    let view = SeaModelView::<user::Entity>::builder()
        .field_kind("avatar", FieldKind::File { multiple: false })
        .build()
        .unwrap();
    let req = fx.request(RequestAction::Edit);

    let set = view
        .edit(&req, &json!(1), record(json!({"avatar": {"value": "alice.png", "delete": false}})))
        .await
        .unwrap();
    assert_eq!(set["avatar"], json!("alice.png"));

    let kept = view
        .edit(&req, &json!(1), record(json!({"avatar": {"value": null, "delete": false}})))
        .await
        .unwrap();
    assert_eq!(kept["avatar"], json!("alice.png"));

    let cleared = view
        .edit(&req, &json!(1), record(json!({"avatar": {"value": null, "delete": true}})))
        .await
        .unwrap();
    assert_eq!(cleared["avatar"], Value::Null);

    let err = view
        .edit(&req, &json!(1), record(json!({"avatar": 5})))
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::FormValidation(e) if e.get("avatar").is_some()));
}

#[tokio::test]
async fn relation_without_registered_target_view_fails() {
    let fx = Fixture::with_views(|registry| {
        registry
            .register(Arc::new(
                SeaModelView::<post::Entity>::builder()
                    .identity("posts")
                    .build()
                    .unwrap(),
            ))
            .unwrap();
    })
    .await;
    // Without a "users" view the relation cannot be resolved.
    let err = fx
        .view("posts")
        .create(
            &fx.request(RequestAction::Create),
            record(json!({"title": "Orphan", "user": 1})),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::UnknownView(id) if id == "users"));
}

#[tokio::test]
async fn create_through_offset_datetime_field() {
    let fx = Fixture::new().await;
    let view = SeaModelView::<event::Entity>::new().unwrap();
    let created = view
        .create(
            &fx.request(RequestAction::Create),
            record(json!({"at": "2024-01-01T00:00:00+02:00"})),
        )
        .await
        .unwrap();
    let at = DateTime::parse_from_rfc3339(created["at"].as_str().unwrap()).unwrap();
    let expected = DateTime::parse_from_rfc3339("2023-12-31T22:00:00Z").unwrap();
    assert_eq!(at, expected);
}

#[tokio::test]
async fn unknown_enum_value_is_a_form_error() {
    let fx = Fixture::new().await;
    let view = SeaModelView::<ticket::Entity>::new().unwrap();
    let req = fx.request(RequestAction::Create);

    let err = view
        .create(&req, record(json!({"status": "bogus"})))
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::FormValidation(e) if e.get("status").is_some()));
    assert_eq!(view.count(&fx.request(RequestAction::List), None).await.unwrap(), 0);

    let created = view
        .create(&req, record(json!({"status": "open"})))
        .await
        .unwrap();
    assert_eq!(created["status"], json!("open"));
}

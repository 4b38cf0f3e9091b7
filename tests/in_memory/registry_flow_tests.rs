//! Requests dispatched through CRUD commands backed by the in-memory store.

use std::sync::Arc;

use crate::in_memory::helpers::{TestStore, UserRepository, UserService, store};
use conservatory::command::adapters::CapturedResponse;
use conservatory::command::domain::{CommandRequest, Identity, Role};
use conservatory::command::ports::CrudOperation;
use conservatory::command::services::{CREATED_MESSAGE, CommandRegistry, CrudValidators};
use conservatory::command::validation::{
    AuthValidator, ChannelSchemas, CombinedValidator, CrudValidator, FieldRule, ObjectSchema,
    UnknownKeys,
};
use http::StatusCode;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

fn new_user_schema() -> ObjectSchema {
    ObjectSchema::new()
        .field("name", FieldRule::string().trimmed().min(2).required())
        .field("email", FieldRule::email().required())
        .field(
            "role",
            FieldRule::string()
                .one_of(["admin", "profesor", "estudiante"])
                .default_value("estudiante"),
        )
        .unknown_keys(UnknownKeys::Strip)
}

#[fixture]
fn registry(store: Arc<TestStore>) -> CommandRegistry {
    let registry = CommandRegistry::new();
    let service = Arc::new(UserService::new(UserRepository::new(store)));
    let validators = CrudValidators::new()
        .with(
            CrudOperation::Create,
            AuthValidator::new(ChannelSchemas::new().with_body(new_user_schema()))
                .require_roles([Role::Admin]),
        )
        .with(
            CrudOperation::Delete,
            CombinedValidator::default()
                .then(CrudValidator::new())
                .then(AuthValidator::new(ChannelSchemas::new()).require_roles([Role::Admin])),
        );
    registry
        .register_crud_commands("users", &service, &validators)
        .expect("fresh registry accepts the user commands");
    registry
}

fn admin() -> Identity {
    Identity::new("root", [Role::Admin])
}

fn created_id(data: Option<&Value>) -> String {
    data.and_then(|payload| payload.get("_id"))
        .and_then(Value::as_str)
        .expect("created user carries an id")
        .to_owned()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_then_fetch_round_trip(registry: CommandRegistry) {
    let created = registry
        .dispatch(
            "users.create",
            &CommandRequest::new()
                .with_identity(admin())
                .with_body(json!({"name": "  Elena ", "email": "Elena@Example.com", "extra": 1})),
        )
        .await;

    assert_eq!(created.status(), StatusCode::CREATED);
    assert_eq!(created.message(), Some(CREATED_MESSAGE));
    let id = created_id(created.data());

    let fetched = registry
        .dispatch("users.getById", &CommandRequest::new().with_param("id", id.as_str()))
        .await;

    assert_eq!(fetched.status(), StatusCode::OK);
    let user = fetched.data().expect("payload");
    assert_eq!(user.get("name"), Some(&json!("Elena")));
    assert_eq!(user.get("email"), Some(&json!("elena@example.com")));
    assert_eq!(user.get("role"), Some(&json!("estudiante")));
    assert!(user.get("extra").is_none());
}

#[rstest]
#[case(None, StatusCode::UNAUTHORIZED)]
#[case(Some(Role::Profesor), StatusCode::FORBIDDEN)]
#[tokio::test(flavor = "multi_thread")]
async fn create_requires_admin(
    registry: CommandRegistry,
    #[case] role: Option<Role>,
    #[case] status: StatusCode,
) {
    let base =
        CommandRequest::new().with_body(json!({"name": "Iván", "email": "ivan@example.com"}));
    let request = match role {
        Some(held) => base.with_identity(Identity::new("u-7", [held])),
        None => base,
    };

    let response = registry.dispatch("users.create", &request).await;

    assert_eq!(response.status(), status);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_email_is_a_conflict(registry: CommandRegistry) {
    let request = CommandRequest::new()
        .with_identity(admin())
        .with_body(json!({"name": "Rosa", "email": "rosa@example.com"}));

    let first = registry.dispatch("users.create", &request).await;
    let second = registry.dispatch("users.create", &request).await;

    assert_eq!(first.status(), StatusCode::CREATED);
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(
        second.message(),
        Some("duplicate value for unique field email: rosa@example.com")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_applies_validated_pagination(registry: CommandRegistry) {
    for index in 1..=12 {
        let response = registry
            .dispatch(
                "users.create",
                &CommandRequest::new().with_identity(admin()).with_body(json!({
                    "name": format!("Alumno {index:02}"),
                    "email": format!("alumno{index}@example.com")
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let listed = registry
        .dispatch(
            "users.list",
            &CommandRequest::new()
                .with_query_param("page", "2")
                .with_query_param("limit", "5")
                .with_query_param("sort", "name")
                .with_query_param("order", "asc"),
        )
        .await;
    let rejected = registry
        .dispatch("users.list", &CommandRequest::new().with_query_param("limit", "0"))
        .await;

    let payload = listed.data().expect("payload");
    assert_eq!(
        payload.pointer("/pagination/totalCount"),
        Some(&json!(12))
    );
    assert_eq!(payload.pointer("/pagination/totalPages"), Some(&json!(3)));
    assert_eq!(
        payload.pointer("/documents/0/name"),
        Some(&json!("Alumno 06"))
    );
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_and_delete_flow(registry: CommandRegistry) {
    let created = registry
        .dispatch(
            "users.create",
            &CommandRequest::new()
                .with_identity(admin())
                .with_body(json!({"name": "Tomás", "email": "tomas@example.com"})),
        )
        .await;
    let id = created_id(created.data());

    let updated = registry
        .dispatch(
            "users.update",
            &CommandRequest::new()
                .with_param("id", id.as_str())
                .with_body(json!({"role": "profesor"})),
        )
        .await;
    let anonymous_delete = registry
        .dispatch("users.delete", &CommandRequest::new().with_param("id", id.as_str()))
        .await;
    let mut sink = CapturedResponse::new();
    registry
        .execute(
            "users.delete",
            &CommandRequest::new()
                .with_param("id", id.as_str())
                .with_identity(admin()),
            &mut sink,
        )
        .await;
    let missing = registry
        .dispatch("users.getById", &CommandRequest::new().with_param("id", id.as_str()))
        .await;

    assert_eq!(updated.data().and_then(|user| user.get("role")), Some(&json!("profesor")));
    assert_eq!(anonymous_delete.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(sink.responses().len(), 1);
    assert_eq!(sink.last().map(|response| response.status()), Some(StatusCode::OK));
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(missing.message(), Some("users document not found"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn operations_on_missing_ids_are_rejected_before_the_store(registry: CommandRegistry) {
    for command in ["users.getById", "users.update", "users.delete"] {
        let response = registry.dispatch(command, &CommandRequest::new()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{command}");
        assert_eq!(
            response.message(),
            Some("missing required parameter: id"),
            "{command}"
        );
    }
}

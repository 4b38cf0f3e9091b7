//! Tests for command registration and dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::fixtures::{CallCounter, FixedClock, echo_service};
use crate::command::adapters::CapturedResponse;
use crate::command::domain::{
    CommandRequest, CommandResponse, Identity, Role, ValidatedInput,
};
use crate::command::ports::service::MockCrudService;
use crate::command::ports::{CrudOperation, RequestHandler};
use crate::command::services::{
    CREATED_MESSAGE, CommandConfig, CommandKind, CommandRegistry, CrudValidators, RegistryError,
};
use crate::command::validation::{AuthValidator, ChannelSchemas, CrudValidator};

#[fixture]
fn registry() -> CommandRegistry<FixedClock> {
    CommandRegistry::with_clock(Arc::new(FixedClock::new()))
}

struct Exploding;

#[async_trait]
impl RequestHandler for Exploding {
    async fn handle(&self, _request: &CommandRequest) -> CommandResponse {
        panic!("handler bug")
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn registered_command_is_dispatched(registry: CommandRegistry<FixedClock>) {
    let calls = CallCounter::default();
    registry
        .register("teachers.list", CommandConfig::query(echo_service(calls.clone())))
        .expect("first registration succeeds");

    let response = registry
        .dispatch("teachers.list", &CommandRequest::new())
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(calls.count(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_command_is_internal_error(registry: CommandRegistry<FixedClock>) {
    let response = registry.dispatch("ghost.list", &CommandRequest::new()).await;
    assert_eq!(
        response,
        CommandResponse::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "command not found: ghost.list"
        )
    );
}

#[rstest]
fn duplicate_registration_keeps_original(registry: CommandRegistry<FixedClock>) {
    let first = CallCounter::default();
    let second = CallCounter::default();
    registry
        .register(
            "lessons.create",
            CommandConfig::create(echo_service(first)).with_context("original"),
        )
        .expect("first registration succeeds");

    let result = registry.register(
        "lessons.create",
        CommandConfig::crud(echo_service(second)).with_context("replacement"),
    );

    assert_eq!(
        result,
        Err(RegistryError::DuplicateCommand("lessons.create".to_owned()))
    );
    let infos = registry.list_commands();
    assert_eq!(infos.len(), 1);
    assert_eq!(infos.first().map(|info| info.context()), Some("original"));
    assert_eq!(infos.first().map(|info| info.kind()), Some(CommandKind::Create));
}

#[rstest]
fn list_commands_is_sorted_and_stamped(registry: CommandRegistry<FixedClock>) {
    for name in ["zeta.list", "alpha.get", "mid.delete"] {
        registry
            .register(name, CommandConfig::crud(echo_service(CallCounter::default())))
            .expect("names are unique");
    }

    let infos = registry.list_commands();

    let names: Vec<&str> = infos.iter().map(|info| info.name()).collect();
    assert_eq!(names, ["alpha.get", "mid.delete", "zeta.list"]);
    assert!(
        infos
            .iter()
            .all(|info| info.registered_at() == FixedClock::new().0)
    );
    assert!(infos.iter().all(|info| info.context() == info.name()));
}

#[rstest]
fn unregister_and_clear(registry: CommandRegistry<FixedClock>) {
    registry
        .register("a", CommandConfig::crud(echo_service(CallCounter::default())))
        .expect("registers");
    registry
        .register("b", CommandConfig::crud(echo_service(CallCounter::default())))
        .expect("registers");

    assert!(registry.unregister("a"));
    assert!(!registry.unregister("a"));
    assert!(!registry.has_command("a"));
    assert!(registry.has_command("b"));

    registry.clear();
    assert!(registry.list_commands().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn panicking_custom_handler_is_contained(registry: CommandRegistry<FixedClock>) {
    registry
        .register("reports.build", CommandConfig::custom(Exploding))
        .expect("registers");

    let response = registry
        .dispatch("reports.build", &CommandRequest::new())
        .await;

    assert_eq!(response, CommandResponse::internal_error("reports.build"));
    assert_eq!(
        registry.list_commands().first().map(|info| info.kind()),
        Some(CommandKind::Custom)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn route_resolves_late_registrations(registry: CommandRegistry<FixedClock>) {
    let route = registry.route("students.list");
    assert_eq!(route.name(), "students.list");
    assert_eq!(
        route.handle(&CommandRequest::new()).await.status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );

    registry
        .register(
            "students.list",
            CommandConfig::query(echo_service(CallCounter::default())),
        )
        .expect("registers");

    assert_eq!(
        route.handle(&CommandRequest::new()).await.status(),
        StatusCode::OK
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn execute_emits_exactly_one_response(registry: CommandRegistry<FixedClock>) {
    registry
        .register(
            "students.get",
            CommandConfig::crud(echo_service(CallCounter::default()))
                .with_validator(CrudValidator::new()),
        )
        .expect("registers");
    let mut sink = CapturedResponse::new();

    registry
        .execute("students.get", &CommandRequest::new(), &mut sink)
        .await;

    assert_eq!(sink.responses().len(), 1);
    assert_eq!(
        sink.last().and_then(CommandResponse::message),
        Some("missing required parameter: id")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn role_gate_denies_students_and_admits_admins(registry: CommandRegistry<FixedClock>) {
    let calls = CallCounter::default();
    registry
        .register(
            "teachers.delete",
            CommandConfig::crud(echo_service(calls.clone())).with_validator(
                AuthValidator::new(ChannelSchemas::new()).require_roles([Role::Admin]),
            ),
        )
        .expect("registers");
    let student = CommandRequest::new().with_identity(Identity::new("s-1", [Role::Estudiante]));
    let admin = CommandRequest::new().with_identity(Identity::new("a-1", [Role::Admin]));

    let denied = registry.dispatch("teachers.delete", &student).await;
    let allowed = registry.dispatch("teachers.delete", &admin).await;

    assert_eq!(denied.status(), StatusCode::FORBIDDEN);
    assert!(denied.message().is_some_and(|message| message.contains("admin")));
    assert_eq!(allowed.status(), StatusCode::OK);
    assert_eq!(calls.count(), 1);
}

fn teacher_service() -> MockCrudService {
    let mut service = MockCrudService::new();
    service
        .expect_list()
        .returning(|input: ValidatedInput| Ok(input.query().clone()));
    service
        .expect_get_by_id()
        .returning(|input: ValidatedInput| Ok(json!({"_id": input.id()})));
    service
        .expect_create()
        .returning(|input: ValidatedInput| Ok(input.body().clone()));
    service
        .expect_update()
        .returning(|input: ValidatedInput| Ok(json!({"_id": input.id(), "updated": true})));
    service
        .expect_delete()
        .returning(|_input: ValidatedInput| Ok(Value::Null));
    service
}

#[rstest]
fn crud_registration_names_five_commands(registry: CommandRegistry<FixedClock>) {
    let names = registry
        .register_crud_commands("teachers", &Arc::new(teacher_service()), &CrudValidators::new())
        .expect("fresh registry");

    assert_eq!(
        names,
        [
            "teachers.list",
            "teachers.getById",
            "teachers.create",
            "teachers.update",
            "teachers.delete"
        ]
    );
    let kinds: Vec<(String, CommandKind)> = registry
        .list_commands()
        .into_iter()
        .map(|info| (info.name().to_owned(), info.kind()))
        .collect();
    assert!(kinds.contains(&("teachers.list".to_owned(), CommandKind::Query)));
    assert!(kinds.contains(&("teachers.create".to_owned(), CommandKind::Create)));
    assert!(kinds.contains(&("teachers.delete".to_owned(), CommandKind::Crud)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn get_by_id_without_id_never_reaches_service(registry: CommandRegistry<FixedClock>) {
    let mut service = MockCrudService::new();
    service.expect_get_by_id().never();
    registry
        .register_crud_commands("teachers", &Arc::new(service), &CrudValidators::new())
        .expect("fresh registry");

    let response = registry
        .dispatch("teachers.getById", &CommandRequest::new())
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), Some("missing required parameter: id"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn crud_commands_route_to_matching_operation(registry: CommandRegistry<FixedClock>) {
    registry
        .register_crud_commands("teachers", &Arc::new(teacher_service()), &CrudValidators::new())
        .expect("fresh registry");

    let listed = registry
        .dispatch("teachers.list", &CommandRequest::new().with_query_param("limit", "5"))
        .await;
    let fetched = registry
        .dispatch("teachers.getById", &CommandRequest::new().with_param("id", "t-1"))
        .await;
    let created = registry
        .dispatch(
            "teachers.create",
            &CommandRequest::new().with_body(json!({"name": "Olga"})),
        )
        .await;

    assert_eq!(listed.data().and_then(|data| data.get("limit")), Some(&json!(5)));
    assert_eq!(fetched.data(), Some(&json!({"_id": "t-1"})));
    assert_eq!(created.status(), StatusCode::CREATED);
    assert_eq!(created.message(), Some(CREATED_MESSAGE));
    assert_eq!(created.data(), Some(&json!({"name": "Olga"})));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn removed_default_validator_lets_request_through(registry: CommandRegistry<FixedClock>) {
    let validators = CrudValidators::new().without(CrudOperation::Delete);
    registry
        .register_crud_commands("teachers", &Arc::new(teacher_service()), &validators)
        .expect("fresh registry");

    let response = registry
        .dispatch("teachers.delete", &CommandRequest::new())
        .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[rstest]
fn crud_registration_is_all_or_nothing(registry: CommandRegistry<FixedClock>) {
    registry
        .register(
            "teachers.update",
            CommandConfig::crud(echo_service(CallCounter::default())),
        )
        .expect("registers");

    let result = registry.register_crud_commands(
        "teachers",
        &Arc::new(MockCrudService::new()),
        &CrudValidators::new(),
    );

    assert_eq!(
        result,
        Err(RegistryError::DuplicateCommand("teachers.update".to_owned()))
    );
    let names: Vec<String> = registry
        .list_commands()
        .iter()
        .map(|info| info.name().to_owned())
        .collect();
    assert_eq!(names, ["teachers.update"]);
}

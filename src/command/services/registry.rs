//! Name-keyed table of command handlers.
//!
//! The registry is an explicit value rather than process-wide state: build
//! one at start-up, register every command, then share clones with the
//! transport. Clones share the same table.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use http::StatusCode;
use mockable::{Clock, DefaultClock};
use thiserror::Error;
use tracing::{debug, error};

use super::crud::{CrudMethod, CrudValidators};
use super::factory::{create_command, crud_command, query_command};
use super::guard::catch_panic;
use crate::command::domain::{CommandRequest, CommandResponse};
use crate::command::ports::{
    CrudOperation, CrudService, RequestHandler, ResponseSink, ServiceMethod, Validator,
};

/// Errors raised while configuring the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A command with this name is already registered.
    #[error("command already registered: {0}")]
    DuplicateCommand(String),
}

/// How a registered command builds its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Single-entity operation answering 200.
    Crud,
    /// Listing answering 200, query validated by default.
    Query,
    /// Creation answering 201.
    Create,
    /// Caller-supplied handler.
    Custom,
}

enum Target {
    Service {
        service: Arc<dyn ServiceMethod>,
        validator: Option<Arc<dyn Validator>>,
    },
    Handler(Arc<dyn RequestHandler>),
}

/// Registration settings for one command.
pub struct CommandConfig {
    kind: CommandKind,
    context: Option<String>,
    target: Target,
}

impl CommandConfig {
    fn service(kind: CommandKind, service: Arc<dyn ServiceMethod>) -> Self {
        Self {
            kind,
            context: None,
            target: Target::Service {
                service,
                validator: None,
            },
        }
    }

    /// Single-entity command answering 200.
    #[must_use]
    pub fn crud(service: impl ServiceMethod + 'static) -> Self {
        Self::service(CommandKind::Crud, Arc::new(service))
    }

    /// Listing command answering 200.
    #[must_use]
    pub fn query(service: impl ServiceMethod + 'static) -> Self {
        Self::service(CommandKind::Query, Arc::new(service))
    }

    /// Creation command answering 201.
    #[must_use]
    pub fn create(service: impl ServiceMethod + 'static) -> Self {
        Self::service(CommandKind::Create, Arc::new(service))
    }

    /// Command served by a caller-built handler, stored as given.
    #[must_use]
    pub fn custom(handler: impl RequestHandler + 'static) -> Self {
        Self {
            kind: CommandKind::Custom,
            context: None,
            target: Target::Handler(Arc::new(handler)),
        }
    }

    /// Validates requests with `validator`. Ignored for custom handlers.
    #[must_use]
    pub fn with_validator(self, validator: impl Validator + 'static) -> Self {
        self.with_shared_validator(Some(Arc::new(validator)))
    }

    fn with_shared_validator(mut self, shared: Option<Arc<dyn Validator>>) -> Self {
        if let Target::Service { validator, .. } = &mut self.target {
            *validator = shared;
        }
        self
    }

    /// Overrides the logging context, which defaults to the command name.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Registration kind.
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        self.kind
    }

    fn into_handler(self, name: &str) -> (String, Arc<dyn RequestHandler>) {
        let context = self.context.unwrap_or_else(|| name.to_owned());
        let handler: Arc<dyn RequestHandler> = match self.target {
            Target::Handler(handler) => handler,
            Target::Service { service, validator } => {
                let built = match self.kind {
                    CommandKind::Query => query_command(context.clone(), service, validator),
                    CommandKind::Create => create_command(context.clone(), service, validator),
                    CommandKind::Crud | CommandKind::Custom => {
                        crud_command(context.clone(), service, validator)
                    }
                };
                Arc::new(built)
            }
        };
        (context, handler)
    }
}

impl fmt::Debug for CommandConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandConfig")
            .field("kind", &self.kind)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Public description of a registered command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    name: String,
    kind: CommandKind,
    context: String,
    registered_at: DateTime<Utc>,
}

impl CommandInfo {
    /// Unique command name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registration kind.
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Logging context.
    #[must_use]
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Registration time.
    #[must_use]
    pub const fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }
}

#[derive(Clone)]
struct RegisteredCommand {
    info: CommandInfo,
    handler: Arc<dyn RequestHandler>,
}

/// Registry of named commands.
///
/// # Examples
///
/// ```
/// use conservatory::command::domain::{CommandRequest, ValidatedInput};
/// use conservatory::command::ports::service_fn;
/// use conservatory::command::services::{CommandConfig, CommandRegistry};
/// use conservatory::outcome::Outcome;
/// use http::StatusCode;
/// use serde_json::json;
///
/// let registry = CommandRegistry::new();
/// registry
///     .register(
///         "ping",
///         CommandConfig::crud(service_fn(|_: ValidatedInput| async { Outcome::Ok("pong") })),
///     )
///     .expect("first registration succeeds");
/// # tokio::runtime::Builder::new_current_thread().build().expect("runtime").block_on(async {
/// let response = registry.dispatch("ping", &CommandRequest::new()).await;
/// assert_eq!(response.data(), Some(&json!("pong")));
/// let missing = registry.dispatch("pong", &CommandRequest::new()).await;
/// assert_eq!(missing.status(), StatusCode::INTERNAL_SERVER_ERROR);
/// # });
/// ```
pub struct CommandRegistry<C = DefaultClock>
where
    C: Clock + Send + Sync,
{
    commands: Arc<RwLock<HashMap<String, RegisteredCommand>>>,
    clock: Arc<C>,
}

impl<C> Clone for CommandRegistry<C>
where
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            commands: Arc::clone(&self.commands),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl CommandRegistry<DefaultClock> {
    /// Creates an empty registry stamped by the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }
}

impl Default for CommandRegistry<DefaultClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> CommandRegistry<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty registry using `clock` for registration times.
    #[must_use]
    pub fn with_clock(clock: Arc<C>) -> Self {
        Self {
            commands: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, RegisteredCommand>> {
        self.commands.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, RegisteredCommand>> {
        self.commands.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn entry(&self, name: &str, config: CommandConfig) -> RegisteredCommand {
        let kind = config.kind();
        let (context, handler) = config.into_handler(name);
        RegisteredCommand {
            info: CommandInfo {
                name: name.to_owned(),
                kind,
                context,
                registered_at: self.clock.utc(),
            },
            handler,
        }
    }

    /// Registers a command under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateCommand`] when `name` is taken; the
    /// existing command is left untouched.
    pub fn register(
        &self,
        name: impl Into<String>,
        config: CommandConfig,
    ) -> Result<(), RegistryError> {
        let key: String = name.into();
        let mut commands = self.write();
        if commands.contains_key(&key) {
            return Err(RegistryError::DuplicateCommand(key));
        }
        let registered = self.entry(&key, config);
        debug!(command = %key, kind = ?registered.info.kind, "command registered");
        commands.insert(key, registered);
        Ok(())
    }

    /// Registers `<entity>.list`, `getById`, `create`, `update` and
    /// `delete` for `service`.
    ///
    /// Either all five commands are registered or none is.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateCommand`] naming the first command
    /// that already exists.
    pub fn register_crud_commands<S>(
        &self,
        entity: &str,
        service: &Arc<S>,
        validators: &CrudValidators,
    ) -> Result<Vec<String>, RegistryError>
    where
        S: CrudService + 'static,
    {
        let names: Vec<(CrudOperation, String)> = CrudOperation::ALL
            .into_iter()
            .map(|operation| (operation, format!("{entity}.{}", operation.command_suffix())))
            .collect();

        let mut commands = self.write();
        if let Some((_, taken)) = names.iter().find(|(_, name)| commands.contains_key(name)) {
            return Err(RegistryError::DuplicateCommand(taken.clone()));
        }
        for (operation, name) in &names {
            let method = CrudMethod::new(Arc::clone(service), *operation);
            let config = match operation {
                CrudOperation::List => CommandConfig::query(method),
                CrudOperation::Create => CommandConfig::create(method),
                CrudOperation::GetById | CrudOperation::Update | CrudOperation::Delete => {
                    CommandConfig::crud(method)
                }
            }
            .with_shared_validator(validators.get(*operation));
            let registered = self.entry(name, config);
            commands.insert(name.clone(), registered);
        }
        debug!(entity, "crud commands registered");
        Ok(names.into_iter().map(|(_, name)| name).collect())
    }

    /// Runs the named command and emits its response through `sink`.
    pub async fn execute(
        &self,
        name: &str,
        request: &CommandRequest,
        sink: &mut dyn ResponseSink,
    ) {
        let response = self.dispatch(name, request).await;
        sink.send(response);
    }

    /// Runs the named command and returns its response.
    ///
    /// Unknown names are answered with 500 `command not found: <name>`.
    pub async fn dispatch(&self, name: &str, request: &CommandRequest) -> CommandResponse {
        let handler = self.read().get(name).map(|entry| Arc::clone(&entry.handler));
        let Some(target) = handler else {
            error!(command = %name, "command not found");
            return CommandResponse::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("command not found: {name}"),
            );
        };
        match catch_panic(target.handle(request)).await {
            Ok(response) => response,
            Err(panic) => {
                error!(command = %name, panic = %panic, "command handler panicked");
                CommandResponse::internal_error(name)
            }
        }
    }

    /// Returns a handler bound to `name`, for mounting on a route.
    ///
    /// The name is resolved on every request, so the route may be created
    /// before the command is registered.
    #[must_use]
    pub fn route(&self, name: impl Into<String>) -> CommandRoute<C> {
        CommandRoute {
            registry: self.clone(),
            name: name.into(),
        }
    }

    /// Registered commands sorted by name.
    #[must_use]
    pub fn list_commands(&self) -> Vec<CommandInfo> {
        let mut infos: Vec<CommandInfo> = self
            .read()
            .values()
            .map(|entry| entry.info.clone())
            .collect();
        infos.sort_by(|left, right| left.name.cmp(&right.name));
        infos
    }

    /// Returns `true` when `name` is registered.
    #[must_use]
    pub fn has_command(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Removes `name`, returning whether it was registered.
    pub fn unregister(&self, name: &str) -> bool {
        self.write().remove(name).is_some()
    }

    /// Removes every command.
    pub fn clear(&self) {
        self.write().clear();
    }
}

impl<C> fmt::Debug for CommandRegistry<C>
where
    C: Clock + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.read().len())
            .finish_non_exhaustive()
    }
}

/// [`RequestHandler`] dispatching to one registry entry.
pub struct CommandRoute<C = DefaultClock>
where
    C: Clock + Send + Sync,
{
    registry: CommandRegistry<C>,
    name: String,
}

impl<C> CommandRoute<C>
where
    C: Clock + Send + Sync,
{
    /// Command name served by this route.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<C> fmt::Debug for CommandRoute<C>
where
    C: Clock + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRoute")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<C> RequestHandler for CommandRoute<C>
where
    C: Clock + Send + Sync + 'static,
{
    async fn handle(&self, request: &CommandRequest) -> CommandResponse {
        self.registry.dispatch(&self.name, request).await
    }
}

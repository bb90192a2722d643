//! 处理器注册表
//!
//! 注册阶段通过 `HandlerRegistrations` 收集处理器（可并发注册），
//! 随后 `HandlerRegistry::configure` 一次性冻结；冻结前查询视为致命配置错误。

use crate::{
    command::Command,
    command_handler::{CommandAction, CommandHandler},
    context::AppContext,
    error::{AppError, ConfigurationError},
};
use dashmap::DashMap;
use rules_domain::persist::Session;
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};

pub(crate) type HandlerFuture<'a, R> =
    Pin<Box<dyn Future<Output = Result<Option<R>, AppError>> + Send + 'a>>;

pub(crate) type HandlerFn<C, S> = Arc<
    dyn for<'a> Fn(&'a AppContext, &'a mut S, &'a C) -> HandlerFuture<'a, <C as Command>::Result>
        + Send
        + Sync,
>;

fn erase<C, S, F>(f: F) -> HandlerFn<C, S>
where
    C: Command,
    S: Session,
    F: for<'a> Fn(&'a AppContext, &'a mut S, &'a C) -> HandlerFuture<'a, C::Result>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// 已注册的处理器描述
#[derive(Clone)]
pub struct HandlerDescriptor {
    name: &'static str,
    command: &'static str,
    // 实际类型为 HandlerFn<C, S>
    invoke: Arc<dyn Any + Send + Sync>,
}

impl HandlerDescriptor {
    /// 处理器类型名，用于诊断
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn command(&self) -> &'static str {
        self.command
    }

    pub(crate) fn invoker<C: Command, S: Session>(&self) -> Option<&HandlerFn<C, S>> {
        self.invoke.downcast_ref::<HandlerFn<C, S>>()
    }
}

impl std::fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("name", &self.name)
            .field("command", &self.command)
            .finish()
    }
}

/// 注册阶段的处理器集合
///
/// 同一命令可注册多个处理器，执行顺序即注册顺序。
pub struct HandlerRegistrations<S> {
    handlers: DashMap<TypeId, Vec<HandlerDescriptor>>,
    _session: PhantomData<fn() -> S>,
}

impl<S: Session> Default for HandlerRegistrations<S> {
    fn default() -> Self {
        Self {
            handlers: DashMap::new(),
            _session: PhantomData,
        }
    }
}

impl<S: Session> HandlerRegistrations<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册返回结果的处理器
    pub fn handler<C, H>(&self, handler: Arc<H>)
    where
        C: Command,
        H: CommandHandler<C, S> + 'static,
    {
        let f = erase::<C, S, _>(move |ctx, session, cmd| {
            let handler = handler.clone();
            Box::pin(async move { handler.handle(ctx, session, cmd).await })
        });
        self.push::<C>(type_name::<H>(), f);
    }

    /// 注册不产生结果的处理器
    pub fn action<C, A>(&self, action: Arc<A>)
    where
        C: Command,
        A: CommandAction<C, S> + 'static,
    {
        let f = erase::<C, S, _>(move |ctx, session, cmd| {
            let action = action.clone();
            Box::pin(async move {
                action
                    .run(ctx, session, cmd)
                    .await
                    .map(|()| None::<C::Result>)
            })
        });
        self.push::<C>(type_name::<A>(), f);
    }

    fn push<C: Command>(&self, name: &'static str, f: HandlerFn<C, S>) {
        self.handlers
            .entry(TypeId::of::<C>())
            .or_default()
            .push(HandlerDescriptor {
                name,
                command: C::NAME,
                invoke: Arc::new(f),
            });
    }

    pub fn len(&self) -> usize {
        self.handlers.iter().map(|e| e.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// 冻结后的处理器注册表
pub struct HandlerRegistry<S> {
    handlers: OnceLock<HashMap<TypeId, Vec<HandlerDescriptor>>>,
    _session: PhantomData<fn() -> S>,
}

impl<S: Session> Default for HandlerRegistry<S> {
    fn default() -> Self {
        Self {
            handlers: OnceLock::new(),
            _session: PhantomData,
        }
    }
}

impl<S: Session> HandlerRegistry<S> {
    /// 未配置的注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 以给定注册集合构建已配置的注册表
    pub fn with_registrations(registrations: HandlerRegistrations<S>) -> Self {
        let registry = Self::new();
        registry.install(registrations);
        registry
    }

    /// 一次性配置；重复配置返回 `AlreadyConfigured`
    pub fn configure(&self, registrations: HandlerRegistrations<S>) -> Result<(), AppError> {
        if self.install(registrations) {
            Ok(())
        } else {
            Err(ConfigurationError::AlreadyConfigured.into())
        }
    }

    fn install(&self, registrations: HandlerRegistrations<S>) -> bool {
        let count = registrations.len();
        let table: HashMap<_, _> = registrations.handlers.into_iter().collect();
        let installed = self.handlers.set(table).is_ok();
        if installed {
            tracing::debug!(handlers = count, "handler registry configured");
        }
        installed
    }

    pub fn is_configured(&self) -> bool {
        self.handlers.get().is_some()
    }

    /// 查询命令的全部处理器；未注册时为空
    pub fn locate<C: Command>(&self) -> Result<&[HandlerDescriptor], AppError> {
        let table = self
            .handlers
            .get()
            .ok_or(ConfigurationError::RegistryNotConfigured)?;
        Ok(table
            .get(&TypeId::of::<C>())
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    /// 已注册处理器的命令名称（排序）
    pub fn registered_commands(&self) -> Result<Vec<&'static str>, AppError> {
        let table = self
            .handlers
            .get()
            .ok_or(ConfigurationError::RegistryNotConfigured)?;
        let mut names: Vec<_> = table
            .values()
            .filter_map(|v| v.first().map(HandlerDescriptor::command))
            .collect();
        names.sort_unstable();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rules_domain::persist::{InMemoryDatabase, InMemorySession};
    use rules_macros::Command;

    #[derive(Debug, Command)]
    struct ArchiveTeamCommand;

    #[derive(Debug, Command)]
    struct RenameTeamCommand;

    struct Archive;

    #[async_trait]
    impl CommandAction<ArchiveTeamCommand, InMemorySession> for Archive {
        async fn run(
            &self,
            _ctx: &AppContext,
            _session: &mut InMemorySession,
            _cmd: &ArchiveTeamCommand,
        ) -> Result<(), AppError> {
            Ok(())
        }
    }

    struct Notify;

    #[async_trait]
    impl CommandAction<ArchiveTeamCommand, InMemorySession> for Notify {
        async fn run(
            &self,
            _ctx: &AppContext,
            _session: &mut InMemorySession,
            _cmd: &ArchiveTeamCommand,
        ) -> Result<(), AppError> {
            Ok(())
        }
    }

    #[test]
    fn locate_before_configure_is_fatal() {
        let registry = HandlerRegistry::<InMemorySession>::new();
        assert!(!registry.is_configured());
        let err = registry.locate::<ArchiveTeamCommand>().unwrap_err();
        assert!(matches!(
            err,
            AppError::Configuration(ConfigurationError::RegistryNotConfigured)
        ));
    }

    #[test]
    fn second_configure_is_rejected() {
        let registry = HandlerRegistry::<InMemorySession>::new();
        registry.configure(HandlerRegistrations::new()).unwrap();
        let err = registry
            .configure(HandlerRegistrations::new())
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Configuration(ConfigurationError::AlreadyConfigured)
        ));
    }

    #[test]
    fn handlers_keep_registration_order() {
        let regs = HandlerRegistrations::<InMemorySession>::new();
        regs.action::<ArchiveTeamCommand, _>(Arc::new(Archive));
        regs.action::<ArchiveTeamCommand, _>(Arc::new(Notify));
        assert_eq!(regs.len(), 2);

        let registry = HandlerRegistry::with_registrations(regs);
        let names: Vec<_> = registry
            .locate::<ArchiveTeamCommand>()
            .unwrap()
            .iter()
            .map(HandlerDescriptor::name)
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names[0].ends_with("Archive"));
        assert!(names[1].ends_with("Notify"));

        assert!(registry.locate::<RenameTeamCommand>().unwrap().is_empty());
        assert_eq!(
            registry.registered_commands().unwrap(),
            vec!["ArchiveTeamCommand"]
        );
    }

    #[tokio::test]
    async fn erased_action_yields_no_result() {
        let regs = HandlerRegistrations::<InMemorySession>::new();
        regs.action::<ArchiveTeamCommand, _>(Arc::new(Archive));
        let registry = HandlerRegistry::with_registrations(regs);

        let db = InMemoryDatabase::new();
        let mut session = rules_domain::persist::SessionFactory::open(&db).await.unwrap();
        let invoke = registry.locate::<ArchiveTeamCommand>().unwrap()[0]
            .invoker::<ArchiveTeamCommand, InMemorySession>()
            .cloned()
            .unwrap();
        let out = invoke(&AppContext::default(), &mut session, &ArchiveTeamCommand)
            .await
            .unwrap();
        assert!(out.is_none());
    }
}

#![allow(dead_code)]

use async_trait::async_trait;
use rules_application::command_handler::{CommandAction, CommandHandler};
use rules_application::context::AppContext;
use rules_application::error::AppError;
use rules_application::validation::Validator;
use rules_application::{InProcessRulesEngine, RulesEngineBuilder};
use rules_domain::entity::Entity;
use rules_domain::persist::{InMemoryDatabase, InMemorySession};
use rules_macros::{Command, InputMessage, ReturnItem, entity};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[entity(id = u64)]
#[derive(PartialEq)]
pub struct Employee {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub action: &'static str,
    pub employee_id: u64,
}

#[derive(Debug, Clone, PartialEq, ReturnItem)]
pub enum EmployeeResult {
    Employee(Employee),
    Audit(AuditEntry),
}

#[derive(Debug, Clone, Command)]
#[command(result = EmployeeResult)]
pub struct UpdateEmployeeCommand {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, InputMessage)]
#[input(command = UpdateEmployeeCommand)]
pub struct UpdateEmployeeInput {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Command)]
#[command(result = EmployeeResult)]
pub struct DeleteEmployeeCommand {
    pub id: u64,
}

#[derive(Debug, Clone, Command)]
pub struct SlowCommand {
    pub delay: Duration,
}

pub fn jane() -> Employee {
    Employee {
        id: 7,
        first_name: "Jane".into(),
        last_name: "Doe".into(),
        email: "jane@example.org".into(),
    }
}

pub fn update_input(first_name: &str) -> UpdateEmployeeInput {
    UpdateEmployeeInput {
        id: "7".into(),
        first_name: first_name.into(),
        last_name: "Doe".into(),
        email: "jane@example.org".into(),
    }
}

pub fn input_to_command(i: UpdateEmployeeInput) -> Result<UpdateEmployeeCommand, AppError> {
    let id = i
        .id
        .parse()
        .map_err(|_| AppError::Rejected(format!("invalid employee id: {}", i.id)))?;
    Ok(UpdateEmployeeCommand {
        id,
        first_name: i.first_name,
        last_name: i.last_name,
        email: i.email,
    })
}

pub fn update_rules() -> Validator<UpdateEmployeeCommand> {
    Validator::new()
        .required("first_name", |c: &UpdateEmployeeCommand| c.first_name.as_str())
        .stop_on_failure()
        .max_length("first_name", |c: &UpdateEmployeeCommand| c.first_name.as_str(), 40)
        .max_length("last_name", |c: &UpdateEmployeeCommand| c.last_name.as_str(), 40)
        .must(
            "email",
            |c: &UpdateEmployeeCommand| c.email.contains('@'),
            "{field} is not an e-mail address",
        )
}

/// 记录调用次数的处理器基类
#[derive(Default)]
pub struct Calls(AtomicUsize);

impl Calls {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct UpdateEmployee {
    pub calls: Calls,
}

#[async_trait]
impl CommandHandler<UpdateEmployeeCommand, InMemorySession> for UpdateEmployee {
    async fn handle(
        &self,
        _ctx: &AppContext,
        session: &mut InMemorySession,
        cmd: &UpdateEmployeeCommand,
    ) -> Result<Option<EmployeeResult>, AppError> {
        self.calls.hit();
        let mut employee = session
            .get::<Employee>(&cmd.id)?
            .ok_or_else(|| AppError::NotFound(format!("employee {}", cmd.id)))?;
        employee.first_name = cmd.first_name.clone();
        employee.last_name = cmd.last_name.clone();
        employee.email = cmd.email.clone();
        session.put(&employee)?;
        Ok(Some(employee.into()))
    }
}

#[derive(Default)]
pub struct DeleteEmployee {
    pub calls: Calls,
}

#[async_trait]
impl CommandHandler<DeleteEmployeeCommand, InMemorySession> for DeleteEmployee {
    async fn handle(
        &self,
        _ctx: &AppContext,
        session: &mut InMemorySession,
        cmd: &DeleteEmployeeCommand,
    ) -> Result<Option<EmployeeResult>, AppError> {
        self.calls.hit();
        let existing = session
            .get::<Employee>(&cmd.id)?
            .ok_or_else(|| AppError::NotFound(format!("employee {}", cmd.id)))?;
        session.delete::<Employee>(existing.id())?;
        Ok(Some(existing.into()))
    }
}

/// 返回审计记录；`tag` 用于区分同类型结果的覆盖顺序
pub struct AuditDeletion {
    pub tag: &'static str,
    pub calls: Calls,
}

impl AuditDeletion {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            calls: Calls::default(),
        }
    }
}

#[async_trait]
impl CommandHandler<DeleteEmployeeCommand, InMemorySession> for AuditDeletion {
    async fn handle(
        &self,
        _ctx: &AppContext,
        _session: &mut InMemorySession,
        cmd: &DeleteEmployeeCommand,
    ) -> Result<Option<EmployeeResult>, AppError> {
        self.calls.hit();
        Ok(Some(
            AuditEntry {
                action: self.tag,
                employee_id: cmd.id,
            }
            .into(),
        ))
    }
}

/// 总是拒绝的处理器
#[derive(Default)]
pub struct RejectDeletion {
    pub calls: Calls,
}

#[async_trait]
impl CommandAction<DeleteEmployeeCommand, InMemorySession> for RejectDeletion {
    async fn run(
        &self,
        _ctx: &AppContext,
        _session: &mut InMemorySession,
        _cmd: &DeleteEmployeeCommand,
    ) -> Result<(), AppError> {
        self.calls.hit();
        Err(AppError::Rejected("employee has open loans".into()))
    }
}

/// 删除到一半时 panic 的处理器
#[derive(Default)]
pub struct PanicOnDeletion {
    pub calls: Calls,
}

#[async_trait]
impl CommandAction<DeleteEmployeeCommand, InMemorySession> for PanicOnDeletion {
    async fn run(
        &self,
        _ctx: &AppContext,
        session: &mut InMemorySession,
        cmd: &DeleteEmployeeCommand,
    ) -> Result<(), AppError> {
        self.calls.hit();
        session.delete::<Employee>(&cmd.id)?;
        panic!("ledger out of sync for employee {}", cmd.id);
    }
}

#[derive(Default)]
pub struct Slow {
    pub calls: Calls,
}

#[async_trait]
impl CommandAction<SlowCommand, InMemorySession> for Slow {
    async fn run(
        &self,
        _ctx: &AppContext,
        _session: &mut InMemorySession,
        cmd: &SlowCommand,
    ) -> Result<(), AppError> {
        self.calls.hit();
        tokio::time::sleep(cmd.delay).await;
        Ok(())
    }
}

/// 预置 Jane 的数据库
pub fn seeded_db() -> InMemoryDatabase {
    let db = InMemoryDatabase::new();
    db.seed(&jane()).expect("seed employee");
    db
}

/// 员工更新/删除的标准装配
pub fn employee_engine(
    db: &InMemoryDatabase,
    update: Arc<UpdateEmployee>,
    delete: Arc<DeleteEmployee>,
) -> RulesEngineBuilder<InMemoryDatabase> {
    InProcessRulesEngine::builder(db.clone())
        .bind::<UpdateEmployeeInput>()
        .try_map(input_to_command)
        .validator(update_rules())
        .handler::<UpdateEmployeeCommand, _>(update)
        .handler::<DeleteEmployeeCommand, _>(delete)
}

//! 图书资产管理示例：团队、借阅与员工变更走同一条规则引擎
//!
//! 运行：`RUST_LOG=rules_application=debug cargo run -p rules-application --example library_admin`

use async_trait::async_trait;
use rules_application::command_handler::{CommandAction, CommandHandler};
use rules_application::config::EngineConfig;
use rules_application::context::AppContext;
use rules_application::error::AppError;
use rules_application::logging::{self, Profile};
use rules_application::validation::Validator;
use rules_application::{InProcessRulesEngine, RulesEngine};
use rules_domain::business_context::BusinessContext;
use rules_domain::persist::{InMemoryDatabase, InMemorySession};
use rules_macros::{Command, InputMessage, ReturnItem, entity};
use std::sync::Arc;

#[entity(id = u64)]
#[derive(ReturnItem)]
struct Team {
    name: String,
    members: Vec<u64>,
}

#[entity(id = u64)]
struct Loan {
    item: String,
    borrower: u64,
    returned: bool,
}

#[derive(Debug, Clone, ReturnItem)]
enum LoanResult {
    Loan(Loan),
    Team(Team),
}

#[derive(Debug, Command)]
#[command(result = Team)]
struct CreateTeamCommand {
    id: u64,
    name: String,
}

#[derive(Debug, InputMessage)]
#[input(command = CreateTeamCommand)]
struct CreateTeamInput {
    id: u64,
    name: String,
}

#[derive(Debug, Command)]
#[command(result = LoanResult)]
struct LendItemCommand {
    loan_id: u64,
    team_id: u64,
    item: String,
    borrower: u64,
}

#[derive(Debug, Command)]
struct ReturnItemCommand {
    loan_id: u64,
}

struct CreateTeam;

#[async_trait]
impl CommandHandler<CreateTeamCommand, InMemorySession> for CreateTeam {
    async fn handle(
        &self,
        _ctx: &AppContext,
        session: &mut InMemorySession,
        cmd: &CreateTeamCommand,
    ) -> Result<Option<Team>, AppError> {
        if session.get::<Team>(&cmd.id)?.is_some() {
            return Err(AppError::Rejected(format!("team {} already exists", cmd.id)));
        }
        let team = Team {
            id: cmd.id,
            name: cmd.name.clone(),
            members: Vec::new(),
        };
        session.put(&team)?;
        Ok(Some(team))
    }
}

struct LendItem;

#[async_trait]
impl CommandHandler<LendItemCommand, InMemorySession> for LendItem {
    async fn handle(
        &self,
        _ctx: &AppContext,
        session: &mut InMemorySession,
        cmd: &LendItemCommand,
    ) -> Result<Option<LoanResult>, AppError> {
        let open = session
            .list::<Loan>()?
            .into_iter()
            .any(|l| l.item == cmd.item && !l.returned);
        if open {
            return Err(AppError::Rejected(format!("{} is already on loan", cmd.item)));
        }
        let loan = Loan {
            id: cmd.loan_id,
            item: cmd.item.clone(),
            borrower: cmd.borrower,
            returned: false,
        };
        session.put(&loan)?;
        Ok(Some(loan.into()))
    }
}

/// 借阅人自动加入团队
struct JoinTeam;

#[async_trait]
impl CommandHandler<LendItemCommand, InMemorySession> for JoinTeam {
    async fn handle(
        &self,
        _ctx: &AppContext,
        session: &mut InMemorySession,
        cmd: &LendItemCommand,
    ) -> Result<Option<LoanResult>, AppError> {
        let mut team = session
            .get::<Team>(&cmd.team_id)?
            .ok_or_else(|| AppError::NotFound(format!("team {}", cmd.team_id)))?;
        if !team.members.contains(&cmd.borrower) {
            team.members.push(cmd.borrower);
            session.put(&team)?;
        }
        Ok(Some(team.into()))
    }
}

struct ReturnLoan;

#[async_trait]
impl CommandAction<ReturnItemCommand, InMemorySession> for ReturnLoan {
    async fn run(
        &self,
        _ctx: &AppContext,
        session: &mut InMemorySession,
        cmd: &ReturnItemCommand,
    ) -> Result<(), AppError> {
        let mut loan = session
            .get::<Loan>(&cmd.loan_id)?
            .ok_or_else(|| AppError::NotFound(format!("loan {}", cmd.loan_id)))?;
        loan.returned = true;
        session.put(&loan)?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init(Profile::Development);

    let db = InMemoryDatabase::new();
    let engine = InProcessRulesEngine::builder(db.clone())
        .config(EngineConfig::from_env()?)
        .bind::<CreateTeamInput>()
        .map(|i: CreateTeamInput| CreateTeamCommand {
            id: i.id,
            name: i.name,
        })
        .validator(
            Validator::new()
                .required("name", |c: &CreateTeamCommand| c.name.as_str())
                .stop_on_failure()
                .max_length("name", |c: &CreateTeamCommand| c.name.as_str(), 32),
        )
        .validator(
            Validator::new()
                .required("item", |c: &LendItemCommand| c.item.as_str())
                .compare(
                    "borrower",
                    "team_id",
                    |c: &LendItemCommand| c.borrower != 0 && c.team_id != 0,
                    "{field} and {other} must be set",
                ),
        )
        .handler::<CreateTeamCommand, _>(Arc::new(CreateTeam))
        .handler::<LendItemCommand, _>(Arc::new(LendItem))
        .handler::<LendItemCommand, _>(Arc::new(JoinTeam))
        .action::<ReturnItemCommand, _>(Arc::new(ReturnLoan))
        .build()?;

    let ctx = AppContext {
        biz: BusinessContext::builder()
            .correlation_id("cor-1".to_string())
            .actor_type("librarian".to_string())
            .actor_id("l-1".to_string())
            .build(),
        idempotency_key: Some("idem-1".into()),
        ..Default::default()
    };

    let rejected = engine
        .process(
            &ctx,
            CreateTeamInput {
                id: 1,
                name: "".into(),
            },
        )
        .await?;
    for (field, messages) in rejected.field_errors() {
        println!("CreateTeam rejected: {field}: {}", messages.join(", "));
    }

    let created = engine
        .process(
            &ctx,
            CreateTeamInput {
                id: 1,
                name: "Reference desk".into(),
            },
        )
        .await?;
    if let Some(team) = created.result::<Team>() {
        println!("CreateTeam: id={}, name={}", team.id, team.name);
    }

    let lent = engine
        .execute(
            &ctx,
            LendItemCommand {
                loan_id: 10,
                team_id: 1,
                item: "Atlas of the World".into(),
                borrower: 42,
            },
        )
        .await?;
    if let (Some(loan), Some(team)) = (lent.result::<Loan>(), lent.result::<Team>()) {
        println!(
            "LendItem: loan={}, item={}, team members={:?}",
            loan.id, loan.item, team.members
        );
    }

    let again = engine
        .execute(
            &ctx,
            LendItemCommand {
                loan_id: 11,
                team_id: 1,
                item: "Atlas of the World".into(),
                borrower: 43,
            },
        )
        .await;
    if let Err(err) = again {
        println!("LendItem failed and rolled back: {err}");
    }

    engine
        .execute(&ctx, ReturnItemCommand { loan_id: 10 })
        .await?;

    let stats = db.stats();
    println!(
        "transactions: begun={}, committed={}, rolled back={}",
        stats.begun, stats.committed, stats.rolled_back
    );
    Ok(())
}

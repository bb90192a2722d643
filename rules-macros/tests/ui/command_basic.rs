use rules_application::command::{Command, DEFAULT_GROUP, InputMessage};
use rules_macros::{Command, InputMessage, ReturnItem};

#[derive(Debug, ReturnItem)]
struct LoanId(u64);

#[derive(Command)]
struct ArchiveTeamCommand;

#[derive(Command)]
#[command(name = "loans.lend", group = "loans", result = LoanId)]
struct LendItemCommand {
    item: String,
}

#[derive(InputMessage)]
#[input(group = "loans", command = LendItemCommand)]
struct LendItemInput {
    item: String,
}

fn declared<I: InputMessage>() -> &'static str {
    <I::Command as Command>::NAME
}

fn main() {
    assert_eq!(ArchiveTeamCommand::NAME, "ArchiveTeamCommand");
    assert_eq!(ArchiveTeamCommand::GROUP, DEFAULT_GROUP);
    assert_eq!(LendItemCommand::NAME, "loans.lend");
    assert_eq!(LendItemCommand::GROUP, "loans");
    assert_eq!(LendItemInput::NAME, "LendItemInput");
    assert_eq!(LendItemInput::GROUP, "loans");
    assert_eq!(declared::<LendItemInput>(), "loans.lend");

    let _unit: <ArchiveTeamCommand as Command>::Result = ();
    let _id: <LendItemCommand as Command>::Result = LoanId(1);
    let _ = LendItemCommand { item: String::new() }.item;
    let _ = LendItemInput { item: String::new() }.item;
}

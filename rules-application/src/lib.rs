pub mod command;
pub mod command_handler;
pub mod config;
pub mod context;
pub mod convention;
pub mod engine;
pub mod error;
pub mod locator;
pub mod logging;
pub mod mapping;
pub mod outcome;
pub mod processor;
pub mod proxy;
pub mod registry;
pub mod unit_of_work;
pub mod validation;

pub use engine::{InProcessRulesEngine, RulesEngine, RulesEngineBuilder};
pub use outcome::{Outcome, OutcomeError};

// 允许在本 crate 内部（包括测试）使用 `::rules_application::...` 路径，以便派生宏生成的代码解析
extern crate self as rules_application;

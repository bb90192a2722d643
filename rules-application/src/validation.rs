//! 校验引擎
//!
//! 规则分两类：
//! - 单字段规则：判定部分为一个 `Specification`，可直接接入外部校验器；
//! - 跨字段规则：比较同一消息上的两个字段。
//!
//! 规则按注册顺序执行。带“停止”标记的规则失败后，仅跳过同一字段上的后续规则；
//! 其余字段的规则照常执行，所有失败统一收集后返回。

use crate::command::Command;
use rules_domain::specification::{Specification, spec_fn};
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::fmt::Display;

/// 单条校验失败
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub field: String,
    pub message: String,
}

impl ValidationFailure {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

enum Check<C> {
    Field(Box<dyn Specification<C>>),
    CrossField {
        other: &'static str,
        check: Box<dyn Specification<C>>,
    },
}

struct Rule<C> {
    field: &'static str,
    check: Check<C>,
    template: String,
    stop_on_failure: bool,
}

impl<C> Rule<C> {
    fn passes(&self, cmd: &C) -> bool {
        match &self.check {
            Check::Field(spec) => spec.is_satisfied_by(cmd),
            Check::CrossField { check, .. } => check.is_satisfied_by(cmd),
        }
    }

    fn render(&self) -> String {
        let message = self.template.replace("{field}", self.field);
        match &self.check {
            Check::CrossField { other, .. } => message.replace("{other}", other),
            Check::Field(_) => message,
        }
    }
}

/// 某一命令类型的规则集
///
/// ```
/// use rules_application::validation::Validator;
///
/// struct ChangePassword { password: String, confirm: String }
///
/// let v = Validator::<ChangePassword>::new()
///     .required("password", |c: &ChangePassword| c.password.as_str())
///     .stop_on_failure()
///     .max_length("password", |c: &ChangePassword| c.password.as_str(), 64)
///     .equal("confirm", "password", |c: &ChangePassword| &c.confirm, |c: &ChangePassword| &c.password);
///
/// let failures = v.validate(&ChangePassword { password: "".into(), confirm: "x".into() });
/// assert_eq!(failures.len(), 2);
/// assert_eq!(failures[1].message, "confirm must equal password");
/// ```
pub struct Validator<C> {
    rules: Vec<Rule<C>>,
}

impl<C: Send + Sync + 'static> Default for Validator<C> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<C: Send + Sync + 'static> Validator<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以规约作为单字段规则的判定
    pub fn satisfies<S>(mut self, field: &'static str, spec: S, message: impl Into<String>) -> Self
    where
        S: Specification<C> + 'static,
    {
        self.rules.push(Rule {
            field,
            check: Check::Field(Box::new(spec)),
            template: message.into(),
            stop_on_failure: false,
        });
        self
    }

    pub fn must<F>(self, field: &'static str, predicate: F, message: impl Into<String>) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        self.satisfies(field, spec_fn(predicate), message)
    }

    /// 非空（去除首尾空白后）；消息为 `required`
    pub fn required<F>(self, field: &'static str, get: F) -> Self
    where
        F: for<'a> Fn(&'a C) -> &'a str + Send + Sync + 'static,
    {
        self.must(field, move |c| !get(c).trim().is_empty(), "required")
    }

    pub fn max_length<F>(self, field: &'static str, get: F, max: usize) -> Self
    where
        F: for<'a> Fn(&'a C) -> &'a str + Send + Sync + 'static,
    {
        self.must(
            field,
            move |c| get(c).chars().count() <= max,
            format!("{{field}} must be at most {max} characters"),
        )
    }

    /// 闭区间 `[min, max]`
    pub fn range<F, N>(self, field: &'static str, get: F, min: N, max: N) -> Self
    where
        F: Fn(&C) -> N + Send + Sync + 'static,
        N: PartialOrd + Display + Send + Sync + 'static,
    {
        let message = format!("{{field}} must be between {min} and {max}");
        self.must(
            field,
            move |c| {
                let v = get(c);
                v >= min && v <= max
            },
            message,
        )
    }

    /// 跨字段比较；`check` 返回 `true` 表示通过
    pub fn compare<F>(
        mut self,
        field: &'static str,
        other: &'static str,
        check: F,
        message: impl Into<String>,
    ) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            field,
            check: Check::CrossField {
                other,
                check: Box::new(spec_fn(check)),
            },
            template: message.into(),
            stop_on_failure: false,
        });
        self
    }

    pub fn equal<V, L, R>(self, field: &'static str, other: &'static str, left: L, right: R) -> Self
    where
        V: PartialEq + ?Sized,
        L: for<'a> Fn(&'a C) -> &'a V + Send + Sync + 'static,
        R: for<'a> Fn(&'a C) -> &'a V + Send + Sync + 'static,
    {
        self.compare(
            field,
            other,
            move |c| left(c) == right(c),
            "{field} must equal {other}",
        )
    }

    pub fn not_equal<V, L, R>(
        self,
        field: &'static str,
        other: &'static str,
        left: L,
        right: R,
    ) -> Self
    where
        V: PartialEq + ?Sized,
        L: for<'a> Fn(&'a C) -> &'a V + Send + Sync + 'static,
        R: for<'a> Fn(&'a C) -> &'a V + Send + Sync + 'static,
    {
        self.compare(
            field,
            other,
            move |c| left(c) != right(c),
            "{field} must differ from {other}",
        )
    }

    /// 标记最近一条规则：失败后跳过同字段的后续规则
    pub fn stop_on_failure(mut self) -> Self {
        if let Some(rule) = self.rules.last_mut() {
            rule.stop_on_failure = true;
        }
        self
    }

    /// 覆盖最近一条规则的消息模板
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        if let Some(rule) = self.rules.last_mut() {
            rule.template = message.into();
        }
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn validate(&self, cmd: &C) -> Vec<ValidationFailure> {
        let mut stopped: HashSet<&'static str> = HashSet::new();
        let mut failures = Vec::new();
        for rule in &self.rules {
            if stopped.contains(rule.field) {
                continue;
            }
            if rule.passes(cmd) {
                continue;
            }
            failures.push(ValidationFailure::new(rule.field, rule.render()));
            if rule.stop_on_failure {
                stopped.insert(rule.field);
            }
        }
        failures
    }

    fn extend(&mut self, other: Validator<C>) {
        self.rules.extend(other.rules);
    }
}

/// 按命令类型索引的规则集合，构建后冻结
#[derive(Default)]
pub struct ValidatorSet {
    validators: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl ValidatorSet {
    pub fn builder() -> ValidatorSetBuilder {
        ValidatorSetBuilder::default()
    }

    /// 未注册规则的命令视为合法
    pub fn validate<C: Command>(&self, cmd: &C) -> Vec<ValidationFailure> {
        self.validators
            .get(&TypeId::of::<C>())
            .and_then(|v| v.downcast_ref::<Validator<C>>())
            .map(|v| v.validate(cmd))
            .unwrap_or_default()
    }

    pub fn contains<C: Command>(&self) -> bool {
        self.validators.contains_key(&TypeId::of::<C>())
    }
}

#[derive(Default)]
pub struct ValidatorSetBuilder {
    validators: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl ValidatorSetBuilder {
    /// 同一命令多次注册时，规则按注册顺序追加
    pub fn add<C: Command>(mut self, validator: Validator<C>) -> Self {
        match self
            .validators
            .get_mut(&TypeId::of::<C>())
            .and_then(|v| v.downcast_mut::<Validator<C>>())
        {
            Some(existing) => existing.extend(validator),
            None => {
                self.validators
                    .insert(TypeId::of::<C>(), Box::new(validator));
            }
        }
        self
    }

    pub fn build(self) -> ValidatorSet {
        ValidatorSet {
            validators: self.validators,
        }
    }
}

//! 结果聚合
//!
//! - `ReturnItem`：命令结果的和类型，每个变体包裹一种结果类型；
//! - `ReturnItems`：按结果的运行时类型分槽，同槽后写覆盖前写；
//! - `Outcome`：对外的成功/错误/类型化结果契约。

use crate::validation::ValidationFailure;
use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::collections::BTreeMap;

/// 命令结果的和类型
///
/// 通常通过 `#[derive(ReturnItem)]` 生成：结构体自身即唯一结果；
/// 枚举的每个单字段元组变体对应一种结果类型。
pub trait ReturnItem: Send + Sync + 'static {
    /// 结果槽位：当前承载值的运行时类型
    fn slot(&self) -> TypeId;

    fn type_name(&self) -> &'static str;
}

/// 不产生结果的命令
impl ReturnItem for () {
    fn slot(&self) -> TypeId {
        TypeId::of::<()>()
    }

    fn type_name(&self) -> &'static str {
        "()"
    }
}

/// 从结果和类型中按类型取出某一变体
pub trait Extract<T>: ReturnItem {
    fn extract(&self) -> Option<&T>;

    fn into_extracted(self) -> Option<T>;
}

/// 单次处理收集到的结果，保持首次写入顺序
#[derive(Debug, Clone)]
pub struct ReturnItems<R> {
    items: Vec<R>,
}

impl<R> Default for ReturnItems<R> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<R: ReturnItem> ReturnItems<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入结果；同槽已有值时原位替换并返回旧值
    pub fn insert(&mut self, item: R) -> Option<R> {
        let slot = item.slot();
        match self.items.iter().position(|i| i.slot() == slot) {
            Some(pos) => Some(std::mem::replace(&mut self.items[pos], item)),
            None => {
                self.items.push(item);
                None
            }
        }
    }

    pub fn get<T>(&self) -> Option<&T>
    where
        R: Extract<T>,
    {
        self.items.iter().find_map(|i| i.extract())
    }

    pub fn take<T>(self) -> Option<T>
    where
        R: Extract<T>,
    {
        self.items.into_iter().find_map(|i| i.into_extracted())
    }

    pub fn contains(&self, slot: TypeId) -> bool {
        self.items.iter().any(|i| i.slot() == slot)
    }

    pub fn type_names(&self) -> Vec<&'static str> {
        self.items.iter().map(|i| i.type_name()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.items.iter()
    }
}

/// 对外暴露的单条错误
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeError {
    pub invalid_property: String,
    pub message: String,
}

impl From<ValidationFailure> for OutcomeError {
    fn from(f: ValidationFailure) -> Self {
        Self {
            invalid_property: f.field,
            message: f.message,
        }
    }
}

/// 内部执行结果
#[derive(Debug, Clone)]
pub struct ExecutionResult<R> {
    pub successful: bool,
    pub errors: Vec<ValidationFailure>,
    pub return_items: ReturnItems<R>,
}

impl<R: ReturnItem> ExecutionResult<R> {
    pub fn succeeded(return_items: ReturnItems<R>) -> Self {
        Self {
            successful: true,
            errors: Vec::new(),
            return_items,
        }
    }

    pub fn failed_validation(errors: Vec<ValidationFailure>) -> Self {
        Self {
            successful: false,
            errors,
            return_items: ReturnItems::new(),
        }
    }
}

/// 处理结果（对外契约）
///
/// `successful == false` 时 `errors` 至少有一项且不携带任何结果；
/// 执行期错误不会出现在这里，而是以 `Err(AppError)` 返回。
#[derive(Debug, Clone)]
pub struct Outcome<R> {
    successful: bool,
    errors: Vec<OutcomeError>,
    items: ReturnItems<R>,
}

impl<R: ReturnItem> Outcome<R> {
    pub fn successful(&self) -> bool {
        self.successful
    }

    pub fn errors(&self) -> &[OutcomeError] {
        &self.errors
    }

    /// 读取某一类型的结果；类型须为命令结果和类型中的一种
    pub fn result<T>(&self) -> Option<&T>
    where
        R: Extract<T>,
    {
        self.items.get::<T>()
    }

    pub fn into_result<T>(self) -> Option<T>
    where
        R: Extract<T>,
    {
        self.items.take::<T>()
    }

    pub fn items(&self) -> &ReturnItems<R> {
        &self.items
    }

    /// 按字段归并错误消息，供入站边界回显到对应字段
    pub fn field_errors(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut out: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for e in &self.errors {
            out.entry(e.invalid_property.as_str())
                .or_default()
                .push(e.message.as_str());
        }
        out
    }
}

impl<R: ReturnItem> From<ExecutionResult<R>> for Outcome<R> {
    fn from(result: ExecutionResult<R>) -> Self {
        Self {
            successful: result.successful,
            errors: result.errors.into_iter().map(OutcomeError::from).collect(),
            items: result.return_items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rules_macros::ReturnItem;

    #[derive(Debug, Clone, PartialEq)]
    struct Employee {
        id: u32,
        name: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct AuditNote(String);

    #[derive(Debug, Clone, PartialEq, ReturnItem)]
    enum EmployeeResult {
        Employee(Employee),
        Note(AuditNote),
    }

    fn jane() -> Employee {
        Employee {
            id: 7,
            name: "Jane".into(),
        }
    }

    #[test]
    fn later_write_wins_per_slot() {
        let mut items = ReturnItems::new();
        assert!(items.insert(EmployeeResult::from(AuditNote("first".into()))).is_none());
        assert!(items.insert(jane().into()).is_none());
        let replaced = items.insert(AuditNote("second".into()).into());

        assert_eq!(replaced, Some(EmployeeResult::Note(AuditNote("first".into()))));
        assert_eq!(items.len(), 2);
        assert_eq!(items.get::<AuditNote>(), Some(&AuditNote("second".into())));
        assert_eq!(items.get::<Employee>(), Some(&jane()));
    }

    #[test]
    fn outcome_from_failed_validation() {
        let result: ExecutionResult<EmployeeResult> = ExecutionResult::failed_validation(vec![
            ValidationFailure::new("first_name", "required"),
            ValidationFailure::new("first_name", "too short"),
            ValidationFailure::new("email", "invalid"),
        ]);
        let outcome = Outcome::from(result);

        assert!(!outcome.successful());
        assert_eq!(outcome.errors()[0].invalid_property, "first_name");
        assert!(outcome.result::<Employee>().is_none());
        let by_field = outcome.field_errors();
        assert_eq!(by_field["first_name"], vec!["required", "too short"]);
        assert_eq!(by_field["email"], vec!["invalid"]);
    }

    #[test]
    fn outcome_result_round_trip() {
        let mut items = ReturnItems::new();
        items.insert(EmployeeResult::from(jane()));
        let outcome = Outcome::from(ExecutionResult::succeeded(items));

        assert!(outcome.successful());
        assert!(outcome.errors().is_empty());
        assert_eq!(outcome.result::<Employee>(), Some(&jane()));
        assert_eq!(outcome.result::<AuditNote>(), None);
        assert_eq!(outcome.into_result::<Employee>(), Some(jane()));
    }

    #[test]
    fn outcome_error_serializes_flat() {
        let e = OutcomeError::from(ValidationFailure::new("first_name", "required"));
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"invalid_property": "first_name", "message": "required"})
        );
    }
}

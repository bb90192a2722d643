//! 规约（Specification）
//!
//! 封装可复用、可组合的业务谓词。校验引擎中的单字段规则即以规约作为判定部分，
//! 外部校验器也可以实现该 trait 后直接接入。
//!
use std::marker::PhantomData;

/// 规约模式的核心 trait
///
/// 需跨线程共享（规则集构建后冻结并被并发调用读取），因此要求 `Send + Sync`。
pub trait Specification<T: ?Sized>: Send + Sync {
    /// 检查候选对象是否满足规约
    fn is_satisfied_by(&self, candidate: &T) -> bool;

    /// 与另一个规约进行 AND 组合
    fn and<S>(self, other: S) -> AndSpecification<T>
    where
        Self: Sized + 'static,
        S: Specification<T> + 'static,
    {
        AndSpecification::new(Box::new(self), Box::new(other))
    }

    /// 与另一个规约进行 OR 组合
    fn or<S>(self, other: S) -> OrSpecification<T>
    where
        Self: Sized + 'static,
        S: Specification<T> + 'static,
    {
        OrSpecification::new(Box::new(self), Box::new(other))
    }

    /// 对规约进行 NOT 操作
    fn not(self) -> NotSpecification<T>
    where
        Self: Sized + 'static,
    {
        NotSpecification::new(Box::new(self))
    }
}

impl<T: ?Sized> Specification<T> for Box<dyn Specification<T>> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.as_ref().is_satisfied_by(candidate)
    }
}

/// 以闭包表达的规约
pub struct FnSpecification<T: ?Sized, F> {
    predicate: F,
    _marker: PhantomData<fn(&T)>,
}

/// 由闭包构造规约：`spec_fn(|name: &str| !name.is_empty())`
pub fn spec_fn<T, F>(predicate: F) -> FnSpecification<T, F>
where
    T: ?Sized,
    F: Fn(&T) -> bool + Send + Sync,
{
    FnSpecification {
        predicate,
        _marker: PhantomData,
    }
}

impl<T, F> Specification<T> for FnSpecification<T, F>
where
    T: ?Sized,
    F: Fn(&T) -> bool + Send + Sync,
{
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        (self.predicate)(candidate)
    }
}

/// AND 组合规约
pub struct AndSpecification<T: ?Sized> {
    left: Box<dyn Specification<T>>,
    right: Box<dyn Specification<T>>,
}

impl<T: ?Sized> AndSpecification<T> {
    pub fn new(left: Box<dyn Specification<T>>, right: Box<dyn Specification<T>>) -> Self {
        Self { left, right }
    }
}

impl<T: ?Sized> Specification<T> for AndSpecification<T> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.left.is_satisfied_by(candidate) && self.right.is_satisfied_by(candidate)
    }
}

/// OR 组合规约
pub struct OrSpecification<T: ?Sized> {
    left: Box<dyn Specification<T>>,
    right: Box<dyn Specification<T>>,
}

impl<T: ?Sized> OrSpecification<T> {
    pub fn new(left: Box<dyn Specification<T>>, right: Box<dyn Specification<T>>) -> Self {
        Self { left, right }
    }
}

impl<T: ?Sized> Specification<T> for OrSpecification<T> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.left.is_satisfied_by(candidate) || self.right.is_satisfied_by(candidate)
    }
}

/// NOT 规约
pub struct NotSpecification<T: ?Sized> {
    inner: Box<dyn Specification<T>>,
}

impl<T: ?Sized> NotSpecification<T> {
    pub fn new(inner: Box<dyn Specification<T>>) -> Self {
        Self { inner }
    }
}

impl<T: ?Sized> Specification<T> for NotSpecification<T> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        !self.inner.is_satisfied_by(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NotBlank;
    impl Specification<str> for NotBlank {
        fn is_satisfied_by(&self, candidate: &str) -> bool {
            !candidate.trim().is_empty()
        }
    }

    struct ShorterThan(usize);
    impl Specification<str> for ShorterThan {
        fn is_satisfied_by(&self, candidate: &str) -> bool {
            candidate.chars().count() < self.0
        }
    }

    #[test]
    fn and_requires_both() {
        let spec = NotBlank.and(ShorterThan(5));
        assert!(spec.is_satisfied_by("Ann"));
        assert!(!spec.is_satisfied_by("   "));
        assert!(!spec.is_satisfied_by("Bartholomew"));
    }

    #[test]
    fn or_requires_either() {
        let spec = ShorterThan(1).or(NotBlank);
        assert!(spec.is_satisfied_by(""));
        assert!(spec.is_satisfied_by("Doe"));
        assert!(!spec.is_satisfied_by("  "));
    }

    #[test]
    fn not_inverts() {
        let spec = NotBlank.not();
        assert!(spec.is_satisfied_by(""));
        assert!(!spec.is_satisfied_by("x"));
    }

    #[test]
    fn closure_specs_compose() {
        // (非空 AND 短于 10) OR 全为数字
        let spec = spec_fn(|s: &str| !s.is_empty())
            .and(ShorterThan(10))
            .or(spec_fn(|s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())));
        assert!(spec.is_satisfied_by("Jane"));
        assert!(spec.is_satisfied_by("123456789012"));
        assert!(!spec.is_satisfied_by(""));
    }
}

//! 映射服务
//!
//! 在入站输入与命令之间、实体与读模型之间做对象投影。
//! 映射表在组合根构建后冻结；源与目标类型相同时直接透传。

use crate::error::{AppError, ConfigurationError};
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;

type MapFn = Box<dyn Fn(Box<dyn Any + Send>) -> Result<Box<dyn Any + Send>, AppError> + Send + Sync>;

#[derive(Default)]
pub struct Mapper {
    maps: HashMap<(TypeId, TypeId), MapFn>,
}

impl Mapper {
    pub fn builder() -> MapperBuilder {
        MapperBuilder::default()
    }

    pub fn contains<S: 'static, D: 'static>(&self) -> bool {
        TypeId::of::<S>() == TypeId::of::<D>()
            || self
                .maps
                .contains_key(&(TypeId::of::<S>(), TypeId::of::<D>()))
    }

    /// 将 `source` 投影为 `D`
    ///
    /// 未注册的映射返回 `ConfigurationError::MissingMapping`。
    pub fn map<S, D>(&self, source: S) -> Result<D, AppError>
    where
        S: Send + 'static,
        D: Send + 'static,
    {
        if TypeId::of::<S>() == TypeId::of::<D>() {
            let boxed: Box<dyn Any + Send> = Box::new(source);
            return unbox::<D>(boxed);
        }

        let f = self
            .maps
            .get(&(TypeId::of::<S>(), TypeId::of::<D>()))
            .ok_or(ConfigurationError::MissingMapping {
                from: type_name::<S>(),
                to: type_name::<D>(),
            })?;
        unbox::<D>(f(Box::new(source))?)
    }

    pub fn map_all<S, D, I>(&self, sources: I) -> Result<Vec<D>, AppError>
    where
        S: Send + 'static,
        D: Send + 'static,
        I: IntoIterator<Item = S>,
    {
        sources.into_iter().map(|s| self.map::<S, D>(s)).collect()
    }
}

fn unbox<D: 'static>(boxed: Box<dyn Any + Send>) -> Result<D, AppError> {
    boxed
        .downcast::<D>()
        .map(|d| *d)
        .map_err(|_| AppError::TypeMismatch {
            expected: type_name::<D>(),
            found: "unknown",
        })
}

#[derive(Default)]
pub struct MapperBuilder {
    maps: HashMap<(TypeId, TypeId), MapFn>,
}

impl MapperBuilder {
    /// 注册映射；同一对类型重复注册时后者覆盖前者
    pub fn register<S, D, F>(self, f: F) -> Self
    where
        S: Send + 'static,
        D: Send + 'static,
        F: Fn(S) -> D + Send + Sync + 'static,
    {
        self.try_register(move |s: S| Ok(f(s)))
    }

    /// 注册可能失败的映射
    pub fn try_register<S, D, F>(mut self, f: F) -> Self
    where
        S: Send + 'static,
        D: Send + 'static,
        F: Fn(S) -> Result<D, AppError> + Send + Sync + 'static,
    {
        let erased: MapFn = Box::new(move |boxed: Box<dyn Any + Send>| -> Result<Box<dyn Any + Send>, AppError> {
            let source = boxed
                .downcast::<S>()
                .map_err(|_| AppError::TypeMismatch {
                    expected: type_name::<S>(),
                    found: "unknown",
                })?;
            let out = f(*source)?;
            Ok(Box::new(out))
        });
        self.maps.insert((TypeId::of::<S>(), TypeId::of::<D>()), erased);
        self
    }

    /// 以 `From` 实现注册
    pub fn register_from<S, D>(self) -> Self
    where
        S: Send + 'static,
        D: From<S> + Send + 'static,
    {
        self.register::<S, D, _>(D::from)
    }

    pub fn build(self) -> Mapper {
        Mapper { maps: self.maps }
    }
}

use syn::meta::ParseNestedMeta;

// 键只允许出现一次
pub(crate) fn set_once<T>(
    slot: &mut Option<T>,
    value: T,
    meta: &ParseNestedMeta<'_>,
    key: &str,
) -> syn::Result<()> {
    if slot.is_some() {
        return Err(meta.error(format!("duplicate key '{key}' in attribute")));
    }
    *slot = Some(value);
    Ok(())
}

// 拒绝泛型：命令/结果类型需满足 'static 且以稳定名称注册
pub(crate) fn reject_generics(generics: &syn::Generics, what: &str) -> syn::Result<()> {
    if generics.params.is_empty() {
        return Ok(());
    }
    Err(syn::Error::new_spanned(
        generics,
        format!("{what} does not support generic parameters"),
    ))
}

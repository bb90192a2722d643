use quote::ToTokens;
use syn::{Attribute, Path, Token, punctuated::Punctuated};

/// 在 attrs 上合并默认派生
/// - 收集已有 `#[derive(...)]` 中的路径并移除原属性
/// - 以 required 在前、已有在后的顺序去重，生成单个 `#[derive(...)]` 置于最前
pub(crate) fn apply_derives(attrs: &mut Vec<Attribute>, required: Vec<Path>) {
    let mut existing: Vec<Path> = Vec::new();
    attrs.retain(|attr| {
        if !attr.path().is_ident("derive") {
            return true;
        }
        match attr.parse_args_with(Punctuated::<Path, Token![,]>::parse_terminated) {
            Ok(list) => {
                existing.extend(list);
                false
            }
            // 无法解析的 derive 原样保留，交由编译器报错
            Err(_) => true,
        }
    });

    let mut seen = std::collections::HashSet::<String>::new();
    let merged: Vec<Path> = required
        .into_iter()
        .chain(existing)
        .filter(|p| seen.insert(derive_key(p)))
        .collect();

    attrs.insert(0, syn::parse_quote!(#[derive(#(#merged),*)]));
}

// 归一化 derive 的 key，避免 Serialize/serde::Serialize 重复
fn derive_key(p: &Path) -> String {
    match p.segments.last() {
        Some(last) => {
            let ident = last.ident.to_string();
            match ident.as_str() {
                "Serialize" | "Deserialize" => format!("serde::{ident}"),
                _ => ident,
            }
        }
        None => p.to_token_stream().to_string(),
    }
}

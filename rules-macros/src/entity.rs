use crate::attr_utils::set_once;
use crate::derive_utils::apply_derives;
use crate::field_utils::ensure_leading_field;
use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Item, ItemStruct, LitBool, LitStr, Type, parse_macro_input};

/// #[entity] 宏实现
/// - 若缺失则追加字段 `id: IdType`，并置于字段最前
/// - 自动实现 `::rules_domain::entity::Entity`（TYPE/new/id）
/// - 支持参数：`#[entity(id = IdType, name = "...", debug = true|false)]`；
///   - `id` 默认 `String`
///   - `name` 默认结构体名，作为 `Entity::TYPE`
///   - `debug` 默认 `true`（派生 Debug）。当为 `false` 时不派生 Debug，便于用户自定义实现。
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut id_ty: Option<Type> = None;
    let mut type_name: Option<LitStr> = None;
    let mut derive_debug: Option<bool> = None;

    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("id") {
            let ty: Type = meta.value()?.parse()?;
            set_once(&mut id_ty, ty, &meta, "id")
        } else if meta.path.is_ident("name") {
            let lit: LitStr = meta.value()?.parse()?;
            set_once(&mut type_name, lit, &meta, "name")
        } else if meta.path.is_ident("debug") {
            let lit: LitBool = meta.value()?.parse()?;
            set_once(&mut derive_debug, lit.value(), &meta, "debug")
        } else {
            Err(meta.error("unknown key in attribute; expected 'id' | 'name' | 'debug'"))
        }
    });
    parse_macro_input!(attr with parser);

    let input = parse_macro_input!(item as Item);

    let mut st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[entity] only on struct")
                .to_compile_error()
                .into();
        }
    };

    // 仅支持具名字段结构体
    let fields_named = match &mut st.fields {
        syn::Fields::Named(f) => f,
        _ => {
            return syn::Error::new(st.span(), "only supports named-field struct")
                .to_compile_error()
                .into();
        }
    };

    let id_type = id_ty.unwrap_or_else(|| syn::parse_quote! { String });
    ensure_leading_field(fields_named, "id", &id_type);

    // 合并/规范 derive：默认添加 Debug（可通过 debug=false 关闭）、Clone、Default、Serialize、Deserialize
    let mut required: Vec<syn::Path> = vec![
        syn::parse_quote!(Clone),
        syn::parse_quote!(Default),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
    ];
    if derive_debug.unwrap_or(true) {
        required.insert(0, syn::parse_quote!(Debug));
    }
    apply_derives(&mut st.attrs, required);

    let out_struct = ItemStruct { ..st };

    let ident = &out_struct.ident;
    let type_lit = type_name.unwrap_or_else(|| LitStr::new(&ident.to_string(), ident.span()));
    let generics = out_struct.generics.clone();
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let expanded = quote! {
        #out_struct

        impl #impl_generics ::rules_domain::entity::Entity for #ident #ty_generics #where_clause {
            const TYPE: &'static str = #type_lit;

            type Id = #id_type;

            fn new(id: Self::Id) -> Self {
                Self { id, ..Default::default() }
            }

            fn id(&self) -> &Self::Id { &self.id }
        }
    };

    TokenStream::from(expanded)
}

use crate::attr_utils::{reject_generics, set_once};
use proc_macro::TokenStream;
use quote::quote;
use syn::{Attribute, DeriveInput, LitStr, Type, parse_macro_input};

// 命令/输入消息共用的属性：name、group 以及目标类型（command 的 result / input 的 command）
struct MessageAttrs {
    name: Option<LitStr>,
    group: Option<LitStr>,
    target: Option<Type>,
}

fn parse_message_attrs(
    attrs: &[Attribute],
    attr_name: &str,
    target_key: &str,
) -> syn::Result<MessageAttrs> {
    let mut name: Option<LitStr> = None;
    let mut group: Option<LitStr> = None;
    let mut target: Option<Type> = None;

    for attr in attrs.iter().filter(|a| a.path().is_ident(attr_name)) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let lit: LitStr = meta.value()?.parse()?;
                set_once(&mut name, lit, &meta, "name")
            } else if meta.path.is_ident("group") {
                let lit: LitStr = meta.value()?.parse()?;
                set_once(&mut group, lit, &meta, "group")
            } else if meta.path.is_ident(target_key) {
                let ty: Type = meta.value()?.parse()?;
                set_once(&mut target, ty, &meta, target_key)
            } else {
                Err(meta.error(format!(
                    "unknown key; expected 'name' | 'group' | '{target_key}'"
                )))
            }
        })?;
    }

    Ok(MessageAttrs {
        name,
        group,
        target,
    })
}

fn name_and_group(
    input: &DeriveInput,
    attrs: &MessageAttrs,
) -> (proc_macro2::TokenStream, Option<proc_macro2::TokenStream>) {
    let name = match &attrs.name {
        Some(lit) => quote! { #lit },
        None => {
            let s = input.ident.to_string();
            quote! { #s }
        }
    };
    let group = attrs
        .group
        .as_ref()
        .map(|g| quote! { const GROUP: &'static str = #g; });
    (name, group)
}

pub(crate) fn expand_command(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);

    let attrs = match reject_generics(&input.generics, "#[derive(Command)]")
        .and_then(|_| parse_message_attrs(&input.attrs, "command", "result"))
    {
        Ok(attrs) => attrs,
        Err(err) => return err.to_compile_error().into(),
    };

    let ident = &input.ident;
    let (name, group) = name_and_group(&input, &attrs);
    let result = match &attrs.target {
        Some(ty) => quote! { #ty },
        None => quote! { () },
    };

    let out = quote! {
        impl ::rules_application::command::Command for #ident {
            const NAME: &'static str = #name;
            #group
            type Result = #result;
        }
    };

    TokenStream::from(out)
}

pub(crate) fn expand_input(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);

    let attrs = match reject_generics(&input.generics, "#[derive(InputMessage)]")
        .and_then(|_| parse_message_attrs(&input.attrs, "input", "command"))
    {
        Ok(attrs) => attrs,
        Err(err) => return err.to_compile_error().into(),
    };

    let ident = &input.ident;
    let Some(command) = &attrs.target else {
        return syn::Error::new(
            ident.span(),
            "#[derive(InputMessage)] requires #[input(command = Type)]",
        )
        .to_compile_error()
        .into();
    };
    let (name, group) = name_and_group(&input, &attrs);

    let out = quote! {
        impl ::rules_application::command::InputMessage for #ident {
            const NAME: &'static str = #name;
            #group
            type Command = #command;
        }
    };

    TokenStream::from(out)
}

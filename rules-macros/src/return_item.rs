use crate::attr_utils::reject_generics;
use proc_macro::TokenStream;
use quote::{ToTokens, quote};
use std::collections::HashSet;
use syn::{Data, DeriveInput, Fields, parse_macro_input, spanned::Spanned};

pub(crate) fn expand(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    if let Err(err) = reject_generics(&input.generics, "#[derive(ReturnItem)]") {
        return err.to_compile_error().into();
    }

    let out = match &input.data {
        Data::Enum(data) => expand_enum(&input, data),
        Data::Struct(_) => Ok(expand_struct(&input)),
        Data::Union(_) => Err(syn::Error::new(
            input.ident.span(),
            "#[derive(ReturnItem)] supports enums and structs only",
        )),
    };

    match out {
        Ok(ts) => TokenStream::from(ts),
        Err(err) => err.to_compile_error().into(),
    }
}

// 结构体：自身即唯一结果类型
fn expand_struct(input: &DeriveInput) -> proc_macro2::TokenStream {
    let ident = &input.ident;
    quote! {
        impl ::rules_application::outcome::ReturnItem for #ident {
            fn slot(&self) -> ::std::any::TypeId {
                ::std::any::TypeId::of::<Self>()
            }

            fn type_name(&self) -> &'static str {
                ::std::any::type_name::<Self>()
            }
        }

        impl ::rules_application::outcome::Extract<#ident> for #ident {
            fn extract(&self) -> ::std::option::Option<&#ident> {
                ::std::option::Option::Some(self)
            }

            fn into_extracted(self) -> ::std::option::Option<#ident> {
                ::std::option::Option::Some(self)
            }
        }
    }
}

// 枚举：每个变体包裹一种结果类型，按内部类型区分槽位
fn expand_enum(
    input: &DeriveInput,
    data: &syn::DataEnum,
) -> syn::Result<proc_macro2::TokenStream> {
    let ident = &input.ident;
    if data.variants.is_empty() {
        return Err(syn::Error::new(
            ident.span(),
            "#[derive(ReturnItem)] requires at least one variant",
        ));
    }

    let mut seen = HashSet::<String>::new();
    let mut variants = Vec::with_capacity(data.variants.len());

    for v in &data.variants {
        let inner = match &v.fields {
            Fields::Unnamed(f) if f.unnamed.len() == 1 => f.unnamed[0].ty.clone(),
            _ => {
                return Err(syn::Error::new(
                    v.span(),
                    "#[derive(ReturnItem)] requires single-field tuple variants, e.g., Employee(Employee)",
                ));
            }
        };
        if !seen.insert(inner.to_token_stream().to_string()) {
            return Err(syn::Error::new(
                inner.span(),
                "each ReturnItem variant must wrap a distinct type",
            ));
        }
        variants.push((v.ident.clone(), inner));
    }

    let slot_arms = variants.iter().map(|(v, ty)| {
        quote! { Self::#v(_) => ::std::any::TypeId::of::<#ty>() }
    });
    let name_arms = variants.iter().map(|(v, ty)| {
        quote! { Self::#v(_) => ::std::any::type_name::<#ty>() }
    });

    let per_variant = variants.iter().map(|(v, ty)| {
        quote! {
            impl ::rules_application::outcome::Extract<#ty> for #ident {
                #[allow(unreachable_patterns)]
                fn extract(&self) -> ::std::option::Option<&#ty> {
                    match self {
                        Self::#v(inner) => ::std::option::Option::Some(inner),
                        _ => ::std::option::Option::None,
                    }
                }

                #[allow(unreachable_patterns)]
                fn into_extracted(self) -> ::std::option::Option<#ty> {
                    match self {
                        Self::#v(inner) => ::std::option::Option::Some(inner),
                        _ => ::std::option::Option::None,
                    }
                }
            }

            impl ::std::convert::From<#ty> for #ident {
                fn from(value: #ty) -> Self {
                    Self::#v(value)
                }
            }
        }
    });

    Ok(quote! {
        impl ::rules_application::outcome::ReturnItem for #ident {
            fn slot(&self) -> ::std::any::TypeId {
                match self { #( #slot_arms, )* }
            }

            fn type_name(&self) -> &'static str {
                match self { #( #name_arms, )* }
            }
        }

        #( #per_variant )*
    })
}

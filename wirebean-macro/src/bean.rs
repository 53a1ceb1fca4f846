use darling::{ast, util::Ignored, FromDeriveInput, FromField, FromMeta};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, DeriveInput, GenericArgument, PathArguments, Type};

/// Marker types recognised by name; other markers need `#[bean(marker)]`.
const MARKERS: &[&str] = &[
    "Configuration",
    "Controller",
    "Middleware",
    "Router",
    "Entities",
    "Testing",
    "Component",
    "Repository",
    "Parameter",
];

#[derive(FromDeriveInput)]
#[darling(attributes(bean), supports(struct_named))]
struct BeanInput {
    ident: syn::Ident,
    generics: syn::Generics,
    data: ast::Data<Ignored, BeanField>,
    #[darling(default)]
    prefix: Option<String>,
    #[darling(multiple, rename = "factory")]
    factories: Vec<FactoryAttr>,
}

#[derive(FromMeta)]
struct FactoryAttr {
    method: syn::Ident,
    #[darling(default)]
    name: Option<String>,
}

#[derive(FromField)]
#[darling(attributes(bean))]
struct BeanField {
    ident: Option<syn::Ident>,
    ty: Type,
    #[darling(default)]
    name: Option<String>,
    #[darling(default)]
    role: Option<String>,
    #[darling(default, rename = "type")]
    kind: Option<String>,
    #[darling(default)]
    prefix: Option<String>,
    #[darling(default)]
    value: Option<String>,
    #[darling(default, rename = "default")]
    fallback: Option<String>,
    #[darling(default)]
    marker: bool,
    #[darling(default)]
    skip: bool,
}

pub fn derive_bean(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let expanded = BeanInput::from_derive_input(&input).and_then(|bean| generate_bean_impl(&bean));
    match expanded {
        Ok(tokens) => TokenStream::from(tokens),
        Err(e) => TokenStream::from(e.write_errors()),
    }
}

fn generate_bean_impl(input: &BeanInput) -> darling::Result<TokenStream2> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        ast::Data::Struct(fields) => &fields.fields,
        ast::Data::Enum(_) => {
            return Err(darling::Error::custom(
                "#[derive(Bean)] can only be applied to structs",
            ))
        }
    };

    let mut errors = darling::Error::accumulator();
    let field_statements: Vec<TokenStream2> = fields
        .iter()
        .filter_map(|field| errors.handle(field_statement(field)))
        .flatten()
        .collect();
    errors.finish()?;

    let prefix = input.prefix.as_ref().map(|prefix| quote! { def.prefix(#prefix); });

    let factories = input.factories.iter().map(|factory| {
        let method = &factory.method;
        let method_name = method.to_string();
        match &factory.name {
            Some(name) => quote! { def.factory_into(#method_name, #name, Self::#method); },
            None => quote! { def.factory(#method_name, Self::#method); },
        }
    });

    Ok(quote! {
        impl #impl_generics ::wirebean::Bean for #struct_name #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn define(def: &mut ::wirebean::TypeDef<Self>) {
                #prefix
                #(#field_statements)*
                #(#factories)*
            }
        }
    })
}

/// The `TypeDef` call registering one field, if it takes part in wiring.
fn field_statement(field: &BeanField) -> darling::Result<Option<TokenStream2>> {
    if field.skip {
        return Ok(None);
    }
    let Some(field_name) = &field.ident else {
        return Ok(None);
    };
    let field_str = field_name.to_string();
    let ty = &field.ty;
    let wrapper = last_segment_ident(ty);

    let statement = match (wrapper.as_deref(), &field.value) {
        (Some("Autowired"), _) => {
            let target = first_type_argument(ty).ok_or_else(|| {
                darling::Error::custom("`Autowired` needs a type argument").with_span(ty)
            })?;
            let tag = tag_tokens(field);
            quote! {
                def.autowired::<#target>(#field_str, #tag, |bean| &mut bean.#field_name);
            }
        }
        (Some("Value"), Some(key)) => {
            let default = default_tokens(field);
            quote! {
                def.shared_value(#field_str, #key, #default, |bean| &mut bean.#field_name);
            }
        }
        (Some("Value"), None) => {
            return Err(
                darling::Error::custom("`Value` fields need #[bean(value = \"...\")]")
                    .with_span(ty),
            );
        }
        (_, Some(key)) => {
            let default = default_tokens(field);
            quote! {
                def.value(#field_str, #key, #default, |bean| &mut bean.#field_name);
            }
        }
        (Some(name), None) if field.marker || MARKERS.contains(&name) => {
            quote! { def.embed::<#ty>(); }
        }
        _ => return Ok(None),
    };
    Ok(Some(statement))
}

fn tag_tokens(field: &BeanField) -> TokenStream2 {
    let mut tag = quote!(::wirebean::Tag::new());
    if let Some(name) = &field.name {
        tag = quote!(#tag.name(#name));
    }
    if let Some(role) = field.role.as_ref().or(field.kind.as_ref()) {
        tag = quote!(#tag.kind(#role));
    }
    if let Some(prefix) = &field.prefix {
        tag = quote!(#tag.prefix(#prefix));
    }
    tag
}

fn default_tokens(field: &BeanField) -> TokenStream2 {
    match &field.fallback {
        Some(default) => quote!(::std::option::Option::Some(#default)),
        None => quote!(::std::option::Option::None),
    }
}

fn last_segment_ident(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string()),
        _ => None,
    }
}

/// Extract `T` from `Autowired<T>`
fn first_type_argument(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    })
}

//! Procedural macros for fnkit
//!
//! This crate provides the `#[function_source]` attribute macro, which turns
//! an `impl` block into a candidate source whose tagged methods are exposed
//! to the model.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::punctuated::Punctuated;
use syn::{
    Attribute, Expr, FnArg, GenericArgument, ImplItem, ImplItemFn, ItemImpl, Lit, Meta, Pat,
    PathArguments, ReturnType, Token, Type, parse_macro_input,
};

/// Implements `fnkit_core::CandidateSource` for the annotated `impl` block
///
/// Methods tagged `#[function]` become exposed functions. The protocol name
/// defaults to the method name and the description to the method's doc
/// comment; both can be set explicitly. Parameters may carry
/// `#[param(description = "...", name = "...")]`. `Option<T>` parameters are
/// optional.
///
/// Exposed methods take `&self`, `self: Arc<Self>` or no receiver, may be
/// `async`, and may return any `Serialize` type or a `Result` of one whose
/// error implements `Display`.
///
/// # Example
///
/// ```ignore
/// use fnkit_macros::function_source;
///
/// struct Weather;
///
/// #[function_source(name = "weather")]
/// impl Weather {
///     /// Current temperature for a city
///     #[function(name = "get_temperature")]
///     async fn temperature(
///         &self,
///         #[param(description = "City name")] city: String,
///         unit: Option<String>,
///     ) -> anyhow::Result<f64> {
///         Ok(21.5)
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn function_source(args: TokenStream, input: TokenStream) -> TokenStream {
    let attrs = match parse_name_values(args.into()) {
        Ok(attrs) => attrs,
        Err(e) => return e.to_compile_error().into(),
    };
    let mut item_impl = parse_macro_input!(input as ItemImpl);

    match expand(&attrs, &mut item_impl) {
        Ok(output) => output.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

/// `name = "..."` pairs of an attribute
#[derive(Default)]
struct NameValues {
    name: Option<String>,
    description: Option<String>,
}

fn parse_name_values(tokens: TokenStream2) -> syn::Result<NameValues> {
    let mut attrs = NameValues::default();
    if tokens.is_empty() {
        return Ok(attrs);
    }

    let metas = syn::parse::Parser::parse2(
        Punctuated::<Meta, Token![,]>::parse_terminated,
        tokens,
    )?;

    for meta in metas {
        let Meta::NameValue(nv) = &meta else {
            return Err(syn::Error::new_spanned(meta, "expected `key = \"value\"`"));
        };
        let value = match &nv.value {
            Expr::Lit(expr_lit) => match &expr_lit.lit {
                Lit::Str(s) => s.value(),
                other => return Err(syn::Error::new_spanned(other, "expected a string literal")),
            },
            other => return Err(syn::Error::new_spanned(other, "expected a string literal")),
        };

        if nv.path.is_ident("name") {
            attrs.name = Some(value);
        } else if nv.path.is_ident("description") {
            attrs.description = Some(value);
        } else {
            return Err(syn::Error::new_spanned(
                &nv.path,
                "unknown key, expected `name` or `description`",
            ));
        }
    }

    Ok(attrs)
}

/// Parses and removes the attribute `ident` from `attrs`
fn take_attribute(attrs: &mut Vec<Attribute>, ident: &str) -> syn::Result<Option<NameValues>> {
    let Some(index) = attrs.iter().position(|attr| attr.path().is_ident(ident)) else {
        return Ok(None);
    };
    let attr = attrs.remove(index);

    match attr.meta {
        Meta::Path(_) => Ok(Some(NameValues::default())),
        Meta::List(list) => parse_name_values(list.tokens).map(Some),
        Meta::NameValue(nv) => Err(syn::Error::new_spanned(
            nv,
            format!("expected `#[{}]` or `#[{}(...)]`", ident, ident),
        )),
    }
}

fn doc_comment(attrs: &[Attribute]) -> String {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(expr_lit) => match &expr_lit.lit {
                    Lit::Str(s) => Some(s.value().trim().to_string()),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

enum Receiver {
    None,
    Ref,
    Arc,
}

struct ExposedParam {
    ident: syn::Ident,
    name: String,
    description: Option<String>,
    ty: Type,
}

struct ExposedFn {
    ident: syn::Ident,
    name: Option<String>,
    description: String,
    receiver: Receiver,
    is_async: bool,
    params: Vec<ExposedParam>,
    output: Output,
}

enum Output {
    Value,
    Fallible,
    FallibleInvoke,
}

fn expand(attrs: &NameValues, item_impl: &mut ItemImpl) -> syn::Result<TokenStream2> {
    let mut exposed = Vec::new();
    let mut errors = Vec::new();

    for item in &mut item_impl.items {
        let ImplItem::Fn(method) = item else {
            continue;
        };
        match exposed_fn(method) {
            Ok(Some(function)) => exposed.push(function),
            Ok(None) => {}
            Err(e) => errors.push(e),
        }
    }

    if let Some(combined) = errors.into_iter().reduce(|mut combined, e| {
        combined.combine(e);
        combined
    }) {
        return Err(combined);
    }

    let self_ty = &item_impl.self_ty;
    let (impl_generics, _, where_clause) = item_impl.generics.split_for_impl();

    let source_name = attrs.name.as_ref().map(|name| {
        quote! {
            fn source_name(&self) -> ::std::string::String {
                ::std::string::String::from(#name)
            }
        }
    });
    let members = exposed.iter().map(member_tokens);

    Ok(quote! {
        #item_impl

        impl #impl_generics ::fnkit_core::CandidateSource for #self_ty #where_clause {
            #source_name

            fn exposed_members(
                self: ::std::sync::Arc<Self>,
            ) -> ::std::vec::Vec<::fnkit_core::MemberSignature> {
                ::std::vec![#(#members),*]
            }
        }
    })
}

/// Reads a `#[function]` method, stripping fnkit attributes from it
fn exposed_fn(method: &mut ImplItemFn) -> syn::Result<Option<ExposedFn>> {
    let Some(function) = take_attribute(&mut method.attrs, "function")? else {
        for input in &mut method.sig.inputs {
            if let FnArg::Typed(typed) = input {
                take_attribute(&mut typed.attrs, "param")?;
            }
        }
        return Ok(None);
    };

    let mut params = Vec::new();
    let mut receiver = Receiver::None;
    for input in &mut method.sig.inputs {
        match input {
            FnArg::Receiver(recv) => {
                receiver = if recv.colon_token.is_some() {
                    if !is_arc_self(&recv.ty) {
                        return Err(syn::Error::new_spanned(
                            recv,
                            "exposed functions take `&self`, `self: Arc<Self>` or no receiver",
                        ));
                    }
                    Receiver::Arc
                } else if recv.reference.is_some() && recv.mutability.is_none() {
                    Receiver::Ref
                } else {
                    return Err(syn::Error::new_spanned(
                        recv,
                        "exposed functions take `&self`, `self: Arc<Self>` or no receiver",
                    ));
                };
            }
            FnArg::Typed(typed) => {
                let param = take_attribute(&mut typed.attrs, "param")?.unwrap_or_default();
                let Pat::Ident(pat) = typed.pat.as_ref() else {
                    return Err(syn::Error::new_spanned(
                        &typed.pat,
                        "exposed function parameters must be plain identifiers",
                    ));
                };
                if matches!(typed.ty.as_ref(), Type::Reference(_)) {
                    return Err(syn::Error::new_spanned(
                        &typed.ty,
                        "exposed function parameters must be owned types",
                    ));
                }
                params.push(ExposedParam {
                    ident: format_ident!("__fnkit_{}", pat.ident),
                    name: param.name.unwrap_or_else(|| pat.ident.unraw().to_string()),
                    description: param.description,
                    ty: (*typed.ty).clone(),
                });
            }
        }
    }

    if !method.sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &method.sig.generics,
            "exposed functions cannot be generic",
        ));
    }

    Ok(Some(ExposedFn {
        ident: method.sig.ident.clone(),
        name: function.name,
        description: function
            .description
            .unwrap_or_else(|| doc_comment(&method.attrs)),
        receiver,
        is_async: method.sig.asyncness.is_some(),
        params,
        output: output_kind(&method.sig.output),
    }))
}

fn is_arc_self(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    path.path
        .segments
        .last()
        .is_some_and(|segment| segment.ident == "Arc")
}

fn output_kind(output: &ReturnType) -> Output {
    let ReturnType::Type(_, ty) = output else {
        return Output::Value;
    };
    let Type::Path(path) = ty.as_ref() else {
        return Output::Value;
    };
    let Some(last) = path.path.segments.last() else {
        return Output::Value;
    };
    if last.ident != "Result" {
        return Output::Value;
    }

    let invoke_error = match &last.arguments {
        PathArguments::AngleBracketed(args) => args.args.iter().nth(1).is_some_and(|arg| {
            matches!(
                arg,
                GenericArgument::Type(Type::Path(error))
                    if error.path.segments.last().is_some_and(|s| s.ident == "InvokeError")
            )
        }),
        _ => false,
    };

    if invoke_error {
        Output::FallibleInvoke
    } else {
        Output::Fallible
    }
}

fn member_tokens(function: &ExposedFn) -> TokenStream2 {
    let method = &function.ident;
    let ident = method.unraw().to_string();
    let description = &function.description;

    let signatures = function.params.iter().map(|param| {
        let ty = &param.ty;
        let name = &param.name;
        let description = param
            .description
            .as_ref()
            .map(|description| quote! { .with_description(#description) });
        quote! { ::fnkit_core::ParamSignature::of::<#ty>(#name) #description }
    });

    let decodes = function.params.iter().map(|param| {
        let ident = &param.ident;
        let ty = &param.ty;
        quote! { let #ident: #ty = args.next()?; }
    });

    let arg_idents: Vec<_> = function.params.iter().map(|param| &param.ident).collect();
    let call = match function.receiver {
        Receiver::None => quote! { <Self>::#method(#(#arg_idents),*) },
        Receiver::Ref => quote! { this.#method(#(#arg_idents),*) },
        Receiver::Arc => quote! { ::std::sync::Arc::clone(&this).#method(#(#arg_idents),*) },
    };
    let call = if function.is_async {
        quote! { #call.await }
    } else {
        call
    };
    let unwrap = match function.output {
        Output::Value => quote! {},
        Output::Fallible => quote! {
            let ret = ret.map_err(::fnkit_core::InvokeError::execution)?;
        },
        Output::FallibleInvoke => quote! { let ret = ret?; },
    };

    let args_binding = if function.params.is_empty() {
        quote! { _args }
    } else {
        quote! { mut args }
    };
    let (capture, rebind) = match function.receiver {
        Receiver::None => (quote! {}, quote! {}),
        _ => (
            quote! { let this = ::std::sync::Arc::clone(&self); },
            quote! { let this = ::std::sync::Arc::clone(&this); },
        ),
    };
    let rename = function
        .name
        .as_ref()
        .map(|name| quote! { .with_name(#name) });

    quote! {
        {
            #capture
            ::fnkit_core::MemberSignature::new(
                #ident,
                #description,
                ::std::vec![#(#signatures),*],
                ::fnkit_core::handler_fn(move |#args_binding: ::fnkit_core::Arguments| {
                    #rebind
                    async move {
                        #(#decodes)*
                        let ret = #call;
                        #unwrap
                        ::fnkit_core::to_json_value(&ret)
                    }
                }),
            )
            #rename
        }
    }
}

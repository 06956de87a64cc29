//! # Accessor Derive
//!
//! Derive macro generating `const` getters and builder-style setters for
//! plain configuration structs.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, LitBool, parse_macro_input, spanned::Spanned};

/// Derive to generate, for each **named** field of type `Ty`:
///
/// - `const .<field>(&self) -> Ty` (the field type must be `Copy`)
/// - `const .with_<field>(mut self, value: Ty) -> Self`
///
/// Field options:
/// - `#[accessors(skip)]`: generate nothing for this field
/// - `#[accessors(getter = false)]`: only generate `with_<field>`
///
/// # Example
///
/// ```
/// use utils_accessors_derive::Accessors;
///
/// #[derive(Accessors)]
/// struct Config {
///     base: u32,
///     #[accessors(getter = false)]
///     name: &'static str,
///     #[accessors(skip)]
///     _reserved: u8,
/// }
///
/// const CFG: Config = Config { base: 1, name: "a", _reserved: 0 }.with_base(42);
/// assert_eq!(CFG.base(), 42);
/// assert_eq!(CFG.with_name("b").name, "b");
/// ```
#[proc_macro_derive(Accessors, attributes(accessors))]
pub fn derive_accessors(input: TokenStream) -> TokenStream {
    let DeriveInput {
        ident,
        generics,
        data,
        ..
    } = parse_macro_input!(input as DeriveInput);

    let fields = match data {
        Data::Struct(s) => match s.fields {
            Fields::Named(n) => n.named,
            Fields::Unnamed(u) => {
                return syn::Error::new(u.span(), "Accessors only supports named fields")
                    .to_compile_error()
                    .into();
            }
            Fields::Unit => {
                return syn::Error::new(ident.span(), "Accessors does not apply to unit structs")
                    .to_compile_error()
                    .into();
            }
        },
        _ => {
            return syn::Error::new(ident.span(), "Accessors can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let mut methods = Vec::new();

    for field in fields {
        let Some(fname) = &field.ident else { continue };
        let options = match FieldOptions::parse(&field.attrs) {
            Ok(o) => o,
            Err(e) => return e.to_compile_error().into(),
        };
        if options.skip {
            continue;
        }

        let ty = &field.ty;
        let with_name = format_ident!("with_{}", fname);

        if options.getter {
            methods.push(quote! {
                #[inline]
                #[must_use]
                pub const fn #fname(&self) -> #ty {
                    self.#fname
                }
            });
        }

        methods.push(quote! {
            #[inline]
            #[must_use]
            pub const fn #with_name(mut self, value: #ty) -> Self {
                self.#fname = value;
                self
            }
        });
    }

    let expanded = quote! {
        impl #impl_generics #ident #ty_generics #where_clause {
            #(#methods)*
        }
    };

    TokenStream::from(expanded)
}

struct FieldOptions {
    skip: bool,
    getter: bool,
}

impl FieldOptions {
    fn parse(attrs: &[syn::Attribute]) -> syn::Result<Self> {
        let mut options = Self {
            skip: false,
            getter: true,
        };

        for attr in attrs {
            if !attr.path().is_ident("accessors") {
                continue;
            }

            // #[accessors(skip)], #[accessors(skip = true)], #[accessors(getter = false)]
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    options.skip = if meta.input.is_empty() {
                        true
                    } else {
                        meta.value()?.parse::<LitBool>()?.value
                    };
                    Ok(())
                } else if meta.path.is_ident("getter") {
                    options.getter = meta.value()?.parse::<LitBool>()?.value;
                    Ok(())
                } else {
                    Err(meta.error("unknown accessors option"))
                }
            })?;
        }

        Ok(options)
    }
}

use fxhash::FxHashMap;
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr};

/// The key and alias portion of a field tag, checked at expansion time.
#[derive(Debug, PartialEq, Eq)]
struct TagNames {
    key: String,
    short: Option<String>,
}

struct TaggedField<'a> {
    field: &'a syn::Field,
    tag: LitStr,
}

pub fn expand_derive(input: DeriveInput) -> TokenStream {
    match expand(&input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = tagged_fields(input)?;
    check_unique_names(&fields)?;

    let specs = fields.iter().map(|TaggedField { field, tag }| {
        let ident = field.ident.as_ref().map(ToString::to_string).unwrap_or_default();
        let ty = &field.ty;
        quote! {
            ::layerconf::FieldSpec {
                name: #ident,
                tag: #tag,
                kind: <#ty as ::layerconf::ConfigField>::KIND,
            }
        }
    });

    let arms = fields.iter().enumerate().map(|(index, TaggedField { field, .. })| {
        let ident = &field.ident;
        let ty = &field.ty;
        quote! {
            #index => {
                self.#ident = <#ty as ::layerconf::ConfigField>::from_value(value)?;
                ::core::result::Result::Ok(())
            }
        }
    });

    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics ::layerconf::Configurable for #name #ty_generics #where_clause {
            const FIELDS: &'static [::layerconf::FieldSpec] = &[#(#specs),*];

            fn assign(
                &mut self,
                index: usize,
                value: ::layerconf::Value,
            ) -> ::core::result::Result<(), ::layerconf::Value> {
                match index {
                    #(#arms)*
                    _ => ::core::result::Result::Err(value),
                }
            }
        }
    })
}

fn tagged_fields(input: &DeriveInput) -> syn::Result<Vec<TaggedField<'_>>> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(&input.ident, "Config can only be derived for structs"));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Config can only be derived for structs with named fields",
        ));
    };

    let mut tagged = Vec::new();
    for field in &named.named {
        let mut attrs = field.attrs.iter().filter(|attr| attr.path().is_ident("config"));
        let Some(attr) = attrs.next() else { continue };
        if let Some(extra) = attrs.next() {
            return Err(syn::Error::new_spanned(extra, "duplicate #[config(...)] attribute"));
        }

        let tag: LitStr = attr.parse_args().map_err(|err| {
            syn::Error::new(err.span(), "expected a tag string, e.g. #[config(\"key,short=k\")]")
        })?;
        if tag.value().trim() == "-" {
            continue;
        }
        tag_names(&tag.value()).map_err(|message| syn::Error::new(tag.span(), message))?;
        tagged.push(TaggedField { field, tag });
    }

    Ok(tagged)
}

fn check_unique_names(fields: &[TaggedField<'_>]) -> syn::Result<()> {
    let mut seen: FxHashMap<String, Span> = FxHashMap::default();

    for TaggedField { tag, .. } in fields {
        let names = tag_names(&tag.value()).map_err(|message| syn::Error::new(tag.span(), message))?;
        for name in std::iter::once(names.key).chain(names.short) {
            if seen.insert(name.clone(), tag.span()).is_some() {
                return Err(syn::Error::new(
                    tag.span(),
                    format!("`{name}` is already used as a key or alias by another field"),
                ));
            }
        }
    }

    Ok(())
}

fn tag_names(tag: &str) -> Result<TagNames, String> {
    let mut parts = tag.split(',').map(str::trim);
    let key = parts.next().unwrap_or_default();
    if key.is_empty() {
        return Err("config tag must start with a non-empty key".to_owned());
    }

    let mut short = None;
    for part in parts {
        if let Some(alias) = part.strip_prefix("short=") {
            if alias.is_empty() {
                return Err("`short=` requires an alias".to_owned());
            }
            short = Some(alias.to_owned());
        }
    }

    Ok(TagNames { key: key.to_owned(), short })
}

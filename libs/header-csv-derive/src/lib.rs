use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, parse_quote, Data, DeriveInput, Fields, GenericParam, Generics, LitStr,
};

/// Derives `header_csv::Record` for a struct with named fields.
///
/// Each field maps to one column, named by its `#[csv("...")]` declaration
/// or, without one, by the field name itself.
///
/// ```ignore
/// #[derive(Record, Default)]
/// pub struct Line {
///     #[csv("name")]
///     pub name: String,
///
///     #[csv("count,omitempty")]
///     pub count: u32,
///
///     #[csv("-")]
///     pub scratch: String,
/// }
/// ```
///
/// Every non-skipped field must implement `header_csv::Cell`.
#[proc_macro_derive(Record, attributes(csv))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match record_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

/// Derives `header_csv::Cell` on top of a `header_csv::TextCodec` impl.
#[proc_macro_derive(TextCell)]
pub fn derive_text_cell(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    quote! {
        impl #impl_generics ::header_csv::Cell for #name #ty_generics #where_clause {
            fn decode_cell(
                &mut self,
                cell: &str,
                _payload: &dyn ::header_csv::PayloadCodec,
            ) -> ::core::result::Result<(), ::header_csv::CellError> {
                ::header_csv::TextCodec::decode_text(self, cell)
                    .map_err(::header_csv::CellError::Text)
            }

            fn encode_cell(
                &self,
                _payload: &dyn ::header_csv::PayloadCodec,
            ) -> ::core::result::Result<::std::string::String, ::header_csv::CellError> {
                ::header_csv::TextCodec::encode_text(self).map_err(::header_csv::CellError::Text)
            }

            fn is_empty_value(&self) -> bool {
                ::header_csv::TextCodec::is_zero(self)
            }
        }
    }
    .into()
}

/// Derives `header_csv::Cell` for a serde type stored as one payload cell.
#[proc_macro_derive(PayloadCell)]
pub fn derive_payload_cell(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    quote! {
        impl #impl_generics ::header_csv::Cell for #name #ty_generics #where_clause {
            fn decode_cell(
                &mut self,
                cell: &str,
                payload: &dyn ::header_csv::PayloadCodec,
            ) -> ::core::result::Result<(), ::header_csv::CellError> {
                *self = ::header_csv::payload::decode_value(payload, cell)?;
                ::core::result::Result::Ok(())
            }

            fn encode_cell(
                &self,
                payload: &dyn ::header_csv::PayloadCodec,
            ) -> ::core::result::Result<::std::string::String, ::header_csv::CellError> {
                ::header_csv::payload::encode_value(payload, self)
            }

            fn is_empty_value(&self) -> bool {
                false
            }
        }
    }
    .into()
}

// ═══════════════════════════════════════════════════════════════
//  Record
// ═══════════════════════════════════════════════════════════════

/// Raw `#[csv("...")]` declaration of one field; empty when absent.
fn field_tag(field: &syn::Field) -> Result<String, syn::Error> {
    let mut tag: Option<LitStr> = None;
    for attr in &field.attrs {
        if !attr.path().is_ident("csv") {
            continue;
        }
        if tag.is_some() {
            return Err(syn::Error::new_spanned(attr, "duplicate #[csv(...)] attribute"));
        }
        tag = Some(attr.parse_args()?);
    }
    Ok(tag.map(|lit| lit.value()).unwrap_or_default())
}

fn with_cell_bounds(mut generics: Generics) -> Generics {
    for param in &mut generics.params {
        if let GenericParam::Type(ty) = param {
            ty.bounds.push(parse_quote!(::header_csv::Cell));
            ty.bounds.push(parse_quote!('static));
        }
    }
    generics
}

fn record_impl(input: &DeriveInput) -> Result<TokenStream2, syn::Error> {
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Record only supports structs with named fields",
                ))
            }
        },
        _ => return Err(syn::Error::new_spanned(name, "Record only supports structs")),
    };

    let mut decls = Vec::new();
    let mut decode_arms = Vec::new();
    let mut field_arms = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected named field"))?;
        let field_name_str = field_name.to_string();
        let field_name_str = field_name_str.strip_prefix("r#").unwrap_or(&field_name_str);
        let tag = field_tag(field)?;

        decls.push(quote! {
            ::header_csv::FieldDecl { name: #field_name_str, tag: #tag }
        });
        if tag == "-" {
            continue;
        }
        decode_arms.push(quote! {
            ::core::option::Option::Some(#index) => {
                ::header_csv::Cell::decode_cell(&mut self.#field_name, cell, payload)
            }
        });
        field_arms.push(quote! {
            #index => ::core::option::Option::Some(
                ::header_csv::FieldRef::new(&self.#field_name, ::core::option::Option::Some(meta)),
            ),
        });
    }

    let generics = with_cell_bounds(input.generics.clone());
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::header_csv::Record for #name #ty_generics #where_clause {
            fn describe(_cache: &::header_csv::ShapeCache) -> ::header_csv::Shape {
                ::header_csv::Shape::aggregate(&[#(#decls),*])
            }

            fn decode_field(
                &mut self,
                shape: &::header_csv::Shape,
                _index: usize,
                name: &str,
                cell: &str,
                payload: &dyn ::header_csv::PayloadCodec,
            ) -> ::core::result::Result<(), ::header_csv::CellError> {
                match shape.field_meta(name).map(|meta| meta.index) {
                    #(#decode_arms)*
                    _ => ::core::result::Result::Ok(()),
                }
            }

            fn field<'a>(
                &'a self,
                shape: &'a ::header_csv::Shape,
                _index: usize,
                name: &str,
            ) -> ::core::option::Option<::header_csv::FieldRef<'a>> {
                let meta = shape.field_meta(name)?;
                match meta.index {
                    #(#field_arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    })
}

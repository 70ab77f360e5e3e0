use darling::FromDeriveInput as _;
use darling::ast::Style;
use proc_macro2::TokenStream;
use quote::{ToTokens as _, format_ident};
use syn::{Generics, Index, Member, Path};

use crate::args::{Capability, FieldArgs, TypeArgs};

pub fn entry_point_decode(input: &syn::DeriveInput) -> darling::Result<TokenStream> {
    let args = TypeArgs::from_derive_input(input)?;
    let crate_ = &args.crate_;
    let ty_name = &args.ident;

    let generics = with_bound(&args.generics, &syn::parse_quote!(#crate_::Decode));
    let (impl_gen, ty_gen, where_clause) = generics.split_for_impl();

    let capabilities = args.capabilities();
    let body = if capabilities.is_empty() {
        let zero = emit_zero(&args);
        let structure = emit_structure(&args);
        quote::quote! {
            fn zero() -> Self {
                #zero
            }

            fn structure(builder: &mut #crate_::Builder<'_>) -> #crate_::Result<#crate_::Plan<Self>> {
                #structure
            }
        }
    } else {
        let with = capabilities.iter().map(|cap| match cap {
            Capability::Native => format_ident!("with_native"),
            Capability::Binary => format_ident!("with_binary"),
            Capability::Record => format_ident!("with_record"),
        });

        quote::quote! {
            fn zero() -> Self {
                ::std::default::Default::default()
            }

            fn overrides() -> #crate_::overrides::Overrides<Self> {
                #crate_::overrides::Overrides::none() #( .#with() )*
            }

            fn structure(builder: &mut #crate_::Builder<'_>) -> #crate_::Result<#crate_::Plan<Self>> {
                builder.unsupported("type with its own wire format")
            }
        }
    };

    Ok(quote::quote! {
        #[automatically_derived]
        impl #impl_gen #crate_::Decode for #ty_name #ty_gen #where_clause {
            #body
        }
    })
}

pub fn entry_point_encode(input: &syn::DeriveInput) -> darling::Result<TokenStream> {
    let args = TypeArgs::from_derive_input(input)?;
    let crate_ = &args.crate_;
    let ty_name = &args.ident;

    let generics = with_bound(&args.generics, &syn::parse_quote!(#crate_::Encode));
    let (impl_gen, ty_gen, where_clause) = generics.split_for_impl();

    let mut writer = format_ident!("writer");
    let body = match args.capabilities().first() {
        Some(cap) => {
            let write = match cap {
                Capability::Native => format_ident!("write_native"),
                Capability::Binary => format_ident!("write_binary"),
                Capability::Record => format_ident!("write_record"),
            };

            quote::quote! {
                writer.#write(self)
            }
        },
        None => {
            let members = encoded_members(args.fields());
            if members.is_empty() {
                writer = format_ident!("_writer");
            }

            quote::quote! {
                #( #crate_::Encode::encode(&self.#members, writer)?; )*
                ::std::result::Result::Ok(())
            }
        },
    };

    Ok(quote::quote! {
        #[automatically_derived]
        impl #impl_gen #crate_::Encode for #ty_name #ty_gen #where_clause {
            fn encode(&self, #writer: &mut #crate_::Writer<'_>) -> #crate_::Result<()> {
                #body
            }
        }
    })
}

/// Adds `bound` to every type parameter.
fn with_bound(generics: &Generics, bound: &Path) -> Generics {
    let mut generics = generics.clone();
    let params: Vec<_> = generics.type_params().map(|p| p.ident.clone()).collect();
    let where_clause = generics.make_where_clause();
    for param in params {
        where_clause.predicates.push(syn::parse_quote!(#param: #bound));
    }

    generics
}

fn member(index: usize, field: &FieldArgs) -> Member {
    match &field.ident {
        Some(ident) => Member::Named(ident.clone()),
        None => Member::Unnamed(Index::from(index)),
    }
}

fn encoded_members(fields: &[FieldArgs]) -> Vec<Member> {
    fields
        .iter()
        .enumerate()
        .filter(|(_, field)| !field.skip.is_present())
        .map(|(index, field)| member(index, field))
        .collect()
}

fn emit_zero(args: &TypeArgs) -> TokenStream {
    let crate_ = &args.crate_;
    let values = args.fields().iter().map(|field| {
        if field.skip.is_present() {
            quote::quote! { ::std::default::Default::default() }
        } else {
            let ty = &field.ty;
            quote::quote! { <#ty as #crate_::Decode>::zero() }
        }
    });

    match args.style() {
        Style::Unit => quote::quote! { Self },
        Style::Tuple => quote::quote! { Self( #( #values, )* ) },
        Style::Struct => {
            let names = args.fields().iter().map(|field| &field.ident);
            quote::quote! { Self { #( #names: #values, )* } }
        },
    }
}

fn emit_structure(args: &TypeArgs) -> TokenStream {
    let fields = args
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, field)| !field.skip.is_present())
        .map(|(index, field)| {
            let ty = &field.ty;
            let member = member(index, field).into_token_stream();
            quote::quote! {
                .field::<#ty>(|value| &mut value.#member)?
            }
        });

    quote::quote! {
        builder
            .aggregate::<Self>()
            #( #fields )*
            .finish()
    }
}

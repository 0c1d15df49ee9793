mod field;
mod helpers;

use darling::{FromDeriveInput, ast::Data, util::Flag};
use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{DeriveInput, Generics, Ident, parse_macro_input};

use crate::field::BindFieldReceiver;

#[proc_macro_derive(Bind, attributes(bind))]
pub fn derive_bind(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match impl_derive(input) {
        Ok(output) => output.into(),
        Err(err) => err.write_errors().into(),
    }
}

fn impl_derive(input: DeriveInput) -> darling::Result<TokenStream> {
    let bind_struct = BindReceiver::from_derive_input(&input)?;

    bind_struct.validate()?;

    Ok(bind_struct.to_token_stream())
}

#[derive(FromDeriveInput)]
#[darling(attributes(bind), supports(struct_named))]
struct BindReceiver {
    ident: Ident,
    generics: Generics,
    data: Data<(), BindFieldReceiver>,
    /// `#[bind(opt_in)]`: only fields marked `include` are bound.
    opt_in: Flag,
    /// `#[bind(default)]`: construct with `Default::default()` and assign
    /// every field afterwards.
    default: Flag,
}

impl ToTokens for BindReceiver {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let private_path = quote!(__envbind::__private);
        let struct_name = &self.ident;

        let discovery = if self.opt_in.is_present() {
            quote!(#private_path::Discovery::OptIn)
        } else {
            quote!(#private_path::Discovery::OptOut)
        };
        let constructor = self.constructor(&private_path);
        let members = self.fields().iter().map(|field| field.member(&private_path));

        let derive = quote! {
            const _: () = {
                extern crate envbind as __envbind;

                impl #private_path::Bindable for #struct_name {
                    fn schema() -> #private_path::TypeSchema {
                        #private_path::TypeSchema::builder::<Self>()
                            .discovery(#discovery)
                            .constructor(#constructor)
                            #(.member(#members))*
                            .build()
                    }
                }
            };
        };

        tokens.extend(derive);
    }
}

impl BindReceiver {
    fn validate(&self) -> darling::Result<()> {
        let mut accumulator = darling::Error::accumulator();

        if !self.generics.params.is_empty() {
            accumulator.push(
                darling::Error::custom("Bind derive does not support generic structs")
                    .with_span(&self.ident),
            );
        }

        for field in self.fields() {
            field.validate(&mut accumulator, !self.default.is_present());
        }

        accumulator.finish()
    }

    /// Whether `field` is filled from a constructor argument rather than
    /// `Default::default()` when the struct literal is the constructor.
    fn is_param(&self, field: &BindFieldReceiver) -> bool {
        if self.opt_in.is_present() {
            field.include.is_present()
        } else {
            !field.skip.is_present()
        }
    }

    fn constructor(&self, private_path: &TokenStream) -> TokenStream {
        if self.default.is_present() {
            return quote! {
                #private_path::ConstructorDescriptor::parameterless(
                    <Self as ::core::default::Default>::default,
                )
            };
        }

        let mut descriptors = Vec::new();
        let mut inits = Vec::new();
        for field in self.fields() {
            if self.is_param(field) {
                inits.push(field.argument(descriptors.len()));
                descriptors.push(field.param(private_path));
            } else {
                let ident = field.ident();
                inits.push(quote!(#ident: ::core::default::Default::default()));
            }
        }

        // A constructor whose fields all come from `Default` never reads `args`.
        let args = if descriptors.is_empty() {
            quote!(_args)
        } else {
            quote!(args)
        };

        quote! {
            #private_path::ConstructorDescriptor::new(
                ::std::vec![#(#descriptors),*],
                |#args: &mut #private_path::Arguments| {
                    ::core::result::Result::Ok(Self {
                        #(#inits,)*
                    })
                },
            )
        }
    }

    fn fields(&self) -> &[BindFieldReceiver] {
        let Data::Struct(fields) = &self.data else {
            panic!("we've asserted that it's a struct");
        };

        &fields.fields
    }
}

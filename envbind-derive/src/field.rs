use darling::{
    FromField,
    util::{Flag, Override},
};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{ExprPath, Ident, LitStr, Type, ext::IdentExt};

use crate::helpers::parse_option;

#[derive(FromField)]
#[darling(attributes(bind))]
pub struct BindFieldReceiver {
    pub ident: Option<Ident>,
    pub ty: Type,
    /// `#[bind(skip)]`
    pub skip: Flag,
    /// `#[bind(include)]`
    pub include: Flag,
    /// `#[bind(required)]`
    pub required: Flag,
    /// `#[bind(with = path::to::parser)]`
    pub with: Option<ExprPath>,
    /// `#[bind(rename = "Name")]`
    pub rename: Option<LitStr>,
    /// `#[bind(default)]` or `#[bind(default = "raw")]`
    pub default: Option<Override<LitStr>>,
}

impl BindFieldReceiver {
    pub fn validate(&self, accumulator: &mut darling::error::Accumulator, literal_ctor: bool) {
        let ident = self.ident.as_ref();
        let mut error = |msg: &str| {
            let err = darling::Error::custom(msg);
            accumulator.push(match ident {
                Some(ident) => err.with_span(ident),
                None => err,
            });
        };

        if self.skip.is_present() && self.include.is_present() {
            error("`skip` and `include` are mutually exclusive");
        }
        if self.skip.is_present()
            && (self.required.is_present() || self.with.is_some() || self.default.is_some())
        {
            error("skipped fields can't have other `bind` attributes");
        }
        if self.option().is_some() && self.default.is_some() {
            error("Optional fields cannot have a default");
        }
        if !literal_ctor && self.default.is_some() {
            error("field defaults are not used with `#[bind(default)]`, set them in `Default`");
        }
    }

    pub fn ident(&self) -> &Ident {
        self.ident
            .as_ref()
            .expect("darling only accepts structs with named fields")
    }

    /// The name keys are derived from.
    pub fn name(&self) -> String {
        self.rename
            .as_ref()
            .map(LitStr::value)
            .unwrap_or_else(|| self.ident().unraw().to_string())
    }

    pub fn option(&self) -> Option<&Type> {
        parse_option(&self.ty)
    }

    /// The type values are parsed into.
    pub fn value_ty(&self) -> &Type {
        self.option().unwrap_or(&self.ty)
    }

    pub fn parser(&self, private_path: &TokenStream) -> Option<TokenStream> {
        let value_ty = self.value_ty();

        self.with.as_ref().map(|with| {
            let with = match with.path.get_ident().map(Ident::to_string).as_deref() {
                Some("from_str") => quote!(#private_path::from_str),
                Some("into") => quote!(#private_path::into),
                _ => quote!(#with),
            };
            quote!(#private_path::FnParser::<#value_ty>::shared(#with))
        })
    }

    pub fn member(&self, private_path: &TokenStream) -> TokenStream {
        let ident = self.ident();
        let name = self.name();
        let value_ty = self.value_ty();

        let mut member = if self.option().is_some() {
            quote! {
                #private_path::MemberDescriptor::nullable_field::<Self, #value_ty, _, _>(
                    #name,
                    |target: &Self| &target.#ident,
                    |target: &mut Self, value| target.#ident = value,
                )
            }
        } else {
            quote! {
                #private_path::MemberDescriptor::field::<Self, #value_ty, _, _>(
                    #name,
                    |target: &Self| &target.#ident,
                    |target: &mut Self, value| target.#ident = value,
                )
            }
        };

        if self.required.is_present() {
            member.extend(quote!(.required()));
        }
        if self.include.is_present() {
            member.extend(quote!(.include()));
        }
        if self.skip.is_present() {
            member.extend(quote!(.skip()));
        }
        if let Some(parser) = self.parser(private_path) {
            member.extend(quote!(.with_parser(#parser)));
        }

        member
    }

    pub fn param(&self, private_path: &TokenStream) -> TokenStream {
        let name = self.name();
        let value_ty = self.value_ty();

        let mut param = if self.option().is_some() {
            quote!(#private_path::ParamDescriptor::nullable::<#value_ty>(#name))
        } else {
            quote!(#private_path::ParamDescriptor::new::<#value_ty>(#name))
        };

        match &self.default {
            Some(Override::Explicit(raw)) => param.extend(quote!(.default_raw(#raw))),
            Some(Override::Inherit) => param.extend(quote! {
                .default_with(<#value_ty as ::core::default::Default>::default)
            }),
            None => {}
        }
        if self.required.is_present() {
            param.extend(quote!(.required()));
        }
        if let Some(parser) = self.parser(private_path) {
            param.extend(quote!(.with_parser(#parser)));
        }

        param
    }

    /// Initializer of the field inside the generated constructor.
    pub fn argument(&self, index: usize) -> TokenStream {
        let ident = self.ident();
        let value_ty = self.value_ty();

        if self.option().is_some() {
            quote!(#ident: args.take_nullable::<#value_ty>(#index)?)
        } else {
            quote!(#ident: args.take::<#value_ty>(#index)?)
        }
    }
}

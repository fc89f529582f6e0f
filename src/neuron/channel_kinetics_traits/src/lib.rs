use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Lit, Meta, NestedMeta};


fn display_name(field: &syn::Field) -> syn::Result<String> {
    let ident = field.ident.as_ref()
        .map(|i| i.to_string())
        .unwrap_or_default();

    for attr in field.attrs.iter().filter(|attr| attr.path.is_ident("kinetic")) {
        if let Meta::List(list) = attr.parse_meta()? {
            for nested in list.nested.iter() {
                if let NestedMeta::Meta(Meta::NameValue(name_value)) = nested {
                    if name_value.path.is_ident("name") {
                        if let Lit::Str(lit) = &name_value.lit {
                            return Ok(lit.value());
                        }
                    }
                }
            }
        }
    }

    Ok(ident)
}

/// Derive macro to implement `KineticParameters` for a struct of mutable kinetic
/// parameters, every named `f64` field is listed in declaration order, use
/// `#[kinetic(name = "Vhalfm")]` to report a field under a different name
#[proc_macro_derive(KineticParameters, attributes(kinetic))]
pub fn derive_kinetic_parameters(input: TokenStream) -> TokenStream {
    // Parse the input tokens into a syntax tree
    let input = parse_macro_input!(input as DeriveInput);

    // Get the name of the struct we are deriving the trait for
    let name = input.ident;

    let fields: Vec<syn::Field> = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(named) => named.named.into_iter().collect(),
            Fields::Unit => vec![],
            Fields::Unnamed(unnamed) => {
                return syn::Error::new_spanned(
                    unnamed, "KineticParameters requires named fields"
                ).to_compile_error().into();
            }
        },
        _ => {
            return syn::Error::new_spanned(
                name, "KineticParameters can only be derived for structs"
            ).to_compile_error().into();
        }
    };

    let mut idents = vec![];
    let mut names = vec![];
    for field in fields.iter() {
        match display_name(field) {
            Ok(display) => names.push(display),
            Err(err) => return err.to_compile_error().into(),
        }
        idents.push(field.ident.clone());
    }

    // Generate the implementation of the trait
    let expanded = quote! {
        impl KineticParameters for #name {
            fn parameters(&self) -> Vec<(&'static str, f64)> {
                vec![#((#names, self.#idents as f64)),*]
            }
        }
    };

    TokenStream::from(expanded)
}

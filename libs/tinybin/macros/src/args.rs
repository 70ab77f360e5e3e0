use darling::ast::{Data, Style};
use darling::util::{Flag, Ignored};
use syn::{Generics, Ident, Path, Type};

#[derive(Debug, darling::FromDeriveInput)]
#[darling(attributes(tinybin), supports(struct_any))]
pub struct TypeArgs {
    pub ident: Ident,
    pub generics: Generics,
    pub data: Data<Ignored, FieldArgs>,
    #[darling(rename = "crate", default = "default_crate")]
    pub crate_: Path,
    pub record: Flag,
    pub binary: Flag,
    pub native: Flag,
}

#[derive(Debug, darling::FromField)]
#[darling(attributes(tinybin))]
pub struct FieldArgs {
    pub ident: Option<Ident>,
    pub ty: Type,
    pub skip: Flag,
}

fn default_crate() -> Path {
    syn::parse_quote!(::tinybin)
}

/// The capability a type's own wire format is provided through.
#[derive(Debug, Clone, Copy)]
pub enum Capability {
    Native,
    Binary,
    Record,
}

impl TypeArgs {
    /// All requested capabilities, highest priority first.
    pub fn capabilities(&self) -> Vec<Capability> {
        [
            (self.native, Capability::Native),
            (self.binary, Capability::Binary),
            (self.record, Capability::Record),
        ]
        .into_iter()
        .filter(|(flag, _)| flag.is_present())
        .map(|(_, cap)| cap)
        .collect()
    }

    pub fn style(&self) -> Style {
        match &self.data {
            Data::Struct(fields) => fields.style,
            Data::Enum(_) => Style::Unit,
        }
    }

    pub fn fields(&self) -> &[FieldArgs] {
        match &self.data {
            Data::Struct(fields) => &fields.fields,
            Data::Enum(_) => &[],
        }
    }
}

//! Attribute parsing for `#[wren(...)]`.

use syn::{Attribute, LitStr, Path};

/// Parsed `#[wren(...)]` attributes on a type.
#[derive(Default)]
pub struct TypeAttrs {
    /// Script class name (default: Rust struct name)
    pub name: Option<String>,
    pub superclass: Option<String>,
    /// Function adding hand-written members after the fields
    pub extend: Option<Path>,
}

/// Parsed `#[wren(...)]` attributes on a field.
#[derive(Debug, Default)]
pub struct FieldAttrs {
    pub get: bool,
    pub set: bool,
    /// Script property name (default: field name)
    pub name: Option<String>,
}

fn unknown(meta: &syn::meta::ParseNestedMeta, what: &str) -> syn::Error {
    meta.error(format!(
        "unknown wren {}attribute: {}",
        what,
        meta.path
            .get_ident()
            .map(|i| i.to_string())
            .unwrap_or_default()
    ))
}

impl TypeAttrs {
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut result = Self::default();

        for attr in attrs {
            if !attr.path().is_ident("wren") {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    result.name = Some(value.value());
                } else if meta.path.is_ident("superclass") {
                    let value: LitStr = meta.value()?.parse()?;
                    result.superclass = Some(value.value());
                } else if meta.path.is_ident("extend") {
                    result.extend = Some(meta.value()?.parse()?);
                } else {
                    return Err(unknown(&meta, ""));
                }
                Ok(())
            })?;
        }

        Ok(result)
    }
}

impl FieldAttrs {
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut result = Self::default();

        for attr in attrs {
            if !attr.path().is_ident("wren") {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("get") {
                    result.get = true;
                } else if meta.path.is_ident("set") {
                    result.set = true;
                } else if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    result.name = Some(value.value());
                } else {
                    return Err(unknown(&meta, "field "));
                }
                Ok(())
            })?;
        }

        Ok(result)
    }
}

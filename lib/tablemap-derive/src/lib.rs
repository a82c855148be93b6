use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, Lit, parse_macro_input};

/// Convert snake_case to camelCase
fn to_camel_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut capitalize_next = false;

    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }

    result
}

/// Convert snake_case to PascalCase
fn to_pascal_case(s: &str) -> String {
    let camel = to_camel_case(s);
    let mut chars = camel.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => camel,
    }
}

/// Apply a serde `rename_all` rule to a snake_case field name
fn apply_rename_all(rule: Option<&str>, field_name: &str) -> String {
    match rule {
        Some("camelCase") => to_camel_case(field_name),
        Some("PascalCase") => to_pascal_case(field_name),
        Some("lowercase") => field_name.to_lowercase(),
        Some("UPPERCASE") => field_name.to_uppercase(),
        Some("SCREAMING_SNAKE_CASE") => field_name.to_uppercase(),
        Some("kebab-case") => field_name.replace('_', "-"),
        Some("SCREAMING-KEBAB-CASE") => field_name.replace('_', "-").to_uppercase(),
        _ => field_name.to_string(),
    }
}

/// Check if a field has a specific attribute
fn has_attr(field: &syn::Field, attr_name: &str) -> bool {
    field
        .attrs
        .iter()
        .any(|attr| attr.path().is_ident(attr_name))
}

/// Skip over an attribute argument we don't care about (`key`, `key = expr`, `key(...)`)
fn skip_meta_value(meta: &syn::meta::ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(syn::Token![=]) {
        let _: syn::Expr = meta.value()?.parse()?;
    } else if meta.input.peek(syn::token::Paren) {
        let _: proc_macro2::TokenTree = meta.input.parse()?;
    }
    Ok(())
}

/// Options collected from #[column(...)] on a field
#[derive(Default)]
struct ColumnAttr {
    name: Option<String>,
    kind: Option<String>,
    skip: bool,
    primary_key: bool,
}

/// Parse #[column(name = "...", kind = "...", skip, primary_key)]
fn parse_column_attr(field: &syn::Field) -> ColumnAttr {
    let mut parsed = ColumnAttr::default();

    for attr in &field.attrs {
        if attr.path().is_ident("column") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    parsed.skip = true;
                } else if meta.path.is_ident("primary_key") {
                    parsed.primary_key = true;
                } else if meta.path.is_ident("name") {
                    let lit: Lit = meta.value()?.parse()?;
                    if let Lit::Str(s) = lit {
                        parsed.name = Some(s.value());
                    }
                } else if meta.path.is_ident("kind") {
                    let lit: Lit = meta.value()?.parse()?;
                    if let Lit::Str(s) = lit {
                        parsed.kind = Some(s.value());
                    }
                } else {
                    return Err(meta.error("unsupported #[column(...)] argument"));
                }
                Ok(())
            })
            .expect("Failed to parse #[column(...)] attribute");
        }
    }

    parsed
}

/// Get a serde rename from #[serde(rename = "...")] (or rename_all on the container)
fn get_serde_rename(attrs: &[syn::Attribute], key: &str) -> Option<String> {
    for attr in attrs {
        if attr.path().is_ident("serde") {
            let mut value = None;
            let _ = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident(key) && meta.input.peek(syn::Token![=]) {
                    let lit: Lit = meta.value()?.parse()?;
                    if let Lit::Str(s) = lit {
                        value = Some(s.value());
                    }
                    Ok(())
                } else {
                    skip_meta_value(&meta)
                }
            });
            if value.is_some() {
                return value;
            }
        }
    }
    None
}

/// Parse #[entity(table = "...")] attribute and return table name
fn parse_entity_attr(input: &DeriveInput) -> Option<String> {
    for attr in &input.attrs {
        if attr.path().is_ident("entity") {
            let mut table_name = None;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("table") {
                    let lit: Lit = meta.value()?.parse()?;
                    if let Lit::Str(s) = lit {
                        table_name = Some(s.value());
                    }
                    Ok(())
                } else {
                    Err(meta.error("unsupported #[entity(...)] argument"))
                }
            })
            .expect("Failed to parse #[entity(...)] attribute");
            return table_name;
        }
    }
    None
}

/// Map a column kind name to its ColumnType variant
fn kind_variant(kind: &str) -> Option<&'static str> {
    match kind {
        "text" => Some("Text"),
        "integer" => Some("Integer"),
        "bigint" => Some("BigInt"),
        "double" => Some("Double"),
        "boolean" => Some("Boolean"),
        "date" => Some("Date"),
        "timestamp" => Some("Timestamp"),
        "timestamptz" => Some("TimestampTz"),
        "json" => Some("Json"),
        _ => None,
    }
}

/// Map Rust type to ColumnType variant name
fn rust_type_to_column_type(ty: &syn::Type) -> &'static str {
    let type_str = quote::quote!(#ty).to_string();
    // Remove spaces for easier matching
    let type_str = type_str.replace(' ', "");

    // Check for Option<T> - extract inner type
    let inner_type = type_str
        .strip_prefix("std::option::")
        .or_else(|| type_str.strip_prefix("core::option::"))
        .unwrap_or(&type_str);
    let inner_type = if inner_type.starts_with("Option<") && inner_type.ends_with('>') {
        &inner_type[7..inner_type.len() - 1]
    } else {
        inner_type
    };

    // Tuples and arrays serialize as JSON arrays
    if inner_type.starts_with('(') || inner_type.starts_with('[') {
        return "Json";
    }

    // Last path segment, generics included (chrono::NaiveDate -> NaiveDate)
    let base = inner_type
        .split('<')
        .next()
        .unwrap_or(inner_type)
        .rsplit("::")
        .next()
        .unwrap_or(inner_type);

    match base {
        // Temporal types
        "NaiveDateTime" | "PrimitiveDateTime" => "Timestamp",
        "NaiveDate" | "Date" => "Date",
        "DateTime" | "OffsetDateTime" => "TimestampTz",
        // Integer types
        "i8" | "i16" | "i32" | "u8" | "u16" => "Integer",
        "i64" | "u32" | "u64" | "isize" | "usize" => "BigInt",
        "f32" | "f64" => "Double",
        // Boolean
        "bool" => "Boolean",
        // Structured values are stored as JSON
        "Value" | "Vec" | "VecDeque" | "HashMap" | "BTreeMap" | "HashSet" | "BTreeSet" => {
            "Json"
        }
        // Default to text for String and everything else
        _ => "Text",
    }
}

/// Derive macro for the Entity trait.
///
/// Generates the table name and the ordered column list of a struct with
/// named fields. The struct must also derive serde's `Serialize` and
/// `Deserialize`; values are read and written through them.
///
/// ## Container attributes
///
/// - `#[entity(table = "...")]` - table name (default: lower-cased struct name)
///
/// ## Field attributes
///
/// - `#[primary_key]` or `#[column(primary_key)]` - the row identifier; at
///   most one per struct, required for insert/update/delete
/// - `#[column(name = "...")]` - column name (default: field name)
/// - `#[column(kind = "...")]` - storage type when it can't be inferred from
///   the Rust type: `text`, `integer`, `bigint`, `double`, `boolean`, `date`,
///   `timestamp`, `timestamptz`, `json`. Fields holding nested structs need
///   `kind = "json"`; unrecognised types default to `text` and are refused
///   at write time when they do not serialize to a scalar.
/// - `#[column(skip)]` - not persisted
///
/// ## Example
///
/// ```text
/// #[derive(Entity, Serialize, Deserialize)]
/// #[entity(table = "produits")]
/// struct Produit {
///     #[primary_key]
///     pub id: Option<i64>,
///     #[column(name = "nom_produit")]
///     pub nom: Option<String>,
///     pub prix: Option<f64>,
/// }
/// ```
#[proc_macro_derive(Entity, attributes(entity, column, primary_key))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => panic!("Entity only supports structs with named fields"),
        },
        _ => panic!("Entity only supports structs"),
    };

    let table_name = parse_entity_attr(&input).unwrap_or_else(|| name.to_string().to_lowercase());
    let rename_all = get_serde_rename(&input.attrs, "rename_all");

    let mut columns = Vec::new();
    let mut primary_keys = 0usize;

    for field in fields.iter() {
        let attr = parse_column_attr(field);
        if attr.skip {
            continue;
        }

        let field_name = field
            .ident
            .as_ref()
            .expect("Named field must have an identifier")
            .to_string();
        // Raw identifiers keep their r# prefix out of column and serde names
        let field_name = field_name
            .strip_prefix("r#")
            .map(str::to_string)
            .unwrap_or(field_name);

        let explicit = attr.name.is_some();
        let col_name = attr.name.unwrap_or_else(|| field_name.clone());
        let json_key = get_serde_rename(&field.attrs, "rename")
            .unwrap_or_else(|| apply_rename_all(rename_all.as_deref(), &field_name));

        let kind = match attr.kind.as_deref() {
            Some(kind) => kind_variant(kind)
                .unwrap_or_else(|| panic!("Unknown column kind \"{}\" on {}", kind, field_name)),
            None => rust_type_to_column_type(&field.ty),
        };
        let kind = format_ident!("{}", kind);

        let primary_key = attr.primary_key || has_attr(field, "primary_key");
        if primary_key {
            primary_keys += 1;
        }

        columns.push(quote! {
            tablemap::Column {
                field: #field_name,
                name: #col_name,
                json_key: #json_key,
                kind: tablemap::ColumnType::#kind,
                primary_key: #primary_key,
                explicit: #explicit,
            }
        });
    }

    if primary_keys > 1 {
        panic!("Entity {} declares more than one primary key", name);
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics tablemap::Entity for #name #ty_generics #where_clause {
            fn table_name() -> &'static str {
                #table_name
            }

            fn columns() -> &'static [tablemap::Column] {
                const COLUMNS: &[tablemap::Column] = &[#(#columns),*];
                COLUMNS
            }
        }
    };

    TokenStream::from(expanded)
}

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Field, Fields, GenericParam, Generics, Index, Type};

// ─── Constants ─────────────────────────────────────────────────────────────

const MAX_BIT_WIDTH: usize = 64;
const MAX_PRESENCE_FIELDS: usize = 64;
const DEFAULT_LEN_BITS: usize = 16;
const DEFAULT_MAX_LEN: usize = 65535;

fn add_trait_bounds(mut generics: Generics, bound: proc_macro2::TokenStream) -> Generics {
    let parsed_bound: syn::TypeParamBound = syn::parse2(bound).unwrap();
    for param in &mut generics.params {
        match param {
            GenericParam::Type(ref mut type_param) => {
                type_param.bounds.push(parsed_bound.clone());
            }
            GenericParam::Const(_) => {}
            GenericParam::Lifetime(_) => {}
        }
    }
    generics
}

// ─── Attribute helpers ─────────────────────────────────────────────────────

fn has_attr(attrs: &[syn::Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}

fn should_serialize_field(field: &Field) -> bool {
    !has_attr(&field.attrs, "no_serialize")
}

fn parse_lit_int(meta: &syn::Meta) -> Option<usize> {
    match meta {
        syn::Meta::NameValue(syn::MetaNameValue {
            value:
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Int(lit),
                    ..
                }),
            ..
        }) => lit.base10_parse().ok(),
        _ => None,
    }
}

fn int_attr(attrs: &[syn::Attribute], name: &str) -> Option<usize> {
    attrs
        .iter()
        .find(|attr| attr.path().is_ident(name))
        .and_then(|attr| parse_lit_int(&attr.meta))
}

/// Value of a `#[name = "..."]` attribute parsed as `T`.
fn str_attr<T: syn::parse::Parse>(attrs: &[syn::Attribute], name: &str) -> Option<T> {
    attrs.iter().find_map(|attr| {
        if !attr.path().is_ident(name) {
            return None;
        }
        if let syn::Meta::NameValue(syn::MetaNameValue {
            value:
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(s),
                    ..
                }),
            ..
        }) = &attr.meta
        {
            Some(s.parse().unwrap_or_else(|e| {
                panic!("#[{name} = \"...\"] is not valid: {e}");
            }))
        } else {
            None
        }
    })
}

fn get_field_bits(field: &Field) -> Option<usize> {
    int_attr(&field.attrs, "bits")
}

fn get_max_len(field: &Field, input: &DeriveInput) -> Option<usize> {
    int_attr(&field.attrs, "max_len").or_else(|| int_attr(&input.attrs, "default_max_len"))
}

fn get_with_path(field: &Field) -> Option<syn::Path> {
    str_attr(&field.attrs, "with")
}

fn get_quantize_path(field: &Field) -> Option<syn::Path> {
    str_attr(&field.attrs, "quantize")
}

fn get_skip_if(field: &Field) -> Option<syn::Expr> {
    str_attr(&field.attrs, "skip_if")
}

fn get_variant_id(variant: &syn::Variant) -> Option<u64> {
    int_attr(&variant.attrs, "variant_id").map(|id| id as u64)
}

fn has_presence_mask(input: &DeriveInput) -> bool {
    has_attr(&input.attrs, "presence_mask")
}

// ─── Type classification ───────────────────────────────────────────────────

fn type_ident_name(ty: &Type) -> Option<String> {
    if let Type::Path(p) = ty {
        p.path.get_ident().map(|i| i.to_string())
    } else {
        None
    }
}

fn is_vec_type(ty: &Type) -> bool {
    matches!(ty, Type::Path(p) if p.path.segments.last().is_some_and(|s| s.ident == "Vec"))
}

/// `T` for a field typed `Option<T>`.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(p) = ty else {
        return None;
    };
    let segment = p.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        syn::GenericArgument::Type(inner) => Some(inner),
        _ => None,
    })
}

/// Returns the native bit capacity of a primitive type, or None for non-primitives.
fn primitive_bit_capacity(ty: &Type) -> Option<usize> {
    match type_ident_name(ty).as_deref() {
        Some("bool") => Some(1),
        Some("u8") | Some("i8") => Some(8),
        Some("u16") | Some("i16") => Some(16),
        Some("u32") | Some("i32") | Some("f32") => Some(32),
        Some("u64") | Some("i64") | Some("f64") => Some(64),
        _ => None,
    }
}

fn is_signed_type(ty: &Type) -> bool {
    matches!(
        type_ident_name(ty).as_deref(),
        Some("i8") | Some("i16") | Some("i32") | Some("i64")
    )
}

// ─── Default bits from container attrs ─────────────────────────────────────

fn get_default_bits(input: &DeriveInput) -> Vec<(String, usize)> {
    input
        .attrs
        .iter()
        .filter(|attr| attr.path().is_ident("default_bits"))
        .flat_map(|attr| {
            attr.parse_args_with(
                syn::punctuated::Punctuated::<syn::Meta, syn::Token![,]>::parse_terminated,
            )
            .unwrap_or_default()
            .into_iter()
            .filter_map(|meta| {
                if let syn::Meta::NameValue(nv) = meta {
                    if let syn::Expr::Lit(syn::ExprLit {
                        lit: syn::Lit::Int(lit),
                        ..
                    }) = nv.value
                    {
                        let name = nv.path.get_ident()?.to_string();
                        Some((name, lit.base10_parse().ok()?))
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
        })
        .collect()
}

/// Explicit or defaulted bit width of a primitive value type, 0 for anything else.
fn get_value_bit_width(field: &Field, ty: &Type, defaults: &[(String, usize)]) -> usize {
    if let Some(bits) = get_field_bits(field) {
        validate_value_bits(ty, bits).expect("Invalid bits attribute");
        return bits;
    }
    if let Some(name) = type_ident_name(ty) {
        if let Some((_, bits)) = defaults.iter().find(|(t, _)| *t == name) {
            validate_value_bits(ty, *bits).expect("Invalid default bits");
            return *bits;
        }
    }
    primitive_bit_capacity(ty).unwrap_or(0)
}

fn validate_value_bits(ty: &Type, bits: usize) -> syn::Result<()> {
    if bits == 0 || bits > MAX_BIT_WIDTH {
        return Err(syn::Error::new_spanned(ty, "Bits must be in 1..=64"));
    }
    let Some(capacity) = primitive_bit_capacity(ty) else {
        return Err(syn::Error::new_spanned(
            ty,
            "#[bits] only applies to bool, integer and float fields",
        ));
    };
    if type_ident_name(ty).as_deref() == Some("bool") && bits != 1 {
        return Err(syn::Error::new_spanned(ty, "Bool requires exactly 1 bit"));
    }
    if bits > capacity {
        return Err(syn::Error::new_spanned(
            ty,
            format!("Bits exceed {capacity}-bit capacity"),
        ));
    }
    Ok(())
}

fn get_enum_bits(input: &DeriveInput) -> Option<usize> {
    int_attr(&input.attrs, "bits")
}

// ─── Len-prefix helpers (Vec length bits) ──────────────────────────────────

fn len_prefix(max_len: Option<usize>) -> (usize, usize) {
    match max_len {
        Some(0) => (0, 0),
        Some(max) => ((u64::BITS - (max as u64).leading_zeros()) as usize, max),
        None => (DEFAULT_LEN_BITS, DEFAULT_MAX_LEN),
    }
}

/// A field is coded through its own attributes (rather than its trait impl)
/// when any of these are present.
fn has_value_attrs(field: &Field) -> bool {
    get_with_path(field).is_some()
        || get_quantize_path(field).is_some()
        || get_field_bits(field).is_some()
        || int_attr(&field.attrs, "max_len").is_some()
}

// ─── Core codegen: single value serialize ──────────────────────────────────
//
// `value_ref` – expression of type `&T` for the value being written
// `ty`        – `T`; for `Option` fields this is the inner type
// `label`     – field label used in error values

fn gen_write_value(
    field: &Field,
    ty: &Type,
    value_ref: proc_macro2::TokenStream,
    label: &proc_macro2::TokenStream,
    defaults: &[(String, usize)],
    input: &DeriveInput,
) -> proc_macro2::TokenStream {
    // #[with = "path"] overrides all default serialization
    if let Some(path) = get_with_path(field) {
        return quote! { #path::bit_serialize(#value_ref, writer)?; };
    }
    if let Some(path) = get_quantize_path(field) {
        return quote! {
            ::netplay::codec::Quantize::write_quantized(#value_ref, &#path, writer)?;
        };
    }

    let bits = get_value_bit_width(field, ty, defaults);
    if bits > 0 {
        return match type_ident_name(ty).as_deref() {
            Some("bool") => quote! { writer.write_bit(*#value_ref)?; },
            Some("f32") => quote! { writer.write_bits((*#value_ref).to_bits() as u64, #bits)?; },
            Some("f64") => quote! { writer.write_bits((*#value_ref).to_bits(), #bits)?; },
            // Integers wider than `bits` wrap: the writer keeps the low bits.
            _ => quote! { writer.write_bits(*#value_ref as u64, #bits)?; },
        };
    }

    if is_vec_type(ty) {
        let (len_bits, max_len) = len_prefix(get_max_len(field, input));
        return quote! {
            let items = #value_ref;
            if items.len() > #max_len {
                return Err(::netplay::CodecError::LengthExceeded {
                    field: #label,
                    len: items.len(),
                    max: #max_len,
                });
            }
            writer.write_bits(items.len() as u64, #len_bits)?;
            for item in items.iter() {
                ::netplay::serialize::BitSerialize::bit_serialize(item, writer)?;
            }
        };
    }

    quote! { ::netplay::serialize::BitSerialize::bit_serialize(#value_ref, writer)?; }
}

// ─── Core codegen: single value deserialize ────────────────────────────────

fn gen_read_value(
    var_name: &proc_macro2::TokenStream,
    field: &Field,
    ty: &Type,
    label: &proc_macro2::TokenStream,
    defaults: &[(String, usize)],
    input: &DeriveInput,
) -> proc_macro2::TokenStream {
    if let Some(path) = get_with_path(field) {
        return quote! { let #var_name: #ty = #path::bit_deserialize(reader)?; };
    }
    if let Some(path) = get_quantize_path(field) {
        return quote! {
            let #var_name: #ty = ::netplay::codec::Quantize::read_quantized(&#path, reader)?;
        };
    }

    let bits = get_value_bit_width(field, ty, defaults);
    if bits > 0 {
        let capacity = primitive_bit_capacity(ty).unwrap_or(MAX_BIT_WIDTH);
        return match type_ident_name(ty).as_deref() {
            Some("bool") => quote! { let #var_name = reader.read_bit()?; },
            Some("f32") => {
                quote! { let #var_name = f32::from_bits(reader.read_bits(#bits)? as u32); }
            }
            Some("f64") => quote! { let #var_name = f64::from_bits(reader.read_bits(#bits)?); },
            _ if is_signed_type(ty) && bits < capacity => quote! {
                let #var_name =
                    ::netplay::serialize::sign_extend(reader.read_bits(#bits)?, #bits) as #ty;
            },
            _ => quote! { let #var_name = reader.read_bits(#bits)? as #ty; },
        };
    }

    if is_vec_type(ty) {
        let (len_bits, max_len) = len_prefix(get_max_len(field, input));
        return quote! {
            let len = reader.read_bits(#len_bits)? as usize;
            if len > #max_len {
                return Err(::netplay::CodecError::LengthExceeded {
                    field: #label,
                    len,
                    max: #max_len,
                });
            }
            let mut #var_name: #ty = Vec::with_capacity(len);
            for _ in 0..len {
                #var_name.push(::netplay::serialize::BitDeserialize::bit_deserialize(reader)?);
            }
        };
    }

    quote! { let #var_name: #ty = ::netplay::serialize::BitDeserialize::bit_deserialize(reader)?; }
}

// ─── Unified field serialize codegen ───────────────────────────────────────

/// How an `Option` field's presence is recorded.
#[derive(Clone, Copy)]
enum Presence {
    /// One bit immediately before the value.
    Inline,
    /// Bit `n` of the leading presence mask.
    Masked(usize),
}

fn gen_field_serialize(
    field: &Field,
    value_ref: proc_macro2::TokenStream,
    label: proc_macro2::TokenStream,
    defaults: &[(String, usize)],
    input: &DeriveInput,
    presence: Option<Presence>,
) -> proc_macro2::TokenStream {
    let code = match (option_inner(&field.ty), presence) {
        (Some(inner), Some(Presence::Masked(_))) => {
            let write = gen_write_value(field, inner, quote! { value }, &label, defaults, input);
            quote! {
                if let Some(value) = #value_ref {
                    #write
                }
            }
        }
        (Some(inner), _) if has_value_attrs(field) => {
            let write = gen_write_value(field, inner, quote! { value }, &label, defaults, input);
            quote! {
                match #value_ref {
                    Some(value) => {
                        writer.write_bit(true)?;
                        #write
                    }
                    None => writer.write_bit(false)?,
                }
            }
        }
        _ => gen_write_value(field, &field.ty, value_ref, &label, defaults, input),
    };

    // Wrap with skip_if presence bit
    if let Some(skip_expr) = get_skip_if(field) {
        quote! {
            if !(#skip_expr) {
                writer.write_bit(true)?;
                #code
            } else {
                writer.write_bit(false)?;
            }
        }
    } else {
        code
    }
}

fn gen_field_deserialize(
    var_name: &proc_macro2::TokenStream,
    field: &Field,
    label: proc_macro2::TokenStream,
    defaults: &[(String, usize)],
    input: &DeriveInput,
    presence: Option<Presence>,
) -> proc_macro2::TokenStream {
    let value = quote! { value };
    let code = match (option_inner(&field.ty), presence) {
        (Some(inner), Some(Presence::Masked(index))) => {
            let read = gen_read_value(&value, field, inner, &label, defaults, input);
            quote! {
                let #var_name = if presence.is_set(#index) {
                    #read
                    Some(value)
                } else {
                    None
                };
            }
        }
        (Some(inner), _) if has_value_attrs(field) => {
            let read = gen_read_value(&value, field, inner, &label, defaults, input);
            quote! {
                let #var_name = if reader.read_bit()? {
                    #read
                    Some(value)
                } else {
                    None
                };
            }
        }
        _ => gen_read_value(var_name, field, &field.ty, &label, defaults, input),
    };

    if get_skip_if(field).is_some() {
        quote! {
            let #var_name = if reader.read_bit()? {
                #code
                #var_name
            } else {
                Default::default()
            };
        }
    } else {
        code
    }
}

// ─── Derive entry point ────────────────────────────────────────────────────

/// Derives `BitSerialize` and `BitDeserialize`.
///
/// Fields are written in declaration order. Field attributes:
/// `#[bits = N]`, `#[quantize = "PATH"]`, `#[max_len = N]`, `#[with = "path"]`,
/// `#[skip_if = "expr"]`, `#[no_serialize]`. Container attributes:
/// `#[bits = N]` (enum tag width), `#[default_bits(u8 = N, ..)]`,
/// `#[default_max_len = N]`, `#[presence_mask]`. Variants may pin their tag
/// with `#[variant_id = N]`; unknown tags are rejected on decode.
#[proc_macro_derive(
    NetworkSerialize,
    attributes(
        no_serialize,
        bits,
        max_len,
        default_bits,
        default_max_len,
        with,
        skip_if,
        variant_id,
        quantize,
        presence_mask
    )
)]
pub fn derive_network_serialize(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let impls = [
        gen_trait_impl(&input, name, true),
        gen_trait_impl(&input, name, false),
    ];

    let expanded = quote! { #(#impls)* };
    TokenStream::from(expanded)
}

fn gen_trait_impl(
    input: &DeriveInput,
    name: &syn::Ident,
    is_serialize: bool,
) -> proc_macro2::TokenStream {
    let generics = input.generics.clone();
    let body = gen_body(input, is_serialize);

    if is_serialize {
        let generics = add_trait_bounds(generics, quote! { ::netplay::serialize::BitSerialize });
        let (ig, tg, wc) = generics.split_for_impl();
        quote! {
            impl #ig ::netplay::serialize::BitSerialize for #name #tg #wc {
                fn bit_serialize<W: ::netplay::serialize::bit_io::BitWrite>(
                    &self,
                    writer: &mut W,
                ) -> ::netplay::CodecResult<()> {
                    #body
                }
            }
        }
    } else {
        let generics = add_trait_bounds(generics, quote! { ::netplay::serialize::BitDeserialize });
        let (ig, tg, wc) = generics.split_for_impl();
        quote! {
            impl #ig ::netplay::serialize::BitDeserialize for #name #tg #wc {
                fn bit_deserialize<R: ::netplay::serialize::bit_io::BitRead>(
                    reader: &mut R,
                ) -> ::netplay::CodecResult<Self> {
                    #body
                }
            }
        }
    }
}

fn gen_body(input: &DeriveInput, is_serialize: bool) -> proc_macro2::TokenStream {
    match (&input.data, is_serialize) {
        (Data::Struct(data), true) => gen_struct_serialize(&data.fields, input),
        (Data::Struct(data), false) => gen_struct_deserialize(&data.fields, input),
        (Data::Enum(data), true) => gen_enum_serialize(data, input),
        (Data::Enum(data), false) => gen_enum_deserialize(data, input),
        (Data::Union(_), _) => panic!("Unions are not supported"),
    }
}

// ─── Presence mask layout ──────────────────────────────────────────────────

/// Mask index of every serialized `Option` field, in declaration order.
fn presence_layout(fields: &Fields, input: &DeriveInput) -> Vec<Option<Presence>> {
    let masked = has_presence_mask(input);
    let mut next = 0usize;
    let layout: Vec<_> = fields
        .iter()
        .map(|f| {
            if masked && should_serialize_field(f) && option_inner(&f.ty).is_some() {
                let index = next;
                next += 1;
                Some(Presence::Masked(index))
            } else {
                None
            }
        })
        .collect();
    if next > MAX_PRESENCE_FIELDS {
        panic!("#[presence_mask] supports at most {MAX_PRESENCE_FIELDS} optional fields");
    }
    layout
}

fn presence_count(layout: &[Option<Presence>]) -> usize {
    layout
        .iter()
        .filter(|p| matches!(p, Some(Presence::Masked(_))))
        .count()
}

// ─── Struct serialize ──────────────────────────────────────────────────────

fn field_accessor(index: usize, field: &Field) -> proc_macro2::TokenStream {
    match &field.ident {
        Some(name) => quote! { self.#name },
        None => {
            let idx = Index::from(index);
            quote! { self.#idx }
        }
    }
}

fn field_label(index: usize, field: &Field) -> proc_macro2::TokenStream {
    match &field.ident {
        Some(name) => {
            let text = name.to_string();
            quote! { #text }
        }
        None => {
            let text = index.to_string();
            quote! { #text }
        }
    }
}

fn gen_struct_serialize(fields: &Fields, input: &DeriveInput) -> proc_macro2::TokenStream {
    let defaults = get_default_bits(input);
    let layout = presence_layout(fields, input);
    let mask_len = presence_count(&layout);

    let mask_stmts: Vec<_> = fields
        .iter()
        .enumerate()
        .filter_map(|(i, f)| match layout[i] {
            Some(Presence::Masked(index)) => {
                let access = field_accessor(i, f);
                Some(quote! { presence.set(#index, #access.is_some()); })
            }
            _ => None,
        })
        .collect();

    let stmts: Vec<_> = fields
        .iter()
        .enumerate()
        .filter(|(_, f)| should_serialize_field(f))
        .map(|(i, f)| {
            let access = field_accessor(i, f);
            gen_field_serialize(
                f,
                quote! { &#access },
                field_label(i, f),
                &defaults,
                input,
                layout[i],
            )
        })
        .collect();

    let mask = if has_presence_mask(input) {
        quote! {
            let mut presence = ::netplay::codec::PresenceMask::new(#mask_len);
            #(#mask_stmts)*
            presence.write(writer)?;
        }
    } else {
        quote! {}
    };

    quote! {
        #mask
        #(#stmts)*
        Ok(())
    }
}

// ─── Struct deserialize ────────────────────────────────────────────────────

fn gen_struct_deserialize(fields: &Fields, input: &DeriveInput) -> proc_macro2::TokenStream {
    let defaults = get_default_bits(input);
    let layout = presence_layout(fields, input);
    let mask_len = presence_count(&layout);

    let vars: Vec<_> = fields
        .iter()
        .enumerate()
        .map(|(i, f)| match &f.ident {
            Some(name) => name.clone(),
            None => syn::Ident::new(&format!("field_{i}"), proc_macro2::Span::call_site()),
        })
        .collect();

    let stmts: Vec<_> = fields
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let var = &vars[i];
            if should_serialize_field(f) {
                gen_field_deserialize(
                    &quote! { #var },
                    f,
                    field_label(i, f),
                    &defaults,
                    input,
                    layout[i],
                )
            } else {
                quote! { let #var = Default::default(); }
            }
        })
        .collect();

    let mask = if has_presence_mask(input) {
        quote! { let presence = ::netplay::codec::PresenceMask::read(#mask_len, reader)?; }
    } else {
        quote! {}
    };

    let construct = match fields {
        Fields::Named(_) => quote! { Ok(Self { #(#vars,)* }) },
        Fields::Unnamed(_) => quote! { Ok(Self(#(#vars,)*)) },
        Fields::Unit => quote! { Ok(Self) },
    };

    quote! {
        #mask
        #(#stmts)*
        #construct
    }
}

// ─── Enum helpers ──────────────────────────────────────────────────────────

fn enum_variant_bits(data: &syn::DataEnum, input: &DeriveInput) -> usize {
    let count = data.variants.len();
    let min = if count <= 1 {
        // 0 or 1 variants need 0 bits, but use at least 1 for encoding
        if count == 0 {
            0
        } else {
            1
        }
    } else {
        // ceil(log2(count)) = 64 - leading_zeros(count - 1)
        (u64::BITS - (count as u64 - 1).leading_zeros()) as usize
    };
    let bits = get_enum_bits(input).unwrap_or(min);
    if bits < min {
        panic!("Enum bits ({bits}) too small for {count} variants (needs {min})");
    }
    if bits > MAX_BIT_WIDTH {
        panic!("Enum bits ({bits}) exceeds {MAX_BIT_WIDTH}");
    }
    bits
}

/// Wire tag of every variant: pinned `variant_id` or declaration index.
fn enum_variant_tags(data: &syn::DataEnum, bits: usize) -> Vec<u64> {
    let max_val = if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    };
    let mut seen = std::collections::HashSet::new();
    data.variants
        .iter()
        .enumerate()
        .map(|(i, variant)| {
            let tag = get_variant_id(variant).unwrap_or(i as u64);
            if !seen.insert(tag) {
                panic!("Duplicate wire tag {tag} on enum variant {}", variant.ident);
            }
            if tag > max_val {
                panic!("Wire tag {tag} of {} exceeds {bits} bits", variant.ident);
            }
            tag
        })
        .collect()
}

fn variant_bindings(fields: &Fields) -> Vec<syn::Ident> {
    fields
        .iter()
        .enumerate()
        .map(|(i, f)| match &f.ident {
            Some(name) => name.clone(),
            None => syn::Ident::new(&format!("field_{i}"), proc_macro2::Span::call_site()),
        })
        .collect()
}

// ─── Enum serialize ────────────────────────────────────────────────────────

fn gen_enum_serialize(data: &syn::DataEnum, input: &DeriveInput) -> proc_macro2::TokenStream {
    let defaults = get_default_bits(input);
    let bits = enum_variant_bits(data, input);
    let tags = enum_variant_tags(data, bits);

    let arms: Vec<_> = data
        .variants
        .iter()
        .zip(&tags)
        .map(|(variant, tag)| {
            let vname = &variant.ident;
            let names = variant_bindings(&variant.fields);
            let ser_stmts: Vec<_> = variant
                .fields
                .iter()
                .enumerate()
                .filter(|(_, f)| should_serialize_field(f))
                .map(|(i, f)| {
                    let name = &names[i];
                    gen_field_serialize(
                        f,
                        quote! { #name },
                        field_label(i, f),
                        &defaults,
                        input,
                        None,
                    )
                })
                .collect();
            let write_tag = quote! { writer.write_bits(#tag, #bits)?; };

            match &variant.fields {
                Fields::Named(_) => quote! {
                    #[allow(unused_variables)]
                    Self::#vname { #(#names),* } => {
                        #write_tag
                        #(#ser_stmts)*
                        Ok(())
                    },
                },
                Fields::Unnamed(_) => quote! {
                    #[allow(unused_variables)]
                    Self::#vname(#(#names),*) => {
                        #write_tag
                        #(#ser_stmts)*
                        Ok(())
                    },
                },
                Fields::Unit => quote! {
                    Self::#vname => { #write_tag Ok(()) },
                },
            }
        })
        .collect();

    quote! { match self { #(#arms)* } }
}

// ─── Enum deserialize ──────────────────────────────────────────────────────

fn gen_enum_deserialize(data: &syn::DataEnum, input: &DeriveInput) -> proc_macro2::TokenStream {
    let name = &input.ident;
    let type_name = name.to_string();
    let defaults = get_default_bits(input);
    let bits = enum_variant_bits(data, input);
    let tags = enum_variant_tags(data, bits);

    let arms: Vec<_> = data
        .variants
        .iter()
        .zip(&tags)
        .map(|(variant, tag)| {
            let vname = &variant.ident;
            let names = variant_bindings(&variant.fields);
            let stmts: Vec<_> = variant
                .fields
                .iter()
                .enumerate()
                .map(|(i, f)| {
                    let var = &names[i];
                    if should_serialize_field(f) {
                        gen_field_deserialize(
                            &quote! { #var },
                            f,
                            field_label(i, f),
                            &defaults,
                            input,
                            None,
                        )
                    } else {
                        quote! { let #var = Default::default(); }
                    }
                })
                .collect();

            match &variant.fields {
                Fields::Named(_) => quote! {
                    #tag => {
                        #(#stmts)*
                        Ok(Self::#vname { #(#names,)* })
                    },
                },
                Fields::Unnamed(_) => quote! {
                    #tag => {
                        #(#stmts)*
                        Ok(Self::#vname(#(#names,)*))
                    },
                },
                Fields::Unit => quote! {
                    #tag => Ok(Self::#vname),
                },
            }
        })
        .collect();

    quote! {
        let variant_index = reader.read_bits(#bits)?;
        match variant_index {
            #(#arms)*
            _ => Err(::netplay::CodecError::UnknownVariant {
                type_name: #type_name,
                tag: variant_index,
            }),
        }
    }
}

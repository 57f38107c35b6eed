//! Property-based tests for type mapping, parameter derivation and compilation
//!
//! These tests check that:
//! - Store types survive a trip through their conceptual type
//! - Every conceptual type that can be built for a storable kind maps to some store type
//! - Mapping and compilation are deterministic
//! - Non-input parameters always get room to write back a value

use proptest::prelude::*;
use sqlite_provider::command::{
    create_parameter, CommandCompiler, CommandTree, Operand, ParameterMode, ParameterValue,
    Predicate, SetClause, SqliteSqlGenerator, MAX_PARAMETER_SIZE,
};
use sqlite_provider::manifest::ProviderManifest;
use sqlite_provider::types::{Facet, FacetSet, PrimitiveKind, StoreTypeUsage, TypeUsage};
use sqlite_provider::ProviderError;

fn manifest() -> ProviderManifest {
    ProviderManifest::new("ISO8601").unwrap()
}

/// Kinds with no SQLite store type.
const UNSTORABLE: [PrimitiveKind; 3] = [
    PrimitiveKind::SByte,
    PrimitiveKind::DateTimeOffset,
    PrimitiveKind::Time,
];

/// Largest MaxLength the catalog keeps as a bounded value.
const STORE_LENGTH_LIMIT: u32 = i32::MAX as u32;

fn arb_storable_kind() -> impl Strategy<Value = PrimitiveKind> {
    let kinds: Vec<_> = PrimitiveKind::ALL
        .into_iter()
        .filter(|k| !UNSTORABLE.contains(k))
        .collect();
    prop::sample::select(kinds)
}

fn arb_string_store_name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["varchar", "char", "nvarchar", "nchar"])
}

/// Any requested length, including ones no store type accepts.
fn arb_max_length() -> impl Strategy<Value = Option<u32>> {
    prop_oneof![Just(None), Just(Some(0)), any::<u32>().prop_map(Some)]
}

/// Lengths that survive a round trip through the catalog.
fn arb_storable_length() -> impl Strategy<Value = Option<u32>> {
    prop_oneof![Just(None), (1u32..=STORE_LENGTH_LIMIT).prop_map(Some)]
}

fn arb_decimal() -> impl Strategy<Value = (u8, u8)> {
    (1u8..=u8::MAX).prop_flat_map(|precision| (Just(precision), 0..=precision))
}

fn arb_facet<T: Arbitrary + Copy + 'static>() -> impl Strategy<Value = Option<Facet<T>>> {
    prop_oneof![
        Just(None),
        Just(Some(Facet::Unbounded)),
        any::<T>().prop_map(|v| Some(Facet::Value(v))),
    ]
}

/// Facets with arbitrary values, limited to the ones that apply to `kind`.
fn arb_facets_for(kind: PrimitiveKind) -> impl Strategy<Value = FacetSet> {
    (
        arb_facet::<u32>(),
        arb_facet::<u8>(),
        arb_facet::<u8>(),
        prop::option::of(any::<bool>()),
        prop::option::of(any::<bool>()),
        prop::option::of(any::<bool>()),
        prop::option::of(any::<bool>()),
    )
        .prop_map(move |(max_length, precision, scale, unicode, fixed_length, preserve_seconds, nullable)| {
            let length_bearing = kind.is_length_bearing();
            let decimal = kind == PrimitiveKind::Decimal;
            FacetSet {
                max_length: max_length.filter(|_| length_bearing),
                precision: precision.filter(|_| decimal),
                scale: scale.filter(|_| decimal),
                unicode: unicode.filter(|_| kind == PrimitiveKind::String),
                fixed_length: fixed_length.filter(|_| length_bearing),
                preserve_seconds: preserve_seconds.filter(|_| kind == PrimitiveKind::DateTime),
                nullable,
            }
        })
}

fn arb_type_usage() -> impl Strategy<Value = TypeUsage> {
    prop_oneof![
        arb_storable_kind().prop_map(TypeUsage::default_for),
        (any::<bool>(), any::<bool>(), arb_max_length()).prop_filter_map(
            "string facets out of range",
            |(unicode, fixed, len)| TypeUsage::string(unicode, fixed, len).ok()
        ),
        (any::<bool>(), arb_max_length()).prop_filter_map(
            "binary facets out of range",
            |(fixed, len)| TypeUsage::binary(fixed, len).ok()
        ),
        (any::<u8>(), any::<u8>()).prop_filter_map(
            "decimal facets out of range",
            |(p, s)| TypeUsage::decimal(p, s).ok()
        ),
        prop::option::of(any::<bool>()).prop_map(TypeUsage::date_time),
    ]
}

fn arb_identifier() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,7}"
}

fn arb_constant() -> impl Strategy<Value = Operand> {
    prop_oneof![
        any::<i64>().prop_map(|v| {
            Operand::constant(ParameterValue::Integer(v), TypeUsage::default_for(PrimitiveKind::Int64))
        }),
        ".{0,12}".prop_map(|v| {
            Operand::constant(ParameterValue::Text(v), TypeUsage::string(true, false, Some(40)).unwrap())
        }),
        prop::collection::vec(any::<u8>(), 0..8).prop_map(|v| {
            Operand::constant(ParameterValue::Blob(v), TypeUsage::binary(false, None).unwrap())
        }),
        Just(Operand::Null),
    ]
}

/// DML trees whose values are constants and whose filters use declared parameters.
fn arb_dml_tree() -> impl Strategy<Value = CommandTree> {
    (
        arb_identifier(),
        prop::collection::vec((arb_identifier(), arb_constant()), 1..5),
        prop::collection::vec((arb_identifier(), arb_storable_kind()), 0..4),
        0..3usize,
    )
        .prop_map(|(table, values, filter, shape)| {
            let values: Vec<_> = values
                .into_iter()
                .map(|(column, value)| SetClause::new(column, value))
                .collect();
            let mut declared = Vec::new();
            let predicates: Vec<_> = filter
                .into_iter()
                .enumerate()
                .map(|(i, (column, kind))| {
                    // Declared names may collide with generated ones like "p0".
                    let name = format!("p{}", i * 2);
                    declared.push((name.clone(), kind));
                    Predicate::eq(column, Operand::parameter(name))
                })
                .collect();
            let tree = match shape {
                0 => CommandTree::update(table, values, predicates),
                1 => CommandTree::delete(table, predicates),
                _ => CommandTree::insert(table, values),
            };
            declared
                .into_iter()
                .fold(tree, |tree, (name, kind)| tree.with_parameter(name, TypeUsage::default_for(kind)))
        })
}

proptest! {
    #[test]
    fn bounded_strings_round_trip(name in arb_string_store_name(), len in 1u32..=STORE_LENGTH_LIMIT) {
        let manifest = manifest();
        let store = StoreTypeUsage::new(name, FacetSet::new().with_max_length(len));
        let conceptual = manifest.conceptual_type_for(&store).unwrap();
        prop_assert_eq!(manifest.store_type_for(&conceptual).unwrap(), store);
    }

    #[test]
    fn unbounded_strings_round_trip(name in arb_string_store_name()) {
        let manifest = manifest();
        let store = StoreTypeUsage::new(name, FacetSet::new().with_unbounded_max_length());
        let conceptual = manifest.conceptual_type_for(&store).unwrap();
        prop_assert!(conceptual.facets().max_length.unwrap().is_unbounded());
        prop_assert_eq!(manifest.store_type_for(&conceptual).unwrap(), store);
    }

    #[test]
    fn decimals_round_trip((precision, scale) in arb_decimal()) {
        let manifest = manifest();
        let store = StoreTypeUsage::new(
            "extDecimal",
            FacetSet::new().with_precision(precision).with_scale(scale),
        );
        let conceptual = manifest.conceptual_type_for(&store).unwrap();
        prop_assert_eq!(conceptual.facets().precision_value(), Some(precision));
        prop_assert_eq!(conceptual.facets().scale_value(), Some(scale));
        prop_assert_eq!(manifest.store_type_for(&conceptual).unwrap(), store);
    }

    #[test]
    fn blobs_round_trip(fixed in any::<bool>(), len in arb_storable_length()) {
        let manifest = manifest();
        let conceptual = TypeUsage::binary(fixed, len).unwrap();
        let store = manifest.store_type_for(&conceptual).unwrap();
        prop_assert_eq!(store.name.as_str(), "blob");
        prop_assert_eq!(manifest.conceptual_type_for(&store).unwrap(), conceptual);
    }

    #[test]
    fn storable_kinds_always_map(kind in arb_storable_kind()) {
        let manifest = manifest();
        let store = manifest.store_type_for(&TypeUsage::default_for(kind));
        prop_assert!(store.is_ok(), "{} has no store type: {:?}", kind, store);
        prop_assert!(manifest.catalog().get(&store.unwrap().name).is_some());
    }

    #[test]
    fn constructed_types_always_map(usage in arb_type_usage()) {
        let store = manifest().store_type_for(&usage);
        prop_assert!(store.is_ok(), "{} has no store type: {:?}", usage, store);
    }

    #[test]
    fn valid_facets_always_map(
        (kind, facets) in arb_storable_kind().prop_flat_map(|kind| (Just(kind), arb_facets_for(kind)))
    ) {
        if let Ok(usage) = TypeUsage::new(kind, facets) {
            let store = manifest().store_type_for(&usage);
            prop_assert!(store.is_ok(), "{} has no store type: {:?}", usage, store);
        }
    }

    #[test]
    fn mapping_is_deterministic(usage in arb_type_usage()) {
        let manifest = manifest();
        let first = manifest.store_type_for(&usage).unwrap();
        let second = manifest.store_type_for(&usage).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(
            manifest.conceptual_type_for(&first).unwrap(),
            manifest.conceptual_type_for(&second).unwrap()
        );
    }

    #[test]
    fn output_parameters_are_sized(
        unicode in any::<bool>(),
        fixed in any::<bool>(),
        len in prop_oneof![Just(None), (1u32..).prop_map(Some)],
        mode in prop::sample::select(vec![ParameterMode::Out, ParameterMode::InOut, ParameterMode::Return]),
    ) {
        let usage = TypeUsage::string(unicode, fixed, len).unwrap();
        let parameter = create_parameter("p", &usage, mode, ParameterValue::Null).unwrap();
        prop_assert_eq!(parameter.size, Some(len.unwrap_or(MAX_PARAMETER_SIZE)));
        prop_assert!(parameter.is_nullable);

        let input = create_parameter("p", &usage, ParameterMode::In, ParameterValue::Null).unwrap();
        prop_assert_eq!(input.size, len);
    }

    #[test]
    fn compilation_is_deterministic(tree in arb_dml_tree()) {
        let first = CommandCompiler::new(manifest(), SqliteSqlGenerator).compile(&tree.clone());
        let second = CommandCompiler::new(manifest(), SqliteSqlGenerator).compile(&tree);
        prop_assert!(first.is_ok(), "{:?} failed to compile: {:?}", tree, first);
        prop_assert_eq!(first.unwrap(), second.unwrap());
    }
}

#[test]
fn unstorable_kinds_are_unsupported() {
    let manifest = manifest();
    for kind in UNSTORABLE {
        assert!(matches!(
            manifest.store_type_for(&TypeUsage::default_for(kind)),
            Err(ProviderError::UnsupportedType(_))
        ));
    }
}

// tests/expansion_tests.rs

use lucene_compiler::{
    CompileError, CompilerConfig, Error, ExpansionContext, ExpansionError, FieldMap,
    FieldMetadata, FieldType, Filter, GeoDistanceMacro, Node, QueryCompiler,
};
use std::sync::{Arc, Mutex};

fn geo_fields() -> Arc<dyn FieldMetadata> {
    Arc::new(
        FieldMap::new()
            .field("location", FieldType::GeoPoint)
            .field("office.location", FieldType::GeoPoint),
    )
}

fn geo_compiler(geo: GeoDistanceMacro) -> QueryCompiler {
    QueryCompiler::new(
        CompilerConfig::builder()
            .shared_field_metadata(geo_fields())
            .with_macro(geo)
            .build(),
    )
}

fn geo_distance(field: &str, latitude: f64, longitude: f64, distance: &str) -> Filter {
    Filter::GeoDistance {
        field: field.to_string(),
        latitude,
        longitude,
        distance: distance.to_string(),
    }
}

// ============================================================================
// Geo distance
// ============================================================================

#[test]
fn test_coordinates_with_distance() {
    let compiler = geo_compiler(GeoDistanceMacro::new(geo_fields()));
    assert_eq!(
        compiler.compile_filter("location:51.5,-0.12~75km").unwrap(),
        geo_distance("location", 51.5, -0.12, "75km")
    );
}

#[test]
fn test_southern_and_western_coordinates() {
    let compiler = geo_compiler(GeoDistanceMacro::new(geo_fields()));
    assert_eq!(
        compiler.compile_filter("location:-33.86,151.2~5km").unwrap(),
        geo_distance("location", -33.86, 151.2, "5km")
    );
    assert_eq!(
        compiler
            .compile_filter("status:open location:-33.86,-70.6~5km")
            .unwrap(),
        Filter::Or(vec![
            Filter::term("status", "open"),
            geo_distance("location", -33.86, -70.6, "5km"),
        ])
    );
}

#[test]
fn test_default_distance() {
    let compiler = geo_compiler(GeoDistanceMacro::new(geo_fields()));
    assert_eq!(
        compiler.compile_filter(r#"location:"51.5,-0.12""#).unwrap(),
        geo_distance("location", 51.5, -0.12, "10mi")
    );

    let compiler = geo_compiler(GeoDistanceMacro::new(geo_fields()).with_default_distance("5km"));
    assert_eq!(
        compiler.compile_filter(r#"location:"51.5,-0.12""#).unwrap(),
        geo_distance("location", 51.5, -0.12, "5km")
    );
}

#[test]
fn test_nested_geo_field() {
    let compiler = geo_compiler(GeoDistanceMacro::new(geo_fields()));
    assert_eq!(
        compiler
            .compile_filter(r#"office:(location:"40.7,-74.0~2mi")"#)
            .unwrap(),
        geo_distance("office.location", 40.7, -74.0, "2mi")
    );
}

#[test]
fn test_location_resolver() {
    let compiler = geo_compiler(
        GeoDistanceMacro::new(geo_fields()).with_resolver(|location| {
            (location == "75044").then(|| "32.95,-96.65".to_string())
        }),
    );

    assert_eq!(
        compiler.compile_filter("location:75044~20mi").unwrap(),
        geo_distance("location", 32.95, -96.65, "20mi")
    );

    let err = compiler.compile_filter("location:99999").unwrap_err();
    assert_eq!(
        err,
        Error::Compile(CompileError::Expansion(ExpansionError::new(
            "unable to resolve location '99999'"
        )))
    );
}

#[test]
fn test_out_of_range_coordinate() {
    let compiler = geo_compiler(GeoDistanceMacro::new(geo_fields()));
    assert!(matches!(
        compiler.compile_filter(r#"location:"95,10""#),
        Err(Error::Compile(CompileError::Expansion(_)))
    ));
}

#[test]
fn test_non_geo_terms_pass_through() {
    let compiler = geo_compiler(GeoDistanceMacro::new(geo_fields()));
    assert_eq!(
        compiler.compile_filter(r#"city:"51.5,-0.12""#).unwrap(),
        Filter::term("city", "51.5,-0.12")
    );
}

#[test]
fn test_negated_geo_term() {
    let compiler = geo_compiler(GeoDistanceMacro::new(geo_fields()));
    assert_eq!(
        compiler.compile_filter(r#"-location:"51.5,-0.12~1mi""#).unwrap(),
        Filter::Not(Box::new(geo_distance("location", 51.5, -0.12, "1mi")))
    );
}

// ============================================================================
// Registry behaviour
// ============================================================================

#[test]
fn test_macros_see_scope_default_field() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);

    let compiler = QueryCompiler::new(
        CompilerConfig::builder()
            .default_field("body")
            .with_macro(
                move |_: &Node, ctx: &mut ExpansionContext| -> Result<(), ExpansionError> {
                    recorder.lock().unwrap().push(ctx.default_field.clone());
                    Ok(())
                },
            )
            .build(),
    );

    compiler.compile_filter("a parent:(b child:c)").unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            Some("body".to_string()),
            Some("parent".to_string()),
            Some("parent".to_string()),
        ]
    );
}

#[test]
fn test_macros_run_in_registration_order() {
    let compiler = QueryCompiler::new(
        CompilerConfig::builder()
            .with_macro(
                |_: &Node, ctx: &mut ExpansionContext| -> Result<(), ExpansionError> {
                    if let Some(field) = ctx.filter.field().map(str::to_string) {
                        ctx.filter = Filter::exists(&field);
                    }
                    Ok(())
                },
            )
            .with_macro(
                |_: &Node, ctx: &mut ExpansionContext| -> Result<(), ExpansionError> {
                    if let Filter::Exists { field } = &ctx.filter {
                        ctx.filter = Filter::missing(field);
                    }
                    Ok(())
                },
            )
            .build(),
    );

    assert_eq!(
        compiler.compile_filter("status:x").unwrap(),
        Filter::missing("status")
    );
}

#[test]
fn test_macros_are_not_called_for_suppressed_leaves() {
    let calls = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&calls);

    let compiler = QueryCompiler::new(
        CompilerConfig::builder()
            .field_metadata(FieldMap::new().analyzed("body"))
            .with_macro(
                move |_: &Node, _: &mut ExpansionContext| -> Result<(), ExpansionError> {
                    *counter.lock().unwrap() += 1;
                    Ok(())
                },
            )
            .build(),
    );

    compiler
        .compile_filter("_exists_:body status:open body:[1 TO 2]")
        .unwrap();
    assert_eq!(*calls.lock().unwrap(), 1);
}

use std::fs;

use dispatchgen::{
    generate, generate_to_path, write_artifact, DispatchPlan, GenerateError, GeneratorConfig,
    Variant,
};
use tempfile::TempDir;

#[test]
fn test_writes_into_missing_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("include").join("rpc_dispatch_helper.hpp");

    let config = GeneratorConfig::for_variant(Variant::Classic).with_max_arity(4);
    let summary = generate_to_path(&config, &path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(summary.bytes, text.len());
    assert_eq!(summary.ladder_levels, 5);
    assert!(text.contains("#define RPC_FE_4(WHAT, X, ...)"));
}

#[test]
fn test_regeneration_overwrites_wholesale() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("helper.hpp");

    let large = generate(&GeneratorConfig::for_variant(Variant::Templated).with_max_arity(12)).unwrap();
    write_artifact(&path, &large).unwrap();
    let small = generate(&GeneratorConfig::for_variant(Variant::Templated).with_max_arity(2)).unwrap();
    write_artifact(&path, &small).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text, small.render());
    assert!(!text.contains("RPC_FE_12"));
}

#[test]
fn test_identical_inputs_give_identical_files() {
    let dir = TempDir::new().unwrap();
    let config = GeneratorConfig::for_variant(Variant::Callback).with_max_arity(8);

    let first = dir.path().join("a.hpp");
    let second = dir.path().join("b.hpp");
    generate_to_path(&config, &first).unwrap();
    generate_to_path(&config, &second).unwrap();

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn test_unwritable_path_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not_a_dir");
    fs::write(&blocker, "").unwrap();

    let config = GeneratorConfig::default().with_max_arity(2);
    let err = generate_to_path(&config, &blocker.join("helper.hpp")).unwrap_err();
    match err {
        GenerateError::Io { path, .. } => assert!(path.ends_with("helper.hpp")),
        other => panic!("expected an I/O error, got {}", other),
    }
}

#[test]
fn test_plan_against_generated_header() {
    let config = GeneratorConfig::for_variant(Variant::Classic).with_max_arity(3);
    let artifact = generate(&config).unwrap();

    let fits = DispatchPlan::default_dispatch(["Sum", "Mul", "Div"]);
    assert!(fits.validate(artifact.config()).is_ok());

    let too_many = DispatchPlan::default_dispatch(["Sum", "Mul", "Div", "Mod"]);
    assert!(matches!(
        too_many.validate(artifact.config()),
        Err(GenerateError::ArityExceeded {
            requested: 4,
            max_arity: 3
        })
    ));
}

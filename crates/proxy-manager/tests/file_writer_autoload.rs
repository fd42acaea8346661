//! File-writer strategy and proxy autoloader round trip, including tampered files.

use std::path::Path;
use std::sync::Arc;

use proxy_manager::{
    initializer, ClassDescriptor, Configuration, GeneratorKind, LazyLoadingValueHolderFactory,
    LazyLoadingValueHolderGenerator, MethodDescriptor, ParameterDescriptor, ProxyError,
    ProxyOptions, ProxySettings, ResolutionState, ValueHolder,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const USER_CLASS: &str = "App\\Mailer";

fn settings(dir: &Path) -> ProxySettings {
    ProxySettings {
        proxies_namespace: "App\\Proxies".into(),
        proxies_target_dir: Some(dir.to_path_buf()),
        generator: GeneratorKind::FileWriter,
        autoload_proxies: true,
    }
}

fn factory(dir: &Path) -> LazyLoadingValueHolderFactory {
    let configuration = Configuration::from_settings(&settings(dir)).unwrap();
    configuration.class_registry().define(
        ClassDescriptor::new(USER_CLASS).with_method(
            MethodDescriptor::public("send")
                .with_parameter(ParameterDescriptor::typed("message", "string"))
                .with_return_type("bool"),
        ),
    );
    LazyLoadingValueHolderFactory::new(Arc::new(configuration))
}

fn proxy_files(dir: &Path) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect()
}

// ---------------------------------------------------------------------------
// Round trip
// ---------------------------------------------------------------------------

#[test]
fn generated_proxy_is_written_and_autoloaded() {
    let dir = tempfile::tempdir().unwrap();
    let factory = factory(dir.path());

    let resolved = factory
        .core()
        .generate_proxy(USER_CLASS, &ProxyOptions::new(), &LazyLoadingValueHolderGenerator::new())
        .map(|r| r.state);
    assert_eq!(resolved.unwrap(), ResolutionState::ResolvedGenerated);

    let files = proxy_files(dir.path());
    assert_eq!(files.len(), 1);
    let stored: ClassDescriptor =
        serde_json::from_str(&std::fs::read_to_string(&files[0]).unwrap()).unwrap();
    assert!(stored.name().starts_with("App\\Proxies\\__PM__\\App\\Mailer\\Generated"));
    assert!(factory.configuration().class_registry().contains(stored.name()));
}

#[test]
fn second_factory_reuses_written_file() {
    let dir = tempfile::tempdir().unwrap();
    let first = factory(dir.path())
        .create_proxy(USER_CLASS, initializer(|_| Ok(1u8)))
        .unwrap();
    let written = std::fs::metadata(&proxy_files(dir.path())[0])
        .unwrap()
        .modified()
        .unwrap();

    let second_factory = factory(dir.path());
    let resolved = second_factory
        .core()
        .generate_proxy(USER_CLASS, &ProxyOptions::new(), &LazyLoadingValueHolderGenerator::new())
        .unwrap();

    assert_eq!(resolved.state, ResolutionState::ResolvedExisting);
    assert_eq!(resolved.class.name(), first.class_name());
    let after = std::fs::metadata(&proxy_files(dir.path())[0])
        .unwrap()
        .modified()
        .unwrap();
    assert_eq!(written, after);
}

#[test]
fn proxy_from_file_initializes_lazily() {
    let dir = tempfile::tempdir().unwrap();
    let mut proxy = factory(dir.path())
        .create_proxy(USER_CLASS, initializer(|ctx| Ok(format!("sent via {}", ctx.method))))
        .unwrap();

    assert!(proxy.wrapped_value_holder_value().is_none());
    assert_eq!(proxy.access("send", &[serde_json::Value::from("hello")]).unwrap(), "sent via send");
}

// ---------------------------------------------------------------------------
// Tampering
// ---------------------------------------------------------------------------

#[test]
fn tampered_signature_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    factory(dir.path())
        .create_proxy(USER_CLASS, initializer(|_| Ok(())))
        .unwrap();

    let file = proxy_files(dir.path()).remove(0);
    let mut json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
    let properties = json["properties"].as_array_mut().unwrap();
    let signature = properties
        .iter_mut()
        .find(|p| p["name"].as_str().is_some_and(|n| n.starts_with("signature")))
        .unwrap();
    signature["default_value"] = serde_json::Value::String("tampered".into());
    std::fs::write(&file, serde_json::to_string(&json).unwrap()).unwrap();

    let result = factory(dir.path()).create_proxy(USER_CLASS, initializer(|_| Ok(())));
    match result {
        Err(ProxyError::InvalidSignature { found, .. }) => assert_eq!(found, "tampered"),
        Err(other) => panic!("expected InvalidSignature, got {}", other),
        Ok(_) => panic!("tampered proxy was accepted"),
    }
}

#[test]
fn removed_signature_is_reported_missing() {
    let dir = tempfile::tempdir().unwrap();
    factory(dir.path())
        .create_proxy(USER_CLASS, initializer(|_| Ok(())))
        .unwrap();

    let file = proxy_files(dir.path()).remove(0);
    let mut json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
    json["properties"]
        .as_array_mut()
        .unwrap()
        .retain(|p| !p["name"].as_str().is_some_and(|n| n.starts_with("signature")));
    std::fs::write(&file, serde_json::to_string(&json).unwrap()).unwrap();

    let result = factory(dir.path()).create_proxy(USER_CLASS, initializer(|_| Ok(())));
    assert!(matches!(result, Err(ProxyError::MissingSignature { .. })));
}

#[test]
fn corrupt_class_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    factory(dir.path())
        .create_proxy(USER_CLASS, initializer(|_| Ok(())))
        .unwrap();

    let file = proxy_files(dir.path()).remove(0);
    std::fs::write(&file, "{\"name\": ").unwrap();

    let result = factory(dir.path()).create_proxy(USER_CLASS, initializer(|_| Ok(())));
    assert!(matches!(result, Err(ProxyError::Serialization(_))));
    assert_eq!(std::fs::read_to_string(&file).unwrap(), "{\"name\": ");
}

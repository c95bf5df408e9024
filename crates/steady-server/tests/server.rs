mod common;

use common::{MemoryBundler, config};
use steady_graph::{
    CustomTransformOptions, Graph, Module, ModuleId, ModuleIdContext, TransformOptions,
    transform_cache_key,
};
use steady_server::DeterministicServer;

fn dom_options(dom: &str) -> TransformOptions {
    TransformOptions {
        platform: Some("web".into()),
        dev: true,
        custom_transform_options: CustomTransformOptions {
            dom: Some(dom.into()),
            ..CustomTransformOptions::default()
        },
        ..TransformOptions::default()
    }
}

#[tokio::test]
async fn transform_sees_normalized_options() {
    let server = DeterministicServer::new(MemoryBundler::new(), config());

    let first = server
        .transform_file("/app/components/Button.tsx", &dom_options("Button"))
        .await
        .unwrap();
    let second = server
        .transform_file("/app/components/Button.tsx", &dom_options("Sidebar"))
        .await
        .unwrap();
    assert_eq!(first.cache_key, second.cache_key);
    assert_eq!(first.output.code, "// transformed /app/components/Button.tsx");

    let calls = server.bundler().transform_calls();
    assert_eq!(calls.len(), 2);
    for (_, options) in &calls {
        assert_eq!(options.custom_transform_options.dom.as_deref(), Some("true"));
    }
    assert_eq!(
        first.cache_key,
        transform_cache_key("/app/components/Button.tsx", &dom_options("Anything")).unwrap()
    );
}

#[tokio::test]
async fn dom_entry_keeps_its_option() {
    let server = DeterministicServer::new(MemoryBundler::new(), config());
    let entry = "/app/node_modules/expo/dom/entry.js";

    let button = server.transform_file(entry, &dom_options("Button")).await.unwrap();
    let sidebar = server.transform_file(entry, &dom_options("Sidebar")).await.unwrap();
    assert_ne!(button.cache_key, sidebar.cache_key);

    let calls = server.bundler().transform_calls();
    assert_eq!(calls[0].1.custom_transform_options.dom.as_deref(), Some("Button"));
}

#[test]
fn sorted_modules_share_ids_with_create_module_id() {
    let server = DeterministicServer::new(MemoryBundler::new(), config());
    let ios = ModuleIdContext::new(Some("ios"), None);

    // Seen before the graph is serialized.
    assert_eq!(server.create_module_id("/app/b.js", &ios), ModuleId::new(0));

    let graph = Graph::new(TransformOptions::for_platform("ios"))
        .with_module(Module::builder("/app/a.js").build())
        .with_module(Module::builder("/app/b.js").build());

    let order: Vec<_> = server
        .sorted_modules(&graph)
        .iter()
        .map(|m| m.path.clone())
        .collect();
    assert_eq!(order, ["/app/b.js", "/app/a.js"]);
    assert_eq!(server.create_module_id("/app/a.js", &ios), ModuleId::new(1));

    let android = ModuleIdContext::new(Some("android"), None);
    assert_eq!(server.create_module_id("/app/a.js", &android), ModuleId::new(0));
}

#[test]
fn watching_is_disabled_under_ci() {
    let server = DeterministicServer::new(MemoryBundler::new(), config());
    assert!(!server.config().watch);
    assert!(server.watch().unwrap().is_none());
}

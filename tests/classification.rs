//! Classification behaviour over whole documents and rule lists.

use openapi_bridge::descriptor::{build_descriptors, RouteDescriptor};
use openapi_bridge::routing::{classify, default_route_maps, RouteClassifier};
use openapi_bridge::{BridgeBuilder, ComponentType, MethodSet, RouteMap, UpstreamClient};
use reqwest::Method;
use serde_json::json;

mod common;

fn client() -> UpstreamClient {
    UpstreamClient::new("http://127.0.0.1:9").unwrap()
}

#[test]
fn test_default_rules_scenario() {
    let rules = default_route_maps();
    assert_eq!(
        classify(&RouteDescriptor::new(Method::GET, "/users/{id}"), &rules),
        Some(ComponentType::ResourceTemplate)
    );
    assert_eq!(
        classify(&RouteDescriptor::new(Method::GET, "/stats"), &rules),
        Some(ComponentType::Resource)
    );
    assert_eq!(
        classify(&RouteDescriptor::new(Method::POST, "/users"), &rules),
        Some(ComponentType::Action)
    );
}

#[test]
fn test_admin_exclusion_for_every_method() {
    let classifier = RouteClassifier::new(vec![
        RouteMap::new(MethodSet::Any, "^/admin/.*", ComponentType::Exclude).unwrap(),
    ]);
    for method in [Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
        assert_eq!(
            classifier.classify(&RouteDescriptor::new(method.clone(), "/admin/users/{id}")),
            ComponentType::Exclude,
            "{method} /admin/users/{{id}}"
        );
    }
}

#[test]
fn test_tag_superset_scenario() {
    let rule = RouteMap::catch_all(ComponentType::Exclude).with_tags(["admin"]);
    let tagged = RouteDescriptor::new(Method::GET, "/x").with_tags(["admin", "internal"]);
    let internal_only = RouteDescriptor::new(Method::GET, "/x").with_tags(["internal"]);
    assert!(rule.matches(&tagged));
    assert!(!rule.matches(&internal_only));
}

#[test]
fn test_first_match_ignores_non_matching_permutations() {
    let winner = RouteMap::new(MethodSet::only([Method::GET]), "^/reports", ComponentType::Prompt).unwrap();
    let misses = vec![
        RouteMap::new(MethodSet::only([Method::POST]), ".*", ComponentType::Exclude).unwrap(),
        RouteMap::new(MethodSet::Any, "^/admin", ComponentType::Exclude).unwrap(),
        RouteMap::catch_all(ComponentType::Exclude).with_tags(["beta"]),
    ];
    let route = RouteDescriptor::new(Method::GET, "/reports/daily");

    let orders: [[usize; 3]; 6] = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
    for order in orders {
        for insert_at in 0..=3 {
            let mut rules: Vec<RouteMap> = order.iter().map(|&i| misses[i].clone()).collect();
            rules.insert(insert_at, winner.clone());
            let verdict = RouteClassifier::new(rules).classify(&route);
            assert_eq!(verdict, ComponentType::Prompt, "order {order:?} at {insert_at}");
        }
    }
}

#[test]
fn test_earlier_rule_wins_over_later_match() {
    let classifier = RouteClassifier::new(vec![
        RouteMap::new(MethodSet::Any, "users", ComponentType::Resource).unwrap(),
        RouteMap::new(MethodSet::Any, "users", ComponentType::Exclude).unwrap(),
    ]);
    assert_eq!(
        classifier.classify(&RouteDescriptor::new(Method::DELETE, "/users/{id}")),
        ComponentType::Resource
    );
}

#[test]
fn test_substring_pattern_semantics() {
    let rule = RouteMap::new(MethodSet::Any, "admin", ComponentType::Exclude).unwrap();
    assert!(rule.matches(&RouteDescriptor::new(Method::GET, "/v1/admin/x")));
}

#[test]
fn test_trailing_exclude_yields_only_listed_routes() {
    let set = BridgeBuilder::new()
        .client(client())
        .route_maps(vec![
            RouteMap::new(MethodSet::only([Method::GET]), "^/stats$", ComponentType::Resource).unwrap(),
            RouteMap::catch_all(ComponentType::Exclude),
        ])
        .build(&common::shop_spec())
        .unwrap();
    assert_eq!(set.names(), vec!["getStats"]);
}

#[test]
fn test_document_defaults() {
    let set = BridgeBuilder::new().client(client()).build(&common::shop_spec()).unwrap();

    let kind = |name: &str| set.get(name).map(|c| c.kind);
    assert_eq!(kind("searchProducts"), Some(ComponentType::Resource));
    assert_eq!(kind("createProduct"), Some(ComponentType::Action));
    assert_eq!(kind("getProduct"), Some(ComponentType::ResourceTemplate));
    assert_eq!(kind("deleteProduct"), Some(ComponentType::Action));
    assert_eq!(kind("login"), Some(ComponentType::Action));
    assert_eq!(kind("listAdminUsers"), Some(ComponentType::Resource));
}

#[test]
fn test_tag_rule_over_document() {
    let set = BridgeBuilder::new()
        .client(client())
        .route_maps(vec![RouteMap::catch_all(ComponentType::Exclude).with_tags(["admin"])])
        .build(&common::shop_spec())
        .unwrap();
    assert!(set.get("listAdminUsers").is_none());
    assert!(set.get("getStats").is_some());
}

#[test]
fn test_classification_is_deterministic() {
    let descriptors = build_descriptors(&common::shop_spec()).unwrap();
    let classifier = RouteClassifier::default();
    let first: Vec<ComponentType> = descriptors.iter().map(|d| classifier.classify(d)).collect();
    let second: Vec<ComponentType> = descriptors.iter().map(|d| classifier.classify(d)).collect();
    assert_eq!(first, second);
}

#[test]
fn test_malformed_document_aborts_build() {
    let doc = common::openapi(json!({
        "paths": {
            "/users/{id}": {"get": {"operationId": "getUser"}}
        }
    }));
    let err = BridgeBuilder::new().client(client()).build(&doc).unwrap_err();
    assert!(err.is_construction_error());
}

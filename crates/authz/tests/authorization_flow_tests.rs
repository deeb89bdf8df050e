use nsgate_authz::extractor::encode_unsigned_token;
use nsgate_authz::testing::MockRetriever;
use nsgate_authz::{
    ApiRequest, AuthAction, AuthorizationPolicy, Authorizer, AuthorizerConfigBuilder,
    ChangeEvent, ChangeEventBridge, CheckOptions, EventType, PolicyRetriever,
};
use nsgate_core::{
    LocalNotificationBus, NotificationBus, PermissionMap, Shutdown, AUTHORIZATION_IDENTITY,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn claims() -> Vec<String> {
    vec!["org=acme".to_string(), "team=red".to_string()]
}

async fn eventually(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

fn red_policy(ns: &str, permissions: &[&str]) -> AuthorizationPolicy {
    AuthorizationPolicy {
        name: "red".to_string(),
        namespace: ns.to_string(),
        propagate: true,
        subject: vec![vec!["team=red".to_string()]],
        target_namespaces: vec![ns.to_string()],
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_policy_change_is_visible_after_invalidation() {
    let bus = Arc::new(LocalNotificationBus::new());
    let shutdown = Shutdown::new();

    let retriever = Arc::new(PolicyRetriever::new(vec![red_policy("/a", &["things:get"])]));
    let authorizer = Authorizer::builder(retriever.clone()).build().unwrap();
    authorizer.attach(bus.as_ref(), shutdown.signal());

    let options = CheckOptions::default();
    assert!(!authorizer
        .check_authorization(&claims(), "post", "/a/b", "things", &options)
        .await
        .unwrap());

    retriever.remove_policy("red");
    retriever.add_policy(red_policy("/a", &["things:get,post"]));

    // Still served from the cache.
    assert!(!authorizer
        .check_authorization(&claims(), "post", "/a/b", "things", &options)
        .await
        .unwrap());

    let (events, receiver) = mpsc::channel(8);
    ChangeEventBridge::new(bus.clone()).spawn(receiver, shutdown.signal());
    events
        .send(ChangeEvent::new(
            AUTHORIZATION_IDENTITY,
            EventType::Update,
            json!({"name": "red", "namespace": "/a"}),
        ))
        .await
        .unwrap();

    eventually(|| authorizer.cache().is_empty()).await;

    assert!(authorizer
        .check_authorization(&claims(), "post", "/a/b", "things", &options)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_invalidation_leaves_other_subtrees_cached() {
    let bus = LocalNotificationBus::new();
    let shutdown = Shutdown::new();
    let retriever = Arc::new(MockRetriever::granting(
        PermissionMap::new().with("things", ["get"]),
    ));
    let authorizer = Authorizer::builder(retriever.clone()).build().unwrap();
    authorizer.attach(&bus, shutdown.signal());

    let options = CheckOptions::default();
    for ns in ["/", "/a", "/a/b", "/x"] {
        authorizer
            .check_authorization(&claims(), "get", ns, "things", &options)
            .await
            .unwrap();
    }
    assert_eq!(retriever.calls(), 4);

    nsgate_core::events::publish(
        &bus,
        nsgate_core::NAMESPACE_CHANGES_TOPIC,
        &nsgate_core::NotificationMessage::new(nsgate_core::NAMESPACE_CHANGES_TOPIC, "/a"),
    )
    .unwrap();
    eventually(|| authorizer.cache().len() == 2).await;

    for ns in ["/", "/x"] {
        authorizer
            .check_authorization(&claims(), "get", ns, "things", &options)
            .await
            .unwrap();
    }
    assert_eq!(retriever.calls(), 4);

    authorizer
        .check_authorization(&claims(), "get", "/a/b", "things", &options)
        .await
        .unwrap();
    assert_eq!(retriever.calls(), 5);
}

#[tokio::test]
async fn test_jwt_restrictions_narrow_policy_permissions() {
    let retriever = PolicyRetriever::new(vec![red_policy("/a", &["things:get,post,delete"])]);
    let authorizer = Authorizer::builder(retriever).build().unwrap();

    let token = encode_unsigned_token(&json!({
        "identity": claims(),
        "restrictions": {"perms": ["things:get"]}
    }));

    let request = |op: &str| {
        ApiRequest::new(op, "/a", "things")
            .with_credential(token.clone())
            .with_claims(claims())
            .with_source_ip("10.0.0.1:3000")
    };

    assert_eq!(authorizer.is_authorized(&request("get")).await.unwrap(), AuthAction::Ok);
    assert_eq!(authorizer.is_authorized(&request("post")).await.unwrap(), AuthAction::Ko);

    let err = authorizer
        .is_authorized(&ApiRequest::new("get", "/a", "things").with_credential("garbage"))
        .await
        .unwrap_err();
    assert!(err.is_forbidden());
}

#[tokio::test]
async fn test_ignored_resources_need_no_credential() {
    let retriever = Arc::new(MockRetriever::failing("boom"));
    let config = AuthorizerConfigBuilder::new()
        .ignore_resources(["root"])
        .build()
        .unwrap();
    let authorizer = Authorizer::builder(retriever.clone())
        .config(config)
        .build()
        .unwrap();

    let request = ApiRequest::new("get", "", "root");
    assert_eq!(authorizer.is_authorized(&request).await.unwrap(), AuthAction::Ok);
    assert_eq!(retriever.calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_checks() {
    let retriever = Arc::new(MockRetriever::granting(
        PermissionMap::new().with("things", ["get"]),
    ));
    let authorizer = Arc::new(Authorizer::builder(retriever.clone()).build().unwrap());

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let authorizer = authorizer.clone();
            tokio::spawn(async move {
                let ns = format!("/tenant{}", i % 4);
                authorizer
                    .check_authorization(&claims(), "get", &ns, "things", &CheckOptions::default())
                    .await
            })
        })
        .collect();

    for result in futures::future::join_all(tasks).await {
        assert!(result.unwrap().unwrap());
    }

    assert_eq!(authorizer.cache().len(), 4);
    assert!(retriever.calls() >= 4);
    assert!(retriever.calls() <= 32);
}

#[tokio::test]
async fn test_shutdown_detaches_from_bus() {
    let bus = LocalNotificationBus::new();
    let shutdown = Shutdown::new();
    let authorizer = Authorizer::builder(MockRetriever::new()).build().unwrap();

    let handles = authorizer.attach(&bus, shutdown.signal());
    assert_eq!(bus.subscriber_count(nsgate_core::NAMESPACE_CHANGES_TOPIC), 1);

    drop(shutdown);
    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(bus.subscriber_count(nsgate_core::NAMESPACE_CHANGES_TOPIC), 0);
    assert!(bus
        .publish(nsgate_core::Publication::raw(
            nsgate_core::NAMESPACE_CHANGES_TOPIC,
            b"{}".to_vec()
        ))
        .is_ok());
}

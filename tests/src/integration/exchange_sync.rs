//! # Data Exchange Synchronisation
//!
//! Connectors on separate ports, each with its own store, keep mirrors of one
//! exchange in sync through the private API.
//!
//! ```text
//!   A (provider) ──create mirror──► B (consumer)
//!        │ ◄──────── PUT …/exchangeidentifier/{id} ───────► │
//!        └──────────── service chain ──► C (infrastructure)
//! ```

#[cfg(test)]
mod tests {
    use crate::harness::TestConnector;
    use reqwest::{Method, StatusCode};
    use serde_json::{json, Value};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn new_exchange(provider: &TestConnector, consumer: &TestConnector) -> Value {
        json!({
            "providerEndpoint": provider.endpoint,
            "consumerEndpoint": consumer.endpoint,
            "resources": [{"resource": format!("{}/catalog/offerings/1", provider.endpoint)}],
            "contract": "urn:contract:sync"
        })
    }

    async fn initiate(at: &TestConnector, body: Value) -> Value {
        let (status, exchange) = at
            .private(Method::POST, "/private/dataexchanges/initiate", Some(body))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED, "initiate -> {}", exchange);
        exchange
    }

    async fn set_status(at: &TestConnector, id: &str, status: &str) -> (StatusCode, Value) {
        at.private(
            Method::PUT,
            &format!("/private/dataexchanges/{}/status", id),
            Some(json!({"status": status})),
        )
        .await
        .unwrap()
    }

    fn text(value: &Value, field: &str) -> String {
        value[field].as_str().unwrap_or_default().to_string()
    }

    // =============================================================================
    // TWO PARTICIPANTS
    // =============================================================================

    #[tokio::test]
    async fn test_provider_initiated_exchange_syncs_both_ways() {
        let provider = TestConnector::start().await.unwrap();
        let consumer = TestConnector::start().await.unwrap();

        let created = initiate(&provider, new_exchange(&provider, &consumer)).await;
        let provider_id = text(&created, "id");
        let mirror_id = text(&created, "consumerDataExchange");
        assert_eq!(text(&created, "providerDataExchange"), provider_id);
        assert!(!mirror_id.is_empty());
        assert_ne!(mirror_id, provider_id);

        let mirror = consumer.exchange(&mirror_id).await.unwrap();
        assert_eq!(mirror["exchangeIdentifier"], created["exchangeIdentifier"]);
        assert_eq!(mirror["exchangeKey"], created["exchangeKey"]);
        assert_eq!(text(&mirror, "providerDataExchange"), provider_id);
        assert_eq!(text(&mirror, "consumerDataExchange"), mirror_id);
        assert_eq!(mirror["status"], "PENDING");

        // Provider side change reaches the consumer.
        let (status, _) = provider
            .private(
                Method::PUT,
                &format!("/private/dataexchanges/{}/status", provider_id),
                Some(json!({"status": "IN_PROGRESS", "payload": "rows=120"})),
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);
        let mirror = consumer.exchange(&mirror_id).await.unwrap();
        assert_eq!(mirror["status"], "IN_PROGRESS");
        assert_eq!(mirror["payload"], "rows=120");

        // Consumer side change reaches the provider.
        let (status, _) = set_status(&consumer, &mirror_id, "COMPLETED").await;
        assert_eq!(status, StatusCode::OK);
        let original = provider.exchange(&provider_id).await.unwrap();
        assert_eq!(original["status"], "COMPLETED");
        assert_eq!(original["payload"], "rows=120");
        assert_eq!(text(&original, "id"), provider_id);
        assert_eq!(text(&original, "consumerDataExchange"), mirror_id);
    }

    #[tokio::test]
    async fn test_consumer_initiated_exchange_mirrors_at_provider() {
        let provider = TestConnector::start().await.unwrap();
        let consumer = TestConnector::start().await.unwrap();

        let created = initiate(&consumer, new_exchange(&provider, &consumer)).await;
        let consumer_id = text(&created, "id");
        let provider_mirror = text(&created, "providerDataExchange");
        assert_eq!(text(&created, "consumerDataExchange"), consumer_id);
        assert!(!provider_mirror.is_empty());

        let mirror = provider.exchange(&provider_mirror).await.unwrap();
        assert_eq!(text(&mirror, "providerDataExchange"), provider_mirror);
        assert_eq!(text(&mirror, "consumerDataExchange"), consumer_id);
        assert_eq!(mirror["contract"], "urn:contract:sync");
    }

    #[tokio::test]
    async fn test_mirror_rejects_wrong_or_missing_key() {
        let provider = TestConnector::start().await.unwrap();
        let consumer = TestConnector::start().await.unwrap();

        let created = initiate(&provider, new_exchange(&provider, &consumer)).await;
        let identifier = text(&created, "exchangeIdentifier");
        let mirror_id = text(&created, "consumerDataExchange");

        let mut forged = created.clone();
        forged["status"] = json!("FAILED");

        let (status, _) = consumer
            .push_as_peer(&identifier, &"0".repeat(64), forged.clone())
            .await
            .unwrap();
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = consumer.push_as_peer(&identifier, "", forged.clone()).await.unwrap();
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = consumer
            .push_as_peer("unknown-identifier", &text(&created, "exchangeKey"), forged)
            .await
            .unwrap();
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let mirror = consumer.exchange(&mirror_id).await.unwrap();
        assert_eq!(mirror["status"], "PENDING");
    }

    #[tokio::test]
    async fn test_late_push_does_not_roll_mirror_back() {
        let provider = TestConnector::start().await.unwrap();
        let consumer = TestConnector::start().await.unwrap();

        let created = initiate(&provider, new_exchange(&provider, &consumer)).await;
        let identifier = text(&created, "exchangeIdentifier");
        let mirror_id = text(&created, "consumerDataExchange");

        let (status, _) = set_status(&provider, &text(&created, "id"), "COMPLETED").await;
        assert_eq!(status, StatusCode::OK);

        // A delayed delivery of the creation-time state.
        let (status, body) = consumer
            .push_as_peer(&identifier, &text(&created, "exchangeKey"), created.clone())
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "COMPLETED");

        let mirror = consumer.exchange(&mirror_id).await.unwrap();
        assert_eq!(mirror["status"], "COMPLETED");
        assert!(mirror["version"].as_u64().unwrap() > created["version"].as_u64().unwrap());
    }

    #[tokio::test]
    async fn test_private_api_requires_bearer() {
        let connector = TestConnector::start().await.unwrap();
        let (status, body) = connector
            .send(Method::GET, "/private/dataexchanges/anything", None, None)
            .await
            .unwrap();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], 401);

        let (status, _) = connector
            .send(
                Method::GET,
                "/private/dataexchanges/anything",
                Some("not-the-token"),
                None,
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = connector
            .private(Method::GET, "/private/dataexchanges/anything", None)
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unreachable_peer_keeps_local_change() {
        let provider = TestConnector::start().await.unwrap();
        let mut consumer = TestConnector::start().await.unwrap();

        let created = initiate(&provider, new_exchange(&provider, &consumer)).await;
        let provider_id = text(&created, "id");
        consumer.stop().await;

        let (status, body) = set_status(&provider, &provider_id, "FAILED").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY, "{}", body);

        let local = provider.exchange(&provider_id).await.unwrap();
        assert_eq!(local["status"], "FAILED");
    }

    #[tokio::test]
    async fn test_explicit_sync_to_additional_peer() {
        let provider = TestConnector::start().await.unwrap();
        let consumer = TestConnector::start().await.unwrap();
        let observer = TestConnector::start().await.unwrap();

        let created = initiate(&provider, new_exchange(&provider, &consumer)).await;
        let provider_id = text(&created, "id");

        // An operator registers the exchange at a third connector.
        let (status, registered) = observer
            .private(Method::POST, "/private/dataexchanges", Some(created.clone()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        let observer_id = text(&registered, "id");

        // Registering again returns the same mirror.
        let (status, again) = observer
            .private(Method::POST, "/private/dataexchanges", Some(created.clone()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(text(&again, "id"), observer_id);

        // A different key for the same identifier is refused.
        let mut impostor = created.clone();
        impostor["exchangeKey"] = json!("f".repeat(64));
        let (status, _) = observer
            .private(Method::POST, "/private/dataexchanges", Some(impostor))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // Regular updates only reach the counterpart.
        let (status, _) = set_status(&provider, &provider_id, "IN_PROGRESS").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(observer.exchange(&observer_id).await.unwrap()["status"], "PENDING");

        let (status, _) = provider
            .private(
                Method::POST,
                &format!("/private/dataexchanges/{}/sync", provider_id),
                Some(json!({"endpoint": format!("{}/", observer.endpoint)})),
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            observer.exchange(&observer_id).await.unwrap()["status"],
            "IN_PROGRESS"
        );
    }

    // =============================================================================
    // SERVICE CHAIN
    // =============================================================================

    #[tokio::test]
    async fn test_service_chain_updates_every_connector() {
        let provider = TestConnector::start().await.unwrap();
        let infrastructure = TestConnector::start().await.unwrap();
        let consumer = TestConnector::start().await.unwrap();

        let mut body = new_exchange(&provider, &consumer);
        body["serviceChain"] = json!({
            "serviceChainId": "chain-anonymize",
            "services": [
                {"participant": "provider", "service": "extract"},
                {"participant": "infrastructure", "service": "anonymize"},
                {"participant": "consumer", "service": "load"}
            ]
        });
        let created = initiate(&provider, body).await;
        let provider_id = text(&created, "id");
        let consumer_mirror = text(&created, "consumerDataExchange");

        let steps = &created["serviceChain"]["services"];
        assert_eq!(steps[0]["connector"], provider.endpoint.as_str());
        assert!(steps[1].get("connector").is_none());
        assert_eq!(steps[2]["connector"], consumer.endpoint.as_str());

        // Bind the middle step to the infrastructure connector.
        let (status, bound) = provider
            .private(
                Method::PUT,
                &format!("/private/dataexchanges/{}/chain/anonymize/connector", provider_id),
                Some(json!({"endpoint": infrastructure.endpoint})),
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK, "{}", bound);
        let infrastructure_mirror = text(&bound["serviceChain"]["services"][1], "dataExchange");
        assert!(!infrastructure_mirror.is_empty());

        let seen_by_consumer = consumer.exchange(&consumer_mirror).await.unwrap();
        assert_eq!(
            seen_by_consumer["serviceChain"]["services"][1]["connector"],
            infrastructure.endpoint.as_str()
        );

        // Completing a step fans out to both other connectors.
        let (status, _) = provider
            .private(
                Method::PUT,
                &format!("/private/dataexchanges/{}/chain/extract/complete", provider_id),
                None,
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);

        for (connector, id) in [
            (&infrastructure, &infrastructure_mirror),
            (&consumer, &consumer_mirror),
        ] {
            let mirror = connector.exchange(id).await.unwrap();
            assert_eq!(mirror["serviceChain"]["services"][0]["completed"], true);
            assert_eq!(mirror["serviceChain"]["services"][1]["completed"], false);
        }

        // The infrastructure connector reports back through the chain.
        let (status, _) = set_status(&infrastructure, &infrastructure_mirror, "IN_PROGRESS").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            provider.exchange(&provider_id).await.unwrap()["status"],
            "IN_PROGRESS"
        );
        assert_eq!(
            consumer.exchange(&consumer_mirror).await.unwrap()["status"],
            "IN_PROGRESS"
        );
    }

    #[tokio::test]
    async fn test_unknown_chain_step_is_404() {
        let provider = TestConnector::start().await.unwrap();
        let consumer = TestConnector::start().await.unwrap();

        let mut body = new_exchange(&provider, &consumer);
        body["serviceChain"] = json!({
            "serviceChainId": "chain-short",
            "services": [{"participant": "provider", "service": "extract"}]
        });
        let created = initiate(&provider, body).await;

        let (status, _) = provider
            .private(
                Method::PUT,
                &format!(
                    "/private/dataexchanges/{}/chain/missing/complete",
                    text(&created, "id")
                ),
                None,
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

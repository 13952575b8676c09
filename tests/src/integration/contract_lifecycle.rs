//! # Contract Lifecycle
//!
//! A consumer negotiates a contract with a provider connector, then runs a
//! transfer under the agreement, all over HTTP.
//!
//! ```text
//! REQUESTED ─► ACCEPTED ─► AGREED ─► VERIFIED ─► FINALIZED
//!                                                    │ agreementId
//!                                                    ▼
//!              REQUESTED ─► STARTED ─► SUSPENDED ─► COMPLETED
//!                                          │ start
//!                                          └─► stays SUSPENDED
//! ```

#[cfg(test)]
mod tests {
    use crate::harness::TestConnector;
    use dc_02_negotiation::{NegotiationApi, NegotiationState};
    use dc_03_transfer::{TransferApi, TransferState};
    use reqwest::StatusCode;
    use serde_json::{json, Value};
    use shared_types::{message_types, PidLookup, DSP_CONTEXT};

    const CONSUMER_CALLBACK: &str = "https://consumer.example/callback";
    const AGREEMENT_ID: &str = "urn:agreement:lifecycle";

    // =============================================================================
    // MESSAGE FIXTURES
    // =============================================================================

    fn pid_message(message_type: &str, provider_pid: &str, consumer_pid: &str) -> Value {
        json!({
            "@context": DSP_CONTEXT,
            "@type": message_type,
            "dspace:providerPid": provider_pid,
            "dspace:consumerPid": consumer_pid
        })
    }

    fn contract_request(consumer_pid: &str) -> Value {
        json!({
            "@context": DSP_CONTEXT,
            "@type": message_types::CONTRACT_REQUEST,
            "dspace:consumerPid": consumer_pid,
            "dspace:offer": {"@id": "urn:offer:lifecycle"},
            "dspace:callbackAddress": CONSUMER_CALLBACK
        })
    }

    fn negotiation_event(provider_pid: &str, consumer_pid: &str, event: &str) -> Value {
        let mut body = pid_message(
            message_types::CONTRACT_NEGOTIATION_EVENT,
            provider_pid,
            consumer_pid,
        );
        body["dspace:eventType"] = json!(event);
        body
    }

    fn agreement(provider_pid: &str, consumer_pid: &str) -> Value {
        let mut body = pid_message(message_types::CONTRACT_AGREEMENT, provider_pid, consumer_pid);
        body["dspace:agreement"] = json!({"@id": AGREEMENT_ID});
        body["dspace:callbackAddress"] = json!("https://provider.example/callback");
        body
    }

    fn transfer_request(consumer_pid: &str) -> Value {
        json!({
            "@context": DSP_CONTEXT,
            "@type": message_types::TRANSFER_REQUEST,
            "dspace:consumerPid": consumer_pid,
            "dspace:agreementId": AGREEMENT_ID,
            "dct:format": "HTTP_PULL",
            "dspace:dataAddress": {"endpoint": "https://data.example/asset"},
            "dspace:callbackAddress": CONSUMER_CALLBACK
        })
    }

    fn state_of(body: &Value) -> &str {
        body["dspace:state"].as_str().unwrap_or_default()
    }

    // =============================================================================
    // FLOWS
    // =============================================================================

    #[tokio::test]
    async fn test_negotiation_then_transfer() {
        let connector = TestConnector::start().await.unwrap();
        let consumer_pid = "urn:uuid:consumer-negotiation-1";

        // Negotiation
        let (status, body) = connector
            .post("/negotiations/request", contract_request(consumer_pid))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        let provider_pid = body["dspace:providerPid"].as_str().unwrap().to_string();

        let steps = [
            (
                format!("/negotiations/{}/events", provider_pid),
                negotiation_event(&provider_pid, consumer_pid, "dspace:ACCEPTED"),
                "dspace:ACCEPTED",
            ),
            (
                format!("/callback/negotiations/{}/agreement", consumer_pid),
                agreement(&provider_pid, consumer_pid),
                "dspace:AGREED",
            ),
            (
                format!("/negotiations/{}/agreement/verification", provider_pid),
                pid_message(
                    message_types::CONTRACT_AGREEMENT_VERIFICATION,
                    &provider_pid,
                    consumer_pid,
                ),
                "dspace:VERIFIED",
            ),
            (
                format!("/callback/negotiations/{}/events", consumer_pid),
                negotiation_event(&provider_pid, consumer_pid, "dspace:FINALIZED"),
                "dspace:FINALIZED",
            ),
        ];
        for (path, message, expected) in steps {
            let (status, body) = connector.post(&path, message).await.unwrap();
            assert_eq!(status, StatusCode::OK, "{} -> {}", path, body);
            assert_eq!(state_of(&body), expected);
        }

        let negotiation = connector
            .container
            .negotiations
            .get(&PidLookup::Provider(provider_pid.clone()))
            .await
            .unwrap();
        assert_eq!(negotiation.state, NegotiationState::Finalized);
        assert_eq!(negotiation.consumer_pid, consumer_pid);

        // Transfer under the agreement
        let transfer_consumer_pid = "urn:uuid:consumer-transfer-1";
        let (status, body) = connector
            .post("/transfers/request", transfer_request(transfer_consumer_pid))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(state_of(&body), "dspace:REQUESTED");
        let transfer_pid = body["dspace:providerPid"].as_str().unwrap().to_string();

        let start = pid_message(
            message_types::TRANSFER_START,
            &transfer_pid,
            transfer_consumer_pid,
        );
        let mut suspension = pid_message(
            message_types::TRANSFER_SUSPENSION,
            &transfer_pid,
            transfer_consumer_pid,
        );
        suspension["dspace:code"] = json!("PAUSED");
        let steps = [
            (format!("/transfers/{}/start", transfer_pid), start.clone(), "dspace:STARTED"),
            (
                format!("/callback/transfers/{}/suspension", transfer_consumer_pid),
                suspension,
                "dspace:SUSPENDED",
            ),
            // A start never resumes a suspended transfer.
            (
                format!("/callback/transfers/{}/start", transfer_consumer_pid),
                start,
                "dspace:SUSPENDED",
            ),
            (
                format!("/transfers/{}/completion", transfer_pid),
                pid_message(
                    message_types::TRANSFER_COMPLETION,
                    &transfer_pid,
                    transfer_consumer_pid,
                ),
                "dspace:COMPLETED",
            ),
        ];
        for (path, message, expected) in steps {
            let (status, body) = connector.post(&path, message).await.unwrap();
            assert_eq!(status, StatusCode::OK, "{} -> {}", path, body);
            assert_eq!(state_of(&body), expected);
        }

        let transfer = connector
            .container
            .transfers
            .get(&PidLookup::Consumer(transfer_consumer_pid.to_string()))
            .await
            .unwrap();
        assert_eq!(transfer.state, TransferState::Completed);
        assert_eq!(transfer.agreement_id, AGREEMENT_ID);
        assert_eq!(
            transfer.data_address,
            Some(json!({"endpoint": "https://data.example/asset"}))
        );
    }

    #[tokio::test]
    async fn test_completed_transfer_only_terminates() {
        let connector = TestConnector::start().await.unwrap();
        let consumer_pid = "urn:uuid:consumer-transfer-2";
        let (_, body) = connector
            .post("/transfers/request", transfer_request(consumer_pid))
            .await
            .unwrap();
        let provider_pid = body["dspace:providerPid"].as_str().unwrap().to_string();

        let completion = pid_message(message_types::TRANSFER_COMPLETION, &provider_pid, consumer_pid);
        let (status, _) = connector
            .post(&format!("/transfers/{}/completion", provider_pid), completion)
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);

        let start = pid_message(message_types::TRANSFER_START, &provider_pid, consumer_pid);
        let (status, _) = connector
            .post(&format!("/transfers/{}/start", provider_pid), start.clone())
            .await
            .unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let termination =
            pid_message(message_types::TRANSFER_TERMINATION, &provider_pid, consumer_pid);
        let (status, body) = connector
            .post(&format!("/transfers/{}/termination", provider_pid), termination)
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state_of(&body), "dspace:TERMINATED");

        let (status, _) = connector
            .post(&format!("/transfers/{}/start", provider_pid), start)
            .await
            .unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_terminated_negotiation_is_final() {
        let connector = TestConnector::start().await.unwrap();
        let consumer_pid = "urn:uuid:consumer-negotiation-3";
        let (_, body) = connector
            .post("/negotiations/request", contract_request(consumer_pid))
            .await
            .unwrap();
        let provider_pid = body["dspace:providerPid"].as_str().unwrap().to_string();

        let mut termination = pid_message(
            message_types::CONTRACT_NEGOTIATION_TERMINATION,
            &provider_pid,
            consumer_pid,
        );
        termination["dspace:code"] = json!("REJECTED");
        termination["dspace:reason"] = json!([{"@value": "policy mismatch"}]);
        let (status, body) = connector
            .post(
                &format!("/callback/negotiations/{}/termination", consumer_pid),
                termination,
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state_of(&body), "dspace:TERMINATED");

        let (status, body) = connector
            .post(
                &format!("/callback/negotiations/{}/agreement", consumer_pid),
                agreement(&provider_pid, consumer_pid),
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 400);

        let (status, body) = connector
            .get(&format!("/negotiations/{}", provider_pid))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state_of(&body), "dspace:TERMINATED");
    }

    #[tokio::test]
    async fn test_health_and_metrics_are_served() {
        let connector = TestConnector::start().await.unwrap();
        let (status, body) = connector.get("/health").await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, _) = connector
            .post("/negotiations/request", contract_request("urn:uuid:metrics-1"))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = connector.get("/metrics").await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_str().unwrap_or_default().contains("dc_"));
    }
}

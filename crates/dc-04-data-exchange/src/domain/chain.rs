//! # Service Chain
//!
//! An ordered list of steps, each run by a participant's connector. A step may
//! carry `pre`: prerequisite sub-chains, each an ordered list of steps that
//! may nest further. Sub-chains are kept as a tree, never flattened.
//!
//! Steps are addressed by [`StepPath`]: the index of a top-level step, then
//! one `(sub-chain, step)` pair per level of nesting.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One step of a service chain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainStep {
    pub participant: String,
    pub service: String,
    /// Base URL of the connector running this step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector: Option<String>,
    #[serde(default)]
    pub configuration: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default)]
    pub completed: bool,
    /// Id of the mirror exchange held by this step's connector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_exchange: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre: Vec<Vec<ChainStep>>,
}

impl ChainStep {
    pub fn new(participant: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            participant: participant.into(),
            service: service.into(),
            ..Default::default()
        }
    }

    fn has_connector(&self) -> bool {
        self.connector.as_deref().is_some_and(|c| !c.is_empty())
    }
}

/// Location of a step inside a chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepPath {
    pub top: usize,
    pub nested: Vec<(usize, usize)>,
}

impl StepPath {
    pub fn top_level(index: usize) -> Self {
        Self {
            top: index,
            nested: Vec::new(),
        }
    }

    pub fn is_nested(&self) -> bool {
        !self.nested.is_empty()
    }
}

/// Service chain attached to an exchange.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceChain {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_id: Option<String>,
    pub service_chain_id: String,
    #[serde(default)]
    pub services: Vec<ChainStep>,
}

impl ServiceChain {
    /// First step running `service`, searching each step before its
    /// prerequisite sub-chains.
    pub fn find_step(&self, service: &str) -> Option<StepPath> {
        let mut trail = Vec::new();
        for (top, step) in self.services.iter().enumerate() {
            if step.service == service {
                return Some(StepPath::top_level(top));
            }
            if search_nested(step, service, &mut trail) {
                return Some(StepPath { top, nested: trail });
            }
        }
        None
    }

    /// Top-level step running `service`. Prerequisite sub-chains are not
    /// searched.
    pub fn find_top_level(&self, service: &str) -> Option<usize> {
        self.services.iter().position(|s| s.service == service)
    }

    pub fn step(&self, path: &StepPath) -> Option<&ChainStep> {
        let mut step = self.services.get(path.top)?;
        for &(chain, index) in &path.nested {
            step = step.pre.get(chain)?.get(index)?;
        }
        Some(step)
    }

    pub fn step_mut(&mut self, path: &StepPath) -> Option<&mut ChainStep> {
        let mut step = self.services.get_mut(path.top)?;
        for &(chain, index) in &path.nested {
            step = step.pre.get_mut(chain)?.get_mut(index)?;
        }
        Some(step)
    }

    /// Every step, depth-first.
    pub fn all_steps(&self) -> Vec<&ChainStep> {
        fn collect<'a>(steps: &'a [ChainStep], out: &mut Vec<&'a ChainStep>) {
            for step in steps {
                out.push(step);
                for chain in &step.pre {
                    collect(chain, out);
                }
            }
        }
        let mut out = Vec::new();
        collect(&self.services, &mut out);
        out
    }

    /// Distinct connectors of every step, nested ones included, in first-seen
    /// order. Unset connectors are skipped.
    pub fn connectors(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for step in self.all_steps() {
            if let Some(connector) = step.connector.as_deref().filter(|c| !c.is_empty()) {
                let normalized = normalize_endpoint(connector);
                if !seen.contains(&normalized) {
                    seen.push(normalized);
                }
            }
        }
        seen
    }

    /// Fill unset connectors: the first step runs here, the last step runs at
    /// the consumer.
    pub fn apply_defaults(&mut self, self_endpoint: &str, consumer_endpoint: Option<&str>) {
        if let Some(first) = self.services.first_mut() {
            if !first.has_connector() {
                first.connector = Some(self_endpoint.to_string());
            }
        }
        if let (Some(last), Some(consumer)) = (self.services.last_mut(), consumer_endpoint) {
            if !last.has_connector() {
                last.connector = Some(consumer.to_string());
            }
        }
    }
}

fn search_nested(step: &ChainStep, service: &str, trail: &mut Vec<(usize, usize)>) -> bool {
    for (chain_index, chain) in step.pre.iter().enumerate() {
        for (step_index, inner) in chain.iter().enumerate() {
            trail.push((chain_index, step_index));
            if inner.service == service || search_nested(inner, service, trail) {
                return true;
            }
            trail.pop();
        }
    }
    false
}

/// Compare endpoints without regard to a trailing slash.
pub fn normalize_endpoint(endpoint: &str) -> String {
    endpoint.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(service: &str, connector: Option<&str>) -> ChainStep {
        ChainStep {
            connector: connector.map(String::from),
            ..ChainStep::new("participant", service)
        }
    }

    fn nested_chain() -> ServiceChain {
        let mut anonymize = step("anonymize", Some("https://infra-a.example/"));
        anonymize.pre = vec![vec![
            step("validate", Some("https://infra-b.example")),
            {
                let mut enrich = step("enrich", None);
                enrich.pre = vec![vec![step("geocode", Some("https://infra-a.example"))]];
                enrich
            },
        ]];

        ServiceChain {
            catalog_id: None,
            service_chain_id: "chain-1".into(),
            services: vec![
                step("extract", None),
                anonymize,
                step("deliver", None),
            ],
        }
    }

    #[test]
    fn test_first_step_is_a_match() {
        let chain = nested_chain();
        assert_eq!(chain.find_step("extract"), Some(StepPath::top_level(0)));
        assert_eq!(chain.find_top_level("extract"), Some(0));
    }

    #[test]
    fn test_find_nested_step() {
        let chain = nested_chain();
        let path = chain.find_step("geocode").unwrap();
        assert_eq!(
            path,
            StepPath {
                top: 1,
                nested: vec![(0, 1), (0, 0)]
            }
        );
        assert!(path.is_nested());
        assert_eq!(chain.step(&path).unwrap().service, "geocode");
    }

    #[test]
    fn test_top_level_search_ignores_nested() {
        let chain = nested_chain();
        assert_eq!(chain.find_top_level("validate"), None);
        assert!(chain.find_step("validate").is_some());
        assert!(chain.find_step("missing").is_none());
    }

    #[test]
    fn test_step_mut_reaches_nested() {
        let mut chain = nested_chain();
        let path = chain.find_step("enrich").unwrap();
        chain.step_mut(&path).unwrap().connector = Some("https://infra-c.example".into());
        assert_eq!(
            chain.step(&path).unwrap().connector.as_deref(),
            Some("https://infra-c.example")
        );
    }

    #[test]
    fn test_defaults_fill_first_and_last() {
        let mut chain = nested_chain();
        chain.apply_defaults("https://self.example", Some("https://consumer.example"));
        assert_eq!(
            chain.services[0].connector.as_deref(),
            Some("https://self.example")
        );
        assert_eq!(
            chain.services[2].connector.as_deref(),
            Some("https://consumer.example")
        );
    }

    #[test]
    fn test_connectors_are_distinct_and_normalized() {
        let mut chain = nested_chain();
        chain.apply_defaults("https://self.example", Some("https://consumer.example"));
        assert_eq!(
            chain.connectors(),
            vec![
                "https://self.example".to_string(),
                "https://infra-a.example".to_string(),
                "https://infra-b.example".to_string(),
                "https://consumer.example".to_string(),
            ]
        );
    }

    #[test]
    fn test_wire_shape_round_trips() {
        let json = serde_json::json!({
            "serviceChainId": "chain-9",
            "services": [{
                "participant": "p1",
                "service": "s1",
                "configuration": "cfg",
                "params": {"k": "v"},
                "pre": [[{"participant": "p2", "service": "s2"}]]
            }]
        });
        let chain: ServiceChain = serde_json::from_value(json).unwrap();
        assert_eq!(chain.services[0].pre[0][0].service, "s2");
        assert!(!chain.services[0].completed);
        assert_eq!(chain.services[0].params.get("k").map(String::as_str), Some("v"));
    }
}

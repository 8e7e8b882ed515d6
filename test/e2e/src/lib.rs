//! End-to-end suite for the Gatekeeper operator.
//!
//! The suite only talks to a real cluster when `USE_EXISTING_CLUSTER=true`.
//! Otherwise [`run_install_suite`] reports [`SuiteOutcome::Skipped`] without
//! touching anything.
//!
//! | Variable | Default |
//! |---|---|
//! | `USE_EXISTING_CLUSTER` | `false` |
//! | `GKO_SAMPLE_PATH` | `config/samples/operator_v1alpha1_gatekeeper.yaml` at the workspace root |
//! | `GKO_NAMESPACE` | `gatekeeper-system` |
//! | `GKO_POLL_INTERVAL_MS` | `50` |
//! | `GKO_WAIT_TIMEOUT_SECS` | `30` |
//! | `GKO_KUBE_CONTEXT` | inferred |
//! | `GKO_ALLOW_EXISTING` | `false` |
//! | `GKO_READINESS_MODE` | `match-spec` (or `minimum`, `at-least=N`) |

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use gko_cluster::{connect, ClusterConfig, KubeDeployments, KubeGatekeepers};
use gko_converge::{ObjectFetcher, PollConfig, Poller, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT};
use gko_gatekeeper::{
    load_from_path, DeploymentObservation, GatekeeperApi, InstallCheck, InstallReport,
    ReadinessMode, DEFAULT_NAMESPACE, SAMPLE_PATH,
};
use tracing::info;

/// Suite configuration, read once from the environment.
#[derive(Debug, Clone)]
pub struct E2eConfig {
    pub use_existing_cluster: bool,
    pub sample_path: PathBuf,
    pub namespace: String,
    pub poll: PollConfig,
    pub context: Option<String>,
    pub allow_existing: bool,
    pub mode: ReadinessMode,
}

impl Default for E2eConfig {
    fn default() -> Self {
        Self {
            use_existing_cluster: false,
            sample_path: default_sample_path(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            poll: PollConfig::default(),
            context: None,
            allow_existing: false,
            mode: ReadinessMode::default(),
        }
    }
}

impl E2eConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let interval = match lookup("GKO_POLL_INTERVAL_MS") {
            Some(v) => Duration::from_millis(
                v.parse()
                    .with_context(|| format!("GKO_POLL_INTERVAL_MS is not a number: {v}"))?,
            ),
            None => DEFAULT_POLL_INTERVAL,
        };
        let timeout = match lookup("GKO_WAIT_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(
                v.parse()
                    .with_context(|| format!("GKO_WAIT_TIMEOUT_SECS is not a number: {v}"))?,
            ),
            None => DEFAULT_WAIT_TIMEOUT,
        };

        let mode = match lookup("GKO_READINESS_MODE") {
            Some(v) => v
                .parse::<ReadinessMode>()
                .map_err(anyhow::Error::msg)
                .context("GKO_READINESS_MODE is invalid")?,
            None => defaults.mode,
        };

        Ok(Self {
            use_existing_cluster: flag(lookup("USE_EXISTING_CLUSTER")),
            sample_path: lookup("GKO_SAMPLE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.sample_path),
            namespace: lookup("GKO_NAMESPACE").unwrap_or(defaults.namespace),
            poll: PollConfig::new(interval, timeout)?,
            context: lookup("GKO_KUBE_CONTEXT").filter(|c| !c.is_empty()),
            allow_existing: flag(lookup("GKO_ALLOW_EXISTING")),
            mode,
        })
    }
}

fn flag(value: Option<String>) -> bool {
    value
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn default_sample_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .join(SAMPLE_PATH)
}

/// Result of a suite run.
#[derive(Debug)]
pub enum SuiteOutcome {
    /// The cluster gate was off; nothing ran.
    Skipped,

    /// The sample installed and every component converged.
    Passed(InstallReport),
}

impl SuiteOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }
}

/// Submit the sample Gatekeeper and wait for its Deployments.
pub async fn run_install_suite<A, F>(config: &E2eConfig, api: A, fetcher: F) -> Result<SuiteOutcome>
where
    A: GatekeeperApi,
    F: ObjectFetcher<DeploymentObservation>,
{
    if !config.use_existing_cluster {
        info!("USE_EXISTING_CLUSTER is not true, skipping install suite");
        return Ok(SuiteOutcome::Skipped);
    }

    let desired = load_from_path(&config.sample_path)
        .with_context(|| format!("Failed to load {}", config.sample_path.display()))?;

    let check = InstallCheck::new(api, Poller::new(fetcher, config.poll), &config.namespace)
        .with_mode(config.mode)
        .allow_existing(config.allow_existing);
    let report = check
        .run(&desired)
        .await
        .context("Gatekeeper install did not converge")?;

    info!(
        name = %report.name,
        slowest_ms = report.slowest().as_millis() as u64,
        "Install suite passed"
    );
    Ok(SuiteOutcome::Passed(report))
}

/// Run the install suite against the cluster the config points at.
pub async fn run_live(config: &E2eConfig) -> Result<SuiteOutcome> {
    if !config.use_existing_cluster {
        info!("USE_EXISTING_CLUSTER is not true, skipping install suite");
        return Ok(SuiteOutcome::Skipped);
    }

    let client = connect(&ClusterConfig {
        context: config.context.clone(),
        read_timeout: Some(config.poll.timeout),
    })
    .await
    .context("Failed to connect to the cluster")?;

    run_install_suite(
        config,
        KubeGatekeepers::new(client.clone()),
        KubeDeployments::new(client),
    )
    .await
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use gko_converge::{FetchError, FetchStep, ObjectIdentity, ScriptedFetcher};
    use gko_gatekeeper::{Component, MockGatekeeperApi, MockResponse};
    use rstest::rstest;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[rstest]
    #[case(None, false)]
    #[case(Some("true"), true)]
    #[case(Some("TRUE"), true)]
    #[case(Some("True"), true)]
    #[case(Some("1"), false)]
    #[case(Some("yes"), false)]
    #[case(Some(""), false)]
    fn test_cluster_gate(#[case] value: Option<&str>, #[case] expected: bool) {
        let vars: Vec<(&str, &str)> = value
            .map(|v| vec![("USE_EXISTING_CLUSTER", v)])
            .unwrap_or_default();
        let config = E2eConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.use_existing_cluster, expected);
    }

    #[test]
    fn test_defaults() {
        let config = E2eConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.namespace, DEFAULT_NAMESPACE);
        assert_eq!(config.poll.interval, Duration::from_millis(50));
        assert_eq!(config.poll.timeout, Duration::from_secs(30));
        assert!(config.context.is_none());
        assert!(config.sample_path.ends_with(SAMPLE_PATH));
        assert_eq!(config.mode, ReadinessMode::MatchSpec);
    }

    #[rstest]
    #[case("minimum", ReadinessMode::Minimum)]
    #[case("at-least=2", ReadinessMode::AtLeast(2))]
    #[case("match-spec", ReadinessMode::MatchSpec)]
    fn test_readiness_mode(#[case] value: &str, #[case] expected: ReadinessMode) {
        let config = E2eConfig::from_lookup(lookup(&[("GKO_READINESS_MODE", value)])).unwrap();
        assert_eq!(config.mode, expected);
    }

    #[test]
    fn test_overrides() {
        let config = E2eConfig::from_lookup(lookup(&[
            ("GKO_NAMESPACE", "policy"),
            ("GKO_POLL_INTERVAL_MS", "200"),
            ("GKO_WAIT_TIMEOUT_SECS", "120"),
            ("GKO_KUBE_CONTEXT", "kind-gatekeeper"),
            ("GKO_SAMPLE_PATH", "/tmp/gk.yaml"),
        ]))
        .unwrap();
        assert_eq!(config.namespace, "policy");
        assert_eq!(config.poll.interval, Duration::from_millis(200));
        assert_eq!(config.poll.timeout, Duration::from_secs(120));
        assert_eq!(config.context.as_deref(), Some("kind-gatekeeper"));
        assert_eq!(config.sample_path, PathBuf::from("/tmp/gk.yaml"));
    }

    #[rstest]
    #[case("GKO_POLL_INTERVAL_MS", "fast")]
    #[case("GKO_POLL_INTERVAL_MS", "0")]
    #[case("GKO_WAIT_TIMEOUT_SECS", "-1")]
    #[case("GKO_READINESS_MODE", "eventually")]
    fn test_bad_values_rejected(#[case] key: &str, #[case] value: &str) {
        assert!(E2eConfig::from_lookup(lookup(&[(key, value)])).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_off_never_touches_cluster() {
        let api = Arc::new(MockGatekeeperApi::new());
        let fetcher = Arc::new(ScriptedFetcher::<DeploymentObservation>::never_found());

        let outcome = run_install_suite(&E2eConfig::default(), api.clone(), fetcher.clone())
            .await
            .unwrap();

        assert!(outcome.is_skipped());
        assert!(api.created().is_empty());
        assert_eq!(fetcher.calls(), 0);
    }

    /// Scripted fetcher per Deployment.
    struct Keyed(HashMap<ObjectIdentity, ScriptedFetcher<DeploymentObservation>>);

    #[async_trait::async_trait]
    impl ObjectFetcher<DeploymentObservation> for Keyed {
        async fn fetch(
            &self,
            identity: &ObjectIdentity,
        ) -> Result<DeploymentObservation, FetchError> {
            match self.0.get(identity) {
                Some(script) => script.fetch(identity).await,
                None => Err(FetchError::NotFound(identity.clone())),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_on_installs_sample() {
        let config = E2eConfig {
            use_existing_cluster: true,
            ..Default::default()
        };
        let api = Arc::new(MockGatekeeperApi::new());
        let fetcher = Keyed(HashMap::from([
            (
                Component::ControllerManager.identity(DEFAULT_NAMESPACE),
                ScriptedFetcher::new([
                    FetchStep::NotFound,
                    FetchStep::Found(DeploymentObservation::ready(1)),
                    FetchStep::Found(DeploymentObservation::ready(3)),
                ]),
            ),
            (
                Component::Audit.identity(DEFAULT_NAMESPACE),
                ScriptedFetcher::appears_after(1, DeploymentObservation::ready(1)),
            ),
        ]));

        let outcome = run_install_suite(&config, api.clone(), fetcher).await.unwrap();

        let SuiteOutcome::Passed(report) = outcome else {
            panic!("expected the suite to run");
        };
        assert_eq!(report.components.len(), 2);
        assert_eq!(report.components[0].attempts, 3);
        assert_eq!(report.components[1].attempts, 2);
        assert_eq!(api.created().len(), 1);
        assert_eq!(api.created()[0].namespace(), Some(DEFAULT_NAMESPACE));
    }

    #[tokio::test(start_paused = true)]
    async fn test_minimum_mode_accepts_surplus_replicas() {
        let config = E2eConfig {
            use_existing_cluster: true,
            mode: ReadinessMode::Minimum,
            ..Default::default()
        };
        let fetcher = Keyed(HashMap::from([
            (
                Component::ControllerManager.identity(DEFAULT_NAMESPACE),
                ScriptedFetcher::observations([DeploymentObservation::ready(4)]),
            ),
            (
                Component::Audit.identity(DEFAULT_NAMESPACE),
                ScriptedFetcher::observations([DeploymentObservation::ready(1)]),
            ),
        ]));

        let outcome = run_install_suite(&config, MockGatekeeperApi::new(), fetcher)
            .await
            .unwrap();

        let SuiteOutcome::Passed(report) = outcome else {
            panic!("expected the suite to run");
        };
        assert_eq!(report.components[0].rule, "ready_replicas >= 3");
        assert_eq!(report.components[0].ready_replicas, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_submission_fails_suite() {
        let config = E2eConfig {
            use_existing_cluster: true,
            ..Default::default()
        };
        let api = MockGatekeeperApi::responding(MockResponse::Reject {
            code: 422,
            message: "spec.webhook.replicas: Invalid value".to_string(),
        });
        let fetcher = Arc::new(ScriptedFetcher::<DeploymentObservation>::never_found());

        let err = run_install_suite(&config, api, fetcher.clone())
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("Invalid value"));
        assert_eq!(fetcher.calls(), 0);
    }
}

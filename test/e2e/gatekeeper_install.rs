//! End-to-end install test against an existing cluster.
//!
//! Requires a cluster with the Gatekeeper operator deployed. Without
//! `USE_EXISTING_CLUSTER=true` the test passes without doing anything.
//!
//! ## Running
//!
//! ```bash
//! USE_EXISTING_CLUSTER=true cargo test -p gko-e2e --test gatekeeper_install -- --nocapture
//! ```

use gko_e2e::{run_live, E2eConfig, SuiteOutcome};
use gko_gatekeeper::Component;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("gko_converge=debug,gko_gatekeeper=debug,gko_e2e=debug,info")
        .with_test_writer()
        .try_init();
}

#[tokio::test]
async fn gatekeeper_install_converges() {
    init_tracing();

    let config = E2eConfig::from_env().unwrap();
    let outcome = run_live(&config).await.unwrap();

    match outcome {
        SuiteOutcome::Skipped => {
            eprintln!("skipping: USE_EXISTING_CLUSTER is not true");
        }
        SuiteOutcome::Passed(report) => {
            assert_eq!(report.namespace, config.namespace);
            let components: Vec<_> = report.components.iter().map(|c| c.component).collect();
            assert_eq!(components, Component::ALL.to_vec());
            for component in &report.components {
                assert!(component.ready_replicas > 0, "{component:?}");
            }
        }
    }
}

//! Gatekeeper resource writes.

use async_trait::async_trait;
use gko_gatekeeper::types::{API_GROUP, KIND, PLURAL};
use gko_gatekeeper::{Gatekeeper, GatekeeperApi, SubmitError};
use kube::api::{Api, ApiResource, DynamicObject, PostParams};
use kube::core::GroupVersionKind;
use kube::Client;
use tracing::info;

const VERSION: &str = "v1alpha1";

/// Creates `Gatekeeper` resources through the Kubernetes API.
#[derive(Clone)]
pub struct KubeGatekeepers {
    client: Client,
}

impl KubeGatekeepers {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GatekeeperApi for KubeGatekeepers {
    async fn create(&self, gatekeeper: &Gatekeeper) -> Result<(), SubmitError> {
        let resource = api_resource();
        let object = to_dynamic(gatekeeper, &resource).map_err(|err| SubmitError::Transport {
            name: gatekeeper.name().to_string(),
            source: Box::new(err),
        })?;

        let api: Api<DynamicObject> = match gatekeeper.namespace() {
            Some(namespace) => Api::namespaced_with(self.client.clone(), namespace, &resource),
            None => Api::all_with(self.client.clone(), &resource),
        };

        api.create(&PostParams::default(), &object)
            .await
            .map_err(|err| classify(gatekeeper.name(), err))?;

        info!(name = %gatekeeper.name(), "Gatekeeper resource created");
        Ok(())
    }
}

/// API resource for `operator.gatekeeper.sh/v1alpha1, Kind=Gatekeeper`.
pub fn api_resource() -> ApiResource {
    let gvk = GroupVersionKind::gvk(API_GROUP, VERSION, KIND);
    ApiResource::from_gvk_with_plural(&gvk, PLURAL)
}

/// Render the desired state as a dynamic object.
pub fn to_dynamic(
    gatekeeper: &Gatekeeper,
    resource: &ApiResource,
) -> Result<DynamicObject, serde_json::Error> {
    let spec = serde_json::to_value(&gatekeeper.spec)?;
    let mut object =
        DynamicObject::new(gatekeeper.name(), resource).data(serde_json::json!({ "spec": spec }));

    let meta = &gatekeeper.metadata;
    object.metadata.namespace = meta.namespace.clone();
    if !meta.labels.is_empty() {
        object.metadata.labels = Some(meta.labels.clone());
    }
    if !meta.annotations.is_empty() {
        object.metadata.annotations = Some(meta.annotations.clone());
    }

    Ok(object)
}

/// 409 means the resource exists; other 4xx are rejections.
pub fn classify(name: &str, err: kube::Error) -> SubmitError {
    match err {
        kube::Error::Api(ae) if ae.code == 409 => SubmitError::AlreadyExists(name.to_string()),
        kube::Error::Api(ae) if (400..500).contains(&ae.code) => SubmitError::Rejected {
            name: name.to_string(),
            code: ae.code,
            message: ae.message,
        },
        err => SubmitError::Transport {
            name: name.to_string(),
            source: Box::new(err),
        },
    }
}

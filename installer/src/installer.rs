/*
Copyright 2024 The Kubernetes Authors.

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use std::time::Instant;

use k8s_openapi::api::{apps::v1::Deployment, core::v1::Service, networking::v1::Ingress};
use tracing::{debug, info, info_span, Instrument};

use crate::{
    cluster::{ClusterAccessor, KubeAccessor},
    manifest::GatewayManifest,
    AppKind, Config, Environment, Error, Operation, ResourceKind, Result,
};

/// One install call: which application instance to converge, and how.
#[derive(Clone, Copy, Debug)]
pub struct GatewayInstallRequest<'a> {
    pub kind: AppKind,
    pub slug: &'a str,
    pub env: &'a Environment,
    pub config: &'a Config,
}

/// Converges the Deployment, Service and Ingress of an application instance
/// toward the state described by a [`GatewayInstallRequest`].
///
/// The installer keeps no state between calls; the cluster is the only
/// record. Errors are returned on first failure without rolling back what was
/// already applied, so calling `install` again is the way to recover.
pub struct GatewayInstaller<C> {
    cluster: C,
}

impl<C> GatewayInstaller<C>
where
    C: ClusterAccessor<Deployment> + ClusterAccessor<Service> + ClusterAccessor<Ingress>,
{
    pub fn new(cluster: C) -> Self {
        GatewayInstaller { cluster }
    }

    pub async fn install(&self, request: &GatewayInstallRequest<'_>) -> Result<()> {
        let span = info_span!("install", kind = %request.kind, slug = request.slug);
        self.install_resources(request).instrument(span).await
    }

    async fn install_resources(&self, request: &GatewayInstallRequest<'_>) -> Result<()> {
        let start = Instant::now();
        // Validates the image and slug before anything reaches the cluster.
        let manifest =
            GatewayManifest::new(request.kind, request.slug, request.env, request.config)?;

        self.reconcile(
            ResourceKind::Deployment,
            manifest.resource_name(),
            manifest.deployment(),
            merge_deployment,
        )
        .await?;
        self.reconcile(
            ResourceKind::Service,
            manifest.resource_name(),
            manifest.service(),
            merge_service,
        )
        .await?;
        self.reconcile(
            ResourceKind::Ingress,
            manifest.ingress_name(),
            manifest.ingress(),
            merge_ingress,
        )
        .await?;

        info!("finished installing in {} ms", start.elapsed().as_millis());
        Ok(())
    }

    // Creates `desired` if the object is missing. Otherwise merges the fields
    // the installer owns into the live object and writes it back, skipping
    // the write when nothing changed.
    async fn reconcile<K>(
        &self,
        kind: ResourceKind,
        name: &str,
        desired: K,
        merge: fn(&mut K, &K) -> bool,
    ) -> Result<()>
    where
        C: ClusterAccessor<K>,
        K: Send + Sync + 'static,
    {
        let existing = ClusterAccessor::<K>::get(&self.cluster, name)
            .await
            .map_err(cluster_error(kind, Operation::Get, name))?;

        match existing {
            None => {
                info!("creating {kind} {name}");
                ClusterAccessor::<K>::create(&self.cluster, &desired)
                    .await
                    .map_err(cluster_error(kind, Operation::Create, name))?;
            }
            Some(mut live) => {
                if merge(&mut live, &desired) {
                    info!("drift detected; updating {kind} {name}");
                    ClusterAccessor::<K>::update(&self.cluster, name, &live)
                        .await
                        .map_err(cluster_error(kind, Operation::Update, name))?;
                } else {
                    debug!("{kind} {name} is up to date");
                }
            }
        }
        Ok(())
    }
}

fn cluster_error(
    kind: ResourceKind,
    operation: Operation,
    name: &str,
) -> impl FnOnce(kube::Error) -> Error + '_ {
    move |source| Error::ClusterOperation {
        kind,
        operation,
        name: name.to_string(),
        source,
    }
}

/// Installs or updates an application instance on the cluster described by
/// `config`.
///
/// The image is checked before a client is even built, so a bad config never
/// reaches the cluster.
pub async fn install(
    kind: AppKind,
    slug: &str,
    env: &Environment,
    config: &Config,
) -> Result<()> {
    config.image_for(kind)?;
    let client = config.client().await?;
    let installer = GatewayInstaller::new(KubeAccessor::new(client, &config.namespace));
    installer
        .install(&GatewayInstallRequest {
            kind,
            slug,
            env,
            config,
        })
        .await
}

// Sets the image and replaces the env list of the application container in
// the live Deployment. Returns true if the Deployment was modified.
pub(crate) fn merge_deployment(live: &mut Deployment, desired: &Deployment) -> bool {
    let Some(container) = desired
        .spec
        .as_ref()
        .and_then(|spec| spec.template.spec.as_ref())
        .and_then(|pod| pod.containers.first())
    else {
        return false;
    };

    let pod = live
        .spec
        .get_or_insert_with(Default::default)
        .template
        .spec
        .get_or_insert_with(Default::default);

    let Some(current) = pod.containers.iter_mut().find(|c| c.name == container.name) else {
        pod.containers.push(container.clone());
        return true;
    };

    let mut updated = false;
    if current.image != container.image {
        current.image.clone_from(&container.image);
        updated = true;
    }
    // the API server omits an empty env list
    if current.env.as_deref().unwrap_or_default() != container.env.as_deref().unwrap_or_default()
    {
        current.env.clone_from(&container.env);
        updated = true;
    }
    updated
}

// Corrects drift in the Service's selector and ports. Returns true if the
// Service was modified.
pub(crate) fn merge_service(live: &mut Service, desired: &Service) -> bool {
    let Some(desired_spec) = desired.spec.as_ref() else {
        return false;
    };
    let spec = live.spec.get_or_insert_with(Default::default);

    let mut updated = false;
    if spec.selector != desired_spec.selector {
        spec.selector.clone_from(&desired_spec.selector);
        updated = true;
    }

    let ports = spec.ports.as_deref().unwrap_or_default();
    let desired_ports = desired_spec.ports.as_deref().unwrap_or_default();
    let ports_differ = ports.len() != desired_ports.len()
        || ports.iter().zip(desired_ports).any(|(p1, p2)| {
            p1.name != p2.name
                || p1.port != p2.port
                || p1.protocol != p2.protocol
                || p1.target_port != p2.target_port
        });
    if ports_differ {
        spec.ports.clone_from(&desired_spec.ports);
        updated = true;
    }
    updated
}

// Corrects drift in the Ingress rules, and in its class when one is
// configured. Returns true if the Ingress was modified.
pub(crate) fn merge_ingress(live: &mut Ingress, desired: &Ingress) -> bool {
    let Some(desired_spec) = desired.spec.as_ref() else {
        return false;
    };
    let spec = live.spec.get_or_insert_with(Default::default);

    let mut updated = false;
    if desired_spec.ingress_class_name.is_some()
        && spec.ingress_class_name != desired_spec.ingress_class_name
    {
        spec.ingress_class_name.clone_from(&desired_spec.ingress_class_name);
        updated = true;
    }
    if spec.rules != desired_spec.rules {
        spec.rules.clone_from(&desired_spec.rules);
        updated = true;
    }
    updated
}

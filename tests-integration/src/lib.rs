/*
Copyright 2025 The Kubernetes Authors.

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

//! [`tests_integration`](`crate`) verifies gateway installs against a live
//! cluster.
//!
//! The cluster is reached through the kubeconfig named by
//! [`KUBECONFIG_ENV`], and resources land in the namespace named by
//! `GATEWAY_INSTALLER_NAMESPACE` (`default` when unset). Tests are meant to
//! be skipped when no kubeconfig is given.

use std::env;
use std::path::PathBuf;

use installer::{make_ingress_name, make_resource_name, AppKind, Config, Environment};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use kube::{Api, Client};
use thiserror::Error as ThisError;

/// Environment variable holding the kubeconfig path of the test cluster.
pub const KUBECONFIG_ENV: &str = "GATEWAY_INSTALLER_KUBECONFIG";

/// Result typed used within the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors for the [`tests_integration`](`crate`) crate.
#[derive(ThisError, Debug)]
pub enum Error {
    /// Error originating from the installer itself.
    #[error(transparent)]
    Installer(#[from] installer::Error),
    /// Error originating from reading a resource back.
    #[error("cannot get {0}: {1}")]
    Get(String, #[source] kube::Error),
    /// An observed resource doesn't match what the install should produce.
    #[error("Expected: {expected}\nActual: {actual}")]
    Mismatch { expected: String, actual: String },
}

impl Error {
    fn mismatch<E: ToString, A: ToString>(expected: E, actual: A) -> Self {
        Error::Mismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

/// Test cluster connection, built from [`KUBECONFIG_ENV`].
pub struct TestCluster {
    pub config: Config,
    client: Client,
}

impl TestCluster {
    /// Returns `None` when no test cluster is configured.
    pub async fn from_env() -> Result<Option<Self>> {
        let Some(kubeconfig) = env::var_os(KUBECONFIG_ENV) else {
            return Ok(None);
        };
        let mut config = Config {
            kubeconfig_path: Some(PathBuf::from(kubeconfig)),
            ..Default::default()
        };
        if let Ok(namespace) = env::var("GATEWAY_INSTALLER_NAMESPACE") {
            config.namespace = namespace;
        }
        let client = config.client().await?;
        Ok(Some(TestCluster { config, client }))
    }

    fn api<K>(&self) -> Api<K>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        <K as kube::Resource>::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), &self.config.namespace)
    }

    pub async fn deployment(&self, slug: &str) -> Result<Deployment> {
        let name = make_resource_name(AppKind::Gateway, slug)?;
        self.api::<Deployment>()
            .get(&name)
            .await
            .map_err(|e| Error::Get(format!("deployment {name}"), e))
    }

    pub async fn service(&self, slug: &str) -> Result<Service> {
        let name = make_resource_name(AppKind::Gateway, slug)?;
        self.api::<Service>()
            .get(&name)
            .await
            .map_err(|e| Error::Get(format!("service {name}"), e))
    }

    pub async fn ingress(&self, slug: &str) -> Result<Ingress> {
        let name = make_ingress_name(AppKind::Gateway, slug)?;
        self.api::<Ingress>()
            .get(&name)
            .await
            .map_err(|e| Error::Get(format!("ingress {name}"), e))
    }

    pub async fn assert_deployment_exists(&self, slug: &str) -> Result<()> {
        let deployment = self.deployment(slug).await?;
        assert_name(
            &format!("{}-{slug}", AppKind::Gateway),
            deployment.metadata.name.as_deref(),
        )
    }

    pub async fn assert_service_exists(&self, slug: &str) -> Result<()> {
        let service = self.service(slug).await?;
        assert_name(
            &format!("{}-{slug}", AppKind::Gateway),
            service.metadata.name.as_deref(),
        )
    }

    pub async fn assert_ingress_exists(&self, slug: &str) -> Result<()> {
        let ingress = self.ingress(slug).await?;
        assert_name(
            &make_ingress_name(AppKind::Gateway, slug)?,
            ingress.metadata.name.as_deref(),
        )
    }

    /// Checks that the gateway container runs the configured image with
    /// exactly the env list rendered from `env`.
    pub async fn assert_deployment_updated(&self, slug: &str, env: &Environment) -> Result<()> {
        let deployment = self.deployment(slug).await?;
        let container = deployment
            .spec
            .and_then(|spec| spec.template.spec)
            .and_then(|pod| {
                pod.containers
                    .into_iter()
                    .find(|c| c.name == AppKind::Gateway.as_str())
            })
            .ok_or_else(|| Error::mismatch("a gateway container", "none"))?;

        let image = self.config.image_for(AppKind::Gateway)?;
        if container.image.as_deref() != Some(image) {
            return Err(Error::mismatch(image, format!("{:?}", container.image)));
        }

        let expected = env.to_env_vars();
        let actual = container.env.unwrap_or_default();
        if actual != expected {
            return Err(Error::mismatch(
                format!("{expected:?}"),
                format!("{actual:?}"),
            ));
        }
        Ok(())
    }
}

fn assert_name(expected: &str, actual: Option<&str>) -> Result<()> {
    match actual {
        Some(actual) if actual == expected => Ok(()),
        actual => Err(Error::mismatch(expected, actual.unwrap_or_default())),
    }
}

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

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use kube::{
    config::{KubeConfigOptions, Kubeconfig},
    Client,
};
use serde::Deserialize;
use tracing::debug;

use crate::{consts::DEFAULT_NAMESPACE, AppKind, Error, Result};

/// Connection parameters and image references for an install.
///
/// The installer only ever reads a `Config`.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Config {
    /// Kubeconfig to connect with. Falls back to the in-cluster or default
    /// kubeconfig when unset.
    pub kubeconfig_path: Option<PathBuf>,
    pub namespace: String,
    pub gateway_image: Option<String>,
    /// When set, the Ingress routes `<slug>.<ingress_domain>`; otherwise it
    /// matches every host.
    pub ingress_domain: Option<String>,
    pub ingress_class: Option<String>,
    /// Per-request read timeout, in seconds, for the cluster client.
    pub read_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            kubeconfig_path: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
            gateway_image: None,
            ingress_domain: None,
            ingress_class: None,
            read_timeout_secs: None,
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents).map_err(|source| Error::ConfigFile {
            path: path.to_owned(),
            source,
        })
    }

    /// Returns the image configured for `kind`, failing if none is set.
    pub fn image_for(&self, kind: AppKind) -> Result<&str> {
        let image = match kind {
            AppKind::Gateway => self.gateway_image.as_deref(),
        };
        image
            .map(str::trim)
            .filter(|image| !image.is_empty())
            .ok_or_else(|| Error::Configuration(format!("Config has no {kind} image defined")))
    }

    /// Builds a cluster client from the configured kubeconfig, or from the
    /// environment when no path is given.
    pub async fn client(&self) -> Result<Client> {
        let mut config = match &self.kubeconfig_path {
            Some(path) => {
                debug!("loading kubeconfig from {}", path.display());
                let kubeconfig = Kubeconfig::read_from(path)
                    .map_err(|e| Error::KubeConfig(format!("failed to read kubeconfig: {e}")))?;
                kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await
                    .map_err(|e| Error::KubeConfig(format!("failed to load kubeconfig: {e}")))?
            }
            None => kube::Config::infer()
                .await
                .map_err(|e| Error::KubeConfig(format!("failed to infer kubeconfig: {e}")))?,
        };
        if let Some(secs) = self.read_timeout_secs {
            config.read_timeout = Some(Duration::from_secs(secs));
        }
        Client::try_from(config)
            .map_err(|e| Error::KubeConfig(format!("failed to create client: {e}")))
    }
}

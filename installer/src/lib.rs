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

use std::{fmt, path::PathBuf};

use thiserror::Error;

pub use cluster::{ClusterAccessor, KubeAccessor};
pub use config::Config;
pub use env::{parse_env_pair, Environment};
pub use installer::{install, GatewayInstallRequest, GatewayInstaller};
pub use naming::{make_ingress_name, make_resource_name};

pub mod cluster;
pub mod config;
pub mod consts;
pub mod env;
mod installer;
pub mod manifest;
pub mod naming;

#[cfg(test)]
mod fake;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("invalid slug: the application slug must not be empty")]
    InvalidSlug,
    #[error("failed to {operation} {kind} `{name}`: {source}")]
    ClusterOperation {
        kind: ResourceKind,
        operation: Operation,
        name: String,
        #[source]
        source: kube::Error,
    },
    #[error("kubeconfig error: {0}")]
    KubeConfig(String),
    #[error("failed to parse config file {path:?}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Application archetypes sharing the gateway install pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum AppKind {
    Gateway,
}

impl AppKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppKind::Gateway => "gateway",
        }
    }
}

impl fmt::Display for AppKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The cluster resources managed for every application instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Deployment,
    Service,
    Ingress,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceKind::Deployment => "Deployment",
            ResourceKind::Service => "Service",
            ResourceKind::Ingress => "Ingress",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Get,
    Create,
    Update,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Update => "update",
        })
    }
}

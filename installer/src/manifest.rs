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

//! Desired-state manifests for the resources backing one application
//! instance. Building a manifest never reads from the cluster.

use std::collections::BTreeMap;

use k8s_openapi::{
    api::{
        apps::v1::{Deployment, DeploymentSpec},
        core::v1::{
            Container, ContainerPort, PodSpec, PodTemplateSpec, Service, ServicePort, ServiceSpec,
        },
        networking::v1::{
            HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
            IngressServiceBackend, IngressSpec, ServiceBackendPort,
        },
    },
    apimachinery::pkg::{apis::meta::v1::LabelSelector, util::intstr::IntOrString},
};
use kube::core::ObjectMeta;

use crate::{
    consts::{
        CONTAINER_PORT, DEFAULT_REPLICAS, FIELD_MANAGER, HTTP_PORT_NAME, INSTANCE_LABEL,
        MANAGED_BY_LABEL, NAME_LABEL, SERVICE_PORT,
    },
    naming::{make_ingress_name, make_resource_name},
    AppKind, Config, Environment, Result,
};

/// Everything needed to render the manifests of one application instance.
pub struct GatewayManifest<'a> {
    kind: AppKind,
    slug: &'a str,
    name: String,
    ingress_name: String,
    image: &'a str,
    env: &'a Environment,
    namespace: &'a str,
    ingress_domain: Option<&'a str>,
    ingress_class: Option<&'a str>,
}

impl<'a> GatewayManifest<'a> {
    /// Fails if the slug is empty or `config` has no image for `kind`.
    pub fn new(
        kind: AppKind,
        slug: &'a str,
        env: &'a Environment,
        config: &'a Config,
    ) -> Result<Self> {
        let image = config.image_for(kind)?;
        Ok(GatewayManifest {
            kind,
            slug,
            name: make_resource_name(kind, slug)?,
            ingress_name: make_ingress_name(kind, slug)?,
            image,
            env,
            namespace: config.namespace.as_str(),
            ingress_domain: config.ingress_domain.as_deref(),
            ingress_class: config.ingress_class.as_deref(),
        })
    }

    /// Name of the Deployment and the Service.
    pub fn resource_name(&self) -> &str {
        &self.name
    }

    pub fn ingress_name(&self) -> &str {
        &self.ingress_name
    }

    /// Labels the Deployment selects its pods by and the Service routes to.
    pub fn selector_labels(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (NAME_LABEL.to_string(), self.kind.to_string()),
            (INSTANCE_LABEL.to_string(), self.slug.to_string()),
        ])
    }

    fn labels(&self) -> BTreeMap<String, String> {
        let mut labels = self.selector_labels();
        labels.insert(MANAGED_BY_LABEL.to_string(), FIELD_MANAGER.to_string());
        labels
    }

    fn metadata(&self, name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(self.namespace.to_string()),
            labels: Some(self.labels()),
            ..Default::default()
        }
    }

    /// The single application container. Its name is the kind.
    pub fn container(&self) -> Container {
        Container {
            name: self.kind.to_string(),
            image: Some(self.image.to_string()),
            env: Some(self.env.to_env_vars()),
            ports: Some(vec![ContainerPort {
                name: Some(HTTP_PORT_NAME.to_string()),
                container_port: CONTAINER_PORT,
                protocol: Some("TCP".to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        }
    }

    pub fn deployment(&self) -> Deployment {
        Deployment {
            metadata: self.metadata(&self.name),
            spec: Some(DeploymentSpec {
                replicas: Some(DEFAULT_REPLICAS),
                selector: LabelSelector {
                    match_labels: Some(self.selector_labels()),
                    ..Default::default()
                },
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(self.labels()),
                        ..Default::default()
                    }),
                    spec: Some(PodSpec {
                        containers: vec![self.container()],
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn service(&self) -> Service {
        Service {
            metadata: self.metadata(&self.name),
            spec: Some(ServiceSpec {
                type_: Some("ClusterIP".to_string()),
                selector: Some(self.selector_labels()),
                ports: Some(vec![ServicePort {
                    name: Some(HTTP_PORT_NAME.to_string()),
                    port: SERVICE_PORT,
                    target_port: Some(IntOrString::String(HTTP_PORT_NAME.to_string())),
                    protocol: Some("TCP".to_string()),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn ingress(&self) -> Ingress {
        let host = self
            .ingress_domain
            .map(|domain| format!("{}.{}", self.slug, domain.trim_start_matches('.')));

        Ingress {
            metadata: self.metadata(&self.ingress_name),
            spec: Some(IngressSpec {
                ingress_class_name: self.ingress_class.map(str::to_string),
                rules: Some(vec![IngressRule {
                    host,
                    http: Some(HTTPIngressRuleValue {
                        paths: vec![HTTPIngressPath {
                            path: Some("/".to_string()),
                            path_type: "Prefix".to_string(),
                            backend: IngressBackend {
                                service: Some(IngressServiceBackend {
                                    name: self.name.clone(),
                                    port: Some(ServiceBackendPort {
                                        name: Some(HTTP_PORT_NAME.to_string()),
                                        ..Default::default()
                                    }),
                                }),
                                ..Default::default()
                            },
                        }],
                    }),
                }]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

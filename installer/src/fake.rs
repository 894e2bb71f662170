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

//! In-memory stand-in for the cluster API, recording every call made to it.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use k8s_openapi::api::{apps::v1::Deployment, core::v1::Service, networking::v1::Ingress};
use kube::Resource;

use crate::{cluster::ClusterAccessor, Operation, ResourceKind};

pub trait FakeObject: Resource + Clone + Send + Sync + 'static {
    const KIND: ResourceKind;

    fn store(cluster: &FakeCluster) -> &Mutex<BTreeMap<String, Self>>;

    // Fields the API server fills in on create.
    fn server_defaults(&mut self) {}
}

impl FakeObject for Deployment {
    const KIND: ResourceKind = ResourceKind::Deployment;

    fn store(cluster: &FakeCluster) -> &Mutex<BTreeMap<String, Self>> {
        &cluster.deployments
    }
}

impl FakeObject for Service {
    const KIND: ResourceKind = ResourceKind::Service;

    fn store(cluster: &FakeCluster) -> &Mutex<BTreeMap<String, Self>> {
        &cluster.services
    }

    fn server_defaults(&mut self) {
        if let Some(spec) = self.spec.as_mut() {
            spec.cluster_ip = Some("10.96.0.42".to_string());
            spec.cluster_ips = Some(vec!["10.96.0.42".to_string()]);
        }
    }
}

impl FakeObject for Ingress {
    const KIND: ResourceKind = ResourceKind::Ingress;

    fn store(cluster: &FakeCluster) -> &Mutex<BTreeMap<String, Self>> {
        &cluster.ingresses
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub kind: ResourceKind,
    pub operation: Operation,
    pub name: String,
}

impl Call {
    pub fn new(kind: ResourceKind, operation: Operation, name: &str) -> Self {
        Call {
            kind,
            operation,
            name: name.to_string(),
        }
    }
}

#[derive(Default)]
pub struct FakeCluster {
    deployments: Mutex<BTreeMap<String, Deployment>>,
    services: Mutex<BTreeMap<String, Service>>,
    ingresses: Mutex<BTreeMap<String, Ingress>>,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<Vec<(ResourceKind, Operation)>>,
    version: AtomicU64,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later `operation` on `kind` fail with a 500.
    pub fn fail_on(&self, kind: ResourceKind, operation: Operation) {
        self.failures.lock().unwrap().push((kind, operation));
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.operation != Operation::Get)
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn object<K: FakeObject>(&self, name: &str) -> Option<K> {
        K::store(self).lock().unwrap().get(name).cloned()
    }

    pub fn count<K: FakeObject>(&self) -> usize {
        K::store(self).lock().unwrap().len()
    }

    /// Changes a stored object behind the installer's back, the way another
    /// writer such as an autoscaler would.
    pub fn modify<K: FakeObject>(&self, name: &str, f: impl FnOnce(&mut K)) {
        let mut store = K::store(self).lock().unwrap();
        let object = store.get_mut(name).expect("object to modify must exist");
        f(object);
        object.meta_mut().resource_version = Some(self.next_version());
    }

    fn next_version(&self) -> String {
        (self.version.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    fn record(
        &self,
        kind: ResourceKind,
        operation: Operation,
        name: &str,
    ) -> Result<(), kube::Error> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::new(kind, operation, name));
        if self.failures.lock().unwrap().contains(&(kind, operation)) {
            return Err(api_error(500, "InternalError", "injected failure"));
        }
        Ok(())
    }
}

pub fn api_error(code: u16, reason: &str, message: &str) -> kube::Error {
    kube::Error::Api(kube::core::ErrorResponse {
        status: "Failure".to_string(),
        message: message.to_string(),
        reason: reason.to_string(),
        code,
    })
}

#[async_trait]
impl<K: FakeObject> ClusterAccessor<K> for FakeCluster {
    async fn get(&self, name: &str) -> Result<Option<K>, kube::Error> {
        self.record(K::KIND, Operation::Get, name)?;
        Ok(self.object(name))
    }

    async fn create(&self, resource: &K) -> Result<K, kube::Error> {
        let name = resource.meta().name.clone().unwrap_or_default();
        self.record(K::KIND, Operation::Create, &name)?;

        let mut store = K::store(self).lock().unwrap();
        if store.contains_key(&name) {
            return Err(api_error(409, "AlreadyExists", "object already exists"));
        }
        let mut created = resource.clone();
        created.meta_mut().uid = Some(format!("uid-{name}"));
        created.meta_mut().resource_version = Some(self.next_version());
        created.server_defaults();
        store.insert(name, created.clone());
        Ok(created)
    }

    async fn update(&self, name: &str, resource: &K) -> Result<K, kube::Error> {
        self.record(K::KIND, Operation::Update, name)?;

        let mut store = K::store(self).lock().unwrap();
        let Some(current) = store.get(name) else {
            return Err(api_error(404, "NotFound", "object not found"));
        };
        if current.meta().resource_version != resource.meta().resource_version {
            return Err(api_error(409, "Conflict", "the object has been modified"));
        }
        let mut updated = resource.clone();
        updated.meta_mut().resource_version = Some(self.next_version());
        store.insert(name.to_string(), updated.clone());
        Ok(updated)
    }
}

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

use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use kube::{
    api::{Api, PostParams},
    Client, Resource,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::consts::FIELD_MANAGER;

/// Narrow view of the cluster API for one resource kind.
///
/// The installer never assumes transactional semantics across calls.
#[async_trait]
pub trait ClusterAccessor<K>: Send + Sync
where
    K: Send + Sync + 'static,
{
    /// Fetches the named object; a missing object is `Ok(None)`.
    async fn get(&self, name: &str) -> Result<Option<K>, kube::Error>;

    async fn create(&self, resource: &K) -> Result<K, kube::Error>;

    /// Writes back a modified copy of an object previously returned by `get`.
    /// The copy carries the resource version it was read at.
    async fn update(&self, name: &str, resource: &K) -> Result<K, kube::Error>;
}

/// [`ClusterAccessor`] backed by a live cluster, scoped to one namespace.
#[derive(Clone)]
pub struct KubeAccessor {
    client: Client,
    namespace: String,
}

impl KubeAccessor {
    pub fn new(client: Client, namespace: &str) -> Self {
        KubeAccessor {
            client,
            namespace: namespace.to_string(),
        }
    }

    fn api<K>(&self) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        <K as Resource>::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn post_params() -> PostParams {
        PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl<K> ClusterAccessor<K> for KubeAccessor
where
    K: Resource<Scope = NamespaceResourceScope>
        + Clone
        + Debug
        + DeserializeOwned
        + Serialize
        + Send
        + Sync
        + 'static,
    <K as Resource>::DynamicType: Default,
{
    async fn get(&self, name: &str) -> Result<Option<K>, kube::Error> {
        match self.api::<K>().get(name).await {
            Ok(resource) => Ok(Some(resource)),
            Err(error) if is_not_found(&error) => Ok(None),
            Err(error) => Err(error),
        }
    }

    async fn create(&self, resource: &K) -> Result<K, kube::Error> {
        self.api::<K>().create(&Self::post_params(), resource).await
    }

    async fn update(&self, name: &str, resource: &K) -> Result<K, kube::Error> {
        self.api::<K>()
            .replace(name, &Self::post_params(), resource)
            .await
    }
}

// Returns true if the provided error is a not found error.
pub fn is_not_found(error: &kube::Error) -> bool {
    matches!(
        error,
        kube::Error::Api(kube::core::ErrorResponse { code: 404, .. })
    )
}

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

//! Canonical names binding a logical application instance to its cluster
//! resources. Names must not change between install and update calls.

use crate::{consts::INGRESS_SUFFIX, AppKind, Error, Result};

/// Name shared by the Deployment and the Service: `<kind>-<slug>`.
pub fn make_resource_name(kind: AppKind, slug: &str) -> Result<String> {
    if slug.is_empty() {
        return Err(Error::InvalidSlug);
    }
    Ok(format!("{kind}-{slug}"))
}

/// Name of the Ingress: `<kind>-<slug>-ingress`.
pub fn make_ingress_name(kind: AppKind, slug: &str) -> Result<String> {
    Ok(format!("{}-{INGRESS_SUFFIX}", make_resource_name(kind, slug)?))
}

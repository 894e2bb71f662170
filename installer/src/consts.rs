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

// Field manager recorded on every object the installer writes.
pub const FIELD_MANAGER: &str = "gateway-installer";

// Namespace used when the configuration doesn't name one.
pub const DEFAULT_NAMESPACE: &str = "default";

// Recommended labels stamped on managed resources.
pub const NAME_LABEL: &str = "app.kubernetes.io/name";
pub const INSTANCE_LABEL: &str = "app.kubernetes.io/instance";
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

// Suffix appended to the resource name to form the Ingress name.
pub const INGRESS_SUFFIX: &str = "ingress";

// Name shared by the container port, the Service port and the Ingress backend.
pub const HTTP_PORT_NAME: &str = "http";

// Port the gateway container listens on.
pub const CONTAINER_PORT: i32 = 8080;

// Port exposed by the Service.
pub const SERVICE_PORT: i32 = 80;

// Replica count applied on first create only.
pub const DEFAULT_REPLICAS: i32 = 1;

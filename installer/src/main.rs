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

use std::path::PathBuf;

use clap::Parser;
use installer::{install, parse_env_pair, AppKind, Config, Environment};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Installs or updates an application instance on a Kubernetes cluster.
#[derive(Debug, Parser)]
#[clap(name = "gateway-installer", version)]
struct Options {
    /// YAML config file; flags below take precedence over its values.
    #[clap(short, long)]
    config: Option<PathBuf>,

    #[clap(long)]
    kubeconfig: Option<PathBuf>,

    #[clap(short, long)]
    namespace: Option<String>,

    /// Container image for the application.
    #[clap(long)]
    image: Option<String>,

    #[clap(long)]
    ingress_domain: Option<String>,

    #[clap(long)]
    ingress_class: Option<String>,

    #[clap(long, value_enum, default_value_t = AppKind::Gateway)]
    kind: AppKind,

    #[clap(short, long)]
    slug: String,

    /// Environment variable for the container, as KEY=VALUE. Repeatable.
    #[clap(short, long = "env", value_parser = parse_env_pair)]
    env: Vec<(String, String)>,
}

impl Options {
    fn load_config(&self) -> installer::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        if let Some(kubeconfig) = &self.kubeconfig {
            config.kubeconfig_path = Some(kubeconfig.clone());
        }
        if let Some(namespace) = &self.namespace {
            config.namespace.clone_from(namespace);
        }
        if let Some(image) = &self.image {
            match self.kind {
                AppKind::Gateway => config.gateway_image = Some(image.clone()),
            }
        }
        if let Some(domain) = &self.ingress_domain {
            config.ingress_domain = Some(domain.clone());
        }
        if let Some(class) = &self.ingress_class {
            config.ingress_class = Some(class.clone());
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = Options::parse();
    let config = opts.load_config()?;
    let env: Environment = opts.env.iter().cloned().collect();

    install(opts.kind, &opts.slug, &env, &config).await?;
    info!("{}-{} is installed", opts.kind, opts.slug);
    Ok(())
}

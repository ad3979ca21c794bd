//! Managed-service client construction
//!
//! One shared SDK configuration, loaded at cold start by the bootstrap
//! layer and fanned out into per-service clients. Handlers receive the
//! client they need at construction and never touch the environment.

use aws_config::BehaviorVersion;

/// Clients for every managed service the pipeline calls
#[derive(Clone)]
pub struct ServiceClients {
    pub glue: aws_sdk_glue::Client,
    pub sns: aws_sdk_sns::Client,
    pub sfn: aws_sdk_sfn::Client,
    pub codebuild: aws_sdk_codebuild::Client,
}

impl ServiceClients {
    /// Build all clients from the ambient SDK configuration
    pub async fn from_env() -> Self {
        let shared = aws_config::load_defaults(BehaviorVersion::latest()).await;

        Self {
            glue: aws_sdk_glue::Client::new(&shared),
            sns: aws_sdk_sns::Client::new(&shared),
            sfn: aws_sdk_sfn::Client::new(&shared),
            codebuild: aws_sdk_codebuild::Client::new(&shared),
        }
    }
}

use async_trait::async_trait;
use aws_sdk_ssm::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ssm::types::{Parameter, ParameterType};
use aws_sdk_ssm::Client;
use chrono::{TimeZone, Utc};
use tracing::debug;

use super::{ParameterKind, ParameterPage, ParameterStore, PutParameter, StoreError, StoredParameter};

/// Connection settings for the SSM parameter store
#[derive(Debug, Clone)]
pub struct SsmConfig {
    /// AWS region (optional, uses SDK default if not specified)
    pub region: Option<String>,
    /// Optional endpoint override (e.g. LocalStack)
    pub endpoint: Option<String>,
    /// MaxResults for by-path listings; the service caps it at 10
    pub page_size: u32,
}

/// Parameter store backed by AWS Systems Manager
#[derive(Clone)]
pub struct SsmStore {
    client: Client,
    page_size: i32,
}

impl std::fmt::Debug for SsmStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsmStore")
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl SsmStore {
    /// Build a client that inherits credentials, retries and HTTP settings
    /// from `sdk_config`, with the region and endpoint overrides applied
    pub fn new(sdk_config: &aws_config::SdkConfig, config: SsmConfig) -> Self {
        let mut builder = aws_sdk_ssm::config::Builder::from(sdk_config);

        if let Some(region) = config.region {
            builder = builder.region(aws_sdk_ssm::config::Region::new(region));
        }
        if let Some(endpoint) = config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Self::from_client(Client::from_conf(builder.build()), config.page_size)
    }

    /// Wrap a pre-built client
    pub fn from_client(client: Client, page_size: u32) -> Self {
        Self {
            client,
            page_size: page_size.clamp(1, 10) as i32,
        }
    }
}

fn into_stored(parameter: &Parameter) -> StoredParameter {
    let last_modified = parameter
        .last_modified_date()
        .and_then(|date| date.to_millis().ok())
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
        .unwrap_or_else(Utc::now);

    StoredParameter {
        name: parameter.name().unwrap_or_default().to_string(),
        value: parameter.value().unwrap_or_default().to_string(),
        kind: parameter
            .r#type()
            .and_then(|t| ParameterKind::parse(t.as_str()))
            .unwrap_or_default(),
        version: parameter.version(),
        last_modified,
        arn: parameter.arn().unwrap_or_default().to_string(),
    }
}

/// Anything the caller does not special-case: modeled or unmodeled service
/// errors keep their code, transport failures become `Request`
fn store_error<E, R>(err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match &err {
        SdkError::ServiceError(service) => StoreError::Service {
            code: service.err().code().unwrap_or("Unknown").to_string(),
            message: service
                .err()
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| DisplayErrorContext(&err).to_string()),
        },
        _ => StoreError::Request(DisplayErrorContext(&err).to_string()),
    }
}

#[async_trait]
impl ParameterStore for SsmStore {
    async fn get(
        &self,
        name: &str,
        with_decryption: bool,
    ) -> Result<Option<StoredParameter>, StoreError> {
        debug!("SSM GetParameter {}", name);
        let result = self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(with_decryption)
            .send()
            .await;

        match result {
            Ok(output) => Ok(output.parameter().map(into_stored)),
            Err(err) => match err.as_service_error() {
                Some(service) if service.is_parameter_not_found() => Ok(None),
                _ => Err(store_error(err)),
            },
        }
    }

    async fn put(&self, parameter: PutParameter) -> Result<(), StoreError> {
        debug!("SSM PutParameter {}", parameter.name);
        let result = self
            .client
            .put_parameter()
            .name(&parameter.name)
            .value(parameter.value)
            .r#type(ParameterType::from(parameter.kind.as_str()))
            .overwrite(parameter.overwrite)
            .set_description(parameter.description)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => match err.as_service_error() {
                Some(service) if service.is_parameter_already_exists() => {
                    Err(StoreError::AlreadyExists(parameter.name))
                }
                _ => Err(store_error(err)),
            },
        }
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        debug!("SSM DeleteParameter {}", name);
        let result = self.client.delete_parameter().name(name).send().await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => match err.as_service_error() {
                Some(service) if service.is_parameter_not_found() => {
                    Err(StoreError::NotFound(name.to_string()))
                }
                _ => Err(store_error(err)),
            },
        }
    }

    async fn get_by_path(
        &self,
        path: &str,
        recursive: bool,
        with_decryption: bool,
        next_token: Option<String>,
    ) -> Result<ParameterPage, StoreError> {
        debug!("SSM GetParametersByPath {}", path);
        let output = self
            .client
            .get_parameters_by_path()
            .path(path)
            .recursive(recursive)
            .with_decryption(with_decryption)
            .max_results(self.page_size)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(store_error)?;

        Ok(ParameterPage {
            parameters: output.parameters().iter().map(into_stored).collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }
}

//! Job Registry
//!
//! Maps method names (e.g. "federated_avg") to typed Rust handlers. This is the boundary the
//! task queue routes through: a run names a method, the node resolves it here.
//!
//! Each handler shape corresponds to a `JobKind`, and every registration is checked up
//! front (identifier name, no duplicates, well-formed signature) so that a bad job is
//! rejected when the node starts rather than when a task arrives.

use super::types::*;
use crate::dataset::Dataset;
use crate::error::FederationError;
use crate::orchestrator::orchestrator::CentralContext;
use crate::queue::types::{PartialResult, TaskInput};

use dashmap::DashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type JobFuture<T> = Pin<Box<dyn Future<Output = Result<T, FederationError>> + Send>>;

pub type ExtractionFn = Arc<dyn Fn(&JobArgs) -> Result<Dataset, FederationError> + Send + Sync>;
pub type PreProcessingFn =
    Arc<dyn Fn(Dataset, &JobArgs) -> Result<Dataset, FederationError> + Send + Sync>;
pub type FederatedFn =
    Arc<dyn Fn(&Dataset, &JobArgs) -> Result<PartialResult, FederationError> + Send + Sync>;
pub type DiagnosticFn =
    Arc<dyn Fn(JobArgs, NodeContext) -> JobFuture<PartialResult> + Send + Sync>;
pub type CentralFn = Arc<dyn Fn(JobArgs, CentralContext) -> JobFuture<PartialResult> + Send + Sync>;

/// What a node exposes to diagnostic jobs.
#[derive(Debug, Clone)]
pub struct NodeContext {
    pub organization: crate::collaboration::types::OrganizationId,
    pub proxy: crate::config::ProxyConfig,
}

#[derive(Clone)]
pub enum JobHandler {
    Extraction(ExtractionFn),
    PreProcessing(PreProcessingFn),
    /// Partial over the node's dataset.
    Federated(FederatedFn),
    /// Partial that inspects the node's environment instead of its dataset.
    Diagnostic(DiagnosticFn),
    Central(CentralFn),
}

impl JobHandler {
    pub fn kind(&self) -> JobKind {
        match self {
            JobHandler::Extraction(_) => JobKind::DataExtraction,
            JobHandler::PreProcessing(_) => JobKind::PreProcessing,
            JobHandler::Federated(_) | JobHandler::Diagnostic(_) => JobKind::Federated,
            JobHandler::Central(_) => JobKind::Central,
        }
    }
}

#[derive(Clone)]
pub struct RegisteredJob {
    pub name: String,
    pub signature: JobSignature,
    pub handler: JobHandler,
}

impl RegisteredJob {
    pub fn kind(&self) -> JobKind {
        self.handler.kind()
    }

    pub fn bind(&self, input: &TaskInput) -> Result<JobArgs, FederationError> {
        JobArgs::bind(&self.signature, input)
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RegistryError {
    #[error("'{0}' is not a valid method name")]
    InvalidName(String),

    #[error("method '{0}' is already registered")]
    Duplicate(String),

    #[error("invalid signature for '{name}': {message}")]
    InvalidSignature { name: String, message: String },
}

/// Registry holding the mapping between method names and their implementation.
pub struct JobRegistry {
    jobs: DashMap<String, RegisteredJob>,
}

impl JobRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers a handler under `name` after validating name and signature.
    pub fn register(
        &self,
        name: &str,
        signature: JobSignature,
        handler: JobHandler,
    ) -> Result<(), RegistryError> {
        if !is_identifier(name) {
            return Err(RegistryError::InvalidName(name.to_string()));
        }
        signature
            .validate()
            .map_err(|message| RegistryError::InvalidSignature {
                name: name.to_string(),
                message,
            })?;
        if matches!(handler, JobHandler::Extraction(_)) && signature.params().is_empty() {
            return Err(RegistryError::InvalidSignature {
                name: name.to_string(),
                message: "extraction jobs take the source locator as first parameter".to_string(),
            });
        }

        let kind = handler.kind();
        match self.jobs.entry(name.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(RegistryError::Duplicate(name.to_string())),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(RegisteredJob {
                    name: name.to_string(),
                    signature,
                    handler,
                });
                tracing::info!(method = name, kind = %kind, "Registered job");
                Ok(())
            }
        }
    }

    pub fn register_extraction<F>(
        &self,
        name: &str,
        signature: JobSignature,
        f: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&JobArgs) -> Result<Dataset, FederationError> + Send + Sync + 'static,
    {
        self.register(name, signature, JobHandler::Extraction(Arc::new(f)))
    }

    pub fn register_preprocessing<F>(
        &self,
        name: &str,
        signature: JobSignature,
        f: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(Dataset, &JobArgs) -> Result<Dataset, FederationError> + Send + Sync + 'static,
    {
        self.register(name, signature, JobHandler::PreProcessing(Arc::new(f)))
    }

    pub fn register_federated<F>(
        &self,
        name: &str,
        signature: JobSignature,
        f: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&Dataset, &JobArgs) -> Result<PartialResult, FederationError> + Send + Sync + 'static,
    {
        self.register(name, signature, JobHandler::Federated(Arc::new(f)))
    }

    pub fn register_diagnostic<F, Fut>(
        &self,
        name: &str,
        signature: JobSignature,
        f: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(JobArgs, NodeContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<PartialResult, FederationError>> + Send + 'static,
    {
        // Type-erase the future so different async fns fit in the same map.
        let handler: DiagnosticFn =
            Arc::new(move |args: JobArgs, node: NodeContext| {
                Box::pin(f(args, node)) as JobFuture<PartialResult>
            });
        self.register(name, signature, JobHandler::Diagnostic(handler))
    }

    pub fn register_central<F, Fut>(
        &self,
        name: &str,
        signature: JobSignature,
        f: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(JobArgs, CentralContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<PartialResult, FederationError>> + Send + 'static,
    {
        let handler: CentralFn =
            Arc::new(move |args: JobArgs, context: CentralContext| {
                Box::pin(f(args, context)) as JobFuture<PartialResult>
            });
        self.register(name, signature, JobHandler::Central(handler))
    }

    pub fn get(&self, name: &str) -> Option<RegisteredJob> {
        self.jobs.get(name).map(|job| job.value().clone())
    }

    /// Looks up `name`, requiring it to be of `kind`.
    pub fn require(&self, name: &str, kind: JobKind) -> Result<RegisteredJob, FederationError> {
        let job = self
            .get(name)
            .ok_or_else(|| FederationError::UnknownMethod(name.to_string()))?;
        if job.kind() != kind {
            return Err(FederationError::InvalidArguments {
                method: name.to_string(),
                message: format!("is a {} job, expected a {} job", job.kind(), kind),
            });
        }
        Ok(job)
    }

    pub fn kind_of(&self, name: &str) -> Option<JobKind> {
        self.jobs.get(name).map(|job| job.kind())
    }

    /// Returns a sorted list of all registered method names.
    pub fn list_jobs(&self) -> Vec<String> {
        let mut names: Vec<String> = self.jobs.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    pub fn has_job(&self, name: &str) -> bool {
        self.jobs.contains_key(name)
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self {
            jobs: DashMap::new(),
        }
    }
}

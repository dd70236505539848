//! Function registry
//!
//! Concurrency-safe store of every function the host exposes to the model,
//! keyed by protocol name.

use crate::extractor;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use fnkit_core::{
    CandidateSource, DuplicatePolicy, Error, FnkitConfig, FunctionDescriptor, FunctionHandler,
    FunctionSpec, Result,
};
use serde_json::Value;
use std::sync::Arc;

/// Registry of exposed functions
///
/// Entries are only ever added or replaced, never removed. Each entry is
/// published atomically; there are no cross-entry transactions.
pub struct FunctionRegistry {
    functions: DashMap<String, Arc<FunctionDescriptor>>,
    policy: DuplicatePolicy,
}

impl FunctionRegistry {
    /// Create a new empty registry with the default duplicate policy
    pub fn new() -> Self {
        Self::with_policy(DuplicatePolicy::default())
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            functions: DashMap::new(),
            policy,
        }
    }

    pub fn from_config(config: &FnkitConfig) -> Self {
        Self::with_policy(config.registry.duplicate_policy)
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Publish a descriptor under `name`
    ///
    /// If `name` differs from the descriptor's own name, the descriptor is
    /// republished under `name`.
    ///
    /// # Returns
    /// The descriptor previously registered under `name`, if any
    ///
    /// # Errors
    /// `Error::DuplicateFunction` if the name is taken and the policy is
    /// [`DuplicatePolicy::Reject`]; `Error::InvalidDeclaration` for a blank name
    pub fn register(
        &self,
        name: &str,
        descriptor: FunctionDescriptor,
    ) -> Result<Option<Arc<FunctionDescriptor>>> {
        let descriptor = if descriptor.name() == name {
            descriptor
        } else {
            descriptor.renamed(name)?
        };
        let descriptor = Arc::new(descriptor);

        match self.policy {
            DuplicatePolicy::LastWriterWins => {
                let previous = self.functions.insert(name.to_string(), descriptor);
                if previous.is_some() {
                    tracing::warn!(
                        function = %name,
                        "Function re-registered, replacing previous descriptor"
                    );
                } else {
                    tracing::debug!(function = %name, "Function registered");
                }
                Ok(previous)
            }
            DuplicatePolicy::Reject => match self.functions.entry(name.to_string()) {
                Entry::Occupied(_) => Err(Error::DuplicateFunction(name.to_string())),
                Entry::Vacant(vacant) => {
                    vacant.insert(descriptor);
                    tracing::debug!(function = %name, "Function registered");
                    Ok(None)
                }
            },
        }
    }

    /// Publish a descriptor under its own name
    pub fn register_descriptor(
        &self,
        descriptor: FunctionDescriptor,
    ) -> Result<Option<Arc<FunctionDescriptor>>> {
        let name = descriptor.name().to_string();
        self.register(&name, descriptor)
    }

    /// Extract every function a candidate source declares and register it
    ///
    /// Members that fail extraction are skipped, as are names the duplicate
    /// policy rejects; both are logged.
    ///
    /// # Returns
    /// The number of functions registered from this source
    pub fn register_source<S>(&self, source: Arc<S>) -> usize
    where
        S: CandidateSource + ?Sized,
    {
        let extraction = extractor::extract_with_report(source);
        tracing::info!(
            source = %extraction.source,
            count = extraction.functions.len(),
            "Found {} functions on source {}",
            extraction.functions.len(),
            extraction.source
        );

        let mut registered = 0;
        for (name, descriptor) in extraction.functions {
            match self.register(&name, descriptor) {
                Ok(_) => registered += 1,
                Err(e) => tracing::warn!(
                    source = %extraction.source,
                    function = %name,
                    error = %e,
                    "Function not registered"
                ),
            }
        }
        registered
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<FunctionDescriptor>> {
        self.functions
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn lookup_schema(&self, name: &str) -> Option<FunctionSpec> {
        self.functions
            .get(name)
            .map(|entry| entry.value().spec().clone())
    }

    pub fn lookup_implementation(&self, name: &str) -> Option<Arc<dyn FunctionHandler>> {
        self.functions.get(name).map(|entry| entry.value().handler())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// All protocol descriptors, sorted by name
    pub fn list_all(&self) -> Vec<FunctionSpec> {
        let mut specs: Vec<FunctionSpec> = self
            .functions
            .iter()
            .map(|entry| entry.value().spec().clone())
            .collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    /// Sorted function names
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .functions
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// The `tools` array of a chat completion request
    pub fn tool_manifest(&self) -> Vec<Value> {
        self.list_all()
            .iter()
            .map(FunctionSpec::to_tool_json)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Logs how many functions are available, once the host has finished
    /// registering
    pub fn log_summary(&self) {
        tracing::info!(
            count = self.len(),
            functions = ?self.names(),
            "Function registry initialized with {} functions",
            self.len()
        );
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .field("policy", &self.policy)
            .finish()
    }
}

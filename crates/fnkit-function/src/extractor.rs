//! Candidate source scanning
//!
//! Turns the members a [`CandidateSource`] declares into registrable
//! [`FunctionDescriptor`]s. Members whose parameter schema cannot be derived
//! are skipped with a warning; the rest of the source is still extracted.

use crate::schema;
use fnkit_core::{CandidateSource, Error, FunctionDescriptor, MemberSignature, Result};
use indexmap::IndexMap;
use std::sync::Arc;

/// A member that could not be turned into a descriptor
#[derive(Debug)]
pub struct ExtractionFailure {
    /// The member's identifier as declared by the source
    pub member: String,
    pub error: Error,
}

/// Everything found on one candidate source
#[derive(Debug)]
pub struct Extraction {
    pub source: String,
    /// Extracted descriptors keyed by protocol name, in declaration order
    pub functions: IndexMap<String, FunctionDescriptor>,
    pub failures: Vec<ExtractionFailure>,
}

/// Extracts the host-exposable functions of `source`
///
/// A source without exposed members yields an empty mapping.
pub fn extract<S>(source: Arc<S>) -> IndexMap<String, FunctionDescriptor>
where
    S: CandidateSource + ?Sized,
{
    extract_with_report(source).functions
}

/// Like [`extract`], but also reports the members that were skipped
pub fn extract_with_report<S>(source: Arc<S>) -> Extraction
where
    S: CandidateSource + ?Sized,
{
    let source_name = source.source_name();
    let mut functions = IndexMap::new();
    let mut failures = Vec::new();

    for member in source.exposed_members() {
        match build_descriptor(&member) {
            Ok(descriptor) => {
                let name = descriptor.name().to_string();
                if functions.contains_key(&name) {
                    tracing::warn!(
                        source = %source_name,
                        function = %name,
                        "Function declared twice on one source, keeping the last declaration"
                    );
                }
                functions.insert(name, descriptor);
            }
            Err(error) => {
                tracing::warn!(
                    source = %source_name,
                    member = %member.ident,
                    error = %error,
                    "Skipping function"
                );
                failures.push(ExtractionFailure {
                    member: member.ident.clone(),
                    error,
                });
            }
        }
    }

    tracing::debug!(
        source = %source_name,
        extracted = functions.len(),
        skipped = failures.len(),
        "Candidate source scanned"
    );

    Extraction {
        source: source_name,
        functions,
        failures,
    }
}

/// Derives the descriptor of a single member
pub fn build_descriptor(member: &MemberSignature) -> Result<FunctionDescriptor> {
    let spec = schema::generate(member)?;
    FunctionDescriptor::new(spec, Arc::clone(&member.handler))
}

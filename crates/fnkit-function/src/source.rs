use fnkit_core::{CandidateSource, MemberSignature};
use std::sync::Arc;

/// A named collection of hand-declared functions
///
/// Lets functions built with [`FunctionBuilder`](crate::FunctionBuilder) be
/// registered through the same path as `#[function_source]` types.
#[derive(Debug, Clone)]
pub struct FunctionSet {
    name: String,
    members: Vec<MemberSignature>,
}

impl FunctionSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn with(mut self, member: MemberSignature) -> Self {
        self.members.push(member);
        self
    }

    pub fn add(&mut self, member: MemberSignature) {
        self.members.push(member);
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl CandidateSource for FunctionSet {
    fn source_name(&self) -> String {
        self.name.clone()
    }

    fn exposed_members(self: Arc<Self>) -> Vec<MemberSignature> {
        self.members.clone()
    }
}

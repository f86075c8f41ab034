//! The project graph: the read-only query surface over one `(entity, project)`.
//!
//! Build order:
//! 1) normalize raw records (type repair, feedback join)
//! 2) register versions and calls
//! 3) resolve derived relations
//!
//! Once `build` returns nothing changes. Every lookup by id returns `Option`.

pub mod handles;

pub use handles::{Call, Object, ObjectVersion, Op, OpVersion, Type, TypeVersion};

use crate::category::{OpCategory, TypeCategory};
use crate::config::{BuildConfig, ProjectScope};
use crate::error::Result;
use crate::raw::{self, Bootstrap};
use crate::registry::Registries;
use crate::resolve::{self, Relations};

use tracing::debug;

#[derive(Debug)]
pub struct ProjectGraph {
    scope: ProjectScope,
    reg: Registries,
    rel: Relations,
}

impl ProjectGraph {
    pub fn build(scope: ProjectScope, bootstrap: Bootstrap) -> Result<Self> {
        Self::build_with(&BuildConfig::default(), scope, bootstrap)
    }

    pub fn build_with(config: &BuildConfig, scope: ProjectScope, bootstrap: Bootstrap) -> Result<Self> {
        debug!(
            entity = %scope.entity,
            project = %scope.project,
            objects = bootstrap.objects.len(),
            calls = bootstrap.calls.len(),
            feedback = bootstrap.feedback.len(),
            "building project graph"
        );

        let normalized = raw::normalize(config, bootstrap)?;
        let reg = Registries::build(config, normalized);
        let rel = Relations::resolve(&reg);

        debug!(
            type_versions = reg.type_versions.len(),
            op_versions = reg.op_versions.len(),
            object_versions = reg.object_versions.len(),
            calls = reg.calls.len(),
            traces = rel.calls_by_trace.len(),
            "project graph built"
        );

        Ok(Self { scope, reg, rel })
    }

    pub fn scope(&self) -> &ProjectScope {
        &self.scope
    }

    pub fn entity(&self) -> &str {
        &self.scope.entity
    }

    pub fn project(&self) -> &str {
        &self.scope.project
    }

    // Unversioned lookups.

    /// `type` is a keyword, hence the trailing underscore.
    pub fn type_(&self, name: &str) -> Option<Type<'_>> {
        let (name, _) = self.rel.type_versions_by_type.get_key_value(name)?;
        Some(Type::new(self, name))
    }

    pub fn op(&self, name: &str) -> Option<Op<'_>> {
        let (name, _) = self.rel.op_versions_by_op.get_key_value(name)?;
        Some(Op::new(self, name))
    }

    pub fn object(&self, name: &str) -> Option<Object<'_>> {
        let (name, _) = self.rel.object_versions_by_object.get_key_value(name)?;
        Some(Object::new(self, name))
    }

    pub fn types(&self) -> Vec<Type<'_>> {
        self.rel
            .type_versions_by_type
            .keys()
            .map(|n| Type::new(self, n))
            .collect()
    }

    pub fn ops(&self) -> Vec<Op<'_>> {
        self.rel
            .op_versions_by_op
            .keys()
            .map(|n| Op::new(self, n))
            .collect()
    }

    pub fn objects(&self) -> Vec<Object<'_>> {
        self.rel
            .object_versions_by_object
            .keys()
            .map(|n| Object::new(self, n))
            .collect()
    }

    // Versioned lookups.

    pub fn type_version(&self, version: &str) -> Option<TypeVersion<'_>> {
        self.reg
            .type_versions
            .get(version)
            .map(|e| TypeVersion::new(self, e))
    }

    pub fn op_version(&self, version: &str) -> Option<OpVersion<'_>> {
        self.reg
            .op_versions
            .get(version)
            .map(|e| OpVersion::new(self, e))
    }

    pub fn object_version(&self, version: &str) -> Option<ObjectVersion<'_>> {
        self.reg
            .object_versions
            .get(version)
            .map(|e| ObjectVersion::new(self, e))
    }

    pub fn type_versions(&self) -> Vec<TypeVersion<'_>> {
        self.reg
            .type_versions
            .values()
            .map(|e| TypeVersion::new(self, e))
            .collect()
    }

    pub fn op_versions(&self) -> Vec<OpVersion<'_>> {
        self.reg
            .op_versions
            .values()
            .map(|e| OpVersion::new(self, e))
            .collect()
    }

    pub fn object_versions(&self) -> Vec<ObjectVersion<'_>> {
        self.reg
            .object_versions
            .values()
            .map(|e| ObjectVersion::new(self, e))
            .collect()
    }

    // Calls.

    pub fn call(&self, call_id: &str) -> Option<Call<'_>> {
        self.reg.calls.get(call_id).map(|e| Call::new(self, e))
    }

    pub fn calls(&self) -> Vec<Call<'_>> {
        self.reg.calls.values().map(|e| Call::new(self, e)).collect()
    }

    /// Calls of `trace_id` whose parent is absent or not in the batch.
    pub fn trace_roots(&self, trace_id: &str) -> Vec<Call<'_>> {
        self.calls_in(resolve::members(&self.rel.trace_roots, trace_id))
    }

    pub fn trace_calls(&self, trace_id: &str) -> Vec<Call<'_>> {
        self.calls_in(resolve::members(&self.rel.calls_by_trace, trace_id))
    }

    pub fn trace_ids(&self) -> Vec<&str> {
        self.rel.calls_by_trace.keys().map(String::as_str).collect()
    }

    // Catalogs: always the full list, whether or not anything matches.

    pub fn op_categories(&self) -> &'static [OpCategory] {
        &OpCategory::ALL
    }

    pub fn type_categories(&self) -> &'static [TypeCategory] {
        &TypeCategory::ALL
    }

    fn calls_in<'g>(&'g self, ids: impl Iterator<Item = &'g str>) -> Vec<Call<'g>> {
        ids.filter_map(|id| self.call(id)).collect()
    }

    pub(crate) fn relations(&self) -> &Relations {
        &self.rel
    }
}

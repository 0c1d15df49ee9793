use std::{any::TypeId, sync::Arc};

use dashmap::DashMap;
use tracing::debug;

use crate::{
    BindError,
    constructor::{self, ConstructorDescriptor},
    discovery,
    member::MemberDescriptor,
    registry::ParserRegistry,
    schema::{TypeHandle, TypeInfo},
};

/// How to construct and populate one type. Immutable once built.
#[derive(Debug)]
pub struct BindingPlan {
    ty: TypeInfo,
    constructor: ConstructorDescriptor,
    members: Vec<MemberDescriptor>,
}

impl BindingPlan {
    /// Resolves the constructor, discovers members and drops those the
    /// constructor already supplies.
    pub(crate) fn build(handle: &TypeHandle, registry: &ParserRegistry) -> Result<Self, BindError> {
        let schema = handle.schema();
        let ty = schema.ty();
        let discovery = schema.discovery();
        let (constructors, members) = schema.into_parts();

        let constructor = constructor::resolve(ty, constructors, registry)?;
        let members: Vec<_> = discovery::discover(members, discovery, registry)
            .into_iter()
            .filter(|member| {
                !constructor
                    .params()
                    .iter()
                    .any(|param| param.name() == member.name())
            })
            .collect();

        if let Some(member) = members.iter().find(|member| !member.has_setter()) {
            return Err(BindError::MissingSetter {
                type_name: ty.name(),
                member: member.name(),
            });
        }

        Ok(Self {
            ty,
            constructor,
            members,
        })
    }

    pub fn ty(&self) -> TypeInfo {
        self.ty
    }

    pub fn constructor(&self) -> &ConstructorDescriptor {
        &self.constructor
    }

    /// Members bound after construction, in declaration order.
    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.iter().find(|member| member.name() == name)
    }
}

/// Plans by type. Entries are never evicted and failed builds are never
/// stored.
#[derive(Default)]
pub struct PlanCache {
    plans: DashMap<TypeId, Arc<BindingPlan>>,
}

impl PlanCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, ty: &TypeInfo) -> Option<Arc<BindingPlan>> {
        self.plans.get(&ty.id()).map(|plan| Arc::clone(&plan))
    }

    /// Returns the cached plan for `handle`, building it first if needed.
    ///
    /// The build runs without holding any lock. When two callers race, both
    /// build and the plan inserted first is the one every caller gets.
    pub fn get_or_build(
        &self,
        handle: &TypeHandle,
        registry: &ParserRegistry,
    ) -> Result<Arc<BindingPlan>, BindError> {
        let ty = handle.ty();
        if let Some(plan) = self.get(&ty) {
            return Ok(plan);
        }

        let built = Arc::new(BindingPlan::build(handle, registry)?);
        let plan = Arc::clone(
            self.plans
                .entry(ty.id())
                .or_insert_with(|| Arc::clone(&built))
                .value(),
        );

        if Arc::ptr_eq(&plan, &built) {
            debug!(
                %ty,
                params = plan.constructor().params().len(),
                members = plan.members().len(),
                "built binding plan"
            );
        } else {
            debug!(%ty, "discarded binding plan built concurrently");
        }

        Ok(plan)
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

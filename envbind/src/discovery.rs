use tracing::trace;

use crate::{member::MemberDescriptor, registry::ParserRegistry, schema::Discovery};

/// Selects the members of a type that take part in binding.
///
/// Explicit parsers of the selected members are added to the registry before
/// eligibility is checked. Members whose type can't be parsed are dropped.
pub(crate) fn discover(
    members: Vec<MemberDescriptor>,
    policy: Discovery,
    registry: &ParserRegistry,
) -> Vec<MemberDescriptor> {
    let candidates: Vec<_> = members
        .into_iter()
        .filter(|member| match policy {
            Discovery::OptOut => !member.is_opted_out(),
            Discovery::OptIn => member.is_opted_in(),
        })
        .collect();

    registry.union(candidates.iter().filter_map(|m| m.parser().cloned()));

    candidates
        .into_iter()
        .filter(|member| {
            let ty = member.ty();
            let eligible = ty.is_string() || registry.can_parse(&ty);
            if !eligible {
                trace!(member = member.name(), %ty, "dropping member without a parser");
            }
            eligible
        })
        .collect()
}

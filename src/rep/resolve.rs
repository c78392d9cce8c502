use std::collections::HashSet;

use crate::rep::class::Class;
use crate::rep::register::{ClassRegister, RegisterCache};
use crate::rep::{RepError, Result};

/// Fold `base` and its whole ancestor chain into a fresh synthetic
/// class.
///
/// Members are copied with the generic add operations, child first,
/// so qualifier adds stay idempotent while property values follow the
/// replace rules. Fast-path class bits OR across the chain, except
/// Abstract, which is forced back to the original class's own value
/// afterwards. A missing ancestor or a revisited name aborts the
/// merge; the partial class is discarded by the caller and never
/// cached.
pub(crate) fn merge_ancestors(
	register: &ClassRegister,
	cache: &mut RegisterCache,
	base: &Class,
) -> Result<Class> {
	let class_name = base.name().unwrap_or_default().to_string();
	let mut merged = Class::new(base.name(), base.parent_name());

	let mut visited: HashSet<String> = HashSet::new();
	visited.insert(class_name.to_ascii_lowercase());

	copy_class_members(&mut merged, base)?;

	let mut next_parent = base.parent_name().map(str::to_string);
	while let Some(parent) = next_parent {
		let parent_key = parent.to_ascii_lowercase();
		if !visited.insert(parent_key.clone()) {
			return Err(RepError::AncestorCycle { class: parent });
		}
		let Some(ancestor) = register.get_class_locked(cache, &parent_key)? else {
			return Err(RepError::InvalidSuperclass {
				class: class_name,
				parent,
			});
		};
		copy_class_members(&mut merged, &ancestor)?;
		next_parent = ancestor.parent_name().map(str::to_string);
	}

	merged.set_abstract(base.is_abstract());
	Ok(merged)
}

/// Copy qualifiers, properties, and methods of `src` into `dst` via
/// the generic add operations.
pub(crate) fn copy_class_members(dst: &mut Class, src: &Class) -> Result<()> {
	dst.or_class_bits(src.class_bits());

	for qi in 0..src.qualifier_count() {
		let qual = src.qualifier_at(qi)?;
		dst.add_qualifier(&qual.name, &qual.value)?;
	}

	for pi in 0..src.property_count() {
		let prop = src.property_at(pi)?;
		let idx = dst.add_property(&prop.name, &prop.value, prop.ref_class.as_deref())?;
		dst.or_property_flags(idx, prop.flags);
		if let Some(origin) = prop.origin.as_deref().or_else(|| src.name()) {
			dst.set_property_origin(idx, origin)?;
		}
		for qi in 0..src.property_qualifier_count(pi)? {
			let qual = src.property_qualifier_at(pi, qi)?;
			dst.add_property_qualifier(idx, &qual.name, &qual.value)?;
		}
	}

	for mi in 0..src.method_count() {
		let method = src.method_at(mi)?;
		let midx = dst.add_method(&method.name, method.return_kind, method.return_array)?;
		for qi in 0..src.method_qualifier_count(mi)? {
			let qual = src.method_qualifier_at(mi, qi)?;
			dst.add_method_qualifier(midx, &qual.name, &qual.value)?;
		}
		for pi in 0..src.method_parameter_count(mi)? {
			let param = src.method_parameter_at(mi, pi)?;
			let pidx = dst.add_method_parameter(
				midx,
				&param.name,
				param.kind,
				param.array,
				param.array_size,
				param.ref_class.as_deref(),
			)?;
			for qi in 0..src.parameter_qualifier_count(mi, pi)? {
				let qual = src.parameter_qualifier_at(mi, pi, qi)?;
				dst.add_parameter_qualifier(midx, pidx, &qual.name, &qual.value)?;
			}
		}
	}

	Ok(())
}

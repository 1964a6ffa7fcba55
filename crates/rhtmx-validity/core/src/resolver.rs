// File: rhtmx-validity/core/src/resolver.rs
// Purpose: Resolve a field name to the element (or radio group) it stands for

use crate::host::Host;

/// Role an ancestor must carry to act as a radio group's container
pub const RADIOGROUP_ROLE: &str = "radiogroup";

/// What a field name resolves to
#[derive(Debug, Clone, PartialEq)]
pub enum FieldTarget<N> {
    Single(N),
    /// Same-named radios, annotated through their container
    Group { container: N, members: Vec<N> },
}

impl<N> FieldTarget<N> {
    /// Element carrying the native validity message
    ///
    /// For radio groups this is the first member in document order.
    pub fn field(&self) -> &N {
        match self {
            FieldTarget::Single(field) => field,
            FieldTarget::Group { members, .. } => &members[0],
        }
    }

    /// Element carrying `aria-invalid` and the description reference
    pub fn anchor(&self) -> &N {
        match self {
            FieldTarget::Single(field) => field,
            FieldTarget::Group { container, .. } => container,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, FieldTarget::Group { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<N> {
    Found(FieldTarget<N>),
    /// Nothing named like that participates in the form
    Missing,
    /// A radio group with no `role="radiogroup"` ancestor
    Orphaned { first: N },
}

/// Look `name` up among the form's controls
pub fn resolve<H: Host>(host: &H, form: &H::Node, name: &str) -> Resolution<H::Node> {
    if name.is_empty() {
        return Resolution::Missing;
    }

    let mut matching = host
        .controls(form)
        .into_iter()
        .filter(|control| host.name(control).as_deref() == Some(name));

    let Some(first) = matching.next() else {
        return Resolution::Missing;
    };

    if !host.is_radio(&first) {
        return Resolution::Found(FieldTarget::Single(first));
    }

    let Some(container) = radio_group_container(host, &first) else {
        return Resolution::Orphaned { first };
    };

    let mut members = vec![first];
    members.extend(matching.filter(|control| host.is_radio(control)));

    Resolution::Found(FieldTarget::Group { container, members })
}

/// Nearest ancestor carrying `role="radiogroup"`
pub fn radio_group_container<H: Host>(host: &H, radio: &H::Node) -> Option<H::Node> {
    let mut current = host.parent(radio);
    while let Some(node) = current {
        if host.attribute(&node, "role").as_deref() == Some(RADIOGROUP_ROLE) {
            return Some(node);
        }
        current = host.parent(&node);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocument;

    #[test]
    fn test_resolves_single_field() {
        let doc = MemoryDocument::new();
        let form = doc.append(None, "form", &[]);
        let email = doc.append(Some(form), "input", &[("name", "email"), ("type", "email")]);

        assert_eq!(
            resolve(&doc, &form, "email"),
            Resolution::Found(FieldTarget::Single(email))
        );
    }

    #[test]
    fn test_empty_and_unknown_names_are_missing() {
        let doc = MemoryDocument::new();
        let form = doc.append(None, "form", &[]);
        doc.append(Some(form), "input", &[]);

        assert_eq!(resolve(&doc, &form, ""), Resolution::Missing);
        assert_eq!(resolve(&doc, &form, "nope"), Resolution::Missing);
    }

    #[test]
    fn test_radio_group_collapses_to_first_member() {
        let doc = MemoryDocument::new();
        let form = doc.append(None, "form", &[]);
        let group = doc.append(Some(form), "fieldset", &[("role", "radiogroup")]);
        let a = doc.append(Some(group), "input", &[("type", "radio"), ("name", "plan")]);
        let b = doc.append(Some(group), "input", &[("type", "radio"), ("name", "plan")]);

        let Resolution::Found(target) = resolve(&doc, &form, "plan") else {
            panic!("radio group should resolve");
        };
        assert!(target.is_group());
        assert_eq!(target.field(), &a);
        assert_eq!(target.anchor(), &group);
        assert_eq!(
            target,
            FieldTarget::Group {
                container: group,
                members: vec![a, b]
            }
        );
    }

    #[test]
    fn test_plain_fieldset_is_not_a_radio_group() {
        let doc = MemoryDocument::new();
        let form = doc.append(None, "form", &[]);
        let fieldset = doc.append(Some(form), "fieldset", &[]);
        let a = doc.append(Some(fieldset), "input", &[("type", "radio"), ("name", "plan")]);

        assert_eq!(resolve(&doc, &form, "plan"), Resolution::Orphaned { first: a });
    }
}

//! The chain of checking contexts.
//!
//! Each frame records the innermost scope and the control-flow targets in
//! effect at that point of the walk. Lookups for the "nearest" target walk
//! from the innermost frame outward and stop at a boundary frame; function
//! bodies, specializations and on-demand declaration checks push boundaries,
//! so a `break` inside a function literal never reaches a loop around it.

use kestrel_core::{EntityId, ScopeId, Span, TypeId};

/// One frame of the context chain.
#[derive(Debug, Clone)]
pub struct ContextFrame {
    pub scope: ScopeId,
    /// The function whose body is being checked.
    pub function: Option<EntityId>,
    /// Result tuple of the enclosing function.
    pub expected_return: Option<TypeId>,
    /// Call site that triggered the specialization being checked.
    pub specialization_call: Option<Span>,
    /// Label the next case clause gets when `fallthrough` is used.
    pub next_case: Option<EntityId>,
    pub switch_label: Option<EntityId>,
    pub loop_break: Option<EntityId>,
    pub loop_continue: Option<EntityId>,
    pub boundary: bool,
}

impl ContextFrame {
    pub fn new(scope: ScopeId) -> Self {
        Self {
            scope,
            function: None,
            expected_return: None,
            specialization_call: None,
            next_case: None,
            switch_label: None,
            loop_break: None,
            loop_continue: None,
            boundary: false,
        }
    }

    /// A frame that hides every control-flow target outside it.
    pub fn boundary(scope: ScopeId) -> Self {
        Self {
            boundary: true,
            ..Self::new(scope)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContextStack {
    frames: Vec<ContextFrame>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: ContextFrame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<ContextFrame> {
        self.frames.pop()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The innermost frame.
    ///
    /// # Panics
    ///
    /// Panics when no frame has been pushed; the checker always holds one.
    pub fn top(&self) -> &ContextFrame {
        match self.frames.last() {
            Some(frame) => frame,
            None => panic!("context stack is empty"),
        }
    }

    pub fn top_mut(&mut self) -> &mut ContextFrame {
        match self.frames.last_mut() {
            Some(frame) => frame,
            None => panic!("context stack is empty"),
        }
    }

    pub fn scope(&self) -> ScopeId {
        self.top().scope
    }

    /// Frames from innermost outward, up to and including the first boundary.
    fn visible(&self) -> impl Iterator<Item = &ContextFrame> {
        let mut done = false;
        self.frames.iter().rev().take_while(move |frame| {
            if done {
                return false;
            }
            done = frame.boundary;
            true
        })
    }

    pub fn nearest_function(&self) -> Option<EntityId> {
        self.visible().find_map(|frame| frame.function)
    }

    pub fn nearest_expected_return(&self) -> Option<TypeId> {
        self.visible().find_map(|frame| frame.expected_return)
    }

    /// The nearest target of an unlabelled `break`: a switch or a loop.
    pub fn nearest_break(&self) -> Option<EntityId> {
        self.visible()
            .find_map(|frame| frame.switch_label.or(frame.loop_break))
    }

    pub fn nearest_continue(&self) -> Option<EntityId> {
        self.visible().find_map(|frame| frame.loop_continue)
    }

    /// The case after the innermost case clause, if that clause is not last.
    pub fn nearest_next_case(&self) -> Option<EntityId> {
        self.visible()
            .find_map(|frame| {
                if frame.next_case.is_some() {
                    Some(frame.next_case)
                } else if frame.switch_label.is_some() || frame.loop_break.is_some() {
                    Some(None)
                } else {
                    None
                }
            })
            .flatten()
    }

    /// Whether `label` belongs to a loop or switch enclosing this point.
    pub fn is_visible_target(&self, label: EntityId) -> bool {
        self.visible()
            .any(|frame| frame.switch_label == Some(label) || frame.loop_break == Some(label))
    }

    /// Call sites of every specialization being checked, innermost first.
    pub fn specialization_calls(&self) -> Vec<Span> {
        self.frames
            .iter()
            .rev()
            .filter_map(|frame| frame.specialization_call)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_core::FileId;

    #[test]
    fn nearest_targets_walk_outward() {
        let mut stack = ContextStack::new();
        let mut file = ContextFrame::boundary(ScopeId(0));
        file.function = Some(EntityId(2));
        stack.push(file);

        let mut body = ContextFrame::new(ScopeId(1));
        body.loop_break = Some(EntityId(10));
        body.loop_continue = Some(EntityId(10));
        stack.push(body);

        let mut switch = ContextFrame::new(ScopeId(2));
        switch.switch_label = Some(EntityId(11));
        stack.push(switch);

        assert_eq!(stack.nearest_break(), Some(EntityId(11)));
        assert_eq!(stack.nearest_continue(), Some(EntityId(10)));
        assert_eq!(stack.nearest_function(), Some(EntityId(2)));
        assert_eq!(stack.scope(), ScopeId(2));
    }

    #[test]
    fn boundary_hides_outer_targets() {
        let mut stack = ContextStack::new();
        let mut outer = ContextFrame::new(ScopeId(0));
        outer.loop_break = Some(EntityId(3));
        outer.expected_return = Some(TypeId::VOID_TUPLE);
        stack.push(outer);

        let mut function = ContextFrame::boundary(ScopeId(1));
        function.expected_return = Some(TypeId::I64);
        stack.push(function);
        stack.push(ContextFrame::new(ScopeId(2)));

        assert_eq!(stack.nearest_break(), None);
        assert_eq!(stack.nearest_expected_return(), Some(TypeId::I64));

        stack.pop();
        stack.pop();
        assert_eq!(stack.nearest_break(), Some(EntityId(3)));
    }

    #[test]
    fn fallthrough_stops_at_innermost_switch() {
        let mut stack = ContextStack::new();
        stack.push(ContextFrame::boundary(ScopeId(0)));

        let mut outer_switch = ContextFrame::new(ScopeId(1));
        outer_switch.switch_label = Some(EntityId(20));
        stack.push(outer_switch);
        let mut outer_case = ContextFrame::new(ScopeId(2));
        outer_case.next_case = Some(EntityId(21));
        stack.push(outer_case);

        let mut inner_switch = ContextFrame::new(ScopeId(3));
        inner_switch.switch_label = Some(EntityId(30));
        stack.push(inner_switch);
        // last case of the inner switch
        stack.push(ContextFrame::new(ScopeId(4)));

        assert_eq!(stack.nearest_next_case(), None);
        assert!(stack.is_visible_target(EntityId(20)));
        assert!(!stack.is_visible_target(EntityId(21)));

        stack.pop();
        stack.pop();
        assert_eq!(stack.nearest_next_case(), Some(EntityId(21)));
    }

    #[test]
    fn specialization_calls_cross_boundaries() {
        let mut stack = ContextStack::new();
        stack.push(ContextFrame::boundary(ScopeId(0)));

        let first = Span::new(FileId(0), 3, 5, 4);
        let second = Span::new(FileId(0), 9, 1, 4);
        let mut spec = ContextFrame::boundary(ScopeId(1));
        spec.specialization_call = Some(first);
        stack.push(spec);
        let mut nested = ContextFrame::boundary(ScopeId(2));
        nested.specialization_call = Some(second);
        stack.push(nested);

        assert_eq!(stack.specialization_calls(), vec![second, first]);
    }
}

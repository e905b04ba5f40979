//! Legality checks and appliers of the Arc-Eager transition system.

use alloc::vec::Vec;

use crate::action::Action;
use crate::state::State;

/// Returns `true` if `action` can be applied to `state`.
pub fn can_do(action: Action, state: &State) -> bool {
    match action {
        Action::Shift => can_shift(state),
        Action::Reduce => can_reduce(state),
        Action::Unshift => can_unshift(state),
        Action::RightArc(_) => can_right_arc(state),
        Action::LeftArc(_) => can_left_arc(state),
    }
}

/// Shift needs a buffer element and is forbidden once the empty flag is set.
/// The root cannot be shifted onto a non-empty stack.
#[inline(always)]
pub fn can_shift(state: &State) -> bool {
    match state.buffer_head() {
        Some(b) => !state.empty_flag() && !(b == state.root() && !state.stack_empty()),
        None => false,
    }
}

/// Reduce needs an attached stack top, except for the lone root at the end
/// of the sentence.
#[inline(always)]
pub fn can_reduce(state: &State) -> bool {
    state.peek().is_some_and(|s| {
        state.has_head(s)
            || (state.stack_size() == 1 && state.buffer_empty() && s == state.root())
    })
}

/// Unshift moves an unattached stack top back once the buffer is exhausted.
#[inline(always)]
pub fn can_unshift(state: &State) -> bool {
    state.empty_flag() && state.peek().is_some_and(|s| !state.has_head(s))
}

/// Right-arc never attaches the root.
#[inline(always)]
pub fn can_right_arc(state: &State) -> bool {
    match (state.peek(), state.buffer_head()) {
        (Some(_), Some(b)) => b != state.root(),
        _ => false,
    }
}

/// Left-arc needs an unattached non-root stack top.
#[inline(always)]
pub fn can_left_arc(state: &State) -> bool {
    match (state.peek(), state.buffer_head()) {
        (Some(s), Some(_)) => s != state.root() && !state.has_head(s),
        _ => false,
    }
}

/// Applies `action` to `state`.
///
/// # Panics
///
/// Panics if the action is not legal in `state`.
pub fn apply(action: Action, state: &mut State) {
    assert!(
        can_do(action, state),
        "illegal action {action} (stack: {:?}, buffer head: {:?})",
        state.stack(),
        state.buffer_head(),
    );
    match action {
        Action::Shift => shift(state),
        Action::Reduce => reduce(state),
        Action::Unshift => unshift(state),
        Action::RightArc(label) => right_arc(state, label),
        Action::LeftArc(label) => left_arc(state, label),
    }
}

fn shift(state: &mut State) {
    state.push_stack();
    if state.buffer_empty() {
        state.set_empty_flag(true);
    }
}

fn reduce(state: &mut State) {
    state.pop_stack();
    if state.stack_empty() && state.buffer_empty() {
        state.set_empty_flag(true);
    }
}

fn unshift(state: &mut State) {
    if let Some(s) = state.pop_stack() {
        state.set_buffer_head(s);
    }
    state.set_empty_flag(true);
}

fn right_arc(state: &mut State, label: u32) {
    if let (Some(s), Some(b)) = (state.peek(), state.buffer_head()) {
        state.add_arc(b, s, label);
        state.push_stack();
        if state.buffer_empty() {
            state.set_empty_flag(true);
        }
    }
}

fn left_arc(state: &mut State, label: u32) {
    if let Some(b) = state.buffer_head() {
        if let Some(s) = state.pop_stack() {
            state.add_arc(s, b, label);
        }
    }
}

/// Returns `true` if no word is left on the stack or in the buffer.
pub fn is_terminal(state: &State) -> bool {
    let root = state.root();
    let stack_done = match state.stack() {
        [] => true,
        [only] => *only == root,
        _ => false,
    };
    stack_done && state.buffer_head().map_or(true, |b| b == root)
}

/// Enumerates the legal actions of `state` except the unshift fallback, in
/// candidate order: shift, right-arcs, left-arcs, reduce.
pub fn legal_actions(state: &State, n_labels: u32) -> Vec<Action> {
    let mut actions = vec![];
    if can_shift(state) {
        actions.push(Action::Shift);
    }
    if can_right_arc(state) {
        actions.extend((0..n_labels).map(Action::RightArc));
    }
    if can_left_arc(state) {
        actions.extend((0..n_labels).map(Action::LeftArc));
    }
    if can_reduce(state) {
        actions.push(Action::Reduce);
    }
    actions
}

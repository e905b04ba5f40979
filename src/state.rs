use alloc::vec::Vec;

use crate::sentence::Sentence;

/// Mutable parse configuration primitives.
///
/// All tokens are referred to by their position in the sentence. The buffer
/// is the contiguous range `buffer_head..=buffer_end`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct State {
    stack: Vec<usize>,
    buffer_head: Option<usize>,
    buffer_end: usize,
    root: usize,
    arcs: Vec<Option<(usize, u32)>>,
    left_valency: Vec<u32>,
    right_valency: Vec<u32>,
    leftmost_child: Vec<Option<usize>>,
    rightmost_child: Vec<Option<usize>>,
    empty_flag: bool,
}

impl State {
    /// Creates the initial state of the given sentence.
    pub fn new(sentence: &Sentence) -> Self {
        let n = sentence.len();
        let size = sentence.n_positions();
        let (stack, buffer_end) = if sentence.root_first() {
            (vec![0], n)
        } else {
            (vec![], n + 1)
        };
        Self {
            stack,
            buffer_head: (buffer_end >= 1).then_some(1),
            buffer_end,
            root: sentence.root(),
            arcs: vec![None; size],
            left_valency: vec![0; size],
            right_valency: vec![0; size],
            leftmost_child: vec![None; size],
            rightmost_child: vec![None; size],
            empty_flag: false,
        }
    }

    /// Number of words, excluding the root.
    #[inline(always)]
    pub fn n_words(&self) -> usize {
        self.arcs.len() - 2
    }

    /// Position of the root.
    #[inline(always)]
    pub const fn root(&self) -> usize {
        self.root
    }

    /// Stack contents, bottom first.
    #[inline(always)]
    pub fn stack(&self) -> &[usize] {
        &self.stack
    }

    /// Returns `true` if the stack is empty.
    #[inline(always)]
    pub fn stack_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Number of elements on the stack.
    #[inline(always)]
    pub fn stack_size(&self) -> usize {
        self.stack.len()
    }

    /// Returns the stack top.
    #[inline(always)]
    pub fn peek(&self) -> Option<usize> {
        self.stack.last().copied()
    }

    /// Returns the `i`-th element from the stack top (`0` is the top).
    #[inline(always)]
    pub fn stack_at(&self, i: usize) -> Option<usize> {
        self.stack.len().checked_sub(i + 1).map(|idx| self.stack[idx])
    }

    /// First element of the buffer.
    #[inline(always)]
    pub const fn buffer_head(&self) -> Option<usize> {
        self.buffer_head
    }

    /// Returns `true` if the buffer is empty.
    #[inline(always)]
    pub const fn buffer_empty(&self) -> bool {
        self.buffer_head.is_none()
    }

    /// Last position of the buffer (inclusive).
    #[inline(always)]
    pub const fn buffer_end(&self) -> usize {
        self.buffer_end
    }

    /// Returns the `i`-th element of the buffer (`0` is the head).
    #[inline(always)]
    pub fn buffer_at(&self, i: usize) -> Option<usize> {
        let position = self.buffer_head? + i;
        (position <= self.buffer_end).then_some(position)
    }

    /// Positions remaining in the buffer.
    #[inline(always)]
    pub fn buffer(&self) -> impl Iterator<Item = usize> {
        let end = self.buffer_end;
        self.buffer_head.into_iter().flat_map(move |head| head..=end)
    }

    /// Number of elements in the buffer.
    #[inline(always)]
    pub fn buffer_size(&self) -> usize {
        self.buffer_head.map_or(0, |head| self.buffer_end + 1 - head)
    }

    /// Set once the buffer has been exhausted. Shift is forbidden afterwards
    /// and unattached stack elements may be moved back to the buffer.
    #[inline(always)]
    pub const fn empty_flag(&self) -> bool {
        self.empty_flag
    }

    /// Returns `true` if the token is attached.
    #[inline(always)]
    pub fn has_head(&self, token: usize) -> bool {
        self.arcs[token].is_some()
    }

    /// Head of the token.
    #[inline(always)]
    pub fn head(&self, token: usize) -> Option<usize> {
        self.arcs[token].map(|(head, _)| head)
    }

    /// Label of the arc entering the token.
    #[inline(always)]
    pub fn label(&self, token: usize) -> Option<u32> {
        self.arcs[token].map(|(_, label)| label)
    }

    /// Returns the `(head, label)` pair assigned to the token.
    #[inline(always)]
    pub fn arc(&self, token: usize) -> Option<(usize, u32)> {
        self.arcs[token]
    }

    /// Number of dependents attached to the token.
    #[inline(always)]
    pub fn valence(&self, token: usize) -> u32 {
        self.left_valency[token] + self.right_valency[token]
    }

    /// Number of dependents on the left side.
    #[inline(always)]
    pub fn left_valency(&self, token: usize) -> u32 {
        self.left_valency[token]
    }

    /// Number of dependents on the right side.
    #[inline(always)]
    pub fn right_valency(&self, token: usize) -> u32 {
        self.right_valency[token]
    }

    /// Leftmost dependent.
    #[inline(always)]
    pub fn leftmost_child(&self, token: usize) -> Option<usize> {
        self.leftmost_child[token]
    }

    /// Rightmost dependent.
    #[inline(always)]
    pub fn rightmost_child(&self, token: usize) -> Option<usize> {
        self.rightmost_child[token]
    }

    /// Moves the buffer head onto the stack and advances the buffer.
    ///
    /// Does nothing if the buffer is empty.
    pub(crate) fn push_stack(&mut self) {
        if let Some(head) = self.buffer_head {
            self.stack.push(head);
            self.buffer_head = (head < self.buffer_end).then_some(head + 1);
        }
    }

    pub(crate) fn pop_stack(&mut self) -> Option<usize> {
        self.stack.pop()
    }

    /// Places `token` at the buffer head and makes it the last buffer element.
    pub(crate) fn set_buffer_head(&mut self, token: usize) {
        self.buffer_head = Some(token);
        self.buffer_end = token;
    }

    pub(crate) fn set_empty_flag(&mut self, flag: bool) {
        self.empty_flag = flag;
    }

    /// Attaches `dependent` to `head`.
    ///
    /// # Panics
    ///
    /// `dependent` must not have a head yet.
    pub(crate) fn add_arc(&mut self, dependent: usize, head: usize, label: u32) {
        assert!(
            self.arcs[dependent].is_none(),
            "token {dependent} already has a head"
        );
        self.arcs[dependent] = Some((head, label));
        if dependent < head {
            self.left_valency[head] += 1;
            if self.leftmost_child[head].map_or(true, |c| dependent < c) {
                self.leftmost_child[head] = Some(dependent);
            }
        } else {
            self.right_valency[head] += 1;
            if self.rightmost_child[head].map_or(true, |c| dependent > c) {
                self.rightmost_child[head] = Some(dependent);
            }
        }
    }
}

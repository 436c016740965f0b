//! The handler chain and its traversal state machine.
//!
//! A [`Chain`] is an ordered, non-empty sequence of nodes, each wrapping one
//! [`Handler`]. Nodes are stored contiguously and addressed by index: the
//! forward neighbour of node `i` is `i + 1`, the backward neighbour is
//! `i - 1`. The head has no backward neighbour and the tail has no forward
//! neighbour.
//!
//! One traversal moves through three phases:
//!
//! ```text
//!  before ──▶ before ──▶ before (stop, or tail)
//!                            │
//!                         execute
//!                            │
//!  after  ◀── after  ◀──  after
//! ```
//!
//! - **Before**: each node calls its handler's `before`. If the handler asks
//!   to continue and there is a forward neighbour, the neighbour takes over.
//!   Otherwise this node becomes the terminal node.
//! - **Execute**: the terminal node calls its handler's `execute` once.
//! - **After**: starting at the terminal node, every node calls its handler's
//!   `after` and then hands over to its backward neighbour, down to the head.
//!
//! Nodes past the terminal node are never called. The chain is immutable once
//! built, so one chain can serve concurrent traversals as long as its
//! handlers are reentrant.

use std::fmt;

use tracing::{debug, trace};

use crate::container::{Context, Task};
use crate::error::{RouterError, RouterResult};
use crate::handler::BoxedHandler;

/// An immutable, linear sequence of handler nodes.
pub struct Chain {
    nodes: Vec<BoxedHandler>,
}

impl Chain {
    /// Links `handlers` into a chain, preserving their order.
    ///
    /// Fails with [`RouterError::EmptyChain`] when no handler is given.
    pub fn new(handlers: impl IntoIterator<Item = BoxedHandler>) -> RouterResult<Self> {
        let nodes: Vec<BoxedHandler> = handlers.into_iter().collect();
        if nodes.is_empty() {
            return Err(RouterError::EmptyChain);
        }
        Ok(Self { nodes })
    }

    /// Number of nodes in the chain. Never zero.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`; an empty chain cannot be built.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The first node.
    pub fn head(&self) -> Node<'_> {
        Node {
            chain: self,
            index: 0,
        }
    }

    /// The node at `index`, if any.
    pub fn node(&self, index: usize) -> Option<Node<'_>> {
        (index < self.nodes.len()).then_some(Node { chain: self, index })
    }

    /// Runs one full traversal starting at the head.
    ///
    /// Returns what the head's `before` returned: `true` only when the head
    /// itself ended up as the terminal node.
    pub fn run(&self, ctx: &mut Context, task: &mut Task) -> bool {
        self.head().before(ctx, task)
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.nodes.iter().map(|h| h.name()))
            .finish()
    }
}

/// A borrowed position within a [`Chain`].
#[derive(Clone, Copy)]
pub struct Node<'a> {
    chain: &'a Chain,
    index: usize,
}

impl<'a> Node<'a> {
    /// Position of this node in the chain, starting at zero.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The handler wrapped by this node.
    pub fn handler(&self) -> &'a BoxedHandler {
        &self.chain.nodes[self.index]
    }

    /// The next node towards the tail, if any.
    pub fn forward(&self) -> Option<Node<'a>> {
        self.chain.node(self.index + 1)
    }

    /// The previous node towards the head, if any.
    pub fn backward(&self) -> Option<Node<'a>> {
        self.index.checked_sub(1).and_then(|i| self.chain.node(i))
    }

    /// Forward phase.
    ///
    /// Returns `true` if this node became the terminal node, in which case its
    /// execute phase and the full after-unwind have already run.
    pub fn before(&self, ctx: &mut Context, task: &mut Task) -> bool {
        let handler = self.handler();
        let stop = handler.before(ctx, task);
        trace!(node = self.index, handler = handler.name(), stop, "before");

        match self.forward() {
            Some(next) if !stop => {
                next.before(ctx, task);
                false
            }
            _ => {
                self.execute(ctx, task);
                true
            }
        }
    }

    /// Execute phase: runs the handler's `execute` once, then starts the
    /// after-unwind from this node whatever the handler recorded.
    pub fn execute(&self, ctx: &mut Context, task: &mut Task) {
        let handler = self.handler();
        debug!(node = self.index, handler = handler.name(), "executing terminal handler");
        handler.execute(ctx, task);
        self.after(ctx, task);
    }

    /// After phase: runs the handler's `after`, then the backward neighbour's.
    pub fn after(&self, ctx: &mut Context, task: &mut Task) {
        let handler = self.handler();
        trace!(node = self.index, handler = handler.name(), "after");
        handler.after(ctx, task);
        if let Some(prev) = self.backward() {
            prev.after(ctx, task);
        }
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("index", &self.index)
            .field("handler", &self.handler().name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Handler;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Phase {
        Before,
        Execute,
        After,
    }

    type Log = Arc<Mutex<Vec<(usize, Phase)>>>;

    struct Recorder {
        id: usize,
        stop: bool,
        log: Log,
    }

    impl Handler for Recorder {
        fn before(&self, _ctx: &mut Context, _task: &mut Task) -> bool {
            self.log.lock().push((self.id, Phase::Before));
            self.stop
        }

        fn execute(&self, _ctx: &mut Context, _task: &mut Task) {
            self.log.lock().push((self.id, Phase::Execute));
        }

        fn after(&self, _ctx: &mut Context, _task: &mut Task) {
            self.log.lock().push((self.id, Phase::After));
        }
    }

    fn chain_of(stops: &[bool]) -> (Chain, Log) {
        let log: Log = Arc::default();
        let handlers = stops.iter().enumerate().map(|(id, &stop)| {
            Arc::new(Recorder {
                id,
                stop,
                log: Arc::clone(&log),
            }) as BoxedHandler
        });
        (Chain::new(handlers).unwrap(), log)
    }

    fn run(chain: &Chain) -> bool {
        chain.run(&mut Context::new(), &mut Task::new())
    }

    #[test]
    fn test_empty_chain_rejected() {
        let result = Chain::new(Vec::<BoxedHandler>::new());
        assert!(matches!(result, Err(RouterError::EmptyChain)));
    }

    #[test]
    fn test_links() {
        let (chain, _) = chain_of(&[false, false, false]);
        let head = chain.head();
        assert!(head.backward().is_none());
        assert_eq!(head.forward().unwrap().index(), 1);
        let tail = chain.node(2).unwrap();
        assert!(tail.forward().is_none());
        assert_eq!(tail.backward().unwrap().index(), 1);
        assert!(chain.node(3).is_none());
    }

    #[test]
    fn test_single_handler_always_executes() {
        let (chain, log) = chain_of(&[false]);
        assert!(run(&chain));
        assert_eq!(
            *log.lock(),
            vec![(0, Phase::Before), (0, Phase::Execute), (0, Phase::After)]
        );
    }

    #[test]
    fn test_middle_handler_stops() {
        let (chain, log) = chain_of(&[false, true, false]);
        assert!(!run(&chain));
        assert_eq!(
            *log.lock(),
            vec![
                (0, Phase::Before),
                (1, Phase::Before),
                (1, Phase::Execute),
                (1, Phase::After),
                (0, Phase::After),
            ]
        );
    }

    #[test]
    fn test_tail_is_terminal_by_position() {
        let (chain, log) = chain_of(&[false, false]);
        run(&chain);
        assert_eq!(
            *log.lock(),
            vec![
                (0, Phase::Before),
                (1, Phase::Before),
                (1, Phase::Execute),
                (1, Phase::After),
                (0, Phase::After),
            ]
        );
    }

    #[test]
    fn test_head_stop_returns_true() {
        let (chain, log) = chain_of(&[true, true]);
        assert!(run(&chain));
        assert!(log.lock().iter().all(|(id, _)| *id == 0));
    }

    #[test]
    fn test_exactly_one_execute_and_ordered_unwind() {
        for len in 1..=5 {
            for stop_at in 0..=len {
                let stops: Vec<bool> = (0..len).map(|i| i == stop_at).collect();
                let (chain, log) = chain_of(&stops);
                run(&chain);

                let terminal = stop_at.min(len - 1);
                let log = log.lock();

                let executes: Vec<usize> = log
                    .iter()
                    .filter(|(_, p)| *p == Phase::Execute)
                    .map(|(id, _)| *id)
                    .collect();
                assert_eq!(executes, vec![terminal]);

                let afters: Vec<usize> = log
                    .iter()
                    .filter(|(_, p)| *p == Phase::After)
                    .map(|(id, _)| *id)
                    .collect();
                assert_eq!(afters, (0..=terminal).rev().collect::<Vec<_>>());

                assert!(log.iter().all(|(id, _)| *id <= terminal));
            }
        }
    }

    #[test]
    fn test_debug_lists_handler_names() {
        let (chain, _) = chain_of(&[false]);
        assert!(format!("{chain:?}").contains("Recorder"));
    }
}

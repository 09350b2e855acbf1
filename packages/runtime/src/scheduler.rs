//! Update batching and transactions.
//!
//! State changes outside a batch open one, so every `set_state` is flushed
//! through the same path. Inside a batch, dirty instances are recorded once
//! each in enqueue order and flushed when the outermost batch closes. Each
//! flush pass runs inside a transaction whose ready queue (`componentDidMount`,
//! `componentDidUpdate`, state callbacks) is notified only after the pass
//! succeeds.

use crate::callable::Callable;
use crate::error::{RuntimeError, RuntimeResult};
use crate::instance::{InstanceId, Node};
use crate::runtime::Runtime;
use crate::spec::hooks;
use crate::value::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Dirty instances awaiting a flush
#[derive(Debug, Default)]
pub(crate) struct UpdateQueue {
    batching: bool,
    dirty: Vec<InstanceId>,
    queued: HashSet<InstanceId>,
}

impl UpdateQueue {
    fn push(&mut self, id: InstanceId) {
        if self.queued.insert(id) {
            self.dirty.push(id);
        }
    }

    fn drain(&mut self) -> Vec<InstanceId> {
        self.queued.clear();
        std::mem::take(&mut self.dirty)
    }

    fn clear(&mut self) {
        self.queued.clear();
        self.dirty.clear();
    }

    fn len(&self) -> usize {
        self.dirty.len()
    }

    fn is_empty(&self) -> bool {
        self.dirty.is_empty()
    }
}

/// Work deferred until the current transaction completes
#[derive(Debug)]
pub(crate) enum Ready {
    DidMount(InstanceId),
    DidUpdate {
        id: InstanceId,
        prev_props: Map,
        prev_state: Option<Map>,
        prev_context: Option<Map>,
    },
    Callback {
        id: InstanceId,
        callback: Callable,
    },
}

impl Ready {
    fn instance(&self) -> InstanceId {
        match self {
            Ready::DidMount(id) | Ready::DidUpdate { id, .. } | Ready::Callback { id, .. } => *id,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Transaction {
    ready: Vec<Ready>,
}

impl Runtime {
    /// Whether state changes are currently being batched
    pub fn is_batching_updates(&self) -> bool {
        self.queue.batching
    }

    /// Run `f` with updates batched. Nested calls join the outer batch; the
    /// outermost call flushes when `f` returns, even if `f` failed. An error
    /// from `f` takes precedence over a flush error.
    pub fn batched_updates<T>(
        &mut self,
        f: impl FnOnce(&mut Runtime) -> RuntimeResult<T>,
    ) -> RuntimeResult<T> {
        if self.queue.batching {
            return f(self);
        }

        self.queue.batching = true;
        let result = f(self);
        let flushed = self.flush_updates();
        self.queue.batching = false;

        match (result, flushed) {
            (Err(e), _) | (Ok(_), Err(e)) => Err(e),
            (Ok(value), Ok(())) => Ok(value),
        }
    }

    /// Mark an instance dirty. Outside a batch this opens one and flushes
    /// before returning.
    pub(crate) fn enqueue_update(
        &mut self,
        id: InstanceId,
        callback: Option<Callable>,
    ) -> RuntimeResult<()> {
        if !self.queue.batching {
            return self.batched_updates(move |rt| rt.enqueue_update(id, callback));
        }

        self.queue.push(id);
        if let Some(callback) = callback {
            self.composite_mut(id)?.pending_callbacks.push(callback);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(queued = self.queue.len()))]
    fn flush_updates(&mut self) -> RuntimeResult<()> {
        let mut passes = 0;

        while !self.queue.is_empty() {
            passes += 1;
            if passes > self.options.max_flush_passes {
                self.queue.clear();
                return Err(RuntimeError::UpdateLoop {
                    passes: self.options.max_flush_passes,
                });
            }

            let dirty = self.queue.drain();
            debug!(pass = passes, dirty = dirty.len(), "Flushing dirty components");

            if let Err(e) = self.perform_transaction(|rt| rt.run_batched_updates(dirty)) {
                self.queue.clear();
                return Err(e);
            }
        }
        Ok(())
    }

    fn run_batched_updates(&mut self, dirty: Vec<InstanceId>) -> RuntimeResult<()> {
        for id in dirty {
            if !self.nodes.get(&id).is_some_and(Node::is_mounted) {
                debug!(instance = %id, "Skipping update of unmounted instance");
                continue;
            }

            self.update_if_necessary(id)?;

            let callbacks = self
                .nodes
                .get_mut(&id)
                .and_then(Node::as_composite_mut)
                .map(|instance| std::mem::take(&mut instance.pending_callbacks))
                .unwrap_or_default();
            for callback in callbacks {
                self.on_ready(Ready::Callback { id, callback })?;
            }
        }
        Ok(())
    }

    /// Run `f` inside a transaction. The ready queue is notified when `f`
    /// succeeds and dropped when it fails.
    pub(crate) fn perform_transaction<T>(
        &mut self,
        f: impl FnOnce(&mut Runtime) -> RuntimeResult<T>,
    ) -> RuntimeResult<T> {
        self.transactions.push(Transaction::default());
        let result = f(self);
        let transaction = self.transactions.pop().unwrap_or_default();

        match result {
            Ok(value) => {
                self.notify_ready(transaction.ready)?;
                Ok(value)
            }
            Err(e) => {
                debug!(dropped = transaction.ready.len(), "Transaction failed, dropping ready queue");
                Err(e)
            }
        }
    }

    /// Defer work to the innermost open transaction
    pub(crate) fn on_ready(&mut self, entry: Ready) -> RuntimeResult<()> {
        let instance = entry.instance();
        self.transactions
            .last_mut()
            .ok_or(RuntimeError::NoTransaction { instance })?
            .ready
            .push(entry);
        Ok(())
    }

    fn notify_ready(&mut self, ready: Vec<Ready>) -> RuntimeResult<()> {
        for entry in ready {
            // Instances unmounted since the entry was queued are skipped.
            if !self.is_mounted(entry.instance()) {
                continue;
            }

            match entry {
                Ready::DidMount(id) => {
                    self.call_hook(id, hooks::COMPONENT_DID_MOUNT, &[])?;
                }
                Ready::DidUpdate {
                    id,
                    prev_props,
                    prev_state,
                    prev_context,
                } => {
                    self.call_hook(
                        id,
                        hooks::COMPONENT_DID_UPDATE,
                        &[
                            Value::Object(prev_props),
                            Value::from(prev_state),
                            Value::from(prev_context),
                        ],
                    )?;
                }
                Ready::Callback { id, callback } => {
                    self.invoke(&callback, Some(id), &[])?;
                }
            }
        }
        Ok(())
    }
}

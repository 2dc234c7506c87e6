//! Per-varbind dispatch of request PDUs to providers.
//!
//! Every variable binding of a request is resolved in its own task. The
//! collecting side owns an [`Aggregation`] and files each outcome into the
//! slot of the binding it answers, so completion order does not matter and
//! the response keeps the request's order.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::task::JoinSet;

use crate::error::ErrorStatus;
use crate::handler::{Handlers, ProviderRequest, Reply};
use crate::mib::{Mib, Node};
use crate::oid::Oid;
use crate::pdu::{PduType, StdPdu};
use crate::value::{Data, Value};
use crate::varbind::VarBind;
use crate::version::Version;

/// What the request looked like from outside, shared by all its bindings.
#[derive(Debug, Clone)]
pub(crate) struct RequestOrigin {
    pub(crate) op: PduType,
    pub(crate) source: SocketAddr,
    pub(crate) version: Version,
    pub(crate) community: Bytes,
    pub(crate) request_id: i32,
}

impl RequestOrigin {
    fn request(&self, oid: Oid, node: &Node<Handlers>, value: Option<Data>) -> ProviderRequest {
        ProviderRequest {
            op: self.op,
            source: self.source,
            version: self.version,
            community: self.community.clone(),
            request_id: self.request_id,
            oid,
            node: node.oid().clone(),
            node_kind: node.kind(),
            value,
        }
    }
}

/// How one request binding finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// One binding for the slot.
    Bound(VarBind),
    /// GetBulk repetitions for the slot, in walk order.
    Repeated(Vec<VarBind>),
    /// The provider reported an error status.
    Failed(ErrorStatus),
}

/// Response under construction for one request.
///
/// Slots start out echoing the request bindings. The first error by index
/// wins; later ones are ignored.
#[derive(Debug)]
pub(crate) struct Aggregation {
    request: StdPdu,
    slots: Vec<Vec<VarBind>>,
    done: Vec<bool>,
    error: Option<(ErrorStatus, usize)>,
    expected: usize,
    completed: usize,
}

impl Aggregation {
    pub(crate) fn new(request: &StdPdu) -> Self {
        let expected = request.varbinds.len();
        Self {
            request: request.clone(),
            slots: request.varbinds.iter().map(|vb| vec![vb.clone()]).collect(),
            done: vec![false; expected],
            error: None,
            expected,
            completed: 0,
        }
    }

    /// File the outcome for binding `index`.
    ///
    /// Returns `true` once every binding has completed. A second completion
    /// for the same slot is ignored.
    pub(crate) fn complete(&mut self, index: usize, outcome: Outcome) -> bool {
        let Some(done) = self.done.get_mut(index) else {
            tracing::warn!(target: "async_snmp_agent::agent", { index }, "completion for unknown varbind");
            return self.is_complete();
        };
        if *done {
            tracing::warn!(target: "async_snmp_agent::agent", { index }, "varbind completed twice");
            return self.is_complete();
        }
        *done = true;
        self.completed += 1;

        match outcome {
            Outcome::Bound(vb) => self.slots[index] = vec![vb],
            Outcome::Repeated(vbs) => self.slots[index] = vbs,
            Outcome::Failed(status) => self.record_error(index, status),
        }
        self.is_complete()
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.completed == self.expected
    }

    /// Note an error at `index`.
    ///
    /// A SetRequest provider may only fail with `genErr`; any other status
    /// is reported as `genErr`. Other operations keep the status given.
    fn record_error(&mut self, index: usize, status: ErrorStatus) {
        let status = if status == ErrorStatus::GenErr || self.request.pdu_type != PduType::SetRequest {
            status
        } else {
            tracing::warn!(
                target: "async_snmp_agent::agent",
                { index, status = %status, op = %self.request.pdu_type },
                "provider returned a prohibited error status, reporting genErr"
            );
            ErrorStatus::GenErr
        };
        match self.error {
            Some((_, first)) if first <= index => {}
            _ => self.error = Some((status, index)),
        }
    }

    /// The Response PDU.
    ///
    /// Bindings that never completed are reported as `genErr`. A failed
    /// GetBulk answers with the request bindings, since its slots no longer
    /// line up with them.
    pub(crate) fn into_response(mut self) -> StdPdu {
        if let Some(index) = self.done.iter().position(|d| !d) {
            tracing::warn!(target: "async_snmp_agent::agent", { index }, "varbind never completed");
            self.record_error(index, ErrorStatus::GenErr);
        }

        let mut response = self.request.to_response();
        match self.error {
            Some((status, index)) => {
                response.error_status = status.as_i32();
                response.error_index = index as i32 + 1;
                if self.request.pdu_type != PduType::GetBulkRequest {
                    response.varbinds = self.slots.into_iter().flatten().collect();
                }
            }
            None => response.varbinds = self.slots.into_iter().flatten().collect(),
        }
        response
    }
}

/// Smallest encoded variable binding: SEQUENCE header, a two-octet OID
/// and an empty value.
const MIN_VARBIND_LEN: usize = 8;

/// Resolves request bindings against the MIB and runs the providers.
pub(crate) struct Dispatcher {
    mib: Mib<Handlers>,
    provider_timeout: Option<Duration>,
    /// Most bindings a GetBulk response could carry within the size limit.
    max_bulk_varbinds: usize,
}

impl Dispatcher {
    pub(crate) fn new(
        mib: Mib<Handlers>,
        provider_timeout: Option<Duration>,
        max_message_size: usize,
    ) -> Self {
        Self {
            mib,
            provider_timeout,
            max_bulk_varbinds: max_message_size / MIN_VARBIND_LEN,
        }
    }

    pub(crate) fn mib(&self) -> &Mib<Handlers> {
        &self.mib
    }

    /// Answer a Get, Set, GetNext or GetBulk request.
    pub(crate) async fn dispatch(self: &Arc<Self>, origin: RequestOrigin, request: &StdPdu) -> StdPdu {
        let mut aggregation = Aggregation::new(request);
        if aggregation.is_complete() {
            return aggregation.into_response();
        }

        let origin = Arc::new(origin);
        let mut tasks = JoinSet::new();

        let (non_repeaters, repetitions) = bulk_params(request, self.max_bulk_varbinds);
        for (index, vb) in request.varbinds.iter().enumerate() {
            let this = Arc::clone(self);
            let origin = Arc::clone(&origin);
            let vb = vb.clone();
            tasks.spawn(async move {
                let outcome = match origin.op {
                    PduType::GetRequest | PduType::SetRequest => this.get_set(&origin, vb).await,
                    PduType::GetBulkRequest if index >= non_repeaters => {
                        this.repeat(&origin, vb.oid, repetitions).await
                    }
                    _ => this.next(&origin, &vb.oid).await,
                };
                (index, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    if aggregation.complete(index, outcome) {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(target: "async_snmp_agent::agent", { error = %e }, "varbind task failed");
                }
            }
        }

        tracing::debug!(
            target: "async_snmp_agent::agent",
            { snmp.request_id = origin.request_id, op = %origin.op, varbinds = request.varbinds.len() },
            "request dispatched"
        );
        aggregation.into_response()
    }

    /// Get or Set on an exact instance.
    async fn get_set(&self, origin: &RequestOrigin, vb: VarBind) -> Outcome {
        let loc = self.mib.lookup(&vb.oid);
        let handlers = match loc.node.handler() {
            Some(handlers) if loc.node.is_instance_possible() => handlers.clone(),
            _ => return Outcome::Bound(VarBind::new(vb.oid, Value::NO_SUCH_OBJECT)),
        };
        if !loc.is_instance() {
            return Outcome::Bound(VarBind::new(vb.oid, Value::NO_SUCH_INSTANCE));
        }

        let value = (origin.op == PduType::SetRequest).then(|| vb.data.clone());
        let req = origin.request(vb.oid.clone(), loc.node, value);
        match self.invoke(handlers, req).await {
            Reply::Value(bound) => Outcome::Bound(bound),
            Reply::Error(status) => Outcome::Failed(status),
            Reply::NoValue => Outcome::Bound(VarBind::new(vb.oid, Value::NO_SUCH_INSTANCE)),
        }
    }

    /// The first instance after `start`.
    ///
    /// When a provider has no further instance the walk resumes after that
    /// provider's node, so declining hands the request to the next object.
    async fn next(&self, origin: &RequestOrigin, start: &Oid) -> Outcome {
        let mut from = start.clone();
        let mut exact_ok = true;

        while let Some(id) = self.mib.lookup_next(&from, exact_ok) {
            let node = self.mib.node(id);
            let node_oid = node.oid().clone();

            if let Some(handlers) = node.handler().cloned() {
                let req = origin.request(from, node, None);
                match self.invoke(handlers, req).await {
                    Reply::Value(vb) if vb.oid > *start => return Outcome::Bound(vb),
                    Reply::Value(vb) => {
                        tracing::warn!(
                            target: "async_snmp_agent::agent",
                            { snmp.oid = %vb.oid, requested = %start, node = %node_oid },
                            "provider answered GetNext with a non-increasing OID, skipping"
                        );
                    }
                    Reply::Error(status) => return Outcome::Failed(status),
                    Reply::NoValue => {}
                }
            }

            from = node_oid;
            exact_ok = false;
        }

        Outcome::Bound(VarBind::new(start.clone(), Value::END_OF_MIB_VIEW))
    }

    /// `count` successive GetNexts, each starting from the last answer.
    ///
    /// Once the end of the MIB view is reached the remaining repetitions
    /// repeat the `endOfMibView` binding. `count` is already bounded by
    /// [`bulk_params`].
    async fn repeat(&self, origin: &RequestOrigin, start: Oid, count: usize) -> Outcome {
        let mut out = Vec::new();
        let mut from = start;

        while out.len() < count {
            let vb = match self.next(origin, &from).await {
                Outcome::Bound(vb) => vb,
                failed => return failed,
            };
            if *vb.value() == Value::END_OF_MIB_VIEW {
                out.resize(count, vb);
                break;
            }
            from = vb.oid.clone();
            out.push(vb);
        }

        Outcome::Repeated(out)
    }

    /// Run a provider chain for one binding.
    ///
    /// Providers are asked in order until one gives something other than
    /// [`Reply::NoValue`]. The chain runs in its own task so that a
    /// panicking provider fails only its binding.
    async fn invoke(&self, handlers: Handlers, req: ProviderRequest) -> Reply {
        let oid = req.oid.clone();
        let mut task = tokio::spawn(async move {
            for provider in handlers.iter() {
                match provider.handle(&req).await {
                    Reply::NoValue => continue,
                    reply => return reply,
                }
            }
            Reply::NoValue
        });

        let joined = match self.provider_timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut task).await {
                Ok(joined) => joined,
                Err(_) => {
                    task.abort();
                    tracing::warn!(
                        target: "async_snmp_agent::agent",
                        { snmp.oid = %oid, timeout_ms = limit.as_millis() as u64 },
                        "provider timed out"
                    );
                    return Reply::Error(ErrorStatus::GenErr);
                }
            },
            None => task.await,
        };

        joined.unwrap_or_else(|e| {
            tracing::warn!(target: "async_snmp_agent::agent", { snmp.oid = %oid, error = %e }, "provider failed");
            Reply::Error(ErrorStatus::GenErr)
        })
    }
}

/// Non-repeaters and max-repetitions of a request, clamped to usable values.
///
/// Repetitions are cut so that the whole response stays within
/// `max_varbinds` bindings; anything beyond that could not be sent anyway.
/// For anything but GetBulk every binding is a non-repeater.
fn bulk_params(request: &StdPdu, max_varbinds: usize) -> (usize, usize) {
    let total = request.varbinds.len();
    if request.pdu_type != PduType::GetBulkRequest {
        return (total, 0);
    }
    let non_repeaters = (request.non_repeaters().max(0) as usize).min(total);
    let repeaters = total - non_repeaters;
    if repeaters == 0 {
        return (non_repeaters, 0);
    }
    let budget = max_varbinds.saturating_sub(non_repeaters) / repeaters;
    let repetitions = (request.max_repetitions().max(0) as usize).min(budget);
    (non_repeaters, repetitions)
}

//! Streaming chat relay
//!
//! Forwards a chat message to the generation endpoint and turns its NDJSON
//! answer into a plain-text byte stream. Each `response` fragment is yielded
//! as soon as its line is complete; nothing is batched beyond one line.
//!
//! The relayed stream is pull-based: the upstream body is only read when the
//! caller's body is polled, so a slow caller slows the upstream read.
//! Dropping the stream drops the upstream response and closes its socket.

pub mod ndjson;
pub mod prompt;
pub mod session;

pub use ndjson::NdjsonDecoder;
pub use prompt::{ChatTurn, Role, SYSTEM_PROMPT, build_prompt};
pub use session::{SESSION_HEADER, SessionRegistry};

use crate::error::AppResult;
use crate::generation::GenerationClient;
use crate::metrics::Metrics;
use crate::middleware::RequestId;
use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;

/// Relayed plain-text body
pub type RelayStream = BoxStream<'static, Bytes>;

/// Bridges chat requests to the generation endpoint
#[derive(Clone, Debug)]
pub struct Relay {
    client: GenerationClient,
    system_prompt: String,
    sessions: SessionRegistry,
    metrics: Metrics,
}

impl Relay {
    /// Create a relay using the given system prompt
    pub fn new(client: GenerationClient, system_prompt: impl Into<String>, metrics: Metrics) -> Self {
        Self {
            client,
            system_prompt: system_prompt.into(),
            sessions: SessionRegistry::new(),
            metrics,
        }
    }

    /// Get the session registry
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Get the generation client
    pub fn client(&self) -> &GenerationClient {
        &self.client
    }

    /// Start relaying an answer to `message`
    ///
    /// With a `session_id`, any unfinished relay of the same session is
    /// aborted first. The upstream is contacted exactly once.
    ///
    /// # Errors
    ///
    /// `AppError::ServiceUnavailable` if the upstream cannot be reached or
    /// rejects the request. No stream is produced in that case.
    pub async fn start(
        &self,
        message: &str,
        history: &[ChatTurn],
        session_id: Option<&str>,
        request_id: RequestId,
    ) -> AppResult<RelayStream> {
        let registration = session_id.map(|id| {
            let registration = self.sessions.register(id);
            if registration.superseded() {
                self.metrics.superseded_session();
            }
            registration
        });

        let prompt = build_prompt(history, message);
        tracing::debug!(
            request_id = %request_id,
            prompt_len = prompt.len(),
            history_turns = history.len(),
            "Starting upstream generation"
        );

        let response = self
            .client
            .stream(&prompt, Some(self.system_prompt.as_str()))
            .await?;

        let fragments = relay_fragments(response.bytes_stream(), self.metrics.clone(), request_id);

        Ok(match registration {
            Some(registration) => registration.bind(fragments).boxed(),
            None => fragments.boxed(),
        })
    }
}

struct RelayState<S> {
    upstream: Pin<Box<S>>,
    decoder: NdjsonDecoder,
    ready: VecDeque<String>,
    finished: bool,
    fragments_sent: u64,
    metrics: Metrics,
    request_id: RequestId,
}

impl<S> RelayState<S> {
    fn record_malformed(&mut self, before: u64) {
        let dropped = self.decoder.malformed_lines() - before;
        if dropped > 0 {
            self.metrics.malformed_lines(dropped);
        }
    }
}

/// Transform an upstream NDJSON byte stream into relayed text fragments
///
/// Fragments keep the upstream line order. A mid-stream upstream error ends
/// the output without a trailer; lines completed before the error are still
/// delivered, the unterminated remainder is discarded.
pub fn relay_fragments<S, E>(
    upstream: S,
    metrics: Metrics,
    request_id: RequestId,
) -> impl Stream<Item = Bytes> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = RelayState {
        upstream: Box::pin(upstream),
        decoder: NdjsonDecoder::new(),
        ready: VecDeque::new(),
        finished: false,
        fragments_sent: 0,
        metrics,
        request_id,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(fragment) = state.ready.pop_front() {
                state.fragments_sent += 1;
                state.metrics.relayed_fragment();
                return Some((Bytes::from(fragment), state));
            }

            if state.finished {
                return None;
            }

            let malformed_before = state.decoder.malformed_lines();
            match state.upstream.next().await {
                Some(Ok(chunk)) => {
                    let fragments = state.decoder.push(&chunk);
                    state.ready.extend(fragments);
                }
                Some(Err(e)) => {
                    tracing::warn!(
                        request_id = %state.request_id,
                        fragments_sent = state.fragments_sent,
                        buffered_bytes = state.decoder.buffered_len(),
                        error = %e,
                        "Upstream stream failed mid-response, truncating relay"
                    );
                    state.metrics.mid_stream_failure();
                    state.finished = true;
                }
                None => {
                    state.ready.extend(state.decoder.finish());
                    state.finished = true;
                    tracing::debug!(
                        request_id = %state.request_id,
                        fragments = state.fragments_sent + state.ready.len() as u64,
                        malformed_lines = state.decoder.malformed_lines(),
                        "Upstream stream completed"
                    );
                }
            }
            state.record_malformed(malformed_before);
        }
    })
}

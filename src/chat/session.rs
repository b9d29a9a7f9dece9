//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns the conversation
//! state and drives one send/receive cycle per question.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use futures::StreamExt;
use tracing::Instrument;

use crate::client::AnswerService;
use crate::decoder::decode_stream;
use crate::error::{Error, Result};
use crate::message::{IdGenerator, Message, MessageId, Role};
use crate::observability::{
    CHAT_FAILURES, CHAT_REJECTED, CHAT_SENDS, CHAT_SKIPPED, STREAM_DURATION, STREAM_TTFB,
};
use crate::render::Renderer;
use crate::store::MessageStore;

/// Shared view of whether a send cycle is running.
///
/// Clones observe the same flag, so a renderer or status line can watch it
/// without borrowing the session.
#[derive(Debug, Clone, Default)]
pub struct InFlight(Arc<AtomicBool>);

impl InFlight {
    /// Returns true while a question is being answered.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn acquire(&self) -> Option<InFlightGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard { flag: self.clone() })
    }
}

/// Clears the in-flight flag when the send cycle ends, however it ends.
struct InFlightGuard {
    flag: InFlight,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.0.store(false, Ordering::Release);
    }
}

/// What a call to [`ChatSession::send_message`] did.
#[derive(Debug, Clone)]
pub enum SendOutcome {
    /// The input was blank; nothing changed and nothing was sent.
    Skipped,

    /// Another answer was still streaming; nothing changed and nothing was sent.
    Busy,

    /// The answer streamed to completion.
    Answered {
        /// The user's message.
        question: MessageId,
        /// The completed answer.
        answer: MessageId,
    },

    /// The cycle failed and an error entry was added to the conversation.
    Failed {
        /// The user's message.
        question: MessageId,
        /// The answer that had started streaming, with whatever text arrived.
        partial_answer: Option<MessageId>,
        /// The assistant message describing the failure.
        error_entry: MessageId,
        /// The failure itself.
        error: Error,
    },
}

impl SendOutcome {
    /// Returns true if an answer streamed to completion.
    pub fn is_answered(&self) -> bool {
        matches!(self, SendOutcome::Answered { .. })
    }

    /// Returns true if the cycle ended in failure.
    pub fn is_failed(&self) -> bool {
        matches!(self, SendOutcome::Failed { .. })
    }

    /// Returns the failure, if the cycle failed.
    pub fn error(&self) -> Option<&Error> {
        match self {
            SendOutcome::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// The number of messages in the conversation.
    pub message_count: usize,
    /// Messages typed by the user.
    pub user_messages: usize,
    /// Answers and error entries.
    pub assistant_messages: usize,
    /// Questions sent to the answering service.
    pub requests: u64,
    /// Send cycles that ended in failure.
    pub failures: u64,
    /// Decoded increments received.
    pub chunks_received: u64,
    /// UTF-8 bytes of decoded answer text, replacement characters included.
    pub text_bytes: u64,
    /// Whether an answer is streaming right now.
    pub in_flight: bool,
}

/// A chat session that owns the conversation and talks to the answering service.
///
/// One session backs one chat screen. Each question is answered by exactly
/// one request; no history is sent along with it.
pub struct ChatSession<S: AnswerService> {
    service: S,
    store: MessageStore,
    ids: IdGenerator,
    input: String,
    in_flight: InFlight,
    requests: u64,
    failures: u64,
    chunks_received: u64,
    text_bytes: u64,
}

impl<S: AnswerService> ChatSession<S> {
    /// Creates an empty session that asks `service` for answers.
    pub fn new(service: S) -> Self {
        Self {
            service,
            store: MessageStore::new(),
            ids: IdGenerator::new(),
            input: String::new(),
            in_flight: InFlight::default(),
            requests: 0,
            failures: 0,
            chunks_received: 0,
            text_bytes: 0,
        }
    }

    /// Sends a question and streams the answer into the conversation.
    ///
    /// This method:
    /// 1. Ignores blank input, and rejects input while another answer streams
    /// 2. Appends the user message and clears the input buffer
    /// 3. Posts the question and appends an empty answer once it is streaming
    /// 4. Appends every decoded increment to the answer, notifying `renderer`
    /// 5. On failure, appends an assistant message describing the error
    ///
    /// Failures never escape; they are reported in the returned outcome and
    /// in the conversation itself.
    pub async fn send_message(&mut self, text: &str, renderer: &mut dyn Renderer) -> SendOutcome {
        let question = text.trim();
        if question.is_empty() {
            CHAT_SKIPPED.click();
            return SendOutcome::Skipped;
        }
        let Some(_guard) = self.in_flight.acquire() else {
            CHAT_REJECTED.click();
            tracing::warn!("send rejected: an answer is still streaming");
            return SendOutcome::Busy;
        };
        CHAT_SENDS.click();

        let question_id = self.ids.next_id();
        self.store.append(Message::user(question_id, question));
        if let Some(message) = self.store.get(question_id) {
            renderer.print_user(message);
        }
        self.input.clear();
        self.requests += 1;

        let span = tracing::info_span!("send_message", question = %question_id);
        let mut answer_id = None;
        let result = self
            .stream_answer(question, &mut answer_id, renderer)
            .instrument(span)
            .await;

        match result {
            Ok(answer) => {
                tracing::debug!(question = %question_id, answer = %answer, "answer complete");
                SendOutcome::Answered {
                    question: question_id,
                    answer,
                }
            }
            Err(error) => {
                CHAT_FAILURES.click();
                self.failures += 1;
                tracing::warn!(
                    question = %question_id,
                    partial = answer_id.is_some(),
                    error = %error,
                    "send cycle failed"
                );
                // A blank answer is left to the failure entry, which takes its place.
                if let Some(id) = answer_id
                    && let Some(message) = self.store.get(id)
                    && !message.is_blank()
                {
                    renderer.finish_answer(message);
                }
                let error_entry = self.ids.next_id();
                self.store
                    .append(Message::assistant_with(error_entry, error.chat_message()));
                if let Some(message) = self.store.get(error_entry) {
                    renderer.print_failure(message);
                }
                SendOutcome::Failed {
                    question: question_id,
                    partial_answer: answer_id,
                    error_entry,
                    error,
                }
            }
        }
    }

    /// Sends whatever is in the input buffer.
    pub async fn submit(&mut self, renderer: &mut dyn Renderer) -> SendOutcome {
        let text = self.input.clone();
        self.send_message(&text, renderer).await
    }

    async fn stream_answer(
        &mut self,
        question: &str,
        answer_id: &mut Option<MessageId>,
        renderer: &mut dyn Renderer,
    ) -> Result<MessageId> {
        let start = Instant::now();
        let body = self.service.ask(question).await?;

        let id = self.ids.next_id();
        self.store.append(Message::assistant(id));
        *answer_id = Some(id);
        if let Some(message) = self.store.get(id) {
            renderer.start_answer(message);
        }

        let increments = decode_stream(body);
        futures::pin_mut!(increments);
        let mut first = true;
        while let Some(increment) = increments.next().await {
            let text = increment?;
            if first {
                STREAM_TTFB.add(start.elapsed().as_secs_f64());
                first = false;
            }
            self.chunks_received += 1;
            self.text_bytes += text.len() as u64;
            tracing::trace!(bytes = text.len(), "answer increment");
            self.store.append_content(id, &text);
            renderer.print_text(&text);
        }
        STREAM_DURATION.add(start.elapsed().as_secs_f64());

        if let Some(message) = self.store.get(id) {
            renderer.finish_answer(message);
        }
        Ok(id)
    }

    /// Replaces the input buffer.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Returns the input buffer.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Returns the conversation in display order.
    pub fn messages(&self) -> &[Message] {
        self.store.messages()
    }

    /// Returns the message store.
    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    /// Returns the number of messages in the conversation.
    pub fn message_count(&self) -> usize {
        self.store.len()
    }

    /// Returns true while an answer is streaming.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_set()
    }

    /// Returns a handle that observes the in-flight flag.
    pub fn in_flight(&self) -> InFlight {
        self.in_flight.clone()
    }

    /// Returns the answering service.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            message_count: self.store.len(),
            user_messages: self.store.count_role(Role::User),
            assistant_messages: self.store.count_role(Role::Assistant),
            requests: self.requests,
            failures: self.failures,
            chunks_received: self.chunks_received,
            text_bytes: self.text_bytes,
            in_flight: self.is_in_flight(),
        }
    }
}

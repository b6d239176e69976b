//! Conversation loop controller - drives the responder/executor exchange.
//!
//! Each turn:
//! 1. Calls the responder with the transcript so far
//! 2. Appends its message and checks the termination predicate
//! 3. Asks the turn policy what the executor does next
//! 4. Executes code, replies automatically, or asks a human
//! 5. Appends the executor's (or human's) message and loops
//!
//! A collaborator failure halts the loop in the error state. The transcript
//! built up to that point is still returned.

use std::sync::Arc;

use log::{debug, error, info};

use super::config::ConversationConfig;
use super::initial::{Context, InitialMessage};
use super::policy::{AutoAction, HaltReason, TurnDecision, TurnPolicy, TurnState};
use crate::domain::{Message, Role, Transcript, metadata_keys};
use crate::error::{ResponderError, Result, TandemError};
use crate::executor::{CodeBlock, execute_blocks};
use crate::human::HumanInput;
use crate::id::participant_id;
use crate::responder::Responder;

/// Prompt shown when the executor hands the turn to a human
pub const HUMAN_PROMPT: &str =
    "Provide feedback. Press enter to continue automatically, or type 'exit' to end the conversation:";

/// Everything a finished conversation leaves behind
#[derive(Debug)]
pub struct ConversationOutcome {
    /// Finalized transcript, partial when the loop hit an error
    pub transcript: Transcript,
    /// Automatic replies (executions and default replies) used
    pub auto_replies: u32,
    /// Responder calls that returned a message
    pub turns: u32,
    pub final_state: TurnState,
    pub halt_reason: HaltReason,
    /// Every state the loop passed through, in order
    pub trace: Vec<TurnState>,
    /// Set when the loop halted in the error state
    pub error: Option<TandemError>,
}

impl ConversationOutcome {
    pub fn is_error(&self) -> bool {
        self.final_state == TurnState::Error
    }

    /// Number of executor messages produced by running code
    pub fn executions(&self) -> usize {
        self.transcript
            .messages()
            .iter()
            .filter(|m| m.meta(metadata_keys::SOURCE).and_then(|v| v.as_str()) == Some("execution"))
            .count()
    }
}

/// Mutable bookkeeping for one run
struct RunState {
    transcript: Transcript,
    policy: TurnPolicy,
    state: TurnState,
    trace: Vec<TurnState>,
    turns: u32,
}

impl RunState {
    fn transition(&mut self, to: TurnState) {
        if self.state != to {
            debug!("Conversation {}: {} -> {}", self.transcript.id(), self.state, to);
            self.state = to;
            self.trace.push(to);
        }
    }
}

/// Runs one conversation between a responder and the executor.
pub struct ConversationLoop<R, H>
where
    R: Responder,
    H: HumanInput,
{
    responder: Arc<R>,
    human: Arc<H>,
    config: ConversationConfig,
}

impl<R, H> ConversationLoop<R, H>
where
    R: Responder,
    H: HumanInput,
{
    pub fn new(responder: Arc<R>, human: Arc<H>, config: ConversationConfig) -> Self {
        Self {
            responder,
            human,
            config,
        }
    }

    pub fn config(&self) -> &ConversationConfig {
        &self.config
    }

    /// Run a conversation to completion with an empty context
    pub async fn run(&self, initial: impl Into<InitialMessage>) -> ConversationOutcome {
        self.run_with_context(&initial.into(), &Context::new()).await
    }

    /// Run a conversation to completion.
    ///
    /// Never fails: errors are reported in the outcome alongside the partial
    /// transcript.
    pub async fn run_with_context(&self, initial: &InitialMessage, context: &Context) -> ConversationOutcome {
        let mut run = RunState {
            transcript: Transcript::new(),
            policy: TurnPolicy::new(self.config.max_auto_replies, self.config.human_input_mode),
            state: TurnState::AwaitingResponse,
            trace: vec![TurnState::AwaitingResponse],
            turns: 0,
        };

        info!(
            "Starting conversation {} (budget {}, human input {})",
            run.transcript.id(),
            self.config.max_auto_replies,
            self.config.human_input_mode
        );

        let (halt_reason, error) = match self.drive(&mut run, initial, context).await {
            Ok(reason) => (reason, None),
            Err(e) => {
                error!("Conversation {} failed: {}", run.transcript.id(), e);
                (HaltReason::Error, Some(e))
            }
        };

        run.transition(halt_reason.final_state());
        run.transcript.finalize();

        info!(
            "Conversation {} halted ({:?}) after {} turns, {} auto-replies, {} messages",
            run.transcript.id(),
            halt_reason,
            run.turns,
            run.policy.consumed(),
            run.transcript.len()
        );

        ConversationOutcome {
            auto_replies: run.policy.consumed(),
            turns: run.turns,
            final_state: run.state,
            halt_reason,
            trace: run.trace,
            error,
            transcript: run.transcript,
        }
    }

    async fn drive(&self, run: &mut RunState, initial: &InitialMessage, context: &Context) -> Result<HaltReason> {
        let sender = participant_id(Role::Executor.as_str(), run.transcript.id());
        let recipient = participant_id(Role::Responder.as_str(), run.transcript.id());
        let task = initial.resolve(&sender, &recipient, context);
        run.transcript.append(
            Message::executor(task)
                .with_metadata(metadata_keys::SOURCE, "task")
                .with_metadata(metadata_keys::SENDER, sender)
                .with_metadata(metadata_keys::RECIPIENT, recipient),
        )?;

        loop {
            let reply = self.responder.respond(&run.transcript, &self.config).await?;
            if reply.role() != Role::Responder {
                return Err(ResponderError::Malformed(format!("reply has role {}", reply.role())).into());
            }
            run.turns += 1;
            let index = run.transcript.append(reply)?;
            let message = &run.transcript.messages()[index];

            let decision = run
                .policy
                .decide(message, self.config.termination_predicate.as_ref());
            debug!("Turn {}: {:?}", run.turns, decision);

            let action = match decision {
                TurnDecision::Terminate(reason) => return Ok(reason),
                TurnDecision::Auto(action) => action,
                TurnDecision::AskHuman => {
                    run.transition(TurnState::AwaitingHuman);
                    let message = run.transcript.messages()[index].clone();
                    match self.human.ask(&message, HUMAN_PROMPT).await? {
                        None => {
                            info!("Human declined to reply");
                            return Ok(HaltReason::HumanDeclined);
                        }
                        Some(text) if text.trim().is_empty() => match run.policy.decide_automatic(&message) {
                            Some(action) => action,
                            None => return Ok(HaltReason::BudgetExhausted),
                        },
                        Some(text) => {
                            run.policy.reset();
                            run.transcript.append(Message::human(text))?;
                            run.transition(TurnState::AwaitingResponse);
                            continue;
                        }
                    }
                }
            };

            match action {
                AutoAction::Execute(blocks) => self.execute_turn(run, &blocks).await?,
                AutoAction::DefaultReply => self.auto_reply(run)?,
            }
        }
    }

    async fn execute_turn(&self, run: &mut RunState, blocks: &[CodeBlock]) -> Result<()> {
        run.transition(TurnState::Executing);
        let report = execute_blocks(self.config.executor.as_ref(), blocks, &self.config.working_dir).await?;
        run.policy.consume();

        let reply = Message::executor(report.to_reply(self.config.max_output_chars))
            .with_metadata(metadata_keys::SOURCE, "execution")
            .with_metadata(metadata_keys::EXIT_CODE, report.exit_code())
            .with_metadata(metadata_keys::CODE_BLOCKS, report.blocks_found);
        run.transcript.append(reply)?;
        run.transition(TurnState::AwaitingResponse);
        Ok(())
    }

    fn auto_reply(&self, run: &mut RunState) -> Result<()> {
        run.policy.consume();
        run.transcript.append(
            Message::executor(self.config.default_auto_reply.clone()).with_metadata(metadata_keys::SOURCE, "auto_reply"),
        )?;
        run.transition(TurnState::AwaitingResponse);
        Ok(())
    }
}

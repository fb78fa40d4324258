//! Dedicated agent thread.
//!
//! Agent code runs here, never on the orchestration thread or an executor
//! worker. Each request (init or turn) gets a fresh command queue; the thread
//! pushes the agent's commands onto it followed by an `EndTurnCommand`, or an
//! error if the entry point failed or panicked.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::agent::{AgentController, Player, PlayerSpec, QueueItem};
use crate::command::{BoxedCommand, EndTurnCommand};
use crate::concurrent::panic_message;
use crate::core::TeamId;
use crate::error::AgentError;
use crate::simulation::Simulation;

/// Receiving end of one request's command queue.
pub type CommandQueue<S> = Receiver<QueueItem<<S as Simulation>::Controller>>;

enum Request<S: Simulation> {
    Init {
        state: S::State,
        seed: u64,
        queue: Sender<QueueItem<S::Controller>>,
    },
    Turn {
        state: S::State,
        queue: Sender<QueueItem<S::Controller>>,
    },
}

impl<S: Simulation> Request<S> {
    fn queue(&self) -> &Sender<QueueItem<S::Controller>> {
        match self {
            Request::Init { queue, .. } | Request::Turn { queue, .. } => queue,
        }
    }
}

/// An agent living on its own thread.
pub struct PlayerThread<S: Simulation> {
    name: String,
    requests: Option<Sender<Request<S>>>,
    thread: Option<JoinHandle<()>>,
}

impl<S: Simulation> std::fmt::Debug for PlayerThread<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerThread")
            .field("name", &self.name)
            .field("running", &self.requests.is_some())
            .finish()
    }
}

impl<S: Simulation> PlayerThread<S> {
    /// Spawn the thread. The agent is built on it from `spec`.
    pub fn spawn(spec: &PlayerSpec<S>, team: TeamId, name: impl Into<String>) -> Result<Self, AgentError> {
        let name = name.into();
        let (requests, inbox) = unbounded();
        let spec = spec.clone();

        let thread = thread::Builder::new()
            .name(name.clone())
            .spawn(move || agent_loop(&spec, team, &inbox))
            .map_err(|e| AgentError::Spawn(e.to_string()))?;

        Ok(Self {
            name,
            requests: Some(requests),
            thread: Some(thread),
        })
    }

    /// Thread name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask the agent to initialise.
    pub fn init(&self, state: S::State, seed: u64) -> Result<CommandQueue<S>, AgentError> {
        let (queue, commands) = unbounded();
        self.submit(Request::Init { state, seed, queue })?;
        Ok(commands)
    }

    /// Ask the agent to play a turn.
    pub fn execute_turn(&self, state: S::State) -> Result<CommandQueue<S>, AgentError> {
        let (queue, commands) = unbounded();
        self.submit(Request::Turn { state, queue })?;
        Ok(commands)
    }

    fn submit(&self, request: Request<S>) -> Result<(), AgentError> {
        self.requests
            .as_ref()
            .ok_or(AgentError::Disconnected)?
            .send(request)
            .map_err(|_| AgentError::Disconnected)
    }

    /// Stop accepting requests.
    ///
    /// Joins the thread if it already returned. A thread still stuck inside
    /// agent code is detached and exits once that code returns.
    pub fn shutdown(&mut self) {
        self.requests = None;
        if let Some(thread) = self.thread.take() {
            if thread.is_finished() {
                let _ = thread.join();
            }
        }
    }
}

impl<S: Simulation> Drop for PlayerThread<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn agent_loop<S: Simulation>(spec: &PlayerSpec<S>, team: TeamId, inbox: &Receiver<Request<S>>) {
    let mut agent = guarded(|| Ok(spec.instantiate()));

    for request in inbox.iter() {
        let outcome = match &mut agent {
            Err(e) => Err(e.clone()),
            Ok(agent) => run_request(agent.as_mut(), team, &request),
        };
        let item = outcome.map(|()| Box::new(EndTurnCommand::new()) as BoxedCommand<S::Controller>);
        // A closed queue means the handler gave up on this request.
        let _ = request.queue().send(item);
    }
}

fn run_request<S: Simulation>(
    agent: &mut dyn Player<S>,
    team: TeamId,
    request: &Request<S>,
) -> Result<(), AgentError> {
    match request {
        Request::Init { state, seed, .. } => guarded(|| agent.init(state, *seed)),
        Request::Turn { state, queue } => {
            let mut controller = AgentController::new(team, queue.clone());
            guarded(|| agent.execute_turn(state, &mut controller))
        }
    }
}

fn guarded<T>(f: impl FnOnce() -> Result<T, AgentError>) -> Result<T, AgentError> {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| Err(AgentError::Panicked(panic_message(payload.as_ref()))))
}

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use reqgraph::{ResultHistory, Work, WorkResult};

/// What a [`FakeWork`] does when executed.
#[derive(Debug, Clone)]
pub enum Outcome {
    Succeed,
    /// Return a failed `WorkResult` with this message.
    Fail(String),
    /// Return `Err` from `execute`.
    Error(String),
    Panic(String),
}

/// Shared record of everything that ran, plus a concurrency gauge.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    executed: Arc<Mutex<Vec<String>>>,
    commands: Arc<Mutex<Vec<(String, String)>>>,
    current: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids in the order their work started.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    /// Command text each work saw at execution time, after placeholder
    /// substitution.
    pub fn command_of(&self, id: &str) -> Option<String> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .find(|(node, _)| node == id)
            .map(|(_, cmd)| cmd.clone())
    }

    /// Highest number of works that were executing at the same time.
    pub fn max_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn enter(&self, id: &str, command: &str) {
        self.executed.lock().unwrap().push(id.to_string());
        self.commands
            .lock()
            .unwrap()
            .push((id.to_string(), command.to_string()));
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Configurable work for driving the executors in tests.
#[derive(Debug, Clone)]
pub struct FakeWork {
    id: String,
    command: String,
    outcome: Outcome,
    delay: Duration,
    allow_failure: bool,
    outputs: Vec<(String, String)>,
    log: ExecutionLog,
}

impl FakeWork {
    pub fn new(id: &str, log: &ExecutionLog) -> Self {
        Self {
            id: id.to_string(),
            command: String::new(),
            outcome: Outcome::Succeed,
            delay: Duration::ZERO,
            allow_failure: false,
            outputs: Vec::new(),
            log: log.clone(),
        }
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.outcome = Outcome::Fail(message.to_string());
        self
    }

    pub fn erroring(mut self, message: &str) -> Self {
        self.outcome = Outcome::Error(message.to_string());
        self
    }

    pub fn panicking(mut self, message: &str) -> Self {
        self.outcome = Outcome::Panic(message.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn allowing_failure(mut self) -> Self {
        self.allow_failure = true;
        self
    }

    /// Command text that may contain `{{node.field}}` placeholders.
    pub fn with_command(mut self, command: &str) -> Self {
        self.command = command.to_string();
        self
    }

    pub fn with_output(mut self, key: &str, value: &str) -> Self {
        self.outputs.push((key.to_string(), value.to_string()));
        self
    }
}

impl<D> Work<D> for FakeWork {
    fn execute(&self, _driver: &D) -> anyhow::Result<WorkResult> {
        self.log.enter(&self.id, &self.command);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.log.exit();

        match &self.outcome {
            Outcome::Succeed => {
                let result = self
                    .outputs
                    .iter()
                    .fold(WorkResult::success(), |res, (k, v)| res.with_output(k, v));
                Ok(result)
            }
            Outcome::Fail(message) => Ok(WorkResult::failure(message.clone())),
            Outcome::Error(message) => Err(anyhow::anyhow!("{message}")),
            Outcome::Panic(message) => panic!("{message}"),
        }
    }

    fn allow_failure(&self) -> bool {
        self.allow_failure
    }

    fn label(&self) -> String {
        format!("fake:{}", self.id)
    }

    fn resolve_placeholders(&mut self, history: &ResultHistory) {
        self.command = history.substitute(&self.command);
    }
}

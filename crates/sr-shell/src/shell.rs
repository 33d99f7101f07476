use std::path::PathBuf;
use std::rc::Rc;

use sr_core::{CompletionResult, EvaluationOutcome, RunMode, ScriptEngine, ScriptValue, Sentence, ShellError};
use sr_runtime::RhaiEngine;

use crate::binding;
use crate::completion::complete_expression;
use crate::help::help_message;
use crate::host::{ExceptionReport, ShellHost};
use crate::session::Session;
use crate::source::{ReadRequest, SentenceSource};
use crate::VERSION;

/// Read-evaluate-print driver in front of a script engine.
///
/// The host API is installed lazily, the first time the engine is needed.
pub struct Shell<E: ScriptEngine + Default = RhaiEngine> {
    engine: E,
    session: Rc<Session>,
}

impl Shell<RhaiEngine> {
    pub fn new(host: impl ShellHost + 'static) -> Self {
        Self::with_engine(RhaiEngine::new(), host)
    }
}

impl<E: ScriptEngine + Default> Shell<E> {
    pub fn with_engine(engine: E, host: impl ShellHost + 'static) -> Self {
        let runtime_version = engine.runtime_version();
        Self {
            engine,
            session: Rc::new(Session::new(Box::new(host), runtime_version)),
        }
    }

    pub fn run(&mut self, mode: RunMode, source: &mut dyn SentenceSource) -> Result<(), ShellError> {
        self.ensure_initialized();
        {
            let mut state = self.session.state.borrow_mut();
            state.exit_requested = false;
            state.exit_code = 0;
        }
        log::debug!("running in {} mode", mode);

        if !mode.loops() {
            match self.read(source, mode.reads_whole_input())? {
                Some(sentence) => {
                    self.evaluate_sentence(sentence, mode.prints_results());
                }
                None => self.finish(),
            }
            return Ok(());
        }

        while !self.is_exit_called() {
            match self.read(source, false)? {
                Some(sentence) => {
                    self.evaluate_sentence(sentence, mode.prints_results());
                }
                None => {
                    self.finish();
                    break;
                }
            }
        }
        Ok(())
    }

    pub fn run_interactive(&mut self, source: &mut dyn SentenceSource) -> Result<(), ShellError> {
        self.run(RunMode::Interactive, source)
    }

    pub fn run_quiet(&mut self, source: &mut dyn SentenceSource) -> Result<(), ShellError> {
        self.run(RunMode::Quiet, source)
    }

    pub fn run_batch(&mut self, source: &mut dyn SentenceSource) -> Result<(), ShellError> {
        self.run(RunMode::Batch, source)
    }

    pub fn run_one_sentence(&mut self, source: &mut dyn SentenceSource) -> Result<(), ShellError> {
        self.run(RunMode::OneShot, source)
    }

    pub fn run_one_sentence_interactive(
        &mut self,
        source: &mut dyn SentenceSource,
    ) -> Result<(), ShellError> {
        self.run(RunMode::OneShotInteractive, source)
    }

    /// Evaluates `text` as if it had been read at the current line.
    pub fn evaluate(&mut self, text: &str) -> EvaluationOutcome {
        self.ensure_initialized();
        let next_line = self.current_line_number() + text.lines().count().max(1);
        self.evaluate_sentence(
            Sentence {
                text: text.to_string(),
                next_line,
            },
            false,
        )
    }

    pub fn is_complete_sentence(&self, text: &str) -> bool {
        !self.engine.check_syntax_completeness(text).is_intermediate()
    }

    pub fn complete(&mut self, expression: &str) -> CompletionResult {
        self.ensure_initialized();
        let context = self.engine.current_context();
        let engine = &self.engine;
        complete_expression(&context, expression, &|value: &ScriptValue| {
            engine.enumerate_properties(value)
        })
    }

    pub fn exit(&mut self, code: i32) {
        self.session.request_exit(code);
    }

    pub fn exit_code(&self) -> i32 {
        self.session.state.borrow().exit_code
    }

    pub fn is_exit_called(&self) -> bool {
        self.session.is_exit_requested()
    }

    pub fn is_engine_initialized(&self) -> bool {
        self.session.state.borrow().initialized
    }

    pub fn current_line_number(&self) -> usize {
        self.session.state.borrow().line_number
    }

    pub fn set_current_line_number(&mut self, line_number: usize) {
        self.session.state.borrow_mut().line_number = line_number;
    }

    pub fn source_name(&self) -> String {
        self.session.state.borrow().source_name.clone()
    }

    pub fn set_source_name(&mut self, name: impl Into<String>) {
        self.session.state.borrow_mut().source_name = name.into();
    }

    pub fn arguments(&self) -> Vec<String> {
        self.session.state.borrow().arguments.clone()
    }

    pub fn set_arguments(&mut self, arguments: Vec<String>) {
        self.session.state.borrow_mut().arguments = arguments;
    }

    pub fn use_global_engine(&self) -> bool {
        self.session.state.borrow().use_global_engine
    }

    /// Takes effect the next time the host API is installed.
    pub fn set_use_global_engine(&mut self, use_global_engine: bool) {
        self.session.state.borrow_mut().use_global_engine = use_global_engine;
    }

    pub fn event_throttle(&self) -> i32 {
        self.engine.event_throttle()
    }

    pub fn set_event_throttle(&mut self, interval: i32) {
        self.engine.set_event_throttle(interval);
    }

    pub fn add_extension_path(&mut self, path: impl Into<PathBuf>) {
        self.session.extensions.borrow_mut().add_search_path(path);
    }

    pub fn extension_paths(&self) -> Vec<PathBuf> {
        self.session.extensions.borrow().search_paths().to_vec()
    }

    pub fn on_finished(&mut self, listener: impl FnMut(i32) + 'static) {
        self.session.set_finished_listener(Box::new(listener));
    }

    /// The engine with the host API installed.
    pub fn engine(&mut self) -> &mut E {
        self.ensure_initialized();
        &mut self.engine
    }

    pub fn version(&self) -> &'static str {
        VERSION
    }

    pub fn help_message(&self) -> String {
        help_message(VERSION)
    }

    /// Replaces the engine with a fresh one. Only the event throttle and the
    /// shell's own settings survive.
    pub fn reset(&mut self) {
        let throttle = self.engine.event_throttle();
        self.engine = E::default();
        self.engine.set_event_throttle(throttle);
        {
            let mut state = self.session.state.borrow_mut();
            state.line_number = 1;
            state.initialized = false;
            state.exit_requested = false;
        }
        self.session.clear_loads();
        self.session.extensions.borrow_mut().clear_imported();
        log::debug!("shell reset");
    }

    fn ensure_initialized(&mut self) {
        let initialized = self.session.state.borrow().initialized;
        if initialized {
            return;
        }
        self.session.state.borrow_mut().initialized = true;
        binding::install(&mut self.engine, &self.session);
    }

    fn read(
        &mut self,
        source: &mut dyn SentenceSource,
        whole_input: bool,
    ) -> Result<Option<Sentence>, ShellError> {
        let request = ReadRequest::new(self.current_line_number(), &self.engine);
        if whole_input {
            source.read_all(&request)
        } else {
            source.read_statement(&request)
        }
    }

    fn evaluate_sentence(&mut self, sentence: Sentence, print_result: bool) -> EvaluationOutcome {
        let (start_line, name) = {
            let mut state = self.session.state.borrow_mut();
            let start_line = state.line_number;
            state.line_number = sentence.next_line;
            (start_line, state.display_source().to_string())
        };
        let outcome = self.engine.evaluate(&sentence.text, &name, start_line);
        self.report(&outcome, &name, print_result);
        self.run_pending_loads();
        outcome
    }

    fn run_pending_loads(&mut self) {
        while let Some(load) = self.session.next_load() {
            if self.is_exit_called() {
                self.session.clear_loads();
                return;
            }
            log::debug!("loading {}", load.name);
            let outcome = self.engine.evaluate(&load.source, &load.name, 1);
            self.report(&outcome, &load.name, false);
        }
    }

    fn report(&self, outcome: &EvaluationOutcome, source: &str, print_result: bool) {
        if outcome.has_uncaught_exception {
            let report = ExceptionReport {
                source: source.to_string(),
                line: outcome.exception_line,
                message: outcome.exception.to_string(),
                backtrace: outcome.backtrace.clone(),
            };
            self.session
                .with_host(|host| host.print_uncaught_exception(&report));
        } else if print_result && !outcome.result.is_undefined() {
            self.session
                .with_host(|host| host.print_result(&outcome.result));
        }
    }

    fn finish(&self) {
        if !self.is_exit_called() {
            self.session.notify_finished(0);
        }
    }
}

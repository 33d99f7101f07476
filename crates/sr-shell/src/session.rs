use std::cell::RefCell;
use std::collections::VecDeque;

use sr_core::ScriptValue;

use crate::extensions::ExtensionRegistry;
use crate::host::ShellHost;
use crate::state::ShellState;

/// A script file queued by `load` or `importExtension`, evaluated once the
/// current sentence has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingLoad {
    pub(crate) name: String,
    pub(crate) source: String,
}

type FinishedListener = Box<dyn FnMut(i32)>;

/// State shared between a `Shell` and the host functions it installs.
pub(crate) struct Session {
    pub(crate) state: RefCell<ShellState>,
    pub(crate) extensions: RefCell<ExtensionRegistry>,
    host: RefCell<Box<dyn ShellHost>>,
    finished: RefCell<Option<FinishedListener>>,
    pending_loads: RefCell<VecDeque<PendingLoad>>,
    runtime_version: String,
}

impl Session {
    pub(crate) fn new(host: Box<dyn ShellHost>, runtime_version: String) -> Self {
        Self {
            state: RefCell::new(ShellState::default()),
            extensions: RefCell::new(ExtensionRegistry::default()),
            host: RefCell::new(host),
            finished: RefCell::new(None),
            pending_loads: RefCell::new(VecDeque::new()),
            runtime_version,
        }
    }

    pub(crate) fn runtime_version(&self) -> &str {
        &self.runtime_version
    }

    pub(crate) fn with_host<R>(&self, action: impl FnOnce(&mut dyn ShellHost) -> R) -> R {
        let mut host = self.host.borrow_mut();
        action(&mut **host)
    }

    pub(crate) fn print_values(&self, values: &[ScriptValue], to_error: bool) {
        self.with_host(|host| {
            if values.is_empty() {
                emit(host, "", true, to_error);
            }
            for (index, value) in values.iter().enumerate() {
                emit(host, &value.to_string(), index + 1 == values.len(), to_error);
            }
        });
    }

    pub(crate) fn set_finished_listener(&self, listener: FinishedListener) {
        *self.finished.borrow_mut() = Some(listener);
    }

    pub(crate) fn notify_finished(&self, code: i32) {
        if let Some(listener) = self.finished.borrow_mut().as_mut() {
            listener(code);
        }
    }

    pub(crate) fn request_exit(&self, code: i32) {
        {
            let mut state = self.state.borrow_mut();
            state.exit_requested = true;
            state.exit_code = code;
        }
        log::debug!("exit requested with code {}", code);
        self.notify_finished(code);
    }

    pub(crate) fn is_exit_requested(&self) -> bool {
        self.state.borrow().exit_requested
    }

    pub(crate) fn queue_load(&self, load: PendingLoad) {
        log::debug!("queued {} for loading", load.name);
        self.pending_loads.borrow_mut().push_back(load);
    }

    pub(crate) fn next_load(&self) -> Option<PendingLoad> {
        self.pending_loads.borrow_mut().pop_front()
    }

    pub(crate) fn clear_loads(&self) {
        self.pending_loads.borrow_mut().clear();
    }
}

fn emit(host: &mut dyn ShellHost, text: &str, last: bool, to_error: bool) {
    if to_error {
        host.print_err(text, last);
    } else {
        host.print_out(text, last);
    }
}

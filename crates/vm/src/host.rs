//! The host contract: narrative callbacks and registered host functions.

use std::collections::HashMap;
use std::fmt;

use branchline_common::Value;

/// What a callback asks the VM to do once it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep executing.
    Continue,
    /// Suspend after the current instruction; [`VM::resume`](crate::VM::resume)
    /// picks up at the next one.
    Pause,
}

/// Narrative callbacks the embedding application must provide.
///
/// Every method is required: a host missing a handler does not compile.
pub trait Host {
    /// A node's entry marker was executed.
    fn node_entered(&mut self, name: &str) -> Flow;

    /// A node's exit marker was executed.
    fn node_exited(&mut self, name: &str) -> Flow;

    /// A line of dialogue is ready to show.
    fn line_shown(&mut self, text: &str) -> Flow;

    /// A multiple-choice prompt is ready. The VM always waits for
    /// [`VM::choose`](crate::VM::choose) afterwards.
    fn choices_shown(&mut self, choices: &[String]);

    /// The dialogue reached its end. The VM stops afterwards.
    fn dialogue_ended(&mut self);
}

impl<H: Host + ?Sized> Host for &mut H {
    fn node_entered(&mut self, name: &str) -> Flow {
        (**self).node_entered(name)
    }

    fn node_exited(&mut self, name: &str) -> Flow {
        (**self).node_exited(name)
    }

    fn line_shown(&mut self, text: &str) -> Flow {
        (**self).line_shown(text)
    }

    fn choices_shown(&mut self, choices: &[String]) {
        (**self).choices_shown(choices)
    }

    fn dialogue_ended(&mut self) {
        (**self).dialogue_ended()
    }
}

/// A host that ignores every event and never pauses.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentHost;

impl Host for SilentHost {
    fn node_entered(&mut self, _name: &str) -> Flow {
        Flow::Continue
    }

    fn node_exited(&mut self, _name: &str) -> Flow {
        Flow::Continue
    }

    fn line_shown(&mut self, _text: &str) -> Flow {
        Flow::Continue
    }

    fn choices_shown(&mut self, _choices: &[String]) {}

    fn dialogue_ended(&mut self) {}
}

/// A host-provided callable. Receives arguments in declaration order,
/// already checked against the program's prototype.
pub type HostFn = Box<dyn FnMut(&[Value]) -> Flow>;

/// Name-keyed registry of host functions.
///
/// Names are matched against `CALL` operands and the program's function
/// table. Registering a name the program never declares is harmless.
#[derive(Default)]
pub struct Functions {
    entries: HashMap<String, HostFn>,
}

impl Functions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the implementation for `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: FnMut(&[Value]) -> Flow + 'static,
    {
        self.entries.insert(name.into(), Box::new(f));
        self
    }

    /// Builder-style [`Functions::register`].
    pub fn with<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: FnMut(&[Value]) -> Flow + 'static,
    {
        self.register(name, f);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut HostFn> {
        self.entries.get_mut(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Functions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Functions").field("names", &names).finish()
    }
}

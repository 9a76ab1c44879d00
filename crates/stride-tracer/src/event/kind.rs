use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Kind of an execution event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    /// A natively implemented function is called.
    NativeCall,

    /// A function implemented in the traced language is called.
    Call,

    /// A natively implemented function returns.
    NativeReturn,

    /// A function implemented in the traced language returns.
    Return,

    /// A type or namespace definition is opened.
    ScopeOpen,

    /// A type or namespace definition is closed.
    ScopeClose,

    /// Execution reached a line starting an expression or statement.
    Line,

    /// An error is raised.
    Raise,

    /// A block (closure) is called.
    BlockCall,

    /// A block (closure) returns.
    BlockReturn,

    /// A thread begins.
    ThreadBegin,

    /// A thread ends.
    ThreadEnd,

    /// Execution switches from one cooperative context to another.
    ContextSwitch,

    /// Code is loaded or compiled at runtime.
    CodeLoad,
}

impl EventKind {
    /// Every event kind.
    pub const ALL: [Self; 14] = [
        Self::NativeCall,
        Self::Call,
        Self::NativeReturn,
        Self::Return,
        Self::ScopeOpen,
        Self::ScopeClose,
        Self::Line,
        Self::Raise,
        Self::BlockCall,
        Self::BlockReturn,
        Self::ThreadBegin,
        Self::ThreadEnd,
        Self::ContextSwitch,
        Self::CodeLoad,
    ];

    /// Returns the stable name of this kind.
    pub const fn name(self) -> &'static str {
        match self {
            Self::NativeCall => "native_call",
            Self::Call => "call",
            Self::NativeReturn => "native_return",
            Self::Return => "return",
            Self::ScopeOpen => "scope_open",
            Self::ScopeClose => "scope_close",
            Self::Line => "line",
            Self::Raise => "raise",
            Self::BlockCall => "block_call",
            Self::BlockReturn => "block_return",
            Self::ThreadBegin => "thread_begin",
            Self::ThreadEnd => "thread_end",
            Self::ContextSwitch => "context_switch",
            Self::CodeLoad => "code_load",
        }
    }

    /// Returns whether this is a call, native or not.
    pub const fn is_call(self) -> bool {
        matches!(self, Self::NativeCall | Self::Call)
    }

    /// Returns whether this is a return, native or not.
    pub const fn is_return(self) -> bool {
        matches!(self, Self::NativeReturn | Self::Return)
    }

    /// Returns whether this concerns a natively implemented function.
    pub const fn is_native(self) -> bool {
        matches!(self, Self::NativeCall | Self::NativeReturn)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| crate::Error::InvalidArgument(format!("unknown event kind `{s}`")))
    }
}

/// Set of event kinds an instrumentation source reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventFilter {
    /// Every kind is reported.
    All,

    /// Only the given kinds are reported.
    Only(BTreeSet<EventKind>),
}

impl EventFilter {
    /// Filter reporting calls and returns, native or not.
    pub fn calls_and_returns() -> Self {
        [
            EventKind::NativeCall,
            EventKind::Call,
            EventKind::NativeReturn,
            EventKind::Return,
        ]
        .into_iter()
        .collect()
    }

    /// Builds a filter from kind names.
    ///
    /// The name `*` selects every kind.
    pub fn from_names<I, S>(names: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut kinds = BTreeSet::new();

        for name in names {
            match name.as_ref() {
                "*" => return Ok(Self::All),
                name => {
                    kinds.insert(name.parse()?);
                }
            }
        }

        if kinds.is_empty() {
            return Err(crate::Error::InvalidArgument(
                "expected at least one event kind".to_owned(),
            ));
        }

        Ok(Self::Only(kinds))
    }

    /// Returns whether events of the given kind pass this filter.
    pub fn matches(&self, kind: EventKind) -> bool {
        match self {
            Self::All => true,
            Self::Only(kinds) => kinds.contains(&kind),
        }
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::calls_and_returns()
    }
}

impl FromIterator<EventKind> for EventFilter {
    fn from_iter<T: IntoIterator<Item = EventKind>>(iter: T) -> Self {
        Self::Only(iter.into_iter().collect())
    }
}

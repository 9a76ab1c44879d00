use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Description of a type of the traced code.
///
/// The method tables are used to derive [signatures](super::Event::signature).
#[derive(Debug, PartialEq, Eq)]
pub struct TypeDescriptor {
    name: String,
    instance_methods: BTreeSet<String>,
    type_methods: BTreeSet<String>,
}

impl TypeDescriptor {
    /// Creates a descriptor without methods.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instance_methods: BTreeSet::new(),
            type_methods: BTreeSet::new(),
        }
    }

    /// Registers a method operating on instances of this type.
    pub fn instance_method(mut self, name: impl Into<String>) -> Self {
        self.instance_methods.insert(name.into());
        self
    }

    /// Registers a method operating on the type itself.
    pub fn type_method(mut self, name: impl Into<String>) -> Self {
        self.type_methods.insert(name.into());
        self
    }

    /// Returns the name of this type.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether `method` operates on instances of this type.
    pub fn has_instance_method(&self, method: &str) -> bool {
        self.instance_methods.contains(method)
    }

    /// Returns whether `method` operates on the type itself.
    pub fn has_type_method(&self, method: &str) -> bool {
        self.type_methods.contains(method)
    }
}

/// Value acting as receiver (owner) of an event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Receiver {
    /// No receiver (e.g., top-level code).
    #[default]
    None,

    /// A type itself.
    Type(Arc<TypeDescriptor>),

    /// An instance of a type.
    Instance {
        /// Type of the instance.
        ty: Arc<TypeDescriptor>,

        /// Identity of the instance.
        id: u64,
    },
}

impl Receiver {
    /// Receiver for the given type itself.
    pub fn of_type(ty: &Arc<TypeDescriptor>) -> Self {
        Self::Type(Arc::clone(ty))
    }

    /// Receiver for an instance of the given type.
    pub fn instance(ty: &Arc<TypeDescriptor>, id: u64) -> Self {
        Self::Instance {
            ty: Arc::clone(ty),
            id,
        }
    }

    /// Returns the type associated with this receiver: the receiver itself
    /// if it is a type, otherwise the type of the instance.
    pub fn module(&self) -> Option<&Arc<TypeDescriptor>> {
        match self {
            Self::None => None,
            Self::Type(ty) | Self::Instance { ty, .. } => Some(ty),
        }
    }

    /// Returns whether this receiver is a type.
    pub const fn is_type(&self) -> bool {
        matches!(self, Self::Type(_))
    }
}

impl fmt::Display for Receiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("main"),
            Self::Type(ty) => f.write_str(ty.name()),
            Self::Instance { ty, id } => write!(f, "#<{}:{id:#x}>", ty.name()),
        }
    }
}

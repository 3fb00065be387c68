//! Call-site storage: registered types, factories, and cells.
//!
//! A storage parameter asks the runtime for a scratch instance that lives
//! as long as the compiled call it was bound into. Construction is an
//! explicit capability: a type must be registered with a factory before
//! any signature can declare it, and binding a signature whose storage
//! type has no registration fails rather than improvising an instance.

use std::any::Any;
use std::sync::Arc;

use iris_core::intern::{intern, InternedString};
use parking_lot::{Mutex, RwLock};

// ============================================================================
// Storage type ids
// ============================================================================

/// Identifies a registered storage type.
///
/// Ids are handed out by the [`StorageRegistry`] in registration order and
/// are only meaningful against the registry that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StorageTypeId(u32);

impl StorageTypeId {
    /// Raw registry index.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for StorageTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "storage#{}", self.0)
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Factory producing one freshly constructed storage instance.
pub type StorageFactory = fn() -> Box<dyn Any + Send>;

fn make_default<T: Default + Send + 'static>() -> Box<dyn Any + Send> {
    Box::new(T::default())
}

struct Registration {
    name: InternedString,
    make: StorageFactory,
}

/// Table of storage types the runtime knows how to construct.
///
/// Registration is expected at startup, before call sites run, but the
/// table is safe to extend concurrently.
#[derive(Default)]
pub struct StorageRegistry {
    entries: RwLock<Vec<Registration>>,
}

impl StorageRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` under `name`, using its `Default` impl as the factory.
    pub fn register<T: Default + Send + 'static>(&self, name: &str) -> StorageTypeId {
        self.register_with(name, make_default::<T>)
    }

    /// Registers a storage type with an explicit factory.
    pub fn register_with(&self, name: &str, make: StorageFactory) -> StorageTypeId {
        let mut entries = self.entries.write();
        let id = StorageTypeId(entries.len() as u32);
        entries.push(Registration {
            name: intern(name),
            make,
        });
        id
    }

    /// Constructs a fresh cell for `ty`, or `None` if `ty` was never
    /// registered with this registry.
    pub fn construct(&self, ty: StorageTypeId) -> Option<StorageCell> {
        let entries = self.entries.read();
        let reg = entries.get(ty.0 as usize)?;
        Some(StorageCell {
            ty,
            name: reg.name,
            state: Mutex::new((reg.make)()),
        })
    }

    /// Registered name of `ty`, if known.
    pub fn name_of(&self, ty: StorageTypeId) -> Option<InternedString> {
        self.entries.read().get(ty.0 as usize).map(|r| r.name)
    }

    /// True if `ty` can be constructed by this registry.
    pub fn contains(&self, ty: StorageTypeId) -> bool {
        (ty.0 as usize) < self.entries.read().len()
    }

    /// Number of registered storage types.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

// ============================================================================
// Cells
// ============================================================================

/// One storage instance, owned by the compiled call it was bound into.
///
/// Every invocation flowing through that compiled call sees this same
/// cell; a rebind (new shape, or after invalidation) constructs a new one.
/// The cell provides the lock, the storage type provides the semantics.
pub struct StorageCell {
    ty: StorageTypeId,
    name: InternedString,
    state: Mutex<Box<dyn Any + Send>>,
}

impl StorageCell {
    /// The registered type this cell was constructed from.
    #[inline]
    pub fn type_id(&self) -> StorageTypeId {
        self.ty
    }

    /// Registered name of the storage type.
    #[inline]
    pub fn type_name(&self) -> InternedString {
        self.name
    }

    /// Runs `f` over the state, downcast to its concrete type.
    ///
    /// Returns `None` if `T` is not the type the factory constructed.
    pub fn with<T: 'static, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut state = self.state.lock();
        state.downcast_mut::<T>().map(f)
    }

    /// True if two handles refer to the same cell instance.
    #[inline]
    pub fn same_cell(a: &Arc<StorageCell>, b: &Arc<StorageCell>) -> bool {
        Arc::ptr_eq(a, b)
    }
}

impl std::fmt::Debug for StorageCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageCell")
            .field("ty", &self.ty)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
